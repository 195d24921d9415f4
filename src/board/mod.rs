//! Pico W adapters for the station's port traits.
//!
//! | Module   | Implements                           | Hardware                      |
//! |----------|--------------------------------------|-------------------------------|
//! | [`lcd`]  | [`weighstation::LineDisplay`]        | HD44780 16x2 via PCF8574 I2C  |
//! | [`wifi`] | [`weighstation::Radio`]              | CYW43439 + embassy-net        |
//! | [`http`] | [`weighstation::ScanEndpoint`]       | reqwless over TCP             |
//! | [`ota`]  | [`weighstation::FirmwareUpdater`]    | reqwless TLS + embassy-boot   |

pub mod http;
pub mod lcd;
pub mod ota;
pub mod wifi;

use core::mem::MaybeUninit;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{PIO0, UART0, UART1};
use embassy_rp::{pio, uart};
use embedded_alloc::LlffHeap as Heap;

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
    UART0_IRQ  => uart::BufferedInterruptHandler<UART0>;
    UART1_IRQ  => uart::BufferedInterruptHandler<UART1>;
});

/// JSON replies, URLs and the TLS record buffers live here.
const HEAP_SIZE: usize = 96 * 1024;

#[global_allocator]
static HEAP: Heap = Heap::empty();

/// Must run once, before anything allocates.
pub fn init_heap() {
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    // SAFETY: called once from `main` before the executor starts.
    unsafe { HEAP.init(core::ptr::addr_of_mut!(HEAP_MEM) as usize, HEAP_SIZE) }
}

/// Seed for the network stack and TLS from the flash chip's unique id
/// mixed with the boot tick count.
pub fn seed(unique_id: [u8; 8]) -> u64 {
    u64::from_le_bytes(unique_id) ^ embassy_time::Instant::now().as_ticks().rotate_left(32)
}
