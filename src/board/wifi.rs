//! CYW43439 station mode and the embassy-net stack on top of it.

use cyw43::JoinOptions;
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_net::{Config, Stack, StackResources};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIN_23, PIN_24, PIN_25, PIN_29, PIO0};
use embassy_rp::pio::Pio;
use static_cell::StaticCell;
use weighstation::{Radio, WifiCredentials};

use super::Irqs;

type Spi = PioSpi<'static, PIO0, 0, DMA_CH0>;

/// Sockets: one HTTP client plus DHCP and DNS.
const SOCKETS: usize = 4;

/// Pins and blocks wired to the radio on the Pico W.
pub struct RadioPeripherals {
    pub pwr: PIN_23,
    pub cs: PIN_25,
    pub dio: PIN_24,
    pub clk: PIN_29,
    pub pio: PIO0,
    pub dma: DMA_CH0,
}

#[embassy_executor::task]
async fn cyw43_task(runner: cyw43::Runner<'static, Output<'static>, Spi>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

pub struct PicoRadio {
    control: cyw43::Control<'static>,
    stack: Stack<'static>,
}

impl PicoRadio {
    /// Power the chip up, load its firmware and spawn the driver and
    /// network tasks. The radio is not joined to any network yet.
    pub async fn start(spawner: Spawner, p: RadioPeripherals, seed: u64) -> Self {
        let fw = include_bytes!("../../cyw43-firmware/43439A0.bin");
        let clm = include_bytes!("../../cyw43-firmware/43439A0_clm.bin");

        let pwr = Output::new(p.pwr, Level::Low);
        let cs = Output::new(p.cs, Level::High);
        let mut pio = Pio::new(p.pio, Irqs);
        let spi = PioSpi::new(
            &mut pio.common,
            pio.sm0,
            DEFAULT_CLOCK_DIVIDER,
            pio.irq0,
            cs,
            p.dio,
            p.clk,
            p.dma,
        );

        static STATE: StaticCell<cyw43::State> = StaticCell::new();
        let (device, mut control, runner) = cyw43::new(STATE.init(cyw43::State::new()), pwr, spi, fw).await;
        unwrap!(spawner.spawn(cyw43_task(runner)));

        control.init(clm).await;
        control
            .set_power_management(cyw43::PowerManagementMode::PowerSave)
            .await;

        static RESOURCES: StaticCell<StackResources<SOCKETS>> = StaticCell::new();
        let (stack, runner) = embassy_net::new(
            device,
            Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            seed,
        );
        unwrap!(spawner.spawn(net_task(runner)));
        info!("wifi: radio up");

        Self { control, stack }
    }

    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }
}

impl Radio for PicoRadio {
    async fn connect(&mut self, credentials: &WifiCredentials) {
        let options = JoinOptions::new(credentials.password.as_bytes());
        match self.control.join(&credentials.ssid, options).await {
            Ok(()) => info!("wifi: joined {=str}", credentials.ssid.as_str()),
            Err(err) => warn!("wifi: join failed, status {=u32}", err.status),
        }
    }

    /// Up once the link is associated and DHCP has handed out an address.
    fn is_connected(&mut self) -> bool {
        self.stack.is_link_up() && self.stack.is_config_up()
    }
}
