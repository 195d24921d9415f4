//! Over-the-air update into the embassy-boot DFU partition.
//!
//! The source directory holds `version.json` (`{"version": "x.y.z"}`) and
//! the application image. When the published version differs from the
//! running one the image is streamed into DFU and the bootloader is told
//! to swap on the next reset. The new image confirms itself with
//! [`confirm_boot`]; an image that never does is rolled back.

use alloc::format;
use alloc::string::String;
use alloc::vec;
use core::cell::RefCell;
use defmt::{info, warn};
use embassy_boot_rp::{AlignedBuffer, BlockingFirmwareUpdater, FirmwareUpdaterConfig, State};
use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embassy_net::Stack;
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_io_async::Read;
use reqwless::client::{HttpClient, TlsConfig, TlsVerify};
use reqwless::request::Method;
use serde::Deserialize;
use static_cell::StaticCell;
use weighstation::{FirmwareUpdater, UpdateError, UpdateRequest, UpdateStatus};

/// Pico W flash chip.
const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// DFU writes go out one erase sector at a time.
const DFU_BLOCK_LEN: usize = 4096;

/// Largest TLS record plus overhead.
const TLS_BUF_LEN: usize = 16_640;

const RX_BUF_LEN: usize = 4096;

const VERSION_MANIFEST: &str = "version.json";

type FlashDriver = Flash<'static, FLASH, Blocking, FLASH_SIZE>;
pub type SharedFlash = Mutex<NoopRawMutex, RefCell<FlashDriver>>;

/// Take the flash, returning it shared for the updater together with the
/// chip's 64-bit unique id.
pub fn init_flash(flash: FLASH) -> (&'static SharedFlash, [u8; 8]) {
    let mut driver = FlashDriver::new_blocking(flash);
    let mut unique_id = [0u8; 8];
    if driver.blocking_unique_id(&mut unique_id).is_err() {
        warn!("ota: could not read flash unique id");
    }
    static SHARED: StaticCell<SharedFlash> = StaticCell::new();
    (SHARED.init(Mutex::new(RefCell::new(driver))), unique_id)
}

/// Mark a freshly swapped image as good so the bootloader keeps it.
pub fn confirm_boot(flash: &SharedFlash) {
    let config = FirmwareUpdaterConfig::from_linkerfile_blocking(flash, flash);
    let mut aligned = AlignedBuffer([0; 1]);
    let mut updater = BlockingFirmwareUpdater::new(config, &mut aligned.0);
    if let Ok(State::Swap) = updater.get_state() {
        info!("ota: first boot of new image, confirming");
        if updater.mark_booted().is_err() {
            warn!("ota: mark_booted failed, image will roll back");
        }
    }
}

#[derive(Deserialize)]
struct Manifest {
    version: String,
}

pub struct OtaUpdater {
    stack: Stack<'static>,
    flash: &'static SharedFlash,
    running_version: &'static str,
    seed: u64,
}

impl OtaUpdater {
    pub fn new(
        stack: Stack<'static>,
        flash: &'static SharedFlash,
        running_version: &'static str,
        seed: u64,
    ) -> Self {
        Self {
            stack,
            flash,
            running_version,
            seed,
        }
    }
}

impl FirmwareUpdater for OtaUpdater {
    async fn check_and_install(&mut self, request: &UpdateRequest) -> Result<UpdateStatus, UpdateError> {
        if !self.stack.is_config_up() {
            return Err(UpdateError::new("no network"));
        }

        let mut tls_read = vec![0u8; TLS_BUF_LEN];
        let mut tls_write = vec![0u8; TLS_BUF_LEN];
        let mut rx = vec![0u8; RX_BUF_LEN];
        let state: TcpClientState<1, 1024, 1024> = TcpClientState::new();
        let tcp = TcpClient::new(self.stack, &state);
        let dns = DnsSocket::new(self.stack);
        let tls = TlsConfig::new(self.seed, &mut tls_read, &mut tls_write, TlsVerify::None);
        let mut client = HttpClient::new_with_tls(&tcp, &dns, tls);

        let manifest_url = format!("{}{}", request.source_url, VERSION_MANIFEST);
        let latest = {
            let mut req = client.request(Method::GET, &manifest_url).await.map_err(fetch_error)?;
            let response = req.send(&mut rx).await.map_err(fetch_error)?;
            check_status(response.status.0)?;
            let body = response.body().read_to_end().await.map_err(fetch_error)?;
            serde_json::from_slice::<Manifest>(body)
                .map_err(|_| UpdateError::new("bad manifest"))?
                .version
        };
        info!(
            "ota: running {=str}, published {=str}",
            self.running_version,
            latest.as_str()
        );
        if latest == self.running_version {
            return Ok(UpdateStatus::UpToDate);
        }

        let image_url = format!("{}{}", request.source_url, request.target_file);
        let mut req = client.request(Method::GET, &image_url).await.map_err(fetch_error)?;
        let response = req.send(&mut rx).await.map_err(fetch_error)?;
        check_status(response.status.0)?;
        let mut body = response.body().reader();

        let config = FirmwareUpdaterConfig::from_linkerfile_blocking(self.flash, self.flash);
        let mut aligned = AlignedBuffer([0; 1]);
        let mut updater = BlockingFirmwareUpdater::new(config, &mut aligned.0);

        let mut block = vec![0u8; DFU_BLOCK_LEN];
        let mut filled = 0;
        let mut offset = 0;
        loop {
            let n = body.read(&mut block[filled..]).await.map_err(fetch_error)?;
            if n == 0 {
                break;
            }
            filled += n;
            if filled == DFU_BLOCK_LEN {
                updater.write_firmware(offset, &block).map_err(flash_error)?;
                offset += filled;
                filled = 0;
            }
        }
        if filled > 0 {
            block[filled..].fill(0xFF);
            updater.write_firmware(offset, &block).map_err(flash_error)?;
            offset += filled;
        }
        if offset == 0 {
            return Err(UpdateError::new("empty image"));
        }

        updater.mark_updated().map_err(flash_error)?;
        info!("ota: {=usize} bytes staged for {=str}", offset, latest.as_str());
        Ok(UpdateStatus::Installed)
    }

    async fn restart(&mut self) {
        info!("ota: restarting into new image");
        embassy_time::Timer::after_millis(100).await;
        cortex_m::peripheral::SCB::sys_reset();
    }
}

fn check_status(code: u16) -> Result<(), UpdateError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(UpdateError::new(format!("HTTP {}", code)))
    }
}

fn fetch_error(err: reqwless::Error) -> UpdateError {
    UpdateError::new(format!("{:?}", err))
}

fn flash_error(err: embassy_boot_rp::FirmwareUpdaterError) -> UpdateError {
    UpdateError::new(format!("{:?}", err))
}
