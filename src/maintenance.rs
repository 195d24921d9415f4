//! Password-gated firmware update.
//!
//! Reached from the type menu with `*`. The operator types the password
//! (`0-9`, `A-C`) and confirms with `#`; `*` backs out. The actual fetch
//! and flash is done by a [`FirmwareUpdater`].

use crate::config::{
    CANCEL_NOTICE_MS, KEYPAD_POLL_MS, MAINTENANCE_ENTRY_MS, PASSWORD_MAX_LEN, UPDATE_DETAIL_LEN,
    UPDATE_RESULT_MS, WRONG_PASSWORD_MS,
};
use crate::error::UpdateError;
use crate::keypad::{Key, KeySource};
use crate::net::{NetworkReconciler, Radio};
use crate::submit::truncate;
use crate::ui::input_logic::{is_password_key, password_mask, push_key};
use crate::ui::{Console, Line, LineDisplay};
use alloc::string::String;
use embedded_hal_async::delay::DelayNs;

/// Where to fetch firmware from and how to get online to do it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateRequest {
    pub ssid: String,
    pub password: String,
    pub source_url: String,
    pub target_file: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateStatus {
    /// A newer image was written and will boot after a restart.
    Installed,
    /// The running image is already the latest.
    UpToDate,
}

/// Firmware-update transport.
#[allow(async_fn_in_trait)]
pub trait FirmwareUpdater {
    async fn check_and_install(&mut self, request: &UpdateRequest) -> Result<UpdateStatus, UpdateError>;

    /// Boot into a freshly installed image.
    async fn restart(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MaintenanceOutcome {
    Cancelled,
    Updated(UpdateStatus),
    UpdateFailed,
}

pub struct MaintenanceTrigger<U> {
    updater: U,
    password: String,
    request: UpdateRequest,
}

impl<U: FirmwareUpdater> MaintenanceTrigger<U> {
    pub fn new(updater: U, password: impl Into<String>, request: UpdateRequest) -> Self {
        Self {
            updater,
            password: password.into(),
            request,
        }
    }

    /// Run the password prompt until the operator cancels or an update
    /// attempt finishes.
    pub async fn run<K, L, D, R>(
        &mut self,
        console: &mut Console<K, L, D>,
        network: &mut NetworkReconciler<R>,
    ) -> MaintenanceOutcome
    where
        K: KeySource,
        L: LineDisplay,
        D: DelayNs,
        R: Radio,
    {
        info!("maintenance: password prompt");
        console.pause(MAINTENANCE_ENTRY_MS).await;
        let mut entered: heapless::String<PASSWORD_MAX_LEN> = heapless::String::new();
        Self::prompt(console, entered.len());

        loop {
            network.reconcile(console).await;

            match console.poll_press().await {
                Some(Key::Hash) if entered.as_str() == self.password => {
                    return self.install(console).await;
                }
                Some(Key::Hash) => {
                    warn!("maintenance: wrong password");
                    console.show(Line::Top, "Wrong Password!");
                    console.pause(WRONG_PASSWORD_MS).await;
                    entered.clear();
                    Self::prompt(console, 0);
                }
                Some(Key::Star) => {
                    info!("maintenance: cancelled");
                    console.show(Line::Top, "Update Cancelled");
                    console.pause(CANCEL_NOTICE_MS).await;
                    return MaintenanceOutcome::Cancelled;
                }
                Some(key) if is_password_key(key) => {
                    push_key(&mut entered, key);
                    Self::prompt(console, entered.len());
                }
                _ => {}
            }

            console.pause(KEYPAD_POLL_MS).await;
        }
    }

    fn prompt<K, L, D>(console: &mut Console<K, L, D>, typed: usize)
    where
        K: KeySource,
        L: LineDisplay,
        D: DelayNs,
    {
        console.screen("Enter Password:", password_mask(typed));
    }

    async fn install<K, L, D>(&mut self, console: &mut Console<K, L, D>) -> MaintenanceOutcome
    where
        K: KeySource,
        L: LineDisplay,
        D: DelayNs,
    {
        info!("maintenance: checking {=str}", self.request.source_url.as_str());
        console.show(Line::Top, "Starting OTA...");

        match self.updater.check_and_install(&self.request).await {
            Ok(status) => {
                info!("maintenance: update ok ({})", status);
                console.show(Line::Top, "OTA Success");
                console.pause(UPDATE_RESULT_MS).await;
                if status == UpdateStatus::Installed {
                    self.updater.restart().await;
                }
                MaintenanceOutcome::Updated(status)
            }
            Err(err) => {
                error!("maintenance: update failed: {}", err);
                console.screen("OTA Failed", &truncate(&err.detail, UPDATE_DETAIL_LEN));
                console.pause(UPDATE_RESULT_MS).await;
                MaintenanceOutcome::UpdateFailed
            }
        }
    }
}
