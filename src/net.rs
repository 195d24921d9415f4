//! WiFi connectivity tracking and auto-reconnect.
//!
//! The radio itself is behind the [`Radio`] port. The reconciler owns the
//! last status it put on screen and only redraws the status row when that
//! changes (or when asked to force it).

use crate::config::{WIFI_CONNECT_ATTEMPTS, WIFI_POLL_MS, WIFI_RECONNECT_ATTEMPTS};
use crate::keypad::KeySource;
use crate::ui::{Console, Line, LineDisplay};
use alloc::string::String;
use embedded_hal_async::delay::DelayNs;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }
}

/// Station-mode WiFi radio.
///
/// `connect` starts an association and may return before the link is up;
/// `is_connected` is the cheap link check polled afterwards.
#[allow(async_fn_in_trait)]
pub trait Radio {
    async fn connect(&mut self, credentials: &WifiCredentials);
    fn is_connected(&mut self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectivityStatus {
    Connected,
    Disconnected,
}

impl ConnectivityStatus {
    fn from_link(up: bool) -> Self {
        if up {
            ConnectivityStatus::Connected
        } else {
            ConnectivityStatus::Disconnected
        }
    }

    /// Status-row text.
    pub fn label(self) -> &'static str {
        match self {
            ConnectivityStatus::Connected => "WiFi: Connected",
            ConnectivityStatus::Disconnected => "WiFi: Disconn.",
        }
    }
}

pub const RECONNECTING_LABEL: &str = "WiFi: Reconnecting";

pub struct NetworkReconciler<R> {
    radio: R,
    credentials: WifiCredentials,
    last_reported: Option<ConnectivityStatus>,
}

impl<R: Radio> NetworkReconciler<R> {
    pub fn new(radio: R, credentials: WifiCredentials) -> Self {
        Self {
            radio,
            credentials,
            last_reported: None,
        }
    }

    pub fn is_connected(&mut self) -> bool {
        self.radio.is_connected()
    }

    pub fn last_reported(&self) -> Option<ConnectivityStatus> {
        self.last_reported
    }

    /// Bring the link up (waiting up to [`WIFI_CONNECT_ATTEMPTS`] checks)
    /// and always redraw the status row.
    pub async fn connect<K, L, D>(&mut self, console: &mut Console<K, L, D>) -> ConnectivityStatus
    where
        K: KeySource,
        L: LineDisplay,
        D: DelayNs,
    {
        if !self.radio.is_connected() {
            info!("wifi: joining {=str}", self.credentials.ssid.as_str());
            self.radio.connect(&self.credentials).await;
            for _ in 0..WIFI_CONNECT_ATTEMPTS {
                if self.radio.is_connected() {
                    break;
                }
                console.pause(WIFI_POLL_MS).await;
            }
        }
        self.report(console, true)
    }

    /// Reconnect if the link dropped; redraw the status row on change only.
    pub async fn reconcile<K, L, D>(&mut self, console: &mut Console<K, L, D>) -> ConnectivityStatus
    where
        K: KeySource,
        L: LineDisplay,
        D: DelayNs,
    {
        self.refresh(console, false).await
    }

    pub async fn refresh<K, L, D>(
        &mut self,
        console: &mut Console<K, L, D>,
        force: bool,
    ) -> ConnectivityStatus
    where
        K: KeySource,
        L: LineDisplay,
        D: DelayNs,
    {
        if !self.radio.is_connected() {
            warn!("wifi: link down, reconnecting");
            self.radio.connect(&self.credentials).await;
            for _ in 0..WIFI_RECONNECT_ATTEMPTS {
                if self.radio.is_connected() {
                    break;
                }
                console.show(Line::Bottom, RECONNECTING_LABEL);
                console.pause(WIFI_POLL_MS).await;
            }
        }
        self.report(console, force)
    }

    fn report<K, L, D>(&mut self, console: &mut Console<K, L, D>, force: bool) -> ConnectivityStatus
    where
        K: KeySource,
        L: LineDisplay,
        D: DelayNs,
    {
        let status = ConnectivityStatus::from_link(self.radio.is_connected());
        if force || self.last_reported != Some(status) {
            if self.last_reported != Some(status) {
                info!("wifi: {}", status);
            }
            console.show(Line::Bottom, status.label());
            self.last_reported = Some(status);
        }
        status
    }
}
