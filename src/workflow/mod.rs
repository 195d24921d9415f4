//! Operator workflow - the station's main state machine.
//!
//! ```text
//!                 ┌──────── * ────────► Maintenance ──┐
//!                 │                                   │
//!   SelectType ◄──┴───────────────────────────────────┘
//!     │ 1/2  ▲ B
//!     ▼      │
//!   SelectInputMethod
//!     │ 1/2  ▲ B
//!     ▼      │
//!   EnterId ◄───────────────┬─────────────┐
//!     │ id                  │ scale error │ submitted
//!     ▼                     │             │
//!   EnterWeight ────────────┘             │
//!     │ weight                            │
//!     ▼                                   │
//!   Submit ───────────────────────────────┘
//! ```
//!
//! Each state carries the selections made before it, so a later state
//! cannot exist without them. Handlers do the I/O for one state and yield
//! an [`Event`]; [`transition`] is the only place the state changes.

use crate::config::{
    BARCODE_TERMINATOR, CYCLE_PAUSE_MS, FIRMWARE_SOURCE_URL, FIRMWARE_TARGET_FILE, MACHINE_ID,
    MAINTENANCE_PASSWORD, PIECE_ID_MAX_LEN, READ_ERROR_MS, SCAN_ENDPOINT_URL, SERIAL_POLL_MS,
    SPLASH_MS, STATION_NAME, TECH_ID, WEIGHT_FRAME_TIMEOUT_MS, WEIGHT_SETTLE_MS,
    WEIGHT_TERMINATOR, WIFI_BOOT_RETRY_MS, WIFI_PASSWORD, WIFI_READY_MS, WIFI_SSID,
};
use crate::error::FrameError;
use crate::keypad::{Key, KeySource};
use crate::maintenance::{FirmwareUpdater, MaintenanceTrigger, UpdateRequest};
use crate::net::{NetworkReconciler, Radio, WifiCredentials};
use crate::serial::weight::{self, WeightReading};
use crate::serial::{frame_text, FrameReader};
use crate::submit::{InputMethod, PieceType, ScanEndpoint, ScanRequest, SubmissionOutcome};
use crate::ui::input_logic::{is_id_key, push_key};
use crate::ui::{Console, Line, LineDisplay};
use alloc::format;
use alloc::string::{String, ToString};
use embedded_hal_async::delay::DelayNs;
use embedded_io::{Read, ReadReady};


// ═══════════════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════════════

/// Runtime values the workflow needs; defaults come from `config.rs`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub wifi: WifiCredentials,
    pub endpoint_url: String,
    pub tech_id: String,
    pub machine_id: String,
    pub maintenance_password: String,
    pub firmware_source_url: String,
    pub firmware_target_file: String,
    /// `None` waits for the scale indefinitely.
    pub weight_timeout_ms: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wifi: WifiCredentials::new(WIFI_SSID, WIFI_PASSWORD),
            endpoint_url: SCAN_ENDPOINT_URL.into(),
            tech_id: TECH_ID.into(),
            machine_id: MACHINE_ID.into(),
            maintenance_password: MAINTENANCE_PASSWORD.into(),
            firmware_source_url: FIRMWARE_SOURCE_URL.into(),
            firmware_target_file: FIRMWARE_TARGET_FILE.into(),
            weight_timeout_ms: WEIGHT_FRAME_TIMEOUT_MS,
        }
    }
}

impl Settings {
    pub fn update_request(&self) -> UpdateRequest {
        UpdateRequest {
            ssid: self.wifi.ssid.clone(),
            password: self.wifi.password.clone(),
            source_url: self.firmware_source_url.clone(),
            target_file: self.firmware_target_file.clone(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// States, events, transitions
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    SelectType,
    SelectInputMethod {
        piece_type: PieceType,
    },
    EnterId {
        piece_type: PieceType,
        method: InputMethod,
    },
    EnterWeight {
        piece_type: PieceType,
        method: InputMethod,
        piece_id: String,
    },
    Submit {
        piece_type: PieceType,
        method: InputMethod,
        piece_id: String,
        weight: WeightReading,
    },
    Maintenance,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    TypeChosen(PieceType),
    MaintenanceRequested,
    MaintenanceDone,
    MethodChosen(InputMethod),
    Back,
    IdCaptured(String),
    WeightCaptured(WeightReading),
    WeightFailed,
    Submitted,
}

/// Next state for `event` in `state`. Events that mean nothing in the
/// current state leave it unchanged.
pub fn transition(state: State, event: Event) -> State {
    use Event as E;
    use State as S;

    match (state, event) {
        (S::SelectType, E::TypeChosen(piece_type)) => S::SelectInputMethod { piece_type },
        (S::SelectType, E::MaintenanceRequested) => S::Maintenance,
        (S::Maintenance, E::MaintenanceDone) => S::SelectType,

        (S::SelectInputMethod { piece_type }, E::MethodChosen(method)) => {
            S::EnterId { piece_type, method }
        }
        (S::SelectInputMethod { .. }, E::Back) => S::SelectType,

        (S::EnterId { piece_type, .. }, E::Back) => S::SelectInputMethod { piece_type },
        (S::EnterId { piece_type, method }, E::IdCaptured(piece_id)) => S::EnterWeight {
            piece_type,
            method,
            piece_id,
        },

        (
            S::EnterWeight {
                piece_type,
                method,
                piece_id,
            },
            E::WeightCaptured(weight),
        ) => S::Submit {
            piece_type,
            method,
            piece_id,
            weight,
        },
        (S::EnterWeight { piece_type, method, .. }, E::WeightFailed) => {
            S::EnterId { piece_type, method }
        }

        (S::Submit { piece_type, method, .. }, E::Submitted) => S::EnterId { piece_type, method },

        (state, _) => state,
    }
}

/// Menu key → event for the two selection menus. Other keys are ignored.
pub fn menu_event(state: &State, key: Key) -> Option<Event> {
    match state {
        State::SelectType => match key {
            Key::Star => Some(Event::MaintenanceRequested),
            _ => PieceType::from_key(key).map(Event::TypeChosen),
        },
        State::SelectInputMethod { .. } => match key {
            Key::B => Some(Event::Back),
            _ => InputMethod::from_key(key).map(Event::MethodChosen),
        },
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Kiosk
// ═══════════════════════════════════════════════════════════════════════════

/// The whole station: console, both serial channels, network, endpoint
/// and maintenance, driven by one control loop.
pub struct Kiosk<K, L, D, WS, BS, R, E, U> {
    console: Console<K, L, D>,
    scale: FrameReader<WS>,
    scanner: FrameReader<BS>,
    network: NetworkReconciler<R>,
    endpoint: E,
    maintenance: MaintenanceTrigger<U>,
    settings: Settings,
    state: State,
}

impl<K, L, D, WS, BS, R, E, U> Kiosk<K, L, D, WS, BS, R, E, U>
where
    K: KeySource,
    L: LineDisplay,
    D: DelayNs,
    WS: Read + ReadReady,
    BS: Read + ReadReady,
    R: Radio,
    E: ScanEndpoint,
    U: FirmwareUpdater,
{
    pub fn new(
        console: Console<K, L, D>,
        scale_port: WS,
        scanner_port: BS,
        radio: R,
        endpoint: E,
        updater: U,
        settings: Settings,
    ) -> Self {
        let maintenance = MaintenanceTrigger::new(
            updater,
            settings.maintenance_password.clone(),
            settings.update_request(),
        );
        Self {
            console,
            scale: FrameReader::new(scale_port, WEIGHT_TERMINATOR),
            scanner: FrameReader::new(scanner_port, BARCODE_TERMINATOR),
            network: NetworkReconciler::new(radio, settings.wifi.clone()),
            endpoint,
            maintenance,
            settings,
            state: State::SelectType,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Splash screen, then block until WiFi is up.
    pub async fn boot(&mut self, version: Option<&str>) {
        let version = version.unwrap_or("Unknown");
        info!("boot: {=str} version {=str}", STATION_NAME, version);
        self.console
            .screen(STATION_NAME, &format!("Version: {}", version));
        self.console.pause(SPLASH_MS).await;
        self.console.clear();

        self.console.screen("Connecting WiFi...", "");
        self.network.connect(&mut self.console).await;
        while !self.network.is_connected() {
            warn!("boot: wifi not ready, retrying");
            self.console.screen("WiFi not ready", "Retrying...");
            self.network.connect(&mut self.console).await;
            self.console.pause(WIFI_BOOT_RETRY_MS).await;
        }

        self.console.screen("WiFi Connected", "");
        self.console.pause(WIFI_READY_MS).await;
        self.state = State::SelectType;
    }

    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    /// Run the current state's handler once and apply its event.
    pub async fn step(&mut self) {
        let state = self.state.clone();
        let event = match &state {
            State::SelectType | State::SelectInputMethod { .. } => {
                Some(self.select_from_menu(&state).await)
            }
            State::Maintenance => {
                let outcome = self.maintenance.run(&mut self.console, &mut self.network).await;
                debug!("workflow: maintenance finished {}", outcome);
                Some(Event::MaintenanceDone)
            }
            State::EnterId { method, .. } => match method {
                InputMethod::Keypad => Some(self.enter_id_by_keypad().await),
                InputMethod::Barcode => self.enter_id_by_barcode().await,
            },
            State::EnterWeight { piece_id, .. } => Some(self.read_weight(piece_id).await),
            State::Submit {
                piece_type,
                piece_id,
                weight,
                ..
            } => Some(self.submit(*piece_type, piece_id, weight).await),
        };

        if let Some(event) = event {
            self.state = transition(state, event);
            debug!("workflow: now {}", self.state);
        }
    }

    async fn select_from_menu(&mut self, state: &State) -> Event {
        match state {
            State::SelectType => self.console.screen("Select Type:", "1:Out 2:Cutting"),
            _ => self.console.screen("ID:1-Key 2-Barc", "B:Back to Type"),
        }
        loop {
            let key = self.console.wait_press().await;
            if let Some(event) = menu_event(state, key) {
                return event;
            }
        }
    }

    async fn enter_id_by_keypad(&mut self) -> Event {
        self.console.screen("Enter Piece ID", "End with #:");
        let mut id: heapless::String<PIECE_ID_MAX_LEN> = heapless::String::new();
        loop {
            match self.console.wait_press().await {
                Key::Hash => return Event::IdCaptured(id.as_str().into()),
                Key::B => return Event::Back,
                key if is_id_key(key) => {
                    if push_key(&mut id, key) {
                        self.console.show(Line::Bottom, &id);
                    }
                }
                _ => {}
            }
        }
    }

    /// `None` after a read error: the prompt is shown again next step.
    async fn enter_id_by_barcode(&mut self) -> Option<Event> {
        self.console.screen("Scan Barcode...", "");
        match self.scan_barcode().await {
            Ok(Some(code)) => {
                info!("workflow: barcode {=str}", code.as_str());
                Some(Event::IdCaptured(code))
            }
            Ok(None) => Some(Event::Back),
            Err(err) => {
                warn!("workflow: barcode read failed: {}", err);
                self.console.screen("Barcode error", &err.to_string());
                self.console.pause(READ_ERROR_MS).await;
                None
            }
        }
    }

    /// Race the scanner against a `B` press. `Ok(None)` means backed out.
    async fn scan_barcode(&mut self) -> Result<Option<String>, FrameError> {
        self.scanner.discard_stale()?;
        loop {
            if self.console.poll_press().await == Some(Key::B) {
                return Ok(None);
            }
            if let Some(frame) = self.scanner.poll()? {
                return Ok(Some(frame_text(&frame)));
            }
            self.console.pause(SERIAL_POLL_MS).await;
        }
    }

    /// A channel fault re-reads with the piece id kept; a timeout or an
    /// oversized frame gives up and returns to id entry.
    async fn read_weight(&mut self, piece_id: &str) -> Event {
        let timeout = self.settings.weight_timeout_ms;
        loop {
            self.console.screen("Reading Weight", "Please wait...");
            match self.scale.read_frame(self.console.delay_mut(), timeout).await {
                Ok(frame) => {
                    let weight = weight::parse(&frame);
                    info!("workflow: weight {}", weight);
                    self.console.screen(&format!("Weight: {}", weight), "");
                    self.console.pause(WEIGHT_SETTLE_MS).await;
                    self.console.show(Line::Bottom, piece_id);
                    return Event::WeightCaptured(weight);
                }
                Err(err) => {
                    warn!("workflow: scale read failed: {}", err);
                    self.console.screen("Scale error", &err.to_string());
                    self.console.pause(READ_ERROR_MS).await;
                    if !matches!(err, FrameError::Serial(_)) {
                        return Event::WeightFailed;
                    }
                }
            }
        }
    }

    async fn submit(
        &mut self,
        piece_type: PieceType,
        piece_id: &str,
        weight: &WeightReading,
    ) -> Event {
        self.network.reconcile(&mut self.console).await;
        self.console.show(Line::Top, &format!("Sending:{}", weight));

        let request = ScanRequest {
            piece_id: piece_id.into(),
            weight: weight.clone(),
            piece_type,
            tech_id: self.settings.tech_id.clone(),
            machine_id: self.settings.machine_id.clone(),
        };
        info!(
            "workflow: submitting {=str} type {}",
            request.piece_id.as_str(),
            piece_type.code()
        );
        let result = self.endpoint.post(&request).await;
        let outcome = SubmissionOutcome::from_result(&result);
        match &outcome {
            SubmissionOutcome::Success { .. } => info!("workflow: accepted"),
            SubmissionOutcome::TransportFailure { .. } => warn!("workflow: not delivered"),
            _ => warn!("workflow: rejected"),
        }
        outcome.render(&mut self.console, weight).await;

        self.console.pause(CYCLE_PAUSE_MS).await;
        self.console.clear();
        Event::Submitted
    }
}
