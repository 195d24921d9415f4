//! Host-side stand-ins for every peripheral the station core talks to.
//!
//! Each mock is a cheap handle around shared state (`Rc<RefCell<_>>`), so a
//! test keeps one clone for scripting/inspection and hands the other to the
//! code under test. All of them run on the simulated clock of [`MockDelay`].

use crate::error::{TransportError, UpdateError};
use crate::keypad::{Key, KeySource};
use crate::maintenance::{FirmwareUpdater, UpdateRequest, UpdateStatus};
use crate::net::{Radio, WifiCredentials};
use crate::submit::{HttpReply, ScanEndpoint, ScanRequest};
use crate::ui::{Line, LineDisplay};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

// ═══════════════════════════════════════════════════════════════════════════
// Clock
// ═══════════════════════════════════════════════════════════════════════════

/// Simulated time budget per test. Anything that sleeps past it is stuck.
const CLOCK_BUDGET_MS: u64 = 10 * 60 * 1000;

/// Delay that advances a shared simulated clock instead of sleeping.
#[derive(Clone, Default)]
pub struct MockDelay {
    now_ns: Rc<Cell<u64>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }

    fn advance_ns(&self, ns: u64) {
        let now = self.now_ns.get() + ns;
        assert!(
            now / 1_000_000 <= CLOCK_BUDGET_MS,
            "simulated clock ran past {CLOCK_BUDGET_MS} ms; is the code waiting on input that never comes?"
        );
        self.now_ns.set(now);
    }
}

impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.advance_ns(u64::from(ns));
    }

    async fn delay_us(&mut self, us: u32) {
        self.advance_ns(u64::from(us) * 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.advance_ns(u64::from(ms) * 1_000_000);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Keypad
// ═══════════════════════════════════════════════════════════════════════════

/// Keypad that replays a script of scan samples, then reads idle.
#[derive(Clone, Default)]
pub struct ScriptedKeys {
    samples: Rc<RefCell<VecDeque<Option<Key>>>>,
}

impl ScriptedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one press-and-release per symbol in `keys`.
    pub fn press(&self, keys: &str) {
        let mut samples = self.samples.borrow_mut();
        for c in keys.chars() {
            let key = Key::from_symbol(c).unwrap_or_else(|| panic!("no key for {c:?}"));
            samples.push_back(Some(key));
            samples.push_back(None);
        }
    }

    /// Queue `key` held down for `scans` consecutive samples, then released.
    pub fn hold(&self, key: Key, scans: usize) {
        let mut samples = self.samples.borrow_mut();
        samples.extend(core::iter::repeat(Some(key)).take(scans));
        samples.push_back(None);
    }

    /// Queue `scans` idle samples.
    pub fn idle(&self, scans: usize) {
        self.samples
            .borrow_mut()
            .extend(core::iter::repeat(None).take(scans));
    }

    pub fn remaining(&self) -> usize {
        self.samples.borrow().len()
    }
}

impl KeySource for ScriptedKeys {
    async fn scan(&mut self) -> Option<Key> {
        self.samples.borrow_mut().pop_front().flatten()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Display
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct Screen {
    lines: [String; 2],
    cursor: usize,
    history: Vec<(Line, String)>,
}

/// Two-line display that remembers every write.
#[derive(Clone, Default)]
pub struct MockDisplay {
    screen: Rc<RefCell<Screen>>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(&self) -> String {
        self.screen.borrow().lines[0].trim_end().to_string()
    }

    pub fn bottom(&self) -> String {
        self.screen.borrow().lines[1].trim_end().to_string()
    }

    /// Every write so far, trailing padding removed.
    pub fn history(&self) -> Vec<(Line, String)> {
        self.screen.borrow().history.clone()
    }

    /// Texts written to one line, in order.
    pub fn written(&self, line: Line) -> Vec<String> {
        self.screen
            .borrow()
            .history
            .iter()
            .filter(|(l, _)| *l == line)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn saw(&self, text: &str) -> bool {
        self.screen.borrow().history.iter().any(|(_, t)| t == text)
    }

    pub fn count(&self, text: &str) -> usize {
        self.screen
            .borrow()
            .history
            .iter()
            .filter(|(_, t)| t == text)
            .count()
    }

    /// Position of the first write of `text` at or after `from`.
    pub fn position_after(&self, from: usize, text: &str) -> Option<usize> {
        self.screen
            .borrow()
            .history
            .iter()
            .skip(from)
            .position(|(_, t)| t == text)
            .map(|p| p + from)
    }

    pub fn forget(&self) {
        self.screen.borrow_mut().history.clear();
    }
}

impl LineDisplay for MockDisplay {
    fn clear_line(&mut self, line: Line) {
        let mut screen = self.screen.borrow_mut();
        let index = line as usize;
        screen.lines[index].clear();
        screen.cursor = index;
    }

    fn write(&mut self, text: &str) {
        let mut screen = self.screen.borrow_mut();
        let index = screen.cursor;
        screen.lines[index].push_str(text);
        let line = if index == 0 { Line::Top } else { Line::Bottom };
        screen.history.push((line, text.trim_end().to_string()));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Serial
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct Wire {
    rx: VecDeque<u8>,
    pending: VecDeque<Vec<u8>>,
    idle_since: Option<u64>,
    fault: Option<embedded_io::ErrorKind>,
}

/// UART receive side driven by the simulated clock.
///
/// `stale` bytes are already buffered when the reader arrives. A scheduled
/// chunk lands one serial poll interval after a reader first finds the
/// line idle, so a reader that drains the buffer and then immediately
/// checks again never sees it early.
#[derive(Clone)]
pub struct MockSerial {
    clock: MockDelay,
    wire: Rc<RefCell<Wire>>,
}

impl MockSerial {
    pub fn new(clock: &MockDelay) -> Self {
        Self {
            clock: clock.clone(),
            wire: Rc::new(RefCell::new(Wire::default())),
        }
    }

    pub fn stale(&self, bytes: &[u8]) {
        self.wire.borrow_mut().rx.extend(bytes.iter().copied());
    }

    pub fn schedule(&self, bytes: &[u8]) {
        self.wire.borrow_mut().pending.push_back(bytes.to_vec());
    }

    pub fn fail_next_read(&self, kind: embedded_io::ErrorKind) {
        self.wire.borrow_mut().fault = Some(kind);
    }

    pub fn pending(&self) -> usize {
        self.wire.borrow().pending.len()
    }

    pub fn buffered(&self) -> usize {
        self.wire.borrow().rx.len()
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        let now = self.clock.elapsed_ms();
        let mut wire = self.wire.borrow_mut();
        if wire.fault.is_some() || !wire.rx.is_empty() {
            return Ok(true);
        }
        match wire.idle_since {
            Some(since) if now > since && now - since <= u64::from(crate::config::SERIAL_POLL_MS) => {
                wire.idle_since = None;
                if let Some(chunk) = wire.pending.pop_front() {
                    wire.rx.extend(chunk);
                }
            }
            Some(since) if now == since => {}
            _ => wire.idle_since = Some(now),
        }
        Ok(!wire.rx.is_empty())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut wire = self.wire.borrow_mut();
        if let Some(kind) = wire.fault.take() {
            return Err(kind);
        }
        let mut n = 0;
        while n < buf.len() {
            match wire.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Radio
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct Link {
    connected: bool,
    /// Link checks before a requested connection comes up; `None` never does.
    up_after: Option<u32>,
    countdown: Option<u32>,
    connect_calls: u32,
    last_ssid: String,
}

#[derive(Clone, Default)]
pub struct MockRadio {
    link: Rc<RefCell<Link>>,
}

impl MockRadio {
    /// Radio that is already associated.
    pub fn connected() -> Self {
        let radio = Self::default();
        {
            let mut link = radio.link.borrow_mut();
            link.connected = true;
            link.up_after = Some(0);
        }
        radio
    }

    /// Radio that is down and comes up `checks` link checks after a connect.
    pub fn up_after(checks: u32) -> Self {
        let radio = Self::default();
        radio.link.borrow_mut().up_after = Some(checks);
        radio
    }

    /// Radio that never associates.
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn drop_link(&self) {
        self.link.borrow_mut().connected = false;
    }

    pub fn set_up_after(&self, checks: Option<u32>) {
        self.link.borrow_mut().up_after = checks;
    }

    pub fn connect_calls(&self) -> u32 {
        self.link.borrow().connect_calls
    }

    pub fn last_ssid(&self) -> String {
        self.link.borrow().last_ssid.clone()
    }
}

impl Radio for MockRadio {
    async fn connect(&mut self, credentials: &WifiCredentials) {
        let mut link = self.link.borrow_mut();
        link.connect_calls += 1;
        link.last_ssid = credentials.ssid.clone();
        link.countdown = link.up_after;
    }

    fn is_connected(&mut self) -> bool {
        let mut link = self.link.borrow_mut();
        match link.countdown {
            Some(0) => {
                link.connected = true;
                link.countdown = None;
            }
            Some(n) => link.countdown = Some(n - 1),
            None => {}
        }
        link.connected
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Submission endpoint
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct Exchange {
    requests: Vec<ScanRequest>,
    replies: VecDeque<Result<HttpReply, TransportError>>,
}

#[derive(Clone, Default)]
pub struct MockEndpoint {
    exchange: Rc<RefCell<Exchange>>,
}

impl MockEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, status: u16, body: &str) {
        self.exchange.borrow_mut().replies.push_back(Ok(HttpReply {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub fn fail(&self, detail: &str) {
        self.exchange
            .borrow_mut()
            .replies
            .push_back(Err(TransportError::new(detail)));
    }

    pub fn requests(&self) -> Vec<ScanRequest> {
        self.exchange.borrow().requests.clone()
    }
}

impl ScanEndpoint for MockEndpoint {
    async fn post(&mut self, request: &ScanRequest) -> Result<HttpReply, TransportError> {
        let mut exchange = self.exchange.borrow_mut();
        exchange.requests.push(request.clone());
        exchange
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no reply scripted")))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Firmware updater
// ═══════════════════════════════════════════════════════════════════════════

struct UpdateLog {
    calls: Vec<UpdateRequest>,
    result: Result<UpdateStatus, UpdateError>,
    restarts: u32,
}

#[derive(Clone)]
pub struct MockUpdater {
    log: Rc<RefCell<UpdateLog>>,
}

impl MockUpdater {
    pub fn returning(result: Result<UpdateStatus, UpdateError>) -> Self {
        Self {
            log: Rc::new(RefCell::new(UpdateLog {
                calls: Vec::new(),
                result,
                restarts: 0,
            })),
        }
    }

    pub fn calls(&self) -> Vec<UpdateRequest> {
        self.log.borrow().calls.clone()
    }

    pub fn restarts(&self) -> u32 {
        self.log.borrow().restarts
    }
}

impl Default for MockUpdater {
    fn default() -> Self {
        Self::returning(Ok(UpdateStatus::UpToDate))
    }
}

impl FirmwareUpdater for MockUpdater {
    async fn check_and_install(
        &mut self,
        request: &UpdateRequest,
    ) -> Result<UpdateStatus, UpdateError> {
        let mut log = self.log.borrow_mut();
        log.calls.push(request.clone());
        log.result.clone()
    }

    async fn restart(&mut self) {
        self.log.borrow_mut().restarts += 1;
    }
}
