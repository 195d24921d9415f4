//! Terminator-delimited frame reading over a UART.
//!
//! Both peripheral channels speak the same framing: bytes accumulate until
//! a terminator byte, which ends the frame and is not part of it.
//!
//! | Channel | Baud    | Terminator |
//! |---------|---------|------------|
//! | Scale   | 9600    | `\r`       |
//! | Scanner | 115200  | `=`        |
//!
//! [`FrameReader::poll`] is the non-blocking step (drain whatever is
//! buffered, hand back a frame if one completed). [`FrameReader::read_frame`]
//! is the blocking read built on it: drop stale input, then poll every
//! [`SERIAL_POLL_MS`] until a frame, a fault, or the optional timeout.

pub mod weight;

use crate::config::{MAX_FRAME_LEN, SERIAL_POLL_MS};
use crate::error::FrameError;
use alloc::vec::Vec;
use embedded_hal_async::delay::DelayNs;
use embedded_io::{Error as _, Read, ReadReady};

pub struct FrameReader<S> {
    port: S,
    terminator: u8,
    frame: Vec<u8>,
}

impl<S> FrameReader<S>
where
    S: Read + ReadReady,
{
    pub fn new(port: S, terminator: u8) -> Self {
        Self {
            port,
            terminator,
            frame: Vec::new(),
        }
    }

    pub fn terminator(&self) -> u8 {
        self.terminator
    }

    /// Throw away everything received so far, including a partial frame.
    pub fn discard_stale(&mut self) -> Result<usize, FrameError> {
        let mut scratch = [0u8; 32];
        let mut dropped = self.frame.len();
        self.frame.clear();
        while self.port.read_ready().map_err(|e| e.kind())? {
            let n = self.port.read(&mut scratch).map_err(|e| e.kind())?;
            if n == 0 {
                break;
            }
            dropped += n;
        }
        if dropped > 0 {
            debug!("serial: dropped {} stale bytes", dropped);
        }
        Ok(dropped)
    }

    /// Consume the bytes available right now.
    ///
    /// Returns the completed frame (terminator stripped) as soon as the
    /// terminator is seen; bytes after it stay buffered in the port.
    pub fn poll(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let mut byte = [0u8; 1];
        loop {
            let ready = match self.port.read_ready() {
                Ok(ready) => ready,
                Err(e) => return Err(self.fault(e.kind())),
            };
            if !ready {
                return Ok(None);
            }
            match self.port.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {}
                Err(e) => return Err(self.fault(e.kind())),
            }

            if byte[0] == self.terminator {
                return Ok(Some(core::mem::take(&mut self.frame)));
            }
            if self.frame.len() >= MAX_FRAME_LEN {
                warn!("serial: frame exceeded {} bytes, dropped", MAX_FRAME_LEN);
                self.frame.clear();
                return Err(FrameError::Overflow);
            }
            self.frame.push(byte[0]);
        }
    }

    /// Block until a fresh frame arrives.
    ///
    /// `timeout_ms = None` waits indefinitely.
    pub async fn read_frame<D: DelayNs>(
        &mut self,
        delay: &mut D,
        timeout_ms: Option<u32>,
    ) -> Result<Vec<u8>, FrameError> {
        self.discard_stale()?;
        let mut budget = timeout_ms.map(|ms| ms.div_ceil(SERIAL_POLL_MS));
        loop {
            if let Some(frame) = self.poll()? {
                return Ok(frame);
            }
            if let Some(left) = budget.as_mut() {
                if *left == 0 {
                    self.frame.clear();
                    return Err(FrameError::Timeout);
                }
                *left -= 1;
            }
            delay.delay_ms(SERIAL_POLL_MS).await;
        }
    }

    fn fault(&mut self, kind: embedded_io::ErrorKind) -> FrameError {
        warn!("serial: read fault {}", kind);
        self.frame.clear();
        FrameError::Serial(kind)
    }
}

/// Frame bytes as display text: lossy UTF-8, surrounding whitespace removed.
pub fn frame_text(frame: &[u8]) -> alloc::string::String {
    alloc::string::String::from_utf8_lossy(frame).trim().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDelay, MockSerial};
    use embassy_futures::block_on;

    fn reader(delay: &MockDelay, terminator: u8) -> (MockSerial, FrameReader<MockSerial>) {
        let serial = MockSerial::new(delay);
        (serial.clone(), FrameReader::new(serial, terminator))
    }

    #[test]
    fn poll_returns_frame_without_terminator() {
        let delay = MockDelay::new();
        let (serial, mut rd) = reader(&delay, b'=');
        serial.stale(b"PC-0042=");

        assert_eq!(rd.poll(), Ok(Some(b"PC-0042".to_vec())));
    }

    #[test]
    fn poll_keeps_partial_frame_between_calls() {
        let delay = MockDelay::new();
        let (serial, mut rd) = reader(&delay, b'\r');
        serial.stale(b"ST,GS,");
        assert_eq!(rd.poll(), Ok(None));

        serial.stale(b"1.25,kg\r");
        assert_eq!(rd.poll(), Ok(Some(b"ST,GS,1.25,kg".to_vec())));
    }

    #[test]
    fn poll_leaves_bytes_after_terminator_buffered() {
        let delay = MockDelay::new();
        let (serial, mut rd) = reader(&delay, b'=');
        serial.stale(b"A=B=");

        assert_eq!(rd.poll(), Ok(Some(b"A".to_vec())));
        assert_eq!(serial.buffered(), 2);
        assert_eq!(rd.poll(), Ok(Some(b"B".to_vec())));
    }

    #[test]
    fn read_frame_ignores_bytes_buffered_before_the_call() {
        let delay = MockDelay::new();
        let (serial, mut rd) = reader(&delay, b'\r');
        serial.stale(b"ST,GS,9.99,kg\rST,GS,8.");
        serial.schedule(b"ST,GS,1.50,kg\r");

        let mut d = delay.clone();
        let frame = block_on(rd.read_frame(&mut d, None)).unwrap();
        assert_eq!(frame, b"ST,GS,1.50,kg".to_vec());
    }

    #[test]
    fn read_frame_sleeps_between_polls() {
        let delay = MockDelay::new();
        let (serial, mut rd) = reader(&delay, b'=');
        serial.schedule(b"XYZ=");

        let mut d = delay.clone();
        assert_eq!(block_on(rd.read_frame(&mut d, None)), Ok(b"XYZ".to_vec()));
        assert_eq!(delay.elapsed_ms(), u64::from(SERIAL_POLL_MS));
    }

    #[test]
    fn empty_frame_is_returned_as_is() {
        let delay = MockDelay::new();
        let (serial, mut rd) = reader(&delay, b'=');
        serial.schedule(b"=");

        let mut d = delay.clone();
        assert_eq!(block_on(rd.read_frame(&mut d, None)), Ok(Vec::new()));
    }

    #[test]
    fn read_frame_times_out_when_configured() {
        let delay = MockDelay::new();
        let (_serial, mut rd) = reader(&delay, b'\r');

        let mut d = delay.clone();
        assert_eq!(block_on(rd.read_frame(&mut d, Some(100))), Err(FrameError::Timeout));
        assert_eq!(delay.elapsed_ms(), 100);
    }

    #[test]
    fn overflow_drops_the_partial_frame() {
        let delay = MockDelay::new();
        let (serial, mut rd) = reader(&delay, b'=');
        serial.stale(&[b'x'; MAX_FRAME_LEN + 1]);

        assert_eq!(rd.poll(), Err(FrameError::Overflow));
        serial.stale(b"ok=");
        assert_eq!(rd.poll(), Ok(Some(b"ok".to_vec())));
    }

    #[test]
    fn channel_fault_is_reported() {
        let delay = MockDelay::new();
        let (serial, mut rd) = reader(&delay, b'\r');
        serial.fail_next_read(embedded_io::ErrorKind::Other);

        assert_eq!(
            rd.poll(),
            Err(FrameError::Serial(embedded_io::ErrorKind::Other))
        );
    }

    #[test]
    fn frame_text_trims_and_tolerates_bad_utf8() {
        assert_eq!(frame_text(b"  PC-7 \r\n"), "PC-7");
        assert_eq!(frame_text(&[b'A', 0xFF, b'B']), "A\u{FFFD}B");
    }
}
