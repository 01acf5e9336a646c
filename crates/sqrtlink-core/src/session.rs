use std::time::Duration;

use sqrtlink_codec::{fixed, CodecError, DeviceResponse, WireFrame};

use crate::framelog::{Direction, FrameLog};
use crate::transport::{BusTransport, DigitalOutput, Level, TransportError};

/// Where a session is within one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Resetting,
    Writing,
    PostWriteReset,
    Reading,
    Decoding,
    FinalReset,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long each level of a reset pulse is held.
    pub reset_hold: Duration,
    /// Wait after the operand write, before the post-write reset.
    pub settle: Duration,
    /// Number of raw frames kept in the frame log.
    pub log_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reset_hold: Duration::from_millis(100),
            settle: Duration::from_millis(100),
            log_capacity: 64,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Owns the bus and the reset line for one peripheral.
///
/// Every call to [`DeviceSession::submit`] runs the full sequence: reset,
/// write the operand, reset, read the result, reset. Holds are blocking
/// sleeps and a stuck transfer blocks the caller; there is no timeout.
pub struct DeviceSession<B, P> {
    bus: B,
    reset: P,
    cfg: SessionConfig,
    phase: Phase,
    log: FrameLog,
}

impl<B: BusTransport, P: DigitalOutput> DeviceSession<B, P> {
    /// Take ownership of the hardware and drive the reset line low.
    pub fn new(bus: B, mut reset: P, cfg: SessionConfig) -> Result<Self, TransportError> {
        reset.set_level(Level::Low)?;
        log::info!(
            "session ready (reset hold {:?}, settle {:?})",
            cfg.reset_hold,
            cfg.settle
        );
        let log = FrameLog::new(cfg.log_capacity);
        Ok(Self {
            bus,
            reset,
            cfg,
            phase: Phase::Idle,
            log,
        })
    }

    /// Send `operand` to the peripheral and return the decoded result.
    ///
    /// Performs exactly two transfers and never retries. A failure after the
    /// reset line was first raised drives it low again. Either way the
    /// session is back in [`Phase::Idle`].
    pub fn submit(&mut self, operand: f64) -> Result<f64, SessionError> {
        let result = self.run(operand);
        if let Err(e) = &result {
            log::warn!("request for {operand} aborted in {:?}: {e}", self.phase);
            if self.phase != Phase::Idle {
                if let Err(e) = self.reset.set_level(Level::Low) {
                    log::warn!("could not release reset line: {e}");
                }
            }
        }
        self.enter(Phase::Idle);
        result
    }

    fn run(&mut self, operand: f64) -> Result<f64, SessionError> {
        // encode before touching the hardware so a bad operand leaves no trace
        let word = fixed::encode(operand)?;

        self.enter(Phase::Resetting);
        self.pulse(true)?;

        self.enter(Phase::Writing);
        self.exchange(WireFrame::write(word))?;
        std::thread::sleep(self.cfg.settle);

        self.enter(Phase::PostWriteReset);
        self.pulse(false)?;

        self.enter(Phase::Reading);
        let raw = self.exchange(WireFrame::read_request())?;

        self.enter(Phase::Decoding);
        let response = DeviceResponse::new(raw)?;
        let value = response.decode();
        log::debug!(
            "result bytes {:02X?} (echo {:#04x}) -> {value}",
            response.result_bytes(),
            response.echo()
        );

        self.enter(Phase::FinalReset);
        self.pulse(false)?;

        Ok(value)
    }

    fn pulse(&mut self, trailing_hold: bool) -> Result<(), TransportError> {
        self.reset.set_level(Level::High)?;
        std::thread::sleep(self.cfg.reset_hold);
        self.reset.set_level(Level::Low)?;
        if trailing_hold {
            std::thread::sleep(self.cfg.reset_hold);
        }
        Ok(())
    }

    fn exchange(&mut self, frame: WireFrame) -> Result<Vec<u8>, TransportError> {
        let out = frame.as_bytes();
        self.log.push(Direction::Tx, out.to_vec());
        let rx = self.bus.transfer(&out)?;
        self.log.push(Direction::Rx, rx.clone());
        log::debug!(
            "{:?} @ {:#05x} tx {:02X?} rx {:02X?}",
            frame.selector(),
            frame.selector().register_address(),
            out,
            rx
        );
        if rx.len() != out.len() {
            return Err(TransportError::LengthMismatch {
                sent: out.len(),
                received: rx.len(),
            });
        }
        Ok(rx)
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn frame_log(&self) -> &FrameLog {
        &self.log
    }

    pub fn into_parts(self) -> (B, P) {
        (self.bus, self.reset)
    }
}
