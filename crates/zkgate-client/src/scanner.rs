//! Scanner resource handling.
//!
//! The scan source stands in for the camera. Whatever else happens during
//! a check-in, the source must end up released: stop, a successful scan,
//! and drop all release it.

use zkgate_types::{GateError, GateResult};

/// Camera stand-in. Implementations deliver QR payloads as strings.
pub trait ScanSource: Send {
    fn open(&mut self) -> GateResult<()>;
    fn close(&mut self);
    /// Next decoded payload, `None` when no code is in view yet.
    fn poll(&mut self) -> GateResult<Option<String>>;
}

pub struct Scanner<S: ScanSource> {
    source: S,
    open: bool,
}

impl<S: ScanSource> Scanner<S> {
    /// Acquire the source and start scanning.
    pub fn start(mut source: S) -> GateResult<Self> {
        source.open()?;
        Ok(Self { source, open: true })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Poll for the next payload. A successful scan releases the source;
    /// call [`Scanner::resume`] to scan again.
    pub fn poll(&mut self) -> GateResult<Option<String>> {
        if !self.open {
            return Err(GateError::Internal("scanner is not running".into()));
        }
        match self.source.poll() {
            Ok(Some(payload)) => {
                self.stop();
                Ok(Some(payload))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.stop();
                Err(e)
            }
        }
    }

    /// Re-acquire the source after a scan or a stop.
    pub fn resume(&mut self) -> GateResult<()> {
        if !self.open {
            self.source.open()?;
            self.open = true;
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.open {
            self.source.close();
            self.open = false;
        }
    }
}

impl<S: ScanSource> Drop for Scanner<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
