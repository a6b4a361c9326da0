//! Output targets for the spinner.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Anything the render task can write frames to.
pub type Sink = Box<dyn Write + Send>;

/// The process's standard output, the default sink.
pub fn stdout() -> Sink {
    Box::new(io::stdout())
}

pub fn stderr() -> Sink {
    Box::new(io::stderr())
}

/// An in-memory sink whose clones share one buffer.
///
/// Hand one clone to the spinner and keep another to inspect what was
/// written.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
