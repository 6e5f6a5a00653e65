// crates/logging/src/sink.rs
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::writer::MakeWriter;

use crate::handler::FileHandler;

/// Shares one [`FileHandler`] between the layers of a subscriber.
///
/// Each event takes the handler lock for the duration of a single record,
/// so records from different threads never interleave.
#[derive(Clone, Debug)]
pub struct FileWriter {
    handler: Arc<Mutex<FileHandler>>,
}

impl FileWriter {
    pub fn new(handler: FileHandler) -> Self {
        Self {
            handler: Arc::new(Mutex::new(handler)),
        }
    }

    pub fn handler(&self) -> MutexGuard<'_, FileHandler> {
        self.handler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct FileWriterGuard<'a>(MutexGuard<'a, FileHandler>);

impl Write for FileWriterGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> MakeWriter<'a> for FileWriter {
    type Writer = FileWriterGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        FileWriterGuard(self.handler())
    }
}
