use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::file::open_append;
use super::{terminated, LogOutput};
use crate::mutex::Mutex;
use crate::rotator::LogRotator;

struct RotatingState {
    file: Option<File>,
    good: bool,
    written: u64,
    rotator: LogRotator,
    buffer: Vec<u8>,
    /// Set by a failed rotation until taken.
    rotation_error: Option<String>,
}

/// File output that rolls the file over once it reaches the rotator's size.
///
/// The size check, the rotation and the write all happen under one lock.
/// A failed rotation keeps writing to the current file and leaves an error
/// for [`RotatingFileOutput::take_rotation_error`].
pub struct RotatingFileOutput {
    state: Mutex<RotatingState>,
}

impl RotatingFileOutput {
    pub fn open(path: impl AsRef<Path>, max_size_mb: u64, max_files: usize, compress: bool) -> Self {
        RotatingFileOutput::with_rotator(LogRotator::new(path.as_ref(), max_size_mb, max_files, compress))
    }

    pub fn with_rotator(rotator: LogRotator) -> Self {
        let (file, written) = match open_append(rotator.base()) {
            Ok(file) => {
                let written = file.metadata().map(|meta| meta.len()).unwrap_or(0);
                (Some(file), written)
            }
            Err(err) => {
                eprintln!(
                    "linelog: failed to open log file {}: {err}",
                    rotator.base().display()
                );
                (None, 0)
            }
        };
        RotatingFileOutput {
            state: Mutex::new(RotatingState {
                good: file.is_some(),
                file,
                written,
                rotator,
                buffer: Vec::new(),
                rotation_error: None,
            }),
        }
    }

    /// Bytes written to the active file since it was opened or last rotated.
    pub fn written(&self) -> u64 {
        self.state.lock().written
    }

    pub fn take_rotation_error(&self) -> Option<String> {
        self.state.lock().rotation_error.take()
    }
}

impl LogOutput for RotatingFileOutput {
    fn write_log(&self, line: &str) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.file.is_none() {
            return false;
        }
        if state.rotator.should_rotate(state.written) {
            match state.rotator.rotate() {
                Ok(file) => {
                    state.file = Some(file);
                    state.good = true;
                    state.written = 0;
                }
                Err(err) => {
                    let message = format!("rotating {}: {err}", state.rotator.base().display());
                    eprintln!("linelog: {} {message}", crate::LoggingError::RotationFailed);
                    state.rotation_error = Some(message);
                }
            }
        }
        let Some(file) = state.file.as_mut() else {
            return false;
        };
        let bytes = terminated(&mut state.buffer, line);
        let ok = file.write_all(bytes).and_then(|()| file.flush()).is_ok();
        if ok {
            state.written += bytes.len() as u64;
        }
        state.good &= ok;
        state.good
    }

    fn is_valid(&self) -> bool {
        let state = self.state.lock();
        state.file.is_some() && state.good
    }
}

impl std::fmt::Debug for RotatingFileOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RotatingFileOutput")
            .field("rotator", &state.rotator)
            .field("written", &state.written)
            .finish()
    }
}
