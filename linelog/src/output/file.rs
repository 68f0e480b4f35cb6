use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{terminated, LogOutput};
use crate::mutex::Mutex;

struct FileState {
    file: Option<File>,
    good: bool,
    buffer: Vec<u8>,
}

/// Appends lines to a single file, unbuffered.
///
/// Opening failures leave the output invalid instead of failing construction.
/// After a failed write the output stays invalid.
pub struct FileOutput {
    path: PathBuf,
    state: Mutex<FileState>,
}

pub(crate) fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

impl FileOutput {
    pub fn open(path: impl Into<PathBuf>) -> FileOutput {
        let path = path.into();
        let file = match open_append(&path) {
            Ok(file) => Some(file),
            Err(err) => {
                eprintln!("linelog: failed to open log file {}: {err}", path.display());
                None
            }
        };
        FileOutput {
            path,
            state: Mutex::new(FileState {
                good: file.is_some(),
                file,
                buffer: Vec::new(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogOutput for FileOutput {
    fn write_log(&self, line: &str) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(file) = state.file.as_mut() else {
            return false;
        };
        let bytes = terminated(&mut state.buffer, line);
        let ok = file.write_all(bytes).and_then(|()| file.flush()).is_ok();
        state.good &= ok;
        state.good
    }

    fn is_valid(&self) -> bool {
        let state = self.state.lock();
        state.file.is_some() && state.good
    }
}

impl std::fmt::Debug for FileOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileOutput")
            .field("path", &self.path)
            .field("valid", &self.is_valid())
            .finish()
    }
}
