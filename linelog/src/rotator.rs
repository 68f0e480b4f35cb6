use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

pub type Compressor = Box<dyn Fn(&Path) -> io::Result<()> + Send + Sync>;

/// Size based rotation policy for one log file.
///
/// Archives are numbered `base.1` (newest) through `base.{max_files - 1}`
/// (oldest); together with the active file at most `max_files` files exist.
pub struct LogRotator {
    base: PathBuf,
    max_size_bytes: u64,
    max_files: usize,
    compress: bool,
    compressor: Option<Compressor>,
}

impl LogRotator {
    pub fn new(base: impl Into<PathBuf>, max_size_mb: u64, max_files: usize, compress: bool) -> Self {
        LogRotator {
            base: base.into(),
            max_size_bytes: max_size_mb.saturating_mul(1024 * 1024),
            max_files,
            compress,
            compressor: None,
        }
    }

    /// Installs the hook run on `base.1` after each rotation when compression
    /// is enabled. Compression itself is left to the hook.
    pub fn with_compressor(mut self, compressor: Compressor) -> Self {
        self.compressor = Some(compressor);
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn should_rotate(&self, current_size: u64) -> bool {
        current_size >= self.max_size_bytes
    }

    /// Path of archive number `index`.
    pub fn archive_path(&self, index: usize) -> PathBuf {
        let mut name = self.base.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// Shifts the archives up by one, moves the active file to `base.1` and
    /// returns a freshly truncated active file.
    ///
    /// On error the caller keeps its current handle, so the only effect of a
    /// failed rotation is that this cycle does not rotate.
    pub fn rotate(&self) -> io::Result<File> {
        if self.max_files > 1 {
            let oldest = self.archive_path(self.max_files - 1);
            if oldest.exists() {
                std::fs::remove_file(&oldest)?;
            }
            for index in (1..self.max_files - 1).rev() {
                let from = self.archive_path(index);
                if from.exists() {
                    std::fs::rename(&from, self.archive_path(index + 1))?;
                }
            }
            let newest = self.archive_path(1);
            if self.base.exists() {
                std::fs::rename(&self.base, &newest)?;
            }
            if self.compress {
                if let Some(compressor) = &self.compressor {
                    if let Err(err) = compressor(&newest) {
                        eprintln!("linelog: compressing {} failed: {err}", newest.display());
                    }
                }
            }
        }
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.base)
    }
}

impl std::fmt::Debug for LogRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRotator")
            .field("base", &self.base)
            .field("max_size_bytes", &self.max_size_bytes)
            .field("max_files", &self.max_files)
            .field("compress", &self.compress)
            .field("compressor", &self.compressor.is_some())
            .finish()
    }
}
