//! Size-bounded rotating file writer
//!
//! `RotatingWriter` is the rotation collaborator behind the file hook: a
//! plain `std::io::Write` sink whose rotation policy is pure configuration.
//! When the active file would exceed the size limit it is renamed to
//! `<name>.1`, existing backups cascade upward, backups beyond the retention
//! count or older than the age limit are pruned, and a fresh file is
//! started. The file is opened lazily on first write, so construction never
//! fails; the only failure mode is at write time.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const MEGABYTE: u64 = 1024 * 1024;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Rotation policy: limits are configuration, not behavior.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    /// Maximum size of the active file in megabytes; 0 uses the default
    /// of 100.
    pub max_size: u64,
    /// Rotated files to retain; 0 keeps all.
    pub max_backups: usize,
    /// Maximum age of rotated files in days; 0 disables age pruning.
    pub max_age_days: u64,
    /// Gzip rotated files.
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: 100,
            max_backups: 0,
            max_age_days: 0,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, megabytes: u64) -> Self {
        self.max_size = megabytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    fn max_bytes(&self) -> u64 {
        if self.max_size == 0 {
            100 * MEGABYTE
        } else {
            self.max_size * MEGABYTE
        }
    }
}

pub struct RotatingWriter {
    path: PathBuf,
    policy: RotationPolicy,
    file: Option<File>,
    current_size: u64,
}

impl RotatingWriter {
    /// Infallible; the file is not touched until the first write.
    pub fn new<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            policy,
            file: None,
            current_size: 0,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    fn open(&mut self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.current_size = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    /// Backup path for index `i`: `<filename>.<i>`.
    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn gz_path(path: &Path) -> PathBuf {
        let mut name: OsString = path.as_os_str().to_os_string();
        name.push(".gz");
        PathBuf::from(name)
    }

    /// Highest backup index currently on disk.
    fn highest_backup_index(&self) -> usize {
        let mut highest = 0;
        for index in 1.. {
            let path = self.backup_path(index);
            if path.exists() || Self::gz_path(&path).exists() {
                highest = index;
            } else {
                break;
            }
        }
        highest
    }

    fn rotate(&mut self) -> io::Result<()> {
        // Release the handle before renaming.
        self.file.take();

        // Prune the backup that would exceed the retention count.
        let cascade_from = if self.policy.max_backups > 0 {
            let oldest = self.backup_path(self.policy.max_backups);
            for stale in [Self::gz_path(&oldest), oldest] {
                if stale.exists() {
                    fs::remove_file(&stale)?;
                }
            }
            self.policy.max_backups.saturating_sub(1)
        } else {
            self.highest_backup_index()
        };

        // Cascade existing backups: .N -> .N+1, oldest first.
        for index in (1..=cascade_from).rev() {
            let old = self.backup_path(index);
            let new = self.backup_path(index + 1);
            let old_gz = Self::gz_path(&old);
            if old_gz.exists() {
                fs::rename(&old_gz, Self::gz_path(&new))?;
            } else if old.exists() {
                fs::rename(&old, &new)?;
            }
        }

        // Current file becomes .1.
        if self.path.exists() {
            let backup = self.backup_path(1);
            fs::rename(&self.path, &backup)?;
            if self.policy.compress {
                if let Err(e) = self.compress_backup(&backup) {
                    eprintln!(
                        "[WARN] Failed to compress rotated file {}: {}",
                        backup.display(),
                        e
                    );
                }
            }
        }

        self.prune_aged();
        self.open()
    }

    /// Remove rotated files older than the age limit. Best effort; pruning
    /// failures never fail a rotation.
    fn prune_aged(&self) {
        if self.policy.max_age_days == 0 {
            return;
        }
        let cutoff = self.policy.max_age_days * DAY.as_secs();
        for index in 1..=self.highest_backup_index() {
            let plain = self.backup_path(index);
            for candidate in [Self::gz_path(&plain), plain] {
                let Ok(metadata) = fs::metadata(&candidate) else {
                    continue;
                };
                let age = metadata
                    .modified()
                    .ok()
                    .and_then(|m| SystemTime::now().duration_since(m).ok());
                if age.is_some_and(|a| a.as_secs() > cutoff) {
                    if let Err(e) = fs::remove_file(&candidate) {
                        eprintln!(
                            "[WARN] Failed to remove aged backup {}: {}",
                            candidate.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    /// Gzip a rotated file in place: stream into a temp file, then swap.
    /// The original is removed only after compression fully succeeds.
    fn compress_backup(&self, path: &Path) -> io::Result<()> {
        use std::io::{BufReader, BufWriter, Read};

        let gz_path = Self::gz_path(path);
        let tmp_path = {
            let mut name = gz_path.as_os_str().to_os_string();
            name.push(".tmp");
            PathBuf::from(name)
        };

        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&tmp_path)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());

        let result: io::Result<()> = (|| {
            let mut buffer = vec![0u8; 64 * 1024];
            loop {
                let n = reader.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                encoder.write_all(&buffer[..n])?;
            }
            encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
            fs::rename(&tmp_path, &gz_path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::remove_file(path)
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.file.is_none() {
            self.open()?;
        }

        if self.current_size > 0 && self.current_size + buf.len() as u64 > self.policy.max_bytes()
        {
            if let Err(e) = self.rotate() {
                // Rotation failure must not lose the record; keep writing to
                // the current file and let it grow past the limit.
                eprintln!("[WARN] Log rotation failed: {}. Continuing with current file.", e);
                if self.file.is_none() {
                    self.open()?;
                }
                self.current_size = 0;
            }
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file not open"))?;
        let n = file.write(buf)?;
        self.current_size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
    }
}
