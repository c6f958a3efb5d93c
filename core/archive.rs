use crate::entry::Entry;
use crate::error::{AppError, Result};
use crate::pattern::to_slash_path;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub files: usize,
    pub directories: usize,
    pub skipped: usize,
}

/// Streams included walk entries into a deflate-compressed zip file.
pub struct ArchiveWriter {
    path: PathBuf,
    canonical_path: PathBuf,
    zip: ZipWriter<BufWriter<File>>,
    options: SimpleFileOptions,
    stats: ArchiveStats,
}

impl ArchiveWriter {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AppError::DirCreation {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let file = File::create(path).map_err(|e| AppError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        let canonical_path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        log::info!("Creating archive {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            canonical_path,
            zip: ZipWriter::new(BufWriter::new(file)),
            options: SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(0o644),
            stats: ArchiveStats::default(),
        })
    }

    /// Adds the included entries of one walk. Names are relative to `root`,
    /// placed under `prefix` when given.
    pub fn add_entries(&mut self, entries: &[Entry], root: &Path, prefix: Option<&str>) -> Result<()> {
        let prefix = prefix
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty());
        if let Some(prefix) = prefix {
            self.zip.add_directory(format!("{}/", prefix), self.options)?;
            self.stats.directories += 1;
        }

        for entry in entries.iter().filter(|e| e.included) {
            if entry.path == self.canonical_path || entry.path == self.path {
                log::warn!(
                    "Skipping {}: it is the archive being written",
                    entry.path.display()
                );
                self.stats.skipped += 1;
                continue;
            }
            let Some(relative) = pathdiff::diff_paths(&entry.path, root) else {
                self.stats.skipped += 1;
                continue;
            };
            let relative = to_slash_path(&relative);
            if relative.is_empty() || relative == "." {
                continue;
            }
            let name = match prefix {
                Some(prefix) => format!("{}/{}", prefix, relative),
                None => relative,
            };

            if entry.is_dir() {
                self.zip.add_directory(format!("{}/", name), self.options)?;
                self.stats.directories += 1;
                continue;
            }

            let mut source = match File::open(&entry.path) {
                Ok(file) => file,
                Err(e) => {
                    log::warn!("Skipping unreadable file {}: {}", entry.path.display(), e);
                    self.stats.skipped += 1;
                    continue;
                }
            };
            self.zip.start_file(name.as_str(), self.options)?;
            io::copy(&mut source, &mut self.zip).map_err(|e| AppError::FileRead {
                path: entry.path.clone(),
                source: e,
            })?;
            log::trace!("Archived {}", name);
            self.stats.files += 1;
        }
        Ok(())
    }

    pub fn finish(self) -> Result<ArchiveStats> {
        let mut writer = self.zip.finish()?;
        io::Write::flush(&mut writer).map_err(|e| AppError::FileWrite {
            path: self.path.clone(),
            source: e,
        })?;
        log::info!(
            "Archive {} written: {} files, {} directories",
            self.path.display(),
            self.stats.files,
            self.stats.directories
        );
        Ok(self.stats)
    }
}

/// Writes a single walk to `archive_path`.
pub fn write_zip(
    entries: &[Entry],
    root: &Path,
    archive_path: &Path,
    prefix: Option<&str>,
) -> Result<ArchiveStats> {
    let mut writer = ArchiveWriter::create(archive_path)?;
    writer.add_entries(entries, root, prefix)?;
    writer.finish()
}
