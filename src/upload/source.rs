//! Selected file
//!
//! A file chosen for upload, backed either by memory or by a path on disk.
//! Disk-backed files are read one part at a time.

use super::chunker::PartRange;
use super::UploadError;
use bytes::Bytes;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Debug, Clone)]
enum Source {
    Memory(Bytes),
    Disk(PathBuf),
}

/// File selected for upload; immutable once created
#[derive(Debug, Clone)]
pub struct UploadFile {
    name: String,
    size: u64,
    source: Source,
}

impl UploadFile {
    /// Wrap an in-memory buffer
    pub fn from_bytes(name: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            size: data.len() as u64,
            source: Source::Memory(data),
        }
    }

    /// Stat a file on disk without reading it
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(UploadError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            size: meta.len(),
            source: Source::Disk(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the bytes of one part
    pub async fn read_range(&self, range: &PartRange) -> Result<Bytes, UploadError> {
        if range.end > self.size || range.start > range.end {
            return Err(UploadError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "range {}..{} outside file of {} bytes",
                    range.start, range.end, self.size
                ),
            )));
        }

        match &self.source {
            Source::Memory(data) => Ok(data.slice(range.start as usize..range.end as usize)),
            Source::Disk(path) => {
                let mut file = tokio::fs::File::open(path).await?;
                file.seek(SeekFrom::Start(range.start)).await?;
                let mut buf = vec![0u8; range.len() as usize];
                file.read_exact(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Read the whole file. Only used for direct uploads.
    pub async fn read_all(&self) -> Result<Bytes, UploadError> {
        match &self.source {
            Source::Memory(data) => Ok(data.clone()),
            Source::Disk(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }
}
