use crate::config::WeightsConfig;
use crate::error::{LensError, Result};
use crate::remote::RemoteSource;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Bytes read from the remote body between progress updates.
pub const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Fraction of the declared length received so far, capped at 1.0.
    Fraction(f64),
    /// No usable length header; only the byte count is known.
    Indeterminate { received: u64 },
}

/// Makes sure a checksum-verified copy of the detector weights is on disk.
pub struct WeightsProvisioner<'a> {
    config: &'a WeightsConfig,
    source: &'a dyn RemoteSource,
}

impl<'a> WeightsProvisioner<'a> {
    pub fn new(config: &'a WeightsConfig, source: &'a dyn RemoteSource) -> Self {
        Self { config, source }
    }

    pub fn path(&self) -> PathBuf {
        self.config.path()
    }

    /// True only when the file exists and its SHA-256 equals the configured digest.
    pub fn is_valid(&self) -> Result<bool> {
        let expected = self
            .config
            .sha256
            .as_deref()
            .ok_or(LensError::MissingWeightsConfig)?;

        let path = self.path();
        if !path.is_file() {
            tracing::debug!("Weights not found at {}", path.display());
            return Ok(false);
        }

        let actual = file_sha256(&path)?;
        let valid = actual.eq_ignore_ascii_case(expected);
        if !valid {
            tracing::info!(
                "Weights at {} have checksum {}, expected {}",
                path.display(),
                actual,
                expected
            );
        }
        Ok(valid)
    }

    /// Return the weights path, downloading first unless the local copy is valid.
    ///
    /// The body is written straight to the target file one chunk at a time, and
    /// `progress` is called after every chunk. A cancelled or failed download
    /// leaves whatever was written in place; it will fail the next checksum.
    pub fn ensure(
        &self,
        progress: &mut dyn FnMut(Progress),
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let path = self.path();
        if self.is_valid()? {
            tracing::debug!("Weights at {} are valid", path.display());
            return Ok(path);
        }

        let (url, expected) = self.config.remote()?;
        if cancel.is_cancelled() {
            return Err(LensError::Cancelled);
        }

        tracing::info!("Downloading weights from {} to {}", url, path.display());
        let body = self.source.open(url)?;
        let total = body.content_length.filter(|len| *len > 0);
        if total.is_none() {
            tracing::warn!("No content length for {}, progress is indeterminate", url);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&path)?;
        let mut reader = body.reader;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut received = 0u64;

        loop {
            if cancel.is_cancelled() {
                tracing::info!("Weights download cancelled after {} bytes", received);
                return Err(LensError::Cancelled);
            }

            let n = read_chunk(&mut reader, &mut buffer)?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])?;
            received += n as u64;

            progress(match total {
                Some(total) => Progress::Fraction((received as f64 / total as f64).min(1.0)),
                None => Progress::Indeterminate { received },
            });
        }
        file.flush()?;
        drop(file);

        let actual = file_sha256(&path)?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(LensError::ChecksumMismatch {
                path,
                expected: expected.to_string(),
                actual,
            });
        }

        tracing::info!("Downloaded {} bytes of weights", received);
        Ok(path)
    }
}

/// Hex SHA-256 of a file, streamed rather than read whole.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Fill `buf` completely unless the reader hits EOF first.
fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most three bytes per read.
    struct Trickle(io::Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(3);
            self.0.read(&mut buf[..len])
        }
    }

    #[test]
    fn read_chunk_fills_across_short_reads() {
        let mut reader = Trickle(io::Cursor::new((0..20u8).collect()));
        let mut buf = [0u8; 8];

        assert_eq!(read_chunk(&mut reader, &mut buf).unwrap(), 8);
        assert_eq!(buf, [0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(read_chunk(&mut reader, &mut buf).unwrap(), 8);
        assert_eq!(read_chunk(&mut reader, &mut buf).unwrap(), 4);
        assert_eq!(read_chunk(&mut reader, &mut buf).unwrap(), 0);
    }

    #[test]
    fn sha256_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
