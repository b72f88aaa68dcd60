use super::{RemoteBody, RemoteSource};
use crate::error::{LensError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Serves plain paths and `file://` URLs from the local filesystem.
pub struct FileSource;

impl RemoteSource for FileSource {
    fn open(&self, url: &str) -> Result<RemoteBody> {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        if !path.is_file() {
            return Err(LensError::NotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let len = file.metadata()?.len();

        Ok(RemoteBody {
            content_length: Some(len),
            reader: Box::new(BufReader::new(file)),
        })
    }
}
