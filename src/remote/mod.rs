mod file;
mod http;
mod memory;

pub use file::FileSource;
pub use http::HttpSource;
pub use memory::MemorySource;

use crate::error::Result;
use std::io::Read;

/// Upper bound on what a declared length may pre-allocate; the rest grows as bytes arrive.
const PREALLOC_LIMIT: u64 = 1 << 20;

/// An opened remote resource: the declared length, if any, and a reader over its bytes.
pub struct RemoteBody {
    pub content_length: Option<u64>,
    pub reader: Box<dyn Read + Send>,
}

impl RemoteBody {
    pub fn read_all(mut self) -> Result<Vec<u8>> {
        let capacity = self
            .content_length
            .map_or(0, |n| n.min(PREALLOC_LIMIT) as usize);
        let mut bytes = Vec::with_capacity(capacity);
        self.reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Trait for anything that can hand out resources by URL
pub trait RemoteSource {
    /// Open a resource for streaming
    fn open(&self, url: &str) -> Result<RemoteBody>;
}

impl<T: RemoteSource + ?Sized> RemoteSource for std::sync::Arc<T> {
    fn open(&self, url: &str) -> Result<RemoteBody> {
        (**self).open(url)
    }
}

/// Routes `http(s)://` URLs to HTTP and everything else to the local filesystem.
pub struct SchemeSource {
    http: HttpSource,
    file: FileSource,
}

impl SchemeSource {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpSource::new()?,
            file: FileSource,
        })
    }
}

impl RemoteSource for SchemeSource {
    fn open(&self, url: &str) -> Result<RemoteBody> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.http.open(url)
        } else {
            self.file.open(url)
        }
    }
}
