use super::{RemoteBody, RemoteSource};
use crate::error::{LensError, Result};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory resources keyed by exact URL. Counts every `open` call.
#[derive(Default)]
pub struct MemorySource {
    resources: HashMap<String, (Vec<u8>, Option<u64>)>,
    opens: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource whose declared length is its real length.
    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        let len = bytes.len() as u64;
        self.resources.insert(url.into(), (bytes, Some(len)));
    }

    /// Register a resource with an arbitrary (possibly missing or wrong) declared length.
    pub fn insert_with_length(
        &mut self,
        url: impl Into<String>,
        bytes: Vec<u8>,
        content_length: Option<u64>,
    ) {
        self.resources.insert(url.into(), (bytes, content_length));
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl RemoteSource for MemorySource {
    fn open(&self, url: &str) -> Result<RemoteBody> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let (bytes, content_length) = self
            .resources
            .get(url)
            .ok_or_else(|| LensError::NotFound(url.to_string()))?;

        Ok(RemoteBody {
            content_length: *content_length,
            reader: Box::new(Cursor::new(bytes.clone())),
        })
    }
}
