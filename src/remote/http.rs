use super::{RemoteBody, RemoteSource};
use crate::error::{LensError, Result};
use reqwest::blocking::Client;

/// Blocking HTTP client. Each `open` blocks the calling thread until headers arrive.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("drivelens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| LensError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

impl RemoteSource for HttpSource {
    fn open(&self, url: &str) -> Result<RemoteBody> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| LensError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LensError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(RemoteBody {
            content_length: response.content_length(),
            reader: Box::new(response),
        })
    }
}
