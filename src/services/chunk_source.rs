//! Streaming byte-chunk source for the remote product CSV.
//!
//! A `ChunkSource` opens one streaming GET and yields body chunks as the
//! transport delivers them. Chunk boundaries are whatever the transport
//! produces; only ordering is guaranteed. No retries happen at this layer —
//! a broken connection surfaces as a `TransportError` and the caller decides
//! what to do with the open upload session.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use thiserror::Error;

/// Default location of the OpenFoodFacts product dump.
pub const DEFAULT_SOURCE_URL: &str =
    "https://static.openfoodfacts.org/data/en.openfoodfacts.org.products.csv";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("source request failed")]
    Http(#[from] reqwest::Error),
    #[error("source stream interrupted")]
    Interrupted(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// A finite, lazy, non-restartable sequence of body chunks.
pub type ChunkStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Produces the chunk stream for one transfer.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Open the source and return its chunk stream.
    ///
    /// Fails if the connection cannot be established or the server rejects
    /// the request; mid-stream failures are delivered as stream items.
    async fn fetch(&self) -> Result<ChunkStream, TransportError>;
}

/// `ChunkSource` backed by a single streaming HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpChunkSource {
    client: reqwest::Client,
    url: String,
}

impl HttpChunkSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn fetch(&self) -> Result<ChunkStream, TransportError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(url = %self.url, "source stream opened");

        // Connection resets mid-body show up here as stream items.
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|err| TransportError::Interrupted(err.into())));

        Ok(stream.boxed())
    }
}
