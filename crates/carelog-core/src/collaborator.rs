//! Consumed external collaborator interfaces.
//!
//! The surrounding service wires these to real implementations (a model
//! inference backend, a PDF renderer). The archive core only defines
//! the contracts so callers can be tested against mocks.

use crate::error::Result;
use async_trait::async_trait;

/// Turns a text query (and optional image) into an answer string.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Runs inference for the given query.
    ///
    /// # Arguments
    ///
    /// * `query` - The user's question
    /// * `image` - Optional raw image bytes to ground the answer on
    async fn answer(&self, query: &str, image: Option<&[u8]>) -> Result<String>;
}

/// Renders a PDF byte stream into one or more page images.
#[async_trait]
pub trait PdfRasterizer: Send + Sync {
    /// Returns the encoded page images, in page order.
    async fn rasterize(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>>;
}
