//! Batched, cached text translation.
//!
//! [`TranslationPipeline`] resolves texts from a memo table and durable
//! storage first and sends whatever is left to a [`TranslationBackend`] in a
//! single request. The wire types of the `/api/translate` endpoint live here
//! too so the browser client and the server agree on them.

mod cache;
mod pipeline;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cache::{
    cache_key, text_hash, CacheEntry, Clock, SystemClock, TranslationCache, CACHE_KEY_PREFIX,
    CACHE_TTL_MS,
};
pub use pipeline::TranslationPipeline;

use crate::language::Language;

/// Request body of `POST /api/translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    /// Texts to translate, in order.
    pub texts: Vec<String>,
    /// Language to translate into.
    pub target_lang: Language,
}

/// Successful response body of `POST /api/translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateResponse {
    /// One translation per requested text, same order.
    pub translations: Vec<String>,
}

/// Error response body of `POST /api/translate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateErrorBody {
    /// Human readable failure summary.
    pub error: String,
    /// Extra context, e.g. the upstream provider's error payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Why a backend could not translate a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered with a non-success status.
    #[error("translation service returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// The response body could not be decoded.
    #[error("malformed translation response: {0}")]
    Decode(String),
    /// The response did not contain one translation per input.
    #[error("expected {expected} translations, got {actual}")]
    CountMismatch {
        /// Number of texts sent.
        expected: usize,
        /// Number of translations received.
        actual: usize,
    },
}

/// Something that translates an ordered batch of texts in one round trip.
///
/// Implementations must return either an error or exactly one translation per
/// input, in input order. The browser implementation is not `Send`, hence
/// `?Send`.
#[async_trait(?Send)]
pub trait TranslationBackend {
    /// Translate every text in `texts` into `target`.
    async fn translate(
        &self,
        texts: &[String],
        target: Language,
    ) -> Result<Vec<String>, TranslateError>;
}
