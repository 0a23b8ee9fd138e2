//! Platform independent core of the Regional Pulse site.
//!
//! Everything here compiles for both the browser (`wasm32`) and the native
//! backend, and is tested natively. Browser specifics (localStorage, DOM,
//! `IntersectionObserver`) stay behind the traits defined in this crate:
//! [`storage::KeyValueStore`], [`orchestrator::PageDocument`] and
//! [`translation::TranslationBackend`].

pub mod content;
pub mod language;
pub mod motion;
pub mod orchestrator;
pub mod storage;
pub mod translation;

pub use language::{Language, LanguageChange, LanguageStore, Subscription};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use translation::{
    TranslateError, TranslateErrorBody, TranslateRequest, TranslateResponse, TranslationBackend,
    TranslationPipeline,
};
