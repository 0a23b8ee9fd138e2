use std::collections::HashMap;

use super::{cache::TranslationCache, TranslateError, TranslationBackend};
use crate::{language::Language, storage::KeyValueStore};

/// Cache-first batch translator.
///
/// Every call resolves cached texts locally and sends the remaining distinct
/// texts to the backend in at most one request. Failures degrade to the
/// untranslated input and are never returned to the caller.
///
/// Overlapping calls for the same texts are not merged; each may miss the
/// cache and hit the backend independently.
pub struct TranslationPipeline<S, B> {
    cache: TranslationCache<S>,
    backend: B,
}

impl<S: KeyValueStore, B: TranslationBackend> TranslationPipeline<S, B> {
    /// Pipeline over an existing cache.
    pub fn new(cache: TranslationCache<S>, backend: B) -> Self {
        Self {
            cache,
            backend,
        }
    }

    /// The cache in front of the backend.
    pub fn cache(&self) -> &TranslationCache<S> {
        &self.cache
    }

    /// The backend resolving cache misses.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Translate `texts` into `target`, returning one string per input in
    /// input order.
    pub async fn translate_batch(&self, texts: &[String], target: Language) -> Vec<String> {
        let mut resolved: Vec<Option<String>> = Vec::with_capacity(texts.len());
        // Distinct pending texts in first-seen order, and which inputs wait
        // on each of them.
        let mut pending: Vec<String> = Vec::new();
        let mut waiting: Vec<Vec<usize>> = Vec::new();
        let mut pending_slot: HashMap<&str, usize> = HashMap::new();

        for (index, text) in texts.iter().enumerate() {
            if let Some(hit) = self.cache.lookup(text, target) {
                resolved.push(Some(hit));
                continue;
            }
            resolved.push(None);
            let slot = *pending_slot.entry(text.as_str()).or_insert_with(|| {
                pending.push(text.clone());
                waiting.push(Vec::new());
                pending.len() - 1
            });
            waiting[slot].push(index);
        }

        if pending.is_empty() {
            return resolved.into_iter().flatten().collect();
        }

        tracing::debug!(
            "translating {} of {} texts into {target}",
            pending.len(),
            texts.len()
        );
        let translations = match self.dispatch(&pending, target).await {
            Ok(translations) => {
                for (text, translation) in pending.iter().zip(&translations) {
                    self.cache.store(text, target, translation);
                }
                translations
            },
            Err(err) => {
                tracing::warn!("translation failed, keeping original text: {err}");
                pending.clone()
            },
        };

        for (translation, indices) in translations.into_iter().zip(waiting) {
            for index in indices {
                resolved[index] = Some(translation.clone());
            }
        }

        resolved
            .into_iter()
            .zip(texts)
            .map(|(value, original)| value.unwrap_or_else(|| original.clone()))
            .collect()
    }

    /// Translate a single text.
    pub async fn translate(&self, text: &str, target: Language) -> String {
        let batch = [text.to_string()];
        self.translate_batch(&batch, target)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| text.to_string())
    }

    /// Drop every cached translation.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn dispatch(
        &self,
        pending: &[String],
        target: Language,
    ) -> Result<Vec<String>, TranslateError> {
        let translations = self.backend.translate(pending, target).await?;
        if translations.len() != pending.len() {
            return Err(TranslateError::CountMismatch {
                expected: pending.len(),
                actual: translations.len(),
            });
        }
        Ok(translations)
    }
}
