use std::sync::Arc;

use anyhow::Result;

use crate::{config::TranslatorConfig, translator::UpstreamTranslator};

#[derive(Clone)]
pub struct AppState {
    /// Upstream translation client
    translator: Arc<UpstreamTranslator>,
}

impl AppState {
    pub fn new(translator_config: TranslatorConfig) -> Result<Self> {
        let translator = UpstreamTranslator::new(translator_config)?;
        if !translator.has_api_key() {
            tracing::warn!("OPENAI_API_KEY is not set; /api/translate will answer 500");
        }

        Ok(Self {
            translator: Arc::new(translator),
        })
    }

    pub fn translator(&self) -> &UpstreamTranslator {
        &self.translator
    }
}
