use async_trait::async_trait;
use gloo_net::http::Request;
use regional_pulse_shared::{
    Language, TranslateError, TranslateRequest, TranslateResponse, TranslationBackend,
};
use serde::de::DeserializeOwned;

use crate::config::TRANSLATE_API;

const ERROR_BODY_LIMIT: usize = 512;

/// 获取静态 JSON 数据文件
pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, String> {
    let response = Request::get(url)
        .header("Cache-Control", "no-cache")
        .send()
        .await
        .map_err(|e| format!("Network error: {:?}", e))?;

    if !response.ok() {
        return Err(format!("HTTP error: {}", response.status()));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Parse error: {:?}", e))
}

/// Sends cache misses to the site's `/api/translate` endpoint.
pub struct HttpTranslator {
    endpoint: String,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for HttpTranslator {
    fn default() -> Self {
        Self::new(TRANSLATE_API)
    }
}

#[async_trait(?Send)]
impl TranslationBackend for HttpTranslator {
    async fn translate(
        &self,
        texts: &[String],
        target: Language,
    ) -> Result<Vec<String>, TranslateError> {
        let body = TranslateRequest {
            texts: texts.to_vec(),
            target_lang: target,
        };
        let response = Request::post(&self.endpoint)
            .json(&body)
            .map_err(|e| TranslateError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| TranslateError::Network(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(ERROR_BODY_LIMIT)
                .collect();
            return Err(TranslateError::Status {
                status,
                body,
            });
        }

        let decoded: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Decode(e.to_string()))?;
        Ok(decoded.translations)
    }
}
