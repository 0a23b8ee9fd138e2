use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use regional_pulse_shared::{Language, TranslateErrorBody, TranslateResponse};
use serde_json::Value;

use crate::{state::AppState, translator::UpstreamError};

type ApiError = (StatusCode, Json<TranslateErrorBody>);

/// `POST /api/translate`
pub async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("rejecting translate body: {rejection}");
        bad_request("Invalid request: texts array required")
    })?;
    let (texts, target) = validate(&payload)?;

    tracing::info!("translating {} texts into {target}", texts.len());
    let translations = state
        .translator()
        .translate(&texts, target)
        .await
        .map_err(upstream_error)?;

    Ok(Json(TranslateResponse {
        translations,
    }))
}

/// `OPTIONS /api/translate` outside of a CORS preflight.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method on `/api/translate`.
pub async fn method_not_allowed() -> ApiError {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", None)
}

/// `GET /api/health`
pub async fn health() -> &'static str {
    "ok"
}

fn validate(payload: &Value) -> Result<(Vec<String>, Language), ApiError> {
    let texts = payload
        .get("texts")
        .and_then(Value::as_array)
        .filter(|texts| !texts.is_empty())
        .ok_or_else(|| bad_request("Invalid request: texts array required"))?;
    let texts = texts
        .iter()
        .map(|text| text.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| bad_request("Invalid request: texts must be strings"))?;

    let target = payload
        .get("targetLang")
        .and_then(Value::as_str)
        .and_then(Language::from_code)
        .ok_or_else(|| bad_request("Invalid request: targetLang must be \"zh\" or \"en\""))?;

    Ok((texts, target))
}

fn upstream_error(err: UpstreamError) -> ApiError {
    match err {
        UpstreamError::MissingApiKey => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error: API key not found",
            None,
        ),
        UpstreamError::Status {
            details, ..
        } => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Translation service error",
            Some(details),
        ),
        other => {
            tracing::error!("translation failed: {other}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                Some(Value::String(other.to_string())),
            )
        },
    }
}

fn bad_request(message: &str) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, message, None)
}

fn error_response(status: StatusCode, message: &str, details: Option<Value>) -> ApiError {
    (
        status,
        Json(TranslateErrorBody {
            error: message.to_string(),
            details,
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::{
        matchers::{body_partial_json, header as header_is, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::{config::TranslatorConfig, routes::create_router, state::AppState};

    fn app(upstream: &MockServer, api_key: Option<&str>) -> Router {
        let config = TranslatorConfig {
            api_key: api_key.map(str::to_string),
            base_url: format!("{}/v1", upstream.uri()),
            ..TranslatorConfig::default()
        };
        let site_dir = std::env::temp_dir().join("regional-pulse-handler-tests");
        create_router(AppState::new(config).unwrap(), &site_dir)
    }

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }

    async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/translate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn translates_batch_through_single_upstream_call() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header_is("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system"},
                    {"role": "user", "content": "1. Hello\n---\n2. World"}
                ]
            })))
            .respond_with(completion("1. 你好\n---\n2. 世界"))
            .expect(1)
            .mount(&upstream)
            .await;

        let (status, body) = post_json(
            app(&upstream, Some("test-key")),
            json!({"texts": ["Hello", "World"], "targetLang": "zh"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"translations": ["你好", "世界"]}));
    }

    #[tokio::test]
    async fn count_mismatch_echoes_input() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("你好世界"))
            .mount(&upstream)
            .await;

        let (status, body) = post_json(
            app(&upstream, Some("test-key")),
            json!({"texts": ["Hello", "World"], "targetLang": "zh"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"translations": ["Hello", "World"]}));
    }

    #[tokio::test]
    async fn rejects_invalid_bodies() {
        let upstream = MockServer::start().await;
        for body in [
            json!({"texts": [], "targetLang": "zh"}),
            json!({"targetLang": "zh"}),
            json!({"texts": "Hello", "targetLang": "zh"}),
            json!({"texts": [1, 2], "targetLang": "zh"}),
            json!({"texts": ["Hello"], "targetLang": "fr"}),
            json!({"texts": ["Hello"]}),
        ] {
            let (status, response) =
                post_json(app(&upstream, Some("test-key")), body.clone()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert!(response["error"].as_str().unwrap().starts_with("Invalid request"));
        }
        assert!(upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_json_body_is_a_validation_failure() {
        let upstream = MockServer::start().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/translate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("texts=Hello"))
            .unwrap();
        let response = app(&upstream, Some("test-key")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let upstream = MockServer::start().await;
        for verb in [Method::GET, Method::PUT, Method::DELETE] {
            let request = Request::builder()
                .method(verb)
                .uri("/api/translate")
                .body(Body::empty())
                .unwrap();
            let response = app(&upstream, Some("test-key")).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body, json!({"error": "Method not allowed"}));
        }
    }

    #[tokio::test]
    async fn options_allows_any_origin() {
        let upstream = MockServer::start().await;
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/translate")
            .header(header::ORIGIN, "https://pulse.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app(&upstream, None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_a_server_error() {
        let upstream = MockServer::start().await;
        let (status, body) = post_json(
            app(&upstream, None),
            json!({"texts": ["Hello"], "targetLang": "zh"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server configuration error: API key not found");
    }

    #[tokio::test]
    async fn upstream_failure_is_surfaced_with_details() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided"}
            })))
            .mount(&upstream)
            .await;

        let (status, body) = post_json(
            app(&upstream, Some("bad-key")),
            json!({"texts": ["Hello"], "targetLang": "en"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Translation service error");
        assert_eq!(body["details"]["error"]["message"], "Incorrect API key provided");
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let upstream = MockServer::start().await;
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = app(&upstream, None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
