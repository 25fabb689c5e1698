//! Translation handler.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    prelude::*,
    web::{AppState, error::ViewerError},
};

/// Query parameters for `/translate`.
#[derive(Debug, Deserialize)]
pub struct TranslateQuery {
    /// The text to translate.
    pub text: Option<String>,
}

/// A successful translation.
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated: String,
}

/// Translate a snippet of recognized text.
///
/// GET /translate?text=
#[instrument(level = "debug", skip_all)]
pub async fn translate_text(
    State(state): State<AppState>,
    Query(query): Query<TranslateQuery>,
) -> Result<Json<TranslateResponse>, ViewerError> {
    let text = query.text.ok_or_else(|| {
        ViewerError::BadRequest("missing `text` query parameter".to_owned())
    })?;
    let translator = state.translator.as_ref().ok_or_else(|| {
        ViewerError::Unavailable("translation is not configured".to_owned())
    })?;
    let translated = translator.translate(&text).await?;
    Ok(Json(TranslateResponse { translated }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt as _;

    use crate::{
        translate::{TranslateError, Translator},
        web::routes::router,
    };

    use super::*;

    /// Answers with a canned response.
    struct StubTranslator {
        status: Option<StatusCode>,
    }

    #[async_trait]
    impl Translator for StubTranslator {
        async fn translate(&self, text: &str) -> Result<String, TranslateError> {
            match self.status {
                Some(status) => Err(TranslateError::Status(status)),
                None => Ok(format!("[en] {text}")),
            }
        }
    }

    async fn get(translator: Option<StubTranslator>, uri: &str) -> (StatusCode, Value) {
        let dir = tempfile::tempdir().unwrap();
        let mut state =
            AppState::new(dir.path().join("static"), dir.path().join("data"), false).unwrap();
        if let Some(translator) = translator {
            state = state.with_translator(Arc::new(translator));
        }
        let response = router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_translate_success() {
        let (status, body) = get(
            Some(StubTranslator { status: None }),
            "/translate?text=%EC%95%88%EB%85%95",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "translated": "[en] 안녕" }));
    }

    #[tokio::test]
    async fn test_translate_upstream_failure_keeps_status() {
        let (status, body) = get(
            Some(StubTranslator {
                status: Some(StatusCode::UNAUTHORIZED),
            }),
            "/translate?text=hi",
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Translation failed");
    }

    #[tokio::test]
    async fn test_translate_without_text() {
        let (status, body) = get(Some(StubTranslator { status: None }), "/translate").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing `text` query parameter");
    }

    #[tokio::test]
    async fn test_translate_empty_text_is_allowed() {
        let (status, body) = get(Some(StubTranslator { status: None }), "/translate?text=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translated"], "[en] ");
    }

    #[tokio::test]
    async fn test_translate_without_credentials() {
        let (status, body) = get(None, "/translate?text=hi").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("not configured"));
    }
}
