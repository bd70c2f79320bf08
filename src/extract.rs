use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use tracing::warn;

use crate::error::ApiError;

/// `Json<T>` whose rejections (bad syntax, missing fields, wrong content
/// type) come back as a 400 [`ApiError::Validation`].
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "rejected request body");
            ApiError::validation(e.body_text())
        })?;
        Ok(ValidJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Greeting {
        name: String,
    }

    fn json_request(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_well_formed_body() {
        let req = json_request(r#"{"name":"x"}"#);
        let ValidJson(b) = ValidJson::<Greeting>::from_request(req, &()).await.unwrap();
        assert_eq!(b.name, "x");
    }

    #[tokio::test]
    async fn missing_field_is_a_validation_error() {
        let err = ValidJson::<Greeting>::from_request(json_request("{}"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m.contains("name")));
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let err = ValidJson::<Greeting>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
