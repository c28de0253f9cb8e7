// src/common/payload.rs
//
// `Json` com a rejeição do axum convertida no envelope da API.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::common::error::AppError;

#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    // Campo ausente ou com tipo errado vira {status:400} com HTTP 200
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{header, StatusCode}, response::IntoResponse};
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Deserialize)]
    struct Contact {
        #[allow(dead_code)]
        phone: String,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_field_becomes_invalid_payload_envelope() {
        let err = ApiJson::<Contact>::from_request(json_request(r#"{"name":"Rahul"}"#), &())
            .await
            .err()
            .expect("campo ausente");
        assert!(matches!(err, AppError::InvalidPayload(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"], "Invalid payload");
        assert!(body["error_description"].as_str().unwrap().contains("phone"));
    }

    #[tokio::test]
    async fn missing_content_type_is_also_an_envelope() {
        let req = Request::builder().method("POST").body(Body::from(r#"{"phone":"1"}"#)).unwrap();
        let err = ApiJson::<Contact>::from_request(req, &()).await.err().expect("sem content-type");
        assert_eq!(err.envelope()["status"], 400);
    }
}
