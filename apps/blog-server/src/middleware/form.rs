//! Form body extractor accepting both HTML form posts and JSON.

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;

use crate::middleware::error::AppError;

/// A submitted form, decoded from `application/json` or
/// `application/x-www-form-urlencoded`.
#[derive(Debug)]
pub struct FormBody<T>(pub T);

impl<T> FormBody<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

fn decode<T: DeserializeOwned>(is_json: bool, bytes: &[u8]) -> Result<T, AppError> {
    if is_json {
        serde_json::from_slice(bytes).map_err(|e| AppError::BadRequest(e.to_string()))
    } else {
        serde_urlencoded::from_bytes(bytes).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

impl<T: DeserializeOwned + 'static> FromRequest for FormBody<T> {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let is_json = req.content_type().eq_ignore_ascii_case("application/json");
        let body = web::Bytes::from_request(req, payload);

        Box::pin(async move {
            let bytes = body
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            decode(is_json, &bytes).map(FormBody)
        })
    }
}
