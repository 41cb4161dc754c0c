//! Request body and cookie helpers.

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::{HeaderMap, header::CONTENT_TYPE, header::COOKIE},
};
use serde_json::{Map, Value};

use super::error::ApiError;

/// Flat string fields of a form-encoded or JSON-object body.
///
/// A form body that cannot be read yields no fields (handlers then report
/// missing data); a malformed JSON body is rejected as missing data.
#[derive(Debug, Default)]
pub struct Fields(pub HashMap<String, String>);

impl<S> FromRequest<S> for Fields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(map) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|_| ApiError::MissingData)?;
            return Ok(Fields(flatten(map)));
        }

        match Form::<HashMap<String, String>>::from_request(req, state).await {
            Ok(Form(map)) => Ok(Fields(map)),
            Err(_) => Ok(Fields::default()),
        }
    }
}

fn flatten(map: Map<String, Value>) -> HashMap<String, String> {
    map.into_iter()
        .filter_map(|(k, v)| {
            let s = match v {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((k, s))
        })
        .collect()
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"').to_string())
}

/// Primary keys that do not parse are reported as not found.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::NotFound)
}
