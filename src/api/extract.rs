use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
    Json,
};

use crate::error::AppError;

use super::models::RelayRequest;

/// Relay body. An empty body reads as `{}` so it is reported as a missing prompt.
#[derive(Debug)]
pub struct RelayPayload(pub RelayRequest);

#[async_trait]
impl<S> FromRequest<S> for RelayPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json_body = has_json_content_type(req.headers());
        let bytes = Bytes::from_request(req, state).await?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(RelayRequest::default()));
        }
        if !json_body {
            return Err(AppError::InvalidBody(
                "Expected request with `Content-Type: application/json`".to_string(),
            ));
        }

        let Json(payload) = Json::<RelayRequest>::from_bytes(&bytes)?;
        Ok(Self(payload))
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}
