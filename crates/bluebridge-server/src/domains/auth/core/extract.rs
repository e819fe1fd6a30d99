use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::domains::errors::error_response;

/// `Json<T>` whose rejections use the error envelope instead of plain text.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(event = "json_rejected", error = %rejection.body_text());
                Err(rejection_response(&rejection))
            }
        }
    }
}

fn rejection_response(rejection: &JsonRejection) -> Response {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a JSON request body",
        ),
        JsonRejection::BytesRejection(_) => {
            error_response(rejection.status(), "Request body could not be read")
        }
        _ => error_response(StatusCode::BAD_REQUEST, "Invalid JSON body"),
    }
}
