use axum::extract::{FromRequest, Request};
use axum_typed_multipart::{TypedMultipart, TypedMultipartError};

use crate::error::AppError;

/// A `TypedMultipart<T>` wrapper that converts rejections into `AppError`.
pub struct AppMultipart<T>(pub T);

impl<S, T> FromRequest<S> for AppMultipart<T>
where
    TypedMultipart<T>: FromRequest<S, Rejection = TypedMultipartError>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match TypedMultipart::<T>::from_request(req, state).await {
            Ok(TypedMultipart(value)) => Ok(AppMultipart(value)),
            Err(e @ TypedMultipartError::FieldTooLarge { .. }) => {
                Err(AppError::PayloadTooLarge(e.to_string()))
            }
            Err(e) => Err(AppError::Validation(e.to_string())),
        }
    }
}
