use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Failures raised by the catalogue itself. "No films matched" is never one of
/// them: an empty result is an empty `Vec`.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("{0}")]
    QueryFailed(String),
    #[error("film {0} not found")]
    NotFound(i32),
    #[error("{0}")]
    Invalid(String),
    #[error("image storage failed: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<sea_orm::DbErr> for CatalogueError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::QueryFailed(err.to_string())
    }
}

pub type CatalogueResult<T> = Result<T, CatalogueError>;

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<MultipartError>() {
            return err.status();
        }
        match self.0.downcast_ref::<CatalogueError>() {
            Some(CatalogueError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(CatalogueError::Invalid(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl From<CatalogueError> for AppError {
    fn from(err: CatalogueError) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        CatalogueError::from(err).into()
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = crate::templates::error_page(self.to_string());
        (status, Html(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
