use crate::api::v1::handler::ApiResponse;
use crate::application_port::AuthError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::path::FullPath;
use warp::{Rejection, reject};

/// Client-facing failure body: machine-readable code, human message, the
/// numeric status, and the path the request hit.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub status: u16,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("No member matches the supplied identity")]
    MemberNotFound,
    #[error("Account is deactivated")]
    AccountInactive,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Refresh token is not valid")]
    InvalidRefreshToken,
    #[error("Access token has been revoked")]
    TokenRevoked,
    #[error("Access token has expired")]
    TokenExpired,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Reset token is invalid or has expired")]
    InvalidResetToken,
    #[error("Request is malformed")]
    InvalidRequest,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Resource not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::MemberNotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::AccountInactive => StatusCode::FORBIDDEN,
            ApiErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiErrorCode::EmailTaken => StatusCode::CONFLICT,
            ApiErrorCode::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::TokenRevoked => StatusCode::UNAUTHORIZED,
            ApiErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidResetToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }
}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::PrincipalNotFound => ApiErrorCode::MemberNotFound,
            AuthError::InactiveAccount => ApiErrorCode::AccountInactive,
            AuthError::InvalidCredential => ApiErrorCode::InvalidCredentials,
            AuthError::EmailTaken => ApiErrorCode::EmailTaken,
            AuthError::InvalidRefreshToken => ApiErrorCode::InvalidRefreshToken,
            AuthError::Blacklisted => ApiErrorCode::TokenRevoked,
            AuthError::TokenExpired => ApiErrorCode::TokenExpired,
            AuthError::InvalidSignature => ApiErrorCode::InvalidToken,
            AuthError::InvalidOrExpiredResetToken => ApiErrorCode::InvalidResetToken,
            AuthError::Validation(_) => ApiErrorCode::InvalidRequest,
            AuthError::StoreUnavailable(e) => {
                warn!("store unavailable: {}", e);
                ApiErrorCode::ServiceUnavailable
            }
            AuthError::Internal(e) => ApiErrorCode::internal(e),
        }
    }
}

/// Custom rejection carrying everything the recovery handler needs to
/// render a structured failure, captured where the path is still known.
#[derive(Debug)]
pub struct ApiFailure {
    pub code: ApiErrorCode,
    pub message: String,
    pub path: String,
}

impl reject::Reject for ApiFailure {}

pub fn fail(error: AuthError, path: &FullPath) -> Rejection {
    let message = error.to_string();
    let code = ApiErrorCode::from(error);
    reject::custom(ApiFailure {
        code,
        message,
        path: path.as_str().to_string(),
    })
}

pub fn fail_with(code: ApiErrorCode, path: &FullPath) -> Rejection {
    let message = code.to_string();
    reject::custom(ApiFailure {
        code,
        message,
        path: path.as_str().to_string(),
    })
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, message, path) = if let Some(failure) = err.find::<ApiFailure>() {
        (
            failure.code.clone(),
            failure.message.clone(),
            failure.path.clone(),
        )
    } else if err.is_not_found() {
        let code = ApiErrorCode::NotFound;
        (code.clone(), code.to_string(), String::new())
    } else if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        (ApiErrorCode::InvalidRequest, e.to_string(), String::new())
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        (ApiErrorCode::InvalidRequest, e.to_string(), String::new())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        let code = ApiErrorCode::MethodNotAllowed;
        (code.clone(), code.to_string(), String::new())
    } else {
        (
            ApiErrorCode::InternalError,
            format!("Unhandled error: {:?}", err),
            String::new(),
        )
    };

    let status = code.status();
    let body = ApiResponse::<()>::err(ApiError {
        code,
        message,
        status: status.as_u16(),
        path,
        timestamp: Utc::now(),
    });
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
