use super::cookie::{self, CookieSettings};
use super::error::*;
use crate::application_port::{
    AuthContext, AuthError, AuthService, AuthTokens, LoginInput, PasswordResetService,
    RegisterInput, ResetRequestInput,
};
use crate::domain_model::{MemberId, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::http::header::{HeaderValue, SET_COOKIE};
use warp::path::FullPath;
use warp::{Rejection, Reply};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

fn append_cookie(
    reply: &mut warp::reply::Response,
    value: String,
    path: &FullPath,
) -> Result<(), Rejection> {
    let value =
        HeaderValue::from_str(&value).map_err(|e| fail(AuthError::Internal(e.to_string()), path))?;
    reply.headers_mut().append(SET_COOKIE, value);
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub member_id: MemberId,
}

pub async fn register(
    path: FullPath,
    body: RegisterRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl Reply, Rejection> {
    let member_id = auth_service
        .register(RegisterInput {
            email: body.email,
            username: body.username,
            password: body.password,
        })
        .await
        .map_err(|e| fail(e, &path))?;

    let json = warp::reply::json(&ApiResponse::ok(RegisterResponse { member_id }));
    Ok(warp::reply::with_status(json, StatusCode::CREATED))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub member_id: MemberId,
    pub auth_tokens: AuthTokens,
}

pub async fn login(
    path: FullPath,
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    cookies: Arc<CookieSettings>,
) -> Result<impl Reply, Rejection> {
    let result = auth_service
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(|e| fail(e, &path))?;

    // The HttpOnly cookies are the real carrier; the body repeats the
    // pair for development convenience.
    let response = LoginResponse {
        member_id: result.member_id,
        auth_tokens: result.tokens.clone(),
    };
    let mut reply = warp::reply::json(&ApiResponse::ok(response)).into_response();
    append_cookie(
        &mut reply,
        cookie::access_token_cookie(&result.tokens.access_token.0, &cookies),
        &path,
    )?;
    append_cookie(
        &mut reply,
        cookie::refresh_token_cookie(&result.tokens.refresh_token.0, &cookies),
        &path,
    )?;
    Ok(reply)
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token_expires_at: DateTime<Utc>,
}

pub async fn refresh(
    path: FullPath,
    refresh_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookies: Arc<CookieSettings>,
) -> Result<impl Reply, Rejection> {
    let refresh_token = refresh_cookie.ok_or_else(|| fail(AuthError::InvalidRefreshToken, &path))?;

    let grant = auth_service
        .refresh(&refresh_token)
        .await
        .map_err(|e| fail(e, &path))?;

    let response = RefreshResponse {
        access_token_expires_at: grant.access_token_expires_at,
    };
    let mut reply = warp::reply::json(&ApiResponse::ok(response)).into_response();
    append_cookie(
        &mut reply,
        cookie::access_token_cookie(&grant.access_token.0, &cookies),
        &path,
    )?;
    Ok(reply)
}

pub async fn logout(
    path: FullPath,
    access_cookie: Option<String>,
    refresh_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookies: Arc<CookieSettings>,
) -> Result<impl Reply, Rejection> {
    let access_token = access_cookie.ok_or_else(|| fail_with(ApiErrorCode::InvalidToken, &path))?;

    auth_service
        .logout(&access_token, refresh_cookie.as_deref())
        .await
        .map_err(|e| fail(e, &path))?;

    // overwrite both carriers with immediately-expiring cookies
    let mut reply = warp::reply::json(&ApiResponse::<()>::ok(())).into_response();
    append_cookie(
        &mut reply,
        cookie::expire_access_token_cookie(&cookies),
        &path,
    )?;
    append_cookie(
        &mut reply,
        cookie::expire_refresh_token_cookie(&cookies),
        &path,
    )?;
    Ok(reply)
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub member_id: MemberId,
    pub role: Role,
}

pub async fn me(context: AuthContext) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(MeResponse {
        member_id: context.member_id,
        role: context.role,
    })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyIdentityRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    pub reset_token: String,
}

pub async fn request_password_reset(
    path: FullPath,
    body: VerifyIdentityRequest,
    reset_service: Arc<dyn PasswordResetService>,
) -> Result<impl Reply, Rejection> {
    let token = reset_service
        .request_reset(ResetRequestInput {
            username: body.username,
            email: body.email,
        })
        .await
        .map_err(|e| fail(e, &path))?;

    Ok(warp::reply::json(&ApiResponse::ok(ResetTokenResponse {
        reset_token: token.0,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

pub async fn reset_password(
    path: FullPath,
    reset_token: String,
    body: ResetPasswordRequest,
    reset_service: Arc<dyn PasswordResetService>,
) -> Result<impl Reply, Rejection> {
    reset_service
        .reset_password(&reset_token, &body.new_password)
        .await
        .map_err(|e| fail(e, &path))?;

    Ok(warp::reply::json(&ApiResponse::<()>::ok(())))
}
