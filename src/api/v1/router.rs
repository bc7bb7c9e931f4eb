use super::cookie;
use super::error::*;
use super::handler;
use crate::application_port::{AuthContext, AuthService};
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;
use warp::path::FullPath;
use warp::{Filter, Rejection};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let register = warp::post()
        .and(warp::path("auth"))
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(warp::path::full())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::post()
        .and(warp::path("auth"))
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::path::full())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with(server.cookie_settings.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("auth"))
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::path::full())
        .and(warp::cookie::optional::<String>(
            cookie::REFRESH_TOKEN_COOKIE,
        ))
        .and(with(server.auth_service.clone()))
        .and(with(server.cookie_settings.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path("auth"))
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(warp::path::full())
        .and(warp::cookie::optional::<String>(cookie::ACCESS_TOKEN_COOKIE))
        .and(warp::cookie::optional::<String>(
            cookie::REFRESH_TOKEN_COOKIE,
        ))
        .and(with(server.auth_service.clone()))
        .and(with(server.cookie_settings.clone()))
        .and_then(handler::logout);

    let me = warp::get()
        .and(warp::path("auth"))
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_authentication(server.auth_service.clone()))
        .and_then(handler::me);

    let password_verify = warp::post()
        .and(warp::path("password"))
        .and(warp::path("verify"))
        .and(warp::path::end())
        .and(warp::path::full())
        .and(warp::body::json())
        .and(with(server.reset_service.clone()))
        .and_then(handler::request_password_reset);

    let password_reset = warp::post()
        .and(warp::path("password"))
        .and(warp::path("reset"))
        .and(warp::path::end())
        .and(warp::path::full())
        .and(warp::header::<String>("reset-token"))
        .and(warp::body::json())
        .and(with(server.reset_service.clone()))
        .and_then(handler::reset_password);

    register
        .or(login)
        .or(refresh)
        .or(logout)
        .or(me)
        .or(password_verify)
        .or(password_reset)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// The authentication gate: resolve the access-token cookie to a
/// principal, or pass the request through as anonymous. Rejection is the
/// perimeter's call, not this filter's.
fn with_auth_context(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (Option<AuthContext>,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(cookie::ACCESS_TOKEN_COOKIE).and_then(
        move |token: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let context = match token {
                    Some(token) => match auth_service.authenticate(&token).await {
                        Ok(context) => Some(context),
                        Err(err) => {
                            debug!("credential did not resolve: {}", err);
                            None
                        }
                    },
                    None => None,
                };
                Ok::<_, Rejection>(context)
            }
        },
    )
}

/// Perimeter variant for endpoints that require a principal.
fn with_authentication(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (AuthContext,), Error = Rejection> + Clone {
    warp::path::full().and(with_auth_context(auth_service)).and_then(
        |path: FullPath, context: Option<AuthContext>| async move {
            context.ok_or_else(|| fail_with(ApiErrorCode::Unauthorized, &path))
        },
    )
}
