use anyhow::Result;
use std::time::{Duration, SystemTime};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tower_http::services::ServeDir;
use tracing::{debug, info};

use axum::{
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::api_json::ApiJson;
use super::catalog_routes::make_catalog_routes;
use super::error::ApiError;
use super::listening_routes::make_listening_routes;
use super::playlist_routes::make_playlist_routes;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::video_routes::make_video_routes;
use super::{log_requests, state::*, ServerConfig};
use crate::user::{SessionToken, SessionTokenValue, UserRole};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
    pub user: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
struct UserView {
    username: String,
    role: UserRole,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    success: bool,
    token: String,
    user: UserView,
}

#[derive(Serialize)]
struct AuthStatusResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<UserView>,
}

fn invalid_credentials() -> Response {
    ApiError::Unauthorized("Invalid username or password".to_owned()).into_response()
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION"),
        user: session.map(|s| s.account.username),
    };
    Json(stats)
}

async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginBody>,
) -> Response {
    debug!("login() called for {}", body.username);
    if body.username.trim().is_empty() || body.password.is_empty() {
        return ApiError::invalid_request("Username and password are required").into_response();
    }

    let (account, credentials) = match state.media_store.get_account_credentials(&body.username)
    {
        Ok(Some(found)) => found,
        Ok(None) => {
            debug!("No account named {}", body.username);
            return invalid_credentials();
        }
        Err(err) => return ApiError::from(err).into_response(),
    };
    match credentials.verify(&body.password) {
        Ok(true) => {}
        Ok(false) => {
            debug!("Wrong password for {}", body.username);
            return invalid_credentials();
        }
        Err(err) => return ApiError::from(err).into_response(),
    }

    let token = SessionToken {
        account_id: account.id,
        value: SessionTokenValue::generate(),
        created: SystemTime::now(),
        last_used: None,
    };
    if let Err(err) = state.media_store.add_session_token(&token) {
        return ApiError::from(err).into_response();
    }
    info!("{} logged in", account.username);

    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, token.value.0.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(
            state.config.session_cookie_max_age_days as i64,
        ))
        .build();
    let response_body = LoginSuccessResponse {
        success: true,
        token: token.value.0,
        user: UserView {
            username: account.username,
            role: account.role,
        },
    };
    (jar.add(cookie), Json(response_body)).into_response()
}

async fn logout(
    State(state): State<ServerState>,
    jar: CookieJar,
    session: Option<Session>,
) -> Response {
    if let Some(session) = session {
        if let Err(err) = state.media_store.delete_session_token(&session.token) {
            return ApiError::from(err).into_response();
        }
        info!("{} logged out", session.account.username);
    }

    let expired = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .same_site(SameSite::Lax)
        .build();
    (jar.add(expired), Json(serde_json::json!({ "success": true }))).into_response()
}

async fn auth_status(session: Option<Session>) -> Response {
    let response = AuthStatusResponse {
        authenticated: session.is_some(),
        user: session.map(|s| UserView {
            username: s.account.username,
            role: s.account.role,
        }),
    };
    Json(response).into_response()
}

async fn health() -> Response {
    Json(serde_json::json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "message": "SoundWave server is running",
    }))
    .into_response()
}

async fn db_status(State(store): State<GuardedMediaStore>) -> Response {
    let counts = store
        .count_tracks()
        .and_then(|tracks| Ok((tracks, store.count_videos()?)));
    match counts {
        Ok((tracks, videos)) => Json(serde_json::json!({
            "database": "SQLite",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "counts": { "tracks": tracks, "videos": videos },
        }))
        .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub fn make_app(config: ServerConfig, media_store: GuardedMediaStore) -> Result<Router> {
    let state = ServerState::new(config.clone(), media_store);

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/auth-status", get(auth_status))
        .with_state(state.clone());

    let status_routes: Router = Router::new()
        .route("/health", get(health))
        .route("/db-status", get(db_status))
        .with_state(state.clone());

    let api_routes: Router = auth_routes
        .merge(status_routes)
        .merge(make_catalog_routes(state.clone()))
        .merge(make_listening_routes(state.clone()))
        .merge(make_playlist_routes(state.clone()))
        .merge(make_video_routes(state.clone()));

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(config: ServerConfig, media_store: GuardedMediaStore) -> Result<()> {
    let port = config.port;
    let app = make_app(config, media_store)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
