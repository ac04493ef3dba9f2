use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::sync::Arc;

use crate::compose::Composer;
use crate::deck::Slide;
use crate::layout::{
    ALL_CROP_STRATEGIES, ALL_POSITIONS, CropStrategy, Position, Role,
};
use crate::render::{ALL_BAND_STYLES, BandStyle};
use crate::settings::Settings;
use crate::variants::SlideVariants;

use super::models::{ComposeRequest, ComposeResponse, ErrorResponse, SettingsInfo};
use super::state::ServerState;

const ADMIN_TOKEN_ENV: &str = "SLIDESMITH_ADMIN_TOKEN";

pub async fn run_server(settings: Settings, addr: String) -> Result<()> {
    let admin_token = settings.admin_token.clone().or_else(|| {
        std::env::var(ADMIN_TOKEN_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
    });
    let composer = Composer::from_settings(&settings);
    let state = Arc::new(ServerState {
        settings,
        composer,
        admin_token,
    });
    let app = Router::new()
        .route("/health", get(health))
        .route("/compose", post(compose))
        .route("/settings", get(settings_info))
        .with_state(state.clone())
        .layer(axum::middleware::from_fn_with_state(state, auth_middleware))
        .layer(axum::middleware::from_fn(cors_middleware));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| "failed to bind server address")?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

async fn auth_middleware(
    State(state): State<Arc<ServerState>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, StatusCode> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(next.run(req).await);
    };
    if req.uri().path() == "/health" || req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }
    let provided = req
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if provided == Some(expected) {
        Ok(next.run(req).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn compose(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ComposeRequest>,
) -> Result<Json<ComposeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let result = tokio::task::spawn_blocking(move || compose_request(state.as_ref(), payload))
        .await
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("server task failed: {}", err),
                }),
            )
        })?;

    match result {
        Ok(response) => Ok(Json(response)),
        Err(err) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )),
    }
}

fn compose_request(state: &ServerState, payload: ComposeRequest) -> Result<ComposeResponse> {
    let background = BASE64
        .decode(payload.background.as_bytes())
        .with_context(|| "background is not valid base64")?;

    let role = match payload.role.as_deref() {
        Some(name) => {
            Role::parse(name).ok_or_else(|| anyhow::anyhow!("unknown role '{}'", name))?
        }
        None => Role::Body,
    };
    let position = match payload.position.as_deref() {
        Some(name) => {
            Position::parse(name).ok_or_else(|| anyhow::anyhow!("unknown position '{}'", name))?
        }
        None => Position::BottomCenter,
    };
    let style = match payload.style.as_deref() {
        Some(name) => {
            BandStyle::parse(name).ok_or_else(|| anyhow::anyhow!("unknown style '{}'", name))?
        }
        None => BandStyle::Solid,
    };
    let crop = match payload.crop.as_deref() {
        Some(name) => {
            CropStrategy::parse(name).ok_or_else(|| anyhow::anyhow!("unknown crop '{}'", name))?
        }
        None => CropStrategy::Wide,
    };

    let slide = Slide {
        lines: payload.lines,
        role,
        position: Some(position),
        style: Some(style),
        crop: Some(crop),
        background: None,
    };
    let variants = SlideVariants {
        position,
        style,
        crop,
    };
    let bytes = state.composer.compose_slide(&background, &slide, variants)?;
    Ok(ComposeResponse {
        image_base64: BASE64.encode(&bytes),
        mime: "image/png".to_string(),
    })
}

async fn settings_info(State(state): State<Arc<ServerState>>) -> Json<SettingsInfo> {
    Json(SettingsInfo {
        positions: ALL_POSITIONS.iter().map(|p| p.as_str().to_string()).collect(),
        styles: ALL_BAND_STYLES.iter().map(|s| s.as_str().to_string()).collect(),
        crops: ALL_CROP_STRATEGIES
            .iter()
            .map(|c| c.as_str().to_string())
            .collect(),
        roles: vec!["hook".to_string(), "body".to_string(), "cta".to_string()],
        profiles: state.settings.scheduler_profiles.clone(),
    })
}
