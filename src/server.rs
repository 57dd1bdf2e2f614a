//! HTTP routes and shared application state.

use crate::assets;
use crate::config::{ConfigError, ServerConfig};
use crate::identity::{IdentityAllocator, player_id_from_headers, set_cookie_header};
use crate::notifier::SharedMatch;
use crate::registry::MatchRegistry;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use polled_tictactoe::{MatchId, MatchState, PlayerId, Slot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    registry: MatchRegistry,
    identities: IdentityAllocator,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds fresh state, validating `config` first.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] from [`ServerConfig::validate`].
    #[instrument(skip(config))]
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!("Creating application state");
        Ok(Self {
            registry: MatchRegistry::new(),
            identities: IdentityAllocator::new(),
            config: Arc::new(config),
        })
    }

    /// Match registry.
    pub fn registry(&self) -> &MatchRegistry {
        &self.registry
    }

    /// Identity allocator.
    pub fn identities(&self) -> &IdentityAllocator {
        &self.identities
    }

    /// Active configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Identity presented in the caller's cookie.
    fn caller(&self, headers: &HeaderMap) -> Option<PlayerId> {
        player_id_from_headers(headers)
    }

    /// Identity for a caller arriving without one, or `None` when the id
    /// range is used up.
    fn issue_identity(&self) -> Option<PlayerId> {
        self.identities
            .allocate()
            .inspect_err(|e| warn!(error = %e, "Turning visitor away"))
            .ok()
    }

    /// Finds the match named by a raw `id` query value.
    fn lookup(&self, raw_id: Option<&str>) -> Option<Arc<SharedMatch>> {
        let id = raw_id.and_then(|s| s.trim().parse::<u64>().ok()).map(MatchId)?;
        self.registry.get(id)
    }

    /// Finds the match and the caller's slot in it.
    fn participant(
        &self,
        headers: &HeaderMap,
        raw_id: Option<&str>,
    ) -> Option<(Arc<SharedMatch>, Slot)> {
        let caller = self.caller(headers);
        let shared = self.lookup(raw_id)?;
        let slot = shared.slot_of(caller?)?;
        Some((shared, slot))
    }
}

/// Query naming a match.
#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    id: Option<String>,
}

/// Query for `/create_game`.
#[derive(Debug, Deserialize)]
pub struct CreateQuery {
    size: Option<String>,
}

/// Query for `/make_move`.
#[derive(Debug, Deserialize)]
pub struct MoveQuery {
    id: Option<String>,
    x: Option<String>,
    y: Option<String>,
}

/// Body of `/game_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateResponse {
    /// One string per row: `*` empty, `x` slot A, `o` slot B.
    pub board: Vec<String>,
    /// Match state.
    pub state: MatchState,
    /// 1 for the creator, 2 for the joiner.
    pub player_num: u8,
}

/// Builds the router with all game routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/game.js", get(game_javascript))
        .route("/create_game", get(create_game))
        .route("/match", get(match_page))
        .route("/game_state", get(game_state))
        .route("/wait_for_update", get(wait_for_update))
        .route("/make_move", get(make_move))
        .fallback(unknown_path)
        .layer(ServiceBuilder::new().map_request(log_request))
        .with_state(state)
}

fn log_request(req: Request<Body>) -> Request<Body> {
    debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

fn to_index() -> Response {
    Redirect::to("/").into_response()
}

fn with_cookie(mut response: Response, issued: Option<PlayerId>) -> Response {
    if let Some(id) = issued {
        response
            .headers_mut()
            .append(header::SET_COOKIE, set_cookie_header(id));
    }
    response
}

async fn index_page() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn game_javascript() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        assets::GAME_JS,
    )
}

async fn unknown_path() -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/")]).into_response()
}

/// Creates a match owned by the caller, issuing an identity if needed.
#[instrument(skip_all, fields(size = ?query.size))]
async fn create_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CreateQuery>,
) -> Response {
    let (owner, issued) = match state.caller(&headers) {
        Some(id) => (id, None),
        None => match state.issue_identity() {
            Some(id) => (id, Some(id)),
            None => return StatusCode::SERVICE_UNAVAILABLE.into_response(),
        },
    };
    let size = state.config.board_size_for(query.size.as_deref());
    let id = match state.registry.create(owner, size) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Refusing to create game");
            return with_cookie(StatusCode::SERVICE_UNAVAILABLE.into_response(), issued);
        }
    };
    info!(match_id = %id, owner = %owner, size, "Game created");

    let response = (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, format!("/match?id={}", id))],
        id.to_string(),
    )
        .into_response();
    with_cookie(response, issued)
}

/// Joins the free slot if possible, then serves the game page to
/// participants.
#[instrument(skip_all, fields(match_id = ?query.id))]
async fn match_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MatchQuery>,
) -> Response {
    let Some(shared) = state.lookup(query.id.as_deref()) else {
        return to_index();
    };
    let caller = state.caller(&headers);
    let admission = shared.admit(caller, || state.issue_identity());

    match admission.slot {
        Some(slot) => {
            debug!(?slot, "Serving game page");
            with_cookie(Html(assets::GAME_HTML).into_response(), admission.issued)
        }
        None => {
            debug!(?caller, "Not a participant");
            to_index()
        }
    }
}

/// Returns board, state and the caller's player number.
#[instrument(skip_all, fields(match_id = ?query.id))]
async fn game_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MatchQuery>,
) -> Response {
    let Some((shared, slot)) = state.participant(&headers, query.id.as_deref()) else {
        return to_index();
    };
    let snapshot = shared.snapshot();
    Json(GameStateResponse {
        board: snapshot.board.rows(),
        state: snapshot.state,
        player_num: slot.number(),
    })
    .into_response()
}

/// Long-polls until the caller's slot has an update.
#[instrument(skip_all, fields(match_id = ?query.id))]
async fn wait_for_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MatchQuery>,
) -> Response {
    let Some((shared, slot)) = state.participant(&headers, query.id.as_deref()) else {
        return to_index();
    };
    let snapshot = shared
        .await_update(slot, state.config.long_poll_timeout())
        .await;
    debug!(?slot, state = %snapshot.state, "Long-poll released");
    StatusCode::OK.into_response()
}

/// Applies a move; always 200 with `success` or `failure`.
#[instrument(skip_all, fields(match_id = ?query.id, x = ?query.x, y = ?query.y))]
async fn make_move(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MoveQuery>,
) -> &'static str {
    let parse = |raw: &Option<String>| raw.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
    let (Some(x), Some(y)) = (parse(&query.x), parse(&query.y)) else {
        debug!("Missing or malformed coordinates");
        return "failure";
    };
    let caller = state.caller(&headers);
    let (Some(shared), Some(caller)) = (state.lookup(query.id.as_deref()), caller) else {
        return "failure";
    };

    match shared.attempt_move(caller, x, y) {
        Ok(_) => "success",
        Err(e) => {
            debug!(error = %e, "Move failed");
            "failure"
        }
    }
}

/// Spawns the periodic sweep that drops long-finished matches.
///
/// Returns `None` when no retention is configured.
pub fn spawn_eviction(state: &AppState) -> Option<JoinHandle<()>> {
    let retention = state.config.retention()?;
    let interval = state.config.eviction_interval();
    let registry = state.registry.clone();
    info!(?retention, ?interval, "Starting finished-match eviction");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let evicted = registry.evict_finished(Instant::now(), retention);
            if evicted == 0 {
                debug!("Eviction sweep found nothing");
            }
        }
    }))
}

/// Serves `router` until ctrl-c.
#[instrument(skip(state), fields(host = %state.config.host(), port = state.config.port()))]
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let _eviction = spawn_eviction(&state);
    let addr = format!("{}:{}", state.config.host(), state.config.port());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Server ready");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
