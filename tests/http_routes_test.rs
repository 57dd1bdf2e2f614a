//! Tests for the HTTP routes, driven in-process through the router.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use polled_games::{AppState, GameStateResponse, MatchState, ServerConfig, router};
use std::time::Duration;
use tower::ServiceExt;

fn test_app() -> (Router, AppState) {
    let state = AppState::new(ServerConfig::default()).unwrap();
    (router(state.clone()), state)
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(res: Response<Body>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(res: &Response<Body>) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// `player_id=N` from a `Set-Cookie` header.
fn issued_cookie(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Creates a match as a new browser; returns (match id, creator cookie).
async fn create(app: &Router, query: &str) -> (String, String) {
    let res = get(app, &format!("/create_game{}", query), None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let cookie = issued_cookie(&res).expect("creator gets an identity");
    let loc = location(&res).to_string();
    let id = body_text(res).await;
    assert_eq!(loc, format!("/match?id={}", id));
    (id, cookie)
}

/// Joins `id` as a new browser; returns the joiner cookie.
async fn join(app: &Router, id: &str) -> String {
    let res = get(app, &format!("/match?id={}", id), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    issued_cookie(&res).expect("joiner gets an identity")
}

async fn state_of(app: &Router, id: &str, cookie: &str) -> GameStateResponse {
    let res = get(app, &format!("/game_state?id={}", id), Some(cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    serde_json::from_str(&body_text(res).await).unwrap()
}

async fn make_move(app: &Router, id: &str, cookie: &str, x: i64, y: i64) -> String {
    let res = get(
        app,
        &format!("/make_move?id={}&x={}&y={}", id, x, y),
        Some(cookie),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    body_text(res).await
}

#[tokio::test]
async fn test_create_game_redirects_and_sets_cookie() {
    let (app, state) = test_app();
    let (id, cookie) = create(&app, "").await;

    let game = state_of(&app, &id, &cookie).await;
    assert_eq!(game.state, MatchState::Waiting);
    assert_eq!(game.player_num, 1);
    assert_eq!(game.board, vec!["***", "***", "***"]);
    assert_eq!(state.registry().len(), 1);
}

#[tokio::test]
async fn test_create_game_reuses_existing_cookie() {
    let (app, _) = test_app();
    let res = get(&app, "/create_game", Some("player_id=4242")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let id = body_text(res).await;

    let game = state_of(&app, &id, "player_id=4242").await;
    assert_eq!(game.player_num, 1);
}

#[tokio::test]
async fn test_board_size_is_clamped() {
    let (app, _) = test_app();
    let (id, cookie) = create(&app, "?size=7").await;
    assert_eq!(state_of(&app, &id, &cookie).await.board.len(), 5);

    let (id, cookie) = create(&app, "?size=0").await;
    assert_eq!(state_of(&app, &id, &cookie).await.board, vec!["*"]);

    let (id, cookie) = create(&app, "?size=lots").await;
    assert_eq!(state_of(&app, &id, &cookie).await.board.len(), 3);
}

#[tokio::test]
async fn test_second_visitor_joins_as_player_two() {
    let (app, _) = test_app();
    let (id, creator) = create(&app, "").await;
    let joiner = join(&app, &id).await;
    assert_ne!(creator, joiner);

    let game = state_of(&app, &id, &joiner).await;
    assert_eq!(game.state, MatchState::PlayerATurn);
    assert_eq!(game.player_num, 2);

    // returning participants get the page without a new cookie
    let res = get(&app, &format!("/match?id={}", id), Some(joiner.as_str())).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(issued_cookie(&res).is_none());
    assert!(body_text(res).await.contains("game.js"));
}

#[tokio::test]
async fn test_creator_revisiting_does_not_join() {
    let (app, _) = test_app();
    let (id, creator) = create(&app, "").await;
    let res = get(&app, &format!("/match?id={}", id), Some(creator.as_str())).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(state_of(&app, &id, &creator).await.state, MatchState::Waiting);
}

#[tokio::test]
async fn test_third_visitor_is_redirected() {
    let (app, _) = test_app();
    let (id, _) = create(&app, "").await;
    join(&app, &id).await;

    let res = get(&app, &format!("/match?id={}", id), Some("player_id=31337")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    let res = get(&app, &format!("/game_state?id={}", id), Some("player_id=31337")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let res = get(&app, &format!("/wait_for_update?id={}", id), Some("player_id=31337")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_unknown_match_redirects() {
    let (app, _) = test_app();
    for uri in [
        "/match?id=1",
        "/match?id=nope",
        "/match",
        "/game_state?id=1",
        "/wait_for_update?id=1",
    ] {
        let res = get(&app, uri, Some("player_id=5")).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&res), "/", "{uri}");
    }
}

#[tokio::test]
async fn test_moves_report_success_and_failure() {
    let (app, _) = test_app();
    let (id, a) = create(&app, "").await;
    let b = join(&app, &id).await;

    assert_eq!(make_move(&app, &id, &b, 0, 0).await, "failure");
    assert_eq!(make_move(&app, &id, &a, 3, 0).await, "failure");
    assert_eq!(make_move(&app, &id, &a, -1, 0).await, "failure");
    assert_eq!(make_move(&app, &id, &a, 1, 1).await, "success");
    assert_eq!(make_move(&app, &id, &b, 1, 1).await, "failure");
    assert_eq!(make_move(&app, &id, &b, 2, 0).await, "success");

    let game = state_of(&app, &id, &a).await;
    assert_eq!(game.board, vec!["**o", "*x*", "***"]);
    assert_eq!(game.state, MatchState::PlayerATurn);
}

#[tokio::test]
async fn test_malformed_move_requests_fail_with_ok_status() {
    let (app, _) = test_app();
    let (id, a) = create(&app, "").await;
    join(&app, &id).await;

    for uri in [
        format!("/make_move?id={}&x=1", id),
        format!("/make_move?id={}&x=a&y=1", id),
        "/make_move?id=nope&x=1&y=1".to_string(),
        "/make_move".to_string(),
    ] {
        let res = get(&app, &uri, Some(a.as_str())).await;
        assert_eq!(res.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_text(res).await, "failure", "{uri}");
    }

    let res = get(&app, &format!("/make_move?id={}&x=0&y=0", id), None).await;
    assert_eq!(body_text(res).await, "failure");
}

#[tokio::test]
async fn test_full_game_over_http() {
    let (app, _) = test_app();
    let (id, a) = create(&app, "?size=3").await;
    let b = join(&app, &id).await;

    for (cookie, x, y) in [(&a, 0, 0), (&b, 1, 0), (&a, 0, 1), (&b, 1, 1), (&a, 0, 2)] {
        assert_eq!(make_move(&app, &id, cookie, x, y).await, "success");
    }
    assert_eq!(state_of(&app, &id, &b).await.state, MatchState::PlayerAWin);
    assert_eq!(make_move(&app, &id, &b, 2, 2).await, "failure");
}

#[tokio::test(start_paused = true)]
async fn test_first_wait_returns_immediately() {
    let (app, _) = test_app();
    let (id, a) = create(&app, "").await;

    let start = tokio::time::Instant::now();
    let res = get(&app, &format!("/wait_for_update?id={}", id), Some(a.as_str())).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.is_empty());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_wait_released_by_join() {
    let (app, _) = test_app();
    let (id, a) = create(&app, "").await;
    get(&app, &format!("/wait_for_update?id={}", id), Some(a.as_str())).await;

    let waiter = {
        let app = app.clone();
        let uri = format!("/wait_for_update?id={}", id);
        let a = a.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            let res = get(&app, &uri, Some(a.as_str())).await;
            (res.status(), start.elapsed())
        })
    };
    tokio::task::yield_now().await;
    join(&app, &id).await;

    let (status, elapsed) = waiter.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(elapsed < Duration::from_secs(60));
    assert_eq!(state_of(&app, &id, &a).await.state, MatchState::PlayerATurn);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_wait_forfeits_after_timeout() {
    let (app, _) = test_app();
    let (id, a) = create(&app, "").await;
    let b = join(&app, &id).await;
    let wait = format!("/wait_for_update?id={}", id);

    // consume the pending updates from creation and join
    get(&app, &wait, Some(a.as_str())).await;
    get(&app, &wait, Some(b.as_str())).await;

    // A is on the clock and never moves; B's wait runs out
    let start = tokio::time::Instant::now();
    let res = get(&app, &wait, Some(b.as_str())).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert_eq!(state_of(&app, &id, &b).await.state, MatchState::PlayerBWin);
}

#[tokio::test]
async fn test_static_assets_and_fallback() {
    let (app, _) = test_app();

    let res = get(&app, "/", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("/create_game"));

    let res = get(&app, "/game.js", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/javascript"
    );
    assert!(body_text(res).await.contains("wait_for_update"));

    let res = get(&app, "/favicon.ico", None).await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn test_made_up_cookies_are_not_recorded() {
    let (app, state) = test_app();
    for n in 1..=50 {
        let cookie = format!("player_id={}", 9_000_000 + n);
        get(&app, "/game_state?id=1", Some(cookie.as_str())).await;
        get(&app, "/create_game", Some(cookie.as_str())).await;
    }
    assert!(!state.identities().is_known(polled_games::PlayerId(9_000_001)));
    assert!(state.identities().is_empty());

    create(&app, "").await;
    assert_eq!(state.identities().len(), 1);
}

#[test]
fn test_state_rejects_invalid_config() {
    let config: ServerConfig =
        toml::from_str("finished_match_retention_secs = 5\neviction_interval_secs = 0").unwrap();
    assert!(matches!(
        AppState::new(config),
        Err(polled_games::ConfigError::Invalid(_))
    ));
}
