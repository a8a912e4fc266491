use crate::infra::{AppState, OutboundMessage, VipEntry};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use top_stats::error::AppError;
use top_stats::stats::{ConnectedPlayer, TriggerOutcome};
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct TeamViewUpdate {
    pub(crate) team_view: Value,
    pub(crate) session_players: usize,
    #[serde(default)]
    pub(crate) connected: Option<Vec<ConnectedPlayer>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeamViewLoaded {
    pub(crate) status: &'static str,
    pub(crate) session_players: usize,
    pub(crate) recipients: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatEvent {
    pub(crate) player_id: String,
    pub(crate) message: String,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/team-view", put(load_team_view))
        .route("/api/v1/events/chat", post(chat_event))
        .route("/api/v1/events/match-end", post(match_end_event))
        .route("/api/v1/vips", get(list_vips))
        .route("/api/v1/messages", get(list_messages))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn load_team_view(
    Extension(state): Extension<AppState>,
    Json(update): Json<TeamViewUpdate>,
) -> Json<TeamViewLoaded> {
    let TeamViewUpdate {
        team_view,
        session_players,
        connected,
    } = update;

    let recipients = state.game.load_match(team_view, session_players, connected);
    info!(session_players, recipients, "team view replaced");

    Json(TeamViewLoaded {
        status: "loaded",
        session_players,
        recipients,
    })
}

pub(crate) async fn chat_event(
    Extension(state): Extension<AppState>,
    Json(event): Json<ChatEvent>,
) -> Result<Json<TriggerOutcome>, AppError> {
    let outcome = state
        .service
        .on_chat_command(&event.player_id, &event.message)?;
    Ok(Json(outcome))
}

pub(crate) async fn match_end_event(
    Extension(state): Extension<AppState>,
) -> Result<Json<TriggerOutcome>, AppError> {
    let outcome = state.service.on_match_end()?;
    Ok(Json(outcome))
}

pub(crate) async fn list_vips(Extension(state): Extension<AppState>) -> Json<Vec<VipEntry>> {
    Json(state.game.vips())
}

pub(crate) async fn list_messages(
    Extension(state): Extension<AppState>,
) -> Json<Vec<OutboundMessage>> {
    Json(state.game.messages())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryGameServer;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use top_stats::stats::{TopStatsConfig, TopStatsService};
    use tower::ServiceExt;

    fn app(ready: bool) -> (Router, Arc<InMemoryGameServer>) {
        let game = Arc::new(InMemoryGameServer::default());
        let service = TopStatsService::new(Arc::clone(&game), TopStatsConfig::default());
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState::new(
            Arc::new(AtomicBool::new(ready)),
            handle,
            Arc::clone(&game),
            service,
        );
        (router(state), game)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn match_payload(session_players: usize) -> Value {
        json!({
            "session_players": session_players,
            "team_view": {
                "allies": {
                    "commander": {
                        "name": "Ike", "player_id": "1", "role": "armycommander",
                        "combat": 800, "offense": 900, "defense": 700, "support": 2400
                    },
                    "squads": {
                        "able": {
                            "type": "infantry",
                            "players": [{
                                "name": "Smith", "player_id": "2", "role": "rifleman",
                                "kills": 12, "deaths": 3,
                                "combat": 400, "offense": 500, "defense": 300, "support": 100
                            }],
                            "kills": 12, "deaths": 3,
                            "combat": 400, "offense": 500, "defense": 300, "support": 100
                        }
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let (app, _) = app(false);

        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "initializing");
    }

    #[tokio::test]
    async fn chat_command_sends_private_reply() {
        let (app, game) = app(true);

        let loaded = app
            .clone()
            .oneshot(json_request(Method::PUT, "/api/v1/team-view", match_payload(80)))
            .await
            .expect("route responds");
        assert_eq!(loaded.status(), StatusCode::OK);
        assert_eq!(body_json(loaded).await["recipients"], 2);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/events/chat",
                json!({ "player_id": "2", "message": "!top" }),
            ))
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["outcome"], "replied");
        assert_eq!(body["delivered"], true);

        let messages = game.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].player_id, "2");
        assert!(messages[0].message.starts_with("█ Best players █"));
        assert!(game.vips().is_empty());
    }

    #[tokio::test]
    async fn match_end_grants_and_broadcasts() {
        let (app, game) = app(true);

        app.clone()
            .oneshot(json_request(Method::PUT, "/api/v1/team-view", match_payload(80)))
            .await
            .expect("route responds");

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/v1/events/match-end")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["outcome"], "broadcast");
        assert_eq!(body["summary"]["delivered"], 2);
        assert_eq!(game.messages().len(), 2);

        let vips = app
            .oneshot(Request::get("/api/v1/vips").body(Body::empty()).expect("request"))
            .await
            .expect("route responds");
        let vips = body_json(vips).await;
        let labels: Vec<_> = vips
            .as_array()
            .expect("vip list")
            .iter()
            .map(|entry| entry["label"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(labels, vec!["Ike Top-Player", "Smith Top-Player"]);
    }

    #[tokio::test]
    async fn match_end_without_stats_is_not_broadcast() {
        let (app, game) = app(true);

        let response = app
            .oneshot(
                Request::post("/api/v1/events/match-end")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route responds");

        let body = body_json(response).await;
        assert_eq!(body["outcome"], "no_stats");
        assert_eq!(body["report"]["text"], "No stats yet");
        assert!(game.messages().is_empty());
    }
}
