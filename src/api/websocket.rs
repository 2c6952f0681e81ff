//! WebSocket endpoint streaming live store changes.
//!
//! Clients subscribe to one collection per socket and receive each committed
//! change as a JSON [`StoreEvent`], in commit order for that collection.
//!
//! # Authentication
//! The session token is checked before upgrading, so an unauthenticated
//! request gets a proper HTTP 401 rather than an open-then-closed socket.

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::auth::AuthUser;
use crate::error::ErrorResponse;
use crate::store::{paths, StoreEvent, TicketStore};

/// Ping interval for keeping connections alive.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Grace period for a pong after a ping.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Collections a client may subscribe to.
const SUBSCRIBABLE: &[&str] = &[
    paths::USERS,
    paths::REQUESTS,
    paths::RECOMMENDATIONS,
    paths::PARTS_REQUESTS,
];

/// Upgrade to a WebSocket streaming one collection's change events.
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    store: web::Data<TicketStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    // Authenticate before upgrading; drive the extractor manually so the
    // failure is a structured 401, not a dropped socket.
    let auth_result = {
        let mut payload = actix_web::dev::Payload::None;
        <AuthUser as actix_web::FromRequest>::from_request(&req, &mut payload).await
    };
    let user = match auth_result {
        Ok(user) => user,
        Err(err) => {
            warn!(
                client = %req.connection_info().realip_remote_addr().unwrap_or("unknown"),
                "WebSocket authentication failed"
            );
            return Ok(HttpResponse::Unauthorized().json(ErrorResponse {
                error: "UNAUTHORIZED".to_string(),
                message: err.to_string(),
            }));
        }
    };

    let collection = path.into_inner();
    if !SUBSCRIBABLE.contains(&collection.as_str()) {
        return Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: "NOT_FOUND".to_string(),
            message: format!("no such collection: {}", collection),
        }));
    }

    let client_addr = req
        .connection_info()
        .realip_remote_addr()
        .map(String::from)
        .unwrap_or_else(|| "unknown".to_string());

    let events = store.subscribe(&collection);
    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;

    info!(
        client = %client_addr,
        uid = %user.uid,
        collection = %collection,
        "WebSocket connection established"
    );

    actix_web::rt::spawn(relay_events(session, msg_stream, events, client_addr));
    Ok(response)
}

/// Pump store events to one connected client until either side drops.
async fn relay_events(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    mut events: tokio::sync::broadcast::Receiver<StoreEvent>,
    client_addr: String,
) {
    let mut last_pong = Instant::now();
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    // The first tick fires immediately; skip it so the pong deadline starts
    // after a real ping.
    ping_interval.tick().await;

    loop {
        tokio::select! {
            Some(msg_result) = msg_stream.next() => {
                match msg_result {
                    Ok(Message::Ping(bytes)) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Pong(_)) => {
                        last_pong = Instant::now();
                    }
                    Ok(Message::Close(reason)) => {
                        info!(client = %client_addr, reason = ?reason, "client requested close");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(client = %client_addr, error = %e, "WebSocket message error");
                        break;
                    }
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(client = %client_addr, error = %e, "event serialization failed");
                                continue;
                            }
                        };
                        if session.text(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Slow consumer: tell the client it missed events so
                        // it can refetch, then keep streaming.
                        warn!(client = %client_addr, skipped = %skipped, "subscriber lagged");
                        let notice = format!(r#"{{"lagged":{}}}"#, skipped);
                        if session.text(notice).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!(client = %client_addr, "event channel closed");
                        break;
                    }
                }
            }

            _ = ping_interval.tick() => {
                if last_pong.elapsed() > PING_INTERVAL + PONG_TIMEOUT {
                    info!(client = %client_addr, "pong timeout, closing");
                    break;
                }
                if session.ping(b"").await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = session.close(None).await;
    info!(client = %client_addr, "WebSocket connection closed");
}

/// Configure websocket routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws/{collection}", web::get().to(websocket_handler));
}
