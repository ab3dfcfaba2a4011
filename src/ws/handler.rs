//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{RoundEvent, RoundSession, SessionHandle};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    info!(session_id = %session_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    // Send welcome message
    let welcome = ServerMsg::Welcome {
        session_id,
        server_time: unix_millis(),
        config: state.config.round.clone(),
    };

    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(session_id = %session_id, error = %e, "Failed to send welcome");
        return;
    }

    // One round session per connection
    let (session, handle) = RoundSession::new(session_id, state.config.round.clone());
    let updates_rx = handle.subscribe();
    state.sessions.insert(handle.clone());

    let sessions = state.sessions.clone();
    let session_task = tokio::spawn(async move {
        session.run().await;
        sessions.remove(&session_id);
    });

    run_connection(&handle, ws_sink, ws_stream, updates_rx).await;

    // Closing the socket is closing the game window
    handle.selection.detach();
    handle.send(RoundEvent::Shutdown);
    if let Err(e) = session_task.await {
        error!(session_id = %session_id, error = %e, "Session task failed");
    }

    info!(session_id = %session_id, "WebSocket connection closed");
}

/// Run the WebSocket connection with read/write split
async fn run_connection(
    handle: &SessionHandle,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut updates_rx: broadcast::Receiver<ServerMsg>,
) {
    let session_id = handle.id;
    let rate_limiter = ConnectionRateLimiter::new();

    // Spawn writer task: round updates -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match updates_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        session_id = %session_id,
                        lagged_count = n,
                        "Client lagged, skipping {} updates", n
                    );
                    // Continue - don't disconnect for lag
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(session_id = %session_id, "Update channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> round queue
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(client_msg) => {
                    if !dispatch(handle, &rate_limiter, client_msg) {
                        debug!(session_id = %session_id, "Round queue closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Failed to parse client message");
                    let _ = handle.updates_tx.send(ServerMsg::Error {
                        code: "bad_message".to_string(),
                        message: e.to_string(),
                    });
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(session_id = %session_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(session_id = %session_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Abort writer task
    writer_handle.abort();
}

/// Route one client message. Returns false once the session is gone.
fn dispatch(handle: &SessionHandle, rate_limiter: &ConnectionRateLimiter, msg: ClientMsg) -> bool {
    match msg {
        ClientMsg::NewGame => handle.send(RoundEvent::NewGame),
        ClientMsg::Quit => handle.send(RoundEvent::Quit),
        ClientMsg::Select { object_id } => {
            if !rate_limiter.check_selection() {
                warn!(session_id = %handle.id, object_id = %object_id, "Rate limited selection");
            } else if !handle.selection.publish(object_id.clone()) {
                debug!(session_id = %handle.id, object_id = %object_id, "Selection with no running round dropped");
            }
            true
        }
        ClientMsg::Ping { t } => {
            let _ = handle.updates_tx.send(ServerMsg::Pong { t });
            true
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoundConfig;
    use crate::game::RoundEpoch;

    #[tokio::test]
    async fn dispatch_routes_commands_and_picks() {
        let (session, handle) = RoundSession::new(Uuid::new_v4(), RoundConfig::default());
        drop(session);
        let limiter = ConnectionRateLimiter::new();

        // Session is gone, so commands report failure
        assert!(!dispatch(&handle, &limiter, ClientMsg::NewGame));

        // Picks are dropped silently when no round is subscribed
        assert!(dispatch(
            &handle,
            &limiter,
            ClientMsg::Select {
                object_id: "ball_01_green".into()
            }
        ));
    }

    #[tokio::test]
    async fn ping_is_answered_on_the_update_channel() {
        let (_session, handle) = RoundSession::new(Uuid::new_v4(), RoundConfig::default());
        let mut rx = handle.subscribe();
        let limiter = ConnectionRateLimiter::new();

        assert!(dispatch(&handle, &limiter, ClientMsg::Ping { t: 5 }));
        assert_eq!(rx.try_recv().unwrap(), ServerMsg::Pong { t: 5 });
    }

    #[tokio::test]
    async fn picks_reach_a_subscribed_round() {
        use crate::game::selection::SelectionSource;
        use tokio::sync::mpsc;

        let (_session, handle) = RoundSession::new(Uuid::new_v4(), RoundConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let epoch = RoundEpoch::default().next();
        let mut source = handle.selection.clone();
        let _token = source.subscribe(epoch, tx).unwrap();

        let limiter = ConnectionRateLimiter::new();
        dispatch(
            &handle,
            &limiter,
            ClientMsg::Select {
                object_id: "ball_03_red".into(),
            },
        );

        assert_eq!(
            rx.try_recv().unwrap(),
            RoundEvent::Selection {
                epoch,
                object_id: "ball_03_red".into()
            }
        );
    }
}
