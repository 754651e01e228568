use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use super::actor::CoordinatorHandle;
use super::coordinator::Coordinator;
use super::messages::ClientEvent;
use super::rooms::RoomRegistry;
use super::types::{ClientId, OutboundMessage, RelayError, Session};
use crate::assets;
use crate::config::Config;

const PING_INTERVAL: Duration = Duration::from_secs(30);
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RelayServer {
    listener: TcpListener,
    router: Router,
}

impl RelayServer {
    /// Bind the listener and start the coordinator.
    pub async fn bind(config: &Config) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address).await?;
        info!("Relay server listening on {}", listener.local_addr()?);
        info!("Serving static files from {}", config.static_dir.display());

        let handle = CoordinatorHandle::spawn(Coordinator::new(RoomRegistry::new()));
        Ok(Self {
            listener,
            router: router(handle, &config.static_dir),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;
        Ok(())
    }
}

/// `/ws` carries the event stream; every other path is the static bundle.
pub fn router(handle: CoordinatorHandle, static_dir: &Path) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .fallback_service(assets::service(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(handle)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(handle): State<CoordinatorHandle>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_connection(socket, addr, handle).await {
            error!("Connection error from {}: {}", addr, e);
        }
    })
}

async fn handle_connection(
    socket: WebSocket,
    addr: SocketAddr,
    handle: CoordinatorHandle,
) -> Result<(), RelayError> {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let client = ClientId::generate();
    info!("User connected: {} ({})", client, addr);

    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ctrl_tx, mut ctrl_rx) = mpsc::unbounded_channel::<Message>();
    handle.connect(client, tx).await?;

    let mut session = Session::default();
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    let mut waiting_for_pong = false;
    let mut pong_deadline: Option<tokio::time::Instant> = None;

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    if ws_tx.send(Message::Text(msg.into_inner())).await.is_err() {
                        break;
                    }
                }
                Some(ctrl_msg) = ctrl_rx.recv() => {
                    if ws_tx.send(ctrl_msg).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    loop {
        let pong_timeout = async {
            match pong_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = ping_interval.tick() => {
                if waiting_for_pong {
                    warn!("No Pong received, disconnecting {}", client);
                    break;
                }
                if ctrl_tx.send(Message::Ping(Bytes::new())).is_err() {
                    break;
                }
                waiting_for_pong = true;
                pong_deadline = Some(tokio::time::Instant::now() + PONG_TIMEOUT);
                debug!("Ping sent to {}", client);
            }

            _ = pong_timeout => {
                warn!("Pong timeout, disconnecting {}", client);
                break;
            }

            msg = ws_rx.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", client, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        let event: ClientEvent = match serde_json::from_str(text.as_str()) {
                            Ok(event) => event,
                            Err(e) => {
                                debug!("Ignoring malformed event from {}: {}", client, e);
                                continue;
                            }
                        };
                        if let Err(e) = handle.dispatch(client, &mut session, event).await {
                            error!("Dropping {}: {}", client, e);
                            break;
                        }
                    }
                    Message::Pong(_) => {
                        waiting_for_pong = false;
                        pong_deadline = None;
                        debug!("Pong received from {}", client);
                    }
                    Message::Close(_) => {
                        debug!("Close received from {}", client);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    handle.disconnect(client, session).await;
    send_task.abort();
    info!("User disconnected: {}", client);

    Ok(())
}
