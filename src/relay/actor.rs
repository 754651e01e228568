use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::coordinator::Coordinator;
use super::messages::ClientEvent;
use super::types::{ClientId, Joined, OutboundMessage, RelayError, RoomId, Session};

/// Commands sent to the coordinator actor
pub(crate) enum RoomCommand {
    Connect {
        client: ClientId,
        tx: mpsc::UnboundedSender<OutboundMessage>,
    },
    Join {
        client: ClientId,
        prior: Option<Joined>,
        room: RoomId,
        user_name: String,
    },
    CodeChange {
        client: ClientId,
        room: RoomId,
        code: String,
    },
    Typing {
        client: ClientId,
        room: RoomId,
        user_name: String,
    },
    LanguageChange {
        room: RoomId,
        language: String,
    },
    Leave {
        client: ClientId,
        joined: Joined,
    },
    Disconnect {
        client: ClientId,
        joined: Option<Joined>,
    },
}

pub(crate) async fn coordinator_actor(mut coordinator: Coordinator, mut rx: mpsc::Receiver<RoomCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            RoomCommand::Connect { client, tx } => coordinator.connect(client, tx),

            RoomCommand::Join {
                client,
                prior,
                room,
                user_name,
            } => coordinator.join(client, prior, room, user_name),

            RoomCommand::CodeChange { client, room, code } => {
                coordinator.code_change(&client, &room, code)
            }

            RoomCommand::Typing {
                client,
                room,
                user_name,
            } => coordinator.typing(&client, &room, user_name),

            RoomCommand::LanguageChange { room, language } => {
                coordinator.language_change(&room, language)
            }

            RoomCommand::Leave { client, joined } => coordinator.leave(&client, &joined),

            RoomCommand::Disconnect { client, joined } => {
                coordinator.disconnect(&client, joined.as_ref())
            }
        }
    }

    info!("Coordinator stopped");
}

/// Handle to communicate with the coordinator actor
#[derive(Clone)]
pub struct CoordinatorHandle {
    pub(crate) tx: mpsc::Sender<RoomCommand>,
}

impl CoordinatorHandle {
    /// Spawn a coordinator task owning `coordinator`.
    pub fn spawn(coordinator: Coordinator) -> Self {
        let (tx, rx) = mpsc::channel::<RoomCommand>(1024);
        tokio::spawn(coordinator_actor(coordinator, rx));
        Self { tx }
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RelayError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| RelayError::Internal("actor channel closed".to_string()))
    }

    /// Register a new connection and its outbound queue
    pub async fn connect(
        &self,
        client: ClientId,
        tx: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Result<(), RelayError> {
        self.send(RoomCommand::Connect { client, tx }).await
    }

    /// Apply one client event, updating the session to match.
    ///
    /// Events with an empty or missing room are dropped here.
    pub async fn dispatch(
        &self,
        client: ClientId,
        session: &mut Session,
        event: ClientEvent,
    ) -> Result<(), RelayError> {
        match event {
            ClientEvent::Join { room_id, user_name } => {
                let Some(room) = room_id.filter(|r| !r.is_empty()) else {
                    debug!("Ignoring join without room from {}", client);
                    return Ok(());
                };
                let user_name = user_name.unwrap_or_default();
                let prior = session.enter(room.clone(), user_name.clone());
                self.send(RoomCommand::Join {
                    client,
                    prior,
                    room,
                    user_name,
                })
                .await
            }

            ClientEvent::CodeChange { room_id, code } => match room_id.filter(|r| !r.is_empty()) {
                Some(room) => {
                    self.send(RoomCommand::CodeChange {
                        client,
                        room,
                        code: code.unwrap_or_default(),
                    })
                    .await
                }
                None => Ok(()),
            },

            ClientEvent::Typing { room_id, user_name } => match room_id.filter(|r| !r.is_empty()) {
                Some(room) => {
                    self.send(RoomCommand::Typing {
                        client,
                        room,
                        user_name: user_name.unwrap_or_default(),
                    })
                    .await
                }
                None => Ok(()),
            },

            ClientEvent::LanguageChange { room_id, language } => {
                match room_id.filter(|r| !r.is_empty()) {
                    Some(room) => {
                        self.send(RoomCommand::LanguageChange {
                            room,
                            language: language.unwrap_or_default(),
                        })
                        .await
                    }
                    None => Ok(()),
                }
            }

            ClientEvent::LeaveRoom(_) => match session.clear() {
                Some(joined) => self.send(RoomCommand::Leave { client, joined }).await,
                None => Ok(()),
            },
        }
    }

    /// Connection closed. Consumes the session.
    pub async fn disconnect(&self, client: ClientId, mut session: Session) {
        let joined = session.clear();
        let room = joined.as_ref().map(|j| j.room.clone());
        if let Err(e) = self.send(RoomCommand::Disconnect { client, joined }).await {
            match room {
                Some(room) => warn!("Cleanup of {} in room {} lost: {}", client, room, e),
                None => warn!("Cleanup of {} lost: {}", client, e),
            }
        }
    }
}
