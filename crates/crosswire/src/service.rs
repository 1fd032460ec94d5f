//! Service actor: a single Tokio task that owns all game state.
//!
//! Every inbound event from every connection funnels through one mpsc
//! channel into this task, which runs each operation against the
//! [`GameService`] to completion — read, mutate, dispatch — before
//! looking at the next command. That serialization is the whole
//! concurrency story: no locks, no partially-interleaved mutations.
//!
//! The actor also owns the broadcast-group registry: a map from client to
//! outbound channel. Delivery is fire-and-forget; a closed channel just
//! means the client is already gone.

use std::collections::HashMap;

use crosswire_game::{Emitted, GameError, GameService};
use crosswire_protocol::{
    ClientEvent, ClientId, Recipient, ServerEvent, SessionId,
};
use tokio::sync::{mpsc, oneshot};

use crate::ServerError;

/// Channel sender for delivering outbound events to one connection.
pub(crate) type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to the service actor through its channel.
///
/// Rematch carries a `oneshot` reply channel — the one operation with
/// request/acknowledgment semantics; everything else is fire-and-forget.
pub(crate) enum ServiceCommand {
    /// Register a connection's outbound channel.
    Register {
        client: ClientId,
        sender: EventSender,
    },

    /// An event from a connected client.
    Inbound {
        client: ClientId,
        event: ClientEvent,
    },

    /// Reset a session for a rematch and acknowledge the caller.
    Rematch {
        session_id: SessionId,
        reply: oneshot::Sender<Result<(), GameError>>,
    },

    /// A connection dropped; clean up its seat and channel.
    Disconnected { client: ClientId },
}

/// Handle to the running service actor. Cheap to clone — one per
/// connection handler.
#[derive(Clone)]
pub(crate) struct ServiceHandle {
    sender: mpsc::Sender<ServiceCommand>,
}

impl ServiceHandle {
    /// Registers a connection's outbound channel.
    pub(crate) async fn register(
        &self,
        client: ClientId,
        sender: EventSender,
    ) -> Result<(), ServerError> {
        self.sender
            .send(ServiceCommand::Register { client, sender })
            .await
            .map_err(|_| ServerError::ServiceUnavailable)
    }

    /// Forwards a client event (fire-and-forget).
    pub(crate) async fn inbound(
        &self,
        client: ClientId,
        event: ClientEvent,
    ) -> Result<(), ServerError> {
        self.sender
            .send(ServiceCommand::Inbound { client, event })
            .await
            .map_err(|_| ServerError::ServiceUnavailable)
    }

    /// Requests a rematch and waits for the acknowledgment.
    pub(crate) async fn rematch(
        &self,
        session_id: SessionId,
    ) -> Result<Result<(), GameError>, ServerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ServiceCommand::Rematch {
                session_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ServerError::ServiceUnavailable)?;
        reply_rx.await.map_err(|_| ServerError::ServiceUnavailable)
    }

    /// Reports a dropped connection.
    pub(crate) async fn disconnected(
        &self,
        client: ClientId,
    ) -> Result<(), ServerError> {
        self.sender
            .send(ServiceCommand::Disconnected { client })
            .await
            .map_err(|_| ServerError::ServiceUnavailable)
    }
}

/// The actor state. Runs inside a Tokio task.
struct ServiceActor {
    service: GameService,
    /// Per-connection outbound channels — the broadcast-group registry.
    senders: HashMap<ClientId, EventSender>,
    receiver: mpsc::Receiver<ServiceCommand>,
}

impl ServiceActor {
    /// Runs the actor loop until every handle is dropped.
    async fn run(mut self) {
        tracing::info!("game service started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                ServiceCommand::Register { client, sender } => {
                    self.senders.insert(client, sender);
                    tracing::debug!(client_id = %client, "client registered");
                }
                ServiceCommand::Inbound { client, event } => {
                    self.handle_inbound(client, event);
                }
                ServiceCommand::Rematch { session_id, reply } => {
                    let result =
                        match self.service.request_rematch(&session_id) {
                            Ok(events) => {
                                self.dispatch(events);
                                Ok(())
                            }
                            Err(e) => Err(e),
                        };
                    let _ = reply.send(result);
                }
                ServiceCommand::Disconnected { client } => {
                    self.senders.remove(&client);
                    let events = self.service.handle_disconnect(client);
                    self.dispatch(events);
                }
            }
        }

        tracing::info!("game service stopped");
    }

    fn handle_inbound(&mut self, client: ClientId, event: ClientEvent) {
        let result = match event {
            ClientEvent::CreateSession { display_name } => {
                Ok(self.service.create_session(client, display_name))
            }
            ClientEvent::JoinSession {
                session_id,
                display_name,
            } => self.service.join_session(client, &session_id, display_name),
            ClientEvent::MakeMove { session_id, cell } => {
                self.service.make_move(client, &session_id, cell)
            }
            ClientEvent::Chat {
                session_id,
                message,
                sender_name,
            } => {
                let timestamp =
                    chrono::Local::now().format("%H:%M:%S").to_string();
                Ok(self.service.send_chat(
                    client,
                    &session_id,
                    &sender_name,
                    &message,
                    &timestamp,
                ))
            }
            ClientEvent::LeaveSession { session_id } => {
                Ok(self.service.leave_session(client, &session_id))
            }
            // Rematch rides its own command so the ack is replied exactly
            // once; it should never arrive on this path.
            ClientEvent::RequestRematch { session_id } => {
                tracing::debug!(
                    %session_id,
                    "rematch arrived without a reply channel, ignoring"
                );
                return;
            }
        };

        match result {
            Ok(events) => self.dispatch(events),
            Err(e) => self.send_error(client, e),
        }
    }

    /// Surfaces a failed operation to the originator only.
    fn send_error(&self, client: ClientId, error: GameError) {
        tracing::debug!(
            client_id = %client,
            error = %error,
            "request rejected"
        );
        self.send_to(
            client,
            ServerEvent::Error {
                kind: error.kind(),
                message: error.to_string(),
            },
        );
    }

    /// Resolves recipients against current membership and fans events out.
    fn dispatch(&self, events: Emitted) {
        for (recipient, event) in events {
            match recipient {
                Recipient::Client(client) => self.send_to(client, event),
                Recipient::Session(session_id) => {
                    for client in self.service.members_of(&session_id) {
                        self.send_to(client, event.clone());
                    }
                }
                Recipient::SessionExcept(session_id, excluded) => {
                    for client in self.service.members_of(&session_id) {
                        if client != excluded {
                            self.send_to(client, event.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends an event to a single client. Silently drops if the
    /// connection is already gone.
    fn send_to(&self, client: ClientId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&client) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns the service actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue — senders wait when the actor
/// falls behind.
pub(crate) fn spawn_service(
    service: GameService,
    channel_size: usize,
) -> ServiceHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = ServiceActor {
        service,
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    ServiceHandle { sender: tx }
}
