//! Per-connection handler: decode, route, and write back.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the connection's outbound channel. The
//! flow is:
//!   1. Register the outbound channel with the service actor
//!   2. Loop: receive bytes → decode `ClientEvent` → forward to the actor
//!   3. On socket close (or any read error): report the disconnect so the
//!      seat is cleaned up and the peer notified

use std::sync::Arc;

use crosswire_protocol::{
    ClientEvent, ClientId, Codec, ErrorKind, JsonCodec, ServerEvent,
};
use crosswire_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::service::{EventSender, ServiceHandle};
use crate::ServerError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    service: ServiceHandle,
    codec: JsonCodec,
) -> Result<(), ServerError> {
    let client = ClientId(conn.id().into_inner());
    tracing::debug!(client_id = %client, "handling new connection");

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    service.register(client, outbound_tx.clone()).await?;

    let conn = Arc::new(conn);
    let writer = tokio::spawn(write_outbound(
        Arc::clone(&conn),
        outbound_rx,
        codec,
    ));

    let result =
        read_inbound(&conn, client, &service, &outbound_tx, codec).await;

    // Disconnect bookkeeping runs no matter how the read loop ended —
    // cleanup must never be skipped, and must never fail visibly.
    let _ = service.disconnected(client).await;

    // The actor dropped its sender on Disconnected; dropping ours ends
    // the writer's channel and lets the task finish.
    drop(outbound_tx);
    let _ = writer.await;

    result
}

/// Drains the outbound channel onto the socket until either side closes.
async fn write_outbound(
    conn: Arc<WebSocketConnection>,
    mut outbound_rx: mpsc::UnboundedReceiver<ServerEvent>,
    codec: JsonCodec,
) {
    while let Some(event) = outbound_rx.recv().await {
        let bytes = match codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode event");
                continue;
            }
        };
        if conn.send(&bytes).await.is_err() {
            break;
        }
    }
}

/// Receives and routes client events until the connection ends.
async fn read_inbound(
    conn: &WebSocketConnection,
    client: ClientId,
    service: &ServiceHandle,
    outbound: &EventSender,
    codec: JsonCodec,
) -> Result<(), ServerError> {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(client_id = %client, "connection closed");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(client_id = %client, error = %e, "recv error");
                return Ok(());
            }
        };

        let event: ClientEvent = match codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                // Malformed input never crashes the handler — the
                // originator gets a structured fault and the loop goes on.
                tracing::debug!(
                    client_id = %client,
                    error = %e,
                    "malformed event payload"
                );
                let _ = outbound.send(ServerEvent::Error {
                    kind: ErrorKind::InternalFault,
                    message: "malformed event payload".to_string(),
                });
                continue;
            }
        };

        match event {
            // Request/acknowledgment: the caller is answered exactly once,
            // whatever the outcome.
            ClientEvent::RequestRematch { session_id } => {
                let ack = match service.rematch(session_id).await? {
                    Ok(()) => ServerEvent::RematchAck {
                        success: true,
                        error: None,
                    },
                    Err(e) => ServerEvent::RematchAck {
                        success: false,
                        error: Some(e.kind()),
                    },
                };
                let _ = outbound.send(ack);
            }
            other => service.inbound(client, other).await?,
        }
    }
}
