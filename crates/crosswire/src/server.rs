//! `CrosswireServer` builder and accept loop.
//!
//! This is the entry point for running the coordination service. It ties
//! the layers together: transport → protocol → game service actor.

use crosswire_game::GameService;
use crosswire_protocol::JsonCodec;
use crosswire_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::service::{spawn_service, ServiceHandle};
use crate::ServerError;

/// Default command channel size for the service actor.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Builder for configuring and starting a Crosswire server.
///
/// # Example
///
/// ```rust,no_run
/// use crosswire::ServerBuilder;
///
/// # async fn run() -> Result<(), crosswire::ServerError> {
/// let server = ServerBuilder::new().bind("0.0.0.0:8080").build().await?;
/// server.run().await
/// # }
/// ```
pub struct ServerBuilder {
    bind_addr: String,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the transport, spawns the service actor, and returns the
    /// server ready to run.
    pub async fn build(self) -> Result<CrosswireServer, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let service =
            spawn_service(GameService::new(), DEFAULT_CHANNEL_SIZE);

        Ok(CrosswireServer {
            transport,
            service,
            codec: JsonCodec,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Crosswire server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CrosswireServer {
    transport: WebSocketTransport,
    service: ServiceHandle,
    codec: JsonCodec,
}

impl CrosswireServer {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("crosswire server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let service = self.service.clone();
                    let codec = self.codec;
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, service, codec).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
