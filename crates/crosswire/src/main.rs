use crosswire::ServerBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // The only command-line input: an optional listening port.
    let port: u16 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 8080,
    };

    let server = ServerBuilder::new()
        .bind(&format!("0.0.0.0:{port}"))
        .build()
        .await?;
    tracing::info!(port, "crosswire listening");

    server.run().await?;
    Ok(())
}
