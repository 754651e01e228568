use coderoom::config::Config;
use coderoom::relay::RelayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    println!("   coderoom relay");
    println!("   Binding to {}", config.bind_address);
    println!("   Press Ctrl+C to stop\n");

    let server = RelayServer::bind(&config).await?;
    server
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
