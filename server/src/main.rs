use anyhow::Result;
use clap::Parser;
use server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

/// Serves the artifacts of a finished analyzer run over HTTP.
#[derive(Parser)]
struct Args {
    /// Working directory the analyzer wrote its artifacts into
    #[arg(long, default_value = "./work")]
    dir: String,
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
    let args = Args::parse();

    // artifacts are read once; a later run in the same directory needs a restart
    let app = build_app(args.dir.clone())?;
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, dir = %args.dir, "serving run reports");
    axum::serve(listener, app).await?;
    Ok(())
}
