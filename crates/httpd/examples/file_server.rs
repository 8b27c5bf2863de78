use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use flash_httpd::{
    Config, HttpServer, HttpServerError,
    host::{DirFs, DisabledEngine, SimBoard, TcpTransport},
};

/// Serves a host directory as if it were the board's flash.
#[derive(Debug, Parser)]
struct Args {
    /// TOML config file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory mounted as the flash filesystem root.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Overrides the listen address from the config.
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), HttpServerError> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    let transport = TcpTransport::bind(config.listen)?;
    log::info!("listening on {}", transport.local_addr()?);
    let mut server = HttpServer::new(
        config,
        transport,
        DirFs::new(args.root),
        DisabledEngine,
        SimBoard::new(4),
    )?;

    let handle = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });

    server.run().await;
    Ok(())
}
