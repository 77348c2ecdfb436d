use clap::Parser;

use larkmsg_server::config::LarkMsgConfig;

/// larkmsg HTTP server.
#[derive(Parser, Debug)]
#[command(name = "larkmsg-server", about = "HTTP API for sending Lark / Feishu messages")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "LARK_CONFIG", default_value = "larkmsg.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    larkmsg_server::telemetry::init();

    let mut config = LarkMsgConfig::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    larkmsg_server::serve::run(config).await?;
    Ok(())
}
