use clap::Args;
use larkmsg_server::config::LarkMsgConfig;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the bind host.
    #[arg(long)]
    pub host: Option<String>,
    /// Override the bind port.
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn run(mut config: LarkMsgConfig, args: &ServeArgs) -> anyhow::Result<()> {
    if let Some(host) = &args.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    larkmsg_server::serve::run(config).await?;
    Ok(())
}
