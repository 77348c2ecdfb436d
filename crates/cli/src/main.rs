//! larkmsg CLI
//!
//! Manage registered bots, send messages and run the HTTP server.

mod commands;

use clap::{Parser, Subcommand};
use larkmsg_server::config::LarkMsgConfig;

/// larkmsg: send Lark / Feishu messages through registered bots.
#[derive(Parser, Debug)]
#[command(name = "larkmsg", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        long,
        env = "LARK_CONFIG",
        default_value = "larkmsg.toml",
        global = true
    )]
    config: String,

    /// Bot registry database path.
    #[arg(long, env = "LARK_DB_PATH", global = true)]
    db_path: Option<String>,

    /// Encryption key for the registry database.
    #[arg(long, env = "LARK_DB_KEY", global = true, hide_env_values = true)]
    db_key: Option<String>,

    /// Open platform API base URL.
    #[arg(long, env = "LARK_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server.
    Serve(commands::serve::ServeArgs),
    /// Create the bot registry if it does not exist.
    Init,
    /// Manage registered bots.
    Bot(commands::bot::BotArgs),
    /// Send a message through a registered bot.
    Send(commands::send::SendArgs),
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<LarkMsgConfig> {
        let mut config = LarkMsgConfig::load(&self.config)?;
        if let Some(path) = self.db_path.as_deref().filter(|p| !p.is_empty()) {
            config.registry.path = path.to_owned();
        }
        if let Some(key) = self.db_key.as_deref().filter(|k| !k.is_empty()) {
            config.registry.key = Some(key.to_owned());
        }
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.is_empty()) {
            config.lark.base_url = url.to_owned();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    larkmsg_server::telemetry::init_stderr();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Command::Serve(args) => commands::serve::run(config, &args).await,
        Command::Init => commands::init::run(&config).await,
        Command::Bot(args) => commands::bot::run(&config, &args, &cli.format).await,
        Command::Send(args) => commands::send::run(&config, &args, &cli.format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_override_registry_and_base_url() {
        let cli = Cli::try_parse_from([
            "larkmsg",
            "--config",
            "/nonexistent/larkmsg.toml",
            "--db-path",
            "/tmp/bots.db",
            "--db-key",
            "k",
            "--base-url",
            "http://127.0.0.1:9",
            "init",
        ])
        .unwrap();

        let config = cli.load_config().unwrap();
        assert_eq!(config.registry.path, "/tmp/bots.db");
        assert_eq!(config.registry.key.as_deref(), Some("k"));
        assert_eq!(config.lark.base_url, "http://127.0.0.1:9");
    }

    #[test]
    fn send_accepts_repeated_images() {
        let cli = Cli::try_parse_from([
            "larkmsg", "send", "--bot", "ops", "--to", "ou_1", "-i", "a.png", "-i", "b.jpg",
        ])
        .unwrap();

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.images.len(), 2);
        assert_eq!(args.id_type, "open_id");
    }

    #[test]
    fn short_flags_for_send_and_bot_add() {
        let cli = Cli::try_parse_from([
            "larkmsg", "send", "-b", "ops", "-t", "oc_1", "-c", "hi",
        ])
        .unwrap();
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.bot, "ops");
        assert_eq!(args.to, "oc_1");
        assert_eq!(args.content.as_deref(), Some("hi"));

        let cli = Cli::try_parse_from([
            "larkmsg", "bot", "add", "-n", "ops", "--app-id", "cli_1", "--app-secret", "s",
        ])
        .unwrap();
        let Command::Bot(args) = cli.command else {
            panic!("expected bot");
        };
        assert!(matches!(
            args.command,
            commands::bot::BotCommand::Add { ref name, .. } if name == "ops"
        ));
    }

    #[test]
    fn bot_add_requires_secret() {
        let result = Cli::try_parse_from([
            "larkmsg", "bot", "add", "--name", "ops", "--app-id", "cli_1",
        ]);
        assert!(result.is_err());
    }
}
