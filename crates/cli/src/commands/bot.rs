use clap::{Args, Subcommand};
use larkmsg_registry::NewBot;
use larkmsg_server::config::LarkMsgConfig;
use larkmsg_server::store_factory::create_bot_store;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct BotArgs {
    #[command(subcommand)]
    pub command: BotCommand,
}

#[derive(Subcommand, Debug)]
pub enum BotCommand {
    /// Register a new bot.
    Add {
        /// Unique bot name.
        #[arg(short, long)]
        name: String,
        /// Open platform app ID (`cli_...`).
        #[arg(long)]
        app_id: String,
        /// Open platform app secret.
        #[arg(long)]
        app_secret: String,
    },
    /// List registered bots.
    List,
    /// Remove a bot by name.
    Remove {
        /// Bot name.
        name: String,
    },
    /// Enable a bot by name.
    Enable {
        /// Bot name.
        name: String,
    },
    /// Disable a bot by name.
    Disable {
        /// Bot name.
        name: String,
    },
}

pub async fn run(
    config: &LarkMsgConfig,
    args: &BotArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let store = create_bot_store(&config.registry).await?;

    match &args.command {
        BotCommand::Add {
            name,
            app_id,
            app_secret,
        } => {
            let bot = store
                .create(NewBot::new(name.as_str(), app_id.as_str(), app_secret.as_str()))
                .await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bot)?),
                OutputFormat::Text => println!("Bot '{}' added (id {}).", bot.name, bot.id),
            }
        }
        BotCommand::List => {
            let bots = store.list().await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&bots)?);
                }
                OutputFormat::Text => {
                    println!("{} bots registered:", bots.len());
                    for bot in &bots {
                        let status = if bot.enabled { "ON " } else { "OFF" };
                        println!(
                            "  [{status}] #{id} {name} (app {app_id}) created {created}",
                            id = bot.id,
                            name = bot.name,
                            app_id = bot.app_id,
                            created = bot.created_at.format("%Y-%m-%d %H:%M:%S"),
                        );
                    }
                }
            }
        }
        BotCommand::Remove { name } => {
            store.delete_by_name(name).await?;
            println!("Bot '{name}' removed.");
        }
        BotCommand::Enable { name } => {
            store.set_enabled(name, true).await?;
            println!("Bot '{name}' enabled.");
        }
        BotCommand::Disable { name } => {
            store.set_enabled(name, false).await?;
            println!("Bot '{name}' disabled.");
        }
    }
    Ok(())
}
