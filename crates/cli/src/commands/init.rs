use larkmsg_server::config::LarkMsgConfig;
use larkmsg_server::store_factory::create_bot_store;

pub async fn run(config: &LarkMsgConfig) -> anyhow::Result<()> {
    let store = create_bot_store(&config.registry).await?;
    let bots = store.list().await?;

    match config.registry.backend.as_str() {
        "memory" => println!("In-memory registry ready (nothing is persisted)."),
        _ => println!(
            "Registry ready at {} ({} bots).",
            config.registry.path,
            bots.len()
        ),
    }
    Ok(())
}
