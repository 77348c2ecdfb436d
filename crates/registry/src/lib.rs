//! Registry of named bots and their app credentials.
//!
//! The [`BotStore`] trait is the contract the rest of the system uses to turn
//! a bot name into a [`Credential`](larkmsg_lark::Credential). Two backends
//! are provided: [`MemoryBotStore`] and [`SqliteBotStore`].

pub mod config;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod model;
pub mod sqlite;
pub mod store;

pub use config::SqliteConfig;
pub use error::RegistryError;
pub use memory::MemoryBotStore;
pub use migrations::run_migrations;
pub use model::{Bot, MAX_NAME_LEN, NewBot};
pub use sqlite::SqliteBotStore;
pub use store::BotStore;
