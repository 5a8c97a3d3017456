pub mod env;
mod loader;

pub use env::{
    AgentConfig, AppConfig, DirectoryConfig, GmailConfig, MessagingConfig, UnderstanderConfig,
};
pub use loader::load_config;
