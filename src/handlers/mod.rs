pub mod chat;
pub mod health;

pub use chat::chat_config;
pub use health::health_check;
