pub mod gateway;
pub mod text;

pub use gateway::BotGateway;
