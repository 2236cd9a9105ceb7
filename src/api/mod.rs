pub mod endpoints;
pub mod gateway;
pub mod models;

pub use gateway::ApiGateway;
pub use models::{ItemMetadata, LabelView};
