pub mod gateway;
pub mod models;

pub use gateway::Gateway;
pub use models::{PersistSummary, RunBatch};
