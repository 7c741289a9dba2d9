mod config;
mod ingest;
mod query;
mod retrain;
mod status;

pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use query::QueryArgs;
pub use retrain::RetrainArgs;

pub use config::handle_config;
pub use ingest::handle_ingest;
pub use query::handle_query;
pub use retrain::handle_retrain;
pub use status::handle_status;
