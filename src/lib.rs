pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod summarizer;
pub mod utils;

// Re-export commonly used items
pub use config::{Cli, Config};
pub use error::{DigestError, DigestResult};
pub use models::Event;
pub use pipeline::{collect_events, digest};
