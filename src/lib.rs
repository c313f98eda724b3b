pub mod client;
pub mod config;
pub mod error;
pub mod node;
pub mod query;
pub mod resolver;

pub use client::{check_response, ApiResult, KgClient};
pub use config::Config;
pub use error::{KgError, Result};
pub use node::{vocab_key, Node, PropertyValue};
pub use query::{dataset_version_query, query_kg, QueryDescriptor};
pub use resolver::{follow_links, follow_links_concurrent, load_node};
