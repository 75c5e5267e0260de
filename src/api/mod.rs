mod client;
mod queries;
pub mod types;

pub use client::ApiClient;
pub use queries::CareerQuery;
