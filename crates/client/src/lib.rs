//! HTTP implementation of the catalog and instance services.

mod envelope;
mod http;

pub use http::HttpAgentService;
