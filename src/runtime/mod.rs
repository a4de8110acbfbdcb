//! Host runtime serving a [`crate::dispatch::ServiceRouter`] over HTTP.

mod config;
mod server;

pub use config::ServerConfig;
pub use server::RouterServer;
