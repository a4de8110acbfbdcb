//! Dispatch pipeline: hooks, route resolution and the handler chain.

pub mod fallback;
mod pipeline;
mod router;

pub use pipeline::Stage;
pub use router::ServiceRouter;
