//! Handler contracts and the values passed to every hook and handler.

mod context;
mod env;
mod error;
pub mod manifest;
mod traits;

pub use context::RequestContext;
pub use env::{Environment, ExecutionContext};
pub use error::FezzError;
pub use traits::{
    egress_fn, error_fn, handler_fn, BoxedHandler, EgressFn, EgressHook, ErrorFn, ErrorHook,
    Handler, HandlerFn, HandlerOutcome, HandlerResult,
};
pub use manifest::{HandlerManifest, RoutedHandler};
