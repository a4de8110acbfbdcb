//! Route resolution for the dispatch pipeline.
//!
//! The pipeline only depends on the [`Resolver`] contract; [`RouteTable`] is
//! the resolver used by [`crate::dispatch::ServiceRouter::new`].

mod resolver;
mod table;

pub use resolver::{MatchResult, Resolver};
pub use table::{Route, RouteTable, WILDCARD_PARAM};
