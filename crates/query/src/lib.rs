//! Read-only query service for PoA governance.
//!
//! Queries never mutate state. Typed accessors live on [`QueryService`];
//! [`QueryService::query`] answers raw `custom/poa/<kind>` requests with
//! JSON, which is what external clients use.

pub mod error;
pub mod route;
pub mod service;

pub use error::{QueryError, Result};
pub use route::{QueryProposalParams, QueryRoute, QueryValidatorParams, MODULE};
pub use service::QueryService;
