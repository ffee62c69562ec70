//! The pipeline stages: ingest, validate, enrich.
//!
//! Each stage is generic over the storage traits in [`knightshift_core`] and
//! receives its configuration at construction. Stages run sequentially and
//! return a summary; only systemic store failures surface as [`Error`].

pub mod enrich;
pub mod error;
pub mod ingest;
pub mod validate;

mod budget;
#[cfg(test)]
mod testing;

pub use enrich::Enricher;
pub use error::{Error, Result};
pub use ingest::Ingester;
pub use validate::{Validator, Verdict, check};
