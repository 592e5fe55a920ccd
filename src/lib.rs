//! # Docket - Embedded Document Store
//!
//! Docket is a lightweight, embedded, schema-less document store with
//! query-operator filtering and a two-tier caching discipline.
//!
//! ## Key Features
//!
//! - **Embedded**: No separate server process required
//! - **Schema-less**: Documents are recursive field/value bags
//! - **Operator Filters**: Equality, `$in`, `$gt`/`$gte`/`$lt`/`$lte`,
//!   `$ne`, and `$regex` (with `$options`), AND-ed per filter
//! - **Two-Tier Caching**: A per-collection mirror cache that is always
//!   consistent with the backing medium, plus a TTL result cache with
//!   exact and prefix-wildcard invalidation
//! - **Durable**: One JSON file per collection, rewritten whole on every
//!   mutation; or fully in-memory for ephemeral use
//! - **Clean API**: PIMPL pattern provides a stable, encapsulated handle
//!
//! ## Quick Start
//!
//! ```rust
//! use docket::{doc, Docket};
//! use docket::filter::Filter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Create an in-memory database
//! let db = Docket::builder().open()?;
//!
//! // Insert a document
//! let result = db.store().insert_one("designs", doc! {
//!     name: "Skyline",
//!     category: "architecture",
//!     views: 120
//! })?;
//!
//! // Find documents using operator filters
//! let filter = Filter::parse(&doc! { views: { "$gte": 100 } })?;
//! let popular = db.store().find("designs", &filter)?;
//! assert_eq!(popular.len(), 1);
//!
//! // Cache a computed result for five minutes
//! let _cached = db.result_cache().get_or_compute_default("designs_getAll", || {
//!     Ok(docket::document::Value::Int(popular.len() as i64))
//! })?;
//!
//! // After a mutation, invalidate the affected keys explicitly
//! db.store().delete_one("designs", &Filter::parse(&doc! { name: "Skyline" })?)?;
//! db.result_cache().invalidate(Some("designs_*"));
//!
//! db.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Consistency Model
//!
//! The mirror cache is never allowed to go stale: every mutating store
//! operation writes the backing medium and replaces the mirror entry inside
//! the same per-collection critical section. The result cache is the only
//! tier where staleness exists, bounded by the TTL and by explicit caller
//! invalidation.
//!
//! ## Module Organization
//!
//! - [`cache`] - TTL result cache with wildcard invalidation
//! - [`common`] - Shared constants, locks, and utilities
//! - [`document`] - Documents and the recursive value model
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Filter parsing and predicate matching
//! - [`id`] - Unique document identifier generation
//! - [`store`] - Document store and storage backends

use crate::id::SnowflakeIdGenerator;
use std::sync::LazyLock;

pub mod cache;
pub mod common;
pub mod docket;
pub mod document;
pub mod errors;
pub mod filter;
pub mod id;
pub mod store;

pub use crate::docket::{Docket, DocketBuilder};
pub use crate::document::{Document, Value};

pub(crate) static ID_GENERATOR: LazyLock<SnowflakeIdGenerator> =
    LazyLock::new(SnowflakeIdGenerator::new);
