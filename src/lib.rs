#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Quarry Core
//!
//! Specification-driven query composition, offset and keyset paging, and
//! set-based bulk updates over a pluggable data engine.
//!
//! ## Overview
//!
//! Callers describe *what* they want as a [`Specification`]: criteria, related
//! data to include, and an ordering. Specifications combine with `and`, `or`
//! and `not` into new values. A [`Repository`] shapes a deferred query from a
//! specification, applies the requested paging strategy and hands the
//! resulting plan to a [`DataEngine`] in one round trip per call.
//!
//! ## Module Organization
//!
//! - [`model`] - values, property types and the [`Entity`] trait
//! - [`query_builder`] - expressions, predicates, plans and paging types
//! - [`specification`] - specifications, combinators and the evaluator
//! - [`database`] - the data-engine seam and the in-memory engine
//! - [`repository`] - reads, paging and bulk updates
//! - [`config`] - paging defaults and limits
//! - [`error`] - contract and engine errors
//! - [`logging`] - structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quarry_core::database::MemoryEngine;
//! use quarry_core::query_builder::{field, PagingOptions};
//! use quarry_core::repository::Repository;
//! use quarry_core::specification::Specification;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone)]
//! struct Product {
//!     id: i64,
//!     name: String,
//!     price: f64,
//! }
//!
//! quarry_core::impl_entity!(Product, "products" { id: i64, name: String, price: f64 });
//!
//! # async fn example() -> quarry_core::Result<()> {
//! let engine = Arc::new(MemoryEngine::with_rows(vec![Product {
//!     id: 1,
//!     name: "lamp".to_string(),
//!     price: 19.5,
//! }]));
//! let repository = Repository::new(engine);
//!
//! let affordable = Specification::<Product>::new()
//!     .filter(field::<Product, f64>("price").lt(50.0))
//!     .order_by(field::<Product, i64>("id"));
//!
//! let page = repository
//!     .get_paged(&PagingOptions::keyset(20), Some(&affordable))
//!     .await?;
//! println!("{} products, next cursor {:?}", page.items.len(), page.last_key_value);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property-based tests
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod model;
pub mod query_builder;
pub mod repository;
pub mod specification;

pub use crate::config::RepositoryConfig;
pub use database::{DataEngine, MemoryEngine, Transactional};
pub use error::{
    ConfigurationError, ContractError, ConversionError, EngineError, EvalError, RepositoryError,
    Result,
};
pub use logging::init_structured_logging;
pub use model::{Entity, FieldType, Value, ValueKind};
pub use query_builder::{field, PagedResult, PagingOptions, PagingStrategy, Predicate, Selector};
pub use repository::{compose_update, PropertyUpdate, Repository};
pub use specification::{Navigation, Order, Specification, SpecificationEvaluator};
