//! # Data Engines
//!
//! The boundary between query composition and storage.
//!
//! ## Key Components
//!
//! - [`engine`] - the [`DataEngine`] and [`Transactional`] traits a storage backend implements
//! - [`memory`] - [`MemoryEngine`], an in-process engine that executes plans over cloned rows
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use quarry_core::database::MemoryEngine;
//! use std::sync::Arc;
//!
//! let engine = Arc::new(MemoryEngine::with_rows(products));
//! engine.register_include("category", move |product: &mut Product| {
//!     product.category_name = categories.get(&product.category_id).cloned();
//!     Ok(())
//! });
//! ```

pub mod engine;
pub mod memory;

pub use engine::{DataEngine, Transactional};
pub use memory::{EngineStats, IncludeLoader, MemoryEngine};
