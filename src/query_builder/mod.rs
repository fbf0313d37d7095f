//! # Query Builder System
//!
//! Deferred, engine-agnostic query composition.
//!
//! ## Key Components
//!
//! - [`expr`] - value expressions and typed [`Selector`]s over an entity
//! - [`conditions`] - the [`Predicate`] tree used for criteria and keyset boundaries
//! - [`plan`] - ordered [`QueryStep`]s and set-based [`UpdateSet`]s handed to engines
//! - [`query`] - the lazily composed [`Query`] sequence
//! - [`pagination`] - [`PagingOptions`] and [`PagedResult`] for offset and keyset paging
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use quarry_core::query_builder::{field, Query, QueryShape, SortDirection};
//!
//! let query = Query::<Order, _>::new(engine)
//!     .filter(field::<Order, String>("status").equals("open".to_string()))
//!     .order_by(Expr::member("created_at"), SortDirection::Descending)
//!     .take(50);
//! let orders = query.to_vec().await?;
//! ```

pub mod conditions;
pub mod expr;
pub mod pagination;
pub mod plan;
pub mod query;

pub use conditions::{CompareOp, Predicate};
pub use expr::{field, BinaryOp, Expr, Function, MemberAccess, Selector};
pub use pagination::{PagedResult, PagingOptions, PagingStrategy, UNKNOWN_TOTAL_COUNT};
pub use plan::{Assignment, QueryPlan, QueryStep, SortDirection, UpdateSet};
pub use query::{Query, QueryShape};
