//! # Repository
//!
//! Specification-driven reads, paging and bulk updates over a [`DataEngine`].
//!
//! Every operation shapes the engine's base query through the
//! [`SpecificationEvaluator`] and then performs at most two engine calls. An
//! absent specification behaves as [`Specification::UNCONSTRAINED`].
//!
//! ## Usage Patterns
//!
//! ```rust,ignore
//! use quarry_core::query_builder::{field, PagingOptions};
//! use quarry_core::repository::Repository;
//! use quarry_core::specification::Specification;
//!
//! let repository = Repository::new(engine);
//! let spec = Specification::<Product>::new()
//!     .filter(field::<Product, i64>("stock").gt(0))
//!     .order_by(field::<Product, i64>("id"));
//!
//! let first = repository.get_paged(&PagingOptions::keyset(25), Some(&spec)).await?;
//! if let Some(cursor) = first.last_key_value.clone() {
//!     let next = repository
//!         .get_paged(&PagingOptions::keyset(25).after(cursor).with_page_number(2), Some(&spec))
//!         .await?;
//! }
//! ```

pub mod paging;
pub mod update;

pub use update::{compose_update, PropertyUpdate};

use crate::config::RepositoryConfig;
use crate::database::{DataEngine, Transactional};
use crate::error::Result;
use crate::logging::log_repository_operation;
use crate::model::Entity;
use crate::query_builder::{PagingOptions, Query};
use crate::specification::{Specification, SpecificationEvaluator};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct Repository<T, E> {
    engine: Arc<E>,
    config: RepositoryConfig,
    _entity: PhantomData<fn() -> T>,
}

impl<T, E> Clone for Repository<T, E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity, E: DataEngine<T>> Repository<T, E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self::with_config(engine, RepositoryConfig::default())
    }

    pub fn with_config(engine: Arc<E>, config: RepositoryConfig) -> Self {
        Self {
            engine,
            config,
            _entity: PhantomData,
        }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Unshaped query over every row of `T`
    pub fn query(&self) -> Query<T, E> {
        Query::new(Arc::clone(&self.engine))
    }

    /// First-page paging options from the repository configuration
    pub fn default_paging(&self) -> PagingOptions {
        self.config.paging_defaults()
    }

    /// Base query shaped by `specification`. Nothing is executed.
    pub fn shaped(&self, specification: Option<&Specification<T>>) -> Query<T, E> {
        let unconstrained = Specification::UNCONSTRAINED;
        let specification = specification.unwrap_or(&unconstrained);
        SpecificationEvaluator::evaluate(self.query(), specification)
    }

    #[instrument(skip(self, specification), fields(table = T::TABLE))]
    pub async fn find_one(&self, specification: Option<&Specification<T>>) -> Result<Option<T>> {
        let found = self.shaped(specification).first().await?;
        debug!(found = found.is_some(), "Repository find_one completed");
        Ok(found)
    }

    #[instrument(skip(self, specification), fields(table = T::TABLE))]
    pub async fn find_many(&self, specification: Option<&Specification<T>>) -> Result<Vec<T>> {
        let rows = self.shaped(specification).to_vec().await?;
        debug!(rows = rows.len(), "Repository find_many completed");
        Ok(rows)
    }

    #[instrument(skip(self, specification), fields(table = T::TABLE))]
    pub async fn exists(&self, specification: Option<&Specification<T>>) -> Result<bool> {
        Ok(self.shaped(specification).any().await?)
    }

    #[instrument(skip(self, specification), fields(table = T::TABLE))]
    pub async fn count(&self, specification: Option<&Specification<T>>) -> Result<u64> {
        let count = self.shaped(specification).count().await?;
        debug!(count = count, "Repository count completed");
        Ok(count)
    }
}

impl<T: Entity, E: DataEngine<T> + Transactional> Repository<T, E> {
    pub async fn begin(&self) -> Result<()> {
        self.engine.begin().await?;
        log_repository_operation("begin", T::TABLE, "success", None, None);
        Ok(())
    }

    pub async fn commit(&self) -> Result<()> {
        self.engine.commit().await?;
        log_repository_operation("commit", T::TABLE, "success", None, None);
        Ok(())
    }

    pub async fn rollback(&self) -> Result<()> {
        self.engine.rollback().await?;
        log_repository_operation("rollback", T::TABLE, "success", None, None);
        Ok(())
    }
}
