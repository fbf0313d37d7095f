use crate::error::EngineError;
use crate::model::Entity;
use crate::query_builder::{QueryPlan, UpdateSet};
use async_trait::async_trait;

/// The storage engine behind a repository.
///
/// Each method is one round trip. Implementations report their own failures
/// as [`EngineError`]s; the repository passes them through untouched.
#[async_trait]
pub trait DataEngine<T: Entity>: Send + Sync {
    /// Materialize the rows described by `plan`, in plan order
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<T>, EngineError>;

    /// Count the rows described by `plan`
    async fn count(&self, plan: &QueryPlan) -> Result<u64, EngineError>;

    /// Apply `update` to every row matching `plan`, returning the affected row count
    async fn update(&self, plan: &QueryPlan, update: &UpdateSet) -> Result<u64, EngineError>;
}

/// Opaque begin/commit/rollback capability of an engine
#[async_trait]
pub trait Transactional: Send + Sync {
    async fn begin(&self) -> Result<(), EngineError>;

    async fn commit(&self) -> Result<(), EngineError>;

    async fn rollback(&self) -> Result<(), EngineError>;
}
