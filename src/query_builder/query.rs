use super::conditions::Predicate;
use super::expr::Expr;
use super::plan::{QueryPlan, QueryStep, SortDirection, UpdateSet};
use crate::database::DataEngine;
use crate::error::EngineError;
use crate::model::Entity;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The composition operations a specification needs from a query sequence
pub trait QueryShape: Sized {
    fn filter(self, predicate: Predicate) -> Self;

    /// Fetch related data along a navigation path
    fn include(self, path: &str) -> Self;

    fn order_by(self, key: Expr, direction: SortDirection) -> Self;
}

/// Lazily composed query over entity `T`, executed by engine `E`.
///
/// Composition only extends the plan; the terminal `async` methods perform a
/// single engine call each.
pub struct Query<T, E> {
    engine: Arc<E>,
    plan: QueryPlan,
    _entity: PhantomData<fn() -> T>,
}

impl<T, E> Clone for Query<T, E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            plan: self.plan.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T, E> fmt::Debug for Query<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("plan", &self.plan).finish()
    }
}

impl<T: Entity, E: DataEngine<T>> Query<T, E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            plan: QueryPlan::new(T::TABLE),
            _entity: PhantomData,
        }
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    pub fn skip(mut self, rows: usize) -> Self {
        self.plan.push(QueryStep::Skip(rows));
        self
    }

    pub fn take(mut self, rows: usize) -> Self {
        self.plan.push(QueryStep::Take(rows));
        self
    }

    pub async fn to_vec(self) -> Result<Vec<T>, EngineError> {
        self.engine.fetch(&self.plan).await
    }

    pub async fn count(self) -> Result<u64, EngineError> {
        self.engine.count(&self.plan).await
    }

    pub async fn first(self) -> Result<Option<T>, EngineError> {
        Ok(self.take(1).to_vec().await?.into_iter().next())
    }

    pub async fn any(self) -> Result<bool, EngineError> {
        Ok(self.take(1).count().await? > 0)
    }

    /// Apply `update` to every row the plan's filters match, in one engine call
    pub async fn update(self, update: &UpdateSet) -> Result<u64, EngineError> {
        self.engine.update(&self.plan.filters_only(), update).await
    }
}

impl<T, E> QueryShape for Query<T, E> {
    fn filter(mut self, predicate: Predicate) -> Self {
        self.plan.push(QueryStep::Filter(predicate));
        self
    }

    fn include(mut self, path: &str) -> Self {
        self.plan.push(QueryStep::Include(path.to_string()));
        self
    }

    fn order_by(mut self, key: Expr, direction: SortDirection) -> Self {
        self.plan.push(QueryStep::OrderBy { key, direction });
        self
    }
}
