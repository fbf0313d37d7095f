//! # In-Memory Engine
//!
//! Executes query plans against rows held in process. Used by tests and by
//! embedders that want repository semantics without a database.

use super::engine::{DataEngine, Transactional};
use crate::error::EngineError;
use crate::model::Entity;
use crate::query_builder::{QueryPlan, QueryStep, SortDirection, UpdateSet};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Attaches related data for one include path to a fetched row
pub type IncludeLoader<T> = Arc<dyn Fn(&mut T) -> Result<(), EngineError> + Send + Sync>;

/// Round trips served by an engine
#[derive(Debug, Default)]
pub struct EngineStats {
    fetches: AtomicU64,
    counts: AtomicU64,
    updates: AtomicU64,
}

impl EngineStats {
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn counts(&self) -> u64 {
        self.counts.load(Ordering::Relaxed)
    }

    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    pub fn round_trips(&self) -> u64 {
        self.fetches() + self.counts() + self.updates()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Materialize,
    /// Row identity only: includes and ordering are skipped
    Match,
}

pub struct MemoryEngine<T> {
    rows: RwLock<Vec<T>>,
    snapshot: Mutex<Option<Vec<T>>>,
    loaders: DashMap<String, IncludeLoader<T>>,
    stats: EngineStats,
}

impl<T: Entity> Default for MemoryEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryEngine<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            snapshot: Mutex::new(None),
            loaders: DashMap::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn with_rows(rows: impl IntoIterator<Item = T>) -> Self {
        let engine = Self::new();
        engine.extend(rows);
        engine
    }

    pub fn insert(&self, row: T) {
        self.rows.write().push(row);
    }

    pub fn extend(&self, rows: impl IntoIterator<Item = T>) {
        self.rows.write().extend(rows);
    }

    /// Register the loader that resolves `path` when a plan includes it
    pub fn register_include<F>(&self, path: &str, loader: F)
    where
        F: Fn(&mut T) -> Result<(), EngineError> + Send + Sync + 'static,
    {
        self.loaders.insert(path.to_string(), Arc::new(loader));
    }

    /// Copy of the stored rows in insertion order
    pub fn rows(&self) -> Vec<T> {
        self.rows.read().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    fn indexed_rows(&self) -> Vec<(usize, T)> {
        self.rows.read().iter().cloned().enumerate().collect()
    }

    fn loader(&self, path: &str) -> Result<IncludeLoader<T>, EngineError> {
        self.loaders
            .get(path)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::UnknownInclude {
                path: path.to_string(),
            })
    }

    fn run(
        &self,
        rows: Vec<(usize, T)>,
        plan: &QueryPlan,
        mode: RunMode,
    ) -> Result<Vec<(usize, T)>, EngineError> {
        let mut current = rows;

        for step in plan.steps() {
            match step {
                QueryStep::Filter(predicate) => {
                    let mut kept = Vec::with_capacity(current.len());
                    for (index, row) in current {
                        if predicate.evaluate(&row)? {
                            kept.push((index, row));
                        }
                    }
                    current = kept;
                }
                QueryStep::Include(path) => {
                    if mode == RunMode::Materialize {
                        let loader = self.loader(path)?;
                        for (_, row) in &mut current {
                            (loader.as_ref())(row)?;
                        }
                    }
                }
                QueryStep::OrderBy { key, direction } => {
                    if mode == RunMode::Materialize {
                        let mut keyed = current
                            .into_iter()
                            .map(|(index, row)| key.evaluate(&row).map(|k| (k, index, row)))
                            .collect::<Result<Vec<_>, _>>()?;
                        keyed.sort_by(|a, b| {
                            let ordering = a.0.sort_cmp(&b.0);
                            match direction {
                                SortDirection::Ascending => ordering,
                                SortDirection::Descending => ordering.reverse(),
                            }
                        });
                        current = keyed.into_iter().map(|(_, index, row)| (index, row)).collect();
                    }
                }
                QueryStep::Skip(n) => {
                    let n = (*n).min(current.len());
                    current.drain(..n);
                }
                QueryStep::Take(n) => current.truncate(*n),
            }
        }

        Ok(current)
    }
}

#[async_trait]
impl<T: Entity> DataEngine<T> for MemoryEngine<T> {
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<T>, EngineError> {
        self.stats.fetches.fetch_add(1, Ordering::Relaxed);
        let rows = self.run(self.indexed_rows(), plan, RunMode::Materialize)?;
        debug!(table = plan.table(), rows = rows.len(), plan = %plan.describe(), "MEMORY_ENGINE: fetch");
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    async fn count(&self, plan: &QueryPlan) -> Result<u64, EngineError> {
        self.stats.counts.fetch_add(1, Ordering::Relaxed);
        let rows = self.run(self.indexed_rows(), plan, RunMode::Match)?;
        debug!(table = plan.table(), count = rows.len(), plan = %plan.describe(), "MEMORY_ENGINE: count");
        Ok(rows.len() as u64)
    }

    async fn update(&self, plan: &QueryPlan, update: &UpdateSet) -> Result<u64, EngineError> {
        self.stats.updates.fetch_add(1, Ordering::Relaxed);
        let mut rows = self.rows.write();
        let candidates: Vec<(usize, T)> = rows.iter().cloned().enumerate().collect();
        let matched = self.run(candidates, plan, RunMode::Match)?;

        // Values are resolved against the pre-update row and staged so that a
        // failing assignment leaves every row untouched.
        let mut staged = Vec::with_capacity(matched.len());
        for (index, original) in &matched {
            let mut updated = original.clone();
            for assignment in update.assignments() {
                let value = assignment.resolve(original)?;
                updated.set(&assignment.column, value)?;
            }
            staged.push((*index, updated));
        }

        let affected = staged.len() as u64;
        for (index, row) in staged {
            rows[index] = row;
        }

        debug!(
            table = plan.table(),
            affected = affected,
            columns = ?update.columns(),
            "MEMORY_ENGINE: update"
        );
        Ok(affected)
    }
}

#[async_trait]
impl<T: Entity> Transactional for MemoryEngine<T> {
    async fn begin(&self) -> Result<(), EngineError> {
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            return Err(EngineError::Transaction(
                "a transaction is already active".to_string(),
            ));
        }
        *snapshot = Some(self.rows.read().clone());
        Ok(())
    }

    async fn commit(&self) -> Result<(), EngineError> {
        self.snapshot
            .lock()
            .take()
            .map(|_| ())
            .ok_or_else(|| EngineError::Transaction("no active transaction to commit".to_string()))
    }

    async fn rollback(&self) -> Result<(), EngineError> {
        let saved = self.snapshot.lock().take().ok_or_else(|| {
            EngineError::Transaction("no active transaction to roll back".to_string())
        })?;
        *self.rows.write() = saved;
        Ok(())
    }
}
