use super::conditions::Predicate;
use super::expr::Expr;
use crate::error::{ConversionError, EngineError};
use crate::model::{Entity, Value, ValueKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// One composition step, applied to the running sequence in order
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStep {
    Filter(Predicate),
    Include(String),
    OrderBy { key: Expr, direction: SortDirection },
    Skip(usize),
    Take(usize),
}

/// Deferred description of a query against one entity table.
///
/// Nothing executes until a [`DataEngine`](crate::database::DataEngine) is
/// handed the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    table: &'static str,
    steps: Vec<QueryStep>,
}

impl QueryPlan {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            steps: Vec::new(),
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn steps(&self) -> &[QueryStep] {
        &self.steps
    }

    pub fn push(&mut self, step: QueryStep) {
        self.steps.push(step);
    }

    /// The filter steps only, in order. Used for set-based updates where
    /// includes, ordering and windowing have no meaning.
    pub fn filters_only(&self) -> QueryPlan {
        QueryPlan {
            table: self.table,
            steps: self
                .steps
                .iter()
                .filter(|step| matches!(step, QueryStep::Filter(_)))
                .cloned()
                .collect(),
        }
    }

    /// Human-readable rendering of the plan for logs
    pub fn describe(&self) -> String {
        let mut sql = format!("FROM {}", self.table);

        for step in &self.steps {
            match step {
                QueryStep::Filter(predicate) => sql.push_str(&format!(" WHERE {predicate}")),
                QueryStep::Include(path) => sql.push_str(&format!(" INCLUDE {path}")),
                QueryStep::OrderBy { key, direction } => {
                    sql.push_str(&format!(" ORDER BY {key} {}", direction.keyword()));
                }
                QueryStep::Skip(n) => sql.push_str(&format!(" OFFSET {n}")),
                QueryStep::Take(n) => sql.push_str(&format!(" LIMIT {n}")),
            }
        }

        sql
    }
}

/// A single "set property to expression" assignment.
///
/// `coerce` is chosen per property type when the update is composed, and
/// converts the evaluated expression into a value the property accepts.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub column: String,
    pub kind: ValueKind,
    pub nullable: bool,
    pub value: Expr,
    pub coerce: fn(Value) -> Result<Value, ConversionError>,
}

impl Assignment {
    pub fn resolve<T: Entity>(&self, row: &T) -> Result<Value, EngineError> {
        let value = self.value.evaluate(row)?;
        Ok((self.coerce)(value)?)
    }
}

/// Composite update handed to the data engine as one set-based operation
#[derive(Debug, Clone, Default)]
pub struct UpdateSet {
    assignments: Vec<Assignment>,
}

impl UpdateSet {
    /// The no-op update everything folds onto
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Add an assignment; a later assignment to the same column replaces the earlier one
    pub fn then(mut self, assignment: Assignment) -> Self {
        self.assignments.retain(|existing| existing.column != assignment.column);
        self.assignments.push(assignment);
        self
    }

    pub fn columns(&self) -> Vec<&str> {
        self.assignments.iter().map(|a| a.column.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passthrough(value: Value) -> Result<Value, ConversionError> {
        Ok(value)
    }

    fn assignment(column: &str, value: i64) -> Assignment {
        Assignment {
            column: column.to_string(),
            kind: ValueKind::Int,
            nullable: false,
            value: Expr::constant(value),
            coerce: passthrough,
        }
    }

    #[test]
    fn test_describe_keeps_step_order() {
        let mut plan = QueryPlan::new("orders");
        plan.push(QueryStep::Filter(Predicate::Literal(true)));
        plan.push(QueryStep::Include("customer".to_string()));
        plan.push(QueryStep::OrderBy {
            key: Expr::member("id"),
            direction: SortDirection::Descending,
        });
        plan.push(QueryStep::Skip(20));
        plan.push(QueryStep::Take(10));

        assert_eq!(
            plan.describe(),
            "FROM orders WHERE 1=1 INCLUDE customer ORDER BY id DESC OFFSET 20 LIMIT 10"
        );
    }

    #[test]
    fn test_filters_only_drops_shaping_steps() {
        let mut plan = QueryPlan::new("orders");
        plan.push(QueryStep::Include("customer".to_string()));
        plan.push(QueryStep::Filter(Predicate::Literal(false)));
        plan.push(QueryStep::Take(1));

        let filters = plan.filters_only();
        assert_eq!(filters.steps(), &[QueryStep::Filter(Predicate::Literal(false))]);
        assert_eq!(filters.table(), "orders");
    }

    #[test]
    fn test_update_set_later_assignment_wins() {
        let set = UpdateSet::identity()
            .then(assignment("qty", 1))
            .then(assignment("price", 2))
            .then(assignment("qty", 3));

        assert!(!set.is_identity());
        assert_eq!(set.columns(), vec!["price", "qty"]);
        assert_eq!(set.assignments()[1].value, Expr::constant(3));
    }
}
