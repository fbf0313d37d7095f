use super::{Order, Specification};
use crate::query_builder::{QueryShape, SortDirection};
use std::collections::HashSet;

/// Shapes a query sequence from a specification.
///
/// Steps are applied in a fixed order: criteria, typed includes, include
/// strings, then ordering. An include path already applied is not applied
/// again. Nothing is executed.
pub struct SpecificationEvaluator;

impl SpecificationEvaluator {
    pub fn evaluate<T, S: QueryShape>(base: S, specification: &Specification<T>) -> S {
        let mut query = base;

        if let Some(criteria) = specification.criteria() {
            query = query.filter(criteria.clone());
        }

        let mut applied = HashSet::new();
        let typed = specification.includes().iter().map(|path| path.dotted());
        let untyped = specification.include_strings().iter().cloned();
        for path in typed.chain(untyped) {
            if applied.insert(path.clone()) {
                query = query.include(&path);
            }
        }

        match specification.order() {
            Order::Ascending(key) => query.order_by(key.clone(), SortDirection::Ascending),
            Order::Descending(key) => query.order_by(key.clone(), SortDirection::Descending),
            Order::Unordered => query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::{field, Expr, Predicate};
    use crate::specification::Navigation;

    #[derive(Debug, Clone)]
    struct Invoice {
        id: i64,
        total: f64,
    }

    crate::impl_entity!(Invoice, "invoices" { id: i64, total: f64 });

    struct Customer;

    /// Records the composition calls it receives
    #[derive(Debug, Default, PartialEq)]
    struct Recorder(Vec<String>);

    impl QueryShape for Recorder {
        fn filter(mut self, predicate: Predicate) -> Self {
            self.0.push(format!("filter {predicate}"));
            self
        }

        fn include(mut self, path: &str) -> Self {
            self.0.push(format!("include {path}"));
            self
        }

        fn order_by(mut self, key: Expr, direction: SortDirection) -> Self {
            self.0.push(format!("order {key} {}", direction.keyword()));
            self
        }
    }

    #[test]
    fn test_fixed_application_order() {
        // Builder calls deliberately out of order
        let spec = Specification::<Invoice>::new()
            .order_by_descending(field::<Invoice, f64>("total"))
            .include_path("lines.product")
            .include(Navigation::<Invoice, Customer>::new("customer"))
            .filter(field::<Invoice, i64>("id").gt(5));

        let recorded = SpecificationEvaluator::evaluate(Recorder::default(), &spec);
        assert_eq!(
            recorded.0,
            vec![
                "filter id > 5",
                "include customer",
                "include lines.product",
                "order total DESC",
            ]
        );
    }

    #[test]
    fn test_unconstrained_spec_adds_nothing() {
        let recorded =
            SpecificationEvaluator::evaluate(Recorder::default(), &Specification::<Invoice>::new());
        assert!(recorded.0.is_empty());
    }

    #[test]
    fn test_duplicate_includes_applied_once() {
        let spec = Specification::<Invoice>::new()
            .include(Navigation::<Invoice, Customer>::new("customer"))
            .include_path("customer")
            .include_path("lines")
            .include_path("lines");

        let recorded = SpecificationEvaluator::evaluate(Recorder::default(), &spec);
        assert_eq!(recorded.0, vec!["include customer", "include lines"]);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let spec = Specification::<Invoice>::new()
            .filter(field::<Invoice, f64>("total").ge(10.0))
            .order_by(field::<Invoice, i64>("id"));

        let first = SpecificationEvaluator::evaluate(Recorder::default(), &spec);
        let second = SpecificationEvaluator::evaluate(Recorder::default(), &spec);
        assert_eq!(first, second);
    }
}
