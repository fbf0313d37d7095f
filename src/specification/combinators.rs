//! Boolean combination of specifications.
//!
//! Combinators borrow their operands and build a new specification, so an
//! operand can be reused in any number of combinations.
//!
//! Absent criteria mean "every row": `and` keeps the side that has criteria,
//! `or` with an unconstrained side stays unconstrained, and `not` of an
//! unconstrained specification matches nothing.
//!
//! Includes are merged left first, skipping entries already present. Ordering
//! is taken from the left operand when it has one, else from the right.

use super::{Order, Specification};
use crate::query_builder::Predicate;

impl<T> Specification<T> {
    /// Rows matched by both specifications
    pub fn and(&self, other: &Specification<T>) -> Specification<T> {
        let criteria = match (self.criteria(), other.criteria()) {
            (Some(left), Some(right)) => Some(left.clone().and(right.clone())),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        };
        self.combine(other, criteria)
    }

    /// Rows matched by either specification
    pub fn or(&self, other: &Specification<T>) -> Specification<T> {
        let criteria = match (self.criteria(), other.criteria()) {
            (Some(left), Some(right)) => Some(left.clone().or(right.clone())),
            _ => None,
        };
        self.combine(other, criteria)
    }

    /// Rows not matched by this specification. Includes and ordering are kept.
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Specification<T> {
        let criteria = match self.criteria() {
            Some(criteria) => criteria.clone().not(),
            None => Predicate::Literal(false),
        };
        Specification::from_parts(
            Some(criteria),
            self.includes().to_vec(),
            self.include_strings().to_vec(),
            self.order().clone(),
        )
    }

    fn combine(&self, other: &Specification<T>, criteria: Option<Predicate>) -> Specification<T> {
        Specification::from_parts(
            criteria,
            merge_unique(self.includes(), other.includes()),
            merge_unique(self.include_strings(), other.include_strings()),
            inherit_order(self.order(), other.order()),
        )
    }
}

fn merge_unique<I: Clone + PartialEq>(left: &[I], right: &[I]) -> Vec<I> {
    let mut merged = left.to_vec();
    for item in right {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

fn inherit_order(left: &Order, right: &Order) -> Order {
    if left.is_ordered() {
        left.clone()
    } else {
        right.clone()
    }
}
