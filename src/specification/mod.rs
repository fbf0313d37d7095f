//! # Specifications
//!
//! A [`Specification`] describes which rows to select, in what order, and which
//! related data to fetch alongside them. Specifications are plain values: they
//! are built once, combined with [`and`](Specification::and),
//! [`or`](Specification::or) and [`not`](Specification::not) into new values,
//! and shaped onto a query by the [`SpecificationEvaluator`].
//!
//! ## Usage Patterns
//!
//! ```rust,ignore
//! use quarry_core::query_builder::field;
//! use quarry_core::specification::{Navigation, Specification};
//!
//! let in_stock = Specification::<Product>::new()
//!     .filter(field::<Product, i64>("stock").gt(0))
//!     .order_by(field::<Product, i64>("id"));
//! let cheap = Specification::<Product>::new().filter(field::<Product, f64>("price").lt(10.0));
//!
//! // Ordering comes from `in_stock`, the left-most ordered operand
//! let bargains = in_stock.and(&cheap).include(Navigation::new("category"));
//! ```

pub mod combinators;
pub mod evaluator;

pub use evaluator::SpecificationEvaluator;

use crate::error::EvalError;
use crate::model::{Entity, FieldType};
use crate::query_builder::{Expr, Predicate, Selector, SortDirection};
use std::fmt;
use std::marker::PhantomData;

/// Ordering of a specification. At most one direction can be set.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Order {
    #[default]
    Unordered,
    Ascending(Expr),
    Descending(Expr),
}

impl Order {
    pub fn key(&self) -> Option<&Expr> {
        match self {
            Order::Unordered => None,
            Order::Ascending(key) | Order::Descending(key) => Some(key),
        }
    }

    pub fn direction(&self) -> Option<SortDirection> {
        match self {
            Order::Unordered => None,
            Order::Ascending(_) => Some(SortDirection::Ascending),
            Order::Descending(_) => Some(SortDirection::Descending),
        }
    }

    pub fn is_ordered(&self) -> bool {
        !matches!(self, Order::Unordered)
    }
}

/// Dotted navigation path produced by a typed [`Navigation`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigationPath(Vec<String>);

impl NavigationPath {
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// Typed navigation from `T` to related data `R`
pub struct Navigation<T, R> {
    path: NavigationPath,
    _marker: PhantomData<fn(&T) -> R>,
}

impl<T, R> Navigation<T, R> {
    pub fn new(name: &str) -> Self {
        Self {
            path: NavigationPath(vec![name.to_string()]),
            _marker: PhantomData,
        }
    }

    /// Continue through a navigation of the related type
    pub fn then<S>(self, next: Navigation<R, S>) -> Navigation<T, S> {
        let mut segments = self.path.0;
        segments.extend(next.path.0);
        Navigation {
            path: NavigationPath(segments),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &NavigationPath {
        &self.path
    }
}

pub struct Specification<T> {
    criteria: Option<Predicate>,
    includes: Vec<NavigationPath>,
    include_strings: Vec<String>,
    order: Order,
    _entity: PhantomData<fn(&T) -> bool>,
}

impl<T> Specification<T> {
    /// Matches every row, unordered, with nothing included
    pub const UNCONSTRAINED: Self = Self {
        criteria: None,
        includes: Vec::new(),
        include_strings: Vec::new(),
        order: Order::Unordered,
        _entity: PhantomData,
    };

    pub fn new() -> Self {
        Self::UNCONSTRAINED
    }

    /// Add a criterion, ANDed onto any existing criteria
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.criteria = Some(match self.criteria.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn include<R>(mut self, navigation: Navigation<T, R>) -> Self {
        self.includes.push(navigation.path);
        self
    }

    /// Include related data by dotted path, for paths a typed navigation cannot express
    pub fn include_path(mut self, path: &str) -> Self {
        self.include_strings.push(path.to_string());
        self
    }

    pub fn criteria(&self) -> Option<&Predicate> {
        self.criteria.as_ref()
    }

    pub fn includes(&self) -> &[NavigationPath] {
        &self.includes
    }

    pub fn include_strings(&self) -> &[String] {
        &self.include_strings
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn is_unconstrained(&self) -> bool {
        self.criteria.is_none()
            && self.includes.is_empty()
            && self.include_strings.is_empty()
            && !self.order.is_ordered()
    }

    pub(crate) fn from_parts(
        criteria: Option<Predicate>,
        includes: Vec<NavigationPath>,
        include_strings: Vec<String>,
        order: Order,
    ) -> Self {
        Self {
            criteria,
            includes,
            include_strings,
            order,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Specification<T> {
    /// Sort ascending by `key`, replacing any existing ordering
    pub fn order_by<P: FieldType>(mut self, key: Selector<T, P>) -> Self {
        self.order = Order::Ascending(key.into_expr());
        self
    }

    /// Sort descending by `key`, replacing any existing ordering
    pub fn order_by_descending<P: FieldType>(mut self, key: Selector<T, P>) -> Self {
        self.order = Order::Descending(key.into_expr());
        self
    }

    /// Evaluate the criteria against a single entity
    pub fn is_satisfied_by(&self, entity: &T) -> Result<bool, EvalError> {
        match &self.criteria {
            Some(criteria) => criteria.evaluate(entity),
            None => Ok(true),
        }
    }
}

impl<T> Default for Specification<T> {
    fn default() -> Self {
        Self::UNCONSTRAINED
    }
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self::from_parts(
            self.criteria.clone(),
            self.includes.clone(),
            self.include_strings.clone(),
            self.order.clone(),
        )
    }
}

impl<T> PartialEq for Specification<T> {
    fn eq(&self, other: &Self) -> bool {
        self.criteria == other.criteria
            && self.includes == other.includes
            && self.include_strings == other.include_strings
            && self.order == other.order
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("criteria", &self.criteria.as_ref().map(ToString::to_string))
            .field("includes", &self.includes)
            .field("include_strings", &self.include_strings)
            .field("order", &self.order)
            .finish()
    }
}

impl<T> From<Predicate> for Specification<T> {
    fn from(predicate: Predicate) -> Self {
        Self::UNCONSTRAINED.filter(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::field;

    #[derive(Debug, Clone)]
    struct Ticket {
        id: i64,
        priority: i64,
    }

    crate::impl_entity!(Ticket, "tickets" { id: i64, priority: i64 });

    struct Assignee;
    struct Team;

    #[test]
    fn test_unconstrained_default() {
        let spec = Specification::<Ticket>::default();
        assert!(spec.is_unconstrained());
        assert_eq!(spec, Specification::UNCONSTRAINED);
        assert!(spec
            .is_satisfied_by(&Ticket { id: 1, priority: 1 })
            .unwrap());
    }

    #[test]
    fn test_ordering_directions_are_exclusive() {
        let spec = Specification::<Ticket>::new()
            .order_by(field::<Ticket, i64>("id"))
            .order_by_descending(field::<Ticket, i64>("priority"));
        assert_eq!(spec.order(), &Order::Descending(Expr::member("priority")));

        let spec = spec.order_by(field::<Ticket, i64>("id"));
        assert_eq!(spec.order(), &Order::Ascending(Expr::member("id")));
        assert_eq!(spec.order().direction(), Some(SortDirection::Ascending));
    }

    #[test]
    fn test_filter_accumulates_with_and() {
        let spec = Specification::<Ticket>::new()
            .filter(field::<Ticket, i64>("priority").gt(1))
            .filter(field::<Ticket, i64>("id").lt(10));

        assert!(spec.is_satisfied_by(&Ticket { id: 5, priority: 2 }).unwrap());
        assert!(!spec.is_satisfied_by(&Ticket { id: 50, priority: 2 }).unwrap());
        assert!(!spec.is_satisfied_by(&Ticket { id: 5, priority: 1 }).unwrap());
    }

    #[test]
    fn test_typed_navigation_paths() {
        let nav = Navigation::<Ticket, Assignee>::new("assignee").then(Navigation::<Assignee, Team>::new("team"));
        let spec = Specification::<Ticket>::new()
            .include(nav)
            .include_path("watchers.profile");

        assert_eq!(spec.includes()[0].dotted(), "assignee.team");
        assert_eq!(spec.include_strings(), &["watchers.profile".to_string()]);
    }
}
