//! # Bulk Updates
//!
//! Property updates are described individually and folded into one
//! [`UpdateSet`], which the engine applies as a single set-based operation.
//!
//! Each descriptor's setter is looked up by the property's declared kind and
//! nullability in a registry of functions monomorphized per property type.
//! The setter records the assignment together with the coercion for that
//! type, so values computed by the engine are checked against the column.

use super::Repository;
use crate::database::DataEngine;
use crate::error::{ContractError, ConversionError, Result};
use crate::logging::log_repository_operation;
use crate::model::{Entity, FieldDef, FieldType, Value, ValueKind};
use crate::query_builder::{Assignment, Expr, QueryShape, Selector, UpdateSet};
use crate::specification::Specification;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;
use tracing::{debug, instrument};
use uuid::Uuid;

type SetterFn = fn(UpdateSet, &'static FieldDef, Expr) -> UpdateSet;

/// "Set this property to this value" for every row an update matches
pub struct PropertyUpdate<T> {
    property: &'static FieldDef,
    value: Expr,
    _entity: PhantomData<fn(&T)>,
}

impl<T> Clone for PropertyUpdate<T> {
    fn clone(&self) -> Self {
        Self {
            property: self.property,
            value: self.value.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for PropertyUpdate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyUpdate")
            .field("property", &self.property.name)
            .field("value", &self.value.to_string())
            .finish()
    }
}

impl<T: Entity> PropertyUpdate<T> {
    /// Set the property to a constant
    pub fn set<P: FieldType>(
        selector: Selector<T, P>,
        value: P,
    ) -> std::result::Result<Self, ContractError> {
        Self::compute(selector, Selector::constant(value))
    }

    /// Set the property to a value computed from the row being updated.
    ///
    /// All assignments of one update see the row as it was before the update.
    pub fn compute<P: FieldType>(
        selector: Selector<T, P>,
        value: Selector<T, P>,
    ) -> std::result::Result<Self, ContractError> {
        let property = resolve_property::<T, P>(selector.expr())?;
        Ok(Self {
            property,
            value: value.into_expr(),
            _entity: PhantomData,
        })
    }

    pub fn property(&self) -> &'static str {
        self.property.name
    }

    pub fn value(&self) -> &Expr {
        &self.value
    }
}

/// Check the selector is a property of `T` that accepts values of type `P`
fn resolve_property<T: Entity, P: FieldType>(
    selector: &Expr,
) -> std::result::Result<&'static FieldDef, ContractError> {
    let access = selector
        .member_access()
        .ok_or_else(|| ContractError::InvalidPropertySelector {
            expression: selector.to_string(),
        })?;

    let property = T::field(access.name).ok_or_else(|| ContractError::UnknownProperty {
        entity: T::TABLE,
        property: access.name.to_string(),
    })?;

    let kind_matches = match access.converted_to {
        Some(converted) => converted == P::KIND && property.kind.widens_to(converted),
        None => property.kind == P::KIND,
    };
    let null_matches = property.nullable || !P::NULLABLE;

    if !(kind_matches && null_matches) {
        return Err(ContractError::DescriptorTypeMismatch {
            property: property.name.to_string(),
            declared: describe(property.kind, property.nullable),
            supplied: describe(P::KIND, P::NULLABLE),
        });
    }

    Ok(property)
}

fn describe(kind: ValueKind, nullable: bool) -> String {
    if nullable {
        format!("nullable {kind}")
    } else {
        kind.to_string()
    }
}

fn set_property<P: FieldType>(update: UpdateSet, property: &'static FieldDef, value: Expr) -> UpdateSet {
    update.then(Assignment {
        column: property.name.to_string(),
        kind: P::KIND,
        nullable: P::NULLABLE,
        value,
        coerce: coerce::<P>,
    })
}

/// Convert an evaluated value into one a `P` property accepts
fn coerce<P: FieldType>(value: Value) -> std::result::Result<Value, ConversionError> {
    let converted = if value.is_null() {
        value
    } else {
        value.convert_to(P::KIND)?
    };
    P::from_value(converted).map(|typed| typed.to_value())
}

fn register<P: FieldType>(setters: &mut HashMap<(ValueKind, bool), SetterFn>) {
    setters.insert((P::KIND, P::NULLABLE), set_property::<P>);
    setters.insert((P::KIND, true), set_property::<Option<P>>);
}

fn setter_registry() -> &'static HashMap<(ValueKind, bool), SetterFn> {
    static SETTERS: OnceLock<HashMap<(ValueKind, bool), SetterFn>> = OnceLock::new();
    SETTERS.get_or_init(|| {
        let mut setters = HashMap::new();
        register::<bool>(&mut setters);
        register::<i64>(&mut setters);
        register::<f64>(&mut setters);
        register::<String>(&mut setters);
        register::<Uuid>(&mut setters);
        register::<DateTime<Utc>>(&mut setters);
        setters
    })
}

/// Fold property updates left to right into one composite update
pub fn compose_update<T: Entity>(
    updates: &[PropertyUpdate<T>],
) -> std::result::Result<UpdateSet, ContractError> {
    let setters = setter_registry();
    updates.iter().try_fold(UpdateSet::identity(), |update, descriptor| {
        let property = descriptor.property;
        let setter = setters
            .get(&(property.kind, property.nullable))
            .ok_or_else(|| ContractError::UnsupportedPropertyType {
                kind: describe(property.kind, property.nullable),
            })?;
        Ok(setter(update, property, descriptor.value.clone()))
    })
}

impl<T: Entity, E: DataEngine<T>> Repository<T, E> {
    /// Apply `updates` to every row matched by the specification's criteria,
    /// returning the number of affected rows.
    ///
    /// Only the criteria take part; includes and ordering are ignored. An
    /// empty update list performs no engine call.
    #[instrument(skip(self, specification, updates), fields(table = T::TABLE, descriptors = updates.len()))]
    pub async fn update_many(
        &self,
        specification: Option<&Specification<T>>,
        updates: &[PropertyUpdate<T>],
    ) -> Result<u64> {
        if updates.is_empty() {
            debug!("No property updates supplied");
            return Ok(0);
        }

        let update = compose_update(updates)
            .inspect_err(|error| debug!(error = %error, "Bulk update rejected"))?;
        if update.is_identity() {
            return Ok(0);
        }

        let mut query = self.query();
        if let Some(criteria) = specification.and_then(Specification::criteria) {
            query = query.filter(criteria.clone());
        }

        let affected = query.update(&update).await?;
        log_repository_operation(
            "update_many",
            T::TABLE,
            "success",
            Some(affected),
            Some(&update.columns().join(", ")),
        );
        Ok(affected)
    }
}
