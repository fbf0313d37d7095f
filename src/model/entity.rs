use super::value::{Value, ValueKind};
use crate::error::ConversionError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Declared property of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: ValueKind,
    pub nullable: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: ValueKind, nullable: bool) -> Self {
        Self {
            name,
            kind,
            nullable,
        }
    }
}

/// Rust types that can back an entity property
pub trait FieldType: Clone + Send + Sync + 'static {
    const KIND: ValueKind;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

/// A row type the repository can query, order and update.
///
/// Implementations are usually generated with [`impl_entity!`](crate::impl_entity).
pub trait Entity: Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    fn fields() -> &'static [FieldDef];

    /// Read a property by name. Dotted names address included related data
    /// for entities that expose it.
    fn get(&self, field: &str) -> Option<Value>;

    fn set(&mut self, field: &str, value: Value) -> Result<(), ConversionError>;

    fn field(name: &str) -> Option<&'static FieldDef> {
        Self::fields().iter().find(|def| def.name == name)
    }
}

fn expect_kind(value: Value, kind: ValueKind) -> Result<Value, ConversionError> {
    if value.is_null() {
        return Err(ConversionError::NullNotAllowed { target: kind });
    }
    value.convert_to(kind)
}

fn unexpected(value: &Value, target: ValueKind) -> ConversionError {
    ConversionError::Incompatible {
        value: value.to_string(),
        target,
        reason: "unexpected value kind".to_string(),
    }
}

impl FieldType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match expect_kind(value, Self::KIND)? {
            Value::Bool(b) => Ok(b),
            other => Err(unexpected(&other, Self::KIND)),
        }
    }
}

impl FieldType for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match expect_kind(value, Self::KIND)? {
            Value::Int(i) => Ok(i),
            other => Err(unexpected(&other, Self::KIND)),
        }
    }
}

impl FieldType for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|e| ConversionError::Incompatible {
            value: wide.to_string(),
            target: Self::KIND,
            reason: e.to_string(),
        })
    }
}

impl FieldType for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match expect_kind(value, Self::KIND)? {
            Value::Float(f) => Ok(f),
            other => Err(unexpected(&other, Self::KIND)),
        }
    }
}

impl FieldType for String {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match expect_kind(value, Self::KIND)? {
            Value::Text(s) => Ok(s),
            other => Err(unexpected(&other, Self::KIND)),
        }
    }
}

impl FieldType for Uuid {
    const KIND: ValueKind = ValueKind::Uuid;

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match expect_kind(value, Self::KIND)? {
            Value::Uuid(u) => Ok(u),
            other => Err(unexpected(&other, Self::KIND)),
        }
    }
}

impl FieldType for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match expect_kind(value, Self::KIND)? {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(unexpected(&other, Self::KIND)),
        }
    }
}

impl<P: FieldType> FieldType for Option<P> {
    const KIND: ValueKind = P::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldType::to_value)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        if value.is_null() {
            Ok(None)
        } else {
            P::from_value(value).map(Some)
        }
    }
}

/// Implement [`Entity`] for a struct whose listed fields are all [`FieldType`]s.
///
/// ```rust,ignore
/// #[derive(Debug, Clone)]
/// struct Product { id: i64, name: String, price: f64 }
///
/// quarry_core::impl_entity!(Product, "products" { id: i64, name: String, price: f64 });
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($ty:ty, $table:literal { $($field:ident : $fty:ty),+ $(,)? }) => {
        impl $crate::model::Entity for $ty {
            const TABLE: &'static str = $table;

            fn fields() -> &'static [$crate::model::FieldDef] {
                const FIELDS: &[$crate::model::FieldDef] = &[
                    $(
                        $crate::model::FieldDef::new(
                            stringify!($field),
                            <$fty as $crate::model::FieldType>::KIND,
                            <$fty as $crate::model::FieldType>::NULLABLE,
                        ),
                    )+
                ];
                FIELDS
            }

            fn get(&self, field: &str) -> Option<$crate::model::Value> {
                match field {
                    $(stringify!($field) => Some($crate::model::FieldType::to_value(&self.$field)),)+
                    _ => None,
                }
            }

            fn set(
                &mut self,
                field: &str,
                value: $crate::model::Value,
            ) -> ::std::result::Result<(), $crate::error::ConversionError> {
                match field {
                    $(
                        stringify!($field) => {
                            self.$field = <$fty as $crate::model::FieldType>::from_value(value)?;
                            Ok(())
                        }
                    )+
                    _ => Err($crate::error::ConversionError::UnknownField {
                        entity: <Self as $crate::model::Entity>::TABLE,
                        field: field.to_string(),
                    }),
                }
            }
        }
    };
}
