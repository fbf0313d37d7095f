//! # Error Types
//!
//! Contract errors are raised before any data-engine round trip and indicate a
//! bug at the call site. Engine errors come from the underlying data engine and
//! propagate unchanged.

use crate::model::ValueKind;
use thiserror::Error;

/// Failure converting a value to a declared kind
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert {value} to {target}: {reason}")]
    Incompatible {
        value: String,
        target: ValueKind,
        reason: String,
    },

    #[error("null is not allowed for a non-nullable {target} property")]
    NullNotAllowed { target: ValueKind },

    #[error("unknown property '{field}' on {entity}")]
    UnknownField { entity: &'static str, field: String },
}

/// Failure evaluating an expression against an entity
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown property '{field}' on {entity}")]
    UnknownField { entity: &'static str, field: String },

    #[error("operator {operator} is not defined for {left} and {right}")]
    TypeMismatch {
        operator: &'static str,
        left: String,
        right: String,
    },

    #[error("division by zero in {expression}")]
    DivisionByZero { expression: String },

    #[error("integer overflow in {expression}")]
    Overflow { expression: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Programmer misuse of the query or update API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error("page number must be greater than zero, got {page_number}")]
    InvalidPageNumber { page_number: u32 },

    #[error("page size must be greater than zero, got {page_size}")]
    InvalidPageSize { page_size: u32 },

    #[error("page size {page_size} exceeds the configured maximum of {max_page_size}")]
    PageSizeExceedsMaximum { page_size: u32, max_page_size: u32 },

    #[error("keyset pagination requires an explicit ordering clause")]
    KeysetRequiresOrdering,

    #[error("keyset pagination requires a non-nullable member ordering, widened at most once, got {expression}")]
    UnsupportedKeysetOrdering { expression: String },

    #[error("cursor value {value} cannot be converted to {target}: {reason}")]
    CursorConversion {
        value: String,
        target: ValueKind,
        reason: String,
    },

    #[error("property selector must be a direct property read on the entity, got {expression}")]
    InvalidPropertySelector { expression: String },

    #[error("unknown property '{property}' on {entity}")]
    UnknownProperty {
        entity: &'static str,
        property: String,
    },

    #[error("property '{property}' is declared as {declared} but the descriptor supplies {supplied}")]
    DescriptorTypeMismatch {
        property: String,
        declared: String,
        supplied: String,
    },

    #[error("no update setter is registered for {kind} properties")]
    UnsupportedPropertyType { kind: String },
}

/// Execution failure reported by a data engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvalError),

    #[error("assignment failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("no related data loader registered for include path '{path}'")]
    UnknownInclude { path: String },

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigurationError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    #[error("contract violation: {0}")]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RepositoryError {
    /// Contract violations are bugs in the caller and must never be retried
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, RepositoryError::Contract(_))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
