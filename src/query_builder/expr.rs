//! Value expressions over a single entity.
//!
//! Expressions have no explicit parameter: every node is evaluated against the
//! same entity, so two expressions built independently can be combined without
//! rebinding anything.

use super::conditions::{CompareOp, Predicate};
use crate::error::EvalError;
use crate::model::{Entity, FieldType, Value, ValueKind};
use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Concat => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Lower,
    Upper,
    Length,
    Abs,
    Coalesce,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::Lower => "LOWER",
            Function::Upper => "UPPER",
            Function::Length => "LENGTH",
            Function::Abs => "ABS",
            Function::Coalesce => "COALESCE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Value),
    /// Direct property read on the entity
    Member(String),
    /// Property read through one or more navigations (`customer.name`).
    ///
    /// Evaluates through [`Entity::get`] with the dotted name, so it only
    /// yields data for entities whose `get` answers dotted names.
    /// `impl_entity!` does not, and such reads evaluate to null.
    Path(Vec<String>),
    Convert {
        operand: Box<Expr>,
        kind: ValueKind,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

/// A direct member read, as found by [`Expr::member_access`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberAccess<'a> {
    pub name: &'a str,
    pub converted_to: Option<ValueKind>,
}

impl Expr {
    pub fn member(name: &str) -> Self {
        Expr::Member(name.to_string())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn path(segments: &[&str]) -> Self {
        Expr::Path(segments.iter().map(|s| s.to_string()).collect())
    }

    pub fn convert(self, kind: ValueKind) -> Self {
        Expr::Convert {
            operand: Box::new(self),
            kind,
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Expr::Call { function, args }
    }

    /// Returns the member when this expression is a direct property read,
    /// optionally wrapped in a single conversion. Anything else yields `None`.
    pub fn member_access(&self) -> Option<MemberAccess<'_>> {
        match self {
            Expr::Member(name) => Some(MemberAccess {
                name,
                converted_to: None,
            }),
            Expr::Convert { operand, kind } => match operand.as_ref() {
                Expr::Member(name) => Some(MemberAccess {
                    name,
                    converted_to: Some(*kind),
                }),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn evaluate<T: Entity>(&self, entity: &T) -> Result<Value, EvalError> {
        match self {
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Member(name) => entity.get(name).ok_or_else(|| EvalError::UnknownField {
                entity: T::TABLE,
                field: name.clone(),
            }),
            // Unloaded related data reads as null
            Expr::Path(segments) => Ok(entity.get(&segments.join(".")).unwrap_or(Value::Null)),
            Expr::Convert { operand, kind } => Ok(operand.evaluate(entity)?.convert_to(*kind)?),
            Expr::Binary { op, left, right } => {
                let lhs = left.evaluate(entity)?;
                let rhs = right.evaluate(entity)?;
                self.apply_binary(*op, lhs, rhs)
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(entity))
                    .collect::<Result<Vec<_>, _>>()?;
                apply_function(*function, values)
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
        if lhs.is_null() || rhs.is_null() {
            return Ok(Value::Null);
        }

        let mismatch = |lhs: &Value, rhs: &Value| EvalError::TypeMismatch {
            operator: op.symbol(),
            left: lhs.to_string(),
            right: rhs.to_string(),
        };

        let arithmetic = match op {
            BinaryOp::Concat => {
                return match (lhs.convert_to(ValueKind::Text)?, rhs.convert_to(ValueKind::Text)?) {
                    (Value::Text(a), Value::Text(b)) => Ok(Value::Text(a + &b)),
                    (a, b) => Err(mismatch(&a, &b)),
                };
            }
            BinaryOp::Add => Arithmetic::Add,
            BinaryOp::Subtract => Arithmetic::Subtract,
            BinaryOp::Multiply => Arithmetic::Multiply,
            BinaryOp::Divide => Arithmetic::Divide,
        };

        match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => {
                let result = match arithmetic {
                    Arithmetic::Add => a.checked_add(*b),
                    Arithmetic::Subtract => a.checked_sub(*b),
                    Arithmetic::Multiply => a.checked_mul(*b),
                    Arithmetic::Divide => {
                        if *b == 0 {
                            return Err(EvalError::DivisionByZero {
                                expression: self.to_string(),
                            });
                        }
                        a.checked_div(*b)
                    }
                };
                result.map(Value::Int).ok_or_else(|| EvalError::Overflow {
                    expression: self.to_string(),
                })
            }
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let a = as_float(&lhs);
                let b = as_float(&rhs);
                let result = match arithmetic {
                    Arithmetic::Add => a + b,
                    Arithmetic::Subtract => a - b,
                    Arithmetic::Multiply => a * b,
                    Arithmetic::Divide => {
                        if b == 0.0 {
                            return Err(EvalError::DivisionByZero {
                                expression: self.to_string(),
                            });
                        }
                        a / b
                    }
                };
                Ok(Value::Float(result))
            }
            _ => Err(mismatch(&lhs, &rhs)),
        }
    }
}

/// Numeric subset of [`BinaryOp`]
#[derive(Clone, Copy)]
enum Arithmetic {
    Add,
    Subtract,
    Multiply,
    Divide,
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

fn apply_function(function: Function, mut args: Vec<Value>) -> Result<Value, EvalError> {
    if function == Function::Coalesce {
        return Ok(args
            .into_iter()
            .find(|v| !v.is_null())
            .unwrap_or(Value::Null));
    }

    let arg = if args.is_empty() {
        Value::Null
    } else {
        args.swap_remove(0)
    };

    match (function, arg) {
        (_, Value::Null) => Ok(Value::Null),
        (Function::Lower, Value::Text(s)) => Ok(Value::Text(s.to_lowercase())),
        (Function::Upper, Value::Text(s)) => Ok(Value::Text(s.to_uppercase())),
        (Function::Length, Value::Text(s)) => Ok(Value::Int(s.chars().count() as i64)),
        (Function::Abs, Value::Int(i)) => Ok(Value::Int(i.saturating_abs())),
        (Function::Abs, Value::Float(f)) => Ok(Value::Float(f.abs())),
        (function, other) => Err(EvalError::TypeMismatch {
            operator: function.name(),
            left: other.to_string(),
            right: String::new(),
        }),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Member(name) => f.write_str(name),
            Expr::Path(segments) => f.write_str(&segments.join(".")),
            Expr::Convert { operand, kind } => write!(f, "CAST({operand} AS {kind})"),
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Call { function, args } => {
                let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{}({})", function.name(), rendered.join(", "))
            }
        }
    }
}

/// Typed expression over entity `T` producing a `P`.
///
/// Property selectors, ordering keys and update values share this type, so a
/// descriptor's selector and value cannot disagree on the property type.
pub struct Selector<T, P> {
    expr: Expr,
    _marker: PhantomData<fn(&T) -> P>,
}

impl<T, P> Clone for Selector<T, P> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, P> fmt::Debug for Selector<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.expr).finish()
    }
}

/// Shorthand for [`Selector::member`]
pub fn field<T: Entity, P: FieldType>(name: &str) -> Selector<T, P> {
    Selector::member(name)
}

impl<T: Entity, P: FieldType> Selector<T, P> {
    pub fn member(name: &str) -> Self {
        Self::from_expr(Expr::member(name))
    }

    pub fn constant(value: P) -> Self {
        Self::from_expr(Expr::Constant(value.to_value()))
    }

    /// Wrap an untyped expression. The caller vouches for the result type.
    pub fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _marker: PhantomData,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    /// Explicit conversion to another property type.
    ///
    /// Any target is accepted here. Update selectors and keyset keys only
    /// accept a lossless conversion such as `i64` to `f64`.
    pub fn convert<Q: FieldType>(self) -> Selector<T, Q> {
        Selector::from_expr(self.expr.convert(Q::KIND))
    }

    pub fn plus(self, rhs: Selector<T, P>) -> Self {
        Self::from_expr(Expr::binary(BinaryOp::Add, self.expr, rhs.expr))
    }

    pub fn minus(self, rhs: Selector<T, P>) -> Self {
        Self::from_expr(Expr::binary(BinaryOp::Subtract, self.expr, rhs.expr))
    }

    pub fn times(self, rhs: Selector<T, P>) -> Self {
        Self::from_expr(Expr::binary(BinaryOp::Multiply, self.expr, rhs.expr))
    }

    pub fn divided_by(self, rhs: Selector<T, P>) -> Self {
        Self::from_expr(Expr::binary(BinaryOp::Divide, self.expr, rhs.expr))
    }

    fn compare(&self, op: CompareOp, value: P) -> Predicate {
        Predicate::Compare {
            left: self.expr.clone(),
            op,
            right: Expr::Constant(value.to_value()),
        }
    }

    pub fn equals(&self, value: P) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    pub fn not_equals(&self, value: P) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    pub fn gt(&self, value: P) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    pub fn ge(&self, value: P) -> Predicate {
        self.compare(CompareOp::Ge, value)
    }

    pub fn lt(&self, value: P) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    pub fn le(&self, value: P) -> Predicate {
        self.compare(CompareOp::Le, value)
    }

    pub fn between(&self, low: P, high: P) -> Predicate {
        self.ge(low).and(self.le(high))
    }

    /// Compare against another expression over the same entity
    pub fn compare_to(&self, op: CompareOp, other: &Selector<T, P>) -> Predicate {
        Predicate::Compare {
            left: self.expr.clone(),
            op,
            right: other.expr.clone(),
        }
    }

    pub fn is_in(&self, values: impl IntoIterator<Item = P>) -> Predicate {
        Predicate::In {
            operand: self.expr.clone(),
            values: values.into_iter().map(|v| v.to_value()).collect(),
        }
    }

    pub fn is_null(&self) -> Predicate {
        Predicate::IsNull(self.expr.clone())
    }

    pub fn is_not_null(&self) -> Predicate {
        self.is_null().not()
    }
}

impl<T: Entity> Selector<T, String> {
    pub fn like(&self, pattern: &str) -> Predicate {
        Predicate::Like {
            operand: self.expr.clone(),
            pattern: pattern.to_string(),
        }
    }

    pub fn lower(self) -> Self {
        Self::from_expr(Expr::call(Function::Lower, vec![self.expr]))
    }

    pub fn upper(self) -> Self {
        Self::from_expr(Expr::call(Function::Upper, vec![self.expr]))
    }

    pub fn concat(self, rhs: Selector<T, String>) -> Self {
        Self::from_expr(Expr::binary(BinaryOp::Concat, self.expr, rhs.expr))
    }
}
