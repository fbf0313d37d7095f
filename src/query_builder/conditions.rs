use super::expr::Expr;
use crate::error::EvalError;
use crate::model::{Entity, Value};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// Boolean condition tree over a single entity.
///
/// Evaluation is two-valued: a comparison involving null is false, and `Not`
/// is the exact complement of its operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Literal(bool),
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    In {
        operand: Expr,
        values: Vec<Value>,
    },
    IsNull(Expr),
    /// SQL `LIKE` with `%` and `_` wildcards
    Like {
        operand: Expr,
        pattern: String,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn and(self, rhs: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(rhs))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    pub fn evaluate<T: Entity>(&self, entity: &T) -> Result<bool, EvalError> {
        match self {
            Predicate::Literal(value) => Ok(*value),
            Predicate::Compare { left, op, right } => {
                let lhs = left.evaluate(entity)?;
                let rhs = right.evaluate(entity)?;
                Ok(lhs.compare(&rhs).is_some_and(|ordering| op.holds(ordering)))
            }
            Predicate::In { operand, values } => {
                let value = operand.evaluate(entity)?;
                Ok(values
                    .iter()
                    .any(|candidate| value.compare(candidate) == Some(Ordering::Equal)))
            }
            Predicate::IsNull(operand) => Ok(operand.evaluate(entity)?.is_null()),
            Predicate::Like { operand, pattern } => match operand.evaluate(entity)? {
                Value::Text(text) => Ok(like_matches(&text, pattern)),
                _ => Ok(false),
            },
            Predicate::And(left, right) => Ok(left.evaluate(entity)? && right.evaluate(entity)?),
            Predicate::Or(left, right) => Ok(left.evaluate(entity)? || right.evaluate(entity)?),
            Predicate::Not(inner) => Ok(!inner.evaluate(entity)?),
        }
    }
}

fn like_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // matched[j]: pattern[..j] matches the text prefix consumed so far
    let mut matched = vec![false; pattern.len() + 1];
    matched[0] = true;
    for j in 1..=pattern.len() {
        matched[j] = matched[j - 1] && pattern[j - 1] == '%';
    }

    for ch in text {
        let mut next = vec![false; pattern.len() + 1];
        for j in 1..=pattern.len() {
            next[j] = match pattern[j - 1] {
                '%' => next[j - 1] || matched[j],
                '_' => matched[j - 1],
                literal => matched[j - 1] && literal == ch,
            };
        }
        matched = next;
    }

    matched[pattern.len()]
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Literal(true) => f.write_str("1=1"),
            Predicate::Literal(false) => f.write_str("1=0"),
            Predicate::Compare { left, op, right } => {
                write!(f, "{left} {} {right}", op.symbol())
            }
            Predicate::In { operand, values } => {
                let value_list = values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{operand} IN ({value_list})")
            }
            Predicate::IsNull(operand) => write!(f, "{operand} IS NULL"),
            Predicate::Like { operand, pattern } => {
                write!(f, "{operand} LIKE {}", Value::Text(pattern.clone()))
            }
            Predicate::And(left, right) => write!(f, "({left} AND {right})"),
            Predicate::Or(left, right) => write!(f, "({left} OR {right})"),
            Predicate::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::expr::field;

    #[derive(Debug, Clone)]
    struct Account {
        id: i64,
        owner: String,
        closed_at: Option<String>,
    }

    crate::impl_entity!(Account, "accounts" { id: i64, owner: String, closed_at: Option<String> });

    fn account(id: i64, owner: &str) -> Account {
        Account {
            id,
            owner: owner.to_string(),
            closed_at: None,
        }
    }

    #[test]
    fn test_comparisons() {
        let id = field::<Account, i64>("id");
        let row = account(5, "ada");
        assert!(id.equals(5).evaluate(&row).unwrap());
        assert!(id.gt(4).evaluate(&row).unwrap());
        assert!(!id.lt(5).evaluate(&row).unwrap());
        assert!(id.between(1, 5).evaluate(&row).unwrap());
        assert!(id.is_in([1, 5, 9]).evaluate(&row).unwrap());
    }

    #[test]
    fn test_null_comparison_is_false_and_not_is_complement() {
        let closed = field::<Account, String>("closed_at");
        let row = account(1, "ada");
        let eq = closed.equals("2024".to_string());
        assert!(!eq.evaluate(&row).unwrap());
        assert!(eq.not().evaluate(&row).unwrap());
        assert!(closed.is_null().evaluate(&row).unwrap());
        assert!(!closed.is_not_null().evaluate(&row).unwrap());
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like_matches("grace hopper", "grace%"));
        assert!(like_matches("grace hopper", "%hop%"));
        assert!(like_matches("abc", "a_c"));
        assert!(!like_matches("abc", "a_"));
        assert!(like_matches("", "%"));
        assert!(!like_matches("abc", ""));
    }

    #[test]
    fn test_display_renders_sql_style() {
        let id = field::<Account, i64>("id");
        let owner = field::<Account, String>("owner");
        let predicate = id.gt(3).and(owner.like("a%").not());
        assert_eq!(predicate.to_string(), "(id > 3 AND NOT (owner LIKE 'a%'))");
        assert_eq!(id.is_in([1, 2]).to_string(), "id IN (1, 2)");
    }
}
