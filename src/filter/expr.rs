use crate::document::Value;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// A single field predicate.
///
/// `FilterExpr` is the closed set of operators the matcher evaluates. A
/// filter field either carries one `Eq` (literal match) or any combination
/// of operator variants parsed from an operator object; all predicates on a
/// field are AND-ed.
#[derive(Clone, Debug)]
pub enum FilterExpr {
    /// Deep structural equality against a literal.
    Eq(Value),
    /// Membership in a set of literals.
    In(Vec<Value>),
    /// Strictly greater than, same-typed operands only.
    Gt(Value),
    /// Greater than or equal, same-typed operands only.
    Gte(Value),
    /// Strictly less than, same-typed operands only.
    Lt(Value),
    /// Less than or equal, same-typed operands only.
    Lte(Value),
    /// Structural inequality; satisfied by a missing field.
    Ne(Value),
    /// Regular expression match over the string form of the field value.
    Regex {
        pattern: Regex,
        source: String,
        options: String,
    },
}

impl FilterExpr {
    /// Evaluates this predicate against a document field value.
    ///
    /// `None` means the field is absent from the document: a missing value
    /// satisfies `Ne` and fails every other predicate.
    pub fn matches(&self, field_value: Option<&Value>) -> bool {
        match self {
            FilterExpr::Eq(operand) => match field_value {
                Some(value) => value == operand,
                None => false,
            },
            FilterExpr::In(operands) => match field_value {
                Some(value) => operands.iter().any(|candidate| candidate == value),
                None => false,
            },
            FilterExpr::Gt(operand) => Self::in_range(field_value, operand, Ordering::is_gt),
            FilterExpr::Gte(operand) => Self::in_range(field_value, operand, Ordering::is_ge),
            FilterExpr::Lt(operand) => Self::in_range(field_value, operand, Ordering::is_lt),
            FilterExpr::Lte(operand) => Self::in_range(field_value, operand, Ordering::is_le),
            FilterExpr::Ne(operand) => match field_value {
                Some(value) => value != operand,
                None => true,
            },
            FilterExpr::Regex { pattern, .. } => field_value
                .and_then(|value| value.coerce_to_string())
                .map(|text| pattern.is_match(&text))
                .unwrap_or(false),
        }
    }

    // Range operators never coerce: mismatched operand types are unordered
    // and evaluate false.
    fn in_range(
        field_value: Option<&Value>,
        operand: &Value,
        accept: fn(Ordering) -> bool,
    ) -> bool {
        field_value
            .and_then(|value| value.compare(operand))
            .map(accept)
            .unwrap_or(false)
    }
}

impl Display for FilterExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterExpr::Eq(v) => write!(f, "== {}", v),
            FilterExpr::In(vs) => write!(f, "in {:?}", vs),
            FilterExpr::Gt(v) => write!(f, "> {}", v),
            FilterExpr::Gte(v) => write!(f, ">= {}", v),
            FilterExpr::Lt(v) => write!(f, "< {}", v),
            FilterExpr::Lte(v) => write!(f, "<= {}", v),
            FilterExpr::Ne(v) => write!(f, "!= {}", v),
            FilterExpr::Regex { source, options, .. } => {
                if options.is_empty() {
                    write!(f, "=~ /{}/", source)
                } else {
                    write!(f, "=~ /{}/{}", source, options)
                }
            }
        }
    }
}
