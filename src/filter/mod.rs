mod expr;
mod parser;

pub use expr::FilterExpr;

use crate::document::Document;
use crate::errors::DocketResult;
use std::fmt::{Display, Formatter};

/// All predicates for one filter field, AND-ed together.
#[derive(Clone, Debug)]
pub struct FieldPredicate {
    field: String,
    exprs: Vec<FilterExpr>,
}

impl FieldPredicate {
    pub(crate) fn new(field: String, exprs: Vec<FilterExpr>) -> Self {
        FieldPredicate { field, exprs }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn exprs(&self) -> &[FilterExpr] {
        &self.exprs
    }

    fn matches(&self, doc: &Document) -> bool {
        let field_value = doc.get(&self.field);
        self.exprs.iter().all(|expr| expr.matches(field_value))
    }
}

/// A declarative match specification evaluated against a [Document].
///
/// A filter is a set of field predicates with implicit AND semantics: a
/// document matches iff every field predicate matches. The empty filter
/// matches everything.
///
/// Filters are built once from a loosely typed filter document and carry
/// pre-compiled operator variants, so evaluation is infallible; malformed
/// input (unknown `$` operators, bad regex patterns) is rejected at parse
/// time with a `ValidationError`.
///
/// # Examples
///
/// ```rust
/// use docket::doc;
/// use docket::filter::Filter;
///
/// let filter = Filter::parse(&doc! { age: { "$gte": 18, "$lte": 65 } })?;
/// assert!(filter.matches(&doc! { age: 30 }));
/// assert!(!filter.matches(&doc! { age: 10 }));
/// # Ok::<(), docket::errors::DocketError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Filter {
    predicates: Vec<FieldPredicate>,
}

impl Filter {
    /// Creates the empty filter, which matches every document.
    pub fn empty() -> Self {
        Filter {
            predicates: Vec::new(),
        }
    }

    /// Parses a filter specification document.
    ///
    /// Literal field values mean deep structural equality; nested documents
    /// whose keys start with `$` are operator objects.
    ///
    /// # Errors
    ///
    /// `ValidationError` for unrecognized operator keys, non-array `$in`
    /// operands, `$options` without `$regex`, invalid flag characters, or
    /// malformed regex patterns.
    pub fn parse(spec: &Document) -> DocketResult<Filter> {
        Ok(Filter {
            predicates: parser::parse_filter(spec)?,
        })
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(doc))
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[FieldPredicate] {
        &self.predicates
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.predicates.is_empty() {
            return write!(f, "(all)");
        }
        let mut first = true;
        for predicate in &self.predicates {
            for expr in predicate.exprs() {
                if !first {
                    write!(f, " && ")?;
                }
                write!(f, "({} {})", predicate.field(), expr)?;
                first = false;
            }
        }
        Ok(())
    }
}
