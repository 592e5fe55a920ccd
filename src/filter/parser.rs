use crate::common::{
    OP_GT, OP_GTE, OP_IN, OP_LT, OP_LTE, OP_NE, OP_OPTIONS, OP_REGEX, REGEX_FLAGS,
};
use crate::document::{Document, Value};
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::filter::{FieldPredicate, FilterExpr};
use regex::Regex;

/// Parses a loosely typed filter document into field predicates.
///
/// Each filter field maps to either a literal (deep equality) or an operator
/// object: a nested document whose keys start with `$`. Unrecognized `$`
/// keys fail loudly with `ValidationError`, distinct from "no match".
pub(crate) fn parse_filter(spec: &Document) -> DocketResult<Vec<FieldPredicate>> {
    let mut predicates = Vec::with_capacity(spec.len());
    for (field, value) in spec.iter() {
        let exprs = match value {
            Value::Document(inner) if is_operator_object(inner)? => {
                parse_operator_object(field, inner)?
            }
            literal => vec![FilterExpr::Eq(literal.clone())],
        };
        predicates.push(FieldPredicate::new(field.clone(), exprs));
    }
    Ok(predicates)
}

/// A nested document is an operator object iff its keys start with `$`.
/// Mixing operator and plain keys in one object is invalid.
fn is_operator_object(inner: &Document) -> DocketResult<bool> {
    let operator_keys = inner
        .iter()
        .filter(|(key, _)| key.starts_with('$'))
        .count();
    if operator_keys == 0 {
        return Ok(false);
    }
    if operator_keys != inner.len() {
        log::error!("Filter mixes operator and literal keys: {:?}", inner);
        return Err(DocketError::new(
            "operator object must not mix $-operators with plain fields",
            ErrorKind::ValidationError,
        ));
    }
    Ok(true)
}

fn parse_operator_object(field: &str, ops: &Document) -> DocketResult<Vec<FilterExpr>> {
    let mut exprs = Vec::with_capacity(ops.len());
    let mut regex_source: Option<String> = None;
    let mut regex_options: Option<String> = None;

    for (op, operand) in ops.iter() {
        match op.as_str() {
            OP_IN => exprs.push(parse_in(field, operand)?),
            OP_GT => exprs.push(FilterExpr::Gt(operand.clone())),
            OP_GTE => exprs.push(FilterExpr::Gte(operand.clone())),
            OP_LT => exprs.push(FilterExpr::Lt(operand.clone())),
            OP_LTE => exprs.push(FilterExpr::Lte(operand.clone())),
            OP_NE => exprs.push(FilterExpr::Ne(operand.clone())),
            OP_REGEX => regex_source = Some(parse_string_operand(field, OP_REGEX, operand)?),
            OP_OPTIONS => regex_options = Some(parse_string_operand(field, OP_OPTIONS, operand)?),
            unknown => {
                log::error!("Unknown filter operator '{}' on field '{}'", unknown, field);
                return Err(DocketError::new(
                    &format!("unknown filter operator: {}", unknown),
                    ErrorKind::ValidationError,
                ));
            }
        }
    }

    match (regex_source, regex_options) {
        (Some(source), options) => {
            let options = options.unwrap_or_default();
            exprs.push(compile_regex(field, &source, &options)?);
        }
        (None, Some(_)) => {
            log::error!("$options without $regex on field '{}'", field);
            return Err(DocketError::new(
                "$options requires a $regex operator",
                ErrorKind::ValidationError,
            ));
        }
        (None, None) => {}
    }

    Ok(exprs)
}

fn parse_in(field: &str, operand: &Value) -> DocketResult<FilterExpr> {
    match operand {
        Value::Array(candidates) => Ok(FilterExpr::In(candidates.clone())),
        other => {
            log::error!("$in operand on field '{}' is not an array: {}", field, other);
            Err(DocketError::new(
                "$in requires an array operand",
                ErrorKind::ValidationError,
            ))
        }
    }
}

fn parse_string_operand(field: &str, op: &str, operand: &Value) -> DocketResult<String> {
    operand.as_str().map(|s| s.to_string()).ok_or_else(|| {
        log::error!("{} operand on field '{}' is not a string", op, field);
        DocketError::new(
            &format!("{} requires a string operand", op),
            ErrorKind::ValidationError,
        )
    })
}

/// Compiles the pattern once at parse time; matching never re-compiles.
fn compile_regex(field: &str, source: &str, options: &str) -> DocketResult<FilterExpr> {
    for flag in options.chars() {
        if !REGEX_FLAGS.contains(flag) {
            log::error!("Invalid $options flag '{}' on field '{}'", flag, field);
            return Err(DocketError::new(
                &format!("invalid $options flag: {}", flag),
                ErrorKind::ValidationError,
            ));
        }
    }

    let full_pattern = if options.is_empty() {
        source.to_string()
    } else {
        format!("(?{}){}", options, source)
    };

    let pattern = Regex::new(&full_pattern).map_err(|err| {
        log::error!("Invalid regex pattern '{}': {}", source, err);
        DocketError::new(
            &format!("invalid regex pattern: {}", err),
            ErrorKind::ValidationError,
        )
    })?;

    Ok(FilterExpr::Regex {
        pattern,
        source: source.to_string(),
        options: options.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_parse_literal_equality() {
        let predicates = parse_filter(&doc! { name: "alice" }).unwrap();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].field(), "name");
        assert!(matches!(predicates[0].exprs()[0], FilterExpr::Eq(_)));
    }

    #[test]
    fn test_parse_empty_filter() {
        let predicates = parse_filter(&doc! {}).unwrap();
        assert!(predicates.is_empty());
    }

    #[test]
    fn test_parse_operator_object() {
        let predicates = parse_filter(&doc! { age: { "$gte": 18, "$lte": 65 } }).unwrap();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].exprs().len(), 2);
    }

    #[test]
    fn test_nested_document_without_operators_is_literal() {
        let predicates = parse_filter(&doc! { meta: { kind: "x" } }).unwrap();
        assert!(matches!(predicates[0].exprs()[0], FilterExpr::Eq(_)));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let result = parse_filter(&doc! { age: { "$foo": 1 } });
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_mixed_operator_and_plain_keys_rejected() {
        let result = parse_filter(&doc! { age: { "$gte": 18, plain: 1 } });
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_in_requires_array() {
        let result = parse_filter(&doc! { tag: { "$in": "solo" } });
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);

        let ok = parse_filter(&doc! { tag: { "$in": ["a", "b"] } });
        assert!(ok.is_ok());
    }

    #[test]
    fn test_regex_with_options() {
        let predicates = parse_filter(&doc! { name: { "$regex": "^a", "$options": "i" } }).unwrap();
        let expr = &predicates[0].exprs()[0];
        assert!(expr.matches(Some(&Value::from("Alpha"))));
        assert!(!expr.matches(Some(&Value::from("Beta"))));
    }

    #[test]
    fn test_invalid_options_flag_rejected() {
        let result = parse_filter(&doc! { name: { "$regex": "^a", "$options": "g" } });
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_malformed_pattern_rejected() {
        let result = parse_filter(&doc! { name: { "$regex": "([unclosed" } });
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_options_without_regex_rejected() {
        let result = parse_filter(&doc! { name: { "$options": "i" } });
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_non_string_regex_operand_rejected() {
        let result = parse_filter(&doc! { name: { "$regex": 42 } });
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);
    }
}
