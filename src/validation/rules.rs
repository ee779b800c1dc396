//! Write-time package rules
//!
//! Rules see the whole package, so they can check constraints that span
//! fields. Schema-declared constraints (`member_of`, count links) run through
//! the same pipeline as rules registered by callers.

use super::DataError;
use crate::models::{CountRule, FieldValue, SchemaPath};
use crate::package::Package;
use std::fmt;

/// Constraint checked against a complete package before it is written
pub trait FieldRule: fmt::Debug + Send + Sync {
    /// Name reported in [`DataError::RuleViolation`]
    fn name(&self) -> &str;

    fn check(&self, package: &Package) -> Result<(), DataError>;
}

/// A string field must name one entry of a list field (e.g. AUXMULTNAME)
#[derive(Debug, Clone)]
pub struct MemberOfRule {
    field: String,
    list: String,
}

impl MemberOfRule {
    pub fn new(field: impl Into<String>, list: impl Into<String>) -> Self {
        Self {
            field: field.into().to_lowercase(),
            list: list.into().to_lowercase(),
        }
    }
}

impl FieldRule for MemberOfRule {
    fn name(&self) -> &str {
        "member_of"
    }

    fn check(&self, package: &Package) -> Result<(), DataError> {
        let Some(value) = package.string(&self.field) else {
            return Ok(());
        };
        let names = package.strings(&self.list);
        if names.iter().any(|n| n.eq_ignore_ascii_case(value)) {
            return Ok(());
        }
        Err(DataError::RuleViolation {
            rule: self.name().to_string(),
            path: package.field_path(&self.field),
            reason: format!(
                "'{}' is not one of the {} names [{}]",
                value,
                self.list,
                names.join(", ")
            ),
        })
    }
}

/// Check a count field against the rows bound to its linked recarray
pub(crate) fn check_count(
    path: &SchemaPath,
    count: i64,
    rule: CountRule,
    rows: usize,
    period: Option<u32>,
) -> Result<(), DataError> {
    let ok = match rule {
        CountRule::Bound => count >= 0 && rows as i64 <= count,
        CountRule::Equal => rows as i64 == count,
    };
    if ok {
        return Ok(());
    }
    Err(DataError::CountMismatch {
        path: path.clone(),
        count_field: path.name().to_string(),
        count,
        rows,
        rule,
        period,
    })
}

/// Number of inline rows, None for external data
pub(crate) fn inline_rows(value: &FieldValue) -> Option<usize> {
    value.as_rows().map(<[_]>::len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_count() {
        let path = SchemaPath::field("gwf6", "rch", "dimensions", "maxbound");
        assert!(check_count(&path, 2, CountRule::Bound, 2, Some(1)).is_ok());
        assert!(check_count(&path, 3, CountRule::Bound, 1, Some(1)).is_ok());
        let err = check_count(&path, 1, CountRule::Bound, 2, Some(1)).unwrap_err();
        assert!(matches!(
            err,
            DataError::CountMismatch { count: 1, rows: 2, period: Some(1), .. }
        ));
        assert!(err.to_string().contains("maxbound"));
    }

    #[test]
    fn test_equal_count() {
        let path = SchemaPath::field("sim", "tdis", "dimensions", "nper");
        assert!(check_count(&path, 2, CountRule::Equal, 2, None).is_ok());
        assert!(check_count(&path, 3, CountRule::Equal, 2, None).is_err());
    }
}
