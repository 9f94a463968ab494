// Target configuration values — `<account>:<filterList>`.
//
// Several values may name the same account; their filter entries are
// concatenated so the account is still watched by a single task.

use thiserror::Error;

use crate::filter::{self, FilterList, ParseError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target \"{value}\" has no ':' between account and filter")]
    MissingSeparator { value: String },

    #[error("target \"{value}\" has an empty account")]
    EmptyAccount { value: String },

    #[error("invalid filter for @{account}: {source}")]
    Filter {
        account: String,
        #[source]
        source: ParseError,
    },
}

/// One configured account and the filters attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub account: String,
    pub filters: FilterList,
}

/// Split one configuration value into account and parsed filter list.
pub fn parse_target(value: &str) -> Result<(String, FilterList), TargetError> {
    let (account, filter_text) =
        value
            .split_once(':')
            .ok_or_else(|| TargetError::MissingSeparator {
                value: value.to_string(),
            })?;

    if account.is_empty() {
        return Err(TargetError::EmptyAccount {
            value: value.to_string(),
        });
    }

    let filters = filter::parse(filter_text).map_err(|source| TargetError::Filter {
        account: account.to_string(),
        source,
    })?;

    Ok((account.to_string(), filters))
}

/// Targets accumulated from configuration values, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: Vec<TargetSpec>,
}

impl TargetSet {
    /// Parse every value, failing on the first malformed one.
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Result<Self, TargetError> {
        let mut set = Self::default();
        for value in values {
            set.add(value.as_ref())?;
        }
        Ok(set)
    }

    /// Parse and merge one value.
    pub fn add(&mut self, value: &str) -> Result<(), TargetError> {
        let (account, filters) = parse_target(value)?;

        match self.targets.iter_mut().find(|t| t.account == account) {
            Some(existing) => existing.filters.extend(filters),
            None => self.targets.push(TargetSpec { account, filters }),
        }
        Ok(())
    }

    pub fn targets(&self) -> &[TargetSpec] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn into_targets(self) -> Vec<TargetSpec> {
        self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_splits_on_first_colon() {
        let (account, filters) = parse_target("alice:and(rt,not(photo))/qt").unwrap();
        assert_eq!(account, "alice");
        assert_eq!(filters.len(), 2);
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(
            parse_target("alice"),
            Err(TargetError::MissingSeparator {
                value: "alice".to_string()
            })
        );
    }

    #[test]
    fn test_empty_account() {
        assert!(matches!(
            parse_target(":photo"),
            Err(TargetError::EmptyAccount { .. })
        ));
    }

    #[test]
    fn test_filter_error_names_account() {
        let err = parse_target("bob:and()").unwrap_err();
        match err {
            TargetError::Filter { account, source } => {
                assert_eq!(account, "bob");
                assert!(matches!(source, ParseError::EmptyArgs { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_same_account_accumulates() {
        let set = TargetSet::from_values(&["alice:photo", "bob:rt", "alice:video/qt"]).unwrap();
        let targets = set.targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].account, "alice");
        assert_eq!(targets[0].filters.to_string(), "photo/video/qt");
        assert_eq!(targets[1].account, "bob");
    }

    #[test]
    fn test_empty_filter_text_rejected() {
        assert!(matches!(
            parse_target("alice:"),
            Err(TargetError::Filter {
                source: ParseError::EmptyExpression,
                ..
            })
        ));
    }
}
