//! Boundary validation for identifiers and free-text fields.
//!
//! Lengths count Unicode scalar values, not bytes.

use serde::{Deserialize, Serialize};

use crate::{Result, StoreError};

/// Length limits for user-supplied text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLimits {
    /// Block and alternative names.
    pub name_max: usize,
    /// Block, alternative and project descriptions.
    pub description_max: usize,
    pub project_name_max: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            name_max: 100,
            description_max: 1000,
            project_name_max: 32,
        }
    }
}

impl FieldLimits {
    /// A block or alternative name: 1 to `name_max` characters.
    pub fn name(&self, field: &'static str, value: &str) -> Result<String> {
        bounded(field, value, self.name_max)
    }

    /// A project name, trimmed: 1 to `project_name_max` characters.
    pub fn project_name(&self, value: &str) -> Result<String> {
        bounded("project name", value.trim(), self.project_name_max)
    }

    /// An optional description of at most `description_max` characters.
    /// Empty text clears the description.
    pub fn description(&self, value: Option<&str>) -> Result<Option<String>> {
        match value {
            None | Some("") => Ok(None),
            Some(text) => {
                let len = text.chars().count();
                if len > self.description_max {
                    return Err(StoreError::InvalidField {
                        field: "description",
                        reason: format!(
                            "{len} characters exceeds the limit of {}",
                            self.description_max
                        ),
                    });
                }
                Ok(Some(text.to_string()))
            }
        }
    }
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String> {
    let len = value.chars().count();
    if len == 0 {
        return Err(StoreError::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if len > max {
        return Err(StoreError::InvalidField {
            field,
            reason: format!("{len} characters exceeds the limit of {max}"),
        });
    }
    Ok(value.to_string())
}

/// Parse a canonical UUID identifier or report which field was malformed.
pub fn parse_id<T>(
    field: &'static str,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T> {
    parse(value).ok_or_else(|| StoreError::InvalidId {
        field,
        value: value.to_string(),
    })
}
