//! Argument access for edit commands.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::foundation::error::{MediaError, MediaResult};

/// Named string arguments of one edit command invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditArgs {
    values: BTreeMap<String, String>,
}

impl EditArgs {
    /// No arguments set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name`. Blank values count as absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        let name = name.into();
        if value.trim().is_empty() {
            self.values.remove(&name);
        } else {
            self.values.insert(name, value);
        }
        self
    }

    /// Builder form of [`EditArgs::set`] that skips `None`.
    pub fn with(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        if let Some(v) = value {
            self.set(name, v);
        }
        self
    }

    /// The value of `name`, if set.
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The value of `name`, or `MissingArgument` carrying `description`.
    pub fn require(&self, name: &str, description: &str) -> MediaResult<&str> {
        self.optional(name)
            .ok_or_else(|| MediaError::missing_argument(name, description))
    }

    /// Parse `name` if present. A value that does not parse is a `Validation` error.
    pub fn parse<T>(&self, name: &str) -> MediaResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(name)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| {
                    MediaError::validation(format!("argument '{name}' = '{raw}': {e}"))
                })
            })
            .transpose()
    }

    /// Parse a required argument.
    pub fn parse_required<T>(&self, name: &str, description: &str) -> MediaResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.require(name, description)?;
        self.parse(name)?
            .ok_or_else(|| MediaError::missing_argument(name, description))
    }
}

#[cfg(test)]
#[path = "../tests/unit/command.rs"]
mod tests;
