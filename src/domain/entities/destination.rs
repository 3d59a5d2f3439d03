//! Destination identifier parsing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Compiled grammar for destination strings: `((Module:)*Presenter):action`.
static DESTINATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<module_presenter>(?:[A-Z][a-zA-Z]*:)*[A-Z][a-zA-Z]*):(?P<action>[a-z][a-zA-Z]*)$")
        .expect("destination grammar must compile")
});

/// A parsed application destination.
///
/// The presenter part is one or more `CamelCase` segments joined by `:`,
/// each starting upper-case; the action starts lower-case. Construction
/// validates against the grammar — there is no partial acceptance and no
/// silent correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    module_presenter: String,
    action: String,
}

impl Destination {
    /// Parses a combined `Module:Presenter:action` string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDestinationFormat`] when the grammar does not
    /// match, e.g. a lower-case-leading presenter segment or an empty action.
    pub fn parse(destination: &str) -> Result<Self, Error> {
        let captures = DESTINATION_REGEX.captures(destination).ok_or_else(|| {
            Error::InvalidDestinationFormat {
                destination: destination.to_string(),
            }
        })?;

        Ok(Self {
            module_presenter: captures["module_presenter"].to_string(),
            action: captures["action"].to_string(),
        })
    }

    /// Builds a destination from separate presenter and action parts.
    ///
    /// # Errors
    ///
    /// Same validation as [`Destination::parse`].
    pub fn from_parts(presenter: &str, action: &str) -> Result<Self, Error> {
        Self::parse(&format!("{presenter}:{action}"))
    }

    /// Reassembles a destination from columns already validated at write
    /// time. Storage round-trips must not re-run the grammar: historic rows
    /// stay readable even if the grammar tightens later.
    pub(crate) fn from_storage_parts(module_presenter: String, action: String) -> Self {
        Self {
            module_presenter,
            action,
        }
    }

    /// The `Module:...:Presenter` part.
    pub fn presenter(&self) -> &str {
        &self.module_presenter
    }

    /// The `action` part.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Absolute form understood by application routers: `:Module:Presenter:action`.
    pub fn absolute(&self) -> String {
        format!(":{}:{}", self.module_presenter, self.action)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module_presenter, self.action)
    }
}
