//! Collectors for route parameters and their filters.
//!
//! Both keep insertion order, which is also the order used when the pairs
//! are serialized onto a url record.

use crate::error::Error;

/// Accumulates parameter name → filter name assignments for a url.
///
/// A parameter can carry at most one filter; registering a second filter for
/// the same parameter is rejected.
#[derive(Debug, Clone, Default)]
pub struct FilterCollector {
    filters: Vec<(String, String)>,
}

impl FilterCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `filter_name` to every parameter in `affected_parameters`.
    ///
    /// Duplicate entries within `affected_parameters` are ignored; an empty
    /// list is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when one of the parameters already has
    /// a filter assigned.
    pub fn add_filter(
        &mut self,
        filter_name: &str,
        affected_parameters: &[&str],
    ) -> Result<(), Error> {
        let mut seen: Vec<&str> = Vec::with_capacity(affected_parameters.len());
        for parameter_name in affected_parameters {
            if seen.contains(parameter_name) {
                continue;
            }
            seen.push(parameter_name);

            if self.filters.iter().any(|(p, _)| p == parameter_name) {
                return Err(Error::validation(format!(
                    "parameter {parameter_name:?} already has a filter assigned"
                )));
            }
            self.filters
                .push((parameter_name.to_string(), filter_name.to_string()));
        }

        Ok(())
    }

    /// Drops every assignment of `filter_name`, whatever parameter it is on.
    pub fn remove_filter(&mut self, filter_name: &str) {
        self.filters.retain(|(_, f)| f != filter_name);
    }

    /// Drops the filter assigned to `parameter_name`, if any.
    pub fn remove_filter_from_parameter(&mut self, parameter_name: &str) {
        self.filters.retain(|(p, _)| p != parameter_name);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    /// Consumes the collector, yielding the ordered parameter → filter pairs.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.filters
    }
}

/// Accumulates internal parameter name → value pairs for a url.
///
/// Re-adding a name overwrites its value in place.
#[derive(Debug, Clone, Default)]
pub struct ParametersCollector {
    parameters: Vec<(String, String)>,
}

impl ParametersCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parameter(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.parameters.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value.to_string();
        } else {
            self.parameters.push((name.to_string(), value.to_string()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// Consumes the collector, yielding the ordered name → value pairs.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.parameters
    }
}
