//! Resolution outcome descriptor.

use crate::domain::entities::{Destination, Url};

/// The immutable outcome of resolving a path or a destination.
///
/// Carries the canonical record at the end of the redirect chain: final
/// path, destination, internal id and the decoded parameter/filter pairs.
/// When the resolution started at a superseded record, the originally
/// queried path is kept in [`ResolvedUrl::redirected_from`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    path: String,
    destination: Destination,
    internal_id: Option<String>,
    parameters: Vec<(String, String)>,
    filters: Vec<(String, String)>,
    redirected_from: Option<String>,
}

impl ResolvedUrl {
    /// Builds the descriptor for a chain that terminated at `canonical`,
    /// having started at `origin_path`.
    pub(crate) fn from_canonical(origin_path: &str, canonical: &Url) -> Self {
        let redirected_from =
            (origin_path != canonical.path()).then(|| origin_path.to_string());

        Self {
            path: canonical.path().to_string(),
            destination: canonical.destination().clone(),
            internal_id: canonical.internal_id().map(str::to_string),
            parameters: canonical.parameters().to_vec(),
            filters: canonical.filters().to_vec(),
            redirected_from,
        }
    }

    /// Path of the canonical record.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn presenter(&self) -> &str {
        self.destination.presenter()
    }

    pub fn action(&self) -> &str {
        self.destination.action()
    }

    pub fn internal_id(&self) -> Option<&str> {
        self.internal_id.as_deref()
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    /// The originally queried path when it differs from the canonical one.
    pub fn redirected_from(&self) -> Option<&str> {
        self.redirected_from.as_deref()
    }

    /// True when resolution had to follow at least one redirect.
    pub fn is_redirected(&self) -> bool {
        self.redirected_from.is_some()
    }
}
