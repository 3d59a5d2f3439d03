//! Composable lookup filters over stored urls.

/// A conjunctive filter over url records.
///
/// Predicates combine with AND; the builder performs no I/O and is
/// interpreted by the repository that consumes it. A destination lookup
/// without [`UrlQuery::by_internal_id`] matches every record with that
/// presenter and action; when several records match, the first row in
/// storage-native order wins and no further ordering is guaranteed.
#[derive(Debug, Clone, Default)]
pub struct UrlQuery {
    pub(crate) path: Option<String>,
    pub(crate) presenter: Option<String>,
    pub(crate) action: Option<String>,
    pub(crate) internal_id: Option<String>,
    pub(crate) with_redirect_target: bool,
}

impl UrlQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn by_presenter(mut self, presenter: &str) -> Self {
        self.presenter = Some(presenter.to_string());
        self
    }

    pub fn by_action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    pub fn by_internal_id(mut self, internal_id: &str) -> Self {
        self.internal_id = Some(internal_id.to_string());
        self
    }

    /// Eagerly loads the record each match redirects to, one hop deep.
    pub fn with_redirect_target(mut self) -> Self {
        self.with_redirect_target = true;
        self
    }
}
