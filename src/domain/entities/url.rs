//! Url entity mapping a path to an application destination.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::entities::Destination;
use crate::error::Error;
use crate::utils::path_normalizer::normalize_path;

/// A persisted mapping between a url path and an application destination.
///
/// A record without an outgoing redirect target is canonical — the
/// authoritative mapping for its destination. When a record is superseded
/// its `redirect_to` reference is set; the record itself is never deleted
/// as part of that workflow.
///
/// Filters and internal parameters are kept in their serialized storage form
/// and decoded once on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Url {
    id: Option<i64>,
    path: String,
    destination: Destination,
    internal_id: Option<String>,
    redirect_to_id: Option<i64>,
    redirect_to: Option<Box<Url>>,
    filters_raw: Option<String>,
    parameters_raw: Option<String>,
    #[serde(skip)]
    filters: OnceLock<Vec<(String, String)>>,
    #[serde(skip)]
    parameters: OnceLock<Vec<(String, String)>>,
}

impl Url {
    /// Creates an unpersisted record with a normalized path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the path fails normalization.
    pub fn new(raw_path: &str, destination: Destination) -> Result<Self, Error> {
        let path = normalize_path(raw_path, false)?;

        Ok(Self {
            id: None,
            path,
            destination,
            internal_id: None,
            redirect_to_id: None,
            redirect_to: None,
            filters_raw: None,
            parameters_raw: None,
            filters: OnceLock::new(),
            parameters: OnceLock::new(),
        })
    }

    /// Rebuilds a record from its storage representation.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_storage(
        id: i64,
        path: String,
        destination: Destination,
        internal_id: Option<String>,
        redirect_to_id: Option<i64>,
        redirect_to: Option<Url>,
        filters_raw: Option<String>,
        parameters_raw: Option<String>,
    ) -> Self {
        Self {
            id: Some(id),
            path,
            destination,
            internal_id,
            redirect_to_id,
            redirect_to: redirect_to.map(Box::new),
            filters_raw,
            parameters_raw,
            filters: OnceLock::new(),
            parameters: OnceLock::new(),
        }
    }

    /*
     * --------------------
     * ----- SETTERS ------
     * --------------------
     */

    /// Replaces the path with the normalized form of `raw_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when normalization rejects the input.
    pub fn set_path(&mut self, raw_path: &str, lowercase: bool) -> Result<(), Error> {
        self.path = normalize_path(raw_path, lowercase)?;
        Ok(())
    }

    pub fn set_destination(&mut self, destination: Destination) {
        self.destination = destination;
    }

    pub fn set_internal_id(&mut self, internal_id: Option<String>) {
        self.internal_id = internal_id;
    }

    /// Points this record at `target`, superseding it.
    ///
    /// The target's identifier is captured alongside the loaded record; the
    /// linker requires both ends to be persisted before a link is stored.
    pub fn set_redirect_to(&mut self, target: Url) {
        self.redirect_to_id = target.id;
        self.redirect_to = Some(Box::new(target));
    }

    /// Replaces the filter pairs, re-serializing the storage form.
    pub fn set_filters(&mut self, pairs: Vec<(String, String)>) {
        self.filters_raw = serialize_pairs(&pairs);
        self.filters = OnceLock::from(pairs);
    }

    /// Replaces the internal parameter pairs, re-serializing the storage form.
    pub fn set_parameters(&mut self, pairs: Vec<(String, String)>) {
        self.parameters_raw = serialize_pairs(&pairs);
        self.parameters = OnceLock::from(pairs);
    }

    /*
     * --------------------
     * ----- GETTERS ------
     * --------------------
     */

    /// Storage-assigned identifier; `None` until the record is persisted.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

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

    /// Combined `Module:Presenter:action` form.
    pub fn destination_string(&self) -> String {
        self.destination.to_string()
    }

    /// Absolute destination form, `:Module:Presenter:action`.
    pub fn absolute_destination(&self) -> String {
        self.destination.absolute()
    }

    pub fn internal_id(&self) -> Option<&str> {
        self.internal_id.as_deref()
    }

    /// Identifier of the record this one redirects to, if superseded.
    pub fn redirect_to_id(&self) -> Option<i64> {
        self.redirect_to_id
    }

    /// The eagerly loaded redirect target, when the lookup requested it.
    pub fn redirect_to(&self) -> Option<&Url> {
        self.redirect_to.as_deref()
    }

    /// Identifier of the record one redirect hop away, falling back to this
    /// record's own identifier when it is canonical.
    pub fn current_id(&self) -> Option<i64> {
        match self.redirect_to_id {
            Some(id) => Some(id),
            None => self.id,
        }
    }

    /// Path of the loaded redirect target, or this record's own path when it
    /// is canonical. Only the stored hop is followed; deeper chains are
    /// walked by the resolver.
    pub fn current_path(&self) -> &str {
        match &self.redirect_to {
            Some(target) => target.path(),
            None => &self.path,
        }
    }

    /// Invalidation tag tied to this record's identity; available once
    /// persisted. Every cache entry derived from this record carries it.
    pub fn cache_tag(&self) -> Option<String> {
        self.id.map(|id| cache_tag_for(id))
    }

    /// Parameter name → filter name pairs, decoded once from storage form.
    pub fn filters(&self) -> &[(String, String)] {
        self.filters
            .get_or_init(|| deserialize_pairs(self.filters_raw.as_deref(), "filters"))
    }

    /// Internal parameter name → value pairs, decoded once from storage form.
    pub fn parameters(&self) -> &[(String, String)] {
        self.parameters
            .get_or_init(|| deserialize_pairs(self.parameters_raw.as_deref(), "parameters"))
    }

    pub(crate) fn filters_raw(&self) -> Option<&str> {
        self.filters_raw.as_deref()
    }

    pub(crate) fn parameters_raw(&self) -> Option<&str> {
        self.parameters_raw.as_deref()
    }

    pub(crate) fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub(crate) fn take_redirect_to(&mut self) -> Option<Box<Url>> {
        self.redirect_to.take()
    }

    pub(crate) fn set_redirect_target_id(&mut self, target_id: Option<i64>) {
        self.redirect_to_id = target_id;
        self.redirect_to = None;
    }

    /// Copy of this record without the loaded redirect target, keeping only
    /// the stored identifier reference.
    pub(crate) fn without_loaded_target(&self) -> Url {
        let mut detached = self.clone();
        detached.redirect_to = None;
        detached
    }
}

/// Invalidation tag for the record with the given identifier.
pub(crate) fn cache_tag_for(id: i64) -> String {
    format!("Url/{id}")
}

/// Pairs are stored as a JSON array of `[name, value]` entries so their
/// order survives the storage round-trip.
fn serialize_pairs(pairs: &[(String, String)]) -> Option<String> {
    if pairs.is_empty() {
        return None;
    }

    // An array of string pairs has no unserializable shapes.
    Some(serde_json::to_string(pairs).expect("string pairs always serialize"))
}

fn deserialize_pairs(raw: Option<&str>, field: &str) -> Vec<(String, String)> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_str(raw) {
        Ok(pairs) => pairs,
        Err(e) => {
            warn!("discarding undecodable {field} payload: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_view() -> Destination {
        Destination::from_parts("Article", "view").unwrap()
    }

    #[test]
    fn test_new_normalizes_path() {
        let url = Url::new("en/Articles in 2026", article_view()).unwrap();
        assert_eq!(url.path(), "en/Articles-in-2026");
        assert!(url.id().is_none());
        assert!(url.redirect_to_id().is_none());
    }

    #[test]
    fn test_cache_tag_requires_identity() {
        let url = Url::new("page", article_view()).unwrap();
        assert!(url.cache_tag().is_none());

        let url = url.with_id(7);
        assert_eq!(url.cache_tag().unwrap(), "Url/7");
    }

    #[test]
    fn test_current_path_follows_loaded_hop() {
        let canonical =
            Url::new("new-page", article_view()).unwrap().with_id(2);
        let mut old = Url::new("old-page", article_view()).unwrap().with_id(1);

        assert_eq!(old.current_path(), "old-page");
        assert_eq!(old.current_id(), Some(1));

        old.set_redirect_to(canonical);

        assert_eq!(old.current_path(), "new-page");
        assert_eq!(old.current_id(), Some(2));
        assert_eq!(old.redirect_to_id(), Some(2));
    }

    #[test]
    fn test_destination_accessors() {
        let url = Url::new("p", Destination::parse("Admin:Page:edit").unwrap()).unwrap();
        assert_eq!(url.presenter(), "Admin:Page");
        assert_eq!(url.action(), "edit");
        assert_eq!(url.destination_string(), "Admin:Page:edit");
        assert_eq!(url.absolute_destination(), ":Admin:Page:edit");
    }

    #[test]
    fn test_filters_round_trip_in_order() {
        let mut url = Url::new("p", article_view()).unwrap();
        url.set_filters(vec![
            ("year".to_string(), "intFilter".to_string()),
            ("slug".to_string(), "slugFilter".to_string()),
        ]);

        let raw = url.filters_raw().unwrap().to_string();
        let restored = Url::from_storage(
            1,
            "p".to_string(),
            article_view(),
            None,
            None,
            None,
            Some(raw),
            None,
        );

        assert_eq!(
            restored.filters(),
            &[
                ("year".to_string(), "intFilter".to_string()),
                ("slug".to_string(), "slugFilter".to_string()),
            ]
        );
    }

    #[test]
    fn test_lazy_decode_tolerates_garbage() {
        let url = Url::from_storage(
            1,
            "p".to_string(),
            article_view(),
            None,
            None,
            None,
            Some("{not json".to_string()),
            None,
        );

        assert!(url.filters().is_empty());
    }

    #[test]
    fn test_empty_pairs_clear_storage_form() {
        let mut url = Url::new("p", article_view()).unwrap();
        url.set_parameters(vec![("a".to_string(), "1".to_string())]);
        assert!(url.parameters_raw().is_some());

        url.set_parameters(Vec::new());
        assert!(url.parameters_raw().is_none());
        assert!(url.parameters().is_empty());
    }

    #[test]
    fn test_serde_round_trip_keeps_redirect_target() {
        let canonical = Url::new("new", article_view()).unwrap().with_id(2);
        let mut old = Url::new("old", article_view()).unwrap().with_id(1);
        old.set_redirect_to(canonical);

        let payload = serde_json::to_string(&old).unwrap();
        let restored: Url = serde_json::from_str(&payload).unwrap();

        assert_eq!(restored.id(), Some(1));
        assert_eq!(restored.redirect_to().unwrap().path(), "new");
        assert_eq!(restored.current_path(), "new");
    }
}
