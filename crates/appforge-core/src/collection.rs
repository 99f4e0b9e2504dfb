use crate::action::ActionSummary;
use crate::policy::PolicySet;
use crate::types::ViewMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// CollectionVersion
// ---------------------------------------------------------------------------

/// One half of a collection's dual-version document: the draft or the
/// published snapshot. Publishing replaces the published half with a copy
/// of the draft wholesale, so the two halves never share state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionVersion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub action_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CollectionVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_action: None,
            action_ids: BTreeSet::new(),
            deleted_at: None,
        }
    }

    pub fn with_actions<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// ActionCollection
// ---------------------------------------------------------------------------

/// Persisted entity. `unpublished` always exists after creation;
/// `published` stays absent until the first publish cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCollection {
    /// Assigned by the store on first save, immutable afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub application_id: String,
    pub page_id: String,
    pub unpublished: CollectionVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<CollectionVersion>,
    #[serde(default)]
    pub policies: PolicySet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActionCollection {
    pub fn new(
        application_id: impl Into<String>,
        page_id: impl Into<String>,
        unpublished: CollectionVersion,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            application_id: application_id.into(),
            page_id: page_id.into(),
            unpublished,
            published: None,
            policies: PolicySet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn version(&self, view: ViewMode) -> Option<&CollectionVersion> {
        match view {
            ViewMode::Unpublished => Some(&self.unpublished),
            ViewMode::Published => self.published.as_ref(),
        }
    }

    /// True when the collection has a live, non-deleted version for the
    /// given view. Listings filter on this.
    pub fn has_view(&self, view: ViewMode) -> bool {
        self.version(view)
            .map(|v| v.deleted_at.is_none())
            .unwrap_or(false)
    }

    /// Overwrite the published half with a snapshot of the draft. This is
    /// the per-document step of the application publish cycle; it is a
    /// whole-subdocument replace, never a field merge.
    pub fn publish(&mut self) {
        self.published = Some(self.unpublished.clone());
        self.updated_at = Utc::now();
    }

    /// Key used for error messages and batch reports before an id exists.
    pub fn key(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| self.unpublished.name.clone())
    }
}

// ---------------------------------------------------------------------------
// ActionCollectionDto
// ---------------------------------------------------------------------------

/// Flattened projection of exactly one version of a collection, shaped for
/// a single caller. Built fresh per read request; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCollectionDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub application_id: String,
    pub page_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub action_ids: BTreeSet<String>,
    /// Resolved, validity-filtered summaries; empty until populated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionSummary>,
    pub view_mode: ViewMode,
}
