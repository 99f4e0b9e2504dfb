use crate::types::ViewMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActionVersion
// ---------------------------------------------------------------------------

/// One half of an action's draft/published duality, as supplied by the
/// action service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionVersion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ActionVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deleted_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionRecord
// ---------------------------------------------------------------------------

/// An executable action as the collection core consumes it from the action
/// service: an id, the owning page, and the two version halves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub id: String,
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublished: Option<ActionVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<ActionVersion>,
}

impl ActionRecord {
    pub fn new(id: impl Into<String>, page_id: impl Into<String>, name: &str) -> Self {
        Self {
            id: id.into(),
            page_id: page_id.into(),
            unpublished: Some(ActionVersion::new(name)),
            published: None,
        }
    }

    pub fn version(&self, view: ViewMode) -> Option<&ActionVersion> {
        match view {
            ViewMode::Unpublished => self.unpublished.as_ref(),
            ViewMode::Published => self.published.as_ref(),
        }
    }

    /// An action is valid for a view when that half exists and is not
    /// soft-deleted. The published view therefore requires the action to
    /// have actually been published.
    pub fn is_valid_for(&self, view: ViewMode) -> bool {
        self.version(view)
            .map(|v| v.deleted_at.is_none())
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// ActionSummary
// ---------------------------------------------------------------------------

/// What a collection DTO embeds per resolved action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSummary {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpublished_action_is_not_valid_for_published_view() {
        let action = ActionRecord::new("a1", "p1", "run");
        assert!(action.is_valid_for(ViewMode::Unpublished));
        assert!(!action.is_valid_for(ViewMode::Published));
    }

    #[test]
    fn soft_deleted_version_is_invalid() {
        let mut action = ActionRecord::new("a1", "p1", "run");
        action.unpublished.as_mut().unwrap().deleted_at = Some(Utc::now());
        assert!(!action.is_valid_for(ViewMode::Unpublished));
    }
}
