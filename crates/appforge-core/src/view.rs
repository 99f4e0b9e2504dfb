//! View resolution: projecting a dual-version collection document into the
//! single-version DTO a caller asked for, and filtering its nested action
//! references down to the ones valid in that view.
//!
//! Both steps are deterministic over their inputs and keep no state, so a
//! projection can be recomputed freely — `split_actions_by_view_mode`
//! applied twice yields the same DTO as applied once.

use crate::action::{ActionRecord, ActionSummary};
use crate::collection::{ActionCollection, ActionCollectionDto};
use crate::error::{CollectionError, Result};
use crate::types::ViewMode;

// ---------------------------------------------------------------------------
// project
// ---------------------------------------------------------------------------

/// Flatten `collection` into a DTO for the requested view.
///
/// Requesting the published view of a never-published collection fails with
/// `VersionUnavailable`; there is deliberately no fallback to the draft.
pub fn project(collection: &ActionCollection, view: ViewMode) -> Result<ActionCollectionDto> {
    let version = collection
        .version(view)
        .ok_or_else(|| CollectionError::VersionUnavailable(collection.key()))?;

    Ok(ActionCollectionDto {
        id: collection.id.clone(),
        application_id: collection.application_id.clone(),
        page_id: collection.page_id.clone(),
        name: version.name.clone(),
        default_action: version.default_action.clone(),
        action_ids: version.action_ids.clone(),
        actions: Vec::new(),
        view_mode: view,
    })
}

// ---------------------------------------------------------------------------
// split_actions_by_view_mode
// ---------------------------------------------------------------------------

/// Partition the page's candidate actions into the ones valid for this
/// DTO's view and the rest, keeping only the valid ones.
///
/// Valid means: referenced by the DTO, present and not soft-deleted in the
/// requested view, and (for the published view) actually published.
/// References that no longer resolve to any candidate are dropped without
/// error — dangling references are expected transiently while the page's
/// action list is being edited concurrently.
pub fn split_actions_by_view_mode(
    mut dto: ActionCollectionDto,
    candidates: &[ActionRecord],
    view: ViewMode,
) -> ActionCollectionDto {
    let mut kept = Vec::new();
    for action in candidates {
        if !dto.action_ids.contains(&action.id) || !action.is_valid_for(view) {
            continue;
        }
        // is_valid_for guarantees the version exists
        if let Some(version) = action.version(view) {
            kept.push(ActionSummary {
                id: action.id.clone(),
                name: version.name.clone(),
            });
        }
    }

    let resolved: usize = dto
        .action_ids
        .iter()
        .filter(|id| candidates.iter().any(|a| &a.id == *id))
        .count();
    let dangling = dto.action_ids.len() - resolved;
    if dangling > 0 {
        tracing::warn!(
            collection = %dto.name,
            view = %view,
            dangling,
            "dropping dangling action references from view"
        );
    }

    kept.sort_by(|a, b| a.id.cmp(&b.id));
    dto.actions = kept;
    dto
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionVersion;
    use chrono::Utc;

    fn collection_with(ids: &[&str]) -> ActionCollection {
        let mut c = ActionCollection::new(
            "app1",
            "p1",
            CollectionVersion::new("utils").with_actions(ids.iter().copied()),
        );
        c.id = Some("c1".into());
        c
    }

    #[test]
    fn project_selects_the_requested_version() {
        let mut collection = collection_with(&["a1", "a2"]);
        collection.publish();
        collection.unpublished.action_ids.remove("a2");

        let draft = project(&collection, ViewMode::Unpublished).unwrap();
        let live = project(&collection, ViewMode::Published).unwrap();
        assert_eq!(draft.action_ids.len(), 1);
        assert_eq!(live.action_ids.len(), 2);
        assert_eq!(draft.view_mode, ViewMode::Unpublished);
        assert_eq!(live.view_mode, ViewMode::Published);
    }

    #[test]
    fn project_published_fails_iff_never_published() {
        let mut collection = collection_with(&["a1"]);
        match project(&collection, ViewMode::Published) {
            Err(CollectionError::VersionUnavailable(key)) => assert_eq!(key, "c1"),
            other => panic!("expected VersionUnavailable, got {other:?}"),
        }

        collection.publish();
        assert!(project(&collection, ViewMode::Published).is_ok());
    }

    #[test]
    fn split_drops_dangling_references_silently() {
        let collection = collection_with(&["a1", "a2"]);
        let dto = project(&collection, ViewMode::Unpublished).unwrap();

        // a2 no longer exists on the page at all
        let candidates = vec![ActionRecord::new("a1", "p1", "run")];
        let dto = split_actions_by_view_mode(dto, &candidates, ViewMode::Unpublished);
        assert_eq!(dto.actions.len(), 1);
        assert_eq!(dto.actions[0].id, "a1");
    }

    #[test]
    fn split_for_published_view_requires_published_actions() {
        let mut collection = collection_with(&["a1", "a2"]);
        collection.publish();
        let dto = project(&collection, ViewMode::Published).unwrap();

        let mut a1 = ActionRecord::new("a1", "p1", "run");
        a1.published = Some(crate::action::ActionVersion::new("run"));
        let a2 = ActionRecord::new("a2", "p1", "cleanup");

        let dto = split_actions_by_view_mode(dto, &[a1, a2], ViewMode::Published);
        assert_eq!(dto.actions.len(), 1);
        assert_eq!(dto.actions[0].id, "a1");
    }

    #[test]
    fn split_excludes_soft_deleted_actions() {
        let collection = collection_with(&["a1", "a2"]);
        let dto = project(&collection, ViewMode::Unpublished).unwrap();

        let a1 = ActionRecord::new("a1", "p1", "run");
        let mut a2 = ActionRecord::new("a2", "p1", "cleanup");
        a2.unpublished.as_mut().unwrap().deleted_at = Some(Utc::now());

        let dto = split_actions_by_view_mode(dto, &[a1, a2], ViewMode::Unpublished);
        assert_eq!(dto.actions.len(), 1);
        assert_eq!(dto.actions[0].id, "a1");
    }

    #[test]
    fn split_is_idempotent() {
        let collection = collection_with(&["a1", "a2"]);
        let dto = project(&collection, ViewMode::Unpublished).unwrap();
        let candidates = vec![
            ActionRecord::new("a1", "p1", "run"),
            ActionRecord::new("a2", "p1", "cleanup"),
        ];

        let once = split_actions_by_view_mode(dto, &candidates, ViewMode::Unpublished);
        let twice =
            split_actions_by_view_mode(once.clone(), &candidates, ViewMode::Unpublished);
        assert_eq!(once, twice);
    }
}
