use std::path::Path;

use uuid::Uuid;

use crate::collection::ActionCollection;
use crate::db::CollectionDb;
use crate::error::{BatchFailure, CollectionError, Result};
use crate::policy::PermissionKind;
use crate::types::{AccessContext, SortField, SortSpec, ViewMode};

// ---------------------------------------------------------------------------
// CollectionStore
// ---------------------------------------------------------------------------

/// Permission-scoped CRUD over action collections.
///
/// Every read takes the caller's `AccessContext` and the permission kind
/// the operation requires; documents the caller cannot see are reported as
/// absent, never as forbidden, so existence does not leak. The store holds
/// no locks and keeps no cache — concurrent saves to the same id are
/// last-writer-wins at whole-document granularity.
pub struct CollectionStore {
    db: CollectionDb,
}

impl CollectionStore {
    pub fn new(db: CollectionDb) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(CollectionDb::open(path)?))
    }

    pub fn from_config(config: &crate::config::CoreConfig) -> Result<Self> {
        Self::open(&config.store.path)
    }

    fn visible(collection: &ActionCollection, kind: PermissionKind, ctx: &AccessContext) -> bool {
        collection.policies.grants(kind, &ctx.subject)
    }

    // ---------------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------------

    pub fn find_by_id(
        &self,
        id: &str,
        kind: PermissionKind,
        ctx: &AccessContext,
    ) -> Result<ActionCollection> {
        match self.db.get(id)? {
            Some(c) if Self::visible(&c, kind, ctx) => Ok(c),
            // absent and unauthorized are indistinguishable on purpose
            _ => Err(CollectionError::NotFound(id.to_string())),
        }
    }

    pub fn find_all_by_application(
        &self,
        application_id: &str,
        view: ViewMode,
        kind: PermissionKind,
        ctx: &AccessContext,
        sort: &SortSpec,
    ) -> Result<Vec<ActionCollection>> {
        let mut found: Vec<ActionCollection> = self
            .db
            .scan_all()?
            .into_iter()
            .filter(|c| c.application_id == application_id)
            .filter(|c| c.has_view(view))
            .filter(|c| Self::visible(c, kind, ctx))
            .collect();
        sort_collections(&mut found, view, sort);
        Ok(found)
    }

    pub fn find_by_page_id(
        &self,
        page_id: &str,
        kind: PermissionKind,
        ctx: &AccessContext,
    ) -> Result<Vec<ActionCollection>> {
        let mut found: Vec<ActionCollection> = self
            .db
            .scan_all()?
            .into_iter()
            .filter(|c| c.page_id == page_id)
            .filter(|c| Self::visible(c, kind, ctx))
            .collect();
        sort_collections(&mut found, ViewMode::Unpublished, &SortSpec::default());
        Ok(found)
    }

    // ---------------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------------

    /// Upsert one collection. Assigns an id on first save; afterwards the
    /// stored document is replaced wholesale.
    pub fn save(&self, mut collection: ActionCollection) -> Result<ActionCollection> {
        if collection.unpublished.name.trim().is_empty() {
            return Err(CollectionError::Validation(
                "collection name must not be empty".into(),
            ));
        }
        if collection.id.is_none() {
            collection.id = Some(Uuid::new_v4().to_string());
        }
        collection.updated_at = chrono::Utc::now();
        self.db.put(&collection)?;
        Ok(collection)
    }

    /// Best-effort bulk upsert, used by the publish cycle. Not atomic: on
    /// any per-document failure the whole call fails with `PartialBatch`,
    /// reporting which documents were written and why the rest were not.
    pub fn save_all(&self, collections: Vec<ActionCollection>) -> Result<Vec<ActionCollection>> {
        let mut saved = Vec::new();
        let mut failed = Vec::new();
        for collection in collections {
            let key = collection.key();
            match self.save(collection) {
                Ok(c) => saved.push(c),
                Err(e) => failed.push(BatchFailure {
                    key,
                    reason: e.to_string(),
                }),
            }
        }
        if failed.is_empty() {
            Ok(saved)
        } else {
            tracing::warn!(
                saved = saved.len(),
                failed = failed.len(),
                "bulk save partially failed"
            );
            Err(CollectionError::PartialBatch {
                saved: saved.into_iter().filter_map(|c| c.id).collect(),
                failed,
            })
        }
    }

    /// Physical removal. The service layer decides between this and a
    /// soft delete marker.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.db.remove(id)
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

fn sort_collections(collections: &mut [ActionCollection], view: ViewMode, sort: &SortSpec) {
    collections.sort_by(|a, b| {
        let ord = match sort.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => {
                let an = a.version(view).map(|v| v.name.as_str()).unwrap_or("");
                let bn = b.version(view).map(|v| v.name.as_str()).unwrap_or("");
                an.cmp(bn)
            }
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        let ord = if sort.ascending { ord } else { ord.reverse() };
        // stable listing order for equal keys
        ord.then_with(|| a.id.cmp(&b.id))
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionVersion;
    use crate::policy::PolicySet;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, CollectionStore) {
        let dir = TempDir::new().unwrap();
        let store = CollectionStore::open(&dir.path().join("test.redb")).unwrap();
        (dir, store)
    }

    fn readable_by(subject: &str) -> PolicySet {
        let mut p = PolicySet::new();
        p.grant(PermissionKind::ReadCollections, subject);
        p
    }

    fn collection(app: &str, page: &str, name: &str, subject: &str) -> ActionCollection {
        let mut c = ActionCollection::new(app, page, CollectionVersion::new(name));
        c.policies = readable_by(subject);
        c
    }

    #[test]
    fn save_assigns_id_once() {
        let (_dir, store) = open_tmp();
        let saved = store.save(collection("app1", "p1", "utils", "u1")).unwrap();
        let id = saved.id.clone().unwrap();

        let resaved = store.save(saved).unwrap();
        assert_eq!(resaved.id.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn unauthorized_lookup_reads_as_not_found() {
        let (_dir, store) = open_tmp();
        let saved = store.save(collection("app1", "p1", "utils", "u1")).unwrap();
        let id = saved.id.unwrap();

        let ctx = AccessContext::new("u1");
        assert!(store
            .find_by_id(&id, PermissionKind::ReadCollections, &ctx)
            .is_ok());

        let stranger = AccessContext::new("u2");
        match store.find_by_id(&id, PermissionKind::ReadCollections, &stranger) {
            Err(CollectionError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        match store.find_by_id("no-such-id", PermissionKind::ReadCollections, &stranger) {
            Err(CollectionError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn published_view_excludes_never_published_collections() {
        let (_dir, store) = open_tmp();
        let draft_only = collection("app1", "p1", "drafts", "u1");
        let mut live = collection("app1", "p1", "live", "u1");
        live.publish();

        store.save(draft_only).unwrap();
        store.save(live).unwrap();

        let ctx = AccessContext::new("u1");
        let sort = SortSpec::default();
        let published = store
            .find_all_by_application(
                "app1",
                ViewMode::Published,
                PermissionKind::ReadCollections,
                &ctx,
                &sort,
            )
            .unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].unpublished.name, "live");

        let drafts = store
            .find_all_by_application(
                "app1",
                ViewMode::Unpublished,
                PermissionKind::ReadCollections,
                &ctx,
                &sort,
            )
            .unwrap();
        assert_eq!(drafts.len(), 2);
    }

    #[test]
    fn listing_sorts_by_name_with_id_tie_break() {
        let (_dir, store) = open_tmp();
        for name in ["zeta", "alpha", "alpha"] {
            store.save(collection("app1", "p1", name, "u1")).unwrap();
        }

        let ctx = AccessContext::new("u1");
        let listed = store
            .find_all_by_application(
                "app1",
                ViewMode::Unpublished,
                PermissionKind::ReadCollections,
                &ctx,
                &SortSpec::default(),
            )
            .unwrap();
        let names: Vec<_> = listed.iter().map(|c| c.unpublished.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "alpha", "zeta"]);
        assert!(listed[0].id < listed[1].id);
    }

    #[test]
    fn save_all_reports_partial_failure() {
        let (_dir, store) = open_tmp();
        let good = collection("app1", "p1", "utils", "u1");
        let bad = collection("app1", "p1", "", "u1");

        match store.save_all(vec![good, bad]) {
            Err(CollectionError::PartialBatch { saved, failed }) => {
                assert_eq!(saved.len(), 1);
                assert_eq!(failed.len(), 1);
                assert!(failed[0].reason.contains("name"));
            }
            other => panic!("expected PartialBatch, got {other:?}"),
        }

        // the good half of the batch really was written
        let ctx = AccessContext::new("u1");
        let listed = store
            .find_by_page_id("p1", PermissionKind::ReadCollections, &ctx)
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
