use std::collections::HashMap;

use chrono::Utc;

use crate::action::ActionRecord;
use crate::collection::{ActionCollection, ActionCollectionDto, CollectionVersion};
use crate::error::{CollectionError, Result};
use crate::page::PageRef;
use crate::policy::{derive_collection_policies, PermissionKind};
use crate::store::CollectionStore;
use crate::types::{AccessContext, SortSpec, ViewMode};
use crate::view;

// ---------------------------------------------------------------------------
// ActionSource
// ---------------------------------------------------------------------------

/// Seam to the external action service: supplies the candidate actions of
/// a page for view splitting, and resolves individual references during
/// write validation.
pub trait ActionSource {
    fn actions_for_page(&self, page_id: &str) -> Result<Vec<ActionRecord>>;
    fn find_action(&self, id: &str) -> Result<Option<ActionRecord>>;
}

// ---------------------------------------------------------------------------
// CollectionFilter
// ---------------------------------------------------------------------------

/// Listing scope, resolved from the transport layer's query params.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionFilter {
    pub application_id: Option<String>,
    pub page_id: Option<String>,
    pub view_mode: Option<ViewMode>,
}

impl CollectionFilter {
    pub fn by_application(application_id: impl Into<String>) -> Self {
        Self {
            application_id: Some(application_id.into()),
            ..Self::default()
        }
    }

    pub fn by_page(page_id: impl Into<String>) -> Self {
        Self {
            page_id: Some(page_id.into()),
            ..Self::default()
        }
    }

    /// Read `applicationId`, `pageId` and the `viewMode` flag out of a
    /// query-param map. Unknown keys are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            application_id: params.get("applicationId").cloned(),
            page_id: params.get("pageId").cloned(),
            view_mode: params.get("viewMode").and_then(|v| v.parse().ok()),
        }
    }
}

// ---------------------------------------------------------------------------
// CollectionService
// ---------------------------------------------------------------------------

/// Orchestrates the store adapter, the view resolver and policy
/// propagation. Holds no per-request state; every operation is handed the
/// caller's access context explicitly.
pub struct CollectionService {
    store: CollectionStore,
    actions: Box<dyn ActionSource>,
    sort: SortSpec,
}

impl CollectionService {
    pub fn new(store: CollectionStore, actions: Box<dyn ActionSource>) -> Self {
        Self {
            store,
            actions,
            sort: SortSpec::default(),
        }
    }

    /// Build the service from a loaded config: opens the store at the
    /// configured path and takes the configured listing order.
    pub fn from_config(
        config: &crate::config::CoreConfig,
        actions: Box<dyn ActionSource>,
    ) -> Result<Self> {
        Ok(Self {
            store: CollectionStore::from_config(config)?,
            actions,
            sort: config.listing.sort_spec(),
        })
    }

    /// Every reference that still resolves must resolve to `page_id`.
    /// Unresolvable references pass: they are transient danglers that the
    /// view resolver drops on read.
    fn validate_action_refs(&self, dto: &ActionCollectionDto, page_id: &str) -> Result<()> {
        for action_id in &dto.action_ids {
            if let Some(action) = self.actions.find_action(action_id)? {
                if action.page_id != page_id {
                    return Err(CollectionError::Validation(format!(
                        "action {} belongs to page {}, not {}",
                        action_id, action.page_id, page_id
                    )));
                }
            }
        }
        Ok(())
    }

    fn draft_from_dto(dto: &ActionCollectionDto) -> CollectionVersion {
        let mut version = CollectionVersion::new(dto.name.clone());
        version.action_ids = dto.action_ids.clone();
        // a default action that is not part of the version is meaningless
        version.default_action = dto
            .default_action
            .clone()
            .filter(|d| version.action_ids.contains(d));
        version
    }

    // ---------------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------------

    /// Create a collection on `page` from a draft edit. Derives the
    /// collection's policies from the page and persists the draft half
    /// only; the published half stays absent until the first publish.
    pub fn create(&self, dto: ActionCollectionDto, page: &PageRef) -> Result<ActionCollectionDto> {
        if dto.page_id != page.id {
            return Err(CollectionError::Validation(format!(
                "dto targets page {}, attach target is {}",
                dto.page_id, page.id
            )));
        }
        self.validate_action_refs(&dto, &page.id)?;

        let mut collection =
            ActionCollection::new(&page.application_id, &page.id, Self::draft_from_dto(&dto));
        collection.policies = derive_collection_policies(&page.policies);

        let saved = self.store.save(collection)?;
        tracing::debug!(id = ?saved.id, page = %page.id, "created action collection");
        let projected = view::project(&saved, ViewMode::Unpublished)?;
        self.populate_collection_by_view_mode(projected, ViewMode::Unpublished)
    }

    /// Merge a draft edit into the unpublished half. Direct edits never
    /// touch the published half.
    pub fn update(
        &self,
        id: &str,
        dto: ActionCollectionDto,
        ctx: &AccessContext,
    ) -> Result<ActionCollectionDto> {
        let mut collection =
            self.store
                .find_by_id(id, PermissionKind::ManageCollections, ctx)?;
        self.validate_action_refs(&dto, &collection.page_id)?;

        collection.unpublished = Self::draft_from_dto(&dto);
        let saved = self.store.save(collection)?;
        tracing::debug!(id = %id, "updated draft collection");
        let projected = view::project(&saved, ViewMode::Unpublished)?;
        self.populate_collection_by_view_mode(projected, ViewMode::Unpublished)
    }

    /// Delete a collection from the draft. Never-published collections are
    /// removed physically; otherwise the draft is only marked deleted and
    /// the document survives until the publish cycle drops the published
    /// half too.
    pub fn delete_unpublished(&self, id: &str, ctx: &AccessContext) -> Result<ActionCollectionDto> {
        let mut collection =
            self.store
                .find_by_id(id, PermissionKind::DeleteCollections, ctx)?;

        if collection.published.is_none() {
            let dto = view::project(&collection, ViewMode::Unpublished)?;
            self.store.delete(id)?;
            tracing::debug!(id = %id, "physically deleted never-published collection");
            return Ok(dto);
        }

        collection.unpublished.deleted_at = Some(Utc::now());
        let saved = self.store.save(collection)?;
        tracing::debug!(id = %id, "marked draft deleted, published half retained");
        view::project(&saved, ViewMode::Unpublished)
    }

    /// Re-derive the collection's policies from the page's current policy
    /// set and persist them. Must be re-invoked whenever the page's
    /// policies change; propagation is never recomputed on read.
    pub fn attach_to_page(
        &self,
        collection_id: &str,
        page: &PageRef,
        ctx: &AccessContext,
    ) -> Result<ActionCollection> {
        let mut collection =
            self.store
                .find_by_id(collection_id, PermissionKind::ManageCollections, ctx)?;
        collection.policies = derive_collection_policies(&page.policies);
        self.store.save(collection)
    }

    /// Publish-cycle surface: persist a collection the external cycle has
    /// already reshaped (e.g. copied draft over published).
    pub fn save(&self, collection: ActionCollection) -> Result<ActionCollection> {
        self.store.save(collection)
    }

    /// Publish-cycle surface: best-effort bulk persist with partial
    /// failure reporting.
    pub fn save_all(&self, collections: Vec<ActionCollection>) -> Result<Vec<ActionCollection>> {
        self.store.save_all(collections)
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
        self.store.find_by_id(id, kind, ctx)
    }

    pub fn find_dto_by_id_and_view_mode(
        &self,
        id: &str,
        view: ViewMode,
        kind: PermissionKind,
        ctx: &AccessContext,
    ) -> Result<ActionCollectionDto> {
        let collection = self.store.find_by_id(id, kind, ctx)?;
        view::project(&collection, view)
    }

    /// Unpopulated listings: one projected DTO per visible collection in
    /// the filter's scope that has the requested view.
    pub fn get_collections_by_view_mode(
        &self,
        filter: &CollectionFilter,
        view: ViewMode,
        ctx: &AccessContext,
    ) -> Result<Vec<ActionCollectionDto>> {
        let collections = self.resolve_scope(filter, view, ctx)?;
        collections
            .iter()
            .map(|c| view::project(c, view))
            .collect()
    }

    /// Populated listings: as above, with each DTO's action references
    /// resolved and filtered for the view.
    pub fn get_populated_collections_by_view_mode(
        &self,
        filter: &CollectionFilter,
        view: ViewMode,
        ctx: &AccessContext,
    ) -> Result<Vec<ActionCollectionDto>> {
        self.get_collections_by_view_mode(filter, view, ctx)?
            .into_iter()
            .map(|dto| self.populate_collection_by_view_mode(dto, view))
            .collect()
    }

    /// Resolve the DTO's action references against the owning page's
    /// current action list and keep the ones valid for the view.
    pub fn populate_collection_by_view_mode(
        &self,
        dto: ActionCollectionDto,
        view: ViewMode,
    ) -> Result<ActionCollectionDto> {
        let candidates = self.actions.actions_for_page(&dto.page_id)?;
        Ok(view::split_actions_by_view_mode(dto, &candidates, view))
    }

    fn resolve_scope(
        &self,
        filter: &CollectionFilter,
        view: ViewMode,
        ctx: &AccessContext,
    ) -> Result<Vec<ActionCollection>> {
        if let Some(page_id) = &filter.page_id {
            let found = self
                .store
                .find_by_page_id(page_id, PermissionKind::ReadCollections, ctx)?;
            return Ok(found.into_iter().filter(|c| c.has_view(view)).collect());
        }
        if let Some(application_id) = &filter.application_id {
            return self.store.find_all_by_application(
                application_id,
                view,
                PermissionKind::ReadCollections,
                ctx,
                &self.sort,
            );
        }
        Err(CollectionError::Validation(
            "filter must name an application or a page".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
