use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// PermissionKind
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    ManagePages,
    ReadPages,
    DeletePages,
    ManageCollections,
    ReadCollections,
    DeleteCollections,
    ExecuteCollections,
}

impl PermissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionKind::ManagePages => "manage_pages",
            PermissionKind::ReadPages => "read_pages",
            PermissionKind::DeletePages => "delete_pages",
            PermissionKind::ManageCollections => "manage_collections",
            PermissionKind::ReadCollections => "read_collections",
            PermissionKind::DeleteCollections => "delete_collections",
            PermissionKind::ExecuteCollections => "execute_collections",
        }
    }

    /// Collection-level analogs of a page-level permission. Kinds that are
    /// already collection-level have no analog and propagate nothing.
    fn collection_analogs(self) -> &'static [PermissionKind] {
        match self {
            PermissionKind::ManagePages => &[PermissionKind::ManageCollections],
            PermissionKind::ReadPages => &[
                PermissionKind::ReadCollections,
                PermissionKind::ExecuteCollections,
            ],
            PermissionKind::DeletePages => &[PermissionKind::DeleteCollections],
            _ => &[],
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PolicySet
// ---------------------------------------------------------------------------

/// Mapping from permission kind to the set of subjects granted it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet(BTreeMap<PermissionKind, BTreeSet<String>>);

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, kind: PermissionKind, subject: impl Into<String>) {
        self.0.entry(kind).or_default().insert(subject.into());
    }

    pub fn grants(&self, kind: PermissionKind, subject: &str) -> bool {
        self.0
            .get(&kind)
            .map(|subjects| subjects.contains(subject))
            .unwrap_or(false)
    }

    pub fn subjects(&self, kind: PermissionKind) -> Option<&BTreeSet<String>> {
        self.0.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PermissionKind, &BTreeSet<String>)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

// ---------------------------------------------------------------------------
// Policy propagation
// ---------------------------------------------------------------------------

/// Derive a collection's policy set from its owning page's policies.
///
/// Pure and total: each page-level kind maps to its collection-level
/// analog(s) with the subject sets preserved; an empty input yields an
/// empty output. The caller attaches the result to the collection before
/// persisting — policies are never recomputed on read.
pub fn derive_collection_policies(page_policies: &PolicySet) -> PolicySet {
    let mut derived = PolicySet::new();
    for (kind, subjects) in page_policies.iter() {
        for analog in kind.collection_analogs() {
            for subject in subjects {
                derived.grant(*analog, subject.clone());
            }
        }
    }
    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_policies() -> PolicySet {
        let mut p = PolicySet::new();
        p.grant(PermissionKind::ManagePages, "u1");
        p.grant(PermissionKind::ReadPages, "u1");
        p.grant(PermissionKind::ReadPages, "u2");
        p
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(derive_collection_policies(&PolicySet::new()).is_empty());
    }

    #[test]
    fn page_kinds_map_to_collection_analogs_preserving_subjects() {
        let derived = derive_collection_policies(&page_policies());

        assert!(derived.grants(PermissionKind::ManageCollections, "u1"));
        assert!(!derived.grants(PermissionKind::ManageCollections, "u2"));

        // read on the page grants both read and execute on the collection
        for kind in [
            PermissionKind::ReadCollections,
            PermissionKind::ExecuteCollections,
        ] {
            assert!(derived.grants(kind, "u1"));
            assert!(derived.grants(kind, "u2"));
        }
    }

    #[test]
    fn collection_level_kinds_in_input_are_ignored() {
        let mut p = PolicySet::new();
        p.grant(PermissionKind::ManageCollections, "u1");
        assert!(derive_collection_policies(&p).is_empty());
    }

    #[test]
    fn propagation_is_pure() {
        let p = page_policies();
        assert_eq!(
            derive_collection_policies(&p),
            derive_collection_policies(&p)
        );
    }
}
