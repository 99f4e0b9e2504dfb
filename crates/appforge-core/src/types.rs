use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ViewMode
// ---------------------------------------------------------------------------

/// Selects which half of a dual-version document an operation targets:
/// the editable draft or the live published version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Unpublished,
    Published,
}

impl ViewMode {
    /// The transport layer sends view mode as a boolean flag where
    /// `true` means the published view.
    pub fn from_flag(published: bool) -> Self {
        if published {
            ViewMode::Published
        } else {
            ViewMode::Unpublished
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Unpublished => "unpublished",
            ViewMode::Published => "published",
        }
    }
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Unpublished
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViewMode {
    type Err = crate::error::CollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpublished" | "false" => Ok(ViewMode::Unpublished),
            "published" | "true" => Ok(ViewMode::Published),
            _ => Err(crate::error::CollectionError::Validation(format!(
                "invalid view mode: {s}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SortField / SortSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

/// Listing order for store queries. Equal keys always fall back to id
/// order, so listings are stable across repeated reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub ascending: bool,
}

impl SortSpec {
    pub fn by(field: SortField) -> Self {
        Self {
            field,
            ascending: true,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            ascending: false,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec::by(SortField::Name)
    }
}

// ---------------------------------------------------------------------------
// AccessContext
// ---------------------------------------------------------------------------

/// The caller's identity, passed explicitly to every permission-scoped
/// operation. There is no ambient or thread-local permission state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    pub subject: String,
}

impl AccessContext {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}
