use crate::policy::PolicySet;
use serde::{Deserialize, Serialize};

/// The slice of the page aggregate this core reads when attaching a
/// collection: ownership linkage plus the page's current policies. The
/// core never writes back to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRef {
    pub id: String,
    pub application_id: String,
    #[serde(default)]
    pub policies: PolicySet,
}

impl PageRef {
    pub fn new(id: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            application_id: application_id.into(),
            policies: PolicySet::new(),
        }
    }

    pub fn with_policies(mut self, policies: PolicySet) -> Self {
        self.policies = policies;
        self
    }
}
