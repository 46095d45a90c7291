use serde::{Deserialize, Serialize};
use sitetree_scanner::PageVisit;
use uuid::Uuid;

/// One visited page.
///
/// Everything but `full_name` is fixed at creation. `full_name` is written by
/// breadcrumb resolution and read by the renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    pub label: String,
    pub alternate_labels: Vec<String>,
    pub url: String,
    pub parent_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) full_name: Option<String>,
}

impl PageRecord {
    /// The display label is the first candidate label, or empty when there is none.
    pub fn new(url: impl Into<String>, parent_url: impl Into<String>, alternate_labels: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: alternate_labels.first().cloned().unwrap_or_default(),
            alternate_labels,
            url: url.into(),
            parent_url: parent_url.into(),
            full_name: None,
        }
    }

    /// Placeholder record backing the tree root.
    pub fn synthetic_root() -> Self {
        Self::new("", "", Vec::new())
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }
}

impl From<PageVisit> for PageRecord {
    fn from(visit: PageVisit) -> Self {
        Self::new(visit.url, visit.parent_url, visit.labels)
    }
}
