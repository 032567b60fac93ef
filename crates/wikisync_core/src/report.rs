use serde::Serialize;

/// Outcome for one page in a sync pass. `action` is one of `updated`,
/// `created`, `deleted`, `purged`, `unchanged`, `skipped`, `error`, or a
/// `would_*` form in dry-run mode.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageResult {
    pub title: String,
    pub action: String,
    pub detail: Option<String>,
}

impl PageResult {
    pub fn new(title: impl Into<String>, action: &str) -> Self {
        Self {
            title: title.into(),
            action: action.to_string(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
