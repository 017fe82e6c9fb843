use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCustomer {
    #[serde(rename = "得意先CD")]
    pub code: String,
    #[serde(rename = "得意先名")]
    pub name: String,
    #[serde(rename = "担当者")]
    pub staff: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignSummary {
    #[serde(rename = "デザイン依頼No")]
    pub request_no: Value,
    #[serde(rename = "デザイン名")]
    pub name: String,
    #[serde(rename = "デザイン種別")]
    pub kind: String,
    #[serde(rename = "デザイン進捗状況")]
    pub progress: String,
    #[serde(rename = "デザイン提案有無")]
    pub proposal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkbookFile {
    pub name: String,
    pub size: u64,
    pub modified: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageEntry {
    pub name: String,
    /// Relative to the design directory; the identifier the client sends back.
    pub path: String,
    pub folder: String,
    pub mtime: f64,
}

/// Body of the image list and search responses. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub images: Vec<ImageEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl ImageResults {
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }
}
