use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_title: String,
    pub artifact_content: Option<String>,
    pub artifact_type: Option<String>,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArtifact {
    pub artifact_title: String,
    pub artifact_content: Option<String>,
    pub artifact_type: Option<String>,
}
