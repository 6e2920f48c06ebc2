use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDecision {
    pub decision_title: String,
    pub decision_content: Option<String>,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKeyDecision {
    pub decision_title: String,
    pub decision_content: Option<String>,
}
