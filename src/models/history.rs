use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub content: String,
    pub kind: HistoryKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Created,
    Scanned,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Created => "created",
            HistoryKind::Scanned => "scanned",
        }
    }

    /// Parse the database representation. Unknown values map to Scanned so a
    /// hand-edited row never breaks loading.
    pub fn from_db(s: &str) -> Self {
        match s {
            "created" => HistoryKind::Created,
            _ => HistoryKind::Scanned,
        }
    }
}
