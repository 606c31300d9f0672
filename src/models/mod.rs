mod history;
mod scan;

pub use history::{HistoryEntry, HistoryKind};
pub use scan::{ScanResult, ScanStatus, Tab};
