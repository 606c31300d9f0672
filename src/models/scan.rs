/// A single decoded QR payload and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Decoded payload text.
    pub content: String,
    /// Provenance: the image URL, a data URI snapshot, or a local file path.
    pub source: String,
    /// Human-readable descriptor (alt text, file name, or a fallback).
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStatus {
    #[default]
    Idle,
    Scanning,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Create,
    Scan,
    History,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Create, Tab::Scan, Tab::History, Tab::Settings];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Create => "Create",
            Tab::Scan => "Scan",
            Tab::History => "History",
            Tab::Settings => "Settings",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Tab {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}
