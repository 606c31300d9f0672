use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use qrcode::QrCode;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{HistoryEntry, HistoryKind, ScanResult, ScanStatus, Tab};
use crate::qr;
use crate::scan::{scan_image_file, PageScanner};
use crate::tui::AppAction;

const SPINNER_FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const COPIED_FLASH: Duration = Duration::from_secs(2);

// Message for a completed page scan
pub struct ScanOutcome {
    pub results: Vec<ScanResult>,
}

pub struct GeneratedCode {
    pub content: String,
    pub rendered: String,
    code: QrCode,
}

pub struct App {
    // Data
    pub history: Vec<HistoryEntry>,
    pub scan_results: Vec<ScanResult>,
    pub generated: Option<GeneratedCode>,

    // UI State
    pub active_tab: Tab,
    pub selected_index: usize,
    pub show_help: bool,
    pub content_input_active: bool,
    pub content_input: String,
    pub url_input_active: bool,
    pub url_input: String,
    pub file_input_active: bool,
    pub file_input: String,
    pub status_line: Option<String>,
    copied_at: Option<Instant>,
    spinner_frame: usize,

    // Async state
    pub scan_status: ScanStatus,
    scan_rx: mpsc::Receiver<ScanOutcome>,
    scan_tx: mpsc::Sender<ScanOutcome>,

    // Services
    pub repository: Repository,
    scanner: Arc<PageScanner>,
    pub config: Config,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        let scanner = Arc::new(PageScanner::new());

        let history = repository.get_all_entries().await?;

        let (scan_tx, scan_rx) = mpsc::channel(1);

        Ok(Self {
            history,
            scan_results: Vec::new(),
            generated: None,
            active_tab: Tab::default(),
            selected_index: 0,
            show_help: false,
            content_input_active: false,
            content_input: String::new(),
            url_input_active: false,
            url_input: String::new(),
            file_input_active: false,
            file_input: String::new(),
            status_line: None,
            copied_at: None,
            spinner_frame: 0,
            scan_status: ScanStatus::default(),
            scan_rx,
            scan_tx,
            repository,
            scanner,
            config: config.clone(),
        })
    }

    pub fn selected_entry(&self) -> Option<&HistoryEntry> {
        self.history.get(self.selected_index)
    }

    pub fn selected_scan_result(&self) -> Option<&ScanResult> {
        self.scan_results.get(self.selected_index)
    }

    fn current_list_len(&self) -> usize {
        match self.active_tab {
            Tab::History => self.history.len(),
            Tab::Scan => self.scan_results.len(),
            _ => 0,
        }
    }

    pub fn spinner(&self) -> char {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    pub fn tick_spinner(&mut self) {
        if self.scan_status == ScanStatus::Scanning {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    pub fn is_copied(&self) -> bool {
        self.copied_at
            .map(|at| at.elapsed() < COPIED_FLASH)
            .unwrap_or(false)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::NextTab => {
                self.active_tab = self.active_tab.next();
                self.selected_index = 0;
                self.status_line = None;
            }

            AppAction::PrevTab => {
                self.active_tab = self.active_tab.prev();
                self.selected_index = 0;
                self.status_line = None;
            }

            AppAction::MoveUp => {
                if self.current_list_len() > 0 && self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }

            AppAction::MoveDown => {
                let len = self.current_list_len();
                if len > 0 && self.selected_index < len - 1 {
                    self.selected_index += 1;
                }
            }

            AppAction::EditContent => {
                self.content_input_active = true;
                self.content_input = self
                    .generated
                    .as_ref()
                    .map(|g| g.content.clone())
                    .unwrap_or_default();
            }

            AppAction::CopyContent => {
                if let Some(text) = self.copyable_content() {
                    self.copy_to_clipboard(&text);
                }
            }

            AppAction::SavePng => {
                if let Some(generated) = &self.generated {
                    match qr::save_png(&generated.code, Path::new("qrcode.png")) {
                        Ok(()) => self.status_line = Some("Saved qrcode.png".to_string()),
                        Err(e) => {
                            tracing::warn!("Failed to save PNG: {}", e);
                            self.status_line = Some("Failed to save qrcode.png".to_string());
                        }
                    }
                }
            }

            AppAction::ScanPage => {
                if self.scan_status != ScanStatus::Scanning {
                    self.active_tab = Tab::Scan;
                    self.url_input_active = true;
                    self.url_input.clear();
                }
            }

            AppAction::ScanFile => {
                if self.scan_status != ScanStatus::Scanning {
                    self.active_tab = Tab::Scan;
                    self.file_input_active = true;
                    self.file_input.clear();
                }
            }

            AppAction::ResetScan => {
                self.scan_status = ScanStatus::Idle;
                self.scan_results.clear();
                self.selected_index = 0;
            }

            AppAction::DeleteEntry => {
                if self.active_tab == Tab::History {
                    if let Some(entry) = self.selected_entry() {
                        let id = entry.id.clone();
                        self.repository.delete_entry(&id).await?;
                        self.history.retain(|e| e.id != id);
                        // Adjust selection if needed
                        if !self.history.is_empty() && self.selected_index >= self.history.len() {
                            self.selected_index = self.history.len() - 1;
                        }
                    }
                }
            }

            AppAction::ClearHistory => {
                if self.active_tab == Tab::History {
                    self.repository.clear().await?;
                    self.history.clear();
                    self.selected_index = 0;
                }
            }

            AppAction::OpenInBrowser => {
                if let Some(entry) = self.selected_entry() {
                    if entry.content.starts_with("http") {
                        let _ = open::that(&entry.content);
                    }
                }
            }

            AppAction::ExportHistory => {
                match self.export_history(Path::new("history.json")) {
                    Ok(()) => self.status_line = Some("Exported history.json".to_string()),
                    Err(e) => {
                        tracing::warn!("Failed to export history: {}", e);
                        self.status_line = Some("Failed to export history".to_string());
                    }
                }
            }

            AppAction::ToggleTheme => {
                self.config.theme = self.config.theme.toggled();
                self.save_config();
            }

            AppAction::ToggleAutoSave => {
                self.config.auto_save = !self.config.auto_save;
                self.save_config();
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }

            AppAction::ContentInputChar(c) => {
                self.content_input.push(c);
            }

            AppAction::ContentInputBackspace => {
                self.content_input.pop();
            }

            AppAction::ContentInputConfirm => {
                self.content_input_active = false;
                self.generate_qr().await?;
            }

            AppAction::ContentInputCancel => {
                self.content_input_active = false;
            }

            AppAction::UrlInputChar(c) => {
                self.url_input.push(c);
            }

            AppAction::UrlInputBackspace => {
                self.url_input.pop();
            }

            AppAction::UrlInputConfirm => {
                self.url_input_active = false;
                let url = self.url_input.trim().to_string();
                if !url.is_empty() {
                    self.start_page_scan(url);
                }
            }

            AppAction::UrlInputCancel => {
                self.url_input_active = false;
            }

            AppAction::FileInputChar(c) => {
                self.file_input.push(c);
            }

            AppAction::FileInputBackspace => {
                self.file_input.pop();
            }

            AppAction::FileInputConfirm => {
                self.file_input_active = false;
                let path = self.file_input.trim().to_string();
                if !path.is_empty() {
                    self.scan_file(&path).await?;
                }
            }

            AppAction::FileInputCancel => {
                self.file_input_active = false;
            }
        }

        Ok(false)
    }

    fn copyable_content(&self) -> Option<String> {
        match self.active_tab {
            Tab::Create => self.generated.as_ref().map(|g| g.content.clone()),
            Tab::Scan => self.selected_scan_result().map(|r| r.content.clone()),
            Tab::History => self.selected_entry().map(|e| e.content.clone()),
            Tab::Settings => None,
        }
    }

    /// On failure the error is logged and the "copied" flash simply never shows.
    fn copy_to_clipboard(&mut self, text: &str) {
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        match copied {
            Ok(()) => self.copied_at = Some(Instant::now()),
            Err(e) => tracing::error!("Clipboard copy failed: {}", e),
        }
    }

    async fn generate_qr(&mut self) -> Result<()> {
        let text = self.content_input.trim().to_string();
        if text.is_empty() {
            return Ok(());
        }

        match qr::encode(&text) {
            Ok(code) => {
                self.generated = Some(GeneratedCode {
                    content: text.clone(),
                    rendered: qr::render_unicode(&code),
                    code,
                });
                self.status_line = None;
                self.record_history(&text, HistoryKind::Created).await?;
            }
            Err(e) => {
                tracing::error!("Failed to generate QR code: {}", e);
                self.status_line = Some("Content is too long to encode".to_string());
            }
        }

        Ok(())
    }

    fn start_page_scan(&mut self, url: String) {
        self.scan_status = ScanStatus::Scanning;
        self.scan_results.clear();
        self.selected_index = 0;

        // Spawn background task for the scan; the full result list arrives
        // in one message once every element has settled.
        let scanner = Arc::clone(&self.scanner);
        let tx = self.scan_tx.clone();

        tokio::spawn(async move {
            let results = match scanner.scan_page(&url).await {
                Ok(results) => results,
                Err(e) => {
                    tracing::error!("Page scan failed: {}", e);
                    Vec::new()
                }
            };

            let _ = tx.send(ScanOutcome { results }).await;
        });
    }

    /// Poll for a completed page scan (non-blocking)
    pub async fn poll_scan_result(&mut self) -> Result<()> {
        if let Ok(outcome) = self.scan_rx.try_recv() {
            if self.scan_status == ScanStatus::Scanning {
                for result in &outcome.results {
                    self.record_history(&result.content, HistoryKind::Scanned).await?;
                }
                self.scan_results = outcome.results;
                self.scan_status = ScanStatus::Done;
                self.selected_index = 0;
            }
        }
        Ok(())
    }

    async fn scan_file(&mut self, path: &str) -> Result<()> {
        let result = scan_image_file(Path::new(path));

        if let Some(result) = &result {
            self.record_history(&result.content, HistoryKind::Scanned).await?;
        }

        self.scan_results = result.into_iter().collect();
        self.scan_status = ScanStatus::Done;
        self.selected_index = 0;
        Ok(())
    }

    /// Append to history unless auto-save is off.
    pub async fn record_history(&mut self, content: &str, kind: HistoryKind) -> Result<()> {
        if !self.config.auto_save {
            return Ok(());
        }

        self.repository.insert_entry(content.to_string(), kind).await?;
        self.history = self.repository.get_all_entries().await?;
        Ok(())
    }

    pub fn export_history(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.history)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Scan a page and wait for the full result list (headless mode).
    pub async fn scan_page_blocking(&mut self, url: &str) -> Result<Vec<ScanResult>> {
        let results = self.scanner.scan_page(url).await?;
        for result in &results {
            self.record_history(&result.content, HistoryKind::Scanned).await?;
        }
        Ok(results)
    }

    fn save_config(&self) {
        // Settings write failures are logged; the session keeps its in-memory state.
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;

    async fn temp_app(auto_save: bool) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir.path().join("history.db").to_string_lossy().to_string(),
            theme: Theme::Dark,
            auto_save,
        };
        let app = App::new(&config).await.unwrap();
        (dir, app)
    }

    #[tokio::test]
    async fn auto_save_records_every_event() {
        let (_dir, mut app) = temp_app(true).await;

        app.record_history("foo", HistoryKind::Scanned).await.unwrap();
        app.record_history("foo", HistoryKind::Scanned).await.unwrap();

        assert_eq!(app.history.len(), 2);
        assert_ne!(app.history[0].id, app.history[1].id);
        assert!(app.history.iter().all(|e| e.content == "foo"));
    }

    #[tokio::test]
    async fn disabled_auto_save_records_nothing() {
        let (_dir, mut app) = temp_app(false).await;

        app.record_history("foo", HistoryKind::Scanned).await.unwrap();

        assert!(app.history.is_empty());
        assert!(app.repository.get_all_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generate_updates_preview_and_history() {
        let (_dir, mut app) = temp_app(true).await;

        app.content_input = "https://example.com".to_string();
        app.handle_action(AppAction::ContentInputConfirm).await.unwrap();

        let generated = app.generated.as_ref().unwrap();
        assert_eq!(generated.content, "https://example.com");
        assert!(!generated.rendered.is_empty());

        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history[0].kind, HistoryKind::Created);
    }

    #[tokio::test]
    async fn over_capacity_content_sets_status_instead_of_history() {
        let (_dir, mut app) = temp_app(true).await;

        app.content_input = "a".repeat(5000);
        app.handle_action(AppAction::ContentInputConfirm).await.unwrap();

        assert!(app.generated.is_none());
        assert!(app.status_line.is_some());
        assert!(app.history.is_empty());
    }

    #[tokio::test]
    async fn reset_returns_scan_to_idle() {
        let (_dir, mut app) = temp_app(true).await;

        app.scan_status = ScanStatus::Done;
        app.scan_results.push(ScanResult {
            content: "x".to_string(),
            source: "y".to_string(),
            label: "z".to_string(),
        });

        app.handle_action(AppAction::ResetScan).await.unwrap();

        assert_eq!(app.scan_status, ScanStatus::Idle);
        assert!(app.scan_results.is_empty());
    }

    #[tokio::test]
    async fn delete_adjusts_selection() {
        let (_dir, mut app) = temp_app(true).await;

        app.record_history("a", HistoryKind::Created).await.unwrap();
        app.record_history("b", HistoryKind::Created).await.unwrap();

        app.active_tab = Tab::History;
        app.selected_index = 1;
        app.handle_action(AppAction::DeleteEntry).await.unwrap();

        assert_eq!(app.history.len(), 1);
        assert_eq!(app.selected_index, 0);
    }

    #[tokio::test]
    async fn export_round_trips_entries() {
        let (dir, mut app) = temp_app(true).await;

        app.record_history("https://example.com", HistoryKind::Scanned)
            .await
            .unwrap();

        let path = dir.path().join("history.json");
        app.export_history(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<HistoryEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "https://example.com");
        assert_eq!(entries[0].kind, HistoryKind::Scanned);
    }
}
