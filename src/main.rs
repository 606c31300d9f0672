use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod app;
mod config;
mod db;
mod error;
mod models;
mod qr;
mod scan;
mod tui;

use app::App;
use config::Config;
use error::Result;
use models::HistoryKind;
use tui::{draw, handle_key_event};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    // Initialize app
    let mut app = App::new(&config).await?;

    // Headless page scan
    if args.len() >= 3 && args[1] == "--scan" {
        let results = app.scan_page_blocking(&args[2]).await?;
        if results.is_empty() {
            println!("No QR codes found.");
        } else {
            for result in &results {
                println!("{}\t{}", result.content, result.source);
            }
        }
        return Ok(());
    }

    // Headless file decode
    if args.len() >= 3 && args[1] == "--decode" {
        match scan::scan_image_file(Path::new(&args[2])) {
            Some(result) => {
                app.record_history(&result.content, HistoryKind::Scanned).await?;
                println!("{}", result.content);
            }
            None => println!("No QR code found."),
        }
        return Ok(());
    }

    // Headless generate: print to stdout, or save a PNG when a path is given
    if args.len() >= 3 && args[1] == "--generate" {
        let code = qr::encode(&args[2])?;
        if let Some(path) = args.get(3) {
            qr::save_png(&code, Path::new(path))?;
            println!("Saved {}", path);
        } else {
            println!("{}", qr::render_unicode(&code));
        }
        app.record_history(&args[2], HistoryKind::Created).await?;
        return Ok(());
    }

    // Headless history export
    if args.len() >= 3 && args[1] == "--export" {
        app.export_history(Path::new(&args[2]))?;
        println!("Exported {} entries to {}", app.history.len(), args[2]);
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Advance spinner animation
        app.tick_spinner();

        // Poll for completed page scans
        app.poll_scan_result().await?;

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(
                        key,
                        app.active_tab,
                        app.content_input_active,
                        app.url_input_active,
                        app.file_input_active,
                        app.show_help,
                    ) {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
