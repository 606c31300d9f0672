use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::App;
use crate::config::Theme;
use crate::models::{HistoryKind, ScanStatus, Tab};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Tab body
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_tab_bar(frame, app, chunks[0]);

    match app.active_tab {
        Tab::Create => render_create(frame, app, chunks[1]),
        Tab::Scan => render_scan(frame, app, chunks[1]),
        Tab::History => render_history(frame, app, chunks[1]),
        Tab::Settings => render_settings(frame, app, chunks[1]),
    }

    render_status_line(frame, app, chunks[2]);

    if app.content_input_active {
        render_input(frame, app, " Content to encode ", &app.content_input);
    }
    if app.url_input_active {
        render_input(frame, app, " Page URL to scan ", &app.url_input);
    }
    if app.file_input_active {
        render_input(frame, app, " Image file to decode ", &app.file_input);
    }

    if app.show_help {
        render_help(frame, app);
    }
}

fn accent(theme: Theme) -> Color {
    match theme {
        Theme::Dark => Color::Cyan,
        Theme::Light => Color::Blue,
    }
}

fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.label())).collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" qr-scout ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent(app.config.theme))),
        )
        .select(app.active_tab.index())
        .highlight_style(
            Style::default()
                .fg(accent(app.config.theme))
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_create(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // QR preview
            Constraint::Length(4), // Content
        ])
        .split(area);

    let preview = match &app.generated {
        Some(generated) => generated.rendered.clone(),
        None => "\nPress e to enter content".to_string(),
    };

    let preview_block = Block::default()
        .title(" Preview ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent(app.config.theme)));
    let paragraph = Paragraph::new(preview)
        .block(preview_block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, chunks[0]);

    let content = app
        .generated
        .as_ref()
        .map(|g| g.content.as_str())
        .unwrap_or("");
    let content_block = Block::default().title(" Content ").borders(Borders::ALL);
    let paragraph = Paragraph::new(content)
        .block(content_block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, chunks[1]);
}

fn render_scan(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Scan state
            Constraint::Min(0),    // Results
        ])
        .split(area);

    let state_text = match app.scan_status {
        ScanStatus::Idle => "Press s to scan a page URL, f to decode an image file".to_string(),
        ScanStatus::Scanning => format!("{} Scanning page...", app.spinner()),
        ScanStatus::Done => match app.scan_results.len() {
            0 => "No QR codes found. Press r to scan again.".to_string(),
            1 => "1 QR code found. Press r to scan again.".to_string(),
            n => format!("{} QR codes found. Press r to scan again.", n),
        },
    };

    let block = Block::default()
        .title(" Scan ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent(app.config.theme)));
    let paragraph = Paragraph::new(state_text).block(block);
    frame.render_widget(paragraph, chunks[0]);

    let items: Vec<ListItem> = app
        .scan_results
        .iter()
        .map(|result| {
            let lines = vec![
                Line::from(Span::styled(
                    result.content.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{} · {}", result.label, result.source),
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title(" Results ").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.scan_results.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    if app.history.is_empty() {
        let block = Block::default().title(" History ").borders(Borders::ALL);
        let paragraph = Paragraph::new("\nNo history yet.\nYour QR code activity will appear here.")
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .history
        .iter()
        .map(|entry| {
            let marker = match entry.kind {
                HistoryKind::Created => "▣ ",
                HistoryKind::Scanned => "◎ ",
            };
            let when = entry.created_at.format("%b %d %H:%M").to_string();

            let line = Line::from(vec![
                Span::styled(marker, Style::default().fg(accent(app.config.theme))),
                Span::raw(entry.content.clone()),
                Span::styled(
                    format!("  {} · {}", entry.kind.as_str(), when),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let title = format!(" History ({}) ", app.history.len());
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
    let dark = app.config.theme == Theme::Dark;
    let lines = vec![
        Line::from(""),
        Line::from(format!(
            "  [{}] Dark mode                 t:toggle",
            if dark { "x" } else { " " }
        )),
        Line::from(format!(
            "  [{}] Auto-save to history      a:toggle",
            if app.config.auto_save { "x" } else { " " }
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("  Config: {}", crate::config::Config::config_path().display()),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            format!("  History db: {}", app.config.db_path),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .title(" Settings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent(app.config.theme)));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let hints = match app.active_tab {
        Tab::Create => "e:edit  c:copy  w:save png  s:scan page  Tab:switch  ?:help  q:quit",
        Tab::Scan => "s:scan page  f:scan file  r:reset  c:copy  Tab:switch  ?:help  q:quit",
        Tab::History => "j/k:nav  c:copy  o:open  d:delete  x:clear  w:export  ?:help  q:quit",
        Tab::Settings => "t:theme  a:auto-save  Tab:switch  ?:help  q:quit",
    };

    let text = if app.is_copied() {
        format!("✓ Copied  |  {hints}")
    } else if let Some(status) = &app.status_line {
        format!("{status}  |  {hints}")
    } else {
        hints.to_string()
    };

    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, app: &App, title: &str, value: &str) {
    let area = centered_rect(60, 20, frame.area());

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent(app.config.theme)));

    let inner = block.inner(area);

    // Clear the area first
    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {}_", value);
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = vec![
        "",
        " Tabs:",
        "   Tab / →  Next tab",
        "   S-Tab/←  Previous tab",
        "",
        " Create:",
        "   e/Enter  Enter content to encode",
        "   c        Copy content",
        "   w        Save qrcode.png",
        "",
        " Scan:",
        "   s        Scan a page URL",
        "   f        Decode an image file",
        "   r        Reset scan",
        "",
        " History:",
        "   d        Delete entry",
        "   x        Clear all",
        "   o        Open in browser",
        "   w        Export history.json",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent(app.config.theme)));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
