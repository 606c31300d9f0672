use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::models::Tab;

#[derive(Debug, Clone)]
pub enum AppAction {
    Quit,
    NextTab,
    PrevTab,
    MoveUp,
    MoveDown,
    EditContent,
    CopyContent,
    SavePng,
    ScanPage,
    ScanFile,
    ResetScan,
    DeleteEntry,
    ClearHistory,
    OpenInBrowser,
    ExportHistory,
    ToggleTheme,
    ToggleAutoSave,
    ShowHelp,
    HideHelp,
    // Content input actions
    ContentInputChar(char),
    ContentInputBackspace,
    ContentInputConfirm,
    ContentInputCancel,
    // Page URL input actions
    UrlInputChar(char),
    UrlInputBackspace,
    UrlInputConfirm,
    UrlInputCancel,
    // File path input actions
    FileInputChar(char),
    FileInputBackspace,
    FileInputConfirm,
    FileInputCancel,
}

pub fn handle_key_event(
    key: KeyEvent,
    active_tab: Tab,
    content_input_active: bool,
    url_input_active: bool,
    file_input_active: bool,
    show_help: bool,
) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    // Content input mode
    if content_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::ContentInputConfirm),
            KeyCode::Esc => Some(AppAction::ContentInputCancel),
            KeyCode::Backspace => Some(AppAction::ContentInputBackspace),
            KeyCode::Char(c) => Some(AppAction::ContentInputChar(c)),
            _ => None,
        };
    }

    // Page URL input mode
    if url_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::UrlInputConfirm),
            KeyCode::Esc => Some(AppAction::UrlInputCancel),
            KeyCode::Backspace => Some(AppAction::UrlInputBackspace),
            KeyCode::Char(c) => Some(AppAction::UrlInputChar(c)),
            _ => None,
        };
    }

    // File path input mode
    if file_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::FileInputConfirm),
            KeyCode::Esc => Some(AppAction::FileInputCancel),
            KeyCode::Backspace => Some(AppAction::FileInputBackspace),
            KeyCode::Char(c) => Some(AppAction::FileInputChar(c)),
            _ => None,
        };
    }

    // Normal mode
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),

        (KeyCode::Tab, _) | (KeyCode::Right, _) => Some(AppAction::NextTab),
        (KeyCode::BackTab, _) | (KeyCode::Left, _) => Some(AppAction::PrevTab),

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(AppAction::MoveUp),

        (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),

        (KeyCode::Char('s'), _) => Some(AppAction::ScanPage),
        (KeyCode::Char('f'), _) => Some(AppAction::ScanFile),

        (KeyCode::Char('c'), _) => Some(AppAction::CopyContent),

        _ => match active_tab {
            Tab::Create => match key.code {
                KeyCode::Char('e') | KeyCode::Enter => Some(AppAction::EditContent),
                KeyCode::Char('w') => Some(AppAction::SavePng),
                _ => None,
            },
            Tab::Scan => match key.code {
                KeyCode::Char('r') => Some(AppAction::ResetScan),
                _ => None,
            },
            Tab::History => match key.code {
                KeyCode::Char('o') => Some(AppAction::OpenInBrowser),
                KeyCode::Char('d') => Some(AppAction::DeleteEntry),
                KeyCode::Char('x') => Some(AppAction::ClearHistory),
                KeyCode::Char('w') => Some(AppAction::ExportHistory),
                _ => None,
            },
            Tab::Settings => match key.code {
                KeyCode::Char('t') => Some(AppAction::ToggleTheme),
                KeyCode::Char('a') => Some(AppAction::ToggleAutoSave),
                _ => None,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_from_any_tab() {
        for tab in Tab::ALL {
            assert!(matches!(
                handle_key_event(key(KeyCode::Char('q')), tab, false, false, false, false),
                Some(AppAction::Quit)
            ));
        }
    }

    #[test]
    fn input_mode_captures_characters() {
        let action = handle_key_event(key(KeyCode::Char('q')), Tab::Create, true, false, false, false);
        assert!(matches!(action, Some(AppAction::ContentInputChar('q'))));

        let action = handle_key_event(key(KeyCode::Esc), Tab::Create, true, false, false, false);
        assert!(matches!(action, Some(AppAction::ContentInputCancel)));
    }

    #[test]
    fn help_swallows_everything() {
        let action = handle_key_event(key(KeyCode::Char('d')), Tab::History, false, false, false, true);
        assert!(matches!(action, Some(AppAction::HideHelp)));
    }

    #[test]
    fn tab_specific_keys() {
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('d')), Tab::History, false, false, false, false),
            Some(AppAction::DeleteEntry)
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('t')), Tab::Settings, false, false, false, false),
            Some(AppAction::ToggleTheme)
        ));
        assert!(
            handle_key_event(key(KeyCode::Char('t')), Tab::Create, false, false, false, false).is_none()
        );
    }
}
