use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    MoveDown,
    MoveUp,
    JumpFirst,
    JumpLast,
    ToggleExpand,
    ToggleCheck,
    ToggleAllFields,
    Save,
    Cancel,
    ToggleHelp,
    Dismiss,
    Noop,
}

pub fn map_key(key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
        return KeyAction::Save;
    }
    match key.code {
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Char('j') | KeyCode::Down => KeyAction::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => KeyAction::MoveUp,
        KeyCode::Char('g') | KeyCode::Home => KeyAction::JumpFirst,
        KeyCode::Char('G') | KeyCode::End => KeyAction::JumpLast,
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => KeyAction::ToggleExpand,
        KeyCode::Char(' ') => KeyAction::ToggleCheck,
        KeyCode::Char('a') => KeyAction::ToggleAllFields,
        KeyCode::Char('s') => KeyAction::Save,
        KeyCode::Char('c') => KeyAction::Cancel,
        KeyCode::Char('?') => KeyAction::ToggleHelp,
        KeyCode::Esc => KeyAction::Dismiss,
        _ => KeyAction::Noop,
    }
}
