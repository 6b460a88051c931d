use crate::session::state::Mode;
use crate::session::transition::{CycleDirection, InputEdit, SessionEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

fn is_ctrl(key: &KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(ch)
}

fn is_newline(key: &KeyEvent) -> bool {
    if is_ctrl(key, 'j') {
        return true;
    }
    key.code == KeyCode::Enter
        && (key.modifiers.contains(KeyModifiers::ALT)
            || key.modifiers.contains(KeyModifiers::SHIFT))
}

fn cycle_direction(key: &KeyEvent) -> Option<CycleDirection> {
    if is_ctrl(key, 'n') || key.code == KeyCode::Tab {
        return Some(CycleDirection::Next);
    }
    if is_ctrl(key, 'p') || key.code == KeyCode::BackTab {
        return Some(CycleDirection::Prev);
    }
    None
}

/// Maps a key press to the event it means in `mode`. Unmapped keys yield `None`.
pub fn event_from_key(mode: Mode, key: KeyEvent) -> Option<SessionEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if is_ctrl(&key, 'c') || key.code == KeyCode::Esc {
        return Some(SessionEvent::Quit);
    }
    if let Some(direction) = cycle_direction(&key) {
        return Some(SessionEvent::CycleRunner(direction));
    }

    match mode {
        Mode::Composing => composing_event(key),
        Mode::Running => None,
        Mode::Reviewing => reviewing_event(key),
    }
}

fn composing_event(key: KeyEvent) -> Option<SessionEvent> {
    if is_newline(&key) {
        return Some(SessionEvent::Edit(InputEdit::Newline));
    }
    if is_ctrl(&key, 'r') {
        return Some(SessionEvent::Submit { auto_execute: true });
    }
    match key.code {
        KeyCode::Enter => Some(SessionEvent::Submit {
            auto_execute: false,
        }),
        KeyCode::Backspace => Some(SessionEvent::Edit(InputEdit::Backspace)),
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(SessionEvent::Edit(InputEdit::Insert(ch)))
        }
        _ => None,
    }
}

fn reviewing_event(key: KeyEvent) -> Option<SessionEvent> {
    if is_newline(&key) {
        return Some(SessionEvent::Reset);
    }
    if is_ctrl(&key, 'r') {
        return Some(SessionEvent::Run);
    }
    match key.code {
        KeyCode::Enter => Some(SessionEvent::Copy),
        KeyCode::Char('q') => Some(SessionEvent::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(SessionEvent::MoveSelection(-1)),
        KeyCode::Down | KeyCode::Char('j') => Some(SessionEvent::MoveSelection(1)),
        _ => None,
    }
}

/// Parses a comma-separated key script such as `"l,s,enter,down,enter"` into key
/// events. Single characters are typed as-is; named keys cover the bindings above.
pub fn parse_scripted_keys(raw: &str) -> Result<Vec<KeyEvent>, String> {
    let mut keys = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let normalized = token.to_ascii_lowercase();
        let key = match normalized.as_str() {
            "enter" => KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE),
            "alt-enter" => KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT),
            "esc" => KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE),
            "up" => KeyEvent::new(KeyCode::Up, KeyModifiers::NONE),
            "down" => KeyEvent::new(KeyCode::Down, KeyModifiers::NONE),
            "tab" => KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE),
            "backspace" => KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE),
            "space" => KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE),
            "ctrl-c" | "ctrl-j" | "ctrl-n" | "ctrl-p" | "ctrl-r" => {
                let ch = normalized.chars().last().unwrap_or('c');
                KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
            }
            _ => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE),
                    _ => {
                        return Err(format!(
                            "invalid key token `{token}`; valid tokens: a single character, enter, alt-enter, esc, up, down, tab, backspace, space, ctrl-c, ctrl-j, ctrl-n, ctrl-p, ctrl-r"
                        ))
                    }
                }
            }
        };
        keys.push(key);
    }
    Ok(keys)
}
