use super::*;

/// Canonical key name fed to the palette reducer, e.g. `down`, `ctrl+j`, `a`.
pub(super) fn key_name(key_event: &KeyEvent) -> Option<String> {
    let ctrl = key_event.modifiers.contains(Modifiers::CTRL);
    let name = match key_event.code {
        KeyCode::Char(character) if ctrl => format!("ctrl+{}", character.to_ascii_lowercase()),
        KeyCode::Char(character) => character.to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Escape => "esc".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Tab => "tab".to_string(),
        _ => return None,
    };
    Some(name)
}

/// The query after applying one unbound key, or `None` when the key does
/// not edit text.
pub(super) fn edit_query(query: &str, key_event: &KeyEvent) -> Option<String> {
    let ctrl = key_event.modifiers.contains(Modifiers::CTRL);
    let alt = key_event.modifiers.contains(Modifiers::ALT);
    match key_event.code {
        KeyCode::Backspace if ctrl || alt => Some(without_last_word(query)),
        KeyCode::Backspace => {
            let mut edited = query.to_string();
            edited.pop()?;
            Some(edited)
        }
        KeyCode::Char('u') if ctrl => (!query.is_empty()).then(String::new),
        KeyCode::Char('w') if ctrl => Some(without_last_word(query)),
        KeyCode::Char(character) if !ctrl && !alt => {
            let mut edited = query.to_string();
            edited.push(character);
            Some(edited)
        }
        _ => None,
    }
}

fn without_last_word(query: &str) -> String {
    let trimmed = query.trim_end();
    let cut = trimmed
        .char_indices()
        .rev()
        .find(|(_, character)| character.is_whitespace())
        .map_or(0, |(index, character)| index + character.len_utf8());
    trimmed[..cut].to_string()
}
