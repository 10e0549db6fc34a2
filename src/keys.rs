use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// ============================================================================
// KEY PARSING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// Parses names like `"q"`, `"Esc"`, `"Ctrl-q"` or `"Shift-Up"`.
pub fn parse_key(key_str: &str) -> Option<KeyBinding> {
    let mut ctrl = false;
    let mut alt = false;
    let mut shift = false;

    // a lone "-" is the minus key, not a separator
    let (modifiers, key_part) = match key_str.rsplit_once('-') {
        Some((mods, key)) if !key.is_empty() => (Some(mods), key),
        _ => (None, key_str),
    };

    if let Some(mods) = modifiers {
        for modifier in mods.split('-') {
            match modifier.to_lowercase().as_str() {
                "ctrl" | "control" => ctrl = true,
                "alt" => alt = true,
                "shift" => shift = true,
                _ => return None,
            }
        }
    }

    let key = match key_part {
        "Esc" | "esc" | "Escape" => KeyCode::Esc,
        "Enter" | "enter" | "Return" => KeyCode::Enter,
        "Space" | "space" => KeyCode::Char(' '),
        "Tab" => KeyCode::Tab,
        "Backspace" => KeyCode::Backspace,
        "Delete" | "Del" => KeyCode::Delete,
        "Insert" | "Ins" => KeyCode::Insert,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        f if f.len() > 1 && f.starts_with('F') => match f[1..].parse::<u8>() {
            Ok(n @ 1..=12) => KeyCode::F(n),
            _ => return None,
        },
        c => {
            let mut chars = c.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyCode::Char(ch),
                _ => return None,
            }
        }
    };

    Some(KeyBinding {
        key,
        ctrl,
        alt,
        shift,
    })
}

pub fn matches_key(key: &KeyBinding, event: &KeyEvent) -> bool {
    if key.key != event.code {
        return false;
    }

    let modifiers = event.modifiers;
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let alt = modifiers.contains(KeyModifiers::ALT);
    let shift = modifiers.contains(KeyModifiers::SHIFT);

    // terminals report uppercase letters with SHIFT set
    let shift_ok = key.shift == shift || matches!(key.key, KeyCode::Char(c) if !c.is_ascii_lowercase());

    key.ctrl == ctrl && key.alt == alt && shift_ok
}

/// Whether any of the configured key strings matches `event`.
pub fn matches_any(keys: &[String], event: &KeyEvent) -> bool {
    keys.iter()
        .filter_map(|k| parse_key(k))
        .any(|binding| matches_key(&binding, event))
}

/// Display form for the help line, e.g. `"s/Tab"`.
pub fn describe(keys: &[String]) -> String {
    keys.iter()
        .map(|k| if k == " " { "Space" } else { k.as_str() })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_parse_plain_and_named() {
        assert_eq!(parse_key("q").map(|k| k.key), Some(KeyCode::Char('q')));
        assert_eq!(parse_key("Esc").map(|k| k.key), Some(KeyCode::Esc));
        assert_eq!(parse_key(" ").map(|k| k.key), Some(KeyCode::Char(' ')));
        assert_eq!(parse_key("F5").map(|k| k.key), Some(KeyCode::F(5)));
        assert_eq!(parse_key("-").map(|k| k.key), Some(KeyCode::Char('-')));
        assert!(parse_key("F13").is_none());
        assert!(parse_key("Nope").is_none());
        assert!(parse_key("Hyper-q").is_none());
    }

    #[test]
    fn test_parse_modifiers() {
        let binding = parse_key("Ctrl-Alt-x").unwrap();
        assert!(binding.ctrl && binding.alt && !binding.shift);
        assert_eq!(binding.key, KeyCode::Char('x'));
    }

    #[test]
    fn test_matches_key_requires_exact_modifiers() {
        let ctrl_c = parse_key("Ctrl-c").unwrap();
        assert!(matches_key(&ctrl_c, &press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!matches_key(&ctrl_c, &press(KeyCode::Char('c'), KeyModifiers::NONE)));

        let c = parse_key("c").unwrap();
        assert!(!matches_key(&c, &press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_uppercase_tolerates_shift() {
        let upper = parse_key("S").unwrap();
        assert!(matches_key(&upper, &press(KeyCode::Char('S'), KeyModifiers::SHIFT)));
    }

    #[test]
    fn test_matches_any_and_describe() {
        let keys = vec!["p".to_string(), " ".to_string()];
        assert!(matches_any(&keys, &press(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert!(!matches_any(&keys, &press(KeyCode::Char('x'), KeyModifiers::NONE)));
        assert_eq!(describe(&keys), "p/Space");
    }
}
