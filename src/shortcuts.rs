//! Key binding configuration.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All key bindings, loadable from `shortcut.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub main: MainShortcuts,
    pub settings: SettingsShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// Invoice screen bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainShortcuts {
    pub quit: Vec<String>,
    pub open_file: Vec<String>,
    pub remove_file: Vec<String>,
    pub process: Vec<String>,
    pub download: Vec<String>,
    pub toggle_auto: Vec<String>,
    pub toggle_discount: Vec<String>,
    pub edit_identifier: Vec<String>,
    pub edit_date: Vec<String>,
    pub edit_tax_id: Vec<String>,
    pub settings: Vec<String>,
}

/// Settings screen bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsShortcuts {
    pub cancel: Vec<String>,
    pub save: Vec<String>,
    pub base_url: Vec<String>,
    pub downloads_dir: Vec<String>,
}

/// InputBox bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// Read from TOML, falling back to the defaults when the file is absent.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            // Parse the user's bindings.
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            // No file yet: built-in bindings.
            Ok(Self::default())
        }
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            main: MainShortcuts {
                quit: vec!["q".into()],
                open_file: vec!["o".into()],
                remove_file: vec!["x".into(), "Delete".into()],
                process: vec!["p".into(), "Enter".into()],
                download: vec!["d".into()],
                toggle_auto: vec!["a".into()],
                toggle_discount: vec!["e".into()],
                edit_identifier: vec!["n".into()],
                edit_date: vec!["D".into()],
                edit_tax_id: vec!["c".into()],
                settings: vec!["t".into()],
            },
            settings: SettingsShortcuts {
                cancel: vec!["Esc".into()],
                save: vec!["Enter".into()],
                base_url: vec!["u".into()],
                downloads_dir: vec!["f".into()],
            },
            input_box: InputBoxShortcuts {
                confirm: vec!["Enter".into()],
                cancel: vec!["Esc".into()],
                backspace: vec!["Backspace".into()],
                delete: vec!["Delete".into()],
                left: vec!["Left".into()],
                right: vec!["Right".into()],
                home: vec!["Home".into()],
                end: vec!["End".into()],
                clear_line: vec!["Ctrl+u".into()],
            },
        }
    }
}

/// True if the key matches any of the binding strings.
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts.iter().any(|s| matches_single_shortcut(key, s))
}

/// Match one binding such as `"Ctrl+u"`, `"a"` or `"Enter"`.
fn matches_single_shortcut(key: &KeyEvent, shortcut: &str) -> bool {
    // Split off modifiers, e.g. "Ctrl+u" -> ["Ctrl"], "u".
    let parts: Vec<&str> = shortcut.split('+').collect();

    let (modifiers_str, key_str) = if parts.len() > 1 {
        // With modifiers.
        (&parts[0..parts.len() - 1], parts[parts.len() - 1])
    } else {
        // Bare key.
        (&[][..], parts[0])
    };

    // Build the expected modifier set; unknown names never match.
    let mut expected_modifiers = KeyModifiers::empty();
    for modifier in modifiers_str {
        match *modifier {
            "Ctrl" | "ctrl" => expected_modifiers |= KeyModifiers::CONTROL,
            "Alt" | "alt" => expected_modifiers |= KeyModifiers::ALT,
            "Shift" | "shift" => expected_modifiers |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    // Terminals disagree on whether uppercase letters carry SHIFT.
    let actual_modifiers = match key.code {
        KeyCode::Char(c) if c.is_ascii_uppercase() && modifiers_str.is_empty() => {
            key.modifiers.difference(KeyModifiers::SHIFT)
        }
        KeyCode::Char(c) if c.is_ascii_uppercase() => key.modifiers.union(KeyModifiers::SHIFT),
        _ => key.modifiers,
    };
    if actual_modifiers != expected_modifiers {
        return false;
    }

    // Compare the key code itself.
    match key_str {
        "Enter" | "enter" => key.code == KeyCode::Enter,
        "Esc" | "esc" => key.code == KeyCode::Esc,
        "Tab" | "tab" => key.code == KeyCode::Tab,
        "Backspace" | "backspace" => key.code == KeyCode::Backspace,
        "Delete" | "delete" => key.code == KeyCode::Delete,
        "Up" | "up" => key.code == KeyCode::Up,
        "Down" | "down" => key.code == KeyCode::Down,
        "Left" | "left" => key.code == KeyCode::Left,
        "Right" | "right" => key.code == KeyCode::Right,
        "Home" | "home" => key.code == KeyCode::Home,
        "End" | "end" => key.code == KeyCode::End,
        // Single characters compare as Char.
        s if s.chars().count() == 1 => s.chars().next().is_some_and(|c| key.code == KeyCode::Char(c)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_shortcut_simple_char() {
        let key = KeyEvent::new(KeyCode::Char('p'), KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("p")]));
        assert!(!matches_shortcut(&key, &[String::from("d")]));
    }

    #[test]
    fn test_matches_shortcut_special_key() {
        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("Enter")]));
        assert!(!matches_shortcut(&key, &[String::from("Esc")]));
    }

    #[test]
    fn test_matches_shortcut_with_modifier() {
        let key = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(matches_shortcut(&key, &[String::from("Ctrl+u")]));
        assert!(!matches_shortcut(&key, &[String::from("u")]));
    }

    #[test]
    fn test_matches_shortcut_uppercase_with_or_without_shift() {
        let bare = KeyEvent::new(KeyCode::Char('D'), KeyModifiers::empty());
        let shifted = KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT);
        for key in [bare, shifted] {
            assert!(matches_shortcut(&key, &[String::from("D")]));
            assert!(matches_shortcut(&key, &[String::from("Shift+D")]));
        }
        let lower = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::empty());
        assert!(!matches_shortcut(&lower, &[String::from("D")]));
    }

    #[test]
    fn test_matches_shortcut_multiple_keys() {
        let delete = KeyEvent::new(KeyCode::Delete, KeyModifiers::empty());
        let x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::empty());
        let bindings = Shortcuts::default().main.remove_file;

        assert!(matches_shortcut(&delete, &bindings));
        assert!(matches_shortcut(&x, &bindings));
        let o = KeyEvent::new(KeyCode::Char('o'), KeyModifiers::empty());
        assert!(!matches_shortcut(&o, &bindings));
    }

    #[test]
    fn test_load_reads_partial_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcut.toml");
        let mut sc = Shortcuts::default();
        sc.main.process = vec!["Ctrl+p".into()];
        std::fs::write(&path, toml::to_string_pretty(&sc).unwrap()).unwrap();

        let loaded = Shortcuts::load_or_default(&path).unwrap();
        assert_eq!(loaded.main.process, vec!["Ctrl+p".to_string()]);
        assert_eq!(loaded.main.quit, vec!["q".to_string()]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let sc = Shortcuts::load_or_default(dir.path().join("none.toml")).unwrap();
        assert_eq!(sc.settings.save, vec!["Enter".to_string()]);
    }
}
