use ratatui::style::Color;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Colours used across the screens, loaded from the theme file at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub title: Color,
    pub text: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
    pub disabled: Color,
    pub timer: Color,
    pub level: Color,
    pub status: Color,
    pub log: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            title: Color::Cyan,
            text: Color::White,
            selected_fg: Color::Black,
            selected_bg: Color::Yellow,
            disabled: Color::DarkGray,
            timer: Color::LightRed,
            level: Color::Green,
            status: Color::Yellow,
            log: Color::Gray,
        }
    }
}

/// On-disk form: every key optional, values are ratatui colour names or `#rrggbb`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ThemeFile {
    title: Option<String>,
    text: Option<String>,
    selected_fg: Option<String>,
    selected_bg: Option<String>,
    disabled: Option<String>,
    timer: Option<String>,
    level: Option<String>,
    status: Option<String>,
    log: Option<String>,
}

fn apply(slot: &mut Color, key: &str, value: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(value) = value {
        *slot = Color::from_str(&value)
            .map_err(|_| format!("Unknown colour for '{}': {}", key, value))?;
    }
    Ok(())
}

impl Theme {
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let file: ThemeFile = serde_json::from_str(json)?;
        let mut theme = Theme::default();

        apply(&mut theme.title, "title", file.title)?;
        apply(&mut theme.text, "text", file.text)?;
        apply(&mut theme.selected_fg, "selected_fg", file.selected_fg)?;
        apply(&mut theme.selected_bg, "selected_bg", file.selected_bg)?;
        apply(&mut theme.disabled, "disabled", file.disabled)?;
        apply(&mut theme.timer, "timer", file.timer)?;
        apply(&mut theme.level, "level", file.level)?;
        apply(&mut theme.status, "status", file.status)?;
        apply(&mut theme.log, "log", file.log)?;

        Ok(theme)
    }

    /// Load the theme file. A missing or broken file yields the default
    /// theme plus a message for the status bar.
    pub fn load(path: &Path) -> (Self, Option<String>) {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (
                    Theme::default(),
                    Some(format!("No theme at {}, using defaults", path.display())),
                )
            }
            Err(e) => {
                return (
                    Theme::default(),
                    Some(format!("Could not read theme {}: {}", path.display(), e)),
                )
            }
        };

        match Theme::from_json(&json) {
            Ok(theme) => (theme, None),
            Err(e) => (
                Theme::default(),
                Some(format!("Invalid theme {}: {}", path.display(), e)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_theme_overrides_only_given_keys() {
        let theme = Theme::from_json(r##"{ "timer": "blue", "selected_bg": "#102030" }"##).unwrap();
        assert_eq!(theme.timer, Color::Blue);
        assert_eq!(theme.selected_bg, Color::Rgb(0x10, 0x20, 0x30));
        assert_eq!(theme.title, Theme::default().title);
    }

    #[test]
    fn bad_colour_or_key_is_rejected() {
        assert!(Theme::from_json(r#"{ "timer": "not-a-colour" }"#).is_err());
        assert!(Theme::from_json(r#"{ "background": "red" }"#).is_err());
        assert!(Theme::from_json("QPushButton { color: red; }").is_err());
    }

    #[test]
    fn missing_file_falls_back_with_message() {
        let (theme, message) = Theme::load(Path::new("/nonexistent/theme.json"));
        assert_eq!(theme, Theme::default());
        assert!(message.unwrap().contains("using defaults"));
    }
}
