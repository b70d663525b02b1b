use super::screen_trait::ScreenTrait;
use super::{App, Screen};
use crate::audio_engine::AudioEngine;
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

mod layout_config {
    pub const TITLE: &str = "Save Recording";
    pub const HELP: &str = "Enter: Save | Esc: Cancel";
    pub const MAX_NAME_LEN: usize = 255;
    // Cursor returns to "Save Recording" afterwards
    pub const SAVE_ACTION_INDEX: usize = 2;
}

#[derive(Debug, PartialEq, Eq)]
enum PromptOutcome {
    Editing,
    Submit,
    Cancel,
}

fn edit_prompt(name: &mut String, key: KeyCode) -> PromptOutcome {
    match key {
        KeyCode::Char(c) if !c.is_control() => {
            if name.chars().count() < layout_config::MAX_NAME_LEN {
                name.push(c);
            }
            PromptOutcome::Editing
        }
        KeyCode::Backspace => {
            name.pop();
            PromptOutcome::Editing
        }
        KeyCode::Enter if name.trim().is_empty() => PromptOutcome::Cancel,
        KeyCode::Enter => PromptOutcome::Submit,
        KeyCode::Esc => PromptOutcome::Cancel,
        _ => PromptOutcome::Editing,
    }
}

pub struct SaveScreen;

impl ScreenTrait for SaveScreen {
    fn render(&self, f: &mut Frame, app: &App, area: Rect) {
        let file_name = match &app.screen {
            Screen::SaveAs { file_name } => file_name.as_str(),
            _ => "",
        };
        let target = AudioEngine::lock_global()
            .config()
            .resolve_output(file_name.trim());

        let prompt = Paragraph::new(vec![
            Line::styled(
                format!("File name: {}_", file_name),
                Style::default().fg(app.theme.text),
            ),
            Line::from(""),
            Line::styled(
                format!("Target: {}", target.display()),
                Style::default().fg(app.theme.disabled),
            ),
            Line::styled(layout_config::HELP, Style::default().fg(app.theme.disabled)),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(layout_config::TITLE),
        );
        f.render_widget(prompt, area);
    }

    fn handle_input(
        &self,
        app: &mut App,
        key: KeyCode,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        let Screen::SaveAs { file_name } = &mut app.screen else {
            return Ok(false);
        };

        match edit_prompt(file_name, key) {
            PromptOutcome::Editing => {}
            PromptOutcome::Cancel => {
                app.status = "Save cancelled".to_string();
                app.screen = Screen::Recorder {
                    selected: layout_config::SAVE_ACTION_INDEX,
                };
            }
            PromptOutcome::Submit => {
                let file_name = file_name.trim().to_string();
                save(app, file_name);
            }
        }
        Ok(false)
    }
}

fn save(app: &mut App, file_name: String) {
    let path = AudioEngine::lock_global().config().resolve_output(&file_name);

    match app.recorder.save(&path) {
        Ok(written) => {
            app.status = format!("Saved: {}", written.display());
            app.debug_logger.log(app.status.clone());

            let mut engine = AudioEngine::lock_global();
            engine.config_mut().file_name = file_name;
            if let Err(e) = engine.save_config() {
                app.debug_logger
                    .log(format!("Could not save config: {}", e));
            }

            app.screen = Screen::Recorder {
                selected: layout_config::SAVE_ACTION_INDEX,
            };
        }
        Err(e) => {
            // Stay on the prompt so the name can be fixed
            app.status = format!("Save failed: {}", e);
            app.debug_logger.log(app.status.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_edits_the_name() {
        let mut name = String::from("take");
        assert_eq!(edit_prompt(&mut name, KeyCode::Char('1')), PromptOutcome::Editing);
        assert_eq!(edit_prompt(&mut name, KeyCode::Char('q')), PromptOutcome::Editing);
        assert_eq!(edit_prompt(&mut name, KeyCode::Backspace), PromptOutcome::Editing);
        assert_eq!(name, "take1");
        assert_eq!(edit_prompt(&mut name, KeyCode::Enter), PromptOutcome::Submit);
    }

    #[test]
    fn empty_name_or_escape_cancels() {
        let mut name = String::from("  ");
        assert_eq!(edit_prompt(&mut name, KeyCode::Enter), PromptOutcome::Cancel);

        let mut name = String::from("memo.wav");
        assert_eq!(edit_prompt(&mut name, KeyCode::Esc), PromptOutcome::Cancel);
        assert_eq!(name, "memo.wav");
    }

    #[test]
    fn name_length_is_capped() {
        let mut name = "a".repeat(layout_config::MAX_NAME_LEN);
        edit_prompt(&mut name, KeyCode::Char('b'));
        assert_eq!(name.len(), layout_config::MAX_NAME_LEN);
    }
}
