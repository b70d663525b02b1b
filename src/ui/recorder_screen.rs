use super::screen_trait::ScreenTrait;
use super::{App, Screen};
use crate::audio_engine::AudioEngine;
use crate::recorder::stopwatch::format_hms;
use crate::recorder::{RecorderAction, RecorderState};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};
use strum::IntoEnumIterator;

mod layout_config {
    pub const TITLE: &str = "Recorder";
    pub const TIMER_TITLE: &str = "Elapsed";
    pub const LEVEL_TITLE: &str = "Input Level";
    pub const INFO_TITLE: &str = "Take";
    pub const HELP: &str =
        "Enter: Select | r: Start | p/Space: Pause/Resume | s: Save | x: Reset | d: Devices | q: Quit";
}

pub struct RecorderScreen;

fn selected(app: &App) -> usize {
    match app.screen {
        Screen::Recorder { selected } => selected,
        _ => 0,
    }
}

impl ScreenTrait for RecorderScreen {
    fn render(&self, f: &mut Frame, app: &App, area: Rect) {
        let action_count = RecorderAction::iter().count() as u16;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(action_count + 2),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(4),
            ])
            .split(area);

        let state = app.recorder.state();
        let cursor = selected(app);
        let theme = &app.theme;

        let list_items: Vec<ListItem> = RecorderAction::iter()
            .enumerate()
            .map(|(i, action)| {
                let style = if !app.recorder.is_action_enabled(action) {
                    Style::default().fg(theme.disabled)
                } else if i == cursor {
                    Style::default().fg(theme.selected_fg).bg(theme.selected_bg)
                } else {
                    Style::default().fg(theme.text)
                };
                let marker = if i == cursor { "> " } else { "  " };
                ListItem::new(format!("{}{}", marker, action.label(state))).style(style)
            })
            .collect();

        let list = List::new(list_items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(layout_config::TITLE),
        );
        f.render_widget(list, chunks[0]);

        let timer = Paragraph::new(format_hms(app.recorder.elapsed()))
            .style(
                Style::default()
                    .fg(theme.timer)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(layout_config::TIMER_TITLE),
            );
        f.render_widget(timer, chunks[1]);

        let level = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(layout_config::LEVEL_TITLE),
            )
            .gauge_style(Style::default().fg(theme.level))
            .ratio(app.recorder.level_ratio().clamp(0.0, 1.0))
            .label(format!("{}", app.recorder.level()));
        f.render_widget(level, chunks[2]);

        let samples = app.recorder.sample_count();
        let rate = app.recorder.sample_rate();
        let seconds = app.recorder.duration_secs();
        let device = app
            .recorder
            .source_name()
            .unwrap_or_else(|| "-".to_string());

        let info = Paragraph::new(vec![
            Line::from(format!("State: {}  |  Device: {}", state, device)),
            Line::from(format!(
                "Samples: {}  |  {} Hz mono 16-bit  |  {:.1} s",
                samples, rate, seconds
            )),
            Line::styled(layout_config::HELP, Style::default().fg(theme.disabled)),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(layout_config::INFO_TITLE),
        );
        f.render_widget(info, chunks[3]);
    }

    fn handle_input(
        &self,
        app: &mut App,
        key: KeyCode,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        let cursor = selected(app);

        match key {
            KeyCode::Up => {
                if cursor > 0 {
                    app.screen = Screen::Recorder {
                        selected: cursor - 1,
                    };
                }
            }
            KeyCode::Down => {
                if cursor + 1 < RecorderAction::iter().count() {
                    app.screen = Screen::Recorder {
                        selected: cursor + 1,
                    };
                }
            }
            KeyCode::Enter => {
                if let Some(action) = RecorderAction::iter().nth(cursor) {
                    perform(app, action);
                }
            }
            KeyCode::Char('r') => perform(app, RecorderAction::Start),
            KeyCode::Char('p') | KeyCode::Char(' ') => perform(app, RecorderAction::PauseResume),
            KeyCode::Char('s') => perform(app, RecorderAction::Save),
            KeyCode::Char('x') => perform(app, RecorderAction::Reset),
            KeyCode::Char('d') => {
                if !app.recorder.can_change_input() {
                    app.status = "Reset the take before changing devices".to_string();
                } else {
                    app.screen = Screen::InputDevices { selected: 0 };
                }
            }
            _ => {}
        }
        Ok(false)
    }
}

fn perform(app: &mut App, action: RecorderAction) {
    let state = app.recorder.state();
    if !app.recorder.is_action_enabled(action) {
        app.status = format!("{} is not available while {}", action.label(state), state);
        return;
    }

    match action {
        RecorderAction::Start => start_recording(app),
        RecorderAction::PauseResume => match app.recorder.toggle() {
            Ok(RecorderState::Paused) => {
                app.status = format!(
                    "Paused at {} ({} samples)",
                    format_hms(app.recorder.elapsed()),
                    app.recorder.sample_count()
                );
            }
            Ok(_) => app.status = "Recording...".to_string(),
            Err(e) => {
                app.status = format!("Could not resume: {}", e);
                app.debug_logger.log(app.status.clone());
            }
        },
        RecorderAction::Save => {
            let file_name = AudioEngine::lock_global().config().file_name.clone();
            app.screen = Screen::SaveAs { file_name };
        }
        RecorderAction::Reset => {
            app.recorder.reset();
            app.status = "Recording reset".to_string();
            app.debug_logger.log(app.status.clone());
        }
    }
}

fn start_recording(app: &mut App) {
    let device = match AudioEngine::get_input_device() {
        Ok(device) => device,
        Err(e) => {
            app.status = format!("No input device: {}", e);
            app.debug_logger.log(app.status.clone());
            return;
        }
    };

    let name = device.name.clone();
    let rate = device.sample_rate;
    let wanted = AudioEngine::lock_global().config().sample_rate;

    match app.recorder.start(Box::new(device)) {
        Ok(()) if rate != wanted => {
            app.status = format!(
                "Recording from {} at {} Hz ({} Hz not supported)",
                name, rate, wanted
            );
        }
        Ok(()) => app.status = format!("Recording from {}", name),
        Err(e) => {
            app.status = format!("Could not start recording: {}", e);
            app.debug_logger.log(app.status.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::capture::{ActiveInput, BlockSink, InputSource};
    use crate::ui::theme::Theme;

    struct SilentInput;

    impl InputSource for SilentInput {
        fn name(&self) -> String {
            "silent".to_string()
        }

        fn sample_rate(&self) -> u32 {
            8000
        }

        fn open(&self, mut sink: BlockSink) -> Result<Box<dyn ActiveInput>, Box<dyn std::error::Error>> {
            sink.push_block(&[0; 80]);
            Ok(Box::new(()))
        }
    }

    #[test]
    fn device_picker_waits_for_reset() {
        let mut app = App::new(Theme::default());
        app.recorder.start(Box::new(SilentInput)).unwrap();
        app.recorder.toggle().unwrap();

        RecorderScreen.handle_input(&mut app, KeyCode::Char('d')).unwrap();
        assert!(matches!(app.screen, Screen::Recorder { .. }));
        assert!(app.status.contains("Reset"));

        RecorderScreen.handle_input(&mut app, KeyCode::Char('x')).unwrap();
        RecorderScreen.handle_input(&mut app, KeyCode::Char('d')).unwrap();
        assert!(matches!(app.screen, Screen::InputDevices { selected: 0 }));
    }

    #[test]
    fn cursor_stops_at_the_last_action() {
        let mut app = App::new(Theme::default());
        for _ in 0..10 {
            RecorderScreen.handle_input(&mut app, KeyCode::Down).unwrap();
        }
        assert!(matches!(app.screen, Screen::Recorder { selected: 3 }));
    }
}
