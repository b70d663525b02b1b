use super::screen_trait::ScreenTrait;
use super::{App, Screen};
use crate::audio_engine::AudioEngine;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

mod layout_config {
    pub const TITLE: &str = "Input Devices (Enter to select)";
    pub const HELP: &str = "r: Refresh Devices | Esc: Back";
    pub const EMPTY: &str = "No input devices found";
}

pub struct InputDevicesScreen;

fn selected(app: &App) -> usize {
    match app.screen {
        Screen::InputDevices { selected } => selected,
        _ => 0,
    }
}

impl ScreenTrait for InputDevicesScreen {
    fn render(&self, f: &mut Frame, app: &App, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        let cursor = selected(app);
        let theme = &app.theme;
        let engine = AudioEngine::lock_global();

        let mut items: Vec<ListItem> = engine
            .input_devices()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let is_active = engine.selected_input() == Some(name.as_str());

                let style = if i == cursor {
                    Style::default().fg(theme.selected_fg).bg(theme.selected_bg)
                } else if is_active {
                    Style::default().fg(theme.level)
                } else {
                    Style::default().fg(theme.text)
                };

                let display = if is_active {
                    format!("● {}", name)
                } else {
                    format!("  {}", name)
                };

                ListItem::new(display).style(style)
            })
            .collect();

        if items.is_empty() {
            items.push(ListItem::new(layout_config::EMPTY).style(Style::default().fg(theme.disabled)));
        }

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(layout_config::TITLE),
        );
        f.render_widget(list, chunks[0]);

        let help = Paragraph::new(layout_config::HELP)
            .style(Style::default().fg(theme.disabled))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(help, chunks[1]);
    }

    fn handle_input(
        &self,
        app: &mut App,
        key: KeyCode,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        let cursor = selected(app);
        let mut engine = AudioEngine::lock_global();

        match key {
            KeyCode::Up => {
                if cursor > 0 {
                    app.screen = Screen::InputDevices {
                        selected: cursor - 1,
                    };
                }
            }
            KeyCode::Down => {
                if cursor < engine.input_devices().len().saturating_sub(1) {
                    app.screen = Screen::InputDevices {
                        selected: cursor + 1,
                    };
                }
            }
            KeyCode::Enter => {
                if let Some(device) = engine.input_devices().get(cursor).cloned() {
                    app.status = format!("Input: {}", device);
                    engine.set_input_device(device);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                engine.refresh_devices();
                app.status = format!("Found {} input device(s)", engine.input_devices().len());
                app.screen = Screen::InputDevices { selected: 0 };
            }
            _ => {}
        }
        Ok(false)
    }
}
