use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;

use super::input_devices_screen::InputDevicesScreen;
use super::recorder_screen::RecorderScreen;
use super::save_screen::SaveScreen;
use super::screen_trait::ScreenTrait;
use super::{App, Screen};
use crate::audio_engine::AudioEngine;

mod event_config {
    use crossterm::event::KeyCode;

    pub const POLL_TIMEOUT_MS: u64 = 100;
    pub const QUIT_KEY: char = 'q';
    pub const BACK_KEY: KeyCode = KeyCode::Esc;
}

pub struct AppEventHandler;

impl AppEventHandler {
    pub fn process_events(app: &mut App) -> Result<bool, Box<dyn std::error::Error>> {
        Self::update_background_tasks(app);

        if Self::poll_for_event()? {
            return Self::handle_user_input(app);
        }

        Ok(false)
    }

    fn update_background_tasks(app: &mut App) {
        if let Some(dropped) = app.recorder.poll() {
            app.status = format!("Input overflow: dropped {} samples", dropped);
            app.debug_logger.log(app.status.clone());
        }
    }

    fn poll_for_event() -> Result<bool, Box<dyn std::error::Error>> {
        event::poll(Duration::from_millis(event_config::POLL_TIMEOUT_MS))
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }

    fn handle_user_input(app: &mut App) -> Result<bool, Box<dyn std::error::Error>> {
        if let Event::Key(key) = event::read()? {
            // Windows reports releases too
            if key.kind != KeyEventKind::Press {
                return Ok(false);
            }

            // The save prompt is a text field: 'q' and Esc belong to it
            let is_text_input = matches!(app.screen, Screen::SaveAs { .. });

            if !is_text_input {
                match key.code {
                    KeyCode::Char(c) if c == event_config::QUIT_KEY => return Ok(true),
                    code if code == event_config::BACK_KEY => {
                        Self::handle_back_key(app);
                        return Ok(false);
                    }
                    _ => {}
                }
            }

            return Self::route_to_screen_handler(app, key.code);
        }
        Ok(false)
    }

    fn handle_back_key(app: &mut App) {
        if matches!(app.screen, Screen::InputDevices { .. }) {
            let mut engine = AudioEngine::lock_global();
            if let Err(e) = engine.save_config() {
                app.status = format!("Could not save config: {}", e);
            }
        }
        app.screen = Screen::Recorder { selected: 0 };
    }

    fn route_to_screen_handler(
        app: &mut App,
        key: KeyCode,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        match app.screen {
            Screen::Recorder { .. } => RecorderScreen.handle_input(app, key),
            Screen::SaveAs { .. } => SaveScreen.handle_input(app, key),
            Screen::InputDevices { .. } => InputDevicesScreen.handle_input(app, key),
        }
    }
}
