use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

pub mod debug_logger;
pub mod theme;

mod event_handler;
mod input_devices_screen;
mod recorder_screen;
mod save_screen;
mod screen_trait;
mod view;

use crate::audio_engine::AudioEngine;
use crate::recorder::Recorder;
use debug_logger::DebugLogger;
use event_handler::AppEventHandler;
use theme::Theme;
use view::AppView;

pub enum Screen {
    Recorder { selected: usize },
    SaveAs { file_name: String },
    InputDevices { selected: usize },
}

pub struct App {
    pub screen: Screen,
    pub status: String,
    pub recorder: Recorder,
    pub theme: Theme,
    pub debug_logger: DebugLogger,
}

impl App {
    pub fn new(theme: Theme) -> Self {
        App {
            screen: Screen::Recorder { selected: 0 },
            status: String::from("Ready"),
            recorder: Recorder::new(),
            theme,
            debug_logger: DebugLogger::handle(),
        }
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (debug, theme_path) = {
        let engine = AudioEngine::lock_global();
        (engine.config().debug, engine.config().theme.clone())
    };
    DebugLogger::init(debug);

    let (theme, theme_message) = Theme::load(&theme_path);
    let mut app = App::new(theme);
    if let Some(message) = theme_message {
        app.status = message;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    // Window close: stop the input before tearing the terminal down
    app.recorder.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| AppView::render(f, &*app))?;

        if AppEventHandler::process_events(app)? {
            return Ok(());
        }
    }
}
