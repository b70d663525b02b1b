use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::input_devices_screen::InputDevicesScreen;
use super::recorder_screen::RecorderScreen;
use super::save_screen::SaveScreen;
use super::screen_trait::ScreenTrait;
use super::{App, Screen};

mod layout_config {
    pub const TITLE: &str = "Mic Recorder";
    pub const STATUS_TITLE: &str = "Status";

    pub const HEADER_HEIGHT: u16 = 3;
    pub const FOOTER_HEIGHT: u16 = 3;
    pub const MIN_CONTENT_HEIGHT: u16 = 12;
    pub const MARGIN: u16 = 1;
}

pub struct AppView;

impl AppView {
    pub fn render(f: &mut Frame, app: &App) {
        let chunks = Self::create_layout(f.area(), app);

        Self::render_title(f, app, chunks[0]);
        Self::render_content(f, app, chunks[1]);
        Self::render_status(f, app, chunks[2]);
    }

    fn create_layout(area: Rect, app: &App) -> std::rc::Rc<[Rect]> {
        // Debug lines sit inside the status box, under the status message
        let log_lines = if app.debug_logger.is_enabled() {
            app.debug_logger.get_logs().len() as u16
        } else {
            0
        };

        Layout::default()
            .direction(Direction::Vertical)
            .margin(layout_config::MARGIN)
            .constraints([
                Constraint::Length(layout_config::HEADER_HEIGHT),
                Constraint::Min(layout_config::MIN_CONTENT_HEIGHT),
                Constraint::Length(layout_config::FOOTER_HEIGHT + log_lines),
            ])
            .split(area)
    }

    fn render_title(f: &mut Frame, app: &App, area: Rect) {
        let title = Paragraph::new(layout_config::TITLE)
            .style(Style::default().fg(app.theme.title))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, area);
    }

    fn render_content(f: &mut Frame, app: &App, area: Rect) {
        match app.screen {
            Screen::Recorder { .. } => RecorderScreen.render(f, app, area),
            Screen::SaveAs { .. } => SaveScreen.render(f, app, area),
            Screen::InputDevices { .. } => InputDevicesScreen.render(f, app, area),
        }
    }

    fn render_status(f: &mut Frame, app: &App, area: Rect) {
        let mut lines = vec![Line::styled(
            app.status.clone(),
            Style::default().fg(app.theme.status),
        )];
        if app.debug_logger.is_enabled() {
            lines.extend(
                app.debug_logger
                    .get_logs()
                    .into_iter()
                    .map(|log| Line::styled(log, Style::default().fg(app.theme.log))),
            );
        }

        let status = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .title(layout_config::STATUS_TITLE),
        );
        f.render_widget(status, area);
    }
}
