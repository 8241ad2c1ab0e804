use crate::app::{App, LoadState};
use crate::braille::BrailleCanvas;
use crate::map::{CountrySelected, MapLayers, MapRenderer};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

const PANEL_WIDTH: u16 = 34;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Countries {} ", app.mode.label());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = MapRenderer::new(&app.camera, inner.width as usize, inner.height as usize).render(&app.scene);
    frame.render_widget(MapWidget { layers }, inner);

    if let Some(country) = app.selection.panel() {
        render_info_panel(frame, country, inner);
    }
}

/// Braille map layers composited back to front
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                if let Some(ch) = canvas.glyph(col as usize, row as usize) {
                    buf[(area.x + col, area.y + row)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::render_layer(&self.layers.stars, Color::Gray, area, buf);
        Self::render_layer(&self.layers.graticule, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.dimmed, Color::DarkGray, area, buf);
        // Highlight is pushed after the default tint, so it lands on top
        for (color, canvas) in &self.layers.countries {
            Self::render_layer(canvas, *color, area, buf);
        }
    }
}

/// Where the info panel sits inside the map, `None` if the map is too small
pub fn info_panel_area(map: Rect) -> Option<Rect> {
    if map.width < PANEL_WIDTH + 2 || map.height < 6 {
        return None;
    }
    Some(Rect::new(map.x + map.width - PANEL_WIDTH - 1, map.y + 1, PANEL_WIDTH, 4))
}

/// Name and ISO code of the selected country, top right of the map
fn render_info_panel(frame: &mut Frame, country: &CountrySelected, map: Rect) {
    let Some(area) = info_panel_area(map) else {
        return;
    };
    let code = if country.code.is_empty() { "-" } else { country.code.as_str() };
    let text = vec![
        Line::from(Span::styled(
            country.name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("ISO ", Style::default().fg(Color::DarkGray)),
            Span::styled(code.to_string(), Style::default().fg(Color::White)),
        ]),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" Selected ", Style::default().fg(Color::Cyan)));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let data_color = match app.load_state {
        LoadState::Loading => Color::Yellow,
        LoadState::Ready => Color::Green,
        LoadState::Failed(_) => Color::Red,
    };
    let selected = match app.selection.panel() {
        Some(country) if country.code.is_empty() => country.name.clone(),
        Some(country) => format!("{} ({})", country.name, country.code),
        None => "none".to_string(),
    };

    let status = Line::from(vec![
        Span::styled(" Mode: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.mode.label(), Style::default().fg(Color::Yellow)),
        Span::styled(" ", Style::default()),
        Span::styled(app.toggle_hint(), Style::default().fg(Color::Green)),
        Span::styled(" | Selected: ", Style::default().fg(Color::DarkGray)),
        Span::styled(selected, Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.data_status(), Style::default().fg(data_color)),
        Span::styled(
            " | click:select drag:rotate scroll:zoom esc:clear q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use serde_json::Map as JsonObject;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let area = buf.area;
        (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_status_bar_shows_mode_and_hint() {
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).expect("terminal");
        let mut app = App::new(120, 20, 2.0, 50);
        terminal.draw(|frame| render(frame, &app)).expect("draw");
        let text = screen(&terminal);
        assert!(text.contains("Mode: 3D"));
        assert!(text.contains("[t] Switch to 2D"));
        assert!(text.contains("loading..."));

        app.toggle_mode();
        terminal.draw(|frame| render(frame, &app)).expect("draw");
        assert!(screen(&terminal).contains("[t] Switch to 3D"));
    }

    #[test]
    fn test_info_panel_lists_selection() {
        let area = Rect::new(0, 0, 80, 20);
        let mut terminal = Terminal::new(TestBackend::new(area.width, area.height)).expect("terminal");
        let country = CountrySelected {
            name: "Atlantis".into(),
            code: "ATL".into(),
            properties: JsonObject::new(),
        };
        terminal
            .draw(|frame| render_info_panel(frame, &country, area))
            .expect("draw");
        let text = screen(&terminal);
        assert!(text.contains("Atlantis"));
        assert!(text.contains("ISO ATL"));
    }

    #[test]
    fn test_info_panel_area() {
        let panel = info_panel_area(Rect::new(1, 1, 80, 40)).expect("fits");
        assert_eq!(panel, Rect::new(46, 2, PANEL_WIDTH, 4));
        assert!(info_panel_area(Rect::new(1, 1, 20, 40)).is_none());
    }
}
