use crate::app::{App, Focus, Status};
use crate::braille::BrailleCanvas;
use crate::map::{MapLayers, MapScene};
use crate::view::DashboardView;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Widget},
    Frame,
};

const TITLE: &str = "Flood Impact Visualization in Kerala (2018)";
const MAP_CAPTION: &str = " Circle size ~ damaged houses; heatmap weight ~ rainfall ";
const NO_WARNINGS: &str = "No warning records for selected date/districts.";
const MARKER_COLOR: Color = Color::Rgb(220, 20, 60);

/// Render the UI
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(12),   // Body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(40)])
        .split(rows[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Metrics
            Constraint::Percentage(65), // Map
            Constraint::Min(5),         // Warnings
        ])
        .split(body[1]);

    // The viewport follows the map panel, so size it before building the view
    let map_block = panel(" Flood map ", app.focus == Focus::Map).title_bottom(Span::styled(
        MAP_CAPTION,
        Style::default().fg(Color::DarkGray),
    ));
    let map_inner = map_block.inner(right[1]);
    app.set_map_area(map_inner);

    let app: &App = app;
    render_title(frame, rows[0]);
    render_status_bar(frame, app, rows[2]);

    let Some(view) = app.view() else {
        let message = Paragraph::new("No data loaded").alignment(Alignment::Center);
        frame.render_widget(message, rows[1]);
        return;
    };

    let focused = app
        .focused_district
        .as_ref()
        .and_then(|name| view.markers.iter().position(|m| &m.district == name));

    render_sidebar(frame, app, &view, focused, body[0]);
    render_metrics(frame, &view, right[0]);

    frame.render_widget(map_block, right[1]);
    render_map(frame, app, &view, focused, map_inner);

    render_warnings(frame, app, &view, right[2]);
}

/// Bordered block, highlighted when it has keyboard focus
fn panel(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(Span::styled(
        TITLE,
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, area);
}

fn render_sidebar(
    frame: &mut Frame,
    app: &App,
    view: &DashboardView<'_>,
    focused: Option<usize>,
    area: Rect,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),    // District multi-select
            Constraint::Length(3), // Date
            Constraint::Length(3), // Heatmap toggle
            Constraint::Length(7), // Marker popup
        ])
        .split(area);

    let filters = &app.filters;

    let items: Vec<ListItem> = filters
        .districts
        .iter()
        .map(|name| {
            let (mark, color) = if filters.is_selected(name) {
                ("[x] ", Color::Green)
            } else {
                ("[ ] ", Color::DarkGray)
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, Style::default().fg(color)),
                Span::raw(name.as_str()),
            ]))
        })
        .collect();
    let title = format!(
        " Districts {}/{} ",
        filters.selection.districts.len(),
        filters.districts.len()
    );
    let list = List::new(items)
        .block(panel(&title, app.focus == Focus::Districts))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if app.focus == Focus::Districts {
        state.select(Some(filters.cursor));
    }
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let date_text = match view.date {
        Some(date) => {
            let position = filters
                .dates
                .binary_search(&date)
                .map_or(0, |idx| idx + 1);
            Line::from(vec![
                Span::styled("[ ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    date.format("%Y-%m-%d").to_string(),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    format!(" ]  {}/{}", position, filters.dates.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        None => Line::from(Span::styled("no dates", Style::default().fg(Color::DarkGray))),
    };
    frame.render_widget(
        Paragraph::new(date_text).block(panel(" Date (warnings) ", false)),
        chunks[1],
    );

    let (mark, color) = if filters.show_heatmap {
        ("[x]", Color::Green)
    } else {
        ("[ ]", Color::DarkGray)
    };
    let heat_text = Line::from(vec![
        Span::styled(mark, Style::default().fg(color)),
        Span::raw(" Show rainfall heatmap"),
    ]);
    frame.render_widget(
        Paragraph::new(heat_text).block(panel(" Heatmap ", false)),
        chunks[2],
    );

    let popup = match focused.map(|idx| &view.markers[idx].label) {
        Some(label) => {
            let mut lines = vec![Line::from(Span::styled(
                label.title.as_str(),
                Style::default().fg(MARKER_COLOR).add_modifier(Modifier::BOLD),
            ))];
            lines.extend(label.fields().into_iter().map(|(caption, value)| {
                Line::from(vec![
                    Span::styled(format!("{caption}: "), Style::default().fg(Color::DarkGray)),
                    Span::raw(value.to_string()),
                ])
            }));
            lines
        }
        None => vec![Line::from(Span::styled(
            "Click a marker or press . to inspect",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    frame.render_widget(Paragraph::new(popup).block(panel(" Marker ", false)), chunks[3]);
}

fn render_metrics(frame: &mut Frame, view: &DashboardView<'_>, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let metrics = [
        (" Total Fatalities ", view.summary.fatalities),
        (" Total Camps ", view.summary.camps),
        (" Damaged Houses ", view.summary.damaged_houses),
    ];
    for ((title, value), column) in metrics.into_iter().zip(columns.iter()) {
        let text = Span::styled(
            value.to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        );
        let metric = Paragraph::new(Line::from(text))
            .alignment(Alignment::Center)
            .block(panel(title, false));
        frame.render_widget(metric, *column);
    }
}

fn render_map(
    frame: &mut Frame,
    app: &App,
    view: &DashboardView<'_>,
    focused: Option<usize>,
    inner: Rect,
) {
    let scene = MapScene {
        markers: &view.markers,
        heat_points: &view.heat_points,
        show_heat: view.show_heat_overlay,
        focused,
    };
    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &app.viewport,
        &scene,
    );

    frame.render_widget(MapWidget { layers }, inner);
}

/// Custom widget that renders braille map layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.glyphs() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            let x = area.x + col as u16;
            let y = area.y + row as u16;
            buf[(x, y)].set_char(ch).set_fg(color);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // 1. Rainfall heat as cell background
        if let Some(heat) = &self.layers.heat {
            for (col, row, color) in heat.cells() {
                if col < area.width as usize && row < area.height as usize {
                    buf[(area.x + col as u16, area.y + row as u16)].set_bg(color);
                }
            }
        }

        // 2. Region outline, 3. markers, 4. focus ring
        Self::render_layer(&self.layers.outline, Color::Gray, area, buf);
        Self::render_layer(&self.layers.markers, MARKER_COLOR, area, buf);
        Self::render_layer(&self.layers.focus, Color::White, area, buf);

        // 5. District names
        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = area.width.saturating_sub(*lx) as usize;
            for (i, ch) in text.chars().take(max_len).enumerate() {
                let x = area.x + *lx + i as u16;
                buf[(x, area.y + *ly)].set_char(ch).set_style(label_style);
            }
        }
    }
}

fn render_warnings(frame: &mut Frame, app: &App, view: &DashboardView<'_>, area: Rect) {
    let title = match view.date {
        Some(date) => format!(" Warnings on {} ", date.format("%Y-%m-%d")),
        None => " Warnings ".to_string(),
    };
    let block = panel(&title, false);

    if !view.has_warnings() {
        let empty = Paragraph::new(Span::styled(NO_WARNINGS, Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let Some(dataset) = app.cache.current() else {
        return;
    };
    let columns = &dataset.warnings.columns;

    let header_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let header = Row::new(
        ["district", "date"]
            .into_iter()
            .chain(columns.iter().map(String::as_str))
            .map(|h| Cell::from(h.to_string()).style(header_style)),
    );

    let rows = view.warnings.iter().map(|w| {
        let mut cells = vec![
            Cell::from(w.district.clone()),
            Cell::from(w.date.format("%Y-%m-%d").to_string()),
        ];
        cells.extend(w.fields.iter().map(|f| Cell::from(f.clone())));
        Row::new(cells)
    });

    let widths = vec![Constraint::Fill(1); columns.len() + 2];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;
    let toggle = |on: bool, on_text: &'static str, off_text: &'static str| {
        Span::styled(
            if on { on_text } else { off_text },
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        toggle(app.filters.show_heatmap, "[T]heat ", "[t]heat "),
        toggle(settings.show_labels, "[L]abels ", "[l]abels "),
        toggle(settings.show_outline, "[O]utline ", "[o]utline "),
        Span::styled(
            "| tab:focus space:toggle a/x:all/none [ ]:date ,.:marker +/-:zoom r:reload q:quit ",
            Style::default().fg(Color::DarkGray),
        ),
    ];

    match &app.status {
        Some(Status::Info(text)) => {
            spans.push(Span::styled(text.as_str(), Style::default().fg(Color::Green)));
        }
        Some(Status::Error(text)) => {
            spans.push(Span::styled(text.as_str(), Style::default().fg(Color::Red)));
        }
        None => {}
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::app;
    use ratatui::{backend::TestBackend, Terminal};

    /// Draw one frame and return the screen as text, one line per row
    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_warnings_table_lists_selected_rows() {
        let (mut app, paths) = app("ui-table");
        let screen = draw(&mut app);

        assert!(screen.contains("Warnings on 2018-08-16"));
        let header = screen
            .lines()
            .find(|line| line.contains("predicted_warning"))
            .unwrap();
        assert!(header.contains("district"));
        assert!(header.contains("date"));
        assert!(header.contains("actual_warning"));
        assert!(screen.lines().any(|l| l.contains("Wayanad") && l.contains("yellow")));
        assert!(!screen.contains(NO_WARNINGS));
        assert!(screen.contains("Total Fatalities"));

        std::fs::remove_dir_all(&paths.dir).unwrap();
    }

    #[test]
    fn test_empty_selection_shows_no_records_message() {
        let (mut app, paths) = app("ui-empty");
        app.filters.clear();
        let screen = draw(&mut app);

        assert!(screen.contains(NO_WARNINGS));
        assert!(!screen.contains("predicted_warning"));

        std::fs::remove_dir_all(&paths.dir).unwrap();
    }
}
