use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use flood_map::app::{App, Focus};
use flood_map::cli::Args;
use flood_map::data::{outline, DataPaths, DatasetCache};
use flood_map::map::{DisplaySettings, MapRenderer};
use flood_map::{logging, ui};
use ratatui::DefaultTerminal;
use std::time::Duration;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_path())?;

    // Load before touching the terminal so errors print normally
    let data_dir = args.resolve_data_dir()?;
    let cache = DatasetCache::new(DataPaths::new(&data_dir));
    let settings = DisplaySettings {
        marker_scale: args.marker_scale,
        ..DisplaySettings::default()
    };
    let renderer = MapRenderer::new(outline::load_or_fallback(&data_dir), settings);
    let mut app = App::new(cache, renderer, !args.no_heatmap, args.heat_scope())
        .with_context(|| format!("loading data from {}", data_dir.display()))?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    log::info!("exiting");
    result
}

/// Keys that work regardless of focus; returns false if the key was not handled
fn handle_global_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Tab => app.toggle_focus(),

        // Filters
        KeyCode::Char('a') => app.filters.select_all(),
        KeyCode::Char('x') => app.filters.clear(),
        KeyCode::Char('[') => app.filters.step_date(-1),
        KeyCode::Char(']') => app.filters.step_date(1),
        KeyCode::Char('t') | KeyCode::Char('T') => app.filters.toggle_heatmap(),

        // Layer toggles
        KeyCode::Char('L') => app.map_renderer.toggle_labels(),
        KeyCode::Char('o') | KeyCode::Char('O') => app.map_renderer.toggle_outline(),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Marker popups
        KeyCode::Char(',') => app.cycle_marker(-1),
        KeyCode::Char('.') => app.cycle_marker(1),

        KeyCode::Char('r') | KeyCode::Char('R') => app.reload(),
        KeyCode::Char('0') => app.reset_view(),

        _ => return false,
    }
    true
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if handle_global_key(app, key) {
        return;
    }

    match app.focus {
        Focus::Districts => match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.filters.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => app.filters.move_cursor(1),
            KeyCode::PageUp => app.filters.move_cursor(-10),
            KeyCode::PageDown => app.filters.move_cursor(10),
            KeyCode::Char(' ') | KeyCode::Enter => app.filters.toggle_current(),
            _ => {}
        },
        Focus::Map => match key.code {
            // Pan with hjkl or arrow keys
            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),
            _ => {}
        },
    }
}

/// Handle mouse events for panning, zooming and marker popups
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click opens a popup or starts a drag
        MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                // Resize needs no handling: the next draw re-lays out the panels
                _ => {}
            }
            // Each interaction re-reads the tables if they changed on disk
            app.refresh();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
