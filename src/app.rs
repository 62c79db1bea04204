use crate::data::{Dataset, DatasetCache, LoadError};
use crate::geo;
use crate::map::{MapRenderer, Viewport};
use crate::markers::HeatScope;
use crate::view::{recompute_view, DashboardView, FilterSelection};
use chrono::NaiveDate;
use ratatui::layout::Rect;

/// Panel receiving navigation keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Districts,
    Map,
}

/// Message shown in the status bar
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Sidebar option lists and the user's current choice
#[derive(Clone, Debug, PartialEq)]
pub struct FilterState {
    /// Every district of the summary table, sorted
    pub districts: Vec<String>,
    /// Every warning date, ascending
    pub dates: Vec<NaiveDate>,
    pub selection: FilterSelection,
    /// Highlighted row of the district list
    pub cursor: usize,
    pub show_heatmap: bool,
}

impl FilterState {
    /// All districts selected, latest date
    pub fn new(dataset: &Dataset, show_heatmap: bool) -> Self {
        let districts = dataset.district_names();
        let dates = dataset.warning_dates();
        let selection = FilterSelection {
            districts: districts.iter().cloned().collect(),
            date: dates.last().copied(),
        };

        Self {
            districts,
            dates,
            selection,
            cursor: 0,
            show_heatmap,
        }
    }

    /// Adopt the option lists of a freshly loaded dataset, keeping whatever
    /// part of the selection still exists. A selection that covered every
    /// district keeps covering every district, new ones included.
    pub fn sync(&mut self, dataset: &Dataset) {
        let had_all = !self.districts.is_empty()
            && self.districts.iter().all(|d| self.selection.districts.contains(d));

        self.districts = dataset.district_names();
        self.dates = dataset.warning_dates();

        if had_all {
            self.select_all();
        } else {
            let known = &self.districts;
            self.selection.districts.retain(|d| known.contains(d));
        }

        let date_known = self
            .selection
            .date
            .is_some_and(|d| self.dates.binary_search(&d).is_ok());
        if !date_known {
            self.selection.date = self.dates.last().copied();
        }

        self.cursor = self.cursor.min(self.districts.len().saturating_sub(1));
    }

    pub fn is_selected(&self, district: &str) -> bool {
        self.selection.districts.contains(district)
    }

    pub fn move_cursor(&mut self, delta: i32) {
        if self.districts.is_empty() {
            return;
        }
        let last = self.districts.len() as i32 - 1;
        self.cursor = (self.cursor as i32 + delta).clamp(0, last) as usize;
    }

    /// Flip the district under the cursor in or out of the selection
    pub fn toggle_current(&mut self) {
        let Some(district) = self.districts.get(self.cursor) else {
            return;
        };
        if !self.selection.districts.remove(district) {
            self.selection.districts.insert(district.clone());
        }
    }

    pub fn select_all(&mut self) {
        self.selection.districts = self.districts.iter().cloned().collect();
    }

    pub fn clear(&mut self) {
        self.selection.districts.clear();
    }

    /// Step the selected date through `dates`, stopping at either end
    pub fn step_date(&mut self, delta: i32) {
        if self.dates.is_empty() {
            return;
        }
        let current = self
            .selection
            .date
            .and_then(|d| self.dates.binary_search(&d).ok())
            .unwrap_or(self.dates.len() - 1);
        let last = self.dates.len() as i32 - 1;
        let next = (current as i32 + delta).clamp(0, last) as usize;
        self.selection.date = Some(self.dates[next]);
    }

    pub fn toggle_heatmap(&mut self) {
        self.show_heatmap = !self.show_heatmap;
    }
}

/// Application state
pub struct App {
    pub cache: DatasetCache,
    pub filters: FilterState,
    pub heat_scope: HeatScope,
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    /// Inner area of the map panel from the last frame
    pub map_area: Rect,
    pub focus: Focus,
    /// District whose marker popup is open
    pub focused_district: Option<String>,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    pub status: Option<Status>,
    pub should_quit: bool,
    /// Cache generation the filters were derived from
    generation: u64,
    /// Set once the user pans or zooms; until then the map tracks the panel size
    view_moved: bool,
}

impl App {
    /// Load the dataset (if not already cached) and derive the initial filters
    pub fn new(
        mut cache: DatasetCache,
        map_renderer: MapRenderer,
        show_heatmap: bool,
        heat_scope: HeatScope,
    ) -> Result<Self, LoadError> {
        let filters = FilterState::new(cache.get()?, show_heatmap);
        let generation = cache.generation();
        let (lon, lat) = geo::MAP_CENTER;

        Ok(Self {
            cache,
            filters,
            heat_scope,
            viewport: Viewport::new(lon, lat, 1.0, 0, 0),
            map_renderer,
            map_area: Rect::default(),
            focus: Focus::Districts,
            focused_district: None,
            last_mouse: None,
            status: None,
            should_quit: false,
            generation,
            view_moved: false,
        })
    }

    /// Everything the current frame shows
    pub fn view(&self) -> Option<DashboardView<'_>> {
        let dataset = self.cache.current()?;
        Some(recompute_view(
            dataset,
            &self.filters.selection,
            self.filters.show_heatmap,
            self.heat_scope,
        ))
    }

    /// Pick up on-disk changes to the data files
    pub fn refresh(&mut self) {
        let result = self.cache.get().map(|_| ());
        self.after_load(result, false);
    }

    /// Re-read the data files unconditionally
    pub fn reload(&mut self) {
        let result = self.cache.reload().map(|_| ());
        self.after_load(result, true);
    }

    fn after_load(&mut self, result: Result<(), LoadError>, explicit: bool) {
        match result {
            Ok(()) => {
                if self.cache.generation() != self.generation {
                    self.generation = self.cache.generation();
                    if let Some(dataset) = self.cache.current() {
                        self.filters.sync(dataset);
                    }
                }
                if explicit {
                    self.status = Some(Status::Info(format!(
                        "Reloaded {}",
                        self.cache.paths().dir.display()
                    )));
                } else if matches!(self.status, Some(Status::Error(_))) {
                    self.status = None;
                }
            }
            Err(e) => {
                let message = format!("Reload failed, showing previous data: {e}");
                if self.status != Some(Status::Error(message.clone())) {
                    log::error!("{}", message);
                }
                self.status = Some(Status::Error(message));
            }
        }
    }

    /// Record the map panel's inner area; refits the map until the user moves it
    pub fn set_map_area(&mut self, area: Rect) {
        if area == self.map_area {
            return;
        }
        self.map_area = area;
        let width = area.width as usize * 2;
        let height = area.height as usize * 4;
        if self.view_moved {
            self.viewport.width = width;
            self.viewport.height = height;
        } else {
            self.viewport = Viewport::fit_bounds(geo::district_bounds(), width, height);
        }
    }

    /// Frame all districts again
    pub fn reset_view(&mut self) {
        self.view_moved = false;
        self.viewport = Viewport::fit_bounds(
            geo::district_bounds(),
            self.map_area.width as usize * 2,
            self.map_area.height as usize * 4,
        );
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.view_moved = true;
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.view_moved = true;
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.view_moved = true;
        self.viewport.zoom_out();
    }

    /// Braille pixel under a terminal cell, if the cell is on the map
    pub fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        let inside = col >= area.x
            && col < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        inside.then(|| {
            let px = (col - area.x) as i32 * 2 + 1;
            let py = (row - area.y) as i32 * 4 + 2;
            (px, py)
        })
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.view_moved = true;
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.view_moved = true;
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Left click: open the popup of the marker under the cursor, or start a drag
    pub fn click(&mut self, col: u16, row: u16) {
        let Some((px, py)) = self.map_pixel(col, row) else {
            return;
        };
        self.focus = Focus::Map;

        let hit = self.view().and_then(|view| {
            self.map_renderer
                .marker_at(&view.markers, &self.viewport, px, py)
                .map(|idx| view.markers[idx].district.clone())
        });
        match hit {
            Some(district) => self.focused_district = Some(district),
            None => self.last_mouse = Some((col, row)),
        }
    }

    /// Pan by the distance dragged since the last event
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (last_col as i32 - col as i32) * 2;
            let dy = (last_row as i32 - row as i32) * 4;
            self.pan(dx, dy);
            self.last_mouse = Some((col, row));
        }
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Move the open popup to the next (or previous) visible marker
    pub fn cycle_marker(&mut self, delta: i32) {
        let districts: Vec<String> = self
            .view()
            .map(|view| view.markers.into_iter().map(|m| m.district).collect())
            .unwrap_or_default();
        if districts.is_empty() {
            self.focused_district = None;
            return;
        }

        let count = districts.len() as i32;
        let current = self
            .focused_district
            .as_ref()
            .and_then(|name| districts.iter().position(|d| d == name));
        let next = match current {
            Some(idx) => (idx as i32 + delta).rem_euclid(count),
            None if delta < 0 => count - 1,
            None => 0,
        };
        self.focused_district = districts.into_iter().nth(next as usize);
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Districts => Focus::Map,
            Focus::Map => Focus::Districts,
        };
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.0}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.2}°{}, {:.2}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::tests::{sample_dataset, DISTRICTS_CSV, WARNINGS_CSV};
    use crate::data::DataPaths;
    use crate::map::DisplaySettings;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, m, d).unwrap()
    }

    #[test]
    fn test_initial_filters_select_everything() {
        let filters = FilterState::new(&sample_dataset(), true);
        assert_eq!(filters.selection.districts.len(), 4);
        assert_eq!(filters.selection.date, Some(date(8, 16)));
        assert!(filters.show_heatmap);
    }

    #[test]
    fn test_toggle_and_bulk_selection() {
        let mut filters = FilterState::new(&sample_dataset(), true);
        filters.move_cursor(2);
        assert_eq!(filters.districts[filters.cursor], "Idukki");
        filters.toggle_current();
        assert!(!filters.is_selected("Idukki"));
        filters.toggle_current();
        assert!(filters.is_selected("Idukki"));

        filters.clear();
        assert!(filters.selection.districts.is_empty());
        filters.select_all();
        assert_eq!(filters.selection.districts.len(), 4);

        filters.move_cursor(100);
        assert_eq!(filters.cursor, 3);
        filters.move_cursor(-100);
        assert_eq!(filters.cursor, 0);
    }

    #[test]
    fn test_step_date_stops_at_ends() {
        let mut filters = FilterState::new(&sample_dataset(), true);
        filters.step_date(1);
        assert_eq!(filters.selection.date, Some(date(8, 16)));
        filters.step_date(-1);
        assert_eq!(filters.selection.date, Some(date(8, 15)));
        filters.step_date(-1);
        assert_eq!(filters.selection.date, Some(date(8, 15)));
    }

    #[test]
    fn test_sync_keeps_surviving_selection() {
        let mut dataset = sample_dataset();
        let mut filters = FilterState::new(&dataset, true);
        filters.clear();
        filters.selection.districts.insert("Idukki".to_string());
        filters.selection.districts.insert("Wayanad".to_string());
        filters.step_date(-1);

        dataset.districts.retain(|d| d.district != "Wayanad");
        dataset.warnings.rows.retain(|w| w.date != date(8, 15));
        filters.sync(&dataset);

        assert_eq!(filters.districts.len(), 3);
        assert!(filters.is_selected("Idukki"));
        assert!(!filters.is_selected("Wayanad"));
        assert_eq!(filters.selection.date, Some(date(8, 16)));
    }

    #[test]
    fn test_sync_extends_full_selection_to_new_districts() {
        let mut dataset = sample_dataset();
        let mut filters = FilterState::new(&dataset, true);

        let mut kollam = dataset.districts[0].clone();
        kollam.district = "Kollam".to_string();
        dataset.districts.push(kollam);
        filters.sync(&dataset);

        assert_eq!(filters.districts.len(), 5);
        assert!(filters.is_selected("Kollam"));
        assert_eq!(filters.selection.districts.len(), 5);
    }

    #[test]
    fn test_heatmap_toggle() {
        let mut filters = FilterState::new(&sample_dataset(), false);
        filters.toggle_heatmap();
        assert!(filters.show_heatmap);
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flood-map-app-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(path: &Path, secs_ahead: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(secs_ahead))
            .unwrap();
    }

    /// App over the sample tables written to a fresh scratch directory
    pub(crate) fn app(name: &str) -> (App, DataPaths) {
        let paths = DataPaths::new(scratch_dir(name));
        fs::write(&paths.districts, DISTRICTS_CSV).unwrap();
        fs::write(&paths.warnings, WARNINGS_CSV).unwrap();
        let renderer = MapRenderer::new(Vec::new(), DisplaySettings::default());
        let app = App::new(DatasetCache::new(paths.clone()), renderer, true, HeatScope::Selected)
            .unwrap();
        (app, paths)
    }

    #[test]
    fn test_app_map_interaction() {
        let (mut app, paths) = app("map");
        app.set_map_area(Rect::new(30, 3, 60, 20));
        assert_eq!(app.viewport.width, 120);
        assert_eq!(app.viewport.height, 80);
        assert_eq!(app.map_pixel(29, 5), None);
        assert_eq!(app.map_pixel(30, 3), Some((1, 2)));

        // Markers follow table order: Idukki, Ernakulam, Wayanad
        app.cycle_marker(1);
        assert_eq!(app.focused_district.as_deref(), Some("Idukki"));
        app.cycle_marker(1);
        assert_eq!(app.focused_district.as_deref(), Some("Ernakulam"));
        app.cycle_marker(-1);
        assert_eq!(app.focused_district.as_deref(), Some("Idukki"));

        let before = app.viewport.clone();
        app.pan(10, 0);
        app.set_map_area(Rect::new(30, 3, 70, 20));
        assert!(app.viewport.center_lon > before.center_lon);
        app.reset_view();
        assert_eq!(app.viewport, Viewport::fit_bounds(geo::district_bounds(), 140, 80));

        let view = app.view().unwrap();
        assert_eq!(view.summary.fatalities, 67);
        assert_eq!(view.warnings.len(), 2);

        fs::remove_dir_all(&paths.dir).unwrap();
    }

    #[test]
    fn test_failed_reload_keeps_data_until_files_recover() {
        let (mut app, paths) = app("reload");

        fs::write(&paths.warnings, "district,date\nIdukki,bad\n").unwrap();
        touch(&paths.warnings, 2);
        app.reload();
        assert!(matches!(app.status, Some(Status::Error(_))));
        assert_eq!(app.view().unwrap().warnings.len(), 2);
        assert_eq!(app.filters.dates.len(), 2);

        // Same broken files: still the old data, still the error
        app.refresh();
        assert!(matches!(app.status, Some(Status::Error(_))));

        let fixed = format!("{WARNINGS_CSV}Idukki,08/17/2018,orange,orange\n");
        fs::write(&paths.warnings, fixed).unwrap();
        touch(&paths.warnings, 5);

        app.refresh();
        assert_eq!(app.status, None);
        assert_eq!(app.filters.dates.len(), 3);
        assert_eq!(app.filters.selection.date, Some(date(8, 16)));
        assert_eq!(app.view().unwrap().warnings.len(), 2);

        app.reload();
        assert!(matches!(app.status, Some(Status::Info(_))));

        fs::remove_dir_all(&paths.dir).unwrap();
    }
}
