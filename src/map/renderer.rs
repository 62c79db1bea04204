use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_line, draw_ring};
use crate::map::heat::HeatGrid;
use crate::map::projection::Viewport;
use crate::markers::{HeatPoint, Marker};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Heat kernel radius, in the same units as marker radii
pub const HEAT_RADIUS: f64 = 25.0;

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_outline: bool,
    pub show_labels: bool,
    /// Braille pixels per unit of marker radius
    pub marker_scale: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_outline: true,
            show_labels: true,
            marker_scale: 0.25,
        }
    }
}

/// What to draw on top of the region outline
pub struct MapScene<'a> {
    pub markers: &'a [Marker],
    pub heat_points: &'a [HeatPoint],
    pub show_heat: bool,
    /// Index into `markers` of the marker whose popup is open
    pub focused: Option<usize>,
}

/// Rendered layers, back to front
pub struct MapLayers {
    pub heat: Option<HeatGrid>,
    pub outline: BrailleCanvas,
    pub markers: BrailleCanvas,
    pub focus: BrailleCanvas,
    /// District names as (column, row, text)
    pub labels: Vec<(u16, u16, String)>,
}

/// Map renderer: region outline plus district markers and heat overlay
pub struct MapRenderer {
    pub outlines: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new(outlines: Vec<LineString>, settings: DisplaySettings) -> Self {
        Self { outlines, settings }
    }

    /// On-screen radius of a marker in braille pixels
    pub fn marker_radius_px(&self, marker: &Marker) -> i32 {
        ((marker.radius as f64 * self.settings.marker_scale).round() as i32).max(1)
    }

    /// Render all layers for a `width` x `height` character area
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        scene: &MapScene<'_>,
    ) -> MapLayers {
        let mut outline = BrailleCanvas::new(width, height);
        let mut markers = BrailleCanvas::new(width, height);
        let mut focus = BrailleCanvas::new(width, height);
        let mut labels = Vec::new();

        let heat = scene.show_heat.then(|| {
            let radius_px = HEAT_RADIUS * self.settings.marker_scale;
            HeatGrid::build(scene.heat_points, viewport, width, height, radius_px)
        });

        if self.settings.show_outline {
            for line in &self.outlines {
                self.draw_linestring(&mut outline, line, viewport);
            }
        }

        for (idx, marker) in scene.markers.iter().enumerate() {
            let (px, py) = viewport.project(marker.lon, marker.lat);
            if !viewport.is_visible(px, py) {
                continue;
            }
            let radius = self.marker_radius_px(marker);
            draw_circle(&mut markers, px, py, radius);

            if scene.focused == Some(idx) {
                draw_ring(&mut focus, px, py, radius + 2);
            }

            if self.settings.show_labels && px >= 0 && py >= 0 {
                let char_x = ((px + radius) / 2) as u16;
                let char_y = (py / 4) as u16;
                if let Some(label_x) = char_x.checked_add(1) {
                    labels.push((label_x, char_y, marker.district.clone()));
                }
            }
        }

        MapLayers {
            heat,
            outline,
            markers,
            focus,
            labels,
        }
    }

    /// Index of the marker drawn under braille pixel (px, py), nearest first
    pub fn marker_at(
        &self,
        markers: &[Marker],
        viewport: &Viewport,
        px: i32,
        py: i32,
    ) -> Option<usize> {
        markers
            .iter()
            .enumerate()
            .filter_map(|(idx, marker)| {
                let (mx, my) = viewport.project(marker.lon, marker.lat);
                let (dx, dy) = (mx - px, my - py);
                let d2 = dx * dx + dy * dy;
                // One cell of slack around the circle
                let reach = self.marker_radius_px(marker) + 2;
                (d2 <= reach * reach).then_some((idx, d2))
            })
            .min_by_key(|&(_, d2)| d2)
            .map(|(idx, _)| idx)
    }

    /// Draw a linestring with viewport culling
    fn draw_linestring(&self, canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
        if line.len() < 2 {
            return;
        }

        let mut prev: Option<(i32, i32)> = None;

        for &(lon, lat) in line {
            let (px, py) = viewport.project(lon, lat);

            if let Some((prev_x, prev_y)) = prev {
                if viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                    draw_line(canvas, prev_x, prev_y, px, py);
                }
            }

            prev = Some((px, py));
        }
    }

    /// Toggle district name labels
    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    /// Toggle the region outline
    pub fn toggle_outline(&mut self) {
        self.settings.show_outline = !self.settings.show_outline;
    }
}
