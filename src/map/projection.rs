use std::f64::consts::PI;

/// Closest zoom allowed, in multiples of the whole-world width
const MAX_ZOOM: f64 = 5000.0;
/// Farthest zoom allowed
const MIN_ZOOM: f64 = 1.0;
/// Fraction of the canvas left empty around fitted bounds
const FIT_PADDING: f64 = 0.15;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (canvas widths per world width)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Web Mercator y in [0, 1] for a latitude in degrees
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Viewport of the given pixel size that frames a (min_lon, min_lat,
    /// max_lon, max_lat) box with some padding
    pub fn fit_bounds(bounds: (f64, f64, f64, f64), width: usize, height: usize) -> Self {
        let (min_lon, min_lat, max_lon, max_lat) = bounds;
        let span_x = (mercator_x(max_lon) - mercator_x(min_lon)).max(f64::EPSILON);
        let span_y = (mercator_y(min_lat) - mercator_y(max_lat)).max(f64::EPSILON);

        // scale = zoom * width pixels per unit of normalized Mercator space
        let w = width.max(1) as f64;
        let h = height.max(1) as f64;
        let zoom_x = 1.0 / span_x;
        let zoom_y = h / (w * span_y);
        let zoom = (zoom_x.min(zoom_y) * (1.0 - FIT_PADDING)).clamp(MIN_ZOOM, MAX_ZOOM);

        Self::new(
            (min_lon + max_lon) / 2.0,
            (min_lat + max_lat) / 2.0,
            zoom,
            width,
            height,
        )
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * self.center_lat.to_radians().cos();

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor keeping the point under (px, py) in place
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        // Shift the center so (lon, lat) lands back on (px, py)
        let scale = self.zoom * self.width.max(1) as f64;
        let x = mercator_x(lon) - (px as f64 - self.width as f64 / 2.0) / scale;
        let y = mercator_y(lat) - (py as f64 - self.height as f64 / 2.0) / scale;
        self.center_lon = x * 360.0 - 180.0;
        self.center_lat = ((PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI).clamp(-85.0, 85.0);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.zoom * self.width.max(1) as f64;

        let x = (px as f64 - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py as f64 - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);

        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;
        (lon, lat)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.zoom * self.width.max(1) as f64;

        let px = (mercator_x(lon) - mercator_x(self.center_lon)) * scale + self.width as f64 / 2.0;
        let py = (mercator_y(lat) - mercator_y(self.center_lat)) * scale + self.height as f64 / 2.0;

        (px.round() as i32, py.round() as i32)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
