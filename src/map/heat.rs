//! Rainfall density overlay on a grid of terminal cells.

use crate::map::projection::Viewport;
use crate::markers::HeatPoint;
use ratatui::style::Color;
use rayon::prelude::*;

/// Cells below this normalized intensity are left unpainted
const MIN_VISIBLE: f32 = 0.08;

/// Gradient stops (position, rgb), blue through red
const GRADIENT: [(f32, (u8, u8, u8)); 5] = [
    (0.4, (0, 0, 255)),
    (0.6, (0, 255, 255)),
    (0.7, (0, 255, 0)),
    (0.8, (255, 255, 0)),
    (1.0, (255, 0, 0)),
];

/// Normalized heat intensity per character cell
pub struct HeatGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl HeatGrid {
    /// Accumulate Gaussian kernels of `radius_px` braille pixels around each
    /// projected point, then scale so the hottest cell is 1.0
    pub fn build(
        points: &[HeatPoint],
        viewport: &Viewport,
        width: usize,
        height: usize,
        radius_px: f64,
    ) -> Self {
        let sigma = (radius_px / 2.0).max(0.5);
        let cutoff = radius_px * 2.0;
        let projected: Vec<(f64, f64, f64)> = points
            .iter()
            .filter(|p| p.weight > 0.0)
            .map(|p| {
                let (px, py) = viewport.project(p.lon, p.lat);
                (px as f64, py as f64, p.weight)
            })
            .collect();

        let mut values = vec![0.0f32; width * height];
        values
            .par_chunks_mut(width.max(1))
            .enumerate()
            .for_each(|(row, cells)| {
                // Cell centers in braille pixels (2x4 per cell)
                let cy = row as f64 * 4.0 + 2.0;
                for (col, cell) in cells.iter_mut().enumerate() {
                    let cx = col as f64 * 2.0 + 1.0;
                    let mut sum = 0.0;
                    for &(px, py, weight) in &projected {
                        let (dx, dy) = (cx - px, cy - py);
                        if dx.abs() > cutoff || dy.abs() > cutoff {
                            continue;
                        }
                        let d2 = dx * dx + dy * dy;
                        sum += weight * (-d2 / (2.0 * sigma * sigma)).exp();
                    }
                    *cell = sum as f32;
                }
            });

        let max = values.par_iter().cloned().reduce(|| 0.0, f32::max);
        if max > 0.0 {
            values.par_iter_mut().for_each(|v| *v /= max);
        }

        Self {
            width,
            height,
            values,
        }
    }

    /// Normalized intensity at a cell, 0.0 outside the grid
    pub fn intensity(&self, col: usize, row: usize) -> f32 {
        if col >= self.width || row >= self.height {
            return 0.0;
        }
        self.values[row * self.width + col]
    }

    /// Painted cells as (column, row, color)
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Color)> + '_ {
        self.values.iter().enumerate().filter_map(move |(idx, &v)| {
            heat_color(v).map(|color| (idx % self.width, idx / self.width, color))
        })
    }
}

/// Gradient color for a normalized intensity, `None` when too faint to draw
pub fn heat_color(t: f32) -> Option<Color> {
    if !(t >= MIN_VISIBLE) {
        return None;
    }
    let t = t.min(1.0);

    let (first_pos, first) = GRADIENT[0];
    if t <= first_pos {
        return Some(rgb(first));
    }

    for pair in GRADIENT.windows(2) {
        let (lo_pos, lo) = pair[0];
        let (hi_pos, hi) = pair[1];
        if t <= hi_pos {
            let f = (t - lo_pos) / (hi_pos - lo_pos);
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
            return Some(Color::Rgb(mix(lo.0, hi.0), mix(lo.1, hi.1), mix(lo.2, hi.2)));
        }
    }

    Some(rgb(GRADIENT[GRADIENT.len() - 1].1))
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(76.3, 10.5, 100.0, 80, 80)
    }

    #[test]
    fn test_peak_at_heaviest_point() {
        let vp = viewport();
        let points = [
            HeatPoint { lat: 10.5, lon: 76.3, weight: 3000.0 },
            HeatPoint { lat: 9.0, lon: 77.5, weight: 100.0 },
        ];
        let grid = HeatGrid::build(&points, &vp, 40, 20, 6.0);

        let (px, py) = vp.project(76.3, 10.5);
        let (col, row) = (px as usize / 2, py as usize / 4);
        assert!(grid.intensity(col, row) > 0.9);
        assert_eq!(grid.intensity(0, 0), 0.0);
    }

    #[test]
    fn test_zero_weights_paint_nothing() {
        let points = [HeatPoint { lat: 10.5, lon: 76.3, weight: 0.0 }];
        let grid = HeatGrid::build(&points, &viewport(), 40, 20, 6.0);
        assert_eq!(grid.cells().count(), 0);
    }

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(heat_color(0.0), None);
        assert_eq!(heat_color(f32::NAN), None);
        assert_eq!(heat_color(0.2), Some(Color::Rgb(0, 0, 255)));
        assert_eq!(heat_color(0.7), Some(Color::Rgb(0, 255, 0)));
        assert_eq!(heat_color(1.0), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(heat_color(0.8), Some(Color::Rgb(255, 255, 0)));
    }
}
