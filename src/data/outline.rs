use crate::map::LineString;
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// Optional region boundary file inside the data directory
pub const OUTLINE_FILE: &str = "kerala.geojson";

/// Region outline from `<data_dir>/kerala.geojson`, or the built-in
/// approximation when the file is missing or unreadable
pub fn load_or_fallback(data_dir: &Path) -> Vec<LineString> {
    let path = data_dir.join(OUTLINE_FILE);
    if !path.exists() {
        log::info!("no {} in {}, using built-in outline", OUTLINE_FILE, data_dir.display());
        return fallback_outline();
    }

    match load_outline(&path) {
        Ok(lines) if !lines.is_empty() => {
            log::info!("loaded {} outline lines from {}", lines.len(), path.display());
            lines
        }
        Ok(_) => {
            log::warn!("{} has no line geometry, using built-in outline", path.display());
            fallback_outline()
        }
        Err(e) => {
            log::warn!("failed to load {}: {:#}, using built-in outline", path.display(), e);
            fallback_outline()
        }
    }
}

/// Read every line and polygon ring of a GeoJSON file
pub fn load_outline(path: &Path) -> Result<Vec<LineString>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("parsing {}", path.display()))?;

    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    let to_line = |coords: &Vec<Vec<f64>>| -> LineString {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_line(coords));
            }
        }
        // Interior rings included
        Value::Polygon(rings) => {
            for ring in rings {
                add_line(to_line(ring));
            }
        }
        Value::MultiPolygon(polygons) => {
            for ring in polygons.iter().flatten() {
                add_line(to_line(ring));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Coarse Kerala state boundary (lon, lat), coast first from the north,
/// then back up along the Western Ghats
pub fn fallback_outline() -> Vec<LineString> {
    vec![vec![
        (74.86, 12.78), (75.00, 12.50), (75.20, 12.00), (75.45, 11.80),
        (75.60, 11.50), (75.78, 11.25), (75.85, 11.00), (75.92, 10.80),
        (76.00, 10.60), (76.10, 10.40), (76.20, 10.10), (76.25, 9.90),
        (76.30, 9.60), (76.35, 9.30), (76.45, 9.05), (76.55, 8.85),
        (76.70, 8.70), (76.85, 8.50), (77.00, 8.35), (77.12, 8.28),
        (77.20, 8.45), (77.25, 8.70), (77.20, 8.95), (77.30, 9.20),
        (77.20, 9.50), (77.30, 9.75), (77.25, 10.00), (77.10, 10.25),
        (76.85, 10.30), (76.85, 10.60), (76.95, 10.85), (76.70, 11.10),
        (76.45, 11.30), (76.40, 11.65), (76.10, 11.85), (75.95, 12.05),
        (75.60, 12.25), (75.40, 12.55), (75.15, 12.80), (74.86, 12.78),
    ]]
}
