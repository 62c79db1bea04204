use crate::data::DistrictRecord;
use crate::geo;
use std::collections::BTreeSet;
use std::fmt;

/// Smallest marker radius, used for districts with no damaged houses
pub const MIN_RADIUS: u32 = 6;
/// Radius at which markers stop growing
pub const MAX_RADIUS: u32 = 40;
/// Damaged houses per unit of radius
const HOUSES_PER_RADIUS: f64 = 50.0;

/// Which districts contribute heat-points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeatScope {
    /// Same districts as the markers
    #[default]
    Selected,
    /// Every district with known coordinates, whatever the selection
    AllDistricts,
}

/// Popup text for a marker. Absent values stay empty rather than zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLabel {
    pub title: String,
    pub fatalities: String,
    pub camps: String,
    pub damaged_houses: String,
    pub rainfall_mm: String,
}

impl MarkerLabel {
    pub fn new(row: &DistrictRecord) -> Self {
        fn text<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        Self {
            title: row.district.clone(),
            fatalities: text(row.fatalities),
            camps: text(row.no_of_camps),
            damaged_houses: text(row.full_damaged_houses),
            rainfall_mm: text(row.actual_rainfall_in_mm),
        }
    }

    /// (caption, value) pairs below the title
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("Fatalities", self.fatalities.as_str()),
            ("Camps", self.camps.as_str()),
            ("Damaged houses", self.damaged_houses.as_str()),
            ("Rainfall (mm)", self.rainfall_mm.as_str()),
        ]
    }
}

impl fmt::Display for MarkerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        for (caption, value) in self.fields() {
            write!(f, "\n{}: {}", caption, value)?;
        }
        Ok(())
    }
}

/// Circle annotation for one district
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub district: String,
    pub lat: f64,
    pub lon: f64,
    pub radius: u32,
    pub label: MarkerLabel,
}

/// Weighted location feeding the rainfall overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    pub markers: Vec<Marker>,
    pub heat_points: Vec<HeatPoint>,
}

/// Marker radius for a damaged-house count: 6 + houses/50, truncated,
/// saturating at 40. A missing count sizes like zero.
pub fn marker_radius(damaged_houses: Option<u64>) -> u32 {
    let houses = damaged_houses.unwrap_or(0) as f64;
    let radius = (houses / HOUSES_PER_RADIUS + MIN_RADIUS as f64).min(MAX_RADIUS as f64);
    (radius as u32).max(MIN_RADIUS)
}

/// Join district rows with their coordinates.
///
/// Rows without a known coordinate produce nothing. With a non-empty
/// `selected` set, only selected districts get a marker; an empty set means
/// no filtering. Heat-points follow `scope`.
pub fn build_markers(
    districts: &[DistrictRecord],
    selected: &BTreeSet<String>,
    scope: HeatScope,
) -> MarkerSet {
    let mut set = MarkerSet::default();

    for row in districts {
        let Some(coord) = geo::lookup(&row.district) else {
            log::debug!("no coordinates for district {:?}, skipping", row.district);
            continue;
        };

        let heat = HeatPoint {
            lat: coord.lat,
            lon: coord.lon,
            weight: row.actual_rainfall_in_mm.unwrap_or(0.0),
        };

        if !selected.is_empty() && !selected.contains(&row.district) {
            if scope == HeatScope::AllDistricts {
                set.heat_points.push(heat);
            }
            continue;
        }

        set.markers.push(Marker {
            district: row.district.clone(),
            lat: coord.lat,
            lon: coord.lon,
            radius: marker_radius(row.full_damaged_houses),
            label: MarkerLabel::new(row),
        });
        set.heat_points.push(heat);
    }

    set
}

/// The overlay is drawn only when toggled on and there is something to draw
pub fn heat_overlay_visible(show_heatmap: bool, heat_points: &[HeatPoint]) -> bool {
    show_heatmap && !heat_points.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::sample_dataset;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_radius_examples() {
        assert_eq!(marker_radius(Some(0)), 6);
        assert_eq!(marker_radius(None), 6);
        assert_eq!(marker_radius(Some(75)), 7);
        assert_eq!(marker_radius(Some(500)), 16);
        assert_eq!(marker_radius(Some(1700)), 40);
        assert_eq!(marker_radius(Some(2000)), 40);
        assert_eq!(marker_radius(Some(u64::MAX)), 40);
    }

    #[test]
    fn test_radius_monotonic_and_bounded() {
        let mut last = 0;
        for houses in (0..5000).step_by(7) {
            let r = marker_radius(Some(houses));
            assert!(r >= last);
            assert!((MIN_RADIUS..=MAX_RADIUS).contains(&r));
            last = r;
        }
    }

    #[test]
    fn test_one_marker_per_selected_district() {
        let dataset = sample_dataset();
        let set = build_markers(&dataset.districts, &names(&["Idukki", "Wayanad"]), HeatScope::Selected);
        let districts: Vec<_> = set.markers.iter().map(|m| m.district.as_str()).collect();
        assert_eq!(districts, vec!["Idukki", "Wayanad"]);
    }

    #[test]
    fn test_empty_selection_means_all_known() {
        let dataset = sample_dataset();
        let set = build_markers(&dataset.districts, &BTreeSet::new(), HeatScope::Selected);
        assert_eq!(set.markers.len(), 3);
        assert_eq!(set.heat_points.len(), 3);
    }

    #[test]
    fn test_unknown_district_contributes_nothing() {
        let dataset = sample_dataset();
        let selected = names(&["Atlantis"]);

        let follows = build_markers(&dataset.districts, &selected, HeatScope::Selected);
        assert!(follows.markers.is_empty());
        assert!(follows.heat_points.is_empty());

        // Only the three districts with coordinates feed the heatmap
        let all = build_markers(&dataset.districts, &selected, HeatScope::AllDistricts);
        assert!(all.markers.is_empty());
        assert_eq!(all.heat_points.len(), 3);
        for (point, name) in all.heat_points.iter().zip(["Idukki", "Ernakulam", "Wayanad"]) {
            let coord = geo::DISTRICT_COORDS.iter().find(|c| c.name == name).unwrap();
            assert_eq!((point.lat, point.lon), (coord.lat, coord.lon));
        }
    }

    #[test]
    fn test_heat_scope() {
        let dataset = sample_dataset();
        let selected = names(&["Ernakulam"]);

        let follows = build_markers(&dataset.districts, &selected, HeatScope::Selected);
        assert_eq!(follows.heat_points.len(), 1);
        assert_eq!(follows.heat_points[0].weight, 3000.0);

        let all = build_markers(&dataset.districts, &selected, HeatScope::AllDistricts);
        assert_eq!(all.markers.len(), 1);
        assert_eq!(all.heat_points.len(), 3);
        // Wayanad has no rainfall value
        assert!(all.heat_points.iter().any(|h| h.weight == 0.0));
    }

    #[test]
    fn test_label_leaves_missing_values_empty() {
        let dataset = sample_dataset();
        let set = build_markers(&dataset.districts, &names(&["Wayanad"]), HeatScope::Selected);
        let marker = &set.markers[0];
        assert_eq!(marker.radius, 6);
        assert_eq!(
            marker.label.to_string(),
            "Wayanad\nFatalities: \nCamps: 150\nDamaged houses: \nRainfall (mm): "
        );
    }

    #[test]
    fn test_overlay_visibility() {
        let point = HeatPoint { lat: 10.0, lon: 76.0, weight: 1.0 };
        assert!(heat_overlay_visible(true, &[point]));
        assert!(!heat_overlay_visible(false, &[point]));
        assert!(!heat_overlay_visible(true, &[]));
    }
}
