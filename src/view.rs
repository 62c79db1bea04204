use crate::data::{Dataset, DistrictRecord, WarningRecord};
use crate::markers::{build_markers, heat_overlay_visible, HeatPoint, HeatScope, Marker};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Districts and date the user currently has selected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub districts: BTreeSet<String>,
    /// `None` only when the warnings table has no dates at all
    pub date: Option<NaiveDate>,
}

/// Totals over the selected districts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub fatalities: u64,
    pub camps: u64,
    pub damaged_houses: u64,
}

impl Summary {
    /// Sum rows whose district is in `selected`, reading missing values as zero.
    /// Duplicate rows for a district are counted twice. Totals saturate at
    /// `u64::MAX`.
    pub fn of(districts: &[DistrictRecord], selected: &BTreeSet<String>) -> Self {
        districts
            .iter()
            .filter(|d| selected.contains(&d.district))
            .fold(Self::default(), |acc, d| Self {
                fatalities: acc.fatalities.saturating_add(d.fatalities.unwrap_or(0)),
                camps: acc.camps.saturating_add(d.no_of_camps.unwrap_or(0)),
                damaged_houses: acc
                    .damaged_houses
                    .saturating_add(d.full_damaged_houses.unwrap_or(0)),
            })
    }
}

/// Everything one frame of the dashboard shows
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView<'a> {
    pub summary: Summary,
    pub markers: Vec<Marker>,
    pub heat_points: Vec<HeatPoint>,
    pub show_heat_overlay: bool,
    /// Warnings on the selected date for the selected districts
    pub warnings: Vec<&'a WarningRecord>,
    pub date: Option<NaiveDate>,
}

impl DashboardView<'_> {
    /// False is the normal "no records for this date/district" state
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Warnings matching `date` exactly whose district is in `selected`
pub fn filter_warnings<'a>(
    rows: &'a [WarningRecord],
    date: Option<NaiveDate>,
    selected: &BTreeSet<String>,
) -> Vec<&'a WarningRecord> {
    let Some(date) = date else {
        return Vec::new();
    };
    rows.iter()
        .filter(|w| w.date == date && selected.contains(&w.district))
        .collect()
}

/// Derive the whole view from the loaded tables and the current filters.
///
/// Markers are built from the full district table; an empty district
/// selection therefore shows every marker while the totals and the warnings
/// table come out empty.
pub fn recompute_view<'a>(
    dataset: &'a Dataset,
    selection: &FilterSelection,
    show_heatmap: bool,
    scope: HeatScope,
) -> DashboardView<'a> {
    let summary = Summary::of(&dataset.districts, &selection.districts);
    let set = build_markers(&dataset.districts, &selection.districts, scope);
    let show_heat_overlay = heat_overlay_visible(show_heatmap, &set.heat_points);

    DashboardView {
        summary,
        markers: set.markers,
        heat_points: set.heat_points,
        show_heat_overlay,
        warnings: filter_warnings(&dataset.warnings.rows, selection.date, &selection.districts),
        date: selection.date,
    }
}
