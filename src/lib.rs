//! Flood-impact dashboard for the districts of Kerala, rendered in the
//! terminal on a Braille Unicode map.
//!
//! The pipeline is load (cached) -> filter -> render: [`data`] reads the two
//! CSV tables, [`view::recompute_view`] derives everything one frame shows,
//! and [`ui`] draws it.

pub mod app;
pub mod braille;
pub mod cli;
pub mod data;
pub mod geo;
pub mod logging;
pub mod map;
pub mod markers;
pub mod ui;
pub mod view;
