use crate::markers::HeatScope;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Name of the data directory looked up next to the executable
pub const DATA_DIR_NAME: &str = "datasets";

#[derive(Parser, Debug)]
#[command(
    name = "flood-map",
    version,
    about = "Flood impact visualization for the districts of Kerala (2018)"
)]
pub struct Args {
    /// Directory holding the CSV tables (default: the nearest `datasets`
    /// directory above the executable)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Start with the rainfall heatmap hidden
    #[arg(long)]
    pub no_heatmap: bool,

    /// Feed the heatmap from every district instead of the selected ones
    #[arg(long)]
    pub heatmap_all_districts: bool,

    /// Braille pixels per unit of marker radius
    #[arg(long, default_value_t = 0.25)]
    pub marker_scale: f64,

    /// Log file (the terminal belongs to the dashboard)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn heat_scope(&self) -> HeatScope {
        if self.heatmap_all_districts {
            HeatScope::AllDistricts
        } else {
            HeatScope::Selected
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("flood-map.log"))
    }

    /// `--data-dir` if given, otherwise the first `datasets` directory found
    /// walking up from the executable
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            if !dir.is_dir() {
                bail!("data directory {} does not exist", dir.display());
            }
            return Ok(dir.clone());
        }

        let exe = std::env::current_exe().context("locating the running executable")?;
        find_data_dir(&exe).with_context(|| {
            format!(
                "no `{}` directory above {}; pass --data-dir",
                DATA_DIR_NAME,
                exe.display()
            )
        })
    }
}

/// Nearest `datasets` directory in `start` or any of its ancestors
pub fn find_data_dir(start: &std::path::Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["flood-map"]);
        assert!(!args.no_heatmap);
        assert_eq!(args.marker_scale, 0.25);
        assert_eq!(args.heat_scope(), HeatScope::Selected);
        assert!(args.log_path().ends_with("flood-map.log"));
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "flood-map",
            "--no-heatmap",
            "--heatmap-all-districts",
            "--marker-scale",
            "0.5",
            "--data-dir",
            "/tmp/data",
        ]);
        assert!(args.no_heatmap);
        assert_eq!(args.heat_scope(), HeatScope::AllDistricts);
        assert_eq!(args.marker_scale, 0.5);
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/data")));
    }

    #[test]
    fn test_find_data_dir_walks_up() {
        let root = std::env::temp_dir().join(format!("flood-map-cli-{}", std::process::id()));
        let bin = root.join("target").join("release");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(root.join(DATA_DIR_NAME)).unwrap();

        let found = find_data_dir(&bin.join("flood-map")).unwrap();
        assert_eq!(found, root.join(DATA_DIR_NAME));

        fs::remove_dir_all(&root).unwrap();
    }
}
