use std::path::PathBuf;

use clap::Parser;

/// Bundled dataset looked up relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "EJI_2024_New_Mexico_CLEAN.csv";

/// Environment variable overriding the default dataset path.
pub const DATA_PATH_ENV: &str = "EJI_DASHBOARD_DATA";

/// Command line of the dashboard binary.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "eji-dashboard",
    version,
    about = "Interactive explorer for the cleaned EJI 2024 New Mexico dataset"
)]
pub struct Cli {
    /// Dataset shown when nothing has been uploaded
    #[arg(value_name = "DATA", env = DATA_PATH_ENV)]
    pub data: Option<PathBuf>,

    /// Rows shown in the data preview
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,

    /// Bin count for histograms
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u16).range(1..))]
    pub histogram_bins: u16,

    /// Categorical filters above this many distinct values show a hint
    #[arg(long, default_value_t = 50)]
    pub many_values_threshold: usize,
}

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Dataset used when nothing has been uploaded.
    pub default_data_path: PathBuf,
    /// Rows shown in the data preview.
    pub preview_rows: usize,
    /// Bin count for histograms.
    pub histogram_bins: usize,
    /// Categorical filters above this many distinct values show a hint.
    pub many_values_threshold: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_data_path: PathBuf::from(DEFAULT_DATA_PATH),
            preview_rows: 5,
            histogram_bins: 30,
            many_values_threshold: 50,
        }
    }
}

impl DashboardConfig {
    /// Configuration from the process arguments and environment.
    pub fn from_args() -> Self {
        Cli::parse().into()
    }
}

/// The positional argument wins over [`DATA_PATH_ENV`], which wins over
/// [`DEFAULT_DATA_PATH`]. An empty path counts as not given.
impl From<Cli> for DashboardConfig {
    fn from(cli: Cli) -> Self {
        let default_data_path = cli
            .data
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        Self {
            default_data_path,
            preview_rows: cli.preview_rows,
            histogram_bins: usize::from(cli.histogram_bins),
            many_values_threshold: cli.many_values_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> DashboardConfig {
        let argv = std::iter::once("eji-dashboard").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().into()
    }

    // Only test that touches EJI_DASHBOARD_DATA.
    #[test]
    fn argument_then_environment_then_bundled_file() {
        std::env::remove_var(DATA_PATH_ENV);
        assert_eq!(parse(&[]), DashboardConfig::default());

        std::env::set_var(DATA_PATH_ENV, "b.csv");
        assert_eq!(parse(&[]).default_data_path, PathBuf::from("b.csv"));
        assert_eq!(parse(&["a.csv"]).default_data_path, PathBuf::from("a.csv"));

        assert_eq!(parse(&[""]).default_data_path, PathBuf::from(DEFAULT_DATA_PATH));
        std::env::remove_var(DATA_PATH_ENV);
    }

    #[test]
    fn tuning_flags() {
        let cfg = parse(&["x.csv", "--histogram-bins", "12", "--preview-rows", "10"]);
        assert_eq!(cfg.histogram_bins, 12);
        assert_eq!(cfg.preview_rows, 10);
        assert_eq!(cfg.many_values_threshold, 50);

        let argv = ["eji-dashboard", "--histogram-bins", "0"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
