use std::path::Path;
use std::sync::Arc;

use crate::chart::{ChartError, ChartKind, ChartRequest, ChartSpec, build_chart};
use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::filter::{FilterSpec, apply_filter};
use crate::data::model::Dataset;
use crate::data::source::{DataSource, DatasetCache};
use crate::data::stats::{ColumnSummary, describe};
use crate::definitions::{ColumnDefinition, definitions_table};

// ---------------------------------------------------------------------------
// Pipeline outcome
// ---------------------------------------------------------------------------

/// What the chart area shows after a recomputation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Ready(ChartSpec),
    /// Line/Scatter/Bar without a y column.
    MissingAxis(ChartKind),
    /// The filter removed every row.
    NoData,
    /// Settings reference something the dataset lacks.
    Invalid(String),
}

/// Sidebar plot settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotSettings {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
}

/// Sidebar filter settings. `spec = None` means the column's full range / value set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSettings {
    pub column: Option<String>,
    pub spec: Option<FilterSpec>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Where the current dataset comes from.
    pub source: DataSource,
    cache: DatasetCache,

    /// Loaded dataset (None when loading failed).
    pub dataset: Option<Arc<Dataset>>,

    /// Raw error text of the last failed load.
    pub load_error: Option<String>,

    /// Per-dataset tables, rebuilt on every new dataset.
    pub summary: Vec<ColumnSummary>,
    pub definitions: Vec<ColumnDefinition>,

    pub plot: PlotSettings,
    pub filter: FilterSettings,

    /// Dataset after the current filter.
    pub filtered: Option<Dataset>,

    /// Result of the last chart build.
    pub chart: Option<ChartOutcome>,

    /// Colours for the groups of the current chart.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    /// Create the state and load the default dataset.
    pub fn new(config: DashboardConfig) -> Self {
        let source = DataSource::Default(config.default_data_path.clone());
        let mut state = Self {
            config,
            source,
            cache: DatasetCache::default(),
            dataset: None,
            load_error: None,
            summary: Vec::new(),
            definitions: Vec::new(),
            plot: PlotSettings::default(),
            filter: FilterSettings::default(),
            filtered: None,
            chart: None,
            color_map: None,
            status_message: None,
        };
        state.reload();
        state
    }

    /// Switch to another source and load it.
    pub fn set_source(&mut self, source: DataSource) {
        self.source = source;
        self.reload();
    }

    /// Go back to the configured default file.
    pub fn use_default_source(&mut self) {
        self.set_source(DataSource::Default(self.config.default_data_path.clone()));
    }

    /// Read a user-picked file and switch to it.
    pub fn upload(&mut self, path: &Path) {
        match self.cache.upload(path) {
            Ok((source, dataset)) => {
                self.source = source;
                self.accept(dataset);
            }
            Err(e) => {
                log::error!("Failed to read upload {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Load (or fetch from cache) the current source and recompute everything.
    pub fn reload(&mut self) {
        match self.cache.get_or_load(&self.source) {
            Ok(dataset) => self.accept(dataset),
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", self.source.path().display());
                self.dataset = None;
                self.load_error = Some(format!("{e:#}"));
                self.summary.clear();
                self.definitions.clear();
                self.filtered = None;
                self.chart = None;
                self.color_map = None;
            }
        }
    }

    fn accept(&mut self, dataset: Arc<Dataset>) {
        let unchanged = self
            .dataset
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &dataset));
        if !unchanged {
            log::debug!("New dataset ({} parses so far)", self.cache.loads());
            self.set_dataset(dataset);
        }
        self.load_error = None;
        self.recompute();
    }

    /// Ingest a newly loaded dataset: rebuild tables, keep settings that still apply.
    fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.summary = describe(&dataset);
        self.definitions = definitions_table(&dataset);

        let has = |col: &Option<String>| {
            col.as_deref()
                .is_some_and(|c| dataset.column_index(c).is_some())
        };
        if !has(&self.plot.x) {
            self.plot.x = dataset.column_names().next().map(str::to_string);
        }
        if !has(&self.plot.color) {
            self.plot.color = None;
        }
        if !has(&self.filter.column) {
            self.filter = FilterSettings::default();
        } else {
            self.filter.spec = None;
        }

        self.dataset = Some(dataset);
        self.normalize_y();
        self.status_message = None;
    }

    /// Y-axis choices: every column except the current x.
    pub fn y_options(&self) -> Vec<String> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        ds.column_names()
            .filter(|c| Some(*c) != self.plot.x.as_deref())
            .map(str::to_string)
            .collect()
    }

    /// Keep y valid for the current x, defaulting to the first option.
    fn normalize_y(&mut self) {
        let options = self.y_options();
        let valid = self
            .plot
            .y
            .as_ref()
            .is_some_and(|y| options.contains(y));
        if !valid {
            self.plot.y = options.into_iter().next();
        }
    }

    pub fn set_kind(&mut self, kind: ChartKind) {
        self.plot.kind = kind;
        self.recompute();
    }

    pub fn set_x(&mut self, column: String) {
        self.plot.x = Some(column);
        self.normalize_y();
        self.recompute();
    }

    pub fn set_y(&mut self, column: String) {
        self.plot.y = Some(column);
        self.normalize_y();
        self.recompute();
    }

    pub fn set_color_column(&mut self, column: Option<String>) {
        self.plot.color = column;
        self.recompute();
    }

    /// Choose the filter column; its spec starts at the full range / value set.
    pub fn set_filter_column(&mut self, column: Option<String>) {
        if self.filter.column != column {
            self.filter = FilterSettings { column, spec: None };
            self.recompute();
        }
    }

    pub fn set_filter_spec(&mut self, spec: FilterSpec) {
        self.filter.spec = Some(spec);
        self.recompute();
    }

    /// The request sent to the chart builder for the current settings.
    pub fn chart_request(&self) -> Option<ChartRequest> {
        let x = self.plot.x.clone()?;
        let y = if self.plot.kind.uses_y() {
            self.plot.y.clone()
        } else {
            None
        };
        Some(ChartRequest {
            kind: self.plot.kind,
            x,
            y,
            color: self.plot.color.clone(),
        })
    }

    /// Filter → chart, once per interaction.
    pub fn recompute(&mut self) {
        self.color_map = None;
        let Some(dataset) = &self.dataset else {
            self.filtered = None;
            self.chart = None;
            return;
        };

        let filtered = apply_filter(
            dataset,
            self.filter.column.as_deref(),
            self.filter.spec.as_ref(),
        );

        let outcome = if filtered.is_empty() {
            log::warn!("No data left after filtering on {:?}", self.filter.column);
            ChartOutcome::NoData
        } else {
            match self.chart_request() {
                None => ChartOutcome::Invalid("The dataset has no columns to plot.".to_string()),
                Some(request) => {
                    match build_chart(&filtered, &request, self.config.histogram_bins) {
                        Ok(spec) => {
                            if spec.color.is_some() {
                                self.color_map = Some(ColorMap::new(
                                    spec.groups.iter().filter_map(|g| g.key.as_ref()),
                                ));
                            }
                            ChartOutcome::Ready(spec)
                        }
                        Err(ChartError::MissingAxisSelection { kind }) => {
                            ChartOutcome::MissingAxis(kind)
                        }
                        Err(e) => ChartOutcome::Invalid(e.to_string()),
                    }
                }
            }
        };

        log::debug!(
            "Recomputed: {} rows after filter, chart {}",
            filtered.len(),
            outcome_name(&outcome)
        );
        self.filtered = Some(filtered);
        self.chart = Some(outcome);
    }

    /// JSON of the current chart spec, if one is ready.
    pub fn chart_json(&self) -> Option<serde_json::Result<String>> {
        match &self.chart {
            Some(ChartOutcome::Ready(spec)) => Some(spec.to_json()),
            _ => None,
        }
    }
}

fn outcome_name(outcome: &ChartOutcome) -> &'static str {
    match outcome {
        ChartOutcome::Ready(_) => "ready",
        ChartOutcome::MissingAxis(_) => "missing axis",
        ChartOutcome::NoData => "no data",
        ChartOutcome::Invalid(_) => "invalid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use std::io::Write;

    const CSV: &str = "GEOID,COUNTY,E_TOTPOP,RPL_EJI\n\
                       35001,Taos,10,0.1\n\
                       35003,Lea,20,0.5\n\
                       35005,Taos,30,0.9\n\
                       35007,Luna,40,0.3\n";

    fn state_for(contents: &str) -> (AppState, tempfile::NamedTempFile) {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let config = DashboardConfig {
            default_data_path: file.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        (AppState::new(config), file)
    }

    #[test]
    fn initial_load_picks_default_axes() {
        let (state, _file) = state_for(CSV);
        assert!(state.load_error.is_none());
        assert_eq!(state.plot.x.as_deref(), Some("GEOID"));
        assert_eq!(state.plot.y.as_deref(), Some("COUNTY"));
        assert_eq!(state.definitions.len(), 4);
        assert_eq!(state.summary.len(), 3);
        assert!(matches!(state.chart, Some(ChartOutcome::Ready(_))));
    }

    #[test]
    fn load_failure_halts_the_pipeline() {
        let config = DashboardConfig {
            default_data_path: "no/such/EJI.csv".into(),
            ..DashboardConfig::default()
        };
        let state = AppState::new(config);
        assert!(state.dataset.is_none());
        assert!(state.load_error.as_deref().unwrap().contains("no/such/EJI.csv"));
        assert!(state.chart.is_none());
    }

    #[test]
    fn y_never_equals_x() {
        let (mut state, _file) = state_for(CSV);
        state.set_x("COUNTY".into());
        assert_eq!(state.plot.y.as_deref(), Some("GEOID"));
        assert!(!state.y_options().contains(&"COUNTY".to_string()));
        state.set_y("COUNTY".into());
        assert_ne!(state.plot.y, state.plot.x);
    }

    #[test]
    fn empty_filter_result_skips_the_chart() {
        let (mut state, _file) = state_for(CSV);
        state.set_filter_column(Some("E_TOTPOP".into()));
        state.set_filter_spec(FilterSpec::Range { lo: 100.0, hi: 200.0 });
        assert_eq!(state.chart, Some(ChartOutcome::NoData));
        assert!(state.filtered.as_ref().unwrap().is_empty());
    }

    #[test]
    fn single_column_dataset_reports_missing_axis() {
        let (mut state, _file) = state_for("E_TOTPOP\n1\n2\n");
        assert!(state.plot.y.is_none());
        assert_eq!(state.chart, Some(ChartOutcome::MissingAxis(ChartKind::Line)));

        state.set_kind(ChartKind::Histogram);
        assert!(matches!(state.chart, Some(ChartOutcome::Ready(_))));
        state.set_kind(ChartKind::Box);
        assert!(matches!(state.chart, Some(ChartOutcome::Ready(_))));
    }

    #[test]
    fn filtered_chart_uses_filtered_rows() {
        let (mut state, _file) = state_for(CSV);
        state.set_x("E_TOTPOP".into());
        state.set_y("RPL_EJI".into());
        state.set_kind(ChartKind::Scatter);
        state.set_color_column(Some("COUNTY".into()));
        state.set_filter_column(Some("COUNTY".into()));
        state.set_filter_spec(FilterSpec::Values(
            [CellValue::String("Taos".into())].into_iter().collect(),
        ));

        let Some(ChartOutcome::Ready(spec)) = &state.chart else {
            panic!("expected a chart, got {:?}", state.chart);
        };
        assert_eq!(spec.row_count, 2);
        assert_eq!(spec.title, "Scatter Plot: RPL_EJI vs E_TOTPOP");
        assert_eq!(spec.groups.len(), 1);
        assert!(state.color_map.is_some());
        assert!(state.chart_json().unwrap().unwrap().contains("\"Scatter\""));
    }

    #[test]
    fn interactions_reuse_the_cached_dataset() {
        let (mut state, _file) = state_for(CSV);
        state.set_kind(ChartKind::Bar);
        state.reload();
        state.set_filter_column(Some("RPL_EJI".into()));
        assert_eq!(state.cache.loads(), 1);
    }

    #[test]
    fn uploading_replaces_the_dataset_and_keeps_valid_settings() {
        let (mut state, _file) = state_for(CSV);
        state.set_x("E_TOTPOP".into());
        state.set_color_column(Some("COUNTY".into()));

        let mut upload = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        upload.write_all(b"E_TOTPOP,E_MINRTY\n5,1\n6,2\n").unwrap();
        state.upload(upload.path());

        let ds = state.dataset.as_ref().unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(state.plot.x.as_deref(), Some("E_TOTPOP"));
        assert_eq!(state.plot.y.as_deref(), Some("E_MINRTY"));
        assert_eq!(state.plot.color, None);
        assert_eq!(state.cache.loads(), 2);

        state.use_default_source();
        assert_eq!(state.dataset.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn unreadable_upload_keeps_the_current_dataset() {
        let (mut state, _file) = state_for(CSV);
        state.upload(Path::new("no/such/upload.csv"));

        assert_eq!(state.dataset.as_ref().unwrap().len(), 4);
        assert!(matches!(state.source, DataSource::Default(_)));
        assert!(state.status_message.as_deref().unwrap().contains("no/such/upload.csv"));
    }
}
