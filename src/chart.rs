//! Chart builder: turns plot settings into a declarative [`ChartSpec`].
//!
//! The spec names the chart kind, title, axis encodings, colour groups and
//! hover columns. Rendering happens elsewhere (`ui::plot`) or in any other
//! consumer of the JSON export.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::data::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// ChartKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ChartKind {
    #[default]
    Line,
    Scatter,
    Bar,
    Histogram,
    Box,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Bar,
        ChartKind::Histogram,
        ChartKind::Box,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Line => "Line",
            ChartKind::Scatter => "Scatter",
            ChartKind::Bar => "Bar",
            ChartKind::Histogram => "Histogram",
            ChartKind::Box => "Box",
        }
    }

    /// Kinds that cannot be drawn without a y column.
    pub fn requires_y(self) -> bool {
        matches!(self, ChartKind::Line | ChartKind::Scatter | ChartKind::Bar)
    }

    /// Kinds that offer a y selector at all. Box takes y but does not require it.
    pub fn uses_y(self) -> bool {
        self != ChartKind::Histogram
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Request / spec types
// ---------------------------------------------------------------------------

/// Plot settings as chosen in the sidebar.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: String,
    pub y: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("Please select a Y-axis column in the sidebar ({kind} plots need one).")]
    MissingAxisSelection { kind: ChartKind },
    #[error("Column {0:?} is not in the dataset")]
    UnknownColumn(String),
}

/// How cell values map onto an axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AxisScale {
    Numeric,
    /// Categories in first-appearance order; category `i` sits at position `i`.
    Categorical { categories: Vec<CellValue> },
}

impl AxisScale {
    fn for_column(dataset: &Dataset, column: usize) -> Self {
        if dataset.columns[column].kind.is_numeric() {
            return AxisScale::Numeric;
        }
        let mut categories: Vec<CellValue> = Vec::new();
        let mut seen: HashSet<&CellValue> = HashSet::new();
        for v in dataset.column_values(column) {
            if !v.is_missing() && seen.insert(v) {
                categories.push(v.clone());
            }
        }
        AxisScale::Categorical { categories }
    }

    /// Axis position of a cell; `None` for missing cells.
    pub fn position(&self, value: &CellValue) -> Option<f64> {
        match self {
            AxisScale::Numeric => value.as_f64(),
            AxisScale::Categorical { categories } => categories
                .iter()
                .position(|c| c == value)
                .map(|i| i as f64),
        }
    }

    /// Tick label for an axis position (categorical axes only label whole positions).
    pub fn label_at(&self, position: f64) -> Option<String> {
        match self {
            AxisScale::Numeric => None,
            AxisScale::Categorical { categories } => {
                if position.fract() != 0.0 || position < 0.0 {
                    return None;
                }
                categories.get(position as usize).map(ToString::to_string)
            }
        }
    }
}

/// A column bound to an axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encoding {
    pub column: String,
    pub scale: AxisScale,
}

/// Rows sharing one value of the colour column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesGroup {
    /// Colour-column value, `None` when the chart is not grouped.
    pub key: Option<CellValue>,
    pub label: String,
    pub rows: Vec<usize>,
}

/// Declarative chart description; row indices refer to the dataset it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x: Encoding,
    pub y: Option<Encoding>,
    pub color: Option<String>,
    /// Bin count, histograms only.
    pub nbins: Option<usize>,
    /// Columns shown for each point on hover (all columns for scatter plots).
    pub hover_columns: Vec<String>,
    pub groups: Vec<SeriesGroup>,
    pub row_count: usize,
}

impl ChartSpec {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// `(row, [x, y])` for each row of the group where both positions exist.
    pub fn xy_points(&self, dataset: &Dataset, group: &SeriesGroup) -> Vec<(usize, [f64; 2])> {
        let (Some(xi), Some(y)) = (dataset.column_index(&self.x.column), &self.y) else {
            return Vec::new();
        };
        let Some(yi) = dataset.column_index(&y.column) else {
            return Vec::new();
        };
        group
            .rows
            .iter()
            .filter_map(|&row| {
                let px = self.x.scale.position(dataset.value(row, xi)?)?;
                let py = y.scale.position(dataset.value(row, yi)?)?;
                Some((row, [px, py]))
            })
            .collect()
    }

    /// Positions of the x column for the rows of a group.
    pub fn x_positions(&self, dataset: &Dataset, group: &SeriesGroup) -> Vec<f64> {
        let Some(xi) = dataset.column_index(&self.x.column) else {
            return Vec::new();
        };
        group
            .rows
            .iter()
            .filter_map(|&row| self.x.scale.position(dataset.value(row, xi)?))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the chart spec for the (already filtered) dataset.
///
/// Line, scatter and bar charts need a y column and report
/// [`ChartError::MissingAxisSelection`] without one. Box charts use y when
/// present. Histograms ignore y and bin x into `nbins` bins.
pub fn build_chart(
    dataset: &Dataset,
    request: &ChartRequest,
    nbins: usize,
) -> Result<ChartSpec, ChartError> {
    let kind = request.kind;
    let y = if kind.uses_y() {
        request.y.as_deref().filter(|col| !col.is_empty())
    } else {
        None
    };
    if kind.requires_y() && y.is_none() {
        return Err(ChartError::MissingAxisSelection { kind });
    }

    let x = encoding(dataset, &request.x)?;
    let y = y.map(|col| encoding(dataset, col)).transpose()?;

    let title = match kind {
        ChartKind::Line | ChartKind::Scatter | ChartKind::Bar => {
            let y_name = y.as_ref().map_or("", |e| e.column.as_str());
            format!("{kind} Plot: {y_name} vs {}", request.x)
        }
        ChartKind::Histogram => format!("Histogram of {}", request.x),
        ChartKind::Box => "Box Plot".to_string(),
    };

    let groups = match request.color.as_deref() {
        Some(col) => {
            let idx = dataset
                .column_index(col)
                .ok_or_else(|| ChartError::UnknownColumn(col.to_string()))?;
            group_rows(dataset, idx)
        }
        None => vec![SeriesGroup {
            key: None,
            label: request.x.clone(),
            rows: (0..dataset.len()).collect(),
        }],
    };

    let hover_columns = if kind == ChartKind::Scatter {
        dataset.column_names().map(str::to_string).collect()
    } else {
        Vec::new()
    };

    Ok(ChartSpec {
        kind,
        title,
        x,
        y,
        color: request.color.clone(),
        nbins: (kind == ChartKind::Histogram).then_some(nbins),
        hover_columns,
        groups,
        row_count: dataset.len(),
    })
}

fn encoding(dataset: &Dataset, column: &str) -> Result<Encoding, ChartError> {
    let idx = dataset
        .column_index(column)
        .ok_or_else(|| ChartError::UnknownColumn(column.to_string()))?;
    Ok(Encoding {
        column: column.to_string(),
        scale: AxisScale::for_column(dataset, idx),
    })
}

/// Partition rows by the colour column, groups in first-appearance order.
/// Missing cells form their own group keyed by `Null`.
fn group_rows(dataset: &Dataset, column: usize) -> Vec<SeriesGroup> {
    let mut groups: Vec<SeriesGroup> = Vec::new();
    let mut slot: HashMap<CellValue, usize> = HashMap::new();
    for (row, value) in dataset.column_values(column).enumerate() {
        let key = if value.is_missing() {
            CellValue::Null
        } else {
            value.clone()
        };
        let i = *slot.entry(key.clone()).or_insert_with(|| {
            groups.push(SeriesGroup {
                label: key.to_string(),
                key: Some(key.clone()),
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[i].rows.push(row);
    }
    groups
}

// ---------------------------------------------------------------------------
// Histogram binning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`; the maximum falls in the last bin.
/// A constant column gets a single unit-wide bin centred on the value.
pub fn histogram_bins(values: &[f64], nbins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (Some(min), Some(max)) = (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };

    if nbins == 0 || min == max {
        return vec![HistogramBin {
            start: min - 0.5,
            end: min + 0.5,
            count: finite.len(),
        }];
    }

    let width = (max - min) / nbins as f64;
    let mut bins: Vec<HistogramBin> = (0..nbins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in finite {
        let i = (((v - min) / width) as usize).min(nbins - 1);
        bins[i].count += 1;
    }
    bins
}

/// Count values into existing bin edges; values outside the edges are dropped.
pub fn count_into(bins: &[HistogramBin], values: &[f64]) -> Vec<HistogramBin> {
    let mut out: Vec<HistogramBin> = bins.iter().map(|b| HistogramBin { count: 0, ..*b }).collect();
    let last = out.len().saturating_sub(1);
    for &v in values {
        let slot = out
            .iter()
            .position(|b| b.start <= v && v < b.end)
            .or_else(|| out.last().filter(|b| v == b.end).map(|_| last));
        if let Some(i) = slot {
            out[i].count += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn sample() -> Dataset {
        Dataset::new(
            vec!["GEOID".into(), "E_TOTPOP".into(), "RPL_EJI".into(), "COUNTY".into()],
            vec![
                vec![s("35001"), CellValue::Integer(10), CellValue::Float(0.1), s("Taos")],
                vec![s("35003"), CellValue::Integer(20), CellValue::Float(0.4), s("Lea")],
                vec![s("35005"), CellValue::Integer(30), CellValue::Null, s("Taos")],
            ],
        )
    }

    fn request(kind: ChartKind, y: Option<&str>) -> ChartRequest {
        ChartRequest {
            kind,
            x: "E_TOTPOP".into(),
            y: y.map(str::to_string),
            color: None,
        }
    }

    #[test]
    fn missing_y_is_reported_for_xy_kinds() {
        let ds = sample();
        for kind in [ChartKind::Line, ChartKind::Scatter, ChartKind::Bar] {
            for y in [None, Some("")] {
                assert_eq!(
                    build_chart(&ds, &request(kind, y), 30),
                    Err(ChartError::MissingAxisSelection { kind })
                );
            }
        }
    }

    #[test]
    fn box_and_histogram_do_not_need_y() {
        let ds = sample();
        let spec = build_chart(&ds, &request(ChartKind::Box, None), 30).unwrap();
        assert_eq!(spec.title, "Box Plot");
        assert!(spec.y.is_none());

        let spec = build_chart(&ds, &request(ChartKind::Histogram, Some("RPL_EJI")), 30).unwrap();
        assert_eq!(spec.title, "Histogram of E_TOTPOP");
        assert!(spec.y.is_none());
        assert_eq!(spec.nbins, Some(30));
    }

    #[test]
    fn titles_follow_kind() {
        let ds = sample();
        for kind in [ChartKind::Line, ChartKind::Scatter, ChartKind::Bar] {
            let spec = build_chart(&ds, &request(kind, Some("RPL_EJI")), 30).unwrap();
            assert_eq!(spec.title, format!("{kind} Plot: RPL_EJI vs E_TOTPOP"));
        }
        let spec = build_chart(&ds, &request(ChartKind::Box, Some("RPL_EJI")), 30).unwrap();
        assert_eq!(spec.title, "Box Plot");
        assert_eq!(spec.y.unwrap().column, "RPL_EJI");
    }

    #[test]
    fn scatter_hovers_every_column() {
        let ds = sample();
        let spec = build_chart(&ds, &request(ChartKind::Scatter, Some("RPL_EJI")), 30).unwrap();
        assert_eq!(spec.hover_columns, ["GEOID", "E_TOTPOP", "RPL_EJI", "COUNTY"]);
        let line = build_chart(&ds, &request(ChartKind::Line, Some("RPL_EJI")), 30).unwrap();
        assert!(line.hover_columns.is_empty());
    }

    #[test]
    fn colour_groups_in_first_appearance_order() {
        let ds = sample();
        let mut req = request(ChartKind::Scatter, Some("RPL_EJI"));
        req.color = Some("COUNTY".into());
        let spec = build_chart(&ds, &req, 30).unwrap();
        let labels: Vec<&str> = spec.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Taos", "Lea"]);
        assert_eq!(spec.groups[0].rows, vec![0, 2]);
    }

    #[test]
    fn ungrouped_chart_has_one_group() {
        let ds = sample();
        let spec = build_chart(&ds, &request(ChartKind::Line, Some("RPL_EJI")), 30).unwrap();
        assert_eq!(spec.groups.len(), 1);
        assert_eq!(spec.groups[0].key, None);
        assert_eq!(spec.groups[0].rows.len(), 3);
    }

    #[test]
    fn points_skip_missing_and_map_categories() {
        let ds = sample();
        let mut req = request(ChartKind::Bar, Some("RPL_EJI"));
        req.x = "COUNTY".into();
        let spec = build_chart(&ds, &req, 30).unwrap();
        let pts = spec.xy_points(&ds, &spec.groups[0]);
        assert_eq!(pts, vec![(0, [0.0, 0.1]), (1, [1.0, 0.4])]);
        assert_eq!(spec.x.scale.label_at(1.0).as_deref(), Some("Lea"));
        assert_eq!(spec.x.scale.label_at(0.5), None);
    }

    #[test]
    fn unknown_columns_are_errors() {
        let ds = sample();
        let mut req = request(ChartKind::Line, Some("NOPE"));
        assert_eq!(build_chart(&ds, &req, 30), Err(ChartError::UnknownColumn("NOPE".into())));
        req.y = Some("RPL_EJI".into());
        req.color = Some("ALSO_NOPE".into());
        assert!(matches!(build_chart(&ds, &req, 30), Err(ChartError::UnknownColumn(_))));
    }

    #[test]
    fn spec_serializes_to_json() {
        let ds = sample();
        let spec = build_chart(&ds, &request(ChartKind::Histogram, None), 30).unwrap();
        let json: serde_json::Value = serde_json::from_str(&spec.to_json().unwrap()).unwrap();
        assert_eq!(json["kind"], "Histogram");
        assert_eq!(json["nbins"], 30);
        assert_eq!(json["x"]["scale"]["type"], "numeric");
    }

    #[test]
    fn histogram_uses_equal_width_bins() {
        let values: Vec<f64> = (0..=30).map(f64::from).collect();
        let bins = histogram_bins(&values, 30);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 31);
        assert_eq!(bins[29].count, 2);
        assert_eq!((bins[0].start, bins[29].end), (0.0, 30.0));
    }

    #[test]
    fn groups_share_bin_edges() {
        let edges = histogram_bins(&[0.0, 10.0], 2);
        let counts: Vec<usize> = count_into(&edges, &[1.0, 6.0, 10.0, 11.0])
            .iter()
            .map(|b| b.count)
            .collect();
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn histogram_edge_cases() {
        assert!(histogram_bins(&[], 30).is_empty());
        let single = histogram_bins(&[5.0, 5.0], 30);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].count, 2);
    }
}
