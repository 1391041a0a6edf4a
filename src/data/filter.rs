use std::collections::BTreeSet;

use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Filter specification: numeric range or permitted values for one column
// ---------------------------------------------------------------------------

/// How the rows of one column are restricted.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Inclusive `[lo, hi]` over a numeric column.
    Range { lo: f64, hi: f64 },
    /// Permitted literal values over a categorical column.
    Values(BTreeSet<CellValue>),
}

/// The default specification for a column: its full `[min, max]` when numeric,
/// all distinct non-missing values otherwise.
///
/// `None` when the column is unknown or a numeric column holds no numbers.
pub fn default_spec(dataset: &Dataset, column: &str) -> Option<FilterSpec> {
    let col = dataset.column(column)?;
    if col.kind.is_numeric() {
        let (lo, hi) = numeric_bounds(dataset, column)?;
        Some(FilterSpec::Range { lo, hi })
    } else {
        let values = dataset.unique_values.get(column).cloned().unwrap_or_default();
        Some(FilterSpec::Values(values))
    }
}

/// `(min, max)` over the numeric cells of a column.
pub fn numeric_bounds(dataset: &Dataset, column: &str) -> Option<(f64, f64)> {
    let idx = dataset.column_index(column)?;
    dataset
        .column_values(idx)
        .filter_map(CellValue::as_f64)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Return indices of rows that pass the filter.
///
/// A row passes when:
/// * `Range` – its cell is numeric and `lo <= value <= hi`
/// * `Values` – its cell is in the set (a missing cell passes only if `Null` is in the set)
pub fn filtered_indices(dataset: &Dataset, column: usize, spec: &FilterSpec) -> Vec<usize> {
    dataset
        .column_values(column)
        .enumerate()
        .filter(|(_, val)| match spec {
            FilterSpec::Range { lo, hi } => val.as_f64().is_some_and(|v| *lo <= v && v <= *hi),
            FilterSpec::Values(allowed) => {
                if val.is_missing() {
                    allowed.contains(&CellValue::Null)
                } else {
                    allowed.contains(val)
                }
            }
        })
        .map(|(i, _)| i)
        .collect()
}

/// Filter a dataset on one column, returning a new dataset.
///
/// `column = None` means no filter and yields a copy of the input. An unset
/// `spec` falls back to [`default_spec`]. The input is never modified; an
/// empty result is valid and left to the caller to report.
pub fn apply_filter(dataset: &Dataset, column: Option<&str>, spec: Option<&FilterSpec>) -> Dataset {
    let Some(column) = column else {
        return dataset.clone();
    };
    let Some(idx) = dataset.column_index(column) else {
        log::warn!("Filter column {column:?} is not in the dataset; ignoring filter");
        return dataset.clone();
    };

    let default;
    let spec = match spec {
        Some(spec) => spec,
        None => match default_spec(dataset, column) {
            Some(spec) => {
                default = spec;
                &default
            }
            // Numeric column with no numbers: nothing can fall inside a range.
            None => return dataset.select_rows(&[]),
        },
    };

    let kept = filtered_indices(dataset, idx, spec);
    log::debug!("Filter on {column}: kept {} of {} rows", kept.len(), dataset.len());
    dataset.select_rows(&kept)
}

/// Categorical columns with more distinct values than `threshold` get a hint
/// in the sidebar; returns the distinct count in that case.
pub fn many_values_hint(dataset: &Dataset, column: &str, threshold: usize) -> Option<usize> {
    let col = dataset.column(column)?;
    if col.kind.is_numeric() {
        return None;
    }
    let n = dataset.unique_values.get(column).map_or(0, BTreeSet::len);
    (n > threshold).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let county = |s: &str| CellValue::String(s.to_string());
        Dataset::new(
            vec!["E_TOTPOP".into(), "COUNTY".into()],
            vec![
                vec![CellValue::Integer(10), county("Taos")],
                vec![CellValue::Integer(20), county("Lea")],
                vec![CellValue::Integer(30), CellValue::Null],
                vec![CellValue::Integer(40), county("Taos")],
            ],
        )
    }

    fn totpop(ds: &Dataset) -> Vec<f64> {
        ds.numeric_values(0)
    }

    #[test]
    fn range_is_inclusive() {
        let ds = sample();
        let spec = FilterSpec::Range { lo: 20.0, hi: 30.0 };
        let out = apply_filter(&ds, Some("E_TOTPOP"), Some(&spec));
        assert_eq!(totpop(&out), vec![20.0, 30.0]);
    }

    #[test]
    fn full_range_is_identity() {
        let ds = sample();
        let spec = default_spec(&ds, "E_TOTPOP").unwrap();
        assert_eq!(spec, FilterSpec::Range { lo: 10.0, hi: 40.0 });
        assert_eq!(apply_filter(&ds, Some("E_TOTPOP"), Some(&spec)).len(), ds.len());
    }

    #[test]
    fn range_excludes_missing_numbers() {
        let ds = Dataset::new(
            vec!["v".into()],
            vec![
                vec![CellValue::Float(1.0)],
                vec![CellValue::Null],
                vec![CellValue::Float(f64::NAN)],
            ],
        );
        assert_eq!(apply_filter(&ds, Some("v"), None).len(), 1);
    }

    #[test]
    fn default_value_set_drops_missing() {
        let ds = sample();
        let out = apply_filter(&ds, Some("COUNTY"), None);
        assert_eq!(out.len(), 3);
        assert_eq!(totpop(&out), vec![10.0, 20.0, 40.0]);
    }

    #[test]
    fn full_value_set_is_identity_without_missing() {
        let counties = ["Taos", "Lea", "Luna", "Taos"];
        let rows = counties
            .iter()
            .map(|c| vec![CellValue::String(c.to_string())])
            .collect();
        let ds = Dataset::new(vec!["COUNTY".into()], rows);

        let all = ds.unique_values["COUNTY"].clone();
        assert_eq!(all.len(), 3);
        let out = apply_filter(&ds, Some("COUNTY"), Some(&FilterSpec::Values(all)));
        assert_eq!(out.len(), ds.len());
        assert_eq!(out.rows, ds.rows);
    }

    #[test]
    fn explicit_null_keeps_missing_rows() {
        let ds = sample();
        let spec = FilterSpec::Values([CellValue::Null].into_iter().collect());
        let out = apply_filter(&ds, Some("COUNTY"), Some(&spec));
        assert_eq!(totpop(&out), vec![30.0]);
    }

    #[test]
    fn value_subset() {
        let ds = sample();
        let spec = FilterSpec::Values([CellValue::String("Taos".into())].into_iter().collect());
        let out = apply_filter(&ds, Some("COUNTY"), Some(&spec));
        assert_eq!(totpop(&out), vec![10.0, 40.0]);
    }

    #[test]
    fn no_column_is_identity_and_input_is_untouched() {
        let ds = sample();
        let out = apply_filter(&ds, None, None);
        assert_eq!(out.rows, ds.rows);

        let spec = FilterSpec::Range { lo: 100.0, hi: 200.0 };
        let empty = apply_filter(&ds, Some("E_TOTPOP"), Some(&spec));
        assert!(empty.is_empty());
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = sample();
        let spec = FilterSpec::Range { lo: 15.0, hi: 35.0 };
        let once = apply_filter(&ds, Some("E_TOTPOP"), Some(&spec));
        let twice = apply_filter(&once, Some("E_TOTPOP"), Some(&spec));
        assert_eq!(once.rows, twice.rows);

        let spec = FilterSpec::Values([CellValue::String("Lea".into())].into_iter().collect());
        let once = apply_filter(&ds, Some("COUNTY"), Some(&spec));
        let twice = apply_filter(&once, Some("COUNTY"), Some(&spec));
        assert_eq!(once.rows, twice.rows);
    }

    #[test]
    fn unknown_column_is_ignored() {
        let ds = sample();
        assert_eq!(apply_filter(&ds, Some("NOPE"), None).len(), 4);
    }

    #[test]
    fn many_values_hint_only_for_categorical() {
        let rows = (0..60)
            .map(|i| vec![CellValue::String(format!("tract {i}")), CellValue::Integer(i)])
            .collect();
        let ds = Dataset::new(vec!["NAME".into(), "N".into()], rows);
        assert_eq!(many_values_hint(&ds, "NAME", 50), Some(60));
        assert_eq!(many_values_hint(&ds, "NAME", 60), None);
        assert_eq!(many_values_hint(&ds, "N", 50), None);
    }
}
