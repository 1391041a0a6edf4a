use serde::Serialize;

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// `describe()`-style summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); NaN with fewer than two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summaries for every numeric column, in column order.
pub fn describe(dataset: &Dataset) -> Vec<ColumnSummary> {
    dataset
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind.is_numeric())
        .map(|(i, c)| summarize(&c.name, dataset.numeric_values(i)))
        .collect()
}

fn summarize(column: &str, mut values: Vec<f64>) -> ColumnSummary {
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let mean = if count == 0 {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / count as f64
    };
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    };

    ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: values.first().copied().unwrap_or(f64::NAN),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.last().copied().unwrap_or(f64::NAN),
    }
}

/// Quantile of sorted values with linear interpolation between closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// ---------------------------------------------------------------------------
// Box-plot spread
// ---------------------------------------------------------------------------

/// Five-number summary for one box: whiskers reach the furthest point within
/// 1.5 IQR of the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let fence = 1.5 * (q3 - q1);
    let lower_whisker = sorted.iter().copied().find(|v| *v >= q1 - fence).unwrap_or(q1);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|v| *v <= q3 + fence)
        .unwrap_or(q3);

    Some(BoxSummary {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    #[test]
    fn describe_matches_dataframe_conventions() {
        let ds = Dataset::new(
            vec!["E_TOTPOP".into(), "COUNTY".into()],
            vec![
                vec![CellValue::Integer(10), CellValue::String("Taos".into())],
                vec![CellValue::Integer(20), CellValue::String("Lea".into())],
                vec![CellValue::Integer(30), CellValue::String("Lea".into())],
                vec![CellValue::Integer(40), CellValue::String("Taos".into())],
            ],
        );
        let summary = describe(&ds);
        assert_eq!(summary.len(), 1);
        let s = &summary[0];
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 25.0);
        assert!((s.std - 12.909944487358056).abs() < 1e-12);
        assert_eq!((s.min, s.q25, s.median, s.q75, s.max), (10.0, 17.5, 25.0, 32.5, 40.0));
    }

    #[test]
    fn describe_skips_missing_cells() {
        let ds = Dataset::new(
            vec!["v".into()],
            vec![vec![CellValue::Float(2.0)], vec![CellValue::Null]],
        );
        let s = &describe(&ds)[0];
        assert_eq!(s.count, 1);
        assert!(s.std.is_nan());
    }

    #[test]
    fn whiskers_stop_at_fences() {
        let b = box_summary(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!((b.q1, b.median, b.q3), (2.0, 3.0, 4.0));
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 4.0);
        assert!(box_summary(&[]).is_none());
    }
}
