use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Used as a key in `BTreeMap` / `BTreeSet` downstream so it must be `Ord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed numeric: order by value, integers first on ties.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (String(a), String(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` for numeric filtering and plotting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Missing values: explicit nulls and NaN floats.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – inferred column type
// ---------------------------------------------------------------------------

/// Inferred type of a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    /// Numeric columns get range filters and summary statistics.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }

    /// Dtype label shown in the column info table.
    pub fn dtype_name(self) -> &'static str {
        match self {
            ColumnKind::Integer => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Bool => "bool",
            ColumnKind::Text => "object",
        }
    }

    /// Infer the kind of a column from already-typed cells.
    ///
    /// Integers with gaps widen to `Float`, an all-missing column is `Float`,
    /// and anything mixing text with other types is `Text`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> Self {
        let mut saw_missing = false;
        let mut saw_int = false;
        let mut saw_float = false;
        let mut saw_bool = false;
        let mut saw_text = false;

        for v in values {
            match v {
                CellValue::Null => saw_missing = true,
                CellValue::Float(f) if f.is_nan() => saw_missing = true,
                CellValue::Integer(_) => saw_int = true,
                CellValue::Float(_) => saw_float = true,
                CellValue::Bool(_) => saw_bool = true,
                CellValue::String(_) => saw_text = true,
            }
        }

        let numeric = saw_int || saw_float;
        if saw_text || (saw_bool && numeric) {
            ColumnKind::Text
        } else if saw_bool {
            if saw_missing {
                ColumnKind::Text
            } else {
                ColumnKind::Bool
            }
        } else if saw_int && !saw_float && !saw_missing {
            ColumnKind::Integer
        } else {
            ColumnKind::Float
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Name and inferred kind of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A loaded table: fixed ordered columns and row-major cells.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Ordered column list; names are unique.
    pub columns: Vec<Column>,
    /// Rows; every row has exactly `columns.len()` cells.
    pub rows: Vec<Vec<CellValue>>,
    /// For each column the sorted set of distinct non-missing values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
    index: HashMap<String, usize>,
}

impl Dataset {
    /// Build a dataset from column names and typed rows, inferring column kinds.
    ///
    /// Duplicate names are made unique (`a`, `a.1`, `a.2`, …) and short rows
    /// are padded with nulls.
    pub fn new(names: Vec<String>, mut rows: Vec<Vec<CellValue>>) -> Self {
        let names = dedupe_names(names);
        let width = names.len();
        for row in &mut rows {
            row.resize(width, CellValue::Null);
        }

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column {
                kind: ColumnKind::infer(rows.iter().map(|r| &r[i])),
                name,
            })
            .collect();

        Self::with_columns(columns, rows)
    }

    /// Build a dataset whose column kinds are already known.
    pub fn with_columns(columns: Vec<Column>, rows: Vec<Vec<CellValue>>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = columns
            .iter()
            .map(|c| (c.name.clone(), BTreeSet::new()))
            .collect();
        for row in &rows {
            for (col, val) in columns.iter().zip(row) {
                if val.is_missing() {
                    continue;
                }
                if let Some(set) = unique_values.get_mut(&col.name) {
                    set.insert(val.clone());
                }
            }
        }

        Dataset {
            columns,
            rows,
            unique_values,
            index,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Cell accessor; `None` for an unknown column or row.
    pub fn value(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Iterate the cells of one column in row order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().map(move |r| &r[column])
    }

    /// Numeric view of a column, skipping missing and non-numeric cells.
    pub fn numeric_values(&self, column: usize) -> Vec<f64> {
        self.column_values(column)
            .filter_map(CellValue::as_f64)
            .collect()
    }

    /// Copy of the given rows, in the given order. Column kinds are kept.
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        let rows = indices
            .iter()
            .filter_map(|&i| self.rows.get(i).cloned())
            .collect();
        Dataset::with_columns(self.columns.clone(), rows)
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> &[Vec<CellValue>] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// Suffix repeated names with `.1`, `.2`, … so every column name is unique.
pub(crate) fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{name}.{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    #[test]
    fn infers_kinds_like_a_dataframe() {
        use CellValue::*;
        assert_eq!(ColumnKind::infer(&[Integer(1), Integer(2)]), ColumnKind::Integer);
        assert_eq!(ColumnKind::infer(&[Integer(1), Null]), ColumnKind::Float);
        assert_eq!(ColumnKind::infer(&[Integer(1), Float(2.5)]), ColumnKind::Float);
        assert_eq!(ColumnKind::infer(&[Null, Null]), ColumnKind::Float);
        assert_eq!(ColumnKind::infer(&[Bool(true), Bool(false)]), ColumnKind::Bool);
        assert_eq!(ColumnKind::infer(&[Integer(1), s("x")]), ColumnKind::Text);
    }

    #[test]
    fn duplicate_headers_become_unique() {
        let ds = Dataset::new(
            vec!["a".into(), "a".into(), "b".into(), "a".into()],
            vec![vec![CellValue::Integer(1); 4]],
        );
        let names: Vec<&str> = ds.column_names().collect();
        assert_eq!(names, ["a", "a.1", "b", "a.2"]);
        assert_eq!(ds.column_index("a.2"), Some(3));
    }

    #[test]
    fn unique_values_skip_missing() {
        let ds = Dataset::new(
            vec!["county".into()],
            vec![vec![s("Taos")], vec![CellValue::Null], vec![s("Lea")], vec![s("Taos")]],
        );
        let uniq: Vec<String> = ds.unique_values["county"].iter().map(|v| v.to_string()).collect();
        assert_eq!(uniq, ["Lea", "Taos"]);
    }

    #[test]
    fn select_rows_keeps_schema_and_source() {
        let ds = Dataset::new(
            vec!["n".into()],
            vec![vec![CellValue::Integer(1)], vec![CellValue::Integer(2)]],
        );
        let sub = ds.select_rows(&[1]);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.columns, ds.columns);
        assert_eq!(ds.len(), 2);
        assert_eq!(sub.value(0, 0), Some(&CellValue::Integer(2)));
    }

    #[test]
    fn mixed_numeric_ordering_is_by_value() {
        assert!(CellValue::Integer(2) < CellValue::Float(2.5));
        assert!(CellValue::Float(1.5) < CellValue::Integer(2));
        assert!(CellValue::Null < CellValue::Integer(0));
    }
}
