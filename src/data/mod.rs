/// Data layer: core types, loading, caching, filtering and statistics.
///
/// Architecture:
/// ```text
///  default path / uploaded file
///        │
///        ▼
///   ┌──────────────┐
///   │ source/cache │  memoise by source identity
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse .csv / .parquet / .json → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset  │  ordered columns, inferred kinds, rows
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │  filter  │   │  stats   │  describe(), box spreads
///   └──────────┘   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod source;
pub mod stats;
