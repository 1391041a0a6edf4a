//! Human-readable definitions for EJI column abbreviations.
//!
//! Resolution order for a column name:
//! 1. exact match in [`EXACT_DEFINITIONS`];
//! 2. indicator prefix (`EPL_`, `E_`, `RPL_`, `F_`, `SPL_`, checked in that order)
//!    followed by a suffix token looked up in [`SUFFIX_MEANINGS`], or used verbatim;
//! 3. [`FALLBACK_DEFINITION`].

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

use crate::data::model::Dataset;

/// Returned for names that no rule explains.
pub const FALLBACK_DEFINITION: &str = "Not yet defined (dataset-specific indicator).";

/// Curated definitions keyed by full column name.
pub const EXACT_DEFINITIONS: &[(&str, &str)] = &[
    // Geography and identifiers
    ("STATEFP", "State FIPS Code — standardized code identifying each U.S. state."),
    ("COUNTYFP", "County FIPS Code — standardized 3-digit identifier for each county."),
    ("TRACTCE", "Census Tract Code — identifies a specific census tract within a county."),
    ("GEOID", "Geographic Identifier — unique ID combining state, county, and tract."),
    ("GEOID_2020", "Geographic Identifier using 2020 census tract boundaries."),
    ("AFFGEOID", "American FactFinder geographic identifier for the tract."),
    ("NAME", "Name of the geographic area (e.g., census tract name)."),
    ("NAMELSAD", "Name of the area with its legal/statistical area description."),
    ("MTFCC", "MAF/TIGER feature class code describing the geographic feature."),
    ("FUNCSTAT", "Functional status of the geographic entity."),
    ("ALAND", "Land area in square meters."),
    ("AWATER", "Water area in square meters."),
    ("AREA_SQMI", "Tract area in square miles."),
    ("INTPTLAT", "Latitude of an internal reference point (centroid) for the area."),
    ("INTPTLONG", "Longitude of an internal reference point (centroid) for the area."),
    ("STATE", "State name."),
    ("ST_ABBR", "Two-letter state abbreviation."),
    ("StateAbbr", "Two-letter state abbreviation."),
    ("StateDesc", "State name."),
    ("COUNTY", "County name."),
    ("COUNTYNS", "County GNIS code — permanent federal identifier for the county."),
    ("Location", "Tract description including county and state."),
    ("OBJECTID", "Row identifier assigned by the GIS export."),
    ("Shape_Length", "Perimeter of the tract polygon in map units."),
    ("Shape_Area", "Area of the tract polygon in map units."),
    // Overall and module scores
    ("SPL_EJI", "Sum of the module percentile ranks that make up the Environmental Justice Index."),
    (
        "RPL_EJI",
        "Environmental Justice Index — overall percentile rank (0–1) of cumulative burden.",
    ),
    ("SPL_EJI_CBM", "Sum of module percentile ranks including the Climate Burden Module."),
    (
        "RPL_EJI_CBM",
        "Environmental Justice Index percentile rank including the Climate Burden Module.",
    ),
    (
        "SPL_SER",
        "Sum of the environmental and social module percentile ranks (Social-Environmental Ranking).",
    ),
    (
        "RPL_SER",
        "Social-Environmental Ranking — percentile rank of combined environmental and social burden.",
    ),
    ("SPL_EBM", "Sum of the Environmental Burden Module domain percentile ranks."),
    ("RPL_EBM", "Environmental Burden Module — percentile rank of environmental burden."),
    ("SPL_SVM", "Sum of the Social Vulnerability Module domain percentile ranks."),
    ("RPL_SVM", "Social Vulnerability Module — percentile rank of social vulnerability."),
    ("SPL_HVM", "Sum of the Health Vulnerability Module indicator flags."),
    ("RPL_HVM", "Health Vulnerability Module — percentile rank of pre-existing health burden."),
    ("SPL_CBM", "Sum of the Climate Burden Module indicator percentile ranks."),
    ("RPL_CBM", "Climate Burden Module — percentile rank of projected climate burden."),
    // Environmental Burden Module domains
    ("RPL_EBM_DOM1", "Environmental Burden domain 1 percentile rank: air pollution."),
    (
        "RPL_EBM_DOM2",
        "Environmental Burden domain 2 percentile rank: potentially hazardous and toxic sites.",
    ),
    ("RPL_EBM_DOM3", "Environmental Burden domain 3 percentile rank: built environment."),
    (
        "RPL_EBM_DOM4",
        "Environmental Burden domain 4 percentile rank: transportation infrastructure.",
    ),
    ("RPL_EBM_DOM5", "Environmental Burden domain 5 percentile rank: water pollution."),
    ("SPL_EBM_DOM1", "Sum of indicator percentile ranks in the air pollution domain."),
    ("SPL_EBM_DOM2", "Sum of indicator percentile ranks in the hazardous and toxic sites domain."),
    ("SPL_EBM_DOM3", "Sum of indicator percentile ranks in the built environment domain."),
    (
        "SPL_EBM_DOM4",
        "Sum of indicator percentile ranks in the transportation infrastructure domain.",
    ),
    ("SPL_EBM_DOM5", "Sum of indicator percentile ranks in the water pollution domain."),
    // Social Vulnerability Module domains
    (
        "RPL_SVM_DOM1",
        "Social Vulnerability domain 1 percentile rank: racial/ethnic minority status.",
    ),
    ("RPL_SVM_DOM2", "Social Vulnerability domain 2 percentile rank: socioeconomic status."),
    ("RPL_SVM_DOM3", "Social Vulnerability domain 3 percentile rank: household characteristics."),
    ("RPL_SVM_DOM4", "Social Vulnerability domain 4 percentile rank: housing type."),
    ("SPL_SVM_DOM1", "Sum of indicator percentile ranks in the minority status domain."),
    ("SPL_SVM_DOM2", "Sum of indicator percentile ranks in the socioeconomic status domain."),
    ("SPL_SVM_DOM3", "Sum of indicator percentile ranks in the household characteristics domain."),
    ("SPL_SVM_DOM4", "Sum of indicator percentile ranks in the housing type domain."),
    // Module-level flags
    ("F_EJI", "Flag count across all modules of the Environmental Justice Index."),
    ("F_EBM", "Number of Environmental Burden indicators flagged (≥ 0.6666 percentile)."),
    ("F_SVM", "Number of Social Vulnerability indicators flagged (≥ 0.6666 percentile)."),
    ("F_HVM", "Number of Health Vulnerability indicators flagged (≥ 0.6666 percentile)."),
    ("F_CBM", "Number of Climate Burden indicators flagged (≥ 0.6666 percentile)."),
    ("F_TOTAL", "Total number of indicators flagged for the tract."),
    // Margins of error for ACS estimates
    ("M_TOTPOP", "Margin of error for the total population estimate."),
    ("M_DAYPOP", "Margin of error for the daytime population estimate."),
    ("M_MINRTY", "Margin of error for the minority population estimate."),
    ("M_POV200", "Margin of error for persons below 200% of the poverty level."),
    ("M_NOHSDP", "Margin of error for persons with no high school diploma."),
    ("M_UNEMP", "Margin of error for unemployed individuals."),
    ("M_RENTER", "Margin of error for renter-occupied housing units."),
    ("M_HOUBDN", "Margin of error for housing cost-burdened households."),
    ("M_UNINSUR", "Margin of error for persons without health insurance."),
    ("M_NOINT", "Margin of error for households without internet access."),
    ("M_AGE65", "Margin of error for persons aged 65 and older."),
    ("M_AGE17", "Margin of error for persons aged 17 and younger."),
    ("M_DISABL", "Margin of error for persons with a disability."),
    ("M_LIMENG", "Margin of error for persons with limited English proficiency."),
    ("M_MOBILE", "Margin of error for mobile homes."),
    ("M_GROUPQ", "Margin of error for persons living in group quarters."),
    ("MP_MINRTY", "Margin of error for the minority population percentage."),
    ("MP_POV200", "Margin of error for the percentage below 200% of the poverty level."),
    ("MP_NOHSDP", "Margin of error for the percentage with no high school diploma."),
    ("MP_UNEMP", "Margin of error for the unemployment percentage."),
    ("MP_RENTER", "Margin of error for the renter-occupied housing percentage."),
    ("MP_HOUBDN", "Margin of error for the housing cost-burdened percentage."),
    ("MP_UNINSUR", "Margin of error for the uninsured percentage."),
    ("MP_NOINT", "Margin of error for the percentage without internet access."),
    ("MP_AGE65", "Margin of error for the percentage aged 65 and older."),
    ("MP_AGE17", "Margin of error for the percentage aged 17 and younger."),
    ("MP_DISABL", "Margin of error for the percentage with a disability."),
    ("MP_LIMENG", "Margin of error for the limited English proficiency percentage."),
    ("MP_MOBILE", "Margin of error for the mobile home percentage."),
    ("MP_GROUPQ", "Margin of error for the group quarters percentage."),
];

/// Topic meanings for indicator suffix tokens.
pub const SUFFIX_MEANINGS: &[(&str, &str)] = &[
    // Population
    ("TOTPOP", "total population."),
    ("DAYPOP", "adjunct daytime population."),
    // Social vulnerability
    ("MINRTY", "minority population (non-white)."),
    ("POV200", "persons below 200% of the federal poverty level."),
    ("NOHSDP", "persons (25+) with no high school diploma."),
    ("UNEMP", "unemployed individuals (16+ in the labor force)."),
    ("RENTER", "renter-occupied housing units."),
    ("HOUBDN", "housing cost-burdened households (30%+ of income on housing)."),
    ("UNINSUR", "persons without health insurance."),
    ("NOINT", "households without internet access."),
    ("AGE65", "persons aged 65 and older."),
    ("AGE17", "persons aged 17 and younger."),
    ("DISABL", "civilian noninstitutionalized persons with a disability."),
    ("LIMENG", "persons (5+) who speak English less than well."),
    ("MOBILE", "mobile homes."),
    ("GROUPQ", "persons living in group quarters."),
    // Air pollution
    ("OZONE", "annual mean days above the ozone regulatory standard."),
    ("PM", "annual mean days above the PM2.5 regulatory standard."),
    ("DSLPM", "ambient diesel particulate matter concentration."),
    ("TOTCR", "lifetime cancer risk from inhaled air toxics."),
    // Hazardous and toxic sites
    ("NPL", "proportion of tract area within 1 mile of an EPA National Priority List site."),
    ("TRI", "proportion of tract area within 1 mile of a Toxic Release Inventory site."),
    ("TSD", "proportion of tract area within 1 mile of a treatment, storage, and disposal site."),
    ("RMP", "proportion of tract area within 1 mile of a risk management plan site."),
    ("COAL", "proportion of tract area within 1 mile of a coal mine."),
    ("LEAD", "proportion of tract area within 1 mile of a lead mine."),
    // Built environment
    ("PARK", "proportion of tract area within 1 mile of green space."),
    ("HOUAGE", "housing units built before 1980 (potential lead paint exposure)."),
    ("WLKIND", "walkability index."),
    // Transportation infrastructure
    ("RAIL", "proportion of tract area within 1 mile of a railroad."),
    ("ROAD", "proportion of tract area within 1 mile of a high-volume road or highway."),
    ("AIRPRT", "proportion of tract area within 1 mile of an airport."),
    // Water pollution
    ("IMPWTR", "proportion of tract area with impaired surface water."),
    // Health vulnerability
    ("BPHIGH", "adults with high blood pressure."),
    ("ASTHMA", "adults with asthma."),
    ("CANCER", "adults with cancer (excluding skin cancer)."),
    ("MHLTH", "adults reporting poor mental health for 14 or more days."),
    ("DIABETES", "adults with diagnosed diabetes."),
    // Climate burden
    ("BURN", "proportion of tract area within wildfire burn zones."),
    ("SMOKE", "annual days with wildfire smoke."),
    ("EXTHEAT", "annual days of extreme heat."),
    ("DRGHT", "annual weeks of drought."),
];

/// Indicator prefixes with the sentence lead for each, in check order.
/// `EPL_` must be tried before `E_`.
pub const PREFIX_LEADS: &[(&str, &str)] = &[
    ("EPL_", "Percentile rank (0–1) for"),
    ("E_", "Estimated count related to"),
    ("RPL_", "National percentile rank for"),
    ("F_", "Flag/reliability indicator for"),
    ("SPL_", "State percentile rank for"),
];

static EXACT: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| EXACT_DEFINITIONS.iter().copied().collect());

static SUFFIXES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SUFFIX_MEANINGS.iter().copied().collect());

/// Resolve a column name to its description. Total over all inputs.
pub fn resolve(column: &str) -> String {
    if let Some(def) = EXACT.get(column) {
        return (*def).to_string();
    }

    for (prefix, lead) in PREFIX_LEADS {
        let Some(suffix) = column.strip_prefix(prefix) else {
            continue;
        };
        if suffix.is_empty() {
            break;
        }
        let topic = SUFFIXES.get(suffix).copied().unwrap_or(suffix);
        return format!("{lead} {topic}");
    }

    FALLBACK_DEFINITION.to_string()
}

// ---------------------------------------------------------------------------
// Definition tables for the UI
// ---------------------------------------------------------------------------

/// One row of the column info table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDefinition {
    pub column: String,
    pub dtype: &'static str,
    pub description: String,
}

/// Resolve every column of the dataset, in column order.
pub fn definitions_table(dataset: &Dataset) -> Vec<ColumnDefinition> {
    dataset
        .columns
        .iter()
        .map(|c| ColumnDefinition {
            column: c.name.clone(),
            dtype: c.kind.dtype_name(),
            description: resolve(&c.name),
        })
        .collect()
}

/// Lines of the abbreviation reference guide: `KEY — description`.
pub fn reference_guide() -> impl Iterator<Item = String> {
    EXACT_DEFINITIONS
        .iter()
        .map(|(key, def)| format!("{key} — {def}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    #[test]
    fn exact_entries_win() {
        for (key, def) in EXACT_DEFINITIONS {
            assert_eq!(resolve(key), *def, "{key}");
        }
    }

    #[test]
    fn exact_keys_are_unique() {
        assert_eq!(EXACT.len(), EXACT_DEFINITIONS.len());
        assert_eq!(SUFFIXES.len(), SUFFIX_MEANINGS.len());
    }

    #[test]
    fn documented_examples() {
        assert_eq!(
            resolve("E_MINRTY"),
            "Estimated count related to minority population (non-white)."
        );
        assert_eq!(
            resolve("EPL_UNEMP"),
            "Percentile rank (0–1) for unemployed individuals (16+ in the labor force)."
        );
        assert_eq!(resolve("RANDOMCOL"), FALLBACK_DEFINITION);
    }

    #[test]
    fn every_prefix_uses_its_lead() {
        for (prefix, lead) in PREFIX_LEADS {
            for (suffix, meaning) in SUFFIX_MEANINGS {
                let name = format!("{prefix}{suffix}");
                if EXACT.contains_key(name.as_str()) {
                    continue;
                }
                assert_eq!(resolve(&name), format!("{lead} {meaning}"));
            }
        }
    }

    #[test]
    fn epl_is_not_read_as_e_prefix() {
        assert!(resolve("EPL_POV200").starts_with("Percentile rank"));
        assert!(resolve("E_POV200").starts_with("Estimated count"));
    }

    #[test]
    fn unknown_suffix_is_used_verbatim() {
        assert_eq!(resolve("SPL_WIDGETS"), "State percentile rank for WIDGETS");
        assert_eq!(resolve("F_XYZ"), "Flag/reliability indicator for XYZ");
    }

    #[test]
    fn bare_prefix_and_near_misses_fall_back() {
        assert_eq!(resolve("E_"), FALLBACK_DEFINITION);
        assert_eq!(resolve("e_minrty"), FALLBACK_DEFINITION);
        assert_eq!(resolve("EP_MINRTY"), FALLBACK_DEFINITION);
        assert_eq!(resolve(""), FALLBACK_DEFINITION);
    }

    #[test]
    fn table_follows_column_order() {
        let ds = Dataset::new(
            vec!["RANDOMCOL".into(), "GEOID".into(), "E_MINRTY".into()],
            vec![vec![
                CellValue::String("x".into()),
                CellValue::Integer(35001),
                CellValue::Integer(3),
            ]],
        );
        let table = definitions_table(&ds);
        let cols: Vec<&str> = table.iter().map(|d| d.column.as_str()).collect();
        assert_eq!(cols, ["RANDOMCOL", "GEOID", "E_MINRTY"]);
        assert_eq!(table[0].dtype, "object");
        assert_eq!(table[1].description, resolve("GEOID"));
        assert_eq!(table[2].dtype, "int64");
    }

    #[test]
    fn reference_guide_lists_exact_entries() {
        let lines: Vec<String> = reference_guide().collect();
        assert_eq!(lines.len(), EXACT_DEFINITIONS.len());
        assert!(lines[0].starts_with("STATEFP — "));
    }
}
