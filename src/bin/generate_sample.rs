//! Writes a synthetic, EJI-shaped CSV for trying the dashboard without the
//! real dataset.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "generate_sample", about = "Write a synthetic EJI-shaped CSV")]
struct Args {
    /// Output file
    #[arg(default_value = "EJI_2024_New_Mexico_CLEAN.csv")]
    output: PathBuf,

    /// Number of tracts to generate
    #[arg(default_value_t = 200)]
    rows: usize,

    /// Seed for the deterministic generator
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const COUNTIES: &[(&str, &str)] = &[
    ("001", "Bernalillo"),
    ("013", "Dona Ana"),
    ("025", "Lea"),
    ("029", "Luna"),
    ("031", "McKinley"),
    ("045", "San Juan"),
    ("049", "Santa Fe"),
    ("055", "Taos"),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Percentile rank in `[0, 1]` of each value among all values.
fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    values
        .iter()
        .map(|v| {
            let below = values.iter().filter(|o| *o < v).count();
            below as f64 / (n - 1) as f64
        })
        .collect()
}

struct Tract {
    county: usize,
    tract: u32,
    totpop: f64,
    minrty: f64,
    pov200: f64,
    unemp: f64,
    ozone: f64,
    pm: f64,
    area: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let Args { output, rows, seed } = Args::parse();

    let mut rng = SimpleRng::new(seed);
    let tracts: Vec<Tract> = (0..rows)
        .map(|i| {
            let totpop = rng.range(800.0, 8000.0).round();
            Tract {
                county: (rng.next_u64() % COUNTIES.len() as u64) as usize,
                tract: 100 + i as u32,
                totpop,
                minrty: (totpop * rng.range(0.2, 0.95)).round(),
                pov200: (totpop * rng.range(0.1, 0.6)).round(),
                unemp: (totpop * rng.range(0.01, 0.12)).round(),
                ozone: rng.range(0.0, 12.0),
                pm: rng.range(0.0, 3.0),
                area: rng.range(0.5, 900.0),
            }
        })
        .collect();

    let share = |f: fn(&Tract) -> f64| -> Vec<f64> {
        tracts.iter().map(|t| f(t) / t.totpop).collect()
    };
    let epl_minrty = percentile_ranks(&share(|t| t.minrty));
    let epl_pov200 = percentile_ranks(&share(|t| t.pov200));
    let epl_unemp = percentile_ranks(&share(|t| t.unemp));
    let epl_ozone = percentile_ranks(&tracts.iter().map(|t| t.ozone).collect::<Vec<_>>());
    let epl_pm = percentile_ranks(&tracts.iter().map(|t| t.pm).collect::<Vec<_>>());

    let spl_svm: Vec<f64> = (0..rows)
        .map(|i| epl_minrty[i] + epl_pov200[i] + epl_unemp[i])
        .collect();
    let spl_ebm: Vec<f64> = (0..rows).map(|i| epl_ozone[i] + epl_pm[i]).collect();
    let rpl_svm = percentile_ranks(&spl_svm);
    let rpl_ebm = percentile_ranks(&spl_ebm);
    let spl_eji: Vec<f64> = (0..rows).map(|i| rpl_svm[i] + rpl_ebm[i]).collect();
    let rpl_eji = percentile_ranks(&spl_eji);

    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("creating {}", output.display()))?;
    writer.write_record([
        "STATEFP", "COUNTYFP", "TRACTCE", "GEOID", "COUNTY", "StateAbbr", "AREA_SQMI",
        "E_TOTPOP", "E_MINRTY", "E_POV200", "E_UNEMP", "E_OZONE", "E_PM",
        "EPL_MINRTY", "EPL_POV200", "EPL_UNEMP", "EPL_OZONE", "EPL_PM",
        "F_POV200", "SPL_SVM", "RPL_SVM", "SPL_EBM", "RPL_EBM", "SPL_EJI", "RPL_EJI",
    ])?;

    for (i, t) in tracts.iter().enumerate() {
        let (countyfp, county) = COUNTIES[t.county];
        let tractce = format!("{:06}", t.tract);
        writer.write_record([
            "35".to_string(),
            countyfp.to_string(),
            tractce.clone(),
            format!("35{countyfp}{tractce}"),
            county.to_string(),
            "NM".to_string(),
            format!("{:.3}", t.area),
            format!("{}", t.totpop),
            format!("{}", t.minrty),
            format!("{}", t.pov200),
            format!("{}", t.unemp),
            format!("{:.4}", t.ozone),
            format!("{:.4}", t.pm),
            format!("{:.4}", epl_minrty[i]),
            format!("{:.4}", epl_pov200[i]),
            format!("{:.4}", epl_unemp[i]),
            format!("{:.4}", epl_ozone[i]),
            format!("{:.4}", epl_pm[i]),
            u8::from(epl_pov200[i] >= 0.6666).to_string(),
            format!("{:.4}", spl_svm[i]),
            format!("{:.4}", rpl_svm[i]),
            format!("{:.4}", spl_ebm[i]),
            format!("{:.4}", rpl_ebm[i]),
            format!("{:.4}", spl_eji[i]),
            format!("{:.4}", rpl_eji[i]),
        ])?;
    }
    writer.flush()?;

    log::info!("Wrote {rows} tracts to {}", output.display());
    println!("Wrote {rows} synthetic tracts to {}", output.display());
    Ok(())
}
