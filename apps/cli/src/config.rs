//! Command-line arguments and the optional YAML config file.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use venue_core::{PeriodPreset, ReportPeriod, SalarySettings, StoreId};

#[derive(Debug, Default)]
pub struct Args {
    pub input: Option<PathBuf>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub preset: Option<PeriodPreset>,
    pub today: Option<NaiveDate>,
    pub stores: BTreeSet<StoreId>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub version: bool,
}

fn parse_date(flag: &str, value: Option<String>) -> Result<NaiveDate> {
    let value = value.ok_or_else(|| anyhow!("{flag} needs a value"))?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").with_context(|| format!("{flag} {value}"))
}

pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--input" => out.input = it.next().map(PathBuf::from),
            "--from" => out.from = Some(parse_date("--from", it.next())?),
            "--to" => out.to = Some(parse_date("--to", it.next())?),
            "--today" => out.today = Some(parse_date("--today", it.next())?),
            "--period" => {
                let name = it.next().ok_or_else(|| anyhow!("--period needs a value"))?;
                out.preset = Some(name.parse()?);
            }
            "--store" => {
                let id = it.next().ok_or_else(|| anyhow!("--store needs a value"))?;
                out.stores.insert(StoreId(id));
            }
            "--config" => out.config = it.next().map(PathBuf::from),
            "--output" => out.output = it.next().map(PathBuf::from),
            "--version" => out.version = true,
            other => bail!("unrecognized argument: {other}"),
        }
    }
    Ok(out)
}

/// Defaults read from `--config`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Used when the input bundle carries no wage settings.
    pub salary_settings: SalarySettings,
    pub default_period: PeriodPreset,
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            salary_settings: SalarySettings::default(),
            default_period: PeriodPreset::ThisMonth,
            pretty: true,
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

impl Args {
    /// Explicit bounds win over a preset; a single bound is an error.
    pub fn period(&self, config: &CliConfig, today: NaiveDate) -> Result<ReportPeriod> {
        match (self.from, self.to) {
            (Some(start), Some(end)) => Ok(ReportPeriod::new(start, end)?),
            (None, None) => Ok(self.preset.unwrap_or(config.default_period).resolve(today)?),
            _ => bail!("--from and --to must be given together"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn explicit_range_and_stores() {
        let a = args(&[
            "--input", "bundle.json", "--from", "2024-06-01", "--to", "2024-06-30",
            "--store", "a", "--store", "b",
        ])
        .unwrap();
        assert_eq!(a.stores.len(), 2);
        let p = a.period(&CliConfig::default(), d(2024, 7, 1)).unwrap();
        assert_eq!(p.start, d(2024, 6, 1));
        assert_eq!(p.end, d(2024, 6, 30));
    }

    #[test]
    fn preset_falls_back_to_config() {
        let a = args(&["--input", "b.json"]).unwrap();
        let cfg: CliConfig = serde_yaml::from_str("default_period: lastMonth\npretty: false\n").unwrap();
        assert!(!cfg.pretty);
        let p = a.period(&cfg, d(2024, 3, 15)).unwrap();
        assert_eq!(p.start, d(2024, 2, 1));
        assert_eq!(p.end, d(2024, 2, 29));
        let a = args(&["--period", "thisYear"]).unwrap();
        assert_eq!(a.period(&cfg, d(2024, 3, 15)).unwrap().end, d(2024, 12, 31));
    }

    #[test]
    fn half_open_range_rejected() {
        let a = args(&["--from", "2024-06-01"]).unwrap();
        assert!(a.period(&CliConfig::default(), d(2024, 7, 1)).is_err());
        assert!(args(&["--to", "June"]).is_err());
        assert!(args(&["--bogus"]).is_err());
    }

    #[test]
    fn config_salary_overrides_merge_with_stock_table() {
        let cfg: CliConfig = serde_yaml::from_str("salary_settings:\n  gm_hourly_rate: 1500\n").unwrap();
        assert_eq!(cfg.salary_settings.gm_hourly_rate, rust_decimal::Decimal::new(1500, 0));
        assert_eq!(cfg.salary_settings.gm_base_pay, rust_decimal::Decimal::new(2000, 0));
        assert_eq!(cfg.default_period, PeriodPreset::ThisMonth);
    }
}
