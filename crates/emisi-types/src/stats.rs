//! Fleet statistics (`GET /api/statistics`)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::FuelType;

/// Valid results counted per month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyResults {
    /// Display label such as `May 2025`
    pub month: String,
    pub passing: usize,
    pub failing: usize,
    pub total: usize,
}

/// One of the most recent test results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTest {
    #[serde(default)]
    pub id: Option<i64>,
    pub plat_nomor: String,
    #[serde(default)]
    pub merek: String,
    #[serde(default)]
    pub tipe: String,
    /// Formatted by the server as `YYYY-MM-DD HH:MM`
    #[serde(default)]
    pub tanggal: Option<String>,
    pub lulus: bool,
    pub fuel_type: FuelType,
}

/// Dashboard summary computed by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_kendaraan: usize,
    /// Valid results only
    pub total_tests: usize,
    pub passing_tests: usize,
    pub failing_tests: usize,
    /// Percentage, one decimal
    #[serde(default)]
    pub pass_rate: f64,
    /// Vehicle count per fuel tag as sent by the server
    #[serde(default)]
    pub vehicle_types: BTreeMap<String, usize>,
    #[serde(default)]
    pub monthly_results: Vec<MonthlyResults>,
    #[serde(default)]
    pub recent_tests: Vec<RecentTest>,
}

impl Statistics {
    /// Vehicles of `fuel`, counting legacy tags under their canonical type
    pub fn vehicles_with_fuel(&self, fuel: FuelType) -> usize {
        self.vehicle_types
            .iter()
            .filter(|(tag, _)| tag.parse::<FuelType>().ok() == Some(fuel))
            .map(|(_, count)| count)
            .sum()
    }

    /// Vehicles without any test result
    pub fn untested(&self) -> usize {
        self.total_kendaraan.saturating_sub(self.total_tests)
    }

    /// Pass rate rounded to one decimal, as the backend reports it
    pub fn rate(passing: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (passing as f64 / total as f64 * 1000.0).round() / 10.0
    }
}
