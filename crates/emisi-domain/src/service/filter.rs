//! Client-side vehicle filtering
//!
//! The filtered view is a pure function of `(vehicles, tested plates, criteria)`;
//! it never mutates its inputs and is always a subset of the loaded vehicles.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use emisi_types::{Jenis, Vehicle};
use serde::{Deserialize, Serialize};

/// Tri-state filter on test status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestedFilter {
    #[default]
    All,
    Tested,
    Untested,
}

impl TestedFilter {
    pub fn matches(&self, is_tested: bool) -> bool {
        match self {
            TestedFilter::All => true,
            TestedFilter::Tested => is_tested,
            TestedFilter::Untested => !is_tested,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestedFilter::All => "Semua",
            TestedFilter::Tested => "Sudah diuji",
            TestedFilter::Untested => "Belum diuji",
        }
    }

    pub fn all() -> [TestedFilter; 3] {
        [TestedFilter::All, TestedFilter::Tested, TestedFilter::Untested]
    }
}

impl fmt::Display for TestedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestedFilter::All => f.write_str("all"),
            TestedFilter::Tested => f.write_str("tested"),
            TestedFilter::Untested => f.write_str("untested"),
        }
    }
}

impl FromStr for TestedFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(TestedFilter::All),
            "tested" => Ok(TestedFilter::Tested),
            "untested" => Ok(TestedFilter::Untested),
            other => Err(format!("Unknown status filter '{}' (all, tested, untested)", other)),
        }
    }
}

/// Filter criteria; an unset criterion always passes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleFilter {
    /// Case-insensitive substring of the plate
    #[serde(default)]
    pub plat: String,
    /// Exact brand
    #[serde(default)]
    pub merek: Option<String>,
    /// Exact type
    #[serde(default)]
    pub tipe: Option<String>,
    #[serde(default)]
    pub jenis: Option<Jenis>,
    #[serde(default)]
    pub tested: TestedFilter,
}

impl VehicleFilter {
    pub fn is_empty(&self) -> bool {
        self.plat.trim().is_empty()
            && blank(&self.merek)
            && blank(&self.tipe)
            && self.jenis.is_none()
            && self.tested == TestedFilter::All
    }

    /// Conjunction of all set criteria
    pub fn matches(&self, vehicle: &Vehicle, tested: &HashSet<String>) -> bool {
        let plat = self.plat.trim().to_lowercase();
        if !plat.is_empty() && !vehicle.plat_nomor.to_lowercase().contains(&plat) {
            return false;
        }
        if let Some(merek) = selected(&self.merek) {
            if vehicle.merek != merek {
                return false;
            }
        }
        if let Some(tipe) = selected(&self.tipe) {
            if vehicle.tipe != tipe {
                return false;
            }
        }
        if let Some(jenis) = self.jenis {
            if vehicle.jenis != jenis {
                return false;
            }
        }
        self.tested.matches(tested.contains(&vehicle.plat_nomor))
    }
}

fn selected(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn blank(value: &Option<String>) -> bool {
    selected(value).is_none()
}

/// Apply `filter` to `vehicles`, preserving order
pub fn filter_vehicles(
    vehicles: &[Vehicle],
    tested: &HashSet<String>,
    filter: &VehicleFilter,
) -> Vec<Vehicle> {
    vehicles
        .iter()
        .filter(|v| filter.matches(v, tested))
        .cloned()
        .collect()
}
