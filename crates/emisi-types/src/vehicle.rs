//! Vehicle registration types

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder stored in `nama_instansi` for non-institutional vehicles
pub const NO_INSTANSI: &str = "-";

/// Vehicle category (jenis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jenis {
    /// General public vehicle
    Umum,
    /// Institutional / government vehicle
    Dinas,
}

impl Jenis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Jenis::Umum => "umum",
            Jenis::Dinas => "dinas",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Jenis::Umum => "Umum",
            Jenis::Dinas => "Dinas",
        }
    }

    pub fn all() -> [Jenis; 2] {
        [Jenis::Umum, Jenis::Dinas]
    }
}

impl fmt::Display for Jenis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Jenis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "umum" => Ok(Jenis::Umum),
            "dinas" => Ok(Jenis::Dinas),
            other => Err(format!("Invalid vehicle type '{}' (must be 'umum' or 'dinas')", other)),
        }
    }
}

/// Fuel type. `bensin` and `solar` are canonical; `petrol` and `diesel` are
/// accepted as legacy spellings and never emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    /// Spark-ignition (petrol)
    #[default]
    #[serde(alias = "petrol")]
    #[value(alias = "petrol")]
    Bensin,
    /// Compression-ignition (diesel)
    #[serde(alias = "diesel")]
    #[value(alias = "diesel")]
    Solar,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Bensin => "bensin",
            FuelType::Solar => "solar",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FuelType::Bensin => "Bensin",
            FuelType::Solar => "Solar",
        }
    }

    /// Load categories permitted for this fuel type
    pub fn load_categories(&self) -> &'static [LoadCategory] {
        match self {
            FuelType::Bensin => &[LoadCategory::KendaraanMuatan, LoadCategory::KendaraanPenumpang],
            FuelType::Solar => &[LoadCategory::BelowThreeHalfTon, LoadCategory::ThreeHalfTonOrMore],
        }
    }

    pub fn permits(&self, category: LoadCategory) -> bool {
        self.load_categories().contains(&category)
    }

    pub fn all() -> [FuelType; 2] {
        [FuelType::Bensin, FuelType::Solar]
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FuelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bensin" | "petrol" => Ok(FuelType::Bensin),
            "solar" | "diesel" => Ok(FuelType::Solar),
            other => Err(format!("Invalid fuel type '{}' (must be 'bensin' or 'solar')", other)),
        }
    }
}

/// Weight/usage class; the valid set depends on the fuel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadCategory {
    #[serde(rename = "kendaraan_muatan")]
    KendaraanMuatan,
    #[serde(rename = "kendaraan_penumpang")]
    KendaraanPenumpang,
    #[serde(rename = "<3.5ton")]
    BelowThreeHalfTon,
    #[serde(rename = ">=3.5ton")]
    ThreeHalfTonOrMore,
}

impl LoadCategory {
    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadCategory::KendaraanMuatan => "kendaraan_muatan",
            LoadCategory::KendaraanPenumpang => "kendaraan_penumpang",
            LoadCategory::BelowThreeHalfTon => "<3.5ton",
            LoadCategory::ThreeHalfTonOrMore => ">=3.5ton",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadCategory::KendaraanMuatan => "Kendaraan Muatan",
            LoadCategory::KendaraanPenumpang => "Kendaraan Penumpang",
            LoadCategory::BelowThreeHalfTon => "Kurang dari 3.5 Ton",
            LoadCategory::ThreeHalfTonOrMore => "Lebih dari atau sama dengan 3.5 Ton",
        }
    }

    /// The fuel type this category belongs to
    pub fn fuel_type(&self) -> FuelType {
        match self {
            LoadCategory::KendaraanMuatan | LoadCategory::KendaraanPenumpang => FuelType::Bensin,
            LoadCategory::BelowThreeHalfTon | LoadCategory::ThreeHalfTonOrMore => FuelType::Solar,
        }
    }
}

impl fmt::Display for LoadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "kendaraan_muatan" => Ok(LoadCategory::KendaraanMuatan),
            "kendaraan_penumpang" => Ok(LoadCategory::KendaraanPenumpang),
            "<3.5ton" => Ok(LoadCategory::BelowThreeHalfTon),
            ">=3.5ton" => Ok(LoadCategory::ThreeHalfTonOrMore),
            other => Err(format!("Unknown load category '{}'", other)),
        }
    }
}

fn null_as_dash<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NO_INSTANSI.to_string(),
    })
}

fn default_instansi() -> String {
    NO_INSTANSI.to_string()
}

/// Registered vehicle as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Backend row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// License plate, unique
    pub plat_nomor: String,
    pub merek: String,
    pub tipe: String,
    pub tahun: i32,
    pub jenis: Jenis,
    /// Institution name, `-` unless `jenis == dinas`
    #[serde(default = "default_instansi", deserialize_with = "null_as_dash")]
    pub nama_instansi: String,
    #[serde(default)]
    pub fuel_type: FuelType,
    /// Absent on records registered before load categories existed
    #[serde(default)]
    pub load_category: Option<LoadCategory>,
}

impl Vehicle {
    pub fn is_dinas(&self) -> bool {
        self.jenis == Jenis::Dinas
    }

    /// Institution name for display; `-` when not applicable
    pub fn instansi(&self) -> &str {
        if self.is_dinas() && !self.nama_instansi.trim().is_empty() {
            &self.nama_instansi
        } else {
            NO_INSTANSI
        }
    }

    /// True when the stored load category belongs to the vehicle's fuel type
    pub fn load_category_consistent(&self) -> bool {
        self.load_category
            .map(|c| self.fuel_type.permits(c))
            .unwrap_or(true)
    }
}

/// Validated payload for `POST /api/kendaraan`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVehicle {
    pub jenis: Jenis,
    pub plat_nomor: String,
    pub merek: String,
    pub tipe: String,
    pub tahun: i32,
    pub fuel_type: FuelType,
    pub nama_instansi: String,
    pub load_category: LoadCategory,
}

impl From<NewVehicle> for Vehicle {
    fn from(v: NewVehicle) -> Self {
        Vehicle {
            id: None,
            plat_nomor: v.plat_nomor,
            merek: v.merek,
            tipe: v.tipe,
            tahun: v.tahun,
            jenis: v.jenis,
            nama_instansi: v.nama_instansi,
            fuel_type: v.fuel_type,
            load_category: Some(v.load_category),
        }
    }
}

/// Partial update for `PUT /api/kendaraan/{plat}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merek: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tahun: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jenis: Option<Jenis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nama_instansi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<FuelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_category: Option<LoadCategory>,
}

impl VehicleUpdate {
    pub fn is_empty(&self) -> bool {
        *self == VehicleUpdate::default()
    }
}

/// One page of `GET /api/kendaraan-list`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehiclePage {
    pub items: Vec<Vehicle>,
    /// Server-reported total across all pages
    pub total: usize,
}

/// Row-level failure reported by batch upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRowError {
    pub row: usize,
    pub error: String,
}

/// Response of `POST /api/kendaraan/batch-upload`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUploadReport {
    pub successes: usize,
    #[serde(default)]
    pub errors: Vec<BatchRowError>,
    #[serde(default)]
    pub total_rows: Option<usize>,
}

impl BatchUploadReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// One-line summary, e.g. "Berhasil: 3 kendaraan; 1 kendaraan gagal"
    pub fn summary(&self) -> String {
        let mut msg = format!("Berhasil: {} kendaraan", self.successes);
        if self.has_errors() {
            msg.push_str(&format!("; {} kendaraan gagal", self.errors.len()));
        }
        msg
    }

    /// Per-row detail lines
    pub fn error_lines(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("Baris {}: {}", e.row, e.error))
            .collect()
    }
}
