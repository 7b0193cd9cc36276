//! Vehicle registration rules
//!
//! Mirrors the checks the backend performs so that obviously invalid input is
//! rejected before a request is sent.

use emisi_types::{
    FuelType, Jenis, LoadCategory, NewVehicle, ValidationErrors, VehicleUpdate, NO_INSTANSI,
};

pub const MIN_PLATE_LEN: usize = 4;
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// Plates are stored trimmed and upper-cased
pub fn normalize_plate(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Registration form as entered by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleDraft {
    pub jenis: Option<Jenis>,
    pub plat_nomor: String,
    pub merek: String,
    pub tipe: String,
    pub tahun: String,
    pub fuel_type: FuelType,
    pub load_category: Option<LoadCategory>,
    pub nama_instansi: String,
}

impl Default for VehicleDraft {
    fn default() -> Self {
        Self {
            jenis: None,
            plat_nomor: String::new(),
            merek: String::new(),
            tipe: String::new(),
            tahun: String::new(),
            fuel_type: FuelType::Bensin,
            load_category: None,
            nama_instansi: NO_INSTANSI.to_string(),
        }
    }
}

impl VehicleDraft {
    /// Change fuel type; a load category from the other fuel type is dropped
    pub fn set_fuel_type(&mut self, fuel: FuelType) {
        self.fuel_type = fuel;
        if let Some(category) = self.load_category {
            if !fuel.permits(category) {
                self.load_category = None;
            }
        }
    }

    /// Change jenis; the institution field is only editable for dinas vehicles
    pub fn set_jenis(&mut self, jenis: Jenis) {
        self.jenis = Some(jenis);
        match jenis {
            Jenis::Dinas => {
                if self.nama_instansi == NO_INSTANSI {
                    self.nama_instansi.clear();
                }
            }
            Jenis::Umum => self.nama_instansi = NO_INSTANSI.to_string(),
        }
    }

    pub fn instansi_required(&self) -> bool {
        self.jenis == Some(Jenis::Dinas)
    }

    /// Load categories offered for the current fuel type
    pub fn load_category_options(&self) -> &'static [LoadCategory] {
        self.fuel_type.load_categories()
    }

    /// Validate every field and build the request payload
    pub fn validate(&self) -> Result<NewVehicle, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.jenis.is_none() {
            errors.push("jenis", "Jenis kendaraan harus dipilih");
        }

        let plat = normalize_plate(&self.plat_nomor);
        if plat.chars().count() < MIN_PLATE_LEN {
            errors.push("plat_nomor", "Format nomor polisi tidak valid (min. 4 karakter)");
        }

        if self.merek.trim().is_empty() {
            errors.push("merek", "Merek tidak boleh kosong");
        }
        if self.tipe.trim().is_empty() {
            errors.push("tipe", "Tipe tidak boleh kosong");
        }

        let tahun = self.tahun.trim().parse::<i32>().ok();
        let tahun = match tahun {
            Some(t) if (MIN_YEAR..=MAX_YEAR).contains(&t) => Some(t),
            _ => {
                errors.push("tahun", "Tahun harus di antara 1900 dan 2100");
                None
            }
        };

        match self.load_category {
            None => errors.push("load_category", "Kategori beban harus dipilih"),
            Some(c) if !self.fuel_type.permits(c) => errors.push(
                "load_category",
                format!(
                    "Kategori beban tidak valid untuk {}. Pilihan: {}",
                    self.fuel_type,
                    category_list(self.fuel_type)
                ),
            ),
            Some(_) => {}
        }

        let instansi = self.nama_instansi.trim();
        if self.instansi_required() && (instansi.is_empty() || instansi == NO_INSTANSI) {
            errors.push("nama_instansi", "Nama instansi harus diisi untuk kendaraan dinas");
        }

        errors.into_result()?;

        // All Options are Some past this point; errors were reported otherwise.
        let (Some(jenis), Some(tahun), Some(load_category)) = (self.jenis, tahun, self.load_category)
        else {
            return Err(ValidationErrors::single("jenis", "Formulir tidak lengkap"));
        };

        let nama_instansi = if jenis == Jenis::Dinas {
            instansi.to_string()
        } else {
            NO_INSTANSI.to_string()
        };

        Ok(NewVehicle {
            jenis,
            plat_nomor: plat,
            merek: self.merek.trim().to_string(),
            tipe: self.tipe.trim().to_string(),
            tahun,
            fuel_type: self.fuel_type,
            nama_instansi,
            load_category,
        })
    }
}

/// Check a partial update and normalize its text fields.
///
/// Only the fields present are checked; a load category is checked against
/// the fuel type only when both are given.
pub fn validate_update(update: &VehicleUpdate) -> Result<VehicleUpdate, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut normalized = update.clone();

    if update.is_empty() {
        errors.push("plat_nomor", "Tidak ada perubahan");
    }

    let trimmed = |value: &Option<String>| value.as_ref().map(|v| v.trim().to_string());
    normalized.merek = trimmed(&update.merek);
    if normalized.merek.as_deref() == Some("") {
        errors.push("merek", "Merek tidak boleh kosong");
    }
    normalized.tipe = trimmed(&update.tipe);
    if normalized.tipe.as_deref() == Some("") {
        errors.push("tipe", "Tipe tidak boleh kosong");
    }

    if let Some(tahun) = update.tahun {
        if !(MIN_YEAR..=MAX_YEAR).contains(&tahun) {
            errors.push("tahun", "Tahun harus di antara 1900 dan 2100");
        }
    }

    if let (Some(fuel), Some(category)) = (update.fuel_type, update.load_category) {
        if !fuel.permits(category) {
            errors.push(
                "load_category",
                format!(
                    "Kategori beban tidak valid untuk {}. Pilihan: {}",
                    fuel,
                    category_list(fuel)
                ),
            );
        }
    }

    normalized.nama_instansi = trimmed(&update.nama_instansi);
    match update.jenis {
        Some(Jenis::Umum) => normalized.nama_instansi = Some(NO_INSTANSI.to_string()),
        Some(Jenis::Dinas) => {
            let missing = normalized
                .nama_instansi
                .as_deref()
                .map_or(true, |i| i.is_empty() || i == NO_INSTANSI);
            if missing {
                errors.push("nama_instansi", "Nama instansi harus diisi untuk kendaraan dinas");
            }
        }
        None => {}
    }

    errors.into_result()?;
    Ok(normalized)
}

fn category_list(fuel: FuelType) -> String {
    fuel.load_categories()
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_update() {
        let empty = validate_update(&VehicleUpdate::default()).unwrap_err();
        assert!(empty.has_field("plat_nomor"));

        let update = VehicleUpdate {
            merek: Some("  Mitsubishi ".to_string()),
            jenis: Some(Jenis::Umum),
            nama_instansi: Some("Dinas PU".to_string()),
            ..Default::default()
        };
        let normalized = validate_update(&update).unwrap();
        assert_eq!(normalized.merek.as_deref(), Some("Mitsubishi"));
        assert_eq!(normalized.nama_instansi.as_deref(), Some(NO_INSTANSI));

        let mismatch = VehicleUpdate {
            fuel_type: Some(FuelType::Solar),
            load_category: Some(LoadCategory::KendaraanPenumpang),
            tahun: Some(1850),
            ..Default::default()
        };
        let errors = validate_update(&mismatch).unwrap_err();
        assert!(errors.has_field("load_category"));
        assert!(errors.has_field("tahun"));

        let dinas = VehicleUpdate {
            jenis: Some(Jenis::Dinas),
            ..Default::default()
        };
        assert!(validate_update(&dinas).unwrap_err().has_field("nama_instansi"));
    }

    fn valid_draft() -> VehicleDraft {
        let mut draft = VehicleDraft {
            plat_nomor: " b 1234 cd ".to_string(),
            merek: "Toyota ".to_string(),
            tipe: "Avanza".to_string(),
            tahun: "2020".to_string(),
            ..Default::default()
        };
        draft.set_jenis(Jenis::Umum);
        draft.load_category = Some(LoadCategory::KendaraanPenumpang);
        draft
    }

    #[test]
    fn test_valid_draft_normalizes() {
        let vehicle = valid_draft().validate().unwrap();
        assert_eq!(vehicle.plat_nomor, "B 1234 CD");
        assert_eq!(vehicle.merek, "Toyota");
        assert_eq!(vehicle.nama_instansi, "-");
        assert_eq!(vehicle.tahun, 2020);
    }

    #[test]
    fn test_mismatched_load_category_is_rejected() {
        let mut draft = valid_draft();
        draft.fuel_type = FuelType::Solar;
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["load_category"]);
    }

    #[test]
    fn test_switching_fuel_type_drops_foreign_category() {
        let mut draft = valid_draft();
        draft.set_fuel_type(FuelType::Solar);
        assert_eq!(draft.load_category, None);
        assert_eq!(
            draft.load_category_options(),
            &[LoadCategory::BelowThreeHalfTon, LoadCategory::ThreeHalfTonOrMore]
        );

        draft.load_category = Some(LoadCategory::BelowThreeHalfTon);
        draft.set_fuel_type(FuelType::Solar);
        assert_eq!(draft.load_category, Some(LoadCategory::BelowThreeHalfTon));
    }

    #[test]
    fn test_dinas_requires_instansi() {
        let mut draft = valid_draft();
        draft.set_jenis(Jenis::Dinas);
        assert_eq!(draft.nama_instansi, "");
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["nama_instansi"]);

        draft.nama_instansi = "Dinas Perhubungan".to_string();
        let vehicle = draft.validate().unwrap();
        assert_eq!(vehicle.nama_instansi, "Dinas Perhubungan");

        draft.set_jenis(Jenis::Umum);
        assert_eq!(draft.nama_instansi, "-");
    }

    #[test]
    fn test_reports_every_invalid_field() {
        let draft = VehicleDraft {
            plat_nomor: "B1".to_string(),
            tahun: "1800".to_string(),
            ..Default::default()
        };
        let errors = draft.validate().unwrap_err();
        assert_eq!(
            errors.fields(),
            vec!["jenis", "plat_nomor", "merek", "tipe", "tahun", "load_category"]
        );
    }

    #[test]
    fn test_non_numeric_year() {
        let mut draft = valid_draft();
        draft.tahun = "dua ribu".to_string();
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.message_for("tahun"), Some("Tahun harus di antara 1900 dan 2100"));
    }
}
