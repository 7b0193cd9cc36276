//! Registration, batch-upload and user forms

use std::path::{Path, PathBuf};

use emisi_domain::repository::{UserRepository, VehicleRepository};
use emisi_domain::service::{
    normalize_plate, validate_password_pair, validate_update, VehicleDraft,
};
use emisi_infra::vehicle_csv::{self, CsvCheck};
use emisi_types::{
    ApiError, BatchUploadReport, Error, NewVehicle, Result, User, ValidationErrors, VehicleUpdate,
};
use tracing::info;

use crate::notify::Notifier;

pub const DUPLICATE_PLATE_MESSAGE: &str = "Nomor plat sudah terdaftar";

/// Single-vehicle registration
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub draft: VehicleDraft,
    errors: ValidationErrors,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_highlighted(&self, field: &str) -> bool {
        self.errors.has_field(field)
    }

    /// Validate the draft; failures are kept for highlighting
    pub fn prepare(&mut self) -> std::result::Result<NewVehicle, ValidationErrors> {
        match self.draft.validate() {
            Ok(vehicle) => {
                self.errors = ValidationErrors::new();
                Ok(vehicle)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    /// Apply the create response. Returns `true` when the vehicle was saved.
    ///
    /// A duplicate plate only flags the plate field; the rest of the draft is
    /// left as typed.
    pub fn finish(&mut self, result: Result<()>, notifier: &mut Notifier) -> bool {
        match result {
            Ok(()) => {
                notifier.success("Kendaraan berhasil disimpan");
                *self = Self::default();
                true
            }
            Err(Error::Api(ApiError::Duplicate(_))) => {
                self.errors = ValidationErrors::single("plat_nomor", DUPLICATE_PLATE_MESSAGE);
                notifier.error(DUPLICATE_PLATE_MESSAGE);
                false
            }
            Err(e) => {
                notifier.error(format!("Gagal menyimpan kendaraan: {}", e.user_message()));
                false
            }
        }
    }

    pub fn submit<R>(&mut self, repo: &R, notifier: &mut Notifier) -> bool
    where
        R: VehicleRepository + ?Sized,
    {
        let vehicle = match self.prepare() {
            Ok(v) => v,
            Err(errors) => {
                notifier.error(errors.to_string());
                return false;
            }
        };
        let result = repo.create(&vehicle);
        self.finish(result, notifier)
    }
}

/// Validate and send a partial update for `plat`. Returns `true` when saved.
pub fn update_vehicle<R>(repo: &R, plat: &str, update: &VehicleUpdate, notifier: &mut Notifier) -> bool
where
    R: VehicleRepository + ?Sized,
{
    let update = match validate_update(update) {
        Ok(update) => update,
        Err(errors) => {
            notifier.error(errors.to_string());
            return false;
        }
    };
    let plat = normalize_plate(plat);
    match repo.update(&plat, &update) {
        Ok(()) => {
            info!("Updated vehicle {}", plat);
            notifier.success("Kendaraan diperbarui");
            true
        }
        Err(e) => {
            notifier.error(format!("Gagal memperbarui kendaraan {}: {}", plat, e.user_message()));
            false
        }
    }
}

/// File content ready to be posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// CSV batch import
#[derive(Debug, Clone, Default)]
pub struct BatchUploadForm {
    file: Option<PathBuf>,
    check: Option<CsvCheck>,
    report: Option<BatchUploadReport>,
}

impl BatchUploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Local pre-check of the selected file
    pub fn check(&self) -> Option<&CsvCheck> {
        self.check.as_ref()
    }

    /// Last server report
    pub fn report(&self) -> Option<&BatchUploadReport> {
        self.report.as_ref()
    }

    /// Choose a file; only `.csv` is accepted
    pub fn select(&mut self, path: &Path) -> std::result::Result<(), ValidationErrors> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(ValidationErrors::single("file", "File harus berformat .csv"));
        }
        self.file = Some(path.to_path_buf());
        self.check = None;
        self.report = None;
        Ok(())
    }

    /// Validate the rows locally before uploading
    pub fn precheck(&mut self) -> Result<&CsvCheck> {
        let path = self.require_file()?;
        let check = vehicle_csv::check_file(&path)?;
        Ok(self.check.insert(check))
    }

    pub fn prepare(&self) -> Result<UploadRequest> {
        let path = self.require_file()?;
        let content = std::fs::read(&path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "kendaraan.csv".to_string());
        Ok(UploadRequest { file_name, content })
    }

    fn require_file(&self) -> Result<PathBuf> {
        self.file
            .clone()
            .ok_or_else(|| ValidationErrors::single("file", "Pilih file CSV terlebih dahulu").into())
    }

    /// Apply the upload response
    pub fn finish(&mut self, result: Result<BatchUploadReport>, notifier: &mut Notifier) -> bool {
        match result {
            Ok(report) => {
                info!("Batch upload: {}", report.summary());
                if report.has_errors() {
                    notifier.warning(report.summary());
                } else {
                    notifier.success(report.summary());
                }
                self.report = Some(report);
                true
            }
            Err(e) => {
                notifier.error(format!("Gagal mengunggah file: {}", e.user_message()));
                false
            }
        }
    }

    pub fn upload<R>(&mut self, repo: &R, notifier: &mut Notifier) -> bool
    where
        R: VehicleRepository + ?Sized,
    {
        let request = match self.prepare() {
            Ok(r) => r,
            Err(e) => {
                notifier.error(e.user_message());
                return false;
            }
        };
        let result = repo.batch_upload(&request.file_name, request.content);
        self.finish(result, notifier)
    }
}

/// User account form: lookup plus password confirmation
#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub user: Option<User>,
    pub password: String,
    pub confirm_password: String,
    errors: ValidationErrors,
}

impl UserForm {
    pub fn editing(&self) -> bool {
        self.user.is_some()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn load<R>(&mut self, repo: &R, id: i64, notifier: &mut Notifier) -> bool
    where
        R: UserRepository + ?Sized,
    {
        let result = repo.find_user(id);
        self.finish_load(result, notifier)
    }

    pub fn finish_load(&mut self, result: Result<User>, notifier: &mut Notifier) -> bool {
        match result {
            Ok(user) => {
                self.user = Some(user);
                true
            }
            Err(e) => {
                self.user = None;
                notifier.error(format!("Gagal memuat pengguna: {}", e.user_message()));
                false
            }
        }
    }

    pub fn validate(&mut self) -> std::result::Result<(), ValidationErrors> {
        let result = validate_password_pair(&self.password, &self.confirm_password, self.editing());
        self.errors = result.clone().err().unwrap_or_default();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emisi_infra::InMemoryBackend;
    use emisi_types::{FuelType, Jenis, LoadCategory};

    fn filled() -> RegistrationForm {
        let mut form = RegistrationForm::new();
        form.draft.set_jenis(Jenis::Umum);
        form.draft.plat_nomor = "b1234xyz".to_string();
        form.draft.merek = "Toyota".to_string();
        form.draft.tipe = "Avanza".to_string();
        form.draft.tahun = "2020".to_string();
        form.draft.set_fuel_type(FuelType::Bensin);
        form.draft.load_category = Some(LoadCategory::KendaraanPenumpang);
        form
    }

    #[test]
    fn test_duplicate_plate_highlights_plate_only() {
        let backend = InMemoryBackend::new();
        let mut notifier = Notifier::default();
        let mut first = filled();
        assert!(first.submit(&backend, &mut notifier));
        assert_eq!(first.draft, VehicleDraft::default());

        let mut second = filled();
        let draft_before = second.draft.clone();
        assert!(!second.submit(&backend, &mut notifier));
        assert_eq!(second.errors().fields(), vec!["plat_nomor"]);
        assert_eq!(second.errors().message_for("plat_nomor"), Some(DUPLICATE_PLATE_MESSAGE));
        assert_eq!(second.draft, draft_before);
        assert_eq!(backend.vehicle_count(), 1);
    }

    #[test]
    fn test_invalid_draft_sends_nothing() {
        let backend = InMemoryBackend::new();
        let mut notifier = Notifier::default();
        let mut form = filled();
        form.draft.load_category = Some(LoadCategory::BelowThreeHalfTon);
        assert!(!form.submit(&backend, &mut notifier));
        assert!(form.is_highlighted("load_category"));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_upload_requires_csv() {
        let mut form = BatchUploadForm::new();
        let err = form.select(Path::new("kendaraan.xlsx")).unwrap_err();
        assert_eq!(err.message_for("file"), Some("File harus berformat .csv"));
        assert!(form.select(Path::new("kendaraan.CSV")).is_ok());
        assert!(matches!(BatchUploadForm::new().prepare(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_upload_round() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kendaraan.csv");
        std::fs::write(
            &path,
            "jenis,plat_nomor,merek,tipe,tahun,fuel_type,nama_instansi,load_category\n\
             umum,B2222BB,Honda,Jazz,2018,bensin,-,kendaraan_penumpang\n\
             umum,B3,Honda,Jazz,2018,bensin,-,kendaraan_penumpang\n",
        )
        .unwrap();

        let mut form = BatchUploadForm::new();
        form.select(&path).unwrap();
        let check = form.precheck().unwrap();
        assert_eq!(check.errors.len(), 1);
        assert_eq!(check.errors[0].row, 3);

        let backend = InMemoryBackend::new();
        let mut notifier = Notifier::default();
        assert!(form.upload(&backend, &mut notifier));
        let report = form.report().unwrap();
        assert_eq!(report.successes, 0);
        assert_eq!(report.error_lines().len(), 1);
        assert_eq!(
            notifier.last().map(|t| t.message.as_str()),
            Some("Berhasil: 0 kendaraan; 1 kendaraan gagal")
        );
    }

    #[test]
    fn test_update_vehicle() {
        let backend = InMemoryBackend::new();
        let mut notifier = Notifier::default();
        assert!(filled().submit(&backend, &mut notifier));

        let update = VehicleUpdate {
            tipe: Some("Veloz".to_string()),
            ..Default::default()
        };
        assert!(update_vehicle(&backend, " b1234xyz ", &update, &mut notifier));
        assert_eq!(
            backend.find_by_plate("B1234XYZ").map(|v| v.tipe).ok().as_deref(),
            Some("Veloz")
        );

        let bad = VehicleUpdate {
            tahun: Some(3000),
            ..Default::default()
        };
        backend.clear_calls();
        assert!(!update_vehicle(&backend, "B1234XYZ", &bad, &mut notifier));
        assert!(backend.calls().is_empty());

        assert!(!update_vehicle(&backend, "Z9999ZZ", &update, &mut notifier));
        assert_eq!(
            notifier.last().map(|t| t.level),
            Some(crate::notify::ToastLevel::Error)
        );
    }

    #[test]
    fn test_user_form() {
        let backend = InMemoryBackend::new();
        backend.add_user(User {
            id: 2,
            username: "operator1".to_string(),
            fullname: Some("Operator Satu".to_string()),
            email: "op1@dishub.go.id".to_string(),
            is_admin: false,
        });
        let mut notifier = Notifier::default();
        let mut form = UserForm::default();
        assert!(form.validate().is_err());

        assert!(form.load(&backend, 2, &mut notifier));
        assert!(form.validate().is_ok());
        form.password = "baru".to_string();
        form.confirm_password = "lama".to_string();
        assert!(form.validate().is_err());
        assert!(form.errors().has_field("confirm_password"));

        assert!(!form.load(&backend, 99, &mut notifier));
    }
}
