//! Repository trait definitions for the emissions-test backend
//!
//! The backend owns every business rule (uniqueness, pass/fail, upsert); these
//! traits only describe the request/response surface the client relies on.

use emisi_types::{
    BatchUploadReport, NewVehicle, Result, SaveOutcome, Statistics, TestResult, TestSubmission,
    User, Vehicle, VehiclePage, VehicleUpdate,
};

/// Vehicle registry (`/api/kendaraan*`)
pub trait VehicleRepository {
    /// Fetch one page of vehicles
    fn find_page(&self, offset: usize, limit: usize) -> Result<VehiclePage>;

    /// Fetch a single vehicle by plate
    fn find_by_plate(&self, plat: &str) -> Result<Vehicle>;

    /// Register a vehicle; a duplicate plate is reported as `ApiError::Duplicate`
    fn create(&self, vehicle: &NewVehicle) -> Result<()>;

    /// Apply a partial update
    fn update(&self, plat: &str, update: &VehicleUpdate) -> Result<()>;

    /// Delete a vehicle
    fn delete(&self, plat: &str) -> Result<()>;

    /// Distinct brands for filter dropdowns
    fn distinct_brands(&self) -> Result<Vec<String>>;

    /// Distinct types for filter dropdowns
    fn distinct_types(&self) -> Result<Vec<String>>;

    /// Import vehicles from a CSV file
    fn batch_upload(&self, file_name: &str, content: Vec<u8>) -> Result<BatchUploadReport>;
}

/// Test results (`/api/hasil-uji*`)
pub trait TestResultRepository {
    /// Plates that currently have a test result
    fn tested_plates(&self) -> Result<Vec<String>>;

    /// Stored result for a plate; `None` when the vehicle is untested
    fn find_result(&self, plat: &str) -> Result<Option<TestResult>>;

    /// Create or replace the result for a plate
    fn save_result(&self, plat: &str, submission: &TestSubmission) -> Result<SaveOutcome>;

    /// Remove the result for a plate
    fn delete_result(&self, plat: &str) -> Result<()>;
}

/// User administration (`/api/v1/users`)
pub trait UserRepository {
    fn find_user(&self, id: i64) -> Result<User>;
}

/// Read-only reports (`/api/statistics`)
pub trait ReportRepository {
    fn statistics(&self) -> Result<Statistics>;
}

/// Everything the list and modal controllers need
pub trait EmisiBackend: VehicleRepository + TestResultRepository {}

impl<T: VehicleRepository + TestResultRepository> EmisiBackend for T {}
