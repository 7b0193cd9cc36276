//! In-memory backend
//!
//! Emulates the REST backend's bookkeeping (unique plates, one result per
//! plate, the tested set, all-or-nothing batch import) for controller tests
//! and offline demos. Verdicts are placeholders: `valid` and `lulus` are
//! always `true` because the pass/fail thresholds live on the server.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use emisi_domain::repository::{
    ReportRepository, TestResultRepository, UserRepository, VehicleRepository,
};
use emisi_types::{
    ApiError, BatchUploadReport, FuelType, MonthlyResults, NewVehicle, RecentTest, Result,
    SaveOutcome, Statistics, TestResult, TestSubmission, User, Vehicle, VehiclePage,
    VehicleUpdate,
};

use crate::vehicle_csv;

/// Repository call, recorded in order and used as a failure-injection key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindPage,
    FindByPlate,
    Create,
    Update,
    Delete,
    DistinctBrands,
    DistinctTypes,
    BatchUpload,
    TestedPlates,
    FindResult,
    SaveResult,
    DeleteResult,
    FindUser,
    Statistics,
}

#[derive(Default)]
struct State {
    vehicles: Vec<Vehicle>,
    results: HashMap<String, TestResult>,
    users: BTreeMap<i64, User>,
    next_id: i64,
    calls: Vec<Operation>,
    failures: HashMap<Operation, Vec<ApiError>>,
    submissions: Vec<(String, TestSubmission)>,
}

/// Backend held entirely in process memory
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with `vehicles`
    pub fn with_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        let backend = Self::new();
        {
            let mut state = backend.lock();
            for mut vehicle in vehicles {
                state.next_id += 1;
                vehicle.id = Some(state.next_id);
                state.vehicles.push(vehicle);
            }
        }
        backend
    }

    pub fn add_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    /// Store a result directly, bypassing the save rules
    pub fn put_result(&self, plat: &str, result: TestResult) {
        self.lock().results.insert(plat.to_string(), result);
    }

    /// Make the next call of `op` fail with `error`. Queued errors are used in order.
    pub fn fail_next(&self, op: Operation, error: ApiError) {
        self.lock().failures.entry(op).or_default().push(error);
    }

    /// Every repository call made so far, oldest first
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Bodies received by `save_result`, oldest first
    pub fn saved_submissions(&self) -> Vec<(String, TestSubmission)> {
        self.lock().submissions.clone()
    }

    pub fn vehicle_count(&self) -> usize {
        self.lock().vehicles.len()
    }

    pub fn has_result(&self, plat: &str) -> bool {
        self.lock().results.contains_key(plat)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and pop an injected failure, if any
    fn enter(&self, op: Operation) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(op);
        if let Some(queue) = state.failures.get_mut(&op) {
            if !queue.is_empty() {
                let error = queue.remove(0);
                return Err(error.into());
            }
        }
        Ok(state)
    }
}

impl State {
    fn position(&self, plat: &str) -> Option<usize> {
        self.vehicles.iter().position(|v| v.plat_nomor == plat)
    }

    fn insert(&mut self, vehicle: &NewVehicle) -> std::result::Result<(), ApiError> {
        if self.position(&vehicle.plat_nomor).is_some() {
            return Err(ApiError::Duplicate("Plat nomor sudah terdaftar".to_string()));
        }
        self.next_id += 1;
        let mut stored = Vehicle::from(vehicle.clone());
        stored.id = Some(self.next_id);
        self.vehicles.push(stored);
        Ok(())
    }

    fn distinct(&self, key: impl Fn(&Vehicle) -> &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .vehicles
            .iter()
            .map(|v| key(v).to_string())
            .filter(|v| !v.is_empty())
            .collect();
        values.sort();
        values.dedup();
        values
    }
}

fn vehicle_not_found() -> ApiError {
    ApiError::NotFound("Vehicle not found".to_string())
}

impl VehicleRepository for InMemoryBackend {
    fn find_page(&self, offset: usize, limit: usize) -> Result<VehiclePage> {
        let state = self.enter(Operation::FindPage)?;
        let items = state.vehicles.iter().skip(offset).take(limit).cloned().collect();
        Ok(VehiclePage {
            items,
            total: state.vehicles.len(),
        })
    }

    fn find_by_plate(&self, plat: &str) -> Result<Vehicle> {
        let state = self.enter(Operation::FindByPlate)?;
        state
            .position(plat)
            .map(|i| state.vehicles[i].clone())
            .ok_or_else(|| vehicle_not_found().into())
    }

    fn create(&self, vehicle: &NewVehicle) -> Result<()> {
        let mut state = self.enter(Operation::Create)?;
        state.insert(vehicle)?;
        Ok(())
    }

    fn update(&self, plat: &str, update: &VehicleUpdate) -> Result<()> {
        let mut state = self.enter(Operation::Update)?;
        let index = state.position(plat).ok_or_else(vehicle_not_found)?;
        let vehicle = &mut state.vehicles[index];
        if let Some(merek) = &update.merek {
            vehicle.merek = merek.clone();
        }
        if let Some(tipe) = &update.tipe {
            vehicle.tipe = tipe.clone();
        }
        if let Some(tahun) = update.tahun {
            vehicle.tahun = tahun;
        }
        if let Some(jenis) = update.jenis {
            vehicle.jenis = jenis;
        }
        if let Some(instansi) = &update.nama_instansi {
            vehicle.nama_instansi = instansi.clone();
        }
        if let Some(fuel) = update.fuel_type {
            vehicle.fuel_type = fuel;
        }
        if let Some(category) = update.load_category {
            vehicle.load_category = Some(category);
        }
        Ok(())
    }

    fn delete(&self, plat: &str) -> Result<()> {
        let mut state = self.enter(Operation::Delete)?;
        let index = state.position(plat).ok_or_else(vehicle_not_found)?;
        state.vehicles.remove(index);
        state.results.remove(plat);
        Ok(())
    }

    fn distinct_brands(&self) -> Result<Vec<String>> {
        let state = self.enter(Operation::DistinctBrands)?;
        Ok(state.distinct(|v| v.merek.as_str()))
    }

    fn distinct_types(&self) -> Result<Vec<String>> {
        let state = self.enter(Operation::DistinctTypes)?;
        Ok(state.distinct(|v| v.tipe.as_str()))
    }

    fn batch_upload(&self, _file_name: &str, content: Vec<u8>) -> Result<BatchUploadReport> {
        let mut state = self.enter(Operation::BatchUpload)?;
        let check = vehicle_csv::check_rows(&content)?;
        let total_rows = check.vehicles.len() + check.errors.len();
        let mut errors = check.errors;

        let snapshot = (state.vehicles.clone(), state.next_id);
        let mut successes = 0;
        for (row, vehicle) in check.vehicles {
            match state.insert(&vehicle) {
                Ok(()) => successes += 1,
                Err(e) => errors.push(emisi_types::BatchRowError {
                    row,
                    error: e.message().to_string(),
                }),
            }
        }

        if !errors.is_empty() {
            // Import is all-or-nothing
            state.vehicles = snapshot.0;
            state.next_id = snapshot.1;
            successes = 0;
            errors.sort_by_key(|e| e.row);
        }

        Ok(BatchUploadReport {
            successes,
            errors,
            total_rows: Some(total_rows),
        })
    }
}

impl TestResultRepository for InMemoryBackend {
    fn tested_plates(&self) -> Result<Vec<String>> {
        let state = self.enter(Operation::TestedPlates)?;
        let mut plates: Vec<String> = state.results.keys().cloned().collect();
        plates.sort();
        Ok(plates)
    }

    fn find_result(&self, plat: &str) -> Result<Option<TestResult>> {
        let state = self.enter(Operation::FindResult)?;
        if state.position(plat).is_none() {
            return Err(vehicle_not_found().into());
        }
        Ok(state.results.get(plat).cloned())
    }

    fn save_result(&self, plat: &str, submission: &TestSubmission) -> Result<SaveOutcome> {
        let mut state = self.enter(Operation::SaveResult)?;
        if state.position(plat).is_none() {
            return Err(ApiError::NotFound("Kendaraan tidak ditemukan".to_string()).into());
        }
        let operator = submission
            .user_id
            .and_then(|id| state.users.get(&id))
            .map(|u| u.username.clone());
        let readings = submission.readings;
        state.results.insert(
            plat.to_string(),
            TestResult {
                co: readings.co,
                co2: readings.co2,
                hc: readings.hc,
                o2: readings.o2,
                lambda_val: readings.lambda_val,
                opacity: readings.opacity,
                valid: true,
                lulus: true,
                operator: operator.clone(),
                user_id: submission.user_id,
                tanggal: None,
            },
        );
        state.submissions.push((plat.to_string(), *submission));
        Ok(SaveOutcome {
            success: true,
            lulus: true,
            valid: Some(true),
            operator,
            limits: BTreeMap::new(),
        })
    }

    fn delete_result(&self, plat: &str) -> Result<()> {
        let mut state = self.enter(Operation::DeleteResult)?;
        match state.results.remove(plat) {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound("No test data to clear".to_string()).into()),
        }
    }
}

impl UserRepository for InMemoryBackend {
    fn find_user(&self, id: i64) -> Result<User> {
        let state = self.enter(Operation::FindUser)?;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)).into())
    }
}

/// Number of entries in `Statistics::recent_tests`
const RECENT_TESTS: usize = 10;

impl ReportRepository for InMemoryBackend {
    fn statistics(&self) -> Result<Statistics> {
        let state = self.enter(Operation::Statistics)?;
        let results: Vec<(&Vehicle, &TestResult)> = state
            .vehicles
            .iter()
            .filter_map(|v| state.results.get(&v.plat_nomor).map(|r| (v, r)))
            .collect();

        let total_tests = results.iter().filter(|(_, r)| r.valid).count();
        let passing_tests = results.iter().filter(|(_, r)| r.lulus).count();
        let failing_tests = results.iter().filter(|(_, r)| r.valid && !r.lulus).count();

        let mut vehicle_types: BTreeMap<String, usize> = FuelType::all()
            .iter()
            .map(|f| (f.as_str().to_string(), 0))
            .collect();
        for vehicle in &state.vehicles {
            *vehicle_types.entry(vehicle.fuel_type.as_str().to_string()).or_default() += 1;
        }

        // Keyed by `YYYY-MM` so months sort chronologically
        let mut months: BTreeMap<String, MonthlyResults> = BTreeMap::new();
        for (_, result) in results.iter().filter(|(_, r)| r.valid) {
            let Some(tanggal) = result.tanggal else { continue };
            let entry = months
                .entry(tanggal.format("%Y-%m").to_string())
                .or_insert_with(|| MonthlyResults {
                    month: tanggal.format("%b %Y").to_string(),
                    passing: 0,
                    failing: 0,
                    total: 0,
                });
            if result.lulus {
                entry.passing += 1;
            } else {
                entry.failing += 1;
            }
            entry.total += 1;
        }

        let mut recent = results.clone();
        recent.sort_by(|a, b| b.1.tanggal.cmp(&a.1.tanggal));
        let recent_tests = recent
            .into_iter()
            .take(RECENT_TESTS)
            .map(|(vehicle, result)| RecentTest {
                id: vehicle.id,
                plat_nomor: vehicle.plat_nomor.clone(),
                merek: vehicle.merek.clone(),
                tipe: vehicle.tipe.clone(),
                tanggal: result.tanggal.map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
                lulus: result.lulus,
                fuel_type: vehicle.fuel_type,
            })
            .collect();

        Ok(Statistics {
            total_kendaraan: state.vehicles.len(),
            total_tests,
            passing_tests,
            failing_tests,
            pass_rate: Statistics::rate(passing_tests, total_tests),
            vehicle_types,
            monthly_results: months.into_values().collect(),
            recent_tests,
        })
    }
}
