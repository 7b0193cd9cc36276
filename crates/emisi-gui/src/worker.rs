//! Background requests for the GUI
//!
//! Every backend call runs on its own thread and reports back through a
//! single channel that the UI thread drains once per frame. Replies carry the
//! ticket the controllers issued, so responses that arrive out of order are
//! discarded by the controllers themselves.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use eframe::egui;
use emisi_app::forms::UploadRequest;
use emisi_app::list::PageRequest;
use emisi_app::modal::{ClearRequest, OpenTicket, SubmitRequest};
use emisi_domain::repository::{EmisiBackend, ReportRepository, UserRepository};
use emisi_types::{
    BatchUploadReport, NewVehicle, Result, SaveOutcome, Statistics, TestResult, User, Vehicle,
    VehiclePage,
};
use tracing::debug;

/// Backend usable from worker threads
pub trait GuiBackend: EmisiBackend + UserRepository + ReportRepository + Send + Sync {}

impl<T> GuiBackend for T where
    T: EmisiBackend + UserRepository + ReportRepository + Send + Sync + ?Sized
{
}

/// Result of one background request
pub enum Reply {
    /// Tested plates fetched for the refresh that issued the request
    TestedPlates(PageRequest, Result<Vec<String>>),
    Page(PageRequest, Result<VehiclePage>),
    FilterOptions {
        brands: Result<Vec<String>>,
        types: Result<Vec<String>>,
    },
    Opened(OpenTicket, Result<Vehicle>, Result<Option<TestResult>>),
    Saved(SubmitRequest, Result<SaveOutcome>),
    Cleared(ClearRequest, Result<()>),
    Deleted(String, Result<()>),
    Created(Result<()>),
    Uploaded(Result<BatchUploadReport>),
    UserLoaded(Result<User>),
    Statistics(Result<Statistics>),
}

pub struct Worker {
    backend: Arc<dyn GuiBackend>,
    sender: Sender<Reply>,
    ctx: egui::Context,
}

impl Worker {
    pub fn new(backend: Arc<dyn GuiBackend>, sender: Sender<Reply>, ctx: egui::Context) -> Self {
        Self {
            backend,
            sender,
            ctx,
        }
    }

    fn spawn<F>(&self, name: &'static str, job: F)
    where
        F: FnOnce(&dyn GuiBackend) -> Vec<Reply> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let sender = self.sender.clone();
        let ctx = self.ctx.clone();
        debug!("Starting background request: {}", name);
        thread::spawn(move || {
            for reply in job(backend.as_ref()) {
                // The UI has gone away; nothing left to report to
                if sender.send(reply).is_err() {
                    return;
                }
                ctx.request_repaint();
            }
        });
    }

    /// Tested plates first, then the page for `request`
    pub fn refresh(&self, request: PageRequest) {
        self.spawn("refresh", move |backend| {
            let tested = backend.tested_plates();
            let page = backend.find_page(request.offset, request.limit);
            vec![Reply::TestedPlates(request, tested), Reply::Page(request, page)]
        });
    }

    pub fn load_page(&self, request: PageRequest) {
        self.spawn("load page", move |backend| {
            vec![Reply::Page(request, backend.find_page(request.offset, request.limit))]
        });
    }

    pub fn load_filter_options(&self) {
        self.spawn("filter options", |backend| {
            vec![Reply::FilterOptions {
                brands: backend.distinct_brands(),
                types: backend.distinct_types(),
            }]
        });
    }

    /// Vehicle lookup and, when it exists, its stored result
    pub fn open(&self, ticket: OpenTicket) {
        self.spawn("open modal", move |backend| {
            let vehicle = backend.find_by_plate(&ticket.plat);
            let existing = match vehicle {
                Ok(_) => backend.find_result(&ticket.plat),
                Err(_) => Ok(None),
            };
            vec![Reply::Opened(ticket, vehicle, existing)]
        });
    }

    pub fn save_result(&self, request: SubmitRequest) {
        self.spawn("save result", move |backend| {
            let result = backend.save_result(&request.plat, &request.submission);
            vec![Reply::Saved(request, result)]
        });
    }

    pub fn clear_result(&self, request: ClearRequest) {
        self.spawn("clear result", move |backend| {
            let result = backend.delete_result(&request.plat);
            vec![Reply::Cleared(request, result)]
        });
    }

    pub fn delete_vehicle(&self, plat: String) {
        self.spawn("delete vehicle", move |backend| {
            let result = backend.delete(&plat);
            vec![Reply::Deleted(plat, result)]
        });
    }

    pub fn create_vehicle(&self, vehicle: NewVehicle) {
        self.spawn("create vehicle", move |backend| {
            vec![Reply::Created(backend.create(&vehicle))]
        });
    }

    pub fn upload(&self, request: UploadRequest) {
        self.spawn("batch upload", move |backend| {
            vec![Reply::Uploaded(
                backend.batch_upload(&request.file_name, request.content),
            )]
        });
    }

    pub fn find_user(&self, id: i64) {
        self.spawn("find user", move |backend| {
            vec![Reply::UserLoaded(backend.find_user(id))]
        });
    }

    pub fn load_statistics(&self) {
        self.spawn("statistics", |backend| vec![Reply::Statistics(backend.statistics())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{channel, Receiver};
    use std::time::Duration;

    use emisi_app::list::VehicleListController;
    use emisi_app::TestResultModal;
    use emisi_infra::memory::Operation;
    use emisi_infra::InMemoryBackend;
    use emisi_types::{ApiError, FuelType, Jenis, LoadCategory};

    fn vehicle(plat: &str) -> Vehicle {
        Vehicle {
            id: None,
            plat_nomor: plat.to_string(),
            merek: "Isuzu".to_string(),
            tipe: "Elf".to_string(),
            tahun: 2018,
            jenis: Jenis::Umum,
            nama_instansi: "-".to_string(),
            fuel_type: FuelType::Solar,
            load_category: Some(LoadCategory::BelowThreeHalfTon),
        }
    }

    fn worker(backend: Arc<InMemoryBackend>) -> (Worker, Receiver<Reply>) {
        let (tx, rx) = channel();
        (Worker::new(backend, tx, egui::Context::default()), rx)
    }

    fn next(rx: &Receiver<Reply>) -> Reply {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(reply) => reply,
            Err(e) => panic!("no reply from worker: {}", e),
        }
    }

    #[test]
    fn test_refresh_sends_tested_plates_before_page() {
        let backend = Arc::new(InMemoryBackend::with_vehicles(vec![
            vehicle("B1001AA"),
            vehicle("B1002AA"),
        ]));
        let (worker, rx) = worker(Arc::clone(&backend));
        let mut list = VehicleListController::new(10);
        let request = list.begin_load(0).unwrap();

        worker.refresh(request);

        match next(&rx) {
            Reply::TestedPlates(req, Ok(_)) => assert_eq!(req, request),
            _ => panic!("expected a tested-plates reply"),
        }
        match next(&rx) {
            Reply::Page(req, Ok(page)) => {
                assert_eq!(req, request);
                assert_eq!(page.total, 2);
            }
            _ => panic!("expected a page reply"),
        }
        assert_eq!(
            backend.calls(),
            vec![Operation::TestedPlates, Operation::FindPage]
        );
    }

    #[test]
    fn test_open_skips_result_lookup_for_missing_vehicle() {
        let backend = Arc::new(InMemoryBackend::new());
        let (worker, rx) = worker(Arc::clone(&backend));
        let mut modal = TestResultModal::new();

        worker.open(modal.begin_open("B404XX"));

        match next(&rx) {
            Reply::Opened(ticket, vehicle, existing) => {
                assert_eq!(ticket.plat, "B404XX");
                assert!(vehicle.is_err());
                assert!(matches!(existing, Ok(None)));
            }
            _ => panic!("expected an open reply"),
        }
        assert_eq!(backend.calls(), vec![Operation::FindByPlate]);
    }

    #[test]
    fn test_statistics_reply() {
        let backend = Arc::new(InMemoryBackend::with_vehicles(vec![vehicle("B1001AA")]));
        let (worker, rx) = worker(Arc::clone(&backend));

        worker.load_statistics();

        match next(&rx) {
            Reply::Statistics(Ok(stats)) => assert_eq!(stats.total_kendaraan, 1),
            _ => panic!("expected a statistics reply"),
        }
        assert_eq!(backend.calls(), vec![Operation::Statistics]);
    }

    #[test]
    fn test_delete_failure_is_reported() {
        let backend = Arc::new(InMemoryBackend::with_vehicles(vec![vehicle("B1001AA")]));
        backend.fail_next(
            Operation::Delete,
            ApiError::Status {
                status: 500,
                message: "Internal error".to_string(),
            },
        );
        let (worker, rx) = worker(Arc::clone(&backend));

        worker.delete_vehicle("B1001AA".to_string());

        match next(&rx) {
            Reply::Deleted(plat, result) => {
                assert_eq!(plat, "B1001AA");
                assert!(result.is_err());
            }
            _ => panic!("expected a delete reply"),
        }
        assert_eq!(backend.vehicle_count(), 1);
    }
}
