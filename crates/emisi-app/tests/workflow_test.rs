//! End-to-end list and modal workflows against the in-memory backend

use emisi_app::list::LoadOutcome;
use emisi_app::modal::ModalEffect;
use emisi_app::{ListRenderer, ListView, Notifier, TestResultModal, VehicleListController};
use emisi_domain::service::{TestedFilter, VehicleFilter};
use emisi_infra::memory::Operation;
use emisi_infra::InMemoryBackend;
use emisi_types::{ApiError, FuelType, Jenis, LoadCategory, TestField, Vehicle};

fn vehicle(plat: &str, fuel: FuelType) -> Vehicle {
    Vehicle {
        id: None,
        plat_nomor: plat.to_string(),
        merek: "Mitsubishi".to_string(),
        tipe: "Colt Diesel".to_string(),
        tahun: 2017,
        jenis: Jenis::Dinas,
        nama_instansi: "Dinas Lingkungan Hidup".to_string(),
        fuel_type: fuel,
        load_category: Some(match fuel {
            FuelType::Solar => LoadCategory::BelowThreeHalfTon,
            FuelType::Bensin => LoadCategory::KendaraanPenumpang,
        }),
    }
}

fn fleet(n: usize) -> Vec<Vehicle> {
    (0..n)
        .map(|i| vehicle(&format!("B{:04}ZZ", i), FuelType::Bensin))
        .collect()
}

#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<ListView>,
}

impl ListRenderer for RecordingRenderer {
    fn render(&mut self, view: &ListView) {
        self.frames.push(view.clone());
    }
}

#[test]
fn test_load_more_appends_second_page() {
    let backend = InMemoryBackend::with_vehicles(fleet(35));
    let mut list = VehicleListController::default();
    let mut notifier = Notifier::default();

    assert_eq!(list.refresh_all(&backend, &mut notifier), LoadOutcome::Replaced(10));
    let mut renderer = RecordingRenderer::default();
    list.render(&mut renderer);
    assert!(renderer.frames[0].has_more);
    assert_eq!(renderer.frames[0].total, 35);

    assert_eq!(list.load_more(&backend, &mut notifier), LoadOutcome::Appended(10));
    assert_eq!(list.vehicles().len(), 20);
    assert_eq!(list.vehicles()[0].plat_nomor, "B0000ZZ");
    assert_eq!(list.vehicles()[10].plat_nomor, "B0010ZZ");

    list.load_more(&backend, &mut notifier);
    list.load_more(&backend, &mut notifier);
    assert_eq!(list.vehicles().len(), 35);
    assert!(!list.has_more());
    assert_eq!(list.load_more(&backend, &mut notifier), LoadOutcome::Skipped);
}

#[test]
fn test_solar_submission_body_and_refresh_order() {
    let backend = InMemoryBackend::with_vehicles(vec![
        vehicle("B1234XYZ", FuelType::Solar),
        vehicle("D5678AB", FuelType::Bensin),
    ]);
    let mut list = VehicleListController::default();
    let mut modal = TestResultModal::new();
    let mut notifier = Notifier::default();
    list.refresh_all(&backend, &mut notifier);
    assert!(!list.is_tested("B1234XYZ"));

    assert!(modal.show(&backend, "B1234XYZ", &mut notifier));
    modal.set_input(TestField::Opacity, "45.2");
    backend.clear_calls();

    let effect = modal.submit(&backend, &mut list, Some(1), &mut notifier);
    assert_eq!(effect, ModalEffect::RefreshLists);
    assert!(!modal.is_open());

    let saved = backend.saved_submissions();
    assert_eq!(saved.len(), 1);
    let body = serde_json::to_value(saved[0].1.readings).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "co": 0.0, "co2": 0.0, "hc": 0.0, "o2": 0.0,
            "lambda_val": 0.0, "opacity": 45.2
        })
    );

    assert_eq!(
        backend.calls(),
        vec![Operation::SaveResult, Operation::TestedPlates, Operation::FindPage]
    );
    assert!(list.is_tested("B1234XYZ"));
}

#[test]
fn test_bensin_missing_hc_sends_nothing() {
    let backend = InMemoryBackend::with_vehicles(vec![vehicle("D5678AB", FuelType::Bensin)]);
    let mut list = VehicleListController::default();
    let mut modal = TestResultModal::new();
    let mut notifier = Notifier::default();

    assert!(modal.show(&backend, "D5678AB", &mut notifier));
    for (field, value) in [
        (TestField::Co, "0.5"),
        (TestField::Co2, "14.1"),
        (TestField::O2, "0.9"),
        (TestField::LambdaVal, "1.02"),
    ] {
        modal.set_input(field, value);
    }
    backend.clear_calls();

    let effect = modal.submit(&backend, &mut list, None, &mut notifier);
    assert_eq!(effect, ModalEffect::None);
    assert!(backend.calls().is_empty());
    assert!(modal.is_open());
    assert!(modal.is_highlighted(TestField::Hc));
    assert_eq!(
        notifier.last().map(|t| t.message.as_str()),
        Some("Field wajib diisi: hc")
    );
}

#[test]
fn test_clear_reverts_to_untested() {
    let backend = InMemoryBackend::with_vehicles(vec![vehicle("B1234XYZ", FuelType::Solar)]);
    let mut list = VehicleListController::default();
    let mut modal = TestResultModal::new();
    let mut notifier = Notifier::default();

    modal.show(&backend, "B1234XYZ", &mut notifier);
    modal.set_input(TestField::Opacity, "20");
    let _ = modal.submit(&backend, &mut list, None, &mut notifier);
    assert!(list.is_tested("B1234XYZ"));

    assert!(modal.show(&backend, "B1234XYZ", &mut notifier));
    assert_eq!(modal.input(TestField::Opacity), "20");
    modal.request_clear();
    backend.clear_calls();
    assert_eq!(modal.clear(&backend, &mut list, &mut notifier), ModalEffect::RefreshLists);
    assert_eq!(
        backend.calls(),
        vec![Operation::DeleteResult, Operation::TestedPlates, Operation::FindPage]
    );
    assert!(!list.is_tested("B1234XYZ"));

    list.set_filter(VehicleFilter {
        tested: TestedFilter::Untested,
        ..Default::default()
    });
    assert_eq!(list.filtered().len(), 1);
}

#[test]
fn test_delete_vehicle_refreshes_both_caches() {
    let backend = InMemoryBackend::with_vehicles(fleet(3));
    let mut list = VehicleListController::default();
    let mut notifier = Notifier::default();
    list.refresh_all(&backend, &mut notifier);

    let confirmation = list.request_delete("B0001ZZ");
    assert_eq!(confirmation.prompt(), "Hapus kendaraan B0001ZZ?");
    backend.clear_calls();
    assert!(list.delete_vehicle(&backend, &confirmation, &mut notifier));
    assert_eq!(
        backend.calls(),
        vec![Operation::Delete, Operation::TestedPlates, Operation::FindPage]
    );
    assert_eq!(list.vehicles().len(), 2);
    assert_eq!(list.total(), 2);
}

#[test]
fn test_failures_leave_ui_usable() {
    let backend = InMemoryBackend::with_vehicles(fleet(12));
    let mut list = VehicleListController::default();
    let mut modal = TestResultModal::new();
    let mut notifier = Notifier::default();

    backend.fail_next(Operation::TestedPlates, ApiError::Transport("offline".to_string()));
    assert_eq!(list.refresh_all(&backend, &mut notifier), LoadOutcome::Replaced(10));
    assert!(list.tested().is_empty());

    backend.fail_next(Operation::FindPage, ApiError::Transport("offline".to_string()));
    assert_eq!(list.load_more(&backend, &mut notifier), LoadOutcome::Failed);
    assert_eq!(list.vehicles().len(), 10);
    assert_eq!(list.load_more(&backend, &mut notifier), LoadOutcome::Appended(2));

    backend.fail_next(Operation::FindByPlate, ApiError::Transport("offline".to_string()));
    assert!(!modal.show(&backend, "B0000ZZ", &mut notifier));
    assert!(!modal.is_open());
    assert!(modal.show(&backend, "B0000ZZ", &mut notifier));
}
