//! Vehicle list controller
//!
//! Owns the incrementally loaded vehicle pages, the set of tested plates and
//! the active filter. The filtered view is recomputed after every change and
//! handed to a [`ListRenderer`] as a complete snapshot.
//!
//! Loading is split into `begin_load` / `complete_load` so that a UI can run
//! the request elsewhere and apply the response later. Every load started at
//! offset 0 opens a new generation; responses belonging to an older generation
//! are dropped.

use std::collections::HashSet;

use emisi_domain::repository::{EmisiBackend, TestResultRepository, VehicleRepository};
use emisi_domain::service::{filter_vehicles, VehicleFilter};
use emisi_types::{Result, Vehicle, VehiclePage};
use tracing::{debug, warn};

use crate::confirm::Confirmation;
use crate::notify::Notifier;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// An issued page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
    generation: u64,
}

/// What a completed load did to the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Page 0 replaced the list
    Replaced(usize),
    /// A later page added this many new vehicles
    Appended(usize),
    /// Not started: another page is still loading, or nothing left to load
    Skipped,
    /// Response of a superseded request, ignored
    Stale,
    /// Request failed; the list is unchanged
    Failed,
}

/// One rendered card
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleCard {
    pub vehicle: Vehicle,
    pub tested: bool,
}

/// Everything a renderer needs to draw the list
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub cards: Vec<VehicleCard>,
    /// Vehicles loaded so far (before filtering)
    pub loaded: usize,
    pub total: usize,
    /// Show the "load more" affordance
    pub has_more: bool,
    pub loading: bool,
    pub filter_active: bool,
}

impl ListView {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// UI adapter. Each call receives the full view and replaces whatever was
/// drawn before.
pub trait ListRenderer {
    fn render(&mut self, view: &ListView);
}

#[derive(Debug, Clone)]
pub struct VehicleListController {
    page_size: usize,
    offset: usize,
    vehicles: Vec<Vehicle>,
    total: usize,
    tested: HashSet<String>,
    filter: VehicleFilter,
    filtered: Vec<Vehicle>,
    in_flight: Option<PageRequest>,
    generation: u64,
    /// The last page came back empty; the server has nothing more to give
    exhausted: bool,
    brands: Vec<String>,
    types: Vec<String>,
}

impl Default for VehicleListController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl VehicleListController {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            offset: 0,
            vehicles: Vec::new(),
            total: 0,
            tested: HashSet::new(),
            filter: VehicleFilter::default(),
            filtered: Vec::new(),
            in_flight: None,
            generation: 0,
            exhausted: false,
            brands: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Applies from the next page request on
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// Offset of the most recently loaded page
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn filtered(&self) -> &[Vehicle] {
        &self.filtered
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn tested(&self) -> &HashSet<String> {
        &self.tested
    }

    pub fn is_tested(&self, plat: &str) -> bool {
        self.tested.contains(plat)
    }

    pub fn filter(&self) -> &VehicleFilter {
        &self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// More pages can be requested. An empty page ends paging even when the
    /// reported total says otherwise.
    pub fn has_more(&self) -> bool {
        !self.exhausted && self.vehicles.len() < self.total
    }

    pub fn brands(&self) -> &[String] {
        &self.brands
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    // ---- tested plates ----

    /// Apply the tested-plate response. A failure degrades to "nothing tested".
    pub fn apply_tested_plats(&mut self, result: Result<Vec<String>>) {
        self.tested = match result {
            Ok(plates) => plates.into_iter().collect(),
            Err(e) => {
                warn!("Failed to fetch tested plates, showing all as untested: {}", e);
                HashSet::new()
            }
        };
        self.apply_filters_and_render();
    }

    /// Apply the tested plates fetched as part of the refresh that issued
    /// `request`. Returns `false` when a newer refresh has started since.
    pub fn complete_tested(&mut self, request: PageRequest, result: Result<Vec<String>>) -> bool {
        if request.generation != self.generation {
            debug!("Discarding tested plates of a superseded refresh");
            return false;
        }
        self.apply_tested_plats(result);
        true
    }

    pub fn fetch_tested_plats<R>(&mut self, repo: &R)
    where
        R: TestResultRepository + ?Sized,
    {
        self.apply_tested_plats(repo.tested_plates());
    }

    // ---- paging ----

    /// Start loading the page at `offset`.
    ///
    /// Returns `None` for `offset > 0` while another page is loading. Offset 0
    /// always starts, superseding anything in flight.
    pub fn begin_load(&mut self, offset: usize) -> Option<PageRequest> {
        if offset > 0 && self.in_flight.is_some() {
            debug!("Ignoring load at offset {} while a page is loading", offset);
            return None;
        }
        if offset == 0 {
            self.generation += 1;
        }
        let request = PageRequest {
            offset,
            limit: self.page_size,
            generation: self.generation,
        };
        self.in_flight = Some(request);
        Some(request)
    }

    /// Request for the next page, if there is one and nothing is loading
    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if !self.has_more() {
            return None;
        }
        self.begin_load(self.offset + self.page_size)
    }

    /// Apply the response to `request`
    pub fn complete_load(
        &mut self,
        request: PageRequest,
        result: Result<VehiclePage>,
        notifier: &mut Notifier,
    ) -> LoadOutcome {
        if self.in_flight != Some(request) {
            debug!("Discarding stale page response at offset {}", request.offset);
            return LoadOutcome::Stale;
        }
        self.in_flight = None;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                notifier.error(format!("Gagal memuat data kendaraan: {}", e.user_message()));
                return LoadOutcome::Failed;
            }
        };

        let page_len = page.items.len();
        let outcome = if request.offset == 0 {
            self.vehicles.clear();
            let added = self.append_unique(page.items);
            LoadOutcome::Replaced(added)
        } else {
            LoadOutcome::Appended(self.append_unique(page.items))
        };
        self.exhausted = page_len == 0;
        if self.exhausted && self.vehicles.len() < page.total {
            warn!(
                "Empty page at offset {} with {} of {} vehicles loaded",
                request.offset,
                self.vehicles.len(),
                page.total
            );
        }
        self.offset = request.offset;
        self.total = page.total;
        self.apply_filters_and_render();
        outcome
    }

    fn append_unique(&mut self, items: Vec<Vehicle>) -> usize {
        let mut known: HashSet<String> =
            self.vehicles.iter().map(|v| v.plat_nomor.clone()).collect();
        let before = self.vehicles.len();
        for vehicle in items {
            if known.insert(vehicle.plat_nomor.clone()) {
                self.vehicles.push(vehicle);
            }
        }
        self.vehicles.len() - before
    }

    /// Load the page at `offset` through `repo`
    pub fn load_vehicles<R>(&mut self, repo: &R, offset: usize, notifier: &mut Notifier) -> LoadOutcome
    where
        R: VehicleRepository + ?Sized,
    {
        match self.begin_load(offset) {
            Some(request) => {
                let result = repo.find_page(request.offset, request.limit);
                self.complete_load(request, result, notifier)
            }
            None => LoadOutcome::Skipped,
        }
    }

    pub fn load_more<R>(&mut self, repo: &R, notifier: &mut Notifier) -> LoadOutcome
    where
        R: VehicleRepository + ?Sized,
    {
        match self.begin_load_more() {
            Some(request) => {
                let result = repo.find_page(request.offset, request.limit);
                self.complete_load(request, result, notifier)
            }
            None => LoadOutcome::Skipped,
        }
    }

    /// Tested plates first, then page 0 of the vehicles
    pub fn refresh_all<R>(&mut self, repo: &R, notifier: &mut Notifier) -> LoadOutcome
    where
        R: EmisiBackend + ?Sized,
    {
        self.fetch_tested_plats(repo);
        self.load_vehicles(repo, 0, notifier)
    }

    // ---- filtering / rendering ----

    pub fn set_filter(&mut self, filter: VehicleFilter) {
        self.filter = filter;
        self.apply_filters_and_render();
    }

    pub fn clear_filter(&mut self) {
        self.set_filter(VehicleFilter::default());
    }

    /// Recompute the filtered view from the current caches
    pub fn apply_filters_and_render(&mut self) {
        self.filtered = filter_vehicles(&self.vehicles, &self.tested, &self.filter);
    }

    pub fn view(&self) -> ListView {
        ListView {
            cards: self
                .filtered
                .iter()
                .map(|v| VehicleCard {
                    tested: self.tested.contains(&v.plat_nomor),
                    vehicle: v.clone(),
                })
                .collect(),
            loaded: self.vehicles.len(),
            total: self.total,
            has_more: self.has_more(),
            loading: self.is_loading(),
            filter_active: !self.filter.is_empty(),
        }
    }

    pub fn render(&self, renderer: &mut dyn ListRenderer) {
        renderer.render(&self.view());
    }

    // ---- filter dropdowns ----

    pub fn apply_filter_options(&mut self, brands: Result<Vec<String>>, types: Result<Vec<String>>) {
        self.brands = brands.unwrap_or_else(|e| {
            warn!("Failed to fetch brands: {}", e);
            Vec::new()
        });
        self.types = types.unwrap_or_else(|e| {
            warn!("Failed to fetch types: {}", e);
            Vec::new()
        });
    }

    pub fn load_filter_options<R>(&mut self, repo: &R)
    where
        R: VehicleRepository + ?Sized,
    {
        self.apply_filter_options(repo.distinct_brands(), repo.distinct_types());
    }

    // ---- card actions ----

    pub fn request_delete(&self, plat: &str) -> Confirmation {
        Confirmation::DeleteVehicle {
            plat: plat.to_string(),
        }
    }

    /// Report a finished vehicle deletion. Returns `true` when the lists need a refresh.
    pub fn finish_delete(&mut self, plat: &str, result: Result<()>, notifier: &mut Notifier) -> bool {
        match result {
            Ok(()) => {
                notifier.success("Kendaraan dihapus");
                true
            }
            Err(e) => {
                notifier.error(format!("Gagal menghapus kendaraan {}: {}", plat, e.user_message()));
                false
            }
        }
    }

    /// Delete a confirmed vehicle and refresh both caches
    pub fn delete_vehicle<R>(&mut self, repo: &R, confirmation: &Confirmation, notifier: &mut Notifier) -> bool
    where
        R: EmisiBackend + ?Sized,
    {
        let Confirmation::DeleteVehicle { plat } = confirmation else {
            return false;
        };
        let result = repo.delete(plat);
        let deleted = self.finish_delete(plat, result, notifier);
        if deleted {
            self.refresh_all(repo, notifier);
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emisi_domain::service::TestedFilter;
    use emisi_types::{ApiError, FuelType, Jenis, LoadCategory};

    fn vehicle(plat: &str) -> Vehicle {
        Vehicle {
            id: None,
            plat_nomor: plat.to_string(),
            merek: "Toyota".to_string(),
            tipe: "Avanza".to_string(),
            tahun: 2020,
            jenis: Jenis::Umum,
            nama_instansi: "-".to_string(),
            fuel_type: FuelType::Bensin,
            load_category: Some(LoadCategory::KendaraanPenumpang),
        }
    }

    fn page(range: std::ops::Range<usize>, total: usize) -> Result<VehiclePage> {
        Ok(VehiclePage {
            items: range.map(|i| vehicle(&format!("B{:04}XX", i))).collect(),
            total,
        })
    }

    #[test]
    fn test_first_page_then_append() {
        let mut list = VehicleListController::default();
        let mut notifier = Notifier::default();

        let req = list.begin_load(0).unwrap();
        assert_eq!(list.complete_load(req, page(0..10, 35), &mut notifier), LoadOutcome::Replaced(10));
        assert!(list.has_more());

        let req = list.begin_load_more().unwrap();
        assert_eq!(req.offset, 10);
        assert_eq!(list.complete_load(req, page(10..20, 35), &mut notifier), LoadOutcome::Appended(10));
        assert_eq!(list.vehicles().len(), 20);
        assert_eq!(list.vehicles()[0].plat_nomor, "B0000XX");
        assert_eq!(list.offset(), 10);
    }

    #[test]
    fn test_second_load_more_is_noop_while_pending() {
        let mut list = VehicleListController::default();
        let mut notifier = Notifier::default();
        let req = list.begin_load(0).unwrap();
        list.complete_load(req, page(0..10, 35), &mut notifier);

        let first = list.begin_load_more();
        assert!(first.is_some());
        assert!(list.begin_load_more().is_none());
        assert!(list.begin_load(20).is_none());
        assert!(list.is_loading());
    }

    #[test]
    fn test_reload_supersedes_pending_append() {
        let mut list = VehicleListController::default();
        let mut notifier = Notifier::default();
        let req = list.begin_load(0).unwrap();
        list.complete_load(req, page(0..10, 35), &mut notifier);

        let more = list.begin_load_more().unwrap();
        let reload = list.begin_load(0).unwrap();
        assert_eq!(list.complete_load(more, page(10..20, 35), &mut notifier), LoadOutcome::Stale);
        assert_eq!(list.complete_load(reload, page(0..10, 30), &mut notifier), LoadOutcome::Replaced(10));
        assert_eq!(list.vehicles().len(), 10);
        assert_eq!(list.total(), 30);
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let mut list = VehicleListController::default();
        let mut notifier = Notifier::default();
        let req = list.begin_load(0).unwrap();
        list.complete_load(req, page(0..10, 35), &mut notifier);

        let req = list.begin_load_more().unwrap();
        let outcome = list.complete_load(
            req,
            Err(ApiError::Transport("connection refused".to_string()).into()),
            &mut notifier,
        );
        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(list.vehicles().len(), 10);
        assert_eq!(list.offset(), 0);
        assert!(!list.is_loading());
        assert_eq!(
            notifier.last().map(|t| t.message.as_str()),
            Some("Gagal memuat data kendaraan: connection refused")
        );
        // retry is possible
        assert_eq!(list.begin_load_more().map(|r| r.offset), Some(10));
    }

    #[test]
    fn test_append_skips_known_plates() {
        let mut list = VehicleListController::new(5);
        let mut notifier = Notifier::default();
        let req = list.begin_load(0).unwrap();
        list.complete_load(req, page(0..5, 12), &mut notifier);
        let req = list.begin_load_more().unwrap();
        assert_eq!(list.complete_load(req, page(3..8, 12), &mut notifier), LoadOutcome::Appended(3));
        assert_eq!(list.vehicles().len(), 8);
    }

    #[test]
    fn test_tested_failure_degrades_to_empty() {
        let mut list = VehicleListController::default();
        list.apply_tested_plats(Ok(vec!["B0001XX".to_string()]));
        assert!(list.is_tested("B0001XX"));
        list.apply_tested_plats(Err(ApiError::Status {
            status: 500,
            message: "Database error occurred".to_string(),
        }
        .into()));
        assert!(list.tested().is_empty());
    }

    #[test]
    fn test_view_reflects_filter_and_badges() {
        let mut list = VehicleListController::default();
        let mut notifier = Notifier::default();
        list.apply_tested_plats(Ok(vec!["B0001XX".to_string()]));
        let req = list.begin_load(0).unwrap();
        list.complete_load(req, page(0..3, 3), &mut notifier);

        list.set_filter(VehicleFilter {
            tested: TestedFilter::Tested,
            ..Default::default()
        });
        let view = list.view();
        assert_eq!(view.cards.len(), 1);
        assert!(view.cards[0].tested);
        assert!(view.filter_active);
        assert!(!view.has_more);

        list.apply_filters_and_render();
        assert_eq!(list.view(), view);

        list.clear_filter();
        assert_eq!(list.view().cards.len(), 3);
    }

    #[test]
    fn test_nothing_more_to_load() {
        let mut list = VehicleListController::default();
        let mut notifier = Notifier::default();
        let req = list.begin_load(0).unwrap();
        list.complete_load(req, page(0..4, 4), &mut notifier);
        assert!(list.begin_load_more().is_none());
    }

    #[test]
    fn test_empty_page_ends_paging() {
        let mut list = VehicleListController::new(2);
        let mut notifier = Notifier::default();
        let req = list.begin_load(0).unwrap();
        list.complete_load(req, page(0..2, 3), &mut notifier);

        // rows shifted server-side: the next page only repeats a known plate
        let req = list.begin_load_more().unwrap();
        assert_eq!(list.complete_load(req, page(1..2, 3), &mut notifier), LoadOutcome::Appended(0));
        assert!(list.has_more());

        let req = list.begin_load_more().unwrap();
        assert_eq!(req.offset, 4);
        assert_eq!(list.complete_load(req, page(0..0, 3), &mut notifier), LoadOutcome::Appended(0));
        assert!(!list.has_more());
        assert!(!list.view().has_more);
        assert!(list.begin_load_more().is_none());
        assert_eq!(list.vehicles().len(), 2);

        // a fresh load starts paging again
        let req = list.begin_load(0).unwrap();
        list.complete_load(req, page(0..2, 3), &mut notifier);
        assert!(list.has_more());
    }

    #[test]
    fn test_stale_tested_plates_are_discarded() {
        let mut list = VehicleListController::default();
        let mut notifier = Notifier::default();
        let older = list.begin_load(0).unwrap();
        let newer = list.begin_load(0).unwrap();

        assert!(list.complete_tested(newer, Ok(Vec::new())));
        list.complete_load(newer, page(0..1, 1), &mut notifier);
        assert!(!list.complete_tested(older, Ok(vec!["B0000XX".to_string()])));
        assert_eq!(list.complete_load(older, page(0..1, 1), &mut notifier), LoadOutcome::Stale);

        assert!(!list.is_tested("B0000XX"));
        assert!(!list.view().cards[0].tested);
    }

    #[test]
    fn test_page_size_change_applies_to_next_request() {
        let mut list = VehicleListController::new(10);
        list.set_page_size(25);
        assert_eq!(list.begin_load(0).map(|r| r.limit), Some(25));
        list.set_page_size(0);
        assert_eq!(list.page_size(), 1);
    }

    #[test]
    fn test_filter_option_failures_are_empty() {
        let mut list = VehicleListController::default();
        list.apply_filter_options(
            Ok(vec!["Honda".to_string(), "Toyota".to_string()]),
            Err(ApiError::Transport("timeout".to_string()).into()),
        );
        assert_eq!(list.brands().len(), 2);
        assert!(list.types().is_empty());
    }
}
