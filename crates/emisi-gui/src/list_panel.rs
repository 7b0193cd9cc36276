//! Vehicle list panel: filters, cards and paging

use std::fs::File;

use eframe::egui::{self, Color32, RichText, Ui};
use emisi_app::list::VehicleListController;
use emisi_app::{Confirmation, ListView, Notifier, TestResultModal};
use emisi_domain::service::{TestedFilter, VehicleFilter};
use emisi_infra::vehicle_csv;
use emisi_types::{Jenis, Vehicle};

use crate::worker::Worker;

const ANY: &str = "Semua";

pub struct ListPanel {
    /// Filter being edited; pushed to the controller on change
    filter: VehicleFilter,
    pending_delete: Option<Confirmation>,
}

impl ListPanel {
    pub fn new() -> Self {
        Self {
            filter: VehicleFilter::default(),
            pending_delete: None,
        }
    }

    pub fn ui(
        &mut self,
        ui: &mut Ui,
        list: &mut VehicleListController,
        modal: &mut TestResultModal,
        worker: Option<&Worker>,
        notifier: &mut Notifier,
    ) {
        ui.heading("Daftar Kendaraan");
        ui.add_space(10.0);

        self.render_filter_bar(ui, list, worker, notifier);

        ui.add_space(8.0);
        ui.separator();
        ui.add_space(8.0);

        let view = list.view();
        self.render_footer(ui, &view, list, worker);
        ui.add_space(6.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if view.is_empty() {
                    let text = if view.loading {
                        "Memuat data kendaraan..."
                    } else if view.filter_active {
                        "Tidak ada kendaraan yang cocok dengan filter."
                    } else {
                        "Belum ada kendaraan terdaftar."
                    };
                    ui.label(RichText::new(text).color(Color32::GRAY));
                }
                for card in &view.cards {
                    self.render_card(ui, &card.vehicle, card.tested, list, modal, worker);
                    ui.add_space(4.0);
                }
            });

        self.render_delete_dialog(ui, worker);
    }

    fn render_filter_bar(
        &mut self,
        ui: &mut Ui,
        list: &mut VehicleListController,
        worker: Option<&Worker>,
        notifier: &mut Notifier,
    ) {
        let mut changed = false;

        ui.horizontal_wrapped(|ui| {
            ui.label("Plat:");
            changed |= ui
                .add(
                    egui::TextEdit::singleline(&mut self.filter.plat)
                        .hint_text("cari plat")
                        .desired_width(120.0),
                )
                .changed();

            ui.label("Merek:");
            changed |= option_combo(ui, "filter_merek", &mut self.filter.merek, list.brands());

            ui.label("Tipe:");
            changed |= option_combo(ui, "filter_tipe", &mut self.filter.tipe, list.types());

            ui.label("Jenis:");
            egui::ComboBox::from_id_salt("filter_jenis")
                .selected_text(self.filter.jenis.map(|j| j.label()).unwrap_or(ANY))
                .show_ui(ui, |ui| {
                    changed |= ui
                        .selectable_value(&mut self.filter.jenis, None, ANY)
                        .changed();
                    for jenis in Jenis::all() {
                        changed |= ui
                            .selectable_value(&mut self.filter.jenis, Some(jenis), jenis.label())
                            .changed();
                    }
                });

            ui.label("Status:");
            egui::ComboBox::from_id_salt("filter_status")
                .selected_text(self.filter.tested.label())
                .show_ui(ui, |ui| {
                    for status in TestedFilter::all() {
                        changed |= ui
                            .selectable_value(&mut self.filter.tested, status, status.label())
                            .changed();
                    }
                });

            if ui.button("Reset").clicked() {
                self.filter = VehicleFilter::default();
                list.clear_filter();
            }
        });

        if changed {
            list.set_filter(self.filter.clone());
        }

        ui.horizontal(|ui| {
            let enabled = worker.is_some() && !list.is_loading();
            if ui
                .add_enabled(enabled, egui::Button::new("Muat ulang"))
                .clicked()
            {
                if let Some(worker) = worker {
                    refresh(list, worker);
                    worker.load_filter_options();
                }
            }

            if ui
                .add_enabled(!list.vehicles().is_empty(), egui::Button::new("Ekspor CSV..."))
                .clicked()
            {
                export_loaded(list, notifier);
            }
        });
    }

    fn render_footer(
        &self,
        ui: &mut Ui,
        view: &ListView,
        list: &mut VehicleListController,
        worker: Option<&Worker>,
    ) {
        ui.horizontal(|ui| {
            let shown = if view.filter_active {
                format!("{} cocok, ", view.cards.len())
            } else {
                String::new()
            };
            ui.label(format!("{}{} dari {} dimuat", shown, view.loaded, view.total));

            if view.loading {
                ui.spinner();
            }

            if view.has_more
                && ui
                    .add_enabled(!view.loading, egui::Button::new("Muat lebih banyak"))
                    .clicked()
            {
                if let (Some(worker), Some(request)) = (worker, list.begin_load_more()) {
                    worker.load_page(request);
                }
            }
        });
    }

    fn render_card(
        &mut self,
        ui: &mut Ui,
        vehicle: &Vehicle,
        tested: bool,
        list: &VehicleListController,
        modal: &mut TestResultModal,
        worker: Option<&Worker>,
    ) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(RichText::new(&vehicle.plat_nomor).strong().size(16.0));
                let (badge, color) = if tested {
                    ("Sudah diuji", Color32::LIGHT_GREEN)
                } else {
                    ("Belum diuji", Color32::GRAY)
                };
                ui.label(RichText::new(badge).color(color));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Hapus").clicked() {
                        self.pending_delete = Some(list.request_delete(&vehicle.plat_nomor));
                    }
                    if ui
                        .add_enabled(worker.is_some(), egui::Button::new("Data uji"))
                        .clicked()
                    {
                        if let Some(worker) = worker {
                            worker.open(modal.begin_open(&vehicle.plat_nomor));
                        }
                    }
                });
            });
            ui.label(format!(
                "{} {} ({}) - {}, {}",
                vehicle.merek,
                vehicle.tipe,
                vehicle.tahun,
                vehicle.jenis.label(),
                vehicle.fuel_type.label()
            ));
            if vehicle.is_dinas() {
                ui.label(RichText::new(vehicle.instansi()).color(Color32::LIGHT_BLUE));
            }
        });
    }

    fn render_delete_dialog(&mut self, ui: &mut Ui, worker: Option<&Worker>) {
        let Some(confirmation) = self.pending_delete.clone() else {
            return;
        };

        egui::Window::new("Konfirmasi")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ui.ctx(), |ui| {
                ui.label(confirmation.prompt());
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui
                        .button(RichText::new("Hapus").color(Color32::LIGHT_RED))
                        .clicked()
                    {
                        if let Some(worker) = worker {
                            worker.delete_vehicle(confirmation.plat().to_string());
                        }
                        self.pending_delete = None;
                    }
                    if ui.button("Batal").clicked() {
                        self.pending_delete = None;
                    }
                });
            });
    }
}

/// Start a page-0 load together with the tested plates
pub fn refresh(list: &mut VehicleListController, worker: &Worker) {
    if let Some(request) = list.begin_load(0) {
        worker.refresh(request);
    }
}

/// Dropdown over backend-supplied values with a leading "any" entry
fn option_combo(ui: &mut Ui, id: &str, value: &mut Option<String>, options: &[String]) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_salt(id)
        .selected_text(value.as_deref().unwrap_or(ANY))
        .show_ui(ui, |ui| {
            changed |= ui.selectable_value(value, None, ANY).changed();
            for option in options {
                changed |= ui
                    .selectable_value(value, Some(option.clone()), option.as_str())
                    .changed();
            }
        });
    changed
}

fn export_loaded(list: &VehicleListController, notifier: &mut Notifier) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name("kendaraan.csv")
        .save_file()
    else {
        return;
    };

    let written = File::create(&path)
        .map_err(emisi_types::Error::from)
        .and_then(|file| vehicle_csv::write_vehicles(file, list.vehicles(), list.tested()));
    match written {
        Ok(()) => notifier.success(format!(
            "{} kendaraan diekspor ke {}",
            list.vehicles().len(),
            path.display()
        )),
        Err(e) => notifier.error(format!("Gagal mengekspor: {}", e.user_message())),
    }
}
