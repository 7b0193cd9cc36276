//! Test-result window
//!
//! Renders whatever state the [`TestResultModal`] controller is in; the
//! controller decides which fields exist for the vehicle's fuel type.

use eframe::egui::{self, Color32, RichText};
use emisi_app::modal::validation_message;
use emisi_app::{Notifier, TestResultModal};
use emisi_types::TestField;

use crate::worker::Worker;

pub fn show(
    ctx: &egui::Context,
    modal: &mut TestResultModal,
    worker: Option<&Worker>,
    user_id: Option<i64>,
    notifier: &mut Notifier,
) {
    if modal.is_loading() {
        let plat = modal.plat().unwrap_or_default().to_string();
        let mut open = true;
        egui::Window::new("Data Uji")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(format!("Memuat {}...", plat));
                });
            });
        if !open {
            modal.close();
        }
        return;
    }

    let Some(form) = modal.open_form() else {
        return;
    };
    let vehicle = form.vehicle.clone();
    let shape = form.form;
    let busy = form.busy;
    let errors = form.errors.clone();

    let mut open = true;
    egui::Window::new(format!("Data Uji {}", vehicle.plat_nomor))
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(format!(
                "{} {} ({}) - {}",
                vehicle.merek,
                vehicle.tipe,
                vehicle.tahun,
                vehicle.fuel_type.label()
            ));
            ui.label(RichText::new(shape.label()).strong());
            ui.add_space(8.0);

            egui::Grid::new("test_fields")
                .num_columns(2)
                .spacing([10.0, 6.0])
                .show(ui, |ui| {
                    for &field in shape.required_fields() {
                        render_field(ui, modal, field, errors.message_for(field.key()));
                        ui.end_row();
                    }
                });

            if let Some(summary) = modal.summary() {
                ui.add_space(8.0);
                let color = if summary.lulus {
                    Color32::LIGHT_GREEN
                } else {
                    Color32::LIGHT_RED
                };
                ui.label(RichText::new(summary.to_string()).color(color));
            }

            ui.add_space(10.0);

            if let Some(confirmation) = modal.pending_confirmation().cloned() {
                ui.label(RichText::new(confirmation.prompt()).color(Color32::YELLOW));
                ui.horizontal(|ui| {
                    if ui.button("Ya, hapus").clicked() {
                        if let (Some(worker), Some(request)) = (worker, modal.confirm_clear()) {
                            worker.clear_result(request);
                        }
                    }
                    if ui.button("Batal").clicked() {
                        modal.cancel_clear();
                    }
                });
                return;
            }

            ui.horizontal(|ui| {
                let can_send = worker.is_some() && !busy;
                if ui
                    .add_enabled(can_send, egui::Button::new("Simpan"))
                    .clicked()
                {
                    match modal.prepare_submit(user_id) {
                        Ok(request) => {
                            if let Some(worker) = worker {
                                worker.save_result(request);
                            }
                        }
                        Err(errors) => notifier.error(validation_message(&errors)),
                    }
                }
                if ui
                    .add_enabled(can_send && modal.can_clear(), egui::Button::new("Hapus data uji"))
                    .clicked()
                {
                    let _ = modal.request_clear();
                }
                if busy {
                    ui.spinner();
                }
            });
        });

    if !open {
        modal.close();
    }
}

fn render_field(ui: &mut egui::Ui, modal: &mut TestResultModal, field: TestField, error: Option<&str>) {
    let highlighted = error.is_some();
    let label = RichText::new(field.label());
    ui.label(if highlighted {
        label.color(Color32::LIGHT_RED)
    } else {
        label
    });

    ui.horizontal(|ui| {
        let mut text = modal.input(field).to_string();
        let mut edit = egui::TextEdit::singleline(&mut text)
            .hint_text("0.00")
            .desired_width(100.0);
        if highlighted {
            edit = edit.text_color(Color32::LIGHT_RED);
        }
        if ui.add(edit).changed() {
            modal.set_input(field, text);
        }
        if let Some(message) = error {
            ui.label(RichText::new(message).color(Color32::LIGHT_RED).small());
        }
    });
}
