//! Registration panel: single vehicle form and CSV batch upload

use eframe::egui::{self, Color32, RichText, Ui};
use emisi_app::forms::{BatchUploadForm, RegistrationForm};
use emisi_app::Notifier;
use emisi_infra::vehicle_csv::{self, TEMPLATE_FILE_NAME};
use emisi_types::{BatchUploadReport, FuelType, Jenis, Result};

use crate::worker::Worker;

pub struct RegisterPanel {
    form: RegistrationForm,
    batch: BatchUploadForm,
    /// A create request is in flight
    saving: bool,
    /// An upload request is in flight
    uploading: bool,
}

impl RegisterPanel {
    pub fn new() -> Self {
        Self {
            form: RegistrationForm::new(),
            batch: BatchUploadForm::new(),
            saving: false,
            uploading: false,
        }
    }

    pub fn ui(&mut self, ui: &mut Ui, worker: Option<&Worker>, notifier: &mut Notifier) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.heading("Registrasi Kendaraan");
            ui.add_space(10.0);

            self.render_form(ui, worker, notifier);

            ui.add_space(15.0);
            ui.separator();
            ui.add_space(15.0);

            self.render_batch_upload(ui, worker, notifier);
        });
    }

    /// Returns `true` when the vehicle was created
    pub fn finish_create(&mut self, result: Result<()>, notifier: &mut Notifier) -> bool {
        self.saving = false;
        self.form.finish(result, notifier)
    }

    /// Returns `true` when the server processed the file
    pub fn finish_upload(&mut self, result: Result<BatchUploadReport>, notifier: &mut Notifier) -> bool {
        self.uploading = false;
        self.batch.finish(result, notifier)
    }

    fn render_form(&mut self, ui: &mut Ui, worker: Option<&Worker>, notifier: &mut Notifier) {
        ui.label(RichText::new("Kendaraan baru").strong());
        ui.add_space(5.0);

        egui::Grid::new("register_form")
            .num_columns(2)
            .spacing([10.0, 6.0])
            .show(ui, |ui| {
                self.field_label(ui, "Jenis:", "jenis");
                let draft = &mut self.form.draft;
                ui.horizontal(|ui| {
                    for jenis in Jenis::all() {
                        if ui
                            .radio(draft.jenis == Some(jenis), jenis.label())
                            .clicked()
                        {
                            draft.set_jenis(jenis);
                        }
                    }
                });
                ui.end_row();

                self.text_row(ui, "Plat nomor:", "plat_nomor", "contoh: B 1234 XYZ");
                self.text_row(ui, "Merek:", "merek", "contoh: Toyota");
                self.text_row(ui, "Tipe:", "tipe", "contoh: Avanza");
                self.text_row(ui, "Tahun:", "tahun", "contoh: 2020");

                self.field_label(ui, "Bahan bakar:", "fuel_type");
                let draft = &mut self.form.draft;
                ui.horizontal(|ui| {
                    for fuel in FuelType::all() {
                        if ui.radio(draft.fuel_type == fuel, fuel.label()).clicked() {
                            draft.set_fuel_type(fuel);
                        }
                    }
                });
                ui.end_row();

                self.field_label(ui, "Kategori beban:", "load_category");
                let draft = &mut self.form.draft;
                egui::ComboBox::from_id_salt("load_category")
                    .selected_text(
                        draft
                            .load_category
                            .map(|c| c.label())
                            .unwrap_or("Pilih kategori"),
                    )
                    .show_ui(ui, |ui| {
                        for &category in draft.load_category_options() {
                            ui.selectable_value(
                                &mut draft.load_category,
                                Some(category),
                                category.label(),
                            );
                        }
                    });
                ui.end_row();

                if self.form.draft.instansi_required() {
                    self.text_row(ui, "Nama instansi:", "nama_instansi", "contoh: Dinas Perhubungan");
                }
            });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let enabled = worker.is_some() && !self.saving;
            if ui.add_enabled(enabled, egui::Button::new("Simpan")).clicked() {
                match self.form.prepare() {
                    Ok(vehicle) => {
                        if let Some(worker) = worker {
                            self.saving = true;
                            worker.create_vehicle(vehicle);
                        }
                    }
                    Err(errors) => notifier.error(errors.to_string()),
                }
            }
            if ui.button("Bersihkan").clicked() {
                self.form = RegistrationForm::new();
            }
            if self.saving {
                ui.spinner();
            }
        });
    }

    fn field_label(&self, ui: &mut Ui, text: &str, key: &str) {
        let label = RichText::new(text);
        if self.form.is_highlighted(key) {
            ui.label(label.color(Color32::LIGHT_RED));
        } else {
            ui.label(label);
        }
    }

    fn text_row(&mut self, ui: &mut Ui, text: &str, key: &str, hint: &str) {
        self.field_label(ui, text, key);
        let error = self.form.errors().message_for(key).map(str::to_string);
        let draft = &mut self.form.draft;
        let value = match key {
            "plat_nomor" => &mut draft.plat_nomor,
            "merek" => &mut draft.merek,
            "tipe" => &mut draft.tipe,
            "tahun" => &mut draft.tahun,
            _ => &mut draft.nama_instansi,
        };
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(value)
                    .hint_text(hint)
                    .desired_width(200.0),
            );
            if let Some(message) = error {
                ui.label(RichText::new(message).color(Color32::LIGHT_RED).small());
            }
        });
        ui.end_row();
    }

    fn render_batch_upload(&mut self, ui: &mut Ui, worker: Option<&Worker>, notifier: &mut Notifier) {
        ui.label(RichText::new("Unggah CSV").strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            if ui.button("Pilih file CSV...").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("CSV", &["csv"])
                    .pick_file()
                {
                    match self.batch.select(&path) {
                        Ok(()) => {
                            if let Err(e) = self.batch.precheck() {
                                notifier.error(e.user_message());
                            }
                        }
                        Err(errors) => notifier.error(errors.to_string()),
                    }
                }
            }
            if ui.button("Unduh template...").clicked() {
                save_template(notifier);
            }
        });

        let Some(path) = self.batch.file() else {
            ui.label(RichText::new("Belum ada file dipilih").color(Color32::GRAY));
            return;
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ui.label(RichText::new(file_name).color(Color32::LIGHT_GREEN));

        if let Some(check) = self.batch.check() {
            ui.label(format!(
                "{} baris diperiksa, {} valid, {} bermasalah",
                check.total_rows(),
                check.vehicles.len(),
                check.errors.len()
            ));
            for e in &check.errors {
                ui.label(
                    RichText::new(format!("Baris {}: {}", e.row, e.error)).color(Color32::YELLOW),
                );
            }
        }

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            let enabled = worker.is_some() && !self.uploading;
            if ui.add_enabled(enabled, egui::Button::new("Unggah")).clicked() {
                match self.batch.prepare() {
                    Ok(request) => {
                        if let Some(worker) = worker {
                            self.uploading = true;
                            worker.upload(request);
                        }
                    }
                    Err(e) => notifier.error(e.user_message()),
                }
            }
            if self.uploading {
                ui.spinner();
                ui.label("Mengunggah...");
            }
        });

        if let Some(report) = self.batch.report() {
            ui.add_space(5.0);
            let color = if report.has_errors() {
                Color32::YELLOW
            } else {
                Color32::LIGHT_GREEN
            };
            ui.label(RichText::new(report.summary()).color(color));
            for line in report.error_lines() {
                ui.label(RichText::new(line).color(Color32::LIGHT_RED));
            }
        }
    }
}

fn save_template(notifier: &mut Notifier) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name(TEMPLATE_FILE_NAME)
        .save_file()
    else {
        return;
    };
    match vehicle_csv::save_template(&path) {
        Ok(()) => notifier.success(format!("Template disimpan ke {}", path.display())),
        Err(e) => notifier.error(format!("Gagal menyimpan template: {}", e.user_message())),
    }
}
