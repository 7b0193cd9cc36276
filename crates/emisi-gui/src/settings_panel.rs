//! Settings panel: backend connection and operator account

use eframe::egui::{self, Color32, RichText, Ui};
use emisi_app::config::Config;
use emisi_app::forms::UserForm;
use emisi_app::Notifier;
use emisi_types::{Result, User};

use crate::worker::Worker;

pub struct SettingsPanel {
    base_url: String,
    page_size: String,
    user_id: String,
    session_cookie: String,
    timeout_secs: String,
    toast_seconds: String,
    /// Whether the inputs differ from the saved config
    modified: bool,
    user_form: UserForm,
    looking_up: bool,
    status_message: Option<(String, bool)>, // (message, is_error)
}

impl SettingsPanel {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            page_size: config.page_size.to_string(),
            user_id: config.user_id.map(|id| id.to_string()).unwrap_or_default(),
            session_cookie: config.session_cookie.clone().unwrap_or_default(),
            timeout_secs: config.timeout_secs.to_string(),
            toast_seconds: config.toast_seconds.to_string(),
            modified: false,
            user_form: UserForm::default(),
            looking_up: false,
            status_message: None,
        }
    }

    /// Returns `true` when a new configuration was saved
    pub fn ui(&mut self, ui: &mut Ui, config: &mut Config, worker: Option<&Worker>) -> bool {
        let mut saved = false;

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.heading("Pengaturan");
            ui.add_space(10.0);

            ui.label(RichText::new("Koneksi").strong());
            ui.add_space(5.0);

            egui::Grid::new("settings_form")
                .num_columns(2)
                .spacing([10.0, 6.0])
                .show(ui, |ui| {
                    self.modified |= text_row(ui, "URL backend:", &mut self.base_url, 260.0);
                    self.modified |= text_row(ui, "Kendaraan per halaman:", &mut self.page_size, 60.0);
                    self.modified |= text_row(ui, "Batas waktu (detik):", &mut self.timeout_secs, 60.0);
                    self.modified |= text_row(ui, "Notifikasi (detik):", &mut self.toast_seconds, 60.0);

                    ui.label("Cookie sesi:");
                    self.modified |= ui
                        .add(
                            egui::TextEdit::singleline(&mut self.session_cookie)
                                .password(true)
                                .desired_width(260.0),
                        )
                        .changed();
                    ui.end_row();

                    self.modified |= text_row(ui, "ID operator:", &mut self.user_id, 60.0);
                });

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(self.modified, egui::Button::new("Simpan"))
                    .clicked()
                {
                    saved = self.save(config);
                }
                if ui
                    .add_enabled(self.modified, egui::Button::new("Batalkan"))
                    .clicked()
                {
                    let user_form = std::mem::take(&mut self.user_form);
                    *self = Self::new(config);
                    self.user_form = user_form;
                }
            });

            if let Some((ref msg, is_error)) = self.status_message {
                ui.add_space(5.0);
                let color = if is_error {
                    Color32::LIGHT_RED
                } else {
                    Color32::LIGHT_GREEN
                };
                ui.label(RichText::new(msg).color(color));
            }

            if let Ok(path) = Config::config_path() {
                ui.add_space(5.0);
                ui.label(
                    RichText::new(format!("File konfigurasi: {}", path.display()))
                        .color(Color32::GRAY)
                        .small(),
                );
            }

            ui.add_space(15.0);
            ui.separator();
            ui.add_space(15.0);

            self.render_operator(ui, config, worker);
        });

        saved
    }

    pub fn finish_user(&mut self, result: Result<User>, notifier: &mut Notifier) {
        self.looking_up = false;
        self.user_form.finish_load(result, notifier);
    }

    fn render_operator(&mut self, ui: &mut Ui, config: &Config, worker: Option<&Worker>) {
        ui.label(RichText::new("Operator").strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            let enabled = worker.is_some() && config.user_id.is_some() && !self.looking_up;
            if ui
                .add_enabled(enabled, egui::Button::new("Periksa akun operator"))
                .clicked()
            {
                if let (Some(worker), Some(id)) = (worker, config.user_id) {
                    self.looking_up = true;
                    worker.find_user(id);
                }
            }
            if self.looking_up {
                ui.spinner();
            }
        });

        match &self.user_form.user {
            Some(user) => {
                egui::Grid::new("operator_info")
                    .num_columns(2)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("Username:");
                        ui.label(user.username.as_str());
                        ui.end_row();
                        ui.label("Nama:");
                        ui.label(user.fullname.as_deref().unwrap_or("-"));
                        ui.end_row();
                        ui.label("Email:");
                        ui.label(user.email.as_str());
                        ui.end_row();
                        ui.label("Admin:");
                        ui.label(if user.is_admin { "ya" } else { "tidak" });
                        ui.end_row();
                    });
            }
            None if config.user_id.is_none() => {
                ui.label(
                    RichText::new("ID operator belum diatur; hasil uji disimpan tanpa operator")
                        .color(Color32::YELLOW),
                );
            }
            None => {}
        }
    }

    fn save(&mut self, config: &mut Config) -> bool {
        match self.parse(config) {
            Ok(updated) => match updated.save() {
                Ok(()) => {
                    *config = updated;
                    self.modified = false;
                    self.status_message = Some(("Pengaturan disimpan".to_string(), false));
                    true
                }
                Err(e) => {
                    self.status_message = Some((format!("Gagal menyimpan: {}", e), true));
                    false
                }
            },
            Err(message) => {
                self.status_message = Some((message, true));
                false
            }
        }
    }

    /// Build a config from the inputs, keeping fields the panel does not edit
    fn parse(&self, current: &Config) -> std::result::Result<Config, String> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err("URL backend wajib diisi".to_string());
        }
        let page_size = parse_positive(&self.page_size, "Kendaraan per halaman")?;
        let timeout_secs = parse_positive(&self.timeout_secs, "Batas waktu")?;
        let toast_seconds = parse_positive(&self.toast_seconds, "Notifikasi")?;
        let user_id = match self.user_id.trim() {
            "" => None,
            s => Some(
                s.parse::<i64>()
                    .map_err(|_| "ID operator harus berupa angka".to_string())?,
            ),
        };
        let session_cookie = match self.session_cookie.trim() {
            "" => None,
            s => Some(s.to_string()),
        };

        Ok(Config {
            base_url: base_url.to_string(),
            page_size: page_size as usize,
            user_id,
            session_cookie,
            timeout_secs,
            toast_seconds,
            ..current.clone()
        })
    }
}

fn text_row(ui: &mut Ui, label: &str, value: &mut String, width: f32) -> bool {
    ui.label(label);
    let changed = ui
        .add(egui::TextEdit::singleline(value).desired_width(width))
        .changed();
    ui.end_row();
    changed
}

fn parse_positive(value: &str, name: &str) -> std::result::Result<u64, String> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{} harus berupa angka lebih dari 0", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emisi_types::OutputFormat;

    #[test]
    fn test_parse_keeps_unedited_fields() {
        let current = Config {
            output_format: OutputFormat::Json,
            ..Config::default()
        };
        let mut panel = SettingsPanel::new(&current);
        panel.base_url = " http://10.0.0.5:5000 ".to_string();
        panel.user_id = "7".to_string();
        panel.session_cookie = "session=abc".to_string();

        let parsed = panel.parse(&current).unwrap();
        assert_eq!(parsed.base_url, "http://10.0.0.5:5000");
        assert_eq!(parsed.user_id, Some(7));
        assert_eq!(parsed.session_cookie.as_deref(), Some("session=abc"));
        assert_eq!(parsed.output_format, OutputFormat::Json);
        assert_eq!(parsed.page_size, current.page_size);
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        let current = Config::default();
        let mut panel = SettingsPanel::new(&current);
        panel.page_size = "0".to_string();
        assert!(panel.parse(&current).is_err());

        let mut panel = SettingsPanel::new(&current);
        panel.user_id = "operator".to_string();
        assert_eq!(
            panel.parse(&current).unwrap_err(),
            "ID operator harus berupa angka"
        );

        let mut panel = SettingsPanel::new(&current);
        panel.base_url = "  ".to_string();
        assert!(panel.parse(&current).is_err());
    }
}
