//! Statistics panel: fleet counts, pass rate and recent tests

use eframe::egui::{self, Color32, RichText, Ui};
use emisi_app::{Notifier, StatisticsBoard};
use emisi_types::{FuelType, Result, Statistics};

use crate::worker::Worker;

#[derive(Default)]
pub struct StatsPanel {
    board: StatisticsBoard,
}

impl StatsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reload(&mut self, worker: &Worker) {
        if self.board.begin_load() {
            worker.load_statistics();
        }
    }

    pub fn finish(&mut self, result: Result<Statistics>, notifier: &mut Notifier) {
        self.board.finish_load(result, notifier);
    }

    pub fn ui(&mut self, ui: &mut Ui, worker: Option<&Worker>) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Statistik");
                let enabled = worker.is_some() && !self.board.is_loading();
                if ui.add_enabled(enabled, egui::Button::new("Muat ulang")).clicked() {
                    if let Some(worker) = worker {
                        self.reload(worker);
                    }
                }
                if self.board.is_loading() {
                    ui.spinner();
                }
            });
            ui.add_space(10.0);

            match self.board.stats() {
                Some(stats) => render_stats(ui, stats),
                None if !self.board.is_loading() => {
                    ui.label(RichText::new("Belum ada data statistik").color(Color32::GRAY));
                }
                None => {}
            }
        });
    }
}

fn render_stats(ui: &mut Ui, stats: &Statistics) {
    egui::Grid::new("stats_summary")
        .num_columns(2)
        .spacing([20.0, 4.0])
        .show(ui, |ui| {
            ui.label("Kendaraan terdaftar:");
            ui.label(stats.total_kendaraan.to_string());
            ui.end_row();
            for fuel in FuelType::all() {
                ui.label(format!("  {}:", fuel.label()));
                ui.label(stats.vehicles_with_fuel(fuel).to_string());
                ui.end_row();
            }
            ui.label("Belum diuji:");
            ui.label(stats.untested().to_string());
            ui.end_row();
            ui.label("Hasil uji valid:");
            ui.label(stats.total_tests.to_string());
            ui.end_row();
            ui.label("Lulus / tidak lulus:");
            ui.label(format!("{} / {}", stats.passing_tests, stats.failing_tests));
            ui.end_row();
            ui.label("Tingkat kelulusan:");
            ui.label(RichText::new(format!("{:.1}%", stats.pass_rate)).strong());
            ui.end_row();
        });

    if !stats.monthly_results.is_empty() {
        ui.add_space(15.0);
        ui.label(RichText::new("Per bulan").strong());
        egui::Grid::new("stats_monthly")
            .num_columns(4)
            .striped(true)
            .spacing([20.0, 4.0])
            .show(ui, |ui| {
                for header in ["Bulan", "Lulus", "Tidak lulus", "Total"] {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();
                for m in &stats.monthly_results {
                    ui.label(m.month.as_str());
                    ui.label(m.passing.to_string());
                    ui.label(m.failing.to_string());
                    ui.label(m.total.to_string());
                    ui.end_row();
                }
            });
    }

    if !stats.recent_tests.is_empty() {
        ui.add_space(15.0);
        ui.label(RichText::new("Uji terakhir").strong());
        egui::Grid::new("stats_recent")
            .num_columns(5)
            .striped(true)
            .spacing([15.0, 4.0])
            .show(ui, |ui| {
                for t in &stats.recent_tests {
                    ui.label(t.tanggal.as_deref().unwrap_or("-"));
                    ui.label(t.plat_nomor.as_str());
                    ui.label(format!("{} {}", t.merek, t.tipe));
                    ui.label(t.fuel_type.label());
                    let (text, color) = if t.lulus {
                        ("Lulus", Color32::LIGHT_GREEN)
                    } else {
                        ("Tidak lulus", Color32::LIGHT_RED)
                    };
                    ui.label(RichText::new(text).color(color));
                    ui.end_row();
                }
            });
    }
}
