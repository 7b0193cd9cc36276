//! Output formatting module

use emisi_app::modal::OpenForm;
use emisi_app::notify::{Notifier, ToastLevel};
use emisi_app::{ListRenderer, ListView};
use emisi_domain::service::TestForm;
use emisi_types::{BatchRowError, FuelType, OutputFormat, Result, Statistics, TestField, User, Vehicle};
use serde::Serialize;

#[derive(Serialize)]
struct CardJson<'a> {
    #[serde(flatten)]
    vehicle: &'a Vehicle,
    tested: bool,
}

#[derive(Serialize)]
struct ListJson<'a> {
    vehicles: Vec<CardJson<'a>>,
    loaded: usize,
    total: usize,
    has_more: bool,
}

/// Prints the vehicle list to stdout
pub struct ConsoleRenderer {
    format: OutputFormat,
    error: Option<serde_json::Error>,
}

impl ConsoleRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format, error: None }
    }

    /// Serialization failure from the last render, if any
    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn render_table(view: &ListView) {
        if view.is_empty() {
            println!("Tidak ada kendaraan.");
        } else {
            println!(
                "{:<12} {:<6} {:<12} {:<14} {:>5} {:<7} {:<20} {:<10}",
                "Plat", "Jenis", "Merek", "Tipe", "Tahun", "BBM", "Instansi", "Status"
            );
            println!("{}", "-".repeat(93));
            for card in &view.cards {
                let v = &card.vehicle;
                println!(
                    "{:<12} {:<6} {:<12} {:<14} {:>5} {:<7} {:<20} {:<10}",
                    v.plat_nomor,
                    v.jenis,
                    truncate(&v.merek, 12),
                    truncate(&v.tipe, 14),
                    v.tahun,
                    v.fuel_type,
                    truncate(v.instansi(), 20),
                    if card.tested { "diuji" } else { "belum" }
                );
            }
        }
        println!();
        let shown = if view.filter_active {
            format!("{} cocok dari ", view.cards.len())
        } else {
            String::new()
        };
        println!("{}{} dimuat, total {}", shown, view.loaded, view.total);
        if view.has_more {
            println!("Masih ada data lain (gunakan --pages atau --all)");
        }
    }
}

impl ListRenderer for ConsoleRenderer {
    fn render(&mut self, view: &ListView) {
        match self.format {
            OutputFormat::Table => Self::render_table(view),
            OutputFormat::Json => {
                let json = ListJson {
                    vehicles: view
                        .cards
                        .iter()
                        .map(|c| CardJson {
                            vehicle: &c.vehicle,
                            tested: c.tested,
                        })
                        .collect(),
                    loaded: view.loaded,
                    total: view.total,
                    has_more: view.has_more,
                };
                match serde_json::to_string_pretty(&json) {
                    Ok(content) => println!("{}", content),
                    Err(e) => self.error = Some(e),
                }
            }
        }
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Print and clear queued notifications on stderr
pub fn flush_toasts(notifier: &mut Notifier) {
    for toast in notifier.drain() {
        match toast.level {
            ToastLevel::Success | ToastLevel::Info => eprintln!("{}", toast.message),
            ToastLevel::Error | ToastLevel::Warning => {
                eprintln!("[{}] {}", toast.level.label(), toast.message)
            }
        }
    }
}

pub fn output_modal(format: OutputFormat, form: &OpenForm) -> Result<()> {
    if format == OutputFormat::Json {
        let json = serde_json::json!({
            "vehicle": form.vehicle,
            "result": form.existing,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    let v = &form.vehicle;
    println!("\nKendaraan {}", v.plat_nomor);
    println!("===========================");
    println!("Jenis:          {}", v.jenis.label());
    println!("Merek / Tipe:   {} {}", v.merek, v.tipe);
    println!("Tahun:          {}", v.tahun);
    println!("Bahan bakar:    {}", v.fuel_type.label());
    println!(
        "Kategori beban: {}",
        v.load_category.map(|c| c.label()).unwrap_or("-")
    );
    println!("Instansi:       {}", v.instansi());

    println!("\n{}", form.form.label());
    match &form.existing {
        Some(result) => {
            let readings = result.readings();
            for &field in form.form.required_fields() {
                let value = readings
                    .get(field)
                    .map(|x| x.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("  {:<14} {}", field.label(), value);
            }
            println!("  {}", result.summary());
            if let Some(tanggal) = result.tanggal {
                println!("  Tanggal: {}", tanggal.format("%Y-%m-%d %H:%M"));
            }
        }
        None => {
            println!("  Belum diuji. Field wajib: {}", required_keys(form.form));
        }
    }
    Ok(())
}

fn required_keys(form: TestForm) -> String {
    form.required_fields()
        .iter()
        .map(TestField::key)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn output_options(format: OutputFormat, brands: &[String], types: &[String]) -> Result<()> {
    if format == OutputFormat::Json {
        let json = serde_json::json!({ "merek": brands, "tipe": types });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("Merek: {}", brands.join(", "));
        println!("Tipe:  {}", types.join(", "));
    }
    Ok(())
}

pub fn output_user(format: OutputFormat, user: &User) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(user)?);
    } else {
        println!("Id:        {}", user.id);
        println!("Username:  {}", user.username);
        println!("Nama:      {}", user.fullname.as_deref().unwrap_or("-"));
        println!("Email:     {}", user.email);
        println!("Admin:     {}", if user.is_admin { "ya" } else { "tidak" });
    }
    Ok(())
}

pub fn output_statistics(format: OutputFormat, stats: &Statistics) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("\nStatistik Uji Emisi");
    println!("===========================");
    println!("Kendaraan terdaftar: {}", stats.total_kendaraan);
    for fuel in FuelType::all() {
        println!("  {:<18} {}", fuel.label(), stats.vehicles_with_fuel(fuel));
    }
    println!("Hasil uji valid:     {}", stats.total_tests);
    println!("  Lulus              {}", stats.passing_tests);
    println!("  Tidak lulus        {}", stats.failing_tests);
    println!("Tingkat kelulusan:   {:.1}%", stats.pass_rate);

    if !stats.monthly_results.is_empty() {
        println!("\nPer bulan");
        println!("{:<10} {:>6} {:>12} {:>6}", "Bulan", "Lulus", "Tidak lulus", "Total");
        for m in &stats.monthly_results {
            println!("{:<10} {:>6} {:>12} {:>6}", m.month, m.passing, m.failing, m.total);
        }
    }

    if !stats.recent_tests.is_empty() {
        println!("\nUji terakhir");
        for t in &stats.recent_tests {
            println!(
                "{:<16} {:<12} {:<12} {:<14} {:<7} {}",
                t.tanggal.as_deref().unwrap_or("-"),
                t.plat_nomor,
                truncate(&t.merek, 12),
                truncate(&t.tipe, 14),
                t.fuel_type,
                if t.lulus { "lulus" } else { "tidak lulus" }
            );
        }
    }
    Ok(())
}

pub fn output_row_errors(errors: &[BatchRowError]) {
    for e in errors {
        eprintln!("  Baris {}: {}", e.row, e.error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Avanza", 10), "Avanza");
        assert_eq!(truncate("Colt Diesel FE 74", 8), "Colt Di…");
    }

    #[test]
    fn test_required_keys() {
        assert_eq!(required_keys(TestForm::CompressionIgnition), "opacity");
        assert_eq!(
            required_keys(TestForm::SparkIgnition),
            "co, co2, hc, o2, lambda_val"
        );
    }
}
