//! Command handlers
//!
//! Each handler drives the application controllers against the HTTP backend
//! and prints queued notifications before returning. `Ok(false)` means the
//! operation was refused or failed and has already been reported.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use emisi_app::config::Config;
use emisi_app::forms::{self, BatchUploadForm, RegistrationForm, UserForm};
use emisi_app::list::{LoadOutcome, VehicleListController};
use emisi_app::modal::ModalEffect;
use emisi_app::{Confirmation, Notifier, StatisticsBoard, TestResultModal};
use emisi_domain::service::{VehicleDraft, VehicleFilter};
use emisi_infra::vehicle_csv::{self, TEMPLATE_FILE_NAME};
use emisi_infra::HttpBackend;
use emisi_types::{Jenis, OutputFormat, Result, TestField, VehicleUpdate, NO_INSTANSI};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::output::{
    flush_toasts, output_modal, output_options, output_row_errors, output_statistics, output_user,
    ConsoleRenderer,
};

pub fn execute(cli: Cli) -> Result<bool> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref base_url) = cli.base_url {
        config.base_url = base_url.clone();
    }
    if cli.user_id.is_some() {
        config.user_id = cli.user_id;
    }
    let format = cli.format.unwrap_or(config.output_format);

    if let Commands::Config { .. } = cli.command {
        return cmd_config(cli.command, config);
    }
    if let Commands::Template { ref output } = cli.command {
        let path = output
            .clone()
            .unwrap_or_else(|| TEMPLATE_FILE_NAME.into());
        vehicle_csv::save_template(&path)?;
        println!("Template written to {}", path.display());
        return Ok(true);
    }

    debug!("Using backend {}", config.base_url);
    let backend = HttpBackend::new(&config.http_settings())?;
    let mut notifier = Notifier::new(config.toast_duration());

    let ok = match cli.command {
        Commands::List {
            plat,
            merek,
            tipe,
            jenis,
            status,
            pages,
            all,
        } => {
            let filter = VehicleFilter {
                plat: plat.unwrap_or_default(),
                merek,
                tipe,
                jenis,
                tested: status,
            };
            cmd_list(&backend, &config, format, filter, pages, all, &mut notifier)?
        }
        Commands::Show { plat } => {
            let mut modal = TestResultModal::new();
            let opened = modal.show(&backend, &plat, &mut notifier);
            if let Some(form) = modal.open_form() {
                output_modal(format, form)?;
            }
            opened
        }
        Commands::Register {
            jenis,
            plat,
            merek,
            tipe,
            tahun,
            fuel,
            load_category,
            instansi,
        } => {
            let mut form = RegistrationForm::new();
            let mut draft = VehicleDraft {
                plat_nomor: plat,
                merek,
                tipe,
                tahun,
                ..Default::default()
            };
            draft.set_jenis(jenis);
            draft.set_fuel_type(fuel);
            draft.load_category = Some(load_category);
            if jenis == Jenis::Dinas {
                draft.nama_instansi = instansi.unwrap_or_default();
            } else if instansi.as_deref().is_some_and(|i| i != NO_INSTANSI) {
                notifier.warning("Nama instansi diabaikan untuk kendaraan umum");
            }
            form.draft = draft;
            form.submit(&backend, &mut notifier)
        }
        Commands::Edit {
            plat,
            merek,
            tipe,
            tahun,
            jenis,
            fuel,
            load_category,
            instansi,
        } => {
            let update = VehicleUpdate {
                merek,
                tipe,
                tahun,
                jenis,
                nama_instansi: instansi,
                fuel_type: fuel,
                load_category,
            };
            forms::update_vehicle(&backend, &plat, &update, &mut notifier)
        }
        Commands::Delete { plat, yes } => {
            let mut list = VehicleListController::new(config.page_size);
            let confirmation = list.request_delete(&plat);
            if confirm(&confirmation, yes)? {
                list.delete_vehicle(&backend, &confirmation, &mut notifier)
            } else {
                println!("Dibatalkan");
                true
            }
        }
        Commands::Test {
            plat,
            co,
            co2,
            hc,
            o2,
            lambda,
            opacity,
        } => {
            let mut list = VehicleListController::new(config.page_size);
            let mut modal = TestResultModal::new();
            if modal.show(&backend, &plat, &mut notifier) {
                let inputs = [
                    (TestField::Co, co),
                    (TestField::Co2, co2),
                    (TestField::Hc, hc),
                    (TestField::O2, o2),
                    (TestField::LambdaVal, lambda),
                    (TestField::Opacity, opacity),
                ];
                if let Some(form) = modal.form() {
                    for (field, value) in inputs {
                        match value {
                            Some(v) if form.accepts(field) => modal.set_input(field, v),
                            Some(_) => notifier.warning(format!(
                                "{} diabaikan untuk {}",
                                field.key(),
                                form.label()
                            )),
                            None => {}
                        }
                    }
                }
                let effect = modal.submit(&backend, &mut list, config.user_id, &mut notifier);
                effect == ModalEffect::RefreshLists
            } else {
                false
            }
        }
        Commands::ClearTest { plat, yes } => {
            let mut list = VehicleListController::new(config.page_size);
            let mut modal = TestResultModal::new();
            if !modal.show(&backend, &plat, &mut notifier) {
                false
            } else {
                match modal.request_clear() {
                    None => {
                        notifier.info(format!("{} belum memiliki data uji", plat));
                        true
                    }
                    Some(confirmation) => {
                        if confirm(&confirmation, yes)? {
                            modal.clear(&backend, &mut list, &mut notifier) == ModalEffect::RefreshLists
                        } else {
                            modal.cancel_clear();
                            println!("Dibatalkan");
                            true
                        }
                    }
                }
            }
        }
        Commands::BatchUpload { file, check_only } => {
            cmd_batch_upload(&backend, &file, check_only, &mut notifier)?
        }
        Commands::Export { output } => {
            let mut list = VehicleListController::new(config.page_size);
            let loaded = load_pages(&backend, &mut list, usize::MAX, &mut notifier);
            if loaded {
                let file = std::fs::File::create(&output)?;
                vehicle_csv::write_vehicles(file, list.vehicles(), list.tested())?;
                println!("{} kendaraan diekspor ke {}", list.vehicles().len(), output.display());
            }
            loaded
        }
        Commands::Options => {
            let mut list = VehicleListController::new(config.page_size);
            list.load_filter_options(&backend);
            output_options(format, list.brands(), list.types())?;
            true
        }
        Commands::Stats => {
            let mut board = StatisticsBoard::new();
            let loaded = board.load(&backend, &mut notifier);
            if let Some(stats) = board.stats() {
                output_statistics(format, stats)?;
            }
            loaded
        }
        Commands::User { id } => {
            let mut form = UserForm::default();
            let found = form.load(&backend, id, &mut notifier);
            if let Some(user) = &form.user {
                output_user(format, user)?;
            }
            found
        }
        Commands::Config { .. } | Commands::Template { .. } => true,
    };

    flush_toasts(&mut notifier);
    Ok(ok)
}

fn cmd_list(
    backend: &HttpBackend,
    config: &Config,
    format: OutputFormat,
    filter: VehicleFilter,
    pages: usize,
    all: bool,
    notifier: &mut Notifier,
) -> Result<bool> {
    let mut list = VehicleListController::new(config.page_size);
    list.set_filter(filter);
    let pages = if all { usize::MAX } else { pages.max(1) };
    let loaded = load_pages(backend, &mut list, pages, notifier);

    flush_toasts(notifier);
    let mut renderer = ConsoleRenderer::new(format);
    list.render(&mut renderer);
    renderer.finish()?;
    Ok(loaded)
}

/// Refresh and then load up to `pages` pages in total
fn load_pages(
    backend: &HttpBackend,
    list: &mut VehicleListController,
    pages: usize,
    notifier: &mut Notifier,
) -> bool {
    let spinner = spinner("Memuat data kendaraan...");
    let mut ok = list.refresh_all(backend, notifier) != LoadOutcome::Failed;
    let mut loaded_pages = 1;
    while ok && loaded_pages < pages && list.has_more() {
        spinner.set_message(format!(
            "Memuat data kendaraan... {}/{}",
            list.vehicles().len(),
            list.total()
        ));
        match list.load_more(backend, notifier) {
            LoadOutcome::Failed => ok = false,
            LoadOutcome::Skipped => break,
            _ => {}
        }
        loaded_pages += 1;
    }
    spinner.finish_and_clear();
    ok
}

fn cmd_batch_upload(
    backend: &HttpBackend,
    file: &Path,
    check_only: bool,
    notifier: &mut Notifier,
) -> Result<bool> {
    let mut form = BatchUploadForm::new();
    if let Err(errors) = form.select(file) {
        notifier.error(errors.to_string());
        return Ok(false);
    }

    let check = form.precheck()?;
    println!(
        "{} baris diperiksa, {} valid, {} bermasalah",
        check.total_rows(),
        check.vehicles.len(),
        check.errors.len()
    );
    output_row_errors(&check.errors);
    if check_only {
        return Ok(check.is_clean());
    }
    if !check.is_clean() {
        notifier.warning("File berisi baris bermasalah; server akan menolak seluruh file");
    }

    let spinner = spinner("Mengunggah file...");
    let uploaded = form.upload(backend, notifier);
    spinner.finish_and_clear();

    if let Some(report) = form.report() {
        for line in report.error_lines() {
            eprintln!("  {}", line);
        }
        return Ok(uploaded && !report.has_errors());
    }
    Ok(uploaded)
}

fn cmd_config(command: Commands, mut config: Config) -> Result<bool> {
    let Commands::Config {
        show,
        set_base_url,
        set_page_size,
        set_user_id,
        set_cookie,
        set_timeout,
        set_output,
        set_toast_seconds,
    } = command
    else {
        return Ok(false);
    };

    let mut changed = false;
    if let Some(url) = set_base_url {
        config.base_url = url;
        changed = true;
    }
    if let Some(size) = set_page_size {
        config.page_size = size.max(1);
        changed = true;
    }
    if let Some(id) = set_user_id {
        config.user_id = Some(id);
        changed = true;
    }
    if let Some(cookie) = set_cookie {
        config.session_cookie = if cookie.is_empty() { None } else { Some(cookie) };
        changed = true;
    }
    if let Some(secs) = set_timeout {
        config.timeout_secs = secs.max(1);
        changed = true;
    }
    if let Some(format) = set_output {
        config.output_format = format;
        changed = true;
    }
    if let Some(secs) = set_toast_seconds {
        config.toast_seconds = secs;
        changed = true;
    }

    if changed {
        config.save()?;
        println!("Configuration saved.");
    }
    if show || !changed {
        println!("{}", config);
    }
    Ok(true)
}

/// Ask on stdin unless `yes` was given
fn confirm(confirmation: &Confirmation, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("{} [y/N] ", confirmation.prompt());
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "ya" | "yes"))
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
