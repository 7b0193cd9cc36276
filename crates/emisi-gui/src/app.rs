//! Main application structure with tab navigation

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, RichText};
use emisi_app::config::Config;
use emisi_app::list::VehicleListController;
use emisi_app::modal::ModalEffect;
use emisi_app::notify::ToastLevel;
use emisi_app::{Notifier, TestResultModal};
use emisi_infra::HttpBackend;
use tracing::{info, warn};

use crate::list_panel::{self, ListPanel};
use crate::register_panel::RegisterPanel;
use crate::settings_panel::SettingsPanel;
use crate::stats_panel::StatsPanel;
use crate::test_modal;
use crate::worker::{Reply, Worker};

/// Application tab selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Vehicles,
    Register,
    Statistics,
    Settings,
}

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Vehicles => "Daftar",
            Tab::Register => "Registrasi",
            Tab::Statistics => "Statistik",
            Tab::Settings => "Pengaturan",
        }
    }
}

pub struct EmisiApp {
    current_tab: Tab,
    config: Config,
    list: VehicleListController,
    modal: TestResultModal,
    notifier: Notifier,
    list_panel: ListPanel,
    register_panel: RegisterPanel,
    settings_panel: SettingsPanel,
    stats_panel: StatsPanel,
    /// `None` while the configured backend cannot be used
    worker: Option<Worker>,
    sender: Sender<Reply>,
    replies: Receiver<Reply>,
}

impl EmisiApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut style = (*cc.egui_ctx.style()).clone();
        style.interaction.tooltip_delay = 0.5;
        style.animation_time = 0.1;
        cc.egui_ctx.set_style(style);

        let (config, load_error) = match Config::load() {
            Ok(config) => (config, None),
            Err(e) => {
                warn!("Failed to load config, using defaults: {}", e);
                (Config::default(), Some(e))
            }
        };
        let mut notifier = Notifier::new(config.toast_duration());
        if let Some(e) = load_error {
            notifier.warning(format!("Konfigurasi tidak dapat dibaca: {}", e));
        }

        let (sender, replies) = channel();
        let mut app = Self {
            current_tab: Tab::default(),
            list: VehicleListController::new(config.page_size),
            modal: TestResultModal::new(),
            notifier,
            list_panel: ListPanel::new(),
            register_panel: RegisterPanel::new(),
            settings_panel: SettingsPanel::new(&config),
            stats_panel: StatsPanel::new(),
            worker: None,
            sender,
            replies,
            config,
        };
        app.connect(&cc.egui_ctx);
        app
    }

    /// (Re)build the backend from the current config and reload everything
    fn connect(&mut self, ctx: &egui::Context) {
        self.modal.close();
        self.list.set_page_size(self.config.page_size);

        match HttpBackend::new(&self.config.http_settings()) {
            Ok(backend) => {
                info!("Using backend {}", self.config.base_url);
                let worker = Worker::new(Arc::new(backend), self.sender.clone(), ctx.clone());
                list_panel::refresh(&mut self.list, &worker);
                worker.load_filter_options();
                self.worker = Some(worker);
            }
            Err(e) => {
                warn!("Backend unavailable: {}", e);
                self.notifier
                    .error(format!("Backend tidak dapat digunakan: {}", e.user_message()));
                self.worker = None;
            }
        }
    }

    fn refresh_lists(&mut self) {
        if let Some(worker) = &self.worker {
            list_panel::refresh(&mut self.list, worker);
        }
    }

    /// Apply every reply that arrived since the last frame
    fn poll_replies(&mut self) {
        loop {
            match self.replies.try_recv() {
                Ok(reply) => self.apply(reply),
                Err(TryRecvError::Empty) => break,
                // The app keeps its own sender, so this never disconnects
                Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn apply(&mut self, reply: Reply) {
        let notifier = &mut self.notifier;
        match reply {
            Reply::TestedPlates(request, result) => {
                self.list.complete_tested(request, result);
            }
            Reply::Page(request, result) => {
                self.list.complete_load(request, result, notifier);
            }
            Reply::FilterOptions { brands, types } => self.list.apply_filter_options(brands, types),
            Reply::Opened(ticket, vehicle, existing) => {
                self.modal.finish_open(ticket, vehicle, existing, notifier);
            }
            Reply::Saved(request, result) => {
                if self.modal.finish_submit(request, result, notifier) == ModalEffect::RefreshLists {
                    self.refresh_lists();
                }
            }
            Reply::Cleared(request, result) => {
                if self.modal.finish_clear(request, result, notifier) == ModalEffect::RefreshLists {
                    self.refresh_lists();
                }
            }
            Reply::Deleted(plat, result) => {
                if self.list.finish_delete(&plat, result, notifier) {
                    if self.modal.plat() == Some(plat.as_str()) {
                        self.modal.close();
                    }
                    self.refresh_lists();
                }
            }
            Reply::Created(result) => {
                if self.register_panel.finish_create(result, notifier) {
                    self.refresh_lists();
                    if let Some(worker) = &self.worker {
                        worker.load_filter_options();
                    }
                }
            }
            Reply::Uploaded(result) => {
                if self.register_panel.finish_upload(result, notifier) {
                    self.refresh_lists();
                    if let Some(worker) = &self.worker {
                        worker.load_filter_options();
                    }
                }
            }
            Reply::UserLoaded(result) => self.settings_panel.finish_user(result, notifier),
            Reply::Statistics(result) => self.stats_panel.finish(result, notifier),
        }
    }

    fn render_tab_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;

            for tab in [Tab::Vehicles, Tab::Register, Tab::Statistics, Tab::Settings] {
                let selected = self.current_tab == tab;
                if ui.selectable_label(selected, tab.label()).clicked() {
                    // Numbers change with every mutation; reload on entry
                    if tab == Tab::Statistics && !selected {
                        if let Some(worker) = &self.worker {
                            self.stats_panel.reload(worker);
                        }
                    }
                    self.current_tab = tab;
                }
                ui.add_space(8.0);
            }
        });
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        self.notifier.prune(Instant::now());
        if self.notifier.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
            .show(ctx, |ui| {
                for toast in self.notifier.toasts() {
                    let color = match toast.level {
                        ToastLevel::Success => Color32::LIGHT_GREEN,
                        ToastLevel::Error => Color32::LIGHT_RED,
                        ToastLevel::Warning => Color32::YELLOW,
                        ToastLevel::Info => Color32::LIGHT_BLUE,
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(RichText::new(&toast.message).color(color));
                    });
                    ui.add_space(4.0);
                }
            });

        // Keep repainting until the last toast expires
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl eframe::App for EmisiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_replies();

        egui::TopBottomPanel::top("tab_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_tab_bar(ui);
            ui.add_space(4.0);
        });

        let mut reconnect = false;
        egui::CentralPanel::default().show(ctx, |ui| match self.current_tab {
            Tab::Vehicles => {
                self.list_panel.ui(
                    ui,
                    &mut self.list,
                    &mut self.modal,
                    self.worker.as_ref(),
                    &mut self.notifier,
                );
            }
            Tab::Register => {
                self.register_panel
                    .ui(ui, self.worker.as_ref(), &mut self.notifier);
            }
            Tab::Statistics => self.stats_panel.ui(ui, self.worker.as_ref()),
            Tab::Settings => {
                reconnect = self
                    .settings_panel
                    .ui(ui, &mut self.config, self.worker.as_ref());
            }
        });

        test_modal::show(
            ctx,
            &mut self.modal,
            self.worker.as_ref(),
            self.config.user_id,
            &mut self.notifier,
        );

        if reconnect {
            self.notifier.set_duration(self.config.toast_duration());
            self.connect(ctx);
        }

        self.render_toasts(ctx);
    }
}
