//! Teevo - always-on live news dashboard
//! Live news video with automatic stream failover, local weather and headlines

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;

mod config;
mod error;
mod models;
mod player;
mod services;
mod streams;
mod timer;
mod widgets;

use config::{AppConfig, ManualLocation};
use models::*;
use player::{drive_failover, DefaultEngine, PlaybackAdapter, SessionOptions, SurfaceStatus};
use services::{feeds, location, news, translation, weather};
use streams::{select_primary, FailoverController, PlaybackTechnology, StreamId};
use timer::RefreshTimer;
use widgets::VideoSurface;

const ALL_FAILED_MESSAGE: &str =
    "All available news streams seem to be offline. Please try again later.";
const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(248, 113, 113);

/// Load application icon: red screen with a white play mark
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            let in_screen = (0.08..=0.92).contains(&nx) && (0.15..=0.75).contains(&ny);
            let in_stand = (0.35..=0.65).contains(&nx) && (0.80..=0.86).contains(&ny);
            let in_play = {
                let px = nx - 0.42;
                let py = ny - 0.45;
                (0.0..=0.2).contains(&px) && py.abs() <= (0.2 - px) * 0.7
            };

            let pixel: [u8; 4] = if in_screen && in_play {
                [255, 255, 255, 255]
            } else if in_screen {
                [220, 38, 38, 255]
            } else if in_stand {
                [45, 55, 72, 255]
            } else {
                [0, 0, 0, 0]
            };
            rgba[idx..idx + 4].copy_from_slice(&pixel);
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

/// Add a system emoji font so weather glyphs render
fn install_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &["C:\\Windows\\Fonts\\seguiemj.ttf"]
    } else if cfg!(target_os = "macos") {
        &["/System/Library/Fonts/Apple Color Emoji.ttc"]
    } else {
        &[
            "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
            "/usr/share/fonts/noto-emoji/NotoColorEmoji.ttf",
            "/usr/share/fonts/google-noto-emoji/NotoColorEmoji.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ]
    };

    for path in candidates {
        if let Ok(font_data) = std::fs::read(path) {
            fonts.font_data.insert(
                "emoji".to_owned(),
                egui::FontData::from_owned(font_data).into(),
            );
            fonts.families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .push("emoji".to_owned());
            tracing::debug!(path, "loaded emoji font");
            break;
        }
    }

    ctx.set_fonts(fonts);
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("teevo=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), eframe::Error> {
    init_logging();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([960.0, 540.0])
            .with_icon(load_icon()),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "TEEVO",
        options,
        Box::new(|cc| {
            install_fonts(&cc.egui_ctx);
            Ok(Box::new(DashboardApp::new(cc.egui_ctx.clone())))
        }),
    )
}

/// Background task messages, tagged with the location request they belong to
enum TaskResult {
    LocationResolved { generation: u64, location: Location },
    LocationFailed { generation: u64, message: String },
    WeatherLoaded { generation: u64, data: WeatherData },
    HeadlinesLoaded { generation: u64, articles: Vec<NewsArticle> },
}

impl TaskResult {
    fn generation(&self) -> u64 {
        match self {
            TaskResult::LocationResolved { generation, .. }
            | TaskResult::LocationFailed { generation, .. }
            | TaskResult::WeatherLoaded { generation, .. }
            | TaskResult::HeadlinesLoaded { generation, .. } => *generation,
        }
    }
}

/// Numbers location requests so results from a superseded one are dropped.
/// Weather and headline loads carry the number of the location they were
/// fetched for.
#[derive(Debug, Default)]
struct RequestGeneration {
    latest: u64,
}

impl RequestGeneration {
    fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    fn current(&self) -> u64 {
        self.latest
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.latest
    }
}

/// Headlines for `location`, translated when that is switched on
fn load_headlines(location: Option<&Location>, config: &AppConfig) -> Vec<NewsArticle> {
    let articles = news::get_headlines(location, config);
    match location {
        Some(loc) if config.translate_headlines && loc.country != "N/A" => {
            translation::translate_headlines(articles, &loc.country, config)
        }
        _ => articles,
    }
}

struct DashboardApp {
    ctx: egui::Context,
    config: AppConfig,

    // Background task channel
    task_receiver: Receiver<TaskResult>,
    task_sender: Sender<TaskResult>,

    // Location
    location: Option<Location>,
    location_requests: RequestGeneration,
    error: Option<String>,

    // Video
    failover: Option<FailoverController>,
    adapter: PlaybackAdapter<DefaultEngine>,
    video: VideoSurface,
    shown_stream: Option<StreamId>,

    // Panels
    weather: Option<WeatherData>,
    headlines: Vec<NewsArticle>,
    travel_routes: Vec<TravelRoute>,
    cameras: Vec<TrafficCamera>,
    stocks: Vec<Stock>,
    alert: String,
    refresh_timer: Option<RefreshTimer>,

    // Settings window
    show_settings: bool,
    location_input: String,
    location_input_error: bool,
}

impl DashboardApp {
    fn new(ctx: egui::Context) -> Self {
        let config = AppConfig::load();
        let (task_sender, task_receiver) = channel();

        let options = SessionOptions {
            autoplay: config.autoplay,
            volume: config.player_volume,
            user_agent: config.user_agent.clone(),
        };

        let location_input = config
            .manual_location
            .map(|m| format!("{}, {}", m.latitude, m.longitude))
            .unwrap_or_default();

        let mut app = Self {
            ctx,
            adapter: PlaybackAdapter::new(DefaultEngine::new(), options),
            task_receiver,
            task_sender,
            location: None,
            location_requests: RequestGeneration::default(),
            error: None,
            failover: None,
            video: VideoSurface::default(),
            shown_stream: None,
            weather: None,
            headlines: Vec::new(),
            travel_routes: feeds::travel_times(),
            cameras: feeds::traffic_cameras(),
            stocks: feeds::stocks(),
            alert: feeds::ALERT_MESSAGE.to_string(),
            refresh_timer: None,
            show_settings: false,
            location_input,
            location_input_error: false,
            config,
        };
        app.apply_theme();
        app.resolve_location();
        app
    }

    fn apply_theme(&self) {
        if self.config.dark_mode {
            self.ctx.set_visuals(egui::Visuals::dark());
        } else {
            self.ctx.set_visuals(egui::Visuals::light());
        }
    }

    fn resolve_location(&mut self) {
        let generation = self.location_requests.next();
        let sender = self.task_sender.clone();
        let config = self.config.clone();
        let ctx = self.ctx.clone();
        thread::spawn(move || {
            let result = match location::locate(&config) {
                Ok(location) => TaskResult::LocationResolved { generation, location },
                Err(e) => TaskResult::LocationFailed {
                    generation,
                    message: e.to_string(),
                },
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    /// Location is settled (found or not): choose streams and load the panels
    fn on_location(&mut self, location: Option<Location>) {
        if let Some(ref loc) = location {
            tracing::info!(city = %loc.city, country = %loc.country, "location resolved");
        }
        self.location = location;

        // Stream choice happens once per run; a later location change only
        // refreshes weather and headlines.
        if self.failover.is_none() {
            let catalog = select_primary(
                &self.config.catalog(),
                self.location.as_ref(),
                self.config.selection_policy,
            );
            self.failover = Some(FailoverController::new(catalog));
        }

        self.fetch_weather();
        self.fetch_headlines();
        self.restart_refresh_timer();
    }

    fn fetch_weather(&self) {
        let generation = self.location_requests.current();
        let sender = self.task_sender.clone();
        let config = self.config.clone();
        let location = self.location.clone();
        let ctx = self.ctx.clone();
        thread::spawn(move || {
            let data = weather::get_weather(location.as_ref(), &config);
            let _ = sender.send(TaskResult::WeatherLoaded { generation, data });
            ctx.request_repaint();
        });
    }

    fn fetch_headlines(&self) {
        let generation = self.location_requests.current();
        let sender = self.task_sender.clone();
        let config = self.config.clone();
        let location = self.location.clone();
        let ctx = self.ctx.clone();
        thread::spawn(move || {
            let articles = load_headlines(location.as_ref(), &config);
            let _ = sender.send(TaskResult::HeadlinesLoaded { generation, articles });
            ctx.request_repaint();
        });
    }

    /// Periodic headline refresh, only while a location is known
    fn restart_refresh_timer(&mut self) {
        if let Some(mut timer) = self.refresh_timer.take() {
            timer.cancel();
        }
        let Some(location) = self.location.clone() else {
            return;
        };

        let generation = self.location_requests.current();
        let sender = self.task_sender.clone();
        let config = self.config.clone();
        let ctx = self.ctx.clone();
        let interval = config.headline_refresh();
        tracing::debug!(secs = interval.as_secs(), "headline refresh scheduled");
        self.refresh_timer = Some(RefreshTimer::start(interval, move |cancelled| {
            tracing::debug!("refreshing headlines");
            let articles = load_headlines(Some(&location), &config);
            if cancelled.is_cancelled() {
                return;
            }
            let _ = sender.send(TaskResult::HeadlinesLoaded { generation, articles });
            ctx.request_repaint();
        }));
    }

    fn process_tasks(&mut self) {
        while let Ok(result) = self.task_receiver.try_recv() {
            if !self.location_requests.is_current(result.generation()) {
                tracing::debug!(generation = result.generation(), "dropping stale task result");
                continue;
            }
            match result {
                TaskResult::LocationResolved { location, .. } => {
                    self.error = None;
                    self.on_location(Some(location));
                }
                TaskResult::LocationFailed { message, .. } => {
                    tracing::warn!(%message, "continuing without location");
                    self.error = Some(message);
                    self.on_location(None);
                }
                TaskResult::WeatherLoaded { data, .. } => self.weather = Some(data),
                TaskResult::HeadlinesLoaded { articles, .. } => {
                    tracing::info!(count = articles.len(), "headlines updated");
                    self.headlines = articles;
                }
            }
        }
    }

    /// Feed playback failures into failover and put the chosen stream on screen
    fn drive_playback(&mut self) {
        let Some(failover) = self.failover.as_mut() else {
            return;
        };
        if !drive_failover(&mut self.adapter, failover) {
            self.error = Some(ALL_FAILED_MESSAGE.to_string());
        }

        let current = self.adapter.current().map(|d| d.id().clone());
        if current != self.shown_stream {
            self.video.clear();
            self.shown_stream = current;
        }
        self.video.update(&self.ctx, self.adapter.take_frame());
    }

    fn is_ready(&self) -> bool {
        self.failover.is_some()
            && self.weather.is_some()
            && !self.headlines.is_empty()
            && !self.stocks.is_empty()
            && !self.travel_routes.is_empty()
    }

    fn show_loading(&self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space((ui.available_height() / 2.0 - 40.0).max(0.0));
                    ui.label(
                        egui::RichText::new("Loading TEEVO...")
                            .size(32.0)
                            .strong()
                            .color(egui::Color32::WHITE),
                    );
                    if let Some(ref error) = self.error {
                        ui.add_space(8.0);
                        ui.colored_label(ERROR_RED, error);
                    }
                });
            });
    }

    fn show_video(&mut self, ui: &mut egui::Ui) {
        let rect = ui.available_rect_before_wrap();
        ui.painter().rect_filled(rect, 0.0, egui::Color32::BLACK);

        let all_failed = self.failover.as_ref().is_some_and(|f| f.is_all_failed());
        if all_failed {
            widgets::video_message(ui, ALL_FAILED_MESSAGE, ERROR_RED, None);
            return;
        }

        let Some(descriptor) = self.adapter.current().cloned() else {
            return;
        };

        match descriptor.technology() {
            PlaybackTechnology::EmbeddedPlayer => {
                let source = self.adapter.embedded_source().unwrap_or_default();
                widgets::embedded_card(ui, descriptor.title(), &source);
            }
            PlaybackTechnology::AdaptiveStreaming => {
                let status = self.adapter.status().cloned();
                match status {
                    Some(SurfaceStatus::ClickToPlay) => {
                        let title = descriptor.title();
                        let play = Some("▶ Click to play");
                        if widgets::video_message(ui, title, egui::Color32::WHITE, play) {
                            self.adapter.click_to_play();
                        }
                    }
                    Some(SurfaceStatus::Unavailable(reason)) => {
                        widgets::video_message(ui, &reason, egui::Color32::YELLOW, None);
                    }
                    Some(SurfaceStatus::Failed(message)) => {
                        widgets::video_message(ui, &message, ERROR_RED, None);
                    }
                    Some(SurfaceStatus::Connecting) if !self.video.has_frame() => {
                        widgets::connecting(ui, descriptor.title());
                    }
                    _ => self.video.show(ui),
                }
                ui.ctx().request_repaint_after(Duration::from_millis(33));
            }
        }

        if let Some(article) = self.headlines.first() {
            widgets::headline_overlay(ui, rect, article);
        }
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        let mut save = false;

        egui::Window::new("⚙ Settings")
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Volume:");
                    if ui
                        .add(egui::Slider::new(&mut self.config.player_volume, 0.0..=1.0))
                        .changed()
                    {
                        self.adapter.set_volume(self.config.player_volume);
                        save = true;
                    }
                });

                if ui.checkbox(&mut self.config.dark_mode, "🌙 Dark theme").changed() {
                    self.apply_theme();
                    save = true;
                }

                ui.separator();
                ui.label(egui::RichText::new("Channels").strong());
                if let Some(failover) = self.failover.as_mut() {
                    let current = failover.current().map(|d| d.id().clone());
                    let entries: Vec<(StreamId, String, bool)> = failover
                        .catalog()
                        .iter()
                        .map(|d| {
                            let failed = failover.is_failed(d.id());
                            (d.id().clone(), d.title().to_string(), failed)
                        })
                        .collect();
                    for (id, title, failed) in entries {
                        let selected = current.as_ref() == Some(&id);
                        let label = if failed { format!("{} (offline)", title) } else { title };
                        let response = ui
                            .add_enabled_ui(!failed, |ui| ui.selectable_label(selected, label))
                            .inner;
                        if response.clicked() && !selected && failover.select(&id) {
                            tracing::info!(stream = %id, "channel selected");
                        }
                    }
                }

                ui.separator();
                ui.label(egui::RichText::new("Location override").strong());
                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.location_input)
                            .hint_text("latitude, longitude"),
                    );
                    if ui.button("Apply").clicked() {
                        let trimmed = self.location_input.trim();
                        let parsed = if trimmed.is_empty() {
                            Some(None)
                        } else {
                            ManualLocation::parse(trimmed).map(Some)
                        };
                        match parsed {
                            Some(manual) => {
                                self.location_input_error = false;
                                self.config.manual_location = manual;
                                save = true;
                                self.resolve_location();
                            }
                            None => self.location_input_error = true,
                        }
                    }
                });
                if self.location_input_error {
                    ui.colored_label(egui::Color32::RED, "Enter coordinates as: 43.65, -79.38");
                }
            });

        self.show_settings = open;
        if save {
            self.config.save();
        }
    }

    fn show_dashboard(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("alert_bar")
            .frame(egui::Frame::new())
            .show(ctx, |ui| widgets::alert_bar(ui, &self.alert));

        egui::TopBottomPanel::bottom("ticker")
            .frame(egui::Frame::new())
            .show(ctx, |ui| widgets::stock_ticker(ui, &self.stocks));

        egui::SidePanel::right("side_panel")
            .exact_width(ctx.available_rect().width() / 3.0)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("⚙").on_hover_text("Settings").clicked() {
                            self.show_settings = !self.show_settings;
                        }
                    });
                });
                widgets::clock(ui);
                ui.add_space(6.0);
                if let Some(ref weather) = self.weather {
                    widgets::weather_panel(ui, weather);
                }
                ui.add_space(6.0);
                egui::ScrollArea::vertical().show(ui, |ui| {
                    widgets::travel_panel(ui, &self.travel_routes, &self.cameras);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| self.show_video(ui));

        if self.show_settings {
            self.show_settings_window(ctx);
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background task results (non-blocking)
        self.process_tasks();
        self.drive_playback();

        if self.is_ready() {
            self.show_dashboard(ctx);
        } else {
            self.show_loading(ctx);
        }

        // Clock
        ctx.request_repaint_after(Duration::from_secs(1));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(mut timer) = self.refresh_timer.take() {
            timer.cancel();
        }
        self.adapter.teardown();
        tracing::info!("dashboard closed");
    }
}

impl Drop for DashboardApp {
    fn drop(&mut self) {
        if let Some(mut timer) = self.refresh_timer.take() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_location_request_supersedes_older() {
        let mut requests = RequestGeneration::default();
        let first = requests.next();
        assert!(requests.is_current(first));

        let second = requests.next();
        assert!(!requests.is_current(first));
        assert!(requests.is_current(second));
        assert_eq!(requests.current(), second);
    }

    #[test]
    fn test_results_carry_their_request_generation() {
        let mut requests = RequestGeneration::default();
        let stale = TaskResult::WeatherLoaded {
            generation: requests.next(),
            data: weather::fallback_for("Toronto"),
        };
        let fresh = TaskResult::HeadlinesLoaded {
            generation: requests.next(),
            articles: news::fallback_headlines(),
        };

        assert!(!requests.is_current(stale.generation()));
        assert!(requests.is_current(fresh.generation()));
    }
}
