use eframe::egui;
use egui::{Color32, RichText};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

use crate::api::{is_network_error, ScheduleClient, WeeklySchedule};
use crate::availability::{
    validate_slot_minutes, EditorSession, MAX_SLOT_MINUTES, MIN_SLOT_MINUTES,
};
use crate::config::{ClockFormat, Config, WeekStart};
use super::theme;
use super::views;

pub struct AvailabilityApp {
    config: Config,
    state: AppState,

    // Editing session, present once the schedule has been fetched
    session: Option<EditorSession>,
    load_state: LoadState,

    // Booking rules being edited in the toolbar
    rules_buffer: u16,
    rules_advance: u16,

    // Settings dialog
    show_settings: bool,
    settings_base_url: String,
    settings_partner_id: String,
    settings_token: String,
    settings_slot_duration: u16,
    settings_week_start: WeekStart,
    settings_clock_format: ClockFormat,
    settings_start_hour: u8,
    settings_end_hour: u8,
    settings_error: Option<String>,

    // Status
    status_message: Option<(String, bool)>, // (message, is_error)
    is_offline: bool,

    // Async communication
    runtime: tokio::runtime::Runtime,
    result_rx: Receiver<AsyncResult>,
    result_tx: Sender<AsyncResult>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AppState {
    Setup,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

enum AsyncResult {
    ScheduleLoaded(String, Option<WeeklySchedule>),  // (partner_id, schedule)
    ScheduleSaved(String),                            // partner_id
    LoadFailed(String, String, bool),                 // (partner_id, message, offline)
    SaveFailed(String, String, bool),                 // (partner_id, message, offline)
}

impl AvailabilityApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load config, using defaults");
            Config::default()
        });
        super::setup_fonts(&cc.egui_ctx);
        super::setup_theme(&cc.egui_ctx);
        let state = if config.is_configured() {
            AppState::Main
        } else {
            AppState::Setup
        };

        let runtime = tokio::runtime::Runtime::new()?;
        let (result_tx, result_rx) = channel();

        let mut app = Self {
            rules_buffer: config.buffer_time_minutes,
            rules_advance: config.max_advance_booking_days,
            show_settings: false,
            settings_base_url: config.api_base_url.clone(),
            settings_partner_id: config.partner_id.clone(),
            settings_token: String::new(),
            settings_slot_duration: config.slot_duration_minutes,
            settings_week_start: config.week_start,
            settings_clock_format: config.clock_format,
            settings_start_hour: config.schedule_start_hour,
            settings_end_hour: config.schedule_end_hour,
            settings_error: None,
            config,
            state,
            session: None,
            load_state: LoadState::NotLoaded,
            status_message: None,
            is_offline: false,
            runtime,
            result_rx,
            result_tx,
        };

        if state == AppState::Main {
            app.load_schedule();
        }

        Ok(app)
    }

    fn check_async_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            match result {
                AsyncResult::ScheduleLoaded(partner_id, schedule) => {
                    if partner_id != self.config.partner_id {
                        continue; // stale response for a previous partner
                    }
                    let session = EditorSession::load(
                        partner_id,
                        schedule.as_ref(),
                        &self.config.schedule_settings(),
                    );
                    self.rules_buffer = session.settings().buffer_time_minutes;
                    self.rules_advance = session.settings().max_advance_booking_days;
                    if schedule.is_none() {
                        self.status_message = Some(("No availability set up yet - drag on the grid to add some".to_string(), false));
                    } else {
                        self.status_message = None;
                    }
                    self.session = Some(session);
                    self.load_state = LoadState::Loaded;
                    self.is_offline = false;
                }
                AsyncResult::LoadFailed(partner_id, msg, offline) => {
                    if partner_id != self.config.partner_id {
                        continue;
                    }
                    self.load_state = LoadState::Failed;
                    self.is_offline = offline;
                    self.status_message = Some((msg, true));
                }
                AsyncResult::ScheduleSaved(partner_id) => {
                    if let Some(session) = self.session.as_mut().filter(|s| s.partner_id() == partner_id) {
                        session.finish_save(true);
                        self.is_offline = false;
                        self.status_message = Some(("Availability saved".to_string(), false));
                    }
                }
                AsyncResult::SaveFailed(partner_id, msg, offline) => {
                    if let Some(session) = self.session.as_mut().filter(|s| s.partner_id() == partner_id) {
                        session.finish_save(false);
                        self.is_offline = offline;
                        self.status_message = Some((msg, true));
                    }
                }
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.load_state == LoadState::Loading
            || self.session.as_ref().map(|s| s.is_saving()).unwrap_or(false)
    }

    /// Fetch the partner's schedule and start a fresh session from it.
    /// Any unsaved edits are dropped.
    fn load_schedule(&mut self) {
        if !self.config.is_configured() || self.is_busy() {
            return;
        }

        self.load_state = LoadState::Loading;
        self.session = None;
        self.status_message = None;

        let config = self.config.clone();
        let partner_id = self.config.partner_id.clone();
        let tx = self.result_tx.clone();

        self.runtime.spawn(async move {
            let result = async {
                let client = ScheduleClient::new(&config)?;
                client.fetch_weekly_schedule(&partner_id).await
            }.await;

            let message = match result {
                Ok(schedule) => AsyncResult::ScheduleLoaded(partner_id, schedule),
                Err(e) => {
                    tracing::error!(error = %format!("{:#}", e), "failed to load schedule");
                    let offline = is_network_error(&e);
                    AsyncResult::LoadFailed(partner_id, format!("Could not load availability: {}", e), offline)
                }
            };
            let _ = tx.send(message);
        });
    }

    fn save_schedule(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.set_booking_rules(self.rules_buffer, self.rules_advance);
        let Some(schedule) = session.begin_save() else {
            return;
        };

        let config = self.config.clone();
        let partner_id = session.partner_id().to_string();
        let tx = self.result_tx.clone();
        self.status_message = None;

        self.runtime.spawn(async move {
            let result = async {
                let client = ScheduleClient::new(&config)?;
                client.save_weekly_schedule(&partner_id, &schedule).await
            }.await;

            let message = match result {
                Ok(()) => AsyncResult::ScheduleSaved(partner_id),
                Err(e) => {
                    tracing::error!(error = %format!("{:#}", e), "failed to save schedule");
                    let offline = is_network_error(&e);
                    AsyncResult::SaveFailed(partner_id, format!("Save failed: {}", e), offline)
                }
            };
            let _ = tx.send(message);
        });
    }

    fn open_settings(&mut self) {
        self.settings_base_url = self.config.api_base_url.clone();
        self.settings_partner_id = self.config.partner_id.clone();
        self.settings_token = String::new();
        self.settings_slot_duration = self.config.slot_duration_minutes;
        self.settings_week_start = self.config.week_start;
        self.settings_clock_format = self.config.clock_format;
        self.settings_start_hour = self.config.schedule_start_hour;
        self.settings_end_hour = self.config.schedule_end_hour;
        self.settings_error = None;
        self.show_settings = true;
    }

    fn save_settings(&mut self) {
        if let Err(e) = validate_slot_minutes(self.settings_slot_duration) {
            self.settings_error = Some(e.to_string());
            return;
        }
        if self.settings_start_hour >= self.settings_end_hour {
            self.settings_error = Some("Visible hours must end after they start".to_string());
            return;
        }

        let previous = self.config.clone();
        self.config.api_base_url = self.settings_base_url.trim().to_string();
        self.config.partner_id = self.settings_partner_id.trim().to_string();
        if !self.settings_token.trim().is_empty() {
            self.config.api_token = Some(self.settings_token.trim().to_string());
        }
        self.config.slot_duration_minutes = self.settings_slot_duration;
        self.config.week_start = self.settings_week_start;
        self.config.clock_format = self.settings_clock_format;
        self.config.schedule_start_hour = self.settings_start_hour;
        self.config.schedule_end_hour = self.settings_end_hour;

        if let Err(e) = self.config.save() {
            tracing::error!(error = %e, "failed to save config");
            self.status_message = Some((format!("Failed to save settings: {}", e), true));
        }

        self.settings_error = None;
        self.show_settings = false;

        if !self.config.is_configured() {
            self.state = AppState::Setup;
            return;
        }
        self.state = AppState::Main;

        // A different backend or partner means a different schedule. A new
        // slot duration only applies to partners without a stored schedule,
        // so it is picked up on the next load as well.
        let needs_reload = self.session.is_none()
            || previous.api_base_url != self.config.api_base_url
            || previous.partner_id != self.config.partner_id
            || previous.api_token != self.config.api_token
            || previous.slot_duration_minutes != self.config.slot_duration_minutes;
        if needs_reload {
            self.load_schedule();
        }
    }

    fn render_setup(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Slotboard setup");
            ui.add_space(20.0);
            ui.label("Connect to the partner API to edit your weekly availability.");
            ui.add_space(20.0);
        });

        egui::Grid::new("setup_grid")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label("API URL:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.settings_base_url)
                        .hint_text("api.example.com/v1")
                        .desired_width(350.0)
                );
                ui.end_row();

                ui.label("Partner ID:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.settings_partner_id)
                        .desired_width(350.0)
                );
                ui.end_row();

                ui.label("API Token:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.settings_token)
                        .password(true)
                        .hint_text("Paste your API token here")
                        .desired_width(350.0)
                );
                ui.end_row();
            });

        ui.add_space(20.0);

        if let Some(err) = &self.settings_error {
            ui.label(RichText::new(err).color(theme::error_color()));
        }

        if ui.button("Save and connect").clicked() {
            self.save_settings();
        }
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        let (button_bg, button_text) = theme::button_colors();
        let saving = self.session.as_ref().map(|s| s.is_saving()).unwrap_or(false);
        let unsaved = self.session.as_ref().map(|s| s.has_unsaved_changes()).unwrap_or(false);

        ui.horizontal(|ui| {
            ui.label(RichText::new("Weekly availability").heading().color(Color32::WHITE));
            ui.label(RichText::new(&self.config.partner_id).color(button_text));

            if unsaved {
                ui.label(
                    RichText::new(egui_phosphor::fill::CIRCLE)
                        .family(theme::phosphor_fill_family())
                        .size(10.0)
                        .color(theme::warning_color()),
                );
                ui.label(RichText::new("Unsaved changes").color(theme::warning_color()));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let settings_icon = egui_phosphor::regular::FADERS_HORIZONTAL;
                if ui.add(egui::Button::new(RichText::new(settings_icon).color(button_text)).fill(button_bg))
                    .on_hover_text("Settings")
                    .clicked()
                {
                    self.open_settings();
                }

                let save_label = if saving {
                    format!("{} Saving...", egui_phosphor::regular::SPINNER)
                } else {
                    format!("{} Save", egui_phosphor::regular::FLOPPY_DISK)
                };
                let can_save = self.session.is_some() && !saving;
                if ui.add_enabled(can_save, egui::Button::new(save_label).fill(theme::ACCENT)).clicked() {
                    self.save_schedule();
                }

                let reload_label = if unsaved {
                    format!("{} Discard changes", egui_phosphor::regular::ARROW_COUNTER_CLOCKWISE)
                } else {
                    format!("{} Reload", egui_phosphor::regular::ARROW_CLOCKWISE)
                };
                if ui.add_enabled(!self.is_busy(), egui::Button::new(reload_label).fill(button_bg)).clicked() {
                    self.load_schedule();
                }

                if let Some(session) = self.session.as_mut() {
                    render_booking_rules(ui, session, &mut self.rules_buffer, &mut self.rules_advance);
                }
            });
        });

        if self.is_offline {
            ui.label(RichText::new(format!("{} Offline - check your connection", egui_phosphor::regular::WIFI_SLASH))
                .color(theme::warning_color()));
        } else if let Some((msg, is_error)) = &self.status_message {
            let color = if *is_error { theme::error_color() } else { button_text };
            ui.label(RichText::new(msg).color(color));
        }
    }

    fn render_main(&mut self, ui: &mut egui::Ui) {
        self.render_toolbar(ui);
        ui.add_space(4.0);

        match self.load_state {
            LoadState::Loading | LoadState::NotLoaded => {
                ui.vertical_centered(|ui| {
                    ui.add_space(60.0);
                    ui.spinner();
                    ui.label("Loading availability...");
                });
            }
            LoadState::Failed => {
                // Keep the grid hidden: a blank grid here could be saved over real data
                ui.vertical_centered(|ui| {
                    ui.add_space(60.0);
                    ui.label("Availability could not be loaded.");
                    if ui.button("Retry").clicked() {
                        self.load_schedule();
                    }
                });
            }
            LoadState::Loaded => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                let result = views::render_availability_grid(
                    ui,
                    session,
                    self.config.week_start.weekday(),
                    self.config.clock_format,
                    self.config.schedule_start_hour,
                    self.config.schedule_end_hour,
                );
                if let Some(commit) = result.committed {
                    tracing::debug!(changed = commit.changed, "grid edit committed");
                } else if result.aborted {
                    tracing::debug!("grid drag aborted");
                }
            }
        }
    }

    fn render_settings(&mut self, ctx: &egui::Context) {
        let section_color = Color32::from_rgb(140, 140, 160);
        let mut open = self.show_settings;
        let mut save_clicked = false;
        let mut cancel_clicked = false;

        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(RichText::new("Connection").color(section_color).strong());
                ui.add_space(8.0);
                egui::Grid::new("connection_grid")
                    .num_columns(2)
                    .spacing([20.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("API URL");
                        ui.add(egui::TextEdit::singleline(&mut self.settings_base_url)
                            .desired_width(350.0));
                        ui.end_row();

                        ui.label("Partner ID");
                        ui.add(egui::TextEdit::singleline(&mut self.settings_partner_id)
                            .desired_width(350.0));
                        ui.end_row();

                        ui.label("API token");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.settings_token)
                                .password(true)
                                .hint_text("Leave blank to keep existing")
                                .desired_width(350.0)
                        );
                        ui.end_row();
                    });

                ui.add_space(14.0);
                ui.label(RichText::new("Schedule").color(section_color).strong());
                ui.add_space(8.0);
                egui::Grid::new("schedule_grid")
                    .num_columns(2)
                    .spacing([20.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("Slot length");
                        ui.add(egui::DragValue::new(&mut self.settings_slot_duration)
                            .range(MIN_SLOT_MINUTES..=MAX_SLOT_MINUTES)
                            .suffix(" min"));
                        ui.end_row();

                        ui.label("Week starts on");
                        ui.horizontal(|ui| {
                            ui.selectable_value(&mut self.settings_week_start, WeekStart::Monday, "Monday");
                            ui.selectable_value(&mut self.settings_week_start, WeekStart::Sunday, "Sunday");
                        });
                        ui.end_row();

                        ui.label("Clock");
                        ui.horizontal(|ui| {
                            ui.selectable_value(&mut self.settings_clock_format, ClockFormat::Hour24, "14:30");
                            ui.selectable_value(&mut self.settings_clock_format, ClockFormat::Hour12, "2:30pm");
                        });
                        ui.end_row();

                        ui.label("Visible hours");
                        ui.horizontal(|ui| {
                            ui.add(egui::DragValue::new(&mut self.settings_start_hour).range(0..=23));
                            ui.label("to");
                            ui.add(egui::DragValue::new(&mut self.settings_end_hour).range(1..=24));
                        });
                        ui.end_row();
                    });

                if self.session.as_ref().map(|s| s.has_unsaved_changes()).unwrap_or(false) {
                    ui.add_space(8.0);
                    ui.label(RichText::new("Changing the connection or slot length discards unsaved edits.")
                        .color(theme::warning_color()));
                }
                if let Some(err) = &self.settings_error {
                    ui.add_space(8.0);
                    ui.label(RichText::new(err).color(theme::error_color()));
                }

                ui.add_space(14.0);
                ui.horizontal(|ui| {
                    if ui.add_enabled(!self.is_busy(), egui::Button::new("Save")).clicked() {
                        save_clicked = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel_clicked = true;
                    }
                });
            });

        self.show_settings = open && !cancel_clicked;
        if save_clicked {
            self.save_settings();
        }
    }
}

/// Buffer and booking horizon inputs, written back to the session.
///
/// Values loaded from a stored schedule may lie outside the ranges offered
/// here; they are shown as they are and only clamped once the user edits.
fn render_booking_rules(ui: &mut egui::Ui, session: &mut EditorSession, buffer: &mut u16, advance: &mut u16) {
    let enabled = !session.is_saving();
    ui.add_enabled(
        enabled,
        egui::DragValue::new(advance)
            .range(1..=365)
            .clamp_existing_to_range(false)
            .suffix(" days ahead"),
    );
    ui.add_enabled(
        enabled,
        egui::DragValue::new(buffer)
            .range(0..=240)
            .clamp_existing_to_range(false)
            .suffix(" min buffer"),
    );

    if enabled {
        session.set_booking_rules(*buffer, *advance);
    }
}

impl eframe::App for AvailabilityApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle pinch-to-zoom (trackpad pinch or Ctrl+scroll)
        let zoom_delta = ctx.input(|i| i.zoom_delta());
        if zoom_delta != 1.0 {
            self.config.font_scale = (self.config.font_scale * zoom_delta).clamp(0.75, 2.5);
            if (zoom_delta - 1.0).abs() > 0.01 {
                if let Err(e) = self.config.save() {
                    tracing::warn!(error = %e, "failed to persist zoom level");
                }
            }
        }
        ctx.set_pixels_per_point(self.config.font_scale);

        self.check_async_results();

        // Keep polling the channel while requests are running
        if self.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            match self.state {
                AppState::Setup => self.render_setup(ui),
                AppState::Main => self.render_main(ui),
            }
        });

        if self.show_settings {
            self.render_settings(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::ScheduleSettings;

    fn stored_schedule(buffer: u16, advance: u16) -> WeeklySchedule {
        WeeklySchedule {
            partner_id: "p-1".to_string(),
            schedule: Vec::new(),
            slot_duration_minutes: 30,
            buffer_time_minutes: buffer,
            max_advance_booking_days: advance,
        }
    }

    fn run_booking_rules(session: &mut EditorSession, buffer: &mut u16, advance: &mut u16) {
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                render_booking_rules(ui, session, buffer, advance);
            });
        });
    }

    fn loading_app(partner_id: &str) -> AvailabilityApp {
        let config = Config {
            api_base_url: "api.example.com".to_string(),
            partner_id: partner_id.to_string(),
            api_token: Some("secret".to_string()),
            ..Config::default()
        };
        let (result_tx, result_rx) = channel();
        AvailabilityApp {
            rules_buffer: 0,
            rules_advance: 30,
            show_settings: false,
            settings_base_url: String::new(),
            settings_partner_id: String::new(),
            settings_token: String::new(),
            settings_slot_duration: 30,
            settings_week_start: WeekStart::Monday,
            settings_clock_format: ClockFormat::Hour24,
            settings_start_hour: 6,
            settings_end_hour: 22,
            settings_error: None,
            config,
            state: AppState::Main,
            session: None,
            load_state: LoadState::Loading,
            status_message: None,
            is_offline: false,
            runtime: tokio::runtime::Runtime::new().unwrap(),
            result_rx,
            result_tx,
        }
    }

    #[test]
    fn load_failure_for_another_partner_is_ignored() {
        let mut app = loading_app("p-2");
        app.result_tx
            .send(AsyncResult::LoadFailed("p-1".to_string(), "boom".to_string(), true))
            .unwrap();
        app.check_async_results();
        assert_eq!(app.load_state, LoadState::Loading);
        assert!(!app.is_offline);
        assert!(app.status_message.is_none());

        app.result_tx
            .send(AsyncResult::LoadFailed("p-2".to_string(), "boom".to_string(), false))
            .unwrap();
        app.check_async_results();
        assert_eq!(app.load_state, LoadState::Failed);
        assert_eq!(app.status_message, Some(("boom".to_string(), true)));
    }

    #[test]
    fn out_of_range_stored_rules_survive_first_paint() {
        let schedule = stored_schedule(480, 0);
        let mut session = EditorSession::load("p-1", Some(&schedule), &ScheduleSettings::default());
        let mut buffer = session.settings().buffer_time_minutes;
        let mut advance = session.settings().max_advance_booking_days;

        run_booking_rules(&mut session, &mut buffer, &mut advance);

        assert!(!session.has_unsaved_changes());
        assert_eq!((buffer, advance), (480, 0));
        assert_eq!(session.settings().buffer_time_minutes, 480);
        assert_eq!(session.settings().max_advance_booking_days, 0);
    }

    #[test]
    fn edited_rules_reach_the_session() {
        let schedule = stored_schedule(15, 60);
        let mut session = EditorSession::load("p-1", Some(&schedule), &ScheduleSettings::default());
        let mut buffer = 30;
        let mut advance = 60;

        run_booking_rules(&mut session, &mut buffer, &mut advance);

        assert!(session.has_unsaved_changes());
        assert_eq!(session.settings().buffer_time_minutes, 30);
    }
}
