//! Single-screen finder app: four labels, one button, two dialogs.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::presenter;
use location_core::RequestSnapshot;

pub struct FinderApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    snapshot: RequestSnapshot,
    denied_alert_open: bool,
    consent_prompt_open: bool,
    banner: Option<String>,
}

impl FinderApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            snapshot: RequestSnapshot::default(),
            denied_alert_open: false,
            consent_prompt_open: false,
            banner: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::SnapshotUpdated(snapshot) => self.snapshot = snapshot,
                UiEvent::PermissionDenied => self.denied_alert_open = true,
                UiEvent::ConsentPromptRequested => self.consent_prompt_open = true,
                UiEvent::BackendFailed(message) => self.banner = Some(message),
            }
        }
    }

    fn show_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.banner.clone() {
            ui.horizontal_wrapped(|ui| {
                ui.colored_label(egui::Color32::from_rgb(175, 96, 96), banner);
                if ui.small_button("Dismiss").clicked() {
                    self.banner = None;
                }
            });
            ui.separator();
        }
    }

    fn show_denied_alert(&mut self, ctx: &egui::Context) {
        if !self.denied_alert_open {
            return;
        }
        egui::Window::new("Ooops! Location Services Disabled")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(
                    "Please allow location access in this app's consent settings \
                     to find your location.",
                );
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    self.denied_alert_open = false;
                }
            });
    }

    fn show_consent_prompt(&mut self, ctx: &egui::Context) {
        if !self.consent_prompt_open {
            return;
        }
        egui::Window::new("Allow location access?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("Geofix uses your position once per request to look up the postal address.");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Allow").clicked() {
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::RespondToConsent { granted: true },
                            &mut self.banner,
                        );
                        self.consent_prompt_open = false;
                    }
                    if ui.button("Don't Allow").clicked() {
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::RespondToConsent { granted: false },
                            &mut self.banner,
                        );
                        self.consent_prompt_open = false;
                    }
                });
            });
    }
}

impl eframe::App for FinderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        let labels = presenter::labels(&self.snapshot);
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_banner(ui);

            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.heading(&labels.status);
                ui.add_space(16.0);

                egui::Grid::new("position_labels")
                    .num_columns(2)
                    .spacing([16.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Latitude:");
                        ui.monospace(&labels.latitude);
                        ui.end_row();
                        ui.label("Longitude:");
                        ui.monospace(&labels.longitude);
                        ui.end_row();
                    });

                ui.add_space(16.0);
                ui.label(&labels.address);
                ui.add_space(24.0);

                let button_text = if self.snapshot.is_requesting_position {
                    "Stop"
                } else {
                    "Find Location"
                };
                if ui
                    .add_sized([180.0, 36.0], egui::Button::new(button_text))
                    .clicked()
                {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::ToggleRequest,
                        &mut self.banner,
                    );
                }
            });
        });

        self.show_denied_alert(ctx);
        self.show_consent_prompt(ctx);

        // Backend events arrive off-frame; keep polling at a gentle rate.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
