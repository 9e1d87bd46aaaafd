//! Bottom status bar: load progress, status text, and the data source.

use super::super::*;
use eframe::egui;

impl RepoGridApp {
    pub(crate) fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let progress = match self.blocks.last_row() {
                        Some(last_row) => format!("{} repositories", last_row),
                        None => format!("~{} repositories", self.blocks.row_count()),
                    };
                    ui.label(egui::RichText::new(progress).color(COLOR_TEXT_SECONDARY));
                    if self.blocks.is_loading() {
                        ui.separator();
                        ui.label(egui::RichText::new("Loading...").color(COLOR_TEXT_MUTED));
                    }
                    if !self.pending_cells.is_empty() {
                        ui.separator();
                        ui.label(egui::RichText::new("Saving...").color(COLOR_PENDING));
                    }
                    if self.blocks.has_failures() {
                        ui.separator();
                        ui.label(
                            egui::RichText::new("Some rows failed to load; scroll away and back to retry")
                                .color(COLOR_ERROR),
                        );
                    }
                    if let Some(status) = &self.status {
                        ui.separator();
                        ui.label(egui::RichText::new(&status.text).color(egui::Color32::YELLOW));
                    }
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!("Source: {}", self.source_label))
                            .small()
                            .color(COLOR_TEXT_SECONDARY),
                    );
                });
            });
    }
}
