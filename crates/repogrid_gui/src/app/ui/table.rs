//! Sortable, virtualized repository table with inline name editing.

use super::super::*;
use crate::app::blocks::BlockState;
use eframe::egui;
use repogrid_core::models::{Cursor, SortDirection};
use repogrid_core::REPOSITORY_COLUMNS;

const ROW_HEIGHT: f32 = 24.0;

fn column_width(col_id: &str) -> f32 {
    match col_id {
        "name" => 280.0,
        "is_fork" => 56.0,
        "stargazers" => 90.0,
        _ => 150.0,
    }
}

fn sort_marker(direction: Option<SortDirection>) -> &'static str {
    match direction {
        Some(SortDirection::Asc) => " ▲",
        Some(SortDirection::Desc) => " ▼",
        None => "",
    }
}

enum TableAction {
    Sort(&'static str),
    BeginEdit {
        cursor: Cursor,
        col_id: &'static str,
        current: String,
    },
    Commit,
    Cancel,
}

impl RepoGridApp {
    /// Renders the header row and the virtualized body, then applies the
    /// clicks collected while drawing.
    pub(crate) fn render_table(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for column in REPOSITORY_COLUMNS {
                    let width = column_width(column.id);
                    let title = format!(
                        "{}{}",
                        column.header,
                        sort_marker(self.sort_direction_for(column.id))
                    );
                    let text = egui::RichText::new(title).strong();
                    if column.sortable {
                        let response = ui.add_sized(
                            [width, ROW_HEIGHT],
                            egui::Button::new(text).frame(false),
                        );
                        if response.clicked() {
                            actions.push(TableAction::Sort(column.id));
                        }
                    } else {
                        ui.add_sized([width, ROW_HEIGHT], egui::Label::new(text));
                    }
                }
            });
            ui.separator();

            let row_count = self.blocks.row_count();
            let output = egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show_rows(ui, ROW_HEIGHT, row_count, |ui, range| {
                    for index in range.clone() {
                        self.render_row(ui, index, &mut actions);
                    }
                    range
                });
            self.visible_rows = output.inner;
        });

        for action in actions {
            match action {
                TableAction::Sort(col_id) => self.toggle_sort(col_id),
                TableAction::BeginEdit {
                    cursor,
                    col_id,
                    current,
                } => {
                    self.begin_edit(&cursor, col_id, &current);
                }
                TableAction::Commit => self.commit_edit(),
                TableAction::Cancel => self.cancel_edit(),
            }
        }
    }

    fn render_row(&mut self, ui: &mut egui::Ui, index: usize, actions: &mut Vec<TableAction>) {
        let Some(row) = self.blocks.row(index).cloned() else {
            let failed = matches!(
                self.blocks.state(index / self.blocks.block_size()),
                Some(BlockState::Failed { .. })
            );
            let (text, color) = if failed {
                ("Failed to load", COLOR_ERROR)
            } else {
                ("Loading...", COLOR_TEXT_MUTED)
            };
            ui.add_sized(
                [column_width("name"), ROW_HEIGHT],
                egui::Label::new(egui::RichText::new(text).color(color)),
            );
            return;
        };

        ui.horizontal(|ui| {
            for column in REPOSITORY_COLUMNS {
                let width = column_width(column.id);
                let editing_here = self
                    .editing
                    .as_ref()
                    .is_some_and(|editor| editor.cursor == row.cursor && editor.col_id == column.id);
                if editing_here {
                    if let Some(editor) = self.editing.as_mut() {
                        let response = ui.add_sized(
                            [width, ROW_HEIGHT],
                            egui::TextEdit::singleline(&mut editor.draft),
                        );
                        if !editor.focus_requested {
                            response.request_focus();
                            editor.focus_requested = true;
                        }
                        if ui.input(|input| input.key_pressed(egui::Key::Escape)) {
                            actions.push(TableAction::Cancel);
                        } else if response.lost_focus() {
                            if ui.input(|input| input.key_pressed(egui::Key::Enter)) {
                                actions.push(TableAction::Commit);
                            } else {
                                actions.push(TableAction::Cancel);
                            }
                        }
                    }
                    continue;
                }

                let text = row
                    .field(column.field)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let pending = column.editable && self.is_cell_pending(&row.cursor, column.id);
                let color = if pending {
                    COLOR_PENDING
                } else {
                    COLOR_TEXT_PRIMARY
                };
                let response = ui.add_sized(
                    [width, ROW_HEIGHT],
                    egui::Label::new(egui::RichText::new(text.as_str()).color(color))
                        .truncate()
                        .sense(egui::Sense::click()),
                );
                if column.editable && response.double_clicked() {
                    actions.push(TableAction::BeginEdit {
                        cursor: row.cursor.clone(),
                        col_id: column.id,
                        current: text,
                    });
                }
            }
        });
    }
}
