use chrono::Weekday;
use eframe::egui;
use egui::{Color32, Ui};

use crate::availability::{
    minutes_to_time, week_from, DragCommit, EditorSession, Geometry, ToggleMode,
};
use crate::config::ClockFormat;
use super::theme;

/// Height of one hour in the grid, in points
const HOUR_HEIGHT: f32 = 48.0;
const HOUR_LABEL_WIDTH: f32 = 60.0;
const HEADER_HEIGHT: f32 = 32.0;

/// Convert "HH:MM" (24h) to the configured clock format
pub fn format_clock_time(time_24: &str, clock_format: ClockFormat) -> String {
    match clock_format {
        ClockFormat::Hour24 => time_24.to_string(),
        ClockFormat::Hour12 => {
            let parts: Vec<&str> = time_24.split(':').collect();
            if parts.len() >= 2 {
                if let (Ok(h), Ok(m)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
                    let h = h % 24;
                    let (h12, suffix) = match h {
                        0 => (12, "am"),
                        1..=11 => (h, "am"),
                        12 => (12, "pm"),
                        _ => (h - 12, "pm"),
                    };
                    return if m == 0 {
                        format!("{}{}", h12, suffix)
                    } else {
                        format!("{}:{:02}{}", h12, m, suffix)
                    };
                }
            }
            time_24.to_string()
        }
    }
}

/// "6h 30m", "45m", "0"
pub fn format_duration_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, 0) => "0".to_string(),
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Rows get a time label on the hour. Slot lengths that do not divide an
/// hour never line up with it, so every row is labelled instead.
fn is_labelled_row(minute: u16, slot_minutes: u16) -> bool {
    if slot_minutes > 0 && 60 % slot_minutes == 0 {
        minute % 60 == 0
    } else {
        true
    }
}

fn short_day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Outcome of one frame of the grid
#[derive(Default)]
pub struct GridResult {
    pub committed: Option<DragCommit>,
    pub aborted: bool,
}

/// Render the weekly availability grid and feed pointer input into the session.
///
/// Press on a slot starts a drag, release commits it. Leaving the column,
/// Esc or a right-click abort it.
pub fn render_availability_grid(
    ui: &mut Ui,
    session: &mut EditorSession,
    week_start: Weekday,
    clock_format: ClockFormat,
    schedule_start_hour: u8,
    schedule_end_hour: u8,
) -> GridResult {
    let mut result = GridResult::default();
    let days = week_from(week_start);

    let slot_minutes = session.slot_minutes();
    let slot_height = HOUR_HEIGHT * slot_minutes as f32 / 60.0;
    let geometry = Geometry::new(slot_minutes, slot_height, schedule_start_hour, schedule_end_hour);

    let (grid_line_color, hour_line_color, label_color) = theme::grid_colors();

    let available_width = ui.available_width();
    let day_width = (available_width - HOUR_LABEL_WIDTH) / days.len() as f32;

    // Fixed day headers (outside ScrollArea)
    let (header_rect, _) = ui.allocate_exact_size(
        egui::vec2(available_width, HEADER_HEIGHT),
        egui::Sense::hover()
    );

    let painter = ui.painter();
    for (i, day) in days.iter().enumerate() {
        let x = header_rect.min.x + HOUR_LABEL_WIDTH + i as f32 * day_width;
        let text_y = header_rect.center().y;

        let minutes = session.slots().day_len(*day) as u32 * slot_minutes as u32;
        let day_galley = painter.layout_no_wrap(
            short_day_name(*day).to_string(),
            egui::FontId::proportional(14.0),
            Color32::from_rgb(0xb0, 0xb0, 0xa8),
        );
        let day_width_px = day_galley.rect.width();
        painter.galley(
            egui::pos2(x + 8.0, text_y - day_galley.rect.height() / 2.0),
            day_galley,
            Color32::WHITE,
        );

        let total_color = if minutes > 0 { Color32::WHITE } else { label_color };
        painter.text(
            egui::pos2(x + 8.0 + day_width_px + 8.0, text_y),
            egui::Align2::LEFT_CENTER,
            format_duration_minutes(minutes),
            egui::FontId::proportional(14.0),
            total_color,
        );

        if i > 0 {
            painter.line_segment(
                [
                    egui::pos2(x, header_rect.min.y + 4.0),
                    egui::pos2(x, header_rect.max.y - 4.0),
                ],
                egui::Stroke::new(1.0, hour_line_color),
            );
        }
    }

    egui::ScrollArea::vertical()
        .drag_to_scroll(false)
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            let (grid_rect, _) = ui.allocate_exact_size(
                egui::vec2(available_width, geometry.total_height()),
                egui::Sense::hover()
            );
            let column_rect = |index: usize| {
                egui::Rect::from_min_size(
                    egui::pos2(grid_rect.min.x + HOUR_LABEL_WIDTH + index as f32 * day_width, grid_rect.min.y),
                    egui::vec2(day_width, geometry.total_height()),
                )
            };

            let painter = ui.painter();

            // Vertical grid lines for columns, plus the right edge
            for i in 0..=days.len() {
                let x = grid_rect.min.x + HOUR_LABEL_WIDTH + i as f32 * day_width;
                painter.line_segment(
                    [egui::pos2(x, grid_rect.min.y), egui::pos2(x, grid_rect.max.y)],
                    egui::Stroke::new(1.0, hour_line_color),
                );
            }

            // Slot lines, heavier where labelled
            for row in 0..=geometry.visible_slots() {
                let minute = geometry.start_minute() + row * slot_minutes;
                let y = grid_rect.min.y + row as f32 * slot_height;
                let labelled = is_labelled_row(minute, slot_minutes);

                if labelled && row < geometry.visible_slots() {
                    painter.text(
                        egui::pos2(grid_rect.min.x + HOUR_LABEL_WIDTH - 8.0, y),
                        egui::Align2::RIGHT_TOP,
                        format_clock_time(&minutes_to_time(minute), clock_format),
                        egui::FontId::proportional(11.0),
                        label_color,
                    );
                }

                // Skip sub-hour lines when slots are too thin to separate
                if labelled || slot_height >= 8.0 {
                    painter.line_segment(
                        [
                            egui::pos2(grid_rect.min.x + HOUR_LABEL_WIDTH, y),
                            egui::pos2(grid_rect.max.x, y),
                        ],
                        egui::Stroke::new(1.0, if labelled { hour_line_color } else { grid_line_color }),
                    );
                }
            }

            // Available blocks
            let (block_fill, block_border, block_text) = theme::block_colors();
            for (i, day) in days.iter().enumerate() {
                let col = column_rect(i);
                for block in session.blocks(*day) {
                    let y0 = col.min.y + geometry.minutes_to_pixels(block.start);
                    let y1 = col.min.y + geometry.minutes_to_pixels(block.end);
                    if y1 - y0 < 1.0 {
                        continue; // outside the visible hours
                    }

                    let block_rect = egui::Rect::from_min_max(
                        egui::pos2(col.min.x + 3.0, y0 + 1.0),
                        egui::pos2(col.max.x - 3.0, y1 - 1.0),
                    );
                    painter.rect(block_rect, 4.0, block_fill, egui::Stroke::new(1.0, block_border));

                    if block_rect.height() >= 18.0 {
                        let label = format!(
                            "{} – {}",
                            format_clock_time(&block.start_time(), clock_format),
                            format_clock_time(&block.end_time(), clock_format),
                        );
                        painter.text(
                            block_rect.left_top() + egui::vec2(6.0, 3.0),
                            egui::Align2::LEFT_TOP,
                            label,
                            egui::FontId::proportional(12.0),
                            block_text,
                        );
                    }
                }
            }

            // Pending drag range preview
            if let Some(pending) = session.pending() {
                if let Some(i) = days.iter().position(|d| *d == pending.day) {
                    let col = column_rect(i);
                    let y0 = col.min.y + geometry.slot_top(pending.first);
                    let y1 = col.min.y + geometry.slot_top(pending.last + 1);
                    let removing = pending.mode == ToggleMode::Remove;
                    let (fill, border) = theme::pending_colors(removing);
                    let preview = egui::Rect::from_min_max(
                        egui::pos2(col.min.x + 2.0, y0),
                        egui::pos2(col.max.x - 2.0, y1.max(y0 + 2.0)),
                    );
                    painter.rect(preview, 4.0, fill, egui::Stroke::new(1.0, border));

                    let start = session.slots().slot_start(pending.first);
                    let end = session.slots().slot_start(pending.last + 1);
                    let verb = if removing { "Remove" } else { "Add" };
                    painter.text(
                        preview.center(),
                        egui::Align2::CENTER_CENTER,
                        format!(
                            "{} {} – {}",
                            verb,
                            format_clock_time(&minutes_to_time(start), clock_format),
                            format_clock_time(&minutes_to_time(end), clock_format),
                        ),
                        egui::FontId::proportional(13.0),
                        Color32::from_rgba_unmultiplied(255, 255, 255, 200),
                    );
                }
            }

            // Pointer handling
            let (pressed, released, cancel, pointer_pos) = ui.ctx().input(|i| {
                (
                    i.pointer.button_pressed(egui::PointerButton::Primary),
                    i.pointer.button_released(egui::PointerButton::Primary),
                    i.key_pressed(egui::Key::Escape)
                        || i.pointer.button_pressed(egui::PointerButton::Secondary),
                    i.pointer.latest_pos(),
                )
            });

            let hovered_column = pointer_pos.and_then(|pos| {
                (0..days.len()).find(|&i| ui.rect_contains_pointer(column_rect(i)) && column_rect(i).contains(pos))
            });
            let slot_under = |pos: egui::Pos2| geometry.slot_at(pos.y - grid_rect.min.y);

            if cancel && session.cancel_drag() {
                result.aborted = true;
            }

            if let Some(pending) = session.pending() {
                let anchor_column = days.iter().position(|d| *d == pending.day);
                match (pointer_pos, hovered_column) {
                    (Some(pos), Some(i)) if Some(i) == anchor_column => {
                        session.pointer_move(pending.day, slot_under(pos));
                    }
                    _ => {
                        if session.pointer_leave(pending.day) {
                            result.aborted = true;
                        }
                    }
                }
            } else if pressed {
                if let (Some(pos), Some(i)) = (pointer_pos, hovered_column) {
                    session.pointer_down(days[i], slot_under(pos));
                }
            }

            if released {
                result.committed = session.pointer_up();
            }

            if hovered_column.is_some() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
            }
        });

    result
}
