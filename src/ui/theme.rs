use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

pub const ACCENT: Color32 = Color32::from_rgb(19, 152, 244);

/// Font family for filled Phosphor icons
pub fn phosphor_fill_family() -> FontFamily {
    FontFamily::Name("phosphor-fill".into())
}

pub fn setup_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    // Add Phosphor Regular icons as fallback in Proportional family
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);

    // Add Phosphor Fill as a separate font family for filled icons
    fonts.font_data.insert(
        "phosphor-fill".into(),
        egui_phosphor::Variant::Fill.font_data(),
    );
    fonts.families.insert(
        phosphor_fill_family(),
        vec!["phosphor-fill".into()],
    );

    ctx.set_fonts(fonts);
}

pub fn setup_theme(ctx: &egui::Context) {
    let mut style = Style::default();

    // Dark visuals with blue accents
    let mut visuals = Visuals::dark();

    // Background colors - pure black
    let bg = Color32::BLACK;
    visuals.panel_fill = bg;
    visuals.window_fill = bg;
    visuals.faint_bg_color = Color32::from_rgb(20, 20, 18);
    visuals.extreme_bg_color = bg;

    // Widget colors - warm grays (R=G > B for warmth)
    visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(40, 40, 38);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(176, 176, 168));

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(56, 56, 52);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(200, 200, 192));

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(80, 80, 74);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.widgets.active.bg_fill = ACCENT;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.selection.bg_fill = ACCENT;
    visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.hyperlink_color = ACCENT;

    // Rounded corners
    visuals.widgets.noninteractive.rounding = Rounding::same(6.0);
    visuals.widgets.inactive.rounding = Rounding::same(6.0);
    visuals.widgets.hovered.rounding = Rounding::same(6.0);
    visuals.widgets.active.rounding = Rounding::same(6.0);
    visuals.window_rounding = Rounding::same(8.0);

    style.visuals = visuals;

    // Font sizes - standardized at 14pt
    style.text_styles = [
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
    ]
    .into();

    style.spacing.item_spacing = egui::vec2(12.0, 10.0);
    style.spacing.button_padding = egui::vec2(18.0, 10.0);
    style.spacing.window_margin = egui::Margin::same(24.0);

    ctx.set_style(style);
}

/// Returns (grid_line, hour_line, label) colors for the availability grid
pub fn grid_colors() -> (Color32, Color32, Color32) {
    (
        Color32::from_rgb(0x24, 0x24, 0x22),
        Color32::from_rgb(0x40, 0x40, 0x3c),
        Color32::from_rgb(0x70, 0x70, 0x68),
    )
}

/// Returns (fill, border, text) for available blocks
pub fn block_colors() -> (Color32, Color32, Color32) {
    (
        Color32::from_rgb(0x0d, 0x3a, 0x5c),
        ACCENT,
        Color32::WHITE,
    )
}

/// Returns (fill, border) for the in-progress drag range
pub fn pending_colors(removing: bool) -> (Color32, Color32) {
    if removing {
        (
            Color32::from_rgba_unmultiplied(0xE0, 0x6C, 0x75, 70),
            Color32::from_rgba_unmultiplied(0xE0, 0x6C, 0x75, 160),
        )
    } else {
        (
            Color32::from_rgba_unmultiplied(0x61, 0xAF, 0xEF, 60),
            Color32::from_rgba_unmultiplied(0x61, 0xAF, 0xEF, 140),
        )
    }
}

/// Returns (bg_color, text_color) for button-like elements to ensure consistency
pub fn button_colors() -> (Color32, Color32) {
    (
        Color32::from_rgb(56, 56, 52),       // bg - warm gray
        Color32::from_rgb(200, 200, 192),    // text - warm gray
    )
}

/// Color for the unsaved changes marker and error text
pub fn warning_color() -> Color32 {
    Color32::from_rgb(0xE5, 0xC0, 0x7B)
}

pub fn error_color() -> Color32 {
    Color32::from_rgb(0xE0, 0x6C, 0x75)
}
