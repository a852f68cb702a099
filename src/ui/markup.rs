//! Lays out popover bodies for display.

use crate::popover::PopoverContent;
use eframe::egui::{self, Color32};
use eframe::epaint::text::{LayoutJob, TextFormat};

/// Builds a `LayoutJob` for a parsed popover body.
///
/// Bold runs use the strong text color (the default fonts carry no bold face),
/// italic runs are slanted.
///
/// # Arguments
///
/// * `content` - The parsed popover body
/// * `font_id` - The font to use for rendering
/// * `dark_mode` - Whether dark visuals are active
pub fn popover_layout(content: &PopoverContent, font_id: egui::FontId, dark_mode: bool) -> LayoutJob {
    let (text_color, strong_color) = if dark_mode {
        (Color32::from_gray(210), Color32::WHITE)
    } else {
        (Color32::from_gray(60), Color32::BLACK)
    };

    let mut job = LayoutJob::default();
    for span in content.spans() {
        let color = if span.bold { strong_color } else { text_color };
        let mut format = TextFormat::simple(font_id.clone(), color);
        format.italics = span.italic;
        job.append(&span.text, 0.0, format);
    }
    job
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasis_maps_to_formats() {
        let content = PopoverContent::parse_markup("<b>St. Gallen</b> <i>SG</i>");
        let job = popover_layout(&content, egui::FontId::proportional(14.0), true);
        assert_eq!(job.text, "St. Gallen SG");
        let bold = &job.sections[0];
        assert_eq!(bold.format.color, Color32::WHITE);
        assert!(!bold.format.italics);
        let italic = job.sections.last().expect("sections");
        assert!(italic.format.italics);
        assert_eq!(italic.format.color, Color32::from_gray(210));
    }

    #[test]
    fn plain_label_is_one_section() {
        let job = popover_layout(
            &PopoverContent::plain("Bern"),
            egui::FontId::proportional(14.0),
            false,
        );
        assert_eq!(job.text, "Bern");
        assert_eq!(job.sections.len(), 1);
    }
}
