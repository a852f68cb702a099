//! Anchored popover widget and the presenter that keeps at most one of them alive.
//!
//! The popover body can hold a small markup subset when `html` is enabled:
//! `<b>`/`<strong>`, `<i>`/`<em>`, `<br>`, paragraph breaks and character entities.
//! Unknown tags are dropped and their text kept.

use crate::types::Coordinate;
use eframe::egui;

/// Side of the anchor on which the popover opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Above the anchor
    #[default]
    Top,
    /// Below the anchor
    Bottom,
    /// Left of the anchor
    Left,
    /// Right of the anchor
    Right,
}

impl Placement {
    /// Which point of the popover frame is pinned to the anchor.
    pub fn pivot(self) -> egui::Align2 {
        match self {
            Placement::Top => egui::Align2::CENTER_BOTTOM,
            Placement::Bottom => egui::Align2::CENTER_TOP,
            Placement::Left => egui::Align2::RIGHT_CENTER,
            Placement::Right => egui::Align2::LEFT_CENTER,
        }
    }

    /// Unit direction from the anchor towards the popover.
    pub fn direction(self) -> egui::Vec2 {
        match self {
            Placement::Top => egui::vec2(0.0, -1.0),
            Placement::Bottom => egui::vec2(0.0, 1.0),
            Placement::Left => egui::vec2(-1.0, 0.0),
            Placement::Right => egui::vec2(1.0, 0.0),
        }
    }
}

/// Construction options of a popover.
#[derive(Debug, Clone, PartialEq)]
pub struct PopoverOptions {
    /// Where the popover opens relative to its anchor
    pub placement: Placement,
    /// Whether `content` is parsed as markup
    pub html: bool,
    /// Body text
    pub content: String,
}

/// A run of text with uniform emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    /// The text, may contain `\n`
    pub text: String,
    /// Strong emphasis
    pub bold: bool,
    /// Italic emphasis
    pub italic: bool,
}

/// Parsed popover body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopoverContent {
    spans: Vec<TextSpan>,
}

impl PopoverContent {
    /// Literal text, no markup interpretation.
    pub fn plain(text: &str) -> Self {
        let mut content = Self::default();
        content.push(text, false, false);
        content
    }

    /// Parses the markup subset.
    pub fn parse_markup(source: &str) -> Self {
        let mut content = Self::default();
        let (mut bold, mut italic) = (0usize, 0usize);
        let mut rest = source;
        while !rest.is_empty() {
            let Some(open) = rest.find('<') else {
                content.push(&decode_entities(rest), bold > 0, italic > 0);
                break;
            };
            content.push(&decode_entities(&rest[..open]), bold > 0, italic > 0);
            let after = &rest[open..];
            let Some(close) = after.find('>') else {
                content.push(&decode_entities(after), bold > 0, italic > 0);
                break;
            };
            let tag = after[1..close].trim();
            let closing = tag.starts_with('/');
            let name = tag
                .trim_start_matches('/')
                .trim_end_matches('/')
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            match (name.as_str(), closing) {
                ("b" | "strong", false) => bold += 1,
                ("b" | "strong", true) => bold = bold.saturating_sub(1),
                ("i" | "em", false) => italic += 1,
                ("i" | "em", true) => italic = italic.saturating_sub(1),
                ("br", _) => content.push("\n", bold > 0, italic > 0),
                ("p" | "div", true) => content.push("\n", bold > 0, italic > 0),
                _ => {}
            }
            rest = &after[close + 1..];
        }
        content.trim_trailing_newlines();
        content
    }

    /// Parses `content` as markup when `html` is set, else keeps it literal.
    pub fn from_options(options: &PopoverOptions) -> Self {
        if options.html {
            Self::parse_markup(&options.content)
        } else {
            Self::plain(&options.content)
        }
    }

    /// Styled runs in reading order.
    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    /// The text without styling.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    fn push(&mut self, text: &str, bold: bool, italic: bool) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.bold == bold && last.italic == italic => last.text.push_str(text),
            _ => self.spans.push(TextSpan {
                text: text.to_string(),
                bold,
                italic,
            }),
        }
    }

    fn trim_trailing_newlines(&mut self) {
        while let Some(last) = self.spans.last_mut() {
            let trimmed = last.text.trim_end_matches('\n').len();
            last.text.truncate(trimmed);
            if !last.text.is_empty() {
                break;
            }
            self.spans.pop();
        }
    }
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after.find(';').and_then(|semi| {
            let entity = &after[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix('#')
                    .and_then(|n| match n.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => n.parse::<u32>().ok(),
                    })
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// A floating panel anchored to the popup overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Popover {
    options: PopoverOptions,
    content: PopoverContent,
    shown: bool,
}

impl Popover {
    /// Creates a hidden popover.
    pub fn new(options: PopoverOptions) -> Self {
        let content = PopoverContent::from_options(&options);
        Self {
            options,
            content,
            shown: false,
        }
    }

    /// Makes the popover visible.
    pub fn show(&mut self) {
        self.shown = true;
    }

    /// Hides the popover for good.
    pub fn dispose(&mut self) {
        self.shown = false;
    }

    /// Whether the popover is visible.
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Construction options.
    pub fn options(&self) -> &PopoverOptions {
        &self.options
    }

    /// Parsed body.
    pub fn content(&self) -> &PopoverContent {
        &self.content
    }
}

/// Which point of the overlay element sits on its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Positioning {
    /// Bottom edge center
    #[default]
    BottomCenter,
    /// Top edge center
    TopCenter,
    /// Element center
    CenterCenter,
}

impl Positioning {
    /// Point of the element placed on the overlay position.
    pub fn pivot(self) -> egui::Align2 {
        match self {
            Positioning::BottomCenter => egui::Align2::CENTER_BOTTOM,
            Positioning::TopCenter => egui::Align2::CENTER_TOP,
            Positioning::CenterCenter => egui::Align2::CENTER_CENTER,
        }
    }
}

/// A screen element pinned to a map coordinate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Overlay {
    position: Option<Coordinate>,
    positioning: Positioning,
    stop_event: bool,
}

impl Overlay {
    /// Creates an unpositioned overlay.
    pub fn new(positioning: Positioning, stop_event: bool) -> Self {
        Self {
            position: None,
            positioning,
            stop_event,
        }
    }

    /// Pins the overlay to a coordinate, or hides it with `None`.
    pub fn set_position(&mut self, position: Option<Coordinate>) {
        self.position = position;
    }

    /// Current map position.
    pub fn position(&self) -> Option<Coordinate> {
        self.position
    }

    /// How the element aligns with its position.
    pub fn positioning(&self) -> Positioning {
        self.positioning
    }

    /// Whether pointer events over the element are kept from the map.
    pub fn stops_events(&self) -> bool {
        self.stop_event
    }
}

/// Shows marker popovers, disposing the previous one before showing the next.
#[derive(Debug)]
pub struct PopoverPresenter {
    overlay: Overlay,
    popover: Option<Popover>,
    placement: Placement,
    created: usize,
}

impl Default for PopoverPresenter {
    fn default() -> Self {
        Self::new(Overlay::new(Positioning::BottomCenter, false))
    }
}

impl PopoverPresenter {
    /// Creates a presenter drawing into `overlay`.
    pub fn new(overlay: Overlay) -> Self {
        Self {
            overlay,
            popover: None,
            placement: Placement::Top,
            created: 0,
        }
    }

    /// Disposes any open popover, then opens one at `anchor` with `content` as body.
    pub fn show(&mut self, anchor: Coordinate, content: &str) {
        self.dispose();
        self.overlay.set_position(Some(anchor));
        let mut popover = Popover::new(PopoverOptions {
            placement: self.placement,
            html: true,
            content: content.to_string(),
        });
        popover.show();
        self.created += 1;
        log::debug!("popover shown at ({:.1}, {:.1}): {content}", anchor.x, anchor.y);
        self.popover = Some(popover);
    }

    /// Disposes the open popover. Does nothing when none is open.
    pub fn dispose(&mut self) {
        if let Some(mut popover) = self.popover.take() {
            popover.dispose();
            log::debug!("popover disposed");
        }
    }

    /// Whether a popover is open.
    pub fn is_visible(&self) -> bool {
        self.popover.as_ref().is_some_and(Popover::is_shown)
    }

    /// The open popover.
    pub fn popover(&self) -> Option<&Popover> {
        self.popover.as_ref()
    }

    /// Plain text of the open popover body.
    pub fn content_text(&self) -> Option<String> {
        self.popover.as_ref().map(|p| p.content().text())
    }

    /// Map position of the open popover.
    pub fn anchor(&self) -> Option<Coordinate> {
        self.popover.as_ref().and(self.overlay.position())
    }

    /// The overlay the popover is pinned to.
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Number of popovers created so far.
    pub fn created_count(&self) -> usize {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_subset_is_parsed() {
        let content = PopoverContent::parse_markup("<b>St.</b> Gallen<br/>Ost&amp;<i>schweiz</i>");
        assert_eq!(content.text(), "St. Gallen\nOst&schweiz");
        let spans = content.spans();
        assert_eq!(spans[0], TextSpan { text: "St.".into(), bold: true, italic: false });
        assert!(spans.last().is_some_and(|s| s.italic && s.text == "schweiz"));
    }

    #[test]
    fn unknown_tags_keep_their_text() {
        let content = PopoverContent::parse_markup("<span class=\"x\">Bern</span><p>");
        assert_eq!(content.text(), "Bern");
    }

    #[test]
    fn broken_markup_stays_literal() {
        assert_eq!(PopoverContent::parse_markup("a < b").text(), "a < b");
        assert_eq!(PopoverContent::parse_markup("R&D &#65;&#x42;").text(), "R&D AB");
    }

    #[test]
    fn plain_content_is_not_interpreted() {
        let popover = Popover::new(PopoverOptions {
            placement: Placement::Top,
            html: false,
            content: "<b>Bern</b>".into(),
        });
        assert_eq!(popover.content().text(), "<b>Bern</b>");
        assert!(!popover.is_shown());
    }

    #[test]
    fn presenter_keeps_at_most_one_popover() {
        let mut presenter = PopoverPresenter::default();
        presenter.show(Coordinate::new(1.0, 2.0), "Bern");
        presenter.show(Coordinate::new(3.0, 4.0), "Sarnen");
        assert!(presenter.is_visible());
        assert_eq!(presenter.content_text().as_deref(), Some("Sarnen"));
        assert_eq!(presenter.anchor(), Some(Coordinate::new(3.0, 4.0)));
        assert_eq!(presenter.created_count(), 2);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut presenter = PopoverPresenter::default();
        presenter.dispose();
        presenter.show(Coordinate::new(0.0, 0.0), "Effi");
        presenter.dispose();
        presenter.dispose();
        assert!(!presenter.is_visible());
        assert_eq!(presenter.anchor(), None);
    }

    #[test]
    fn top_placement_pins_bottom_center() {
        assert_eq!(Placement::Top.pivot(), egui::Align2::CENTER_BOTTOM);
        assert_eq!(Placement::Top.direction(), egui::vec2(0.0, -1.0));
    }
}
