//! One map session: the map, its popover and the interaction wiring.

use crate::config::{ConfigError, MapConfig};
use crate::interaction::InteractionHandler;
use crate::map::{Container, MapController, MapEvent};
use crate::popover::PopoverPresenter;

/// Owns the map controller, the popover presenter and the interaction handler for
/// the lifetime of a page or window.
pub struct MapSession {
    map: MapController,
    popover: PopoverPresenter,
    interaction: InteractionHandler,
}

impl MapSession {
    /// Builds the map described by `config` inside `target`.
    pub fn new(config: &MapConfig, target: Option<Container>) -> Result<Self, ConfigError> {
        let (view, layers) = config.build()?;
        log::info!(
            "starting map session: {} places in {}",
            config.places.len(),
            view.projection().code()
        );
        Ok(Self::from_map(MapController::initialize(target, layers, view)))
    }

    /// Wraps an already initialized map.
    pub fn from_map(map: MapController) -> Self {
        Self {
            map,
            popover: PopoverPresenter::default(),
            interaction: InteractionHandler::default(),
        }
    }

    /// Delivers one event; the handler runs to completion before returning.
    pub fn handle_event(&mut self, event: MapEvent) {
        if !self.map.is_attached() {
            return;
        }
        self.interaction
            .handle(&event, &mut self.map, &mut self.popover);
    }

    /// Delivers events in order.
    pub fn handle_events(&mut self, events: impl IntoIterator<Item = MapEvent>) {
        for event in events {
            self.handle_event(event);
        }
    }

    /// The map controller.
    pub fn map(&self) -> &MapController {
        &self.map
    }

    /// The map controller, for view gestures.
    pub fn map_mut(&mut self) -> &mut MapController {
        &mut self.map
    }

    /// The popover presenter.
    pub fn popover(&self) -> &PopoverPresenter {
        &self.popover
    }

    /// The interaction handler.
    pub fn interaction(&self) -> &InteractionHandler {
        &self.interaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{SWISS_PROJECTION_CODE, SWISS_PROJECTION_DEF};
    use crate::config::ProjectionConfig;
    use crate::features::MarkerStyle;
    use crate::registry::PlaceEntry;
    use crate::types::{Coordinate, Cursor};
    use eframe::egui;

    const SACHSELN: Coordinate = Coordinate::new(661_553.5, 191_685.0);
    const STGALLEN: Coordinate = Coordinate::new(747_505.3, 255_431.8);

    fn place(name: &str, label: &str, coordinate: Coordinate) -> PlaceEntry {
        PlaceEntry {
            name: name.into(),
            label: label.into(),
            coordinate,
        }
    }

    fn session(places: Vec<PlaceEntry>) -> MapSession {
        let config = MapConfig {
            projection: Some(ProjectionConfig {
                code: SWISS_PROJECTION_CODE.into(),
                definition: Some(SWISS_PROJECTION_DEF.into()),
            }),
            center: SACHSELN,
            zoom: 9.0,
            places,
            tile_url: None,
            attribution: String::new(),
            marker_style: MarkerStyle::default(),
        };
        let target = Container::new("map", egui::vec2(1200.0, 800.0));
        MapSession::new(&config, Some(target)).expect("session builds")
    }

    fn two_places() -> MapSession {
        session(vec![
            place("SACHSELN", "Sachseln", SACHSELN),
            place("STGALLEN", "St. Gallen", STGALLEN),
        ])
    }

    fn click_on(session: &mut MapSession, c: Coordinate) {
        let pixel = session.map().pixel_from_coordinate(c);
        let event = session.map().click_event(pixel);
        session.handle_event(event);
    }

    #[test]
    fn click_on_st_gallen_then_move_start() {
        let mut s = two_places();
        let pixel = s.map().pixel_from_coordinate(STGALLEN);
        assert!((pixel.x - 881.4).abs() < 0.5 && (pixel.y - 191.3).abs() < 0.5, "{pixel:?}");

        click_on(&mut s, STGALLEN);
        assert!(s.popover().is_visible());
        assert!(s.interaction().popover_visible());
        assert_eq!(s.popover().content_text().as_deref(), Some("St. Gallen"));

        s.handle_event(MapEvent::MoveStart);
        assert!(!s.popover().is_visible());
        assert!(!s.interaction().popover_visible());
    }

    #[test]
    fn label_passes_through_to_popover() {
        let bern = Coordinate::new(599_299.710_370, 200_399.391_909);
        let mut s = session(vec![place("BERN", "Bern", bern)]);
        click_on(&mut s, bern);
        assert_eq!(s.popover().content_text().as_deref(), Some("Bern"));
    }

    #[test]
    fn popover_is_anchored_at_click_coordinate() {
        let mut s = two_places();
        let pixel = s.map().pixel_from_coordinate(STGALLEN) + egui::vec2(2.0, -3.0);
        let event = s.map().click_event(pixel);
        s.handle_event(event);
        let MapEvent::Click { coordinate, .. } = event else {
            unreachable!()
        };
        assert_eq!(s.popover().anchor(), Some(coordinate));
    }

    #[test]
    fn at_most_one_popover_after_any_click_sequence() {
        let mut s = two_places();
        let empty = egui::pos2(5.0, 5.0);
        let clicks = [
            s.map().pixel_from_coordinate(STGALLEN),
            s.map().pixel_from_coordinate(SACHSELN),
            empty,
            s.map().pixel_from_coordinate(SACHSELN),
            s.map().pixel_from_coordinate(SACHSELN),
        ];
        let mut created = 0;
        for pixel in clicks {
            let event = s.map().click_event(pixel);
            s.handle_event(event);
            // a presenter holds a single slot, so visible means exactly one live instance
            assert_eq!(s.popover().popover().is_some(), s.popover().is_visible());
            if s.map().has_feature_at_pixel(pixel) {
                created += 1;
            }
        }
        assert_eq!(s.popover().created_count(), created);
        assert_eq!(s.popover().content_text().as_deref(), Some("Sachseln"));
    }

    #[test]
    fn empty_click_with_nothing_open_creates_nothing() {
        let mut s = two_places();
        let event = s.map().click_event(egui::pos2(5.0, 5.0));
        s.handle_event(event);
        assert!(!s.popover().is_visible());
        assert_eq!(s.popover().created_count(), 0);
    }

    #[test]
    fn empty_click_closes_open_popover() {
        let mut s = two_places();
        click_on(&mut s, STGALLEN);
        let event = s.map().click_event(egui::pos2(5.0, 5.0));
        s.handle_event(event);
        assert!(!s.popover().is_visible());
    }

    #[test]
    fn move_start_without_popover_is_harmless() {
        let mut s = two_places();
        s.handle_event(MapEvent::MoveStart);
        s.handle_event(MapEvent::MoveStart);
        assert!(!s.popover().is_visible());
    }

    #[test]
    fn pointer_move_toggles_cursor() {
        let mut s = two_places();
        let over = s.map().pixel_from_coordinate(SACHSELN);
        s.handle_event(MapEvent::PointerMove { pixel: over });
        assert_eq!(s.map().cursor(), Cursor::Pointer);
        s.handle_event(MapEvent::PointerMove { pixel: over });
        assert_eq!(s.map().cursor(), Cursor::Pointer);
        s.handle_event(MapEvent::PointerMove { pixel: egui::pos2(5.0, 5.0) });
        assert_eq!(s.map().cursor(), Cursor::Default);
    }

    #[test]
    fn pointer_move_leaves_popover_alone() {
        let mut s = two_places();
        click_on(&mut s, STGALLEN);
        s.handle_events([
            MapEvent::PointerMove { pixel: egui::pos2(5.0, 5.0) },
            MapEvent::MoveEnd,
        ]);
        assert!(s.popover().is_visible());
    }

    #[test]
    fn detached_session_ignores_events() {
        let config = MapConfig {
            tile_url: None,
            ..MapConfig::swiss()
        };
        let mut s = MapSession::new(&config, None).expect("builds");
        s.handle_event(MapEvent::Click {
            pixel: egui::pos2(0.0, 0.0),
            coordinate: SACHSELN,
        });
        assert!(!s.popover().is_visible());
    }
}
