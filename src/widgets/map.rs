//! Map popup used by location fields.
//!
//! Only the location state lives here. Tiles, geocoding and the marker are
//! the host's business: it reports positions through [`MapWidget::set_marker`]
//! and resolved addresses through [`MapWidget::set_location`].

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::fields::location::{self, LocationData};
use crate::nodes::{get_field, FieldNode, View};
use crate::reactive::{create_effect, effect_scope, EffectScope, Key, ReactiveObject};
use crate::types::NodeId;

pub const HAS_LOCATION: Key<bool> = Key::new("hasLocation");
pub const STREET_NUMBER: Key<String> = Key::new("streetNumber");
pub const STREET: Key<String> = Key::new("street");
pub const CITY: Key<String> = Key::new("city");
pub const STATE: Key<String> = Key::new("state");
pub const ZIP: Key<String> = Key::new("zip");
pub const LAT: Key<f64> = Key::new("lat");
pub const LONG: Key<f64> = Key::new("long");

pub mod slots {
    pub const OPEN: &str = "map.open";
    pub const PANEL: &str = "map.location.visible";
    pub const STREET_LINE: &str = "map.location.street";
    pub const REGION_LINE: &str = "map.location.region";
    pub const COORDINATES: &str = "map.location.coordinates";
}

/// Position reported by the host when the marker moves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

struct MapInner {
    data: ReactiveObject,
    view: View,
    target: RefCell<Option<(NodeId, String)>>,
    scope: EffectScope,
}

#[derive(Clone)]
pub struct MapWidget(Rc<MapInner>);

impl MapWidget {
    fn new() -> Result<MapWidget> {
        let data = ReactiveObject::from_json(&serde_json::json!({
            "hasLocation": true,
            "streetNumber": "6801",
            "street": "Industrial Rd",
            "city": "Springfield",
            "state": "VA",
            "zip": "22151",
            "lat": 0,
            "long": 0,
        }))?;

        let map = MapWidget(Rc::new(MapInner {
            data,
            view: View::new(),
            target: RefCell::new(None),
            scope: effect_scope(),
        }));
        map.initialize();
        Ok(map)
    }

    fn initialize(&self) {
        let inner = &self.0;
        inner.scope.run(|| {
            let (d, v) = (inner.data.clone(), inner.view.clone());
            create_effect(move || v.set_flag(slots::PANEL, d.read(HAS_LOCATION).unwrap_or(false)));

            let (d, v) = (inner.data.clone(), inner.view.clone());
            create_effect(move || {
                let number = d.read(STREET_NUMBER).unwrap_or_default();
                let street = d.read(STREET).unwrap_or_default();
                v.set_text(slots::STREET_LINE, format!("{number} {street}"));
            });

            let (d, v) = (inner.data.clone(), inner.view.clone());
            create_effect(move || {
                let city = d.read(CITY).unwrap_or_default();
                let state = d.read(STATE).unwrap_or_default();
                let zip = d.read(ZIP).unwrap_or_default();
                v.set_text(slots::REGION_LINE, format!("{city}, {state} {zip}"));
            });

            let (d, v) = (inner.data.clone(), inner.view.clone());
            create_effect(move || {
                let lat = d.read(LAT).unwrap_or_default();
                let long = d.read(LONG).unwrap_or_default();
                v.set_text(slots::COORDINATES, format!("{lat:.8}, {long:.8}"));
            });
        });
    }

    pub fn data(&self) -> &ReactiveObject {
        &self.0.data
    }

    pub fn view(&self) -> &View {
        &self.0.view
    }

    pub fn is_open(&self) -> bool {
        self.0.view.flag(slots::OPEN)
    }

    pub fn target(&self) -> Option<FieldNode> {
        let (node, id) = self.0.target.borrow().clone()?;
        get_field(node).filter(|field| field.id() == id)
    }

    /// Current location. Untracked.
    pub fn location(&self) -> LocationData {
        let d = &self.0.data;
        LocationData {
            has_location: d.read_untracked(HAS_LOCATION).unwrap_or(false),
            street_number: d.read_untracked(STREET_NUMBER).unwrap_or_default(),
            street: d.read_untracked(STREET).unwrap_or_default(),
            city: d.read_untracked(CITY).unwrap_or_default(),
            state: d.read_untracked(STATE).unwrap_or_default(),
            zip: d.read_untracked(ZIP).unwrap_or_default(),
            lat: d.read_untracked(LAT).unwrap_or_default(),
            long: d.read_untracked(LONG).unwrap_or_default(),
        }
    }

    /// Bind to `field` and show the popup.
    pub fn open(&self, field: &FieldNode) {
        *self.0.target.borrow_mut() = Some((field.node_id(), field.id()));
        self.0.view.set_flag(slots::OPEN, true);
        debug!(field = %field.node_id(), "map opened");
    }

    pub fn close(&self) {
        self.0.target.borrow_mut().take();
        self.0.view.set_flag(slots::OPEN, false);
    }

    /// The marker moved to `position`.
    pub fn set_marker(&self, position: LatLng) {
        let d = &self.0.data;
        d.write(LAT, position.lat);
        d.write(LONG, position.lng);
        d.write(HAS_LOCATION, true);
    }

    /// The host resolved a full location (geocoder, search).
    pub fn set_location(&self, location: &LocationData) {
        let d = &self.0.data;
        d.write(STREET_NUMBER, location.street_number.clone());
        d.write(STREET, location.street.clone());
        d.write(CITY, location.city.clone());
        d.write(STATE, location.state.clone());
        d.write(ZIP, location.zip.clone());
        d.write(LAT, location.lat);
        d.write(LONG, location.long);
        d.write(HAS_LOCATION, location.has_location);
    }

    /// Copy the current location into the bound field and close.
    pub fn use_location(&self) {
        match self.target() {
            Some(field) => location::set_location_data(&field, &self.location()),
            None => warn!("map location used with no field bound"),
        }
        self.close();
    }

    /// Forget the current location.
    pub fn clear(&self) {
        self.set_location(&LocationData::default());
    }

    fn dispose(&self) {
        self.0.scope.stop();
    }
}

// =============================================================================
// Singleton
// =============================================================================

thread_local! {
    static MAP: RefCell<Option<MapWidget>> = const { RefCell::new(None) };
}

/// Install the designer's map, replacing any previous one.
pub fn install_map() -> Result<MapWidget> {
    uninstall_map();
    let map = MapWidget::new()?;
    MAP.with(|slot| *slot.borrow_mut() = Some(map.clone()));
    Ok(map)
}

pub fn map() -> Option<MapWidget> {
    MAP.with(|slot| slot.borrow().clone())
}

pub fn uninstall_map() {
    if let Some(map) = MAP.with(|slot| slot.borrow_mut().take()) {
        map.dispose();
    }
}
