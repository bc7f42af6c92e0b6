//! Location fields: an address input backed by the map popup.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{FormError, Result};
use crate::nodes::{slots, FieldContext, FieldNode, FieldView};
use crate::reactive::{create_effect, keys, Key};
use crate::widgets::map;

const ADDRESS: Key<String> = Key::new("address");

/// A resolved location, as held by the map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationData {
    pub has_location: bool,
    pub street_number: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub lat: f64,
    pub long: f64,
}

impl LocationData {
    /// `6801 Industrial Rd, Springfield, VA 22151`
    pub fn address(&self) -> String {
        format!(
            "{} {}, {}, {} {}",
            self.street_number, self.street, self.city, self.state, self.zip
        )
    }
}

/// Store `location` in `field`'s attributes.
pub fn set_location_data(field: &FieldNode, location: &LocationData) {
    let data = field.data();
    data.write(ADDRESS, location.address());
    data.set("streetNumber", location.street_number.as_str());
    data.set("street", location.street.as_str());
    data.set("city", location.city.as_str());
    data.set("state", location.state.as_str());
    data.set("zip", location.zip.as_str());
    data.set("lat", location.lat);
    data.set("long", location.long);
    debug!(field = %field.node_id(), address = %location.address(), "location set");
}

/// Open the map for `field`.
pub fn open_map(field: &FieldNode) -> Result<()> {
    let Some(map) = map::map() else {
        warn!(field = %field.node_id(), "no map installed");
        return Err(FormError::MissingHostWidget("map"));
    };
    map.open(field);
    Ok(())
}

pub struct LocationView;

impl FieldView for LocationView {
    fn defaults(&self) -> serde_json::Value {
        json!({
            "label": "Location",
            "placeholder": "Address",
            "address": "",
            "streetNumber": "",
            "street": "",
            "city": "",
            "state": "",
            "zip": "",
            "lat": 0,
            "long": 0,
            "defaultCurrent": false,
        })
    }

    fn initialize(&mut self, cx: &FieldContext<'_>) -> Result<()> {
        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || v.set_text(slots::INPUT_PLACEHOLDER, d.read(keys::PLACEHOLDER).unwrap_or_default()));

        let (d, v) = (cx.data.clone(), cx.view.clone());
        create_effect(move || v.set_text(slots::INPUT_VALUE, d.read(ADDRESS).unwrap_or_default()));

        cx.view.set_flag(slots::INPUT_BUTTON_VISIBLE, true);
        Ok(())
    }

    /// The address is only ever set from the map.
    fn commit_input(&mut self, cx: &FieldContext<'_>, _input: &str) {
        let address = cx.data.read_untracked(ADDRESS).unwrap_or_default();
        cx.view.set_text(slots::INPUT_VALUE, address);
    }
}
