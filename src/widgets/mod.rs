//! Host singletons shared by all fields of one kind.
//!
//! - [`calendar`] - date/time picker for datetime fields
//! - [`map`] - location picker for location fields

pub mod calendar;
pub mod map;

pub use calendar::{install_calendar, uninstall_calendar, Calendar};
pub use map::{install_map, uninstall_map, LatLng, MapWidget};
