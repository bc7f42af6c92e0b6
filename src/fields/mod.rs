//! Built-in field types.
//!
//! | Tag | View |
//! |---|---|
//! | `text`, `number`, `slider` | [`basic`] inputs |
//! | `heading`, `paragraph`, `html` | [`basic`] static content |
//! | `select` | [`select`] |
//! | `date`, `datetime`, `time` | [`datetime`] |
//! | `location` | [`location`] |
//! | `calculation` | [`calculation`] |
//! | `list` | [`list`] |

pub mod basic;
pub mod calculation;
pub mod datetime;
pub mod list;
pub mod location;
pub mod select;

use crate::nodes::register_field_type;

pub use calculation::add_calculation_field;
pub use datetime::{format_date, parse_date_input, set_date, show_calendar, DateKind};
pub use location::{open_map, set_location_data, LocationData};
pub use select::{add_option, SelectOption};

/// Register every built-in field type under its palette tag.
pub fn register_builtin_fields() {
    register_field_type("text", |_| Box::new(basic::TextView));
    register_field_type("number", |_| Box::new(basic::NumberView));
    register_field_type("select", |_| Box::new(select::SelectView));
    for kind in [DateKind::Date, DateKind::DateTime, DateKind::Time] {
        register_field_type(kind.tag(), move |_| Box::new(datetime::DateTimeView::new(kind)));
    }
    register_field_type("location", |_| Box::new(location::LocationView));
    register_field_type("calculation", |_| Box::new(calculation::CalculationView));
    register_field_type("heading", |_| Box::new(basic::HeadingView));
    register_field_type("paragraph", |_| Box::new(basic::ParagraphView));
    register_field_type("html", |_| Box::new(basic::HtmlView));
    register_field_type("slider", |_| Box::new(basic::SliderView));
    register_field_type("list", |_| Box::new(list::ListView));
}
