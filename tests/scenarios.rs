//! End-to-end designer scenarios: reactive writes, palette drops, moves,
//! confirmed deletes, copies and edit targeting.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{Datelike, NaiveDate, Timelike};
use serde_json::json;

use form_designer::events::bubble::{self, BubbleEvent, Propagation};
use form_designer::fields::{parse_date_input, DateKind};
use form_designer::nodes::structure;
use form_designer::*;

fn setup() -> Canvas {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    reset_designer();
    register_builtin_fields();
    Canvas::new(DesignerConfig::default()).unwrap()
}

fn drop_new_field(canvas: &Canvas, tag: &str, target: DropTarget) -> FieldNode {
    start_palette_drag(tag).unwrap();
    let node = drop_payload(canvas, target).unwrap();
    end_drag();
    get_field(node).unwrap()
}

#[test]
fn equal_writes_rerun_the_effect_every_time() {
    let _canvas = setup();
    let count: Key<f64> = Key::new("count");
    let record = ReactiveObject::from_json(&json!({ "count": 0 })).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));

    let (r, l) = (record.clone(), log.clone());
    let _effect = create_effect(move || l.borrow_mut().push(r.read(count).unwrap()));

    for _ in 0..3 {
        record.write(count, 1.0);
    }
    assert_eq!(*log.borrow(), vec![0.0, 1.0, 1.0, 1.0]);
}

#[test]
fn palette_drop_fills_an_empty_section() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    assert!(section.field_ids().is_empty());
    assert!(section.view().flag(slots::EMPTY_PLACEHOLDER));

    start_palette_drag("text").unwrap();
    assert_eq!(drag_state(), DragState::CreatingField("text".into()));
    let node = drop_payload(&canvas, DropTarget::Container(section.node_id())).unwrap();
    end_drag();

    let field = get_field(node).unwrap();
    assert_eq!(section.field_ids(), vec![field.id()]);
    assert!(!section.view().flag(slots::EMPTY_PLACEHOLDER));
    assert_eq!(canvas.field_ids(), vec![field.id()]);
    assert_eq!(drag_state(), DragState::Idle);
    assert!(!field.zones().any_visible());
}

#[test]
fn moving_a_field_after_its_sibling_swaps_them() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    let a = drop_new_field(&canvas, "text", DropTarget::Container(section.node_id()));
    let b = drop_new_field(&canvas, "number", DropTarget::Container(section.node_id()));
    assert_eq!(section.field_ids(), vec![a.id(), b.id()]);

    begin_drag(DragPayload::Node(a.node_id())).unwrap();
    assert!(b.zones().any_visible());
    assert!(!a.zones().any_visible());

    let target = DropTarget::Zone {
        node: b.node_id(),
        position: InsertPosition::AfterEnd,
    };
    drag_over(target);
    assert_eq!(drop_payload(&canvas, target).unwrap(), a.node_id());
    end_drag();

    assert_eq!(section.field_ids(), vec![b.id(), a.id()]);
    assert!(a.is_live());
    assert!(!b.zones().any_visible());
}

#[test]
fn datetime_input_parses_two_digit_year() {
    let now = NaiveDate::from_ymd_opt(2025, 1, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let date = parse_date_input("3/5/24 14:30", DateKind::DateTime, now).unwrap();
    assert_eq!(date.year(), 2024);
    assert_eq!(date.month0(), 2);
    assert_eq!(date.day(), 5);
    assert_eq!(date.hour(), 14);
    assert_eq!(date.minute(), 30);
}

#[test]
fn confirmed_delete_removes_field_after_exit_transition() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    let field = drop_new_field(&canvas, "text", DropTarget::Container(section.node_id()));
    let id = field.id();

    let removals = Rc::new(Cell::new(0));
    let seen = removals.clone();
    let owner = section.node_id();
    let _listener = bubble::on_node(owner, move |event, cx| {
        if matches!(event, BubbleEvent::RemoveField { .. }) && cx.current == owner {
            seen.set(seen.get() + 1);
        }
        Propagation::Continue
    });

    field.highlight().request_delete();
    assert!(field.view().flag(slots::CONFIRM_DELETE));
    field.highlight().confirm_delete();
    assert!(!field.view().flag(slots::CONFIRM_DELETE));

    flush_microtasks();
    assert!(field.view().flag(slots::EXITING));
    assert_eq!(section.field_ids(), vec![id.clone()]);
    assert_eq!(removals.get(), 0);

    finish_animations();
    assert_eq!(removals.get(), 1);
    assert!(section.field_ids().is_empty());
    assert!(find_by_id(&id).is_none());
    assert!(canvas.field_data(&id).is_none());
}

#[test]
fn section_delete_cascades_to_fields() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    let a = drop_new_field(&canvas, "text", DropTarget::Container(section.node_id()));
    let b = drop_new_field(&canvas, "slider", DropTarget::Container(section.node_id()));

    section.highlight().confirm_delete();
    flush_microtasks();
    assert!(canvas.field_ids().is_empty());
    assert_eq!(canvas.section_ids(), vec![section.id()]);

    advance_animations(canvas.config().animation_ms);
    assert!(canvas.section_ids().is_empty());
    assert!(find_by_id(&a.id()).is_none());
    assert!(find_by_id(&b.id()).is_none());
    assert!(canvas.sections().is_empty());
}

#[test]
fn exiting_section_accepts_no_new_fields() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    let other = canvas.add_section().unwrap();
    let moved = drop_new_field(&canvas, "text", DropTarget::Container(other.node_id()));

    section.highlight().confirm_delete();
    flush_microtasks();
    assert!(structure::is_exiting(section.node_id()));

    start_palette_drag("text").unwrap();
    assert_eq!(
        drop_payload(&canvas, DropTarget::Container(section.node_id())),
        Err(FormError::NodeNotLive(section.node_id()))
    );
    end_drag();

    begin_drag(DragPayload::Node(moved.node_id())).unwrap();
    assert!(drop_payload(&canvas, DropTarget::Container(section.node_id())).is_err());
    end_drag();

    finish_animations();
    assert_eq!(canvas.section_ids(), vec![other.id()]);
    assert_eq!(canvas.field_ids(), vec![moved.id()]);
    assert_eq!(other.field_ids(), vec![moved.id()]);
}

#[test]
fn destroying_a_section_unregisters_its_fields() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    let a = drop_new_field(&canvas, "text", DropTarget::Container(section.node_id()));
    let b = drop_new_field(&canvas, "number", DropTarget::Container(section.node_id()));
    assert_eq!(canvas.field_ids(), vec![a.id(), b.id()]);

    structure::detach_and_destroy(section.node_id());

    assert!(canvas.field_ids().is_empty());
    assert!(canvas.field_data(&a.id()).is_none());
    assert!(canvas.section_ids().is_empty());
    assert_eq!(a.lifecycle(), Lifecycle::Destroyed);
    assert!(find_by_id(&b.id()).is_none());
}

#[test]
fn confirmed_copy_inserts_duplicate_after_original() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    let field = drop_new_field(&canvas, "text", DropTarget::Container(section.node_id()));
    field.data().write(keys::LABEL, "First name".to_string());

    field.highlight().request_copy();
    field.highlight().confirm_copy();
    flush_microtasks();

    let ids = section.field_ids();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], field.id());
    assert_ne!(ids[1], field.id());

    let copy = find_by_id(&ids[1]).unwrap();
    assert_eq!(copy.data().read(keys::LABEL).unwrap(), "First name");
    assert_eq!(copy.data().read(keys::ID).unwrap(), ids[1]);

    copy.data().write(keys::LABEL, "Last name".to_string());
    assert_eq!(field.data().read(keys::LABEL).unwrap(), "First name");
}

#[test]
fn pointer_down_sets_the_edit_target() {
    let canvas = setup();
    let first = canvas.add_section().unwrap();
    let second = canvas.add_section().unwrap();
    assert_eq!(canvas.edit_target(), Some(second.node_id()));

    let field = drop_new_field(&canvas, "select", DropTarget::Container(first.node_id()));
    assert_eq!(canvas.edit_target(), Some(field.node_id()));

    pointer_down(Some(second.node_id()));
    assert_eq!(canvas.edit_target(), Some(second.node_id()));
    assert!(second.highlight().is_active());
    assert!(!field.highlight().is_active());

    pointer_down(None);
    assert!(!second.highlight().is_active());
    assert_eq!(canvas.edit_target(), Some(second.node_id()));
}

#[test]
fn rejected_drops_leave_the_document_unchanged() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    let field = drop_new_field(&canvas, "text", DropTarget::Container(section.node_id()));
    let before = canvas.to_json();

    begin_drag(DragPayload::Node(field.node_id())).unwrap();
    let own_zone = DropTarget::Zone {
        node: field.node_id(),
        position: InsertPosition::BeforeBegin,
    };
    assert!(matches!(drop_payload(&canvas, own_zone), Err(FormError::InvalidDropTarget(_))));
    assert!(drop_payload(&canvas, DropTarget::Container(canvas.root())).is_err());
    end_drag();

    start_palette_drag("text").unwrap();
    assert!(drop_payload(&canvas, DropTarget::Container(canvas.root())).is_err());
    end_drag();

    assert_eq!(canvas.to_json(), before);
    assert!(field.is_live());
}

#[test]
fn form_exports_sections_with_their_fields() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    section.data().write(keys::LABEL, "Contact".to_string());
    let field = drop_new_field(&canvas, "number", DropTarget::Container(section.node_id()));

    let form = canvas.to_json();
    assert_eq!(form["name"], "Test Form");
    assert_eq!(form["acronym"], "TF");
    assert_eq!(form["sections"][0]["label"], "Contact");
    assert_eq!(form["sections"][0]["fields"][0]["id"], field.id());
    assert_eq!(form["sections"][0]["fields"][0]["type"], "number");
}

#[test]
fn calendar_writes_back_into_its_field() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    let field = drop_new_field(&canvas, "datetime", DropTarget::Container(section.node_id()));

    assert_eq!(
        form_designer::fields::show_calendar(&field),
        Err(FormError::MissingHostWidget("calendar"))
    );

    let calendar = install_calendar(canvas.config());
    field.commit_input("3/5/24 14:30");
    assert_eq!(field.view().text_or_empty(slots::INPUT_VALUE), "03/05/2024 14:30");

    form_designer::fields::show_calendar(&field).unwrap();
    assert!(calendar.is_open());
    assert!(!field.view().flag(slots::INPUT_BUTTON_VISIBLE));
    assert_eq!(calendar.view().text_or_empty(form_designer::widgets::calendar::slots::TITLE), "March 2024");

    calendar.next_month();
    calendar.step_minute(1);
    calendar.accept();
    assert!(!calendar.is_open());
    assert!(field.view().flag(slots::INPUT_BUTTON_VISIBLE));
    assert_eq!(field.view().text_or_empty(slots::INPUT_VALUE), "04/05/2024 14:31");

    form_designer::fields::show_calendar(&field).unwrap();
    calendar.next_month();
    pointer_down(None);
    assert!(!calendar.is_open());
    assert_eq!(field.view().text_or_empty(slots::INPUT_VALUE), "04/05/2024 14:31");
}

#[test]
fn map_location_is_copied_into_the_field() {
    let canvas = setup();
    let section = canvas.add_section().unwrap();
    let field = drop_new_field(&canvas, "location", DropTarget::Container(section.node_id()));
    assert_eq!(
        form_designer::fields::open_map(&field),
        Err(FormError::MissingHostWidget("map"))
    );

    let map = install_map().unwrap();
    form_designer::fields::open_map(&field).unwrap();
    assert!(map.is_open());
    map.set_marker(LatLng { lat: 38.8, lng: -77.18 });
    map.use_location();

    assert!(!map.is_open());
    assert_eq!(
        field.view().text_or_empty(slots::INPUT_VALUE),
        "6801 Industrial Rd, Springfield, VA 22151"
    );
    let data = canvas.field_data(&field.id()).unwrap();
    assert_eq!(data.get("lat").unwrap().as_f64(), Some(38.8));
    assert_eq!(data.get("zip").unwrap().as_str(), Some("22151"));
}
