use crate::binding::{FieldRole, RawValue, ValueKind};
use crate::document::{EntityKind, Protocol, TagField};
use crate::ids::SequentialIds;
use crate::render;
use crate::sample::sample;
use crate::section::Section;
use crate::view::{ViewNode, Widget};

fn picker<'a>(view: &'a ViewNode, field: TagField, index: usize) -> &'a crate::view::TagPicker {
    view.tag_pickers()
        .into_iter()
        .find(|p| p.field == field && p.index == index)
        .expect("tag picker rendered")
}

#[test]
fn empty_collection_renders_empty_state() {
    // Arrange
    let doc = Default::default();

    // Act
    let view = render::section(&doc, Section::Monitors);

    // Assert
    match view.children() {
        [ViewNode::Empty { title, message }] => {
            assert_eq!(title, "No Monitors");
            assert_eq!(message, "Add monitors to track your services.");
        }
        other => panic!("unexpected children: {other:?}"),
    }
}

#[test]
fn tag_candidates_exclude_selected_values() {
    // Arrange
    let doc = sample().expect("sample parses");

    // Act
    let view = render::section(&doc, Section::Monitors);

    // Assert
    let channels = picker(&view, TagField::MonitorChannels, 0);
    assert_eq!(channels.selected, vec!["critical".to_string()]);
    assert_eq!(channels.candidates, vec!["ops-team".to_string()]);
    let agents = picker(&view, TagField::MonitorAgents, 0);
    assert!(agents.candidates.is_empty());
}

#[test]
fn status_page_candidates_are_groups_and_monitors() {
    // Arrange
    let doc = sample().expect("sample parses");

    // Act
    let view = render::section(&doc, Section::StatusPages);

    // Assert
    let items = picker(&view, TagField::StatusPageItems, 0);
    assert_eq!(
        items.candidates,
        vec!["api-prod", "game-server", "db-primary", "redis-cache"]
    );
}

#[test]
fn parent_group_options_exclude_the_group_itself() {
    // Arrange
    let doc = sample().expect("sample parses");

    // Act
    let view = render::section(&doc, Section::Groups);

    // Assert
    let parent = view.field("groups.0.parentId").expect("parent select");
    match &parent.widget {
        Widget::Select(choices) => {
            let values: Vec<&str> = choices.iter().map(|c| c.value.as_str()).collect();
            assert_eq!(values, vec!["", "infrastructure"]);
        }
        other => panic!("expected select, got {other:?}"),
    }
    assert!(parent.binding.empty_as_absent);
}

#[test]
fn probe_form_shows_only_active_protocol_fields() {
    // Arrange
    let mut doc = sample().expect("sample parses");
    doc.set_protocol(1, Some(Protocol::Tcp)).expect("set tcp");

    // Act
    let view = render::section(&doc, Section::Monitors);

    // Assert
    let probe_paths: Vec<String> = view
        .fields()
        .into_iter()
        .map(|f| f.binding.path.to_string())
        .filter(|p| p.starts_with("monitors.1.pulse."))
        .collect();
    assert_eq!(
        probe_paths,
        vec![
            "monitors.1.pulse.tcp.host",
            "monitors.1.pulse.tcp.port",
            "monitors.1.pulse.tcp.timeout"
        ]
    );
}

#[test]
fn cards_fall_back_to_unnamed_titles() {
    // Arrange
    let mut doc = crate::document::Document::default();
    let mut ids = SequentialIds::default();
    doc.add(EntityKind::Monitor, &mut ids);
    doc.add(EntityKind::StatusPage, &mut ids);

    // Act
    let monitors = render::section(&doc, Section::Monitors);
    let pages = render::section(&doc, Section::StatusPages);

    // Assert
    assert_eq!(monitors.cards()[0].title, "Unnamed Monitor");
    assert_eq!(monitors.cards()[0].badge, "id-1");
    assert_eq!(pages.cards()[0].title, "Unnamed Status Page");
    assert_eq!(pages.cards()[0].badge, "/...");
}

#[test]
fn fields_carry_their_bindings_and_values() {
    // Arrange
    let doc = sample().expect("sample parses");

    // Act
    let monitors = render::section(&doc, Section::Monitors);
    let channels = render::section(&doc, Section::Notifications);

    // Assert
    let interval = monitors.field("monitors.0.interval").expect("interval");
    assert_eq!(interval.binding.kind, ValueKind::Number);
    assert_eq!(interval.value, RawValue::Text("30".into()));
    let id = monitors.field("monitors.0.id").expect("id");
    assert_eq!(id.binding.role, FieldRole::EntityId);
    let secure = channels
        .field("notifications.channels.critical.email.smtp.secure")
        .expect("secure checkbox");
    assert_eq!(secure.value, RawValue::Checked(true));
    assert!(secure.binding.ensure.is_some());
}

#[test]
fn section_header_carries_count_and_add_action() {
    let doc = sample().expect("sample parses");

    let view = render::section(&doc, Section::RemoteAgents);

    match view {
        ViewNode::Section { count, add, .. } => {
            assert_eq!(count, Some(2));
            assert!(add.is_some());
        }
        other => panic!("expected section, got {other:?}"),
    }
}

#[test]
fn monitor_id_field_renames_and_rerenders_monitors() {
    // Arrange
    let mut doc = crate::document::Document::default();
    doc.add(EntityKind::Monitor, &mut SequentialIds::default());

    // Act
    let view = render::section(&doc, Section::Monitors);

    // Assert
    let id = view.field("monitors.0.id").expect("id field");
    assert_eq!(id.binding.role, FieldRole::EntityId);
    assert_eq!(id.binding.rerender, Some(Section::Monitors));
}
