use crate::binding::{
    apply, BindMode, BindingEngine, BindingError, FieldBinding, FlushOutcome, FlushScope,
    FormState, RawValue,
};
use crate::document::{Document, EntityKind};
use crate::ids::SequentialIds;
use crate::path::FieldPath;
use crate::section::Section;

fn doc_with(kinds: &[EntityKind]) -> Document {
    let mut doc = Document::default();
    let mut ids = SequentialIds::default();
    for kind in kinds {
        doc.add(*kind, &mut ids);
    }
    doc
}

fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).expect("valid path")
}

#[test]
fn empty_number_input_leaves_key_absent() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let binding = FieldBinding::new(path("monitors.0.interval")).number();

    // Act
    apply(&mut doc, &binding, &RawValue::from("")).expect("apply");

    // Assert
    assert_eq!(doc.monitors[0].interval, None);
    let value = doc.to_value().expect("encode");
    assert!(value["monitors"][0].get("interval").is_none(), "no 0, no NaN, no key");
}

#[test]
fn number_input_is_stored_as_integer() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let binding = FieldBinding::new(path("monitors.0.maxRetries")).number();

    // Act
    apply(&mut doc, &binding, &RawValue::from(" 3 ")).expect("apply");

    // Assert
    assert_eq!(doc.monitors[0].max_retries, Some(3));
}

#[test]
fn unparseable_number_is_rejected_and_slot_untouched() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let before = doc.clone();
    let binding = FieldBinding::new(path("monitors.0.interval")).number();

    // Act
    let err = apply(&mut doc, &binding, &RawValue::from("thirty")).expect_err("must reject");

    // Assert
    assert!(matches!(err, BindingError::InvalidNumber { .. }));
    assert_eq!(doc, before);
}

#[test]
fn value_the_schema_cannot_hold_is_rejected() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Group]);
    let before = doc.clone();
    let threshold = FieldBinding::new(path("groups.0.degradedThreshold")).number();
    let interval = FieldBinding::new(path("groups.0.interval")).number();

    // Act
    let over = apply(&mut doc, &threshold, &RawValue::from("150"));
    let fractional = apply(&mut doc, &interval, &RawValue::from("1.5"));

    // Assert
    assert!(matches!(over, Err(BindingError::Schema { .. })));
    assert!(matches!(fractional, Err(BindingError::Schema { .. })));
    assert_eq!(doc, before);
}

#[test]
fn empty_as_absent_deletes_optional_key() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::StatusPage]);
    doc.status_pages[0].password = Some("hunter22".into());
    let binding = FieldBinding::new(path("status_pages.0.password")).empty_as_absent();

    // Act
    apply(&mut doc, &binding, &RawValue::from("")).expect("apply");

    // Assert
    assert_eq!(doc.status_pages[0].password, None);
}

#[test]
fn list_input_is_split_trimmed_and_compacted() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Channel]);
    let email = FieldPath::new("notifications").field("channels").field("id-1").field("email");
    let binding = FieldBinding::new(email.clone().field("to")).list().ensure(email);

    // Act
    apply(&mut doc, &binding, &RawValue::from(" a@example.com, ,b@example.com ,")).expect("apply");

    // Assert
    let channel = &doc.notifications.channels["id-1"];
    let to = &channel.email.as_ref().expect("email record created").to;
    assert_eq!(to, &vec!["a@example.com".to_string(), "b@example.com".to_string()]);
}

#[test]
fn checkbox_creates_nested_record_through_ensure() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Channel]);
    let smtp = FieldPath::new("notifications")
        .field("channels")
        .field("id-1")
        .field("email")
        .field("smtp");
    let binding = FieldBinding::new(smtp.clone().field("secure")).boolean().ensure(smtp);

    // Act
    apply(&mut doc, &binding, &RawValue::Checked(true)).expect("apply");

    // Assert
    let channel = &doc.notifications.channels["id-1"];
    let smtp = channel
        .email
        .as_ref()
        .and_then(|e| e.smtp.as_ref())
        .expect("smtp record created");
    assert!(smtp.secure);
}

#[test]
fn entity_id_binding_renames_and_rewrites_references() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor, EntityKind::Group]);
    doc.monitors[0].group_id = Some("id-2".into());
    let binding = FieldBinding::new(path("groups.0.id")).entity_id();

    // Act
    let dirty = apply(&mut doc, &binding, &RawValue::from("production")).expect("apply");

    // Assert
    assert_eq!(doc.groups[0].id, "production");
    assert_eq!(doc.monitors[0].group_id.as_deref(), Some("production"));
    assert!(dirty.contains(Section::Groups));
    assert!(dirty.contains(Section::Monitors));
}

#[test]
fn batched_edits_wait_for_flush() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let engine = BindingEngine::new(BindMode::Batched);
    let mut form = FormState::new();
    let name = FieldBinding::new(path("monitors.0.name")).updates_title();
    form.set(&name.path, RawValue::from("Production API"));

    // Act
    let staged = engine.change(&mut doc, &form, &name).expect("stage");
    let untouched = doc.monitors[0].name.clone();
    let outcome = engine.flush(&mut doc, &form, FlushScope::All);

    // Assert
    assert!(staged.is_empty());
    assert_eq!(untouched, "");
    assert_eq!(doc.monitors[0].name, "Production API");
    match outcome {
        FlushOutcome::Applied(report) => {
            assert_eq!(report.applied, 1);
            assert!(report.dirty.contains(Section::Monitors));
        }
        FlushOutcome::Skipped => panic!("flush should run"),
    }
}

#[test]
fn region_flush_leaves_other_regions_pending() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor, EntityKind::Group]);
    let engine = BindingEngine::new(BindMode::Batched);
    let mut form = FormState::new();
    let monitor = FieldBinding::new(path("monitors.0.name"));
    let group = FieldBinding::new(path("groups.0.name"));
    form.set(&monitor.path, RawValue::from("api"));
    form.set(&group.path, RawValue::from("prod"));
    engine.change(&mut doc, &form, &monitor).expect("stage");
    engine.change(&mut doc, &form, &group).expect("stage");

    // Act
    engine.flush(&mut doc, &form, FlushScope::Region(Section::Monitors));

    // Assert
    assert_eq!(doc.monitors[0].name, "api");
    assert_eq!(doc.groups[0].name, "");
    assert_eq!(engine.pending_paths(), vec![group.path.clone()]);
}

#[test]
fn rejected_write_does_not_poison_the_flush() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let engine = BindingEngine::new(BindMode::Batched);
    let mut form = FormState::new();
    let interval = FieldBinding::new(path("monitors.0.interval")).number();
    let name = FieldBinding::new(path("monitors.0.name"));
    form.set(&interval.path, RawValue::from("soon"));
    form.set(&name.path, RawValue::from("kept"));
    engine.change(&mut doc, &form, &interval).expect("stage");
    engine.change(&mut doc, &form, &name).expect("stage");

    // Act
    let outcome = engine.flush(&mut doc, &form, FlushScope::All);

    // Assert
    assert_eq!(doc.monitors[0].name, "kept");
    assert_eq!(doc.monitors[0].interval, Some(30));
    match outcome {
        FlushOutcome::Applied(report) => {
            assert_eq!(report.applied, 1);
            assert_eq!(report.rejected.len(), 1);
            assert_eq!(report.rejected[0].0, "monitors.0.interval");
        }
        FlushOutcome::Skipped => panic!("flush should run"),
    }
}

#[test]
fn reentrant_flush_is_a_no_op_and_guard_is_released() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let engine = BindingEngine::new(BindMode::Batched);
    let mut form = FormState::new();
    let name = FieldBinding::new(path("monitors.0.name")).updates_title();
    form.set(&name.path, RawValue::from("api"));
    engine.change(&mut doc, &form, &name).expect("stage");
    let inner_form = form.clone();
    let mut inner = None;

    // Act
    engine.flush_with(&mut doc, &form, FlushScope::All, |engine, doc, _dirty| {
        inner = Some(engine.flush(doc, &inner_form, FlushScope::All));
    });
    let after = engine.flush(&mut doc, &form, FlushScope::All);

    // Assert
    assert!(matches!(inner, Some(FlushOutcome::Skipped)));
    assert!(!engine.is_flushing());
    assert!(matches!(after, FlushOutcome::Applied(_)));
}

#[test]
fn attach_commits_pending_edits_of_the_region() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::RemoteAgent]);
    let engine = BindingEngine::new(BindMode::Batched);
    let mut form = FormState::new();
    let name = FieldBinding::new(path("PulseMonitors.0.name"));
    form.set(&name.path, RawValue::from("US West"));
    engine.change(&mut doc, &form, &name).expect("stage");

    // Act
    engine.attach(&mut doc, &form, Section::RemoteAgents, vec![name.clone()]);

    // Assert
    assert_eq!(doc.remote_agents[0].name, "US West");
    assert!(!engine.has_pending());
    assert_eq!(engine.binding(&name.path), Some(name));
}

#[test]
fn immediate_mode_applies_on_change() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let engine = BindingEngine::new(BindMode::Immediate);
    let mut form = FormState::new();
    let token = FieldBinding::new(path("monitors.0.token"));
    form.set(&token.path, RawValue::from("tk_prod"));

    // Act
    engine.change(&mut doc, &form, &token).expect("apply");

    // Assert
    assert_eq!(doc.monitors[0].token, "tk_prod");
    assert!(!engine.has_pending());
}

#[test]
fn misspelled_field_is_rejected_and_document_untouched() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let before = doc.clone();
    let binding = FieldBinding::new(path("monitors.0.nmae"));

    // Act
    let err = apply(&mut doc, &binding, &RawValue::from("Prod")).expect_err("must reject");

    // Assert
    assert!(matches!(err, BindingError::Schema { ref path, .. } if path == "monitors.0.nmae"));
    assert_eq!(doc, before);
}

#[test]
fn unknown_key_inside_a_typed_record_is_rejected() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor, EntityKind::Channel]);
    let before = doc.clone();
    let key = doc.notifications.channels.keys().next().cloned().expect("channel");
    let binding = FieldBinding::new(path(&format!("notifications.channels.{key}.discord.webhok")))
        .ensure(path(&format!("notifications.channels.{key}.discord")));

    // Act
    let result = apply(&mut doc, &binding, &RawValue::from("https://example.test"));

    // Assert
    assert!(matches!(result, Err(BindingError::Schema { .. })));
    assert_eq!(doc, before);
}

#[test]
fn imported_passthrough_key_cannot_be_edited_through_a_binding() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    doc.monitors[0]
        .extra
        .insert("description".into(), toml::Value::String("keep me".into()));
    let binding = FieldBinding::new(path("monitors.0.description"));

    // Act
    let result = apply(&mut doc, &binding, &RawValue::from("changed"));

    // Assert
    assert!(matches!(result, Err(BindingError::Schema { .. })));
    assert_eq!(
        doc.monitors[0].extra.get("description").and_then(|v| v.as_str()),
        Some("keep me")
    );
}

#[test]
fn false_and_empty_writes_to_modeled_fields_still_apply() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let enabled = FieldBinding::new(path("selfMonitoring.enabled")).boolean();
    let channels = FieldBinding::new(path("monitors.0.notificationChannels")).list();
    let unit = FieldBinding::new(path("monitors.0.custom2.unit")).ensure(path("monitors.0.custom2"));

    // Act
    apply(&mut doc, &enabled, &RawValue::from(false)).expect("boolean");
    apply(&mut doc, &channels, &RawValue::from("")).expect("list");
    apply(&mut doc, &unit, &RawValue::from("")).expect("ensured text");

    // Assert
    assert!(!doc.self_monitoring.enabled);
    assert!(doc.monitors[0].notification_channels.is_empty());
    assert_eq!(doc.monitors[0].custom2.as_ref().map(|c| c.unit.as_str()), Some(""));
}

#[test]
fn rerender_hint_cascades_after_a_rename() {
    // Arrange
    let mut doc = doc_with(&[EntityKind::Monitor]);
    let binding = FieldBinding::new(path("monitors.0.id"))
        .entity_id()
        .rerender(Section::Monitors);

    // Act
    let dirty = apply(&mut doc, &binding, &RawValue::from("api")).expect("rename");

    // Assert
    assert_eq!(doc.monitors[0].id, "api");
    assert!(dirty.contains(Section::Monitors));
    assert!(dirty.contains(Section::StatusPages));
}
