use crate::codec;
use crate::document::{
    Channel, Document, EntityKind, EntitySlot, IntegrityError, Probe, Protocol, Strategy, TagField,
};
use crate::ids::SequentialIds;
use crate::section::Section;

fn channel(id: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: id.to_string(),
        enabled: true,
        ..Channel::default()
    }
}

fn doc_with_channels() -> Document {
    let mut doc = Document::default();
    let mut ids = SequentialIds::default();
    doc.add(EntityKind::Monitor, &mut ids);
    doc.add(EntityKind::Group, &mut ids);
    doc.monitors[0].id = "m1".into();
    doc.groups[0].id = "g1".into();
    for id in ["critical", "ops"] {
        doc.notifications.channels.insert(id.to_string(), channel(id));
    }
    doc.monitors[0].notification_channels = vec!["critical".into(), "ops".into()];
    doc.groups[0].notification_channels = vec!["critical".into()];
    doc
}

#[test]
fn add_uses_creation_defaults() {
    // Arrange
    let mut doc = Document::default();
    let mut ids = SequentialIds::default();

    // Act
    let (monitor, dirty) = doc.add(EntityKind::Monitor, &mut ids);
    let (group, _) = doc.add(EntityKind::Group, &mut ids);
    let (channel, _) = doc.add(EntityKind::Channel, &mut ids);

    // Assert
    assert_eq!(monitor, EntitySlot::Monitor(0));
    assert_eq!(group, EntitySlot::Group(0));
    assert_eq!(channel, EntitySlot::Channel("id-3".into()));
    let m = &doc.monitors[0];
    assert_eq!((m.id.as_str(), m.token.as_str()), ("id-1", "token-1"));
    assert_eq!((m.interval, m.max_retries, m.resend_notification), (Some(30), Some(0), Some(0)));
    let g = &doc.groups[0];
    assert_eq!(g.strategy, Strategy::Percentage);
    assert_eq!((g.degraded_threshold, g.interval, g.resend_notification), (Some(50), Some(60), Some(0)));
    let ch = &doc.notifications.channels["id-3"];
    assert_eq!(ch.id, "id-3");
    assert!(ch.enabled);
    assert!(dirty.contains(Section::Monitors));
    assert!(dirty.contains(Section::StatusPages));
}

#[test]
fn removing_channel_strips_it_from_every_list() {
    // Arrange
    let mut doc = doc_with_channels();

    // Act
    let dirty = doc
        .remove(&EntitySlot::Channel("critical".into()))
        .expect("remove critical");

    // Assert
    assert_eq!(doc.monitors[0].notification_channels, vec!["ops".to_string()]);
    assert!(doc.groups[0].notification_channels.is_empty());
    assert!(!doc.notifications.channels.contains_key("critical"));
    assert_eq!(dirty.iter().collect::<Vec<_>>(), vec![Section::Notifications, Section::Monitors, Section::Groups]);
}

#[test]
fn removing_last_reference_deletes_the_field() {
    // Arrange
    let mut doc = doc_with_channels();
    doc.remove(&EntitySlot::Channel("critical".into())).expect("remove critical");

    // Act
    doc.remove(&EntitySlot::Channel("ops".into())).expect("remove ops");

    // Assert
    let value = doc.to_value().expect("encode");
    assert!(value["monitors"][0].get("notificationChannels").is_none());
    let text = codec::export(&doc).expect("export");
    assert!(!text.contains("notificationChannels"));
}

#[test]
fn renaming_channel_rewrites_references_and_keeps_position() {
    // Arrange
    let mut doc = doc_with_channels();

    // Act
    doc.rename(&EntitySlot::Channel("critical".into()), "alerts")
        .expect("rename");

    // Assert
    let keys: Vec<&str> = doc.notifications.channels.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["alerts", "ops"]);
    assert_eq!(doc.notifications.channels["alerts"].id, "alerts");
    assert_eq!(doc.monitors[0].notification_channels, vec!["alerts".to_string(), "ops".to_string()]);
    assert_eq!(doc.groups[0].notification_channels, vec!["alerts".to_string()]);
}

#[test]
fn rename_onto_existing_id_is_rejected() {
    // Arrange
    let mut doc = doc_with_channels();
    let before = doc.clone();

    // Act
    let err = doc
        .rename(&EntitySlot::Channel("critical".into()), "ops")
        .expect_err("duplicate id");

    // Assert
    assert!(matches!(err, IntegrityError::DuplicateId { .. }));
    assert_eq!(doc, before);
}

#[test]
fn rename_to_blank_id_is_rejected() {
    let mut doc = doc_with_channels();
    let err = doc.rename(&EntitySlot::Monitor(0), "  ").expect_err("blank id");
    assert!(matches!(err, IntegrityError::BlankId { .. }));
    assert_eq!(doc.monitors[0].id, "m1");
}

#[test]
fn renaming_monitor_updates_status_page_items() {
    // Arrange
    let mut doc = doc_with_channels();
    doc.add(EntityKind::StatusPage, &mut SequentialIds::default());
    doc.status_pages[0].items = vec!["g1".into(), "m1".into()];

    // Act
    doc.rename(&EntitySlot::Monitor(0), "api").expect("rename");

    // Assert
    assert_eq!(doc.status_pages[0].items, vec!["g1".to_string(), "api".to_string()]);
}

#[test]
fn removing_group_clears_membership_and_parents() {
    // Arrange
    let mut doc = doc_with_channels();
    let mut ids = SequentialIds::default();
    doc.add(EntityKind::Group, &mut ids);
    doc.add(EntityKind::StatusPage, &mut ids);
    doc.monitors[0].group_id = Some("g1".into());
    doc.groups[1].parent_id = Some("g1".into());
    doc.status_pages[0].items = vec!["g1".into(), "m1".into()];

    // Act
    doc.remove(&EntitySlot::Group(0)).expect("remove group");

    // Assert
    assert_eq!(doc.monitors[0].group_id, None);
    assert_eq!(doc.groups[0].parent_id, None);
    assert_eq!(doc.status_pages[0].items, vec!["m1".to_string()]);
}

#[test]
fn removing_remote_agent_strips_monitor_references() {
    // Arrange
    let mut doc = doc_with_channels();
    doc.add(EntityKind::RemoteAgent, &mut SequentialIds::default());
    doc.monitors[0].pulse_monitors = vec!["id-1".into()];

    // Act
    doc.remove(&EntitySlot::RemoteAgent(0)).expect("remove agent");

    // Assert
    assert!(doc.monitors[0].pulse_monitors.is_empty());
}

#[test]
fn remove_out_of_range_reports_missing_entity() {
    let mut doc = Document::default();
    let err = doc.remove(&EntitySlot::Group(3)).expect_err("nothing there");
    assert!(matches!(err, IntegrityError::NoSuchEntity { .. }));
}

#[test]
fn tags_have_set_semantics() {
    // Arrange
    let mut doc = doc_with_channels();

    // Act
    doc.add_tag(TagField::MonitorChannels, 0, "ops").expect("add existing");
    doc.add_tag(TagField::MonitorChannels, 0, "  pager ").expect("add new");
    doc.add_tag(TagField::MonitorChannels, 0, "   ").expect("add blank");
    doc.remove_tag(TagField::MonitorChannels, 0, "critical").expect("remove");

    // Assert
    assert_eq!(
        doc.tag_list(TagField::MonitorChannels, 0),
        Some(&vec!["ops".to_string(), "pager".to_string()])
    );
}

#[test]
fn setting_protocol_replaces_the_probe() {
    // Arrange
    let mut doc = doc_with_channels();
    doc.set_protocol(0, Some(Protocol::Tcp)).expect("tcp");
    if let Some(Probe::Tcp(tcp)) = doc.monitors[0].pulse.as_mut() {
        tcp.host = Some("db.internal".into());
    }

    // Act
    doc.set_protocol(0, Some(Protocol::Icmp)).expect("icmp");
    let icmp = doc.monitors[0].pulse.clone();
    doc.set_protocol(0, None).expect("none");

    // Assert
    assert_eq!(icmp, Some(Protocol::Icmp.empty_probe()));
    assert_eq!(doc.monitors[0].pulse, None);
}

#[test]
fn dangling_references_are_reported() {
    // Arrange
    let mut doc = doc_with_channels();
    doc.monitors[0].group_id = Some("ghost".into());
    doc.monitors[0].pulse_monitors = vec!["nowhere".into()];

    // Act
    let dangling = doc.dangling_references();

    // Assert
    let targets: Vec<&str> = dangling.iter().map(|d| d.target.as_str()).collect();
    assert_eq!(targets, vec!["ghost", "nowhere"]);
    assert_eq!(dangling[0].to_string(), "monitor 'm1' groupId -> 'ghost'");
}
