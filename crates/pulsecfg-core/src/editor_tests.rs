use crate::binding::{BindMode, RawValue};
use crate::config::EditorConfig;
use crate::document::{EntityKind, EntitySlot, TagField};
use crate::editor::{Confirmation, Editor, EditorError};
use crate::graph::{NodeKind, Scope};
use crate::ids::SequentialIds;
use crate::notice::NoticeLevel;
use crate::path::FieldPath;
use crate::section::Section;
use crate::view::Action;

fn editor(mode: BindMode) -> Editor<SequentialIds> {
    let config = EditorConfig {
        bind_mode: mode,
        ..EditorConfig::default()
    };
    Editor::with_ids(config, SequentialIds::default())
}

fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).expect("valid path")
}

#[test]
fn switching_tabs_commits_pending_edits_first() {
    // Arrange
    let mut editor = editor(BindMode::Batched);
    editor
        .input(&path("server.port"), RawValue::from("8080"))
        .expect("stage port");
    let before = editor.document().server.port;

    // Act
    editor.select_tab(Section::Monitors);

    // Assert
    assert_eq!(before, None);
    assert_eq!(editor.document().server.port, Some(8080));
    assert_eq!(editor.tab(), Section::Monitors);
    assert!(!editor.has_pending());
}

#[test]
fn failed_import_keeps_document_and_raises_notice() {
    // Arrange
    let mut editor = editor(BindMode::Batched);
    editor.load_example().expect("load example");
    let before = editor.document().clone();

    // Act
    let result = editor.import("[[monitors]\nid =");

    // Assert
    assert!(matches!(result, Err(EditorError::Codec(_))));
    assert_eq!(editor.document(), &before);
    let notice = editor.notices().latest().expect("notice raised");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.starts_with("Failed to parse TOML: "));
}

#[test]
fn export_flushes_and_names_the_file() {
    // Arrange
    let mut editor = editor(BindMode::Batched);
    editor.load_example().expect("load example");
    editor
        .input(&path("logger.level"), RawValue::from("2"))
        .expect("stage level");

    // Act
    let export = editor.export().expect("export");

    // Assert
    assert_eq!(export.file_name, "config.toml");
    assert!(export.contents.contains("level = 2"));
    assert_eq!(
        editor.notices().latest().map(|n| n.message.as_str()),
        Some("Configuration exported as config.toml")
    );
}

#[test]
fn reset_requires_confirmation() {
    // Arrange
    let mut editor = editor(BindMode::Batched);
    editor.load_example().expect("load example");

    // Act
    let declined = editor.reset(Confirmation::Declined);
    let kept = editor.badges().monitors;
    let confirmed = editor.reset(Confirmation::Confirmed);

    // Assert
    assert!(!declined);
    assert_eq!(kept, 4);
    assert!(confirmed);
    assert_eq!(editor.badges().monitors, 0);
}

#[test]
fn removing_channel_refreshes_dependent_views() {
    // Arrange
    let mut editor = editor(BindMode::Batched);
    editor.load_example().expect("load example");

    // Act
    let dirty = editor
        .dispatch(Action::Remove(EntitySlot::Channel("ops-team".into())))
        .expect("remove channel");

    // Assert
    assert!(dirty.contains(Section::Monitors));
    let monitors = editor.view(Section::Monitors).expect("monitors view");
    let pickers = monitors.tag_pickers();
    assert!(pickers
        .iter()
        .filter(|p| p.field == TagField::MonitorChannels)
        .all(|p| !p.candidates.contains(&"ops-team".to_string())));
    assert!(editor.document().groups[1].notification_channels == vec!["critical".to_string()]);
}

#[test]
fn channel_id_input_renames_after_other_edits_land() {
    // Arrange
    let mut editor = editor(BindMode::Batched);
    editor.load_example().expect("load example");
    editor.select_tab(Section::Notifications);
    editor
        .input(&path("notifications.channels.ops-team.name"), RawValue::from("Operations"))
        .expect("stage name");
    editor
        .input(&path("notifications.channels.ops-team.id"), RawValue::from("ops"))
        .expect("stage id");

    // Act
    editor.flush();

    // Assert
    let doc = editor.document();
    let channel = &doc.notifications.channels["ops"];
    assert_eq!(channel.name, "Operations");
    assert!(!doc.notifications.channels.contains_key("ops-team"));
    assert_eq!(
        doc.groups[1].notification_channels,
        vec!["critical".to_string(), "ops".to_string()]
    );
}

#[test]
fn invalid_number_in_immediate_mode_is_reported() {
    // Arrange
    let mut editor = editor(BindMode::Immediate);
    editor.dispatch(Action::Add(EntityKind::Monitor)).expect("add monitor");

    // Act
    let result = editor.input(&path("monitors.0.interval"), RawValue::from("often"));

    // Assert
    assert!(matches!(result, Err(EditorError::Binding(_))));
    assert_eq!(editor.document().monitors[0].interval, Some(30));
    assert_eq!(editor.notices().latest().map(|n| n.level), Some(NoticeLevel::Error));
}

#[test]
fn input_on_unrendered_path_is_refused() {
    let mut editor = editor(BindMode::Immediate);

    let result = editor.input(&path("monitors.0.name"), RawValue::from("api"));

    assert!(matches!(result, Err(EditorError::Unbound(_))));
}

#[test]
fn added_entities_get_fresh_bindings() {
    // Arrange
    let mut editor = editor(BindMode::Immediate);

    // Act
    editor.dispatch(Action::Add(EntityKind::RemoteAgent)).expect("add agent");
    editor
        .input(&path("PulseMonitors.0.name"), RawValue::from("US West"))
        .expect("name agent");

    // Assert
    assert_eq!(editor.document().remote_agents[0].name, "US West");
    assert_eq!(editor.document().remote_agents[0].token, "token-1");
    let view = editor.view(Section::RemoteAgents).expect("agents view");
    assert_eq!(view.cards()[0].title, "US West");
}

#[test]
fn graph_reflects_unflushed_edits() {
    // Arrange
    let mut editor = editor(BindMode::Batched);
    editor.load_example().expect("load example");
    editor.select_tab(Section::Monitors);
    editor
        .input(&path("monitors.1.groupId"), RawValue::from(""))
        .expect("stage group change");

    // Act
    let graph = editor.graph(Scope::StatusPage("public"));

    // Assert
    assert!(graph.contains(NodeKind::Monitor, "api-prod"));
    assert!(!graph.contains(NodeKind::Monitor, "game-server"));
}

#[test]
fn dismissing_a_notice_reveals_the_previous_one() {
    // Arrange
    let mut editor = editor(BindMode::Immediate);
    editor.notices_mut().push_info("Configuration imported");
    editor.notices_mut().push_error("Export failed");

    // Act
    let dismissed = editor.notices_mut().dismiss();

    // Assert
    assert_eq!(dismissed.map(|n| n.level), Some(NoticeLevel::Error));
    assert_eq!(
        editor.notices().latest().map(|n| n.message.as_str()),
        Some("Configuration imported")
    );
}

#[test]
fn renaming_a_monitor_from_its_card_rerenders_dependent_sections() {
    // Arrange
    let mut editor = editor(BindMode::Immediate);
    editor.select_tab(Section::Monitors);
    editor.dispatch(Action::Add(EntityKind::Monitor)).expect("add monitor");

    // Act
    let dirty = editor
        .input(&path("monitors.0.id"), RawValue::from("api"))
        .expect("rename");

    // Assert
    assert_eq!(editor.document().monitors[0].id, "api");
    assert!(dirty.contains(Section::StatusPages));
}
