mod channel;
mod integrity;
mod probe;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::path::FieldPath;
use crate::section::Section;

pub use channel::{Channel, Discord, Email, Ntfy, Smtp, Telegram};
pub use integrity::{DanglingRef, IntegrityError};
pub use probe::{
    HttpMethod, HttpProbe, IcmpProbe, ImapProbe, Probe, Protocol, SmtpProbe, SocketProbe, UdpProbe,
    UrlProbe,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "clickhouse", default)]
    pub storage: Storage,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub logger: Logger,
    #[serde(default)]
    pub missing_pulse_detector: MissingPulseDetector,
    #[serde(default)]
    pub self_monitoring: SelfMonitoring,
    #[serde(default)]
    pub monitors: Vec<Monitor>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(rename = "status_pages", default)]
    pub status_pages: Vec<StatusPage>,
    #[serde(default)]
    pub notifications: Notifications,
    #[serde(rename = "PulseMonitors", default)]
    pub remote_agents: Vec<RemoteAgent>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reload_token: Option<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Logger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingPulseDetector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfMonitoring {
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub backfill_on_recovery: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_strategy: Option<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resend_notification: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notification_channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pulse_monitors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom1: Option<CustomMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom2: Option<CustomMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom3: Option<CustomMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse: Option<Probe>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Monitor {
    pub fn custom_metrics(&self) -> [Option<&CustomMetric>; 3] {
        [self.custom1.as_ref(), self.custom2.as_ref(), self.custom3.as_ref()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomMetric {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    AnyUp,
    AllUp,
    #[default]
    Percentage,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::AnyUp, Strategy::AllUp, Strategy::Percentage];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::AnyUp => "any-up",
            Strategy::AllUp => "all-up",
            Strategy::Percentage => "percentage",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(
        default,
        deserialize_with = "percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub degraded_threshold: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resend_notification: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notification_channels: Vec<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notifications {
    #[serde(default)]
    pub channels: IndexMap<String, Channel>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteAgent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub token: String,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Monitor,
    Group,
    StatusPage,
    Channel,
    RemoteAgent,
}

impl EntityKind {
    pub fn section(self) -> Section {
        match self {
            EntityKind::Monitor => Section::Monitors,
            EntityKind::Group => Section::Groups,
            EntityKind::StatusPage => Section::StatusPages,
            EntityKind::Channel => Section::Notifications,
            EntityKind::RemoteAgent => Section::RemoteAgents,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Monitor => "monitor",
            EntityKind::Group => "group",
            EntityKind::StatusPage => "status page",
            EntityKind::Channel => "notification channel",
            EntityKind::RemoteAgent => "PulseMonitor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntitySlot {
    Monitor(usize),
    Group(usize),
    StatusPage(usize),
    Channel(String),
    RemoteAgent(usize),
}

impl EntitySlot {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntitySlot::Monitor(_) => EntityKind::Monitor,
            EntitySlot::Group(_) => EntityKind::Group,
            EntitySlot::StatusPage(_) => EntityKind::StatusPage,
            EntitySlot::Channel(_) => EntityKind::Channel,
            EntitySlot::RemoteAgent(_) => EntityKind::RemoteAgent,
        }
    }

    pub fn path(&self) -> FieldPath {
        match self {
            EntitySlot::Monitor(i) => FieldPath::new("monitors").at(*i),
            EntitySlot::Group(i) => FieldPath::new("groups").at(*i),
            EntitySlot::StatusPage(i) => FieldPath::new("status_pages").at(*i),
            EntitySlot::Channel(key) => FieldPath::new("notifications")
                .field("channels")
                .field(key.clone()),
            EntitySlot::RemoteAgent(i) => FieldPath::new("PulseMonitors").at(*i),
        }
    }

    pub fn id_path(&self) -> FieldPath {
        self.path().field("id")
    }

    pub fn from_id_path(path: &FieldPath) -> Option<EntitySlot> {
        match path.segments() {
            [root, index, last] if last == "id" => {
                let index = index.parse::<usize>().ok()?;
                match root.as_str() {
                    "monitors" => Some(EntitySlot::Monitor(index)),
                    "groups" => Some(EntitySlot::Group(index)),
                    "status_pages" => Some(EntitySlot::StatusPage(index)),
                    "PulseMonitors" => Some(EntitySlot::RemoteAgent(index)),
                    _ => None,
                }
            }
            [root, channels, key, last] if root == "notifications" && channels == "channels" && last == "id" => {
                Some(EntitySlot::Channel(key.clone()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagField {
    MonitorChannels,
    MonitorAgents,
    GroupChannels,
    StatusPageItems,
}

impl TagField {
    pub fn section(self) -> Section {
        match self {
            TagField::MonitorChannels | TagField::MonitorAgents => Section::Monitors,
            TagField::GroupChannels => Section::Groups,
            TagField::StatusPageItems => Section::StatusPages,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            TagField::MonitorChannels => "monitor-channels",
            TagField::MonitorAgents => "monitor-agents",
            TagField::GroupChannels => "group-channels",
            TagField::StatusPageItems => "status-page-items",
        }
    }

    pub fn prop(self) -> &'static str {
        match self {
            TagField::MonitorChannels | TagField::GroupChannels => "notificationChannels",
            TagField::MonitorAgents => "pulseMonitors",
            TagField::StatusPageItems => "items",
        }
    }

    pub fn path(self, index: usize) -> FieldPath {
        let root = match self {
            TagField::MonitorChannels | TagField::MonitorAgents => "monitors",
            TagField::GroupChannels => "groups",
            TagField::StatusPageItems => "status_pages",
        };
        FieldPath::new(root).at(index).field(self.prop())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub monitors: usize,
    pub groups: usize,
    pub status_pages: usize,
    pub channels: usize,
    pub remote_agents: usize,
}

impl Counts {
    pub fn of(&self, section: Section) -> Option<usize> {
        match section {
            Section::General => None,
            Section::Monitors => Some(self.monitors),
            Section::Groups => Some(self.groups),
            Section::StatusPages => Some(self.status_pages),
            Section::Notifications => Some(self.channels),
            Section::RemoteAgents => Some(self.remote_agents),
        }
    }
}

impl Document {
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn counts(&self) -> Counts {
        Counts {
            monitors: self.monitors.len(),
            groups: self.groups.len(),
            status_pages: self.status_pages.len(),
            channels: self.notifications.channels.len(),
            remote_agents: self.remote_agents.len(),
        }
    }

    pub fn monitor_by_id(&self, id: &str) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.id == id)
    }

    pub fn group_by_id(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn channel_by_id(&self, id: &str) -> Option<(&String, &Channel)> {
        self.notifications
            .channels
            .iter()
            .find(|(key, ch)| ch.reference_id(key) == id)
    }

    pub fn remote_agent_by_id(&self, id: &str) -> Option<&RemoteAgent> {
        self.remote_agents.iter().find(|a| a.id == id)
    }

    pub fn normalized(&self) -> Document {
        let mut doc = self.clone();

        blank_to_none(&mut doc.server.proxy);
        blank_to_none(&mut doc.server.reload_token);
        blank_to_none(&mut doc.self_monitoring.id);
        blank_to_none(&mut doc.self_monitoring.latency_strategy);

        for monitor in &mut doc.monitors {
            for slot in [&mut monitor.custom1, &mut monitor.custom2, &mut monitor.custom3] {
                if slot.as_ref().is_some_and(|c| c.id.trim().is_empty()) {
                    *slot = None;
                }
            }
            blank_to_none(&mut monitor.group_id);
        }

        for group in &mut doc.groups {
            blank_to_none(&mut group.parent_id);
        }

        for page in &mut doc.status_pages {
            blank_to_none(&mut page.password);
        }

        for channel in doc.notifications.channels.values_mut() {
            blank_to_none(&mut channel.description);
            if channel.discord.as_ref().is_some_and(Discord::is_blank) {
                channel.discord = None;
            }
            if let Some(email) = channel.email.as_mut() {
                if email.smtp.as_ref().is_some_and(Smtp::is_blank) {
                    email.smtp = None;
                }
            }
            if channel.email.as_ref().is_some_and(Email::is_blank) {
                channel.email = None;
            }
            if channel.ntfy.as_ref().is_some_and(Ntfy::is_blank) {
                channel.ntfy = None;
            }
            if channel.telegram.as_ref().is_some_and(Telegram::is_blank) {
                channel.telegram = None;
            }
        }

        doc
    }

    pub fn without_extras(&self) -> Document {
        let mut doc = self.clone();
        doc.extra.clear();
        doc.storage.extra.clear();
        doc.server.extra.clear();
        doc.logger.extra.clear();
        doc.missing_pulse_detector.extra.clear();
        doc.self_monitoring.extra.clear();
        doc.notifications.extra.clear();
        for monitor in &mut doc.monitors {
            monitor.extra.clear();
        }
        for group in &mut doc.groups {
            group.extra.clear();
        }
        for page in &mut doc.status_pages {
            page.extra.clear();
        }
        for channel in doc.notifications.channels.values_mut() {
            channel.extra.clear();
        }
        for agent in &mut doc.remote_agents {
            agent.extra.clear();
        }
        doc
    }
}

fn blank_to_none(field: &mut Option<String>) {
    if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
        *field = None;
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<u8>::deserialize(deserializer)?;
    match value {
        Some(p) if p > 100 => Err(D::Error::custom(format!(
            "degraded threshold {p} is outside 0-100"
        ))),
        other => Ok(other),
    }
}
