use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use super::{
    Channel, Document, EntityKind, EntitySlot, Group, Monitor, Protocol, RemoteAgent, StatusPage,
    Strategy, TagField,
};
use crate::ids::IdSource;
use crate::section::{Dirty, Section};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("no {kind} at {path}")]
    NoSuchEntity { kind: &'static str, path: String },
    #[error("{kind} id must not be blank")]
    BlankId { kind: &'static str },
    #[error("{kind} id '{id}' is already in use")]
    DuplicateId { kind: &'static str, id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    pub owner: EntityKind,
    pub owner_id: String,
    pub field: &'static str,
    pub target: String,
}

impl fmt::Display for DanglingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' {} -> '{}'",
            self.owner.label(),
            self.owner_id,
            self.field,
            self.target
        )
    }
}

impl Document {
    pub fn add(&mut self, kind: EntityKind, ids: &mut dyn IdSource) -> (EntitySlot, Dirty) {
        let id = ids.entity_id();
        let slot = match kind {
            EntityKind::Monitor => {
                self.monitors.push(Monitor {
                    id: id.clone(),
                    token: ids.token(),
                    interval: Some(30),
                    max_retries: Some(0),
                    resend_notification: Some(0),
                    ..Monitor::default()
                });
                EntitySlot::Monitor(self.monitors.len() - 1)
            }
            EntityKind::Group => {
                self.groups.push(Group {
                    id: id.clone(),
                    strategy: Strategy::Percentage,
                    degraded_threshold: Some(50),
                    interval: Some(60),
                    resend_notification: Some(0),
                    ..Group::default()
                });
                EntitySlot::Group(self.groups.len() - 1)
            }
            EntityKind::StatusPage => {
                self.status_pages.push(StatusPage {
                    id: id.clone(),
                    ..StatusPage::default()
                });
                EntitySlot::StatusPage(self.status_pages.len() - 1)
            }
            EntityKind::Channel => {
                self.notifications.channels.insert(
                    id.clone(),
                    Channel {
                        id: id.clone(),
                        enabled: true,
                        ..Channel::default()
                    },
                );
                EntitySlot::Channel(id.clone())
            }
            EntityKind::RemoteAgent => {
                self.remote_agents.push(RemoteAgent {
                    id: id.clone(),
                    token: ids.token(),
                    ..RemoteAgent::default()
                });
                EntitySlot::RemoteAgent(self.remote_agents.len() - 1)
            }
        };
        info!(kind = kind.label(), %id, "entity added");
        (slot, Dirty::cascade(kind.section()))
    }

    pub fn remove(&mut self, slot: &EntitySlot) -> Result<Dirty, IntegrityError> {
        let kind = slot.kind();
        let removed_id = match slot {
            EntitySlot::Monitor(i) => take(&mut self.monitors, *i, slot)?.id,
            EntitySlot::Group(i) => take(&mut self.groups, *i, slot)?.id,
            EntitySlot::StatusPage(i) => take(&mut self.status_pages, *i, slot)?.id,
            EntitySlot::RemoteAgent(i) => take(&mut self.remote_agents, *i, slot)?.id,
            EntitySlot::Channel(key) => {
                let channel = self
                    .notifications
                    .channels
                    .shift_remove(key)
                    .ok_or_else(|| missing(slot))?;
                if !channel.id.is_empty() && channel.id != *key {
                    self.rewrite_references(kind, key, None);
                }
                channel.reference_id(key).to_string()
            }
        };

        let stripped = if removed_id.is_empty() {
            0
        } else {
            self.rewrite_references(kind, &removed_id, None)
        };
        info!(kind = kind.label(), id = %removed_id, stripped, "entity removed");
        Ok(Dirty::cascade(kind.section()))
    }

    /// Changes an entity's id and rewrites every reference to the old id.
    ///
    /// Channels are also re-keyed in place so the map key keeps matching the id.
    pub fn rename(&mut self, slot: &EntitySlot, new_id: &str) -> Result<Dirty, IntegrityError> {
        let kind = slot.kind();
        if new_id.trim().is_empty() {
            return Err(IntegrityError::BlankId { kind: kind.label() });
        }
        let old_id = self.id_at(slot).ok_or_else(|| missing(slot))?;
        if old_id == new_id {
            return Ok(Dirty::none());
        }
        if self.id_in_use(kind, new_id, slot) {
            return Err(IntegrityError::DuplicateId {
                kind: kind.label(),
                id: new_id.to_string(),
            });
        }

        match slot {
            EntitySlot::Monitor(i) => self.monitors[*i].id = new_id.to_string(),
            EntitySlot::Group(i) => self.groups[*i].id = new_id.to_string(),
            EntitySlot::StatusPage(i) => self.status_pages[*i].id = new_id.to_string(),
            EntitySlot::RemoteAgent(i) => self.remote_agents[*i].id = new_id.to_string(),
            EntitySlot::Channel(key) => {
                let channels = &mut self.notifications.channels;
                let index = channels.get_index_of(key).ok_or_else(|| missing(slot))?;
                let (_, mut channel) = channels
                    .shift_remove_index(index)
                    .ok_or_else(|| missing(slot))?;
                channel.id = new_id.to_string();
                channels.shift_insert(index, new_id.to_string(), channel);
            }
        }

        let rewritten = if old_id.is_empty() {
            0
        } else {
            self.rewrite_references(kind, &old_id, Some(new_id))
        };
        info!(kind = kind.label(), from = %old_id, to = %new_id, rewritten, "entity renamed");
        Ok(Dirty::cascade(kind.section()))
    }

    pub fn add_tag(&mut self, field: TagField, index: usize, value: &str) -> Result<Dirty, IntegrityError> {
        let value = value.trim();
        let list = self
            .tag_list_mut(field, index)
            .ok_or_else(|| missing_tag_owner(field, index))?;
        if !value.is_empty() && !list.iter().any(|v| v == value) {
            list.push(value.to_string());
            debug!(field = field.prop(), index, value, "tag added");
        }
        Ok(Dirty::cascade(field.section()))
    }

    pub fn remove_tag(&mut self, field: TagField, index: usize, value: &str) -> Result<Dirty, IntegrityError> {
        let list = self
            .tag_list_mut(field, index)
            .ok_or_else(|| missing_tag_owner(field, index))?;
        list.retain(|v| v != value);
        debug!(field = field.prop(), index, value, "tag removed");
        Ok(Dirty::cascade(field.section()))
    }

    pub fn tag_list(&self, field: TagField, index: usize) -> Option<&Vec<String>> {
        match field {
            TagField::MonitorChannels => self.monitors.get(index).map(|m| &m.notification_channels),
            TagField::MonitorAgents => self.monitors.get(index).map(|m| &m.pulse_monitors),
            TagField::GroupChannels => self.groups.get(index).map(|g| &g.notification_channels),
            TagField::StatusPageItems => self.status_pages.get(index).map(|p| &p.items),
        }
    }

    fn tag_list_mut(&mut self, field: TagField, index: usize) -> Option<&mut Vec<String>> {
        match field {
            TagField::MonitorChannels => self
                .monitors
                .get_mut(index)
                .map(|m| &mut m.notification_channels),
            TagField::MonitorAgents => self.monitors.get_mut(index).map(|m| &mut m.pulse_monitors),
            TagField::GroupChannels => self
                .groups
                .get_mut(index)
                .map(|g| &mut g.notification_channels),
            TagField::StatusPageItems => self.status_pages.get_mut(index).map(|p| &mut p.items),
        }
    }

    /// Replaces the monitor's probe with an empty record of `protocol`.
    /// Fields of the previous protocol are discarded, not merged.
    pub fn set_protocol(&mut self, monitor: usize, protocol: Option<Protocol>) -> Result<Dirty, IntegrityError> {
        let slot = EntitySlot::Monitor(monitor);
        let entry = self.monitors.get_mut(monitor).ok_or_else(|| missing(&slot))?;
        entry.pulse = protocol.map(Protocol::empty_probe);
        debug!(monitor, protocol = ?protocol, "probe protocol set");
        Ok(Dirty::only(Section::Monitors))
    }

    pub fn id_at(&self, slot: &EntitySlot) -> Option<String> {
        match slot {
            EntitySlot::Monitor(i) => self.monitors.get(*i).map(|m| m.id.clone()),
            EntitySlot::Group(i) => self.groups.get(*i).map(|g| g.id.clone()),
            EntitySlot::StatusPage(i) => self.status_pages.get(*i).map(|p| p.id.clone()),
            EntitySlot::RemoteAgent(i) => self.remote_agents.get(*i).map(|a| a.id.clone()),
            EntitySlot::Channel(key) => self
                .notifications
                .channels
                .get(key)
                .map(|ch| ch.reference_id(key).to_string()),
        }
    }

    pub fn dangling_references(&self) -> Vec<DanglingRef> {
        let mut out = Vec::new();
        let channel_exists = |id: &str| self.channel_by_id(id).is_some();

        for monitor in &self.monitors {
            let owner = |field, target: &str| DanglingRef {
                owner: EntityKind::Monitor,
                owner_id: monitor.id.clone(),
                field,
                target: target.to_string(),
            };
            if let Some(group) = monitor.group_id.as_deref() {
                if self.group_by_id(group).is_none() {
                    out.push(owner("groupId", group));
                }
            }
            for id in &monitor.notification_channels {
                if !channel_exists(id) {
                    out.push(owner("notificationChannels", id));
                }
            }
            for id in &monitor.pulse_monitors {
                if self.remote_agent_by_id(id).is_none() {
                    out.push(owner("pulseMonitors", id));
                }
            }
        }

        for group in &self.groups {
            let owner = |field, target: &str| DanglingRef {
                owner: EntityKind::Group,
                owner_id: group.id.clone(),
                field,
                target: target.to_string(),
            };
            if let Some(parent) = group.parent_id.as_deref() {
                if self.group_by_id(parent).is_none() {
                    out.push(owner("parentId", parent));
                }
            }
            for id in &group.notification_channels {
                if !channel_exists(id) {
                    out.push(owner("notificationChannels", id));
                }
            }
        }

        for page in &self.status_pages {
            for item in &page.items {
                if self.group_by_id(item).is_none() && self.monitor_by_id(item).is_none() {
                    out.push(DanglingRef {
                        owner: EntityKind::StatusPage,
                        owner_id: page.id.clone(),
                        field: "items",
                        target: item.clone(),
                    });
                }
            }
        }

        out
    }

    fn id_in_use(&self, kind: EntityKind, id: &str, except: &EntitySlot) -> bool {
        match kind {
            EntityKind::Monitor => self
                .monitors
                .iter()
                .enumerate()
                .any(|(i, m)| m.id == id && *except != EntitySlot::Monitor(i)),
            EntityKind::Group => self
                .groups
                .iter()
                .enumerate()
                .any(|(i, g)| g.id == id && *except != EntitySlot::Group(i)),
            EntityKind::StatusPage => self
                .status_pages
                .iter()
                .enumerate()
                .any(|(i, p)| p.id == id && *except != EntitySlot::StatusPage(i)),
            EntityKind::RemoteAgent => self
                .remote_agents
                .iter()
                .enumerate()
                .any(|(i, a)| a.id == id && *except != EntitySlot::RemoteAgent(i)),
            EntityKind::Channel => self.notifications.channels.iter().any(|(key, ch)| {
                (key == id || ch.id == id) && *except != EntitySlot::Channel(key.clone())
            }),
        }
    }

    fn rewrite_references(&mut self, kind: EntityKind, old: &str, new: Option<&str>) -> usize {
        let mut touched = 0;
        match kind {
            EntityKind::Channel => {
                for monitor in &mut self.monitors {
                    touched += rewrite_list(&mut monitor.notification_channels, old, new);
                }
                for group in &mut self.groups {
                    touched += rewrite_list(&mut group.notification_channels, old, new);
                }
            }
            EntityKind::RemoteAgent => {
                for monitor in &mut self.monitors {
                    touched += rewrite_list(&mut monitor.pulse_monitors, old, new);
                }
            }
            EntityKind::Group => {
                for monitor in &mut self.monitors {
                    touched += rewrite_option(&mut monitor.group_id, old, new);
                }
                for group in &mut self.groups {
                    touched += rewrite_option(&mut group.parent_id, old, new);
                }
                for page in &mut self.status_pages {
                    touched += rewrite_list(&mut page.items, old, new);
                }
            }
            EntityKind::Monitor => {
                for page in &mut self.status_pages {
                    touched += rewrite_list(&mut page.items, old, new);
                }
            }
            EntityKind::StatusPage => {}
        }
        touched
    }
}

fn rewrite_list(list: &mut Vec<String>, old: &str, new: Option<&str>) -> usize {
    if !list.iter().any(|v| v == old) {
        return 0;
    }
    match new {
        Some(new) => {
            let mut seen = Vec::with_capacity(list.len());
            for value in list.drain(..) {
                let value = if value == old { new.to_string() } else { value };
                if !seen.contains(&value) {
                    seen.push(value);
                }
            }
            *list = seen;
        }
        None => list.retain(|v| v != old),
    }
    1
}

fn rewrite_option(field: &mut Option<String>, old: &str, new: Option<&str>) -> usize {
    if field.as_deref() != Some(old) {
        return 0;
    }
    *field = new.map(str::to_string);
    1
}

fn take<T>(items: &mut Vec<T>, index: usize, slot: &EntitySlot) -> Result<T, IntegrityError> {
    if index < items.len() {
        Ok(items.remove(index))
    } else {
        Err(missing(slot))
    }
}

fn missing(slot: &EntitySlot) -> IntegrityError {
    IntegrityError::NoSuchEntity {
        kind: slot.kind().label(),
        path: slot.path().to_string(),
    }
}

fn missing_tag_owner(field: TagField, index: usize) -> IntegrityError {
    IntegrityError::NoSuchEntity {
        kind: field.section().title(),
        path: field.path(index).to_string(),
    }
}
