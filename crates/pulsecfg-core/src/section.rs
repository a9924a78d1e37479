use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    General,
    Monitors,
    Groups,
    StatusPages,
    Notifications,
    RemoteAgents,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::General,
        Section::Monitors,
        Section::Groups,
        Section::StatusPages,
        Section::Notifications,
        Section::RemoteAgents,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::General => "General",
            Section::Monitors => "Monitors",
            Section::Groups => "Groups",
            Section::StatusPages => "Status Pages",
            Section::Notifications => "Notifications",
            Section::RemoteAgents => "PulseMonitors",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Section::General => "general",
            Section::Monitors => "monitors",
            Section::Groups => "groups",
            Section::StatusPages => "statusPages",
            Section::Notifications => "notifications",
            Section::RemoteAgents => "remoteAgents",
        }
    }

    pub fn from_path_root(root: &str) -> Section {
        match root {
            "monitors" => Section::Monitors,
            "groups" => Section::Groups,
            "status_pages" => Section::StatusPages,
            "notifications" => Section::Notifications,
            "PulseMonitors" => Section::RemoteAgents,
            _ => Section::General,
        }
    }

    pub fn dependents(self) -> &'static [Section] {
        match self {
            Section::General => &[],
            Section::Monitors => &[Section::StatusPages],
            Section::Groups => &[Section::Monitors, Section::StatusPages],
            Section::StatusPages => &[],
            Section::Notifications => &[Section::Monitors, Section::Groups],
            Section::RemoteAgents => &[Section::Monitors],
        }
    }

    pub fn next(self) -> Section {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Section {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dirty {
    sections: Vec<Section>,
}

impl Dirty {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn only(section: Section) -> Self {
        Self {
            sections: vec![section],
        }
    }

    pub fn cascade(section: Section) -> Self {
        let mut dirty = Self::only(section);
        for dep in section.dependents() {
            dirty.mark(*dep);
        }
        dirty
    }

    pub fn mark(&mut self, section: Section) {
        if !self.sections.contains(&section) {
            self.sections.push(section);
        }
    }

    pub fn merge(&mut self, other: Dirty) {
        for section in other.sections {
            self.mark(section);
        }
    }

    pub fn contains(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Section> + '_ {
        self.sections.iter().copied()
    }
}
