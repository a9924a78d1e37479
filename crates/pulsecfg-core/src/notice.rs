use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    #[serde(skip)]
    pub ttl: Duration,
}

impl Notice {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.raised_at);
        age.to_std().map(|age| age >= self.ttl).unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct Notices {
    items: VecDeque<Notice>,
    ttl: Duration,
    capacity: usize,
}

impl Notices {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn push_info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message.into(), Utc::now());
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into(), Utc::now());
    }

    pub fn push(&mut self, level: NoticeLevel, message: String, raised_at: DateTime<Utc>) {
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(Notice {
            level,
            message,
            raised_at,
            ttl: self.ttl,
        });
    }

    pub fn dismiss(&mut self) -> Option<Notice> {
        self.items.pop_back()
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.items.retain(|n| !n.is_expired(now));
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
