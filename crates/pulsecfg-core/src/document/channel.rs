use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<Discord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntfy: Option<Ntfy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<Telegram>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Channel {
    pub fn reference_id<'a>(&'a self, key: &'a str) -> &'a str {
        if self.id.is_empty() {
            key
        } else {
            &self.id
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discord {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Discord {
    pub fn is_blank(&self) -> bool {
        !self.enabled
            && self.webhook_url.trim().is_empty()
            && self.username.is_none()
            && self.avatar_url.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp: Option<Smtp>,
}

impl Email {
    pub fn is_blank(&self) -> bool {
        !self.enabled
            && self.from.trim().is_empty()
            && self.to.is_empty()
            && self.smtp.as_ref().map_or(true, Smtp::is_blank)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Smtp {
    #[serde(default)]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
}

impl Smtp {
    pub fn is_blank(&self) -> bool {
        self.host.trim().is_empty()
            && self.port.is_none()
            && !self.secure
            && self.user.is_empty()
            && self.pass.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ntfy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Ntfy {
    pub fn is_blank(&self) -> bool {
        !self.enabled
            && self.server.trim().is_empty()
            && self.topic.trim().is_empty()
            && self.token.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telegram {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<i64>,
    #[serde(default)]
    pub silent: bool,
}

impl Telegram {
    pub fn is_blank(&self) -> bool {
        !self.enabled
            && self.bot_token.trim().is_empty()
            && self.chat_id.trim().is_empty()
            && self.topic_id.is_none()
            && !self.silent
    }
}
