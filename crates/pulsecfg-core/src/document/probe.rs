use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Probe {
    Http(HttpProbe),
    Ws(UrlProbe),
    Tcp(SocketProbe),
    Udp(UdpProbe),
    Icmp(IcmpProbe),
    Smtp(SmtpProbe),
    Imap(ImapProbe),
    Mysql(UrlProbe),
    Mssql(UrlProbe),
    Postgresql(UrlProbe),
    Redis(UrlProbe),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Ws,
    Tcp,
    Udp,
    Icmp,
    Smtp,
    Imap,
    Mysql,
    Mssql,
    Postgresql,
    Redis,
}

impl Protocol {
    pub const ALL: [Protocol; 11] = [
        Protocol::Http,
        Protocol::Ws,
        Protocol::Tcp,
        Protocol::Udp,
        Protocol::Icmp,
        Protocol::Smtp,
        Protocol::Imap,
        Protocol::Mysql,
        Protocol::Mssql,
        Protocol::Postgresql,
        Protocol::Redis,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Ws => "ws",
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::Smtp => "smtp",
            Protocol::Imap => "imap",
            Protocol::Mysql => "mysql",
            Protocol::Mssql => "mssql",
            Protocol::Postgresql => "postgresql",
            Protocol::Redis => "redis",
        }
    }

    pub fn empty_probe(self) -> Probe {
        match self {
            Protocol::Http => Probe::Http(HttpProbe::default()),
            Protocol::Ws => Probe::Ws(UrlProbe::default()),
            Protocol::Tcp => Probe::Tcp(SocketProbe::default()),
            Protocol::Udp => Probe::Udp(UdpProbe::default()),
            Protocol::Icmp => Probe::Icmp(IcmpProbe::default()),
            Protocol::Smtp => Probe::Smtp(SmtpProbe::default()),
            Protocol::Imap => Probe::Imap(ImapProbe::default()),
            Protocol::Mysql => Probe::Mysql(UrlProbe::default()),
            Protocol::Mssql => Probe::Mssql(UrlProbe::default()),
            Protocol::Postgresql => Probe::Postgresql(UrlProbe::default()),
            Protocol::Redis => Probe::Redis(UrlProbe::default()),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Probe {
    pub fn protocol(&self) -> Protocol {
        match self {
            Probe::Http(_) => Protocol::Http,
            Probe::Ws(_) => Protocol::Ws,
            Probe::Tcp(_) => Protocol::Tcp,
            Probe::Udp(_) => Protocol::Udp,
            Probe::Icmp(_) => Protocol::Icmp,
            Probe::Smtp(_) => Protocol::Smtp,
            Probe::Imap(_) => Protocol::Imap,
            Probe::Mysql(_) => Protocol::Mysql,
            Probe::Mssql(_) => Protocol::Mssql,
            Probe::Postgresql(_) => Protocol::Postgresql,
            Probe::Redis(_) => Protocol::Redis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 3] = [HttpMethod::Get, HttpMethod::Post, HttpMethod::Head];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpProbe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlProbe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocketProbe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UdpProbe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IcmpProbe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmtpProbe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImapProbe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
