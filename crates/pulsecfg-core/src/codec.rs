use thiserror::Error;
use tracing::{info, warn};

use crate::document::Document;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub fn import(text: &str) -> Result<Document, CodecError> {
    match toml::from_str::<Document>(text) {
        Ok(doc) => {
            let counts = doc.counts();
            info!(
                monitors = counts.monitors,
                groups = counts.groups,
                status_pages = counts.status_pages,
                channels = counts.channels,
                remote_agents = counts.remote_agents,
                "configuration imported"
            );
            Ok(doc)
        }
        Err(err) => {
            warn!(error = %err.message(), "configuration rejected");
            Err(CodecError::Parse(err))
        }
    }
}

pub fn export(doc: &Document) -> Result<String, CodecError> {
    let text = toml::to_string_pretty(&doc.normalized())?;
    Ok(text)
}
