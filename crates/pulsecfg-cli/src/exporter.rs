use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use tracing::{debug, info};

const BACKUP_STAMP: &str = "%Y%m%d%H%M%S%3f";

/// Writes an exported configuration to `target`.
///
/// An existing file is moved aside to `<name>.<stamp>.bak` first, and only
/// the newest `keep_backups` backups survive.
pub fn write_export(target: &Path, contents: &str, now: DateTime<Utc>, keep_backups: usize) -> Result<PathBuf> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let file_name = target
        .file_name()
        .and_then(|v| v.to_str())
        .with_context(|| format!("{} is not a file path", target.display()))?
        .to_string();

    if target.exists() {
        let mut at = now;
        let mut backup = dir.join(backup_name(&file_name, at));
        while backup.exists() {
            at += TimeDelta::milliseconds(1);
            backup = dir.join(backup_name(&file_name, at));
        }
        fs::rename(target, &backup)?;
        debug!(backup = %backup.display(), "previous export moved aside");
    }

    let header = format!("# Generated by pulsecfg at {}\n\n", now.to_rfc3339());
    fs::write(target, format!("{header}{contents}"))
        .with_context(|| format!("writing {}", target.display()))?;

    let pruned = prune_old_backups(&dir, &file_name, keep_backups)?;
    info!(path = %target.display(), pruned, "configuration exported");
    Ok(target.to_path_buf())
}

pub(crate) fn backup_name(file_name: &str, at: DateTime<Utc>) -> String {
    format!("{file_name}.{}.bak", at.format(BACKUP_STAMP))
}

pub(crate) fn prune_old_backups(dir: &Path, file_name: &str, keep: usize) -> Result<usize> {
    let prefix = format!("{file_name}.");
    let mut backups: Vec<(NaiveDateTime, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|v| v.to_str()) else {
            continue;
        };
        let Some(stamp) = name
            .strip_prefix(prefix.as_str())
            .and_then(|v| v.strip_suffix(".bak"))
        else {
            continue;
        };
        let Ok(taken_at) = NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP) else {
            continue;
        };
        backups.push((taken_at, path));
    }

    backups.sort_by(|a, b| b.0.cmp(&a.0));
    let mut removed = 0;
    for (_, path) in backups.into_iter().skip(keep) {
        if fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }

    Ok(removed)
}
