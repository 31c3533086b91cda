use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::LoadError;

/// Reads and parses a whole JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Best-effort read: a missing file is silently empty, anything else is
/// logged and treated as empty too.
pub(crate) fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    match read_json(path) {
        Ok(value) => value,
        Err(err) => {
            warn!("Ignoring unreadable store: {}", err);
            T::default()
        }
    }
}

/// Overwrites the file wholesale with pretty-printed JSON.
/// Failures are logged and swallowed.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) {
    if let Err(err) = try_write_json(path, value) {
        warn!("Failed to write {}: {}", path.display(), err);
    }
}

fn try_write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()
}

pub(crate) fn remove(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(err) = fs::remove_file(path) {
        warn!("Failed to remove {}: {}", path.display(), err);
    }
}
