use crate::debug_println;
use crate::error::ScrapeError;
use crate::fetcher::ListingStatus;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// `<dir>/<area>_<status>.json`
pub fn cache_path(dir: &Path, area: &str, status: ListingStatus) -> PathBuf {
    dir.join(format!("{}_{}.json", area, status))
}

/// Load a previously dumped search document. A missing file is reported as
/// [`ScrapeError::CacheMiss`] so the caller can decide whether to fetch.
pub fn load_document(path: &Path) -> Result<Value, ScrapeError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ScrapeError::CacheMiss(path.to_path_buf()))
        }
        Err(source) => {
            return Err(ScrapeError::Cache {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let document: Value = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        ScrapeError::CorruptCache {
            path: path.to_path_buf(),
            source,
        }
    })?;
    debug_println!("Loaded cached document from {}", path.display());
    Ok(document)
}

/// Dump the search document as served, indented with four spaces.
pub fn save_document(path: &Path, document: &Value) -> Result<(), ScrapeError> {
    let io_error = |source| ScrapeError::Cache {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    document.serialize(&mut serializer)?;
    writer.flush().map_err(io_error)?;

    debug_println!("Cached document at {}", path.display());
    Ok(())
}
