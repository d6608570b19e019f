//! Reading and writing record documents.
//!
//! A record is a pretty-printed JSON document. The wrapped form prefixes
//! it with a POSIX shell preamble so the file can be run directly; the
//! JSON follows a [`WRAP_MARKER`] line.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::path::HostContext;

use super::model::{
    ExecutionMode, LinkRecord, PathRepr, TargetInfo, TargetKind, FORMAT_VERSION, RECORD_EXTENSION,
};

/// The line separating a wrapped record's preamble from its JSON.
pub const WRAP_MARKER: &str = "# SYMKEEP_DATA_BEGIN";

/// The default record path for a link: the link path plus `.symkeep`.
///
/// # Examples
///
/// ```
/// use symkeep::record::format::default_record_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     default_record_path(Path::new("/data/link")),
///     PathBuf::from("/data/link.symkeep")
/// );
/// ```
#[must_use]
pub fn default_record_path(link: &Path) -> PathBuf {
    let mut name = link.as_os_str().to_owned();
    name.push(".");
    name.push(RECORD_EXTENSION);
    PathBuf::from(name)
}

/// Whether `path` has the record extension.
#[must_use]
pub fn is_record_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == RECORD_EXTENSION)
}

/// Whether the record file at `path` is in the wrapped form.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn is_wrapped(path: &Path) -> Result<bool> {
    Ok(fs::read(path)?.starts_with(b"#!"))
}

/// Serialize `record` as a pretty-printed JSON document at the current
/// format version.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
pub fn encode(record: &LinkRecord) -> Result<String> {
    let mut value = serde_json::to_value(record)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("format_version".into(), Value::from(FORMAT_VERSION));
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Serialize `record` in the wrapped, directly executable form.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
pub fn encode_wrapped(record: &LinkRecord) -> Result<String> {
    let json = encode(record)?;
    let target = shell_quote(&record.target.path.raw);
    let link = shell_quote(&record.link.raw);
    let mode = record.effective_mode();
    Ok(format!(
        "#!/bin/sh\n\
         # symkeep link record for {link_raw}\n\
         # Recreate with: symkeep import <this file>\n\
         mode=\"${{SYMKEEP_MODE:-{mode}}}\"\n\
         link={link}\n\
         target={target}\n\
         case \"$target\" in /*) ;; *) target=\"$(dirname \"$link\")/$target\" ;; esac\n\
         if [ \"$mode\" != info ] && [ -e \"$target\" ]; then\n\
         \x20   if command -v xdg-open >/dev/null 2>&1; then exec xdg-open \"$target\"; fi\n\
         \x20   if command -v open >/dev/null 2>&1; then exec open \"$target\"; fi\n\
         fi\n\
         if [ \"$mode\" = open ]; then echo \"target not available: $target\" >&2; exit 1; fi\n\
         sed -n '/^# SYMKEEP_DATA_BEGIN$/,$p' \"$0\" | tail -n +2\n\
         exit 0\n\
         {WRAP_MARKER}\n\
         {json}\n",
        link_raw = record.link.raw.replace('\n', " "),
    ))
}

fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// The JSON part of a bare or wrapped document.
fn json_body(text: &str) -> Result<&str> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == WRAP_MARKER {
            return Ok(&text[offset..]);
        }
    }
    Err(Error::RecordCorrupt {
        details: "neither a JSON document nor a wrapped record".to_string(),
    })
}

/// Decode a record document.
///
/// Version 1 documents are read in degraded mode; their flavors are
/// classified against `host`.
///
/// # Errors
///
/// Returns [`Error::FormatVersionUnsupported`] for versions newer than
/// [`FORMAT_VERSION`] and [`Error::RecordCorrupt`] for anything that is
/// not a recognizable record.
pub fn decode(text: &str, host: &HostContext) -> Result<LinkRecord> {
    let body = json_body(text)?;
    let value: Value = serde_json::from_str(body).map_err(|e| Error::RecordCorrupt {
        details: format!("invalid JSON: {e}"),
    })?;
    let Some(obj) = value.as_object() else {
        return Err(Error::RecordCorrupt {
            details: "record is not a JSON object".to_string(),
        });
    };

    let version = obj.get("format_version").cloned();
    match version {
        None if legacy_field(&value, "target_path").is_some() => decode_legacy(&value, host),
        None => Err(Error::RecordCorrupt {
            details: "no format version and no recognizable fields".to_string(),
        }),
        Some(version) => {
            let version = version
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| Error::RecordCorrupt {
                    details: format!("format version {version} is not a number"),
                })?;
            match version {
                0 => Err(Error::RecordCorrupt {
                    details: "format version 0".to_string(),
                }),
                1 => decode_legacy(&value, host),
                v if v > FORMAT_VERSION => Err(Error::FormatVersionUnsupported {
                    found: v,
                    supported: FORMAT_VERSION,
                }),
                _ => serde_json::from_value(value).map_err(|e| Error::RecordCorrupt {
                    details: e.to_string(),
                }),
            }
        }
    }
}

/// A legacy field, read from the top level or from the nested section
/// older writers used.
fn legacy_field<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    let nested = match name {
        "default_mode" | "platform" => "config",
        _ => "link",
    };
    value
        .get(name)
        .or_else(|| value.get(nested).and_then(|section| section.get(name)))
        .and_then(Value::as_str)
}

/// The legacy layout: `target_path`, `original_path`, optional
/// `default_mode` and `type`.
fn decode_legacy(value: &Value, host: &HostContext) -> Result<LinkRecord> {
    let field = |name: &str| legacy_field(value, name);
    let (Some(target), Some(link)) = (field("target_path"), field("original_path")) else {
        return Err(Error::RecordCorrupt {
            details: "legacy record lacks target_path or original_path".to_string(),
        });
    };

    let target = PathRepr::legacy(target, host);
    let relative = !crate::path::PathParts::parse(&target.raw, target.flavor)
        .map(|p| p.is_absolute())
        .unwrap_or(false);
    let execution_mode = field("default_mode")
        .and_then(|m| m.parse::<ExecutionMode>().ok())
        .unwrap_or_default();

    log::debug!("reading legacy record for {link}");
    Ok(LinkRecord {
        format_version: 1,
        created_by: field("created_by").unwrap_or("legacy").to_string(),
        captured_at: None,
        platform: field("platform").unwrap_or_default().to_string(),
        link: PathRepr::legacy(link, host),
        target: TargetInfo {
            path: target,
            kind: field("type").map(TargetKind::from_hint).unwrap_or_default(),
            relative,
            size: None,
        },
        timestamps: crate::timestamp::CapturedTimestamps::default(),
        attributes: super::model::Attributes::default(),
        execution_mode,
        embedded_config: None,
        history: Vec::new(),
    })
}

/// Read and decode the record file at `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or any error from
/// [`decode`].
pub fn read(path: &Path, host: &HostContext) -> Result<LinkRecord> {
    let text = fs::read_to_string(path)?;
    decode(&text, host)
}

/// Write `record` to `path`, creating parent directories.
///
/// The wrapped form is marked executable on Unix.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write(path: &Path, record: &LinkRecord, wrapped: bool) -> Result<()> {
    let text = if wrapped {
        encode_wrapped(record)?
    } else {
        encode(record)?
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;

    #[cfg(unix)]
    if wrapped {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}
