//! The link record data model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::path::{HostContext, PathFlavor, PathParts, PathResolver};
use crate::timestamp::{CapturedTimestamps, TimestampStrategy};

/// The record format version this build writes.
pub const FORMAT_VERSION: u32 = 2;

/// File extension of record files, without the dot.
pub const RECORD_EXTENSION: &str = "symkeep";

/// What a link pointed at when it was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// Nothing resolved at capture time.
    #[default]
    Missing,
}

impl TargetKind {
    /// Interpret a loose type hint from a legacy record.
    #[must_use]
    pub fn from_hint(hint: &str) -> Self {
        match hint.to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "directory" | "dir" => Self::Directory,
            _ => Self::Missing,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// What invoking a record file directly does.
///
/// # Examples
///
/// ```
/// use symkeep::record::ExecutionMode;
///
/// assert_eq!("auto".parse::<ExecutionMode>().unwrap(), ExecutionMode::Auto);
/// assert_eq!(ExecutionMode::default(), ExecutionMode::Info);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Print the record's metadata.
    #[default]
    Info,
    /// Hand the target to the host's default opener.
    Open,
    /// Open when the target resolves, otherwise print metadata.
    Auto,
}

impl ExecutionMode {
    /// All modes.
    pub const ALL: [Self; 3] = [Self::Info, Self::Open, Self::Auto];

    /// The lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Open => "open",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation {
                field: "default_mode".into(),
                message: format!("unknown mode '{s}' (expected info, open or auto)"),
            })
    }
}

/// A path stored in its lossless raw form alongside its normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRepr {
    /// Exactly as captured.
    pub raw: String,
    /// Lexically normalized in the grammar of `flavor`.
    pub normalized: String,
    /// The grammar the path was written in.
    pub flavor: PathFlavor,
    /// The UNC equivalent, when known at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unc_form: Option<String>,
    /// The mapped-drive equivalent, when known at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_form: Option<String>,
}

impl PathRepr {
    /// Describe `raw` using the resolver's host to find alternate forms.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` cannot be parsed.
    pub fn capture(raw: &str, resolver: &PathResolver) -> Result<Self> {
        Self::with_flavor(raw, resolver.classify(raw), resolver)
    }

    /// Describe `raw` read from the host's own filesystem, so a POSIX host
    /// keeps backslashes and drive-like prefixes as name characters.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` cannot be parsed.
    pub fn capture_native(raw: &str, resolver: &PathResolver) -> Result<Self> {
        Self::with_flavor(raw, resolver.classify_native(raw), resolver)
    }

    fn with_flavor(raw: &str, flavor: PathFlavor, resolver: &PathResolver) -> Result<Self> {
        let normalized = resolver.normalize(raw, flavor)?;
        let parts = PathParts::parse(raw, flavor)?;
        let host = resolver.host();

        let (unc_form, drive_form) = match flavor {
            PathFlavor::WindowsMappedDrive => (
                host.unc_for_drive(&parts).map(|p| p.render('\\')),
                Some(normalized.clone()),
            ),
            PathFlavor::WindowsUnc => (
                Some(normalized.clone()),
                host.drive_for_unc(&parts).map(|p| p.render('\\')),
            ),
            PathFlavor::Posix | PathFlavor::WindowsLocal => (None, None),
        };

        Ok(Self {
            raw: raw.to_string(),
            normalized,
            flavor,
            unc_form,
            drive_form,
        })
    }

    /// The degraded form read from a legacy record: the stored text is used
    /// as both raw and normalized.
    #[must_use]
    pub fn legacy(raw: &str, host: &HostContext) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: raw.to_string(),
            flavor: crate::path::classify(raw, host),
            unc_form: None,
            drive_form: None,
        }
    }

    /// Every recorded form with its grammar, primary form first.
    #[must_use]
    pub fn forms(&self) -> Vec<(&str, PathFlavor)> {
        let mut forms = vec![(self.normalized.as_str(), self.flavor)];
        if let Some(unc) = &self.unc_form {
            if self.flavor != PathFlavor::WindowsUnc {
                forms.push((unc.as_str(), PathFlavor::WindowsUnc));
            }
        }
        if let Some(drive) = &self.drive_form {
            if self.flavor != PathFlavor::WindowsMappedDrive {
                forms.push((drive.as_str(), PathFlavor::WindowsMappedDrive));
            }
        }
        forms
    }

    /// Resolve onto the resolver's host, trying every recorded form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathUnresolvable`] when no form resolves.
    pub fn resolve(&self, resolver: &PathResolver) -> Result<String> {
        resolver.to_local_any(&self.forms())
    }
}

impl fmt::Display for PathRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The captured link target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// The target path. For relative targets this is the link text.
    pub path: PathRepr,
    /// What the target was at capture time.
    pub kind: TargetKind,
    /// Whether the link text was relative.
    #[serde(default)]
    pub relative: bool,
    /// Size in bytes of a file target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// OS-specific attribute bits. Unknown keys are kept verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attributes {
    /// Hidden (Windows attribute or Unix dotfile).
    #[serde(default)]
    pub hidden: bool,
    /// Windows system attribute.
    #[serde(default)]
    pub system: bool,
    /// Read-only.
    #[serde(default)]
    pub readonly: bool,
    /// Whether the target was executable (Unix).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<bool>,
    /// Unix permission bits of the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
    /// Bits this build does not understand.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// File-level configuration carried inside a record.
///
/// Takes precedence over every other configuration level for the record
/// it belongs to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbeddedConfig {
    /// Timestamp strategy for this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_strategy: Option<TimestampStrategy>,
    /// Re-read live target timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_live_target: Option<bool>,
    /// Verify the created link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,
    /// Default execution mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<ExecutionMode>,
    /// Keys this build does not understand.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmbeddedConfig {
    /// Whether no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamp_strategy.is_none()
            && self.use_live_target.is_none()
            && self.verify.is_none()
            && self.default_mode.is_none()
            && self.extra.is_empty()
    }
}

/// Why a record was written or rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryReason {
    /// Initial capture from a live link.
    Captured,
    /// Target path rewritten by `rebase`.
    Rebased,
    /// Embedded configuration changed.
    ConfigUpdated,
    /// Refreshed after a successful import.
    Recreated,
}

/// One entry of a record's update history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Why the record was written.
    pub reason: HistoryReason,
    /// When.
    pub at: DateTime<Utc>,
}

/// One serialized symbolic link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Format version the record was read as.
    pub format_version: u32,
    /// Tool name and version that wrote the record.
    #[serde(default)]
    pub created_by: String,
    /// When the link was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
    /// Operating system of the capturing host.
    #[serde(default)]
    pub platform: String,
    /// Where the link itself lived.
    pub link: PathRepr,
    /// What it pointed at.
    pub target: TargetInfo,
    /// Captured link and target timestamps.
    #[serde(default)]
    pub timestamps: CapturedTimestamps,
    /// Captured attribute bits.
    #[serde(default)]
    pub attributes: Attributes,
    /// Behavior when the record file is invoked.
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    /// File-level configuration overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_config: Option<EmbeddedConfig>,
    /// Ordered update history.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl LinkRecord {
    /// The signature written into `created_by`.
    #[must_use]
    pub fn creator() -> String {
        format!("symkeep {}", env!("CARGO_PKG_VERSION"))
    }

    /// Append a history entry stamped now.
    pub fn touch(&mut self, reason: HistoryReason) {
        self.history.push(HistoryEntry {
            reason,
            at: Utc::now(),
        });
    }

    /// Rewrite the target path, as `rebase` does.
    ///
    /// The record keeps its format version; the rewrite is noted in the
    /// history.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_target` cannot be parsed.
    pub fn rebase_target(&mut self, new_target: &str, resolver: &PathResolver) -> Result<()> {
        let path = PathRepr::capture(new_target, resolver)?;
        let relative = !PathParts::parse(new_target, path.flavor)?.is_absolute();
        self.target.path = path;
        self.target.relative = relative;
        self.touch(HistoryReason::Rebased);
        Ok(())
    }

    /// Replace the embedded configuration.
    pub fn set_embedded_config(&mut self, config: EmbeddedConfig) {
        self.embedded_config = (!config.is_empty()).then_some(config);
        self.touch(HistoryReason::ConfigUpdated);
    }

    /// The execution mode after embedded overrides.
    #[must_use]
    pub fn effective_mode(&self) -> ExecutionMode {
        self.embedded_config
            .as_ref()
            .and_then(|c| c.default_mode)
            .unwrap_or(self.execution_mode)
    }
}
