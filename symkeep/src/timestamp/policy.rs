//! Strategy resolution: which timestamps a recreated link receives.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How timestamps are chosen for a recreated link.
///
/// # Examples
///
/// ```
/// use symkeep::timestamp::TimestampStrategy;
///
/// let strategy: TimestampStrategy = "preserve-all".parse().unwrap();
/// assert_eq!(strategy, TimestampStrategy::PreserveAll);
/// assert_eq!(strategy.to_string(), "preserve-all");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampStrategy {
    /// Stamp everything with the time of recreation.
    #[default]
    Current,
    /// Reuse the link object's own captured timestamps.
    Symlink,
    /// Reuse the target's timestamps, falling back to `Symlink`.
    Target,
    /// Prefer the target per field, falling back to the link per field.
    PreserveAll,
}

impl TimestampStrategy {
    /// All strategies.
    pub const ALL: [Self; 4] = [Self::Current, Self::Symlink, Self::Target, Self::PreserveAll];

    /// The kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Symlink => "symlink",
            Self::Target => "target",
            Self::PreserveAll => "preserve-all",
        }
    }
}

impl fmt::Display for TimestampStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimestampStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation {
                field: "timestamp_strategy".into(),
                message: format!(
                    "unknown strategy '{s}' (expected current, symlink, target or preserve-all)"
                ),
            })
    }
}

/// One of the three timestamps a filesystem entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampField {
    /// Birth time.
    Created,
    /// Last content modification.
    Modified,
    /// Last access.
    Accessed,
}

impl TimestampField {
    /// All fields in record order.
    pub const ALL: [Self; 3] = [Self::Created, Self::Modified, Self::Accessed];
}

impl fmt::Display for TimestampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Modified => write!(f, "modified"),
            Self::Accessed => write!(f, "accessed"),
        }
    }
}

/// Up to three timestamps read from one filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimestampSet {
    /// Birth time, when the platform reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// Access time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessed: Option<DateTime<Utc>>,
}

impl TimestampSet {
    /// The value of `field`.
    #[must_use]
    pub const fn get(&self, field: TimestampField) -> Option<DateTime<Utc>> {
        match field {
            TimestampField::Created => self.created,
            TimestampField::Modified => self.modified,
            TimestampField::Accessed => self.accessed,
        }
    }

    /// Whether no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.created.is_none() && self.modified.is_none() && self.accessed.is_none()
    }
}

/// Timestamps captured when a record was written.
///
/// The link object and its target are kept apart so later strategy
/// resolution can pick either without losing the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapturedTimestamps {
    /// The link object's own timestamps.
    #[serde(default)]
    pub link: TimestampSet,
    /// The target's timestamps, if it resolved at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TimestampSet>,
}

/// Where a planned timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampSource {
    /// The moment of recreation.
    Now,
    /// The captured link object.
    Link,
    /// The captured target.
    Target,
    /// The target re-read at recreation time.
    LiveTarget,
}

/// One planned timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTime {
    /// The instant to apply.
    pub at: DateTime<Utc>,
    /// Its provenance.
    pub source: TimestampSource,
}

/// The timestamps to apply to one recreated link.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplyPlan {
    /// Planned birth time.
    pub created: Option<PlannedTime>,
    /// Planned modification time.
    pub modified: Option<PlannedTime>,
    /// Planned access time.
    pub accessed: Option<PlannedTime>,
    /// The strategy used instead when `target` had nothing to offer.
    pub fallback: Option<TimestampStrategy>,
    /// Fields no source could supply.
    pub unavailable: Vec<TimestampField>,
}

impl ApplyPlan {
    /// The planned value of `field`.
    #[must_use]
    pub const fn get(&self, field: TimestampField) -> Option<PlannedTime> {
        match field {
            TimestampField::Created => self.created,
            TimestampField::Modified => self.modified,
            TimestampField::Accessed => self.accessed,
        }
    }

    fn set(&mut self, field: TimestampField, value: Option<PlannedTime>) {
        match field {
            TimestampField::Created => self.created = value,
            TimestampField::Modified => self.modified = value,
            TimestampField::Accessed => self.accessed = value,
        }
        if value.is_none() {
            self.unavailable.push(field);
        }
    }

    /// Whether nothing is planned.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.created.is_none() && self.modified.is_none() && self.accessed.is_none()
    }

    /// Soft warnings describing degraded resolution.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(strategy) = self.fallback {
            warnings.push(format!(
                "timestamp unavailable: no target timestamps, fell back to {strategy}"
            ));
        }
        if !self.unavailable.is_empty() {
            let fields: Vec<String> = self.unavailable.iter().map(ToString::to_string).collect();
            warnings.push(format!("timestamp unavailable: {}", fields.join(", ")));
        }
        warnings
    }
}

fn planned(set: &TimestampSet, field: TimestampField, source: TimestampSource) -> Option<PlannedTime> {
    set.get(field).map(|at| PlannedTime { at, source })
}

/// The target-side value of `field`: live when offered, else captured.
fn target_value(
    captured: &CapturedTimestamps,
    live: Option<&TimestampSet>,
    field: TimestampField,
) -> Option<PlannedTime> {
    live.and_then(|l| planned(l, field, TimestampSource::LiveTarget))
        .or_else(|| {
            captured
                .target
                .as_ref()
                .and_then(|t| planned(t, field, TimestampSource::Target))
        })
}

/// Resolve `strategy` into an [`ApplyPlan`].
///
/// `live_target` is the target re-read at recreation time; pass it only
/// when live re-reading is enabled. A field that no source can supply is
/// listed in [`ApplyPlan::unavailable`]; the current time is never
/// substituted except under [`TimestampStrategy::Current`].
///
/// # Errors
///
/// Returns [`Error::TimestampUnavailable`] when the strategy yields no
/// timestamp at all.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use symkeep::timestamp::{resolve, CapturedTimestamps, TimestampSet, TimestampStrategy};
///
/// let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let captured = CapturedTimestamps {
///     link: TimestampSet::default(),
///     target: Some(TimestampSet { modified: Some(t1), ..Default::default() }),
/// };
/// let plan = resolve(TimestampStrategy::Target, &captured, None, Utc::now()).unwrap();
/// assert_eq!(plan.modified.unwrap().at, t1);
/// ```
pub fn resolve(
    strategy: TimestampStrategy,
    captured: &CapturedTimestamps,
    live_target: Option<&TimestampSet>,
    now: DateTime<Utc>,
) -> Result<ApplyPlan> {
    let mut plan = ApplyPlan::default();

    match strategy {
        TimestampStrategy::Current => {
            let at = Some(PlannedTime {
                at: now,
                source: TimestampSource::Now,
            });
            for field in TimestampField::ALL {
                plan.set(field, at);
            }
        }
        TimestampStrategy::Symlink => {
            for field in TimestampField::ALL {
                plan.set(field, planned(&captured.link, field, TimestampSource::Link));
            }
        }
        TimestampStrategy::Target => {
            let has_target = TimestampField::ALL
                .into_iter()
                .any(|f| target_value(captured, live_target, f).is_some());
            if has_target {
                for field in TimestampField::ALL {
                    plan.set(field, target_value(captured, live_target, field));
                }
            } else {
                let mut fallback = resolve(TimestampStrategy::Symlink, captured, None, now)?;
                fallback.fallback = Some(TimestampStrategy::Symlink);
                return Ok(fallback);
            }
        }
        TimestampStrategy::PreserveAll => {
            for field in TimestampField::ALL {
                let value = target_value(captured, live_target, field)
                    .or_else(|| planned(&captured.link, field, TimestampSource::Link));
                plan.set(field, value);
            }
        }
    }

    if plan.is_empty() {
        return Err(Error::TimestampUnavailable {
            details: format!("strategy '{strategy}' found no timestamp source"),
        });
    }
    Ok(plan)
}
