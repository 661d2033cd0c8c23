//! Job status model and its translation to the wire enum.
//!
//! The persisted form is a lowercase string. Parsing is strict: a value this
//! build does not know (a corrupt row, or one written by a newer release) is
//! an error, never a silent fallback.

use std::fmt;
use std::str::FromStr;

use drctl_proto::v1::JobStatus as ProtoJobStatus;

/// Lifecycle state of a job.
///
/// The scheduler only ever writes `Scheduled`; the other states are written
/// by the execution-reporting path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Scheduled,
    Finished,
    Failed,
}

/// A persisted status value with no [`JobStatus`] counterpart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status {0:?}")]
pub struct UnknownJobStatus(pub String);

impl JobStatus {
    pub const ALL: [Self; 3] = [Self::Scheduled, Self::Finished, Self::Failed];

    /// The value stored in the `jobs.status` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }

    pub const fn to_proto(self) -> ProtoJobStatus {
        match self {
            Self::Scheduled => ProtoJobStatus::Scheduled,
            Self::Finished => ProtoJobStatus::Finished,
            Self::Failed => ProtoJobStatus::Failed,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownJobStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "finished" => Ok(Self::Finished),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownJobStatus(other.to_string())),
        }
    }
}
