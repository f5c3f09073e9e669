use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Review status of a resource.
///
/// `uploading → pending → {approved, rejected}`, and `approved ↔ inactive`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// File transfer still in progress.
    #[default]
    Uploading,
    /// Waiting for an administrator to review.
    Pending,
    /// Publicly visible.
    Approved,
    /// Turned down by a reviewer.
    Rejected,
    /// Taken down after having been approved.
    Inactive,
}

impl ResourceStatus {
    /// All possible status values.
    pub const ALL: &'static [ResourceStatus] = &[
        Self::Uploading,
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Inactive,
    ];

    /// Returns true if the resource is waiting on a reviewer.
    pub fn awaits_review(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if the owner may push new content, sending it back to review.
    pub fn is_resubmittable(&self) -> bool {
        matches!(self, Self::Rejected | Self::Approved | Self::Inactive)
    }

    /// Returns true if the resource is visible to everyone.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ParseStatusError::new::<Self>(s, Self::ALL.iter().map(|s| s.as_str()))
            })
    }
}

/// Whether the stored file blob is consistent with the resource record.
///
/// Independent of [`ResourceStatus`]; transitions carry it through unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStatus {
    /// Blob and record agree.
    Synced,
    /// Blob upload or replication not finished.
    #[default]
    Pending,
    /// Last storage operation failed.
    Error,
    /// Blob removal in progress.
    Deleting,
}

impl StorageStatus {
    pub const ALL: &'static [StorageStatus] =
        &[Self::Synced, Self::Pending, Self::Error, Self::Deleting];

    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Pending => "pending",
            Self::Error => "error",
            Self::Deleting => "deleting",
        }
    }
}

impl fmt::Display for StorageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ParseStatusError::new::<Self>(s, Self::ALL.iter().map(|s| s.as_str()))
            })
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
    kind: &'static str,
    valid: Vec<&'static str>,
}

impl ParseStatusError {
    fn new<T>(invalid: &str, valid: impl Iterator<Item = &'static str>) -> Self {
        let kind = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or("status");
        Self {
            invalid: invalid.to_string(),
            kind,
            valid: valid.collect(),
        }
    }
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid {} '{}'. Valid values: {}",
            self.kind,
            self.invalid,
            self.valid.join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}
