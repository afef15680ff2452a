//! Elastic network interface attachments reported alongside task events.

use std::fmt;

use berth_common::types::TaskArn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attachment progress of a network interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentStatus {
    /// Not attached yet.
    #[default]
    None,
    /// Attached to the instance.
    Attached,
    /// Detached from the instance.
    Detached,
}

impl fmt::Display for AttachmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "NONE",
            Self::Attached => "ATTACHED",
            Self::Detached => "DETACHED",
        })
    }
}

/// A network interface attached to the instance on behalf of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EniAttachment {
    /// Task the interface belongs to.
    pub task_arn: TaskArn,
    /// Attachment identifier.
    pub attachment_arn: String,
    /// Attachment progress.
    pub status: AttachmentStatus,
    /// MAC address of the interface.
    pub mac_address: String,
    /// Whether the attachment status has been reported.
    #[serde(skip)]
    pub sent: bool,
    /// Deadline for the attachment to complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Display for EniAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ENI Attachment: task: {}; attachment: {}; attachment_sent: {}; mac_address: {}; status: {}",
            self.task_arn, self.attachment_arn, self.sent, self.mac_address, self.status
        )?;
        if let Some(expires_at) = self.expires_at {
            write!(f, "; expiration: {}", expires_at.to_rfc3339())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn attachment() -> EniAttachment {
        EniAttachment {
            task_arn: TaskArn::from("t1"),
            attachment_arn: "att-1".into(),
            status: AttachmentStatus::Attached,
            mac_address: "0a:1b:2c:3d:4e:5f".into(),
            sent: false,
            expires_at: None,
        }
    }

    #[test]
    fn display_without_expiry() {
        assert_eq!(
            attachment().to_string(),
            "ENI Attachment: task: t1; attachment: att-1; attachment_sent: false; \
             mac_address: 0a:1b:2c:3d:4e:5f; status: ATTACHED"
        );
    }

    #[test]
    fn display_with_expiry() {
        let mut a = attachment();
        a.expires_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert!(a.to_string().ends_with("; expiration: 2024-05-01T10:00:00+00:00"));
    }
}
