//! Notification trigger.
//!
//! Decides, once per newly appended message, whether to raise a local alert.
//! Delivery belongs to the driver; denial or lack of support just means no
//! alert, never an error.

use crate::message_log::{Author, Message};

/// Local notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    /// Not yet decided. The only state in which a prompt is allowed.
    #[default]
    Default,
    /// User allowed notifications.
    Granted,
    /// User refused notifications.
    Denied,
    /// The platform cannot show notifications.
    Unsupported,
}

/// Transient alert content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Sender's display name.
    pub title: String,
    /// Message text.
    pub body: String,
}

/// Edge-triggered alert decision for new messages.
#[derive(Debug, Clone, Default)]
pub struct NotificationTrigger {
    permission: Permission,
    requested: bool,
}

impl NotificationTrigger {
    /// Create a trigger with undetermined permission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current permission.
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Record the resolved permission.
    pub fn set_permission(&mut self, permission: Permission) {
        if permission != self.permission {
            tracing::debug!(?permission, "notification permission changed");
        }
        self.permission = permission;
    }

    /// Whether a permission prompt should be shown now.
    ///
    /// True at most once per trigger, and only while permission is
    /// undetermined. Never retried.
    pub fn request_permission(&mut self) -> bool {
        if self.requested || self.permission != Permission::Default {
            return false;
        }
        self.requested = true;
        true
    }

    /// Evaluate a message that was just appended to the log.
    ///
    /// Call exactly once per successful append.
    pub fn evaluate(
        &self,
        message: &Message,
        joined: bool,
        local_username: Option<&str>,
    ) -> Option<Notification> {
        if self.permission != Permission::Granted || !joined {
            return None;
        }

        let Author::User(sender) = &message.author else {
            return None;
        };
        if Some(sender.as_str()) == local_username {
            return None;
        }

        Some(Notification { title: sender.clone(), body: message.body.clone() })
    }
}
