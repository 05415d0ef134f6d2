use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Notification;
use crate::db::types::NotificationKind;

#[derive(Debug, Serialize)]
pub(crate) struct NotificationResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) kind: NotificationKind,
    pub(crate) reference_id: Option<String>,
    pub(crate) is_read: bool,
    pub(crate) created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
            reference_id: notification.reference_id,
            is_read: notification.is_read,
            created_at: format_primitive(notification.created_at),
        }
    }
}
