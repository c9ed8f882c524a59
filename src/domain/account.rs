use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::platform::Platform;

/// A stored, user-authorized link to one platform. Created by the external
/// OAuth callback, deactivated (never hard-deleted) on disconnect. Only
/// active accounts are eligible publish targets. Access and refresh tokens
/// live in the row but are never serialized back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: Platform,
    pub platform_user_id: Option<String>,
    pub platform_username: Option<String>,
    pub platform_display_name: Option<String>,
    pub platform_avatar_url: Option<String>,
    pub followers_count: i64,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub connected_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
