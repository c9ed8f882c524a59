use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::domain::account::ConnectedAccount;
use crate::domain::platform::Platform;
use crate::infra::db::Db;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Why an authorize redirect could not be built. `Unsupported` is the
/// expected case for platforms with no wired OAuth flow; the rest are
/// deployment defects.
#[derive(Debug)]
pub enum ConnectError {
    Unsupported(Platform),
    MissingClientId,
    Malformed(url::ParseError),
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(platform) => {
                write!(f, "oauth connect is not available for {}", platform)
            }
            Self::MissingClientId => write!(f, "GOOGLE_CLIENT_ID is not configured"),
            Self::Malformed(err) => write!(f, "malformed authorize url: {}", err),
        }
    }
}

impl std::error::Error for ConnectError {}

/// Identity and token fields delivered by the external OAuth callback after
/// a successful code exchange.
#[derive(Debug)]
pub struct UpsertConnection {
    pub user_id: Uuid,
    pub platform: Platform,
    pub platform_user_id: Option<String>,
    pub platform_username: Option<String>,
    pub platform_display_name: Option<String>,
    pub platform_avatar_url: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<OffsetDateTime>,
    pub scopes: Vec<String>,
    pub followers_count: i64,
}

#[derive(Clone)]
pub struct AccountService {
    db: Db,
    oauth_redirect_url: String,
    google_client_id: Option<String>,
}

const ACCOUNT_COLUMNS: &str = "id, user_id, platform, platform_user_id, platform_username, \
     platform_display_name, platform_avatar_url, followers_count, is_active, connected_at, updated_at";

impl AccountService {
    pub fn new(db: Db, oauth_redirect_url: String, google_client_id: Option<String>) -> Self {
        Self {
            db,
            oauth_redirect_url,
            google_client_id,
        }
    }

    /// Active accounts only; these are the eligible publish targets.
    pub async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<ConnectedAccount>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM connected_accounts \
             WHERE user_id = $1 AND is_active \
             ORDER BY connected_at ASC",
            ACCOUNT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    /// Builds the provider authorize redirect for the connect flow. The
    /// `state` round-trips `{platform}:{user_id}` so the external callback
    /// knows where to land the tokens.
    pub fn connect_url(&self, platform: Platform, user_id: Uuid) -> Result<String, ConnectError> {
        let state = format!("{}:{}", platform.as_db(), user_id);
        match platform {
            Platform::Youtube | Platform::YoutubeShorts => {
                let client_id = self
                    .google_client_id
                    .as_deref()
                    .ok_or(ConnectError::MissingClientId)?;
                let url = Url::parse_with_params(
                    GOOGLE_AUTHORIZE_URL,
                    &[
                        ("client_id", client_id),
                        ("redirect_uri", self.oauth_redirect_url.as_str()),
                        ("response_type", "code"),
                        ("scope", YOUTUBE_SCOPE),
                        ("access_type", "offline"),
                        ("prompt", "consent"),
                        ("state", state.as_str()),
                    ],
                )
                .map_err(ConnectError::Malformed)?;
                Ok(url.to_string())
            }
            other => Err(ConnectError::Unsupported(other)),
        }
    }

    /// Deactivates the link; the row and its history stay. Returns whether
    /// an active row was found.
    pub async fn disconnect(&self, user_id: Uuid, platform: Platform) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE connected_accounts \
             SET is_active = false, updated_at = now() \
             WHERE user_id = $1 AND platform = $2 AND is_active",
        )
        .bind(user_id)
        .bind(platform.as_db())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// One row per (user, platform): reconnecting refreshes the existing
    /// link and reactivates it.
    pub async fn upsert_connection(&self, conn: UpsertConnection) -> Result<ConnectedAccount> {
        let row = sqlx::query(&format!(
            "INSERT INTO connected_accounts \
                 (user_id, platform, platform_user_id, platform_username, platform_display_name, \
                  platform_avatar_url, access_token, refresh_token, token_expires_at, scopes, \
                  followers_count, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, true) \
             ON CONFLICT (user_id, platform) DO UPDATE SET \
                 platform_user_id = EXCLUDED.platform_user_id, \
                 platform_username = EXCLUDED.platform_username, \
                 platform_display_name = EXCLUDED.platform_display_name, \
                 platform_avatar_url = EXCLUDED.platform_avatar_url, \
                 access_token = EXCLUDED.access_token, \
                 refresh_token = EXCLUDED.refresh_token, \
                 token_expires_at = EXCLUDED.token_expires_at, \
                 scopes = EXCLUDED.scopes, \
                 followers_count = EXCLUDED.followers_count, \
                 is_active = true, \
                 updated_at = now() \
             RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(conn.user_id)
        .bind(conn.platform.as_db())
        .bind(conn.platform_user_id)
        .bind(conn.platform_username)
        .bind(conn.platform_display_name)
        .bind(conn.platform_avatar_url)
        .bind(conn.access_token)
        .bind(conn.refresh_token)
        .bind(conn.token_expires_at)
        .bind(conn.scopes)
        .bind(conn.followers_count)
        .fetch_one(self.db.pool())
        .await?;

        account_from_row(&row)
    }
}

fn account_from_row(row: &PgRow) -> Result<ConnectedAccount> {
    let platform: String = row.get("platform");
    let platform = Platform::from_db(&platform)
        .ok_or_else(|| anyhow::anyhow!("unknown platform: {}", platform))?;

    Ok(ConnectedAccount {
        id: row.get("id"),
        user_id: row.get("user_id"),
        platform,
        platform_user_id: row.get("platform_user_id"),
        platform_username: row.get("platform_username"),
        platform_display_name: row.get("platform_display_name"),
        platform_avatar_url: row.get("platform_avatar_url"),
        followers_count: row.get("followers_count"),
        is_active: row.get("is_active"),
        connected_at: row.get("connected_at"),
        updated_at: row.get("updated_at"),
    })
}
