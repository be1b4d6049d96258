//! Application configuration loaded from environment variables.
//!
//! Secrets (JWT key, Drive OAuth credentials) are injected as environment
//! variables by the deployment and read once at startup.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID used by the front end for sign-in.
    /// ID tokens must carry this as their audience.
    pub google_client_id: String,
    /// Frontend URL (CORS origin)
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Google Drive upload credentials, if photo uploads are enabled
    pub drive: Option<DriveConfig>,
}

/// Credentials for the shared Google Drive folder that stores photos.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Folder that receives uploaded photos
    pub folder_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Long-lived refresh token with `drive.file` scope
    pub refresh_token: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            drive: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "cafe-grao".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            drive: DriveConfig::from_env()?,
        })
    }

    /// Config used by tests; identical to `Default`.
    pub fn test_default() -> Self {
        Self::default()
    }
}

impl DriveConfig {
    /// Drive uploads are enabled only when every credential is present.
    /// A partial set is a deployment mistake and is reported as such.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let vars = [
            ("DRIVE_FOLDER_ID", env::var("DRIVE_FOLDER_ID").ok()),
            ("DRIVE_CLIENT_ID", env::var("DRIVE_CLIENT_ID").ok()),
            ("DRIVE_CLIENT_SECRET", env::var("DRIVE_CLIENT_SECRET").ok()),
            ("DRIVE_REFRESH_TOKEN", env::var("DRIVE_REFRESH_TOKEN").ok()),
        ];

        if vars.iter().all(|(_, v)| v.is_none()) {
            tracing::info!("Drive credentials not set; photo uploads limited to Drive links");
            return Ok(None);
        }

        if let Some((name, _)) = vars.iter().find(|(_, v)| v.is_none()) {
            return Err(ConfigError::Missing(*name));
        }

        let [folder_id, client_id, client_secret, refresh_token] =
            vars.map(|(_, v)| v.unwrap_or_default().trim().to_string());

        Ok(Some(Self {
            folder_id,
            client_id,
            client_secret,
            refresh_token,
        }))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
