// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Drive photo hosting.
//!
//! Photos (receipts, arrivals, products, avatars) live in one shared Drive
//! folder and are referenced by their direct `lh3.googleusercontent.com` URL.
//! A photo arrives either as file bytes or as a Drive share link:
//! - links are rewritten to the direct URL without touching the Drive API
//! - files are uploaded through a [`DriveSession`] that is acquired for the
//!   request, used, and revoked

use crate::config::DriveConfig;
use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DIRECT_IMAGE_HOST: &str = "lh3.googleusercontent.com";
const MULTIPART_BOUNDARY: &str = "cafe_grao_314159265358979323846";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Largest decoded upload accepted (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where a photo comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhotoSource {
    /// File bytes to upload into the shared folder.
    #[serde(rename_all = "camelCase")]
    LocalFile {
        file_name: String,
        content_type: Option<String>,
        data_base64: String,
    },
    /// A Drive share link (or an already-direct image URL).
    RemoteLink { url: String },
}

/// What a photo documents; determines the uploaded file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoKind {
    Purchase,
    Arrival,
    Product,
    User,
}

impl PhotoKind {
    fn prefix(self) -> &'static str {
        match self {
            PhotoKind::Purchase => "purchase",
            PhotoKind::Arrival => "arrival",
            PhotoKind::Product => "product",
            PhotoKind::User => "user",
        }
    }
}

/// Drive link parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriveLinkError {
    #[error("not a Google Drive link")]
    NotDriveUrl,
    #[error("could not find a file ID in the Google Drive link")]
    MissingFileId,
}

// ─── Link Handling ────────────────────────────────────────────

fn host_of(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url.trim()).ok()?;
    matches!(parsed.scheme(), "http" | "https")
        .then(|| parsed.host_str().map(str::to_ascii_lowercase))
        .flatten()
}

/// True for `drive.google.com` and `docs.google.com` URLs.
pub fn is_google_drive_url(url: &str) -> bool {
    matches!(
        host_of(url).as_deref(),
        Some("drive.google.com" | "docs.google.com")
    )
}

fn is_direct_image_url(url: &str) -> bool {
    host_of(url).as_deref() == Some(DIRECT_IMAGE_HOST)
}

/// Direct image URL for a Drive file ID.
pub fn direct_image_url(file_id: &str) -> String {
    format!("https://{}/d/{}", DIRECT_IMAGE_HOST, file_id)
}

/// Rewrite a Drive share link as a direct image URL.
///
/// Accepts `/d/{id}`, `/file/d/{id}` and `?id={id}` forms. Direct image URLs
/// are returned unchanged.
pub fn convert_drive_link_to_image_url(link: &str) -> Result<String, DriveLinkError> {
    let link = link.trim();
    if is_direct_image_url(link) {
        return Ok(link.to_string());
    }
    if !is_google_drive_url(link) {
        return Err(DriveLinkError::NotDriveUrl);
    }

    extract_file_id(link)
        .map(direct_image_url)
        .ok_or(DriveLinkError::MissingFileId)
}

/// Normalize a stored photo reference for display.
///
/// Direct URLs lose any query string or size suffix, Drive links are
/// converted when possible, and anything else passes through.
pub fn ensure_image_url(url: &str) -> String {
    if is_direct_image_url(url) {
        let base = url.split('?').next().unwrap_or(url);
        return base.split('=').next().unwrap_or(base).to_string();
    }

    if is_google_drive_url(url) {
        return convert_drive_link_to_image_url(url).unwrap_or_else(|e| {
            tracing::debug!(error = %e, url, "Keeping unconvertible Drive URL as is");
            url.to_string()
        });
    }

    url.to_string()
}

fn extract_file_id(link: &str) -> Option<&str> {
    ["/d/", "id="].iter().find_map(|marker| {
        link.match_indices(marker).find_map(|(start, _)| {
            let rest = &link[start + marker.len()..];
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(rest.len());
            (end > 0).then(|| &rest[..end])
        })
    })
}

/// Name given to an uploaded file: `{kind}_{owner}_{millis}.{ext}`.
pub fn upload_file_name(
    kind: PhotoKind,
    owner_id: &str,
    unix_millis: i64,
    original_name: &str,
) -> String {
    let base = format!("{}_{}_{}", kind.prefix(), owner_id, unix_millis);
    match original_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{}.{}", base, ext),
        _ => base,
    }
}

// ─── Drive API Client ─────────────────────────────────────────

/// Short-lived Drive access, obtained for one unit of work.
///
/// Not `Clone`: [`DriveClient::revoke`] consumes the session so it cannot be
/// used after revocation.
#[derive(Debug)]
pub struct DriveSession {
    access_token: String,
    expires_at: Instant,
}

impl DriveSession {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: Option<String>,
}

/// Google Drive REST client for the shared photo folder.
#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    config: DriveConfig,
}

impl DriveClient {
    pub fn new(config: DriveConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Exchange the configured refresh token for an access token.
    pub async fn acquire_session(&self) -> Result<DriveSession, AppError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::DriveApi(format!("Token request failed: {}", e)))?;

        let token: TokenResponse = check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::DriveApi(format!("Invalid token response: {}", e)))?;

        tracing::debug!(expires_in = token.expires_in, "Drive session acquired");

        Ok(DriveSession {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    /// Upload a file into the shared folder and make it publicly readable.
    ///
    /// Returns the direct image URL. A failure to grant public read access
    /// is logged; the upload still counts and the file can be shared by hand.
    pub async fn upload(
        &self,
        session: &DriveSession,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        if session.is_expired() {
            return Err(AppError::DriveApi("Drive session expired".to_string()));
        }

        let metadata = serde_json::json!({
            "name": file_name,
            "parents": [self.config.folder_id],
        });
        let body = multipart_related_body(&metadata.to_string(), content_type, data);

        let response = self
            .http
            .post(UPLOAD_URL)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(&session.access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary=\"{}\"", MULTIPART_BOUNDARY),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::DriveApi(format!("Upload request failed: {}", e)))?;

        let uploaded: UploadedFile = check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::DriveApi(format!("Invalid upload response: {}", e)))?;

        let file_id = uploaded
            .id
            .ok_or_else(|| AppError::DriveApi("Upload response had no file ID".to_string()))?;

        if let Err(e) = self.share_publicly(session, &file_id).await {
            tracing::warn!(error = %e, file_id = %file_id, "Uploaded file could not be made public");
        }

        tracing::info!(file_id = %file_id, file_name, bytes = data.len(), "Photo uploaded to Drive");
        Ok(direct_image_url(&file_id))
    }

    async fn share_publicly(&self, session: &DriveSession, file_id: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!("{}/{}/permissions", FILES_URL, file_id))
            .bearer_auth(&session.access_token)
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| AppError::DriveApi(format!("Permission request failed: {}", e)))?;

        check_response(response).await?;
        Ok(())
    }

    /// Revoke the session's access token.
    pub async fn revoke(&self, session: DriveSession) -> Result<(), AppError> {
        let response = self
            .http
            .post(REVOKE_URL)
            .form(&[("token", session.access_token.as_str())])
            .send()
            .await
            .map_err(|e| AppError::DriveApi(format!("Revoke request failed: {}", e)))?;

        check_response(response).await?;
        tracing::debug!("Drive session revoked");
        Ok(())
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 401 || status.as_u16() == 403 {
        tracing::warn!(%status, "Drive rejected credentials");
    }

    Err(AppError::DriveApi(format!("HTTP {}: {}", status, body)))
}

fn multipart_related_body(metadata_json: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let head = format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n--{b}\r\nContent-Type: {ct}\r\n\r\n",
        b = MULTIPART_BOUNDARY,
        meta = metadata_json,
        ct = content_type,
    );
    let tail = format!("\r\n--{}--", MULTIPART_BOUNDARY);

    let mut body = Vec::with_capacity(head.len() + data.len() + tail.len());
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(tail.as_bytes());
    body
}

// ─── Photo Resolution ─────────────────────────────────────────

/// Turn a [`PhotoSource`] into the URL to store on the record.
///
/// `drive` is `None` when uploads are not configured; links still resolve.
pub async fn resolve_photo(
    drive: Option<&DriveClient>,
    source: PhotoSource,
    kind: PhotoKind,
    owner_id: &str,
    unix_millis: i64,
) -> Result<String, AppError> {
    match source {
        PhotoSource::RemoteLink { url } => convert_drive_link_to_image_url(&url).map_err(|e| {
            AppError::BadRequest(format!(
                "{}; share the file as \"Anyone with the link\" and paste that link",
                e
            ))
        }),
        PhotoSource::LocalFile {
            file_name,
            content_type,
            data_base64,
        } => {
            let data = decode_upload(&data_base64)?;
            let drive = drive.ok_or(AppError::DriveUnavailable)?;
            let name = upload_file_name(kind, owner_id, unix_millis, &file_name);
            let content_type = content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let session = drive.acquire_session().await?;
            let uploaded = drive.upload(&session, &name, &content_type, &data).await;
            if let Err(e) = drive.revoke(session).await {
                tracing::warn!(error = %e, "Failed to revoke Drive session");
            }
            uploaded
        }
    }
}

fn decode_upload(data_base64: &str) -> Result<Vec<u8>, AppError> {
    let data = STANDARD
        .decode(data_base64.trim())
        .map_err(|_| AppError::BadRequest("file data is not valid base64".to_string()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("file is empty".to_string()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "file exceeds {} bytes",
            MAX_UPLOAD_BYTES
        )));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_standard_share_link() {
        let link = "https://drive.google.com/file/d/1AbC_d-EfG/view?usp=sharing";
        assert_eq!(
            convert_drive_link_to_image_url(link).unwrap(),
            "https://lh3.googleusercontent.com/d/1AbC_d-EfG"
        );
    }

    #[test]
    fn test_convert_query_id_link() {
        let link = "https://drive.google.com/open?id=XYZ123";
        assert_eq!(
            convert_drive_link_to_image_url(link).unwrap(),
            "https://lh3.googleusercontent.com/d/XYZ123"
        );
    }

    #[test]
    fn test_convert_docs_link() {
        let link = "https://docs.google.com/uc?export=view&id=abc_DEF-9";
        assert_eq!(
            convert_drive_link_to_image_url(link).unwrap(),
            "https://lh3.googleusercontent.com/d/abc_DEF-9"
        );
    }

    #[test]
    fn test_direct_url_passes_through() {
        let url = "https://lh3.googleusercontent.com/d/FILE";
        assert_eq!(convert_drive_link_to_image_url(url).unwrap(), url);
    }

    #[test]
    fn test_convert_rejects_other_hosts() {
        assert_eq!(
            convert_drive_link_to_image_url("https://example.com/d/abc"),
            Err(DriveLinkError::NotDriveUrl)
        );
        assert_eq!(
            convert_drive_link_to_image_url("https://drive.google.com/drive/my-drive"),
            Err(DriveLinkError::MissingFileId)
        );
    }

    #[test]
    fn test_host_is_parsed_not_searched() {
        for url in [
            "https://evil.example/lh3.googleusercontent.com/x",
            "https://lh3.googleusercontent.com.evil.example/d/x",
            "https://evil.example/?next=drive.google.com/file/d/abc",
            "javascript:alert('lh3.googleusercontent.com')",
        ] {
            assert!(convert_drive_link_to_image_url(url).is_err(), "{url}");
            assert_eq!(ensure_image_url(url), url);
        }
        assert!(is_google_drive_url("https://DRIVE.google.com/file/d/a/view"));
        assert!(!is_google_drive_url("drive.google.com/file/d/a"));
    }

    #[test]
    fn test_ensure_image_url() {
        assert_eq!(
            ensure_image_url("https://lh3.googleusercontent.com/d/FILE=w400?authuser=0"),
            "https://lh3.googleusercontent.com/d/FILE"
        );
        assert_eq!(
            ensure_image_url("https://drive.google.com/file/d/F1/view"),
            "https://lh3.googleusercontent.com/d/F1"
        );
        assert_eq!(
            ensure_image_url("https://drive.google.com/drive/folders"),
            "https://drive.google.com/drive/folders"
        );
        assert_eq!(
            ensure_image_url("https://example.com/a.png"),
            "https://example.com/a.png"
        );
    }

    #[test]
    fn test_upload_file_name() {
        assert_eq!(
            upload_file_name(PhotoKind::Arrival, "c42", 1700000000000, "IMG_1.jpeg"),
            "arrival_c42_1700000000000.jpeg"
        );
        assert_eq!(
            upload_file_name(PhotoKind::Product, "p1", 5, "noext"),
            "product_p1_5"
        );
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_related_body("{\"name\":\"x\"}", "image/png", b"PNG");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with(&format!("--{}\r\n", MULTIPART_BOUNDARY)));
        assert!(text.contains("Content-Type: image/png\r\n\r\nPNG\r\n"));
        assert!(text.ends_with(&format!("--{}--", MULTIPART_BOUNDARY)));
    }

    #[test]
    fn test_photo_source_wire_format() {
        let link: PhotoSource =
            serde_json::from_str(r#"{"type":"remote_link","url":"https://x"}"#).unwrap();
        assert!(matches!(link, PhotoSource::RemoteLink { .. }));

        let file: PhotoSource = serde_json::from_str(
            r#"{"type":"local_file","fileName":"a.png","contentType":"image/png","dataBase64":"UE5H"}"#,
        )
        .unwrap();
        assert!(matches!(file, PhotoSource::LocalFile { .. }));
    }

    #[tokio::test]
    async fn test_resolve_link_without_drive() {
        let url = resolve_photo(
            None,
            PhotoSource::RemoteLink {
                url: "https://drive.google.com/file/d/abc/view".to_string(),
            },
            PhotoKind::Purchase,
            "c1",
            0,
        )
        .await
        .unwrap();
        assert_eq!(url, "https://lh3.googleusercontent.com/d/abc");
    }

    #[tokio::test]
    async fn test_resolve_file_without_drive_is_unavailable() {
        let result = resolve_photo(
            None,
            PhotoSource::LocalFile {
                file_name: "a.png".to_string(),
                content_type: None,
                data_base64: "UE5H".to_string(),
            },
            PhotoKind::Product,
            "p1",
            0,
        )
        .await;
        assert!(matches!(result, Err(AppError::DriveUnavailable)));
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_base64() {
        let result = resolve_photo(
            None,
            PhotoSource::LocalFile {
                file_name: "a.png".to_string(),
                content_type: None,
                data_base64: "%%%".to_string(),
            },
            PhotoKind::Product,
            "p1",
            0,
        )
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
