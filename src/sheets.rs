use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::models::NormalizedRecord;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4";
const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
const SHEET_RANGE: &str = "Sheet1";
const TOKEN_ENV: &str = "GOOGLE_ACCESS_TOKEN";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Bearer token for the Sheets and Drive APIs.
pub struct SheetsCredentials {
    pub access_token: String,
}

impl fmt::Debug for SheetsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsCredentials")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Accepted credentials files: a Google service-account key, or a file
/// holding a ready OAuth access token.
#[derive(Deserialize)]
#[serde(untagged)]
enum CredentialsFile {
    ServiceAccount(ServiceAccountKey),
    Token { access_token: String },
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    /// JWT-bearer grant: sign an assertion with the key and trade it for an
    /// access token at `token_uri`.
    async fn exchange(&self, http: &reqwest::Client) -> Result<String> {
        let iat = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SCOPES.join(" "),
            aud: &self.token_uri,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .context("Invalid service account private key")?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        let token: TokenResponse = http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("Token exchange for {} failed", self.client_email))?
            .json()
            .await?;
        info!("Authorized Google API access as {}", self.client_email);
        Ok(token.access_token)
    }
}

impl SheetsCredentials {
    /// `GOOGLE_ACCESS_TOKEN` wins over the file. A service-account key is
    /// exchanged for a token with the spreadsheets and drive scopes.
    pub async fn resolve(path: &Path) -> Result<Self> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Ok(Self { access_token: token });
            }
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Sheets credentials {}", path.display()))?;
        let file: CredentialsFile = serde_json::from_str(&text)
            .with_context(|| format!("Invalid Sheets credentials {}", path.display()))?;

        let access_token = match file {
            CredentialsFile::Token { access_token } => access_token,
            CredentialsFile::ServiceAccount(key) => key.exchange(&reqwest::Client::new()).await?,
        };
        Ok(Self { access_token })
    }
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

pub struct SheetsClient {
    http: reqwest::Client,
    token: String,
    sheets_api: String,
    drive_api: String,
}

impl SheetsClient {
    pub fn new(credentials: SheetsCredentials) -> Self {
        Self::with_endpoints(credentials, SHEETS_API, DRIVE_API)
    }

    pub fn with_endpoints(credentials: SheetsCredentials, sheets_api: &str, drive_api: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: credentials.access_token,
            sheets_api: sheets_api.trim_end_matches('/').to_string(),
            drive_api: drive_api.trim_end_matches('/').to_string(),
        }
    }

    /// Write header + rows into the named spreadsheet, reusing it when one
    /// with that name exists. Returns the spreadsheet URL.
    pub async fn upload(&self, sheet_name: &str, records: &[NormalizedRecord]) -> Result<String> {
        let existing = match self.find_spreadsheet(sheet_name).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Spreadsheet search failed, creating a new one");
                None
            }
        };

        let id = match existing {
            Some(id) => {
                info!("Found existing sheet: {} (ID: {})", sheet_name, id);
                id
            }
            None => {
                let id = self.create_spreadsheet(sheet_name).await?;
                self.share_publicly(&id).await?;
                info!("Created new sheet: {} (ID: {})", sheet_name, id);
                id
            }
        };

        self.clear(&id).await?;
        self.write_values(&id, to_values(records)).await?;

        let url = format!("https://docs.google.com/spreadsheets/d/{}", id);
        info!("Data loaded to Google Sheets: {}", url);
        Ok(url)
    }

    async fn find_spreadsheet(&self, name: &str) -> Result<Option<String>> {
        let query = format!(
            "name='{}' and mimeType='application/vnd.google-apps.spreadsheet'",
            name.replace('\'', "\\'")
        );
        let list: FileList = self
            .http
            .get(format!("{}/files", self.drive_api))
            .bearer_auth(&self.token)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_spreadsheet(&self, name: &str) -> Result<String> {
        let created: CreatedSpreadsheet = self
            .http
            .post(format!("{}/spreadsheets", self.sheets_api))
            .bearer_auth(&self.token)
            .json(&json!({ "properties": { "title": name } }))
            .send()
            .await?
            .error_for_status()
            .context("Failed to create spreadsheet")?
            .json()
            .await?;
        Ok(created.spreadsheet_id)
    }

    async fn share_publicly(&self, id: &str) -> Result<()> {
        self.http
            .post(format!("{}/files/{}/permissions", self.drive_api, id))
            .bearer_auth(&self.token)
            .json(&json!({ "type": "anyone", "role": "writer" }))
            .send()
            .await?
            .error_for_status()
            .context("Failed to share spreadsheet")?;
        Ok(())
    }

    async fn clear(&self, id: &str) -> Result<()> {
        self.http
            .post(format!("{}/spreadsheets/{}/values/{}:clear", self.sheets_api, id, SHEET_RANGE))
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await?
            .error_for_status()
            .context("Failed to clear sheet")?;
        Ok(())
    }

    async fn write_values(&self, id: &str, values: Vec<Vec<Value>>) -> Result<()> {
        self.http
            .put(format!("{}/spreadsheets/{}/values/{}!A1", self.sheets_api, id, SHEET_RANGE))
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": values }))
            .send()
            .await?
            .error_for_status()
            .context("Failed to write sheet values")?;
        Ok(())
    }
}

/// Header row followed by one row per record, numbers kept numeric.
fn to_values(records: &[NormalizedRecord]) -> Vec<Vec<Value>> {
    let header = NormalizedRecord::HEADER.iter().map(|h| json!(h)).collect();
    let mut values = vec![header];
    values.extend(records.iter().map(|r| {
        vec![
            json!(r.title),
            json!(r.price_local),
            json!(r.rating),
            json!(r.color_count),
            json!(r.size),
            json!(r.gender),
            json!(r.captured_at),
        ]
    }));
    values
}

/// Resolve credentials and upload; errors stay with the caller to report.
pub async fn load(credentials_path: &Path, sheet_name: &str, records: &[NormalizedRecord]) -> Result<String> {
    let credentials = SheetsCredentials::resolve(credentials_path)
        .await
        .context("Sheets credentials unavailable")?;
    SheetsClient::new(credentials).upload(sheet_name, records).await
}
