//! Google Sheets backend — Sheets API v4 over reqwest, service-account auth.
//!
//! Authentication follows the OAuth 2.0 JWT bearer flow: the service-account
//! key signs an RS256 assertion which is exchanged at the key's `token_uri`
//! for a short-lived access token. One token covers the whole run.

use std::path::Path;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::SheetsConfig;
use crate::contact::{Contact, column_index, parse_table};
use crate::error::SourceError;
use crate::source::ContactSource;

/// Public Sheets API endpoint.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

const BACKEND: &str = "google-sheets";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const TOKEN_LIFETIME_SECS: i64 = 3600;

// ── Service-account auth ────────────────────────────────────────────

/// The fields of a service-account key file this backend needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Read and parse a key file.
    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(format!(
                    "credentials file {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|e| SourceError::Auth {
            backend: BACKEND.into(),
            reason: format!("invalid credentials file {}: {e}", path.display()),
        })
    }

    /// Sign the JWT assertion presented to the token endpoint.
    pub fn assertion(&self, issued_at: i64) -> Result<String, SourceError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SCOPE,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(|e| {
            SourceError::Auth {
                backend: BACKEND.into(),
                reason: format!("invalid service-account private key: {e}"),
            }
        })?;
        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|e| SourceError::Auth {
            backend: BACKEND.into(),
            reason: format!("failed to sign assertion: {e}"),
        })
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange a signed assertion for an access token.
async fn fetch_access_token(
    client: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<SecretString, SourceError> {
    let assertion = key.assertion(chrono::Utc::now().timestamp())?;
    let resp = client
        .post(&key.token_uri)
        .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(connection_error)?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(SourceError::Auth {
            backend: BACKEND.into(),
            reason: format!("token endpoint returned {status}: {body}"),
        });
    }

    let token: TokenResponse = resp.json().await.map_err(|e| SourceError::Auth {
        backend: BACKEND.into(),
        reason: format!("unreadable token response: {e}"),
    })?;
    Ok(SecretString::from(token.access_token))
}

// ── API payloads ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// A block of cell values. Sheets omits `values` for an empty range and
/// drops trailing empty cells from each row.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

// ── Source ──────────────────────────────────────────────────────────

/// One worksheet of a Google spreadsheet.
pub struct SheetsSource {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    worksheet: String,
    token: SecretString,
    header: Vec<String>,
    row_count: usize,
}

impl std::fmt::Debug for SheetsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsSource")
            .field("base_url", &self.base_url)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet", &self.worksheet)
            .finish_non_exhaustive()
    }
}

impl SheetsSource {
    /// Authenticate with the configured key file and open the worksheet.
    pub async fn connect(config: &SheetsConfig) -> Result<Self, SourceError> {
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;
        let client = reqwest::Client::new();
        let token = fetch_access_token(&client, &key).await?;
        tracing::info!("Authenticated with Google as {}", key.client_email);

        let source = Self::build(
            client,
            SHEETS_API_BASE,
            &config.spreadsheet_id,
            &config.worksheet,
            token,
        );
        source.open().await?;
        Ok(source)
    }

    /// Build a source around an existing access token. Does no I/O.
    pub fn with_token(
        base_url: &str,
        spreadsheet_id: &str,
        worksheet: &str,
        token: SecretString,
    ) -> Self {
        Self::build(
            reqwest::Client::new(),
            base_url,
            spreadsheet_id,
            worksheet,
            token,
        )
    }

    fn build(
        client: reqwest::Client,
        base_url: &str,
        spreadsheet_id: &str,
        worksheet: &str,
        token: SecretString,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            worksheet: worksheet.to_string(),
            token,
            header: Vec::new(),
            row_count: 0,
        }
    }

    /// Check that the spreadsheet is reachable and contains the worksheet.
    pub async fn open(&self) -> Result<(), SourceError> {
        let mut url = self.url(&["v4", "spreadsheets", self.spreadsheet_id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let what = format!("spreadsheet {}", self.spreadsheet_id);
        let resp = self.client.get(url).bearer_auth(self.token.expose_secret()).send().await;
        let meta: SpreadsheetMeta = read_json(resp, &what).await?;

        if !meta.sheets.iter().any(|s| s.properties.title == self.worksheet) {
            return Err(SourceError::NotFound(format!(
                "worksheet {:?} in {what}",
                self.worksheet
            )));
        }
        tracing::info!("Opened worksheet {:?} in {what}", self.worksheet);
        Ok(())
    }

    fn url(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| SourceError::Connection {
            backend: BACKEND.into(),
            reason: format!("invalid API base URL {}: {e}", self.base_url),
        })?;
        url.path_segments_mut()
            .map_err(|()| SourceError::Connection {
                backend: BACKEND.into(),
                reason: format!("API base URL {} cannot take a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn values_url(&self, range: &str) -> Result<Url, SourceError> {
        self.url(&["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range])
    }
}

#[async_trait]
impl ContactSource for SheetsSource {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn load(&mut self) -> Result<Vec<Contact>, SourceError> {
        let url = self.values_url(&quote_sheet(&self.worksheet))?;
        let what = format!("worksheet {:?}", self.worksheet);
        let resp = self.client.get(url).bearer_auth(self.token.expose_secret()).send().await;
        let range: ValueRange = read_json(resp, &what).await?;

        let mut rows = range.values.into_iter();
        self.header = rows.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = rows.collect();
        self.row_count = rows.len();

        let contacts = parse_table(&self.header, &rows)?;
        tracing::info!(
            "Loaded {} contacts from worksheet {:?}",
            contacts.len(),
            self.worksheet
        );
        Ok(contacts)
    }

    async fn update(
        &mut self,
        row_index: usize,
        field: &str,
        value: &str,
    ) -> Result<(), SourceError> {
        let column = column_index(&self.header, field)
            .ok_or_else(|| SourceError::MissingColumn(field.to_string()))?;
        if row_index >= self.row_count {
            return Err(SourceError::RowOutOfRange {
                row: row_index,
                len: self.row_count,
            });
        }

        let range = format!(
            "{}!{}",
            quote_sheet(&self.worksheet),
            cell_ref(column, row_index)
        );
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = ValueRange {
            range: Some(range.clone()),
            major_dimension: Some("ROWS".into()),
            values: vec![vec![value.to_string()]],
        };
        let resp = self
            .client
            .put(url)
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await;
        let _: serde_json::Value = read_json(resp, &format!("range {range}")).await?;

        tracing::debug!(range = %range, value, "Updated cell");
        Ok(())
    }
}

// ── Helpers (public for testing) ────────────────────────────────────

/// Column letter(s) for a zero-based column index: 0 → A, 25 → Z, 26 → AA.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A1 reference of a data cell. The header is sheet row 1, so data row 0 is row 2.
pub fn cell_ref(column: usize, row_index: usize) -> String {
    format!("{}{}", column_letter(column), row_index + 2)
}

/// Quote a worksheet title for A1 notation. Always quoted, since a bare title
/// such as `Q3` would be read as a cell reference.
pub fn quote_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn connection_error(e: reqwest::Error) -> SourceError {
    SourceError::Connection {
        backend: BACKEND.into(),
        reason: e.to_string(),
    }
}

/// Map transport and HTTP status failures, then decode the JSON body.
async fn read_json<T: DeserializeOwned>(
    resp: Result<reqwest::Response, reqwest::Error>,
    what: &str,
) -> Result<T, SourceError> {
    let resp = resp.map_err(connection_error)?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Auth {
                backend: BACKEND.into(),
                reason: format!("access to {what} denied ({status}): {body}"),
            },
            StatusCode::NOT_FOUND => SourceError::NotFound(what.to_string()),
            _ => SourceError::Api {
                backend: BACKEND.into(),
                status: status.as_u16(),
                body,
            },
        });
    }
    resp.json().await.map_err(|e| SourceError::Api {
        backend: BACKEND.into(),
        status: status.as_u16(),
        body: format!("unreadable response for {what}: {e}"),
    })
}
