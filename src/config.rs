//! Configuration types, sourced from the environment.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_WORKSHEET: &str = "Sheet1";
const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
const DEFAULT_DATA_FILE: &str = "data.csv";
const DEFAULT_ATTACHMENT: &str = "presskit.pdf";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

/// Google Sheets backend settings.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet ID (the long token in the sheet URL).
    pub spreadsheet_id: String,
    /// Worksheet (tab) title.
    pub worksheet: String,
    /// Service-account key file.
    pub credentials_path: PathBuf,
}

/// Outbound SMTP settings for the email sender.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    /// Display name for the From header.
    pub from_name: Option<String>,
    pub password: SecretString,
    /// Press kit or similar file attached when present on disk.
    pub attachment: Option<PathBuf>,
}

/// Settings for one outreach run.
#[derive(Debug, Clone)]
pub struct OutreachConfig {
    /// `None` when `SPREADSHEET_ID` is unset; the run then uses the CSV file only.
    pub sheets: Option<SheetsConfig>,
    pub data_file: PathBuf,
    pub template_dir: PathBuf,
    /// `None` when sender credentials are absent; email rows then fail to send.
    pub email: Option<EmailConfig>,
    pub dry_run: bool,
}

impl OutreachConfig {
    /// Build config from environment variables, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let sheets = optional_var("SPREADSHEET_ID").map(|spreadsheet_id| SheetsConfig {
            spreadsheet_id,
            worksheet: optional_var("WORKSHEET_NAME")
                .unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
            credentials_path: optional_var("GOOGLE_CREDENTIALS_PATH")
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_PATH.to_string())
                .into(),
        });

        let email = EmailConfig::from_env()?;

        let config = Self {
            sheets,
            data_file: optional_var("OUTREACH_DATA_FILE")
                .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string())
                .into(),
            template_dir: optional_var("OUTREACH_TEMPLATE_DIR")
                .unwrap_or_else(|| ".".to_string())
                .into(),
            email,
            dry_run: parse_bool("OUTREACH_DRY_RUN", optional_var("OUTREACH_DRY_RUN"))?,
        };

        config.log_summary();
        Ok(config)
    }

    fn log_summary(&self) {
        tracing::info!("Config loaded:");
        match &self.sheets {
            Some(s) => tracing::info!(
                "  Spreadsheet: {} (worksheet {}, credentials {})",
                s.spreadsheet_id,
                s.worksheet,
                s.credentials_path.display()
            ),
            None => tracing::info!("  Spreadsheet: <not set>"),
        }
        tracing::info!("  Data file: {}", self.data_file.display());
        tracing::info!("  Templates: {}", self.template_dir.display());
        match &self.email {
            Some(e) => tracing::info!(
                "  Email: {} via {}:{}",
                e.from_address,
                e.smtp_host,
                e.smtp_port
            ),
            None => tracing::info!("  Email: <not set>"),
        }
        if self.dry_run {
            tracing::info!("  Dry run: nothing will be sent");
        }
    }
}

impl EmailConfig {
    /// Returns `Ok(None)` if `SENDER_EMAIL` or `SENDER_PASSWORD` is unset (email disabled).
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(from_address), Some(password)) =
            (optional_var("SENDER_EMAIL"), optional_var("SENDER_PASSWORD"))
        else {
            return Ok(None);
        };

        let smtp_port = match optional_var("SMTP_PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_PORT".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        // An explicitly empty OUTREACH_ATTACHMENT disables the attachment.
        let attachment = match std::env::var("OUTREACH_ATTACHMENT") {
            Ok(path) if path.trim().is_empty() => None,
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => Some(PathBuf::from(DEFAULT_ATTACHMENT)),
        };

        Ok(Some(Self {
            smtp_host: optional_var("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
            from_address,
            from_name: optional_var("SENDER_NAME"),
            password: SecretString::from(password),
            attachment,
        }))
    }
}

/// Read an env var, treating empty values as unset.
fn optional_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {value:?}"),
        }),
    }
}
