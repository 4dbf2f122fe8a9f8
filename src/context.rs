//! Run context — the chosen data source and the contact table it produced.

use tracing::{info, warn};

use crate::config::OutreachConfig;
use crate::contact::{Contact, Contacted, columns};
use crate::error::SourceError;
use crate::source::{ContactSource, CsvSource, SheetsSource};

/// State for one outreach run. The backend is chosen once, when the context
/// is opened, and every update goes back to that same backend.
pub struct RunContext {
    source: Box<dyn ContactSource>,
    contacts: Vec<Contact>,
}

impl RunContext {
    /// Open the Google Sheet if configured, falling back to the CSV file.
    pub async fn open(config: &OutreachConfig) -> Result<Self, SourceError> {
        let remote: Result<Box<dyn ContactSource>, SourceError> = match &config.sheets {
            Some(sheets) => SheetsSource::connect(sheets)
                .await
                .map(|s| Box::new(s) as Box<dyn ContactSource>),
            None => Err(SourceError::NotConfigured {
                backend: "google-sheets".into(),
                reason: "SPREADSHEET_ID is not set".into(),
            }),
        };
        let data_file = config.data_file.clone();
        Self::open_with_fallback(remote, move || Box::new(CsvSource::new(data_file))).await
    }

    /// Load from `remote` if it was constructed and loads cleanly; otherwise
    /// build and load the fallback. A fallback failure is fatal.
    pub async fn open_with_fallback<F>(
        remote: Result<Box<dyn ContactSource>, SourceError>,
        fallback: F,
    ) -> Result<Self, SourceError>
    where
        F: FnOnce() -> Box<dyn ContactSource>,
    {
        match remote {
            Ok(mut source) => match source.load().await {
                Ok(contacts) => {
                    info!("Using {} backend", source.name());
                    return Ok(Self { source, contacts });
                }
                Err(e) => warn!("Could not load from {}: {e}", source.name()),
            },
            Err(e @ SourceError::NotConfigured { .. }) => info!("{e}"),
            Err(e) => warn!("Could not open remote data source: {e}"),
        }

        let mut source = fallback();
        info!("Falling back to {} backend", source.name());
        let contacts = source.load().await?;
        Ok(Self { source, contacts })
    }

    /// Build a context from an already loaded table.
    pub fn from_parts(source: Box<dyn ContactSource>, contacts: Vec<Contact>) -> Self {
        Self { source, contacts }
    }

    /// Name of the backend in use.
    pub fn backend(&self) -> &str {
        self.source.name()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Mark contact `index` as contacted in memory, then persist the change.
    pub async fn mark_contacted(&mut self, index: usize) -> Result<(), SourceError> {
        let len = self.contacts.len();
        let contact = self
            .contacts
            .get_mut(index)
            .ok_or(SourceError::RowOutOfRange { row: index, len })?;
        contact.contacted = Contacted::Yes;
        let row_index = contact.row_index;
        self.source
            .update(row_index, columns::CONTACTED, Contacted::Yes.as_str())
            .await
    }

    /// End the run, handing back the final contact table.
    pub fn finish(self) -> Vec<Contact> {
        self.contacts
    }
}
