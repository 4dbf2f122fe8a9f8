//! Contact data sources: a remote Google Sheet or a local CSV file.

pub mod csv_file;
pub mod sheets;

pub use csv_file::CsvSource;
pub use sheets::SheetsSource;

use async_trait::async_trait;

use crate::contact::Contact;
use crate::error::SourceError;

/// A table of contacts that can be read in full and updated one cell at a time.
#[async_trait]
pub trait ContactSource: Send {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Read every data row, in table order.
    async fn load(&mut self) -> Result<Vec<Contact>, SourceError>;

    /// Write `value` into column `field` of data row `row_index` (zero-based, header excluded).
    async fn update(&mut self, row_index: usize, field: &str, value: &str)
    -> Result<(), SourceError>;
}
