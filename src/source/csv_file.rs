//! CSV file backend. Every update rewrites the whole file.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::contact::{Contact, column_index, parse_table};
use crate::error::SourceError;
use crate::source::ContactSource;

/// Contacts stored in a local delimited file with a header row.
pub struct CsvSource {
    path: PathBuf,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            header: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn read_table(&mut self) -> Result<(), SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        self.header = reader.headers()?.iter().map(String::from).collect();
        self.rows = reader
            .records()
            .map(|r| r.map(|record| record.iter().map(String::from).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, csv::Error>>()?;
        Ok(())
    }

    /// Serialize the in-memory table and atomically replace the file.
    fn write_table(&self) -> Result<(), SourceError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let data = writer.into_inner().map_err(|e| e.into_error())?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&data)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[async_trait]
impl ContactSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn load(&mut self) -> Result<Vec<Contact>, SourceError> {
        self.read_table()?;
        let contacts = parse_table(&self.header, &self.rows)?;
        tracing::info!(
            "Loaded {} contacts from {}",
            contacts.len(),
            self.path.display()
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
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(row_index)
            .ok_or(SourceError::RowOutOfRange {
                row: row_index,
                len,
            })?;
        if row.len() <= column {
            row.resize(column + 1, String::new());
        }
        row[column] = value.to_string();
        self.write_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Channel, Contacted};

    const TABLE: &str = "\
Name,Event_Name,Channel,Handle,Language,Message_Type,Contacted,Notes
Jo,Gala,email,a@b.com,EN,invite,No,\"met at the bar, call back\"
Sam,Fest,instagram,sam.dj,FR,followup,Yes,
";

    fn write_table(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("data.csv");
        std::fs::write(&path, TABLE).unwrap();
        path
    }

    #[tokio::test]
    async fn load_parses_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = CsvSource::new(write_table(&dir));
        let contacts = source.load().await.unwrap();

        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Jo");
        assert_eq!(contacts[0].channel, Channel::Email);
        assert_eq!(contacts[1].row_index, 1);
        assert_eq!(contacts[1].contacted, Contacted::Yes);
    }

    #[tokio::test]
    async fn update_then_reload_reflects_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(&dir);
        let mut source = CsvSource::new(&path);
        source.load().await.unwrap();
        source.update(0, "Contacted", "Yes").await.unwrap();

        let mut reloaded = CsvSource::new(&path);
        let contacts = reloaded.load().await.unwrap();
        assert_eq!(contacts[0].contacted, Contacted::Yes);
        assert_eq!(contacts[1].contacted, Contacted::Yes);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"met at the bar, call back\""));
        assert!(raw.starts_with("Name,Event_Name,Channel"));
    }

    #[tokio::test]
    async fn update_unknown_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = CsvSource::new(write_table(&dir));
        source.load().await.unwrap();
        let err = source.update(0, "Status", "Yes").await.unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn(ref c) if c == "Status"));
    }

    #[tokio::test]
    async fn update_out_of_range_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = CsvSource::new(write_table(&dir));
        source.load().await.unwrap();
        let err = source.update(5, "Contacted", "Yes").await.unwrap_err();
        assert!(matches!(err, SourceError::RowOutOfRange { row: 5, len: 2 }));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = CsvSource::new(dir.path().join("absent.csv"));
        assert!(source.load().await.is_err());
    }
}
