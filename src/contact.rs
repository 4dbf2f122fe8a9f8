//! Typed contact records, parsed once from a backend's header + rows.

use std::fmt;

use crate::error::SourceError;

/// Column headers every contact table must carry.
pub mod columns {
    pub const NAME: &str = "Name";
    pub const EVENT_NAME: &str = "Event_Name";
    pub const CHANNEL: &str = "Channel";
    pub const HANDLE: &str = "Handle";
    pub const LANGUAGE: &str = "Language";
    pub const MESSAGE_TYPE: &str = "Message_Type";
    pub const CONTACTED: &str = "Contacted";

    pub const ALL: [&str; 7] = [
        NAME,
        EVENT_NAME,
        CHANNEL,
        HANDLE,
        LANGUAGE,
        MESSAGE_TYPE,
        CONTACTED,
    ];
}

/// Delivery mechanism for a contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Email,
    Instagram,
    SoundCloud,
    /// Any value outside the supported set, kept verbatim for diagnostics.
    Other(String),
}

impl Channel {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "email" => Self::Email,
            "instagram" => Self::Instagram,
            "soundcloud" => Self::SoundCloud,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Email => "email",
            Self::Instagram => "instagram",
            Self::SoundCloud => "soundcloud",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Language {
    En,
    Fr,
    Other(String),
}

impl Language {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "EN" => Self::En,
            "FR" => Self::Fr,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::En => "EN",
            Self::Fr => "FR",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a contact has already been reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contacted {
    Yes,
    No,
    Other(String),
}

impl Contacted {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Yes" => Self::Yes,
            "No" => Self::No,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Contacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outreach target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Zero-based data row index within the originating backend (header excluded).
    pub row_index: usize,
    pub name: String,
    pub event_name: String,
    pub channel: Channel,
    pub handle: String,
    pub language: Language,
    pub message_type: String,
    pub contacted: Contacted,
}

impl Contact {
    /// Template key: `{Message_Type}_{Language}`.
    pub fn template_key(&self) -> String {
        format!("{}_{}", self.message_type, self.language)
    }
}

/// Positions of the required columns within a header row.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    name: usize,
    event_name: usize,
    channel: usize,
    handle: usize,
    language: usize,
    message_type: usize,
    contacted: usize,
}

impl ColumnMap {
    /// Locate every required column, failing on the first one absent.
    pub fn from_header(header: &[String]) -> Result<Self, SourceError> {
        let find = |column: &str| {
            column_index(header, column).ok_or_else(|| SourceError::MissingColumn(column.into()))
        };
        Ok(Self {
            name: find(columns::NAME)?,
            event_name: find(columns::EVENT_NAME)?,
            channel: find(columns::CHANNEL)?,
            handle: find(columns::HANDLE)?,
            language: find(columns::LANGUAGE)?,
            message_type: find(columns::MESSAGE_TYPE)?,
            contacted: find(columns::CONTACTED)?,
        })
    }

    /// Build a contact from a data row. Missing trailing cells read as empty.
    pub fn contact(&self, row_index: usize, row: &[String]) -> Contact {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        Contact {
            row_index,
            name: cell(self.name).to_string(),
            event_name: cell(self.event_name).to_string(),
            channel: Channel::parse(cell(self.channel)),
            handle: cell(self.handle).to_string(),
            language: Language::parse(cell(self.language)),
            message_type: cell(self.message_type).to_string(),
            contacted: Contacted::parse(cell(self.contacted)),
        }
    }
}

/// Find a column by exact header name.
pub fn column_index(header: &[String], column: &str) -> Option<usize> {
    header.iter().position(|h| h == column)
}

/// Parse a header + data rows into contacts, in row order.
pub fn parse_table(header: &[String], rows: &[Vec<String>]) -> Result<Vec<Contact>, SourceError> {
    let map = ColumnMap::from_header(header)?;
    Ok(rows
        .iter()
        .enumerate()
        .map(|(i, row)| map.contact(i, row))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn enums_parse_exact_values() {
        assert_eq!(Channel::parse("email"), Channel::Email);
        assert_eq!(Channel::parse("Email"), Channel::Other("Email".into()));
        assert_eq!(Language::parse("FR"), Language::Fr);
        assert_eq!(Language::parse("fr"), Language::Other("fr".into()));
        assert_eq!(Contacted::parse("No"), Contacted::No);
        assert_eq!(Contacted::parse(""), Contacted::Other(String::new()));
    }

    #[test]
    fn parse_table_maps_columns_by_name() {
        let header = strings(&[
            "Contacted",
            "Name",
            "Event_Name",
            "Notes",
            "Channel",
            "Handle",
            "Language",
            "Message_Type",
        ]);
        let rows = vec![strings(&[
            "No", "Jo", "Gala", "vip", "email", "a@b.com", "EN", "invite",
        ])];
        let contacts = parse_table(&header, &rows).unwrap();
        assert_eq!(contacts.len(), 1);
        let c = &contacts[0];
        assert_eq!(c.row_index, 0);
        assert_eq!(c.name, "Jo");
        assert_eq!(c.event_name, "Gala");
        assert_eq!(c.channel, Channel::Email);
        assert_eq!(c.handle, "a@b.com");
        assert_eq!(c.language, Language::En);
        assert_eq!(c.contacted, Contacted::No);
        assert_eq!(c.template_key(), "invite_EN");
    }

    #[test]
    fn short_rows_are_padded_with_empty_cells() {
        let header = strings(&columns::ALL);
        let rows = vec![strings(&["Jo", "Gala", "instagram"])];
        let contacts = parse_table(&header, &rows).unwrap();
        assert_eq!(contacts[0].handle, "");
        assert_eq!(contacts[0].contacted, Contacted::Other(String::new()));
    }

    #[test]
    fn missing_column_is_reported() {
        let header = strings(&["Name", "Event_Name", "Channel", "Handle", "Language", "Message_Type"]);
        let err = parse_table(&header, &[]).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn(ref c) if c == "Contacted"));
    }
}
