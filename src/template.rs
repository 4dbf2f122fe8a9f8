//! Message templates: `{Message_Type}_{Language}.txt` files holding a subject and body.
//!
//! File format:
//!
//! ```text
//! {Subject: Hi [Name]}
//!
//! Come to [Event Name]!
//! ```

use std::path::{Path, PathBuf};

use crate::contact::Contact;
use crate::error::TemplateError;

const SUBJECT_PREFIX: &str = "{Subject: ";
const SEPARATOR: &str = "}\n\n";
const NAME_PLACEHOLDER: &str = "[Name]";
const EVENT_PLACEHOLDER: &str = "[Event Name]";

/// A parsed template with placeholders still in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub subject: String,
    pub body: String,
}

/// Subject and body ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

impl Template {
    /// Parse template text. `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, TemplateError> {
        let text = text.replace("\r\n", "\n");
        let segments: Vec<&str> = text.split(SEPARATOR).collect();
        let [head, body] = segments.as_slice() else {
            return Err(TemplateError::Malformed {
                path: path.to_path_buf(),
                reason: format!(
                    "expected a subject and a body separated by {SEPARATOR:?}, found {} segment(s)",
                    segments.len()
                ),
            });
        };
        let subject = head
            .strip_prefix(SUBJECT_PREFIX)
            .ok_or_else(|| TemplateError::Malformed {
                path: path.to_path_buf(),
                reason: format!("subject line must start with {SUBJECT_PREFIX:?}"),
            })?;

        Ok(Self {
            subject: subject.to_string(),
            body: body.to_string(),
        })
    }

    /// Substitute `[Name]` and `[Event Name]` in both subject and body.
    pub fn render(&self, name: &str, event_name: &str) -> RenderedMessage {
        let fill = |s: &str| {
            s.replace(NAME_PLACEHOLDER, name)
                .replace(EVENT_PLACEHOLDER, event_name)
        };
        RenderedMessage {
            subject: fill(&self.subject),
            body: fill(&self.body),
        }
    }
}

/// Directory of template files.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the template for a contact. The key must stay inside the
    /// template directory, so separators and parent references are refused.
    pub fn path_for(&self, contact: &Contact) -> Result<PathBuf, TemplateError> {
        let key = contact.template_key();
        if key.contains(['/', '\\']) || key.contains("..") {
            return Err(TemplateError::InvalidKey(key));
        }
        Ok(self.dir.join(format!("{key}.txt")))
    }

    pub fn exists(&self, contact: &Contact) -> bool {
        self.path_for(contact).is_ok_and(|path| path.is_file())
    }

    pub fn load(&self, contact: &Contact) -> Result<Template, TemplateError> {
        let path = self.path_for(contact)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound(path));
            }
            Err(e) => return Err(e.into()),
        };
        Template::parse(&text, &path)
    }

    /// Load the contact's template and fill in its placeholders.
    pub fn render(&self, contact: &Contact) -> Result<RenderedMessage, TemplateError> {
        let template = self.load(contact)?;
        Ok(template.render(&contact.name, &contact.event_name))
    }
}
