//! Row eligibility rules.
//!
//! Rules run in a fixed order and stop at the first failure:
//! channel, handle format per channel, name, event name, language,
//! template presence, contacted flag.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::contact::{Channel, Contact, Contacted, Language};
use crate::template::TemplateStore;

/// Loose address check; matches from the start only, like `re.match`.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+").expect("valid email regex"));

static INSTAGRAM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]+$").expect("valid instagram regex"));

/// Why a contact was not eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    InvalidChannel(String),
    InvalidEmail(String),
    InvalidInstagramHandle(String),
    SoundCloudUnsupported,
    EmptyName { handle: String },
    EmptyEventName { handle: String },
    InvalidLanguage(String),
    TemplateNotFound(String),
    InvalidContacted(String),
    AlreadyContacted,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel(c) => write!(f, "Invalid channel: {c}"),
            Self::InvalidEmail(h) => write!(f, "Invalid email: {h}"),
            Self::InvalidInstagramHandle(h) => write!(f, "Invalid Instagram handle: {h}"),
            Self::SoundCloudUnsupported => f.write_str("SoundCloud not supported yet"),
            Self::EmptyName { handle } => write!(f, "Empty Name for {handle}"),
            Self::EmptyEventName { handle } => write!(f, "Empty Event Name for {handle}"),
            Self::InvalidLanguage(l) => write!(f, "Invalid language: {l}"),
            Self::TemplateNotFound(file) => write!(f, "Message file not found: {file}"),
            Self::InvalidContacted(v) => write!(f, "Invalid contacted: {v}"),
            Self::AlreadyContacted => f.write_str("Already contacted"),
        }
    }
}

/// Decides whether a contact may be messaged.
#[derive(Debug, Clone)]
pub struct Validator {
    templates: TemplateStore,
}

impl Validator {
    pub fn new(templates: TemplateStore) -> Self {
        Self { templates }
    }

    /// Log the first failing rule, if any, and report eligibility.
    pub fn validate(&self, contact: &Contact) -> bool {
        match self.check(contact) {
            Ok(()) => true,
            Err(rejection) => {
                warn!(row = contact.row_index, "{rejection}");
                false
            }
        }
    }

    /// Evaluate the rules in order, returning the first rejection.
    pub fn check(&self, contact: &Contact) -> Result<(), Rejection> {
        match &contact.channel {
            Channel::Email => {
                if !EMAIL_PATTERN.is_match(&contact.handle) {
                    return Err(Rejection::InvalidEmail(contact.handle.clone()));
                }
            }
            Channel::Instagram => {
                if !INSTAGRAM_PATTERN.is_match(&contact.handle) {
                    return Err(Rejection::InvalidInstagramHandle(contact.handle.clone()));
                }
            }
            Channel::SoundCloud => return Err(Rejection::SoundCloudUnsupported),
            Channel::Other(raw) => return Err(Rejection::InvalidChannel(raw.clone())),
        }

        if contact.name.is_empty() {
            return Err(Rejection::EmptyName {
                handle: contact.handle.clone(),
            });
        }
        if contact.event_name.is_empty() {
            return Err(Rejection::EmptyEventName {
                handle: contact.handle.clone(),
            });
        }

        if let Language::Other(raw) = &contact.language {
            return Err(Rejection::InvalidLanguage(raw.clone()));
        }

        if !self.templates.exists(contact) {
            return Err(Rejection::TemplateNotFound(format!(
                "{}.txt",
                contact.template_key()
            )));
        }

        match &contact.contacted {
            Contacted::No => Ok(()),
            Contacted::Yes => Err(Rejection::AlreadyContacted),
            Contacted::Other(raw) => Err(Rejection::InvalidContacted(raw.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        validator: Validator,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("invite_EN.txt"), "{Subject: Hi}\n\nBody").unwrap();
        let validator = Validator::new(TemplateStore::new(dir.path()));
        Fixture {
            _dir: dir,
            validator,
        }
    }

    fn contact() -> Contact {
        Contact {
            row_index: 0,
            name: "Jo".into(),
            event_name: "Gala".into(),
            channel: Channel::Email,
            handle: "a@b.com".into(),
            language: Language::En,
            message_type: "invite".into(),
            contacted: Contacted::No,
        }
    }

    #[test]
    fn valid_email_contact_passes() {
        let f = fixture();
        assert_eq!(f.validator.check(&contact()), Ok(()));
        assert!(f.validator.validate(&contact()));
    }

    #[test]
    fn unknown_channel_rejected_first() {
        let f = fixture();
        let c = Contact {
            channel: Channel::Other("fax".into()),
            name: String::new(),
            ..contact()
        };
        assert_eq!(f.validator.check(&c), Err(Rejection::InvalidChannel("fax".into())));
    }

    #[test]
    fn email_pattern() {
        let f = fixture();
        for bad in ["", "ab.com", "a@b", "@b.com", "a@@b.com"] {
            let c = Contact {
                handle: bad.into(),
                ..contact()
            };
            assert_eq!(
                f.validator.check(&c),
                Err(Rejection::InvalidEmail(bad.into())),
                "{bad}"
            );
        }
        for good in ["first.last@example.co.uk", "x@y.z"] {
            let c = Contact {
                handle: good.into(),
                ..contact()
            };
            assert_eq!(f.validator.check(&c), Ok(()), "{good}");
        }
    }

    #[test]
    fn instagram_handle_pattern() {
        let f = fixture();
        let ok = Contact {
            channel: Channel::Instagram,
            handle: "dj_some.one42".into(),
            ..contact()
        };
        assert_eq!(f.validator.check(&ok), Ok(()));

        let bad = Contact {
            channel: Channel::Instagram,
            handle: "@someone".into(),
            ..contact()
        };
        assert_eq!(
            f.validator.check(&bad),
            Err(Rejection::InvalidInstagramHandle("@someone".into()))
        );
    }

    #[test]
    fn soundcloud_always_rejected() {
        let f = fixture();
        let c = Contact {
            channel: Channel::SoundCloud,
            handle: "valid_handle".into(),
            ..contact()
        };
        assert_eq!(f.validator.check(&c), Err(Rejection::SoundCloudUnsupported));
    }

    #[test]
    fn empty_name_then_event_name() {
        let f = fixture();
        let c = Contact {
            name: String::new(),
            event_name: String::new(),
            ..contact()
        };
        assert_eq!(
            f.validator.check(&c),
            Err(Rejection::EmptyName {
                handle: "a@b.com".into()
            })
        );
        let c = Contact {
            event_name: String::new(),
            ..contact()
        };
        assert_eq!(
            f.validator.check(&c),
            Err(Rejection::EmptyEventName {
                handle: "a@b.com".into()
            })
        );
    }

    #[test]
    fn language_checked_before_template() {
        let f = fixture();
        let c = Contact {
            language: Language::Other("DE".into()),
            ..contact()
        };
        assert_eq!(f.validator.check(&c), Err(Rejection::InvalidLanguage("DE".into())));
    }

    #[test]
    fn missing_template_rejected() {
        let f = fixture();
        let c = Contact {
            language: Language::Fr,
            ..contact()
        };
        assert_eq!(
            f.validator.check(&c),
            Err(Rejection::TemplateNotFound("invite_FR.txt".into()))
        );
    }

    #[test]
    fn contacted_flag() {
        let f = fixture();
        let yes = Contact {
            contacted: Contacted::Yes,
            ..contact()
        };
        assert_eq!(f.validator.check(&yes), Err(Rejection::AlreadyContacted));
        assert!(!f.validator.validate(&yes));

        let odd = Contact {
            contacted: Contacted::Other("Maybe".into()),
            ..contact()
        };
        assert_eq!(
            f.validator.check(&odd),
            Err(Rejection::InvalidContacted("Maybe".into()))
        );
    }

    #[test]
    fn rule_order_short_circuits() {
        let f = fixture();

        let bad_email = Contact {
            name: String::new(),
            handle: "nope".into(),
            ..contact()
        };
        assert_eq!(
            f.validator.check(&bad_email),
            Err(Rejection::InvalidEmail("nope".into()))
        );

        let soundcloud = Contact {
            name: String::new(),
            channel: Channel::SoundCloud,
            ..contact()
        };
        assert_eq!(
            f.validator.check(&soundcloud),
            Err(Rejection::SoundCloudUnsupported)
        );

        let no_template = Contact {
            language: Language::Fr,
            contacted: Contacted::Other("Maybe".into()),
            ..contact()
        };
        assert_eq!(
            f.validator.check(&no_template),
            Err(Rejection::TemplateNotFound("invite_FR.txt".into()))
        );
    }

    #[test]
    fn message_type_with_path_separator_has_no_template() {
        let f = fixture();
        let c = Contact {
            message_type: "../invite".into(),
            ..contact()
        };
        assert!(matches!(
            f.validator.check(&c),
            Err(Rejection::TemplateNotFound(_))
        ));
    }

    #[test]
    fn rejection_messages_are_readable() {
        assert_eq!(
            Rejection::InvalidEmail("nope".into()).to_string(),
            "Invalid email: nope"
        );
        assert_eq!(Rejection::AlreadyContacted.to_string(), "Already contacted");
    }
}
