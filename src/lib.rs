//! reach-out — personalized outreach to a contact table, one row at a time.

pub mod channels;
pub mod config;
pub mod contact;
pub mod context;
pub mod error;
pub mod outreach;
pub mod source;
pub mod template;
pub mod validate;
