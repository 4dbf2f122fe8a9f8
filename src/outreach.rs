//! The outreach pass: validate, render, send, record — one contact at a time.

use tracing::{error, info};

use crate::channels::Senders;
use crate::context::RunContext;
use crate::template::TemplateStore;
use crate::validate::Validator;

/// Counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    /// Rejected by validation.
    pub skipped: usize,
    pub render_failed: usize,
    /// Rendered but not sent because of a dry run.
    pub previewed: usize,
    pub sent: usize,
    pub send_failed: usize,
    /// Sent, but the Contacted flag could not be written back.
    pub persist_failed: usize,
}

impl RunSummary {
    fn log(&self) {
        info!(
            total = self.total,
            skipped = self.skipped,
            render_failed = self.render_failed,
            previewed = self.previewed,
            sent = self.sent,
            send_failed = self.send_failed,
            persist_failed = self.persist_failed,
            "Outreach run finished"
        );
    }
}

/// Drives a run over every contact in a [`RunContext`].
pub struct Outreach {
    validator: Validator,
    templates: TemplateStore,
    senders: Senders,
    dry_run: bool,
}

impl Outreach {
    pub fn new(templates: TemplateStore, senders: Senders) -> Self {
        Self {
            validator: Validator::new(templates.clone()),
            templates,
            senders,
            dry_run: false,
        }
    }

    /// In a dry run contacts are validated and rendered but never sent or updated.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process every contact in load order. Per-row failures are logged and
    /// counted; the run always reaches the end of the table.
    pub async fn run(&self, ctx: &mut RunContext) -> RunSummary {
        let mut summary = RunSummary {
            total: ctx.contacts().len(),
            ..Default::default()
        };
        info!(
            "Processing {} contacts from {} backend",
            summary.total,
            ctx.backend()
        );

        for index in 0..summary.total {
            let contact = ctx.contacts()[index].clone();
            info!("Writing to {}:", contact.name);

            if !self.validator.validate(&contact) {
                summary.skipped += 1;
                continue;
            }

            let message = match self.templates.render(&contact) {
                Ok(message) => message,
                Err(e) => {
                    error!(row = contact.row_index, "Could not render message: {e}");
                    summary.render_failed += 1;
                    continue;
                }
            };
            info!("Generated {} message", contact.template_key());

            if self.dry_run {
                info!(
                    channel = %contact.channel,
                    handle = %contact.handle,
                    subject = %message.subject,
                    "Dry run, not sending"
                );
                summary.previewed += 1;
                continue;
            }

            let sent = self
                .senders
                .dispatch(
                    &contact.channel,
                    &contact.handle,
                    &message.subject,
                    &message.body,
                )
                .await;
            if !sent {
                summary.send_failed += 1;
                continue;
            }
            summary.sent += 1;

            if let Err(e) = ctx.mark_contacted(index).await {
                error!(
                    row = contact.row_index,
                    "Sent to {} but could not record it: {e}", contact.handle
                );
                summary.persist_failed += 1;
            }
        }

        summary.log();
        summary
    }
}
