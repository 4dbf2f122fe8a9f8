use reach_out::channels::{EmailSender, InstagramSender, Senders, SoundCloudSender};
use reach_out::config::OutreachConfig;
use reach_out::contact::{Channel, Contacted};
use reach_out::context::RunContext;
use reach_out::error::Result;
use reach_out::outreach::Outreach;
use reach_out::template::TemplateStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    eprintln!("📨 reach-out v{}", env!("CARGO_PKG_VERSION"));

    let config = OutreachConfig::from_env()?;

    // ── Senders ──────────────────────────────────────────────────────────
    let mut senders = Senders::new();
    match config.email.clone() {
        Some(email) => senders.add(Channel::Email, Box::new(EmailSender::new(email))),
        None => tracing::warn!("SENDER_EMAIL / SENDER_PASSWORD not set, email rows will not be sent"),
    }
    senders.add(Channel::Instagram, Box::new(InstagramSender::new()));
    senders.add(Channel::SoundCloud, Box::new(SoundCloudSender::new()));
    eprintln!("   Senders: {} registered", senders.count());

    // ── Data source ──────────────────────────────────────────────────────
    let mut ctx = RunContext::open(&config).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let templates = TemplateStore::new(&config.template_dir);
    let outreach = Outreach::new(templates, senders).with_dry_run(config.dry_run);
    let summary = outreach.run(&mut ctx).await;

    eprintln!(
        "\nDone: {} sent, {} failed, {} skipped of {} contacts ({} backend)",
        summary.sent,
        summary.send_failed + summary.render_failed + summary.persist_failed,
        summary.skipped,
        summary.total,
        ctx.backend()
    );

    let pending = ctx
        .finish()
        .iter()
        .filter(|c| c.contacted == Contacted::No)
        .count();
    eprintln!("   {pending} contacts still waiting for outreach");

    Ok(())
}
