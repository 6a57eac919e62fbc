use anyhow::Context;
use bulk_sender::config::{Command, PreviewArgs, SampleArgs, SendArgs};
use bulk_sender::core::sample::write_sample;
use bulk_sender::domain::ports::DeliveryChannel;
use bulk_sender::utils::error::ErrorSeverity;
use bulk_sender::utils::{logger, validation::Validate};
use bulk_sender::{
    BulkSendEngine, ChannelKind, CliConfig, ConsoleReporter, DryRunChannel, LocalStorage,
    SendError, SenderSettings, WebDriverChannel,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting bulk-sender");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let result = match &cli.command {
        Command::Send(args) => send(cli.config.as_deref(), args).await,
        Command::Preview(args) => preview(cli.config.as_deref(), args).await,
        Command::Sample(args) => return sample(args).await,
    };

    if let Err(e) = result {
        exit_with(&e);
    }

    Ok(())
}

fn exit_with(e: &SendError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,     // bad input or configuration
        ErrorSeverity::Medium => 2,   // delivery session
        ErrorSeverity::Critical => 3, // system
    };
    std::process::exit(exit_code);
}

fn local_storage() -> LocalStorage {
    LocalStorage::new(".".to_string())
}

async fn send(config_path: Option<&str>, args: &SendArgs) -> bulk_sender::Result<()> {
    let mut settings = SenderSettings::load(config_path, &args.input)?;
    settings.apply_send_args(args)?;
    settings.validate()?;
    tracing::info!("✅ Configuration loaded and validated");

    let channel: Box<dyn DeliveryChannel> = match settings.channel {
        ChannelKind::DryRun => Box::new(DryRunChannel::new(settings.webdriver.chat_url.clone())),
        ChannelKind::Webdriver => Box::new(WebDriverChannel::new(settings.webdriver.clone())),
    };

    if settings.channel == ChannelKind::Webdriver {
        println!("⚠️ Please keep the browser window open until all messages are sent!");
    }

    let engine = BulkSendEngine::new(local_storage(), settings);
    let mut reporter = ConsoleReporter::stdout();
    let summary = engine.run(channel, &mut reporter).await?;

    if summary.all_succeeded() {
        tracing::info!("✅ All {} messages sent", summary.total);
    } else {
        tracing::warn!("{} of {} messages failed", summary.failed, summary.total);
    }
    Ok(())
}

async fn preview(config_path: Option<&str>, args: &PreviewArgs) -> bulk_sender::Result<()> {
    let mut settings = SenderSettings::load(config_path, &args.input)?;
    settings.apply_pacing_args(args.delay_secs, args.jitter_secs)?;
    if let Some(rows) = args.rows {
        settings.preview_rows = rows;
    }
    settings.validate()?;

    let rows = settings.preview_rows;
    let engine = BulkSendEngine::new(local_storage(), settings);
    let preview = engine.preview(rows).await?;

    println!("📋 Message preview");
    println!("{:>4}  {:<24} {:<18} Message", "Row", "Name", "Phone");
    for contact in &preview.contacts {
        println!(
            "{:>4}  {:<24} {:<18} {}",
            contact.row,
            contact.name,
            contact.raw_phone,
            contact.render_message()
        );
    }
    println!("📨 Total messages to send: {}", preview.total);
    println!(
        "⏱️ Estimated sending time: ~{:.1} minutes",
        preview.estimated_duration.as_secs_f64() / 60.0
    );
    Ok(())
}

async fn sample(args: &SampleArgs) -> anyhow::Result<()> {
    write_sample(&local_storage(), &args.output, args.force)
        .await
        .with_context(|| format!("Failed to write sample file {}", args.output))?;

    println!("📄 Sample contact file written to {}", args.output);
    Ok(())
}
