use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::Args;
use codify_core::{
    Attachment, BackendConfig, BackendSubmitter, Field, LeadId, QuoteRequest, QuoteSubmitter,
    QuoteWizard, SubmitOutcome, Telemetry, TelemetryConfig, format_quote_readable,
    quote::SubmitError,
};
use console::style;

use crate::{create_spinner, finish_pipeline, start_pipeline};

#[derive(Args)]
pub struct QuoteArgs {
    #[arg(long)]
    project_type: String,

    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long, default_value = "")]
    company: String,

    #[arg(long, default_value = "")]
    phone: String,

    #[arg(long)]
    budget: String,

    #[arg(long)]
    timeline: String,

    #[arg(long)]
    description: String,

    /// Repeat to select several features
    #[arg(long = "feature")]
    features: Vec<String>,

    #[arg(long, default_value = "")]
    has_design: String,

    #[arg(long, default_value = "")]
    needs_hosting: String,

    #[arg(long, default_value = "")]
    notes: String,

    /// File to reference in the request
    #[arg(long)]
    file: Option<PathBuf>,

    /// Walk the wizard without storing the lead
    #[arg(long)]
    dry_run: bool,
}

/// Accepts every request without contacting the backend.
struct DryRunSubmitter;

#[async_trait]
impl QuoteSubmitter for DryRunSubmitter {
    async fn submit_quote(&self, _request: &QuoteRequest) -> Result<LeadId, SubmitError> {
        Ok(LeadId::from(format!("dry-run-{}", uuid::Uuid::new_v4())))
    }
}

fn advance(wizard: &mut QuoteWizard) -> Result<()> {
    let from = wizard.state().title();
    wizard.next()?;
    println!(
        "{} {} {}",
        style("✓").green().bold(),
        from,
        style(format!("→ step {}", wizard.current_step())).dim()
    );
    Ok(())
}

pub async fn run(args: QuoteArgs, config: &TelemetryConfig) -> Result<()> {
    let submitter: Box<dyn QuoteSubmitter> = if args.dry_run {
        Box::new(DryRunSubmitter)
    } else {
        let backend = BackendConfig::from_env()
            .context("Set CODIFY_BACKEND_URL and CODIFY_BACKEND_KEY, or pass --dry-run")?;
        Box::new(BackendSubmitter::new(backend, config.user_agent.clone()))
    };

    let handle = start_pipeline(config, Some("/orcamento".to_string()));
    let walked = walk(args, submitter.as_ref(), &handle.telemetry).await;

    // Events tracked before a wizard error still get delivered.
    let finished = finish_pipeline(handle, config).await;
    walked.and(finished)
}

async fn walk(
    args: QuoteArgs,
    submitter: &dyn QuoteSubmitter,
    telemetry: &Telemetry,
) -> Result<()> {
    telemetry.navigate("/orcamento", "", "");

    println!(
        "\n{}  {}\n",
        style("codify").cyan().bold(),
        style("Quote request").dim()
    );

    let mut wizard = QuoteWizard::new();

    wizard.set(Field::ProjectType, args.project_type)?;
    advance(&mut wizard)?;

    wizard.set(Field::Name, args.name)?;
    wizard.set(Field::Email, args.email)?;
    wizard.set(Field::Company, args.company)?;
    wizard.set(Field::Phone, args.phone)?;
    advance(&mut wizard)?;

    wizard.set(Field::Budget, args.budget)?;
    wizard.set(Field::Timeline, args.timeline)?;
    wizard.set(Field::Description, args.description)?;
    for feature in &args.features {
        wizard.toggle_feature(feature)?;
    }
    advance(&mut wizard)?;

    wizard.set(Field::HasDesign, args.has_design)?;
    wizard.set(Field::NeedsHosting, args.needs_hosting)?;
    wizard.set(Field::AdditionalInfo, args.notes)?;
    if let Some(path) = args.file {
        let Some(file) = Attachment::from_path(&path) else {
            bail!("Not a file path: {}", path.display());
        };
        wizard.attach(file)?;
    }

    let spinner = create_spinner("Submitting quote...")?;
    let outcome = wizard.submit(submitter).await?;
    match &outcome {
        SubmitOutcome::Accepted(id) => spinner.finish_with_message(format!(
            "{} Submitted {}",
            style("✓").green().bold(),
            style(format!("(lead {})", id)).dim()
        )),
        SubmitOutcome::Failed(reason) => spinner.finish_with_message(format!(
            "{} Submission failed: {}",
            style("✗").red().bold(),
            reason
        )),
    }

    telemetry.track_form_submission("quote", outcome.is_accepted());
    if outcome.is_accepted() {
        telemetry.track_conversion("quote_request", None);
    }

    if let Some(request) = wizard.request() {
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", format_quote_readable(request, wizard.outcome()));
    }

    Ok(())
}
