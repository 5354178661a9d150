use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use extract_client::{
    readable_query_type, Clause, ClientConfig, CombinePolicy, CriteriaModel, DataSlice,
    ExtractJob, ExtractJobClient, HttpExtractApi, JobPhase, MemorySchema, QueryExecutor,
    SearchOutcome,
};

#[derive(Parser)]
#[command(name = "extract", about = "Preview searches and bulk extracts against a search server")]
struct Cli {
    /// Search server root (overrides EXTRACT_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct CriteriaArgs {
    /// JSON file holding the clause list
    #[arg(long)]
    criteria: PathBuf,

    /// JSON schema file used to describe fields
    #[arg(long)]
    schema: Option<PathBuf>,

    /// `all` joins clauses with AND, anything else with OR
    #[arg(long, default_value = "all")]
    policy: String,
}

#[derive(Subcommand)]
enum Command {
    /// Run a preview search and print one page of results
    Search {
        #[command(flatten)]
        criteria: CriteriaArgs,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Submit an extract, wait for it and fetch the artifact
    Export {
        #[command(flatten)]
        criteria: CriteriaArgs,

        /// JSON file mapping columns to the fields to export
        #[arg(long)]
        slice: Option<PathBuf>,

        /// Write the artifact here instead of stdout
        #[arg(long, conflicts_with = "open")]
        out: Option<PathBuf>,

        /// Open the download link in a browser instead of fetching it
        #[arg(long)]
        open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,extract=info,extract_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("Invalid EXTRACT_* configuration")?;
    if let Some(url) = cli.base_url {
        config = config.with_base_url(url);
    }
    info!(base_url = %config.base_url, "Using search server");
    let api = Arc::new(HttpExtractApi::new(&config).context("Failed to build HTTP client")?);

    match cli.command {
        Command::Search { criteria, page } => {
            let model = load_criteria(&criteria)?;
            print_criteria(&model);
            search(api, &config, &model, page).await
        }
        Command::Export {
            criteria,
            slice,
            out,
            open,
        } => {
            let model = load_criteria(&criteria)?;
            let slice = match slice {
                Some(path) => read_json::<DataSlice>(&path)?,
                None => DataSlice::new(),
            };
            print_criteria(&model);
            export(api, &config, &model, &slice, out, open).await
        }
    }
}

async fn search(
    api: Arc<HttpExtractApi>,
    config: &ClientConfig,
    model: &CriteriaModel,
    page: u32,
) -> Result<()> {
    let executor = QueryExecutor::new(api).with_pagination(config.pagination);
    info!(page, pagination = ?config.pagination, "Running preview search");

    match executor.execute(model, page).await.context("Could not process this search")? {
        SearchOutcome::NoCriteria => {
            eprintln!("{}", "No complete clauses, nothing to search".bright_yellow());
        }
        SearchOutcome::Page(page) => {
            eprintln!(
                "{} {} result(s) on page {}{}",
                "✓".bright_green(),
                page.len(),
                page.page_number.unwrap_or(1),
                page.total_pages
                    .map(|t| format!(" of {t}"))
                    .unwrap_or_default(),
            );
            for row in &page.object_list {
                println!("{}", serde_json::to_string(row)?);
            }
            if page.has_next_page() {
                eprintln!("{}", "More results on the next page".dimmed());
            }
        }
        SearchOutcome::Superseded => {}
    }
    Ok(())
}

async fn export(
    api: Arc<HttpExtractApi>,
    config: &ClientConfig,
    model: &CriteriaModel,
    slice: &DataSlice,
    out: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let clauses = model.normalized_clauses();
    if clauses.is_empty() {
        bail!("No complete clauses, refusing to extract everything");
    }

    info!(
        clauses = clauses.len(),
        columns = slice.columns().count(),
        "Starting extract"
    );
    let mut jobs = ExtractJobClient::new(api.clone(), config.poll.clone());
    let progress = tokio::spawn(report_progress(jobs.subscribe()));

    let result = jobs.run(&clauses, slice).await;
    progress.abort();
    let job = result.context("Extract did not complete")?;

    let Some(id) = job.id.as_ref() else {
        bail!("Extract finished without an id");
    };
    info!(extract_id = %id, polls = job.polls, "Extract finished");

    if open {
        let url = api.download_url(id);
        eprintln!("Opening {}", url.as_str().bright_blue());
        open::that(&url).with_context(|| format!("Failed to open {url}"))?;
        return Ok(());
    }

    let artifact = jobs
        .request_download()
        .await
        .context("Download failed")?
        .context("Extract is not ready for download")?;

    match out {
        Some(path) => {
            std::fs::write(&path, &artifact)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} bytes to {}",
                "✓".bright_green(),
                artifact.len(),
                path.display()
            );
        }
        None => std::io::stdout().write_all(&artifact)?,
    }
    Ok(())
}

async fn report_progress(mut rx: tokio::sync::watch::Receiver<ExtractJob>) {
    let mut last = JobPhase::Idle;
    loop {
        let job = rx.borrow_and_update().clone();
        if job.phase != last {
            last = job.phase;
            eprintln!("{}", describe_phase(&job));
        }
        if job.phase.is_terminal() || rx.changed().await.is_err() {
            return;
        }
    }
}

fn describe_phase(job: &ExtractJob) -> ColoredString {
    match job.phase {
        JobPhase::Idle => "Idle".dimmed(),
        JobPhase::Submitting => "Submitting extract...".bright_yellow(),
        JobPhase::WaitingForId => "Waiting for the server to assign an id...".bright_yellow(),
        JobPhase::Polling => {
            let id = job.id.as_ref().map(|id| id.as_str()).unwrap_or_default();
            format!("Extract {id} running...").as_str().bright_yellow()
        }
        JobPhase::Succeeded => "Extract ready".bright_green(),
        JobPhase::Failed => {
            let reason = job.error.as_deref().unwrap_or("unknown error");
            format!("Extract failed: {reason}").as_str().bright_red()
        }
    }
}

fn load_criteria(args: &CriteriaArgs) -> Result<CriteriaModel> {
    let schema = match &args.schema {
        Some(path) => read_json::<MemorySchema>(path)?,
        None => MemorySchema::new(),
    };
    let clauses = read_json::<Vec<Clause>>(&args.criteria)?;

    let mut model = CriteriaModel::new(Arc::new(schema), CombinePolicy::from(args.policy.as_str()));
    model.replace_clauses(clauses);
    Ok(model)
}

fn print_criteria(model: &CriteriaModel) {
    let joiner = match model.policy() {
        CombinePolicy::All => "and",
        CombinePolicy::Any => "or",
    };
    for (i, clause) in model.normalized_clauses().iter().enumerate() {
        let column = clause.column.as_deref().unwrap_or_default();
        let field = clause.field.as_deref().unwrap_or_default();
        let operator = readable_query_type(clause.query_type.as_deref().unwrap_or_default());
        let operand = clause
            .query
            .as_ref()
            .map(|q| match q.as_str() {
                Some(s) => s.to_string(),
                None => q.to_string(),
            })
            .unwrap_or_default();

        let mut tags = Vec::new();
        if model.is_date_type(column, field) {
            tags.push("date");
        }
        if model.is_select(column, field) || model.is_select_many(column, field) {
            tags.push("choice");
        }

        let prefix = if i == 0 { "where" } else { joiner };
        eprintln!(
            "  {} {} {} {} {}{}",
            prefix.dimmed(),
            column.bright_cyan(),
            field.bright_cyan(),
            operator,
            operand.as_str().bold(),
            if tags.is_empty() {
                String::new()
            } else {
                format!(" ({})", tags.join(", ")).as_str().dimmed().to_string()
            },
        );
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}
