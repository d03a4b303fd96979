use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use playground_backend::{
    BackendConfig, MockBackend, ProfileSource, RemoteFetchPolicySource, ReqwestBackend,
    UpliftOutputFormat, UpliftResult, find_output_format, output_formats,
};
use playground_uplift::{
    InputSource, Pipeline, PipelineRunResult, PipelineStatus, Step, StepOutput, StepServices,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_ROUTE: &str = "/";

#[derive(Parser, Debug)]
#[command(name = "playground-cli")]
#[command(about = "In-process CLI host for the JSON uplift playground")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run(RunArgs),
    Share(ShareArgs),
    Inspect(InspectArgs),
    Profiles(ProfilesArgs),
    RemoteFetch(RemoteFetchArgs),
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    #[arg(long)]
    input_file: Option<PathBuf>,
    #[arg(long)]
    input_url: Option<String>,
    #[arg(long)]
    context_file: Option<PathBuf>,
    #[arg(long)]
    context_url: Option<String>,
}

#[derive(clap::Args, Debug)]
struct BackendArgs {
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long, value_enum, default_value_t = BackendMode::Http)]
    backend: BackendMode,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    sources: SourceArgs,
    /// Run a pipeline from a share fragment instead of input/context sources.
    #[arg(
        long,
        conflicts_with_all = ["input_file", "input_url", "context_file", "context_url"]
    )]
    fragment: Option<String>,
    #[command(flatten)]
    backend: BackendArgs,
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct ShareArgs {
    #[command(flatten)]
    sources: SourceArgs,
    #[arg(long, default_value = DEFAULT_ROUTE)]
    route: String,
}

#[derive(clap::Args, Debug)]
struct InspectArgs {
    #[arg(long)]
    fragment: String,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct ProfilesArgs {
    #[command(flatten)]
    backend: BackendArgs,
}

#[derive(clap::Args, Debug)]
struct RemoteFetchArgs {
    #[command(flatten)]
    backend: BackendArgs,
    /// Report whether the backend would fetch this URL instead of printing the policy.
    #[arg(long)]
    check_url: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Ttl,
    Json,
}

impl FormatArg {
    fn output_format(self) -> Option<&'static UpliftOutputFormat> {
        match self {
            Self::Ttl => find_output_format("ttl"),
            Self::Json => find_output_format("json"),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendMode {
    Http,
    /// In-memory backend that echoes the document and context back.
    Mock,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run_command(args).await,
        Commands::Share(args) => share_command(args),
        Commands::Inspect(args) => inspect_command(args),
        Commands::Profiles(args) => profiles_command(args).await,
        Commands::RemoteFetch(args) => remote_fetch_command(args).await,
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    let _ = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init();
}

async fn run_command(args: RunArgs) -> Result<ExitCode, String> {
    let selected = match args.format {
        Some(format) => Some(
            format
                .output_format()
                .ok_or_else(|| format!("output format {format:?} is not available"))?,
        ),
        None => None,
    };

    let mut pipeline = match args.fragment.as_deref() {
        Some(fragment) => Pipeline::from_fragment(fragment).map_err(|error| error.to_string())?,
        None => build_pipeline(&args.sources)?,
    };
    let services = build_services(&args.backend)?;

    let result = pipeline.run(&services, false).await;
    if !result.is_success() {
        print_failure(&pipeline, &result);
        return Ok(exit_code_for_status(result.status));
    }

    match pipeline.output() {
        Some(StepOutput::Formats(formats)) => print_formats(&formats, selected, args.json)?,
        Some(StepOutput::Document(document)) => println!("{}", document.json),
        None => return Err("pipeline produced no output".to_string()),
    }
    Ok(ExitCode::SUCCESS)
}

fn share_command(args: ShareArgs) -> Result<ExitCode, String> {
    let pipeline = build_pipeline(&args.sources)?;
    let fragment = pipeline
        .share_fragment(&args.route)
        .map_err(|error| error.to_string())?;
    println!("{fragment}");
    Ok(ExitCode::SUCCESS)
}

fn inspect_command(args: InspectArgs) -> Result<ExitCode, String> {
    let pipeline = Pipeline::from_fragment(&args.fragment).map_err(|error| error.to_string())?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&pipeline.to_records()).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("steps: {}", pipeline.len());
    for (index, step) in pipeline.steps().iter().enumerate() {
        println!("[{index}] {} \"{}\"", step.step_type(), step.title());
        if let Some(mode) = step.mode() {
            println!("    mode: {mode}");
        }
        match step.input_source() {
            Some(InputSource::Url) => {
                println!("    url: {}", step.url().unwrap_or("<none>"));
            }
            Some(InputSource::Contents) => {
                println!("    contents: {} byte(s)", step.contents().len());
            }
            None => {}
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn profiles_command(args: ProfilesArgs) -> Result<ExitCode, String> {
    let profiles = match args.backend.backend {
        BackendMode::Http => {
            let backend = ReqwestBackend::new(backend_config(&args.backend))
                .map_err(|error| error.to_string())?;
            backend.profiles().await
        }
        BackendMode::Mock => MockBackend::new().profiles().await,
    }
    .map_err(|error| error.to_string())?;

    let json = serde_json::to_string_pretty(&profiles).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

async fn remote_fetch_command(args: RemoteFetchArgs) -> Result<ExitCode, String> {
    let policy = match args.backend.backend {
        BackendMode::Http => {
            let backend = ReqwestBackend::new(backend_config(&args.backend))
                .map_err(|error| error.to_string())?;
            backend.remote_fetch_policy().await
        }
        BackendMode::Mock => MockBackend::new().remote_fetch_policy().await,
    }
    .map_err(|error| error.to_string())?;

    match args.check_url.as_deref() {
        Some(url) => {
            let allowed = policy.allows_url(url).map_err(|error| error.to_string())?;
            println!("allowed: {allowed}");
        }
        None => {
            let json = serde_json::to_string_pretty(&policy).map_err(|e| e.to_string())?;
            println!("{json}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn build_pipeline(sources: &SourceArgs) -> Result<Pipeline, String> {
    let mut pipeline = Pipeline::playground();
    if let Some(step) = pipeline.step_mut(0) {
        configure_source(
            step,
            "input",
            sources.input_file.as_deref(),
            sources.input_url.as_deref(),
        )?;
    }
    if let Some(step) = pipeline.step_mut(1) {
        configure_source(
            step,
            "context",
            sources.context_file.as_deref(),
            sources.context_url.as_deref(),
        )?;
    }
    Ok(pipeline)
}

fn configure_source(
    step: &mut Step,
    label: &str,
    file: Option<&Path>,
    url: Option<&str>,
) -> Result<(), String> {
    match (file, url) {
        (Some(_), Some(_)) => Err(format!(
            "provide only one of --{label}-file or --{label}-url"
        )),
        (None, None) => Err(format!("one of --{label}-file or --{label}-url is required")),
        (Some(path), None) => {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| format!("failed reading {label} file '{}': {e}", path.display()))?;
            step.set_contents(contents);
            Ok(())
        }
        (None, Some(url)) => {
            step.set_input_source(InputSource::Url)
                .map_err(|error| error.to_string())?;
            step.set_url(Some(url.to_string()))
                .map_err(|error| error.to_string())
        }
    }
}

fn backend_config(args: &BackendArgs) -> BackendConfig {
    match args.backend_url.as_deref() {
        Some(url) => BackendConfig::new(url),
        None => BackendConfig::from_env(),
    }
}

fn build_services(args: &BackendArgs) -> Result<StepServices, String> {
    match args.backend {
        BackendMode::Http => {
            let config = backend_config(args);
            debug!(base_url = %config.base_url, "using http backend");
            let backend = ReqwestBackend::new(config).map_err(|error| error.to_string())?;
            Ok(StepServices::from_backend(Arc::new(backend)))
        }
        BackendMode::Mock => Ok(StepServices::from_backend(Arc::new(MockBackend::new()))),
    }
}

fn print_formats(
    formats: &UpliftResult,
    selected: Option<&UpliftOutputFormat>,
    json: bool,
) -> Result<(), String> {
    if let Some(format) = selected {
        let text = formats
            .get(format.value)
            .ok_or_else(|| format!("output format '{}' missing from the result", format.value))?;
        println!("{text}");
        return Ok(());
    }

    if json {
        let json = serde_json::to_string_pretty(formats).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    for format in output_formats() {
        if let Some(text) = formats.get(format.value) {
            println!("# {} ({})", format.title, format.value);
            println!("{text}");
        }
    }
    Ok(())
}

fn print_failure(pipeline: &Pipeline, result: &PipelineRunResult) {
    let title = result
        .failed_step
        .and_then(|index| pipeline.step(index))
        .map(Step::title)
        .unwrap_or("<unknown>");
    eprintln!("status: {}", result.status.as_str());
    eprintln!("failed_step: {title}");
    for error in &result.errors {
        eprintln!("error: {error}");
    }
}

fn exit_code_for_status(status: PipelineStatus) -> ExitCode {
    match status {
        PipelineStatus::Success => ExitCode::SUCCESS,
        PipelineStatus::Fail => ExitCode::from(1),
    }
}
