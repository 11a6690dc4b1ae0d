use clap::{Parser, Subcommand, ValueEnum};
use form_rules::{
    AnswerMap, FormSpec, ValidationResult, answers_schema, build_render_payload, check_form,
    record_fields, render_json_ui, render_text, resolve_visibility, validate_submission,
};
use form_service::{
    FormService, MemoryRecordWriter, MemoryStore, ServiceConfig, StoredResponse,
    WebhookNotification, json::parse_answers,
};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const CONFIG_ENV: &str = "TABLEFORM_CONFIG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Conditional form rules CLI",
    long_about = "Checks form definitions, previews conditional visibility, validates submissions and applies upstream webhook payloads"
)]
struct Cli {
    /// Service config JSON (defaults to TABLEFORM_CONFIG, then built-in defaults).
    #[arg(long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,
    /// Log rule evaluation to stderr.
    #[arg(long, global = true, alias = "debug")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Check a form definition the way form creation does.
    Check {
        /// Path to the form JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
    },
    /// Show which questions are visible for a set of answers.
    Preview {
        /// Path to the form JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Optional answers JSON; omitted means nothing answered yet.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Validate a submission and print the record fields it would write.
    Validate {
        /// Path to the form JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Path to the answers JSON.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print the JSON schema of form definitions.
    Schema,
    /// Print the JSON schema answers must satisfy under the current visibility.
    AnswersSchema {
        /// Path to the form JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Optional answers JSON used to resolve visibility.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
    },
    /// Apply a webhook notification to a file of stored responses.
    Sync {
        /// Path to the form JSON the responses belong to.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Path to the stored responses JSON array.
        #[arg(long, value_name = "RESPONSES")]
        responses: PathBuf,
        /// Path to the webhook notification JSON.
        #[arg(long, value_name = "WEBHOOK")]
        webhook: PathBuf,
        /// Where to write the updated responses (defaults to RESPONSES).
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config)?;

    match cli.command {
        Command::Check { form } => run_check(&form),
        Command::Preview {
            form,
            answers,
            format,
        } => run_preview(&form, answers.as_deref(), format),
        Command::Validate { form, answers } => run_validate(&form, &answers, &config),
        Command::Schema => run_schema(),
        Command::AnswersSchema { form, answers } => run_answers_schema(&form, answers.as_deref()),
        Command::Sync {
            form,
            responses,
            webhook,
            out,
        } => run_sync(&form, &responses, &webhook, out, config),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load_config(path: Option<PathBuf>) -> CliResult<ServiceConfig> {
    let path = path.or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            Ok(ServiceConfig::from_json(&fs::read_to_string(path)?)?)
        }
        None => Ok(ServiceConfig::default()),
    }
}

fn load_form(path: &Path) -> CliResult<FormSpec> {
    let form_json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&form_json)?)
}

fn load_answers(path: Option<&Path>) -> CliResult<AnswerMap> {
    match path {
        Some(path) => Ok(parse_answers(&fs::read_to_string(path)?)?),
        None => Ok(AnswerMap::new()),
    }
}

fn print_json(value: &Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_check(form_path: &Path) -> CliResult<()> {
    let form = load_form(form_path)?;
    check_form(&form).map_err(|err| err.to_string())?;
    let conditional = form
        .questions
        .iter()
        .filter(|question| question.conditional_rules.is_some())
        .count();
    println!(
        "Form OK: {} questions, {} conditional",
        form.questions.len(),
        conditional
    );
    Ok(())
}

fn run_preview(form_path: &Path, answers_path: Option<&Path>, format: RenderMode) -> CliResult<()> {
    let form = load_form(form_path)?;
    let answers = load_answers(answers_path)?;
    let payload = build_render_payload(&form, &answers);
    match format {
        RenderMode::Text => println!("{}", render_text(&payload)),
        RenderMode::Json => print_json(&render_json_ui(&payload))?,
    }
    Ok(())
}

fn run_validate(form_path: &Path, answers_path: &Path, config: &ServiceConfig) -> CliResult<()> {
    let form = load_form(form_path)?;
    let answers = load_answers(Some(answers_path))?;

    let result = validate_submission(&form, &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if !result.valid {
        return Err(result
            .first_message()
            .unwrap_or("validation failed")
            .into());
    }

    let visibility = resolve_visibility(&form, &answers);
    let fields = record_fields(&form, &answers, &visibility, config.write_attachments);
    print_json(&Value::Object(fields))
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {}", error.question_key, error.message);
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required answers: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(FormSpec);
    print_json(&serde_json::to_value(&schema)?)
}

fn run_answers_schema(form_path: &Path, answers_path: Option<&Path>) -> CliResult<()> {
    let form = load_form(form_path)?;
    let answers = load_answers(answers_path)?;
    let visibility = resolve_visibility(&form, &answers);
    print_json(&answers_schema(&form, &visibility))
}

fn run_sync(
    form_path: &Path,
    responses_path: &Path,
    webhook_path: &Path,
    out: Option<PathBuf>,
    config: ServiceConfig,
) -> CliResult<()> {
    let form = load_form(form_path)?;
    let responses: Vec<StoredResponse> =
        serde_json::from_str(&fs::read_to_string(responses_path)?)?;
    let notification: WebhookNotification =
        serde_json::from_str(&fs::read_to_string(webhook_path)?)?;

    let writer = MemoryRecordWriter::new(config.record_id_prefix.clone());
    let service = FormService::new(MemoryStore::from_parts(vec![form], responses), writer, config);
    let report = service.apply_webhook(&notification)?;

    let out = out.unwrap_or_else(|| responses_path.to_path_buf());
    let updated = service.store().responses()?;
    fs::write(&out, serde_json::to_string_pretty(&updated)?)?;
    debug!(path = %out.display(), "wrote responses");

    print_json(&serde_json::to_value(report)?)
}
