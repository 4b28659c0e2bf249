mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use form_spec::{
    AnswerMap, ConditionalForm, FieldKind, FieldValue, FormError, FormResponse, FormSession,
    FormSpec, FormState, RenderField, RenderPayload, ValidationResult, build_render_payload,
    descriptor_schema, lint, render_card, render_json_ui, render_text, validate,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wizard::{AnswerParseError, PromptContext, Verbosity, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "CONDFORM_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Conditional form CLI",
    long_about = "Fill, lint, validate and render conditional form descriptors"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Card,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Fill a form interactively in a text shell.
    Fill {
        /// Path to the form descriptor JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Optional JSON file with answers to prefill.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Show verbose output (status, rendered fields, parse expectations).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also print the response envelope as JSON.
        #[arg(long)]
        answers_json: bool,
        /// Render output mode printed before each prompt.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
        /// Treat unknown field references in conditions as no-ops.
        #[arg(long)]
        lenient: bool,
    },
    /// Report problems in a form descriptor.
    Lint {
        /// Path to the form descriptor JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Treat unknown field references in conditions as warnings.
        #[arg(long)]
        lenient: bool,
    },
    /// Replay answers through a form and check they could be submitted.
    Validate {
        /// Path to the form descriptor JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Treat unknown field references in conditions as no-ops.
        #[arg(long)]
        lenient: bool,
    },
    /// Render a form, optionally after replaying answers.
    Render {
        /// Path to the form descriptor JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Optional JSON file with answers to replay first.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
        /// Treat unknown field references in conditions as no-ops.
        #[arg(long)]
        lenient: bool,
    },
    /// Print the JSON schema of the form descriptor format.
    Schema,
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Fill {
            spec,
            answers,
            verbose,
            answers_json,
            format,
            lenient,
        } => run_fill(spec, answers, verbose, answers_json, format, lenient),
        Command::Lint { spec, lenient } => run_lint(spec, lenient),
        Command::Validate {
            spec,
            answers,
            lenient,
        } => run_validate(spec, answers, lenient),
        Command::Render {
            spec,
            answers,
            format,
            lenient,
        } => run_render(spec, answers, format, lenient),
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&descriptor_schema())?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_spec(path: &Path) -> CliResult<FormSpec> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn load_form(path: &Path, lenient: bool) -> CliResult<ConditionalForm> {
    let spec = read_spec(path)?;
    let mut policy = spec.policy.unwrap_or_default();
    if lenient {
        policy.strict_references = false;
    }
    let form = ConditionalForm::with_policy(spec, policy)?;
    debug!(
        path = %path.display(),
        fields = form.fields().len(),
        conditions = form.conditions().len(),
        "loaded form descriptor"
    );
    Ok(form)
}

fn load_answers(path: &Path) -> CliResult<AnswerMap> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn load_state(form: &ConditionalForm, answers: Option<&Path>) -> CliResult<FormState> {
    match answers {
        Some(path) => Ok(form.start_with(&load_answers(path)?)?),
        None => Ok(form.start()),
    }
}

fn run_lint(spec_path: PathBuf, lenient: bool) -> CliResult<()> {
    let spec = read_spec(&spec_path)?;
    let issues = lint(&spec);
    if issues.is_empty() {
        println!("No issues found.");
    } else {
        println!("Issues:");
        for issue in &issues {
            println!("  [{}] {}", issue.code(), issue);
        }
    }

    load_form(&spec_path, lenient)?;
    println!("Descriptor is valid.");
    Ok(())
}

fn run_validate(spec_path: PathBuf, answers_path: PathBuf, lenient: bool) -> CliResult<()> {
    let form = load_form(&spec_path, lenient)?;
    let state = form.start_with(&load_answers(&answers_path)?)?;

    let reached = form.reached_fields(&state);
    let gate_open = form.can_submit(&state);
    println!(
        "Step {}: {}/{} visible fields reached",
        state.step(),
        reached.len(),
        state.visible().len()
    );
    if !gate_open {
        let pending = state
            .visible()
            .iter()
            .filter(|name| !reached.contains(*name))
            .cloned()
            .collect::<Vec<_>>();
        println!("Fields not reached yet: {}", pending.join(", "));
    }

    let result = validate(&form, &state);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid && gate_open {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!(
                "  {} - {}",
                error.path.as_deref().unwrap_or("<unknown>"),
                error.message
            );
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

fn run_render(
    spec_path: PathBuf,
    answers_path: Option<PathBuf>,
    format: RenderMode,
    lenient: bool,
) -> CliResult<()> {
    let form = load_form(&spec_path, lenient)?;
    let state = load_state(&form, answers_path.as_deref())?;
    let payload = build_render_payload(&form, &state);
    print_render_output(format, &payload)
}

fn print_render_output(format: RenderMode, payload: &RenderPayload) -> CliResult<()> {
    match format {
        RenderMode::Text => println!("{}", render_text(payload)),
        RenderMode::Json => println!("{}", serde_json::to_string_pretty(&render_json_ui(payload))?),
        RenderMode::Card => println!("{}", serde_json::to_string_pretty(&render_card(payload))?),
    }
    Ok(())
}

fn run_fill(
    spec_path: PathBuf,
    answers_path: Option<PathBuf>,
    verbose: bool,
    answers_json: bool,
    format: RenderMode,
    lenient: bool,
) -> CliResult<()> {
    let form = load_form(&spec_path, lenient)?;
    let prefill = match &answers_path {
        Some(path) => load_answers(path)?,
        None => AnswerMap::new(),
    };
    let state = form.start_with(&prefill)?;

    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);
    // Fields already answered (or deliberately skipped), in answer order.
    let mut answered: Vec<String> = form
        .fields()
        .iter()
        .filter(|field| prefill.contains_key(&field.name))
        .map(|field| field.name.clone())
        .collect();

    let mut response: Option<FormResponse> = None;
    {
        let mut session = FormSession::with_state(&form, state, |submitted: &FormResponse| {
            response = Some(submitted.clone());
        });

        while !session.state().is_submitted() {
            let payload = build_render_payload(&form, session.state());
            presenter.show_header(&payload);
            presenter.show_status(&payload);

            let rendered = payload.rendered().collect::<Vec<_>>();
            let next = rendered
                .iter()
                .find(|field| !answered.contains(&field.name))
                .copied();

            let Some(field) = next else {
                if !payload.can_submit {
                    return Err(
                        "some visible fields can never be reached; check the step hints".into(),
                    );
                }
                match session.submit() {
                    Ok(()) => continue,
                    Err(FormError::Rejected(result)) => {
                        presenter.show_validation(&result);
                        let failing = result
                            .errors
                            .iter()
                            .filter_map(|error| error.field.clone())
                            .chain(result.missing_required.iter().cloned())
                            .collect::<Vec<_>>();
                        answered.retain(|name| !failing.contains(name));
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                }
            };

            if !matches!(format, RenderMode::Text) {
                print_render_output(format, &payload)?;
            }

            let index = answered
                .iter()
                .filter(|name| rendered.iter().any(|field| &field.name == *name))
                .count()
                + 1;
            let prompt = PromptContext::new(field, index, rendered.len());
            match prompt_field(&prompt, field, &presenter)? {
                WizardInput::Back => {
                    session.back()?;
                    answered.pop();
                    let still_rendered = form
                        .rendered_fields(session.state())
                        .iter()
                        .map(|field| field.name.clone())
                        .collect::<Vec<_>>();
                    answered.retain(|name| still_rendered.contains(name));
                }
                WizardInput::Keep => answered.push(field.name.clone()),
                WizardInput::Value(value) => {
                    session.change(&field.name, value)?;
                    answered.push(field.name.clone());
                }
            }
        }
    }

    let response = response.ok_or("form finished without a submission")?;
    presenter.show_completion(&response);
    Ok(())
}

/// What the user typed at a field prompt.
enum WizardInput {
    Back,
    Keep,
    Value(FieldValue),
}

fn prompt_field(
    prompt: &PromptContext,
    field: &RenderField,
    presenter: &WizardPresenter,
) -> CliResult<WizardInput> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("input closed before the form was submitted".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("wizard aborted by user".into());
        }
        if trimmed.eq_ignore_ascii_case("back") {
            return Ok(WizardInput::Back);
        }
        if trimmed.is_empty() {
            if field.required && field.value.is_empty() {
                presenter.show_parse_error(&AnswerParseError::new(
                    "This field requires an answer.",
                    None,
                ));
                continue;
            }
            return Ok(WizardInput::Keep);
        }

        match parse_answer(&field.kind, trimmed) {
            Ok(value) => return Ok(WizardInput::Value(value)),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

fn parse_answer(kind: &FieldKind, raw: &str) -> Result<FieldValue, AnswerParseError> {
    match kind {
        FieldKind::Checkbox => parse_checkbox(raw),
        FieldKind::Select { .. } => parse_select(kind, raw),
        FieldKind::Textarea => Ok(FieldValue::Text(raw.replace("\\n", "\n"))),
        FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
    }
}

fn parse_checkbox(raw: &str) -> Result<FieldValue, AnswerParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "x" => Ok(FieldValue::Bool(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(FieldValue::Bool(false)),
        _ => Err(AnswerParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

/// Accepts an option value, its label, or its 1-based position.
fn parse_select(kind: &FieldKind, raw: &str) -> Result<FieldValue, AnswerParseError> {
    let options = kind.options();
    if let Ok(position) = raw.parse::<usize>()
        && let Some(option) = position.checked_sub(1).and_then(|index| options.get(index))
    {
        return Ok(FieldValue::Text(option.value.clone()));
    }

    options
        .iter()
        .find(|option| {
            option.value.eq_ignore_ascii_case(raw) || option.label.eq_ignore_ascii_case(raw)
        })
        .map(|option| FieldValue::Text(option.value.clone()))
        .ok_or_else(|| {
            let allowed = options
                .iter()
                .map(|option| option.value.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            AnswerParseError::new(
                format!("Choose one of: {}.", allowed),
                Some(format!("allowed values: {}", allowed)),
            )
        })
}
