use std::fmt::Write;

use form_spec::{FieldKind, FormResponse, RenderField, RenderPayload, ValidationResult};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts only.
    Clean,
    /// Verbose output: status, rendered fields, parse expectations, help text.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and summaries while the fill loop drives the form.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_response_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_response_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_response_json,
        }
    }

    pub fn show_header(&mut self, payload: &RenderPayload) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", payload.form_title);
        if self.verbosity.is_verbose()
            && let Some(help) = &payload.help
        {
            println!("Help: {}", help);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &RenderPayload) {
        if !self.verbosity.is_verbose() {
            return;
        }
        println!(
            "Status: {} (step {}, {}/{} reached)",
            payload.status.as_str(),
            payload.step,
            payload.progress.reached,
            payload.progress.visible
        );
        println!("Rendered fields:");
        for field in payload.rendered() {
            let mut entry = format!(" - {} ({})", field.name, field.label);
            if field.required {
                entry.push_str(" [required]");
            }
            if !field.value.is_empty() {
                entry.push_str(&format!(" = {}", field.value));
            }
            println!("{}", entry);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.label);
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(placeholder) = &prompt.placeholder {
            println!("e.g. {}", placeholder);
        }
        if self.verbosity.is_verbose()
            && let Some(current) = &prompt.current
        {
            println!("Current value: {}", current);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_validation(&self, result: &ValidationResult) {
        eprintln!("Submission rejected:");
        for error in &result.errors {
            eprintln!(
                "  {} - {}",
                error.field.as_deref().unwrap_or("<form>"),
                error.message
            );
        }
        if !result.missing_required.is_empty() {
            eprintln!(
                "  Missing required answers: {}",
                result.missing_required.join(", ")
            );
        }
    }

    pub fn show_completion(&self, response: &FormResponse) {
        println!("Done ✅");
        match response.to_cbor() {
            Ok(bytes) => {
                println!("Response (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize response to CBOR: {}", err);
            }
        }
        if self.show_response_json {
            match response.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize response to JSON: {}", err);
                }
            }
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub required: bool,
    pub hint: Option<String>,
    pub placeholder: Option<String>,
    pub current: Option<String>,
}

impl PromptContext {
    pub fn new(field: &RenderField, index: usize, total: usize) -> Self {
        let current = if field.value.is_empty() {
            None
        } else {
            Some(field.value.to_string())
        };
        Self {
            index: index.max(1),
            total,
            label: field.label.clone(),
            required: field.required,
            hint: hint(&field.kind),
            placeholder: field.placeholder.clone(),
            current,
        }
    }
}

fn hint(kind: &FieldKind) -> Option<String> {
    match kind {
        FieldKind::Checkbox => Some("(yes/no)".to_string()),
        FieldKind::Select { options } if !options.is_empty() => Some(format!(
            "({})",
            options
                .iter()
                .map(|option| option.value.as_str())
                .collect::<Vec<_>>()
                .join("/")
        )),
        FieldKind::Textarea => Some("(single line, \\n for breaks)".to_string()),
        _ => None,
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}
