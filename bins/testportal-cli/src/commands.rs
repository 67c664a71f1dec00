// One-shot commands: run a single submission, list languages
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use testportal_common::config::ClientConfig;
use testportal_common::languages::LanguageRegistry;
use testportal_common::types::TestCase;
use testportal_session::{
    HttpExecutionClient, SessionDocument, SessionStore, SubmissionOrchestrator,
};
use tracing::info;

use crate::render;

pub struct RunInput {
    pub language: Option<String>,
    pub code_file: Option<PathBuf>,
    pub code: Option<String>,
    /// Flattened INPUT EXPECTED pairs
    pub tests: Vec<String>,
    pub tests_file: Option<PathBuf>,
}

pub fn load_registry(config: &ClientConfig) -> Result<LanguageRegistry> {
    LanguageRegistry::load_or_builtin(&config.languages_path)
}

pub fn orchestrator(config: &ClientConfig) -> SubmissionOrchestrator {
    SubmissionOrchestrator::new(Arc::new(HttpExecutionClient::from_config(config)))
}

/// Submit once and print the result panel
pub async fn run_once(config: &ClientConfig, input: RunInput) -> Result<()> {
    let registry = load_registry(config)?;
    let document = build_document(&registry, input)?;

    info!(
        url = %config.base_url,
        language = %document.language,
        test_cases = document.test_cases.len(),
        "Running submission"
    );

    let mut store = SessionStore::with_document(registry, document);
    let ticket = store.begin_submission();
    let outcome = orchestrator(config).submit(&ticket.snapshot).await;
    store.settle_submission(ticket.id, outcome);

    println!("{}", render::result_panel(store.submission()));
    Ok(())
}

fn build_document(registry: &LanguageRegistry, input: RunInput) -> Result<SessionDocument> {
    let language = match &input.language {
        Some(name) => registry.resolve(name).with_context(|| {
            format!("Unknown language '{}'. Available: {}", name, option_names(registry))
        })?,
        None => registry.default_language(),
    };

    let code = match (input.code, input.code_file) {
        (Some(code), _) => unescape(&code),
        (None, Some(path)) => read_code(&path)?,
        (None, None) => bail!("Provide source code with --code or --code-file"),
    };

    let mut test_cases = pair_tests(&input.tests)?;
    if let Some(path) = &input.tests_file {
        test_cases.extend(load_tests_file(path)?);
    }
    if test_cases.is_empty() {
        bail!("At least one test case is required (--test INPUT EXPECTED or --tests-file)");
    }

    Ok(SessionDocument {
        code,
        language,
        test_cases,
    })
}

pub fn read_code(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .context("Failed to read code from stdin")?;
        return Ok(code);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn pair_tests(flat: &[String]) -> Result<Vec<TestCase>> {
    if flat.len() % 2 != 0 {
        bail!("Each --test needs both INPUT and EXPECTED");
    }
    Ok(flat
        .chunks(2)
        .map(|pair| TestCase::new(unescape(&pair[0]), unescape(&pair[1])))
        .collect())
}

fn load_tests_file(path: &Path) -> Result<Vec<TestCase>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Expand `\n`, `\t` and `\\`; any other backslash sequence is kept as typed
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn option_names(registry: &LanguageRegistry) -> String {
    registry
        .options()
        .iter()
        .map(|o| o.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// List all configured languages
pub fn list_languages(config: &ClientConfig) -> Result<()> {
    let registry = load_registry(config)?;
    let default = registry.default_language();

    for option in registry.options() {
        let marker = if option.name == default.as_str() { " (default)" } else { "" };
        println!("{:<10} {}{}", option.name, option.label, marker);
    }
    Ok(())
}
