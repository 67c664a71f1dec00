mod commands;
mod render;
mod repl;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use testportal_common::config::ClientConfig;

#[derive(Parser)]
#[command(name = "testportal")]
#[command(about = "TestPortal - Write code, define test cases, run them on the execution service", long_about = None)]
struct Cli {
    /// Execution service base URL (overrides TESTPORTAL_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Request timeout in seconds, 0 for none (overrides TESTPORTAL_TIMEOUT_SECONDS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Path to languages.json (overrides TESTPORTAL_LANGUAGES)
    #[arg(long, global = true)]
    languages: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit code and test cases once and print the result
    Run {
        /// Language name (e.g., python, java, cpp)
        #[arg(short, long)]
        language: Option<String>,

        /// Read source code from a file ("-" for stdin)
        #[arg(short = 'f', long, conflicts_with = "code")]
        code_file: Option<PathBuf>,

        /// Source code given inline
        #[arg(short, long)]
        code: Option<String>,

        /// Test case as INPUT EXPECTED (repeatable, supports \n escapes)
        #[arg(short, long = "test", num_args = 2, value_names = ["INPUT", "EXPECTED"])]
        tests: Vec<String>,

        /// JSON file with [{"input": ..., "expected_output": ...}, ...]
        #[arg(long)]
        tests_file: Option<PathBuf>,
    },

    /// Interactive session
    Repl,

    /// List the configured languages
    Languages,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(seconds) = self.timeout {
            config.timeout_seconds = (seconds > 0).then_some(seconds);
        }
        if let Some(path) = &self.languages {
            config.languages_path = path.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the result panel
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.client_config()?;

    match cli.command {
        Commands::Run {
            language,
            code_file,
            code,
            tests,
            tests_file,
        } => {
            let input = commands::RunInput {
                language,
                code_file,
                code,
                tests,
                tests_file,
            };
            commands::run_once(&config, input).await?;
        }
        Commands::Repl => {
            repl::run(&config).await?;
        }
        Commands::Languages => {
            commands::list_languages(&config)?;
        }
    }

    Ok(())
}
