// Interactive session
// Edits stay live while a submission is in flight; results arrive over a channel

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use testportal_common::config::ClientConfig;
use testportal_session::{
    SessionStore, Settlement, SubmissionOrchestrator, TestCaseField,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::commands::{self, unescape};
use crate::render;

const HELP: &str = "\
Commands:
  lang <name>            select language
  code                   enter code, finish with a line containing only '.'
  load <file>            read code from a file
  add                    append a blank test case
  input <i> <text>       set input of test case i (\\n for newline)
  expected <i> <text>    set expected output of test case i
  show                   print the whole session
  languages              list available languages
  run                    submit to the execution service
  help                   this text
  quit                   leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Lang(String),
    Code,
    Load(PathBuf),
    Add,
    Input(usize, String),
    Expected(usize, String),
    Show,
    Languages,
    Run,
    Help,
    Quit,
}

/// `Ok(None)` for a blank line
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim_start();
    if line.trim().is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (line.trim_end(), ""),
    };

    let command = match word {
        "lang" => ReplCommand::Lang(required(rest, "lang <name>")?.trim().to_string()),
        "code" => ReplCommand::Code,
        "load" => ReplCommand::Load(PathBuf::from(required(rest, "load <file>")?.trim())),
        "add" => ReplCommand::Add,
        "input" => {
            let (index, text) = indexed(rest, "input <i> <text>")?;
            ReplCommand::Input(index, text)
        }
        "expected" => {
            let (index, text) = indexed(rest, "expected <i> <text>")?;
            ReplCommand::Expected(index, text)
        }
        "show" => ReplCommand::Show,
        "languages" => ReplCommand::Languages,
        "run" => ReplCommand::Run,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.trim().is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(rest)
    }
}

/// `<i> <text>`; text may be empty and keeps its inner spacing
fn indexed(rest: &str, usage: &str) -> Result<(usize, String), String> {
    let rest = rest.trim_start();
    let (index, text) = rest.split_once(' ').unwrap_or((rest, ""));
    let index = index
        .parse::<usize>()
        .map_err(|_| format!("usage: {}", usage))?;
    Ok((index, unescape(text)))
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Repl {
    store: SessionStore,
    orchestrator: SubmissionOrchestrator,
    settlements: mpsc::UnboundedSender<Settlement>,
    code_buffer: Option<Vec<String>>,
}

impl Repl {
    pub fn new(
        store: SessionStore,
        orchestrator: SubmissionOrchestrator,
    ) -> (Self, mpsc::UnboundedReceiver<Settlement>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let repl = Self {
            store,
            orchestrator,
            settlements: tx,
            code_buffer: None,
        };
        (repl, rx)
    }

    #[cfg(test)]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn in_code_mode(&self) -> bool {
        self.code_buffer.is_some()
    }

    pub fn settle(&mut self, settlement: Settlement) {
        self.store.settle_submission(settlement.id, settlement.outcome);
    }

    /// Wait for the pending submission, if any, to settle.
    /// Used when input ends so a scripted session still prints its result.
    pub async fn finish(&mut self, settlements: &mut mpsc::UnboundedReceiver<Settlement>) {
        while self.store.is_pending() {
            match settlements.recv().await {
                Some(settlement) => self.settle(settlement),
                None => break,
            }
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Flow {
        if let Some(buffer) = self.code_buffer.as_mut() {
            if line == "." {
                let code = buffer.join("\n");
                self.code_buffer = None;
                self.store.set_code(code);
            } else {
                buffer.push(line.to_string());
            }
            return Flow::Continue;
        }

        match parse_command(line) {
            Ok(Some(command)) => self.apply(command),
            Ok(None) => Flow::Continue,
            Err(message) => {
                println!("{}", message);
                Flow::Continue
            }
        }
    }

    fn apply(&mut self, command: ReplCommand) -> Flow {
        match command {
            ReplCommand::Lang(name) => {
                if let Err(e) = self.store.set_language(&name) {
                    println!("{}", e);
                }
            }
            ReplCommand::Code => {
                println!("enter code, end with '.'");
                self.code_buffer = Some(Vec::new());
            }
            ReplCommand::Load(path) => match commands::read_code(&path) {
                Ok(code) => self.store.set_code(code),
                Err(e) => println!("{:#}", e),
            },
            ReplCommand::Add => {
                self.store.add_test_case();
            }
            ReplCommand::Input(index, text) => self.set_field(index, TestCaseField::Input, text),
            ReplCommand::Expected(index, text) => {
                self.set_field(index, TestCaseField::ExpectedOutput, text)
            }
            ReplCommand::Show => println!("{}", render::session_view(&self.store)),
            ReplCommand::Languages => {
                for option in self.store.languages().options() {
                    println!("{:<10} {}", option.name, option.label);
                }
            }
            ReplCommand::Run => match self.store.try_begin_submission() {
                Some(ticket) => {
                    self.orchestrator.dispatch(ticket, self.settlements.clone());
                }
                None => println!("a submission is already running"),
            },
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn set_field(&mut self, index: usize, field: TestCaseField, text: String) {
        let count = self.store.document().test_cases.len();
        if index >= count {
            println!("no test case [{}] ({} defined)", index, count);
            return;
        }
        self.store.set_test_case_field(index, field, text);
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}

pub async fn run(config: &ClientConfig) -> Result<()> {
    let registry = commands::load_registry(config)?;
    let mut store = SessionStore::new(registry);
    render::attach_printer(&mut store);

    println!("{}", render::session_view(&store));
    println!("Type 'help' for commands. Service: {}", config.base_url);

    let (mut repl, mut settlements) = Repl::new(store, commands::orchestrator(config));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    loop {
        tokio::select! {
            Some(settlement) = settlements.recv() => {
                repl.settle(settlement);
                if !repl.in_code_mode() {
                    prompt()?;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    repl.finish(&mut settlements).await;
                    break;
                };
                if repl.handle_line(&line) == Flow::Quit {
                    break;
                }
                if !repl.in_code_mode() {
                    prompt()?;
                }
            }
        }
    }

    Ok(())
}
