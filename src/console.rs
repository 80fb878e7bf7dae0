//! Interactive line-oriented front-end.
//!
//! One command per line; every outcome, success or failure, is reported as a
//! log line and the loop keeps going until `quit` or end of input.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::scenario::run_scripted_sequence;
use crate::services::{CsvBridge, ImportOutcome, RecordStore};

const DEFAULT_INSERT_NAME: &str = "GUI_User";
const DEFAULT_INSERT_VALUE: i64 = 42;

const HELP: &str = "\
commands:
  check                 probe the active backend
  toggle                switch between remote and local mode
  create | drop         create or drop the table
  insert [name value]   add a row (default GUI_User 42)
  show                  list every row
  export <path>         write the table to CSV
  import <path>         load rows from CSV
  test                  run the scripted sequence
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Check,
    Toggle,
    Create,
    Drop,
    Insert { name: String, value: i64 },
    Show,
    Export(PathBuf),
    Import(PathBuf),
    Test,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = parts.collect();

        let command = match (word.to_lowercase().as_str(), rest.as_slice()) {
            ("check", []) => Self::Check,
            ("toggle" | "mode", []) => Self::Toggle,
            ("create", []) => Self::Create,
            ("drop", []) => Self::Drop,
            ("insert", []) => Self::Insert {
                name: DEFAULT_INSERT_NAME.to_string(),
                value: DEFAULT_INSERT_VALUE,
            },
            ("insert", [name, value]) => Self::Insert {
                name: name.to_string(),
                value: value
                    .parse()
                    .map_err(|_| format!("'{}' is not an integer", value))?,
            },
            ("show", []) => Self::Show,
            ("export", [path]) => Self::Export(PathBuf::from(path)),
            ("import", [path]) => Self::Import(PathBuf::from(path)),
            ("test", []) => Self::Test,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            _ => return Err(format!("unrecognized command '{}', try 'help'", line.trim())),
        };
        Ok(Some(command))
    }
}

pub struct Console {
    store: RecordStore,
    bridge: CsvBridge,
    scenario_csv: PathBuf,
}

impl Console {
    pub fn new(store: RecordStore, bridge: CsvBridge, scenario_csv: PathBuf) -> Self {
        Self {
            store,
            bridge,
            scenario_csv,
        }
    }

    /// Read commands from stdin until `quit` or EOF.
    pub async fn run(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        self.print_mode().await;
        println!("{}", HELP);

        let mut line = String::new();
        loop {
            print!("> ");
            stdout.flush()?;

            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.dispatch(command).await,
                Err(message) => println!("{}", message),
            }
        }
        Ok(())
    }

    async fn print_mode(&self) {
        println!("Current mode: {}", self.store.manager().mode().await);
    }

    async fn dispatch(&self, command: Command) {
        let manager = self.store.manager();

        match command {
            Command::Check => {
                let probe = manager.probe().await;
                let status = if probe.ok { "ok" } else { "error" };
                println!("Connection: {} ({})", status, probe.detail);
            }
            Command::Toggle => {
                let mode = manager.switch_mode().await;
                println!("Switched to {} mode", mode);
            }
            Command::Create => match self.store.create_table().await {
                Ok(()) => println!("Table created."),
                Err(e) => println!("Error: {}", e),
            },
            Command::Drop => match self.store.drop_table().await {
                Ok(()) => println!("Table dropped."),
                Err(e) => println!("Error: {}", e),
            },
            Command::Insert { name, value } => match self.store.insert_row(&name, value).await {
                Ok(id) => println!("Added row {} ({}) with id {}.", name, value, id),
                Err(e) => println!("Error: {}", e),
            },
            Command::Show => match self.store.select_all(None).await {
                Ok(rows) if rows.is_empty() => println!("Table is empty."),
                Ok(rows) => {
                    println!("Table contents:");
                    for row in rows {
                        println!("  {}", row);
                    }
                }
                Err(e) => println!("Error: {}", e),
            },
            Command::Export(path) => match self.bridge.export(&path).await {
                Ok(n) => println!("Exported {} rows to {}", n, path.display()),
                Err(e) => println!("Error: {}", e),
            },
            Command::Import(path) => match self.bridge.import(&path).await {
                Ok(ImportOutcome::Imported(n)) => {
                    println!("Imported {} rows from {}", n, path.display())
                }
                Ok(ImportOutcome::NothingToImport) => {
                    println!("{} has no valid rows, nothing to import", path.display())
                }
                Err(e) => println!("Error: {}", e),
            },
            Command::Test => {
                match run_scripted_sequence(&self.store, &self.bridge, &self.scenario_csv).await {
                    Ok(report) => println!(
                        "Scripted run finished, {} rows in the table.",
                        report.final_rows.len()
                    ),
                    Err(e) => println!("Error: {}", e),
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
    }
}
