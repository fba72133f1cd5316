//! Line-oriented interactive session over a single open store.

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::application::LedgerStore;

use super::{execute, Commands, Style};

const PROMPT: &str = "fintrack> ";

#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

/// Read commands from stdin until EOF, `quit` or `exit`.
/// Command errors are printed and the session continues.
pub async fn run(store: &LedgerStore, style: Style) -> Result<()> {
    println!("Type a command (add, delete, list, summary, chart, export, categories), `help`, or `quit`.");

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        let args = match split_args(line) {
            Ok(args) => args,
            Err(e) => {
                eprintln!("Error: {}", e);
                continue;
            }
        };

        let parsed = match ShellLine::try_parse_from(&args) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Covers `help` too, which clap reports as an "error" to print.
                let _ = e.print();
                continue;
            }
        };

        debug!(line, "shell command");
        if let Err(e) = execute(store, parsed.command, style).await {
            eprintln!("Error: {:#}", e);
        }
    }

    Ok(())
}

/// Split a command line on whitespace, keeping single- or double-quoted runs together.
fn split_args(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {} quote", q));
    }
    if in_token {
        args.push(current);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_words() {
        assert_eq!(
            split_args("add 50 -c Food").unwrap(),
            vec!["add", "50", "-c", "Food"]
        );
    }

    #[test]
    fn test_split_quoted_description() {
        assert_eq!(
            split_args(r#"add 12.5 -d "lunch with  team" -c 'Eating out'"#).unwrap(),
            vec!["add", "12.5", "-d", "lunch with  team", "-c", "Eating out"]
        );
    }

    #[test]
    fn test_split_empty_quotes_is_argument() {
        assert_eq!(split_args(r#"add 5 -d """#).unwrap(), vec!["add", "5", "-d", ""]);
    }

    #[test]
    fn test_split_unterminated_quote() {
        assert!(split_args(r#"add 5 -d "oops"#).is_err());
    }

    #[test]
    fn test_shell_line_parses_subcommand() {
        let parsed = ShellLine::try_parse_from(["delete", "42"]).unwrap();
        assert!(matches!(parsed.command, Commands::Delete { id: 42 }));
    }
}
