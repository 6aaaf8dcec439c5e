//! pyfront - educational front-end compiler for a Python-like language.
//!
//! Command-line interface over the library: loads a source file and
//! prints tokens, symbol tables, diagnostics and the parse tree.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pyfront::Session;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pyfront")]
#[command(version)]
#[command(about = "Inspect the front end of a Python-subset compiler")]
#[command(long_about = r#"
pyfront runs the front end of an educational compiler for a restricted
Python-like language and shows its working state:

  - the token stream, with one indent marker per physical line
  - lexical and syntactic diagnostics (runs never abort on errors)
  - both symbol tables, including types and constant-folded values
  - the rendered parse tree

Example usage:
  pyfront tokens input.py --symbols
  pyfront parse input.py --json
  pyfront inspect input.py
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream and lexical errors
    Tokens {
        /// Input source file
        input: PathBuf,

        /// Also print the lexer symbol table
        #[arg(long)]
        symbols: bool,

        /// Emit the raw tokens as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the parse tree and parse errors
    Parse {
        /// Input source file
        input: PathBuf,

        /// Also print the parser symbol table
        #[arg(long)]
        symbols: bool,

        /// Emit the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the full report: tokens, symbols, tree and all diagnostics
    Inspect {
        /// Input source file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tokens {
            input,
            symbols,
            json,
        } => {
            let mut session = load_session(&input)?;
            let report = session.run_lexer();

            if json {
                println!("{}", serde_json::to_string_pretty(session.tokens())?);
                return Ok(());
            }

            print_lines("Tokens:", &report.tokens);
            if !report.errors.is_empty() {
                print_lines("\nLexical Errors:", &report.errors);
            }
            if symbols {
                print_lines("\nSymbol Table:", &report.symbols);
            }
        }

        Commands::Parse {
            input,
            symbols,
            json,
        } => {
            let mut session = load_session(&input)?;
            session.run_lexer();
            let report = session.run_parser();

            if json {
                match session.program() {
                    Some(program) => {
                        println!("{}", serde_json::to_string_pretty(&program.to_json())?)
                    }
                    None => println!("{{}}"),
                }
                return Ok(());
            }

            print!("{}", report.tree);
            if !report.errors.is_empty() {
                print_lines("\nParse Errors:", &report.errors);
            }
            if symbols {
                print_lines("\nSymbol Table:", &report.symbols);
            }
        }

        Commands::Inspect { input } => {
            let mut session = load_session(&input)?;
            let lex_report = session.run_lexer();
            let parse_report = session.run_parser();

            print_lines("Tokens:", &lex_report.tokens);
            print_lines("\nLexical Errors:", &lex_report.errors);
            print_lines("\nLexer Symbol Table:", &lex_report.symbols);
            println!("\nParse Tree:");
            print!("{}", parse_report.tree);
            print_lines("\nParse Errors:", &parse_report.errors);
            print_lines("\nParser Symbol Table:", &parse_report.symbols);
        }
    }

    Ok(())
}

fn load_session(input: &Path) -> Result<Session> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut session = Session::new();
    session.load(&source);
    Ok(session)
}

fn print_lines(header: &str, lines: &[String]) {
    println!("{}", header);
    if lines.is_empty() {
        println!("(none)");
        return;
    }
    for line in lines {
        println!("{}", line);
    }
}
