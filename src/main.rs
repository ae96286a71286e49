use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use loxide::ast_printer::AstPrinter;
use loxide::parser::Parser;
use loxide::{Lox, Outcome};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Runs a Lox program from a file, or starts a REPL when no file is
    /// given
    Run { filename: Option<PathBuf> },
}

/// Conventional exit codes: EX_USAGE, EX_DATAERR, EX_SOFTWARE.
const EXIT_USAGE: i32 = 64;
const EXIT_STATIC_ERROR: i32 = 65;
const EXIT_RUNTIME_ERROR: i32 = 70;

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: &PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("loxide::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn require_filename(filename: Option<PathBuf>) -> PathBuf {
    match filename {
        Some(f) => f,
        None => {
            eprintln!("Usage: expected a source file.");
            std::process::exit(EXIT_USAGE);
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            let filename = require_filename(filename);
            let buf = read_file(&filename)?;

            let mut tokenized = true;

            for result in Lox::tokenize(&buf) {
                match result {
                    Ok(token) => {
                        debug!("Scanned token: {}", token);

                        println!("{}", token);
                    }

                    Err(e) => {
                        tokenized = false;

                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");

                std::process::exit(EXIT_STATIC_ERROR);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            let filename = require_filename(filename);
            let buf = read_file(&filename)?;

            let mut tokens = Vec::new();
            let mut had_error = false;
            for result in Lox::tokenize(&buf) {
                match result {
                    Ok(token) => tokens.push(token),
                    Err(e) => {
                        had_error = true;
                        eprintln!("{}", e);
                    }
                }
            }

            if had_error {
                std::process::exit(EXIT_STATIC_ERROR);
            }

            match Parser::new(tokens).parse_expression() {
                Ok(expr) => {
                    let ast_str = AstPrinter::print(&expr);

                    debug!("AST: {}", ast_str);
                    println!("{}", ast_str);
                }

                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(EXIT_STATIC_ERROR);
                }
            }
        }

        Commands::Run { filename } => match filename {
            Some(filename) => {
                let buf = read_file(&filename)?;

                let mut lox = Lox::new();
                let outcome = lox.run(&buf);

                for diagnostic in lox.diagnostics() {
                    eprintln!("{}", diagnostic);
                }

                match outcome {
                    Outcome::Ok => info!("Program executed successfully"),
                    Outcome::StaticError => std::process::exit(EXIT_STATIC_ERROR),
                    Outcome::RuntimeError => std::process::exit(EXIT_RUNTIME_ERROR),
                }
            }

            None => repl()?,
        },
    }

    Ok(())
}

/// Interactive prompt: one line at a time through the same session, so
/// definitions persist between lines. Errors are reported and the prompt
/// continues.
fn repl() -> Result<()> {
    let mut lox = Lox::new();
    let stdin = io::stdin();

    print!("> ");
    io::stdout().flush()?;

    for line in stdin.lock().lines() {
        let line = line?;

        lox.run(line.as_bytes());
        for diagnostic in lox.diagnostics() {
            eprintln!("{}", diagnostic);
        }

        print!("> ");
        io::stdout().flush()?;
    }

    Ok(())
}
