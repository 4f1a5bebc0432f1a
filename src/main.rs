use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use nyx::ast_printer::AstPrinter;
use nyx::error::{Diagnostics, StderrReporter, PROMPT_FILE};
use nyx::interpreter::Interpreter;
use nyx::module::{ModuleRegistry, SearchPaths};
use nyx::natives::Natives;
use nyx::parser::Parser;
use nyx::scanner::Scanner;

/// Static error (lex, parse, resolve).
const EXIT_STATIC: i32 = 65;
/// Runtime error.
const EXIT_RUNTIME: i32 = 70;
/// Bad command line.
const EXIT_USAGE: i32 = 64;

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Nyx language interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to run. Starts a prompt when absent.
    script: Option<PathBuf>,

    /// Enable logging to nyx.log
    #[arg(long, global = true)]
    log: bool,

    /// Extra module search root, searched after the defaults
    #[arg(long = "lib", value_name = "DIR", global = true)]
    lib: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// One JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its syntax tree
    Parse { filename: PathBuf },
}

fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source = fs::read_to_string(filename)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);
    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("nyx.log").context("Failed to create nyx.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("nyx::")
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
        .filter(None, log::LevelFilter::Debug) // RUST_LOG can still override
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to nyx.log");
    Ok(())
}

fn new_interpreter(lib: &[PathBuf]) -> Interpreter {
    let interpreter = Interpreter::with_parts(
        Diagnostics::new(StderrReporter),
        Natives::standard(),
        ModuleRegistry::shared(SearchPaths::default()),
    );

    {
        let modules = interpreter.modules();
        let mut registry = modules.borrow_mut();
        for root in lib {
            registry.search_paths_mut().push(root.clone());
        }
    }

    interpreter
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let file = filename.display().to_string();

    let mut tokenized = true;

    for token in Scanner::new(file.as_str(), &source) {
        match token {
            Ok(token) if json => {
                println!("{}", serde_json::to_string(&token).context("Failed to encode token")?);
            }
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC);
        process::exit(EXIT_STATIC);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &PathBuf) -> Result<()> {
    let source = read_file(filename)?;
    let file = filename.display().to_string();

    let (tokens, lex_errors) = Scanner::new(file.as_str(), &source).scan_all();
    let (statements, parse_errors) = Parser::new(&tokens).parse();

    if !lex_errors.is_empty() || !parse_errors.is_empty() {
        for e in lex_errors.iter().chain(parse_errors.iter()) {
            eprintln!("{}", e);
        }
        process::exit(EXIT_STATIC);
    }

    for stmt in &statements {
        println!("{}", AstPrinter::print_stmt(stmt));
    }

    Ok(())
}

fn run_file(filename: &PathBuf, lib: &[PathBuf]) -> Result<()> {
    let source = read_file(filename)?;
    let file = filename.display().to_string();

    let mut interpreter = new_interpreter(lib);
    let diagnostics = interpreter.diagnostics();

    if nyx::run_source(&mut interpreter, &file, &source) {
        info!("Program executed successfully");
        return Ok(());
    }

    if diagnostics.had_error() {
        process::exit(EXIT_STATIC);
    }
    if diagnostics.had_runtime_error() {
        process::exit(EXIT_RUNTIME);
    }

    Ok(())
}

fn run_prompt(lib: &[PathBuf]) -> Result<()> {
    let mut interpreter = new_interpreter(lib);
    let diagnostics = interpreter.diagnostics();

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            break;
        }

        diagnostics.reset();
        nyx::run_source(&mut interpreter, PROMPT_FILE, &line);
    }

    println!();
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version also land here, on stdout.
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            e.print().context("Failed to print usage")?;
            process::exit(code);
        }
    };

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    match (&args.command, &args.script) {
        (Some(Commands::Tokenize { filename, json }), _) => tokenize(filename, *json),
        (Some(Commands::Parse { filename }), _) => parse(filename),
        (None, Some(script)) => run_file(script, &args.lib),
        (None, None) => run_prompt(&args.lib),
    }
}
