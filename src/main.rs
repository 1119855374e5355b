use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::diagnostics::Diagnostics;
use rox::interpreter::MAX_CALL_DEPTH;
use rox::lox::{Lox, RunStatus};
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};

const EXIT_IO_ERROR: i32 = 74;

/// Stack for the thread that runs scripts; room for `MAX_CALL_DEPTH` nested
/// Lox calls in an unoptimised build.
const INTERPRETER_STACK_SIZE: usize = 128 * 1024 * 1024;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Log file written when --log is set
    #[arg(long, global = true, default_value = "rox.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints the syntax tree of each statement
    Parse { filename: PathBuf },

    /// Runs a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default)
    Repl,
}

/// Reads a whole source file as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
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
        .parse_env("RUST_LOG") // RUST_LOG overrides the default level
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn load_or_exit(filename: &Path) -> String {
    match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_IO_ERROR);
        }
    }
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source = load_or_exit(filename);
    let mut ok = true;
    let mut tokens = Vec::new();

    for result in Scanner::new(&source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => {
                ok = false;
                eprintln!("{}", e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    Ok(if ok { 0 } else { RunStatus::StaticError.exit_code() })
}

fn parse(filename: &Path) -> Result<i32> {
    let source = load_or_exit(filename);
    let mut diagnostics = Diagnostics::new();

    let tokens = scan_tokens(&source, &mut diagnostics);
    let statements = Parser::new(&tokens, &mut diagnostics).parse();

    for diagnostic in diagnostics.diagnostics() {
        eprintln!("{}", diagnostic);
    }

    match statements {
        Some(statements) if !diagnostics.had_error() => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
            Ok(0)
        }
        _ => Ok(RunStatus::StaticError.exit_code()),
    }
}

fn run_file(filename: &Path) -> Result<i32> {
    let source = load_or_exit(filename);

    // For logging only
    debug!("Provided input:\n{}", source);

    let mut lox = Lox::new();
    let status = lox.run(&source);

    for diagnostic in lox.take_diagnostics() {
        eprintln!("{}", diagnostic);
    }

    info!("Run finished with {:?}", status);

    Ok(status.exit_code())
}

fn run_prompt() -> Result<i32> {
    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let status = lox.run(&line);
        debug!("REPL line finished with {:?}", status);

        // Errors never end the session.
        for diagnostic in lox.take_diagnostics() {
            eprintln!("{}", diagnostic);
        }
    }

    Ok(0)
}

/// Run `job` on a dedicated thread whose stack fits the interpreter's
/// maximum call depth.
fn on_interpreter_stack<F>(job: F) -> Result<i32>
where
    F: FnOnce() -> Result<i32> + Send + 'static,
{
    debug!(
        "Spawning interpreter thread ({} bytes of stack, call depth {})",
        INTERPRETER_STACK_SIZE, MAX_CALL_DEPTH
    );

    let handle = thread::Builder::new()
        .name("interpreter".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(job)
        .context("Failed to spawn interpreter thread")?;

    handle
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))?
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match args.command.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename, json } => tokenize(&filename, json)?,
        Commands::Parse { filename } => parse(&filename)?,
        Commands::Run { filename } => on_interpreter_stack(move || run_file(&filename))?,
        Commands::Repl => on_interpreter_stack(run_prompt)?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
