use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use culebra::ast::printer;
use culebra::interpreter::Interpreter;
use culebra::{CompileError, logging, parser, repl, scanner};

#[derive(Parser, Debug)]
#[command(name = "culebra", about = "An interpreter for the Culebra language")]
struct Cli {
    /// Culebra source file to run (omit to tokenize stdin)
    file: Option<PathBuf>,

    /// Function to call after loading the file
    #[arg(long, default_value = "main", value_name = "NAME")]
    entry: String,

    /// Tokenize stdin line by line and print the tokens
    #[arg(short, long)]
    tokens: bool,

    /// Dump tokens and exit
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST (with includes spliced in) and exit
    #[arg(long)]
    dump_ast: bool,

    /// AST output format
    #[arg(long, default_value = "sexp", value_parser = ["sexp", "json"])]
    ast_format: String,
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read source file '{}'", path.display()))
}

fn dump_tokens(path: &Path) -> Result<()> {
    let source = read_source(path)?;
    let tokens = scanner::scan(&source)
        .map_err(|e| e.with_source_code(path.display().to_string(), source.as_str()))?;
    for token in &tokens {
        println!("{token}");
    }
    Ok(())
}

fn dump_ast(path: &Path, format: &str) -> Result<()> {
    let parsed = parser::parse_file(path)?;
    report_warnings(&parsed.warnings);
    match format {
        "json" => println!("{}", printer::to_json(&parsed.program)),
        _ => print!("{}", printer::to_sexp(&parsed.program)),
    }
    Ok(())
}

fn run_program(path: &Path, entry: &str) -> Result<()> {
    let mut interpreter = Interpreter::new();
    let warnings = culebra::load_file(path, &mut interpreter)?;
    report_warnings(&warnings);
    interpreter.run(entry)?;
    Ok(())
}

fn report_warnings(warnings: &[culebra::Warning]) {
    for warning in warnings {
        eprintln!("{:?}", miette::Report::new(warning.clone()));
    }
}

/// Render reports without line wrapping so long paths stay on one line.
fn install_report_handler() {
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().width(400).build())
    }));
}

fn report_error(error: anyhow::Error) {
    match error.downcast::<CompileError>() {
        Ok(compile) => eprintln!("{:?}", miette::Report::new(compile)),
        Err(other) => eprintln!("error: {other:#}"),
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = match cli.file {
        Some(ref path) if !cli.tokens => path,
        _ => {
            repl::run_tokenizer();
            return Ok(());
        }
    };

    if cli.dump_tokens {
        return dump_tokens(path);
    }
    if cli.dump_ast {
        return dump_ast(path, &cli.ast_format);
    }
    run_program(path, &cli.entry)
}

fn main() -> ExitCode {
    logging::init_tracing();
    install_report_handler();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(e);
            ExitCode::FAILURE
        }
    }
}
