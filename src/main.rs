use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use snafu::{ResultExt, Snafu};

use ec1::{AsmOptions, CompileError, codegen, interp, parser, tokenizer};

#[derive(Parser, Debug)]
#[command(name = "ec1c")]
#[command(about = "Compiler and interpreter for EC1 constant expressions")]
struct Cli {
  /// EC1 source file
  file: PathBuf,
  /// What to do with the source
  #[arg(short, long, value_enum, default_value_t = Mode::Asm)]
  mode: Mode,
  /// Assembly output path (defaults to <input stem>.s in the current directory)
  #[arg(short, long)]
  output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
  /// Print the token stream
  Tokens,
  /// Print the syntax tree, then interpret it
  Ast,
  /// Interpret and print the result
  Eval,
  /// Write an x86-64 assembly program
  Asm,
}

#[derive(Debug, Snafu)]
enum DriverError {
  #[snafu(display("file '{}' not found", path.display()))]
  NotFound { path: PathBuf },
  #[snafu(display("failed to read '{}': {source}", path.display()))]
  Read { path: PathBuf, source: io::Error },
  #[snafu(display("failed to write '{}': {source}", path.display()))]
  Write { path: PathBuf, source: io::Error },
  #[snafu(display("failed to print results: {source}"))]
  Print { source: io::Error },
  #[snafu(display("{}", source.render(text)))]
  Compile { text: String, source: CompileError },
}

fn read_source(path: &Path) -> Result<String, DriverError> {
  match fs::read_to_string(path) {
    Err(err) if err.kind() == io::ErrorKind::NotFound => NotFoundSnafu { path }.fail(),
    other => other.context(ReadSnafu { path }),
  }
}

/// `dir/name.ec1` becomes `name.s`, relative to the working directory.
fn default_output(input: &Path) -> PathBuf {
  let stem = input.file_stem().unwrap_or_else(|| OsStr::new("out"));
  PathBuf::from(stem).with_extension("s")
}

fn compiled<T, E: Into<CompileError>>(result: Result<T, E>, text: &str) -> Result<T, DriverError> {
  result.map_err(Into::<CompileError>::into).context(CompileSnafu { text })
}

/// Run one mode over the input file, writing results to `out`. Warnings
/// and diagnostics are left to the caller and stderr.
fn run(cli: &Cli, out: &mut impl Write) -> Result<(), DriverError> {
  let src = read_source(&cli.file)?;
  if src.trim().is_empty() {
    eprintln!("warning: '{}' is empty", cli.file.display());
    return Ok(());
  }

  let tokens = compiled(tokenizer::tokenize(&src), &src)?;
  if cli.mode == Mode::Tokens {
    for token in &tokens {
      writeln!(out, "{token}").context(PrintSnafu)?;
    }
    return Ok(());
  }

  let tree = compiled(parser::parse(tokens), &src)?;
  if cli.mode == Mode::Asm {
    let code = codegen::generate(&tree);
    let asm = codegen::emit_program(&code, &AsmOptions::default());
    let path = cli
      .output
      .clone()
      .unwrap_or_else(|| default_output(&cli.file));
    fs::write(&path, asm).context(WriteSnafu { path: &path })?;
    writeln!(out, "successfully compiled to {}", path.display()).context(PrintSnafu)?;
    return Ok(());
  }

  if cli.mode == Mode::Ast {
    writeln!(out, "Syntax tree (AST):").context(PrintSnafu)?;
    write!(out, "{}", tree.render_tree()).context(PrintSnafu)?;
    let value = compiled(interp::evaluate(&tree), &src)?;
    writeln!(out, "\nresult: {value}").context(PrintSnafu)?;
  } else {
    let value = compiled(interp::evaluate(&tree), &src)?;
    writeln!(out, "{value}").context(PrintSnafu)?;
  }
  Ok(())
}

fn main() {
  let cli = Cli::parse();
  if let Err(err) = run(&cli, &mut io::stdout().lock()) {
    eprintln!("{err}");
    process::exit(1);
  }
}
