//! Compiler driver: argument handling, file I/O, and invocation of the host
//! C++ toolchain around the compilation pipeline.

use std::path::PathBuf;
use std::process::Command;
use std::{fs, process};

use clap::{Parser, ValueEnum};

use akbarc::error::CompileError;
use akbarc::{Result, compiler};

/// Compiler command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "akbarc", version)]
#[command(about = "AkbarLang to C++ source-to-source compiler")]
struct Args {
    /// AkbarLang source file.
    input: PathBuf,

    /// Output path for the emitted C++ (defaults to the input path with a
    /// `.cpp` extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after the named stage and print its result to stdout.
    #[arg(short, long, value_enum)]
    stage: Option<Stage>,

    /// Compile the emitted C++ with the host `c++` compiler.
    #[arg(long)]
    build: bool,

    /// Enable stage tracing on stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Pipeline stage to stop after.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Stage {
    /// Token stream.
    Tokens,
    /// Abstract syntax tree.
    Ast,
    /// Optimized instruction list.
    Ir,
    /// Emitted C++ source.
    Cpp,
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(err) = run(&args) {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let source = fs::read_to_string(&args.input).map_err(|err| {
        CompileError::Driver(format!(
            "failed to read input file '{}': {err}",
            args.input.display()
        ))
    })?;

    if let Some(stage) = args.stage {
        return print_stage(stage, &source);
    }

    let cpp = compiler::compile(&source)?;

    let out_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("cpp"));

    fs::write(&out_path, &cpp)?;

    if args.build {
        build_binary(&out_path)?;
    }

    Ok(())
}

/// Runs the pipeline up to the requested stage and prints its value.
fn print_stage(stage: Stage, source: &str) -> Result<()> {
    let tokens = compiler::lexer::lex(source)?;

    if let Stage::Tokens = stage {
        for token in &tokens {
            println!("{token:?}");
        }
        return Ok(());
    }

    let program = compiler::parser::parse_program(tokens)?;

    if let Stage::Ast = stage {
        print!("{program}");
        return Ok(());
    }

    compiler::parser::sema::analyze(&program)?;

    let instructions = compiler::ir::generate_ir(&program);
    compiler::ir::verify(&instructions)?;
    let instructions = compiler::opt::optimize(instructions);

    match stage {
        Stage::Ir => {
            for inst in &instructions {
                println!("{inst}");
            }
        }
        Stage::Cpp => print!("{}", compiler::emit::emit_cpp(&instructions)),
        Stage::Tokens | Stage::Ast => unreachable!("handled above"),
    }

    Ok(())
}

/// Hands the emitted translation unit to the host C++ toolchain.
fn build_binary(cpp_path: &std::path::Path) -> Result<()> {
    let bin_path = cpp_path.with_extension("");

    let output = Command::new("c++")
        .arg("-std=c++11")
        .arg("-o")
        .arg(&bin_path)
        .arg(cpp_path)
        .output()?;

    if !output.status.success() {
        return Err(CompileError::Driver(format!(
            "'c++' exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(())
}
