//! icvm CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use icvm_engine::MachineConfig;
use icvm_foundation::{Error, Result};
use icvm_runtime::{Debugger, Session, SessionOptions, image, logging, parse_params, parse_value};

#[derive(Parser)]
#[command(name = "icvm")]
#[command(version)]
#[command(about = "Build, run, and debug IC three-address code", long_about = None)]
struct Cli {
    /// Log every executed instruction (overrides ICVM_LOG)
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and run a program, printing the returned value
    Run(RunArgs),

    /// Build a program and report errors without running it
    Check(LoadArgs),

    /// Print the canonical form of a program
    Fmt(LoadArgs),

    /// Build a program into a MessagePack image
    Compile {
        #[command(flatten)]
        load: LoadArgs,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Step through a program interactively
    Debug(RunArgs),
}

#[derive(Args)]
struct LoadArgs {
    /// Input `.ic` source or `.icb` image
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Declare a function's parameters, e.g. `--params add=p0,p1`
    #[arg(long = "params", value_name = "NAME=P0,P1")]
    params: Vec<String>,

    /// Make the native prelude (@abs, @min, @max, @strlen, @concat, @itoa) callable
    #[arg(long)]
    prelude: bool,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Entry function (default: @main, else the first instruction)
    #[arg(long)]
    entry: Option<String>,

    /// Fault after this many instructions
    #[arg(long)]
    step_limit: Option<u64>,

    /// Argument bound to the entry function's parameters, in order
    #[arg(long = "arg", value_name = "VALUE", allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.trace);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => cmd_run(&args),
        Commands::Check(load) => {
            let session = load_session(&load)?;
            println!(
                "{}: ok ({} instructions, {} labels)",
                session.name(),
                session.program().len(),
                session.program().labels().count()
            );
            Ok(())
        }
        Commands::Fmt(load) => {
            print!("{}", load_session(&load)?.program());
            Ok(())
        }
        Commands::Compile { load, output } => {
            let session = load_session(&load)?;
            image::save_to_file(&session.to_image(), &output)?;
            println!("wrote {}", output.display());
            Ok(())
        }
        Commands::Debug(args) => {
            let session = load_session(&args.load)?;
            let config = machine_config(&args)?;
            Debugger::new(&session, config)?.run()
        }
    }
}

fn cmd_run(args: &RunArgs) -> Result<()> {
    let session = load_session(&args.load)?;
    match session.run(machine_config(args)?)? {
        Some(value) => println!("{value}"),
        None => println!("(no value)"),
    }
    Ok(())
}

fn load_session(load: &LoadArgs) -> Result<Session> {
    let mut options = SessionOptions::new();
    options.prelude = load.prelude;
    for spec in &load.params {
        options.params.push(parse_params(spec)?);
    }
    Session::load(&load.file, options)
}

fn machine_config(args: &RunArgs) -> Result<MachineConfig> {
    let mut config = MachineConfig::new();
    if let Some(entry) = &args.entry {
        config = config.with_entry(entry);
    }
    if let Some(limit) = args.step_limit {
        config = config.with_step_limit(limit);
    }
    let values = args
        .args
        .iter()
        .map(|arg| parse_value(arg))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(config.with_args(values))
}

fn report(error: &Error) {
    match &error.context {
        Some(context) => eprintln!("\x1b[31merror: {context}: {error}\x1b[0m"),
        None => eprintln!("\x1b[31merror: {error}\x1b[0m"),
    }
}
