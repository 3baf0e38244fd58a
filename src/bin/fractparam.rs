use std::{
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fractparam", version)]
struct Cli {
    /// Log resolution and rebuild events to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the merged parameter table of one or more stored programs.
    Table(TableArgs),
    /// Set or reset one parameter of a stored program.
    Set(SetArgs),
    /// Print the compiled instruction stream of a stored program.
    Code(CodeArgs),
}

#[derive(Parser, Debug)]
struct TableArgs {
    /// Input store JSON; repeat for several programs.
    #[arg(long = "in", required = true)]
    in_paths: Vec<PathBuf>,

    /// Index of the key program.
    #[arg(long, default_value_t = 0)]
    key: usize,

    /// Parameter id kept per program; may be repeated.
    #[arg(long)]
    exclusive: Vec<String>,
}

#[derive(Parser, Debug)]
struct SetArgs {
    /// Input store JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Parameter id.
    #[arg(long)]
    id: String,

    /// New value as JSON, e.g. `{"type":"int","value":3}`. Omit to reset.
    #[arg(long)]
    value: Option<String>,

    /// Output path; defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CodeArgs {
    /// Input store JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Table(args) => cmd_table(args),
        Command::Set(args) => cmd_set(args),
        Command::Code(args) => cmd_code(args),
    }
}

fn read_store(path: &Path) -> anyhow::Result<fractal_params::ParameterStore> {
    let text =
        fs::read_to_string(path).with_context(|| format!("open store '{}'", path.display()))?;
    let store = fractal_params::ParameterStore::from_json(&text)
        .with_context(|| format!("parse store '{}'", path.display()))?;
    Ok(store)
}

fn compiler() -> Rc<dyn fractal_params::Compiler> {
    Rc::new(fractal_params::StandardCompiler::new())
}

fn cmd_table(args: TableArgs) -> anyhow::Result<()> {
    let mut set = fractal_params::ProgramSet::new(compiler());
    for path in &args.in_paths {
        let store = read_store(path)?;
        set.add_program(store)
            .with_context(|| format!("compile '{}'", path.display()))?;
    }
    set.set_key_index(args.key)?;
    for id in &args.exclusive {
        set.add_exclusive_parameter(id);
    }

    for e in set.table() {
        let value = serde_json::to_string(&e.parameter.value)?;
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}{}",
            e.id,
            e.owner,
            if e.shared { "shared" } else { "exclusive" },
            e.parameter.ptype,
            value,
            e.parameter.description,
            if e.parameter.is_default { "" } else { "\t*" },
        );
    }
    Ok(())
}

fn cmd_set(args: SetArgs) -> anyhow::Result<()> {
    let store = read_store(&args.in_path)?;
    let mut program = fractal_params::Program::new(compiler(), store)
        .with_context(|| format!("compile '{}'", args.in_path.display()))?;

    let value: Option<fractal_params::Value> = args
        .value
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .with_context(|| "parse value JSON")?;

    let changed = program
        .set_value(&args.id, value)
        .with_context(|| format!("set '{}'", args.id))?;
    if !changed {
        anyhow::bail!("'{}' is not a parameter of this program", args.id);
    }

    let json = program.store().to_json()?;
    match &args.out {
        Some(out) => {
            fs::write(out, json).with_context(|| format!("write store '{}'", out.display()))?
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_code(args: CodeArgs) -> anyhow::Result<()> {
    let store = read_store(&args.in_path)?;
    let program = fractal_params::Program::new(compiler(), store)
        .with_context(|| format!("compile '{}'", args.in_path.display()))?;
    let words: Vec<String> = program.code().iter().map(i32::to_string).collect();
    println!("{}", words.join(" "));
    Ok(())
}
