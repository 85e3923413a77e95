use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{self, Command};

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand, value_parser};
use runenv::{EnvLoader, ResolvedEnvironment, WRAPPED_MARKER, lint_env_file, parse_env_file};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILE: &str = ".env";

const EPILOG: &str = "\
NOTES:
  The legacy `runenv <envfile> <command> [params]` form still works, but the
  `run` subcommand is preferred:

      $ runenv run [--env-file .env] -- command --with --params
";

#[derive(Debug, Parser)]
#[command(name = "runenv", version)]
#[command(about = "Run program with given environment file loaded", after_help = EPILOG)]
struct Cli {
    /// Verbosity level: 1 (errors, default), 2 (info) or 3 (debug)
    #[arg(
        short,
        long,
        global = true,
        default_value_t = 1,
        value_parser = value_parser!(u8).range(1..=3)
    )]
    verbosity: u8,

    /// Show help for the legacy `runenv <envfile> <command>` form
    #[arg(long)]
    help_legacy: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a command with the env file loaded
    Run(RunArgs),
    /// List parsed variables
    List(FileArgs),
    /// Lint the env file
    Lint(LintArgs),
}

#[derive(Debug, Clone, Args)]
struct FileArgs {
    /// Environment file to load [default: .env, .env.json, .env.toml, .env.yaml]
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Load only variables with the given prefix
    #[arg(short, long)]
    prefix: Option<String>,

    /// Strip the prefix given with --prefix from variable names
    #[arg(short, long)]
    strip_prefix: bool,

    /// How many parent directories to search for the env file
    #[arg(long, default_value_t = 0, value_name = "N")]
    search_parent: u32,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    file: FileArgs,

    /// Command to run with the loaded environment
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<OsString>,
}

#[derive(Debug, Args)]
struct LintArgs {
    #[command(flatten)]
    file: FileArgs,

    /// Print the messages as a JSON array
    #[arg(long)]
    as_json: bool,
}

/// `runenv [OPTIONS] <ENV_FILE> <COMMAND>...`, kept for old scripts.
#[derive(Debug, Parser)]
#[command(name = "runenv", version)]
#[command(about = "Run program with given environment file loaded")]
struct LegacyCli {
    /// Verbosity level: 1 (errors, default), 2 (info) or 3 (debug)
    #[arg(short, long, default_value_t = 1, value_parser = value_parser!(u8).range(1..=3))]
    verbosity: u8,

    /// Load only variables with the given prefix
    #[arg(short, long)]
    prefix: Option<String>,

    /// Strip the prefix given with --prefix from variable names
    #[arg(short, long)]
    strip_prefix: bool,

    /// Print the parsed environment instead of running the command
    #[arg(long)]
    dry_run: bool,

    /// Environment file to load
    env_file: PathBuf,

    /// Command to run with the loaded environment
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true,
        value_name = "COMMAND"
    )]
    command: Vec<OsString>,
}

fn main() {
    process::exit(run(std::env::args_os().collect()));
}

fn run(args: Vec<OsString>) -> i32 {
    if is_legacy_invocation(&args) {
        let cli = LegacyCli::parse_from(args);
        init_logging(cli.verbosity);
        debug!("legacy invocation; prefer `runenv run --env-file <file> -- <command>`");
        return report(run_legacy(&cli));
    }

    let cli = Cli::parse_from(args);
    init_logging(cli.verbosity);
    debug!(?cli, "parsed arguments");

    if cli.help_legacy {
        return match LegacyCli::command().print_help() {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("runenv: {err}");
                1
            }
        };
    }

    let Some(command) = cli.command else {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingSubcommand,
                "a subcommand is required",
            )
            .exit();
    };

    report(match command {
        Commands::Run(args) => execute_run(&args),
        Commands::List(args) => execute_list(&args),
        Commands::Lint(args) => execute_lint(&args),
    })
}

fn report(result: anyhow::Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("runenv: {err:#}");
            1
        }
    }
}

/// The legacy form is used when the first positional argument names an
/// existing file.
fn is_legacy_invocation(args: &[OsString]) -> bool {
    let mut tokens = args.iter().skip(1);
    while let Some(token) = tokens.next() {
        match token.to_string_lossy().as_ref() {
            "--" | "-h" | "--help" => return false,
            "-p" | "--prefix" | "-v" | "--verbosity" => {
                tokens.next();
            }
            flag if flag.starts_with('-') => {}
            _ => return Path::new(token).is_file(),
        }
    }
    false
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        3 => "debug",
        2 => "info",
        _ => "error",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn file_loader(args: &FileArgs) -> EnvLoader {
    let mut loader = EnvLoader::new()
        .strip_prefix(args.strip_prefix)
        .search_parent(args.search_parent);
    if let Some(prefix) = &args.prefix {
        loader = loader.prefix(prefix);
    }
    if let Some(env_file) = &args.env_file {
        loader = loader.env_file(env_file);
    }
    loader
}

/// Find the env file selected by `args`, or report it missing and return
/// `None`.
fn find_selected(loader: &EnvLoader, args: &FileArgs) -> anyhow::Result<Option<PathBuf>> {
    let found = loader.find_env_file()?;
    if found.is_none() {
        let requested = args
            .env_file
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_FILE));
        eprintln!(
            "ERROR!!! Environment file {} does not exist",
            requested.display()
        );
    }
    Ok(found)
}

fn load_selected(args: &FileArgs) -> anyhow::Result<Option<ResolvedEnvironment>> {
    let loader = file_loader(args);
    let Some(path) = find_selected(&loader, args)? else {
        return Ok(None);
    };

    let env = parse_env_file(&path, loader.parse_options(), loader.target_env())?;
    debug!("loaded {} variables from {}", env.len(), path.display());
    Ok(Some(env))
}

fn execute_run(args: &RunArgs) -> anyhow::Result<i32> {
    let Some((program, program_args)) = args.command.split_first() else {
        eprintln!("Missing command to execute after 'runenv run -- <command> [params]'");
        return Ok(1);
    };
    let Some(env) = load_selected(&args.file)? else {
        return Ok(1);
    };

    execute_command(program, program_args, &env)
}

fn execute_list(args: &FileArgs) -> anyhow::Result<i32> {
    let Some(env) = load_selected(args)? else {
        return Ok(1);
    };

    print_env(&env);
    Ok(0)
}

fn execute_lint(args: &LintArgs) -> anyhow::Result<i32> {
    let loader = file_loader(&args.file);
    let Some(path) = find_selected(&loader, &args.file)? else {
        return Ok(1);
    };

    let messages = lint_env_file(&path, loader.parse_options(), loader.target_env())?;
    if args.as_json {
        println!("{}", serde_json::to_string(&messages)?);
    } else {
        for message in &messages {
            println!("{message}");
        }
    }
    Ok(0)
}

fn run_legacy(cli: &LegacyCli) -> anyhow::Result<i32> {
    let mut loader = EnvLoader::new()
        .env_file(&cli.env_file)
        .strip_prefix(cli.strip_prefix);
    if let Some(prefix) = &cli.prefix {
        loader = loader.prefix(prefix);
    }
    let mut env = loader.create_env()?;

    if cli.dry_run {
        env.insert(WRAPPED_MARKER.to_owned(), "1".to_owned());
        println!("[legacy] Dry run mode");
        println!("[legacy] Parsed environment:");
        print_env(&env);
        return Ok(0);
    }

    let Some((program, program_args)) = cli.command.split_first() else {
        eprintln!("[legacy] Missing command to execute");
        return Ok(1);
    };
    execute_command(program, program_args, &env)
}

fn print_env(env: &ResolvedEnvironment) {
    for (key, value) in env {
        println!("{key}={value}");
    }
}

fn execute_command(
    program: &OsStr,
    args: &[OsString],
    env: &ResolvedEnvironment,
) -> anyhow::Result<i32> {
    let executable = match resolve_program(program) {
        Ok(path) => path,
        Err(message) => {
            eprintln!("{message}");
            return Ok(1);
        }
    };

    debug!(
        "running {} with {} loaded variables",
        executable.display(),
        env.len()
    );
    let status = Command::new(&executable)
        .args(args)
        .envs(env)
        .env(WRAPPED_MARKER, "1")
        .status()
        .with_context(|| format!("failed to execute `{}`", executable.display()))?;

    Ok(status.code().unwrap_or(1))
}

fn resolve_program(program: &OsStr) -> Result<PathBuf, String> {
    match which::which(program) {
        Ok(path) => Ok(path),
        Err(_) if Path::new(program).is_file() => Err(format!(
            "File `{}` is not executable",
            program.to_string_lossy()
        )),
        Err(_) => Err(format!(
            "File `{}` does not exist",
            program.to_string_lossy()
        )),
    }
}
