use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::info;

use typescript_all_in::diagnostic::Tsc;
use typescript_all_in::fix::{self, FixOptions};
use typescript_all_in::print::{CommandFormatter, NoopFormatter, Reformatter};
use typescript_all_in::{rename, undo, Result};

/// Initialize logger based on verbose flag
fn init_logger(verbose: bool) {
    let mut log_builder = env_logger::Builder::from_default_env();
    if verbose {
        log_builder.filter_level(log::LevelFilter::Debug);
    } else {
        log_builder.filter_level(log::LevelFilter::Off);
    }
    log_builder.init();
}

#[derive(Parser)]
#[command(name = "typescript-all-in")]
#[command(about = "Migrate a JavaScript project to TypeScript by suppressing every type error", long_about = None)]
#[command(version)]
struct Cli {
    /// Show progress and debug output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename JavaScript files to TypeScript, then suppress every type error
    Convert {
        #[command(flatten)]
        project: ProjectArgs,

        #[command(flatten)]
        check: CheckArgs,
    },

    /// Rename .js and .jsx files to .ts and .tsx
    Rename {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Add a suppression comment in front of every type error
    Fix {
        #[command(flatten)]
        project: ProjectArgs,

        #[command(flatten)]
        check: CheckArgs,
    },

    /// Remove all suppression comments
    Undo {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[derive(Args)]
struct ProjectArgs {
    /// Project root
    #[arg(value_name = "PATH", default_value = ".")]
    path: PathBuf,

    /// Skip paths containing this substring
    #[arg(long, value_name = "SUBSTRING", default_value = "node_modules")]
    ignore: Vec<String>,
}

#[derive(Args)]
struct CheckArgs {
    /// Type checker executable
    #[arg(long, value_name = "PROGRAM", default_value = "tsc")]
    tsc: String,

    /// Formatter run over every rewritten file, fed through stdin
    #[arg(long, value_name = "PROGRAM")]
    formatter: Option<String>,
}

fn fix_project(project: &ProjectArgs, check: &CheckArgs) -> Result<()> {
    let checker = Tsc::new(check.tsc.as_str());
    let formatter: Box<dyn Reformatter> = match &check.formatter {
        Some(program) => Box::new(CommandFormatter::new(
            program.as_str(),
            vec!["--stdin-filepath".to_string()],
        )),
        None => Box::new(NoopFormatter),
    };

    let options = FixOptions {
        ignore: project.ignore.clone(),
    };
    let report = fix::run(&project.path, &options, &checker, formatter.as_ref())?;
    if report.files_skipped > 0 {
        info!("Skipped {} files that could not be processed", report.files_skipped);
    }
    Ok(())
}

fn rename_project(path: &Path, ignore: &[String]) -> Result<()> {
    let renamed = rename::move_to_typescript(path, ignore)?;
    info!("Renamed {} files", renamed.len());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert { project, check } => {
            rename_project(&project.path, &project.ignore)?;
            fix_project(&project, &check)
        }
        Commands::Rename { project } => rename_project(&project.path, &project.ignore),
        Commands::Fix { project, check } => fix_project(&project, &check),
        Commands::Undo { project } => {
            let changed = undo::undo_ignore_comments(&project.path, &project.ignore)?;
            info!("Removed comments from {} files", changed.len());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn logging_is_opt_in() {
        let cli = Cli::try_parse_from(["typescript-all-in", "fix", "app"]).unwrap();
        assert!(!cli.verbose);

        let cli = Cli::try_parse_from(["typescript-all-in", "fix", "app", "-v"]).unwrap();
        assert!(cli.verbose);

        assert!(Cli::try_parse_from(["typescript-all-in", "-q", "fix", "app"]).is_err());
    }
}
