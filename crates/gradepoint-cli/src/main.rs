//! gradepoint CLI: GPA/CGPA calculator on the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;

use commands::{DatasetTarget, Target};

#[derive(Parser)]
#[command(name = "gradepoint", version, about = "GPA/CGPA calculator")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and data directory
    Init,

    /// List catalog departments
    Departments,

    /// Show GPA, CGPA and progress
    Show {
        #[command(flatten)]
        target: Target,

        /// Show the courses of one semester
        #[arg(long)]
        semester: Option<String>,

        /// Output format: table, json, markdown
        #[arg(long, default_value = "table")]
        format: String,

        /// Also write the JSON summary to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Grade a course (A+ .. F, "skip" to exclude, "clear" to unset)
    Grade {
        #[command(flatten)]
        target: Target,

        /// Course code
        course: String,

        /// Letter grade, skip or clear
        grade: String,
    },

    /// Switch a semester to a manually entered GPA, or back
    Manual {
        #[command(flatten)]
        target: Target,

        /// Semester code (e.g. 11, 12, 21)
        semester: String,

        /// Manual GPA between 0.00 and 4.00
        #[arg(long)]
        gpa: Option<String>,

        /// Return to course-wise grading
        #[arg(long, conflicts_with = "gpa")]
        off: bool,
    },

    /// List elective options for a slot, or choose one
    Elective {
        /// Department code
        #[arg(long)]
        dept: Option<String>,

        /// Elective slot code (e.g. ELECTIVE-1)
        slot: String,

        /// Chosen course code
        choice: Option<String>,
    },

    /// Clear grades and overrides
    Reset {
        #[command(flatten)]
        target: Target,

        /// Also clear elective choices and the custom curriculum, and delete the saved file
        #[arg(long)]
        all: bool,

        /// Delete every saved dataset: all departments, the custom curriculum and the simple calculator
        #[arg(long, conflicts_with_all = ["all", "dept", "custom"])]
        everything: bool,
    },

    /// Author the custom curriculum
    Setup {
        #[command(subcommand)]
        action: commands::setup::SetupAction,
    },

    /// Simple calculator: semesters entered as GPA and credits
    Simple {
        #[command(subcommand)]
        action: commands::simple::SimpleAction,
    },

    /// Export a dataset as JSON
    Export {
        #[command(flatten)]
        target: DatasetTarget,

        /// Output file (default: export-<key>-<millis>.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Replace a dataset with a previously exported file
    Import {
        #[command(flatten)]
        target: DatasetTarget,

        /// File to import
        file: PathBuf,
    },
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config;
    let data_dir = cli.data_dir;
    let ctx = || commands::Context::load(config_path.as_deref(), data_dir.clone());

    match cli.command {
        Commands::Init => commands::init::execute(config_path.clone(), data_dir.clone()),
        Commands::Departments => commands::departments::execute(&ctx()?),
        Commands::Show {
            target,
            semester,
            format,
            output,
        } => commands::show::execute(&ctx()?, &target, semester, &format, output),
        Commands::Grade {
            target,
            course,
            grade,
        } => commands::grade::execute(&ctx()?, &target, &course, &grade),
        Commands::Manual {
            target,
            semester,
            gpa,
            off,
        } => commands::manual::execute(&ctx()?, &target, &semester, gpa, off),
        Commands::Elective { dept, slot, choice } => {
            commands::elective::execute(&ctx()?, dept, &slot, choice)
        }
        Commands::Reset {
            target,
            all,
            everything,
        } => {
            if everything {
                commands::reset::everything(&ctx()?)
            } else {
                commands::reset::execute(&ctx()?, &target, all)
            }
        }
        Commands::Setup { action } => commands::setup::execute(&ctx()?, action),
        Commands::Simple { action } => commands::simple::execute(&ctx()?, action),
        Commands::Export { target, output } => commands::transfer::export(&ctx()?, &target, output),
        Commands::Import { target, file } => commands::transfer::import(&ctx()?, &target, &file),
    }
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gradepoint=info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
