//! The `gradepoint simple` command: CGPA from per-semester GPA and credits.

use anyhow::{bail, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};
use serde_json::json;

use gradepoint_core::simple::{semester_name, SimpleSemester};
use gradepoint_core::SimpleStore;

use super::{credits, gpa, report_status, Context};

#[derive(Debug, Subcommand)]
pub enum SimpleAction {
    /// Add a semester
    Add {
        /// Semester name (default: built from --year and --semester)
        #[arg(long, conflicts_with_all = ["year", "semester"])]
        name: Option<String>,
        /// Year number
        #[arg(long, requires = "semester")]
        year: Option<u8>,
        /// Semester number within the year
        #[arg(long, requires = "year")]
        semester: Option<u8>,
        /// GPA (0.00 - 4.00); blank counts as 0
        #[arg(long, default_value = "")]
        gpa: String,
        /// Credits (0 - 50); blank counts as 0
        #[arg(long, default_value = "")]
        credits: String,
    },

    /// Remove a semester by name
    Remove { name: String },

    /// Change a semester's GPA or credits; an empty value clears the field
    Update {
        name: String,
        #[arg(long)]
        gpa: Option<String>,
        #[arg(long)]
        credits: Option<String>,
    },

    /// Show semesters, yearly GPAs and the CGPA
    Show {
        /// Output format: table or json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Delete every semester
    Reset,
}

pub fn execute(ctx: &Context, action: SimpleAction) -> Result<()> {
    let mut store = SimpleStore::new(ctx.port());

    match action {
        SimpleAction::Add {
            name,
            year,
            semester,
            gpa,
            credits,
        } => {
            let name = match (name, year, semester) {
                (Some(name), _, _) => name,
                (None, Some(year), Some(semester)) => semester_name(year, semester),
                _ => bail!("give --name, or --year and --semester"),
            };
            let status = store.add_semester(&name, &gpa, &credits)?;
            report_status(&status, &format!("Added \"{}\".", name.trim()));
        }
        SimpleAction::Remove { name } => {
            let status = store.remove_semester(&name)?;
            report_status(&status, &format!("Removed \"{name}\"."));
        }
        SimpleAction::Update { name, gpa, credits } => {
            if gpa.is_none() && credits.is_none() {
                bail!("nothing to update; pass --gpa and/or --credits");
            }
            if let Some(value) = gpa {
                let status = store.update_gpa(&name, &value)?;
                report_status(&status, &format!("Updated GPA of \"{name}\"."));
            }
            if let Some(value) = credits {
                let status = store.update_credits(&name, &value)?;
                report_status(&status, &format!("Updated credits of \"{name}\"."));
            }
        }
        SimpleAction::Show { format } => match format.as_str() {
            "json" => {
                let value = json!({
                    "semesters": store.semesters(),
                    "years": store.yearly_breakdown(),
                    "result": store.cgpa(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            "table" => print_table(&store),
            other => bail!("unknown format \"{other}\" (expected table or json)"),
        },
        SimpleAction::Reset => {
            let status = store.reset_all();
            report_status(&status, "Removed every semester.");
        }
    }

    Ok(())
}

fn field(value: Option<f64>, show: fn(f64) -> String) -> String {
    value.map(show).unwrap_or_default()
}

fn print_table<P: gradepoint_core::KeyValueStore>(store: &SimpleStore<P>) {
    if store.semesters().is_empty() {
        println!("No semesters yet. Add one with `gradepoint simple add --year 1 --semester 1 --gpa 3.5 --credits 20`.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Semester", "GPA", "Credits", "Counted"]);
    for s in store.semesters() {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(field(s.gpa, gpa)),
            Cell::new(field(s.credits, credits)),
            Cell::new(if SimpleSemester::counted(s).is_some() { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");

    let years = store.yearly_breakdown();
    if !years.is_empty() {
        println!();
        for year in &years {
            println!(
                "{}: GPA {} over {} credits",
                year.year,
                gpa(year.gpa),
                credits(year.total_credits)
            );
        }
    }

    let result = store.cgpa();
    println!(
        "\nCGPA: {} ({} credits, {} semester(s))",
        gpa(result.cgpa),
        credits(result.total_credits),
        result.total_semesters
    );
}
