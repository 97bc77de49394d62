//! The `gradepoint setup` command: authoring the custom curriculum.

use anyhow::{anyhow, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};

use gradepoint_core::{CourseKind, GradeStore};

use super::{credits, report_status, Context};

#[derive(Debug, Subcommand)]
pub enum SetupAction {
    /// Add an empty semester
    AddSemester {
        /// Year (1-9)
        year: u8,
        /// Semester within the year (1-9)
        semester: u8,
    },

    /// Remove a semester and its courses
    RemoveSemester {
        /// Semester code (e.g. 12)
        code: String,
    },

    /// Add a course to a semester
    AddCourse {
        /// Semester code (e.g. 11)
        semester: String,
        /// Course code, unique across the curriculum
        code: String,
        /// Course name
        name: String,
        /// Credit weight (0.5 - 10)
        credit: String,
        /// theory, lab or special
        #[arg(long, default_value = "theory")]
        kind: String,
    },

    /// Remove a course from a semester
    RemoveCourse {
        /// Semester code
        semester: String,
        /// Course code
        code: String,
    },

    /// Print the curriculum and check it is ready for grading
    Check,
}

pub fn execute(ctx: &Context, action: SetupAction) -> Result<()> {
    let mut store = GradeStore::custom(ctx.port());

    match action {
        SetupAction::AddSemester { year, semester } => {
            let status = store.add_semester(year, semester)?;
            report_status(&status, &format!("Added semester {year}{semester}."));
        }
        SetupAction::RemoveSemester { code } => {
            let status = store.remove_semester(code.trim())?;
            report_status(&status, &format!("Removed semester {}.", code.trim()));
        }
        SetupAction::AddCourse {
            semester,
            code,
            name,
            credit,
            kind,
        } => {
            let kind: CourseKind = kind.parse().map_err(|e: String| anyhow!(e))?;
            let status = store.add_course(semester.trim(), &code, &name, &credit, kind)?;
            report_status(
                &status,
                &format!("Added {} to semester {}.", code.trim().to_uppercase(), semester.trim()),
            );
        }
        SetupAction::RemoveCourse { semester, code } => {
            let code = code.trim().to_uppercase();
            let status = store.remove_course(semester.trim(), &code)?;
            report_status(&status, &format!("Removed {code} from semester {}.", semester.trim()));
        }
        SetupAction::Check => {
            print_structure(&store);
            store.check_ready()?;
            println!("\nCurriculum is ready for grading.");
        }
    }

    Ok(())
}

fn print_structure(store: &GradeStore<gradepoint_core::FileStore>) {
    let Some(curriculum) = store.book().structure.as_ref() else {
        println!("No custom curriculum yet.");
        return;
    };

    let mut table = Table::new();
    table.set_header(vec!["Semester", "Code", "Course", "Credit", "Type"]);
    for semester in &curriculum.semesters {
        if semester.courses.is_empty() {
            table.add_row(vec![
                Cell::new(&semester.code),
                Cell::new("-"),
                Cell::new("(no courses)"),
                Cell::new(""),
                Cell::new(""),
            ]);
        }
        for course in &semester.courses {
            table.add_row(vec![
                Cell::new(&semester.code),
                Cell::new(&course.code),
                Cell::new(&course.name),
                Cell::new(credits(course.credit_weight)),
                Cell::new(course.kind),
            ]);
        }
    }
    println!("{table}");
    println!(
        "\n{} semester(s), {} course(s), {} credits",
        curriculum.semesters.len(),
        curriculum.course_count(),
        credits(curriculum.total_credits())
    );
}
