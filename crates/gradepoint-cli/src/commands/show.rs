//! The `gradepoint show` command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use comfy_table::{Cell, Table};

use gradepoint_core::{Department, FileStore, Grade, GradeEntry, GradeStore, ResultsSummary, SemesterMode};

use super::{credits, gpa, store_title, Context, Target};

pub fn execute(
    ctx: &Context,
    target: &Target,
    semester: Option<String>,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = ctx.grade_store(target)?;
    let department = if store.is_custom() {
        None
    } else {
        ctx.department_code(target.dept.as_deref())
            .and_then(|code| ctx.catalog.department(code))
    };

    if store.curriculum().is_none() {
        if store.is_custom() {
            println!("No custom curriculum yet. Start with `gradepoint setup add-semester 1 1`.");
        } else {
            println!("{} has not published a curriculum yet.", store_title(ctx, &store));
        }
        return Ok(());
    }

    if let Some(code) = semester {
        return show_semester(&store, department, &code);
    }

    let summary = store.summary();

    if let Some(path) = &output {
        summary.save_json(path)?;
        eprintln!("Summary written to {}", path.display());
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "markdown" | "md" => println!("{}", summary.to_markdown()),
        "table" => print_table(&store_title(ctx, &store), &summary),
        other => anyhow::bail!("unknown format \"{other}\" (expected table, json or markdown)"),
    }

    Ok(())
}

fn print_table(title: &str, summary: &ResultsSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Code", "Semester", "GPA", "Attempted", "Earned", "Possible", "Mode"]);

    for s in &summary.semesters {
        table.add_row(vec![
            Cell::new(&s.code),
            Cell::new(format!("{} {}", s.year, s.label)),
            Cell::new(gpa(s.result.gpa)),
            Cell::new(credits(s.result.credits_attempted)),
            Cell::new(credits(s.result.credits_earned)),
            Cell::new(credits(s.credits_possible)),
            Cell::new(if s.manual { "manual" } else { "course-wise" }),
        ]);
    }

    println!("{title}\n");
    println!("{table}");

    if !summary.years.is_empty() {
        let years: Vec<String> = summary
            .years
            .iter()
            .map(|y| format!("{} {}", y.year, gpa(y.gpa)))
            .collect();
        println!("\nYears: {}", years.join(" | "));
    }

    println!(
        "\nCGPA: {} ({})  Credits: {} earned / {} attempted / {} total",
        gpa(summary.cgpa.cgpa),
        summary.band,
        credits(summary.cgpa.credits_earned),
        credits(summary.cgpa.credits_attempted),
        credits(summary.cgpa.credits_possible),
    );
    println!(
        "Progress: {}/{} courses graded ({:.0}%), {} semester(s) with results",
        summary.progress.graded, summary.progress.total, summary.progress.percent, summary.filled_semesters
    );

    if !summary.distribution.is_empty() {
        let parts: Vec<String> = summary
            .distribution
            .iter()
            .map(|(label, count)| format!("{label}: {count}"))
            .collect();
        println!("Grades: {}", parts.join(", "));
    }
}

fn show_semester(store: &GradeStore<FileStore>, department: Option<&Department>, code: &str) -> Result<()> {
    let semester = store
        .curriculum()
        .and_then(|c| c.semester(code))
        .with_context(|| format!("unknown semester \"{code}\""))?;
    let result = store
        .semester_result(code)
        .with_context(|| format!("unknown semester \"{code}\""))?;
    let manual = store.mode(code) == SemesterMode::Manual;

    let mut table = Table::new();
    table.set_header(vec!["Code", "Course", "Credit", "Type", "Grade", "Elective choice"]);
    for course in &semester.courses {
        let choice = store
            .elective(&course.code)
            .map(|choice| {
                match department.and_then(|d| d.elective_course(choice)) {
                    Some(option) => format!("{choice} {}", option.name),
                    None => choice.to_string(),
                }
            })
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&course.code),
            Cell::new(&course.name),
            Cell::new(credits(course.credit_weight)),
            Cell::new(course.kind),
            Cell::new(grade_label(store.grade(&course.code))),
            Cell::new(choice),
        ]);
    }

    println!("{} {} ({})\n", semester.display_year, semester.display_label, semester.code);
    println!("{table}");
    if manual {
        let entered = store.overrides().manual_gpa(code).unwrap_or(0.0);
        println!("\nManual GPA: {}", gpa(entered));
    }
    println!(
        "\nGPA: {}  Credits: {} earned / {} attempted / {} total",
        gpa(result.gpa),
        credits(result.credits_earned),
        credits(result.credits_attempted),
        credits(semester.total_credits()),
    );
    Ok(())
}

/// How a grade entry reads in a table cell.
pub fn grade_label(entry: GradeEntry) -> String {
    match entry {
        GradeEntry::Ungraded => "-".to_string(),
        GradeEntry::Excluded => "skipped".to_string(),
        GradeEntry::Graded(points) => match Grade::from_points(points) {
            Some(grade) => grade.label().to_string(),
            None => format!("{points:.2}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_labels() {
        assert_eq!(grade_label(GradeEntry::Ungraded), "-");
        assert_eq!(grade_label(GradeEntry::Excluded), "skipped");
        assert_eq!(grade_label(Grade::AMinus.into()), "A-");
        assert_eq!(grade_label(GradeEntry::Graded(3.1)), "3.10");
    }
}
