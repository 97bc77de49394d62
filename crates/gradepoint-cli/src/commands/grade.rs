//! The `gradepoint grade` command.

use anyhow::{bail, Result};

use gradepoint_core::{Curriculum, Grade, GradeEntry, SemesterMode};

use super::{report_status, show::grade_label, Context, Target};

/// Read a grade argument: a letter, `skip` to exclude, `clear` to unset.
pub fn parse_entry(input: &str) -> Result<GradeEntry> {
    match input.trim().to_lowercase().as_str() {
        "skip" | "exclude" => Ok(GradeEntry::Excluded),
        "clear" | "none" => Ok(GradeEntry::Ungraded),
        _ => Ok(input.parse::<Grade>()?.into()),
    }
}

/// Find a course by code, ignoring case. Returns its semester code and exact course code.
pub fn resolve_course(curriculum: &Curriculum, input: &str) -> Option<(String, String)> {
    let input = input.trim();
    curriculum.semesters.iter().find_map(|semester| {
        semester
            .courses
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(input))
            .map(|c| (semester.code.clone(), c.code.clone()))
    })
}

pub fn execute(ctx: &Context, target: &Target, course: &str, grade: &str) -> Result<()> {
    let entry = parse_entry(grade)?;
    let mut store = ctx.grade_store(target)?;
    let Some((semester, course)) = store.curriculum().and_then(|c| resolve_course(c, course)) else {
        bail!("unknown course \"{}\"", course.trim());
    };
    if store.mode(&semester) == SemesterMode::Manual {
        bail!(
            "semester {semester} uses a manual GPA; switch back with `gradepoint manual {semester} --off` first"
        );
    }

    let status = store.set_grade(&course, entry);
    report_status(&status, &format!("{course}: {}", grade_label(entry)));
    Ok(())
}
