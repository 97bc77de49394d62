//! The `gradepoint manual` command.

use anyhow::{bail, Result};

use gradepoint_core::validation::parse_gpa;
use gradepoint_core::SemesterMode;

use super::{gpa, report_status, Context, Target};

pub fn execute(ctx: &Context, target: &Target, semester: &str, value: Option<String>, off: bool) -> Result<()> {
    let mut store = ctx.grade_store(target)?;
    let semester = semester.trim();
    if store.semester_result(semester).is_none() {
        bail!("unknown semester \"{semester}\"");
    }

    // Checked before anything changes: entering manual mode clears grades.
    let value = value.as_deref().map(parse_gpa).transpose()?;

    if off {
        let status = store.exit_manual_mode(semester);
        report_status(&status, &format!("Semester {semester} is graded course by course again."));
        return Ok(());
    }

    if store.mode(semester) == SemesterMode::CourseWise {
        let status = store.enter_manual_mode(semester);
        let seeded = store.overrides().manual_gpa(semester).unwrap_or(0.0);
        report_status(
            &status,
            &format!("Semester {semester} now uses a manual GPA (starting at {}).", gpa(seeded)),
        );
    } else if value.is_none() {
        let current = store.overrides().manual_gpa(semester).unwrap_or(0.0);
        println!("Semester {semester} already uses a manual GPA ({}).", gpa(current));
    }

    if let Some(value) = value {
        let status = store.set_manual_gpa(semester, value);
        let stored = store.overrides().manual_gpa(semester).unwrap_or(0.0);
        report_status(&status, &format!("Manual GPA for semester {semester}: {}", gpa(stored)));
    }

    Ok(())
}
