//! The `gradepoint elective` command.

use anyhow::{bail, Context as _, Result};
use comfy_table::{Cell, Table};
use gradepoint_core::GradeStore;

use super::{credits, report_status, Context};

pub fn execute(ctx: &Context, dept: Option<String>, slot: &str, choice: Option<String>) -> Result<()> {
    let code = ctx
        .department_code(dept.as_deref())
        .context("choose a department with --dept <CODE>")?;
    let department = ctx.department(code)?;
    let slot = slot.trim().to_uppercase();

    let options = department.elective_options(&slot);
    let Some(choice) = choice else {
        if options.is_empty() {
            println!("{} offers no electives.", department.code);
            return Ok(());
        }
        let mut table = Table::new();
        table.set_header(vec!["Code", "Course", "Credit", "Type"]);
        for course in &options {
            table.add_row(vec![
                Cell::new(&course.code),
                Cell::new(&course.name),
                Cell::new(credits(course.credit_weight)),
                Cell::new(course.kind),
            ]);
        }
        println!("Options for {slot}:\n");
        println!("{table}");
        return Ok(());
    };

    let choice = options
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(choice.trim()))
        .map(|c| c.code.clone())
        .unwrap_or_else(|| choice.trim().to_string());
    let mut store = GradeStore::for_department(ctx.port(), department);
    let is_slot = store
        .curriculum()
        .and_then(|c| c.find_course(&slot))
        .is_some_and(|(_, course)| course.is_elective_slot());
    if !is_slot {
        bail!("\"{slot}\" is not an elective slot of {}", department.code);
    }
    if !department.is_legal_elective(&slot, &choice) {
        bail!("\"{choice}\" is not an option for {slot}; run `gradepoint elective --dept {} {slot}` to list them", department.code);
    }

    let status = store.set_elective(&slot, &choice);
    report_status(&status, &format!("{slot}: {choice}"));
    Ok(())
}
