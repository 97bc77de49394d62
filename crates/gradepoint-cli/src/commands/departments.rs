//! The `gradepoint departments` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::{credits, Context};

pub fn execute(ctx: &Context) -> Result<()> {
    let departments = ctx.catalog.departments();
    if departments.is_empty() {
        println!("No departments in the catalog.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Code", "Department", "Semesters", "Credits", "Electives"]);

    for dept in departments {
        let (semesters, total) = match dept.curriculum() {
            Some(curriculum) => (
                curriculum.semesters.len().to_string(),
                credits(curriculum.total_credits()),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        let electives: usize = dept.electives.iter().map(|g| g.courses.len()).sum();
        table.add_row(vec![
            Cell::new(&dept.code),
            Cell::new(&dept.name),
            Cell::new(semesters),
            Cell::new(total),
            Cell::new(electives),
        ]);
    }

    println!("{table}");
    if departments.iter().any(|d| !d.has_curriculum()) {
        println!("\nDepartments marked \"-\" have not published a curriculum yet.");
    }
    Ok(())
}
