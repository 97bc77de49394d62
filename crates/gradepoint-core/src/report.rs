//! Result summaries for display and JSON output.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{self, CgpaResult, GpaBand, Progress, SemesterSummary, YearSummary};
use crate::model::{Curriculum, GradeMap, Overrides};

/// Every derived figure of one dataset at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsSummary {
    /// Persistence key of the dataset the figures came from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub cgpa: CgpaResult,
    pub band: GpaBand,
    pub progress: Progress,
    /// Semesters with at least one earned credit.
    pub filled_semesters: usize,
    pub semesters: Vec<SemesterSummary>,
    pub years: Vec<YearSummary>,
    /// Letter counts, best grade first.
    pub distribution: Vec<(String, usize)>,
}

impl ResultsSummary {
    pub fn compute(source: &str, curriculum: &Curriculum, grades: &GradeMap, overrides: &Overrides) -> Self {
        let semesters = engine::semester_summaries(&curriculum.semesters, grades, Some(overrides));
        let cgpa = engine::cgpa(&curriculum.semesters, grades, Some(overrides));
        let distribution = engine::ordered_distribution(&engine::grade_distribution(grades));

        Self {
            source: source.to_string(),
            generated_at: Utc::now(),
            band: GpaBand::of(cgpa.cgpa),
            cgpa,
            progress: engine::progress(&curriculum.semesters, grades),
            filled_semesters: engine::filled_semesters(&semesters),
            years: engine::year_breakdown(&semesters),
            semesters,
            distribution,
        }
    }

    /// Save the summary to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize summary")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        Ok(())
    }

    /// Load a summary from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read summary from {}", path.display()))?;
        let summary: ResultsSummary =
            serde_json::from_str(&content).context("failed to parse summary JSON")?;
        Ok(summary)
    }

    /// Format the summary as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**CGPA:** {:.2} ({}), {} of {} credits earned\n\n",
            self.cgpa.cgpa, self.band, self.cgpa.credits_earned, self.cgpa.credits_possible
        ));
        md.push_str(&format!(
            "**Progress:** {}/{} courses graded ({:.0}%)\n\n",
            self.progress.graded, self.progress.total, self.progress.percent
        ));

        if !self.semesters.is_empty() {
            md.push_str("| Semester | GPA | Attempted | Earned | Mode |\n");
            md.push_str("|----------|-----|-----------|--------|------|\n");
            for s in &self.semesters {
                md.push_str(&format!(
                    "| {} {} | {:.2} | {} | {} | {} |\n",
                    s.year,
                    s.label,
                    s.result.gpa,
                    s.result.credits_attempted,
                    s.result.credits_earned,
                    if s.manual { "manual" } else { "course-wise" }
                ));
            }
            md.push('\n');
        }

        if !self.distribution.is_empty() {
            let parts: Vec<String> = self
                .distribution
                .iter()
                .map(|(label, count)| format!("{label}: {count}"))
                .collect();
            md.push_str(&format!("**Grades:** {}\n", parts.join(", ")));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Course, CourseKind, Grade, GradeEntry, Semester};

    fn sample() -> (Curriculum, GradeMap, Overrides) {
        let mut first = Semester::from_indices(1, 1);
        first.courses = vec![
            Course::new("A", "Course A", 3.0, CourseKind::Theory),
            Course::new("B", "Course B", 1.5, CourseKind::Lab),
        ];
        let mut second = Semester::from_indices(1, 2);
        second.courses = vec![Course::new("C", "Course C", 3.0, CourseKind::Theory)];

        let grades: GradeMap = [
            ("A", GradeEntry::from(Grade::A)),
            ("B", GradeEntry::from(Grade::AMinus)),
        ]
        .into_iter()
        .collect();
        (Curriculum::new(vec![first, second]), grades, Overrides::default())
    }

    #[test]
    fn compute_collects_every_figure() {
        let (curriculum, grades, overrides) = sample();
        let summary = ResultsSummary::compute("custom-cgpa-data", &curriculum, &grades, &overrides);

        assert!((summary.cgpa.cgpa - 3.6667).abs() < 1e-4);
        assert_eq!(summary.cgpa.credits_possible, 7.5);
        assert_eq!(summary.band, GpaBand::Excellent);
        assert_eq!(summary.progress.graded, 2);
        assert_eq!(summary.progress.total, 3);
        assert_eq!(summary.filled_semesters, 1);
        assert_eq!(summary.years.len(), 1);
        assert_eq!(
            summary.distribution,
            vec![("A".to_string(), 1), ("A-".to_string(), 1)]
        );
    }

    #[test]
    fn json_roundtrip() {
        let (curriculum, grades, overrides) = sample();
        let summary = ResultsSummary::compute("k", &curriculum, &grades, &overrides);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/summary.json");
        summary.save_json(&path).unwrap();
        let loaded = ResultsSummary::load_json(&path).unwrap();
        assert_eq!(loaded.source, "k");
        assert_eq!(loaded.generated_at, summary.generated_at);
        assert!((loaded.cgpa.cgpa - summary.cgpa.cgpa).abs() < 1e-12);
        assert_eq!(loaded.semesters.len(), 2);
        assert_eq!(loaded.distribution, summary.distribution);
    }

    #[test]
    fn markdown_output() {
        let (curriculum, grades, overrides) = sample();
        let md = ResultsSummary::compute("k", &curriculum, &grades, &overrides).to_markdown();
        assert!(md.contains("**CGPA:** 3.67"));
        assert!(md.contains("| 1st Year 1st Semester | 3.67 |"));
        assert!(md.contains("A-: 1"));
    }
}
