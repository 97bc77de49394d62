//! GPA aggregation engine.
//!
//! Pure functions from a curriculum slice plus the current grade and
//! override state to derived figures. Nothing here holds state or rounds:
//! callers format for display.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Course, Grade, GradeMap, Overrides, Semester};

/// GPA and credit totals of one semester.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SemesterResult {
    pub gpa: f64,
    pub credits_attempted: f64,
    pub credits_earned: f64,
}

/// Cumulative figures over a whole curriculum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CgpaResult {
    pub cgpa: f64,
    pub credits_attempted: f64,
    pub credits_earned: f64,
    /// Credit sum of the entire curriculum, graded or not.
    pub credits_possible: f64,
}

/// Running weighted sums.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    points: f64,
    attempted: f64,
    earned: f64,
}

impl Tally {
    fn add_courses(&mut self, courses: &[Course], grades: &GradeMap) {
        for course in courses {
            let Some(points) = grades.get(&course.code).points() else {
                continue;
            };
            self.attempted += course.credit_weight;
            self.points += points * course.credit_weight;
            if points > 0.0 {
                self.earned += course.credit_weight;
            }
        }
    }

    fn add_manual(&mut self, gpa: f64, credits: f64) {
        self.attempted += credits;
        self.earned += credits;
        self.points += gpa * credits;
    }

    fn average(&self) -> f64 {
        if self.attempted > 0.0 {
            self.points / self.attempted
        } else {
            0.0
        }
    }
}

/// Compute the GPA of one semester.
///
/// When `semester_code` has an active override its manual GPA stands in for
/// every course grade: a value above zero counts the full credit load as
/// attempted and earned, zero or below leaves the semester ungraded.
pub fn semester_gpa(
    courses: &[Course],
    grades: &GradeMap,
    semester_code: Option<&str>,
    overrides: Option<&Overrides>,
) -> SemesterResult {
    let manual = semester_code
        .zip(overrides)
        .and_then(|(code, overrides)| overrides.active_gpa(code));

    if let Some(gpa) = manual {
        if gpa <= 0.0 {
            return SemesterResult::default();
        }
        let total: f64 = courses.iter().map(|c| c.credit_weight).sum();
        return SemesterResult {
            gpa,
            credits_attempted: total,
            credits_earned: total,
        };
    }

    let mut tally = Tally::default();
    tally.add_courses(courses, grades);
    SemesterResult {
        gpa: tally.average(),
        credits_attempted: tally.attempted,
        credits_earned: tally.earned,
    }
}

/// Compute the cumulative GPA over every semester.
pub fn cgpa(semesters: &[Semester], grades: &GradeMap, overrides: Option<&Overrides>) -> CgpaResult {
    let mut tally = Tally::default();
    let mut possible = 0.0;

    for semester in semesters {
        let total = semester.total_credits();
        possible += total;

        match overrides.and_then(|o| o.active_gpa(&semester.code)) {
            Some(gpa) if gpa <= 0.0 => {}
            Some(gpa) => tally.add_manual(gpa, total),
            None => tally.add_courses(&semester.courses, grades),
        }
    }

    CgpaResult {
        cgpa: tally.average(),
        credits_attempted: tally.attempted,
        credits_earned: tally.earned,
        credits_possible: possible,
    }
}

/// Count recorded grades by letter.
///
/// Excluded entries are skipped. A value that is not on the scale is
/// counted under its numeric text.
pub fn grade_distribution(grades: &GradeMap) -> BTreeMap<String, usize> {
    let mut dist = BTreeMap::new();
    for (_, entry) in grades.iter() {
        let Some(points) = entry.points() else {
            continue;
        };
        let label = Grade::from_points(points)
            .map(|g| g.label().to_string())
            .unwrap_or_else(|| points.to_string());
        *dist.entry(label).or_insert(0) += 1;
    }
    dist
}

/// Distribution entries ordered best grade first, off-scale labels last.
pub fn ordered_distribution(dist: &BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let rank = |label: &str| {
        label
            .parse::<Grade>()
            .map(|g| g as usize)
            .unwrap_or(usize::MAX)
    };
    let mut entries: Vec<(String, usize)> = dist.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| rank(&a.0).cmp(&rank(&b.0)).then_with(|| a.0.cmp(&b.0)));
    entries
}

/// Per-semester row used by the dashboard-style summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterSummary {
    pub code: String,
    pub year: String,
    pub label: String,
    pub result: SemesterResult,
    pub credits_possible: f64,
    pub manual: bool,
}

pub fn semester_summaries(
    semesters: &[Semester],
    grades: &GradeMap,
    overrides: Option<&Overrides>,
) -> Vec<SemesterSummary> {
    semesters
        .iter()
        .map(|sem| SemesterSummary {
            code: sem.code.clone(),
            year: sem.display_year.clone(),
            label: sem.display_label.clone(),
            result: semester_gpa(&sem.courses, grades, Some(&sem.code), overrides),
            credits_possible: sem.total_credits(),
            manual: overrides.is_some_and(|o| o.is_active(&sem.code)),
        })
        .collect()
}

/// Figures for one academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: String,
    pub gpa: f64,
    pub credits_attempted: f64,
    pub credits_earned: f64,
    pub credits_possible: f64,
    pub semester_codes: Vec<String>,
}

/// Group semester rows by display year, in order of first appearance.
///
/// The year GPA weights each semester GPA by that semester's attempted
/// credits, so manual semesters weigh in with their full load.
pub fn year_breakdown(summaries: &[SemesterSummary]) -> Vec<YearSummary> {
    let mut years: Vec<YearSummary> = Vec::new();
    let mut points: Vec<f64> = Vec::new();

    for row in summaries {
        let idx = match years.iter().position(|y| y.year == row.year) {
            Some(idx) => idx,
            None => {
                years.push(YearSummary {
                    year: row.year.clone(),
                    gpa: 0.0,
                    credits_attempted: 0.0,
                    credits_earned: 0.0,
                    credits_possible: 0.0,
                    semester_codes: Vec::new(),
                });
                points.push(0.0);
                years.len() - 1
            }
        };
        let year = &mut years[idx];
        year.credits_attempted += row.result.credits_attempted;
        year.credits_earned += row.result.credits_earned;
        year.credits_possible += row.credits_possible;
        year.semester_codes.push(row.code.clone());
        points[idx] += row.result.gpa * row.result.credits_attempted;
    }

    for (year, pts) in years.iter_mut().zip(points) {
        if year.credits_attempted > 0.0 {
            year.gpa = pts / year.credits_attempted;
        }
    }
    years
}

/// Semesters with at least one earned credit.
pub fn filled_semesters(summaries: &[SemesterSummary]) -> usize {
    summaries
        .iter()
        .filter(|s| s.result.credits_earned > 0.0)
        .count()
}

/// How much of the curriculum has a grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub graded: usize,
    pub total: usize,
    pub percent: f64,
}

pub fn progress(semesters: &[Semester], grades: &GradeMap) -> Progress {
    let mut graded = 0;
    let mut total = 0;
    for course in semesters.iter().flat_map(|s| &s.courses) {
        total += 1;
        if grades.get(&course.code).points().is_some() {
            graded += 1;
        }
    }
    let percent = if total > 0 {
        graded as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    Progress {
        graded,
        total,
        percent,
    }
}

/// Coarse standing of a GPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpaBand {
    Outstanding,
    Excellent,
    Good,
    Satisfactory,
    Poor,
}

impl GpaBand {
    pub fn of(gpa: f64) -> Self {
        if gpa >= 3.75 {
            GpaBand::Outstanding
        } else if gpa >= 3.25 {
            GpaBand::Excellent
        } else if gpa >= 2.75 {
            GpaBand::Good
        } else if gpa >= 2.0 {
            GpaBand::Satisfactory
        } else {
            GpaBand::Poor
        }
    }
}

impl fmt::Display for GpaBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpaBand::Outstanding => write!(f, "outstanding"),
            GpaBand::Excellent => write!(f, "excellent"),
            GpaBand::Good => write!(f, "good"),
            GpaBand::Satisfactory => write!(f, "satisfactory"),
            GpaBand::Poor => write!(f, "poor"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseKind, GradeEntry};

    fn course(code: &str, credit: f64) -> Course {
        Course::new(code, code, credit, CourseKind::Theory)
    }

    fn semester(code: &str, year: &str, courses: Vec<Course>) -> Semester {
        Semester {
            display_year: year.into(),
            display_label: "1st Semester".into(),
            code: code.into(),
            courses,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn two_course_weighted_gpa() {
        let courses = vec![course("A", 3.0), course("B", 1.5)];
        let grades: GradeMap = [
            ("A", GradeEntry::from(Grade::A)),
            ("B", GradeEntry::from(Grade::AMinus)),
        ]
        .into_iter()
        .collect();
        let r = semester_gpa(&courses, &grades, None, None);
        assert!(approx(r.gpa, (3.75 * 3.0 + 3.5 * 1.5) / 4.5));
        assert!((r.gpa - 3.6667).abs() < 1e-4);
        assert_eq!(r.credits_attempted, 4.5);
        assert_eq!(r.credits_earned, 4.5);
    }

    #[test]
    fn failing_grade_attempted_not_earned() {
        let courses = vec![course("A", 3.0), course("B", 1.5)];
        let grades: GradeMap = [("B", GradeEntry::Graded(0.0))].into_iter().collect();
        let r = semester_gpa(&courses, &grades, None, None);
        assert_eq!(r.gpa, 0.0);
        assert_eq!(r.credits_attempted, 1.5);
        assert_eq!(r.credits_earned, 0.0);
    }

    #[test]
    fn excluded_and_ungraded_contribute_nothing() {
        let courses = vec![course("A", 3.0), course("B", 1.5)];
        let grades: GradeMap = [("A", GradeEntry::Excluded)].into_iter().collect();
        assert_eq!(semester_gpa(&courses, &grades, None, None), SemesterResult::default());
    }

    #[test]
    fn all_top_grades_give_exactly_four() {
        let courses = vec![course("A", 3.0), course("B", 1.5), course("C", 0.75)];
        let grades: GradeMap = courses
            .iter()
            .map(|c| (c.code.clone(), GradeEntry::from(Grade::APlus)))
            .collect();
        let r = semester_gpa(&courses, &grades, None, None);
        assert_eq!(r.gpa, 4.0);
        assert_eq!(r.credits_earned, r.credits_attempted);
    }

    #[test]
    fn active_override_supersedes_grades() {
        let courses = vec![course("A", 3.0), course("B", 1.5)];
        let grades: GradeMap = [("A", GradeEntry::Graded(2.0))].into_iter().collect();
        let mut overrides = Overrides::default();
        overrides.manual_gpas.insert("11".into(), 3.4);
        overrides.active.insert("11".into(), true);

        let r = semester_gpa(&courses, &grades, Some("11"), Some(&overrides));
        assert_eq!(r.gpa, 3.4);
        assert_eq!(r.credits_attempted, 4.5);
        assert_eq!(r.credits_earned, 4.5);

        overrides.manual_gpas.insert("11".into(), 0.0);
        let r = semester_gpa(&courses, &grades, Some("11"), Some(&overrides));
        assert_eq!(r, SemesterResult::default());
    }

    #[test]
    fn inactive_override_is_ignored() {
        let courses = vec![course("A", 3.0)];
        let grades: GradeMap = [("A", GradeEntry::Graded(3.0))].into_iter().collect();
        let mut overrides = Overrides::default();
        overrides.manual_gpas.insert("11".into(), 4.0);
        let r = semester_gpa(&courses, &grades, Some("11"), Some(&overrides));
        assert_eq!(r.gpa, 3.0);
    }

    #[test]
    fn cgpa_skips_zero_manual_semester() {
        let semesters = vec![
            semester("11", "1st Year", vec![course("A", 3.0), course("B", 1.5)]),
            semester("12", "1st Year", vec![course("C", 3.0), course("D", 3.0)]),
        ];
        let grades: GradeMap = [
            ("C", GradeEntry::from(Grade::B)),
            ("D", GradeEntry::from(Grade::A)),
        ]
        .into_iter()
        .collect();
        let mut overrides = Overrides::default();
        overrides.manual_gpas.insert("11".into(), 0.0);
        overrides.active.insert("11".into(), true);

        let total = cgpa(&semesters, &grades, Some(&overrides));
        let second = semester_gpa(&semesters[1].courses, &grades, Some("12"), Some(&overrides));
        assert!(approx(total.cgpa, second.gpa));
        assert_eq!(total.credits_attempted, 6.0);
        assert_eq!(total.credits_possible, 10.5);
    }

    #[test]
    fn cgpa_mixes_manual_and_course_wise() {
        let semesters = vec![
            semester("11", "1st Year", vec![course("A", 4.0)]),
            semester("12", "1st Year", vec![course("B", 2.0)]),
        ];
        let grades: GradeMap = [("B", GradeEntry::Graded(0.0))].into_iter().collect();
        let mut overrides = Overrides::default();
        overrides.manual_gpas.insert("11".into(), 3.0);
        overrides.active.insert("11".into(), true);

        let r = cgpa(&semesters, &grades, Some(&overrides));
        assert!(approx(r.cgpa, 12.0 / 6.0));
        assert_eq!(r.credits_attempted, 6.0);
        assert_eq!(r.credits_earned, 4.0);
        assert_eq!(r.credits_possible, 6.0);
    }

    #[test]
    fn nothing_graded_is_all_zero() {
        let semesters = vec![semester("11", "1st Year", vec![course("A", 3.0)])];
        let r = cgpa(&semesters, &GradeMap::new(), None);
        assert_eq!(r.cgpa, 0.0);
        assert_eq!(r.credits_attempted, 0.0);
        assert_eq!(r.credits_earned, 0.0);
        assert_eq!(r.credits_possible, 3.0);
    }

    #[test]
    fn distribution_counts_by_label() {
        let grades: GradeMap = [
            ("A", GradeEntry::Graded(4.0)),
            ("B", GradeEntry::Graded(4.0)),
            ("C", GradeEntry::Graded(0.0)),
            ("D", GradeEntry::Excluded),
            ("E", GradeEntry::Graded(3.1)),
        ]
        .into_iter()
        .collect();
        let dist = grade_distribution(&grades);
        assert_eq!(dist.get("A+"), Some(&2));
        assert_eq!(dist.get("F"), Some(&1));
        assert_eq!(dist.get("3.1"), Some(&1));
        assert_eq!(dist.len(), 3);

        let ordered = ordered_distribution(&dist);
        assert_eq!(ordered[0].0, "A+");
        assert_eq!(ordered[1].0, "F");
        assert_eq!(ordered[2].0, "3.1");
    }

    #[test]
    fn year_breakdown_weights_by_attempted_credits() {
        let semesters = vec![
            semester("11", "1st Year", vec![course("A", 3.0)]),
            semester("12", "1st Year", vec![course("B", 1.0)]),
            semester("21", "2nd Year", vec![course("C", 2.0)]),
        ];
        let grades: GradeMap = [
            ("A", GradeEntry::Graded(4.0)),
            ("B", GradeEntry::Graded(2.0)),
        ]
        .into_iter()
        .collect();
        let rows = semester_summaries(&semesters, &grades, None);
        let years = year_breakdown(&rows);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, "1st Year");
        assert!(approx(years[0].gpa, 14.0 / 4.0));
        assert_eq!(years[0].semester_codes, vec!["11", "12"]);
        assert_eq!(years[1].gpa, 0.0);
        assert_eq!(years[1].credits_possible, 2.0);
        assert_eq!(filled_semesters(&rows), 2);
    }

    #[test]
    fn progress_counts_graded_courses_only() {
        let semesters = vec![semester(
            "11",
            "1st Year",
            vec![course("A", 3.0), course("B", 3.0), course("C", 3.0), course("D", 3.0)],
        )];
        let grades: GradeMap = [
            ("A", GradeEntry::Graded(3.0)),
            ("B", GradeEntry::Graded(0.0)),
            ("C", GradeEntry::Excluded),
        ]
        .into_iter()
        .collect();
        let p = progress(&semesters, &grades);
        assert_eq!(p.graded, 2);
        assert_eq!(p.total, 4);
        assert_eq!(p.percent, 50.0);
        assert_eq!(progress(&[], &grades).percent, 0.0);
    }

    #[test]
    fn gpa_bands() {
        assert_eq!(GpaBand::of(4.0), GpaBand::Outstanding);
        assert_eq!(GpaBand::of(3.5), GpaBand::Excellent);
        assert_eq!(GpaBand::of(2.75), GpaBand::Good);
        assert_eq!(GpaBand::of(2.0), GpaBand::Satisfactory);
        assert_eq!(GpaBand::of(1.99), GpaBand::Poor);
    }
}
