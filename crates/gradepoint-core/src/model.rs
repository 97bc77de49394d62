//! Core data model types for gradepoint.
//!
//! These are the fundamental types the engine and the store share: the
//! curriculum structure (courses grouped into semesters), the fixed grade
//! scale, the three-state grade map, and per-semester GPA overrides.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Code prefix reserved for elective slots.
pub const ELECTIVE_PREFIX: &str = "ELECTIVE";

/// Kind of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseKind {
    Theory,
    Lab,
    Special,
}

impl fmt::Display for CourseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseKind::Theory => write!(f, "theory"),
            CourseKind::Lab => write!(f, "lab"),
            CourseKind::Special => write!(f, "special"),
        }
    }
}

impl FromStr for CourseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "theory" => Ok(CourseKind::Theory),
            "lab" => Ok(CourseKind::Lab),
            "special" => Ok(CourseKind::Special),
            other => Err(format!("unknown course kind: {other}")),
        }
    }
}

/// A single course of a curriculum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Human-readable course name.
    pub name: String,
    /// Unique code; the join key into the grade map.
    pub code: String,
    /// Credit weight used in weighted averaging.
    #[serde(rename = "credit")]
    pub credit_weight: f64,
    /// Theory, lab or special (project, attachment).
    #[serde(rename = "type")]
    pub kind: CourseKind,
}

impl Course {
    pub fn new(code: impl Into<String>, name: impl Into<String>, credit_weight: f64, kind: CourseKind) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            credit_weight,
            kind,
        }
    }

    /// Whether this course is a placeholder resolved by the user's elective choice.
    pub fn is_elective_slot(&self) -> bool {
        self.code.starts_with(ELECTIVE_PREFIX)
    }
}

/// One semester of a curriculum. Course order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Semester {
    /// Display year, e.g. "1st Year".
    #[serde(rename = "year")]
    pub display_year: String,
    /// Display label, e.g. "2nd Semester".
    #[serde(rename = "semester")]
    pub display_label: String,
    /// Composite code: year index followed by semester index ("12").
    pub code: String,
    #[serde(default)]
    pub courses: Vec<Course>,
}

impl Semester {
    /// Build a semester from its year and semester indices.
    pub fn from_indices(year: u8, semester: u8) -> Self {
        Self {
            display_year: format!("{} Year", ordinal(u32::from(year))),
            display_label: format!("{} Semester", ordinal(u32::from(semester))),
            code: semester_code(year, semester),
            courses: Vec::new(),
        }
    }

    /// Sum of the credit weights of every course in the semester.
    pub fn total_credits(&self) -> f64 {
        self.courses.iter().map(|c| c.credit_weight).sum()
    }

    pub fn course(&self, code: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.code == code)
    }
}

/// Composite semester code from year and semester indices.
pub fn semester_code(year: u8, semester: u8) -> String {
    format!("{year}{semester}")
}

/// English ordinal for a positive number ("1st", "2nd", "11th", "23rd").
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// An ordered sequence of semesters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    #[serde(default)]
    pub semesters: Vec<Semester>,
}

impl Curriculum {
    pub fn new(semesters: Vec<Semester>) -> Self {
        Self { semesters }
    }

    pub fn semester(&self, code: &str) -> Option<&Semester> {
        self.semesters.iter().find(|s| s.code == code)
    }

    /// Find a course anywhere in the curriculum, with the semester holding it.
    pub fn find_course(&self, code: &str) -> Option<(&Semester, &Course)> {
        self.semesters
            .iter()
            .find_map(|s| s.course(code).map(|c| (s, c)))
    }

    pub fn contains_course(&self, code: &str) -> bool {
        self.find_course(code).is_some()
    }

    pub fn course_count(&self) -> usize {
        self.semesters.iter().map(|s| s.courses.len()).sum()
    }

    pub fn total_credits(&self) -> f64 {
        self.semesters.iter().map(Semester::total_credits).sum()
    }

    /// Check that the curriculum can be graded: at least one semester and no
    /// empty semester.
    pub fn check_ready(&self) -> Result<(), ValidationError> {
        if self.semesters.is_empty() {
            return Err(ValidationError::NoSemesters);
        }
        if let Some(empty) = self.semesters.iter().find(|s| s.courses.is_empty()) {
            return Err(ValidationError::EmptySemester(empty.code.clone()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Grade scale
// ---------------------------------------------------------------------------

/// A letter grade of the fixed scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    D,
    F,
}

/// The full scale, best grade first. Points are strictly decreasing.
pub const GRADE_SCALE: [Grade; 10] = [
    Grade::APlus,
    Grade::A,
    Grade::AMinus,
    Grade::BPlus,
    Grade::B,
    Grade::BMinus,
    Grade::CPlus,
    Grade::C,
    Grade::D,
    Grade::F,
];

impl Grade {
    pub fn points(self) -> f64 {
        match self {
            Grade::APlus => 4.0,
            Grade::A => 3.75,
            Grade::AMinus => 3.5,
            Grade::BPlus => 3.25,
            Grade::B => 3.0,
            Grade::BMinus => 2.75,
            Grade::CPlus => 2.5,
            Grade::C => 2.25,
            Grade::D => 2.0,
            Grade::F => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Map a grade-point value back to its letter. Exact match only.
    pub fn from_points(points: f64) -> Option<Grade> {
        GRADE_SCALE.iter().copied().find(|g| g.points() == points)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.label(), self.points())
    }
}

impl FromStr for Grade {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        GRADE_SCALE
            .iter()
            .copied()
            .find(|g| g.label() == wanted)
            .ok_or_else(|| ValidationError::UnknownGrade(s.trim().to_string()))
    }
}

// ---------------------------------------------------------------------------
// Grade map
// ---------------------------------------------------------------------------

/// The grading state of one course.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GradeEntry {
    /// Nothing recorded yet.
    #[default]
    Ungraded,
    /// Explicitly marked as not counted.
    Excluded,
    /// A grade-point value.
    Graded(f64),
}

impl GradeEntry {
    /// Grade-point value when the entry counts toward averages.
    pub fn points(self) -> Option<f64> {
        match self {
            GradeEntry::Graded(points) => Some(points),
            GradeEntry::Ungraded | GradeEntry::Excluded => None,
        }
    }
}

impl From<Grade> for GradeEntry {
    fn from(grade: Grade) -> Self {
        GradeEntry::Graded(grade.points())
    }
}

/// Course code → grade. `Ungraded` is represented by absence.
///
/// Serializes as a JSON object where `null` means excluded and a number is a
/// grade-point value, so the three states survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Option<f64>>", into = "BTreeMap<String, Option<f64>>")]
pub struct GradeMap {
    entries: BTreeMap<String, GradeEntry>,
}

impl GradeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> GradeEntry {
        self.entries.get(code).copied().unwrap_or_default()
    }

    /// Record an entry. Setting `Ungraded` removes the course from the map.
    pub fn set(&mut self, code: impl Into<String>, entry: GradeEntry) {
        let code = code.into();
        match entry {
            GradeEntry::Ungraded => {
                self.entries.remove(&code);
            }
            other => {
                self.entries.insert(code, other);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every recorded entry (excluded or graded), ordered by course code.
    pub fn iter(&self) -> impl Iterator<Item = (&str, GradeEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl From<BTreeMap<String, Option<f64>>> for GradeMap {
    fn from(raw: BTreeMap<String, Option<f64>>) -> Self {
        let entries = raw
            .into_iter()
            .map(|(code, value)| {
                let entry = match value {
                    Some(points) => GradeEntry::Graded(points),
                    None => GradeEntry::Excluded,
                };
                (code, entry)
            })
            .collect();
        Self { entries }
    }
}

impl From<GradeMap> for BTreeMap<String, Option<f64>> {
    fn from(map: GradeMap) -> Self {
        map.entries
            .into_iter()
            .filter_map(|(code, entry)| match entry {
                GradeEntry::Graded(points) => Some((code, Some(points))),
                GradeEntry::Excluded => Some((code, None)),
                GradeEntry::Ungraded => None,
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, GradeEntry)> for GradeMap {
    fn from_iter<I: IntoIterator<Item = (S, GradeEntry)>>(iter: I) -> Self {
        let mut map = GradeMap::new();
        for (code, entry) in iter {
            map.set(code, entry);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Per-semester manual GPA values and the flags that activate them.
///
/// The two halves are kept apart because a manual value is retained while
/// its flag is off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(rename = "manualGPAs", default)]
    pub manual_gpas: BTreeMap<String, f64>,
    #[serde(rename = "fixGPAMap", default)]
    pub active: BTreeMap<String, bool>,
}

impl Overrides {
    pub fn is_active(&self, semester_code: &str) -> bool {
        self.active.get(semester_code).copied().unwrap_or(false)
    }

    /// Manual GPA of a semester when its override is active. An active
    /// override without a stored value reads as 0.
    pub fn active_gpa(&self, semester_code: &str) -> Option<f64> {
        self.is_active(semester_code)
            .then(|| self.manual_gpas.get(semester_code).copied().unwrap_or(0.0))
    }

    pub fn manual_gpa(&self, semester_code: &str) -> Option<f64> {
        self.manual_gpas.get(semester_code).copied()
    }

    pub fn clear(&mut self) {
        self.manual_gpas.clear();
        self.active.clear();
    }
}

/// Input mode of a semester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemesterMode {
    /// Grades are entered course by course.
    #[default]
    CourseWise,
    /// A directly-entered GPA stands in for the whole semester.
    Manual,
}

impl fmt::Display for SemesterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemesterMode::CourseWise => write!(f, "course-wise"),
            SemesterMode::Manual => write!(f, "manual"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_scale_is_strictly_decreasing() {
        for pair in GRADE_SCALE.windows(2) {
            assert!(pair[0].points() > pair[1].points());
        }
        let zeros = GRADE_SCALE.iter().filter(|g| g.points() == 0.0).count();
        assert_eq!(zeros, 1);
        assert_eq!(Grade::from_points(0.0), Some(Grade::F));
    }

    #[test]
    fn grade_parse_and_lookup() {
        assert_eq!("A+".parse::<Grade>().unwrap(), Grade::APlus);
        assert_eq!(" b- ".parse::<Grade>().unwrap(), Grade::BMinus);
        assert!("E".parse::<Grade>().is_err());
        assert_eq!(Grade::from_points(3.75), Some(Grade::A));
        assert_eq!(Grade::from_points(3.1), None);
        assert_eq!(Grade::CPlus.to_string(), "C+ (2.50)");
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn semester_from_indices() {
        let sem = Semester::from_indices(2, 1);
        assert_eq!(sem.code, "21");
        assert_eq!(sem.display_year, "2nd Year");
        assert_eq!(sem.display_label, "1st Semester");
    }

    #[test]
    fn grade_map_keeps_three_states_through_json() {
        let mut grades = GradeMap::new();
        grades.set("CSE-1101", GradeEntry::Graded(3.75));
        grades.set("CSE-1102", GradeEntry::Excluded);
        grades.set("CSE-1103", GradeEntry::Ungraded);

        let json = serde_json::to_string(&grades).unwrap();
        assert_eq!(json, r#"{"CSE-1101":3.75,"CSE-1102":null}"#);

        let back: GradeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("CSE-1101"), GradeEntry::Graded(3.75));
        assert_eq!(back.get("CSE-1102"), GradeEntry::Excluded);
        assert_eq!(back.get("CSE-1103"), GradeEntry::Ungraded);
        assert_eq!(back, grades);
    }

    #[test]
    fn setting_ungraded_removes_entry() {
        let mut grades = GradeMap::new();
        grades.set("X", GradeEntry::Graded(2.0));
        grades.set("X", GradeEntry::Ungraded);
        assert!(grades.is_empty());
    }

    #[test]
    fn course_serde_uses_wire_names() {
        let course = Course::new("CSE-1101", "Computer Fundamentals Lab", 1.5, CourseKind::Lab);
        let json = serde_json::to_value(&course).unwrap();
        assert_eq!(json["credit"], 1.5);
        assert_eq!(json["type"], "lab");
        assert!(!course.is_elective_slot());
        assert!(Course::new("ELECTIVE-2-LAB", "Lab", 1.5, CourseKind::Lab).is_elective_slot());
    }

    #[test]
    fn active_override_without_value_reads_zero() {
        let mut overrides = Overrides::default();
        overrides.active.insert("11".into(), true);
        assert_eq!(overrides.active_gpa("11"), Some(0.0));
        overrides.manual_gpas.insert("12".into(), 3.2);
        assert_eq!(overrides.active_gpa("12"), None);
        assert_eq!(overrides.manual_gpa("12"), Some(3.2));
    }

    #[test]
    fn check_ready_rejects_empty_structures() {
        let mut curriculum = Curriculum::default();
        assert!(matches!(curriculum.check_ready(), Err(ValidationError::NoSemesters)));
        curriculum.semesters.push(Semester::from_indices(1, 1));
        assert!(matches!(
            curriculum.check_ready(),
            Err(ValidationError::EmptySemester(code)) if code == "11"
        ));
        curriculum.semesters[0]
            .courses
            .push(Course::new("A", "A", 3.0, CourseKind::Theory));
        assert!(curriculum.check_ready().is_ok());
    }
}
