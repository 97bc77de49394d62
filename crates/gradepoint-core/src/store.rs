//! Grade/structure store.
//!
//! Holds the user's edits for one dataset (a built-in department or the
//! custom curriculum) and writes the whole dataset through to the injected
//! key-value port after every change. The aggregation engine reads from it,
//! it never caches derived values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Department;
use crate::engine::{self, CgpaResult, SemesterResult};
use crate::error::{TransferError, ValidationError};
use crate::model::{Course, CourseKind, Curriculum, GradeEntry, GradeMap, Overrides, Semester, SemesterMode};
use crate::persistence::{self, department_key, KeyValueStore, SaveStatus, CUSTOM_KEY};
use crate::report::ResultsSummary;
use crate::transfer;
use crate::validation;

/// The persisted document of a grade store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeBook {
    /// User-authored curriculum. Only custom stores carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<Curriculum>,
    #[serde(default)]
    pub grades: GradeMap,
    #[serde(flatten)]
    pub overrides: Overrides,
    /// Elective slot code → chosen course code.
    #[serde(default)]
    pub electives: BTreeMap<String, String>,
}

/// Where a store's curriculum comes from.
#[derive(Debug, Clone, PartialEq)]
enum CurriculumSource {
    /// Catalog data; read-only.
    Fixed(Curriculum),
    /// The `structure` of the grade book.
    Custom,
}

/// Grades, overrides and elective choices for one curriculum.
#[derive(Debug)]
pub struct GradeStore<P: KeyValueStore> {
    port: P,
    key: String,
    source: CurriculumSource,
    book: GradeBook,
}

impl<P: KeyValueStore> GradeStore<P> {
    /// Store for a built-in department, loaded from its persisted record.
    pub fn for_department(port: P, department: &Department) -> Self {
        let key = department_key(&department.code);
        let curriculum = Curriculum::new(department.semesters.clone());
        let mut book: GradeBook = persistence::load_dataset(&port, &key);
        book.structure = None;
        tracing::debug!(key = %key, grades = book.grades.len(), "loaded department store");
        Self {
            port,
            key,
            source: CurriculumSource::Fixed(curriculum),
            book,
        }
    }

    /// Store for the user-authored curriculum.
    pub fn custom(port: P) -> Self {
        let book: GradeBook = persistence::load_dataset(&port, CUSTOM_KEY);
        tracing::debug!(
            semesters = book.structure.as_ref().map_or(0, |s| s.semesters.len()),
            grades = book.grades.len(),
            "loaded custom store"
        );
        Self {
            port,
            key: CUSTOM_KEY.to_string(),
            source: CurriculumSource::Custom,
            book,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_custom(&self) -> bool {
        self.source == CurriculumSource::Custom
    }

    pub fn book(&self) -> &GradeBook {
        &self.book
    }

    pub fn grades(&self) -> &GradeMap {
        &self.book.grades
    }

    pub fn overrides(&self) -> &Overrides {
        &self.book.overrides
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    /// The active curriculum. `None` when there is nothing to grade yet.
    pub fn curriculum(&self) -> Option<&Curriculum> {
        let curriculum = match &self.source {
            CurriculumSource::Fixed(curriculum) => Some(curriculum),
            CurriculumSource::Custom => self.book.structure.as_ref(),
        };
        curriculum.filter(|c| !c.semesters.is_empty())
    }

    fn semester(&self, code: &str) -> Option<&Semester> {
        self.curriculum().and_then(|c| c.semester(code))
    }

    pub fn grade(&self, course_code: &str) -> GradeEntry {
        self.book.grades.get(course_code)
    }

    pub fn mode(&self, semester_code: &str) -> SemesterMode {
        if self.book.overrides.is_active(semester_code) {
            SemesterMode::Manual
        } else {
            SemesterMode::CourseWise
        }
    }

    pub fn elective(&self, slot: &str) -> Option<&str> {
        self.book.electives.get(slot).map(String::as_str)
    }

    fn save(&mut self) -> SaveStatus {
        persistence::save_dataset(&mut self.port, &self.key, &self.book)
    }

    // -----------------------------------------------------------------------
    // Grading
    // -----------------------------------------------------------------------

    /// Record a course's grade.
    ///
    /// Unknown courses and courses of a semester in manual mode are ignored.
    pub fn set_grade(&mut self, course_code: &str, entry: GradeEntry) -> SaveStatus {
        let Some((semester, _)) = self.curriculum().and_then(|c| c.find_course(course_code)) else {
            tracing::debug!(course = course_code, "ignoring grade for unknown course");
            return SaveStatus::Unchanged;
        };
        if self.book.overrides.is_active(&semester.code) {
            tracing::debug!(course = course_code, "ignoring grade while semester is manual");
            return SaveStatus::Unchanged;
        }
        if self.book.grades.get(course_code) == entry {
            return SaveStatus::Unchanged;
        }

        self.book.grades.set(course_code, entry);
        tracing::debug!(course = course_code, ?entry, "grade set");
        self.save()
    }

    /// Store a semester's manual GPA as given. Callers clamp to `[0, 4]`.
    pub fn set_manual_gpa(&mut self, semester_code: &str, value: f64) -> SaveStatus {
        if self.semester(semester_code).is_none() {
            tracing::debug!(semester = semester_code, "ignoring manual GPA for unknown semester");
            return SaveStatus::Unchanged;
        }
        if self.book.overrides.manual_gpa(semester_code) == Some(value) {
            return SaveStatus::Unchanged;
        }
        self.book
            .overrides
            .manual_gpas
            .insert(semester_code.to_string(), value);
        tracing::debug!(semester = semester_code, value, "manual GPA set");
        self.save()
    }

    /// Parse and range-check a typed manual GPA, then store it.
    pub fn set_manual_gpa_input(&mut self, semester_code: &str, input: &str) -> Result<SaveStatus, ValidationError> {
        if self.semester(semester_code).is_none() {
            return Err(ValidationError::UnknownSemester(semester_code.to_string()));
        }
        let value = validation::parse_gpa(input)?;
        Ok(self.set_manual_gpa(semester_code, value))
    }

    /// Switch a semester to manual mode.
    ///
    /// Clears the semester's course grades and seeds the manual GPA with the
    /// course-wise GPA at two decimals, then raises the flag.
    pub fn enter_manual_mode(&mut self, semester_code: &str) -> SaveStatus {
        let Some(semester) = self.semester(semester_code) else {
            return SaveStatus::Unchanged;
        };
        if self.book.overrides.is_active(semester_code) {
            return SaveStatus::Unchanged;
        }

        let computed = engine::semester_gpa(&semester.courses, &self.book.grades, None, None);
        let seeded = (computed.gpa * 100.0).round() / 100.0;
        let codes: Vec<String> = semester.courses.iter().map(|c| c.code.clone()).collect();

        for code in codes {
            self.book.grades.set(code, GradeEntry::Ungraded);
        }
        self.book
            .overrides
            .manual_gpas
            .insert(semester_code.to_string(), seeded);
        self.book.overrides.active.insert(semester_code.to_string(), true);
        tracing::debug!(semester = semester_code, seeded, "entered manual mode");
        self.save()
    }

    /// Switch a semester back to course-wise entry. Only the flag changes.
    pub fn exit_manual_mode(&mut self, semester_code: &str) -> SaveStatus {
        if self.semester(semester_code).is_none() || !self.book.overrides.is_active(semester_code) {
            return SaveStatus::Unchanged;
        }
        self.book.overrides.active.insert(semester_code.to_string(), false);
        tracing::debug!(semester = semester_code, "left manual mode");
        self.save()
    }

    pub fn set_override_active(&mut self, semester_code: &str, active: bool) -> SaveStatus {
        if active {
            self.enter_manual_mode(semester_code)
        } else {
            self.exit_manual_mode(semester_code)
        }
    }

    /// Record the concrete course chosen for an elective slot.
    ///
    /// Whether the choice is legal is for the catalog to say.
    pub fn set_elective(&mut self, slot: &str, choice: &str) -> SaveStatus {
        let known_slot = self
            .curriculum()
            .and_then(|c| c.find_course(slot))
            .is_some_and(|(_, course)| course.is_elective_slot());
        if !known_slot {
            tracing::debug!(slot, "ignoring choice for unknown elective slot");
            return SaveStatus::Unchanged;
        }
        if self.elective(slot) == Some(choice) {
            return SaveStatus::Unchanged;
        }
        self.book.electives.insert(slot.to_string(), choice.to_string());
        tracing::debug!(slot, choice, "elective chosen");
        self.save()
    }

    // -----------------------------------------------------------------------
    // Resets
    // -----------------------------------------------------------------------

    /// Clear grades and overrides. A custom curriculum is kept.
    pub fn reset_grades(&mut self) -> SaveStatus {
        self.book.grades.clear();
        self.book.overrides.clear();
        tracing::debug!(key = %self.key, "grades reset");
        self.save()
    }

    /// Clear everything, including a custom curriculum, and drop the record.
    pub fn reset_all(&mut self) -> SaveStatus {
        self.book = GradeBook::default();
        tracing::debug!(key = %self.key, "store reset");
        persistence::purge(&mut self.port, &self.key)
    }

    // -----------------------------------------------------------------------
    // Custom curriculum authoring
    // -----------------------------------------------------------------------

    fn structure_mut(&mut self) -> Result<&mut Curriculum, ValidationError> {
        match self.source {
            CurriculumSource::Fixed(_) => Err(ValidationError::FixedCurriculum),
            CurriculumSource::Custom => Ok(self.book.structure.get_or_insert_with(Curriculum::default)),
        }
    }

    fn authored(&self) -> Result<Option<&Curriculum>, ValidationError> {
        match self.source {
            CurriculumSource::Fixed(_) => Err(ValidationError::FixedCurriculum),
            CurriculumSource::Custom => Ok(self.book.structure.as_ref()),
        }
    }

    /// Add an empty semester. Semesters stay sorted by code.
    pub fn add_semester(&mut self, year: u8, semester: u8) -> Result<SaveStatus, ValidationError> {
        validation::check_semester_indices(year, semester)?;
        let new = Semester::from_indices(year, semester);
        if self.authored()?.is_some_and(|c| c.semester(&new.code).is_some()) {
            return Err(ValidationError::DuplicateSemester(new.code));
        }

        let code = new.code.clone();
        let structure = self.structure_mut()?;
        let at = structure
            .semesters
            .partition_point(|s| s.code.as_str() < code.as_str());
        structure.semesters.insert(at, new);
        tracing::debug!(semester = %code, "semester added");
        Ok(self.save())
    }

    /// Remove a semester and its courses. Their grades become inert.
    pub fn remove_semester(&mut self, semester_code: &str) -> Result<SaveStatus, ValidationError> {
        let Some(at) = self
            .authored()?
            .and_then(|c| c.semesters.iter().position(|s| s.code == semester_code))
        else {
            return Err(ValidationError::UnknownSemester(semester_code.to_string()));
        };
        self.structure_mut()?.semesters.remove(at);
        tracing::debug!(semester = semester_code, "semester removed");
        Ok(self.save())
    }

    /// Validate and append a course to a semester.
    ///
    /// The code must be unique across the whole curriculum.
    pub fn add_course(
        &mut self,
        semester_code: &str,
        code: &str,
        name: &str,
        credit: &str,
        kind: CourseKind,
    ) -> Result<SaveStatus, ValidationError> {
        let name = validation::require("course name", name)?;
        let code = validation::course_code(code)?;
        let credit = validation::parse_credit(credit)?;

        let Some(curriculum) = self.authored()? else {
            return Err(ValidationError::UnknownSemester(semester_code.to_string()));
        };
        if curriculum.semester(semester_code).is_none() {
            return Err(ValidationError::UnknownSemester(semester_code.to_string()));
        }
        if curriculum.contains_course(&code) {
            return Err(ValidationError::DuplicateCourse(code));
        }

        let structure = self.structure_mut()?;
        if let Some(semester) = structure.semesters.iter_mut().find(|s| s.code == semester_code) {
            semester.courses.push(Course::new(code.clone(), name, credit, kind));
        }
        tracing::debug!(semester = semester_code, course = %code, credit, "course added");
        Ok(self.save())
    }

    pub fn remove_course(&mut self, semester_code: &str, course_code: &str) -> Result<SaveStatus, ValidationError> {
        let Some((sem_at, semester)) = self
            .authored()?
            .and_then(|c| c.semesters.iter().enumerate().find(|(_, s)| s.code == semester_code))
        else {
            return Err(ValidationError::UnknownSemester(semester_code.to_string()));
        };
        let Some(at) = semester.courses.iter().position(|c| c.code == course_code) else {
            return Err(ValidationError::UnknownCourse(course_code.to_string()));
        };
        self.structure_mut()?.semesters[sem_at].courses.remove(at);
        tracing::debug!(semester = semester_code, course = course_code, "course removed");
        Ok(self.save())
    }

    /// Whether the curriculum is complete enough to grade.
    pub fn check_ready(&self) -> Result<(), ValidationError> {
        match &self.source {
            CurriculumSource::Fixed(curriculum) => curriculum.check_ready(),
            CurriculumSource::Custom => self
                .book
                .structure
                .as_ref()
                .ok_or(ValidationError::NoSemesters)?
                .check_ready(),
        }
    }

    // -----------------------------------------------------------------------
    // Derived figures
    // -----------------------------------------------------------------------

    /// GPA of one semester with overrides applied.
    pub fn semester_result(&self, semester_code: &str) -> Option<SemesterResult> {
        self.semester(semester_code).map(|s| {
            engine::semester_gpa(&s.courses, &self.book.grades, Some(semester_code), Some(&self.book.overrides))
        })
    }

    pub fn cgpa(&self) -> CgpaResult {
        match self.curriculum() {
            Some(c) => engine::cgpa(&c.semesters, &self.book.grades, Some(&self.book.overrides)),
            None => CgpaResult::default(),
        }
    }

    /// Every derived figure, recomputed from the current state.
    pub fn summary(&self) -> ResultsSummary {
        let empty = Curriculum::default();
        let curriculum = self.curriculum().unwrap_or(&empty);
        ResultsSummary::compute(&self.key, curriculum, &self.book.grades, &self.book.overrides)
    }

    // -----------------------------------------------------------------------
    // Export / import
    // -----------------------------------------------------------------------

    /// The persisted record, byte for byte.
    pub fn export(&self) -> Result<String, TransferError> {
        transfer::export_raw(&self.port, &self.key)
    }

    /// Replace the whole dataset with `content`.
    ///
    /// The text must parse as this store's dataset before anything changes.
    pub fn import(&mut self, content: &str) -> Result<SaveStatus, TransferError> {
        let (mut book, status): (GradeBook, _) = transfer::import_raw(&mut self.port, &self.key, content)?;
        if !self.is_custom() {
            book.structure = None;
        }
        self.book = book;
        tracing::debug!(key = %self.key, grades = self.book.grades.len(), "dataset replaced");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::model::Grade;
    use crate::persistence::MemoryStore;

    fn custom_store() -> GradeStore<MemoryStore> {
        let mut store = GradeStore::custom(MemoryStore::new());
        store.add_semester(1, 1).unwrap();
        store
            .add_course("11", "a-101", "Course A", "3", CourseKind::Theory)
            .unwrap();
        store
            .add_course("11", "B-102", "Course B", "1.5", CourseKind::Lab)
            .unwrap();
        store
    }

    #[test]
    fn semesters_stay_sorted() {
        let mut store = GradeStore::custom(MemoryStore::new());
        store.add_semester(2, 1).unwrap();
        store.add_semester(1, 2).unwrap();
        store.add_semester(1, 1).unwrap();
        let codes: Vec<&str> = store
            .curriculum()
            .unwrap()
            .semesters
            .iter()
            .map(|s| s.code.as_str())
            .collect();
        assert_eq!(codes, ["11", "12", "21"]);
        assert_eq!(
            store.add_semester(1, 2).unwrap_err(),
            ValidationError::DuplicateSemester("12".into())
        );
    }

    #[test]
    fn add_course_validates_before_writing() {
        let mut store = custom_store();
        let before = store.book().clone();

        assert_eq!(
            store.add_course("11", "", "X", "3", CourseKind::Theory).unwrap_err(),
            ValidationError::EmptyField("course code")
        );
        assert!(matches!(
            store.add_course("11", "C", "X", "abc", CourseKind::Theory),
            Err(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            store.add_course("11", "C", "X", "12", CourseKind::Theory),
            Err(ValidationError::CreditOutOfRange { .. })
        ));
        assert_eq!(
            store.add_course("99", "C", "X", "3", CourseKind::Theory).unwrap_err(),
            ValidationError::UnknownSemester("99".into())
        );
        assert_eq!(store.book(), &before);
    }

    #[test]
    fn rejected_removals_leave_book_alone() {
        let mut store = GradeStore::custom(MemoryStore::new());
        let before = store.book().clone();
        assert_eq!(
            store.remove_semester("11").unwrap_err(),
            ValidationError::UnknownSemester("11".into())
        );
        assert_eq!(
            store.remove_course("11", "A-101").unwrap_err(),
            ValidationError::UnknownSemester("11".into())
        );
        assert_eq!(store.book(), &before);
        assert!(store.book().structure.is_none());
        assert!(store.port().get(CUSTOM_KEY).unwrap().is_none());

        let mut store = custom_store();
        let before = store.book().clone();
        assert_eq!(
            store.remove_course("11", "NOPE").unwrap_err(),
            ValidationError::UnknownCourse("NOPE".into())
        );
        assert_eq!(store.book(), &before);

        assert!(store.remove_course("11", "B-102").unwrap().is_saved());
        assert_eq!(store.curriculum().unwrap().course_count(), 1);
        assert!(store.remove_semester("11").unwrap().is_saved());
        assert!(store.curriculum().is_none());
    }

    #[test]
    fn course_codes_are_normalized() {
        let store = custom_store();
        assert!(store.curriculum().unwrap().contains_course("A-101"));
    }

    #[test]
    fn grade_for_unknown_course_is_ignored() {
        let mut store = custom_store();
        let status = store.set_grade("NOPE", Grade::A.into());
        assert!(status.is_unchanged());
        assert!(store.grades().is_empty());
    }

    #[test]
    fn manual_mode_transitions() {
        let mut store = custom_store();
        store.set_grade("A-101", Grade::A.into());
        store.set_grade("B-102", Grade::AMinus.into());

        assert!(store.enter_manual_mode("11").is_saved());
        assert_eq!(store.mode("11"), SemesterMode::Manual);
        assert_eq!(store.grade("A-101"), GradeEntry::Ungraded);
        assert_eq!(store.grade("B-102"), GradeEntry::Ungraded);
        // 3.6667 seeded at two decimals.
        assert_eq!(store.overrides().manual_gpa("11"), Some(3.67));

        // Grades are locked while manual.
        assert!(store.set_grade("A-101", Grade::F.into()).is_unchanged());
        assert!(store.enter_manual_mode("11").is_unchanged());

        let result = store.semester_result("11").unwrap();
        assert_eq!(result.gpa, 3.67);
        assert_eq!(result.credits_attempted, 4.5);

        assert!(store.exit_manual_mode("11").is_saved());
        assert_eq!(store.mode("11"), SemesterMode::CourseWise);
        assert_eq!(store.overrides().manual_gpa("11"), Some(3.67));
        assert_eq!(store.grade("A-101"), GradeEntry::Ungraded);
        assert_eq!(store.semester_result("11").unwrap(), SemesterResult::default());
    }

    #[test]
    fn manual_input_is_range_checked() {
        let mut store = custom_store();
        assert!(matches!(
            store.set_manual_gpa_input("11", "4.5"),
            Err(ValidationError::GpaOutOfRange(_))
        ));
        assert!(matches!(
            store.set_manual_gpa_input("31", "3.0"),
            Err(ValidationError::UnknownSemester(_))
        ));
        assert!(store.set_manual_gpa_input("11", "3.25").unwrap().is_saved());
        // Stored while inactive.
        assert_eq!(store.overrides().manual_gpa("11"), Some(3.25));
        assert_eq!(store.mode("11"), SemesterMode::CourseWise);
    }

    #[test]
    fn reset_grades_keeps_structure() {
        let mut store = custom_store();
        store.set_grade("A-101", Grade::B.into());
        store.enter_manual_mode("11");
        store.reset_grades();
        assert!(store.grades().is_empty());
        assert_eq!(store.overrides(), &Overrides::default());
        assert_eq!(store.curriculum().unwrap().course_count(), 2);
    }

    #[test]
    fn reset_all_purges_record() {
        let mut store = custom_store();
        assert!(store.port().get(CUSTOM_KEY).unwrap().is_some());
        store.reset_all();
        assert!(store.curriculum().is_none());
        assert!(store.port().get(CUSTOM_KEY).unwrap().is_none());
        assert!(matches!(store.export(), Err(TransferError::NoData)));
    }

    #[test]
    fn department_curriculum_is_fixed() {
        let catalog = Catalog::builtin().unwrap();
        let cse = catalog.department("CSE").unwrap();
        let mut store = GradeStore::for_department(MemoryStore::new(), cse);
        assert_eq!(store.key(), "cse-cgpa-data");
        assert_eq!(store.add_semester(5, 1).unwrap_err(), ValidationError::FixedCurriculum);
        assert_eq!(
            store.remove_course("11", "CSE-1101").unwrap_err(),
            ValidationError::FixedCurriculum
        );
        assert!(store.check_ready().is_ok());
    }

    #[test]
    fn electives_need_a_slot() {
        let catalog = Catalog::builtin().unwrap();
        let cse = catalog.department("CSE").unwrap();
        let mut store = GradeStore::for_department(MemoryStore::new(), cse);

        assert!(store.set_elective("ELECTIVE-1", "CSE-5102").is_saved());
        assert_eq!(store.elective("ELECTIVE-1"), Some("CSE-5102"));
        assert!(store.set_elective("ELECTIVE-1", "CSE-5102").is_unchanged());
        assert!(store.set_elective("CSE-1101", "CSE-5102").is_unchanged());
        assert!(store.set_elective("ELECTIVE-9", "CSE-5102").is_unchanged());
    }

    #[test]
    fn department_without_curriculum_is_empty() {
        let catalog = Catalog::builtin().unwrap();
        let mgt = catalog.department("MGT").unwrap();
        let store = GradeStore::for_department(MemoryStore::new(), mgt);
        assert!(store.curriculum().is_none());
        assert_eq!(store.cgpa(), CgpaResult::default());
        assert!(matches!(store.check_ready(), Err(ValidationError::NoSemesters)));
        assert_eq!(store.summary().progress.total, 0);
    }

    #[test]
    fn book_wire_format() {
        let mut store = custom_store();
        store.set_grade("A-101", Grade::APlus.into());
        store.set_grade("B-102", GradeEntry::Excluded);
        store.set_manual_gpa("11", 3.5);

        let json: serde_json::Value = serde_json::from_str(&store.export().unwrap()).unwrap();
        assert_eq!(json["grades"]["A-101"], 4.0);
        assert!(json["grades"]["B-102"].is_null());
        assert_eq!(json["manualGPAs"]["11"], 3.5);
        assert_eq!(json["structure"]["semesters"][0]["courses"][1]["type"], "lab");
        assert!(json["fixGPAMap"].as_object().unwrap().is_empty());
    }
}
