//! Static curriculum catalog.
//!
//! Departments, their semesters and elective option groups are read from TOML
//! files. The built-in catalog is compiled into the crate; extra catalogs can
//! be loaded from a directory and merged over it.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Course, CourseKind, Curriculum, Semester, ELECTIVE_PREFIX};

const BUILTIN_CATALOG: &str = include_str!("../catalogs/rmstu.toml");

/// Intermediate TOML structure for catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    #[serde(default)]
    departments: Vec<TomlDepartment>,
}

#[derive(Debug, Deserialize)]
struct TomlDepartment {
    code: String,
    name: String,
    #[serde(default)]
    university: String,
    #[serde(default)]
    semesters: Vec<TomlSemester>,
    #[serde(default)]
    electives: Vec<TomlElectiveGroup>,
}

#[derive(Debug, Deserialize)]
struct TomlSemester {
    code: String,
    year: String,
    label: String,
    #[serde(default)]
    courses: Vec<TomlCourse>,
}

#[derive(Debug, Deserialize)]
struct TomlCourse {
    code: String,
    name: String,
    credit: f64,
    #[serde(default = "default_kind")]
    kind: String,
}

fn default_kind() -> String {
    "theory".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlElectiveGroup {
    group: String,
    #[serde(default)]
    courses: Vec<TomlCourse>,
}

fn convert_courses(courses: Vec<TomlCourse>) -> Result<Vec<Course>> {
    courses
        .into_iter()
        .map(|c| {
            let kind: CourseKind = c
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("course {}: {}", c.code, e))?;
            if !(c.credit.is_finite() && c.credit > 0.0) {
                anyhow::bail!("course {}: credit must be positive (got {})", c.code, c.credit);
            }
            Ok(Course::new(c.code, c.name, c.credit, kind))
        })
        .collect()
}

/// A named group of elective options.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectiveGroup {
    /// Group label as published ("I", "II").
    pub name: String,
    pub courses: Vec<Course>,
}

/// A department of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub code: String,
    pub name: String,
    pub university: String,
    pub semesters: Vec<Semester>,
    /// Option groups, in published order. `ELECTIVE-<n>` refers to the n-th.
    pub electives: Vec<ElectiveGroup>,
}

impl Department {
    pub fn has_curriculum(&self) -> bool {
        !self.semesters.is_empty()
    }

    /// The department's curriculum, or `None` when none has been published.
    pub fn curriculum(&self) -> Option<Curriculum> {
        self.has_curriculum()
            .then(|| Curriculum::new(self.semesters.clone()))
    }

    /// Legal concrete courses for an elective slot.
    ///
    /// `ELECTIVE-<n>` yields the non-lab options of group n and
    /// `ELECTIVE-<n>-LAB` its lab options. Any other slot, or a group number
    /// that does not exist, yields every option of every group.
    pub fn elective_options(&self, slot: &str) -> Vec<&Course> {
        if self.electives.is_empty() {
            return Vec::new();
        }

        let group = parse_slot(slot)
            .and_then(|(n, lab)| n.checked_sub(1).and_then(|i| self.electives.get(i)).map(|g| (g, lab)));

        match group {
            Some((group, lab)) => group
                .courses
                .iter()
                .filter(|c| (c.kind == CourseKind::Lab) == lab)
                .collect(),
            None => self
                .electives
                .iter()
                .flat_map(|g| g.courses.iter())
                .collect(),
        }
    }

    /// Whether `choice` is one of the options offered for `slot`.
    pub fn is_legal_elective(&self, slot: &str, choice: &str) -> bool {
        self.elective_options(slot).iter().any(|c| c.code == choice)
    }

    /// Look up an elective option by code across all groups.
    pub fn elective_course(&self, code: &str) -> Option<&Course> {
        self.electives
            .iter()
            .flat_map(|g| g.courses.iter())
            .find(|c| c.code == code)
    }
}

/// Split `ELECTIVE-<n>[-LAB]` into its group number and lab flag.
fn parse_slot(slot: &str) -> Option<(usize, bool)> {
    let rest = slot.strip_prefix(ELECTIVE_PREFIX)?.strip_prefix('-')?;
    let (number, lab) = match rest.strip_suffix("-LAB") {
        Some(number) => (number, true),
        None => (rest, false),
    };
    number.parse().ok().map(|n| (n, lab))
}

/// A set of departments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    departments: Vec<Department>,
}

impl Catalog {
    /// The catalog compiled into the crate.
    pub fn builtin() -> Result<Self> {
        Self::parse_str(BUILTIN_CATALOG, Path::new("catalogs/rmstu.toml"))
    }

    /// Parse a single catalog file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file: {}", path.display()))?;
        Self::parse_str(&content, path)
    }

    /// Parse a TOML string (useful for testing).
    pub fn parse_str(content: &str, source_path: &Path) -> Result<Self> {
        let parsed: TomlCatalogFile = toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

        let mut catalog = Catalog::default();
        for dept in parsed.departments {
            let code = dept.code.trim().to_uppercase();
            if code.is_empty() {
                anyhow::bail!("{}: department with empty code", source_path.display());
            }
            if catalog.department(&code).is_some() {
                anyhow::bail!("{}: duplicate department {}", source_path.display(), code);
            }

            let semesters = dept
                .semesters
                .into_iter()
                .map(|s| {
                    let courses = convert_courses(s.courses)
                        .with_context(|| format!("department {code}, semester {}", s.code))?;
                    Ok(Semester {
                        display_year: s.year,
                        display_label: s.label,
                        code: s.code,
                        courses,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let electives = dept
                .electives
                .into_iter()
                .map(|g| {
                    let courses = convert_courses(g.courses)
                        .with_context(|| format!("department {code}, elective group {}", g.group))?;
                    Ok(ElectiveGroup {
                        name: g.group,
                        courses,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            catalog.departments.push(Department {
                code,
                name: dept.name,
                university: dept.university,
                semesters,
                electives,
            });
        }

        Ok(catalog)
    }

    /// Load every `.toml` catalog in a directory. Files that fail to parse
    /// are skipped with a warning.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("not a directory: {}", dir.display());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("failed to read directory: {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut catalog = Catalog::default();
        for path in paths {
            match Self::load_file(&path) {
                Ok(loaded) => catalog.merge(loaded),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
        Ok(catalog)
    }

    /// Merge another catalog into this one. Departments with the same code
    /// are replaced.
    pub fn merge(&mut self, other: Catalog) {
        for dept in other.departments {
            match self.departments.iter_mut().find(|d| d.code == dept.code) {
                Some(existing) => {
                    tracing::debug!(department = %dept.code, "catalog entry replaced");
                    *existing = dept;
                }
                None => self.departments.push(dept),
            }
        }
    }

    /// Find a department by code, ignoring case.
    pub fn department(&self, code: &str) -> Option<&Department> {
        let code = code.trim();
        self.departments
            .iter()
            .find(|d| d.code.eq_ignore_ascii_case(code))
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }
}
