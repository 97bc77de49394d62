//! Simple calculator: semesters entered directly as (GPA, credits) pairs.

use serde::{Deserialize, Serialize};

use crate::error::{TransferError, ValidationError};
use crate::model::ordinal;
use crate::persistence::{self, KeyValueStore, SaveStatus, SIMPLE_KEY};
use crate::transfer;
use crate::validation;

/// One directly-entered semester. A blank field is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleSemester {
    pub name: String,
    #[serde(with = "blank_or_number", default)]
    pub gpa: Option<f64>,
    #[serde(with = "blank_or_number", default)]
    pub credits: Option<f64>,
}

impl SimpleSemester {
    /// GPA and credits when both are positive, i.e. the semester counts.
    pub fn counted(&self) -> Option<(f64, f64)> {
        match (self.gpa, self.credits) {
            (Some(gpa), Some(credits)) if gpa > 0.0 && credits > 0.0 => Some((gpa, credits)),
            _ => None,
        }
    }
}

/// Numbers on the wire, with `""` for a blank field. Numeric text is
/// accepted on read.
mod blank_or_number {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(v)) => Some(v),
            Some(Raw::Text(text)) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            None => None,
        })
    }
}

/// The persisted document of the simple calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleBook {
    #[serde(default)]
    pub semesters: Vec<SimpleSemester>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleCgpa {
    pub cgpa: f64,
    /// Credits of the semesters that count.
    pub total_credits: f64,
    pub total_semesters: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleYear {
    /// "2nd Year"
    pub year: String,
    pub gpa: f64,
    pub total_credits: f64,
    /// Sorted by name.
    pub semesters: Vec<SimpleSemester>,
}

/// `"<n><ordinal> Year <m><ordinal> Semester"`.
pub fn semester_name(year: u8, semester: u8) -> String {
    format!(
        "{} Year {} Semester",
        ordinal(u32::from(year)),
        ordinal(u32::from(semester))
    )
}

/// Leading `"<n><ordinal> Year"` of a semester name, with its number.
fn year_prefix(name: &str) -> Option<(u32, &str)> {
    let digits = name.len() - name.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let number: u32 = name[..digits].parse().ok()?;
    let rest = &name[digits..];
    let suffix_ok = ["st", "nd", "rd", "th"].iter().any(|s| rest.starts_with(s));
    if !suffix_ok || !rest[2..].starts_with(" Year") {
        return None;
    }
    Some((number, &name[..digits + 2 + " Year".len()]))
}

fn weighted(semesters: &[&SimpleSemester]) -> (f64, f64) {
    let (points, credits) = semesters
        .iter()
        .filter_map(|s| s.counted())
        .fold((0.0, 0.0), |(p, c), (gpa, credits)| (p + gpa * credits, c + credits));
    let gpa = if credits > 0.0 { points / credits } else { 0.0 };
    (gpa, credits)
}

/// Store behind the simple calculator.
#[derive(Debug)]
pub struct SimpleStore<P: KeyValueStore> {
    port: P,
    book: SimpleBook,
}

impl<P: KeyValueStore> SimpleStore<P> {
    pub fn new(port: P) -> Self {
        let book: SimpleBook = persistence::load_dataset(&port, SIMPLE_KEY);
        tracing::debug!(semesters = book.semesters.len(), "loaded simple store");
        Self { port, book }
    }

    pub fn semesters(&self) -> &[SimpleSemester] {
        &self.book.semesters
    }

    pub fn book(&self) -> &SimpleBook {
        &self.book
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    fn save(&mut self) -> SaveStatus {
        persistence::save_dataset(&mut self.port, SIMPLE_KEY, &self.book)
    }

    fn position(&self, name: &str) -> Result<usize, ValidationError> {
        self.book
            .semesters
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ValidationError::UnknownSemester(name.to_string()))
    }

    /// Add a semester. Blank GPA or credits read as zero.
    pub fn add_semester(&mut self, name: &str, gpa: &str, credits: &str) -> Result<SaveStatus, ValidationError> {
        let name = validation::require("semester name", name)?;
        if self.book.semesters.iter().any(|s| s.name == name) {
            return Err(ValidationError::DuplicateSemester(name));
        }
        let gpa = match gpa.trim() {
            "" => 0.0,
            text => validation::check_gpa(validation::parse_number("GPA", text)?)?,
        };
        let credits = match credits.trim() {
            "" => 0.0,
            text => validation::check_semester_credits(validation::parse_number("credits", text)?)?,
        };

        tracing::debug!(semester = %name, gpa, credits, "simple semester added");
        self.book.semesters.push(SimpleSemester {
            name,
            gpa: Some(gpa),
            credits: Some(credits),
        });
        Ok(self.save())
    }

    pub fn remove_semester(&mut self, name: &str) -> Result<SaveStatus, ValidationError> {
        let at = self.position(name)?;
        self.book.semesters.remove(at);
        tracing::debug!(semester = name, "simple semester removed");
        Ok(self.save())
    }

    /// Edit a semester's GPA. Blank input clears it.
    pub fn update_gpa(&mut self, name: &str, input: &str) -> Result<SaveStatus, ValidationError> {
        let at = self.position(name)?;
        let value = match input.trim() {
            "" => None,
            text => Some(validation::check_gpa(validation::parse_number("GPA", text)?)?),
        };
        Ok(self.update(at, value, |s| &mut s.gpa))
    }

    /// Edit a semester's credits. Blank input clears them.
    pub fn update_credits(&mut self, name: &str, input: &str) -> Result<SaveStatus, ValidationError> {
        let at = self.position(name)?;
        let value = match input.trim() {
            "" => None,
            text => Some(validation::check_semester_credits(validation::parse_number("credits", text)?)?),
        };
        Ok(self.update(at, value, |s| &mut s.credits))
    }

    fn update(&mut self, at: usize, value: Option<f64>, field: fn(&mut SimpleSemester) -> &mut Option<f64>) -> SaveStatus {
        let slot = field(&mut self.book.semesters[at]);
        if *slot == value {
            return SaveStatus::Unchanged;
        }
        *slot = value;
        self.save()
    }

    pub fn cgpa(&self) -> SimpleCgpa {
        let all: Vec<&SimpleSemester> = self.book.semesters.iter().collect();
        let (cgpa, total_credits) = weighted(&all);
        SimpleCgpa {
            cgpa,
            total_credits,
            total_semesters: self.book.semesters.len(),
        }
    }

    /// Group semesters by their year prefix, earliest year first. Names
    /// without a year prefix are left out.
    pub fn yearly_breakdown(&self) -> Vec<SimpleYear> {
        let mut years: Vec<(u32, &str, Vec<&SimpleSemester>)> = Vec::new();
        for sem in &self.book.semesters {
            let Some((number, label)) = year_prefix(&sem.name) else {
                continue;
            };
            match years.iter_mut().find(|(_, l, _)| *l == label) {
                Some((_, _, list)) => list.push(sem),
                None => years.push((number, label, vec![sem])),
            }
        }
        years.sort_by_key(|(number, _, _)| *number);

        years
            .into_iter()
            .map(|(_, label, mut list)| {
                list.sort_by(|a, b| a.name.cmp(&b.name));
                let (gpa, total_credits) = weighted(&list);
                SimpleYear {
                    year: label.to_string(),
                    gpa,
                    total_credits,
                    semesters: list.into_iter().cloned().collect(),
                }
            })
            .collect()
    }

    pub fn reset_all(&mut self) -> SaveStatus {
        self.book = SimpleBook::default();
        tracing::debug!("simple store reset");
        persistence::purge(&mut self.port, SIMPLE_KEY)
    }

    pub fn export(&self) -> Result<String, TransferError> {
        transfer::export_raw(&self.port, SIMPLE_KEY)
    }

    pub fn import(&mut self, content: &str) -> Result<SaveStatus, TransferError> {
        let (book, status): (SimpleBook, _) = transfer::import_raw(&mut self.port, SIMPLE_KEY, content)?;
        self.book = book;
        tracing::debug!(semesters = self.book.semesters.len(), "simple dataset replaced");
        Ok(status)
    }
}
