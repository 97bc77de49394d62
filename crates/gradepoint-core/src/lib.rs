//! gradepoint-core: GPA/CGPA aggregation engine and grade store.
//!
//! The engine is a set of pure functions over a curriculum and the current
//! grade state. The stores hold user edits and write them through to an
//! injected key-value port.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod model;
pub mod persistence;
pub mod report;
pub mod simple;
pub mod store;
pub mod transfer;
pub mod validation;

pub use catalog::{Catalog, Department, ElectiveGroup};
pub use engine::{CgpaResult, GpaBand, Progress, SemesterResult};
pub use error::{PersistenceError, TransferError, ValidationError};
pub use model::{Course, CourseKind, Curriculum, Grade, GradeEntry, GradeMap, Overrides, Semester, SemesterMode};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, SaveStatus};
pub use report::ResultsSummary;
pub use simple::SimpleStore;
pub use store::{GradeBook, GradeStore};
