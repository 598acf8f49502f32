//! Canvas resource operations.
//!
//! One module per Canvas resource. Each module defines the typed entity
//! shape(s) and the async operation functions the dispatcher glues to
//! (resource, operation) pairs. Entities keep unmodeled fields in a
//! flattened `extra` map, since Canvas responses vary with `include`
//! parameters.

pub mod announcement;
pub mod assignment;
pub mod course;
pub mod discussion;
pub mod enrollment;
pub mod file;
pub mod grade;
pub mod module;
pub mod quiz;
pub mod submission;
pub mod user;

pub use announcement::Announcement;
pub use assignment::Assignment;
pub use course::Course;
pub use discussion::Discussion;
pub use enrollment::{Enrollment, Grades};
pub use file::{CanvasFile, FileContext, Folder};
pub use grade::{GradingPeriod, GradingStandard};
pub use module::{Module, ModuleItem};
pub use quiz::{Quiz, QuizQuestion};
pub use submission::Submission;
pub use user::User;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

/// Decode a response value into a typed entity.
pub(crate) fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Decode a list of response records into typed entities, preserving order.
pub(crate) fn from_records<T: DeserializeOwned>(records: Vec<Value>) -> Result<Vec<T>> {
    records
        .into_iter()
        .map(|record| Ok(serde_json::from_value(record)?))
        .collect()
}
