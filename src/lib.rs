//! Canvas LMS API client library.
//!
//! A Rust library for interacting with the Canvas LMS REST API: a
//! bearer-authenticated HTTP client, Link-header pagination, Rails-style
//! nested form parameters, the three-step file upload handshake, and typed
//! operations over the common Canvas resources (courses, users,
//! enrollments, assignments, submissions, modules, quizzes, discussions,
//! grades, files, announcements).
//!
//! # Quick Start
//!
//! ```no_run
//! use canvasapi::{course, CanvasClient, Fetch};
//! use canvasapi::resources::course::CourseFilters;
//!
//! #[tokio::main]
//! async fn main() -> canvasapi::Result<()> {
//!     // Reads CANVAS_DOMAIN and CANVAS_ACCESS_TOKEN.
//!     let client = CanvasClient::from_env()?;
//!
//!     // List every course visible to the token, following pagination.
//!     let courses = course::list(&client, CourseFilters::default(), Fetch::All).await?;
//!     for course in &courses {
//!         println!("{}: {}", course.id, course.name.as_deref().unwrap_or("-"));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Batch dispatch
//!
//! The [`Dispatcher`] runs loosely-typed `(resource, operation)` actions
//! over ordered batches of items, flattening list results into one record
//! per element and optionally continuing past failed items:
//!
//! ```no_run
//! use canvasapi::{ActionItem, CanvasClient, Dispatcher, Resource};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> canvasapi::Result<()> {
//! let client = CanvasClient::from_env()?;
//! let mut dispatcher = Dispatcher::new(client).continue_on_fail(true);
//!
//! let params = match json!({"courseId": "101", "returnAll": true}) {
//!     serde_json::Value::Object(map) => map,
//!     _ => unreachable!(),
//! };
//! let records = dispatcher
//!     .execute(Resource::Assignment, "getAll", vec![ActionItem::new(params)])
//!     .await?;
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! [`CanvasClient::from_env`] reads:
//!
//! - `CANVAS_DOMAIN` (required) - Canvas instance domain; schemes, trailing
//!   slashes and a trailing `/api/v1` are stripped
//! - `CANVAS_ACCESS_TOKEN` (required) - API access token

mod client;
mod dispatcher;
mod error;
mod pagination;
mod params;
mod upload;

pub mod cli;
pub mod resources;

pub use client::{CanvasClient, RequestTarget, RetryPolicy};
pub use dispatcher::{ActionItem, BinaryPayload, Dispatcher, ExecutionRecord, Resource};
pub use error::{api_error_message, CanvasError, Result};
pub use pagination::{fetch_all_items, fetch_listing, parse_link_header, Fetch, PageBody};
pub use params::{
    enrollment_type_label, flatten_record, format_date, format_domain, include_query,
    nested_params, sis_id_reference, validate_sis_id, workflow_state_options, Params, SisIdType,
};
pub use resources::{
    announcement, assignment, course, discussion, enrollment, file, grade, module, quiz,
    submission, user,
};
pub use resources::{
    Announcement, Assignment, CanvasFile, Course, Discussion, Enrollment, FileContext, Folder,
    Grades, GradingPeriod, GradingStandard, Module, ModuleItem, Quiz, QuizQuestion, Submission,
    User,
};
pub use upload::{upload_file, FileUpload};
