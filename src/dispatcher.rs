//! Action dispatch over (resource, operation) pairs.
//!
//! The dispatcher glues loosely-typed action items to the typed operation
//! functions in [`crate::resources`]. Items are processed strictly in
//! order; array results are flattened into one record per element, each
//! tagged with the index of the item that produced it.

use std::str::FromStr;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::client::CanvasClient;
use crate::error::{CanvasError, Result};
use crate::pagination::Fetch;
use crate::params::Params;
use crate::resources::file::FileContext;
use crate::resources::quiz::NewQuizQuestion;
use crate::resources::{
    announcement, assignment, course, discussion, enrollment, file, grade, module, quiz,
    submission, user,
};
use crate::upload::FileUpload;

/// Default page size when a listing is invoked without `returnAll`.
const DEFAULT_LIMIT: u64 = 50;

/// The Canvas resources the dispatcher can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Course,
    User,
    Enrollment,
    Assignment,
    Submission,
    Module,
    Quiz,
    Discussion,
    Grade,
    File,
    Announcement,
}

impl Resource {
    fn name(self) -> &'static str {
        match self {
            Resource::Course => "course",
            Resource::User => "user",
            Resource::Enrollment => "enrollment",
            Resource::Assignment => "assignment",
            Resource::Submission => "submission",
            Resource::Module => "module",
            Resource::Quiz => "quiz",
            Resource::Discussion => "discussion",
            Resource::Grade => "grade",
            Resource::File => "file",
            Resource::Announcement => "announcement",
        }
    }
}

impl FromStr for Resource {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "course" => Ok(Resource::Course),
            "user" => Ok(Resource::User),
            "enrollment" => Ok(Resource::Enrollment),
            "assignment" => Ok(Resource::Assignment),
            "submission" => Ok(Resource::Submission),
            "module" => Ok(Resource::Module),
            "quiz" => Ok(Resource::Quiz),
            "discussion" => Ok(Resource::Discussion),
            "grade" => Ok(Resource::Grade),
            "file" => Ok(Resource::File),
            "announcement" => Ok(Resource::Announcement),
            other => Err(CanvasError::UnknownResource(other.to_string())),
        }
    }
}

/// Binary payload attached to an action item for upload operations.
#[derive(Debug, Clone)]
pub struct BinaryPayload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// One unit of work: a parameter map plus an optional binary payload.
#[derive(Debug, Clone, Default)]
pub struct ActionItem {
    pub params: Params,
    pub binary: Option<BinaryPayload>,
}

impl ActionItem {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            binary: None,
        }
    }

    pub fn with_binary(mut self, binary: BinaryPayload) -> Self {
        self.binary = Some(binary);
        self
    }
}

/// One output record: the producing item's index plus the JSON result.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub item: usize,
    pub json: Value,
}

/// Executes batches of action items against a Canvas client.
#[derive(Debug)]
pub struct Dispatcher {
    client: CanvasClient,
    continue_on_fail: bool,
    notice_emitted: bool,
}

impl Dispatcher {
    pub fn new(client: CanvasClient) -> Self {
        Self {
            client,
            continue_on_fail: false,
            notice_emitted: false,
        }
    }

    /// In continue-on-fail mode a failing item contributes an
    /// `{"error": message}` record instead of aborting the batch.
    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    /// Run `operation` on `resource` for each item, in input order.
    ///
    /// # Errors
    ///
    /// Without continue-on-fail, the first failing item aborts the batch
    /// with [`CanvasError::Item`] carrying its index.
    #[tracing::instrument(skip(self, items), fields(resource = resource.name(), operation, items = items.len()))]
    pub async fn execute(
        &mut self,
        resource: Resource,
        operation: &str,
        items: Vec<ActionItem>,
    ) -> Result<Vec<ExecutionRecord>> {
        if !self.notice_emitted {
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                base_url = %self.client.base_url(),
                "canvas connector starting"
            );
            self.notice_emitted = true;
        }

        let mut records = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            match self.run_item(resource, operation, &item).await {
                Ok(Value::Array(elements)) => {
                    records.extend(
                        elements
                            .into_iter()
                            .map(|json| ExecutionRecord { item: index, json }),
                    );
                }
                Ok(json) => records.push(ExecutionRecord { item: index, json }),
                Err(err) if self.continue_on_fail => {
                    tracing::warn!(item = index, error = %err, "item failed, continuing");
                    records.push(ExecutionRecord {
                        item: index,
                        json: json!({ "error": err.to_string() }),
                    });
                }
                Err(err) => {
                    return Err(CanvasError::Item {
                        index,
                        source: Box::new(err),
                    })
                }
            }
        }
        Ok(records)
    }

    async fn run_item(
        &self,
        resource: Resource,
        operation: &str,
        item: &ActionItem,
    ) -> Result<Value> {
        let client = &self.client;
        let p = &item.params;

        match (resource, operation) {
            // Courses
            (Resource::Course, "create") => {
                let account_id = required_str(p, "accountId")?;
                let name = required_str(p, "name")?;
                let attrs = object(p, "additionalFields");
                to_json(course::create(client, account_id, name, attrs).await?)
            }
            (Resource::Course, "get") => {
                let course_id = required_str(p, "courseId")?;
                let include = include_list(&object(p, "options"));
                to_json(course::get(client, course_id, &include).await?)
            }
            (Resource::Course, "getAll") => {
                let filters = filters_from(p, "filters")?;
                to_json(course::list(client, filters, fetch_arg(p)).await?)
            }
            (Resource::Course, "update") => {
                let course_id = required_str(p, "courseId")?;
                let attrs = object(p, "updateFields");
                to_json(course::update(client, course_id, attrs).await?)
            }
            (Resource::Course, "delete") => {
                course::delete(client, required_str(p, "courseId")?).await
            }
            (Resource::Course, "conclude") => {
                course::conclude(client, required_str(p, "courseId")?).await
            }
            (Resource::Course, "reset") => {
                course::reset(client, required_str(p, "courseId")?).await
            }
            (Resource::Course, "copy") => {
                let source = required_str(p, "courseId")?;
                let destination = required_str(p, "destinationCourseId")?;
                let options = object(p, "copyOptions");
                course::copy(client, source, destination, options).await
            }
            (Resource::Course, "getUsers") => {
                let course_id = required_str(p, "courseId")?;
                let filters = filters_from(p, "filters")?;
                to_json(course::users(client, course_id, filters, fetch_arg(p)).await?)
            }
            (Resource::Course, "getEnrollments") => {
                let course_id = required_str(p, "courseId")?;
                let filters = filters_from(p, "filters")?;
                to_json(course::enrollments(client, course_id, filters, fetch_arg(p)).await?)
            }

            // Users
            (Resource::User, "create") => {
                let account_id = required_str(p, "accountId")?;
                let name = required_str(p, "name")?;
                let email = required_str(p, "email")?;
                let attrs = object(p, "additionalFields");
                to_json(user::create(client, account_id, name, email, attrs).await?)
            }
            (Resource::User, "get") => {
                let user_id = required_str(p, "userId")?;
                let include = include_list(&object(p, "options"));
                to_json(user::get(client, user_id, &include).await?)
            }
            (Resource::User, "getAll") => {
                let account_id = required_str(p, "accountId")?;
                let filters = filters_from(p, "filters")?;
                to_json(user::list(client, account_id, filters, fetch_arg(p)).await?)
            }
            (Resource::User, "update") => {
                let user_id = required_str(p, "userId")?;
                let attrs = object(p, "updateFields");
                to_json(user::update(client, user_id, attrs).await?)
            }
            (Resource::User, "delete") => {
                let account_id = required_str(p, "accountId")?;
                let user_id = required_str(p, "userId")?;
                user::delete(client, account_id, user_id).await
            }
            (Resource::User, "getEnrollments") => {
                let user_id = required_str(p, "userId")?;
                let filters = filters_from(p, "filters")?;
                to_json(user::enrollments(client, user_id, filters, fetch_arg(p)).await?)
            }
            (Resource::User, "getCourses") => {
                let user_id = required_str(p, "userId")?;
                let filters = filters_from(p, "filters")?;
                to_json(user::courses(client, user_id, filters, fetch_arg(p)).await?)
            }
            (Resource::User, "getProfile") => {
                user::profile(client, required_str(p, "userId")?).await
            }
            (Resource::User, "updateAvatar") => {
                let user_id = required_str(p, "userId")?;
                let token = required_str(p, "avatarToken")?;
                to_json(user::update_avatar(client, user_id, token).await?)
            }
            (Resource::User, "getCustomData") => {
                let user_id = required_str(p, "userId")?;
                let scope = required_str(p, "scope")?;
                user::custom_data(client, user_id, scope).await
            }

            // Enrollments
            (Resource::Enrollment, "create") => {
                let course_id = required_str(p, "courseId")?;
                let user_id = required_str(p, "userId")?;
                let enrollment_type = required_str(p, "enrollmentType")?;
                let attrs = object(p, "additionalFields");
                to_json(
                    enrollment::create(client, course_id, user_id, enrollment_type, attrs).await?,
                )
            }
            (Resource::Enrollment, "get") => {
                let account_id = required_str(p, "accountId")?;
                let enrollment_id = required_str(p, "enrollmentId")?;
                to_json(enrollment::get(client, account_id, enrollment_id).await?)
            }
            (Resource::Enrollment, "getAll") => {
                let course_id = required_str(p, "courseId")?;
                let filters = filters_from(p, "filters")?;
                to_json(enrollment::list(client, course_id, filters, fetch_arg(p)).await?)
            }
            (Resource::Enrollment, "update") => {
                let course_id = required_str(p, "courseId")?;
                let enrollment_id = required_str(p, "enrollmentId")?;
                let attrs = object(p, "updateFields");
                to_json(enrollment::update(client, course_id, enrollment_id, attrs).await?)
            }
            (Resource::Enrollment, "delete") => {
                let course_id = required_str(p, "courseId")?;
                let enrollment_id = required_str(p, "enrollmentId")?;
                let task = required_str(p, "task")?;
                enrollment::delete(client, course_id, enrollment_id, task).await
            }
            (Resource::Enrollment, "conclude") => {
                let course_id = required_str(p, "courseId")?;
                let enrollment_id = required_str(p, "enrollmentId")?;
                enrollment::conclude(client, course_id, enrollment_id).await
            }
            (Resource::Enrollment, "reactivate") => {
                let course_id = required_str(p, "courseId")?;
                let enrollment_id = required_str(p, "enrollmentId")?;
                enrollment::reactivate(client, course_id, enrollment_id).await
            }

            // Assignments
            (Resource::Assignment, "create") => {
                let course_id = required_str(p, "courseId")?;
                let name = required_str(p, "name")?;
                let attrs = object(p, "additionalFields");
                to_json(assignment::create(client, course_id, name, attrs).await?)
            }
            (Resource::Assignment, "get") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let include = include_list(&object(p, "options"));
                to_json(assignment::get(client, course_id, assignment_id, &include).await?)
            }
            (Resource::Assignment, "getAll") => {
                let course_id = required_str(p, "courseId")?;
                let filters = filters_from(p, "filters")?;
                to_json(assignment::list(client, course_id, filters, fetch_arg(p)).await?)
            }
            (Resource::Assignment, "update") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let attrs = object(p, "updateFields");
                to_json(assignment::update(client, course_id, assignment_id, attrs).await?)
            }
            (Resource::Assignment, "delete") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                assignment::delete(client, course_id, assignment_id).await
            }
            (Resource::Assignment, "duplicate") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                to_json(assignment::duplicate(client, course_id, assignment_id).await?)
            }
            (Resource::Assignment, "getSubmissions") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let include = include_list(&object(p, "filters"));
                to_json(
                    assignment::submissions(
                        client,
                        course_id,
                        assignment_id,
                        &include,
                        fetch_arg(p),
                    )
                    .await?,
                )
            }
            (Resource::Assignment, "getOverrides") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                assignment::overrides(client, course_id, assignment_id).await
            }

            // Submissions
            (Resource::Submission, "get") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let user_id = required_str(p, "userId")?;
                let include = include_list(&object(p, "options"));
                to_json(
                    submission::get(client, course_id, assignment_id, user_id, &include).await?,
                )
            }
            (Resource::Submission, "getAll") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let filters = filters_from(p, "filters")?;
                to_json(
                    submission::list(client, course_id, assignment_id, filters, fetch_arg(p))
                        .await?,
                )
            }
            (Resource::Submission, "create") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let user_id = required_str(p, "userId")?;
                let submission_type = required_str(p, "submissionType")?;
                let options = object(p, "submissionOptions");
                to_json(
                    submission::create(
                        client,
                        course_id,
                        assignment_id,
                        user_id,
                        submission_type,
                        options,
                    )
                    .await?,
                )
            }
            (Resource::Submission, "update") | (Resource::Submission, "grade") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let user_id = required_str(p, "userId")?;
                let change = filters_from(p, "gradeOptions")?;
                to_json(
                    submission::grade(client, course_id, assignment_id, user_id, change).await?,
                )
            }
            (Resource::Submission, "addComment") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let user_id = required_str(p, "userId")?;
                let comment = required_str(p, "comment")?;
                let group_comment = object(p, "commentOptions")
                    .get("groupComment")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                submission::add_comment(
                    client,
                    course_id,
                    assignment_id,
                    user_id,
                    comment,
                    group_comment,
                )
                .await
            }
            (Resource::Submission, "uploadFile") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let user_id = required_str(p, "userId")?;
                let binary = item.binary.as_ref().ok_or(CanvasError::MissingBinaryData)?;
                let upload = FileUpload::new(
                    binary.file_name.clone(),
                    binary.content_type.clone(),
                    binary.data.clone(),
                );
                submission::upload(client, course_id, assignment_id, user_id, upload).await
            }

            // Modules
            (Resource::Module, "create") => {
                let course_id = required_str(p, "courseId")?;
                let name = required_str(p, "name")?;
                let attrs = object(p, "additionalFields");
                to_json(module::create(client, course_id, name, attrs).await?)
            }
            (Resource::Module, "get") => {
                let course_id = required_str(p, "courseId")?;
                let module_id = required_str(p, "moduleId")?;
                let include = include_list(&object(p, "options"));
                to_json(module::get(client, course_id, module_id, &include).await?)
            }
            (Resource::Module, "getAll") => {
                let course_id = required_str(p, "courseId")?;
                let filters = filters_from(p, "filters")?;
                to_json(module::list(client, course_id, filters, fetch_arg(p)).await?)
            }
            (Resource::Module, "update") => {
                let course_id = required_str(p, "courseId")?;
                let module_id = required_str(p, "moduleId")?;
                let attrs = object(p, "updateFields");
                to_json(module::update(client, course_id, module_id, attrs).await?)
            }
            (Resource::Module, "delete") => {
                let course_id = required_str(p, "courseId")?;
                let module_id = required_str(p, "moduleId")?;
                module::delete(client, course_id, module_id).await
            }
            (Resource::Module, "getItems") => {
                let course_id = required_str(p, "courseId")?;
                let module_id = required_str(p, "moduleId")?;
                let include = include_list(&object(p, "filters"));
                to_json(module::items(client, course_id, module_id, &include, fetch_arg(p)).await?)
            }
            (Resource::Module, "createItem") => {
                let course_id = required_str(p, "courseId")?;
                let module_id = required_str(p, "moduleId")?;
                let item_type = required_str(p, "itemType")?;
                let options = object(p, "itemOptions");
                to_json(module::create_item(client, course_id, module_id, item_type, options).await?)
            }
            (Resource::Module, "updateProgress") => {
                let course_id = required_str(p, "courseId")?;
                let module_id = required_str(p, "moduleId")?;
                let item_id = required_str(p, "itemId")?;
                module::mark_item_done(client, course_id, module_id, item_id).await
            }
            (Resource::Module, "unlock") => {
                let course_id = required_str(p, "courseId")?;
                let module_id = required_str(p, "moduleId")?;
                to_json(module::publish(client, course_id, module_id).await?)
            }

            // Quizzes
            (Resource::Quiz, "create") => {
                let course_id = required_str(p, "courseId")?;
                let title = required_str(p, "title")?;
                let attrs = object(p, "additionalFields");
                to_json(quiz::create(client, course_id, title, attrs).await?)
            }
            (Resource::Quiz, "get") => {
                let course_id = required_str(p, "courseId")?;
                let quiz_id = required_str(p, "quizId")?;
                to_json(quiz::get(client, course_id, quiz_id).await?)
            }
            (Resource::Quiz, "getAll") => {
                let course_id = required_str(p, "courseId")?;
                let filters = object(p, "filters");
                let search_term = filters.get("searchTerm").and_then(Value::as_str);
                to_json(quiz::list(client, course_id, search_term, fetch_arg(p)).await?)
            }
            (Resource::Quiz, "update") => {
                let course_id = required_str(p, "courseId")?;
                let quiz_id = required_str(p, "quizId")?;
                let attrs = object(p, "updateFields");
                to_json(quiz::update(client, course_id, quiz_id, attrs).await?)
            }
            (Resource::Quiz, "delete") => {
                let course_id = required_str(p, "courseId")?;
                let quiz_id = required_str(p, "quizId")?;
                quiz::delete(client, course_id, quiz_id).await
            }
            (Resource::Quiz, "getQuestions") => {
                let course_id = required_str(p, "courseId")?;
                let quiz_id = required_str(p, "quizId")?;
                to_json(quiz::questions(client, course_id, quiz_id, fetch_arg(p)).await?)
            }
            (Resource::Quiz, "createQuestion") => {
                let course_id = required_str(p, "courseId")?;
                let quiz_id = required_str(p, "quizId")?;
                let question = NewQuizQuestion {
                    question_name: required_str(p, "questionName")?.to_string(),
                    question_type: required_str(p, "questionType")?.to_string(),
                    question_text: required_str(p, "questionText")?.to_string(),
                    points_possible: p
                        .get("pointsPossible")
                        .and_then(Value::as_f64)
                        .ok_or(CanvasError::MissingParameter("pointsPossible"))?,
                    options: object(p, "questionOptions"),
                };
                to_json(quiz::create_question(client, course_id, quiz_id, question).await?)
            }
            (Resource::Quiz, "getSubmissions") => {
                let course_id = required_str(p, "courseId")?;
                let quiz_id = required_str(p, "quizId")?;
                let include = include_list(&object(p, "submissionFilters"));
                to_json(
                    quiz::submissions(client, course_id, quiz_id, &include, fetch_arg(p)).await?,
                )
            }

            // Discussions
            (Resource::Discussion, "create") => {
                let course_id = required_str(p, "courseId")?;
                let title = required_str(p, "title")?;
                let attrs = object(p, "additionalFields");
                to_json(discussion::create(client, course_id, title, attrs).await?)
            }
            (Resource::Discussion, "get") => {
                let course_id = required_str(p, "courseId")?;
                let topic_id = required_str(p, "topicId")?;
                let include = include_list(&object(p, "options"));
                to_json(discussion::get(client, course_id, topic_id, &include).await?)
            }
            (Resource::Discussion, "getAll") => {
                let course_id = required_str(p, "courseId")?;
                let filters = filters_from(p, "filters")?;
                to_json(discussion::list(client, course_id, filters, fetch_arg(p)).await?)
            }
            (Resource::Discussion, "update") => {
                let course_id = required_str(p, "courseId")?;
                let topic_id = required_str(p, "topicId")?;
                let attrs = object(p, "updateFields");
                to_json(discussion::update(client, course_id, topic_id, attrs).await?)
            }
            (Resource::Discussion, "delete") => {
                let course_id = required_str(p, "courseId")?;
                let topic_id = required_str(p, "topicId")?;
                discussion::delete(client, course_id, topic_id).await
            }
            (Resource::Discussion, "getEntries") => {
                let course_id = required_str(p, "courseId")?;
                let topic_id = required_str(p, "topicId")?;
                to_json(discussion::entries(client, course_id, topic_id, fetch_arg(p)).await?)
            }
            (Resource::Discussion, "createEntry") => {
                let course_id = required_str(p, "courseId")?;
                let topic_id = required_str(p, "topicId")?;
                let message = required_str(p, "message")?;
                let options = object(p, "entryOptions");
                let parent = options.get("parentEntryId").and_then(Value::as_str);
                discussion::create_entry(client, course_id, topic_id, message, parent).await
            }
            (Resource::Discussion, "markRead") => {
                let course_id = required_str(p, "courseId")?;
                let topic_id = required_str(p, "topicId")?;
                discussion::mark_all_read(client, course_id, topic_id).await
            }

            // Grades
            (Resource::Grade, "getAll") => {
                let course_id = required_str(p, "courseId")?;
                let filters = filters_from(p, "filters")?;
                to_json(grade::list(client, course_id, filters, fetch_arg(p)).await?)
            }
            (Resource::Grade, "update") => {
                let course_id = required_str(p, "courseId")?;
                let assignment_id = required_str(p, "assignmentId")?;
                let student_id = required_str(p, "studentId")?;
                let posted_grade = required_str(p, "grade")?;
                let changes = filters_from(p, "updateOptions")?;
                to_json(
                    grade::update(
                        client,
                        course_id,
                        assignment_id,
                        student_id,
                        posted_grade,
                        changes,
                    )
                    .await?,
                )
            }
            (Resource::Grade, "getGradingPeriods") => {
                let course_id = required_str(p, "courseId")?;
                let options = object(p, "options");
                let account_id = options.get("accountId").and_then(Value::as_str);
                to_json(grade::grading_periods(client, course_id, account_id, fetch_arg(p)).await?)
            }
            (Resource::Grade, "getGradingStandards") => {
                let course_id = required_str(p, "courseId")?;
                let options = object(p, "standardsOptions");
                let account_id = options.get("accountId").and_then(Value::as_str);
                to_json(
                    grade::grading_standards(client, course_id, account_id, fetch_arg(p)).await?,
                )
            }

            // Files
            (Resource::File, "get") => {
                let file_id = required_str(p, "fileId")?;
                to_json(file::get(client, file_id).await?)
            }
            (Resource::File, "getAll") => {
                let context = file_context(p)?;
                let filters = object(p, "filters");
                let search_term = filters.get("searchTerm").and_then(Value::as_str);
                to_json(file::list(client, &context, search_term, fetch_arg(p)).await?)
            }
            (Resource::File, "update") => {
                let file_id = required_str(p, "fileId")?;
                let attrs = object(p, "updateFields");
                to_json(file::update(client, file_id, attrs).await?)
            }
            (Resource::File, "delete") => {
                file::delete(client, required_str(p, "fileId")?).await
            }
            (Resource::File, "download") => {
                file::download(client, required_str(p, "fileId")?).await
            }
            (Resource::File, "upload") => {
                let context = file_context(p)?;
                let binary = item.binary.as_ref().ok_or(CanvasError::MissingBinaryData)?;
                let options = object(p, "uploadOptions");

                let file_name = p
                    .get("fileName")
                    .and_then(Value::as_str)
                    .unwrap_or(&binary.file_name)
                    .to_string();
                let content_type = options
                    .get("contentType")
                    .and_then(Value::as_str)
                    .unwrap_or(&binary.content_type)
                    .to_string();

                let mut upload = FileUpload::new(file_name, content_type, binary.data.clone());
                for (source, target) in [
                    ("parentFolderId", "parent_folder_id"),
                    ("parentFolderPath", "parent_folder_path"),
                    ("onDuplicate", "on_duplicate"),
                ] {
                    if let Some(value) = options.get(source) {
                        upload
                            .additional_params
                            .insert(target.to_string(), value.clone());
                    }
                }
                file::upload(client, &context, upload).await
            }
            (Resource::File, "getFolders") => {
                let context = file_context(p)?;
                to_json(file::folders(client, &context, fetch_arg(p)).await?)
            }
            (Resource::File, "createFolder") => {
                let context = file_context(p)?;
                let name = required_str(p, "folderName")?;
                let options = object(p, "folderOptions");
                let parent = options.get("parentFolderId").and_then(Value::as_str);
                to_json(file::create_folder(client, &context, name, parent).await?)
            }

            // Announcements
            (Resource::Announcement, "create") => {
                let course_id = required_str(p, "courseId")?;
                let title = required_str(p, "title")?;
                let message = required_str(p, "message")?;
                let attrs = object(p, "additionalFields");
                to_json(announcement::create(client, course_id, title, message, attrs).await?)
            }
            (Resource::Announcement, "get") => {
                let course_id = required_str(p, "courseId")?;
                let announcement_id = required_str(p, "announcementId")?;
                to_json(announcement::get(client, course_id, announcement_id).await?)
            }
            (Resource::Announcement, "getAll") => {
                let course_id = required_str(p, "courseId")?;
                let filters = filters_from(p, "filters")?;
                to_json(announcement::list(client, course_id, filters, fetch_arg(p)).await?)
            }
            (Resource::Announcement, "update") => {
                let course_id = required_str(p, "courseId")?;
                let announcement_id = required_str(p, "announcementId")?;
                let attrs = object(p, "updateFields");
                to_json(announcement::update(client, course_id, announcement_id, attrs).await?)
            }
            (Resource::Announcement, "delete") => {
                let course_id = required_str(p, "courseId")?;
                let announcement_id = required_str(p, "announcementId")?;
                announcement::delete(client, course_id, announcement_id).await
            }

            (resource, operation) => Err(CanvasError::UnsupportedOperation {
                resource: resource.name().to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}

fn required_str<'a>(params: &'a Params, key: &'static str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or(CanvasError::MissingParameter(key))
}

/// Read a nested parameter object, defaulting to empty.
fn object(params: &Params, key: &str) -> Params {
    params
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Extract an `include` list from a parameter object.
fn include_list(params: &Params) -> Vec<String> {
    params
        .get("include")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Deserialize a nested parameter object into a typed filter struct.
fn filters_from<T: DeserializeOwned + Default>(params: &Params, key: &str) -> Result<T> {
    match params.get(key) {
        Some(value @ Value::Object(_)) => Ok(serde_json::from_value(value.clone())?),
        _ => Ok(T::default()),
    }
}

/// `returnAll` wins over `limit`; `limit` defaults to 50 when unset.
fn fetch_arg(params: &Params) -> Fetch {
    let return_all = params
        .get("returnAll")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if return_all {
        Fetch::All
    } else {
        let limit = params
            .get("limit")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_LIMIT);
        Fetch::Limit(limit)
    }
}

fn file_context(params: &Params) -> Result<FileContext> {
    let context_type = required_str(params, "contextType")?;
    let context_id = required_str(params, "contextId")?.to_string();
    match context_type {
        "course" => Ok(FileContext::Course(context_id)),
        "group" => Ok(FileContext::Group(context_id)),
        "user" => Ok(FileContext::User(context_id)),
        "folder" => Ok(FileContext::Folder(context_id)),
        _ => Err(CanvasError::MissingParameter("contextType")),
    }
}

fn to_json<T: serde::Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_resource_parsing() {
        assert_eq!("course".parse::<Resource>().unwrap(), Resource::Course);
        assert_eq!(
            "announcement".parse::<Resource>().unwrap(),
            Resource::Announcement
        );
        assert!(matches!(
            "gradebook".parse::<Resource>(),
            Err(CanvasError::UnknownResource(name)) if name == "gradebook"
        ));
    }

    #[test]
    fn test_fetch_arg_defaults_to_limit() {
        assert!(matches!(fetch_arg(&Params::new()), Fetch::Limit(50)));
        assert!(matches!(
            fetch_arg(&params(json!({"limit": 10}))),
            Fetch::Limit(10)
        ));
        assert!(matches!(
            fetch_arg(&params(json!({"returnAll": true, "limit": 10}))),
            Fetch::All
        ));
    }

    #[test]
    fn test_required_str_reports_missing_key() {
        let p = params(json!({"courseId": "42"}));
        assert_eq!(required_str(&p, "courseId").unwrap(), "42");
        assert!(matches!(
            required_str(&p, "userId"),
            Err(CanvasError::MissingParameter("userId"))
        ));
    }

    #[test]
    fn test_include_list_skips_non_strings() {
        let p = params(json!({"include": ["term", 3, "teachers"]}));
        assert_eq!(include_list(&p), vec!["term", "teachers"]);
        assert!(include_list(&Params::new()).is_empty());
    }

    #[test]
    fn test_file_context_endpoints() {
        let p = params(json!({"contextType": "folder", "contextId": "9"}));
        assert!(matches!(
            file_context(&p).unwrap(),
            FileContext::Folder(id) if id == "9"
        ));
        let p = params(json!({"contextType": "section", "contextId": "9"}));
        assert!(file_context(&p).is_err());
    }
}
