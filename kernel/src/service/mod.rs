// Transcript Service Façade
//
// Maps transport-neutral requests (method + path + optional JSON body)
// onto exactly one store call and turns the outcome into a response.
// Request shape is checked here; business rules stay in the store.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info_span, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::store::{PreconditionError, StoreError, TranscriptStore};
use crate::transcript::StudentId;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

/// Inbound request.
///
/// `path` may carry an inline `?key=value` query; it is merged into `query`
/// before routing, with explicit `query` entries taking precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    pub method: Method,
    pub path: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, target: &str) -> Self {
        Self {
            method,
            path: target.to_owned(),
            query: BTreeMap::new(),
            body: None,
        }
        .normalized()
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn post(target: &str, body: Value) -> Self {
        Self::new(Method::Post, target).with_body(body)
    }

    pub fn patch(target: &str, body: Value) -> Self {
        Self::new(Method::Patch, target).with_body(body)
    }

    pub fn delete(target: &str) -> Self {
        Self::new(Method::Delete, target)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn normalized(mut self) -> Self {
        if let Some((path, inline)) = self.path.split_once('?') {
            for pair in inline.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                self.query
                    .entry(key.to_owned())
                    .or_insert_with(|| value.to_owned());
            }
            self.path = path.to_owned();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self {
            status: STATUS_OK,
            body,
        }
    }

    pub fn bad_request(message: impl fmt::Display) -> Self {
        Self::error(STATUS_BAD_REQUEST, message)
    }

    pub fn not_found(message: impl fmt::Display) -> Self {
        Self::error(STATUS_NOT_FOUND, message)
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    fn error(status: u16, message: impl fmt::Display) -> Self {
        Self {
            status,
            body: json!({ "error": message.to_string() }),
        }
    }
}

impl From<StoreError> for Response {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::Validation(_) => STATUS_BAD_REQUEST,
            StoreError::Precondition(
                PreconditionError::DuplicateCourse { .. } | PreconditionError::IdInUse(_),
            ) => STATUS_BAD_REQUEST,
            StoreError::Precondition(_) => STATUS_NOT_FOUND,
        };
        Response::error(status, err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    ListTranscripts,
    AddStudent,
    GetTranscript(&'a str),
    DeleteStudent(&'a str),
    StudentIds,
    AddGrade(&'a str, &'a str),
    UpdateGrade(&'a str, &'a str),
    GetGrade(&'a str, &'a str),
    Initialize,
}

impl Route<'_> {
    fn is_mutation(self) -> bool {
        !matches!(
            self,
            Route::ListTranscripts
                | Route::GetTranscript(_)
                | Route::StudentIds
                | Route::GetGrade(..)
        )
    }
}

fn route(method: Method, path: &str) -> Option<Route<'_>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let route = match (method, segments.as_slice()) {
        (Method::Get, ["transcripts"]) => Route::ListTranscripts,
        (Method::Post, ["transcripts"] | ["transcripts", "addStudent"]) => Route::AddStudent,
        (Method::Get, ["transcripts", id]) => Route::GetTranscript(*id),
        (Method::Delete, ["transcripts", id]) => Route::DeleteStudent(*id),
        (Method::Get, ["studentids"]) => Route::StudentIds,
        (Method::Post, ["transcripts", id, course]) => Route::AddGrade(*id, *course),
        (Method::Patch, ["transcripts", id, course]) => Route::UpdateGrade(*id, *course),
        (Method::Get, ["transcripts", id, course]) => Route::GetGrade(*id, *course),
        (Method::Post, ["initialize"]) => Route::Initialize,
        _ => return None,
    };
    Some(route)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AddStudentBody {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GradeBody {
    grade: Option<f64>,
}

/// Request handler owning the store.
///
/// Each request runs exactly one store operation under the lock, so
/// concurrent callers never observe a half-applied mutation.
#[derive(Debug, Default)]
pub struct TranscriptService {
    store: Mutex<TranscriptStore>,
}

impl TranscriptService {
    pub fn new(store: TranscriptStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        let store = if config.seed_on_start {
            TranscriptStore::seeded()
        } else {
            TranscriptStore::new()
        };
        Self::new(store)
    }

    /// Parse one JSON-encoded request and handle it. Malformed input is
    /// answered with a bad-request response rather than an error.
    pub fn handle_json(&self, raw: &str) -> Response {
        match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.handle(request),
            Err(err) => {
                warn!(%err, "malformed request");
                Response::bad_request(format!("malformed request: {err}"))
            }
        }
    }

    pub fn handle(&self, request: Request) -> Response {
        let request = request.normalized();
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "request",
            %request_id,
            method = %request.method,
            path = %request.path
        );
        let _guard = span.enter();
        debug!("handling request");

        let response = match route(request.method, &request.path) {
            Some(route) => self.dispatch(route, &request),
            None => {
                let message = format!(
                    "unknown {} request \"{}\"",
                    request.method,
                    request.path.trim_start_matches('/')
                );
                warn!("{message}");
                Response::not_found(message)
            }
        };

        if !response.is_success() {
            debug!(status = response.status, body = %response.body, "request rejected");
        }
        response
    }

    /// Run a closure against the store directly, under the same lock that
    /// requests use.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut TranscriptStore) -> R) -> R {
        f(&mut *self.store.lock())
    }

    fn dispatch(&self, route: Route<'_>, request: &Request) -> Response {
        let mut store = self.store.lock();

        let response = match route {
            Route::ListTranscripts => json_response(&store.get_all().collect::<Vec<_>>()),

            Route::AddStudent => {
                let body: AddStudentBody = match parse_body(request) {
                    Ok(body) => body,
                    Err(response) => return response,
                };
                let name = body.name.unwrap_or_default();
                match store.add_student(&name) {
                    Ok(id) => Response::ok(json!({ "studentID": id })),
                    Err(err) => err.into(),
                }
            }

            Route::GetTranscript(raw_id) => {
                let id = match parse_id(raw_id) {
                    Ok(id) => id,
                    Err(response) => return response,
                };
                match store.get_transcript(id) {
                    Some(transcript) => json_response(transcript),
                    None => Response::not_found(format!("No student with id = {id}")),
                }
            }

            Route::DeleteStudent(raw_id) => {
                let id = match parse_id(raw_id) {
                    Ok(id) => id,
                    Err(response) => return response,
                };
                match store.delete_student(id) {
                    Ok(()) => Response::ok(json!({ "deleted": id })),
                    Err(err) => err.into(),
                }
            }

            Route::StudentIds => match request.query.get("name") {
                Some(name) if !name.is_empty() => json_response(&store.get_student_ids(name)),
                _ => Response::bad_request("missing 'name' query parameter"),
            },

            Route::AddGrade(raw_id, course) | Route::UpdateGrade(raw_id, course) => {
                let id = match parse_id(raw_id) {
                    Ok(id) => id,
                    Err(response) => return response,
                };
                let body: GradeBody = match parse_body(request) {
                    Ok(body) => body,
                    Err(response) => return response,
                };
                let Some(score) = body.grade else {
                    return Response::bad_request("grade is required");
                };
                let result = if matches!(route, Route::AddGrade(..)) {
                    store.add_grade(id, course, score)
                } else {
                    store.update_grade(id, course, score)
                };
                match result {
                    Ok(grade) => Response::ok(json!(grade)),
                    Err(err) => err.into(),
                }
            }

            Route::GetGrade(raw_id, course) => {
                let id = match parse_id(raw_id) {
                    Ok(id) => id,
                    Err(response) => return response,
                };
                match store.get_grade(id, course) {
                    Some(grade) => Response::ok(json!(grade)),
                    None => Response::not_found(format!(
                        "No grade for course `{course}` for student with id = {id}"
                    )),
                }
            }

            Route::Initialize => {
                store.initialize();
                Response::ok(json!({ "students": store.len() }))
            }
        };

        if route.is_mutation() {
            if let Err(violation) = store.verify() {
                error!(%violation, "store invariant violated");
            }
        }
        response
    }
}

fn parse_id(raw: &str) -> Result<StudentId, Response> {
    raw.parse::<u64>()
        .map(StudentId)
        .map_err(|_| Response::not_found(format!("No student with id = {raw}")))
}

fn parse_body<T: serde::de::DeserializeOwned>(request: &Request) -> Result<T, Response> {
    let body = request.body.clone().unwrap_or_else(|| json!({}));
    serde_json::from_value(body)
        .map_err(|err| Response::bad_request(format!("malformed request body: {err}")))
}

fn json_response<T: Serialize + ?Sized>(value: &T) -> Response {
    match serde_json::to_value(value) {
        Ok(body) => Response::ok(body),
        Err(err) => {
            error!(%err, "failed to serialize response");
            Response::error(500, "internal serialization failure")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TranscriptService {
        TranscriptService::new(TranscriptStore::seeded())
    }

    #[test]
    fn routes_cover_the_rest_surface() {
        assert_eq!(route(Method::Get, "/transcripts"), Some(Route::ListTranscripts));
        assert_eq!(route(Method::Post, "/transcripts"), Some(Route::AddStudent));
        assert_eq!(
            route(Method::Post, "/transcripts/addStudent"),
            Some(Route::AddStudent)
        );
        assert_eq!(
            route(Method::Get, "/transcripts/3/"),
            Some(Route::GetTranscript("3"))
        );
        assert_eq!(
            route(Method::Patch, "/transcripts/3/CS360"),
            Some(Route::UpdateGrade("3", "CS360"))
        );
        assert_eq!(route(Method::Delete, "/transcripts"), None);
        assert_eq!(route(Method::Get, "/grades"), None);
    }

    #[test]
    fn inline_query_is_merged() {
        let request = Request::get("/studentids?name=Jasur");

        assert_eq!(request.path, "/studentids");
        assert_eq!(request.query.get("name").map(String::as_str), Some("Jasur"));
    }

    #[test]
    fn unknown_route_is_reported() {
        let response = service().handle(Request::get("/nope/nothing"));

        assert_eq!(response.status, STATUS_NOT_FOUND);
        assert_eq!(
            response.body,
            json!({ "error": "unknown GET request \"nope/nothing\"" })
        );
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let validation: Response = StoreError::Validation(
            crate::validation::ValidationError::MissingName,
        )
        .into();
        assert_eq!(validation.status, STATUS_BAD_REQUEST);

        let duplicate: Response = StoreError::Precondition(PreconditionError::DuplicateCourse {
            student: StudentId(1),
            course: "CS360".into(),
        })
        .into();
        assert_eq!(duplicate.status, STATUS_BAD_REQUEST);

        let unknown: Response =
            StoreError::Precondition(PreconditionError::UnknownStudent(StudentId(9))).into();
        assert_eq!(unknown.status, STATUS_NOT_FOUND);
    }

    #[test]
    fn non_numeric_id_names_no_student() {
        let service = service();

        for request in [
            Request::get("/transcripts/abc"),
            Request::get("/transcripts/addStudent"),
            Request::get("/transcripts/abc/CS360"),
            Request::delete("/transcripts/abc"),
        ] {
            let response = service.handle(request);
            assert_eq!(response.status, STATUS_NOT_FOUND, "{:?}", response.body);
        }
        assert_eq!(service.with_store(|s| s.len()), 4);
    }

    #[test]
    fn missing_grade_is_a_bad_request() {
        let service = service();
        let response = service.handle(Request::post("/transcripts/1/CS360", json!({})));

        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert_eq!(
            service.with_store(|s| s.get_grade(StudentId(1), "CS360")),
            None
        );
    }

    #[test]
    fn malformed_json_is_answered_not_raised() {
        let response = service().handle_json("{ not json");
        assert_eq!(response.status, STATUS_BAD_REQUEST);

        let response = service().handle_json(r#"{ "method": "PUT", "path": "/transcripts" }"#);
        assert_eq!(response.status, STATUS_BAD_REQUEST);
    }
}
