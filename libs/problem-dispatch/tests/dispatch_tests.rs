#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end dispatch tests
//!
//! These tests feed every kind of request error through the dispatcher and check
//! the single response it writes.

use std::sync::{Arc, Mutex};

use http::header::{ALLOW, CONTENT_TYPE};
use http::{Method, StatusCode};
use problem_details::{APPLICATION_PROBLEM_JSON, SUPPORT_TEXT};
use problem_dispatch::{
    CodedError, DispatchConfig, Dispatcher, FailureLogger, FieldError, MethodNotAllowed,
    ProblemResponse, REQUIRED_CODE, RequestError, RequestInfo,
};
use serde_json::Value;
use tracing_test::traced_test;

#[derive(Debug, Clone, Default)]
struct RecordingLogger {
    seen: Arc<Mutex<Vec<Option<String>>>>,
}

impl RecordingLogger {
    fn entries(&self) -> Vec<Option<String>> {
        self.seen.lock().unwrap().clone()
    }
}

impl FailureLogger for RecordingLogger {
    fn unknown_error(&self, error: Option<&RequestError>, _request: &RequestInfo) {
        self.seen
            .lock()
            .unwrap()
            .push(error.map(ToString::to_string));
    }
}

fn get(uri: &str) -> RequestInfo {
    RequestInfo::new(Method::GET, uri)
}

fn body_json(resp: &ProblemResponse) -> Value {
    serde_json::from_slice(resp.body().expect("response has a body")).unwrap()
}

fn validation(name: &str, location: &str, code: u16) -> RequestError {
    RequestError::Validation(FieldError::new(
        name,
        location,
        code,
        format!("{name} in {location} failed"),
    ))
}

#[test]
fn invalid_body_field_reports_body_problem() {
    let err = RequestError::composite([RequestError::Validation(FieldError::invalid_type(
        "email", "body", "string",
    ))]);
    let resp = Dispatcher::default().respond(Some(&err), &get("/users"));

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.header(&CONTENT_TYPE), Some("application/json"));
    let json = body_json(&resp);
    assert_eq!(json["type"], "/users");
    assert_eq!(json["title"], "Invalid body parameter!");
    assert_eq!(json["code"], "Bad Request");
    assert_eq!(json["instance"], "client");
    assert_eq!(
        json["invalidParams"],
        serde_json::json!([{ "param": "email", "reason": "email in body must be of type string" }])
    );
}

#[test]
fn missing_body_beats_missing_query() {
    let err = RequestError::composite([
        RequestError::Validation(FieldError::required("limit", "query")),
        RequestError::Validation(FieldError::required("email", "body")),
    ]);
    let resp = Dispatcher::default().respond(Some(&err), &get("/users?limit="));

    let json = body_json(&resp);
    assert_eq!(json["title"], "Mandatory parameter missing!");
    let params = json["invalidParams"].as_array().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0]["param"], "email");
}

#[test]
fn invalid_body_beats_missing_body() {
    let err = RequestError::composite([
        validation("email", "body", REQUIRED_CODE),
        validation("age", "body", 601),
    ]);
    let json = body_json(&Dispatcher::default().respond(Some(&err), &get("/u")));
    assert_eq!(json["title"], "Invalid body parameter!");
    assert_eq!(json["invalidParams"][0]["param"], "age");
}

#[test]
fn priority_walks_down_to_header() {
    let cases = [
        (
            vec![
                validation("X-Trace", "header", 601),
                validation("id", "path", 601),
                validation("q", "query", REQUIRED_CODE),
            ],
            "Mandatory parameter missing!",
        ),
        (
            vec![
                validation("X-Trace", "header", 601),
                validation("q", "query", 601),
                validation("id", "path", 601),
            ],
            "Invalid query parameter!",
        ),
        (
            vec![
                validation("X-Trace", "header", 601),
                validation("id", "path", REQUIRED_CODE),
            ],
            "Invalid path parameter!",
        ),
        (
            vec![
                validation("file", "formData", 601),
                validation("X-Trace", "header", REQUIRED_CODE),
            ],
            "Invalid header parameter!",
        ),
        (
            vec![validation("file", "formData", 601)],
            "Invalid message format!",
        ),
    ];

    for (leaves, expected) in cases {
        let err = RequestError::composite(leaves);
        let json = body_json(&Dispatcher::default().respond(Some(&err), &get("/p")));
        assert_eq!(json["title"], expected);
        assert_eq!(json["status"], 400);
    }
}

#[test]
fn structural_body_error_is_invalid_message_format() {
    let err = RequestError::composite([RequestError::Validation(FieldError::required(
        "body", "body",
    ))]);
    let json = body_json(&Dispatcher::default().respond(Some(&err), &get("/listings")));
    assert_eq!(json["title"], "Invalid message format!");
    assert_eq!(json["detail"], "The HTTP request has an invalid format!");
    assert_eq!(json["invalidParams"][0]["param"], "body");
}

#[test]
fn nested_composites_are_flattened_in_order() {
    let err = RequestError::composite([
        RequestError::composite([]),
        RequestError::composite([RequestError::composite([
            validation("b", "body", 601),
            validation("x", "query", 601),
        ])]),
        validation("a", "body", 601),
    ]);
    let json = body_json(&Dispatcher::default().respond(Some(&err), &get("/n")));
    let names: Vec<_> = json["invalidParams"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["param"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(names, ["b", "a"]);
}

#[test]
fn single_validation_leaf_is_bucketed() {
    let err = validation("page", "query", 601);
    let json = body_json(&Dispatcher::default().respond(Some(&err), &get("/l?page=x")));
    assert_eq!(json["title"], "Invalid query parameter!");
    assert_eq!(json["type"], "/l?page=x");
}

#[test]
fn body_parse_leaf_is_bucketed() {
    let err = RequestError::composite([RequestError::Parse(FieldError::new(
        "price", "body", 400, "parsing price body from \"abc\" failed",
    ))]);
    let json = body_json(&Dispatcher::default().respond(Some(&err), &get("/offers")));
    assert_eq!(json["title"], "Invalid body parameter!");
    assert_eq!(json["invalidParams"][0]["reason"], "parsing price body from \"abc\" failed");
}

#[test]
fn non_body_parse_leaf_replaces_composite() {
    let err = RequestError::composite([
        validation("email", "body", 601),
        RequestError::Parse(FieldError::new("limit", "query", 400, "limit is not a number")),
    ]);
    let resp = Dispatcher::default().respond(Some(&err), &get("/l"));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(&resp);
    assert_eq!(json["title"], "Bad request!");
    assert_eq!(
        json["detail"],
        "There was a problem with the request! limit is not a number"
    );
    assert!(json.get("invalidParams").is_none());
}

#[test]
fn method_not_allowed_inside_composite() {
    let err = RequestError::composite([RequestError::from(MethodNotAllowed::new(
        "PUT",
        ["GET", "POST"],
    ))]);
    let resp = Dispatcher::default().respond(Some(&err), &get("/test"));
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.header(&ALLOW), Some("GET,POST"));
}

#[test]
fn method_not_allowed_for_get_writes_body() {
    let err = RequestError::from(MethodNotAllowed::new("GET", ["GET", "POST"]));
    let resp = Dispatcher::default().respond(Some(&err), &get("/listings"));

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.header(&ALLOW), Some("GET,POST"));
    let json = body_json(&resp);
    assert_eq!(json["code"], "Method Not Allowed");
    assert_eq!(json["status"], 405);
}

#[test]
fn method_not_allowed_for_head_writes_header_only() {
    let err = RequestError::from(MethodNotAllowed::new("HEAD", ["GET", "POST"]));
    let resp =
        Dispatcher::default().respond(Some(&err), &RequestInfo::new(Method::HEAD, "/listings"));

    assert_eq!(resp.header(&ALLOW), Some("GET,POST"));
    assert!(resp.body().is_none());
}

#[test]
fn coded_errors() {
    let dispatcher = Dispatcher::default();

    let err = RequestError::from(CodedError::new(400, "bad token format"));
    let json = body_json(&dispatcher.respond(Some(&err), &get("/a")));
    assert_eq!(json["status"], 400);
    assert_eq!(
        json["detail"],
        "There was a problem with the request! bad token format"
    );

    let err = RequestError::from(CodedError::new(401, "expired"));
    let json = body_json(&dispatcher.respond(Some(&err), &get("/a")));
    assert_eq!(json["status"], 401);
    assert_eq!(json["title"], "Unauthorized access!");
    assert_eq!(
        json["detail"],
        "The request doesn't have permissions to access resources!"
    );
    assert_eq!(json["instance"], "api");
}

#[test]
fn coded_not_found_appends_message() {
    let err = RequestError::from(CodedError::new(404, "listing 7"));
    let resp = Dispatcher::default().respond(Some(&err), &get("/listings/7"));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(&resp);
    assert_eq!(json["detail"], "Requested resource does not exist! listing 7");
    assert_eq!(json["type"], "/listings/7");
}

#[test]
fn fallbacks_are_logged_once_and_return_500() {
    let logger = RecordingLogger::default();
    let dispatcher = Dispatcher::default().with_logger(logger.clone());

    let empty = RequestError::composite([RequestError::composite([])]);
    let teapot = RequestError::from(CodedError::new(418, "teapot"));
    let opaque = RequestError::opaque(std::io::Error::other("disk on fire"));

    for err in [None, Some(&empty), Some(&teapot), Some(&opaque)] {
        let resp = dispatcher.respond(err, &get("/boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(&resp);
        assert_eq!(json["title"], "System failure!");
        assert_eq!(json["code"], "Internal Server Error");
        assert_eq!(json["type"], "/boom");
        assert!(json["detail"].as_str().unwrap().ends_with(SUPPORT_TEXT));
        assert!(!json["detail"].as_str().unwrap().contains("disk on fire"));
    }

    assert_eq!(
        logger.entries(),
        vec![
            None,
            Some(empty.to_string()),
            Some("teapot".to_owned()),
            Some("disk on fire".to_owned()),
        ]
    );
}

#[test]
fn classified_errors_are_not_logged_as_unknown() {
    let logger = RecordingLogger::default();
    let dispatcher = Dispatcher::default().with_logger(logger.clone());
    let err = RequestError::composite([validation("email", "body", 601)]);
    let resp = dispatcher.respond(Some(&err), &get("/x"));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(logger.entries().is_empty());
}

#[test]
#[traced_test]
fn default_logger_reports_unknown_errors() {
    let err = RequestError::opaque(std::io::Error::other("socket closed"));
    let resp = Dispatcher::default().respond(Some(&err), &get("/sock"));
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(logs_contain("Unknown error"));
    assert!(logs_contain("socket closed"));
}

#[test]
fn dispatch_is_deterministic() {
    let err = RequestError::composite([
        validation("q", "query", REQUIRED_CODE),
        validation("email", "body", REQUIRED_CODE),
        validation("name", "body", REQUIRED_CODE),
    ]);
    let dispatcher = Dispatcher::default();
    let first = dispatcher.respond(Some(&err), &get("/same"));
    for _ in 0..10 {
        let again = dispatcher.respond(Some(&err), &get("/same"));
        assert_eq!(again.status(), first.status());
        assert_eq!(again.body(), first.body());
    }
}

#[test]
fn configured_content_type_and_support_text() {
    let config = DispatchConfig::from_json_str(&format!(
        r#"{{"content_type":"{APPLICATION_PROBLEM_JSON}","support_text":" Call us."}}"#
    ))
    .unwrap();
    let dispatcher = Dispatcher::new(config);

    let resp = dispatcher.respond(None, &get("/c"));
    assert_eq!(resp.header(&CONTENT_TYPE), Some(APPLICATION_PROBLEM_JSON));
    let json = body_json(&resp);
    assert_eq!(
        json["detail"],
        "We are sorry, but there is an internal problem with the application! Call us."
    );
}

#[test]
fn body_serialization_is_stable() {
    let err = RequestError::from(CodedError::new(404, "user 9"));
    let resp = Dispatcher::default().respond(Some(&err), &get("/users/9"));
    assert_eq!(
        std::str::from_utf8(resp.body().unwrap()).unwrap(),
        r#"{"type":"/users/9","title":"Resource not found!","status":404,"code":"Not Found","detail":"Requested resource does not exist! user 9","instance":"client"}"#
    );
}
