//! Tests for RemoteMatchSource

use super::*;
use crate::remote::ParsedMatches;
use crate::test_utils::test_helpers::{HttpReply, keys, serve, suggestions};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

struct Harness {
    source: RemoteMatchSource,
    jobs: Receiver<FetchJob>,
    responses: Sender<WorkerResponse>,
}

fn harness() -> Harness {
    let (job_tx, job_rx) = mpsc::channel();
    let (response_tx, response_rx) = mpsc::channel();
    let source = RemoteMatchSource::from_channels(
        Url::parse("http://localhost/suggest?lang=en").unwrap(),
        RemoteOptions::default(),
        job_tx,
        response_rx,
    );
    Harness {
        source,
        jobs: job_rx,
        responses: response_tx,
    }
}

fn completed(request_id: RequestId, token: &str, items: &[&str]) -> WorkerResponse {
    WorkerResponse::Completed {
        request_id,
        token: token.to_string(),
        result: Ok(ParsedMatches {
            matches: suggestions(items),
            total: None,
        }),
    }
}

/// Poll a live source until it settles or the deadline passes
fn wait_for(source: &mut RemoteMatchSource) -> RemoteMatch {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(remote) = source.poll_response() {
            return remote;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("source did not settle in time");
}

#[test]
fn test_blank_token_is_not_fetched() {
    let mut h = harness();
    assert_eq!(h.source.fetch(FetchRequest::new("  ", Some(10))), None);
    assert!(h.jobs.try_recv().is_err());
    assert_eq!(h.source.in_flight_request_id(), None);
}

#[test]
fn test_fetch_builds_get_url() {
    let mut h = harness();
    h.source.params_mut().set("scope", "people");

    let id = h.source.fetch(FetchRequest::new("gost", Some(100))).unwrap();
    let job = h.jobs.try_recv().unwrap();

    assert_eq!(job.request_id, id);
    assert_eq!(job.method, HttpMethod::Get);
    assert!(job.form.is_empty());
    assert_eq!(
        job.url.as_str(),
        concat!(
            "http://localhost/suggest?lang=en&scope=people",
            "&token=gost&max_matches=100&use_similar=1&multi=0"
        )
    );
}

#[test]
fn test_new_fetch_cancels_previous() {
    let mut h = harness();
    h.source.fetch(FetchRequest::new("go", Some(10)));
    h.source.fetch(FetchRequest::new("gos", Some(10)));

    let first = h.jobs.try_recv().unwrap();
    let second = h.jobs.try_recv().unwrap();
    assert!(first.cancel_token.is_cancelled());
    assert!(!second.cancel_token.is_cancelled());
    assert_eq!(h.source.in_flight_request_id(), Some(second.request_id));
}

#[test]
fn test_stale_and_cancelled_responses_are_dropped() {
    let mut h = harness();
    let old = h.source.fetch(FetchRequest::new("go", Some(10))).unwrap();
    let current = h.source.fetch(FetchRequest::new("gos", Some(10))).unwrap();

    h.responses
        .send(WorkerResponse::Cancelled { request_id: old })
        .unwrap();
    h.responses.send(completed(old, "go", &["goat"])).unwrap();
    assert!(h.source.poll_response().is_none());

    h.responses
        .send(completed(current, "gos", &["gosling"]))
        .unwrap();
    let remote = h.source.poll_response().unwrap();
    assert_eq!(remote.request_id, current);
    assert_eq!(remote.token, "gos");
    assert_eq!(keys(&remote.matches), vec!["gosling"]);
    assert_eq!(h.source.in_flight_request_id(), None);
}

#[test]
fn test_failure_yields_empty_matches_and_logs() {
    let mut h = harness();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    h.source
        .set_error_logger(Box::new(move |e: &MatchError| sink.borrow_mut().push(e.clone())));

    let id = h.source.fetch(FetchRequest::new("gost", Some(10))).unwrap();
    h.responses
        .send(WorkerResponse::Completed {
            request_id: id,
            token: "gost".to_string(),
            result: Err(MatchError::InvalidResponse {
                message: "bad".to_string(),
            }),
        })
        .unwrap();

    let remote = h.source.poll_response().unwrap();
    assert!(remote.matches.is_empty());
    assert_eq!(
        seen.borrow().as_slice(),
        [MatchError::InvalidResponse {
            message: "bad".to_string()
        }]
    );
}

#[test]
fn test_worker_disconnect_fails_in_flight() {
    let mut h = harness();
    let id = h.source.fetch(FetchRequest::new("gost", Some(10))).unwrap();
    drop(h.responses);

    let remote = h.source.poll_response().unwrap();
    assert_eq!(remote.request_id, id);
    assert!(remote.matches.is_empty());
    assert!(h.source.poll_response().is_none());
}

#[test]
fn test_drop_cancels_in_flight() {
    let mut h = harness();
    h.source.fetch(FetchRequest::new("gost", Some(10)));
    let job = h.jobs.try_recv().unwrap();
    drop(h.source);
    assert!(job.cancel_token.is_cancelled());
}

#[test]
fn test_invalid_url_is_rejected() {
    let err = RemoteMatchSource::new("not a url").unwrap_err();
    assert!(matches!(err, MatchError::InvalidUrl { .. }));
}

#[test]
fn test_live_get_round_trip() {
    let server = serve(HttpReply::ok(r#"{"matches": ["ghost", "post"], "total": 2}"#));
    let mut source = RemoteMatchSource::new(&server.url).unwrap();
    source.set_headers(BTreeMap::from([(
        "X-Client".to_string(),
        "typeahead".to_string(),
    )]));

    source.fetch(FetchRequest::new("gost", Some(100))).unwrap();
    let remote = wait_for(&mut source);
    assert_eq!(keys(&remote.matches), vec!["ghost", "post"]);
    assert_eq!(remote.total, Some(2));

    let request = server.requests.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(request.starts_with("GET /suggest?token=gost&max_matches=100"));
    assert!(request.to_lowercase().contains("x-client: typeahead"));
}

#[test]
fn test_live_post_sends_form_body() {
    let server = serve(HttpReply::ok(r#"["ghost"]"#));
    let options = RemoteOptions {
        method: HttpMethod::Post,
        ..RemoteOptions::default()
    };
    let mut source = RemoteMatchSource::with_options(&server.url, options).unwrap();

    source.fetch(FetchRequest::new("gost", Some(5))).unwrap();
    let remote = wait_for(&mut source);
    assert_eq!(keys(&remote.matches), vec!["ghost"]);

    let request = server.requests.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(request.starts_with("POST /suggest "));
    assert!(request.ends_with("token=gost&max_matches=5&use_similar=1&multi=0"));
}

#[test]
fn test_live_server_error_degrades_to_empty() {
    let server = serve(HttpReply::status(503, "unavailable"));
    let mut source = RemoteMatchSource::new(&server.url).unwrap();

    source.fetch(FetchRequest::new("gost", Some(5))).unwrap();
    let remote = wait_for(&mut source);
    assert!(remote.matches.is_empty());
}
