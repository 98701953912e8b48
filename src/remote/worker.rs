//! Suggestion fetch worker thread
//!
//! Runs HTTP requests on a background thread so the engine never blocks on
//! the network. Receives jobs via channel, races each request against its
//! cancellation token, and sends the settled result back to the owner.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use reqwest::{Client, Url};
use tokio_util::sync::CancellationToken;

use super::parser::{ParsedMatches, parse_response_text};
use super::query::HttpMethod;
use super::{MatchError, RequestId};

/// One request handed to the worker
#[derive(Debug)]
pub(crate) struct FetchJob {
    pub request_id: RequestId,
    pub token: String,
    pub method: HttpMethod,
    pub url: Url,
    /// Form parameters, sent as the body of a POST
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub cancel_token: CancellationToken,
}

/// Messages sent back from the worker thread
#[derive(Debug)]
pub(crate) enum WorkerResponse {
    /// The request settled, successfully or not
    Completed {
        request_id: RequestId,
        token: String,
        result: Result<ParsedMatches, MatchError>,
    },
    /// The request was aborted before it settled
    Cancelled { request_id: RequestId },
}

/// Spawn the fetch worker thread
///
/// The thread owns a single-threaded tokio runtime and exits once the job
/// channel is closed.
pub(crate) fn spawn_worker(
    timeout: Option<Duration>,
    job_rx: Receiver<FetchJob>,
    response_tx: Sender<WorkerResponse>,
) {
    let client = build_client(timeout);

    std::thread::spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime");

            rt.block_on(worker_loop(client, job_rx, response_tx));
        }));

        if let Err(e) = result {
            let panic_msg = if let Some(s) = e.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = e.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            log::error!("Suggestion worker thread panicked: {}", panic_msg);
        }
    });
}

fn build_client(timeout: Option<Duration>) -> Result<Client, MatchError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| MatchError::FailedRequest {
        message: format!("Failed to build HTTP client: {}", e),
    })
}

/// Process jobs until the channel is closed
///
/// Blocking `recv()` is fine here since this runs on a dedicated thread.
pub(crate) async fn worker_loop(
    client: Result<Client, MatchError>,
    job_rx: Receiver<FetchJob>,
    response_tx: Sender<WorkerResponse>,
) {
    while let Ok(job) = job_rx.recv() {
        let response = handle_job(&client, job).await;
        if response_tx.send(response).is_err() {
            // Owner is gone; nobody is listening anymore
            log::debug!("Suggestion worker response channel closed");
            break;
        }
    }
}

async fn handle_job(client: &Result<Client, MatchError>, job: FetchJob) -> WorkerResponse {
    let request_id = job.request_id;

    if job.cancel_token.is_cancelled() {
        return WorkerResponse::Cancelled { request_id };
    }

    let client = match client {
        Ok(client) => client,
        Err(e) => {
            return WorkerResponse::Completed {
                request_id,
                token: job.token,
                result: Err(e.clone()),
            };
        }
    };

    let result = tokio::select! {
        biased;

        _ = job.cancel_token.cancelled() => {
            log::debug!("Request {} cancelled in flight", request_id);
            Err(MatchError::Cancelled)
        }

        result = execute(client, &job) => result,
    };

    match result {
        Err(MatchError::Cancelled) => WorkerResponse::Cancelled { request_id },
        result => WorkerResponse::Completed {
            request_id,
            token: job.token,
            result,
        },
    }
}

async fn execute(client: &Client, job: &FetchJob) -> Result<ParsedMatches, MatchError> {
    log::debug!("Request {}: {} {}", job.request_id, method_name(job.method), job.url);

    let mut builder = match job.method {
        HttpMethod::Get => client.get(job.url.clone()),
        HttpMethod::Post => client.post(job.url.clone()).form(&job.form),
    };
    for (name, value) in &job.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = builder
        .send()
        .await
        .map_err(|e| MatchError::FailedRequest {
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(MatchError::FailedRequest {
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| MatchError::FailedRequest {
            message: e.to_string(),
        })?;

    parse_response_text(&text)
}

fn method_name(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "GET",
        HttpMethod::Post => "POST",
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod worker_tests;
