//! HTTP-backed suggestion source
//!
//! Tracks a single in-flight request. Dispatching a new request cancels the
//! previous one; completions of cancelled or superseded requests are dropped
//! without being reported.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;

use reqwest::Url;
use tokio_util::sync::CancellationToken;

use super::query::{self, HttpMethod, QueryParams, WireFlags};
use super::worker::{self, FetchJob, WorkerResponse};
use super::{ErrorLogger, FetchRequest, MatchError, MatchSource, RemoteMatch, RequestId};

/// Request options fixed for the lifetime of a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOptions {
    /// Ask the server for similarity matches ("gost" => "ghost")
    pub use_similar: bool,
    /// Input allows multiple separated entries
    pub multi: bool,
    pub method: HttpMethod,
    pub timeout: Option<Duration>,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            use_similar: true,
            multi: false,
            method: HttpMethod::Get,
            timeout: Some(Duration::from_secs(10)),
        }
    }
}

struct InFlight {
    request_id: RequestId,
    token: String,
    cancel_token: CancellationToken,
}

/// Suggestion source that talks to a remote server
pub struct RemoteMatchSource {
    base_url: Url,
    options: RemoteOptions,
    params: QueryParams,
    headers: BTreeMap<String, String>,
    error_logger: Option<Box<dyn ErrorLogger>>,
    job_tx: Sender<FetchJob>,
    response_rx: Receiver<WorkerResponse>,
    request_id: RequestId,
    in_flight: Option<InFlight>,
}

impl RemoteMatchSource {
    /// Create a source with default options
    pub fn new(url: &str) -> Result<Self, MatchError> {
        Self::with_options(url, RemoteOptions::default())
    }

    /// Create a source and spawn its worker thread
    pub fn with_options(url: &str, options: RemoteOptions) -> Result<Self, MatchError> {
        let base_url = parse_url(url)?;
        let (job_tx, job_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();
        worker::spawn_worker(options.timeout, job_rx, response_tx);

        Ok(Self::from_channels(base_url, options, job_tx, response_rx))
    }

    pub(crate) fn from_channels(
        base_url: Url,
        options: RemoteOptions,
        job_tx: Sender<FetchJob>,
        response_rx: Receiver<WorkerResponse>,
    ) -> Self {
        Self {
            base_url,
            options,
            params: QueryParams::new(),
            headers: BTreeMap::new(),
            error_logger: None,
            job_tx,
            response_rx,
            request_id: 0,
            in_flight: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn options(&self) -> &RemoteOptions {
        &self.options
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Replace the extra HTTP headers sent with every request
    pub fn set_headers(&mut self, headers: BTreeMap<String, String>) {
        self.headers = headers;
    }

    pub fn set_error_logger(&mut self, logger: Box<dyn ErrorLogger>) {
        self.error_logger = Some(logger);
    }

    /// Id of the request currently in flight
    pub fn in_flight_request_id(&self) -> Option<RequestId> {
        self.in_flight.as_ref().map(|f| f.request_id)
    }

    fn report(&self, error: &MatchError) {
        log::warn!("Suggestion request failed: {}", error);
        if let Some(logger) = &self.error_logger {
            logger.log(error);
        }
    }

    fn build_job(&self, request_id: RequestId, request: &FetchRequest) -> FetchJob {
        let flags = WireFlags {
            use_similar: self.options.use_similar,
            multi: self.options.multi,
        };
        let pairs = query::request_pairs(&self.base_url, &self.params, request, flags);
        let (url, form) = match self.options.method {
            HttpMethod::Get => (query::request_url(&self.base_url, &pairs), Vec::new()),
            HttpMethod::Post => (self.base_url.clone(), pairs),
        };

        FetchJob {
            request_id,
            token: request.token.clone(),
            method: self.options.method,
            url,
            form,
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Settle the in-flight request without any matches
    fn fail_in_flight(&mut self, error: MatchError) -> Option<RemoteMatch> {
        let in_flight = self.in_flight.take()?;
        self.report(&error);
        Some(RemoteMatch {
            request_id: in_flight.request_id,
            token: in_flight.token,
            matches: Vec::new(),
            total: None,
        })
    }
}

impl MatchSource for RemoteMatchSource {
    fn fetch(&mut self, request: FetchRequest) -> Option<RequestId> {
        if !self.should_fetch(&request.token) {
            return None;
        }

        self.abort();

        self.request_id = self.request_id.wrapping_add(1);
        let request_id = self.request_id;
        let job = self.build_job(request_id, &request);
        let cancel_token = job.cancel_token.clone();

        // A dead worker also closes the response channel, so the failure
        // surfaces through poll_response.
        if self.job_tx.send(job).is_err() {
            log::error!("Suggestion worker is not running");
        } else {
            log::debug!("Dispatched request {} for '{}'", request_id, request.token);
        }
        self.in_flight = Some(InFlight {
            request_id,
            token: request.token,
            cancel_token,
        });
        Some(request_id)
    }

    fn poll_response(&mut self) -> Option<RemoteMatch> {
        loop {
            let response = match self.response_rx.try_recv() {
                Ok(response) => response,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    return self.fail_in_flight(MatchError::FailedRequest {
                        message: "worker disconnected unexpectedly".to_string(),
                    });
                }
            };

            match response {
                WorkerResponse::Cancelled { request_id } => {
                    log::debug!("Dropping cancelled request {}", request_id);
                }
                WorkerResponse::Completed {
                    request_id,
                    token,
                    result,
                } => {
                    if self.in_flight_request_id() != Some(request_id) {
                        log::debug!("Dropping stale response for request {}", request_id);
                        continue;
                    }
                    self.in_flight = None;

                    return Some(match result {
                        Ok(parsed) => {
                            log::debug!(
                                "Request {} returned {} matches",
                                request_id,
                                parsed.matches.len()
                            );
                            RemoteMatch {
                                request_id,
                                token,
                                matches: parsed.matches,
                                total: parsed.total,
                            }
                        }
                        Err(error) => {
                            self.report(&error);
                            RemoteMatch {
                                request_id,
                                token,
                                matches: Vec::new(),
                                total: None,
                            }
                        }
                    });
                }
            }
        }
    }

    fn abort(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            log::debug!("Aborting request {}", in_flight.request_id);
            in_flight.cancel_token.cancel();
        }
    }

    fn params_mut(&mut self) -> &mut QueryParams {
        &mut self.params
    }
}

impl Drop for RemoteMatchSource {
    fn drop(&mut self) {
        self.abort();
    }
}

impl fmt::Debug for RemoteMatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMatchSource")
            .field("base_url", &self.base_url.as_str())
            .field("options", &self.options)
            .field("params", &self.params)
            .field("in_flight", &self.in_flight_request_id())
            .finish()
    }
}

fn parse_url(url: &str) -> Result<Url, MatchError> {
    Url::parse(url).map_err(|e| MatchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod source_tests;
