//! Shared test utilities
//!
//! Provides a scripted MatchSource for engine tests and a tiny blocking
//! HTTP server for exercising the real fetch path.

#[cfg(test)]
pub mod test_helpers {
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::remote::{
        FetchRequest, MatchSource, QueryParams, RemoteMatch, RequestId, is_fetchable,
    };
    use crate::suggestion::RemoteSuggestion;

    /// Build shared suggestions from plain strings
    pub fn suggestions(items: &[&str]) -> Vec<Arc<RemoteSuggestion>> {
        items
            .iter()
            .map(|s| Arc::new(RemoteSuggestion::text(*s)))
            .collect()
    }

    /// Display keys of a suggestion list
    pub fn keys(list: &[Arc<RemoteSuggestion>]) -> Vec<String> {
        list.iter().map(|s| s.display_key().to_string()).collect()
    }

    /// A dispatched request as seen by the fake source
    #[derive(Debug, Clone)]
    pub struct SentRequest {
        pub id: RequestId,
        pub request: FetchRequest,
        pub params: QueryParams,
    }

    /// MatchSource that records requests and answers only when told to
    #[derive(Debug, Default)]
    pub struct FakeSource {
        pub sent: Vec<SentRequest>,
        pub aborted: usize,
        params: QueryParams,
        next_id: RequestId,
        in_flight: Option<RequestId>,
        ready: VecDeque<RemoteMatch>,
    }

    impl FakeSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Complete the in-flight request with the given items
        pub fn respond(&mut self, items: &[&str]) {
            let id = self.in_flight.take().expect("no request in flight");
            self.push_response(id, items);
        }

        /// Queue a completion for an arbitrary request id
        pub fn push_response(&mut self, id: RequestId, items: &[&str]) {
            let token = self
                .sent
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.request.token.clone())
                .unwrap_or_default();
            self.ready.push_back(RemoteMatch {
                request_id: id,
                token,
                matches: suggestions(items),
                total: Some(items.len() as u64),
            });
        }

        pub fn last_token(&self) -> Option<&str> {
            self.sent.last().map(|s| s.request.token.as_str())
        }

        pub fn in_flight(&self) -> Option<RequestId> {
            self.in_flight
        }
    }

    impl MatchSource for FakeSource {
        fn fetch(&mut self, request: FetchRequest) -> Option<RequestId> {
            if !is_fetchable(&request.token) {
                return None;
            }
            if self.in_flight.is_some() {
                self.aborted += 1;
            }
            self.next_id += 1;
            let id = self.next_id;
            self.in_flight = Some(id);
            self.sent.push(SentRequest {
                id,
                request,
                params: self.params.clone(),
            });
            Some(id)
        }

        fn poll_response(&mut self) -> Option<RemoteMatch> {
            self.ready.pop_front()
        }

        fn abort(&mut self) {
            if self.in_flight.take().is_some() {
                self.aborted += 1;
            }
            self.ready.clear();
        }

        fn params_mut(&mut self) -> &mut QueryParams {
            &mut self.params
        }
    }

    /// Canned reply for the test HTTP server
    #[derive(Debug, Clone)]
    pub struct HttpReply {
        pub status: u16,
        pub body: String,
        pub delay: Duration,
    }

    impl HttpReply {
        pub fn ok(body: &str) -> Self {
            Self::status(200, body)
        }

        pub fn status(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                delay: Duration::ZERO,
            }
        }

        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    /// Handle to a running test server
    pub struct TestServer {
        pub url: String,
        /// Raw text of every request received, head and body
        pub requests: Receiver<String>,
    }

    /// Serve the same reply to every connection
    pub fn serve(reply: HttpReply) -> TestServer {
        serve_sequence(vec![reply])
    }

    /// Serve replies in order; the last one repeats
    pub fn serve_sequence(replies: Vec<HttpReply>) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let addr = listener.local_addr().expect("test server address");
        let (request_tx, request_rx) = mpsc::channel();
        let replies = Arc::new(Mutex::new(VecDeque::from(replies)));

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let reply = {
                    let mut queue = replies.lock().unwrap();
                    if queue.len() > 1 {
                        queue.pop_front().unwrap()
                    } else {
                        queue.front().cloned().unwrap()
                    }
                };
                let request_tx = request_tx.clone();
                std::thread::spawn(move || handle_connection(stream, reply, request_tx));
            }
        });

        TestServer {
            url: format!("http://{}/suggest", addr),
            requests: request_rx,
        }
    }

    fn handle_connection(mut stream: TcpStream, reply: HttpReply, request_tx: Sender<String>) {
        let request = read_request(&mut stream);
        let _ = request_tx.send(request);

        std::thread::sleep(reply.delay);

        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            reply.status,
            if reply.status < 400 { "OK" } else { "Error" },
            reply.body.len(),
            reply.body
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            data.extend_from_slice(&buf[..n]);
            if let Some(head_end) = find_head_end(&data) {
                let head = String::from_utf8_lossy(&data[..head_end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= head_end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    fn find_head_end(data: &[u8]) -> Option<usize> {
        data.windows(4).position(|w| w == b"\r\n\r\n")
    }
}
