//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body with optional Range support, an optional
//! Content-Disposition header, and a `/redirect` path that 302s to
//! `/file.bin` while dropping the query string (simulating download hosts
//! that lose query parameters on redirect).

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// If false, the Content-Length header is omitted and the body is
    /// terminated by closing the connection.
    pub send_content_length: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// Raw Content-Disposition header value to attach, if any.
    pub content_disposition: Option<String>,
    /// If set, send only this many body bytes and then hold the
    /// connection open, keeping the client mid-transfer.
    pub stall_after: Option<usize>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            send_content_length: true,
            support_ranges: true,
            content_disposition: None,
            stall_after: None,
        }
    }
}

/// One observed request: the request target plus the parsed Range start.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub target: String,
    pub range_start: Option<u64>,
}

pub struct TestServer {
    pub base_url: String,
    status: Arc<AtomicU16>,
    requests: Arc<Mutex<Vec<SeenRequest>>>,
}

impl TestServer {
    /// Starts a server in a background thread serving `body`. Runs until
    /// the process exits.
    pub fn start(body: Vec<u8>, opts: ServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let status = Arc::new(AtomicU16::new(200));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let body = Arc::new(body);
        let opts = Arc::new(opts);
        let thread_status = Arc::clone(&status);
        let thread_requests = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let body = Arc::clone(&body);
                let opts = Arc::clone(&opts);
                let status = Arc::clone(&thread_status);
                let requests = Arc::clone(&thread_requests);
                thread::spawn(move || handle(stream, &body, &opts, &status, &requests));
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{}/", port),
            status,
            requests,
        }
    }

    /// Changes the status code returned for subsequent non-redirect GETs.
    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn handle(
    mut stream: TcpStream,
    body: &[u8],
    opts: &ServerOptions,
    status: &AtomicU16,
    requests: &Mutex<Vec<SeenRequest>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));

    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };

    let (target, range_start) = parse_request(request);
    requests.lock().unwrap().push(SeenRequest {
        target: target.clone(),
        range_start,
    });

    if target.starts_with("/redirect") {
        let _ = stream.write_all(
            b"HTTP/1.1 302 Found\r\nLocation: /file.bin\r\nConnection: close\r\nContent-Length: 0\r\n\r\n",
        );
        return;
    }

    let status = status.load(Ordering::SeqCst);
    if status != 200 {
        let response = format!(
            "HTTP/1.1 {} Not Found\r\nConnection: close\r\nContent-Length: 9\r\n\r\nnot found",
            status
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    let total = body.len() as u64;
    let (status_line, slice) = match range_start.filter(|_| opts.support_ranges) {
        Some(start) => {
            let start = start.min(total) as usize;
            ("206 Partial Content", &body[start..])
        }
        None => ("200 OK", body),
    };

    let mut headers = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status_line);
    if opts.send_content_length {
        headers.push_str(&format!("Content-Length: {}\r\n", slice.len()));
    }
    if let Some(cd) = &opts.content_disposition {
        headers.push_str(&format!("Content-Disposition: {}\r\n", cd));
    }
    headers.push_str("\r\n");

    let _ = stream.write_all(headers.as_bytes());
    if let Some(stall_after) = opts.stall_after {
        let sent = stall_after.min(slice.len());
        let _ = stream.write_all(&slice[..sent]);
        thread::sleep(std::time::Duration::from_secs(30));
        return;
    }
    let _ = stream.write_all(slice);
}

/// Returns (request target, Range start for `Range: bytes=X-`).
fn parse_request(request: &str) -> (String, Option<u64>) {
    let mut target = String::new();
    let mut range_start = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if target.is_empty() {
            target = line.split_whitespace().nth(1).unwrap_or("/").to_string();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim().to_lowercase();
                if let Some(spec) = value.strip_prefix("bytes=") {
                    if let Some((start, _)) = spec.split_once('-') {
                        range_start = start.trim().parse::<u64>().ok();
                    }
                }
            }
        }
    }
    (target, range_start)
}
