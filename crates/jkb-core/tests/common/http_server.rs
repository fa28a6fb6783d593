//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves static bodies by path. Responds to HEAD and GET with
//! `Content-Length` and an optional fixed `Last-Modified`; unknown paths get
//! 404. Counts GET and HEAD requests per path so tests can assert what was
//! (or was not) fetched.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

pub const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";

#[derive(Debug, Default)]
struct Counters {
    gets: HashMap<String, usize>,
    heads: HashMap<String, usize>,
}

pub struct TestServer {
    base: String,
    counters: Arc<Mutex<Counters>>,
}

impl TestServer {
    /// Base URL ending in `/`, e.g. `http://127.0.0.1:12345/`.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    pub fn gets(&self, path: &str) -> usize {
        let c = self.counters.lock().unwrap();
        c.gets.get(&normalize(path)).copied().unwrap_or(0)
    }

    pub fn heads(&self, path: &str) -> usize {
        let c = self.counters.lock().unwrap();
        c.heads.get(&normalize(path)).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        let c = self.counters.lock().unwrap();
        c.gets.values().sum::<usize>() + c.heads.values().sum::<usize>()
    }
}

fn normalize(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Starts a server in a background thread serving `files` (path -> body).
/// The server runs until the process exits.
pub fn start(files: Vec<(&str, Vec<u8>)>) -> TestServer {
    let files: HashMap<String, Vec<u8>> = files
        .into_iter()
        .map(|(p, body)| (normalize(p), body))
        .collect();
    let files = Arc::new(files);
    let counters = Arc::new(Mutex::new(Counters::default()));

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let c = Arc::clone(&counters);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let files = Arc::clone(&files);
            let counters = Arc::clone(&c);
            thread::spawn(move || handle(stream, &files, &counters));
        }
    });

    TestServer {
        base: format!("http://127.0.0.1:{}/", port),
        counters,
    }
}

fn read_request(stream: &mut std::net::TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    }
    String::from_utf8(data).ok()
}

fn handle(
    mut stream: std::net::TcpStream,
    files: &HashMap<String, Vec<u8>>,
    counters: &Mutex<Counters>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(5)));
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("/").to_string();

    {
        let mut c = counters.lock().unwrap();
        let map = if method.eq_ignore_ascii_case("HEAD") {
            &mut c.heads
        } else {
            &mut c.gets
        };
        *map.entry(path.clone()).or_insert(0) += 1;
    }

    let Some(body) = files.get(&path) else {
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    };

    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nLast-Modified: {}\r\nConnection: close\r\n\r\n",
        body.len(),
        LAST_MODIFIED
    );
    let _ = stream.write_all(header.as_bytes());
    if method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(body);
    }
}
