//! Scripted HTTP endpoints for delivery tests.
//!
//! Each accepted connection is served on its own thread with the next
//! scripted [`Reply`], so a slow reply never holds up the following attempt.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Response sent for one request.
#[derive(Clone, Debug)]
pub struct Reply {
    status: u16,
    body: &'static str,
    delay: Duration,
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: "",
            delay: Duration::ZERO,
        }
    }

    pub fn with_body(self, body: &'static str) -> Self {
        Self { body, ..self }
    }

    /// Hold the response back for `delay` after the request has been read.
    pub fn after(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }
}

/// Request as seen by the endpoint, with lower-cased header names.
#[derive(Debug)]
pub struct Received {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Received {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn read_from(stream: &TcpStream) -> std::io::Result<Self> {
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        let mut reader = BufReader::new(stream);

        let mut line = String::new();
        reader.read_line(&mut line)?;
        let mut request_line = line.split_whitespace();
        let method = request_line.next().unwrap_or_default().to_owned();
        let path = request_line.next().unwrap_or_default().to_owned();

        let mut headers = Vec::new();
        loop {
            line.clear();
            reader.read_line(&mut line)?;
            let Some((key, value)) = line.split_once(':') else {
                break;
            };
            headers.push((key.trim().to_lowercase(), value.trim().to_owned()));
        }

        let mut received = Self {
            method,
            path,
            headers,
            body: String::new(),
        };
        let length = received
            .header("content-length")
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body)?;
        received.body = String::from_utf8_lossy(&body).into_owned();
        Ok(received)
    }
}

/// Serve `replies` in order, one per connection, then stop accepting.
pub fn serve(replies: Vec<Reply>) -> (SocketAddr, mpsc::Receiver<Received>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for reply in replies {
            let Ok((stream, _)) = listener.accept() else {
                break;
            };
            let tx = tx.clone();
            thread::spawn(move || answer(stream, reply, tx));
        }
    });

    (addr, rx)
}

/// Serve one empty-bodied reply per status.
pub fn serve_statuses(statuses: &[u16]) -> (SocketAddr, mpsc::Receiver<Received>) {
    serve(statuses.iter().copied().map(Reply::status).collect())
}

fn answer(mut stream: TcpStream, reply: Reply, tx: mpsc::Sender<Received>) {
    let Ok(received) = Received::read_from(&stream) else {
        return;
    };
    let _ = tx.send(received);
    thread::sleep(reply.delay);
    let response = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Address that accepts connections and never answers.
pub fn silent_endpoint() -> SocketAddr {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    addr
}

/// Address with nothing listening.
pub fn refused_endpoint() -> SocketAddr {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    listener.local_addr().expect("listener has address")
}

/// Collect exactly `count` requests, then check no further request arrives.
pub fn expect_requests(rx: &mpsc::Receiver<Received>, count: usize) -> Vec<Received> {
    let requests: Vec<_> = (0..count)
        .map(|_| {
            rx.recv_timeout(Duration::from_secs(5))
                .expect("expected request")
        })
        .collect();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    requests
}
