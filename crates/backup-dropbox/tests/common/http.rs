//! # http
//! A scripted HTTP server for exercising the Dropbox client.
//!

use core::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
};

/// A request the server received.
#[derive(Debug)]
pub struct RecordedRequest {
    /// The request target, e.g. `/2/files/list_folder`.
    pub path: String,
    /// Headers with lowercased names.
    pub headers: HashMap<String, String>,
    /// The request body.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// The body parsed as JSON.
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// The `Dropbox-API-Arg` header parsed as JSON.
    pub fn api_arg(&self) -> serde_json::Value {
        serde_json::from_str(self.headers.get("dropbox-api-arg").unwrap()).unwrap()
    }
}

/// A server answering one request per connection with the scripted responses, in order.
pub struct TestServer {
    /// The base URL of the server.
    pub url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl TestServer {
    /// Start serving `responses` as `(status, json body)` pairs.
    pub fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();

            for (status, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);
                requests.push(read_request(&mut reader));

                let mut stream = reader.into_inner();
                write!(
                    stream,
                    "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();
            }

            requests
        });

        Self { url, handle }
    }

    /// Wait for every scripted response to be sent and return the received requests.
    pub fn requests(self) -> Vec<RecordedRequest> {
        self.handle.join().unwrap()
    }
}

fn read_request<Reader: BufRead>(reader: &mut Reader) -> RecordedRequest {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap()
        .to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }

        let (name, value) = line.split_once(':').unwrap();
        headers.insert(name.trim().to_lowercase(), value.trim().to_string());
    }

    let length: usize = headers
        .get("content-length")
        .map(|length| length.parse().unwrap())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).unwrap();

    RecordedRequest {
        path,
        headers,
        body,
    }
}
