// Transport layer: the one place that talks HTTP.
//
// `Transport` is the seam between the session logic and the network. The
// real implementation wraps a blocking reqwest client with a cookie store;
// tests plug in a recording fake.

use crate::error::{Result, WhapiError};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use std::time::Duration;
use tracing::debug;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends one request and returns the raw response body.
///
/// Implementations must keep cookies across calls: the portal authenticates
/// every request after sign-in through the session cookie alone.
pub trait Transport {
    fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        headers: Option<HeaderMap>,
    ) -> Result<Vec<u8>>;
}

/// Headers used when a caller doesn't pass its own.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// reqwest-backed transport with a session-scoped cookie jar.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| WhapiError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        headers: Option<HeaderMap>,
    ) -> Result<Vec<u8>> {
        debug!(method = method.as_str(), url, "sending request");
        let mut req = self
            .client
            .request(method, url)
            .headers(headers.unwrap_or_else(default_headers));
        if let Some(body) = body {
            req = req.body(body);
        }

        let res = req.send().map_err(|e| map_reqwest_error(url, e))?;
        let status = res.status();
        if !status.is_success() {
            return Err(WhapiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = res.bytes().map_err(|e| map_reqwest_error(url, e))?;
        debug!(url, status = status.as_u16(), len = bytes.len(), "response received");
        Ok(bytes.to_vec())
    }
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> WhapiError {
    if err.is_timeout() {
        WhapiError::TransportTimeout {
            url: url.to_string(),
        }
    } else {
        WhapiError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Reads one request (head plus `Content-Length` body) off the stream.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serves the canned responses in order, one connection each, and hands
    /// back the raw requests it saw.
    fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                seen.push(read_request(&mut stream));
                stream.write_all(response.as_bytes()).unwrap();
            }
            seen
        });
        (base, handle)
    }

    fn response(status: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
            status,
            body.len(),
            extra_headers,
            body
        )
    }

    #[test]
    fn default_headers_are_json() {
        let headers = default_headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn builds_with_finite_timeout() {
        assert!(HttpTransport::new(DEFAULT_TIMEOUT).is_ok());
    }

    #[test]
    fn silent_server_is_a_timeout() {
        // Connections queue in the backlog but nothing ever answers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/SignIn", listener.local_addr().unwrap());
        let transport = HttpTransport::new(Duration::from_millis(200)).unwrap();

        match transport.send(Method::POST, &url, Some(b"{}".to_vec()), None) {
            Err(WhapiError::TransportTimeout { url: failed }) => assert_eq!(failed, url),
            other => panic!("unexpected: {:?}", other),
        }
        drop(listener);
    }

    #[test]
    fn session_cookie_is_sent_back_with_json_header() {
        let (base, server) = serve(vec![
            response("200 OK", "Set-Cookie: t=abc123; Path=/\r\n", "{}"),
            response("200 OK", "", "[]"),
        ]);
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        let first = transport
            .send(
                Method::POST,
                &format!("{}/api/SignIn", base),
                Some(br#"{"Username":"sam"}"#.to_vec()),
                None,
            )
            .unwrap();
        assert_eq!(first, b"{}");
        let second = transport
            .send(Method::GET, &format!("{}/api/webapp/context", base), None, None)
            .unwrap();
        assert_eq!(second, b"[]");

        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 2);
        let first_req = seen[0].to_ascii_lowercase();
        assert!(first_req.starts_with("post /api/signin"));
        assert!(first_req.contains("content-type: application/json"));
        assert!(!first_req.contains("cookie:"));
        let second_req = seen[1].to_ascii_lowercase();
        assert!(second_req.starts_with("get /api/webapp/context"));
        assert!(second_req.contains("cookie: t=abc123"), "{}", seen[1]);
        assert!(second_req.contains("content-type: application/json"));
    }

    #[test]
    fn error_status_is_reported_with_url() {
        let (base, server) = serve(vec![response("401 Unauthorized", "", "{}")]);
        let url = format!("{}/api/SignIn", base);
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        match transport.send(Method::POST, &url, Some(b"{}".to_vec()), None) {
            Err(WhapiError::Status { status, url: failed }) => {
                assert_eq!(status, 401);
                assert_eq!(failed, url);
            }
            other => panic!("unexpected: {:?}", other),
        }
        server.join().unwrap();
    }
}
