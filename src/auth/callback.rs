use crate::auth::AuthError;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

pub const CALLBACK_PATH: &str = "/exchange_token";

const ACCEPT_IDLE_SLEEP: Duration = Duration::from_millis(50);
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_REQUEST_BYTES: usize = 16 * 1024;

/// Resolution of one authorization flow. Set at most once: the first
/// terminal value wins and later callback requests cannot overwrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Pending,
    Code(String),
    Error(String),
}

impl CallbackOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallbackOutcome::Pending)
    }
}

/// Single-use localhost HTTP listener that captures the OAuth redirect.
///
/// Requests on any path other than [`CALLBACK_PATH`] receive a 404 and do
/// not resolve the flow. The first matching request resolves the outcome
/// (error param, then missing code, then state mismatch, then code), gets a
/// rendered confirmation page, and stops the listener.
pub struct CallbackListener {
    listener: TcpListener,
    port: u16,
    expected_state: String,
    outcome: CallbackOutcome,
}

impl CallbackListener {
    /// Binds `localhost:<port>`. A port that is already in use is reported
    /// to the caller; no alternate port is tried.
    pub fn bind(port: u16, expected_state: &str) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .map_err(|source| AuthError::PortUnavailable { port, source })?;
        let bound_port = listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or(port);
        Ok(Self {
            listener,
            port: bound_port,
            expected_state: expected_state.to_string(),
            outcome: CallbackOutcome::Pending,
        })
    }

    /// The actually-bound port (differs from the requested port only when
    /// binding port 0).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serves requests until a matching request yields a terminal outcome or
    /// the deadline elapses. Accepts are non-blocking and sliced so the
    /// deadline is re-checked promptly.
    pub fn run(mut self, deadline: Duration) -> CallbackOutcome {
        if self.listener.set_nonblocking(true).is_err() {
            return self.outcome;
        }

        let started = Instant::now();
        while started.elapsed() < deadline {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    self.handle_connection(stream);
                    if self.outcome.is_terminal() {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_IDLE_SLEEP);
                }
                Err(_) => thread::sleep(ACCEPT_IDLE_SLEEP),
            }
        }
        self.outcome
    }

    fn handle_connection(&mut self, mut stream: TcpStream) {
        let _ = stream.set_read_timeout(Some(REQUEST_READ_TIMEOUT));
        let Some(target) = read_request_target(&mut stream) else {
            return;
        };
        let (path, query) = split_target(&target);

        if path != CALLBACK_PATH {
            let _ = write_response(&mut stream, "404 Not Found", "Not Found");
            return;
        }

        self.record(evaluate_query(query, &self.expected_state));

        let message = match &self.outcome {
            CallbackOutcome::Error(error) => format!("Authorization failed: {error}"),
            _ => "Authorization received. You can close this tab and return to the terminal."
                .to_string(),
        };
        let _ = write_response(&mut stream, "200 OK", &render_page(&message));
    }

    // First writer wins; a terminal outcome is never overwritten.
    fn record(&mut self, outcome: CallbackOutcome) {
        if !self.outcome.is_terminal() {
            self.outcome = outcome;
        }
    }
}

/// Applies the callback precedence rules to a raw query string.
fn evaluate_query(query: &str, expected_state: &str) -> CallbackOutcome {
    let state = query_param(query, "state").unwrap_or_default();
    let code = query_param(query, "code").unwrap_or_default();
    let error = query_param(query, "error").unwrap_or_default();

    if !error.is_empty() {
        CallbackOutcome::Error(format!("Strava returned error: {error}"))
    } else if code.is_empty() {
        CallbackOutcome::Error("Missing code query parameter in callback URL.".to_string())
    } else if state != expected_state {
        CallbackOutcome::Error("State mismatch in callback. Please retry.".to_string())
    } else {
        CallbackOutcome::Code(code)
    }
}

fn read_request_target(stream: &mut TcpStream) -> Option<String> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.len() > MAX_REQUEST_BYTES {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    let text = String::from_utf8_lossy(&buffer);
    let request_line = text.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    if method != "GET" {
        return None;
    }
    Some(target.to_string())
}

fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

/// First occurrence wins, matching `parse_qs(...)[0]` semantics.
fn query_param(query: &str, name: &str) -> Option<String> {
    for pair in query.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, value),
            None => (pair, ""),
        };
        if key == name {
            let decoded = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            return Some(decoded);
        }
    }
    None
}

fn render_page(message: &str) -> String {
    let safe_message = html_escape(message);
    format!(
        "<!doctype html><html><head><meta charset='utf-8'>\
         <title>Strava Auth</title></head><body>\
         <p>{safe_message}</p></body></html>"
    )
}

fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn write_response(stream: &mut TcpStream, status: &str, body: &str) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes())?;
    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_takes_first_occurrence_and_decodes() {
        assert_eq!(
            query_param("code=a%20b&code=second", "code").as_deref(),
            Some("a b")
        );
        assert_eq!(query_param("state=x", "code"), None);
    }

    #[test]
    fn error_param_takes_precedence_over_valid_code() {
        let outcome = evaluate_query("error=access_denied&code=XYZ&state=abc", "abc");
        assert_eq!(
            outcome,
            CallbackOutcome::Error("Strava returned error: access_denied".to_string())
        );
    }

    #[test]
    fn missing_code_is_reported_before_state_check() {
        let outcome = evaluate_query("state=wrong", "abc");
        assert_eq!(
            outcome,
            CallbackOutcome::Error("Missing code query parameter in callback URL.".to_string())
        );
    }

    #[test]
    fn state_mismatch_never_yields_code() {
        let outcome = evaluate_query("code=XYZ&state=wrong", "abc123");
        assert_eq!(
            outcome,
            CallbackOutcome::Error("State mismatch in callback. Please retry.".to_string())
        );
    }

    #[test]
    fn valid_callback_yields_code() {
        let outcome = evaluate_query("code=XYZ&state=abc123", "abc123");
        assert_eq!(outcome, CallbackOutcome::Code("XYZ".to_string()));
    }

    #[test]
    fn html_escape_neutralizes_markup() {
        assert_eq!(
            html_escape("<script>\"x\" & 'y'</script>"),
            "&lt;script&gt;&quot;x&quot; &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }
}
