//! Browser-based account linking.
//!
//! `prefab setup` binds a loopback listener, opens the account page in the
//! system browser with a one-shot state token, and waits for the browser
//! to call back with the access/refresh token pair, which is persisted for
//! the prediction client.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use log::info;
use rand::Rng;

use crate::credentials::{self, TokenSet};
use crate::errors::{SetupError, SetupResult};

const LINK_URL: &str = "https://www.prefabphotonics.com/link";

/// How long to wait for the user to finish the browser login.
const LOGIN_DEADLINE: Duration = Duration::from_secs(300);

const SUCCESS_PAGE: &str = "<html><body><h2>Account linked.</h2>\
<p>You can close this tab and return to your terminal.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><h2>Linking failed.</h2>\
<p>Return to your terminal and run <code>prefab setup</code> again.</p></body></html>";

/// Run the account linking flow and persist the received tokens.
pub fn run_setup() -> SetupResult<()> {
    let listener =
        TcpListener::bind("127.0.0.1:0").map_err(|source| SetupError::Bind { source })?;
    let port = listener
        .local_addr()
        .map_err(|source| SetupError::Bind { source })?
        .port();
    listener
        .set_nonblocking(true)
        .map_err(|source| SetupError::Bind { source })?;

    let state = state_nonce();
    let url = format!("{}?state={}&port={}", LINK_URL, state, port);
    if open_browser(&url) {
        println!("Opened your browser to link your account.");
    }
    println!("If the page did not open, visit:\n\n    {}\n", url);

    let stream = wait_for_callback(&listener)?;
    let tokens = handle_callback(stream, &state)?;
    credentials::store(&tokens)?;
    info!("account linked; tokens written to the token file");
    println!("Account linked successfully.");
    Ok(())
}

/// Accept one callback connection, polling until the deadline.
fn wait_for_callback(listener: &TcpListener) -> SetupResult<TcpStream> {
    let deadline = Instant::now() + LOGIN_DEADLINE;
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                stream
                    .set_nonblocking(false)
                    .map_err(|source| SetupError::Callback { source })?;
                return Ok(stream);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(SetupError::Timeout {
                        seconds: LOGIN_DEADLINE.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(source) => return Err(SetupError::Callback { source }),
        }
    }
}

/// Read the callback request, validate it, and answer the browser.
fn handle_callback(mut stream: TcpStream, expected_state: &str) -> SetupResult<TokenSet> {
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .map_err(|source| SetupError::Callback { source })?;

    let outcome = parse_callback(&request_line, expected_state);
    let (status, page) = match &outcome {
        Ok(_) => ("200 OK", SUCCESS_PAGE),
        Err(_) => ("400 Bad Request", FAILURE_PAGE),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        page.len(),
        page,
    );
    let _ = stream.write_all(response.as_bytes());
    outcome
}

/// Extract and validate the token pair from the callback request line.
pub(crate) fn parse_callback(request_line: &str, expected_state: &str) -> SetupResult<TokenSet> {
    // Request line shape: GET /callback?state=...&access_token=... HTTP/1.1
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| SetupError::MalformedCallback {
            reason: "missing request path".to_string(),
        })?;
    let query = path
        .split_once('?')
        .map(|(_, query)| query)
        .ok_or_else(|| SetupError::MalformedCallback {
            reason: "missing query string".to_string(),
        })?;

    let mut state = None;
    let mut access_token = None;
    let mut refresh_token = None;
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            let value = percent_decode(value);
            match key {
                "state" => state = Some(value),
                "access_token" => access_token = Some(value),
                "refresh_token" => refresh_token = Some(value),
                _ => {}
            }
        }
    }

    match state {
        Some(state) if state == expected_state => {}
        Some(_) => return Err(SetupError::StateMismatch),
        None => return Err(SetupError::MissingParameter { param: "state" }),
    }
    let access_token =
        access_token.ok_or(SetupError::MissingParameter { param: "access_token" })?;
    let refresh_token =
        refresh_token.ok_or(SetupError::MissingParameter { param: "refresh_token" })?;
    Ok(TokenSet {
        access_token,
        refresh_token,
    })
}

/// Decode `%XX` escapes and `+` spaces from a query value.
pub(crate) fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let escape = (i + 2 < bytes.len())
                    .then(|| {
                        let high = (bytes[i + 1] as char).to_digit(16)?;
                        let low = (bytes[i + 2] as char).to_digit(16)?;
                        Some((high * 16 + low) as u8)
                    })
                    .flatten();
                match escape {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// 32-hex-character one-shot state token.
fn state_nonce() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}

/// Best-effort launch of the system browser.
fn open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    let command = ("open", vec![url]);
    #[cfg(target_os = "windows")]
    let command = ("cmd", vec!["/C", "start", url]);
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let command = ("xdg-open", vec![url]);

    std::process::Command::new(command.0)
        .args(&command.1)
        .spawn()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_callback_extracts_the_token_pair() {
        let tokens = parse_callback(
            "GET /callback?state=abc123&access_token=tok%2Ba&refresh_token=tok+b HTTP/1.1",
            "abc123",
        )
        .unwrap();
        assert_eq!(tokens.access_token, "tok+a");
        assert_eq!(tokens.refresh_token, "tok b");
    }

    #[test]
    fn parse_callback_rejects_a_foreign_state() {
        assert!(matches!(
            parse_callback(
                "GET /callback?state=evil&access_token=a&refresh_token=b HTTP/1.1",
                "abc123",
            ),
            Err(SetupError::StateMismatch)
        ));
    }

    #[test]
    fn parse_callback_requires_every_parameter() {
        assert!(matches!(
            parse_callback("GET /callback?state=abc123&access_token=a HTTP/1.1", "abc123"),
            Err(SetupError::MissingParameter {
                param: "refresh_token"
            })
        ));
        assert!(matches!(
            parse_callback("GET /callback HTTP/1.1", "abc123"),
            Err(SetupError::MalformedCallback { .. })
        ));
    }

    #[test]
    fn percent_decode_handles_escapes_and_pluses() {
        assert_eq!(percent_decode("a%2Fb+c"), "a/b c");
        assert_eq!(percent_decode("plain"), "plain");
        // A dangling escape is passed through untouched.
        assert_eq!(percent_decode("50%"), "50%");
    }

    #[test]
    fn state_nonces_are_hex_and_unique() {
        let first = state_nonce();
        let second = state_nonce();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
