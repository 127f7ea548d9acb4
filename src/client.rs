//! Remote prediction service client.
//!
//! A prediction call ships the encoded device raster plus the model
//! selection as JSON, authorized by the tokens from
//! [`credentials`](crate::credentials), and decodes the returned raster.
//! The transport is plain HTTP/1.1 over a `TcpStream` with bounded reads;
//! the service rotates the refresh token on every call and the rotated
//! pair is persisted before the prediction is handed back.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use log::{debug, info};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::credentials::{self, TokenSet};
use crate::errors::{ClientError, ClientResult};

/// Maximum allowed HTTP response body size (64 MiB). A full-chip raster is
/// large; anything past this indicates a misbehaving gateway.
const MAX_RESPONSE_SIZE: usize = 64 * 1024 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Model inference can take minutes on a cold start; the read timeout is
/// sized for the serverless platform spinning up a worker.
const READ_TIMEOUT: Duration = Duration::from_secs(300);

const DEFAULT_SERVICE_URL: &str = "http://gateway.prefabphotonics.com/predict-v1";

/// The role a model plays in a prediction call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Estimate the as-fabricated geometry of an as-designed layout.
    Predictor,
    /// Adjust a layout so its fabricated outcome matches the design intent.
    Corrector,
    /// Restyle a layout to look like an SEM capture of the fabricated chip.
    SemStyle,
}

impl ModelKind {
    /// One-letter code the service dispatches on.
    pub fn wire_code(&self) -> &'static str {
        match self {
            ModelKind::Predictor => "p",
            ModelKind::Corrector => "c",
            ModelKind::SemStyle => "s",
        }
    }
}

/// A prediction request as submitted to the service.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    /// Base64-encoded device raster (see [`codec`]).
    pub device_array: String,
    pub model_name: String,
    pub model_tags: Vec<String>,
    /// One-letter model role code (see [`ModelKind::wire_code`]).
    pub model_type: String,
    /// Ask the service to binarize the returned raster server-side.
    pub binary: bool,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    prediction_array: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    new_access_token: Option<String>,
    #[serde(default)]
    new_refresh_token: Option<String>,
}

/// Client for the hosted prediction service.
pub struct PredictionClient {
    base_url: String,
}

impl PredictionClient {
    /// Create a client for a specific gateway URL.
    pub fn new(url: &str) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client for the default gateway, honoring `$PREFAB_SERVICE_URL`.
    pub fn from_env() -> Self {
        let url = std::env::var("PREFAB_SERVICE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());
        Self::new(&url)
    }

    /// Submit a prediction request and decode the returned raster.
    ///
    /// Tokens are loaded from the token file for every call; if the service
    /// returns a rotated pair it is persisted before this returns.
    pub fn predict(&self, request: &PredictRequest) -> ClientResult<Array2<f32>> {
        let tokens = credentials::load()?;
        let body = serde_json::to_string(request)?;
        debug!(
            "submitting {} request for model {} ({} bytes)",
            request.model_type,
            request.model_name,
            body.len()
        );

        let response = self.http_post(&body, &tokens)?;
        if response.status != 200 {
            return Err(ClientError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let response: PredictResponse = serde_json::from_str(&response.body)?;
        if let Some(message) = response.error {
            return Err(ClientError::Service { message });
        }

        if let (Some(access), Some(refresh)) =
            (response.new_access_token, response.new_refresh_token)
        {
            credentials::store(&TokenSet {
                access_token: access,
                refresh_token: refresh,
            })?;
            info!("refreshed service tokens");
        }

        let encoded = response
            .prediction_array
            .ok_or(ClientError::MissingPrediction)?;
        Ok(codec::decode_raster(&encoded)?)
    }

    // ─── HTTP transport ───────────────────────────────────────

    fn http_post(&self, body: &str, tokens: &TokenSet) -> ClientResult<HttpResponse> {
        let target = parse_url(&self.base_url)?;
        let addr = format!("{}:{}", target.host, target.port);

        let sock_addr: std::net::SocketAddr = addr
            .parse()
            .or_else(|_| {
                use std::net::ToSocketAddrs;
                addr.to_socket_addrs()
                    .map_err(|e| ClientError::Resolve {
                        addr: addr.clone(),
                        reason: e.to_string(),
                    })?
                    .next()
                    .ok_or_else(|| ClientError::Resolve {
                        addr: addr.clone(),
                        reason: "no addresses".to_string(),
                    })
            })?;

        let stream = TcpStream::connect_timeout(&sock_addr, CONNECT_TIMEOUT).map_err(|source| {
            ClientError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;

        let request = format!(
            "POST {} HTTP/1.1\r\n\
             Host: {}\r\n\
             Connection: close\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Authorization: Bearer {}\r\n\
             X-Refresh-Token: {}\r\n\
             User-Agent: prefab/0.1\r\n\
             \r\n\
             {}",
            target.path,
            target.host_header,
            body.len(),
            tokens.access_token,
            tokens.refresh_token,
            body,
        );
        (&stream).write_all(request.as_bytes())?;

        read_response(&stream)
    }
}

struct HttpResponse {
    status: u16,
    body: String,
}

fn read_response(stream: &TcpStream) -> ClientResult<HttpResponse> {
    let mut reader = BufReader::new(stream);

    let mut status_line = String::new();
    reader.read_line(&mut status_line)?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(500);

    let mut content_length: usize = 0;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let line = line.trim().to_string();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase();
            let value = value.trim();
            if key == "content-length" {
                content_length = value.parse().unwrap_or(0);
            } else if key == "transfer-encoding" && value.to_lowercase().contains("chunked") {
                chunked = true;
            }
        }
    }

    if content_length > MAX_RESPONSE_SIZE {
        return Err(ClientError::ResponseTooLarge {
            limit: MAX_RESPONSE_SIZE,
        });
    }

    let body = if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf)?;
        String::from_utf8(buf).unwrap_or_default()
    } else if chunked {
        let mut body = String::new();
        loop {
            let mut chunk_line = String::new();
            reader.read_line(&mut chunk_line)?;
            let chunk_size = usize::from_str_radix(chunk_line.trim(), 16).unwrap_or(0);
            if chunk_size == 0 {
                break;
            }
            if body.len() + chunk_size > MAX_RESPONSE_SIZE {
                return Err(ClientError::ResponseTooLarge {
                    limit: MAX_RESPONSE_SIZE,
                });
            }
            let mut chunk = vec![0u8; chunk_size];
            reader.read_exact(&mut chunk)?;
            body.push_str(&String::from_utf8(chunk).unwrap_or_default());
            let mut crlf = String::new();
            let _ = reader.read_line(&mut crlf);
        }
        body
    } else {
        let mut body = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            if body.len() + n > MAX_RESPONSE_SIZE {
                return Err(ClientError::ResponseTooLarge {
                    limit: MAX_RESPONSE_SIZE,
                });
            }
            body.extend_from_slice(&buf[..n]);
        }
        String::from_utf8(body).unwrap_or_default()
    };

    Ok(HttpResponse { status, body })
}

struct Target {
    host: String,
    port: u16,
    host_header: String,
    path: String,
}

fn parse_url(url: &str) -> ClientResult<Target> {
    let url = url.trim();
    let without_scheme = if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else if url.starts_with("https://") {
        return Err(ClientError::HttpsUnsupported {
            url: url.to_string(),
        });
    } else {
        url
    };

    let (host_port, path) = match without_scheme.split_once('/') {
        Some((host_port, rest)) => (host_port, format!("/{}", rest)),
        None => (without_scheme, "/".to_string()),
    };
    if host_port.is_empty() {
        return Err(ClientError::InvalidUrl {
            url: url.to_string(),
            reason: "empty host".to_string(),
        });
    }

    let (host, port) = if let Some((host, port)) = host_port.split_once(':') {
        let port: u16 = port.parse().map_err(|_| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: format!("invalid port '{}'", port),
        })?;
        (host.to_string(), port)
    } else {
        (host_port.to_string(), 80)
    };

    Ok(Target {
        host,
        port,
        host_header: host_port.to_string(),
        path,
    })
}
