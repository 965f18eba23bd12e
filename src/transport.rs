//! The DoH HTTP transport (spec §2 "HTTP Client" external collaborator,
//! §4.2 "Sending a request"): one request to one server, GET with a
//! base64url `?dns=` query string or POST with the raw packet as the
//! body, per RFC 8484.

use base64::Engine;
use reqwest::Client;

use crate::config::HttpMethod;
use crate::error::{transport_error, DnsError, ErrorCode};

const DNS_MESSAGE_MIME: &str = "application/dns-message";

pub struct DohResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends `packet` to `server` and returns the raw response body on a 2xx
/// status. Non-2xx statuses are returned as `Ok` so the Query Engine can
/// decide retryability (spec §4.2 step 2's status table); only transport
/// failures (DNS resolution of the server name, TCP/TLS errors, timeout)
/// become `Err`.
pub async fn send(
    client: &Client,
    protocol: &str,
    server: &str,
    path: &str,
    packet: &[u8],
    method: HttpMethod,
    extra_headers: &[(String, String)],
    timeout: std::time::Duration,
    return_http_errors: bool,
) -> Result<DohResponse, DnsError> {
    let url = format!("{protocol}://{server}{path}");

    let mut request = match method {
        HttpMethod::Post => client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, DNS_MESSAGE_MIME)
            .body(packet.to_vec()),
        HttpMethod::Get => {
            let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(packet);
            client.get(format!("{url}?dns={encoded}"))
        }
    };

    request = request
        .header(reqwest::header::ACCEPT, DNS_MESSAGE_MIME)
        .timeout(timeout);

    for (name, value) in extra_headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request
        .send()
        .await
        .map_err(|err| transport_error(err, return_http_errors))?;
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|err| transport_error(err, return_http_errors))?
        .to_vec();

    Ok(DohResponse { status, body })
}

/// Whether an HTTP status warrants another attempt (spec §4.2 step 2).
pub fn is_retryable(status: u16) -> bool {
    ErrorCode::is_retryable_status(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_match_spec_table() {
        for status in [408, 413, 429, 500, 502, 503, 504, 521, 522, 524] {
            assert!(is_retryable(status));
        }
        for status in [200, 400, 401, 403, 404] {
            assert!(!is_retryable(status));
        }
    }
}
