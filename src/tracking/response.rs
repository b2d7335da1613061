use crate::http::http_response::HttpResponse;

/// Uniform result of a tracking or reporting request.
///
/// Transport and timeout failures are reported through this type rather than
/// as errors: analytics beacons are best-effort, and a lost one must never
/// disrupt the caller's own logic. Check [`TrackResponse::ok`] instead of
/// relying on exceptions for ordinary network failures.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackResponse {
    /// HTTP status code, if a response was received at all.
    pub status: Option<u16>,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// True iff the endpoint answered with status 200 or 204.
    pub ok: bool,
    /// Negation of `ok`.
    pub error: bool,
    /// True when the request timed out before a response arrived.
    pub timed_out: bool,
}

impl TrackResponse {
    pub(crate) fn from_http(response: HttpResponse) -> Self {
        let ok = response.status == 200 || response.status == 204;
        TrackResponse {
            status: Some(response.status),
            body: response.body,
            ok,
            error: !ok,
            timed_out: false,
        }
    }

    pub(crate) fn failed() -> Self {
        TrackResponse {
            status: None,
            body: Vec::new(),
            ok: false,
            error: true,
            timed_out: false,
        }
    }

    pub(crate) fn timed_out() -> Self {
        TrackResponse {
            timed_out: true,
            ..TrackResponse::failed()
        }
    }

    /// Response body decoded as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
