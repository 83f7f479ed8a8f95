//! Reqwest-backed attendance gateway.
//!
//! This adapter owns transport details only: URL and filter construction,
//! credential headers, HTTP error mapping, and JSON decoding into roster
//! entries.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderName};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::json;
use zeroize::Zeroizing;

use crate::config::GatewayEndpoint;
use crate::domain::ports::{AttendanceGateway, AttendanceGatewayError};
use crate::domain::{AttendanceStatus, EnrollmentId, RosterEntry, SessionId};
use crate::outbound::rows::{ENROLLMENT_COLUMNS, ENROLLMENTS_TABLE, EnrollmentRowDto};

const API_KEY_HEADER: HeaderName = HeaderName::from_static("apikey");
const PREFER_HEADER: HeaderName = HeaderName::from_static("prefer");
const RETURN_REPRESENTATION: &str = "return=representation";

/// Attendance gateway that talks to the hosted backend's REST tables.
pub struct RestAttendanceGateway {
    client: Client,
    rest_root: Url,
    anon_key: String,
    access_token: Zeroizing<String>,
}

impl RestAttendanceGateway {
    /// Build an adapter for the signed-in user holding `access_token`.
    /// ```rust,ignore
    /// let gateway = RestAttendanceGateway::new(&settings.endpoint()?, session.access_token())?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: &GatewayEndpoint,
        access_token: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(endpoint.timeout).build()?;
        Ok(Self {
            client,
            rest_root: endpoint.rest_root.clone(),
            anon_key: endpoint.anon_key.clone(),
            access_token: Zeroizing::new(access_token.into()),
        })
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(API_KEY_HEADER, self.anon_key.as_str())
            .bearer_auth(self.access_token.as_str())
            .header(ACCEPT, "application/json")
    }

    fn roster_request(
        &self,
        session: &SessionId,
    ) -> Result<RequestBuilder, AttendanceGatewayError> {
        let url = roster_url(&self.rest_root, session)?;
        Ok(self.authorised(self.client.get(url)))
    }

    fn status_request(
        &self,
        id: EnrollmentId,
        status: AttendanceStatus,
    ) -> Result<RequestBuilder, AttendanceGatewayError> {
        let url = enrollment_url(&self.rest_root, id)?;
        Ok(self
            .authorised(self.client.patch(url))
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&json!({ "status": status })))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Vec<u8>, AttendanceGatewayError> {
        let response = builder
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl AttendanceGateway for RestAttendanceGateway {
    async fn fetch_roster(
        &self,
        session: &SessionId,
    ) -> Result<Vec<RosterEntry>, AttendanceGatewayError> {
        let body = self.send(self.roster_request(session)?).await?;
        parse_rows(&body)
    }

    async fn record_status(
        &self,
        id: EnrollmentId,
        status: AttendanceStatus,
    ) -> Result<(), AttendanceGatewayError> {
        let body = self.send(self.status_request(id, status)?).await?;
        ensure_updated(&body, id)
    }
}

/// Row-level security hides rows instead of refusing the update, so an
/// empty representation means nothing was written.
fn ensure_updated(body: &[u8], id: EnrollmentId) -> Result<(), AttendanceGatewayError> {
    if parse_rows(body)?.is_empty() {
        return Err(AttendanceGatewayError::rejected(
            StatusCode::NOT_FOUND.as_u16(),
            format!("no enrollment row {id} was updated"),
        ));
    }
    Ok(())
}

fn table_url(rest_root: &Url) -> Result<Url, AttendanceGatewayError> {
    rest_root.join(ENROLLMENTS_TABLE).map_err(|err| {
        AttendanceGatewayError::transport(format!("invalid gateway url: {err}"))
    })
}

fn roster_url(rest_root: &Url, session: &SessionId) -> Result<Url, AttendanceGatewayError> {
    let mut url = table_url(rest_root)?;
    url.query_pairs_mut()
        .append_pair("select", ENROLLMENT_COLUMNS)
        .append_pair("session_id", &format!("eq.{session}"))
        .append_pair("order", "id.asc");
    Ok(url)
}

fn enrollment_url(rest_root: &Url, id: EnrollmentId) -> Result<Url, AttendanceGatewayError> {
    let mut url = table_url(rest_root)?;
    url.query_pairs_mut()
        .append_pair("id", &format!("eq.{id}"))
        .append_pair("select", ENROLLMENT_COLUMNS);
    Ok(url)
}

fn parse_rows(body: &[u8]) -> Result<Vec<RosterEntry>, AttendanceGatewayError> {
    let rows: Vec<EnrollmentRowDto> = serde_json::from_slice(body).map_err(|error| {
        AttendanceGatewayError::decode(format!("invalid enrollment JSON payload: {error}"))
    })?;
    rows.into_iter()
        .map(EnrollmentRowDto::into_entry)
        .collect::<Result<_, _>>()
        .map_err(AttendanceGatewayError::decode)
}

fn map_transport_error(error: reqwest::Error) -> AttendanceGatewayError {
    if error.is_timeout() {
        AttendanceGatewayError::timeout(error.to_string())
    } else {
        AttendanceGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AttendanceGatewayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AttendanceGatewayError::unauthorized(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AttendanceGatewayError::timeout(message)
        }
        _ if status.is_client_error() => AttendanceGatewayError::rejected(status.as_u16(), message),
        _ => AttendanceGatewayError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network gateway helpers.

    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn rest_root() -> Url {
        Url::parse("https://academy.example.invalid/rest/v1/").expect("valid url")
    }

    #[rstest]
    fn roster_url_filters_by_session_and_orders_by_id(rest_root: Url) {
        let session =
            SessionId::parse("6d3f8a9e-1c2b-4f5e-9a7d-0b1c2d3e4f50").expect("valid session");
        let url = roster_url(&rest_root, &session).expect("url should build");

        assert_eq!(url.path(), "/rest/v1/session_enrollments");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("select".to_owned(), ENROLLMENT_COLUMNS.to_owned()),
                (
                    "session_id".to_owned(),
                    "eq.6d3f8a9e-1c2b-4f5e-9a7d-0b1c2d3e4f50".to_owned()
                ),
                ("order".to_owned(), "id.asc".to_owned()),
            ]
        );
    }

    #[rstest]
    fn enrollment_url_targets_one_row(rest_root: Url) {
        let id = EnrollmentId::new(42).expect("positive id");
        let url = enrollment_url(&rest_root, id).expect("url should build");
        assert!(
            url.query_pairs()
                .any(|(key, value)| key == "id" && value == "eq.42"),
            "filter should pin the row id"
        );
    }

    #[rstest]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case::forbidden(StatusCode::FORBIDDEN, "Unauthorized")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::conflict(StatusCode::CONFLICT, "Rejected")]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "Transport")]
    fn maps_http_statuses_to_expected_port_errors(
        #[case] status: StatusCode,
        #[case] expected: &str,
    ) {
        let error = map_status_error(status, b"{\"message\":\"backend unavailable\"}");
        let matched = match expected {
            "Unauthorized" => matches!(error, AttendanceGatewayError::Unauthorized { .. }),
            "Timeout" => matches!(error, AttendanceGatewayError::Timeout { .. }),
            "Rejected" => matches!(error, AttendanceGatewayError::Rejected { status: 409, .. }),
            "Transport" => matches!(error, AttendanceGatewayError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} should map to {expected}, got {error:?}");
    }

    #[rstest]
    fn status_errors_include_compacted_body() {
        let error = map_status_error(StatusCode::BAD_REQUEST, b"{\n  \"hint\":  \"bad filter\"\n}");
        assert_eq!(
            error.to_string(),
            "attendance gateway rejected request (400): status 400: { \"hint\": \"bad filter\" }"
        );
    }

    #[rstest]
    fn parses_rows_into_roster_entries() {
        let body = r#"[
            {"id": 1, "session_id": "6d3f8a9e-1c2b-4f5e-9a7d-0b1c2d3e4f50", "athlete_name": "Ada", "status": "pending"},
            {"id": 2, "session_id": "6d3f8a9e-1c2b-4f5e-9a7d-0b1c2d3e4f50", "status": "present"}
        ]"#;

        let entries = parse_rows(body.as_bytes()).expect("JSON should decode");
        let summary: Vec<_> = entries
            .iter()
            .map(|entry| (entry.id().get(), entry.athlete_name(), entry.status()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "Ada", AttendanceStatus::Pending),
                (2, "", AttendanceStatus::Present)
            ]
        );
    }

    #[rstest]
    #[case::not_json(b"<html>".as_slice())]
    #[case::unknown_status(br#"[{"id": 3, "session_id": "6d3f8a9e-1c2b-4f5e-9a7d-0b1c2d3e4f50", "status": "tardy"}]"#.as_slice())]
    #[case::zero_id(br#"[{"id": 0, "session_id": "6d3f8a9e-1c2b-4f5e-9a7d-0b1c2d3e4f50", "status": "late"}]"#.as_slice())]
    fn rejects_malformed_rows(#[case] body: &[u8]) {
        let error = parse_rows(body).expect_err("decode should fail");
        assert!(
            matches!(error, AttendanceGatewayError::Decode { .. }),
            "malformed rows should map to Decode errors, got {error:?}"
        );
    }

    #[fixture]
    fn gateway(rest_root: Url) -> RestAttendanceGateway {
        let endpoint = GatewayEndpoint {
            rest_root,
            anon_key: "public-anon".to_owned(),
            timeout: std::time::Duration::from_secs(5),
        };
        RestAttendanceGateway::new(&endpoint, "coach-token").expect("client should build")
    }

    fn header<'a>(request: &'a reqwest::Request, name: &str) -> Option<&'a str> {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    #[rstest]
    fn status_request_carries_credentials_and_body(gateway: RestAttendanceGateway) {
        let id = EnrollmentId::new(42).expect("positive id");
        let request = gateway
            .status_request(id, AttendanceStatus::Present)
            .expect("url should build")
            .build()
            .expect("request should build");

        assert_eq!(request.method(), reqwest::Method::PATCH);
        assert_eq!(header(&request, "apikey"), Some("public-anon"));
        assert_eq!(header(&request, "authorization"), Some("Bearer coach-token"));
        assert_eq!(header(&request, "prefer"), Some("return=representation"));
        assert_eq!(header(&request, "accept"), Some("application/json"));
        let body: serde_json::Value = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .map(serde_json::from_slice)
            .expect("json body")
            .expect("valid json");
        assert_eq!(body, json!({ "status": "present" }));
    }

    #[rstest]
    fn roster_request_is_an_authorised_get(gateway: RestAttendanceGateway) {
        let session =
            SessionId::parse("6d3f8a9e-1c2b-4f5e-9a7d-0b1c2d3e4f50").expect("valid session");
        let request = gateway
            .roster_request(&session)
            .expect("url should build")
            .build()
            .expect("request should build");

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(header(&request, "apikey"), Some("public-anon"));
        assert_eq!(header(&request, "authorization"), Some("Bearer coach-token"));
        assert!(header(&request, "prefer").is_none());
        assert!(request.body().is_none());
    }

    #[rstest]
    fn empty_representation_means_the_row_was_hidden() {
        let id = EnrollmentId::new(42).expect("positive id");
        let error = ensure_updated(b"[]", id).expect_err("nothing was written");
        assert_eq!(
            error,
            AttendanceGatewayError::rejected(404_u16, "no enrollment row 42 was updated")
        );
    }

    #[rstest]
    fn one_row_representation_confirms_the_write() {
        let id = EnrollmentId::new(42).expect("positive id");
        let body = br#"[{"id": 42, "session_id": "6d3f8a9e-1c2b-4f5e-9a7d-0b1c2d3e4f50", "athlete_name": "Ada", "status": "present"}]"#;
        assert_eq!(ensure_updated(body, id), Ok(()));
    }

    #[rstest]
    fn long_bodies_are_truncated_in_previews() {
        let body = "x".repeat(400);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }
}
