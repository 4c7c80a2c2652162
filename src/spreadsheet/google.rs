//! Google Sheets v4 backend.
//!
//! Values are read unformatted with dates as serial numbers, and written raw so
//! text such as leading-zero phone numbers survives a round trip.
use crate::database::range::{cell_reference, worksheet_range};
use crate::error::{ConnectionError, FetchError};
use crate::spreadsheet::auth::{AccessToken, ServiceAccountKey, Signer, TokenResponse};
use crate::spreadsheet::cell::RawCell;
use crate::spreadsheet::{SheetService, SpreadsheetId};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value as JsonValue};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport settings for the Sheets client.
#[derive(Clone, Debug)]
pub struct GoogleOptions {
    /// Upper bound for every request, token exchange included
    pub timeout: Duration,
    /// Root of the Sheets REST API
    pub api_base: Url,
}

impl Default for GoogleOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            api_base: Url::parse(DEFAULT_API_BASE).expect("Hardcode API base"),
        }
    }
}

/// Failure of one HTTP exchange, before it is classified for the caller.
#[derive(Debug, PartialEq)]
pub(crate) enum Failure {
    Status(u16, String),
    Timeout,
    Transport(String),
    Decode(String),
    Signing(String),
}

impl From<reqwest::Error> for Failure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Failure::Timeout
        } else {
            Failure::Transport(error.to_string())
        }
    }
}

impl Failure {
    /// Classifies a failure met while connecting.
    pub(crate) fn into_connection_error(self, spreadsheet: &SpreadsheetId) -> ConnectionError {
        match self {
            Failure::Status(400 | 401 | 403, message) => ConnectionError::Unauthorized(message),
            Failure::Status(404, _) => ConnectionError::SpreadsheetNotFound(spreadsheet.to_string()),
            Failure::Status(status, message) => ConnectionError::Unreachable(format!("{status}: {message}")),
            Failure::Timeout => ConnectionError::Timeout,
            Failure::Transport(message) => ConnectionError::Unreachable(message),
            Failure::Decode(message) => ConnectionError::Unreachable(format!("unexpected response: {message}")),
            Failure::Signing(message) => ConnectionError::InvalidCredentials(message),
        }
    }

    /// Classifies a failure met while reading or writing `worksheet`.
    pub(crate) fn into_fetch_error(self, worksheet: &str) -> FetchError {
        match self {
            Failure::Status(400, message) if message.contains("Unable to parse range") => {
                FetchError::WorksheetNotFound(worksheet.to_owned())
            }
            Failure::Status(401 | 403, message) => FetchError::Unauthorized(message),
            Failure::Status(status, message) => FetchError::Status { status, message },
            Failure::Timeout => FetchError::Timeout,
            Failure::Transport(message) => FetchError::Unreachable(message),
            Failure::Decode(message) => FetchError::InvalidResponse(message),
            Failure::Signing(message) => FetchError::Unauthorized(message),
        }
    }
}

/// Authenticated client bound to one spreadsheet.
#[derive(Debug)]
pub struct GoogleSheets {
    client: Client,
    api_base: Url,
    spreadsheet: SpreadsheetId,
    signer: Signer,
    token: Mutex<Option<AccessToken>>,
}

impl GoogleSheets {
    /// Authenticates and checks that the spreadsheet is reachable.
    /// No worksheet data is fetched.
    pub fn connect(
        key: ServiceAccountKey,
        spreadsheet: SpreadsheetId,
        options: GoogleOptions,
    ) -> Result<Self, ConnectionError> {
        if options.api_base.cannot_be_a_base() {
            return Err(ConnectionError::Unreachable(format!(
                "'{}' cannot be used as an API base",
                options.api_base
            )));
        }
        let signer = Signer::new(key)?;
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| ConnectionError::Unreachable(e.to_string()))?;
        let sheets = Self {
            client,
            api_base: options.api_base,
            spreadsheet,
            signer,
            token: Mutex::new(None),
        };
        let titles = sheets
            .fetch_titles()
            .map_err(|failure| failure.into_connection_error(&sheets.spreadsheet))?;
        info!(
            "Connected to spreadsheet {} as {} ({} worksheets)",
            sheets.spreadsheet,
            sheets.signer.key().client_email,
            titles.len()
        );
        Ok(sheets)
    }

    fn lock_token(&self) -> MutexGuard<'_, Option<AccessToken>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached bearer token, refreshed when close to expiry.
    fn bearer(&self) -> Result<String, Failure> {
        let now = Utc::now();
        let mut cached = self.lock_token();
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(token.value.clone());
        }
        let token = self.request_token(now)?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn request_token(&self, now: DateTime<Utc>) -> Result<AccessToken, Failure> {
        let form = self
            .signer
            .grant_form(now)
            .map_err(|e| Failure::Signing(e.to_string()))?;
        debug!("Requesting access token from {}", self.signer.key().token_uri());
        let json = send(self.client.post(self.signer.key().token_uri()).form(&form))?;
        let response: TokenResponse =
            serde_json::from_value(json).map_err(|e| Failure::Decode(e.to_string()))?;
        Ok(AccessToken::from_response(response, now))
    }

    /// Sends an authorized request; a rejected token is dropped so the next call re-authenticates.
    fn authorized(&self, request: RequestBuilder) -> Result<JsonValue, Failure> {
        let token = self.bearer()?;
        let result = send(request.bearer_auth(token));
        if let Err(Failure::Status(401, _)) = &result {
            warn!("Access token rejected, discarding it");
            *self.lock_token() = None;
        }
        result
    }

    fn fetch_titles(&self) -> Result<Vec<String>, Failure> {
        let url = metadata_url(&self.api_base, &self.spreadsheet);
        debug!("GET {}", url);
        parse_titles(&self.authorized(self.client.get(url))?)
    }
}

impl SheetService for GoogleSheets {
    fn worksheet_titles(&self) -> Result<Vec<String>, FetchError> {
        self.fetch_titles()
            .map_err(|failure| failure.into_fetch_error(""))
    }

    fn read_rows(&self, worksheet: &str) -> Result<Vec<Vec<RawCell>>, FetchError> {
        let url = values_url(&self.api_base, &self.spreadsheet, worksheet);
        debug!("GET {}", url);
        self.authorized(self.client.get(url))
            .and_then(|json| parse_values(&json))
            .map_err(|failure| failure.into_fetch_error(worksheet))
    }

    fn append_row(&self, worksheet: &str, row: Vec<RawCell>) -> Result<(), FetchError> {
        let url = append_url(&self.api_base, &self.spreadsheet, worksheet);
        debug!("POST {}", url);
        let body = json!({
            "majorDimension": "ROWS",
            "values": [row.iter().map(RawCell::to_json).collect::<Vec<_>>()],
        });
        self.authorized(self.client.post(url).json(&body))
            .map(|_| ())
            .map_err(|failure| failure.into_fetch_error(worksheet))
    }

    fn write_cell(&self, worksheet: &str, row: usize, col: usize, value: RawCell) -> Result<(), FetchError> {
        let range = worksheet_range(worksheet, Some(&cell_reference(row, col)));
        let url = update_url(&self.api_base, &self.spreadsheet, &range);
        debug!("PUT {}", url);
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value.to_json()]],
        });
        self.authorized(self.client.put(url).json(&body))
            .map(|_| ())
            .map_err(|failure| failure.into_fetch_error(worksheet))
    }
}

/// Sends a request and decodes its JSON body; non-2xx answers become `Failure::Status`.
fn send(request: RequestBuilder) -> Result<JsonValue, Failure> {
    let response = request.send()?;
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(Failure::Status(status.as_u16(), error_message(&body)));
    }
    if body.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    serde_json::from_str(&body).map_err(|e| Failure::Decode(e.to_string()))
}

/// Extracts the human message from an API or OAuth error body.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<JsonValue>(body) else {
        return body.trim().to_owned();
    };
    json.pointer("/error/message")
        .or_else(|| json.get("error_description"))
        .or_else(|| json.get("error"))
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| body.trim().to_owned())
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

pub(crate) fn metadata_url(base: &Url, spreadsheet: &SpreadsheetId) -> Url {
    let mut url = endpoint(base, &["spreadsheets", spreadsheet.as_str()]);
    url.query_pairs_mut().append_pair("fields", "sheets.properties.title");
    url
}

pub(crate) fn values_url(base: &Url, spreadsheet: &SpreadsheetId, worksheet: &str) -> Url {
    let range = worksheet_range(worksheet, None);
    let mut url = endpoint(base, &["spreadsheets", spreadsheet.as_str(), "values", &range]);
    url.query_pairs_mut()
        .append_pair("majorDimension", "ROWS")
        .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
        .append_pair("dateTimeRenderOption", "SERIAL_NUMBER");
    url
}

pub(crate) fn append_url(base: &Url, spreadsheet: &SpreadsheetId, worksheet: &str) -> Url {
    let range = format!("{}:append", worksheet_range(worksheet, Some("A1")));
    let mut url = endpoint(base, &["spreadsheets", spreadsheet.as_str(), "values", &range]);
    url.query_pairs_mut()
        .append_pair("valueInputOption", "RAW")
        .append_pair("insertDataOption", "INSERT_ROWS");
    url
}

pub(crate) fn update_url(base: &Url, spreadsheet: &SpreadsheetId, range: &str) -> Url {
    let mut url = endpoint(base, &["spreadsheets", spreadsheet.as_str(), "values", range]);
    url.query_pairs_mut().append_pair("valueInputOption", "RAW");
    url
}

pub(crate) fn parse_titles(json: &JsonValue) -> Result<Vec<String>, Failure> {
    let sheets = json
        .get("sheets")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| Failure::Decode("metadata without 'sheets'".to_owned()))?;
    Ok(sheets
        .iter()
        .filter_map(|sheet| sheet.pointer("/properties/title"))
        .filter_map(JsonValue::as_str)
        .map(str::to_owned)
        .collect())
}

/// A worksheet with no used cells comes back without `values`.
pub(crate) fn parse_values(json: &JsonValue) -> Result<Vec<Vec<RawCell>>, Failure> {
    match json.get("values") {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(rows)) => rows
            .iter()
            .map(|row| match row {
                JsonValue::Array(cells) => Ok(cells.iter().map(RawCell::from_json).collect()),
                other => Err(Failure::Decode(format!("row is not an array: {other}"))),
            })
            .collect(),
        Some(other) => Err(Failure::Decode(format!("values is not an array: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(DEFAULT_API_BASE).unwrap()
    }

    fn id() -> SpreadsheetId {
        SpreadsheetId::parse("1y4m9xHY2l3sMKwRiXm9aLVfmQoLErwJJAC4wuQ9zvaQ").unwrap()
    }

    #[test]
    fn request_urls() {
        assert_eq!(
            metadata_url(&base(), &id()).as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/1y4m9xHY2l3sMKwRiXm9aLVfmQoLErwJJAC4wuQ9zvaQ?fields=sheets.properties.title"
        );
        let values = values_url(&base(), &id(), "Calls");
        assert!(values.path().ends_with("/values/'Calls'"), "{}", values);
        assert!(values.query().unwrap().contains("dateTimeRenderOption=SERIAL_NUMBER"));

        let append = append_url(&base(), &id(), "Pickups");
        assert!(append.path().ends_with("/values/'Pickups'!A1:append"), "{}", append);
        assert!(append.query().unwrap().contains("insertDataOption=INSERT_ROWS"));
    }

    #[test]
    fn worksheet_titles_with_spaces_are_encoded() {
        let url = values_url(&base(), &id(), "Call log");
        assert!(url.path().ends_with("/values/'Call%20log'"), "{}", url);
    }

    #[test]
    fn values_response() {
        let json = json!({
            "range": "Clients!A1:Z1000",
            "majorDimension": "ROWS",
            "values": [["id", "city"], ["C001", "Cairo"], ["C002"]]
        });
        let rows = parse_values(&json).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec![RawCell::Text("C002".to_owned())]);
        assert_eq!(parse_values(&json!({"range": "Clients!A1:Z1000"})).unwrap().len(), 0);
        assert!(parse_values(&json!({"values": "oops"})).is_err());
    }

    #[test]
    fn metadata_response() {
        let json = json!({"sheets": [
            {"properties": {"title": "Clients"}},
            {"properties": {"title": "Calls"}}
        ]});
        assert_eq!(parse_titles(&json).unwrap(), vec!["Clients".to_owned(), "Calls".to_owned()]);
        assert!(parse_titles(&json!({})).is_err());
    }

    #[test]
    fn error_bodies() {
        let api = r#"{"error": {"code": 400, "message": "Unable to parse range: 'Orders'", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(api), "Unable to parse range: 'Orders'");
        let oauth = r#"{"error": "invalid_grant", "error_description": "Invalid JWT Signature."}"#;
        assert_eq!(error_message(oauth), "Invalid JWT Signature.");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn failure_classification() {
        let missing = Failure::Status(400, "Unable to parse range: 'Orders'".to_owned());
        assert!(matches!(missing.into_fetch_error("Orders"), FetchError::WorksheetNotFound(title) if title == "Orders"));
        assert!(matches!(Failure::Status(401, "expired".to_owned()).into_fetch_error("Calls"), FetchError::Unauthorized(_)));
        assert!(matches!(Failure::Timeout.into_fetch_error("Calls"), FetchError::Timeout));
        assert!(matches!(Failure::Status(404, String::new()).into_connection_error(&id()), ConnectionError::SpreadsheetNotFound(_)));
        assert!(matches!(Failure::Status(403, "denied".to_owned()).into_connection_error(&id()), ConnectionError::Unauthorized(_)));
        assert!(matches!(Failure::Transport("dns".to_owned()).into_connection_error(&id()), ConnectionError::Unreachable(_)));
        assert!(matches!(Failure::Timeout.into_connection_error(&id()), ConnectionError::Timeout));
    }
}
