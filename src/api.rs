// API client module: a small blocking HTTP client for the points service.
// Every request carries the same header set, so the headers are installed
// once as reqwest default headers and the client is reused for all calls.

use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::error::{PointsError, Result};

/// API version the service expects in `x-version`.
pub const API_VERSION: &str = "1.0.100";

/// Browser user agent the service is used to seeing.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

const MY_INFO_PATH: &str = "/userInfo/getMyInfo";
const USER_BY_ID_PATH: &str = "/userInfo/getByUserId";
const SEND_POINTS_PATH: &str = "/musicUserScore/sendPoints";

/// Operations the session needs from the remote system. `ApiClient` is the
/// real implementation; tests drive the session with an in-memory one.
pub trait PointsApi {
    /// Current score of the authenticated account.
    fn get_balance(&self) -> Result<u64>;

    /// Whether `user_id` names an existing account, with transport errors
    /// surfaced.
    fn check_user(&self, user_id: &str) -> Result<bool>;

    /// Whether `user_id` names an existing account. Any failure reads as
    /// "no".
    fn user_exists(&self, user_id: &str) -> bool {
        match self.check_user(user_id) {
            Ok(found) => found,
            Err(e) => {
                debug!("user lookup for {:?} failed, treating as missing: {}", user_id, e);
                false
            }
        }
    }

    /// Submit a transfer. `Ok(false)` is a well-formed refusal from the
    /// server; `Err` means we never got a usable answer.
    fn send_points(&self, recipient_id: i64, amount: u64) -> Result<bool>;
}

/// Common wrapper around every response body.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub msg: Option<String>,
}

/// The part of `getMyInfo` we care about.
#[derive(Deserialize, Debug)]
pub struct MyInfo {
    pub score: u64,
}

/// Body of a transfer request.
#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendPointsRequest {
    pub send_score: u64,
    pub send_user_id: i64,
}

/// Blocking client holding the reqwest client and the base URL. The token
/// only lives inside the client's default headers.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url` authenticated with `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .default_headers(default_headers(token)?)
            .build()?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Header set attached to every request.
pub fn default_headers(token: &str) -> Result<HeaderMap> {
    let mut token_value = HeaderValue::from_str(token).map_err(|_| PointsError::InvalidToken)?;
    token_value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(HeaderName::from_static("token"), token_value);
    headers.insert(
        HeaderName::from_static("x-version"),
        HeaderValue::from_static(API_VERSION),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    Ok(headers)
}

/// Turn a response into an envelope. Non-2xx statuses are errors carrying
/// the body text, the same class as a dropped connection.
fn read_envelope<T: DeserializeOwned>(res: Response) -> Result<Envelope<T>> {
    let status = res.status();
    let body = res.text()?;
    if !status.is_success() {
        return Err(PointsError::Status { status, body });
    }
    parse_envelope(&body)
}

pub fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<Envelope<T>> {
    Ok(serde_json::from_str(body)?)
}

impl PointsApi for ApiClient {
    fn get_balance(&self) -> Result<u64> {
        debug!("GET {}", MY_INFO_PATH);
        let res = self.client.get(self.url(MY_INFO_PATH)).send()?;
        let envelope: Envelope<MyInfo> = read_envelope(res)?;
        envelope
            .data
            .map(|info| info.score)
            .ok_or(PointsError::MissingData("data.score"))
    }

    fn check_user(&self, user_id: &str) -> Result<bool> {
        debug!("GET {}?userId={}", USER_BY_ID_PATH, user_id);
        let res = self
            .client
            .get(self.url(USER_BY_ID_PATH))
            .query(&[("userId", user_id)])
            .send()?;
        let envelope: Envelope<IgnoredAny> = read_envelope(res)?;
        Ok(envelope.success)
    }

    fn send_points(&self, recipient_id: i64, amount: u64) -> Result<bool> {
        debug!("POST {} ({} points to {})", SEND_POINTS_PATH, amount, recipient_id);
        let body = SendPointsRequest {
            send_score: amount,
            send_user_id: recipient_id,
        };
        let res = self
            .client
            .post(self.url(SEND_POINTS_PATH))
            .json(&body)
            .send()?;
        let envelope: Envelope<IgnoredAny> = read_envelope(res)?;
        if !envelope.success {
            warn!(
                "transfer refused by server: {}",
                envelope.msg.as_deref().unwrap_or("no message")
            );
        }
        Ok(envelope.success)
    }
}
