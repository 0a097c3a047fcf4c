//! Client layer: orchestrates signed transport calls and maps transport ↔ domain.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use url::Url;

use crate::domain::{
    ApiError, ApplicationKey, ApplicationSecret, DeliveryStatus, MessageId, MessageText,
    RawPhoneNumber, SendSms, SenderId, ValidationError,
};
use crate::metrics::SmsMetrics;
use crate::signing::{self, CanonicalRequest, TIMESTAMP_HEADER};

const DEFAULT_BASE_URL: &str = "https://messagingapi.sinch.com/v1/sms/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const JSON: &str = "application/json";

/// `User-Agent` sent when the builder does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("sinch-sms/", env!("CARGO_PKG_VERSION"));

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
struct HttpRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Vec<u8>,
}

#[derive(Debug, Clone)]
struct HttpResponse {
    status: u16,
    body: String,
}

trait HttpTransport: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::Client,
}

impl HttpTransport for ReqwestTransport {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method, request.url)
                .headers(request.headers);
            if !request.body.is_empty() {
                builder = builder.body(request.body);
            }
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

#[derive(Debug, Clone)]
/// Application key and secret issued by Sinch.
///
/// The secret is base64-decoded once here, so a bad secret is reported before any
/// request is attempted.
pub struct Credentials {
    key: ApplicationKey,
    secret: ApplicationSecret,
}

impl Credentials {
    /// Validate a key and a base64 secret.
    pub fn new(
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            key: ApplicationKey::new(key)?,
            secret: ApplicationSecret::new(secret)?,
        })
    }

    /// Build credentials from already validated parts.
    pub fn from_parts(key: ApplicationKey, secret: ApplicationSecret) -> Self {
        Self { key, secret }
    }

    pub fn key(&self) -> &ApplicationKey {
        &self.key
    }

    pub fn secret(&self) -> &ApplicationSecret {
        &self.secret
    }

    /// Full `Authorization` value for one canonical request.
    pub fn authorization(&self, request: &CanonicalRequest<'_>) -> Result<String, ValidationError> {
        let signature = request.sign(&self.secret)?;
        Ok(signing::authorization_header(&self.key, &signature))
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`SinchClient`].
pub enum SinchError {
    /// HTTP client / transport failure (DNS, TLS, timeouts, etc).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// Sinch answered with a non-200 status and a structured error body.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request could not be encoded (JSON body, header values, timestamp).
    #[error("encode error: {0}")]
    Encode(#[source] Box<dyn StdError + Send + Sync>),

    /// Response body could not be parsed as the expected format.
    #[error("parse error: {0}")]
    Parse(#[source] Box<dyn StdError + Send + Sync>),

    /// One of the domain constructors rejected an invalid value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone)]
/// Builder for [`SinchClient`].
///
/// Use this when you need to customize the base URL, timeout, or user-agent.
pub struct SinchClientBuilder {
    credentials: Credentials,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    metrics: Option<SmsMetrics>,
}

impl SinchClientBuilder {
    /// Create a builder with the default base URL, a 30 second timeout and the default user-agent.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            metrics: None,
        }
    }

    /// Override the messaging API base URL (`https://messagingapi.sinch.com/v1/sms/`).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the timeout applied to each whole request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Count submitted messages in `metrics`.
    pub fn metrics(mut self, metrics: SmsMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build a [`SinchClient`].
    pub fn build(self) -> Result<SinchClient, SinchError> {
        let base_url = parse_base_url(&self.base_url)?;
        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|err| SinchError::Encode(Box::new(err)))?;

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| SinchError::Transport(Box::new(err)))?;

        Ok(SinchClient {
            credentials: self.credentials,
            base_url,
            user_agent,
            metrics: self.metrics,
            http: Arc::new(ReqwestTransport { client }),
        })
    }
}

fn parse_base_url(input: &str) -> Result<Url, ValidationError> {
    let invalid = || ValidationError::InvalidUrl {
        input: input.to_owned(),
    };
    let url = Url::parse(input).map_err(|_| invalid())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}

#[derive(Clone)]
/// High-level Sinch SMS client.
///
/// Every call is signed with the application credentials and carries a freshly generated
/// `X-Timestamp`. The client holds no per-request state and can be shared between tasks.
pub struct SinchClient {
    credentials: Credentials,
    base_url: Url,
    user_agent: HeaderValue,
    metrics: Option<SmsMetrics>,
    http: Arc<dyn HttpTransport>,
}

impl SinchClient {
    /// Create a client with the default settings.
    ///
    /// Fails only if the underlying HTTP client cannot be initialized.
    pub fn new(credentials: Credentials) -> Result<Self, SinchError> {
        SinchClientBuilder::new(credentials).build()
    }

    /// Start building a client with custom settings.
    pub fn builder(credentials: Credentials) -> SinchClientBuilder {
        SinchClientBuilder::new(credentials)
    }

    /// Counters attached through [`SinchClientBuilder::metrics`].
    pub fn metrics(&self) -> Option<&SmsMetrics> {
        self.metrics.as_ref()
    }

    /// Send an SMS message, returning the id Sinch assigned to it.
    ///
    /// Errors:
    /// - [`SinchError::Transport`] when the HTTP call itself fails,
    /// - [`SinchError::Api`] for non-200 responses carrying an error body,
    /// - [`SinchError::Parse`] when a response body does not decode.
    pub async fn send_sms(&self, request: &SendSms) -> Result<MessageId, SinchError> {
        let body = crate::transport::encode_send_sms_body(request)
            .map_err(|err| SinchError::Encode(Box::new(err)))?;
        let url = self.endpoint(request.to().raw())?;
        if let Some(metrics) = &self.metrics {
            metrics.record_sent();
        }

        let response = self.execute(Method::POST, url, body).await?;
        crate::transport::decode_send_sms_json_response(&response)
            .map_err(|err| SinchError::Parse(Box::new(err)))
    }

    /// Send `text` to `to`; an empty `from` leaves the sender to the application default.
    pub async fn send(&self, from: &str, to: &str, text: &str) -> Result<MessageId, SinchError> {
        let mut request = SendSms::new(RawPhoneNumber::new(to)?, MessageText::new(text)?);
        if !from.trim().is_empty() {
            request = request.with_from(SenderId::new(from)?);
        }
        self.send_sms(&request).await
    }

    /// Check the delivery status of a previously sent message.
    pub async fn check_status(&self, message_id: MessageId) -> Result<DeliveryStatus, SinchError> {
        let url = self.endpoint(&message_id.to_string())?;

        let response = self.execute(Method::GET, url, Vec::new()).await?;
        crate::transport::decode_check_status_json_response(&response)
            .map_err(|err| SinchError::Parse(Box::new(err)))
    }

    fn endpoint(&self, segment: &str) -> Result<Url, SinchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ValidationError::InvalidUrl {
                input: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Sign and send a request; returns the body of a 200 response.
    async fn execute(&self, method: Method, url: Url, body: Vec<u8>) -> Result<String, SinchError> {
        let timestamp =
            signing::format_timestamp_now().map_err(|err| SinchError::Encode(Box::new(err)))?;
        let request = self.signed_request(method, url, body, &timestamp)?;
        tracing::debug!(method = %request.method, url = %request.url, "sending Sinch request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(SinchError::Transport)?;

        if response.status == 200 {
            return Ok(response.body);
        }

        let api_error = crate::transport::decode_api_error_json(&response.body)
            .map_err(|err| SinchError::Parse(Box::new(err)))?;
        tracing::debug!(
            status = response.status,
            code = api_error.code,
            reference = ?api_error.reference,
            "Sinch returned an error"
        );
        Err(SinchError::Api(api_error))
    }

    fn signed_request(
        &self,
        method: Method,
        url: Url,
        body: Vec<u8>,
        timestamp: &str,
    ) -> Result<HttpRequest, SinchError> {
        let content_type =
            if method == Method::POST || method == Method::PUT || method == Method::PATCH {
                JSON
            } else {
                ""
            };

        let authorization = self.credentials.authorization(&CanonicalRequest {
            method: method.as_str(),
            path: url.path(),
            content_type,
            timestamp,
            body: &body,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(http::header::USER_AGENT, self.user_agent.clone());
        headers.insert(
            HeaderName::from_static(TIMESTAMP_HEADER),
            header_value(timestamp)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        if !content_type.is_empty() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        }
        headers.insert(AUTHORIZATION, header_value(&authorization)?);

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, SinchError> {
    HeaderValue::from_str(value).map_err(|err| SinchError::Encode(Box::new(err)))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    use super::*;

    const KEY: &str = "5F5C418A0F914BBC8234A9BF5EDDAD97";
    const SECRET: &str = "JViE5vDor0Sw3WllZka15Q==";

    #[derive(Clone)]
    struct FakeTransport {
        state: Arc<Mutex<FakeTransportState>>,
    }

    struct FakeTransportState {
        last_request: Option<HttpRequest>,
        response: Result<HttpResponse, String>,
    }

    impl FakeTransport {
        fn new(response_status: u16, response_body: impl Into<String>) -> Self {
            Self::with_result(Ok(HttpResponse {
                status: response_status,
                body: response_body.into(),
            }))
        }

        fn failing(message: &str) -> Self {
            Self::with_result(Err(message.to_owned()))
        }

        fn with_result(response: Result<HttpResponse, String>) -> Self {
            Self {
                state: Arc::new(Mutex::new(FakeTransportState {
                    last_request: None,
                    response,
                })),
            }
        }

        fn last_request(&self) -> HttpRequest {
            self.state
                .lock()
                .unwrap()
                .last_request
                .clone()
                .expect("no request was sent")
        }
    }

    impl HttpTransport for FakeTransport {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
            Box::pin(async move {
                let mut state = self.state.lock().unwrap();
                state.last_request = Some(request);
                state
                    .response
                    .clone()
                    .map_err(Box::<dyn StdError + Send + Sync>::from)
            })
        }
    }

    fn credentials() -> Credentials {
        Credentials::new(KEY, SECRET).unwrap()
    }

    fn make_client(transport: FakeTransport) -> SinchClient {
        SinchClient {
            credentials: credentials(),
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
            user_agent: HeaderValue::from_static("sinch-sms-tests/1.0"),
            metrics: None,
            http: Arc::new(transport),
        }
    }

    fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .get(name)
            .map(|value| value.to_str().unwrap())
    }

    fn assert_signed(request: &HttpRequest) {
        let expected = credentials()
            .authorization(&CanonicalRequest {
                method: request.method.as_str(),
                path: request.url.path(),
                content_type: header(request, "content-type").unwrap_or_default(),
                timestamp: header(request, "x-timestamp").unwrap(),
                body: &request.body,
            })
            .unwrap();
        assert_eq!(header(request, "authorization"), Some(expected.as_str()));
    }

    #[test]
    fn signed_request_matches_reference_vector() {
        let client = make_client(FakeTransport::new(200, "{}"));
        let url = client.endpoint("+46700000000").unwrap();
        let request = client
            .signed_request(
                Method::POST,
                url,
                br#"{"message":"Hello world"}"#.to_vec(),
                "2014-06-04T13:41:58Z",
            )
            .unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://messagingapi.sinch.com/v1/sms/+46700000000"
        );
        assert_eq!(
            header(&request, "authorization"),
            Some(
                "Application 5F5C418A0F914BBC8234A9BF5EDDAD97:qDXMwzfaxCRS849c/2R0hg0nphgdHciTo7OdM6MsdnM="
            )
        );
        assert_eq!(request.body, br#"{"message":"Hello world"}"#);
    }

    #[tokio::test]
    async fn send_sms_posts_signed_json_and_returns_message_id() {
        let transport = FakeTransport::new(200, r#"{"messageId":115713753}"#);
        let client = make_client(transport.clone());
        let request = SendSms::new(
            RawPhoneNumber::new("+46700000000").unwrap(),
            MessageText::new("Hello world").unwrap(),
        )
        .with_from(SenderId::new("+14152364961").unwrap());

        let id = client.send_sms(&request).await.unwrap();
        assert_eq!(id, MessageId::new(115_713_753));

        let sent = transport.last_request();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(
            sent.url.as_str(),
            "https://messagingapi.sinch.com/v1/sms/+46700000000"
        );
        assert_eq!(
            String::from_utf8(sent.body.clone()).unwrap(),
            r#"{"from":"+14152364961","message":"Hello world"}"#
        );
        assert_eq!(header(&sent, "content-type"), Some("application/json"));
        assert_eq!(header(&sent, "accept"), Some("application/json"));
        assert_eq!(header(&sent, "user-agent"), Some("sinch-sms-tests/1.0"));
        assert_signed(&sent);
    }

    #[tokio::test]
    async fn send_with_empty_from_omits_the_field() {
        let transport = FakeTransport::new(200, r#"{"messageId":1}"#);
        let client = make_client(transport.clone());

        client.send("  ", "+46700000000", "Hello world").await.unwrap();

        let sent = transport.last_request();
        assert_eq!(sent.body, br#"{"message":"Hello world"}"#);
        assert_signed(&sent);
    }

    #[tokio::test]
    async fn send_validates_arguments_before_any_request() {
        let client = make_client(FakeTransport::new(200, r#"{"messageId":1}"#));
        let err = client.send("", "+4670/0", "hi").await.unwrap_err();
        assert!(matches!(
            err,
            SinchError::Validation(ValidationError::InvalidPathSegment { .. })
        ));
    }

    #[tokio::test]
    async fn send_stamps_a_current_utc_timestamp() {
        let transport = FakeTransport::new(200, r#"{"messageId":1}"#);
        let client = make_client(transport.clone());

        client.send("", "+46700000000", "Hello world").await.unwrap();

        let sent = transport.last_request();
        let raw = header(&sent, "x-timestamp").unwrap();
        assert!(raw.ends_with('Z'), "{raw}");
        assert!(!raw.contains('.'), "{raw}");
        let parsed = OffsetDateTime::parse(raw, &Rfc3339).unwrap();
        let age = OffsetDateTime::now_utc() - parsed;
        assert!(age.whole_seconds().abs() < 5, "{raw}");
    }

    #[tokio::test]
    async fn send_sms_maps_error_body_to_api_error() {
        let transport = FakeTransport::new(
            403,
            r#"{"errorCode":40301,"message":"Sandbox restriction","reference":"A:123"}"#,
        );
        let client = make_client(transport);

        let err = client
            .send("", "+46700000000", "Hello world")
            .await
            .unwrap_err();
        match err {
            SinchError::Api(api) => {
                assert_eq!(api.code, 40301);
                assert_eq!(api.message, "Sandbox restriction");
                assert_eq!(api.reference.as_deref(), Some("A:123"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_body_without_code_keeps_remote_message() {
        let client = make_client(FakeTransport::new(401, r#"{"message":"Unauthorized"}"#));

        let err = client.check_status(MessageId::new(7)).await.unwrap_err();
        match err {
            SinchError::Api(api) => {
                assert_eq!(api.code, 0);
                assert_eq!(api.message, "Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_counts_submitted_messages_but_not_status_checks() {
        let metrics = SmsMetrics::new().unwrap();
        let mut client = make_client(FakeTransport::new(200, r#"{"messageId":42}"#));
        client.metrics = Some(metrics.clone());

        client.send("", "+46700000000", "Hello world").await.unwrap();
        client.send("", "+46700000000", "Hello again").await.unwrap();
        assert_eq!(metrics.sent(), 2);

        let client = make_client(FakeTransport::new(200, r#"{"status":"Pending"}"#));
        client.check_status(MessageId::new(42)).await.unwrap();
        assert_eq!(metrics.sent(), 2);
        assert!(client.metrics().is_none());
    }

    #[tokio::test]
    async fn malformed_error_body_is_a_parse_error() {
        let client = make_client(FakeTransport::new(502, "<html>Bad Gateway</html>"));

        let err = client
            .send("", "+46700000000", "Hello world")
            .await
            .unwrap_err();
        assert!(matches!(err, SinchError::Parse(_)));
    }

    #[tokio::test]
    async fn invalid_success_body_is_a_parse_error() {
        let client = make_client(FakeTransport::new(200, "{ not json }"));

        let err = client
            .send("", "+46700000000", "Hello world")
            .await
            .unwrap_err();
        assert!(matches!(err, SinchError::Parse(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced() {
        let client = make_client(FakeTransport::failing("connection refused"));

        let err = client.check_status(MessageId::new(1)).await.unwrap_err();
        match err {
            SinchError::Transport(source) => assert_eq!(source.to_string(), "connection refused"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn check_status_gets_without_body_or_content_type() {
        let transport = FakeTransport::new(200, r#"{"status":"Successful"}"#);
        let client = make_client(transport.clone());

        let status = client.check_status(MessageId::new(42)).await.unwrap();
        assert_eq!(status.as_str(), "Successful");

        let sent = transport.last_request();
        assert_eq!(sent.method, Method::GET);
        assert_eq!(
            sent.url.as_str(),
            "https://messagingapi.sinch.com/v1/sms/42"
        );
        assert!(sent.body.is_empty());
        assert_eq!(header(&sent, "content-type"), None);
        assert_eq!(header(&sent, "accept"), Some("application/json"));
        assert_signed(&sent);
    }

    #[tokio::test]
    async fn check_status_of_unknown_id_returns_api_error() {
        let transport = FakeTransport::new(
            404,
            r#"{"errorCode":40400,"message":"Message not found","reference":"B:9"}"#,
        );
        let client = make_client(transport);

        let err = client.check_status(MessageId::new(0)).await.unwrap_err();
        assert_eq!(err.to_string(), "[40400] Message not found");
        assert!(matches!(err, SinchError::Api(ApiError { code: 40400, .. })));
    }

    #[test]
    fn endpoint_appends_segment_with_or_without_trailing_slash() {
        let mut client = make_client(FakeTransport::new(200, "{}"));
        client.base_url = Url::parse("http://127.0.0.1:9000/v1/sms").unwrap();
        assert_eq!(
            client.endpoint("7").unwrap().as_str(),
            "http://127.0.0.1:9000/v1/sms/7"
        );

        client.base_url = Url::parse("http://127.0.0.1:9000/v1/sms/?debug=1").unwrap();
        let url = client.endpoint("+46700000000").unwrap();
        assert_eq!(url.path(), "/v1/sms/+46700000000");
    }

    #[test]
    fn builder_rejects_unusable_base_urls() {
        for bad in ["not a url", "mailto:ops@example.com", "ftp://example.com/v1/sms/"] {
            let err = SinchClient::builder(credentials())
                .base_url(bad)
                .build()
                .err()
                .expect("base url should be rejected");
            assert!(
                matches!(err, SinchError::Validation(ValidationError::InvalidUrl { .. })),
                "{bad}: {err:?}"
            );
        }
    }

    #[test]
    fn builder_overrides_are_applied() {
        let client = SinchClient::builder(credentials())
            .base_url("http://localhost:8081/v1/sms/")
            .user_agent("demo/0.1")
            .timeout(Duration::from_secs(5))
            .metrics(SmsMetrics::new().unwrap())
            .build()
            .unwrap();
        assert_eq!(client.base_url.as_str(), "http://localhost:8081/v1/sms/");
        assert_eq!(client.user_agent, "demo/0.1");
        assert_eq!(client.metrics().map(SmsMetrics::sent), Some(0));
    }

    #[test]
    fn builder_rejects_user_agent_with_control_characters() {
        let err = SinchClient::builder(credentials())
            .user_agent("bad\nagent")
            .build()
            .err()
            .expect("user agent should be rejected");
        assert!(matches!(err, SinchError::Encode(_)));
    }

    #[test]
    fn credentials_validate_inputs() {
        assert!(Credentials::new("  ", SECRET).is_err());
        assert!(Credentials::new(KEY, "%%%").is_err());
        assert!(SinchClient::new(credentials()).is_ok());
    }
}
