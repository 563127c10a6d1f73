//! Shared HTTP defaults and a thin JSON API client.

use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use crate::error::ApiError;

/// API base used when `PICBED_API_URL` is not set at build time.
pub const DEFAULT_API_URL: &str = "/api";

/// Request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Content type sent with POST bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Defaults shared by every request the client makes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub post_content_type: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            post_content_type: FORM_CONTENT_TYPE.to_string(),
        }
    }
}

impl HttpConfig {
    /// Defaults, with the base URL taken from `PICBED_API_URL` when it was
    /// set at build time.
    ///
    /// The browser has no process environment, so the override is baked in
    /// by the compiler.
    pub fn from_env() -> Self {
        Self::from_override(option_env!("PICBED_API_URL"))
    }

    fn from_override(base_url: Option<&str>) -> Self {
        match base_url.map(str::trim).filter(|s| !s.is_empty()) {
            Some(base_url) => Self::default().with_base_url(base_url),
            None => Self::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join `path` onto the base URL. Absolute URLs pass through untouched.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// Performs the actual requests for an [`ApiClient`].
///
/// Futures are not required to be `Send`: in the browser everything runs on
/// one thread.
#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    /// `GET url` and decode the body as JSON.
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, ApiError>;

    /// `POST url` with a url-encoded form body and decode the response as JSON.
    async fn post_form(
        &self,
        url: &str,
        timeout: Duration,
        content_type: &str,
        form: &[(&str, &str)],
    ) -> Result<Value, ApiError>;
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, ApiError> {
        let builder = reqwest::Client::builder();
        // The wasm client has no client-wide timeout; it is set per request.
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.timeout);
        #[cfg(target_arch = "wasm32")]
        let _ = config;
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// `fetch` in the browser accepts relative URLs, reqwest does not.
    fn absolute(url: &str) -> String {
        #[cfg(target_arch = "wasm32")]
        if url.starts_with('/') {
            if let Some(origin) = web_sys::window().and_then(|w| w.location().origin().ok()) {
                return format!("{}{}", origin, url);
            }
        }
        url.to_string()
    }

    async fn decode(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str, _timeout: Duration) -> Result<Value, ApiError> {
        let request = self.client.get(Self::absolute(url));
        #[cfg(target_arch = "wasm32")]
        let request = request.timeout(_timeout);
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn post_form(
        &self,
        url: &str,
        _timeout: Duration,
        content_type: &str,
        form: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let request = self.client.post(Self::absolute(url)).form(form);
        #[cfg(target_arch = "wasm32")]
        let request = request.timeout(_timeout);
        let mut request = request.build()?;
        // `form` picks its own content type; the configured one wins.
        let value = HeaderValue::from_str(content_type)
            .map_err(|_| ApiError::InvalidHeader(content_type.to_string()))?;
        request.headers_mut().insert(CONTENT_TYPE, value);
        let response = self.client.execute(request).await?;
        Self::decode(response).await
    }
}

/// JSON API client with the shared defaults applied.
#[derive(Clone, Debug)]
pub struct ApiClient<T = ReqwestTransport> {
    config: HttpConfig,
    transport: T,
}

impl ApiClient<ReqwestTransport> {
    pub fn new(config: HttpConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: HttpTransport> ApiClient<T> {
    /// Use a custom transport.
    pub fn with_transport(config: HttpConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `GET {base}{path}`.
    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.config.url(path);
        log::debug!("[ApiClient] GET {}", url);
        self.transport.get_json(&url, self.config.timeout).await
    }

    /// `POST {base}{path}` with a form body and the configured content type.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = self.config.url(path);
        log::debug!("[ApiClient] POST {} ({} fields)", url, form.len());
        self.transport
            .post_form(&url, self.config.timeout, &self.config.post_content_type, form)
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures_lite::future::block_on;
    use serde_json::json;
    use std::sync::Mutex;

    /// A recorded request.
    #[derive(Clone, Debug, PartialEq)]
    pub(crate) struct Call {
        pub method: &'static str,
        pub url: String,
        pub timeout: Duration,
        pub content_type: Option<String>,
        pub form: Vec<(String, String)>,
    }

    /// Transport that replays a canned response and records calls.
    pub(crate) struct StubTransport {
        response: Mutex<Option<Result<Value, ApiError>>>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl StubTransport {
        pub fn ok(value: Value) -> Self {
            Self::new(Ok(value))
        }

        pub fn err(error: ApiError) -> Self {
            Self::new(Err(error))
        }

        fn new(response: Result<Value, ApiError>) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn reply(&self) -> Result<Value, ApiError> {
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ApiError::Status(503)))
        }
    }

    impl HttpTransport for StubTransport {
        async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, ApiError> {
            self.calls.lock().unwrap().push(Call {
                method: "GET",
                url: url.to_string(),
                timeout,
                content_type: None,
                form: Vec::new(),
            });
            self.reply()
        }

        async fn post_form(
            &self,
            url: &str,
            timeout: Duration,
            content_type: &str,
            form: &[(&str, &str)],
        ) -> Result<Value, ApiError> {
            self.calls.lock().unwrap().push(Call {
                method: "POST",
                url: url.to_string(),
                timeout,
                content_type: Some(content_type.to_string()),
                form: form
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });
            self.reply()
        }
    }

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.base_url, "/api");
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.post_content_type, "application/x-www-form-urlencoded");
    }

    #[test]
    fn test_env_override() {
        assert_eq!(
            HttpConfig::from_override(Some("https://img.example.com/api")).base_url,
            "https://img.example.com/api"
        );
        assert_eq!(HttpConfig::from_override(Some("  ")).base_url, "/api");
        assert_eq!(HttpConfig::from_override(None), HttpConfig::default());
    }

    #[test]
    fn test_url_join() {
        let config = HttpConfig::default();
        assert_eq!(config.url("/spa"), "/api/spa");
        assert_eq!(config.url("spa"), "/api/spa");
        assert_eq!(config.url(""), "/api");

        let config = config.with_base_url("http://localhost:9514/api/");
        assert_eq!(config.url("/spa"), "http://localhost:9514/api/spa");
        assert_eq!(config.url("https://cdn.example.com/x"), "https://cdn.example.com/x");
    }

    #[test]
    fn test_get_applies_base_and_timeout() {
        let config = HttpConfig::default().with_timeout(Duration::from_millis(250));
        let api = ApiClient::with_transport(config, StubTransport::ok(json!({"ok": true})));

        let body = block_on(api.get_json("/spa")).unwrap();
        assert_eq!(body, json!({"ok": true}));

        let calls = api.transport().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "GET");
        assert_eq!(calls[0].url, "/api/spa");
        assert_eq!(calls[0].timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_post_sends_form_content_type() {
        let api = ApiClient::with_transport(
            HttpConfig::default(),
            StubTransport::ok(json!({"code": 0})),
        );

        block_on(api.post_form("/login", &[("username", "neo"), ("password", "x")])).unwrap();

        let calls = api.transport().calls.lock().unwrap();
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].url, "/api/login");
        assert_eq!(
            calls[0].content_type.as_deref(),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(calls[0].form[0], ("username".to_string(), "neo".to_string()));
    }

    #[test]
    fn test_transport_errors_propagate() {
        let api = ApiClient::with_transport(HttpConfig::default(), StubTransport::err(ApiError::Status(500)));
        let err = block_on(api.get_json("/spa")).unwrap_err();
        assert!(matches!(err, ApiError::Status(500)));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ApiClient::new(HttpConfig::from_env()).is_ok());
    }
}
