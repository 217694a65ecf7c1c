/// 通用 HTTP 客户端
///
/// 封装基础地址拼接、JSON 头、bearer 鉴权、JSON/文本响应解析，
/// 以及把非 2xx 响应转换为 `ApiError`。
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

use crate::clients::token_store::TokenStore;
use crate::config::Config;
use crate::error::{ApiError, ClientError, ClientResult, ResponseBody};
use crate::infrastructure::{AbortSignal, ReqwestTransport, Transport, TransportRequest, TransportResponse};

/// 单次请求的描述
#[derive(Debug)]
pub struct RequestOptions {
    pub method: Method,
    /// 调用方附加的请求头，冲突时覆盖默认头
    pub headers: HeaderMap,
    pub body: Option<JsonValue>,
    /// 是否附带 bearer token（默认 true）
    pub requires_auth: bool,
    pub signal: AbortSignal,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            requires_auth: true,
            signal: AbortSignal::none(),
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// 不附带 token（如登录接口）
    pub fn without_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = signal;
        self
    }
}

/// HTTP 客户端
pub struct HttpClient {
    base_url: String,
    tokens: Arc<TokenStore>,
    transport: Arc<dyn Transport>,
}

impl HttpClient {
    /// 使用指定传输层创建客户端
    pub fn new(config: &Config, tokens: Arc<TokenStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
            transport,
        }
    }

    /// 按配置创建基于 reqwest 的客户端
    pub fn from_config(config: &Config, tokens: Arc<TokenStore>) -> ClientResult<Self> {
        let timeout = (config.request_timeout_secs > 0).then(|| Duration::from_secs(config.request_timeout_secs));
        let transport = ReqwestTransport::new(timeout)?;
        Ok(Self::new(config, tokens, Arc::new(transport)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// 拼接完整 URL；已是绝对地址则原样返回
    pub fn resolve_url(&self, path: &str) -> String {
        if is_absolute_url(path) {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// 发送请求，返回解析后的响应体
    pub async fn request_body(&self, path: &str, options: RequestOptions) -> ClientResult<ResponseBody> {
        if self.base_url.is_empty() {
            return Err(ClientError::Configuration(
                "API base URL is not configured. Set GRADE_API_BASE_URL in your environment or .env.".to_string(),
            ));
        }

        let RequestOptions {
            method,
            headers,
            body,
            requires_auth,
            signal,
        } = options;

        let request = TransportRequest {
            method,
            url: self.resolve_url(path),
            headers: self.build_headers(headers, body.is_some(), requires_auth),
            body: body.map(|b| b.to_string()),
        };

        let transport = Arc::clone(&self.transport);
        let response = signal
            .run(async move { transport.send(request).await })
            .await
            .map_err(|_| {
                debug!("请求已取消: {}", path);
                ClientError::Cancelled
            })??;

        into_result(response)
    }

    /// 发送请求，把 2xx 响应体解码为 `T`
    pub async fn request<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ClientResult<T> {
        let body = self.request_body(path, options).await?;
        decode(body)
    }

    // ========== 便捷方法 ==========

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ClientResult<T> {
        self.request(path, RequestOptions { method: Method::GET, body: None, ..options }).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(path, RequestOptions { method: Method::POST, body: Some(body), ..options }).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(path, RequestOptions { method: Method::PUT, body: Some(body), ..options }).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(path, RequestOptions { method: Method::PATCH, body: Some(body), ..options }).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ClientResult<T> {
        self.request(path, RequestOptions { method: Method::DELETE, body: None, ..options }).await
    }

    /// 组装请求头：默认头 → 调用方头（覆盖同名）→ bearer token
    fn build_headers(&self, caller: HeaderMap, has_body: bool, requires_auth: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        for name in caller.keys() {
            headers.remove(name);
        }
        for (name, value) in caller.iter() {
            headers.append(name.clone(), value.clone());
        }

        if requires_auth {
            if let Some(token) = self.tokens.get() {
                match HeaderValue::from_str(&format!("Bearer {}", token)) {
                    Ok(value) => {
                        headers.insert(AUTHORIZATION, value);
                    }
                    Err(_) => warn!("令牌包含非法字符，已跳过鉴权头"),
                }
            }
        }

        headers
    }
}

fn is_absolute_url(path: &str) -> bool {
    static ABSOLUTE_URL: OnceLock<Option<Regex>> = OnceLock::new();
    ABSOLUTE_URL
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(path))
}

/// 按 Content-Type 解析响应体
fn parse_body(response: &TransportResponse) -> Result<ResponseBody, serde_json::Error> {
    if response.is_json() && !response.body.trim().is_empty() {
        serde_json::from_str(&response.body).map(ResponseBody::Json)
    } else {
        Ok(ResponseBody::Text(response.body.clone()))
    }
}

/// 2xx 返回响应体，否则构造 `ApiError`
fn into_result(response: TransportResponse) -> ClientResult<ResponseBody> {
    let status = response.status;

    if status.is_success() {
        return parse_body(&response).map_err(|e| {
            warn!("响应声明为 JSON 但无法解析: {}", e);
            ClientError::Serialization(e.to_string())
        });
    }

    let body = parse_body(&response).unwrap_or_else(|_| ResponseBody::Text(response.body.clone()));
    let message = error_message(&body, &response.body, status);
    debug!("请求失败: HTTP {} - {}", status.as_u16(), message);

    Err(ClientError::Api(ApiError {
        message,
        status: status.as_u16(),
        payload: Some(body),
    }))
}

/// 错误信息优先级：字符串 `detail` → 原始文本 → 状态短语
///
/// `detail` 存在但为空串时直接用状态短语，不退回原始 JSON 文本。
fn error_message(body: &ResponseBody, raw: &str, status: StatusCode) -> String {
    match body.detail() {
        Some(detail) if !detail.is_empty() => detail.to_string(),
        Some(_) => status_phrase(status),
        None if !raw.trim().is_empty() => raw.to_string(),
        None => status_phrase(status),
    }
}

fn status_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| "Request failed".to_string())
}

/// 把响应体解码为目标类型；空文本视为 `null`
fn decode<T: DeserializeOwned>(body: ResponseBody) -> ClientResult<T> {
    let value = match body {
        ResponseBody::Text(text) if text.is_empty() => JsonValue::Null,
        other => other.into_json(),
    };
    serde_json::from_value(value).map_err(|e| ClientError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake::ScriptedTransport;
    use crate::infrastructure::MemoryStorage;
    use serde_json::json;

    fn config(base: &str) -> Config {
        Config {
            api_base_url: base.to_string(),
            ..Config::default()
        }
    }

    fn client_with(base: &str, transport: Arc<ScriptedTransport>) -> HttpClient {
        let tokens = Arc::new(TokenStore::new("authToken", Arc::new(MemoryStorage::new())));
        HttpClient::new(&config(base), tokens, transport)
    }

    #[tokio::test]
    async fn test_missing_base_url_fails_without_network() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(200, json!({})));
        let client = client_with("", transport.clone());

        let err = client.get::<JsonValue>("/users", RequestOptions::new()).await.unwrap_err();

        assert!(matches!(err, ClientError::Configuration(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_success_returns_parsed_json_unchanged() {
        let payload = json!({"success": true, "analysis": [{"review": "ok"}], "nested": {"a": [1, 2.5, null]}});
        let transport = Arc::new(ScriptedTransport::new().reply_json(200, payload.clone()));
        let client = client_with("http://api.test/", transport.clone());

        let value: JsonValue = client.get("/grade", RequestOptions::new()).await.unwrap();

        assert_eq!(value, payload);
        assert_eq!(transport.last_request().url, "http://api.test/grade");
    }

    #[tokio::test]
    async fn test_absolute_path_is_used_as_is() {
        let transport = Arc::new(ScriptedTransport::new().reply(204, None, ""));
        let client = client_with("http://api.test", transport.clone());

        let _: () = client.delete("https://other.test/users/1", RequestOptions::new()).await.unwrap();

        let request = transport.last_request();
        assert_eq!(request.url, "https://other.test/users/1");
        assert_eq!(request.method, Method::DELETE);
    }

    #[tokio::test]
    async fn test_non_json_response_is_text() {
        let transport = Arc::new(ScriptedTransport::new().reply(200, Some("text/plain"), "pong"));
        let client = client_with("http://api.test", transport);

        let body = client.request_body("/ping", RequestOptions::new()).await.unwrap();
        assert_eq!(body, ResponseBody::Text("pong".to_string()));
    }

    #[tokio::test]
    async fn test_headers_without_body_or_token() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(200, json!([])));
        let client = client_with("http://api.test", transport.clone());

        let _: JsonValue = client.get("/users", RequestOptions::new()).await.unwrap();

        let request = transport.last_request();
        assert_eq!(ScriptedTransport::header(&request, "accept").as_deref(), Some("application/json"));
        assert!(!ScriptedTransport::has_content_type(&request));
        assert_eq!(ScriptedTransport::header(&request, "authorization"), None);
        assert_eq!(request.body, None);
    }

    #[tokio::test]
    async fn test_body_sets_content_type_and_caller_headers_win() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(201, json!({"id": "1"})));
        let client = client_with("http://api.test", transport.clone());

        let options = RequestOptions::new().header(ACCEPT, HeaderValue::from_static("text/plain"));
        let _: JsonValue = client.post("/users", &json!({"name": "a"}), options).await.unwrap();

        let request = transport.last_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(ScriptedTransport::header(&request, "accept").as_deref(), Some("text/plain"));
        assert_eq!(
            ScriptedTransport::header(&request, "content-type").as_deref(),
            Some("application/json")
        );
        assert_eq!(request.body.as_deref(), Some(r#"{"name":"a"}"#));
    }

    #[tokio::test]
    async fn test_bearer_token_attached_unless_opted_out() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(200, json!([]))
                .reply_json(200, json!({})),
        );
        let client = client_with("http://api.test", transport.clone());
        client.tokens().set("secret");

        let _: JsonValue = client.get("/users", RequestOptions::new()).await.unwrap();
        assert_eq!(
            ScriptedTransport::header(&transport.last_request(), "authorization").as_deref(),
            Some("Bearer secret")
        );

        let _: JsonValue = client
            .post("/auth/login", &json!({}), RequestOptions::new().without_auth())
            .await
            .unwrap();
        assert_eq!(ScriptedTransport::header(&transport.last_request(), "authorization"), None);
    }

    #[tokio::test]
    async fn test_error_uses_string_detail() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(500, json!({"detail": "grader crashed"})));
        let client = client_with("http://api.test", transport);

        let err = client.post::<JsonValue, _>("/grade", &json!({}), RequestOptions::new()).await.unwrap_err();

        match err {
            ClientError::Api(api) => {
                assert_eq!(api.message, "grader crashed");
                assert_eq!(api.status, 500);
                assert!(api.is_server_error());
                assert_eq!(api.payload, Some(ResponseBody::Json(json!({"detail": "grader crashed"}))));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_detail_uses_status_phrase() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(400, json!({"detail": ""})));
        let client = client_with("http://api.test", transport);

        let err = client.get::<JsonValue>("/users", RequestOptions::new()).await.unwrap_err();

        match err {
            ClientError::Api(api) => {
                assert_eq!(api.message, "Bad Request");
                assert_eq!(api.status, 400);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_falls_back_to_raw_text_then_status_phrase() {
        let structured = json!({"detail": [{"loc": ["body", "rubric"], "msg": "field required"}]});
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(502, Some("text/html"), "<h1>Bad gateway</h1>")
                .reply_json(422, structured.clone())
                .reply(404, None, ""),
        );
        let client = client_with("http://api.test", transport);

        let err = client.get::<JsonValue>("/a", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(&err, ClientError::Api(api) if api.message == "<h1>Bad gateway</h1>" && api.status == 502));

        let err = client.get::<JsonValue>("/b", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(&err, ClientError::Api(api) if api.message == structured.to_string() && api.status == 422));

        let err = client.get::<JsonValue>("/c", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(&err, ClientError::Api(api) if api.message == "Not Found" && api.status == 404));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(ScriptedTransport::new().fail("connection refused"));
        let client = client_with("http://api.test", transport);

        let err = client.get::<JsonValue>("/users", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.user_message().is_some());
    }

    #[tokio::test]
    async fn test_aborted_signal_cancels_before_sending() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(200, json!({})));
        let client = client_with("http://api.test", transport.clone());

        let (handle, signal) = AbortSignal::new_pair();
        handle.abort();
        let err = client
            .get::<JsonValue>("/users", RequestOptions::new().signal(signal))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_request_can_be_aborted() {
        let transport = Arc::new(ScriptedTransport::new().reply_after(
            Duration::from_secs(5),
            200,
            Some("application/json"),
            "{}",
        ));
        let client = client_with("http://api.test", transport);

        let (handle, signal) = AbortSignal::new_pair();
        let pending = client.get::<JsonValue>("/slow", RequestOptions::new().signal(signal));
        let abort = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.abort();
        };
        let (result, ()) = tokio::join!(pending, abort);

        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_invalid_json_on_success_is_serialization_error() {
        let transport = Arc::new(ScriptedTransport::new().reply(200, Some("application/json"), "{oops"));
        let client = client_with("http://api.test", transport);

        let err = client.get::<JsonValue>("/users", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
    }

    #[test]
    fn test_absolute_url_detection() {
        assert!(is_absolute_url("http://x"));
        assert!(is_absolute_url("https://x/y"));
        assert!(!is_absolute_url("/users"));
        assert!(!is_absolute_url("users/http://x"));
    }
}
