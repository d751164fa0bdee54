//! Per-request state: the incoming [`Request`], the outgoing [`Response`]
//! and the [`Context`] that carries both through a handler chain.

use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ids::RequestId;
use crate::router::Route;

/// Maximum number of path parameters before heap allocation.
/// Most routes have ≤4 captures (e.g. `/users/:id/posts/:post_id`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated parameter storage for the hot path.
///
/// Names are `Arc<str>` shared with the route that declared them; values are
/// per-request data copied out of the path.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header storage.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Raw request data handed to the router by the transport layer.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    host: String,
    headers: HeaderVec,
    body: Vec<u8>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: String::new(),
            query: None,
            host: String::new(),
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }
}

impl Request {
    /// Build a request from a method and a request target.
    ///
    /// Anything after the first `?` is kept as the raw query string.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            ..Self::default()
        }
    }

    /// Set the host the request was addressed to.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Add a header. A `Host` header also sets [`Request::host`].
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case("host") {
            self.host.clone_from(&value);
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Host the request was addressed to (empty when unknown).
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All request headers in arrival order.
    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Request body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decode a query parameter. Last write wins for repeated names.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .filter(|(k, _)| k == name)
            .last()
            .map(|(_, v)| v.into_owned())
    }
}

/// Response accumulated by the handler chain.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderVec,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }
}

impl Response {
    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Get a header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Content-Type` header, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Consume the response and return its body.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    fn clear(&mut self) {
        self.status = 200;
        self.headers.clear();
        self.body.clear();
    }
}

/// Mutable per-request state handed to every handler of a chain.
///
/// Contexts are owned by a [`ContextPool`](super::ContextPool) and reused
/// across requests. A context belongs to exactly one in-flight request; all
/// request-scoped data is cleared when it goes back to the pool.
#[derive(Debug)]
pub struct Context {
    request: Request,
    request_id: RequestId,
    params: ParamVec,
    response: Response,
    route: Option<Arc<Route>>,
    values: HashMap<String, Value>,
    stopped: bool,
    pending_error: Option<u16>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            request: Request::default(),
            request_id: RequestId::nil(),
            params: ParamVec::new(),
            response: Response::default(),
            route: None,
            values: HashMap::new(),
            stopped: false,
            pending_error: None,
        }
    }
}

impl Context {
    /// Create an empty context not bound to any request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a new request, dropping everything left from a previous one.
    ///
    /// A valid `X-Request-Id` header is kept as the request id; otherwise a
    /// fresh one is generated.
    pub fn reset(&mut self, request: Request) {
        self.clear();
        self.request_id = RequestId::from_header_or_new(request.header("x-request-id"));
        self.request = request;
    }

    /// Drop all request-scoped state.
    ///
    /// The request is released outright since the next one arrives owned;
    /// parameter, response and value storage keep their capacity.
    pub fn clear(&mut self) {
        self.request = Request::default();
        self.request_id = RequestId::nil();
        self.params.clear();
        self.response.clear();
        self.route = None;
        self.values.clear();
        self.stopped = false;
        self.pending_error = None;
    }

    // ----- request side -----

    /// The request being served.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Unique id of the request being served.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Host the request was addressed to.
    #[must_use]
    pub fn host(&self) -> &str {
        self.request.host()
    }

    /// Raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.request.query()
    }

    /// Request header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// Request body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.request.body()
    }

    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics when a name is bound more than once.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Path parameters in pattern order.
    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// Route that matched this request, if any.
    #[must_use]
    pub fn route(&self) -> Option<&Route> {
        self.route.as_deref()
    }

    /// Pattern of the matched route, if any.
    #[must_use]
    pub fn route_pattern(&self) -> Option<&str> {
        self.route.as_deref().map(Route::pattern)
    }

    pub(crate) fn bind_route<I>(&mut self, route: &Arc<Route>, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.params.clear();
        self.params.extend(
            route
                .param_names()
                .iter()
                .map(Arc::clone)
                .zip(values),
        );
        self.route = Some(Arc::clone(route));
    }

    /// Drop whatever the chain wrote so far, keeping request state.
    pub(crate) fn reset_response(&mut self) {
        self.response.clear();
    }

    // ----- typed value storage -----

    /// Store a value under `key` for later handlers of the chain.
    ///
    /// # Errors
    ///
    /// Fails when `value` cannot be represented as JSON.
    pub fn set_value<T: Serialize>(&mut self, key: &str, value: T) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Read back a value stored with [`Context::set_value`].
    ///
    /// Returns `None` when the key is missing or holds a different type.
    #[must_use]
    pub fn value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| T::deserialize(v).ok())
    }

    /// Raw stored value.
    #[must_use]
    pub fn value_raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    // ----- response side -----

    /// The response written so far.
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    pub(crate) fn take_response(&mut self) -> Response {
        std::mem::take(&mut self.response)
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: u16) {
        self.response.status = status;
    }

    /// Set a response header, replacing any previous value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.response.set_header(name, value.into());
    }

    /// Append bytes to the response body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.response.body.extend_from_slice(bytes);
    }

    /// Replace the body and status with a plain-text response.
    pub fn text(&mut self, status: u16, body: impl AsRef<str>) {
        self.write_full(status, "text/plain; charset=utf-8", body.as_ref().as_bytes());
    }

    /// Replace the body and status with an HTML response.
    pub fn html(&mut self, status: u16, body: impl AsRef<str>) {
        self.write_full(status, "text/html; charset=utf-8", body.as_ref().as_bytes());
    }

    /// Replace the body and status with a JSON response.
    ///
    /// # Errors
    ///
    /// Fails when `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: u16, value: &T) -> serde_json::Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.write_full(status, "application/json", &bytes);
        Ok(())
    }

    /// Replace the body and status with raw bytes of the given content type.
    pub fn data(&mut self, status: u16, content_type: &str, bytes: &[u8]) {
        self.write_full(status, content_type, bytes);
    }

    /// Redirect to `location`. Non-3xx statuses fall back to 302.
    pub fn redirect(&mut self, location: &str, status: u16) {
        let status = if (300..400).contains(&status) { status } else { 302 };
        self.response.body.clear();
        self.set_status(status);
        self.set_header("location", location);
    }

    fn write_full(&mut self, status: u16, content_type: &str, bytes: &[u8]) {
        self.response.status = status;
        self.response.set_header("content-type", content_type.to_string());
        self.response.body.clear();
        self.response.body.extend_from_slice(bytes);
    }

    // ----- chain control -----

    /// Stop the remaining handlers of the chain.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// `true` once a handler stopped the chain.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Stop the chain and have the router answer with the handler registered
    /// for `status`.
    pub fn emit_error(&mut self, status: u16) {
        self.pending_error = Some(status);
        self.stopped = true;
    }

    /// Shorthand for `emit_error(404)`.
    pub fn not_found(&mut self) {
        self.emit_error(404);
    }

    pub(crate) fn take_pending_error(&mut self) -> Option<u16> {
        self.pending_error.take()
    }
}
