use http::Method;
use may_minihttp::{HttpService, Request as RawRequest, Response as RawResponse};
use std::io::{self, Read};
use std::sync::Arc;
use tracing::warn;

use super::response::write_response;
use crate::context::Request;
use crate::router::Router;

/// `may_minihttp` service feeding every request to a shared [`Router`].
///
/// Each connection runs in its own coroutine with its own clone of the
/// service; clones share the same read-only router.
#[derive(Clone)]
pub struct RouterService {
    router: Arc<Router>,
}

impl RouterService {
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// The router requests are dispatched to.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// Convert a raw transport request into a router [`Request`].
///
/// Returns `None` for methods `http` cannot represent.
pub fn convert_request(req: RawRequest) -> Option<Request> {
    let method = Method::from_bytes(req.method().as_bytes()).ok()?;
    let mut request = Request::new(method, req.path());
    for header in req.headers() {
        request = request.with_header(header.name, String::from_utf8_lossy(header.value));
    }

    let mut body = Vec::new();
    if let Err(err) = req.body().read_to_end(&mut body) {
        warn!(error = %err, "Failed to read request body");
        body.clear();
    }
    Some(request.with_body(body))
}

impl HttpService for RouterService {
    fn call(&mut self, req: RawRequest, res: &mut RawResponse) -> io::Result<()> {
        let Some(request) = convert_request(req) else {
            res.status_code(400, "Bad Request");
            res.header("Content-Type: text/plain; charset=utf-8");
            res.body_vec(b"Bad Request".to_vec());
            return Ok(());
        };
        let response = self.router.serve(request);
        write_response(res, response);
        Ok(())
    }
}
