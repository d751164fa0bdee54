//! Transport adapter: serves a [`Router`](crate::Router) over HTTP/1.1 with
//! `may_minihttp`, one coroutine per connection.

pub mod http_server;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use response::write_response;
pub use service::{convert_request, RouterService};
