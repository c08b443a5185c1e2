//! HTTP request dispatch

mod executor;
mod transport;

pub use executor::RequestExecutor;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
