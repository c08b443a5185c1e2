//! Expansion of dynamic references in headers, URLs and payloads

mod headers;
mod payload;
mod url;

pub use headers::template_headers;
pub use payload::{load_payload, template_payload};
pub use url::template_url;
