pub mod errors;
pub mod logging;
pub mod require;

pub use errors::handle_errors;
pub use logging::{logging_middleware, RequestId, REQUEST_ID_HEADER};
pub use require::{require_fields, BodyPaths, Bucket, ParamPaths, QueryPaths, RequestGuard};
