//! Application error taxonomy and the response shapes built from it

pub mod app_error;
pub mod codes;
pub mod external;
pub mod raised;
pub mod response;

pub use app_error::{AppError, FieldErrors};
pub use codes::ErrorKind;
pub use external::ExternalValidation;
pub use raised::{classify, HandlerError, RaisedError};
pub use response::{ErrorBody, ErrorDetails, ErrorPayload, ErrorResponse};
