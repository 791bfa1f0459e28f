mod error;
mod headers;
mod models;
mod normalize;
#[cfg(feature = "cli")]
mod printer;
#[cfg(feature = "cli")]
mod runner;

pub use error::{ErrorKind, ExecutionError};
pub use headers::{build_headers, prepare_request, PreparedRequest};
pub use models::{
    first_error_json, ExecutionResult, GraphQLError, Location, PathSegment, RequestBody,
    ResponseFraming,
};
pub use normalize::{normalize_response, parse_variables};
#[cfg(feature = "cli")]
pub use printer::{format_payload, print_execution_error, print_execution_result};
#[cfg(feature = "cli")]
pub use runner::Executor;
