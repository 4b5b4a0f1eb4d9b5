#![forbid(unsafe_code)]

use poem_openapi::Object;
use thiserror::Error;

/// Error enumerates the errors returned by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("user_demo_server input parameters:\n{}", .0)]
    InputParms(String),

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Inaccessible logger configuration file.
    #[error("Unable to access the Log4rs configuration file: {}", .0)]
    Log4rsInitialization(String),

    #[error("Reading application configuration file: {}", .0)]
    ReadingConfigFile(String),

    #[error("Unable to parse TOML file: {}", .0)]
    TOMLParseError(String),

    #[error("Invalid data directory: {}", .0)]
    DataDirectory(String),

    /// No live user record has the requested id.
    #[error("user not found")]
    UserNotFound(i64),

    /// The user collection lock was poisoned by a panicking holder.
    #[error("User store unavailable: {}", .0)]
    StoreUnavailable(String),
}

// ***************************************************************************
//                          HTTP Error Body
// ***************************************************************************
/// The JSON body of every non-success response: `{"error": "..."}`.
#[derive(Object, Debug)]
pub struct HttpResult {
    pub error: String,
}

impl HttpResult {
    pub fn new(error: String) -> Self {
        Self {error}
    }
}
