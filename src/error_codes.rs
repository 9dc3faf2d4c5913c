//! Machine-readable usage errors.
//!
//! Bad config keys, malformed overrides, unparseable colours and invalid
//! opacity steps travel through the `anyhow` chain as a [`CodedError`]. The
//! CLI finds it with [`find_coded_error`] to choose [`USAGE_EXIT_CODE`] and,
//! under `--json`, prints an [`ErrorEnvelope`] on stderr.

use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::{json, Value};

pub const UNKNOWN_PATH_KEY: &str = "UNKNOWN_PATH_KEY";
pub const UNKNOWN_FONT_KEY: &str = "UNKNOWN_FONT_KEY";
pub const INVALID_OVERRIDE: &str = "INVALID_OVERRIDE";
pub const INVALID_COLOR: &str = "INVALID_COLOR";
pub const INVALID_OPACITY: &str = "INVALID_OPACITY";

pub const USAGE_EXIT_CODE: u8 = 2;
pub const FAILURE_EXIT_CODE: u8 = 1;

#[derive(Debug, Clone)]
pub struct CodedError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl CodedError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// An input value that was refused; `provided` is echoed in the details.
    pub fn rejected(
        code: &'static str,
        message: impl Into<String>,
        provided: impl Serialize,
    ) -> Self {
        Self::new(code, message).with_details(json!({ "provided": provided }))
    }

    /// A lookup by name that matched none of `allowed`.
    pub fn unknown_key(code: &'static str, kind: &str, key: &str, allowed: &[&str]) -> Self {
        Self::new(code, format!("unknown {kind} key '{key}'"))
            .with_details(json!({ "provided": key, "allowed": allowed }))
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)
    }
}

impl std::error::Error for CodedError {}

/// JSON body printed on stderr by `--json` commands on failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorEnvelopeBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelopeBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&CodedError> for ErrorEnvelope {
    fn from(error: &CodedError) -> Self {
        Self {
            ok: false,
            error: ErrorEnvelopeBody {
                code: error.code.to_owned(),
                message: error.message.clone(),
                details: error.details.clone(),
            },
        }
    }
}

pub fn find_coded_error(error: &Error) -> Option<&CodedError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CodedError>())
}

/// Process exit status for `error`: usage errors are distinguished from
/// everything else.
pub fn exit_code(error: &Error) -> u8 {
    if find_coded_error(error).is_some() {
        USAGE_EXIT_CODE
    } else {
        FAILURE_EXIT_CODE
    }
}
