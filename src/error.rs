use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur when building documents for or talking to the
/// Számla Agent service.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("error making request: {0:?}")]
    #[diagnostic(
        code(szamlazz_rs::request_error),
        help("Check your network connection and the szamlazz.hu service availability")
    )]
    Request(#[source] reqwest::Error),

    /// The service answered with a non-200 HTTP status.
    #[error("{status} {status_text}")]
    #[diagnostic(
        code(szamlazz_rs::transport_error),
        help("The szamlazz.hu endpoint rejected the request before processing it")
    )]
    Transport { status: u16, status_text: String },

    /// The service processed the request and reported a business-rule
    /// failure, either via the `szlahu_error_code`/`szlahu_error` header
    /// pair or via an error node embedded in the response document.
    #[error("{message}")]
    #[diagnostic(
        code(szamlazz_rs::service_error),
        help("Look up the vendor error code in the szamlazz.hu Számla Agent documentation")
    )]
    Service { code: String, message: String },

    /// A malformed or missing entity/request field. The message names the
    /// field and the constraint it violated.
    #[error("{0}")]
    #[diagnostic(
        code(szamlazz_rs::validation_error),
        help("Fix the named field before retrying; invalid values are never silently defaulted")
    )]
    Validation(String),

    #[error("error parsing response XML: {0}")]
    #[diagnostic(
        code(szamlazz_rs::parse_error),
        help("The service returned a body that is not well-formed XML")
    )]
    Parse(#[source] quick_xml::Error),

    /// The response parsed as XML but did not have the expected shape.
    #[error("unexpected response: {reason}")]
    #[diagnostic(
        code(szamlazz_rs::unexpected_response),
        help("The service returned XML without the fields this operation expects")
    )]
    UnexpectedResponse { reason: String },
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn unexpected(reason: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            reason: reason.into(),
        }
    }

    /// The vendor-specific error code, when the service reported a
    /// business-rule failure.
    #[must_use]
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Self::Parse(e)
    }
}

/// Type alias for results from this crate.
///
/// This is already a Miette diagnostic result due to the implementation of
/// the Diagnostic trait for the Error type.
pub type Result<O> = std::result::Result<O, Error>;
