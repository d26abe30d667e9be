use thiserror::Error;
use zapdesk_core::{
    amount::{Millisats, Sats},
    error::ZapdeskCoreError,
};

/// Failures of a single resolution. Every component reports one of these kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Invalid lightning address - {0}")]
    InvalidAddressFormat(String),

    #[error("LNURL endpoint unreachable - {0}")]
    EndpointUnreachable(String),

    #[error("Malformed pay parameters - {0}")]
    MalformedPayParameters(String),

    /// Displays the payable range in whole sats.
    #[error(
        "Amount {amount} is out of range ({} - {})",
        .min.to_sat_ceil(),
        .max.to_sat_floor()
    )]
    AmountOutOfRange {
        amount: Sats,
        min: Millisats,
        max: Millisats,
    },

    #[error("Invoice request failed - {0}")]
    InvoiceRequestFailed(String),

    #[error("Malformed invoice response - {0}")]
    MalformedInvoiceResponse(String),

    #[error("Failed to encode QR code - {0}")]
    EncodingFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAddressFormat,
    EndpointUnreachable,
    MalformedPayParameters,
    AmountOutOfRange,
    InvoiceRequestFailed,
    MalformedInvoiceResponse,
    EncodingFailed,
}

impl ResolutionError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAddressFormat(_) => ErrorKind::InvalidAddressFormat,
            Self::EndpointUnreachable(_) => ErrorKind::EndpointUnreachable,
            Self::MalformedPayParameters(_) => ErrorKind::MalformedPayParameters,
            Self::AmountOutOfRange { .. } => ErrorKind::AmountOutOfRange,
            Self::InvoiceRequestFailed(_) => ErrorKind::InvoiceRequestFailed,
            Self::MalformedInvoiceResponse(_) => ErrorKind::MalformedInvoiceResponse,
            Self::EncodingFailed(_) => ErrorKind::EncodingFailed,
        }
    }
}

impl From<ZapdeskCoreError> for ResolutionError {
    fn from(err: ZapdeskCoreError) -> Self {
        match err {
            ZapdeskCoreError::InvalidAddressFormat { .. } => {
                Self::InvalidAddressFormat(err.to_string())
            }
            ZapdeskCoreError::InvalidPayParameters(reason) => Self::MalformedPayParameters(reason),
            ZapdeskCoreError::SerdeJsonError(e) => Self::MalformedPayParameters(e.to_string()),
            ZapdeskCoreError::AmountOverflow(sat) => Self::AmountOutOfRange {
                amount: Sats(sat),
                min: Millisats(0),
                max: Millisats(u64::MAX),
            },
        }
    }
}

/// Transport level failures of a [`crate::client::LnurlClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Request timed out - {0}")]
    Timeout(String),

    #[error("Request failed - {0}")]
    Transport(String),

    #[error("Unexpected status {status} - {reason}")]
    Status { status: u16, reason: String },

    #[error("Invalid json body - {0}")]
    InvalidJson(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
