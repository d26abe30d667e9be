use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZapdeskCoreError {
    #[error("Invalid lightning address {address:?}: {reason}")]
    InvalidAddressFormat { address: String, reason: String },

    #[error("Invalid pay parameters: {0}")]
    InvalidPayParameters(String),

    #[error("Amount overflow: {0} sat can not be expressed in msat")]
    AmountOverflow(u64),

    #[error("SerdeJsonError {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ZapdeskCoreError {
    pub(crate) fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAddressFormat {
            address: address.to_owned(),
            reason: reason.into(),
        }
    }
}
