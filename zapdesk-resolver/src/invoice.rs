use serde_json::Value;
use tracing::{debug, info, warn};
use zapdesk_core::{
    amount::{Millisats, Sats},
    primitives::{lnurl_error_reason, LnurlCallbackResponse, PayParameters},
};

use crate::{
    client::LnurlClient,
    config::DEFAULT_MIN_INVOICE_LENGTH,
    error::{ClientError, ResolutionError},
};

/// An amount bound payment request as returned by the callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invoice {
    pub payment_request: String,
    pub success_action: Option<Value>,
    /// Route hints as sent by the endpoint, passed through untouched.
    pub routes: Vec<Value>,
}

/// Exchanges pay parameters and an amount for a concrete invoice. Nothing is cached:
/// invoices are amount specific and usually single use.
#[derive(Debug, Clone)]
pub struct InvoiceRequester<C> {
    client: C,
    min_invoice_length: usize,
}

impl<C: LnurlClient> InvoiceRequester<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            min_invoice_length: DEFAULT_MIN_INVOICE_LENGTH,
        }
    }

    pub fn with_min_invoice_length(mut self, min_invoice_length: usize) -> Self {
        self.min_invoice_length = min_invoice_length;
        self
    }

    pub async fn request_invoice(
        &self,
        params: &PayParameters,
        amount: Sats,
    ) -> Result<Invoice, ResolutionError> {
        let amount_msat = checked_amount(params, amount)?;

        let mut callback = params.callback.clone();
        callback
            .query_pairs_mut()
            .append_pair("amount", &amount_msat.0.to_string());
        info!("requesting invoice for {} from {}", amount, callback);

        let body = self.client.get_json(&callback).await.map_err(|err| {
            warn!("invoice request for {} failed: {}", amount, err);
            match err {
                ClientError::InvalidJson(reason) => {
                    ResolutionError::MalformedInvoiceResponse(reason)
                }
                other => ResolutionError::InvoiceRequestFailed(other.to_string()),
            }
        })?;

        if let Some(reason) = lnurl_error_reason(&body) {
            return Err(ResolutionError::InvoiceRequestFailed(reason));
        }

        let response = serde_json::from_value::<LnurlCallbackResponse>(body)
            .map_err(|e| ResolutionError::MalformedInvoiceResponse(e.to_string()))?;
        let payment_request = self.plausible_payment_request(response.pr)?;
        debug!("received invoice {}", payment_request);

        Ok(Invoice {
            payment_request,
            success_action: response.success_action,
            routes: response.routes.unwrap_or_default(),
        })
    }

    fn plausible_payment_request(&self, pr: Option<String>) -> Result<String, ResolutionError> {
        let pr = pr
            .map(|pr| pr.trim().to_owned())
            .filter(|pr| !pr.is_empty())
            .ok_or_else(|| {
                ResolutionError::MalformedInvoiceResponse("missing payment request".to_owned())
            })?;

        if pr.len() < self.min_invoice_length {
            return Err(ResolutionError::MalformedInvoiceResponse(format!(
                "payment request is shorter than {} characters",
                self.min_invoice_length
            )));
        }
        if pr.chars().any(char::is_whitespace) {
            return Err(ResolutionError::MalformedInvoiceResponse(
                "payment request contains whitespace".to_owned(),
            ));
        }
        Ok(pr)
    }
}

/// Converts to millisats and checks the range announced by the endpoint.
/// Zero is never a payable amount.
fn checked_amount(params: &PayParameters, amount: Sats) -> Result<Millisats, ResolutionError> {
    let out_of_range = || ResolutionError::AmountOutOfRange {
        amount,
        min: params.min_sendable,
        max: params.max_sendable,
    };

    if amount.is_zero() {
        return Err(out_of_range());
    }
    let amount_msat = amount.to_msat().map_err(|_| out_of_range())?;
    if !params.accepts(amount_msat) {
        return Err(out_of_range());
    }
    Ok(amount_msat)
}
