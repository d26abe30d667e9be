//! Drives a full resolution (parse, discover, request, render) and publishes its state.
//!
//! Every call to [`ResolutionController::resolve_and_render`] gets a sequence number.
//! Starting a call supersedes all earlier ones: their pipelines are dropped at the next
//! suspension point (which aborts any in-flight request) and their results are never
//! committed. Only the newest call can move the state to `Ready` or `Failed`.

use std::{future::Future, sync::Arc};

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use zapdesk_core::{address::LightningAddress, amount::Sats};

use crate::{
    cache::PayParametersCache,
    client::LnurlClient,
    config::{ResolverConfig, DEFAULT_LIGHTNING_ADDRESS},
    directory::{resolve_address, AddressChoice, PayeeDirectory},
    error::ResolutionError,
    invoice::InvoiceRequester,
    qr::{CodeRenderer, RenderedCode},
    resolver::EndpointResolver,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceResult {
    pub address: LightningAddress,
    pub amount: Sats,
    pub payment_request: String,
    pub success_action: Option<Value>,
    pub routes: Vec<Value>,
    /// The `text/plain` entry of the endpoint metadata, if any.
    pub description: Option<String>,
    pub code: RenderedCode,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ResolutionState {
    #[default]
    Idle,
    Resolving {
        seq: u64,
        amount: Sats,
    },
    Ready {
        seq: u64,
        result: Arc<InvoiceResult>,
    },
    Failed {
        seq: u64,
        error: ResolutionError,
    },
}

impl ResolutionState {
    /// Sequence number of the call that produced this state, 0 for `Idle`.
    pub const fn seq(&self) -> u64 {
        match self {
            Self::Idle => 0,
            Self::Resolving { seq, .. } | Self::Ready { seq, .. } | Self::Failed { seq, .. } => {
                *seq
            }
        }
    }

    pub const fn is_resolving(&self) -> bool {
        matches!(self, Self::Resolving { .. })
    }
}

/// Result of a call that did not fail. A superseded call is not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    Ready(Arc<InvoiceResult>),
    Superseded,
}

impl ResolveOutcome {
    pub fn ready(self) -> Option<Arc<InvoiceResult>> {
        match self {
            Self::Ready(result) => Some(result),
            Self::Superseded => None,
        }
    }
}

pub struct ControllerBuilder<C> {
    client: C,
    cache: Option<Arc<PayParametersCache>>,
    config: ResolverConfig,
    default_address: String,
}

impl<C: LnurlClient + Clone> ControllerBuilder<C> {
    fn new(client: C) -> Self {
        Self {
            client,
            cache: None,
            config: ResolverConfig::default(),
            default_address: DEFAULT_LIGHTNING_ADDRESS.to_owned(),
        }
    }

    /// Shares an existing cache instead of creating one from the configured ttl.
    pub fn with_cache(mut self, cache: Arc<PayParametersCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_default_address(mut self, default_address: impl Into<String>) -> Self {
        self.default_address = default_address.into();
        self
    }

    pub fn build(self) -> ResolutionController<C> {
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(PayParametersCache::new(self.config.cache_ttl())));

        ResolutionController {
            resolver: EndpointResolver::new(self.client.clone(), cache),
            requester: InvoiceRequester::new(self.client)
                .with_min_invoice_length(self.config.min_invoice_length),
            renderer: CodeRenderer::new(self.config.qr_min_dimension),
            default_address: self.default_address,
            state: watch::Sender::new(ResolutionState::Idle),
        }
    }
}

pub struct ResolutionController<C> {
    resolver: EndpointResolver<C>,
    requester: InvoiceRequester<C>,
    renderer: CodeRenderer,
    default_address: String,
    state: watch::Sender<ResolutionState>,
}

impl<C: LnurlClient + Clone> ResolutionController<C> {
    pub fn builder(client: C) -> ControllerBuilder<C> {
        ControllerBuilder::new(client)
    }
}

impl<C: LnurlClient> ResolutionController<C> {
    pub fn subscribe(&self) -> watch::Receiver<ResolutionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ResolutionState {
        self.state.borrow().clone()
    }

    pub fn cache(&self) -> &Arc<PayParametersCache> {
        self.resolver.cache()
    }

    pub fn default_address(&self) -> &str {
        &self.default_address
    }

    /// Resolves `address` and renders an invoice for `amount`.
    ///
    /// Returns `Superseded` if another call started before this one finished, in which
    /// case this call's result or error is discarded.
    pub async fn resolve_and_render(
        &self,
        address: &str,
        amount: Sats,
    ) -> Result<ResolveOutcome, ResolutionError> {
        self.run_latest(amount, self.pipeline(address, amount))
            .await
    }

    /// Looks up the payee's address in `directory` and resolves it. The configured
    /// default address is used when there is no identity or the directory has no
    /// address for it. An address the directory does return is never replaced, even
    /// if it fails to resolve.
    pub async fn resolve_for_payee<D>(
        &self,
        directory: &D,
        identity: Option<&str>,
        amount: Sats,
    ) -> Result<ResolveOutcome, ResolutionError>
    where
        D: PayeeDirectory + ?Sized,
    {
        self.run_latest(amount, async {
            let choice = match identity {
                Some(identity) => resolve_address(directory, identity).await,
                None => AddressChoice::UseDefault,
            };
            let address = match choice {
                AddressChoice::Use(address) => address,
                AddressChoice::UseDefault => {
                    info!("no address for payee, using {}", self.default_address);
                    self.default_address.clone()
                }
            };
            self.pipeline(&address, amount).await
        })
        .await
    }

    async fn pipeline(&self, address: &str, amount: Sats) -> Result<InvoiceResult, ResolutionError> {
        let address = LightningAddress::parse(address)?;
        let params = self.resolver.resolve(&address).await?;
        let invoice = self.requester.request_invoice(&params, amount).await?;
        let code = self.renderer.render(&invoice.payment_request)?;

        Ok(InvoiceResult {
            address,
            amount,
            payment_request: invoice.payment_request,
            success_action: invoice.success_action,
            routes: invoice.routes,
            description: params.description(),
            code,
        })
    }

    async fn run_latest<F>(
        &self,
        amount: Sats,
        pipeline: F,
    ) -> Result<ResolveOutcome, ResolutionError>
    where
        F: Future<Output = Result<InvoiceResult, ResolutionError>>,
    {
        let seq = self.begin(amount);
        let mut updates = self.state.subscribe();

        let result = tokio::select! {
            biased;
            () = wait_superseded(&mut updates, seq) => {
                debug!("resolution #{} superseded while in flight", seq);
                return Ok(ResolveOutcome::Superseded);
            }
            result = pipeline => result,
        };
        self.commit(seq, result)
    }

    fn begin(&self, amount: Sats) -> u64 {
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = state.seq() + 1;
            *state = ResolutionState::Resolving { seq, amount };
        });
        debug!("resolution #{} started for {}", seq, amount);
        seq
    }

    /// Publishes the result unless a newer call has started since `seq` began.
    fn commit(
        &self,
        seq: u64,
        result: Result<InvoiceResult, ResolutionError>,
    ) -> Result<ResolveOutcome, ResolutionError> {
        let (next, outcome) = match result {
            Ok(invoice) => {
                let invoice = Arc::new(invoice);
                (
                    ResolutionState::Ready {
                        seq,
                        result: invoice.clone(),
                    },
                    Ok(ResolveOutcome::Ready(invoice)),
                )
            }
            Err(error) => (
                ResolutionState::Failed {
                    seq,
                    error: error.clone(),
                },
                Err(error),
            ),
        };

        let committed = self.state.send_if_modified(|state| {
            if state.seq() == seq {
                *state = next;
                true
            } else {
                false
            }
        });
        if !committed {
            debug!("resolution #{} finished after being superseded", seq);
            return Ok(ResolveOutcome::Superseded);
        }

        match &outcome {
            Ok(_) => info!("resolution #{} ready", seq),
            Err(err) => warn!("resolution #{} failed: {}", seq, err),
        }
        outcome
    }
}

async fn wait_superseded(updates: &mut watch::Receiver<ResolutionState>, seq: u64) {
    if updates.wait_for(|state| state.seq() != seq).await.is_err() {
        // sender lives as long as the controller
        std::future::pending::<()>().await;
    }
}
