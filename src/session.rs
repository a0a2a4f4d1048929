//! Per-invocation session: an RPC client bound to one network plus an
//! optional signer.
//!
//! A session is built fresh for every run and never cached. It is
//! `ClientReady` once endpoints resolve and `SigningReady` when a key was
//! supplied and decoded.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::{Credentials, Settings};
use crate::error::StepError;
use crate::signer::Signer;
use sui_steps_transport::{
    FaucetClient, HttpTransport, Network, NetworkEndpoints, RpcTransport, SuiRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    ClientReady,
    SigningReady,
}

pub struct Session {
    endpoints: NetworkEndpoints,
    transport: Arc<dyn RpcTransport>,
    signer: Option<Signer>,
    faucet: Option<FaucetClient>,
    settings: Settings,
}

impl Session {
    /// Resolve endpoints, connect the HTTP client and decode the key if present.
    pub fn init(credentials: &Credentials, settings: Settings) -> Result<Self, StepError> {
        let endpoints = credentials.endpoints()?;
        let transport = HttpTransport::with_timeouts(
            &endpoints.rpc_url,
            settings.request_timeout,
            settings.connect_timeout,
        );
        let signer = match credentials.private_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                Some(Signer::from_key(key, credentials.key_scheme)?)
            }
            _ => None,
        };
        let faucet = endpoints
            .faucet_url
            .as_deref()
            .map(|url| FaucetClient::new(url, settings.request_timeout));

        debug!(
            network = %endpoints.network,
            rpc_url = %endpoints.rpc_url,
            signer = signer.is_some(),
            "session initialized"
        );

        Ok(Self {
            endpoints,
            transport: Arc::new(transport),
            signer,
            faucet,
            settings,
        })
    }

    /// Session over an arbitrary transport, without signer or faucet.
    pub fn with_transport(endpoints: NetworkEndpoints, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            endpoints,
            transport,
            signer: None,
            faucet: None,
            settings: Settings::default(),
        }
    }

    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_faucet(mut self, faucet: FaucetClient) -> Self {
        self.faucet = Some(faucet);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> SessionState {
        if self.signer.is_some() {
            SessionState::SigningReady
        } else {
            SessionState::ClientReady
        }
    }

    pub fn network(&self) -> Network {
        self.endpoints.network
    }

    pub fn endpoints(&self) -> &NetworkEndpoints {
        &self.endpoints
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn transport(&self) -> &dyn RpcTransport {
        self.transport.as_ref()
    }

    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    pub fn require_signer(&self) -> Result<&Signer, StepError> {
        self.signer.as_ref().ok_or_else(StepError::signer_required)
    }

    pub fn faucet(&self) -> Option<&FaucetClient> {
        self.faucet.as_ref()
    }

    /// Issue one typed request.
    pub async fn call(&self, request: &SuiRequest) -> Result<Value, StepError> {
        Ok(self.transport.call(request).await?)
    }
}
