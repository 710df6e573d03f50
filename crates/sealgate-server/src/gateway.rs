//! Transport-agnostic entry points.
//!
//! The operations a front end (HTTP, RPC, anything) maps its routes onto.
//! Every confidential operation goes through [`Gateway::open_request`]
//! first, which recovers and verifies the session key against the live
//! keypair before any payload field is decrypted. Failures come back as a
//! [`Rejection`], never as a fault that could take down unrelated requests.

use sealgate_core::{Environment, HybridRequest, OpenedRequest, Rejection, VerifiedSession};

use crate::{
    AdministratorAuthorizer, KeyRing, OneTimeCodes, ServerConfig, ServerError,
    notifier::KeyUpdate, storage::RecordStore,
};

/// Key lifecycle, privilege checks and one-time codes behind one handle.
///
/// Clone shares everything.
#[derive(Clone)]
pub struct Gateway<S: RecordStore, E: Environment> {
    keys: KeyRing<E>,
    authorizer: AdministratorAuthorizer<S>,
    codes: OneTimeCodes<S, E>,
    config: ServerConfig,
}

impl<S: RecordStore, E: Environment> Gateway<S, E> {
    /// Validate `config` and generate the first keypair.
    ///
    /// Nothing can be served before this returns.
    pub fn new(config: ServerConfig, store: S, env: E) -> Result<Self, ServerError> {
        config.validate()?;

        let keys = KeyRing::new(env.clone(), config.key_bits)?;
        Ok(Self::with_key_ring(config, store, env, keys))
    }

    /// Gateway over an existing key ring.
    pub fn with_key_ring(config: ServerConfig, store: S, env: E, keys: KeyRing<E>) -> Self {
        Self {
            authorizer: AdministratorAuthorizer::new(store.clone()),
            codes: OneTimeCodes::new(store, env, config.code_ttl),
            keys,
            config,
        }
    }

    /// The live public key, Base64 DER.
    pub fn public_key(&self) -> String {
        self.keys.current_public_key()
    }

    /// Long-poll for the next rotation.
    ///
    /// Resolves with the new key, or [`KeyUpdate::TimedOut`] after the
    /// configured subscription timeout.
    pub async fn await_key_update(&self) -> KeyUpdate {
        self.keys.subscribe(self.config.subscription_timeout).wait().await
    }

    /// Long-poll for the first rotation after `epoch`.
    ///
    /// Resolves at once if the key already changed since the caller read it.
    pub async fn await_key_update_since(&self, epoch: u64) -> KeyUpdate {
        self.keys.subscribe_since(epoch, self.config.subscription_timeout).wait().await
    }

    /// Recover and verify the request's session key.
    ///
    /// Key recovery and marker failures both yield
    /// [`Rejection::KeyRejected`]; which stage failed is only logged.
    pub fn open_request<'a>(
        &self,
        request: &'a HybridRequest,
    ) -> Result<OpenedRequest<'a>, Rejection> {
        let live = self.keys.current();

        request.open(&live.keypair, &self.config.protocol).map_err(|err| {
            tracing::debug!(epoch = live.epoch, error = %err, "request rejected");
            Rejection::from(&err)
        })
    }

    /// Record a successful privileged login.
    pub fn record_admin_login(&self, owner: &str, session: &VerifiedSession) -> Result<(), Rejection> {
        self.authorizer.record_login(owner, session).map_err(|err| {
            tracing::warn!(owner, error = %err, "failed to record privileged session");
            Rejection::Internal
        })
    }

    /// Whether `session` is the owner's current privileged session.
    pub fn authorize_admin(&self, owner: &str, session: &VerifiedSession) -> Result<bool, Rejection> {
        self.authorizer.is_privileged(owner, session).map_err(|err| {
            tracing::warn!(owner, error = %err, "privilege lookup failed");
            Rejection::Internal
        })
    }

    /// Issue a code for `owner`; delivering it is the caller's job.
    pub fn issue_code(&self, owner: &str) -> Result<String, Rejection> {
        self.codes.issue(owner).map_err(|err| {
            tracing::warn!(owner, error = %err, "failed to issue one-time code");
            Rejection::Internal
        })
    }

    /// Redeem `candidate` against the owner's outstanding code.
    pub fn redeem_code(&self, owner: &str, candidate: &str) -> Result<bool, Rejection> {
        self.codes.redeem(owner, candidate).map_err(|err| {
            tracing::warn!(owner, error = %err, "failed to redeem one-time code");
            Rejection::Internal
        })
    }

    /// Consume the owner's redemption, if any.
    pub fn take_redemption(&self, owner: &str) -> Result<bool, Rejection> {
        self.codes.take_redemption(owner).map_err(|err| {
            tracing::warn!(owner, error = %err, "failed to consume redemption");
            Rejection::Internal
        })
    }

    /// The key ring, for rotation and epoch queries.
    pub fn keys(&self) -> &KeyRing<E> {
        &self.keys
    }

    /// The one-time code service.
    pub fn codes(&self) -> &OneTimeCodes<S, E> {
        &self.codes
    }

    /// The active configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
