//! cipher provider boundary: fhe encryption and verified decryption
//!
//! the scheme itself is an opaque capability; this module only fixes the
//! contract the workflows consume.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::{CipherError, GatewayError};

/// opaque reference to an encrypted value stored on the ledger
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CipherHandle(String);

impl CipherHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CipherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// encrypted payload plus validity proof bound to a contract+user pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedValue {
    pub payload: Vec<u8>,
    pub proof: Vec<u8>,
}

/// one-shot async callback that submits the verification transaction
///
/// receives the provider's abi-encoded cleartexts and decryption proof,
/// resolves once the transaction is confirmed.
pub type VerificationSubmitter =
    Box<dyn FnOnce(Vec<u8>, Vec<u8>) -> BoxFuture<'static, Result<(), GatewayError>> + Send>;

/// fhe capability consumed by the workflows
#[async_trait::async_trait]
pub trait CipherProvider: Send + Sync {
    /// one-time setup, idempotent per session
    async fn initialize(&self) -> Result<(), CipherError>;

    /// encrypt `value` bound to the contract+user pair, yielding the
    /// ciphertext and its validity proof
    async fn encrypt(
        &self,
        contract: &str,
        user: &str,
        value: u64,
    ) -> Result<EncryptedValue, CipherError>;

    /// drive the decryption-verification protocol for `handles`
    ///
    /// calls `submit` exactly once with the abi-encoded cleartexts and
    /// decryption proof, and resolves to the per-handle cleartext mapping
    /// once the submitted transaction confirms.
    async fn request_verified_decryption(
        &self,
        handles: &[CipherHandle],
        contract: &str,
        submit: VerificationSubmitter,
    ) -> Result<HashMap<CipherHandle, u64>, CipherError>;
}
