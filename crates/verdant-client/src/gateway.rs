//! ledger gateway boundary: read view, signing view, wallet context

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use verdant_core::RecordId;

use crate::cipher::CipherHandle;
use crate::error::GatewayError;

/// public fields of a record as stored on the ledger
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordData {
    pub name: String,
    pub description: String,
    pub creator: String,
    /// creation time, seconds since unix epoch
    pub timestamp: u64,
    pub verified: bool,
    /// ledger-confirmed plaintext, present once verified
    pub decrypted_value: Option<u64>,
    pub public_value: u64,
    pub aux_value: u64,
}

/// record creation transaction payload
#[derive(Clone, Debug)]
pub struct CreateRecord {
    pub id: RecordId,
    pub name: String,
    pub encrypted_payload: Vec<u8>,
    pub proof: Vec<u8>,
    /// plaintext kept as public context next to the ciphertext
    pub public_value: u64,
    pub aux_value: u64,
    pub description: String,
}

/// receipt for a confirmed transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
}

/// an in-flight transaction whose confirmation is awaited once
pub struct PendingTx {
    confirmation: BoxFuture<'static, Result<TxReceipt, GatewayError>>,
}

impl PendingTx {
    /// wrap an already-settled confirmation
    pub fn ready(result: Result<TxReceipt, GatewayError>) -> Self {
        Self {
            confirmation: Box::pin(futures::future::ready(result)),
        }
    }

    /// wrap an in-flight confirmation
    pub fn from_future<F>(confirmation: F) -> Self
    where
        F: Future<Output = Result<TxReceipt, GatewayError>> + Send + 'static,
    {
        Self {
            confirmation: Box::pin(confirmation),
        }
    }

    /// wait for the transaction to confirm
    pub async fn confirmed(self) -> Result<TxReceipt, GatewayError> {
        self.confirmation.await
    }
}

impl fmt::Debug for PendingTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTx").finish_non_exhaustive()
    }
}

/// read-only view of the ledger contract
#[async_trait::async_trait]
pub trait LedgerReader: Send + Sync {
    /// all record identifiers, oldest first
    async fn record_ids(&self) -> Result<Vec<RecordId>, GatewayError>;

    /// public fields for one record
    async fn record(&self, id: &RecordId) -> Result<RecordData, GatewayError>;

    /// opaque handle to the record's encrypted value
    async fn encrypted_handle(&self, id: &RecordId) -> Result<CipherHandle, GatewayError>;

    /// contract self-reported readiness
    async fn is_available(&self) -> Result<bool, GatewayError>;
}

/// signing view of the ledger contract
#[async_trait::async_trait]
pub trait LedgerSigner: Send + Sync {
    /// submit a record creation transaction
    async fn create_record(&self, tx: CreateRecord) -> Result<PendingTx, GatewayError>;

    /// submit a decryption-verification transaction carrying the
    /// provider's abi-encoded cleartexts and proof
    async fn submit_verification(
        &self,
        id: &RecordId,
        cleartexts: Vec<u8>,
        proof: Vec<u8>,
    ) -> Result<PendingTx, GatewayError>;
}

/// wallet state passed explicitly into the session
///
/// the signing view is optional: a read-only context can still reload and
/// probe availability, but submit/verify fail with `GatewayUnavailable`.
#[derive(Clone)]
pub struct WalletContext {
    /// connected account address
    pub address: String,
    signer: Option<Arc<dyn LedgerSigner>>,
}

impl WalletContext {
    /// context with signing capability
    pub fn with_signer(address: impl Into<String>, signer: Arc<dyn LedgerSigner>) -> Self {
        Self {
            address: address.into(),
            signer: Some(signer),
        }
    }

    /// context without a signer
    pub fn read_only(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            signer: None,
        }
    }

    /// signing view, when attached
    pub fn signer(&self) -> Option<Arc<dyn LedgerSigner>> {
        self.signer.clone()
    }
}

impl fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletContext")
            .field("address", &self.address)
            .field("has_signer", &self.signer.is_some())
            .finish()
    }
}
