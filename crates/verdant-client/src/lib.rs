//! verdant-client: encrypt-submit / decrypt-verify workflows for the
//! verdant carbon ledger
//!
//! the session orchestrates two external capabilities behind trait seams:
//! - a cipher provider (fhe encryption plus verified decryption)
//! - a ledger gateway (read view plus signing view)
//!
//! records live in a replace-on-reload store; optimistic plaintexts from
//! fresh verifications sit in an overlay until the next reload. every
//! workflow failure becomes a transient status notice, never a panic.
//!
//! ## usage
//!
//! ```rust,ignore
//! let ledger = Arc::new(MemoryLedger::new());
//! let cipher = Arc::new(MemoryCipher::new());
//! let wallet = WalletContext::with_signer("0xalice", ledger.clone());
//! let client = CarbonClient::new(ClientConfig::default(), wallet, ledger, cipher);
//!
//! client.initialize().await?;
//! let id = client.submit("bus commute", Category::Transport, "12").await?;
//! let value = client.verify(&id).await?;
//! ```

pub mod cipher;
pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod session;
pub mod status;
pub mod store;

pub use cipher::{CipherHandle, CipherProvider, EncryptedValue, VerificationSubmitter};
pub use config::ClientConfig;
pub use error::{CipherError, GatewayError, Result, WorkflowError};
pub use gateway::{
    CreateRecord, LedgerReader, LedgerSigner, PendingTx, RecordData, TxReceipt, WalletContext,
};
pub use memory::{MemoryCipher, MemoryLedger};
pub use session::CarbonClient;
pub use status::StatusTracker;
pub use store::{DecryptedOverlay, RecordStore, Snapshot};
