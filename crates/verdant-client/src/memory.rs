//! in-memory ledger and cipher for demos and tests
//!
//! deterministic stand-ins for the real contract and fhe runtime. knobs
//! simulate the failure modes the workflows must survive: user rejection,
//! reverted transactions, flaky reads, and a concurrent verification.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use verdant_core::RecordId;

use crate::cipher::{CipherHandle, CipherProvider, EncryptedValue, VerificationSubmitter};
use crate::error::{CipherError, GatewayError};
use crate::gateway::{CreateRecord, LedgerReader, LedgerSigner, PendingTx, RecordData, TxReceipt};

/// handle the ledger mints for a stored ciphertext; the cipher derives
/// the same value when it registers the plaintext
fn handle_for(ciphertext: &[u8]) -> CipherHandle {
    CipherHandle::new(hex::encode(blake3::hash(ciphertext).as_bytes()))
}

fn tx_hash_for(id: &str, payload: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(id.as_bytes());
    hasher.update(payload);
    format!("0x{}", hex::encode(hasher.finalize().as_bytes()))
}

fn now_secs() -> u64 {
    Utc::now().timestamp() as u64
}

struct StoredRecord {
    id: RecordId,
    data: RecordData,
    ciphertext: Vec<u8>,
}

#[derive(Default)]
struct LedgerState {
    records: Vec<StoredRecord>,
    caller: String,
    available: bool,
    reject_next_create: bool,
    fail_next_create: bool,
    reject_next_verification: bool,
    concurrent_verification: bool,
    fail_listing: bool,
    fail_availability: bool,
    failing_reads: HashSet<String>,
}

/// in-memory ledger contract implementing both the read and signing views
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                caller: "0xoperator".into(),
                available: true,
                ..Default::default()
            }),
        }
    }

    /// address recorded as `creator` for subsequently created records
    pub fn set_caller(&self, address: impl Into<String>) {
        self.state.lock().unwrap().caller = address.into();
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().available = available;
    }

    /// abort the next create_record at submission, as a user rejection
    pub fn reject_next_create(&self) {
        self.state.lock().unwrap().reject_next_create = true;
    }

    /// revert the next create_record at confirmation
    pub fn fail_next_create(&self) {
        self.state.lock().unwrap().fail_next_create = true;
    }

    /// abort the next submit_verification, as a user rejection
    pub fn reject_next_verification(&self) {
        self.state.lock().unwrap().reject_next_verification = true;
    }

    /// let a concurrent actor win the next verification: their result is
    /// applied to the ledger and the caller's transaction reports
    /// `AlreadyVerified`
    pub fn arm_concurrent_verification(&self) {
        self.state.lock().unwrap().concurrent_verification = true;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    pub fn fail_availability(&self, fail: bool) {
        self.state.lock().unwrap().fail_availability = fail;
    }

    /// make reads of `id` fail until cleared again
    pub fn fail_reads_of(&self, id: &RecordId, fail: bool) {
        let mut state = self.state.lock().unwrap();
        if fail {
            state.failing_reads.insert(id.as_str().to_owned());
        } else {
            state.failing_reads.remove(id.as_str());
        }
    }

    /// seed a record the ledger already verified in an earlier session
    pub fn seed_verified(&self, name: &str, description: &str, value: u64) -> RecordId {
        let mut state = self.state.lock().unwrap();
        let id = RecordId::from(format!("carbon-seed-{}", state.records.len()));
        let data = RecordData {
            name: name.to_owned(),
            description: description.to_owned(),
            creator: state.caller.clone(),
            timestamp: now_secs(),
            verified: true,
            decrypted_value: Some(value),
            public_value: value,
            aux_value: 0,
        };
        state.records.push(StoredRecord {
            id: id.clone(),
            data,
            ciphertext: Vec::new(),
        });
        id
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }
}

#[async_trait::async_trait]
impl LedgerReader for MemoryLedger {
    async fn record_ids(&self) -> Result<Vec<RecordId>, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(GatewayError::Query("record listing unavailable".into()));
        }
        Ok(state.records.iter().map(|r| r.id.clone()).collect())
    }

    async fn record(&self, id: &RecordId) -> Result<RecordData, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.failing_reads.contains(id.as_str()) {
            return Err(GatewayError::Query(format!("read of {id} timed out")));
        }
        state
            .records
            .iter()
            .find(|r| &r.id == id)
            .map(|r| r.data.clone())
            .ok_or_else(|| GatewayError::RecordNotFound(id.to_string()))
    }

    async fn encrypted_handle(&self, id: &RecordId) -> Result<CipherHandle, GatewayError> {
        let state = self.state.lock().unwrap();
        let record = state
            .records
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| GatewayError::RecordNotFound(id.to_string()))?;
        Ok(handle_for(&record.ciphertext))
    }

    async fn is_available(&self) -> Result<bool, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.fail_availability {
            return Err(GatewayError::Query("availability probe failed".into()));
        }
        Ok(state.available)
    }
}

#[async_trait::async_trait]
impl LedgerSigner for MemoryLedger {
    async fn create_record(&self, tx: CreateRecord) -> Result<PendingTx, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_next_create {
            state.reject_next_create = false;
            return Err(GatewayError::RejectedByUser);
        }
        if state.fail_next_create {
            state.fail_next_create = false;
            return Ok(PendingTx::ready(Err(GatewayError::Transaction(
                "execution reverted".into(),
            ))));
        }

        let receipt = TxReceipt {
            tx_hash: tx_hash_for(tx.id.as_str(), &tx.encrypted_payload),
        };
        let data = RecordData {
            name: tx.name,
            description: tx.description,
            creator: state.caller.clone(),
            timestamp: now_secs(),
            verified: false,
            decrypted_value: None,
            public_value: tx.public_value,
            aux_value: tx.aux_value,
        };
        state.records.push(StoredRecord {
            id: tx.id,
            data,
            ciphertext: tx.encrypted_payload,
        });
        Ok(PendingTx::ready(Ok(receipt)))
    }

    async fn submit_verification(
        &self,
        id: &RecordId,
        cleartexts: Vec<u8>,
        proof: Vec<u8>,
    ) -> Result<PendingTx, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_next_verification {
            state.reject_next_verification = false;
            return Err(GatewayError::RejectedByUser);
        }

        let clear: HashMap<String, u64> = serde_json::from_slice(&cleartexts)
            .map_err(|e| GatewayError::Transaction(format!("malformed cleartexts: {e}")))?;
        if proof != blake3::hash(&cleartexts).as_bytes() {
            return Err(GatewayError::Transaction("invalid decryption proof".into()));
        }

        let concurrent = state.concurrent_verification;
        state.concurrent_verification = false;

        let record = state
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| GatewayError::RecordNotFound(id.to_string()))?;
        if record.data.verified {
            return Err(GatewayError::AlreadyVerified);
        }

        let handle = handle_for(&record.ciphertext);
        let value = clear
            .get(handle.as_str())
            .copied()
            .ok_or_else(|| GatewayError::Transaction("cleartext missing for record".into()))?;

        record.data.verified = true;
        record.data.decrypted_value = Some(value);

        if concurrent {
            // the competing transaction landed first with the same result
            return Err(GatewayError::AlreadyVerified);
        }

        Ok(PendingTx::ready(Ok(TxReceipt {
            tx_hash: tx_hash_for(id.as_str(), &cleartexts),
        })))
    }
}

/// in-memory cipher provider with deterministic handles
///
/// encryption derives a unique pseudo-ciphertext and registers the
/// plaintext under the handle the ledger will mint for it;
/// `request_verified_decryption` consults that table.
#[derive(Default)]
pub struct MemoryCipher {
    initialized: AtomicBool,
    fail_init: AtomicBool,
    fail_encrypt: AtomicBool,
    encrypt_delay: Mutex<Option<Duration>>,
    counter: AtomicU64,
    table: Mutex<HashMap<String, u64>>,
    encrypt_calls: AtomicUsize,
    decryption_requests: AtomicUsize,
}

impl MemoryCipher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_initialization(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    pub fn fail_encryption(&self, fail: bool) {
        self.fail_encrypt.store(fail, Ordering::SeqCst);
    }

    /// stall every encrypt call, simulating a slow fhe runtime
    pub fn set_encrypt_delay(&self, delay: Duration) {
        *self.encrypt_delay.lock().unwrap() = Some(delay);
    }

    /// encrypt calls so far
    pub fn encrypt_calls(&self) -> usize {
        self.encrypt_calls.load(Ordering::SeqCst)
    }

    /// decryption-verification requests so far
    pub fn decryption_requests(&self) -> usize {
        self.decryption_requests.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CipherProvider for MemoryCipher {
    async fn initialize(&self) -> Result<(), CipherError> {
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(CipherError::Init("fhe runtime unavailable".into()));
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn encrypt(
        &self,
        contract: &str,
        user: &str,
        value: u64,
    ) -> Result<EncryptedValue, CipherError> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_encrypt.load(Ordering::SeqCst) {
            return Err(CipherError::Encryption("simulated encryption failure".into()));
        }
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(CipherError::Encryption("cipher not initialized".into()));
        }
        let delay = *self.encrypt_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let nonce = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"verdant.memory.cipher.v1");
        hasher.update(contract.as_bytes());
        hasher.update(user.as_bytes());
        hasher.update(&value.to_le_bytes());
        hasher.update(&nonce.to_le_bytes());
        let payload = hasher.finalize().as_bytes().to_vec();

        let mut proof = blake3::Hasher::new();
        proof.update(b"verdant.memory.proof.v1");
        proof.update(&payload);
        let proof = proof.finalize().as_bytes().to_vec();

        let handle = handle_for(&payload);
        self.table
            .lock()
            .unwrap()
            .insert(handle.as_str().to_owned(), value);

        Ok(EncryptedValue { payload, proof })
    }

    async fn request_verified_decryption(
        &self,
        handles: &[CipherHandle],
        _contract: &str,
        submit: VerificationSubmitter,
    ) -> Result<HashMap<CipherHandle, u64>, CipherError> {
        self.decryption_requests.fetch_add(1, Ordering::SeqCst);

        let mut clear = HashMap::new();
        {
            let table = self.table.lock().unwrap();
            for handle in handles {
                let value = table
                    .get(handle.as_str())
                    .copied()
                    .ok_or_else(|| CipherError::Decryption(format!("unknown handle {handle}")))?;
                clear.insert(handle.clone(), value);
            }
        }

        let encoded: HashMap<&str, u64> = clear.iter().map(|(h, v)| (h.as_str(), *v)).collect();
        let cleartexts =
            serde_json::to_vec(&encoded).map_err(|e| CipherError::Decryption(e.to_string()))?;
        let proof = blake3::hash(&cleartexts).as_bytes().to_vec();

        submit(cleartexts, proof).await?;

        Ok(clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_submitter() -> VerificationSubmitter {
        Box::new(|_, _| Box::pin(async { Ok(()) }))
    }

    #[tokio::test]
    async fn encrypt_mints_unique_payloads() {
        let cipher = MemoryCipher::new();
        cipher.initialize().await.unwrap();

        let a = cipher.encrypt("0xc", "0xu", 10).await.unwrap();
        let b = cipher.encrypt("0xc", "0xu", 10).await.unwrap();
        assert_ne!(a.payload, b.payload);

        // both handles decrypt to the same plaintext
        let handles = [handle_for(&a.payload), handle_for(&b.payload)];
        let clear = cipher
            .request_verified_decryption(&handles, "0xc", noop_submitter())
            .await
            .unwrap();
        assert_eq!(clear.get(&handles[0]), Some(&10));
        assert_eq!(clear.get(&handles[1]), Some(&10));
    }

    #[tokio::test]
    async fn uninitialized_cipher_refuses_encrypt() {
        let cipher = MemoryCipher::new();
        let err = cipher.encrypt("0xc", "0xu", 1).await.unwrap_err();
        assert!(matches!(err, CipherError::Encryption(_)));
    }

    #[tokio::test]
    async fn verification_marks_the_record_and_rejects_repeats() {
        let ledger = MemoryLedger::new();
        let ciphertext = b"ciphertext".to_vec();
        let id = RecordId::from_millis(1);
        ledger
            .create_record(CreateRecord {
                id: id.clone(),
                name: "test".into(),
                encrypted_payload: ciphertext.clone(),
                proof: vec![],
                public_value: 7,
                aux_value: 0,
                description: "consumption emissions".into(),
            })
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();

        let handle = ledger.encrypted_handle(&id).await.unwrap();
        let clear: HashMap<&str, u64> = [(handle.as_str(), 7u64)].into_iter().collect();
        let cleartexts = serde_json::to_vec(&clear).unwrap();
        let proof = blake3::hash(&cleartexts).as_bytes().to_vec();

        ledger
            .submit_verification(&id, cleartexts.clone(), proof.clone())
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();

        let data = ledger.record(&id).await.unwrap();
        assert!(data.verified);
        assert_eq!(data.decrypted_value, Some(7));

        // a second verification reports the typed race error
        let err = ledger
            .submit_verification(&id, cleartexts, proof)
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::AlreadyVerified);
    }
}
