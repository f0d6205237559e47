//! session facade driving the submit / verify / reload workflows

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use verdant_core::{
    sanitize_carbon_value, CarbonRecord, Category, EcoLevel, EcoStats, HistoryEntry,
    OperationHistory, RecordId, StatusNotice, WorkflowState,
};

use crate::cipher::{CipherProvider, VerificationSubmitter};
use crate::config::ClientConfig;
use crate::error::{CipherError, GatewayError, Result, WorkflowError};
use crate::gateway::{CreateRecord, LedgerReader, RecordData, WalletContext};
use crate::status::StatusTracker;
use crate::store::{DecryptedOverlay, RecordStore, Snapshot};

/// one user session against the carbon ledger
///
/// owns the record store, the optimistic overlay, the status slot and the
/// operation history. the cipher provider and ledger views come in as
/// trait objects; the wallet context is explicit, never ambient.
///
/// all workflow methods take `&self`: internal state sits behind short
/// lived locks that are never held across an await. each workflow guards
/// itself against re-entry, but different workflows may interleave.
pub struct CarbonClient {
    config: ClientConfig,
    wallet: WalletContext,
    reader: Arc<dyn LedgerReader>,
    cipher: Arc<dyn CipherProvider>,
    store: RecordStore,
    overlay: DecryptedOverlay,
    status: StatusTracker,
    history: Mutex<OperationHistory>,
    initialized: AtomicBool,
    submit_state: Mutex<WorkflowState>,
    verify_state: Mutex<WorkflowState>,
}

impl CarbonClient {
    pub fn new(
        config: ClientConfig,
        wallet: WalletContext,
        reader: Arc<dyn LedgerReader>,
        cipher: Arc<dyn CipherProvider>,
    ) -> Self {
        let history = OperationHistory::new(config.history_capacity);
        Self {
            config,
            wallet,
            reader,
            cipher,
            store: RecordStore::new(),
            overlay: DecryptedOverlay::new(),
            status: StatusTracker::new(),
            history: Mutex::new(history),
            initialized: AtomicBool::new(false),
            submit_state: Mutex::new(WorkflowState::default()),
            verify_state: Mutex::new(WorkflowState::default()),
        }
    }

    /// set up the cipher provider, once per session
    ///
    /// until this succeeds, submit and verify fail fast with
    /// `NotInitialized`. retry by calling again; reload and availability
    /// checks do not need it.
    pub async fn initialize(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }
        info!("initializing cipher provider");
        self.cipher
            .initialize()
            .await
            .map_err(|e| WorkflowError::Init(e.to_string()))?;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// encrypt-submit workflow: create a new record on the ledger
    ///
    /// returns the freshly minted record id. retrying after a failure
    /// re-runs encryption and mints a new id; duplicates are possible.
    pub async fn submit(&self, name: &str, category: Category, raw_value: &str) -> Result<RecordId> {
        self.enter(&self.submit_state, "submission")?;
        let result = self.submit_inner(name, category, raw_value).await;
        if let Err(err) = &result {
            self.status.show(
                StatusNotice::error(err.to_string()),
                Some(self.config.error_notice_ttl),
            );
        }
        self.settle(&self.submit_state, &result);
        result
    }

    async fn submit_inner(
        &self,
        name: &str,
        category: Category,
        raw_value: &str,
    ) -> Result<RecordId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkflowError::InvalidInput("name must not be empty".into()));
        }
        let value = sanitize_carbon_value(raw_value).ok_or_else(|| {
            WorkflowError::InvalidInput(format!(
                "carbon value {raw_value:?} is not a non-negative integer"
            ))
        })?;

        let signer = self
            .wallet
            .signer()
            .ok_or(WorkflowError::GatewayUnavailable)?;
        if !self.is_initialized() {
            return Err(WorkflowError::NotInitialized);
        }

        self.status
            .show(StatusNotice::pending("encrypting carbon value..."), None);
        info!(name, value, category = %category, "submitting carbon record");

        let encrypted = self
            .cipher
            .encrypt(&self.config.contract, &self.wallet.address, value)
            .await
            .map_err(|e| WorkflowError::EncryptionFailed(e.to_string()))?;

        let id = RecordId::from_millis(now_millis());
        let tx = signer
            .create_record(CreateRecord {
                id: id.clone(),
                name: name.to_owned(),
                encrypted_payload: encrypted.payload,
                proof: encrypted.proof,
                public_value: value,
                aux_value: 0,
                description: category.description().to_owned(),
            })
            .await
            .map_err(submit_gateway_error)?;

        self.status.show(
            StatusNotice::pending("waiting for transaction confirmation..."),
            None,
        );
        let receipt = tx.confirmed().await.map_err(submit_gateway_error)?;
        info!(%id, tx_hash = %receipt.tx_hash, "carbon record confirmed");

        self.push_history(format!("created record: {name}"));
        self.status.show(
            StatusNotice::success("carbon record created"),
            Some(self.config.success_notice_ttl),
        );

        // the record is on the ledger either way; the next reload catches up
        if let Err(err) = self.reload().await {
            warn!(%err, "reload after submission failed");
        }

        Ok(id)
    }

    /// decrypt-verify workflow: reveal a record's plaintext value
    ///
    /// fast path: a record the ledger already marks verified returns its
    /// stored value with no cipher work. `Ok(None)` means a concurrent
    /// actor verified it first; the store was reloaded with their result.
    pub async fn verify(&self, key: &RecordId) -> Result<Option<u64>> {
        self.enter(&self.verify_state, "verification")?;
        let result = self.verify_inner(key).await;
        if let Err(err) = &result {
            self.status.show(
                StatusNotice::error(err.to_string()),
                Some(self.config.error_notice_ttl),
            );
        }
        self.settle(&self.verify_state, &result);
        result
    }

    async fn verify_inner(&self, key: &RecordId) -> Result<Option<u64>> {
        if !self.is_initialized() {
            return Err(WorkflowError::NotInitialized);
        }

        self.status
            .show(StatusNotice::pending("requesting verified decryption..."), None);

        let data = self
            .reader
            .record(key)
            .await
            .map_err(verify_gateway_error)?;

        if data.verified {
            info!(%key, "record already verified on ledger");
            self.status.show(
                StatusNotice::success("record already verified"),
                Some(self.config.success_notice_ttl),
            );
            return Ok(data.decrypted_value);
        }

        let handle = self
            .reader
            .encrypted_handle(key)
            .await
            .map_err(verify_gateway_error)?;
        let signer = self
            .wallet
            .signer()
            .ok_or(WorkflowError::GatewayUnavailable)?;

        let submit: VerificationSubmitter = {
            let signer = Arc::clone(&signer);
            let id = key.clone();
            Box::new(move |cleartexts, proof| {
                Box::pin(async move {
                    let tx = signer.submit_verification(&id, cleartexts, proof).await?;
                    tx.confirmed().await?;
                    Ok(())
                })
            })
        };

        debug!(%key, %handle, "requesting verified decryption");
        let outcome = self
            .cipher
            .request_verified_decryption(
                std::slice::from_ref(&handle),
                &self.config.contract,
                submit,
            )
            .await;

        let clear = match outcome {
            Ok(clear) => clear,
            Err(CipherError::Gateway(GatewayError::AlreadyVerified)) => {
                // a concurrent actor won the race; pick up their result
                info!(%key, "already verified by a concurrent actor");
                if let Err(err) = self.reload().await {
                    warn!(%err, "reload after concurrent verification failed");
                }
                self.status.show(
                    StatusNotice::success("record already verified"),
                    Some(self.config.success_notice_ttl),
                );
                return Ok(None);
            }
            Err(CipherError::Gateway(GatewayError::RejectedByUser)) => {
                return Err(WorkflowError::TransactionRejected);
            }
            Err(other) => return Err(WorkflowError::VerificationFailed(other.to_string())),
        };

        let value = clear.get(&handle).copied().ok_or_else(|| {
            WorkflowError::VerificationFailed(format!("no cleartext for handle {handle}"))
        })?;

        if let Err(err) = self.reload().await {
            warn!(%err, "reload after verification failed");
        }
        // inserted after the reload so its clear cannot erase the value
        self.overlay.insert(key.clone(), value);

        self.push_history(format!("verified record: {key}"));
        self.status.show(
            StatusNotice::success("decryption verified"),
            Some(self.config.success_notice_ttl),
        );
        info!(%key, value, "decryption verified");

        Ok(Some(value))
    }

    /// rebuild the record store from the ledger
    ///
    /// per-record fetch failures are logged and skipped; only a failed
    /// identifier listing fails the reload. replaces the collection and
    /// its stats in one assignment and clears the optimistic overlay.
    pub async fn reload(&self) -> Result<Vec<CarbonRecord>> {
        let ids = match self.reader.record_ids().await {
            Ok(ids) => ids,
            Err(err) => {
                let err = WorkflowError::Load(err.to_string());
                self.status.show(
                    StatusNotice::error(err.to_string()),
                    Some(self.config.error_notice_ttl),
                );
                return Err(err);
            }
        };
        debug!(count = ids.len(), "reloading records");

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.reader.record(&id).await {
                Ok(data) => records.push(assemble_record(id, data)),
                Err(err) => warn!(%id, %err, "skipping record: fetch failed"),
            }
        }

        let snapshot = self.store.replace(records);
        self.overlay.clear();
        self.push_history(format!("reloaded {} records", snapshot.records.len()));
        info!(records = snapshot.records.len(), "record store reloaded");
        Ok(snapshot.records)
    }

    /// probe the contract's self-reported readiness
    pub async fn check_availability(&self) -> Result<bool> {
        match self.reader.is_available().await {
            Ok(available) => {
                let label = if available { "available" } else { "unavailable" };
                self.push_history(format!("checked contract availability: {label}"));
                self.status.show(
                    StatusNotice::success(format!("contract is {label}")),
                    Some(self.config.success_notice_ttl),
                );
                Ok(available)
            }
            Err(err) => {
                let err = WorkflowError::Load(err.to_string());
                self.status.show(
                    StatusNotice::error(err.to_string()),
                    Some(self.config.error_notice_ttl),
                );
                Err(err)
            }
        }
    }

    /// plaintext for a record when one is known: the ledger-confirmed
    /// value once verified, otherwise the session's optimistic overlay
    pub fn revealed_value(&self, id: &RecordId) -> Option<u64> {
        let snapshot = self.store.snapshot();
        if let Some(record) = snapshot.records.iter().find(|r| &r.id == id) {
            if record.verified {
                return record.decrypted_value;
            }
        }
        self.overlay.get(id)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn records(&self) -> Vec<CarbonRecord> {
        self.store.records()
    }

    pub fn stats(&self) -> EcoStats {
        self.store.stats()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().unwrap().entries().cloned().collect()
    }

    pub fn status(&self) -> Option<StatusNotice> {
        self.status.current()
    }

    pub fn submit_state(&self) -> WorkflowState {
        self.submit_state.lock().unwrap().clone()
    }

    pub fn verify_state(&self) -> WorkflowState {
        self.verify_state.lock().unwrap().clone()
    }

    pub fn wallet(&self) -> &WalletContext {
        &self.wallet
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn enter(&self, slot: &Mutex<WorkflowState>, workflow: &'static str) -> Result<()> {
        let mut state = slot.lock().unwrap();
        if state.is_running() {
            return Err(WorkflowError::Busy(workflow));
        }
        *state = WorkflowState::Running;
        Ok(())
    }

    fn settle<T>(&self, slot: &Mutex<WorkflowState>, result: &Result<T>) {
        let mut state = slot.lock().unwrap();
        *state = match result {
            Ok(_) => WorkflowState::Succeeded,
            Err(err) => WorkflowState::Failed(err.to_string()),
        };
    }

    fn push_history(&self, action: String) {
        self.history.lock().unwrap().record(action);
    }
}

fn now_millis() -> u64 {
    Utc::now().timestamp_millis() as u64
}

fn assemble_record(id: RecordId, data: RecordData) -> CarbonRecord {
    // the band falls back to the public copy of the value until
    // verification confirms the decrypted one; advisory either way
    let known_value = data.decrypted_value.unwrap_or(data.public_value);
    CarbonRecord {
        category: Category::from_description(&data.description),
        eco_level: EcoLevel::band(known_value as f64),
        value_key: id.clone(),
        id,
        name: data.name,
        timestamp: data.timestamp,
        creator: data.creator,
        public_value: data.public_value,
        aux_value: data.aux_value,
        verified: data.verified,
        decrypted_value: data.decrypted_value,
    }
}

fn submit_gateway_error(err: GatewayError) -> WorkflowError {
    match err {
        GatewayError::RejectedByUser => WorkflowError::TransactionRejected,
        GatewayError::Unavailable => WorkflowError::GatewayUnavailable,
        other => WorkflowError::TransactionFailed(other.to_string()),
    }
}

fn verify_gateway_error(err: GatewayError) -> WorkflowError {
    match err {
        GatewayError::RejectedByUser => WorkflowError::TransactionRejected,
        GatewayError::Unavailable => WorkflowError::GatewayUnavailable,
        other => WorkflowError::VerificationFailed(other.to_string()),
    }
}
