//! Service layer API for case workflow operations
//!
//! All mutating operations run as single sled transactions so a crash can
//! never leave a half-erased signature set or an archived case without its
//! snapshots. Writers pass the version they read; a stale version aborts
//! with a conflict and the caller reloads and retries.

use chrono::{Datelike, Utc};
use sled::Db;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use std::sync::Arc;
use tracing::info;

use crate::archive::{AgencySnapshot, WorkerSnapshot};
use crate::case::{
    AgencyProfile, CaseDate, CaseProgress, CaseRecord, CaseStatus, EmployerProfile, OffDayOfWeek,
    SafetyAgreementTerms, ServiceAgreementTerms, Timestamp, WorkerProfile,
};
use crate::checker::{self, MissingField};
use crate::error::{CaseError, Result};
use crate::external::{DocumentStore, FieldCipher};
use crate::fees::ServiceFeeSchedule;
use crate::money::Money;
use crate::schedule::{self, EngineConfig, PeriodRow};
use crate::signature::{self, SignatureSet, SignatureSlot, Stage};
use crate::utils;

const RECEIPT_COUNTER_KEY: &[u8] = b"meta/receipt_counter";

// Contract money fields are bounded to this range at intake.
const CONTRACT_CEILING: Money = Money::from_dollars(10_000);
const MAX_OFF_DAYS_PER_MONTH: u8 = 8;

fn case_key(case_id: &str) -> String {
    format!("case/{case_id}")
}

fn sig_key(case_id: &str) -> String {
    format!("sig/{case_id}")
}

fn fees_key(case_id: &str) -> String {
    format!("fees/{case_id}")
}

fn ref_key(case_ref_no: &str) -> String {
    format!("ref/{case_ref_no}")
}

fn agency_snap_key(snapshot_id: &str) -> String {
    format!("snapshot/agency/{snapshot_id}")
}

fn worker_snap_key(snapshot_id: &str) -> String {
    format!("snapshot/worker/{snapshot_id}")
}

fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>> {
    minicbor::to_vec(value).map_err(|e| CaseError::Codec(e.to_string()))
}

fn decode<T: for<'b> minicbor::Decode<'b, ()>>(bytes: &[u8]) -> Result<T> {
    minicbor::decode(bytes).map_err(|e| CaseError::Codec(e.to_string()))
}

fn tx_try<T>(r: Result<T>) -> ConflictableTransactionResult<T, CaseError> {
    r.map_err(ConflictableTransactionError::Abort)
}

fn tx_abort<T>(e: CaseError) -> ConflictableTransactionResult<T, CaseError> {
    Err(ConflictableTransactionError::Abort(e))
}

fn run<T>(outcome: sled::transaction::TransactionResult<T, CaseError>) -> Result<T> {
    outcome.map_err(|e| match e {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(err) => CaseError::Store(err),
    })
}

fn parse_counter(bytes: &[u8]) -> u64 {
    match bytes.try_into() {
        Ok(arr) => u64::from_be_bytes(arr),
        Err(_) => 0,
    }
}

/// Intake data for a new case.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub case_ref_no: String,
    pub agreement_date: CaseDate,
    pub fdw_salary: Money,
    pub fdw_loan: Money,
    pub fdw_off_days_per_month: u8,
    pub fdw_monthly_loan_repayment: Money,
    pub fdw_off_day_of_week: OffDayOfWeek,
    pub employer: EmployerProfile,
    pub fdw: WorkerProfile,
    pub agency: AgencyProfile,
}

/// Partial update applied by the surrounding workflow. Replacing the
/// employer or worker profile changes legally-relevant identity fields, so
/// the caller must follow up with [`CaseService::increment_version`] when
/// the case already carries signatures.
#[derive(Debug, Clone, Default)]
pub struct CaseUpdate {
    pub employer: Option<EmployerProfile>,
    pub fdw: Option<WorkerProfile>,
    pub service_agreement: Option<ServiceAgreementTerms>,
    pub safety_agreement: Option<SafetyAgreementTerms>,
    pub progress: Option<CaseProgress>,
    pub add_inventory: Vec<String>,
}

pub struct CaseService {
    instance: Arc<Db>,
    cipher: Arc<dyn FieldCipher + Send + Sync>,
    documents: Arc<dyn DocumentStore + Send + Sync>,
    config: EngineConfig,
}

impl CaseService {
    pub fn new(
        instance: Arc<Db>,
        cipher: Arc<dyn FieldCipher + Send + Sync>,
        documents: Arc<dyn DocumentStore + Send + Sync>,
    ) -> Self {
        Self {
            instance,
            cipher,
            documents,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    // Reads

    pub fn get_case(&self, case_id: &str) -> Result<CaseRecord> {
        let bytes = self
            .instance
            .get(case_key(case_id))?
            .ok_or_else(|| CaseError::NotFound(case_id.into()))?;
        decode(&bytes)
    }

    pub fn get_signatures(&self, case_id: &str) -> Result<SignatureSet> {
        let bytes = self
            .instance
            .get(sig_key(case_id))?
            .ok_or_else(|| CaseError::NotFound(case_id.into()))?;
        decode(&bytes)
    }

    pub fn get_fee_schedule(&self, case_id: &str) -> Result<Option<ServiceFeeSchedule>> {
        match self.instance.get(fees_key(case_id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_agency_snapshot(&self, snapshot_id: &str) -> Result<AgencySnapshot> {
        let bytes = self
            .instance
            .get(agency_snap_key(snapshot_id))?
            .ok_or_else(|| CaseError::NotFound(snapshot_id.into()))?;
        decode(&bytes)
    }

    pub fn get_worker_snapshot(&self, snapshot_id: &str) -> Result<WorkerSnapshot> {
        let bytes = self
            .instance
            .get(worker_snap_key(snapshot_id))?
            .ok_or_else(|| CaseError::NotFound(snapshot_id.into()))?;
        decode(&bytes)
    }

    pub fn stage(&self, case_id: &str) -> Result<Stage> {
        Ok(self.get_signatures(case_id)?.derive_stage())
    }

    /// Missing-field identifiers blocking the pre-deployment signing stage.
    /// The UI calls this before opening a signature-capture screen.
    pub fn missing_for_first_signing(&self, case_id: &str) -> Result<Vec<MissingField>> {
        let case = self.get_case(case_id)?;
        let sigs = self.get_signatures(case_id)?;
        let fees_present = self.instance.get(fees_key(case_id))?.is_some();
        checker::missing_for_first_signing(
            &case,
            &sigs,
            fees_present,
            self.cipher.as_ref(),
            self.documents.as_ref(),
        )
    }

    /// Missing-field identifiers blocking the handover signing stage.
    pub fn missing_for_handover(&self, case_id: &str) -> Result<Vec<MissingField>> {
        let case = self.get_case(case_id)?;
        let sigs = self.get_signatures(case_id)?;
        let fees_present = self.instance.get(fees_key(case_id))?.is_some();
        checker::missing_for_handover(
            &case,
            &sigs,
            fees_present,
            self.cipher.as_ref(),
            self.documents.as_ref(),
        )
    }

    /// Compute the repayment schedule for a case. Pure read; identical
    /// inputs always produce identical rows.
    pub fn compute_schedule(&self, case_id: &str) -> Result<Vec<PeriodRow>> {
        let case = self.get_case(case_id)?;
        Ok(schedule::compute_schedule(&case, &self.config))
    }

    // Writes

    /// Create a new live case at version 0 together with its empty
    /// signature set. Rejects a reference number already carried by another
    /// live case.
    pub fn create_case(&self, new: NewCase) -> Result<CaseRecord> {
        validate_contract_terms(&new)?;

        let case_id = utils::mint_id("case_")?;
        let case = CaseRecord {
            id: case_id.clone(),
            case_ref_no: new.case_ref_no.clone(),
            version: 0,
            status: CaseStatus::Live,
            agreement_date: new.agreement_date,
            fdw_salary: new.fdw_salary,
            fdw_loan: new.fdw_loan,
            fdw_off_days_per_month: new.fdw_off_days_per_month,
            fdw_monthly_loan_repayment: new.fdw_monthly_loan_repayment,
            fdw_off_day_of_week: new.fdw_off_day_of_week,
            employer: new.employer,
            fdw: new.fdw,
            agency: new.agency,
            service_agreement: None,
            safety_agreement: None,
            progress: CaseProgress::default(),
            inventory: Vec::new(),
            agency_snapshot_ref: None,
            worker_snapshot_ref: None,
        };
        let sigs = SignatureSet::new(case_id.clone());

        let case_bytes = encode(&case)?;
        let sig_bytes = encode(&sigs)?;

        run(self.instance.transaction(
            |tx: &TransactionalTree| -> ConflictableTransactionResult<(), CaseError> {
                if tx.get(ref_key(&case.case_ref_no))?.is_some() {
                    return tx_abort(CaseError::Validation {
                        field: "case_ref_no",
                        reason: format!(
                            "a live case already exists for reference {}",
                            case.case_ref_no
                        ),
                    });
                }
                tx.insert(case_key(&case.id).as_str(), case_bytes.clone())?;
                tx.insert(sig_key(&case.id).as_str(), sig_bytes.clone())?;
                tx.insert(ref_key(&case.case_ref_no).as_str(), case.id.as_bytes())?;
                Ok(())
            },
        ))?;

        info!(case_id = %case.id, case_ref = %case.case_ref_no, "created case");
        Ok(case)
    }

    /// Attach or replace the fee schedule record for a case.
    pub fn set_fee_schedule(&self, fees: ServiceFeeSchedule) -> Result<()> {
        let fee_bytes = encode(&fees)?;
        run(self.instance.transaction(
            |tx: &TransactionalTree| -> ConflictableTransactionResult<(), CaseError> {
                let case = tx_load_case(tx, &fees.case_id)?;
                if case.is_archived() {
                    return tx_abort(CaseError::ArchivedCase(case.id));
                }
                tx.insert(fees_key(&fees.case_id).as_str(), fee_bytes.clone())?;
                Ok(())
            },
        ))
    }

    /// Apply a partial update to a live case's sub-records or profiles.
    pub fn update_case(
        &self,
        case_id: &str,
        expected_version: u32,
        update: CaseUpdate,
    ) -> Result<CaseRecord> {
        run(self.instance.transaction(
            |tx: &TransactionalTree| -> ConflictableTransactionResult<CaseRecord, CaseError> {
                let mut case = tx_guarded_case(tx, case_id, expected_version)?;

                if let Some(employer) = update.employer.clone() {
                    case.employer = employer;
                }
                if let Some(fdw) = update.fdw.clone() {
                    case.fdw = fdw;
                }
                if let Some(terms) = update.service_agreement.clone() {
                    case.service_agreement = Some(terms);
                }
                if let Some(terms) = update.safety_agreement.clone() {
                    case.safety_agreement = Some(terms);
                }
                if let Some(progress) = update.progress.clone() {
                    case.progress = progress;
                }
                case.inventory.extend(update.add_inventory.iter().cloned());

                let case_bytes = tx_try(encode(&case))?;
                tx.insert(case_key(case_id).as_str(), case_bytes)?;
                Ok(case)
            },
        ))
    }

    /// Erase every signature slot and bump the version. Any structural edit
    /// to a signed case invalidates all prior signatures, forcing
    /// re-signing.
    pub fn increment_version(&self, case_id: &str, expected_version: u32) -> Result<CaseRecord> {
        let case = run(self.instance.transaction(
            |tx: &TransactionalTree| -> ConflictableTransactionResult<CaseRecord, CaseError> {
                let mut case = tx_guarded_case(tx, case_id, expected_version)?;
                let mut sigs = tx_load_signatures(tx, case_id)?;

                sigs.erase_all();
                case.version += 1;

                let case_bytes = tx_try(encode(&case))?;
                let sig_bytes = tx_try(encode(&sigs))?;
                tx.insert(case_key(case_id).as_str(), case_bytes)?;
                tx.insert(sig_key(case_id).as_str(), sig_bytes)?;
                Ok(case)
            },
        ))?;

        info!(case_id, version = case.version, "incremented case version, signatures erased");
        Ok(case)
    }

    /// Validate and store a captured signature, routing workflow status as a
    /// side effect. Returns the updated case and the newly derived stage.
    pub fn record_signature(
        &self,
        case_id: &str,
        expected_version: u32,
        slot: SignatureSlot,
        payload: &str,
    ) -> Result<(CaseRecord, Stage)> {
        signature::validate_payload(payload)?;

        let (case, stage) = run(self.instance.transaction(
            |tx: &TransactionalTree| -> ConflictableTransactionResult<(CaseRecord, Stage), CaseError> {
                let mut case = tx_guarded_case(tx, case_id, expected_version)?;
                let mut sigs = tx_load_signatures(tx, case_id)?;

                let applicant_type = case.employer.applicant_type;
                if !slot.applies_to(applicant_type) {
                    return tx_abort(CaseError::Validation {
                        field: "signature_slot",
                        reason: format!("slot {slot:?} does not apply to {applicant_type:?} cases"),
                    });
                }

                let fees_present = tx.get(fees_key(case_id))?.is_some();
                match slot {
                    SignatureSlot::EmployerSignature1 => {
                        let missing = tx_try(checker::missing_for_first_signing(
                            &case,
                            &sigs,
                            fees_present,
                            self.cipher.as_ref(),
                            self.documents.as_ref(),
                        ))?;
                        if !missing.is_empty() {
                            return tx_abort(CaseError::Precondition(missing));
                        }
                    }
                    SignatureSlot::EmployerSignature2 => {
                        // stage moves 0 -> 1 -> 2, never skips
                        if sigs.employer_signature_1.is_none() {
                            return tx_abort(CaseError::Validation {
                                field: "signature_slot",
                                reason: "handover signature requires the pre-deployment \
                                         signature first"
                                    .into(),
                            });
                        }
                        let missing = tx_try(checker::missing_for_handover(
                            &case,
                            &sigs,
                            fees_present,
                            self.cipher.as_ref(),
                            self.documents.as_ref(),
                        ))?;
                        if !missing.is_empty() {
                            return tx_abort(CaseError::Precondition(missing));
                        }
                    }
                    _ => {}
                }

                sigs.set(slot, payload.to_string());

                if slot == SignatureSlot::AgencyStaffSignature
                    && case.status == CaseStatus::Live
                {
                    case.status = CaseStatus::WaitingEmployerSignature;
                }
                if sigs.first_signing_complete(applicant_type)
                    && matches!(
                        case.status,
                        CaseStatus::Live | CaseStatus::WaitingEmployerSignature
                    )
                {
                    case.status = CaseStatus::WaitingHandover;
                }

                let stage = sigs.derive_stage();
                let case_bytes = tx_try(encode(&case))?;
                let sig_bytes = tx_try(encode(&sigs))?;
                tx.insert(case_key(case_id).as_str(), case_bytes)?;
                tx.insert(sig_key(case_id).as_str(), sig_bytes)?;
                Ok((case, stage))
            },
        ))?;

        info!(case_id, slot = ?slot, stage = stage.as_u8(), status = ?case.status, "recorded signature");
        Ok((case, stage))
    }

    /// Snapshot the agency and worker identity data and retire the case.
    /// The archived case and both snapshots are retained; nothing is
    /// deleted.
    pub fn finalize(&self, case_id: &str, expected_version: u32) -> Result<CaseRecord> {
        let agency_snapshot_id = utils::mint_id("snapa_")?;
        let worker_snapshot_id = utils::mint_id("snapw_")?;
        let taken_at = Timestamp::now();

        let case = run(self.instance.transaction(
            |tx: &TransactionalTree| -> ConflictableTransactionResult<CaseRecord, CaseError> {
                let mut case = tx_guarded_case(tx, case_id, expected_version)?;
                let sigs = tx_load_signatures(tx, case_id)?;

                if sigs.derive_stage() != Stage::Handover {
                    return tx_abort(CaseError::Precondition(vec![
                        MissingField::EmployerHandoverSignature,
                    ]));
                }

                let fees_present = tx.get(fees_key(case_id))?.is_some();
                let missing = tx_try(checker::missing_for_handover(
                    &case,
                    &sigs,
                    fees_present,
                    self.cipher.as_ref(),
                    self.documents.as_ref(),
                ))?;
                if !missing.is_empty() {
                    return tx_abort(CaseError::Precondition(missing));
                }

                let agency_snapshot =
                    AgencySnapshot::from_case(agency_snapshot_id.clone(), &case, taken_at);
                let worker_snapshot =
                    WorkerSnapshot::from_case(worker_snapshot_id.clone(), &case, taken_at);

                case.agency_snapshot_ref = Some(agency_snapshot.id.clone());
                case.worker_snapshot_ref = Some(worker_snapshot.id.clone());
                case.status = CaseStatus::Archived;

                let agency_bytes = tx_try(encode(&agency_snapshot))?;
                let worker_bytes = tx_try(encode(&worker_snapshot))?;
                let case_bytes = tx_try(encode(&case))?;
                tx.insert(agency_snap_key(&agency_snapshot.id).as_str(), agency_bytes)?;
                tx.insert(worker_snap_key(&worker_snapshot.id).as_str(), worker_bytes)?;
                tx.insert(case_key(case_id).as_str(), case_bytes)?;
                // free the reference number for a future replacement case
                tx.remove(ref_key(&case.case_ref_no).as_str())?;
                Ok(case)
            },
        ))?;

        info!(case_id, case_ref = %case.case_ref_no, "archived case with snapshots");
        Ok(case)
    }

    /// Stamp the deposit invoice with the next receipt number.
    pub fn set_deposit_invoice(&self, case_id: &str, detail: &str) -> Result<ServiceFeeSchedule> {
        let receipt_no = self.next_receipt_no()?;
        let at = Timestamp::now();

        let fees = run(self.instance.transaction(
            |tx: &TransactionalTree| -> ConflictableTransactionResult<ServiceFeeSchedule, CaseError> {
                let case = tx_load_case(tx, case_id)?;
                if case.is_archived() {
                    return tx_abort(CaseError::ArchivedCase(case.id));
                }
                let mut fees = tx_load_fees(tx, case_id)?;
                fees.stamp_deposit_invoice(receipt_no.clone(), at, detail.to_string());
                let fee_bytes = tx_try(encode(&fees))?;
                tx.insert(fees_key(case_id).as_str(), fee_bytes)?;
                Ok(fees)
            },
        ))?;

        info!(case_id, receipt_no = %receipt_no, "issued deposit invoice");
        Ok(fees)
    }

    /// Stamp the remaining-amount invoice and store the outstanding balance
    /// owed by the employer.
    pub fn set_remaining_invoice(&self, case_id: &str, detail: &str) -> Result<ServiceFeeSchedule> {
        let receipt_no = self.next_receipt_no()?;
        let at = Timestamp::now();

        let fees = run(self.instance.transaction(
            |tx: &TransactionalTree| -> ConflictableTransactionResult<ServiceFeeSchedule, CaseError> {
                let case = tx_load_case(tx, case_id)?;
                if case.is_archived() {
                    return tx_abort(CaseError::ArchivedCase(case.id));
                }
                let mut fees = tx_load_fees(tx, case_id)?;
                let balance = fees.outstanding_balance(case.fdw_loan);
                fees.stamp_remaining_invoice(receipt_no.clone(), at, detail.to_string(), balance);
                let fee_bytes = tx_try(encode(&fees))?;
                tx.insert(fees_key(case_id).as_str(), fee_bytes)?;
                Ok(fees)
            },
        ))?;

        info!(case_id, receipt_no = %receipt_no, "issued remaining-amount invoice");
        Ok(fees)
    }

    /// Next receipt number from the persisted process-wide counter,
    /// formatted `<n>/<MM>/<YYYY>`. Safe under concurrent callers.
    fn next_receipt_no(&self) -> Result<String> {
        let updated = self
            .instance
            .update_and_fetch(RECEIPT_COUNTER_KEY, |old| {
                let next = old.map(parse_counter).unwrap_or(0) + 1;
                Some(next.to_be_bytes().to_vec())
            })?;
        let number = updated.as_deref().map(parse_counter).unwrap_or(1);

        let now = Utc::now();
        Ok(format!("{}/{:02}/{}", number, now.month(), now.year()))
    }
}

fn validate_contract_terms(new: &NewCase) -> Result<()> {
    for (field, amount) in [
        ("fdw_salary", new.fdw_salary),
        ("fdw_loan", new.fdw_loan),
    ] {
        if amount.is_negative() || amount > CONTRACT_CEILING {
            return Err(CaseError::Validation {
                field,
                reason: format!("{amount} is outside the allowed range of $0 to {CONTRACT_CEILING}"),
            });
        }
    }
    if new.fdw_monthly_loan_repayment.is_negative() {
        return Err(CaseError::Validation {
            field: "fdw_monthly_loan_repayment",
            reason: "repayment amount cannot be negative".into(),
        });
    }
    if new.fdw_off_days_per_month > MAX_OFF_DAYS_PER_MONTH {
        return Err(CaseError::Validation {
            field: "fdw_off_days_per_month",
            reason: format!("at most {MAX_OFF_DAYS_PER_MONTH} off days per month"),
        });
    }
    Ok(())
}

fn tx_load_case(
    tx: &TransactionalTree,
    case_id: &str,
) -> ConflictableTransactionResult<CaseRecord, CaseError> {
    match tx.get(case_key(case_id))? {
        Some(bytes) => tx_try(decode(&bytes)),
        None => tx_abort(CaseError::NotFound(case_id.into())),
    }
}

fn tx_load_signatures(
    tx: &TransactionalTree,
    case_id: &str,
) -> ConflictableTransactionResult<SignatureSet, CaseError> {
    match tx.get(sig_key(case_id))? {
        Some(bytes) => tx_try(decode(&bytes)),
        None => tx_abort(CaseError::NotFound(case_id.into())),
    }
}

fn tx_load_fees(
    tx: &TransactionalTree,
    case_id: &str,
) -> ConflictableTransactionResult<ServiceFeeSchedule, CaseError> {
    match tx.get(fees_key(case_id))? {
        Some(bytes) => tx_try(decode(&bytes)),
        None => tx_abort(CaseError::Precondition(vec![MissingField::FeeSchedule])),
    }
}

/// Load a case and apply the archived-case and optimistic-version guards
/// every mutating operation shares.
fn tx_guarded_case(
    tx: &TransactionalTree,
    case_id: &str,
    expected_version: u32,
) -> ConflictableTransactionResult<CaseRecord, CaseError> {
    let case = tx_load_case(tx, case_id)?;
    if case.is_archived() {
        return tx_abort(CaseError::ArchivedCase(case.id));
    }
    if case.version != expected_version {
        return tx_abort(CaseError::Conflict {
            case_id: case_id.into(),
            expected: expected_version,
            actual: case.version,
        });
    }
    Ok(case)
}
