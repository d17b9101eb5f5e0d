#![allow(dead_code)]

//! Shared fixtures for the integration suites.

use std::sync::{Arc, Mutex};

use sha256::digest;
use tempfile::TempDir;

use casework::case::{
    AgencyProfile, ApplicantType, CaseDate, CaseProgress, CaseRecord, CaseStatus, EmployerProfile,
    OffDayOfWeek, PartyIdentity, ResidentialStatus, SafetyAgreementTerms, ServiceAgreementTerms,
    WorkerProfile, WorkerType,
};
use casework::external::{DecryptionFailed, DocKind, DocumentStore, EncryptedField, FieldCipher};
use casework::fees::ServiceFeeSchedule;
use casework::money::Money;
use casework::service::{CaseService, NewCase};

/// Test cipher: ciphertext is the plaintext itself, the tag is its digest.
pub struct PlainCipher;

impl FieldCipher for PlainCipher {
    fn encrypt(&self, plaintext: &str) -> EncryptedField {
        EncryptedField {
            ciphertext: plaintext.as_bytes().to_vec(),
            nonce: vec![0; 12],
            tag: digest(plaintext).into_bytes(),
        }
    }

    fn decrypt(&self, field: &EncryptedField) -> Result<String, DecryptionFailed> {
        let plaintext = String::from_utf8(field.ciphertext.clone()).map_err(|_| DecryptionFailed)?;
        if digest(plaintext.as_str()).into_bytes() != field.tag {
            return Err(DecryptionFailed);
        }
        Ok(plaintext)
    }
}

/// Upload-store stub. Tests add document kinds mid-scenario to satisfy the
/// completeness checks one step at a time.
#[derive(Default)]
pub struct SharedDocuments {
    uploaded: Mutex<Vec<DocKind>>,
}

impl SharedDocuments {
    pub fn add(&self, kind: DocKind) {
        self.uploaded.lock().unwrap().push(kind);
    }
}

impl DocumentStore for SharedDocuments {
    fn has_file(&self, _case_id: &str, kind: DocKind) -> bool {
        self.uploaded.lock().unwrap().contains(&kind)
    }
}

/// Open a fresh service against its own temporary sled database. Sled locks
/// the database file, so every test gets its own directory. The TempDir must
/// stay alive for the duration of the test.
pub fn open_service(db_name: &str) -> anyhow::Result<(CaseService, Arc<SharedDocuments>, TempDir)> {
    let temp_dir = tempfile::tempdir()?;
    let db = sled::open(temp_dir.path().join(db_name))?;
    let db = Arc::new(db);
    db.clear()?;

    let docs = Arc::new(SharedDocuments::default());
    let service = CaseService::new(db, Arc::new(PlainCipher), docs.clone());
    Ok((service, docs, temp_dir))
}

pub fn signature_payload(seed: &str) -> String {
    format!("data:image/png;base64,iVBORw0KGgo{seed}AAANSUhEUg==")
}

pub fn encrypted(plaintext: &str) -> EncryptedField {
    PlainCipher.encrypt(plaintext)
}

pub fn local_identity(name: &str, nric: &str) -> PartyIdentity {
    PartyIdentity {
        name: name.into(),
        residential_status: ResidentialStatus::Citizen,
        nric: Some(encrypted(nric)),
        fin: None,
        passport: None,
        passport_expiry: None,
    }
}

/// Single-applicant intake with complete party details and agreements:
/// salary $600, loan $1000, four Sundays off per month, $200 repayment.
pub fn new_case(case_ref_no: &str) -> NewCase {
    NewCase {
        case_ref_no: case_ref_no.into(),
        agreement_date: CaseDate::from_ymd(2024, 1, 2).unwrap(),
        fdw_salary: Money::from_dollars(600),
        fdw_loan: Money::from_dollars(1000),
        fdw_off_days_per_month: 4,
        fdw_monthly_loan_repayment: Money::from_dollars(200),
        fdw_off_day_of_week: OffDayOfWeek::Sun,
        employer: EmployerProfile {
            applicant_type: ApplicantType::Single,
            identity: local_identity("Tan Mei Ling", "S1234567D"),
            spouse: None,
            sponsor_1: None,
            sponsor_2: None,
            joint_applicant: None,
        },
        fdw: WorkerProfile {
            name: "Siti Rahayu".into(),
            nationality: "Indonesian".into(),
            worker_type: WorkerType::New,
            passport: Some(encrypted("X9876543")),
            fin: Some(encrypted("G7654321K")),
        },
        agency: AgencyProfile {
            agency_name: "Sunrise Employment Pte Ltd".into(),
            license_no: "19C0001".into(),
            address_1: "1 Beach Road".into(),
            address_2: "#02-15".into(),
            postal_code: "189673".into(),
            employee_name: "Rachel Lim".into(),
            ea_personnel_no: "R1100001".into(),
            branch: "Main".into(),
        },
    }
}

pub fn service_agreement() -> ServiceAgreementTerms {
    ServiceAgreementTerms {
        handover_days: 3,
        number_of_replacements: 1,
        replacement_period_months: 6,
        termination_notice_days: 14,
    }
}

pub fn safety_agreement() -> SafetyAgreementTerms {
    SafetyAgreementTerms {
        residential_dwelling_type: "HDB flat".into(),
        fdw_clean_window_exterior: false,
        window_exterior_location: None,
        adult_supervision: None,
    }
}

/// An in-memory case record with the same terms as [`new_case`], for tests
/// that exercise pure calculations without a database.
pub fn fixture_case() -> CaseRecord {
    let intake = new_case("EC-2024-0000");
    CaseRecord {
        id: "case_1fixture".into(),
        case_ref_no: intake.case_ref_no,
        version: 0,
        status: CaseStatus::Live,
        agreement_date: intake.agreement_date,
        fdw_salary: intake.fdw_salary,
        fdw_loan: intake.fdw_loan,
        fdw_off_days_per_month: intake.fdw_off_days_per_month,
        fdw_monthly_loan_repayment: intake.fdw_monthly_loan_repayment,
        fdw_off_day_of_week: intake.fdw_off_day_of_week,
        employer: intake.employer,
        fdw: intake.fdw,
        agency: intake.agency,
        service_agreement: Some(service_agreement()),
        safety_agreement: Some(safety_agreement()),
        progress: CaseProgress::default(),
        inventory: Vec::new(),
        agency_snapshot_ref: None,
        worker_snapshot_ref: None,
    }
}

/// Fee schedule with a $300 deposit against $155 admin costs and a $500
/// agency fee.
pub fn filled_fees(case_id: &str) -> ServiceFeeSchedule {
    let mut fees = ServiceFeeSchedule::new(case_id.into());
    fees.work_permit_application = Money::from_dollars(35);
    fees.medical_examination_fee = Money::from_dollars(80);
    fees.home_service = Money::from_dollars(40);
    fees.agency_fee = Money::from_dollars(500);
    fees.deposit_amount = Money::from_dollars(300);
    fees
}
