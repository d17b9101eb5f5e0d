//! Shared fixtures for the unit test modules.

use sha256::digest;

use crate::case::{
    AgencyProfile, ApplicantType, CaseDate, CaseProgress, CaseRecord, CaseStatus, EmployerProfile,
    OffDayOfWeek, PartyIdentity, ResidentialStatus, SafetyAgreementTerms, ServiceAgreementTerms,
    WorkerProfile, WorkerType,
};
use crate::external::{DecryptionFailed, DocKind, DocumentStore, EncryptedField, FieldCipher};
use crate::money::Money;

/// Test cipher: ciphertext is the plaintext itself, the tag is its digest.
/// Decryption verifies the tag so corruption tests can flip a byte.
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

/// Document store stub holding the kinds "uploaded" for every case.
pub struct StubDocuments(pub Vec<DocKind>);

impl StubDocuments {
    pub fn all() -> Self {
        StubDocuments(vec![
            DocKind::JobOrder,
            DocKind::InPrincipleApproval,
            DocKind::MedicalReport,
        ])
    }

    pub fn none() -> Self {
        StubDocuments(Vec::new())
    }
}

impl DocumentStore for StubDocuments {
    fn has_file(&self, _case_id: &str, kind: DocKind) -> bool {
        self.0.contains(&kind)
    }
}

/// A valid signature payload unique per seed.
pub fn signature_payload(seed: &str) -> String {
    format!("data:image/png;base64,iVBORw0KGgo{seed}AAANSUhEUg==")
}

pub fn encrypted(plaintext: &str) -> EncryptedField {
    PlainCipher.encrypt(plaintext)
}

/// A complete single-applicant case: salary $600, loan $1000, four Sundays
/// off per month, $200 monthly repayment. Progress dates and inventory are
/// left empty so handover-stage tests opt in explicitly.
pub fn sample_case() -> CaseRecord {
    CaseRecord {
        id: "case_1sample".into(),
        case_ref_no: "EC-2024-0001".into(),
        version: 0,
        status: CaseStatus::Live,
        agreement_date: CaseDate::from_ymd(2024, 1, 2).unwrap(),
        fdw_salary: Money::from_dollars(600),
        fdw_loan: Money::from_dollars(1000),
        fdw_off_days_per_month: 4,
        fdw_monthly_loan_repayment: Money::from_dollars(200),
        fdw_off_day_of_week: OffDayOfWeek::Sun,
        employer: EmployerProfile {
            applicant_type: ApplicantType::Single,
            identity: PartyIdentity {
                name: "Tan Mei Ling".into(),
                residential_status: ResidentialStatus::Citizen,
                nric: Some(encrypted("S1234567D")),
                fin: None,
                passport: None,
                passport_expiry: None,
            },
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
        service_agreement: Some(ServiceAgreementTerms {
            handover_days: 3,
            number_of_replacements: 1,
            replacement_period_months: 6,
            termination_notice_days: 14,
        }),
        safety_agreement: Some(SafetyAgreementTerms {
            residential_dwelling_type: "HDB flat".into(),
            fdw_clean_window_exterior: false,
            window_exterior_location: None,
            adult_supervision: None,
        }),
        progress: CaseProgress::default(),
        inventory: Vec::new(),
        agency_snapshot_ref: None,
        worker_snapshot_ref: None,
    }
}
