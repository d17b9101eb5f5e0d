//! Signature collection and stage derivation.
//!
//! One [`SignatureSet`] exists per case, looked up by case id. Slots hold
//! validated PNG data-url payloads captured from the signing pad. The signing
//! stage is always derived from the employer slots, never stored.

use crate::case::ApplicantType;
use crate::error::{CaseError, Result};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

// SHA-256 digests of the two canvas exports a signing pad produces when the
// user taps "save" without drawing anything. Submissions matching either are
// rejected as blank.
const BLANK_CANVAS_DIGESTS: [&str; 2] = [
    "447b43a9e078f2afa512691226a6c03b05e853c7292415c4d33137a572460a3f",
    "5aacd98791cfc6d283aa57bcb867b16301eb958bc61e21c7a8858f20ffe0a99c",
];

/// Named signature slots. The employer slots drive the derived stage:
/// slot 1 covers the pre-deployment document set, slot 2 the handover
/// checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureSlot {
    EmployerSignature1,
    EmployerSignature2,
    FdwSignature,
    AgencyStaffSignature,
    EmployerSpouseSignature,
    Sponsor1Signature,
    Sponsor2Signature,
    JointApplicantSignature,
}

impl SignatureSlot {
    /// Whether this slot applies under the given applicant variant. The
    /// mandatory slots always apply.
    pub fn applies_to(self, applicant_type: ApplicantType) -> bool {
        match self {
            SignatureSlot::EmployerSignature1
            | SignatureSlot::EmployerSignature2
            | SignatureSlot::FdwSignature
            | SignatureSlot::AgencyStaffSignature => true,
            SignatureSlot::EmployerSpouseSignature => applicant_type == ApplicantType::Spouse,
            SignatureSlot::Sponsor1Signature => matches!(
                applicant_type,
                ApplicantType::OneSponsor | ApplicantType::TwoSponsor
            ),
            SignatureSlot::Sponsor2Signature => applicant_type == ApplicantType::TwoSponsor,
            SignatureSlot::JointApplicantSignature => {
                applicant_type == ApplicantType::JointApplicant
            }
        }
    }
}

/// Signature-completion milestone of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unsigned,
    PreDeployment,
    Handover,
}

impl Stage {
    pub fn as_u8(self) -> u8 {
        match self {
            Stage::Unsigned => 0,
            Stage::PreDeployment => 1,
            Stage::Handover => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct SignatureSet {
    #[n(0)]
    pub case_id: String,
    #[n(1)]
    pub employer_signature_1: Option<String>,
    #[n(2)]
    pub employer_signature_2: Option<String>,
    #[n(3)]
    pub fdw_signature: Option<String>,
    #[n(4)]
    pub agency_staff_signature: Option<String>,
    #[n(5)]
    pub employer_spouse_signature: Option<String>,
    #[n(6)]
    pub sponsor_1_signature: Option<String>,
    #[n(7)]
    pub sponsor_2_signature: Option<String>,
    #[n(8)]
    pub joint_applicant_signature: Option<String>,
}

impl SignatureSet {
    pub fn new(case_id: String) -> Self {
        Self {
            case_id,
            employer_signature_1: None,
            employer_signature_2: None,
            fdw_signature: None,
            agency_staff_signature: None,
            employer_spouse_signature: None,
            sponsor_1_signature: None,
            sponsor_2_signature: None,
            joint_applicant_signature: None,
        }
    }

    pub fn get(&self, slot: SignatureSlot) -> Option<&String> {
        match slot {
            SignatureSlot::EmployerSignature1 => self.employer_signature_1.as_ref(),
            SignatureSlot::EmployerSignature2 => self.employer_signature_2.as_ref(),
            SignatureSlot::FdwSignature => self.fdw_signature.as_ref(),
            SignatureSlot::AgencyStaffSignature => self.agency_staff_signature.as_ref(),
            SignatureSlot::EmployerSpouseSignature => self.employer_spouse_signature.as_ref(),
            SignatureSlot::Sponsor1Signature => self.sponsor_1_signature.as_ref(),
            SignatureSlot::Sponsor2Signature => self.sponsor_2_signature.as_ref(),
            SignatureSlot::JointApplicantSignature => self.joint_applicant_signature.as_ref(),
        }
    }

    pub fn set(&mut self, slot: SignatureSlot, payload: String) {
        match slot {
            SignatureSlot::EmployerSignature1 => self.employer_signature_1 = Some(payload),
            SignatureSlot::EmployerSignature2 => self.employer_signature_2 = Some(payload),
            SignatureSlot::FdwSignature => self.fdw_signature = Some(payload),
            SignatureSlot::AgencyStaffSignature => self.agency_staff_signature = Some(payload),
            SignatureSlot::EmployerSpouseSignature => {
                self.employer_spouse_signature = Some(payload)
            }
            SignatureSlot::Sponsor1Signature => self.sponsor_1_signature = Some(payload),
            SignatureSlot::Sponsor2Signature => self.sponsor_2_signature = Some(payload),
            SignatureSlot::JointApplicantSignature => {
                self.joint_applicant_signature = Some(payload)
            }
        }
    }

    /// Empty every slot. Total: already-empty slots stay empty, no error.
    pub fn erase_all(&mut self) {
        self.employer_signature_1 = None;
        self.employer_signature_2 = None;
        self.fdw_signature = None;
        self.agency_staff_signature = None;
        self.employer_spouse_signature = None;
        self.sponsor_1_signature = None;
        self.sponsor_2_signature = None;
        self.joint_applicant_signature = None;
    }

    /// Stage 2 once the handover slot is signed, stage 1 on the
    /// pre-deployment slot alone, stage 0 otherwise.
    pub fn derive_stage(&self) -> Stage {
        if self.employer_signature_2.is_some() {
            Stage::Handover
        } else if self.employer_signature_1.is_some() {
            Stage::PreDeployment
        } else {
            Stage::Unsigned
        }
    }

    /// Whether every slot of the first-signing set for the given applicant
    /// variant is filled.
    pub fn first_signing_complete(&self, applicant_type: ApplicantType) -> bool {
        let mandatory = self.employer_signature_1.is_some()
            && self.fdw_signature.is_some()
            && self.agency_staff_signature.is_some();

        let variant = match applicant_type {
            ApplicantType::Single => true,
            ApplicantType::Spouse => self.employer_spouse_signature.is_some(),
            ApplicantType::OneSponsor => self.sponsor_1_signature.is_some(),
            ApplicantType::TwoSponsor => {
                self.sponsor_1_signature.is_some() && self.sponsor_2_signature.is_some()
            }
            ApplicantType::JointApplicant => self.joint_applicant_signature.is_some(),
        };

        mandatory && variant
    }
}

/// Reject payloads that are not PNG data-urls or that match a known blank
/// canvas export.
pub fn validate_payload(payload: &str) -> Result<()> {
    if payload.is_empty() {
        return Err(CaseError::Validation {
            field: "signature",
            reason: "payload is empty".into(),
        });
    }
    if !payload.starts_with(PNG_DATA_URL_PREFIX) {
        return Err(CaseError::Validation {
            field: "signature",
            reason: "payload is not a PNG data-url".into(),
        });
    }
    if payload.len() == PNG_DATA_URL_PREFIX.len() {
        return Err(CaseError::Validation {
            field: "signature",
            reason: "payload carries no image data".into(),
        });
    }

    let digest = sha256::digest(payload);
    if BLANK_CANVAS_DIGESTS.contains(&digest.as_str()) {
        return Err(CaseError::Validation {
            field: "signature",
            reason: "signature cannot be blank".into(),
        });
    }

    Ok(())
}
