//! Completeness checks gating the two signing stages.
//!
//! Both checks are pure reads returning the ordered list of missing field
//! identifiers; an empty list means the stage may begin. A ciphertext that
//! fails to decrypt is data corruption and surfaces as an error, never as a
//! missing field.

use crate::case::{CaseRecord, PartyIdentity, WorkerType};
use crate::error::{CaseError, Result};
use crate::external::{DocKind, DocumentStore, EncryptedField, FieldCipher};
use crate::signature::SignatureSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Employer,
    Spouse,
    Sponsor1,
    Sponsor2,
    JointApplicant,
}

impl Party {
    fn prefix(self) -> &'static str {
        match self {
            Party::Employer => "employer",
            Party::Spouse => "employer_spouse",
            Party::Sponsor1 => "sponsor_1",
            Party::Sponsor2 => "sponsor_2",
            Party::JointApplicant => "joint_applicant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Name,
    Nric,
    Fin,
    Passport,
    PassportExpiry,
}

impl IdentityField {
    fn suffix(self) -> &'static str {
        match self {
            IdentityField::Name => "name",
            IdentityField::Nric => "nric",
            IdentityField::Fin => "fin",
            IdentityField::Passport => "passport",
            IdentityField::PassportExpiry => "passport_expiry",
        }
    }
}

/// Stable identifier for a field blocking a signing stage. The caller maps
/// these to human-readable messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    PartyField(Party, IdentityField),
    PartyRecord(Party),
    FeeSchedule,
    ServiceAgreement,
    SafetyAgreement,
    JobOrderDocument,
    AgencyStaffSignature,
    InPrincipleApprovalDocument,
    MedicalReportDocument,
    WorkCommencementDate,
    InventoryItems,
    WorkerPassport,
    WorkerFin,
    EmployerHandoverSignature,
}

impl MissingField {
    pub fn identifier(&self) -> String {
        match self {
            MissingField::PartyField(party, field) => {
                format!("{}.{}", party.prefix(), field.suffix())
            }
            MissingField::PartyRecord(party) => party.prefix().to_string(),
            MissingField::FeeSchedule => "fee_schedule".into(),
            MissingField::ServiceAgreement => "service_agreement".into(),
            MissingField::SafetyAgreement => "safety_agreement".into(),
            MissingField::JobOrderDocument => "docs.job_order".into(),
            MissingField::AgencyStaffSignature => "signatures.agency_staff".into(),
            MissingField::InPrincipleApprovalDocument => "docs.ipa".into(),
            MissingField::MedicalReportDocument => "docs.medical_report".into(),
            MissingField::WorkCommencementDate => "progress.work_commencement_date".into(),
            MissingField::InventoryItems => "inventory".into(),
            MissingField::WorkerPassport => "fdw.passport".into(),
            MissingField::WorkerFin => "fdw.fin".into(),
            MissingField::EmployerHandoverSignature => "signatures.employer_handover".into(),
        }
    }
}

/// True when the field is present and decrypts to a non-empty identifier.
/// A tag failure propagates as [`CaseError::Decryption`].
fn decryptable_present(
    field: &Option<EncryptedField>,
    cipher: &dyn FieldCipher,
    name: &'static str,
) -> Result<bool> {
    match field {
        None => Ok(false),
        Some(enc) => {
            let plaintext = cipher
                .decrypt(enc)
                .map_err(|_| CaseError::Decryption { field: name })?;
            Ok(!plaintext.is_empty())
        }
    }
}

/// Identity requirements for one party: a name, then a national ID for
/// locals, or FIN + passport + passport expiry for foreigners.
fn missing_party_identity(
    party: Party,
    identity: &PartyIdentity,
    cipher: &dyn FieldCipher,
    out: &mut Vec<MissingField>,
) -> Result<()> {
    if identity.name.is_empty() {
        out.push(MissingField::PartyField(party, IdentityField::Name));
    }

    if identity.residential_status.is_local() {
        if !decryptable_present(&identity.nric, cipher, "nric")? {
            out.push(MissingField::PartyField(party, IdentityField::Nric));
        }
    } else {
        if !decryptable_present(&identity.fin, cipher, "fin")? {
            out.push(MissingField::PartyField(party, IdentityField::Fin));
        }
        if !decryptable_present(&identity.passport, cipher, "passport")? {
            out.push(MissingField::PartyField(party, IdentityField::Passport));
        }
        if identity.passport_expiry.is_none() {
            out.push(MissingField::PartyField(party, IdentityField::PassportExpiry));
        }
    }

    Ok(())
}

fn missing_variant_party(
    party: Party,
    identity: Option<&PartyIdentity>,
    cipher: &dyn FieldCipher,
    out: &mut Vec<MissingField>,
) -> Result<()> {
    match identity {
        Some(identity) => missing_party_identity(party, identity, cipher, out),
        None => {
            out.push(MissingField::PartyRecord(party));
            Ok(())
        }
    }
}

/// Preconditions for opening the pre-deployment signing stage.
///
/// `fees_present` reflects whether a fee schedule record exists for the case;
/// the fee schedule itself lives in its own record and is owned by the intake
/// workflow.
pub fn missing_for_first_signing(
    case: &CaseRecord,
    sigs: &SignatureSet,
    fees_present: bool,
    cipher: &dyn FieldCipher,
    docs: &dyn DocumentStore,
) -> Result<Vec<MissingField>> {
    use crate::case::ApplicantType::*;

    let mut out = Vec::new();

    missing_party_identity(Party::Employer, &case.employer.identity, cipher, &mut out)?;

    match case.employer.applicant_type {
        Single => {}
        Spouse => missing_variant_party(
            Party::Spouse,
            case.employer.spouse.as_ref(),
            cipher,
            &mut out,
        )?,
        OneSponsor => missing_variant_party(
            Party::Sponsor1,
            case.employer.sponsor_1.as_ref(),
            cipher,
            &mut out,
        )?,
        TwoSponsor => {
            missing_variant_party(
                Party::Sponsor1,
                case.employer.sponsor_1.as_ref(),
                cipher,
                &mut out,
            )?;
            missing_variant_party(
                Party::Sponsor2,
                case.employer.sponsor_2.as_ref(),
                cipher,
                &mut out,
            )?;
        }
        JointApplicant => missing_variant_party(
            Party::JointApplicant,
            case.employer.joint_applicant.as_ref(),
            cipher,
            &mut out,
        )?,
    }

    if !fees_present {
        out.push(MissingField::FeeSchedule);
    }
    if case.service_agreement.is_none() {
        out.push(MissingField::ServiceAgreement);
    }
    if !docs.has_file(&case.id, DocKind::JobOrder) {
        out.push(MissingField::JobOrderDocument);
    }
    if sigs.agency_staff_signature.is_none() {
        out.push(MissingField::AgencyStaffSignature);
    }
    if case.fdw.worker_type == WorkerType::New && case.safety_agreement.is_none() {
        out.push(MissingField::SafetyAgreement);
    }

    Ok(out)
}

/// Preconditions for the handover stage: everything the first signing needs,
/// plus the deployment paperwork and the worker's own identifiers.
pub fn missing_for_handover(
    case: &CaseRecord,
    sigs: &SignatureSet,
    fees_present: bool,
    cipher: &dyn FieldCipher,
    docs: &dyn DocumentStore,
) -> Result<Vec<MissingField>> {
    let mut out = missing_for_first_signing(case, sigs, fees_present, cipher, docs)?;

    if !docs.has_file(&case.id, DocKind::InPrincipleApproval) {
        out.push(MissingField::InPrincipleApprovalDocument);
    }
    if !docs.has_file(&case.id, DocKind::MedicalReport) {
        out.push(MissingField::MedicalReportDocument);
    }
    if case.progress.work_commencement_date.is_none() {
        out.push(MissingField::WorkCommencementDate);
    }
    if case.inventory.is_empty() {
        out.push(MissingField::InventoryItems);
    }
    if !decryptable_present(&case.fdw.passport, cipher, "fdw.passport")? {
        out.push(MissingField::WorkerPassport);
    }
    if !decryptable_present(&case.fdw.fin, cipher, "fdw.fin")? {
        out.push(MissingField::WorkerFin);
    }

    Ok(out)
}
