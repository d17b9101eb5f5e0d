//! Immutable point-in-time snapshots written at case finalization.
//!
//! Later edits to the live agency or worker records must not alter archived
//! cases, so finalization copies the identity fields the signed documents
//! were rendered from. Encrypted identifiers are copied verbatim, never
//! re-encrypted.

use crate::case::{CaseRecord, Timestamp};
use crate::external::EncryptedField;

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct AgencySnapshot {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub case_id: String,
    #[n(2)]
    pub agency_name: String,
    #[n(3)]
    pub license_no: String,
    #[n(4)]
    pub address_1: String,
    #[n(5)]
    pub address_2: String,
    #[n(6)]
    pub postal_code: String,
    #[n(7)]
    pub employee_name: String,
    #[n(8)]
    pub ea_personnel_no: String,
    #[n(9)]
    pub branch: String,
    #[n(10)]
    pub taken_at: Timestamp,
}

impl AgencySnapshot {
    pub fn from_case(id: String, case: &CaseRecord, taken_at: Timestamp) -> Self {
        Self {
            id,
            case_id: case.id.clone(),
            agency_name: case.agency.agency_name.clone(),
            license_no: case.agency.license_no.clone(),
            address_1: case.agency.address_1.clone(),
            address_2: case.agency.address_2.clone(),
            postal_code: case.agency.postal_code.clone(),
            employee_name: case.agency.employee_name.clone(),
            ea_personnel_no: case.agency.ea_personnel_no.clone(),
            branch: case.agency.branch.clone(),
            taken_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct WorkerSnapshot {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub case_id: String,
    #[n(2)]
    pub name: String,
    #[n(3)]
    pub nationality: String,
    #[n(4)]
    pub passport: Option<EncryptedField>,
    #[n(5)]
    pub fin: Option<EncryptedField>,
    #[n(6)]
    pub taken_at: Timestamp,
}

impl WorkerSnapshot {
    pub fn from_case(id: String, case: &CaseRecord, taken_at: Timestamp) -> Self {
        Self {
            id,
            case_id: case.id.clone(),
            name: case.fdw.name.clone(),
            nationality: case.fdw.nationality.clone(),
            passport: case.fdw.passport.clone(),
            fin: case.fdw.fin.clone(),
            taken_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_case;

    #[test]
    fn worker_snapshot_copies_ciphertext_verbatim() {
        let case = sample_case();
        let snap = WorkerSnapshot::from_case("snap_w".into(), &case, Timestamp::now());

        assert_eq!(snap.case_id, case.id);
        assert_eq!(snap.passport, case.fdw.passport);
        assert_eq!(snap.fin, case.fdw.fin);
    }

    #[test]
    fn agency_snapshot_copies_identity_fields() {
        let case = sample_case();
        let snap = AgencySnapshot::from_case("snap_a".into(), &case, Timestamp::now());

        assert_eq!(snap.agency_name, case.agency.agency_name);
        assert_eq!(snap.license_no, case.agency.license_no);
        assert_eq!(snap.ea_personnel_no, case.agency.ea_personnel_no);
    }
}
