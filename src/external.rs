//! Collaborator interfaces implemented outside this crate.
//!
//! The engine never touches key material or file bytes itself: identifier
//! fields arrive and leave as opaque ciphertext triples, and uploaded
//! documents are only ever checked for presence.

/// An encrypted identifier field as produced by the platform's cipher:
/// ciphertext plus the nonce and authentication tag needed to decrypt it.
/// Snapshots copy these triples verbatim, they are never re-encrypted.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct EncryptedField {
    #[n(0)]
    #[cbor(with = "minicbor::bytes")]
    pub ciphertext: Vec<u8>,
    #[n(1)]
    #[cbor(with = "minicbor::bytes")]
    pub nonce: Vec<u8>,
    #[n(2)]
    #[cbor(with = "minicbor::bytes")]
    pub tag: Vec<u8>,
}

/// Raised by [`FieldCipher::decrypt`] when the authentication tag does not
/// verify. Treated as data corruption by the engine, never as a missing field.
#[derive(thiserror::Error, Debug)]
#[error("ciphertext authentication tag failed to verify")]
pub struct DecryptionFailed;

pub trait FieldCipher {
    fn encrypt(&self, plaintext: &str) -> EncryptedField;
    fn decrypt(&self, field: &EncryptedField) -> Result<String, DecryptionFailed>;
}

/// Document kinds the completeness checks care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    JobOrder,
    InPrincipleApproval,
    MedicalReport,
}

/// Presence/absence checks against the platform's upload store. The engine
/// never reads file bytes.
pub trait DocumentStore {
    fn has_file(&self, case_id: &str, kind: DocKind) -> bool;
}
