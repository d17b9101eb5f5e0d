//! Core case record and party profile types.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};

use crate::external::EncryptedField;
use crate::money::Money;

/// Fixed divisor used to derive the per-off-day compensation rate from the
/// monthly salary.
pub const WORK_DAYS_PER_MONTH: i64 = 26;

/// Calendar date wrapper so dates can live in CBOR-encoded records.
/// Encoded as the day count from the common era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CaseDate(NaiveDate);

impl CaseDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(CaseDate)
    }

    pub fn inner(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CaseDate {
    fn from(value: NaiveDate) -> Self {
        CaseDate(value)
    }
}

impl<C> minicbor::Encode<C> for CaseDate {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.i32(self.0.num_days_from_ce())?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for CaseDate {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let days = d.i32()?;

        NaiveDate::from_num_days_from_ce_opt(days)
            .map(CaseDate)
            .ok_or(minicbor::decode::Error::message(
                "day count out of range for a calendar date",
            ))
    }
}

/// Instant wrapper for receipt and snapshot timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Timestamp)
    }

    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C> minicbor::Encode<C> for Timestamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Timestamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(Timestamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum CaseStatus {
    #[n(0)]
    Live,
    #[n(1)]
    WaitingEmployerSignature,
    #[n(2)]
    WaitingHandover,
    #[n(3)]
    Archived,
}

/// The applicant variant on the employer side. Determines which optional
/// parties must have complete identity details and which optional signature
/// slots apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum ApplicantType {
    #[n(0)]
    Single,
    #[n(1)]
    Spouse,
    #[n(2)]
    OneSponsor,
    #[n(3)]
    TwoSponsor,
    #[n(4)]
    JointApplicant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum ResidentialStatus {
    #[n(0)]
    Citizen,
    #[n(1)]
    PermanentResident,
    #[n(2)]
    Foreigner,
}

impl ResidentialStatus {
    /// Locals identify with a national ID, foreigners with FIN + passport.
    pub fn is_local(&self) -> bool {
        matches!(self, ResidentialStatus::Citizen | ResidentialStatus::PermanentResident)
    }
}

/// First-time hires carry an extra safety-agreement requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum WorkerType {
    #[n(0)]
    New,
    #[n(1)]
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum OffDayOfWeek {
    #[n(0)]
    Mon,
    #[n(1)]
    Tue,
    #[n(2)]
    Wed,
    #[n(3)]
    Thu,
    #[n(4)]
    Fri,
    #[n(5)]
    Sat,
    #[n(6)]
    Sun,
}

impl OffDayOfWeek {
    pub fn to_weekday(self) -> Weekday {
        match self {
            OffDayOfWeek::Mon => Weekday::Mon,
            OffDayOfWeek::Tue => Weekday::Tue,
            OffDayOfWeek::Wed => Weekday::Wed,
            OffDayOfWeek::Thu => Weekday::Thu,
            OffDayOfWeek::Fri => Weekday::Fri,
            OffDayOfWeek::Sat => Weekday::Sat,
            OffDayOfWeek::Sun => Weekday::Sun,
        }
    }
}

/// Identity details for one person on the employer side of the case.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct PartyIdentity {
    #[n(0)]
    pub name: String,
    #[n(1)]
    pub residential_status: ResidentialStatus,
    #[n(2)]
    pub nric: Option<EncryptedField>,
    #[n(3)]
    pub fin: Option<EncryptedField>,
    #[n(4)]
    pub passport: Option<EncryptedField>,
    #[n(5)]
    pub passport_expiry: Option<CaseDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct EmployerProfile {
    #[n(0)]
    pub applicant_type: ApplicantType,
    #[n(1)]
    pub identity: PartyIdentity,
    #[n(2)]
    pub spouse: Option<PartyIdentity>,
    #[n(3)]
    pub sponsor_1: Option<PartyIdentity>,
    #[n(4)]
    pub sponsor_2: Option<PartyIdentity>,
    #[n(5)]
    pub joint_applicant: Option<PartyIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct WorkerProfile {
    #[n(0)]
    pub name: String,
    #[n(1)]
    pub nationality: String,
    #[n(2)]
    pub worker_type: WorkerType,
    #[n(3)]
    pub passport: Option<EncryptedField>,
    #[n(4)]
    pub fin: Option<EncryptedField>,
}

/// Agency identity plus the handling staff member. This is the data the
/// agency snapshot freezes at finalization.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct AgencyProfile {
    #[n(0)]
    pub agency_name: String,
    #[n(1)]
    pub license_no: String,
    #[n(2)]
    pub address_1: String,
    #[n(3)]
    pub address_2: String,
    #[n(4)]
    pub postal_code: String,
    #[n(5)]
    pub employee_name: String,
    #[n(6)]
    pub ea_personnel_no: String,
    #[n(7)]
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct ServiceAgreementTerms {
    #[n(0)]
    pub handover_days: u8,
    #[n(1)]
    pub number_of_replacements: u8,
    #[n(2)]
    pub replacement_period_months: u8,
    #[n(3)]
    pub termination_notice_days: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct SafetyAgreementTerms {
    #[n(0)]
    pub residential_dwelling_type: String,
    #[n(1)]
    pub fdw_clean_window_exterior: bool,
    #[n(2)]
    pub window_exterior_location: Option<String>,
    #[n(3)]
    pub adult_supervision: Option<bool>,
}

/// Deployment milestones recorded by the surrounding workflow.
#[derive(Debug, Default, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct CaseProgress {
    #[n(0)]
    pub ipa_approval_date: Option<CaseDate>,
    #[n(1)]
    pub arrival_date: Option<CaseDate>,
    #[n(2)]
    pub work_commencement_date: Option<CaseDate>,
}

/// One employment placement contract. The record stays mutable while live;
/// once archived it is terminal-but-persisted and read-only.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct CaseRecord {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub case_ref_no: String,
    #[n(2)]
    pub version: u32,
    #[n(3)]
    pub status: CaseStatus,
    #[n(4)]
    pub agreement_date: CaseDate,
    #[n(5)]
    pub fdw_salary: Money,
    #[n(6)]
    pub fdw_loan: Money,
    #[n(7)]
    pub fdw_off_days_per_month: u8,
    #[n(8)]
    pub fdw_monthly_loan_repayment: Money,
    #[n(9)]
    pub fdw_off_day_of_week: OffDayOfWeek,
    #[n(10)]
    pub employer: EmployerProfile,
    #[n(11)]
    pub fdw: WorkerProfile,
    #[n(12)]
    pub agency: AgencyProfile,
    #[n(13)]
    pub service_agreement: Option<ServiceAgreementTerms>,
    #[n(14)]
    pub safety_agreement: Option<SafetyAgreementTerms>,
    #[n(15)]
    pub progress: CaseProgress,
    #[n(16)]
    pub inventory: Vec<String>,
    #[n(17)]
    pub agency_snapshot_ref: Option<String>,
    #[n(18)]
    pub worker_snapshot_ref: Option<String>,
}

impl CaseRecord {
    pub fn is_archived(&self) -> bool {
        self.status == CaseStatus::Archived
    }

    /// Salary supplement paid per off day worked, half-up rounded to the
    /// nearest cent.
    pub fn per_off_day_compensation(&self) -> Money {
        self.fdw_salary.div_round_half_up(WORK_DAYS_PER_MONTH)
    }

    /// Zero-padded version string used on rendered documents.
    pub fn display_version(&self) -> String {
        format!("{:04}", self.version)
    }
}
