//! Itemized service fee schedule and invoice stamping.

use crate::case::Timestamp;
use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct OtherService {
    #[n(0)]
    pub description: String,
    #[n(1)]
    pub fee: Money,
}

/// One per case. Line items are owned by the intake workflow; this engine
/// only reads them for totals and stamps the two invoices.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct ServiceFeeSchedule {
    #[n(0)]
    pub case_id: String,
    #[n(1)]
    pub is_new_case: bool,
    #[n(2)]
    pub service_fee: Money,
    // Administrative cost line items
    #[n(3)]
    pub work_permit_application: Money,
    #[n(4)]
    pub medical_examination_fee: Money,
    #[n(5)]
    pub security_bond_insurance: Money,
    #[n(6)]
    pub indemnity_policy_reimbursement: Money,
    #[n(7)]
    pub home_service: Money,
    #[n(8)]
    pub settling_in_programme: Money,
    #[n(9)]
    pub other_services: Vec<OtherService>,
    #[n(10)]
    pub replacement_cost: Money,
    #[n(11)]
    pub work_permit_renewal: Money,
    #[n(12)]
    pub agency_fee: Money,
    // Deposit invoice
    #[n(13)]
    pub deposit_amount: Money,
    #[n(14)]
    pub deposit_date: Option<Timestamp>,
    #[n(15)]
    pub deposit_detail: Option<String>,
    #[n(16)]
    pub deposit_receipt_no: Option<String>,
    // Remaining-amount invoice
    #[n(17)]
    pub remaining_date: Option<Timestamp>,
    #[n(18)]
    pub remaining_detail: Option<String>,
    #[n(19)]
    pub remaining_receipt_no: Option<String>,
    #[n(20)]
    pub remaining_balance: Option<Money>,
}

impl ServiceFeeSchedule {
    pub fn new(case_id: String) -> Self {
        Self {
            case_id,
            is_new_case: true,
            service_fee: Money::ZERO,
            work_permit_application: Money::ZERO,
            medical_examination_fee: Money::ZERO,
            security_bond_insurance: Money::ZERO,
            indemnity_policy_reimbursement: Money::ZERO,
            home_service: Money::ZERO,
            settling_in_programme: Money::ZERO,
            other_services: Vec::new(),
            replacement_cost: Money::ZERO,
            work_permit_renewal: Money::ZERO,
            agency_fee: Money::ZERO,
            deposit_amount: Money::ZERO,
            deposit_date: None,
            deposit_detail: None,
            deposit_receipt_no: None,
            remaining_date: None,
            remaining_detail: None,
            remaining_receipt_no: None,
            remaining_balance: None,
        }
    }

    /// Sum of every administrative cost line item.
    pub fn admin_cost(&self) -> Money {
        let mut total = self.work_permit_application
            + self.medical_examination_fee
            + self.security_bond_insurance
            + self.indemnity_policy_reimbursement
            + self.home_service
            + self.settling_in_programme
            + self.replacement_cost
            + self.work_permit_renewal;
        for other in &self.other_services {
            total += other.fee;
        }
        total
    }

    /// Placement fee is the agency fee plus the worker's loan.
    pub fn placement_fee(&self, fdw_loan: Money) -> Money {
        self.agency_fee + fdw_loan
    }

    pub fn total_fee(&self, fdw_loan: Money) -> Money {
        self.admin_cost() + self.placement_fee(fdw_loan)
    }

    /// Outstanding balance owed by the employer after the deposit.
    pub fn outstanding_balance(&self, fdw_loan: Money) -> Money {
        self.admin_cost() + self.placement_fee(fdw_loan) - self.deposit_amount
    }

    pub fn stamp_deposit_invoice(&mut self, receipt_no: String, at: Timestamp, detail: String) {
        self.deposit_date = Some(at);
        self.deposit_detail = Some(detail);
        self.deposit_receipt_no = Some(receipt_no);
    }

    pub fn stamp_remaining_invoice(
        &mut self,
        receipt_no: String,
        at: Timestamp,
        detail: String,
        balance: Money,
    ) {
        self.remaining_date = Some(at);
        self.remaining_detail = Some(detail);
        self.remaining_receipt_no = Some(receipt_no);
        self.remaining_balance = Some(balance);
    }
}
