//! The 24-period salary and loan repayment schedule.
//!
//! `compute_schedule` is a pure function over the case's contract terms. It
//! backs a rendered document that must match exactly each time it is
//! regenerated, so the arithmetic is integer-only and re-runs with identical
//! inputs produce bit-identical rows.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::case::CaseRecord;
use crate::money::Money;

/// Tunables with fixed defaults. Kept explicit so the schedule assumptions
/// are visible at the call site rather than buried in the arithmetic.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of pay periods in the schedule.
    pub schedule_periods: u32,
    /// Potential off days assumed per period when no deployment date is
    /// known yet.
    pub undated_potential_off_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schedule_periods: 24,
            undated_potential_off_days: 4,
        }
    }
}

/// One pay period of the repayment schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRow {
    /// 1-based period index.
    pub index: u32,
    /// Payment date; empty until the worker has a deployment date.
    pub payment_date: Option<NaiveDate>,
    pub basic_salary: Money,
    /// May be negative when the contract grants more off days than the
    /// calendar period contains.
    pub off_day_compensation: Money,
    pub total_salary: Money,
    pub loan_repaid: Money,
    pub salary_received: Money,
}

fn days_in_month(year: i32, month: u32) -> u32 {
    for day in [31, 30, 29, 28] {
        if NaiveDate::from_ymd_opt(year, month, day).is_some() {
            return day;
        }
    }
    28
}

/// Date `months_ahead` months after `base`, with the day-of-month clamped to
/// the last valid day of the target month.
fn advance_months_clamped(base: NaiveDate, months_ahead: u32) -> NaiveDate {
    let months = base.month0() + months_ahead;
    let year = base.year() + (months / 12) as i32;
    let month = months % 12 + 1;
    let day = base.day().min(days_in_month(year, month));

    // day is clamped to a valid day of (year, month) above
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(base)
}

/// Count of calendar days in `[start, end]` inclusive falling on `weekday`.
fn matching_weekdays(start: NaiveDate, end: NaiveDate, weekday: Weekday) -> i64 {
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if day.weekday() == weekday {
            count += 1;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    count
}

/// Compute the repayment schedule from the case's contract terms. Uses the
/// recorded work-commencement date as the deployment date; while that date
/// is absent every row uses the fixed off-day assumption and carries no
/// payment date.
pub fn compute_schedule(case: &CaseRecord, config: &EngineConfig) -> Vec<PeriodRow> {
    let deployment = case.progress.work_commencement_date.map(|d| d.inner());
    let off_day = case.fdw_off_day_of_week.to_weekday();
    let per_off_day = case.per_off_day_compensation();

    let mut rows = Vec::with_capacity(config.schedule_periods as usize);
    let mut remaining_loan = case.fdw_loan;
    let mut previous_payment = deployment;

    for index in 1..=config.schedule_periods {
        let (potential_off_days, payment_date) = match deployment {
            Some(deployed) => {
                let payment = advance_months_clamped(deployed, index);
                let start = previous_payment
                    .and_then(|d| d.succ_opt())
                    .unwrap_or(payment);
                let potential = matching_weekdays(start, payment, off_day);
                previous_payment = Some(payment);
                (potential, Some(payment))
            }
            None => (config.undated_potential_off_days, None),
        };

        let off_days_owed = potential_off_days - i64::from(case.fdw_off_days_per_month);
        let off_day_compensation = per_off_day * off_days_owed;
        let total_salary = case.fdw_salary + off_day_compensation;
        let loan_repaid = case
            .fdw_monthly_loan_repayment
            .min(case.fdw_salary)
            .min(remaining_loan);
        let salary_received = total_salary - loan_repaid;

        rows.push(PeriodRow {
            index,
            payment_date,
            basic_salary: case.fdw_salary,
            off_day_compensation,
            total_salary,
            loan_repaid,
            salary_received,
        });

        remaining_loan = (remaining_loan - loan_repaid).max(Money::ZERO);
    }

    rows
}
