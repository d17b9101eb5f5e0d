//! Property-based tests for the repayment schedule calculator
//!
//! The schedule backs a rendered legal document, so beyond the worked
//! examples in the unit tests these properties pin down the invariants that
//! must hold for any contract terms: fixed length, determinism, the loan
//! floor, and the row-level arithmetic identities.

mod common;

use chrono::Datelike;
use proptest::prelude::*;

use casework::case::{CaseDate, CaseRecord, OffDayOfWeek};
use casework::money::Money;
use casework::schedule::{EngineConfig, compute_schedule};

fn off_day_strategy() -> impl Strategy<Value = OffDayOfWeek> {
    prop_oneof![
        Just(OffDayOfWeek::Mon),
        Just(OffDayOfWeek::Tue),
        Just(OffDayOfWeek::Wed),
        Just(OffDayOfWeek::Thu),
        Just(OffDayOfWeek::Fri),
        Just(OffDayOfWeek::Sat),
        Just(OffDayOfWeek::Sun),
    ]
}

/// Any calendar date between 2015 and 2034, including the leap-day and
/// end-of-month cases the clamping logic must handle.
fn deployment_strategy() -> impl Strategy<Value = Option<CaseDate>> {
    prop_oneof![
        Just(None),
        (2015i32..2035, 1u32..=12, 1u32..=31)
            .prop_filter_map("day must exist in month", |(y, m, d)| CaseDate::from_ymd(
                y, m, d
            ))
            .prop_map(Some),
    ]
}

/// A case with arbitrary but in-range contract terms.
fn case_strategy() -> impl Strategy<Value = CaseRecord> {
    (
        0i64..=10_000,
        0i64..=10_000,
        0u8..=8,
        0i64..=1_000,
        off_day_strategy(),
        deployment_strategy(),
    )
        .prop_map(|(salary, loan, off_days, repayment, off_day, deployment)| {
            let mut case = common::fixture_case();
            case.fdw_salary = Money::from_dollars(salary);
            case.fdw_loan = Money::from_dollars(loan);
            case.fdw_off_days_per_month = off_days;
            case.fdw_monthly_loan_repayment = Money::from_dollars(repayment);
            case.fdw_off_day_of_week = off_day;
            case.progress.work_commencement_date = deployment;
            case
        })
}

proptest! {
    #[test]
    fn schedule_always_has_the_configured_period_count(case in case_strategy()) {
        let rows = compute_schedule(&case, &EngineConfig::default());
        prop_assert_eq!(rows.len(), 24);
        for (i, row) in rows.iter().enumerate() {
            prop_assert_eq!(row.index as usize, i + 1);
        }
    }

    #[test]
    fn schedule_is_deterministic(case in case_strategy()) {
        let a = compute_schedule(&case, &EngineConfig::default());
        let b = compute_schedule(&case, &EngineConfig::default());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn loan_is_never_over_repaid(case in case_strategy()) {
        let rows = compute_schedule(&case, &EngineConfig::default());

        let mut total_repaid = Money::ZERO;
        for row in &rows {
            prop_assert!(!row.loan_repaid.is_negative());
            prop_assert!(row.loan_repaid <= case.fdw_monthly_loan_repayment);
            prop_assert!(row.loan_repaid <= case.fdw_salary);
            total_repaid += row.loan_repaid;
        }
        prop_assert!(total_repaid <= case.fdw_loan);
    }

    #[test]
    fn row_arithmetic_identities_hold(case in case_strategy()) {
        let rows = compute_schedule(&case, &EngineConfig::default());
        for row in &rows {
            prop_assert_eq!(row.basic_salary, case.fdw_salary);
            prop_assert_eq!(row.total_salary, row.basic_salary + row.off_day_compensation);
            prop_assert_eq!(row.salary_received, row.total_salary - row.loan_repaid);
        }
    }

    #[test]
    fn payment_dates_follow_deployment(case in case_strategy()) {
        let rows = compute_schedule(&case, &EngineConfig::default());

        match case.progress.work_commencement_date {
            None => {
                for row in &rows {
                    prop_assert!(row.payment_date.is_none());
                }
            }
            Some(deployed) => {
                let mut previous = deployed.inner();
                for row in &rows {
                    let date = row.payment_date.expect("dated schedule has payment dates");
                    prop_assert!(date > previous);
                    // clamped down in short months, never past the nominal day
                    prop_assert!(date.day() <= deployed.inner().day());
                    previous = date;
                }
            }
        }
    }
}
