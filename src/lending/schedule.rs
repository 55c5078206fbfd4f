//! Repayment schedule construction and repayment allocation

use chrono::{Months, NaiveDate};

use crate::config::EngineConfig;
use crate::crops::CropCatalog;
use crate::error::{EngineError, EngineResult};
use crate::model::{truncate_amount, Amount, InstallmentStatus, LoanCategory, RepaymentInstallment};

/// Loan tenor in months: the crop's cycle, extended for large loans
pub fn select_tenure(config: &EngineConfig, crops: &CropCatalog, crop_type: &str, principal: Amount) -> u32 {
    let base = crops.tenure_months(crop_type);
    if principal > config.extended_tenure_threshold {
        base + config.extended_tenure_months
    } else {
        base
    }
}

/// Build the installment plan for a loan
///
/// Crop loans pay interest monthly and the whole principal with the final
/// installment. Term loans amortize. In both shapes the principal
/// components sum exactly to `principal`.
pub fn build_schedule(
    principal: Amount,
    annual_rate: f64,
    tenure_months: u32,
    category: LoanCategory,
    start: NaiveDate,
) -> EngineResult<Vec<RepaymentInstallment>> {
    if principal == 0 {
        return Err(EngineError::Validation("principal must be positive".to_string()));
    }
    if tenure_months == 0 {
        return Err(EngineError::Validation("tenure must be at least one month".to_string()));
    }
    if !annual_rate.is_finite() || annual_rate < 0.0 {
        return Err(EngineError::Validation(format!("invalid interest rate {}", annual_rate)));
    }

    let splits = match category {
        LoanCategory::Crop => balloon_splits(principal, annual_rate, tenure_months),
        LoanCategory::Term => amortizing_splits(principal, annual_rate, tenure_months),
    };

    splits
        .into_iter()
        .enumerate()
        .map(|(i, (principal_amount, interest_amount))| {
            let number = i as u32 + 1;
            let due_date = start
                .checked_add_months(Months::new(number))
                .ok_or_else(|| EngineError::Validation(format!("due date {} out of range", number)))?;
            Ok(RepaymentInstallment {
                number,
                due_date,
                total_amount: principal_amount + interest_amount,
                principal_amount,
                interest_amount,
                status: InstallmentStatus::Pending,
            })
        })
        .collect()
}

/// Interest-only periods with the principal at harvest
fn balloon_splits(principal: Amount, annual_rate: f64, tenure: u32) -> Vec<(Amount, Amount)> {
    let n = tenure as u64;
    let total_interest = truncate_amount(principal as f64 * annual_rate / 12.0 * n as f64);
    let share = total_interest / n;
    let final_interest = total_interest - share * (n - 1);

    let mut splits: Vec<(Amount, Amount)> = (1..n).map(|_| (0, share)).collect();
    splits.push((principal, final_interest));
    splits
}

/// Level payments, interest on the remaining balance
fn amortizing_splits(principal: Amount, annual_rate: f64, tenure: u32) -> Vec<(Amount, Amount)> {
    let monthly_rate = annual_rate / 12.0;
    let n = tenure as i32;
    let payment = if monthly_rate == 0.0 {
        principal as f64 / n as f64
    } else {
        principal as f64 * monthly_rate / (1.0 - (1.0 + monthly_rate).powi(-n))
    };

    let mut remaining = principal;
    let mut splits = Vec::with_capacity(tenure as usize);
    for k in 1..=n {
        let interest = (remaining as f64 * monthly_rate).round() as Amount;
        let principal_part = if k == n {
            remaining
        } else {
            ((payment - interest as f64).round().max(0.0) as Amount).min(remaining)
        };
        remaining -= principal_part;
        splits.push((principal_part, interest));
    }
    splits
}

/// Split a repayment into principal and interest
///
/// Payments settle installments in order. Each installment's slice of the
/// payment is divided in that installment's principal/interest proportion;
/// fully covered installments are marked paid.
pub fn allocate_repayment(
    schedule: &mut [RepaymentInstallment],
    repaid_before: Amount,
    amount: Amount,
) -> (Amount, Amount) {
    let paid_after = repaid_before + amount;
    let mut principal = 0u64;
    let mut installment_start = 0u64;

    for installment in schedule.iter_mut() {
        let installment_end = installment_start + installment.total_amount;
        let covered_from = repaid_before.max(installment_start);
        let covered_to = paid_after.min(installment_end);

        if covered_to > covered_from && installment.total_amount > 0 {
            let slice = covered_to - covered_from;
            principal += (slice as u128 * installment.principal_amount as u128
                / installment.total_amount as u128) as Amount;
        }
        if paid_after >= installment_end {
            installment.status = InstallmentStatus::Paid;
        }

        installment_start = installment_end;
    }

    (principal, amount - principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn principal_sum(schedule: &[RepaymentInstallment]) -> Amount {
        schedule.iter().map(|i| i.principal_amount).sum()
    }

    #[test]
    fn test_crop_schedule_is_balloon() {
        let schedule = build_schedule(500_000, 0.06, 6, LoanCategory::Crop, start()).unwrap();

        assert_eq!(schedule.len(), 6);
        // 500,000 × 0.005 × 6 = 15,000 total interest
        for installment in &schedule[..5] {
            assert_eq!(installment.principal_amount, 0);
            assert_eq!(installment.interest_amount, 2_500);
        }
        assert_eq!(schedule[5].principal_amount, 500_000);
        assert_eq!(schedule[5].interest_amount, 2_500);
        assert_eq!(schedule.iter().map(|i| i.total_amount).sum::<Amount>(), 515_000);
    }

    #[test]
    fn test_crop_schedule_remainder_on_final_interest() {
        let schedule = build_schedule(100_000, 0.07, 7, LoanCategory::Crop, start()).unwrap();
        let total_interest: Amount = schedule.iter().map(|i| i.interest_amount).sum();
        // 100,000 × 0.07 / 12 × 7 = 4,083.33 → 4,083
        assert_eq!(total_interest, 4_083);
        assert_eq!(schedule[0].interest_amount, 583);
        assert_eq!(schedule[6].interest_amount, 585);
        assert_eq!(principal_sum(&schedule), 100_000);
    }

    #[test]
    fn test_amortizing_schedule_sums_to_principal() {
        for (principal, rate, tenure) in [
            (100_000, 0.085, 12),
            (250_001, 0.04, 7),
            (1_000_000, 0.12, 36),
            (10_000, 0.0, 3),
        ] {
            let schedule = build_schedule(principal, rate, tenure, LoanCategory::Term, start()).unwrap();
            assert_eq!(schedule.len(), tenure as usize);
            assert_eq!(principal_sum(&schedule), principal);
            assert!(schedule.iter().all(|i| i.total_amount == i.principal_amount + i.interest_amount));
        }
    }

    #[test]
    fn test_amortizing_interest_declines() {
        let schedule = build_schedule(120_000, 0.12, 12, LoanCategory::Term, start()).unwrap();
        assert_eq!(schedule[0].interest_amount, 1_200);
        assert!(schedule
            .windows(2)
            .all(|w| w[1].interest_amount <= w[0].interest_amount));
        assert!(schedule[11].principal_amount > schedule[0].principal_amount);
    }

    #[test]
    fn test_due_dates_monthly() {
        let schedule = build_schedule(50_000, 0.07, 3, LoanCategory::Crop, start()).unwrap();
        assert_eq!(schedule[0].due_date, NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
        assert_eq!(schedule[2].due_date, NaiveDate::from_ymd_opt(2024, 9, 15).unwrap());
    }

    #[test]
    fn test_schedule_validation() {
        assert!(build_schedule(0, 0.07, 6, LoanCategory::Crop, start()).is_err());
        assert!(build_schedule(1_000, 0.07, 0, LoanCategory::Crop, start()).is_err());
        assert!(build_schedule(1_000, -0.01, 6, LoanCategory::Term, start()).is_err());
    }

    #[test]
    fn test_select_tenure() {
        let config = EngineConfig::default();
        let crops = CropCatalog::default_catalog();
        assert_eq!(select_tenure(&config, &crops, "COTTON", 100_000), 8);
        assert_eq!(select_tenure(&config, &crops, "COTTON", 100_001), 10);
        assert_eq!(select_tenure(&config, &crops, "MILLET", 50_000), 6);
    }

    #[test]
    fn test_allocate_interest_only_installments() {
        let mut schedule = build_schedule(500_000, 0.06, 6, LoanCategory::Crop, start()).unwrap();

        let (principal, interest) = allocate_repayment(&mut schedule, 0, 2_500);
        assert_eq!((principal, interest), (0, 2_500));
        assert_eq!(schedule[0].status, InstallmentStatus::Paid);
        assert_eq!(schedule[1].status, InstallmentStatus::Pending);

        // the four remaining interest-only installments plus part of the balloon
        let (principal, interest) = allocate_repayment(&mut schedule, 2_500, 10_000 + 50_000);
        assert_eq!(interest, 10_000 + (50_000 - principal));
        // balloon slice is 50,000 of 502,500 → principal share 49,751
        assert_eq!(principal, 49_751);
        assert_eq!(schedule[5].status, InstallmentStatus::Pending);
    }

    #[test]
    fn test_allocate_full_settlement_marks_all_paid() {
        let mut schedule = build_schedule(120_000, 0.12, 12, LoanCategory::Term, start()).unwrap();
        let total: Amount = schedule.iter().map(|i| i.total_amount).sum();

        let (principal, interest) = allocate_repayment(&mut schedule, 0, total);
        assert_eq!(principal, 120_000);
        assert_eq!(principal + interest, total);
        assert!(schedule.iter().all(|i| i.status == InstallmentStatus::Paid));
    }
}
