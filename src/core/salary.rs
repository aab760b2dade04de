use super::error::ProjectionError;
use super::types::{Salary, SalaryBreakdown, Scope, VariancePeriod};

fn rate(percent: f64) -> f64 {
    percent / 100.0
}

/// Resolves a salary's pre-tax amount and tax rate for `year` (1-based).
///
/// Variance periods are scanned in order; a period covers `[from, next.from)` and
/// the last one is open-ended. Years before the first period keep the base amount
/// and tax rate. Flat-taxed salaries ignore period tax rates.
pub fn salary_breakdown_for_year(salary: &Salary, year: u32) -> SalaryBreakdown {
    let (amount, period_tax_percent) = match active_period(&salary.variance, year) {
        Some(period) => (period.amount, period.tax_percent),
        None => (salary.amount, salary.tax_percent),
    };

    let effective_tax_percent = match salary.tax_type {
        Scope::PerCategory => salary.tax_percent,
        Scope::PerRecord => period_tax_percent,
    };

    SalaryBreakdown {
        pre_tax_amount: amount,
        post_tax_amount: amount * (1.0 - rate(effective_tax_percent)),
        effective_tax_percent,
    }
}

fn active_period(periods: &[VariancePeriod], year: u32) -> Option<&VariancePeriod> {
    for (idx, period) in periods.iter().enumerate() {
        match periods.get(idx + 1) {
            Some(next) if year >= period.from && year < next.from => return Some(period),
            Some(_) => {}
            None if year >= period.from => return Some(period),
            None => {}
        }
    }
    None
}

/// Rejects salaries whose variance periods do not start in strictly increasing years.
pub fn validate_variance_order(salaries: &[Salary]) -> Result<(), ProjectionError> {
    for (salary_index, salary) in salaries.iter().enumerate() {
        for (offset, pair) in salary.variance.windows(2).enumerate() {
            if pair[0].from >= pair[1].from {
                return Err(ProjectionError::InvalidVarianceOrder {
                    salary_index,
                    period_index: offset + 1,
                    previous_from: pair[0].from,
                    from: pair[1].from,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn period(from: u32, amount: f64, tax_percent: f64) -> VariancePeriod {
        VariancePeriod {
            id: None,
            from,
            amount,
            tax_percent,
        }
    }

    fn sample_salary() -> Salary {
        Salary {
            id: Some(1),
            title: "Job".to_string(),
            amount: 60_000.0,
            currency: "USD".to_string(),
            tax_type: Scope::PerRecord,
            tax_percent: 30.0,
            variance: Vec::new(),
        }
    }

    fn stepped_salary() -> Salary {
        let mut salary = sample_salary();
        salary.variance = vec![period(1, 50_000.0, 20.0), period(5, 80_000.0, 35.0)];
        salary
    }

    #[test]
    fn no_variance_uses_base_amount_and_tax() {
        let breakdown = salary_breakdown_for_year(&sample_salary(), 3);
        assert_approx(breakdown.pre_tax_amount, 60_000.0);
        assert_approx(breakdown.effective_tax_percent, 30.0);
        assert_approx(breakdown.post_tax_amount, 42_000.0);
    }

    #[test]
    fn window_before_next_period_uses_current_period() {
        let breakdown = salary_breakdown_for_year(&stepped_salary(), 4);
        assert_approx(breakdown.pre_tax_amount, 50_000.0);
        assert_approx(breakdown.effective_tax_percent, 20.0);
        assert_approx(breakdown.post_tax_amount, 40_000.0);
    }

    #[test]
    fn last_period_is_open_ended() {
        let salary = stepped_salary();
        for year in [5, 6, 100] {
            let breakdown = salary_breakdown_for_year(&salary, year);
            assert_approx(breakdown.pre_tax_amount, 80_000.0);
            assert_approx(breakdown.effective_tax_percent, 35.0);
            assert_approx(breakdown.post_tax_amount, 52_000.0);
        }
    }

    #[test]
    fn year_before_first_period_falls_back_to_base_values() {
        let mut salary = sample_salary();
        salary.variance = vec![period(3, 90_000.0, 40.0), period(6, 95_000.0, 41.0)];

        let breakdown = salary_breakdown_for_year(&salary, 2);
        assert_approx(breakdown.pre_tax_amount, 60_000.0);
        assert_approx(breakdown.effective_tax_percent, 30.0);
    }

    #[test]
    fn flat_tax_ignores_period_tax_but_keeps_period_amount() {
        let mut salary = stepped_salary();
        salary.tax_type = Scope::PerCategory;

        let breakdown = salary_breakdown_for_year(&salary, 7);
        assert_approx(breakdown.pre_tax_amount, 80_000.0);
        assert_approx(breakdown.effective_tax_percent, 30.0);
        assert_approx(breakdown.post_tax_amount, 56_000.0);
    }

    #[test]
    fn three_period_windows_resolve_in_order() {
        let mut salary = sample_salary();
        salary.variance = vec![
            period(1, 10.0, 0.0),
            period(3, 20.0, 10.0),
            period(8, 30.0, 50.0),
        ];

        let amounts = (1..=9)
            .map(|year| salary_breakdown_for_year(&salary, year).pre_tax_amount)
            .collect::<Vec<_>>();
        assert_eq!(
            amounts,
            vec![10.0, 10.0, 20.0, 20.0, 20.0, 20.0, 20.0, 30.0, 30.0]
        );
    }

    #[test]
    fn validate_variance_order_accepts_increasing_periods() {
        let salaries = vec![sample_salary(), stepped_salary()];
        assert_eq!(validate_variance_order(&salaries), Ok(()));
    }

    #[test]
    fn validate_variance_order_rejects_decreasing_periods() {
        let mut salary = sample_salary();
        salary.variance = vec![period(5, 1.0, 0.0), period(3, 2.0, 0.0)];
        let err = validate_variance_order(&[sample_salary(), salary]).expect_err("must reject");

        assert_eq!(
            err,
            ProjectionError::InvalidVarianceOrder {
                salary_index: 1,
                period_index: 1,
                previous_from: 5,
                from: 3,
            }
        );
        assert!(err.to_string().contains("invalid periods order"));
    }

    #[test]
    fn validate_variance_order_rejects_duplicate_start_year() {
        let mut salary = sample_salary();
        salary.variance = vec![
            period(1, 1.0, 0.0),
            period(4, 2.0, 0.0),
            period(4, 3.0, 0.0),
        ];
        let err = validate_variance_order(&[salary]).expect_err("must reject");
        assert!(matches!(
            err,
            ProjectionError::InvalidVarianceOrder { period_index: 2, .. }
        ));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_post_tax_without_variance_is_amount_less_tax(
            amount_cents in 1u64..100_000_000,
            tax_bp in 0u32..10_001,
            year in 1u32..=200,
            flat in proptest::bool::ANY,
        ) {
            let mut salary = sample_salary();
            salary.amount = amount_cents as f64 / 100.0;
            salary.tax_percent = tax_bp as f64 / 100.0;
            salary.tax_type = if flat { Scope::PerCategory } else { Scope::PerRecord };

            let breakdown = salary_breakdown_for_year(&salary, year);
            let expected = salary.amount * (1.0 - salary.tax_percent / 100.0);
            prop_assert!((breakdown.post_tax_amount - expected).abs() <= 1e-6);
            prop_assert!(breakdown.post_tax_amount <= breakdown.pre_tax_amount + 1e-9);
        }

        #[test]
        fn prop_two_period_boundary_is_exact(
            boundary in 2u32..150,
            year in 1u32..=200,
        ) {
            let mut salary = sample_salary();
            salary.variance = vec![period(1, 100.0, 10.0), period(boundary, 200.0, 20.0)];

            let breakdown = salary_breakdown_for_year(&salary, year);
            let expected = if year < boundary { 100.0 } else { 200.0 };
            prop_assert!((breakdown.pre_tax_amount - expected).abs() <= EPS);
        }
    }
}
