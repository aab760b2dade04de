use tracing::{debug, warn};

use super::error::{MissingInput, ProjectionError};
use super::salary::{salary_breakdown_for_year, validate_variance_order};
use super::types::{
    AnnualSnapshot, BalanceKind, Category, CategoryBalance, DEFAULT_FREQUENCY, MAX_YEARS,
    MIN_YEARS, ProjectionInput, ProjectionResult, Record, Scope,
};

#[derive(Clone, Copy, Debug)]
enum Growth {
    Flat,
    Inflating { percent: f64, previous: Option<f64> },
}

#[derive(Debug, Default)]
struct YearTotals {
    income: f64,
    expense: f64,
}

impl YearTotals {
    fn add(&mut self, kind: BalanceKind, balance: f64) {
        match kind {
            BalanceKind::Income => self.income += balance,
            BalanceKind::Expense => self.expense += balance,
        }
    }
}

/// Compounding index-fund position carried across years.
#[derive(Debug, Default)]
struct InvestmentLedger {
    total_invested: f64,
}

impl InvestmentLedger {
    /// Invests a share of this year's net income, applies the index return to the
    /// whole position and returns the year's net worth (uninvested income plus return).
    fn close_year(
        &mut self,
        net_income: f64,
        invest_percent: f64,
        index_return_percent: f64,
    ) -> f64 {
        let investment = net_income * rate(invest_percent);
        let invested = self.total_invested + investment;
        let investment_return = invested * rate(index_return_percent);
        self.total_invested = invested + investment_return;

        net_income - investment + investment_return
    }
}

fn rate(percent: f64) -> f64 {
    percent / 100.0
}

pub fn clamp_years(requested: i64) -> u32 {
    requested.clamp(MIN_YEARS as i64, MAX_YEARS as i64) as u32
}

/// Boundary check: a projection without any category or any salary is not worth running.
pub fn ensure_runnable(input: &ProjectionInput) -> Result<(), ProjectionError> {
    let missing = match (input.categories.is_empty(), input.salaries.is_empty()) {
        (true, true) => MissingInput::Both,
        (true, false) => MissingInput::Categories,
        (false, true) => MissingInput::Salaries,
        (false, false) => return Ok(()),
    };
    Err(ProjectionError::DegenerateInput(missing))
}

/// Projects income, expenses and net worth over the (clamped) number of years.
///
/// Empty category or salary lists simply contribute nothing; callers that want to
/// refuse such input run [`ensure_runnable`] first.
pub fn project(input: &ProjectionInput) -> Result<ProjectionResult, ProjectionError> {
    validate_variance_order(&input.salaries)?;

    let years = clamp_years(input.years);
    if i64::from(years) != input.years {
        warn!(requested = input.years, years, "clamped projection horizon");
    }
    debug!(
        categories = input.categories.len(),
        salaries = input.salaries.len(),
        years,
        "running net worth projection"
    );

    let mut ledger = InvestmentLedger::default();
    let mut final_net_worth = 0.0;
    let mut annual_snapshots: Vec<AnnualSnapshot> = Vec::with_capacity(years as usize);

    for year in 1..=years {
        let snapshot = project_year(input, year, annual_snapshots.last());
        let net_income = snapshot.total_income - snapshot.total_expense;
        final_net_worth =
            ledger.close_year(net_income, input.invest_percent, input.index_return_percent);
        annual_snapshots.push(snapshot);
    }

    Ok(ProjectionResult {
        final_net_worth,
        annual_snapshots,
    })
}

fn project_year(
    input: &ProjectionInput,
    year: u32,
    previous: Option<&AnnualSnapshot>,
) -> AnnualSnapshot {
    let mut totals = YearTotals::default();

    let category_balances = input
        .categories
        .iter()
        .enumerate()
        .map(|(idx, category)| {
            let previous_balance = previous.and_then(|snapshot| snapshot.category_balances.get(idx));
            category_balance(category, year, previous_balance, &mut totals)
        })
        .collect::<Vec<_>>();

    let salary_breakdowns = input
        .salaries
        .iter()
        .map(|salary| {
            let breakdown = salary_breakdown_for_year(salary, year);
            totals.add(BalanceKind::Income, breakdown.post_tax_amount);
            breakdown
        })
        .collect::<Vec<_>>();

    AnnualSnapshot {
        total_income: totals.income,
        total_expense: totals.expense,
        category_balances,
        salary_breakdowns,
    }
}

fn category_balance(
    category: &Category,
    year: u32,
    previous: Option<&CategoryBalance>,
    totals: &mut YearTotals,
) -> CategoryBalance {
    if category.records.is_empty() {
        let balance = budget_balance(category, year, previous);
        totals.add(category.kind, balance);
        return CategoryBalance::Flat(balance);
    }

    let previous_records = match previous {
        Some(CategoryBalance::PerRecord(values)) => values.as_slice(),
        _ => &[],
    };
    let balances = category
        .records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let balance = record_balance(category, record, year, previous_records.get(idx).copied());
            totals.add(record.kind, balance);
            balance
        })
        .collect();
    CategoryBalance::PerRecord(balances)
}

fn budget_balance(category: &Category, year: u32, previous: Option<&CategoryBalance>) -> f64 {
    let frequency = match category.frequency_type {
        Scope::PerCategory => category.frequency,
        Scope::PerRecord => DEFAULT_FREQUENCY,
    };
    let growth = if category.kind == BalanceKind::Expense && category.inflation_enabled {
        Growth::Inflating {
            percent: category.inflation_value,
            previous: match previous {
                Some(CategoryBalance::Flat(value)) => Some(*value),
                _ => None,
            },
        }
    } else {
        Growth::Flat
    };
    annual_balance(category.budget, frequency, year, growth)
}

fn record_balance(category: &Category, record: &Record, year: u32, previous: Option<f64>) -> f64 {
    let frequency = match category.frequency_type {
        Scope::PerRecord => record.frequency,
        Scope::PerCategory => category.frequency,
    };
    let inflates =
        category.inflation_enabled && record.kind == BalanceKind::Expense && record.inflation_enabled;
    let growth = if inflates {
        let percent = match category.inflation_type {
            Scope::PerRecord => record.inflation,
            Scope::PerCategory => category.inflation_value,
        };
        Growth::Inflating { percent, previous }
    } else {
        Growth::Flat
    };
    annual_balance(record.amount, frequency, year, growth)
}

/// Flat balances annualize the amount every year. Inflating balances annualize once
/// in year 1 and afterwards only grow the previous year's balance by the inflation rate.
fn annual_balance(amount: f64, frequency: f64, year: u32, growth: Growth) -> f64 {
    match growth {
        Growth::Flat => amount * frequency,
        Growth::Inflating { percent, previous } => {
            let base = if year == 1 {
                amount * frequency
            } else {
                previous.unwrap_or(amount)
            };
            base * (1.0 + rate(percent))
        }
    }
}
