use serde::Serialize;

pub const MIN_YEARS: u32 = 1;
pub const MAX_YEARS: u32 = 200;
/// Yearly occurrences assumed when a category delegates frequency to its records
/// but has none.
pub const DEFAULT_FREQUENCY: f64 = 12.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceKind {
    Income,
    Expense,
}

/// Whether a setting is taken from the owning category or from each record.
/// Salaries reuse it for their tax type: `PerCategory` is a flat tax rate,
/// `PerRecord` lets variance periods override it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Scope {
    #[serde(rename = "perCat")]
    PerCategory,
    #[serde(rename = "perRec")]
    PerRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Option<u64>,
    pub title: String,
    pub amount: f64,
    pub currency: String,
    pub kind: BalanceKind,
    pub inflation_enabled: bool,
    pub inflation: f64,
    pub frequency: f64,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Option<u64>,
    pub title: String,
    pub budget: f64,
    pub currency: String,
    pub kind: BalanceKind,
    pub inflation_enabled: bool,
    pub inflation_type: Scope,
    pub inflation_value: f64,
    pub frequency_type: Scope,
    pub frequency: f64,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariancePeriod {
    pub id: Option<u64>,
    /// First year (1-based, inclusive) the period applies to.
    pub from: u32,
    pub amount: f64,
    pub tax_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Salary {
    pub id: Option<u64>,
    pub title: String,
    pub amount: f64,
    pub currency: String,
    pub tax_type: Scope,
    pub tax_percent: f64,
    pub variance: Vec<VariancePeriod>,
}

#[derive(Debug, Clone)]
pub struct ProjectionInput {
    pub categories: Vec<Category>,
    pub salaries: Vec<Salary>,
    /// Raw requested horizon; clamped to `MIN_YEARS..=MAX_YEARS` by the projector.
    pub years: i64,
    pub invest_percent: f64,
    pub index_return_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalaryBreakdown {
    #[serde(rename = "amountBefTax")]
    pub pre_tax_amount: f64,
    #[serde(rename = "amountAftTax")]
    pub post_tax_amount: f64,
    #[serde(rename = "taxPercent")]
    pub effective_tax_percent: f64,
}

/// One category's balance for a year: a bare number for budget-level categories,
/// one number per record (index-aligned with `Category::records`) otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryBalance {
    Flat(f64),
    PerRecord(Vec<f64>),
}

impl CategoryBalance {
    pub fn total(&self) -> f64 {
        match self {
            CategoryBalance::Flat(value) => *value,
            CategoryBalance::PerRecord(values) => values.iter().sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualSnapshot {
    pub total_income: f64,
    pub total_expense: f64,
    #[serde(rename = "categoriesIncomesExpenses")]
    pub category_balances: Vec<CategoryBalance>,
    pub salary_breakdowns: Vec<SalaryBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub final_net_worth: f64,
    #[serde(rename = "annualIncomesExpenses")]
    pub annual_snapshots: Vec<AnnualSnapshot>,
}
