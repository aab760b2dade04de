mod engine;
mod error;
mod salary;
mod types;

pub use engine::{clamp_years, ensure_runnable, project};
pub use error::{MissingInput, ProjectionError};
pub use salary::{salary_breakdown_for_year, validate_variance_order};
pub use types::{
    AnnualSnapshot, BalanceKind, Category, CategoryBalance, DEFAULT_FREQUENCY, MAX_YEARS,
    MIN_YEARS, ProjectionInput, ProjectionResult, Record, Salary, SalaryBreakdown, Scope,
    VariancePeriod,
};
