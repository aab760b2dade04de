use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    AnnualSnapshot, BalanceKind, Category, DEFAULT_FREQUENCY, MIN_YEARS, ProjectionError,
    ProjectionInput, Record, Salary, SalaryBreakdown, Scope, VariancePeriod, clamp_years,
    ensure_runnable, project, salary_breakdown_for_year, validate_variance_order,
};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_COUNTRY: &str = "US";
pub const DEFAULT_INVEST_PERCENT: f64 = 60.0;
pub const DEFAULT_INFLATION: f64 = 7.0;
pub const DEFAULT_INDEX_RETURN: f64 = 7.0;
pub const DEFAULT_TAX_PERCENT: f64 = 30.0;
const DEFAULT_SALARY_TITLE: &str = "Job";
const MAX_FREQUENCY: f64 = 12.0;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Projection(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<String> for ApiError {
    fn from(msg: String) -> Self {
        ApiError::InvalidPayload(msg)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiBalanceKind {
    #[serde(alias = "Income", alias = "INCOME")]
    Income,
    #[serde(alias = "Expense", alias = "EXPENSE")]
    Expense,
}

impl From<ApiBalanceKind> for BalanceKind {
    fn from(value: ApiBalanceKind) -> Self {
        match value {
            ApiBalanceKind::Income => BalanceKind::Income,
            ApiBalanceKind::Expense => BalanceKind::Expense,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Deserialize)]
enum ApiScope {
    #[default]
    #[serde(
        rename = "perCat",
        alias = "per-category",
        alias = "per_category",
        alias = "perCategory"
    )]
    PerCategory,
    #[serde(
        rename = "perRec",
        alias = "per-record",
        alias = "per_record",
        alias = "perRecord"
    )]
    PerRecord,
}

impl From<ApiScope> for Scope {
    fn from(value: ApiScope) -> Self {
        match value {
            ApiScope::PerCategory => Scope::PerCategory,
            ApiScope::PerRecord => Scope::PerRecord,
        }
    }
}

/// Per-user simulation defaults applied to anything the request leaves out.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub currency: String,
    pub country: String,
    pub inflation: f64,
    pub invest_percent: f64,
    pub index_return_percent: f64,
    pub tax_percent: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            inflation: DEFAULT_INFLATION,
            invest_percent: DEFAULT_INVEST_PERCENT,
            index_return_percent: DEFAULT_INDEX_RETURN,
            tax_percent: DEFAULT_TAX_PERCENT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SettingsPayload {
    currency: Option<String>,
    country: Option<String>,
    inflation: Option<f64>,
    invest_perc: Option<f64>,
    index_return: Option<f64>,
    tax_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordPayload {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    amount: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(rename = "type")]
    kind: ApiBalanceKind,
    #[serde(default)]
    infl_enabled: bool,
    #[serde(default)]
    inflation: Option<f64>,
    #[serde(default)]
    frequency: Option<f64>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryPayload {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    title: String,
    budget: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(rename = "type")]
    kind: ApiBalanceKind,
    #[serde(default)]
    infl_enabled: bool,
    #[serde(default)]
    infl_type: ApiScope,
    #[serde(default)]
    infl_val: Option<f64>,
    #[serde(default)]
    freq_type: ApiScope,
    #[serde(default)]
    frequency: Option<f64>,
    #[serde(default)]
    records: Vec<RecordPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodPayload {
    #[serde(default)]
    id: Option<u64>,
    from: u32,
    amount: f64,
    tax_percent: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalaryPayload {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    amount: f64,
    #[serde(default)]
    tax_type: ApiScope,
    #[serde(default)]
    tax_percent: Option<f64>,
    #[serde(default)]
    variance: Vec<PeriodPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatePayload {
    categories: Vec<CategoryPayload>,
    salaries: Vec<SalaryPayload>,
    years: Option<i64>,
    settings: SettingsPayload,
}

impl SimulatePayload {
    pub fn override_years(&mut self, years: i64) {
        self.years = Some(years);
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalaryBreakdownPayload {
    salary: SalaryPayload,
    year: u32,
    #[serde(default)]
    settings: SettingsPayload,
}

#[derive(Debug)]
struct ApiRequest {
    input: ProjectionInput,
    settings: SimulationSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub years: u32,
    pub invest_perc: f64,
    pub index_return: f64,
    pub final_net_worth: f64,
    pub annual_incomes_expenses: Vec<AnnualSnapshot>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn require_finite(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("{field} must be a finite number"));
    }
    Ok(())
}

fn require_positive(field: &str, value: f64) -> Result<(), String> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(format!("{field} must be > 0"));
    }
    Ok(())
}

fn require_percentage(field: &str, value: f64) -> Result<(), String> {
    require_finite(field, value)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(format!("{field} must be between 0 and 100"));
    }
    Ok(())
}

fn require_frequency(field: &str, value: f64) -> Result<(), String> {
    require_finite(field, value)?;
    if value <= 0.0 || value > MAX_FREQUENCY {
        return Err(format!("{field} must be > 0 and <= {MAX_FREQUENCY}"));
    }
    Ok(())
}

fn build_settings(payload: SettingsPayload) -> Result<SimulationSettings, String> {
    let defaults = SimulationSettings::default();
    let settings = SimulationSettings {
        currency: payload.currency.unwrap_or(defaults.currency),
        country: payload.country.unwrap_or(defaults.country),
        inflation: payload.inflation.unwrap_or(defaults.inflation),
        invest_percent: payload.invest_perc.unwrap_or(defaults.invest_percent),
        index_return_percent: payload.index_return.unwrap_or(defaults.index_return_percent),
        tax_percent: payload.tax_percent.unwrap_or(defaults.tax_percent),
    };

    require_percentage("settings.inflation", settings.inflation)?;
    require_percentage("settings.investPerc", settings.invest_percent)?;
    require_finite("settings.indexReturn", settings.index_return_percent)?;
    if settings.index_return_percent < 0.0 {
        return Err("settings.indexReturn must be >= 0".to_string());
    }
    require_percentage("settings.taxPercent", settings.tax_percent)?;

    Ok(settings)
}

fn build_record(
    payload: RecordPayload,
    field: &str,
    settings: &SimulationSettings,
) -> Result<Record, String> {
    let record = Record {
        id: payload.id,
        title: payload.title.unwrap_or_default(),
        amount: payload.amount,
        currency: payload.currency.unwrap_or_else(|| settings.currency.clone()),
        kind: payload.kind.into(),
        inflation_enabled: payload.infl_enabled,
        inflation: payload.inflation.unwrap_or(settings.inflation),
        frequency: payload.frequency.unwrap_or(DEFAULT_FREQUENCY),
        country: payload.country.unwrap_or_else(|| settings.country.clone()),
    };

    require_positive(&format!("{field}.amount"), record.amount)?;
    require_percentage(&format!("{field}.inflation"), record.inflation)?;
    require_frequency(&format!("{field}.frequency"), record.frequency)?;

    Ok(record)
}

fn build_category(
    payload: CategoryPayload,
    field: &str,
    settings: &SimulationSettings,
) -> Result<Category, String> {
    if payload.title.trim().is_empty() {
        return Err(format!("{field}.title cannot be empty"));
    }

    let records = payload
        .records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| build_record(record, &format!("{field}.records[{idx}]"), settings))
        .collect::<Result<Vec<_>, _>>()?;

    let category = Category {
        id: payload.id,
        title: payload.title,
        budget: payload.budget,
        currency: payload.currency.unwrap_or_else(|| settings.currency.clone()),
        kind: payload.kind.into(),
        inflation_enabled: payload.infl_enabled,
        inflation_type: payload.infl_type.into(),
        inflation_value: payload.infl_val.unwrap_or(settings.inflation),
        frequency_type: payload.freq_type.into(),
        frequency: payload.frequency.unwrap_or(DEFAULT_FREQUENCY),
        records,
    };

    require_positive(&format!("{field}.budget"), category.budget)?;
    require_percentage(&format!("{field}.inflVal"), category.inflation_value)?;
    require_frequency(&format!("{field}.frequency"), category.frequency)?;

    Ok(category)
}

fn build_salary(
    payload: SalaryPayload,
    field: &str,
    settings: &SimulationSettings,
) -> Result<Salary, String> {
    let mut variance = Vec::with_capacity(payload.variance.len());
    for (idx, period) in payload.variance.into_iter().enumerate() {
        let period_field = format!("{field}.variance[{idx}]");
        if period.from == 0 {
            return Err(format!("{period_field}.from must be > 0"));
        }
        require_positive(&format!("{period_field}.amount"), period.amount)?;
        require_percentage(&format!("{period_field}.taxPercent"), period.tax_percent)?;
        variance.push(VariancePeriod {
            id: period.id,
            from: period.from,
            amount: period.amount,
            tax_percent: period.tax_percent,
        });
    }

    let salary = Salary {
        id: payload.id,
        title: payload
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_SALARY_TITLE.to_string()),
        amount: payload.amount,
        currency: payload.currency.unwrap_or_else(|| settings.currency.clone()),
        tax_type: payload.tax_type.into(),
        tax_percent: payload.tax_percent.unwrap_or(settings.tax_percent),
        variance,
    };

    require_positive(&format!("{field}.amount"), salary.amount)?;
    require_percentage(&format!("{field}.taxPercent"), salary.tax_percent)?;

    Ok(salary)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let settings = build_settings(payload.settings)?;

    let categories = payload
        .categories
        .into_iter()
        .enumerate()
        .map(|(idx, category)| build_category(category, &format!("categories[{idx}]"), &settings))
        .collect::<Result<Vec<_>, _>>()?;
    let salaries = payload
        .salaries
        .into_iter()
        .enumerate()
        .map(|(idx, salary)| build_salary(salary, &format!("salaries[{idx}]"), &settings))
        .collect::<Result<Vec<_>, _>>()?;

    let input = ProjectionInput {
        categories,
        salaries,
        years: payload.years.unwrap_or(i64::from(MIN_YEARS)),
        invest_percent: settings.invest_percent,
        index_return_percent: settings.index_return_percent,
    };

    Ok(ApiRequest { input, settings })
}

pub fn parse_payload(json: &str) -> Result<SimulatePayload, ApiError> {
    serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| ApiError::InvalidPayload(format!("Invalid API JSON payload: {e}")))
}

/// Validates the payload and runs one projection, refusing requests without
/// any category or salary.
pub fn simulate(payload: SimulatePayload) -> Result<SimulateResponse, ApiError> {
    let request = api_request_from_payload(payload)?;
    ensure_runnable(&request.input)?;

    let result = project(&request.input)?;
    Ok(SimulateResponse {
        years: clamp_years(request.input.years),
        invest_perc: request.settings.invest_percent,
        index_return: request.settings.index_return_percent,
        final_net_worth: result.final_net_worth,
        annual_incomes_expenses: result.annual_snapshots,
    })
}

fn salary_breakdown_from_payload(payload: SalaryBreakdownPayload) -> Result<SalaryBreakdown, ApiError> {
    if payload.year == 0 {
        return Err(ApiError::InvalidPayload("year must be > 0".to_string()));
    }
    let settings = build_settings(payload.settings)?;
    let salary = build_salary(payload.salary, "salary", &settings)?;
    validate_variance_order(std::slice::from_ref(&salary))?;

    Ok(salary_breakdown_for_year(&salary, payload.year))
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/simulate", post(simulate_handler))
        .route("/api/salary-breakdown", post(salary_breakdown_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "net worth HTTP API listening");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_handler(Json(payload): Json<SimulatePayload>) -> Response {
    info!(
        categories = payload.categories.len(),
        salaries = payload.salaries.len(),
        years = ?payload.years,
        "simulate request"
    );
    match simulate(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => rejection(err),
    }
}

async fn salary_breakdown_handler(Json(payload): Json<SalaryBreakdownPayload>) -> Response {
    info!(year = payload.year, "salary breakdown request");
    match salary_breakdown_from_payload(payload) {
        Ok(breakdown) => json_response(StatusCode::OK, breakdown),
        Err(err) => rejection(err),
    }
}

fn rejection(err: ApiError) -> Response {
    let status = err.status();
    warn!(%status, error = %err, "rejected request");
    error_response(status, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
