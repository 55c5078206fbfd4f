//! Policy underwriting and premium collection

use chrono::{Months, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};

use super::pricing::{premium, recent_claim_count, risk_multiplier, sum_insured};
use super::triggers::{default_weather_triggers, default_yield_triggers};
use crate::context::Context;
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::model::{
    Amount, CoverageType, InsurancePolicy, PolicyPeriod, PolicyStatus, PremiumPayment, SeasonType,
};
use crate::ports::Account;

/// Terms a farmer asks to insure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRequest {
    pub farmer_id: String,
    #[serde(default)]
    pub loan_id: Option<String>,
    pub crop_type: String,
    /// Defaults to the season of the sowing date
    #[serde(default)]
    pub season: Option<SeasonType>,
    /// Acres sown
    pub sowing_area: f64,
    pub sowing_date: NaiveDate,
    /// Defaults to sowing date plus the crop's growing period
    #[serde(default)]
    pub harvest_date: Option<NaiveDate>,
    pub coverage: CoverageType,
}

/// Price and write the terms of a policy without storing it
///
/// Leaves every collaborator untouched. The quote carries no id until
/// [`assign_policy_id`] numbers it at commit time, so an abandoned quote
/// never uses up a policy number.
pub fn quote_policy(ctx: &Context, request: &PolicyRequest) -> EngineResult<InsurancePolicy> {
    let crop_type = request.crop_type.trim().to_ascii_uppercase();
    if crop_type.is_empty() {
        return Err(EngineError::Validation("crop type is required".to_string()));
    }

    let basic = ctx
        .profiles
        .basic_info(&request.farmer_id)
        .ok_or_else(|| EngineError::not_found("farmer", &request.farmer_id))?;

    if !request.sowing_area.is_finite() || request.sowing_area <= 0.0 {
        return Err(EngineError::Validation(format!(
            "sowing area must be positive, got {}",
            request.sowing_area
        )));
    }
    if request.sowing_area > basic.total_land_area {
        return Err(EngineError::Validation(format!(
            "sowing area {} exceeds farmer's land area {}",
            request.sowing_area, basic.total_land_area
        )));
    }

    let harvest_date = match request.harvest_date {
        Some(date) => date,
        None => request
            .sowing_date
            .checked_add_months(Months::new(ctx.crops.growing_months(&crop_type)))
            .ok_or_else(|| EngineError::Validation("harvest date out of range".to_string()))?,
    };
    if harvest_date <= request.sowing_date {
        return Err(EngineError::Validation(format!(
            "harvest date {} must follow sowing date {}",
            harvest_date, request.sowing_date
        )));
    }

    let sum_insured = sum_insured(ctx.config, ctx.crops, &crop_type, request.sowing_area);
    if sum_insured == 0 {
        return Err(EngineError::Validation(format!(
            "no insurable value for {} acres of {}",
            request.sowing_area, crop_type
        )));
    }

    let profile = ctx.profiles.profile(&request.farmer_id);
    let recent_claims = recent_claim_count(&ctx.records.claims_for_farmer(&request.farmer_id), ctx.today);
    let multiplier = risk_multiplier(ctx.crops, profile.weather_risk.as_ref(), &crop_type, recent_claims);
    let premium = premium(ctx.config, sum_insured, multiplier, basic.total_land_area);

    let season = request
        .season
        .unwrap_or_else(|| SeasonType::for_date(request.sowing_date));

    let weather_triggers = if request.coverage.covers_weather() {
        default_weather_triggers(ctx.crops, &crop_type, season)
    } else {
        Vec::new()
    };
    let yield_triggers = if request.coverage.covers_yield() {
        let average = profile
            .average_yield(&crop_type)
            .or_else(|| ctx.crops.average_yield(&crop_type));
        default_yield_triggers(average)
    } else {
        Vec::new()
    };

    Ok(InsurancePolicy {
        id: String::new(),
        farmer_id: request.farmer_id.clone(),
        loan_id: request.loan_id.clone(),
        crop_type,
        season,
        sowing_area: request.sowing_area,
        sowing_date: request.sowing_date,
        weather_station: basic.weather_station,
        sum_insured,
        premium,
        coverage: request.coverage,
        weather_triggers,
        yield_triggers,
        period: PolicyPeriod {
            start: request.sowing_date,
            end: harvest_date,
        },
        status: PolicyStatus::Active,
        claims: Vec::new(),
        premiums_paid: Vec::new(),
        created_on: ctx.today,
    })
}

/// Number a quoted policy just before it is stored
pub(crate) fn assign_policy_id(ctx: &mut Context, policy: &mut InsurancePolicy) {
    let sequence = ctx.records.next_sequence("policy");
    policy.id = format!("POL-{}-{}-{}", policy.farmer_id, policy.crop_type, sequence);
}

pub(crate) fn policy_created(policy: &InsurancePolicy) -> EngineEvent {
    EngineEvent::PolicyCreated {
        policy_id: policy.id.clone(),
        farmer_id: policy.farmer_id.clone(),
        crop_type: policy.crop_type.clone(),
        sum_insured: policy.sum_insured,
        premium: policy.premium,
    }
}

/// Underwrite and store a new active policy
pub fn create_policy(ctx: &mut Context, request: &PolicyRequest) -> EngineResult<InsurancePolicy> {
    let mut policy = quote_policy(ctx, request)?;
    assign_policy_id(ctx, &mut policy);

    ctx.records.put_policy(policy.clone());
    info!(
        "Created policy {} for {}: sum insured {}, premium {}",
        policy.id, policy.farmer_id, policy.sum_insured, policy.premium
    );
    ctx.emit(policy_created(&policy));

    Ok(policy)
}

/// Collect a premium instalment from the farmer into the insurance pool
pub fn pay_premium(ctx: &mut Context, policy_id: &str, amount: Amount) -> EngineResult<InsurancePolicy> {
    if amount == 0 {
        return Err(EngineError::Validation("premium amount must be positive".to_string()));
    }

    let mut policy = ctx
        .records
        .policy(policy_id)
        .ok_or_else(|| EngineError::not_found("policy", policy_id))?;
    if policy.status != PolicyStatus::Active {
        return Err(EngineError::invalid_state("policy", policy_id, policy.status, PolicyStatus::Active));
    }
    let outstanding = policy.premium_outstanding();
    if amount > outstanding {
        return Err(EngineError::Validation(format!(
            "premium payment {} exceeds outstanding premium {}",
            amount, outstanding
        )));
    }

    let payer = Account::Farmer(policy.farmer_id.clone());
    let pool = ctx.insurance_pool();
    ctx.ledger.transfer(&payer, &pool, amount)?;

    policy.premiums_paid.push(PremiumPayment {
        amount,
        paid_on: ctx.today,
    });
    ctx.records.put_policy(policy.clone());
    info!("Premium {} received for policy {}", amount, policy.id);
    ctx.emit(EngineEvent::PremiumPaid {
        policy_id: policy.id.clone(),
        amount,
    });

    Ok(policy)
}
