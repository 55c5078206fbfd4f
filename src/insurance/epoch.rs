//! Per-epoch trigger evaluation and claim settlement

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::derivatives::settle_derivatives;
use super::triggers::{weather_payout, yield_payout};
use crate::context::Context;
use crate::events::EngineEvent;
use crate::model::{
    Amount, ClaimStatus, InsuranceClaim, InsurancePolicy, PolicyStatus, TriggerRef, WeatherSnapshot,
};
use crate::ports::Account;

/// What one processing epoch did
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpochReport {
    pub processed_on: Option<NaiveDate>,
    pub policies_evaluated: usize,
    /// Claims paid this epoch
    pub claims: Vec<InsuranceClaim>,
    /// Policies with no weather snapshot for their station
    pub skipped_policies: Vec<String>,
    /// Contracts whose payout transfer failed, with the reason
    pub failed: Vec<(String, String)>,
    pub exhausted_policies: Vec<String>,
    pub expired_policies: Vec<String>,
    pub settled_derivatives: Vec<String>,
    pub expired_derivatives: Vec<String>,
    pub skipped_derivatives: Vec<String>,
}

impl EpochReport {
    pub fn total_claimed(&self) -> Amount {
        self.claims.iter().map(|c| c.amount).sum()
    }
}

/// Evaluate every active policy and settle every matured derivative
///
/// Safe to re-run for the same date: claims are keyed by policy, trigger
/// and measurement window, and a key that was already paid is skipped.
pub fn run_epoch(ctx: &mut Context) -> EpochReport {
    let mut report = EpochReport {
        processed_on: Some(ctx.today),
        ..Default::default()
    };

    for policy in ctx.records.active_policies() {
        process_policy(ctx, policy, &mut report);
    }
    settle_derivatives(ctx, &mut report);

    info!(
        "Epoch {}: {} policies, {} claims paid ({}), {} skipped, {} failed",
        ctx.today,
        report.policies_evaluated,
        report.claims.len(),
        report.total_claimed(),
        report.skipped_policies.len(),
        report.failed.len()
    );
    report
}

fn process_policy(ctx: &mut Context, mut policy: InsurancePolicy, report: &mut EpochReport) {
    let Some(snapshot) = ctx.weather.latest(&policy.weather_station, ctx.today) else {
        warn!(
            "No weather data for station {} on {}; skipping policy {}",
            policy.weather_station, ctx.today, policy.id
        );
        report.skipped_policies.push(policy.id);
        return;
    };
    report.policies_evaluated += 1;

    let mut claims = triggered_claims(&policy, &snapshot, ctx.today);

    if !claims.is_empty() {
        let total: Amount = claims.iter().map(|c| c.amount).sum();
        let pool = ctx.insurance_pool();
        let payee = Account::Farmer(policy.farmer_id.clone());
        if let Err(e) = ctx.ledger.transfer(&pool, &payee, total) {
            warn!("Claim payout of {} for policy {} failed: {}", total, policy.id, e);
            report.failed.push((policy.id, e.to_string()));
            return;
        }

        for claim in claims.iter_mut() {
            claim.status = ClaimStatus::Paid;
            claim.paid_on = Some(ctx.today);
        }
        policy.claims.extend(claims.iter().cloned());
    }

    if policy.remaining_cover() == 0 {
        policy.status = PolicyStatus::Exhausted;
        report.exhausted_policies.push(policy.id.clone());
    } else if ctx.today > policy.period.end {
        policy.status = PolicyStatus::Expired;
        report.expired_policies.push(policy.id.clone());
    }

    if claims.is_empty() && policy.status == PolicyStatus::Active {
        return;
    }

    ctx.records.put_policy(policy.clone());
    for claim in &claims {
        info!(
            "Paid claim {} of {} to {} ({})",
            claim.id,
            claim.amount,
            claim.farmer_id,
            claim.trigger.as_str()
        );
    }
    if policy.status != PolicyStatus::Active {
        info!("Policy {} is now {:?}", policy.id, policy.status);
    }
    ctx.emit_all(claims.iter().map(|c| EngineEvent::ClaimSettled {
        claim_id: c.id.clone(),
        policy_id: c.policy_id.clone(),
        farmer_id: c.farmer_id.clone(),
        trigger: c.trigger.as_str().to_string(),
        amount: c.amount,
    }));
    report.claims.extend(claims);
}

/// Claims the snapshot earns that have not been paid before
///
/// Instantaneous weather metrics are judged while their window is open.
/// Cumulative metrics are judged once the observation reaches the window
/// end. Yield triggers are judged when the snapshot reports a yield
/// observed on or after the policy start; harvest reports after the period
/// end still count for the policy's final evaluation. Each
/// payout is cut to the cover left after earlier claims.
fn triggered_claims(policy: &InsurancePolicy, snapshot: &WeatherSnapshot, today: NaiveDate) -> Vec<InsuranceClaim> {
    let mut remaining = policy.remaining_cover();
    let mut claims = Vec::new();

    let mut push = |trigger: TriggerRef, window_start: NaiveDate, payout: Amount| {
        let id = claim_id(&policy.id, trigger, window_start);
        if policy.has_claim(&id) {
            return;
        }
        let amount = payout.min(remaining);
        if amount == 0 {
            return;
        }
        remaining -= amount;
        claims.push(InsuranceClaim {
            id,
            policy_id: policy.id.clone(),
            farmer_id: policy.farmer_id.clone(),
            trigger,
            amount,
            snapshot: snapshot.clone(),
            status: ClaimStatus::AutoApproved,
            claimed_on: today,
            paid_on: None,
        });
    };

    if policy.coverage.covers_weather() {
        for trigger in &policy.weather_triggers {
            let window_start = trigger.window.start(policy.sowing_date);
            let window_end = trigger.window.end(policy.sowing_date);
            let observed = snapshot.observed_on;
            let in_scope = if trigger.metric.is_cumulative() {
                observed >= window_end
            } else {
                observed >= window_start && observed <= window_end
            };
            if !in_scope {
                continue;
            }

            if let Some(payout) = weather_payout(trigger, trigger.metric.value_from(snapshot)) {
                push(TriggerRef::Weather(trigger.kind), window_start, payout);
            }
        }
    }

    // yields reported before the period belong to an earlier crop
    let yield_in_scope = snapshot.observed_on >= policy.period.start;
    if policy.coverage.covers_yield() && yield_in_scope {
        if let Some(actual_yield) = snapshot.yield_per_area {
            for trigger in &policy.yield_triggers {
                if let Some(payout) = yield_payout(trigger, policy.sum_insured, actual_yield) {
                    push(TriggerRef::Yield(trigger.kind), policy.period.start, payout);
                }
            }
        }
    }

    claims
}

fn claim_id(policy_id: &str, trigger: TriggerRef, window_start: NaiveDate) -> String {
    format!(
        "CLM-{}-{}-{}",
        policy_id,
        trigger.as_str(),
        window_start.format("%Y%m%d")
    )
}
