//! Weather index derivatives

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::epoch::EpochReport;
use crate::context::Context;
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::model::{
    truncate_amount, Amount, DerivativeDirection, DerivativePayout, DerivativePayoutStructure,
    DerivativeStatus, PolicyPeriod, WeatherDerivative, WeatherIndex,
};
use crate::ports::Account;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivativeRequest {
    pub holder_id: String,
    pub index: WeatherIndex,
    pub station: String,
    pub strike: f64,
    pub payout_structure: DerivativePayoutStructure,
    pub max_payout: Amount,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Payout for a realized index value: ticks beyond strike × tick value, capped
pub fn derivative_payout(derivative: &WeatherDerivative, realized: f64) -> Amount {
    if !realized.is_finite() {
        return 0;
    }
    let ticks = match derivative.payout_structure.direction {
        DerivativeDirection::Put => derivative.strike - realized,
        DerivativeDirection::Call => realized - derivative.strike,
    };
    if ticks <= 0.0 {
        return 0;
    }
    truncate_amount(ticks * derivative.payout_structure.tick_value as f64).min(derivative.max_payout)
}

/// Write a derivative and collect its premium from the holder
pub fn create_derivative(ctx: &mut Context, request: &DerivativeRequest) -> EngineResult<WeatherDerivative> {
    if request.max_payout == 0 {
        return Err(EngineError::Validation("max payout must be positive".to_string()));
    }
    if request.payout_structure.tick_value == 0 {
        return Err(EngineError::Validation("tick value must be positive".to_string()));
    }
    if !request.strike.is_finite() {
        return Err(EngineError::Validation(format!("invalid strike {}", request.strike)));
    }
    if request.end <= request.start {
        return Err(EngineError::Validation(format!(
            "contract period end {} must follow start {}",
            request.end, request.start
        )));
    }
    if request.station.trim().is_empty() {
        return Err(EngineError::Validation("weather station is required".to_string()));
    }
    if ctx.profiles.basic_info(&request.holder_id).is_none() {
        return Err(EngineError::not_found("farmer", &request.holder_id));
    }

    let premium = truncate_amount(request.max_payout as f64 * ctx.config.derivative_premium_rate);
    let holder = Account::Farmer(request.holder_id.clone());
    let pool = ctx.insurance_pool();
    if premium > 0 {
        ctx.ledger.transfer(&holder, &pool, premium)?;
    }

    let sequence = ctx.records.next_sequence("derivative");
    let derivative = WeatherDerivative {
        id: format!("WD-{}-{}", request.holder_id, sequence),
        holder_id: request.holder_id.clone(),
        index: request.index,
        station: request.station.clone(),
        strike: request.strike,
        payout_structure: request.payout_structure,
        premium,
        max_payout: request.max_payout,
        period: PolicyPeriod {
            start: request.start,
            end: request.end,
        },
        status: DerivativeStatus::Active,
        settlements: Vec::new(),
        created_on: ctx.today,
    };

    ctx.records.put_derivative(derivative.clone());
    info!(
        "Created derivative {} for {}: premium {}, max payout {}",
        derivative.id, derivative.holder_id, premium, derivative.max_payout
    );
    ctx.emit(EngineEvent::DerivativeCreated {
        derivative_id: derivative.id.clone(),
        holder_id: derivative.holder_id.clone(),
        premium,
        max_payout: derivative.max_payout,
    });

    Ok(derivative)
}

/// Settle every active derivative whose period has ended
///
/// The realized index is the latest reading within the contract period.
/// In-the-money contracts pay and become settled; the rest expire. A
/// contract with no reading in its period stays active.
pub(crate) fn settle_derivatives(ctx: &mut Context, report: &mut EpochReport) {
    for mut derivative in ctx.records.active_derivatives() {
        if ctx.today <= derivative.period.end {
            continue;
        }

        let realized = ctx
            .weather
            .latest(&derivative.station, derivative.period.end)
            .filter(|s| s.observed_on >= derivative.period.start)
            .and_then(|s| derivative.index.value_from(&s));
        let Some(realized) = realized else {
            warn!(
                "No {:?} reading for station {} between {} and {}; derivative {} not settled",
                derivative.index,
                derivative.station,
                derivative.period.start,
                derivative.period.end,
                derivative.id
            );
            report.skipped_derivatives.push(derivative.id);
            continue;
        };

        let payout = derivative_payout(&derivative, realized);
        if payout == 0 {
            derivative.status = DerivativeStatus::Expired;
            ctx.records.put_derivative(derivative.clone());
            info!("Derivative {} expired at index {}", derivative.id, realized);
            ctx.emit(EngineEvent::DerivativeExpired {
                derivative_id: derivative.id.clone(),
                realized_index: realized,
            });
            report.expired_derivatives.push(derivative.id);
            continue;
        }

        let pool = ctx.insurance_pool();
        let holder = Account::Farmer(derivative.holder_id.clone());
        if let Err(e) = ctx.ledger.transfer(&pool, &holder, payout) {
            warn!("Derivative {} payout of {} failed: {}", derivative.id, payout, e);
            report.failed.push((derivative.id, e.to_string()));
            continue;
        }

        derivative.settlements.push(DerivativePayout {
            id: format!("{}-SETTLE", derivative.id),
            amount: payout,
            realized_index: realized,
            paid_on: ctx.today,
        });
        derivative.status = DerivativeStatus::Settled;
        ctx.records.put_derivative(derivative.clone());
        info!(
            "Settled derivative {}: paid {} to {} at index {}",
            derivative.id, payout, derivative.holder_id, realized
        );
        ctx.emit(EngineEvent::DerivativeSettled {
            derivative_id: derivative.id.clone(),
            holder_id: derivative.holder_id.clone(),
            amount: payout,
            realized_index: realized,
        });
        report.settled_derivatives.push(derivative.id);
    }
}
