//! Parametric crop insurance and weather derivatives

mod derivatives;
mod epoch;
mod policies;
pub mod pricing;
pub mod triggers;

pub use derivatives::{create_derivative, derivative_payout, DerivativeRequest};
pub use epoch::{run_epoch, EpochReport};
pub use policies::{create_policy, pay_premium, quote_policy, PolicyRequest};
pub(crate) use policies::{assign_policy_id, policy_created};
