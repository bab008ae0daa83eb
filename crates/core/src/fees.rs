//! Integer-cent fee breakdown.
//!
//! Fee *policy* lives outside the financial core; this module only turns an
//! already-configured set of cent/basis-point values into the concrete cent
//! amounts a charge posting consumes. All arithmetic is integer cents,
//! rounding down in the guest's favor.

use serde::{Deserialize, Serialize};

use pinewood_shared::config::FeeSettings;
use pinewood_shared::types::Cents;

/// Whether a fee is absorbed out of the base amount or added on top of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeMode {
    /// The fee comes out of the base amount; the guest pays the base only.
    #[default]
    Absorb,
    /// The fee is added to the charge; the guest pays base + fee.
    PassThrough,
}

/// Resolved fee configuration for one charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Flat platform fee in cents.
    pub platform_fee_cents: i64,
    /// Percentage platform fee in basis points.
    pub platform_fee_bps: i64,
    /// How the platform fee is charged.
    pub platform_fee_mode: FeeMode,
    /// Percentage gateway fee in basis points.
    pub gateway_fee_bps: i64,
    /// Flat gateway fee in cents.
    pub gateway_fee_cents: i64,
    /// How the gateway fee is charged.
    pub gateway_fee_mode: FeeMode,
}

impl From<&FeeSettings> for FeeConfig {
    fn from(settings: &FeeSettings) -> Self {
        Self {
            platform_fee_cents: settings.platform_fee_cents,
            platform_fee_bps: settings.platform_fee_bps,
            platform_fee_mode: FeeMode::Absorb,
            gateway_fee_bps: settings.gateway_fee_bps,
            gateway_fee_cents: settings.gateway_fee_cents,
            gateway_fee_mode: FeeMode::Absorb,
        }
    }
}

/// The concrete cent amounts for one charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// The base (lodging) amount in cents.
    pub base_amount: Cents,
    /// Platform fee in cents.
    pub platform_fee: Cents,
    /// Gateway processing fee in cents.
    pub gateway_fee: Cents,
    /// Gateway fee passed through to the guest, in cents (zero when
    /// absorbed).
    pub gateway_fee_passed: Cents,
    /// The total the guest is charged.
    pub charge_total: Cents,
}

fn bps_of(amount: i64, bps: i64) -> i64 {
    amount.saturating_mul(bps) / 10_000
}

/// Calculates the fee breakdown for a base charge amount.
#[must_use]
pub fn calculate_fees(base_amount: Cents, config: &FeeConfig) -> FeeBreakdown {
    let base = base_amount.into_inner();

    let platform_fee = config.platform_fee_cents + bps_of(base, config.platform_fee_bps);
    let gateway_fee = config.gateway_fee_cents + bps_of(base, config.gateway_fee_bps);

    let mut charge_total = base;
    if config.platform_fee_mode == FeeMode::PassThrough {
        charge_total += platform_fee;
    }
    let gateway_fee_passed = if config.gateway_fee_mode == FeeMode::PassThrough {
        charge_total += gateway_fee;
        gateway_fee
    } else {
        0
    };

    FeeBreakdown {
        base_amount,
        platform_fee: Cents::new(platform_fee),
        gateway_fee: Cents::new(gateway_fee),
        gateway_fee_passed: Cents::new(gateway_fee_passed),
        charge_total: Cents::new(charge_total),
    }
}
