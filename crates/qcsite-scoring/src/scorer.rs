//! Weighted additive warehouse-suitability scorer.
//!
//! Five independently capped factors, each read from the operator's
//! snapshot except competitor scarcity:
//!
//! | Factor              | Max | Bands                         |
//! |---------------------|-----|-------------------------------|
//! | Order volume        | 30  | `>500` 30, `>300` 20, `>100` 10 |
//! | Market share        | 25  | `>50%` 25, `>30%` 15, `>15%` 10 |
//! | Competitor scarcity | 20  | 0 available 20, 1 15, 2 10    |
//! | Order value         | 15  | `>400` 15, `>300` 10, `>200` 5  |
//! | Delivery efficiency | 10  | `<15` 10, `<20` 7, `<25` 5      |

use qcsite_core::ProviderSnapshot;

use crate::tier::RecommendationTier;
use crate::types::{ScoreFactors, SuitabilityResult};

const MAX_SCORE: u32 = 100;

/// Scores one location from the operator's snapshot and both competitors'.
///
/// Pure and total: zero or missing values contribute nothing, and the same
/// inputs always produce the same result. Relies on the snapshot invariant
/// that an unavailable service already reports zero orders and order value.
#[must_use]
pub fn score(
    own: &ProviderSnapshot,
    competitor_a: &ProviderSnapshot,
    competitor_b: &ProviderSnapshot,
) -> SuitabilityResult {
    let own_orders = own.estimated_orders();
    let total_market_orders = own_orders
        .saturating_add(competitor_a.estimated_orders())
        .saturating_add(competitor_b.estimated_orders());
    let market_share_percent = market_share(own_orders, total_market_orders);
    let competitor_count =
        u8::from(competitor_a.service_available()) + u8::from(competitor_b.service_available());

    let points = order_volume_points(own_orders)
        + market_share_points(market_share_percent)
        + competitor_scarcity_points(competitor_count)
        + order_value_points(own.average_order_value())
        + delivery_points(own.delivery_time_minutes());
    let warehouse_score = u8::try_from(points.min(MAX_SCORE)).unwrap_or(u8::MAX);

    SuitabilityResult {
        warehouse_score,
        market_share_percent,
        total_market_orders,
        competitor_count,
        recommendation_tier: RecommendationTier::from_score(warehouse_score),
        factors: ScoreFactors {
            order_volume: own_orders,
            market_share_percent,
            competitor_presence: competitor_count,
            order_value: own.average_order_value(),
            delivery_efficiency: own.delivery_time_minutes(),
        },
    }
}

#[allow(clippy::cast_precision_loss)]
fn market_share(own_orders: u64, total_market_orders: u64) -> f64 {
    if total_market_orders == 0 {
        return 0.0;
    }
    (own_orders as f64 / total_market_orders as f64 * 100.0).clamp(0.0, 100.0)
}

fn order_volume_points(orders: u64) -> u32 {
    match orders {
        o if o > 500 => 30,
        o if o > 300 => 20,
        o if o > 100 => 10,
        _ => 0,
    }
}

fn market_share_points(share: f64) -> u32 {
    if share > 50.0 {
        25
    } else if share > 30.0 {
        15
    } else if share > 15.0 {
        10
    } else {
        0
    }
}

fn competitor_scarcity_points(available_competitors: u8) -> u32 {
    match available_competitors {
        0 => 20,
        1 => 15,
        _ => 10,
    }
}

fn order_value_points(average_order_value: f64) -> u32 {
    if average_order_value > 400.0 {
        15
    } else if average_order_value > 300.0 {
        10
    } else if average_order_value > 200.0 {
        5
    } else {
        0
    }
}

fn delivery_points(minutes: f64) -> u32 {
    if minutes < 15.0 {
        10
    } else if minutes < 20.0 {
        7
    } else if minutes < 25.0 {
        5
    } else {
        0
    }
}

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;
