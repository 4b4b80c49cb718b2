//! Usage-to-cost calculation from static model price tables

use crate::types::{ModelInfo, TokenUsage};

/// Effective per-million prices after tier selection
struct EffectivePrices {
    input: Option<f64>,
    output: Option<f64>,
    cache_writes: Option<f64>,
    cache_reads: Option<f64>,
}

/// Select the price set applying to a request of the given input size
///
/// Tiered pricing picks the first tier whose context-window bound is at
/// least the input token count; requests larger than every tier fall back
/// to the base prices.
fn effective_prices(info: &ModelInfo, input_tokens: u64) -> EffectivePrices {
    let tier = info
        .tiers
        .iter()
        .find(|tier| u64::from(tier.context_window) >= input_tokens);

    match tier {
        Some(tier) => EffectivePrices {
            input: tier.input_price.or(info.input_price),
            output: tier.output_price.or(info.output_price),
            cache_writes: tier.cache_writes_price.or(info.cache_writes_price),
            cache_reads: tier.cache_reads_price.or(info.cache_reads_price),
        },
        None => EffectivePrices {
            input: info.input_price,
            output: info.output_price,
            cache_writes: info.cache_writes_price,
            cache_reads: info.cache_reads_price,
        },
    }
}

/// Compute the monetary cost of one completed request
///
/// cost = uncached input + output (reasoning billed with output) +
/// cache writes + cache reads, each priced per million tokens. Cached
/// tokens are excluded from the input component. Returns `None` when the
/// model has no input or output price; absent cache prices bill those
/// tokens at zero.
#[allow(clippy::cast_precision_loss)]
pub fn calculate_cost(info: &ModelInfo, usage: &TokenUsage) -> Option<f64> {
    let prices = effective_prices(info, usage.input_tokens);

    let input_price = prices.input?;
    let output_price = prices.output?;

    let uncached_input = usage
        .input_tokens
        .saturating_sub(usage.cache_read_tokens + usage.cache_write_tokens);
    let billed_output = usage.output_tokens + usage.reasoning_tokens;

    let per_mtok = |tokens: u64, price: f64| (tokens as f64 / 1_000_000.0) * price;

    let mut cost = per_mtok(uncached_input, input_price) + per_mtok(billed_output, output_price);

    if usage.cache_write_tokens > 0 {
        cost += per_mtok(usage.cache_write_tokens, prices.cache_writes.unwrap_or(0.0));
    }
    if usage.cache_read_tokens > 0 {
        cost += per_mtok(usage.cache_read_tokens, prices.cache_reads.unwrap_or(0.0));
    }

    Some(cost)
}

#[cfg(test)]
mod tests {
    use crate::types::PriceTier;

    use super::*;

    fn priced_model() -> ModelInfo {
        ModelInfo {
            input_price: Some(1.25),
            output_price: Some(5.0),
            cache_reads_price: Some(0.3125),
            ..ModelInfo::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn plain_input_output_cost() {
        let usage = TokenUsage {
            input_tokens: 1000,
            output_tokens: 500,
            ..TokenUsage::default()
        };
        let cost = calculate_cost(&priced_model(), &usage).unwrap();
        assert!(close(cost, 0.00375), "{cost}");
    }

    #[test]
    fn cache_reads_discount_input() {
        let usage = TokenUsage {
            input_tokens: 1000,
            output_tokens: 500,
            cache_read_tokens: 400,
            ..TokenUsage::default()
        };
        let cost = calculate_cost(&priced_model(), &usage).unwrap();
        assert!(close(cost, 0.003375), "{cost}");
    }

    #[test]
    fn reasoning_billed_with_output() {
        let usage = TokenUsage {
            input_tokens: 1000,
            output_tokens: 300,
            reasoning_tokens: 200,
            ..TokenUsage::default()
        };
        let with_reasoning = calculate_cost(&priced_model(), &usage).unwrap();

        let merged = TokenUsage {
            input_tokens: 1000,
            output_tokens: 500,
            ..TokenUsage::default()
        };
        let flat = calculate_cost(&priced_model(), &merged).unwrap();
        assert!(close(with_reasoning, flat));
    }

    #[test]
    fn missing_prices_yield_no_cost() {
        let usage = TokenUsage {
            input_tokens: 1000,
            output_tokens: 500,
            ..TokenUsage::default()
        };
        assert_eq!(calculate_cost(&ModelInfo::default(), &usage), None);
    }

    #[test]
    fn missing_cache_price_bills_cache_tokens_at_zero() {
        let info = ModelInfo {
            input_price: Some(1.0),
            output_price: Some(2.0),
            ..ModelInfo::default()
        };
        let usage = TokenUsage {
            input_tokens: 1000,
            output_tokens: 0,
            cache_read_tokens: 500,
            ..TokenUsage::default()
        };
        let cost = calculate_cost(&info, &usage).unwrap();
        assert!(close(cost, 0.0005), "{cost}");
    }

    #[test]
    fn first_fitting_tier_wins() {
        let info = ModelInfo {
            input_price: Some(4.0),
            output_price: Some(20.0),
            tiers: vec![
                PriceTier {
                    context_window: 128_000,
                    input_price: Some(2.0),
                    output_price: Some(10.0),
                    cache_reads_price: None,
                    cache_writes_price: None,
                },
                PriceTier {
                    context_window: 1_000_000,
                    input_price: Some(3.0),
                    output_price: Some(15.0),
                    cache_reads_price: None,
                    cache_writes_price: None,
                },
            ],
            ..ModelInfo::default()
        };

        let small = TokenUsage {
            input_tokens: 50_000,
            output_tokens: 1_000_000,
            ..TokenUsage::default()
        };
        let cost = calculate_cost(&info, &small).unwrap();
        // 50k in at 2.0 + 1M out at 10.0
        assert!(close(cost, 0.1 + 10.0), "{cost}");

        let large = TokenUsage {
            input_tokens: 500_000,
            output_tokens: 1_000_000,
            ..TokenUsage::default()
        };
        let cost = calculate_cost(&info, &large).unwrap();
        // 500k in at 3.0 + 1M out at 15.0
        assert!(close(cost, 1.5 + 15.0), "{cost}");
    }

    #[test]
    fn input_beyond_all_tiers_uses_base_prices() {
        let info = ModelInfo {
            input_price: Some(4.0),
            output_price: Some(20.0),
            tiers: vec![PriceTier {
                context_window: 128_000,
                input_price: Some(2.0),
                output_price: Some(10.0),
                cache_reads_price: None,
                cache_writes_price: None,
            }],
            ..ModelInfo::default()
        };
        let usage = TokenUsage {
            input_tokens: 1_000_000,
            output_tokens: 0,
            ..TokenUsage::default()
        };
        let cost = calculate_cost(&info, &usage).unwrap();
        assert!(close(cost, 4.0), "{cost}");
    }
}
