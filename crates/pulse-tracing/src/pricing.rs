//! Static per-model price table.
//!
//! Prices are in cents per million tokens. Lookups try an exact model name first
//! and then the alias table; unknown models have no price.

/// Input and output price in cents per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

const fn price(input: f64, output: f64) -> ModelPricing {
    ModelPricing { input, output }
}

const MODEL_PRICING: &[(&str, ModelPricing)] = &[
    ("gpt-5.1", price(125.0, 1000.0)),
    ("gpt-5", price(150.0, 1000.0)),
    ("gpt-5-mini", price(90.0, 400.0)),
    ("gpt-5-nano", price(20.0, 100.0)),
    ("gpt-5.1-chat-latest", price(125.0, 1000.0)),
    ("gpt-5-chat-latest", price(150.0, 1000.0)),
    ("gpt-5.1-codex-max", price(250.0, 1250.0)),
    ("gpt-5.1-codex", price(125.0, 600.0)),
    ("gpt-5-codex", price(145.0, 600.0)),
    ("gpt-5.1-codex-mini", price(40.0, 160.0)),
    ("codex-mini-latest", price(40.0, 160.0)),
    ("gpt-5-pro", price(250.0, 1200.0)),
    ("gpt-5-search-api", price(400.0, 1600.0)),
    ("gpt-4.1", price(250.0, 1000.0)),
    ("gpt-4.1-mini", price(100.0, 400.0)),
    ("gpt-4.1-nano", price(15.0, 60.0)),
    ("gpt-4o", price(250.0, 1000.0)),
    ("gpt-4o-2024-05-13", price(250.0, 1000.0)),
    ("gpt-4o-mini", price(15.0, 60.0)),
    ("gpt-4o-mini-search-preview", price(500.0, 2000.0)),
    ("gpt-4o-search-preview", price(1000.0, 4000.0)),
    ("gpt-realtime", price(500.0, 2000.0)),
    ("gpt-realtime-mini", price(250.0, 1000.0)),
    ("gpt-4o-realtime-preview", price(500.0, 2000.0)),
    ("gpt-4o-mini-realtime-preview", price(15.0, 60.0)),
    ("gpt-audio", price(250.0, 1000.0)),
    ("gpt-audio-mini", price(60.0, 250.0)),
    ("gpt-4o-audio-preview", price(250.0, 1000.0)),
    ("gpt-4o-mini-audio-preview", price(15.0, 60.0)),
    ("o1", price(1500.0, 6000.0)),
    ("o1-pro", price(1800.0, 7200.0)),
    ("o1-mini", price(350.0, 1400.0)),
    ("o3-pro", price(1500.0, 6000.0)),
    ("o3", price(600.0, 2400.0)),
    ("o3-mini", price(200.0, 800.0)),
    ("o3-deep-research", price(2500.0, 10000.0)),
    ("o4-mini", price(300.0, 1200.0)),
    ("o4-mini-deep-research", price(500.0, 2000.0)),
    ("computer-use-preview", price(500.0, 0.0)),
    ("gpt-image-1", price(5000.0, 0.0)),
    ("gpt-image-1-mini", price(2000.0, 0.0)),
    ("gpt-4-turbo", price(1000.0, 3000.0)),
    ("gpt-3.5-turbo", price(50.0, 150.0)),
    ("claude-opus-4-5-20251101", price(500.0, 2500.0)),
    ("claude-opus-4-1-20250805", price(1500.0, 7500.0)),
    ("claude-opus-4-20250514", price(1500.0, 7500.0)),
    ("claude-sonnet-4-5-20250929", price(300.0, 1500.0)),
    ("claude-sonnet-4-20250514", price(300.0, 1500.0)),
    ("claude-3-7-sonnet-20250219", price(300.0, 1500.0)),
    ("claude-3-sonnet-20240229", price(300.0, 1500.0)),
    ("claude-3-5-sonnet-20241022", price(300.0, 1500.0)),
    ("claude-haiku-4-5-20251001", price(100.0, 500.0)),
    ("claude-3-5-haiku-20241022", price(80.0, 400.0)),
    ("claude-3-haiku-20240307", price(25.0, 125.0)),
    ("claude-3-opus-20240229", price(1500.0, 7500.0)),
];

const MODEL_ALIASES: &[(&str, &str)] = &[
    ("gpt-5.1-latest", "gpt-5.1"),
    ("gpt-5-latest", "gpt-5"),
    ("gpt-5-mini-latest", "gpt-5-mini"),
    ("gpt-5-nano-latest", "gpt-5-nano"),
    ("gpt-5.1-codex-latest", "gpt-5.1-codex"),
    ("gpt-5-codex-latest", "gpt-5-codex"),
    ("gpt-5.1-codex-mini-latest", "gpt-5.1-codex-mini"),
    ("gpt-4.1-latest", "gpt-4.1"),
    ("gpt-4.1-mini-latest", "gpt-4.1-mini"),
    ("gpt-4.1-nano-latest", "gpt-4.1-nano"),
    ("gpt-4o-2024-11-20", "gpt-4o"),
    ("gpt-4o-2024-08-06", "gpt-4o"),
    ("gpt-4o-mini-2024-07-18", "gpt-4o-mini"),
    ("gpt-4-turbo-2024-04-09", "gpt-4-turbo"),
    ("gpt-4-turbo-preview", "gpt-4-turbo"),
    ("gpt-3.5-turbo-0125", "gpt-3.5-turbo"),
    ("gpt-3.5-turbo-1106", "gpt-3.5-turbo"),
    ("claude-3-5-sonnet", "claude-3-5-sonnet-20241022"),
    ("claude-3.5-sonnet", "claude-3-5-sonnet-20241022"),
    ("claude-3-sonnet", "claude-3-sonnet-20240229"),
    ("claude-3.0-sonnet", "claude-3-sonnet-20240229"),
    ("claude-3-5-haiku", "claude-3-5-haiku-20241022"),
    ("claude-3.5-haiku", "claude-3-5-haiku-20241022"),
    ("claude-3-opus", "claude-3-opus-20240229"),
    ("claude-opus-4-5", "claude-opus-4-5-20251101"),
    ("claude-opus-4.5", "claude-opus-4-5-20251101"),
    ("claude-opus-4-1", "claude-opus-4-1-20250805"),
    ("claude-opus-4.1", "claude-opus-4-1-20250805"),
    ("claude sonnet", "claude-3-sonnet-20240229"),
];

fn exact(model: &str) -> Option<ModelPricing> {
    MODEL_PRICING
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, pricing)| *pricing)
}

/// Look up pricing for a model, falling back to the alias table.
pub fn resolve_pricing(model: &str) -> Option<ModelPricing> {
    exact(model).or_else(|| {
        MODEL_ALIASES
            .iter()
            .find(|(alias, _)| *alias == model)
            .and_then(|(_, target)| exact(target))
    })
}

/// Cost of a call in cents, rounded to 6 decimal places.
///
/// Returns `None` for models missing from the table.
pub fn calculate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
    let pricing = resolve_pricing(model)?;
    let cost = (input_tokens as f64 * pricing.input) / 1_000_000.0
        + (output_tokens as f64 * pricing.output) / 1_000_000.0;
    Some(round6(cost))
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        // 1000 * 250 / 1e6 + 500 * 1000 / 1e6
        assert_eq!(calculate_cost("gpt-4o", 1000, 500), Some(0.75));
    }

    #[test]
    fn test_alias_match() {
        assert_eq!(
            resolve_pricing("gpt-4o-2024-08-06"),
            resolve_pricing("gpt-4o")
        );
        assert_eq!(calculate_cost("claude-3.5-haiku", 1_000_000, 0), Some(80.0));
    }

    #[test]
    fn test_unknown_model_has_no_cost() {
        assert_eq!(calculate_cost("llama-3.1-8b-instant", 100, 100), None);
    }

    #[test]
    fn test_zero_output_price() {
        assert_eq!(calculate_cost("gpt-image-1", 10, 99_999), Some(0.05));
    }

    #[test]
    fn test_rounds_to_six_decimals() {
        // 7 * 15 / 1e6 = 0.000105, 3 * 60 / 1e6 = 0.00018
        assert_eq!(calculate_cost("gpt-4o-mini", 7, 3), Some(0.000285));
    }

    #[test]
    fn test_aliases_point_at_priced_models() {
        for (alias, target) in MODEL_ALIASES {
            assert!(exact(target).is_some(), "{alias} -> {target} has no price");
        }
    }
}
