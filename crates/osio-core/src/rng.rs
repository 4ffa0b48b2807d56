//! Random draws shared by the workload generator and the fault injector.

use rand::Rng;

/// Draw from an exponential distribution with mean `mean_secs`.
///
/// `-mean * ln(U)` where `U ~ Uniform(0, 1)`, per the GLOSSARY definition.
/// Panics if `mean_secs` is not finite and positive — callers only ever pass
/// configured means, never user-facing input.
pub fn exponential_draw(rng: &mut impl Rng, mean_secs: f64) -> f64 {
    debug_assert!(mean_secs > 0.0 && mean_secs.is_finite());
    let u: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    -mean_secs * u.ln()
}

/// Convert a targeted hourly draw rate into the probability that a single
/// draw (taken at `draws_per_hour` draws per hour) should succeed.
///
/// Preserves the original's literal "draws per hour" semantics (see
/// SPEC_FULL.md §9): `rate_per_hour` is how many times per hour the event
/// should fire; `draws_per_hour` is how many times per hour we sample for
/// it. The probability is capped at 1.0.
pub fn rate_to_probability(rate_per_hour: f64, draws_per_hour: f64) -> f64 {
    (rate_per_hour / draws_per_hour).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rate_to_probability_matches_known_values() {
        assert!((rate_to_probability(10.0, 100.0) - 0.1).abs() < 1e-12);
        assert!((rate_to_probability(5.0, 40.0) - 0.125).abs() < 1e-12);
        assert_eq!(rate_to_probability(100.0, 2.0), 1.0);
    }

    proptest! {
        #[test]
        fn exponential_draw_is_always_positive(mean in 0.001f64..10_000.0) {
            let mut rng = rand::thread_rng();
            let v = exponential_draw(&mut rng, mean);
            prop_assert!(v > 0.0);
            prop_assert!(v.is_finite());
        }

        #[test]
        fn rate_to_probability_is_capped_at_one(rate in 0.0f64..1_000_000.0, draws in 0.001f64..1_000_000.0) {
            let p = rate_to_probability(rate, draws);
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
