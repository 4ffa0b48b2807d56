//! Fresh identifiers for generated workload objects.

use rand::Rng;

/// Generate a fresh random 9-decimal-digit identifier, used to uniquify
/// workload manifests (spec.md §4.6: "a fresh random 9-decimal-digit
/// identifier `uid`").
pub fn new_uid(rng: &mut impl Rng) -> String {
    let v: u32 = rng.gen_range(0..1_000_000_000);
    format!("{v:09}")
}
