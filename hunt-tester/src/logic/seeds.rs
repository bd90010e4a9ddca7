use anyhow::{Context, Result, bail};
use regex::Regex;

const DEFAULT_SEED: u64 = 1337;
const MAX_RANGE_LEN: u64 = 10_000;

/// Resolve a list of CLI seed arguments into concrete seeds.
///
/// Supports literal integers (negative values use their magnitude) and
/// inclusive ranges written `start..end` or `start..=end`. Duplicates are
/// dropped while keeping first-seen order; an empty list yields the default
/// seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let range = Regex::new(r"^(\d+)\.\.=?(\d+)$").context("seed range pattern")?;
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Some(caps) = range.captures(token) {
            let start: u64 = caps[1]
                .parse()
                .with_context(|| format!("seed range start out of bounds: {token}"))?;
            let end: u64 = caps[2]
                .parse()
                .with_context(|| format!("seed range end out of bounds: {token}"))?;
            if start > end {
                bail!("Seed range runs backwards: {token}");
            }
            if end - start >= MAX_RANGE_LEN {
                bail!("Seed range too large (max {MAX_RANGE_LEN} seeds): {token}");
            }
            seeds.extend(start..=end);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            seeds.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            seeds.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<u64> = Vec::with_capacity(seeds.len());
    for seed in seeds {
        if !deduped.contains(&seed) {
            deduped.push(seed);
        }
    }

    if deduped.is_empty() {
        deduped.push(DEFAULT_SEED);
    }

    Ok(deduped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numbers_and_ranges() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "3..5", "10..=11"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 3, 4, 5, 10, 11]);
    }

    #[test]
    fn drops_duplicates_in_order() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "4..6", "5"])).unwrap();
        assert_eq!(seeds, vec![5, 4, 6]);
    }

    #[test]
    fn defaults_when_empty() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn rejects_garbage_and_bad_ranges() {
        assert!(resolve_seed_inputs(&tokens(&["banana"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["9..2"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..100000"])).is_err());
    }
}
