//! Candidate username generation from name fragments.

use std::collections::BTreeSet;

use rand::Rng;

/// Returned when neither name part is available.
pub const UNKNOWN_ALIAS: &str = "unknown";

/// Smallest number of distinct aliases produced for a non-empty input.
pub const MIN_ALIASES: usize = 5;

/// Derive candidate usernames from a family name (e.g. `Diop`) and a given
/// name (e.g. `Mamadou`).
///
/// Returns the aliases joined with `", "`, or [`UNKNOWN_ALIAS`] when both
/// parts are absent or empty. Numeric suffixes are random; callers must treat
/// the result as an unordered set.
pub fn generate_aliases(family_name: Option<&str>, given_name: Option<&str>) -> String {
  generate_aliases_with(&mut rand::rng(), family_name, given_name)
}

/// [`generate_aliases`] with a caller-supplied random source.
pub fn generate_aliases_with<R: Rng>(
  rng: &mut R,
  family_name: Option<&str>,
  given_name: Option<&str>,
) -> String {
  let family = family_name.map(str::to_lowercase).unwrap_or_default();
  let given = given_name.map(str::to_lowercase).unwrap_or_default();

  let mut aliases = BTreeSet::new();

  match (family.is_empty(), given.is_empty()) {
    (false, false) => {
      let g0 = initial(&given);
      let f0 = initial(&family);
      aliases.insert(format!("{g0}{family}"));
      aliases.insert(format!("{given}{family}"));
      aliases.insert(format!("{family}{given}"));
      aliases.insert(format!("{family}_{given}"));
      aliases.insert(format!("{given}.{family}"));
      aliases.insert(format!("{given}{f0}"));
      aliases.insert(format!("{g0}{f0}{}", rng.random_range(10..=99)));
      aliases.insert(format!("{family}{}", rng.random_range(1..=99)));
    }
    (false, true) => single_part(rng, &family, &mut aliases),
    (true, false) => single_part(rng, &given, &mut aliases),
    (true, true) => return UNKNOWN_ALIAS.to_owned(),
  }

  let base = if family.is_empty() { &given } else { &family };
  while aliases.len() < MIN_ALIASES {
    aliases.insert(format!("{base}{}", rng.random_range(100..=999)));
  }

  aliases.into_iter().collect::<Vec<_>>().join(", ")
}

fn single_part<R: Rng>(rng: &mut R, part: &str, aliases: &mut BTreeSet<String>) {
  aliases.insert(part.to_owned());
  aliases.insert(format!("{part}{}", rng.random_range(1..=99)));
  aliases.insert(format!("{part}_{}", rng.random_range(1..=99)));
  aliases.insert(format!("{part}.{}", rng.random_range(1..=99)));
}

fn initial(s: &str) -> String { s.chars().next().map(String::from).unwrap_or_default() }
