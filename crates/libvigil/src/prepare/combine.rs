use itertools::Itertools;

/// Short connecting particles merged into their neighbors when generating
/// alternate name forms.
const PARTICLES: [&str; 11] = ["de", "la", "el", "du", "van", "von", "der", "da", "di", "dos", "das"];

fn is_particle(token: &str) -> bool {
  PARTICLES.contains(&token)
}

/// Generate particle-merged variants of a name.
///
/// The returned list always starts with the input itself. Pass one merges
/// runs of consecutive particles into a single token ("de la" -> "dela");
/// pass two also swallows the following word ("de la cruz" -> "delacruz").
/// Each pass contributes a variant only when it actually changed the token
/// count, and order is deterministic.
pub fn combinations(name: &str) -> Vec<String> {
  let tokens = name.split_whitespace().collect::<Vec<_>>();
  let mut variants = vec![name.to_string()];

  let merged_runs = merge_particles(&tokens, false);

  if merged_runs.len() != tokens.len() {
    variants.push(merged_runs.join(" "));
  }

  let merged_following = merge_particles(&tokens, true);

  if merged_following.len() != tokens.len() {
    variants.push(merged_following.join(" "));
  }

  variants.into_iter().unique().collect()
}

fn merge_particles(tokens: &[&str], include_following: bool) -> Vec<String> {
  let mut out = Vec::with_capacity(tokens.len());
  let mut index = 0;

  while index < tokens.len() {
    if !is_particle(tokens[index]) {
      out.push(tokens[index].to_string());
      index += 1;

      continue;
    }

    let mut merged = String::new();

    while index < tokens.len() && is_particle(tokens[index]) {
      merged.push_str(tokens[index]);
      index += 1;
    }

    if include_following && index < tokens.len() {
      merged.push_str(tokens[index]);
      index += 1;
    }

    out.push(merged);
  }

  out
}
