use bumpalo::{Bump, collections::Vec as BumpVec};

use crate::{config::SimilarityConfig, matching::jaro_winkler::jaro_winkler};

/// Word-level best-pairs similarity over two tokenized names.
///
/// Every query token is paired greedily with its best remaining candidate
/// token; candidate tokens left unpaired only weigh lightly against the
/// score, so "nicolas maduro" still ranks high against "nicolas maduro
/// moros".
pub fn tokenized(query: &str, candidate: &str, config: &SimilarityConfig, bump: &Bump) -> f64 {
  let query_tokens = query.split_whitespace().collect::<Vec<_>>();
  let candidate_tokens = candidate.split_whitespace().collect::<Vec<_>>();

  if query_tokens.is_empty() || candidate_tokens.is_empty() {
    return 0.0;
  }

  let rows = query_tokens.len();
  let columns = candidate_tokens.len();

  let mut matrix = BumpVec::with_capacity_in(rows * columns, bump);

  for qt in &query_tokens {
    for ct in &candidate_tokens {
      matrix.push(jaro_winkler(qt, ct, config));
    }
  }

  let mut row_taken = BumpVec::from_iter_in(std::iter::repeat_n(false, rows), bump);
  let mut column_taken = BumpVec::from_iter_in(std::iter::repeat_n(false, columns), bump);

  let mut matched = 0.0f64;
  let mut paired = 0usize;

  // Greedy extraction: largest remaining cell wins, ties break on earliest
  // query index, then earliest candidate index.
  for _ in 0..rows.min(columns) {
    let mut best: Option<(usize, usize, f64)> = None;

    for row in (0..rows).filter(|r| !row_taken[*r]) {
      for column in (0..columns).filter(|c| !column_taken[*c]) {
        let value = matrix[row * columns + column];

        if best.is_none_or(|(_, _, current)| value > current) {
          best = Some((row, column, value));
        }
      }
    }

    let Some((row, column, value)) = best else {
      break;
    };

    row_taken[row] = true;
    column_taken[column] = true;
    matched += value;
    paired += 1;
  }

  let unmatched_candidate = candidate_tokens.len().saturating_sub(paired);
  let score = matched / (query_tokens.len() as f64 + unmatched_candidate as f64 * config.unmatched_index_token_weight);

  score.clamp(0.0, 1.0)
}

/// Maximum tokenized similarity of a query against a set of candidate names.
pub fn best_over_names<'n>(query: &str, names: impl IntoIterator<Item = &'n str>, config: &SimilarityConfig, bump: &Bump) -> f64 {
  let mut best = 0.0f64;

  for name in names {
    if name.is_empty() {
      continue;
    }

    best = best.max(tokenized(query, name, config, bump));

    if best >= 1.0 {
      break;
    }
  }

  best
}

#[cfg(test)]
mod tests {
  use bumpalo::Bump;
  use float_cmp::approx_eq;

  use crate::config::SimilarityConfig;

  fn score(query: &str, candidate: &str) -> f64 {
    super::tokenized(query, candidate, &SimilarityConfig::default(), &Bump::new())
  }

  #[test]
  fn identical_names() {
    assert!(approx_eq!(f64, score("nicolas maduro", "nicolas maduro"), 1.0));
  }

  #[test]
  fn extra_candidate_tokens_weigh_lightly() {
    let result = score("nicolas maduro", "nicolas maduro moros");

    assert!(result > 0.85, "got {result}");
    assert!(result < 1.0);
  }

  #[test]
  fn missing_query_tokens_weigh_fully() {
    let result = score("nicolas maduro moros", "nicolas");

    assert!(result < 0.5, "got {result}");
  }

  #[test]
  fn token_order_does_not_matter() {
    assert!(approx_eq!(f64, score("maduro nicolas", "nicolas maduro"), 1.0));
  }

  #[test]
  fn empty_sides_score_zero() {
    assert!(approx_eq!(f64, score("", "nicolas"), 0.0));
    assert!(approx_eq!(f64, score("nicolas", ""), 0.0));
  }

  #[test]
  fn best_over_names_takes_the_maximum() {
    let bump = Bump::new();
    let config = SimilarityConfig::default();
    let names = ["pedro perez", "nicolas maduro moros", ""];

    let best = super::best_over_names("nicolas maduro", names, &config, &bump);

    assert!(approx_eq!(f64, best, score("nicolas maduro", "nicolas maduro moros")));
  }

  #[test]
  fn bounded_output() {
    for (q, c) in [("a b c", "x y"), ("jose", "jose jose jose"), ("a", "b")] {
      let result = score(q, c);

      assert!((0.0..=1.0).contains(&result));
    }
  }
}
