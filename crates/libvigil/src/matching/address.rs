use bumpalo::Bump;
use itertools::Itertools;

use crate::{
  config::SimilarityConfig,
  matching::{jaro_winkler::jaro_winkler, tokenized::tokenized},
  model::Address,
  prepare::normalize::normalize,
};

const COUNTRY_WEIGHT: f64 = 0.3;
const CITY_WEIGHT: f64 = 0.3;
const LINE1_WEIGHT: f64 = 0.4;

/// Field-weighted comparison of two structured addresses.
///
/// Returns 0.0 when no field is present on both sides, so an absent address
/// never reads as a weak mismatch.
pub fn compare(query: &Address, candidate: &Address, config: &SimilarityConfig, bump: &Bump) -> f64 {
  let mut score = 0.0f64;
  let mut compared = false;

  let query_country = normalize(&query.country);
  let candidate_country = normalize(&candidate.country);

  if !query_country.is_empty() && !candidate_country.is_empty() {
    compared = true;

    if query_country == candidate_country {
      score += COUNTRY_WEIGHT;
    }
  }

  let query_city = normalize(&query.city);
  let candidate_city = normalize(&candidate.city);

  if !query_city.is_empty() && !candidate_city.is_empty() {
    compared = true;
    score += CITY_WEIGHT * jaro_winkler(&query_city, &candidate_city, config);
  }

  let query_line1 = normalize(&query.line1);
  let candidate_line1 = normalize(&candidate.line1);

  if !query_line1.is_empty() && !candidate_line1.is_empty() {
    compared = true;
    score += LINE1_WEIGHT * tokenized(&query_line1, &candidate_line1, config, bump);
  }

  if !compared {
    return 0.0;
  }

  score.min(1.0)
}

/// Best score over the Cartesian product of two address lists.
pub fn best_pair(query: &[Address], candidate: &[Address], config: &SimilarityConfig, bump: &Bump) -> f64 {
  query
    .iter()
    .cartesian_product(candidate.iter())
    .map(|(q, c)| compare(q, c, config, bump))
    .fold(0.0f64, f64::max)
}
