use bumpalo::Bump;
use tracing::instrument;

use crate::{
  config::ScoreConfig,
  matching::{address, phonetic, tokenized},
  model::{CryptoAddress, Entity, GovernmentId, QueryEntity, ScoreBreakdown},
  prepare::normalize::normalize_id,
  trace::SearchTrace,
};

/// Multi-factor weighted scorer.
///
/// Matching a unique identifier is near-certain identity, so an exact
/// government ID, crypto address or contact match dominates the aggregation;
/// name similarity alone only ever contributes a probability. Factors with no
/// signal keep their weight out of the denominator so sparse records are not
/// artificially punished.
pub struct EntityScorer<'c> {
  config: &'c ScoreConfig,
}

impl<'c> EntityScorer<'c> {
  pub fn new(config: &'c ScoreConfig) -> EntityScorer<'c> {
    EntityScorer { config }
  }

  /// Score a query against one candidate. Never mutates either side and
  /// never fails: factors that cannot be computed contribute zero.
  #[instrument(name = "score_entity", level = "trace", skip_all, fields(entity_id = candidate.id))]
  pub fn score(&self, bump: &Bump, query: &QueryEntity, candidate: &Entity, trace: &SearchTrace) -> ScoreBreakdown {
    // An equal source-assigned identifier is identity, not similarity.
    if !query.source_id.is_empty() && query.source_id == candidate.source_id {
      trace.record("score", || format!("source id {} matched exactly on {}", query.source_id, candidate.id));

      return ScoreBreakdown::exact(1.0);
    }

    let phases = self.config.weights.enabled;
    let similarity = &self.config.similarity;

    let name_score = if phases.name { self.name_score(bump, query, candidate) } else { 0.0 };

    let alt_names_score = if phases.alt_name {
      tokenized::best_over_names(
        &query.prepared.normalized_name,
        candidate.prepared.normalized_alt_names.iter().map(String::as_str),
        similarity,
        bump,
      )
    } else {
      0.0
    };

    let gov_id_score = if phases.gov_id { gov_id_score(&query.government_ids, &candidate.government_ids) } else { 0.0 };
    let crypto_score = if phases.crypto { crypto_score(&query.crypto_addresses, &candidate.crypto_addresses) } else { 0.0 };
    let contact_score = if phases.contact { self.contact_score(query, candidate) } else { 0.0 };

    let address_score = if phases.address {
      address::best_pair(&query.addresses, &candidate.addresses, similarity, bump)
    } else {
      0.0
    };

    let date_score = match (phases.date, query.birth_date, candidate.birth_date()) {
      (true, Some(query_date), Some(candidate_date)) if query_date == candidate_date => 1.0,
      _ => 0.0,
    };

    let mut breakdown = ScoreBreakdown {
      name_score,
      alt_names_score,
      address_score,
      gov_id_score,
      crypto_score,
      contact_score,
      date_score,
      total_weighted_score: 0.0,
    };

    breakdown.total_weighted_score = self.aggregate(query, candidate, &breakdown);

    tracing::debug!(entity_id = candidate.id, score = breakdown.total_weighted_score, "computed score");

    trace.record("score", || {
      format!(
        "{}: name={:.3} alt={:.3} address={:.3} gov_id={:.3} crypto={:.3} contact={:.3} date={:.3} total={:.3}",
        candidate.id, name_score, alt_names_score, address_score, gov_id_score, crypto_score, contact_score, date_score, breakdown.total_weighted_score,
      )
    });

    breakdown
  }

  fn name_score(&self, bump: &Bump, query: &QueryEntity, candidate: &Entity) -> f64 {
    let query_name = &query.prepared.normalized_name;

    if query_name.is_empty() {
      return 0.0;
    }

    let similarity = &self.config.similarity;
    let prepared = &candidate.prepared;
    let mut best = 0.0f64;

    let names = std::iter::once(prepared.normalized_primary_name.as_str()).chain(prepared.word_combinations.iter().map(String::as_str));

    for name in names {
      if name.is_empty() {
        continue;
      }

      // Cheap veto before the quadratic comparison.
      if !phonetic::compatible(query_name, name, similarity) {
        continue;
      }

      best = best.max(tokenized::tokenized(query_name, name, similarity, bump));

      if best >= 1.0 {
        break;
      }
    }

    best
  }

  fn contact_score(&self, query: &QueryEntity, candidate: &Entity) -> f64 {
    let query_email = query.contact.email.trim().to_lowercase();
    let candidate_email = candidate.contact.email.trim().to_lowercase();

    if !query_email.is_empty() && query_email == candidate_email {
      return 1.0;
    }

    let query_phone = &query.prepared.normalized_phone;

    if !query_phone.is_empty() && candidate.prepared.normalized_phones.iter().any(|phone| phone == query_phone) {
      return 1.0;
    }

    0.0
  }

  fn aggregate(&self, query: &QueryEntity, candidate: &Entity, breakdown: &ScoreBreakdown) -> f64 {
    let weights = &self.config.weights;
    let best_name = breakdown.name_score.max(breakdown.alt_names_score);

    let has_exact_match = breakdown.gov_id_score >= weights.exact_match_threshold
      || breakdown.crypto_score >= weights.exact_match_threshold
      || breakdown.contact_score >= weights.exact_match_threshold;

    if has_exact_match {
      // The identifier dominates, the name still contributes.
      return (0.7 + 0.3 * best_name).clamp(0.0, 1.0);
    }

    let mut numerator = weights.name_weight * best_name;
    let mut denominator = weights.name_weight;

    // Diverging source-assigned identifiers count as a failed critical
    // comparison.
    if !query.source_id.is_empty() && !candidate.source_id.is_empty() && query.source_id != candidate.source_id {
      denominator += weights.critical_id_weight;
    }

    if breakdown.address_score > 0.0 {
      numerator += weights.address_weight * breakdown.address_score;
      denominator += weights.address_weight;
    }

    for factor in [breakdown.gov_id_score, breakdown.crypto_score, breakdown.contact_score] {
      if factor > 0.0 {
        numerator += weights.critical_id_weight * factor;
        denominator += weights.critical_id_weight;
      }
    }

    if breakdown.date_score > 0.0 {
      numerator += weights.supporting_info_weight * breakdown.date_score;
      denominator += weights.supporting_info_weight;
    }

    if denominator <= 0.0 {
      return 0.0;
    }

    (numerator / denominator).clamp(0.0, 1.0)
  }
}

fn gov_id_score(query_ids: &[GovernmentId], candidate_ids: &[GovernmentId]) -> f64 {
  let mut best = 0.0f64;

  for query_id in query_ids {
    let query_value = normalize_id(&query_id.identifier);

    if query_value.is_empty() {
      continue;
    }

    for candidate_id in candidate_ids {
      if normalize_id(&candidate_id.identifier) != query_value {
        continue;
      }

      // Types only have to agree when both sides specify one.
      if let (Some(query_type), Some(candidate_type)) = (&query_id.id_type, &candidate_id.id_type)
        && !query_type.eq_ignore_ascii_case(candidate_type)
      {
        continue;
      }

      let pair_score = match (&query_id.country_code, &candidate_id.country_code) {
        (Some(query_country), Some(candidate_country)) if query_country.eq_ignore_ascii_case(candidate_country) => 1.0,
        (Some(_), Some(_)) => 0.7,
        (None, None) => 1.0,
        _ => 0.9,
      };

      best = best.max(pair_score);
    }
  }

  best
}

fn crypto_score(query_addresses: &[CryptoAddress], candidate_addresses: &[CryptoAddress]) -> f64 {
  for query_address in query_addresses {
    if query_address.address.is_empty() {
      continue;
    }

    for candidate_address in candidate_addresses {
      // Wallet addresses are case-sensitive, currencies are not.
      if query_address.currency.eq_ignore_ascii_case(&candidate_address.currency) && query_address.address == candidate_address.address {
        return 1.0;
      }
    }
  }

  0.0
}
