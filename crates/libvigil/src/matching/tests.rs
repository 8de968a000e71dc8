//! End-to-end scenarios exercising the preparation pipeline, the similarity
//! engine and the scorer together.

use std::sync::Arc;

use bumpalo::Bump;
use float_cmp::approx_eq;

use crate::{
  config::{ScoreConfig, SimilarityConfig},
  index::EntityIndex,
  matching::{jaro_winkler::jaro_winkler, phonetic, tokenized::tokenized},
  model::{Entity, EntityType, QueryEntity, Source},
  prepare::{PreparePipeline, combine, company, language::Lang, normalize::normalize, normalize::reorder_sdn_name, stopwords},
  scoring::EntityScorer,
  search::{SearchParams, SearchService},
  trace::SearchTrace,
};

#[test]
fn company_name_preparation_chain() {
  let normalized = normalize("José de la Cruz Corporation LLC");

  assert_eq!(normalized, "jose de la cruz corporation llc");

  let without_stopwords = stopwords::remove(&normalized, Lang::Es);

  assert_eq!(without_stopwords, "jose cruz corporation llc");

  let without_titles = company::strip_company_titles(&without_stopwords);

  assert_eq!(without_titles, "jose cruz");
}

#[test]
fn sdn_reorder_scenario() {
  assert_eq!(reorder_sdn_name("SMITH, John Michael"), "John Michael SMITH");
}

#[test]
fn word_combination_scenario() {
  let variants = combine::combinations("jean de la cruz");

  for expected in ["jean de la cruz", "jean dela cruz", "jean delacruz"] {
    assert!(variants.iter().any(|variant| variant == expected), "missing {expected}");
  }
}

#[test]
fn jaro_winkler_reference_values() {
  let config = SimilarityConfig::default();

  assert!(approx_eq!(f64, jaro_winkler("MARTHA", "MARHTA", &config), 0.961, epsilon = 0.001));
  assert!(approx_eq!(f64, jaro_winkler("MARTHA", "MARTHA", &config), 1.0));
  assert!(jaro_winkler("ABCD", "WXYZ", &config) < 0.5);
}

#[test]
fn maduro_scenario_end_to_end() {
  let index = Arc::new(EntityIndex::new());

  index.replace(
    &PreparePipeline::new(false),
    vec![
      Entity::new("ofac-12033", Source::OfacSdn, EntityType::Person, "NICOLAS MADURO MOROS"),
      Entity::new("ofac-99999", Source::OfacSdn, EntityType::Person, "Some Other Person"),
    ],
  );

  let results = SearchService::new(index)
    .search(
      &QueryEntity::named("Nicolas Maduro"),
      &SearchParams {
        min_match: 0.85,
        ..SearchParams::default()
      },
      &ScoreConfig::default(),
      &SearchTrace::disabled(),
    )
    .unwrap();

  assert!(!results.is_empty());
  assert_eq!(results[0].entity.id, "ofac-12033");
  assert!(results[0].score >= 0.85);
}

#[test]
fn phonetic_veto_implies_zero_name_score() {
  let config = ScoreConfig::default();
  let pipeline = PreparePipeline::new(false);

  let mut query = QueryEntity::named("Washington");

  pipeline.prepare_query(&mut query);

  let mut entity = Entity::new("x", Source::UsCsl, EntityType::Person, "Jefferson");

  pipeline.prepare(&mut entity);

  assert!(!phonetic::compatible(&query.prepared.normalized_name, &entity.prepared.normalized_primary_name, &config.similarity));

  let breakdown = EntityScorer::new(&config).score(&Bump::new(), &query, &entity, &SearchTrace::disabled());

  assert!(approx_eq!(f64, breakdown.name_score, 0.0));
}

#[test]
fn tokenized_similarity_uses_word_combinations() {
  let config = ScoreConfig::default();
  let pipeline = PreparePipeline::new(false);

  let mut entity = Entity::new("x", Source::EuCsl, EntityType::Person, "Jean de la Cruz");

  pipeline.prepare(&mut entity);

  let mut query = QueryEntity::named("Jean Delacruz");

  pipeline.prepare_query(&mut query);

  // The merged-particle variant is what makes this a close match.
  let bump = Bump::new();
  let direct = tokenized(&query.prepared.normalized_name, &entity.prepared.normalized_primary_name, &config.similarity, &bump);
  let breakdown = EntityScorer::new(&config).score(&bump, &query, &entity, &SearchTrace::disabled());

  assert!(breakdown.name_score > direct);
  assert!(breakdown.name_score > 0.95, "got {}", breakdown.name_score);
}

#[test]
fn normalization_is_stable_across_pipeline_outputs() {
  let pipeline = PreparePipeline::new(false);

  let mut entity = Entity::new("x", Source::UkCsl, EntityType::Business, "O'Brien & Sons, Ltd.");

  pipeline.prepare(&mut entity);

  for name in entity
    .prepared
    .normalized_names_without_stopwords
    .iter()
    .chain(entity.prepared.word_combinations.iter())
  {
    assert_eq!(&normalize(name), name);
  }
}
