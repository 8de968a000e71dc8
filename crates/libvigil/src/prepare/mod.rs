pub mod combine;
pub mod company;
pub mod language;
pub mod normalize;
pub mod stopwords;

use itertools::Itertools;
use rust_embed::Embed;

use crate::{
  model::{Entity, PreparedFields, PreparedQuery, QueryEntity},
  prepare::{
    language::Lang,
    normalize::{normalize, normalize_address_field, normalize_id, reorder_sdn_name},
  },
};

#[derive(Embed)]
#[folder = "assets/dictionaries"]
struct Dictionaries;

/// Deterministic multi-stage name preparation.
///
/// Matching semantics depend on this output being byte-for-byte reproducible,
/// so every stage is order-fixed and preparation never fails: missing fields
/// contribute empty strings or lists.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreparePipeline {
  keep_stopwords: bool,
}

impl PreparePipeline {
  pub fn new(keep_stopwords: bool) -> PreparePipeline {
    PreparePipeline { keep_stopwords }
  }

  /// Populate [`Entity::prepared`] from the raw fields.
  pub fn prepare(&self, entity: &mut Entity) {
    let language = language::detect(&entity.primary_name);
    let primary_pre = normalize(&reorder_sdn_name(&entity.primary_name));
    let normalized_primary_name = self.without_stopwords(&primary_pre, language);

    // Alt languages are detected on the pre-stop-word normalized form.
    let alts_pre = entity
      .alt_names
      .iter()
      .map(|alt| normalize(&reorder_sdn_name(alt)))
      .filter(|pre| !pre.is_empty())
      .map(|pre| {
        let lang = language::detect(&pre);

        (pre, lang)
      })
      .unique_by(|(pre, _)| pre.clone())
      .collect::<Vec<_>>();

    let normalized_alt_names = alts_pre.iter().map(|(pre, lang)| self.without_stopwords(pre, *lang)).filter(|name| !name.is_empty()).unique().collect::<Vec<_>>();

    // Combinations are built from the pre-stop-word forms so particles like
    // "de la" survive long enough to merge.
    let all_names_pre = std::iter::once(&primary_pre).chain(alts_pre.iter().map(|(pre, _)| pre)).filter(|pre| !pre.is_empty()).unique().collect::<Vec<_>>();

    let word_combinations = all_names_pre.iter().flat_map(|pre| combine::combinations(pre)).filter(|name| !name.is_empty()).unique().collect::<Vec<_>>();

    let normalized_names_without_stopwords = std::iter::once((&primary_pre, language))
      .chain(alts_pre.iter().map(|(pre, lang)| (pre, *lang)))
      .map(|(pre, lang)| stopwords::remove(pre, lang))
      .filter(|name| !name.is_empty())
      .unique()
      .collect::<Vec<_>>();

    let normalized_names_without_company_titles = normalized_names_without_stopwords
      .iter()
      .map(|name| company::strip_company_titles(name))
      .filter(|name| !name.is_empty())
      .unique()
      .collect::<Vec<_>>();

    let normalized_addresses = entity.addresses.iter().map(format_address).filter(|address| !address.is_empty()).collect::<Vec<_>>();

    let normalized_phones = [&entity.contact.phone, &entity.contact.fax]
      .into_iter()
      .map(|number| normalize_id(number))
      .filter(|number| !number.is_empty())
      .unique()
      .collect::<Vec<_>>();

    entity.prepared = PreparedFields {
      normalized_primary_name,
      normalized_alt_names,
      normalized_names_without_stopwords,
      normalized_names_without_company_titles,
      word_combinations,
      normalized_addresses,
      normalized_phones,
      detected_language: language,
    };
  }

  /// Precompute the query-side forms once per request.
  pub fn prepare_query(&self, query: &mut QueryEntity) {
    let language = language::detect(&query.name);
    let name_pre = normalize(&reorder_sdn_name(&query.name));
    let normalized_name = self.without_stopwords(&name_pre, language);

    query.prepared = PreparedQuery {
      name_pre,
      normalized_name,
      language,
      normalized_phone: normalize_id(&query.contact.phone),
    };
  }

  fn without_stopwords(&self, name: &str, language: Lang) -> String {
    if self.keep_stopwords {
      name.to_string()
    } else {
      stopwords::remove(name, language)
    }
  }
}

fn format_address(address: &crate::model::Address) -> String {
  [&address.line1, &address.city, &address.state, &address.postal_code, &address.country]
    .into_iter()
    .map(|field| normalize_address_field(field))
    .map(|field| field.trim().to_string())
    .filter(|field| !field.is_empty())
    .join(" ")
}

/// Force-load the embedded dictionaries.
///
/// They are lazily initialized otherwise, which would put the cost on the
/// first prepared entity.
pub(crate) fn init() {
  let _ = stopwords::STOPWORDS.len();
  let _ = company::COMPANY_SUFFIXES.patterns_len();
}

#[cfg(test)]
mod tests {
  use crate::{
    model::{Address, Contact, Entity, EntityType, Source},
    prepare::PreparePipeline,
  };

  fn sample() -> Entity {
    let mut entity = Entity::new("t-1", Source::OfacSdn, EntityType::Person, "DE LA CRUZ, Jean");

    entity.alt_names = vec!["Jean Cruz".to_string(), "Jean Cruz".to_string(), String::new()];
    entity.addresses = vec![Address {
      line1: "Av. Libertador, 12".to_string(),
      city: "Caracas".to_string(),
      country: "Venezuela".to_string(),
      ..Address::default()
    }];
    entity.contact = Contact {
      phone: "+58 (212) 555-0199".to_string(),
      ..Contact::default()
    };
    entity
  }

  #[test]
  fn prepares_all_fields() {
    let mut entity = sample();

    PreparePipeline::new(false).prepare(&mut entity);

    let prepared = &entity.prepared;

    assert_eq!(prepared.word_combinations[0], "jean de la cruz");
    assert!(prepared.word_combinations.contains(&"jean delacruz".to_string()));
    assert_eq!(prepared.normalized_alt_names, &["jean cruz"]);
    assert_eq!(prepared.normalized_addresses, &["av libertador 12 caracas venezuela"]);
    assert_eq!(prepared.normalized_phones, &["582125550199"]);
  }

  #[test]
  fn preparation_is_idempotent() {
    let pipeline = PreparePipeline::new(false);
    let mut entity = sample();

    pipeline.prepare(&mut entity);

    let first = entity.prepared.clone();

    pipeline.prepare(&mut entity);

    assert_eq!(entity.prepared, first);
  }

  #[test]
  fn no_empty_strings_in_prepared_lists() {
    let mut entity = sample();

    PreparePipeline::new(false).prepare(&mut entity);

    let prepared = &entity.prepared;

    for list in [
      &prepared.normalized_alt_names,
      &prepared.normalized_names_without_stopwords,
      &prepared.normalized_names_without_company_titles,
      &prepared.word_combinations,
      &prepared.normalized_addresses,
    ] {
      assert!(list.iter().all(|item| !item.is_empty()));
    }
  }

  #[test]
  fn keep_stopwords_skips_removal() {
    let mut entity = Entity::new("t-2", Source::EuCsl, EntityType::Business, "Banco de la Nación");

    PreparePipeline::new(true).prepare(&mut entity);

    assert_eq!(entity.prepared.normalized_primary_name, "banco de la nacion");
    // Combinations are built from the pre-stop-word form either way.
    assert!(entity.prepared.word_combinations.contains(&"banco delanacion".to_string()));
  }

  #[test]
  fn company_titles_chain() {
    let mut entity = Entity::new("t-3", Source::UsCsl, EntityType::Business, "José de la Cruz Corporation LLC");

    PreparePipeline::new(false).prepare(&mut entity);

    assert!(entity.prepared.normalized_names_without_company_titles.iter().any(|name| !name.contains("llc") && !name.contains("corporation")));
  }

  #[test]
  fn empty_entity_prepares_to_empty() {
    let mut entity = Entity::new("t-4", Source::UkCsl, EntityType::Unknown, "");

    PreparePipeline::new(false).prepare(&mut entity);

    assert!(entity.prepared.normalized_primary_name.is_empty());
    assert!(entity.prepared.word_combinations.is_empty());
  }
}
