use std::{fmt, str::FromStr, sync::Arc};

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::prepare::language::Lang;

/// Watchlist a sanctioned entity was aggregated from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
  OfacSdn,
  UsCsl,
  EuCsl,
  UkCsl,
}

impl Source {
  pub const ALL: [Source; 4] = [Source::OfacSdn, Source::UsCsl, Source::EuCsl, Source::UkCsl];

  pub fn as_str(&self) -> &'static str {
    match self {
      Source::OfacSdn => "ofac_sdn",
      Source::UsCsl => "us_csl",
      Source::EuCsl => "eu_csl",
      Source::UkCsl => "uk_csl",
    }
  }
}

impl fmt::Display for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Source {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.to_ascii_lowercase().as_str() {
      "ofac_sdn" => Ok(Source::OfacSdn),
      "us_csl" => Ok(Source::UsCsl),
      "eu_csl" => Ok(Source::EuCsl),
      "uk_csl" => Ok(Source::UkCsl),
      other => Err(format!("unknown source: {other}")),
    }
  }
}

/// Kind of identity described by an entity record.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
  Person,
  Business,
  Organization,
  Vessel,
  Aircraft,
  #[default]
  Unknown,
}

impl EntityType {
  pub fn as_str(&self) -> &'static str {
    match self {
      EntityType::Person => "person",
      EntityType::Business => "business",
      EntityType::Organization => "organization",
      EntityType::Vessel => "vessel",
      EntityType::Aircraft => "aircraft",
      EntityType::Unknown => "unknown",
    }
  }
}

impl fmt::Display for EntityType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for EntityType {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.to_ascii_lowercase().as_str() {
      "person" => Ok(EntityType::Person),
      "business" => Ok(EntityType::Business),
      "organization" => Ok(EntityType::Organization),
      "vessel" => Ok(EntityType::Vessel),
      "aircraft" => Ok(EntityType::Aircraft),
      "unknown" => Ok(EntityType::Unknown),
      other => Err(format!("unknown entity type: {other}")),
    }
  }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
  pub line1: String,
  pub line2: String,
  pub city: String,
  pub state: String,
  pub postal_code: String,
  pub country: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GovernmentId {
  #[serde(rename = "type")]
  pub id_type: Option<String>,
  pub identifier: String,
  pub country_code: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CryptoAddress {
  pub currency: String,
  pub address: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Contact {
  pub email: String,
  pub phone: String,
  pub fax: String,
  pub website: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonInfo {
  pub birth_date: Option<Date>,
  pub place_of_birth: String,
  pub titles: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BusinessInfo {
  pub registration_number: String,
  pub incorporation_date: Option<Date>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SanctionsInfo {
  pub programs: Vec<String>,
  pub remarks: String,
}

/// An identity known to be on a watchlist.
///
/// Parsers populate every field except [`Entity::prepared`], which is computed
/// by the preparation pipeline when the entity enters the index.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
  pub id: String,
  /// Identifier assigned by the source list, when it has one.
  #[serde(default)]
  pub source_id: String,
  pub primary_name: String,
  #[serde(default)]
  pub alt_names: Vec<String>,
  #[serde(rename = "type", default)]
  pub entity_type: EntityType,
  pub source: Source,
  #[serde(default)]
  pub addresses: Vec<Address>,
  #[serde(default)]
  pub government_ids: Vec<GovernmentId>,
  #[serde(default)]
  pub crypto_addresses: Vec<CryptoAddress>,
  #[serde(default)]
  pub contact: Contact,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub person: Option<PersonInfo>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub business: Option<BusinessInfo>,
  #[serde(default)]
  pub sanctions_info: SanctionsInfo,
  #[serde(default, skip_deserializing)]
  pub prepared: PreparedFields,
}

impl Entity {
  /// Minimal record, mostly useful to seed tests and fixtures.
  pub fn new(id: &str, source: Source, entity_type: EntityType, primary_name: &str) -> Entity {
    Entity {
      id: id.to_string(),
      source_id: String::new(),
      primary_name: primary_name.to_string(),
      alt_names: Vec::new(),
      entity_type,
      source,
      addresses: Vec::new(),
      government_ids: Vec::new(),
      crypto_addresses: Vec::new(),
      contact: Contact::default(),
      person: None,
      business: None,
      sanctions_info: SanctionsInfo::default(),
      prepared: PreparedFields::default(),
    }
  }

  pub fn birth_date(&self) -> Option<Date> {
    self.person.as_ref().and_then(|p| p.birth_date)
  }
}

/// Precomputed normalization outputs carried on every indexed entity.
///
/// Search-time scoring only ever reads these, never the raw names, so the
/// whole preparation pipeline runs exactly once per entity per refresh.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreparedFields {
  pub normalized_primary_name: String,
  pub normalized_alt_names: Vec<String>,
  pub normalized_names_without_stopwords: Vec<String>,
  pub normalized_names_without_company_titles: Vec<String>,
  /// Particle-merged variants, generated from the pre-stop-word forms. The
  /// first element is always the normalized primary name before stop-word
  /// removal.
  pub word_combinations: Vec<String>,
  pub normalized_addresses: Vec<String>,
  pub normalized_phones: Vec<String>,
  pub detected_language: Lang,
}

/// A partial entity submitted at search time.
///
/// Any subset of fields may be empty; the scorer only reads it.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryEntity {
  pub name: String,
  pub source_id: String,
  pub entity_type: Option<EntityType>,
  pub addresses: Vec<Address>,
  pub government_ids: Vec<GovernmentId>,
  pub crypto_addresses: Vec<CryptoAddress>,
  pub contact: Contact,
  pub birth_date: Option<Date>,

  // Precomputed once per request so per-candidate scoring never re-normalizes
  // the query side.
  #[serde(skip)]
  pub(crate) prepared: PreparedQuery,
}

impl QueryEntity {
  pub fn named(name: &str) -> QueryEntity {
    QueryEntity {
      name: name.to_string(),
      ..QueryEntity::default()
    }
  }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PreparedQuery {
  /// Normalized name before stop-word removal.
  pub name_pre: String,
  /// Normalized name after stop-word removal (equal to `name_pre` when
  /// stop-words are kept).
  pub normalized_name: String,
  pub language: Lang,
  pub normalized_phone: String,
}

/// Per-factor score decomposition returned with each match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
  pub name_score: f64,
  pub alt_names_score: f64,
  pub address_score: f64,
  pub gov_id_score: f64,
  pub crypto_score: f64,
  pub contact_score: f64,
  pub date_score: f64,
  pub total_weighted_score: f64,
}

impl ScoreBreakdown {
  pub(crate) fn exact(total: f64) -> ScoreBreakdown {
    ScoreBreakdown {
      name_score: 1.0,
      alt_names_score: 1.0,
      address_score: 1.0,
      gov_id_score: 1.0,
      crypto_score: 1.0,
      contact_score: 1.0,
      date_score: 1.0,
      total_weighted_score: total,
    }
  }
}

/// One ranked match out of a search, transient and never cached.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
  pub entity: Arc<Entity>,
  pub score: f64,
  pub breakdown: ScoreBreakdown,
}

#[cfg(test)]
mod tests {
  use super::{EntityType, Source};

  #[test]
  fn source_round_trip() {
    for source in Source::ALL {
      assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
    }

    assert_eq!("OFAC_SDN".parse::<Source>().unwrap(), Source::OfacSdn);
    assert!("interpol".parse::<Source>().is_err());
  }

  #[test]
  fn entity_type_parsing() {
    assert_eq!("PERSON".parse::<EntityType>().unwrap(), EntityType::Person);
    assert_eq!("vessel".parse::<EntityType>().unwrap(), EntityType::Vessel);
    assert!("submarine".parse::<EntityType>().is_err());
  }

  #[test]
  fn entity_json_shape() {
    let entity: super::Entity = serde_json::from_value(serde_json::json!({
      "id": "sdn-1234",
      "primaryName": "MADURO MOROS, Nicolas",
      "type": "person",
      "source": "ofac_sdn",
      "sanctionsInfo": { "programs": ["VENEZUELA"] },
    }))
    .unwrap();

    assert_eq!(entity.entity_type, super::EntityType::Person);
    assert_eq!(entity.source, Source::OfacSdn);
    assert!(entity.alt_names.is_empty());
    assert!(entity.prepared.normalized_primary_name.is_empty());
  }

  #[test]
  fn breakdown_serializes_camel_case() {
    let breakdown = super::ScoreBreakdown {
      name_score: 0.9,
      total_weighted_score: 0.9,
      ..super::ScoreBreakdown::default()
    };

    let value = serde_json::to_value(breakdown).unwrap();

    assert!(value.get("nameScore").is_some());
    assert!(value.get("altNamesScore").is_some());
    assert!(value.get("govIdScore").is_some());
    assert!(value.get("totalWeightedScore").is_some());
    assert!(value.get("name_score").is_none());
  }
}
