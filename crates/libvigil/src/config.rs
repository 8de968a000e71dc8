use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;
use validator::Validate;

/// Tunables for the string similarity primitives.
#[serde_inline_default]
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityConfig {
  /// Jaro score above which the Winkler common-prefix boost applies.
  #[serde_inline_default(0.7)]
  #[validate(range(min = 0.0, max = 1.0))]
  pub jaro_winkler_boost_threshold: f64,
  /// Maximum common-prefix length considered by the Winkler boost.
  #[serde_inline_default(4)]
  pub jaro_winkler_prefix_size: usize,
  /// Length ratio under which the length-difference penalty kicks in.
  #[serde_inline_default(0.9)]
  #[validate(range(min = 0.0, max = 1.0))]
  pub length_difference_cutoff_factor: f64,
  #[serde_inline_default(0.3)]
  #[validate(range(min = 0.0, max = 1.0))]
  pub length_difference_penalty_weight: f64,
  /// Multiplier applied when the two strings start with different letters.
  #[serde_inline_default(0.9)]
  #[validate(range(min = 0.0, max = 1.0))]
  pub different_letter_penalty_weight: f64,
  /// Bonus added to byte-equal strings, clamped to 1.0.
  #[serde_inline_default(0.0)]
  #[validate(range(min = 0.0, max = 1.0))]
  pub exact_match_favoritism: f64,
  /// Penalty per candidate token left unpaired by the best-pairs aggregator.
  #[serde_inline_default(0.15)]
  #[validate(range(min = 0.0, max = 1.0))]
  pub unmatched_index_token_weight: f64,
  #[serde_inline_default(false)]
  pub phonetic_filtering_disabled: bool,
  /// Keep stop-words in the normalized primary and alternate names.
  #[serde_inline_default(false)]
  pub keep_stopwords: bool,
}

impl Default for SimilarityConfig {
  fn default() -> SimilarityConfig {
    SimilarityConfig {
      jaro_winkler_boost_threshold: 0.7,
      jaro_winkler_prefix_size: 4,
      length_difference_cutoff_factor: 0.9,
      length_difference_penalty_weight: 0.3,
      different_letter_penalty_weight: 0.9,
      exact_match_favoritism: 0.0,
      unmatched_index_token_weight: 0.15,
      phonetic_filtering_disabled: false,
      keep_stopwords: false,
    }
  }
}

/// Per-factor toggles for the entity scorer.
#[serde_inline_default]
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePhases {
  #[serde_inline_default(true)]
  pub name: bool,
  #[serde_inline_default(true)]
  pub alt_name: bool,
  #[serde_inline_default(true)]
  pub address: bool,
  #[serde_inline_default(true)]
  pub gov_id: bool,
  #[serde_inline_default(true)]
  pub crypto: bool,
  #[serde_inline_default(true)]
  pub contact: bool,
  #[serde_inline_default(true)]
  pub date: bool,
}

impl Default for ScorePhases {
  fn default() -> ScorePhases {
    ScorePhases {
      name: true,
      alt_name: true,
      address: true,
      gov_id: true,
      crypto: true,
      contact: true,
      date: true,
    }
  }
}

/// Weights and thresholds for the multi-factor aggregation.
#[serde_inline_default]
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WeightConfig {
  #[serde_inline_default(35.0)]
  #[validate(range(min = 0.0))]
  pub name_weight: f64,
  #[serde_inline_default(25.0)]
  #[validate(range(min = 0.0))]
  pub address_weight: f64,
  /// Weight of government ID, crypto address and contact parity.
  #[serde_inline_default(50.0)]
  #[validate(range(min = 0.0))]
  pub critical_id_weight: f64,
  #[serde_inline_default(15.0)]
  #[validate(range(min = 0.0))]
  pub supporting_info_weight: f64,
  /// Default floor under which results are dropped by the search pipeline.
  #[serde_inline_default(0.88)]
  #[validate(range(min = 0.0, max = 1.0))]
  pub minimum_score: f64,
  /// Factor score at which a critical identifier counts as an exact match.
  #[serde_inline_default(0.99)]
  #[validate(range(min = 0.0, max = 1.0))]
  pub exact_match_threshold: f64,
  #[serde(default)]
  pub enabled: ScorePhases,
}

impl Default for WeightConfig {
  fn default() -> WeightConfig {
    WeightConfig {
      name_weight: 35.0,
      address_weight: 25.0,
      critical_id_weight: 50.0,
      supporting_info_weight: 15.0,
      minimum_score: 0.88,
      exact_match_threshold: 0.99,
      enabled: ScorePhases::default(),
    }
  }
}

/// Typed, validated container for every scoring tunable.
///
/// One instance lives in process state; admin updates replace it wholesale so
/// a scorer never observes fields from two generations.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Validate)]
pub struct ScoreConfig {
  #[serde(default)]
  #[validate(nested)]
  pub similarity: SimilarityConfig,
  #[serde(default)]
  #[validate(nested)]
  pub weights: WeightConfig,
}
