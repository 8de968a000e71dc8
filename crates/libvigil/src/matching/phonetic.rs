use rphonetic::{Encoder, Soundex};

use crate::config::SimilarityConfig;

/// Soundex veto used to skip expensive comparisons.
///
/// Fails open: when filtering is disabled, either side is too short, or an
/// input cannot be encoded, the pair is considered compatible so the full
/// comparison still runs. This is only ever a veto, never a score.
pub fn compatible(a: &str, b: &str, config: &SimilarityConfig) -> bool {
  if config.phonetic_filtering_disabled {
    return true;
  }

  if a.chars().count() < 2 || b.chars().count() < 2 {
    return true;
  }

  let soundex = Soundex::default();
  let code_a = soundex.encode(a);
  let code_b = soundex.encode(b);

  if code_a.is_empty() || code_b.is_empty() {
    return true;
  }

  code_a == code_b
}
