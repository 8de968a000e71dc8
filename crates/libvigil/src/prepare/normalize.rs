use std::borrow::Cow;

use any_ascii::any_ascii;
use unicode_normalization::UnicodeNormalization;

/// Canonical text form used by every name comparison.
///
/// Apostrophes are dropped before punctuation handling so "O'Brien" becomes
/// "obrien" rather than "o brien". Compatibility folding plus transliteration
/// makes accented letters compare equal to their base forms.
pub fn normalize(input: &str) -> String {
  let stripped = input.chars().filter(|c| !matches!(c, '\'' | '\u{2019}' | '\u{02BC}')).collect::<String>();
  let folded = any_ascii(&stripped.nfkc().collect::<String>()).to_lowercase();

  folded
    .chars()
    .map(|c| if c.is_alphanumeric() { c } else { ' ' })
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Reorder "LAST, First" SDN-style names into "First LAST".
///
/// Only applies when the name contains exactly one comma.
pub fn reorder_sdn_name(name: &str) -> Cow<'_, str> {
  if name.matches(',').count() != 1 {
    return Cow::Borrowed(name);
  }

  match name.split_once(',') {
    Some((last, first)) => Cow::Owned(format!("{} {}", first.trim(), last.trim()).trim().to_string()),
    None => Cow::Borrowed(name),
  }
}

/// Strip separators from government IDs and phone numbers so only the
/// alphanumeric payload takes part in equality comparisons.
pub fn normalize_id(input: &str) -> String {
  input.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Address fields only lose commas and periods; whitespace is preserved.
pub fn normalize_address_field(input: &str) -> String {
  input.to_lowercase().chars().filter(|c| !matches!(c, ',' | '.')).collect()
}

#[cfg(test)]
mod tests {
  use super::{normalize, normalize_address_field, normalize_id, reorder_sdn_name};

  #[test]
  fn normalize_basics() {
    assert_eq!(normalize("José de la Cruz Corporation LLC"), "jose de la cruz corporation llc");
    assert_eq!(normalize("  MADURO   MOROS,  Nicolas "), "maduro moros nicolas");
    assert_eq!(normalize(""), "");
  }

  #[test]
  fn apostrophes_are_stripped_not_spaced() {
    assert_eq!(normalize("O'Brien"), "obrien");
    assert_eq!(normalize("O\u{2019}Brien"), "obrien");
  }

  #[test]
  fn normalize_is_idempotent() {
    for name in ["José de la Cruz", "AL-QA'IDA", "  Ñandú  S.A. "] {
      let once = normalize(name);

      assert_eq!(normalize(&once), once);
    }
  }

  #[test]
  fn reorder_single_comma() {
    assert_eq!(reorder_sdn_name("SMITH, John Michael"), "John Michael SMITH");
    assert_eq!(reorder_sdn_name("No Comma Here"), "No Comma Here");
    assert_eq!(reorder_sdn_name("One, Two, Three"), "One, Two, Three");
  }

  #[test]
  fn id_normalization() {
    assert_eq!(normalize_id("V-12.345-678"), "V12345678");
    assert_eq!(normalize_id("+1 (555) 010-2030"), "15550102030");
    assert_eq!(normalize_id(""), "");
  }

  #[test]
  fn address_fields_keep_whitespace() {
    assert_eq!(normalize_address_field("123 Main St., Apt 4"), "123 main st apt 4");
  }
}
