use std::sync::LazyLock;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use serde::Deserialize;

use crate::prepare::Dictionaries;

pub(crate) static COMPANY_SUFFIXES: LazyLock<AhoCorasick> = LazyLock::new(|| {
  let file = Dictionaries::get("company_suffixes.yml").expect("could not read company suffixes dictionary");
  let dictionary = serde_yaml::from_slice::<SuffixDictionary>(&file.data).expect("could not unmarshal company suffixes dictionary");

  AhoCorasickBuilder::new()
    .match_kind(MatchKind::LeftmostLongest)
    .build(dictionary.suffixes.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>())
    .expect("could not build company suffix automaton")
});

#[derive(Deserialize)]
struct SuffixDictionary {
  suffixes: Vec<String>,
}

/// Strip trailing corporate form suffixes, repeating until none matches.
///
/// A suffix only counts when preceded by whitespace, so a name that is
/// nothing but a corporate form ("llc") survives untouched.
pub fn strip_company_titles(name: &str) -> String {
  let mut current = name.trim_end().to_string();

  loop {
    let mut cut: Option<usize> = None;

    for mat in COMPANY_SUFFIXES.find_iter(&current) {
      if mat.end() == current.len() && mat.start() > 0 && current.as_bytes()[mat.start() - 1] == b' ' {
        cut = Some(mat.start());
      }
    }

    match cut {
      Some(position) => current = current[..position].trim_end().to_string(),
      None => return current,
    }
  }
}

#[cfg(test)]
mod tests {
  #[test]
  fn strips_iteratively() {
    assert_eq!(super::strip_company_titles("jose cruz corporation llc"), "jose cruz");
    assert_eq!(super::strip_company_titles("acme holdings ltd co"), "acme holdings");
  }

  #[test]
  fn spaced_out_forms() {
    assert_eq!(super::strip_company_titles("acme l l c"), "acme");
  }

  #[test]
  fn only_trailing_suffixes_are_stripped() {
    assert_eq!(super::strip_company_titles("corp of engineers"), "corp of engineers");
    assert_eq!(super::strip_company_titles("blanco"), "blanco");
  }

  #[test]
  fn bare_suffix_survives() {
    assert_eq!(super::strip_company_titles("llc"), "llc");
  }
}
