use std::{
  collections::{HashMap, HashSet},
  sync::LazyLock,
};

use serde::Deserialize;

use crate::prepare::{Dictionaries, language::Lang};

pub(crate) static STOPWORDS: LazyLock<HashMap<Lang, HashSet<String>>> = LazyLock::new(|| {
  let file = Dictionaries::get("stopwords.yml").expect("could not read stopwords dictionary");
  let dictionary = serde_yaml::from_slice::<StopwordDictionary>(&file.data).expect("could not unmarshal stopwords dictionary");

  dictionary
    .languages
    .into_iter()
    .map(|(lang, words)| (lang, words.into_iter().map(|w| w.to_lowercase()).collect()))
    .collect()
});

#[derive(Deserialize)]
struct StopwordDictionary {
  languages: HashMap<Lang, Vec<String>>,
}

/// Remove whole-token stop-words for the given language.
///
/// A name made up entirely of stop-words is returned unchanged, so the
/// prepared fields never end up with an empty primary name.
pub fn remove(name: &str, lang: Lang) -> String {
  let Some(words) = STOPWORDS.get(&lang) else {
    return name.to_string();
  };

  let kept = name.split_whitespace().filter(|token| !words.contains(*token)).collect::<Vec<_>>();

  if kept.is_empty() { name.to_string() } else { kept.join(" ") }
}
