use serde::{Deserialize, Serialize};

/// Heuristic language tag, used to pick the stop-word list.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
  #[default]
  En,
  Es,
  Fr,
  De,
  It,
  Pt,
  Ar,
  Ru,
  Zh,
}

impl Lang {
  pub fn as_str(&self) -> &'static str {
    match self {
      Lang::En => "en",
      Lang::Es => "es",
      Lang::Fr => "fr",
      Lang::De => "de",
      Lang::It => "it",
      Lang::Pt => "pt",
      Lang::Ar => "ar",
      Lang::Ru => "ru",
      Lang::Zh => "zh",
    }
  }
}

/// Detect the likely language of a name.
///
/// Names are short, so detection is best-effort; anything unrecognized or
/// outside the supported stop-word lists falls back to English.
pub fn detect(text: &str) -> Lang {
  if text.trim().is_empty() {
    return Lang::En;
  }

  let Some(info) = whatlang::detect(text) else {
    return Lang::En;
  };

  match info.lang().code() {
    "spa" => Lang::Es,
    "fra" => Lang::Fr,
    "deu" => Lang::De,
    "ita" => Lang::It,
    "por" => Lang::Pt,
    "ara" => Lang::Ar,
    "rus" => Lang::Ru,
    "cmn" => Lang::Zh,
    _ => Lang::En,
  }
}
