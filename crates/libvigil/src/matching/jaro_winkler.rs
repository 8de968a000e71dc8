use crate::config::SimilarityConfig;

/// Tuned Jaro-Winkler similarity.
///
/// On top of the classic prefix boost, the score is degraded when the inputs
/// have very different lengths or start with different letters, which keeps
/// short fragments from matching long names. Byte-equal inputs short-circuit
/// to 1.0 (plus the configured favoritism, clamped).
pub fn jaro_winkler(a: &str, b: &str, config: &SimilarityConfig) -> f64 {
  if a == b {
    return if a.is_empty() { 0.0 } else { (1.0 + config.exact_match_favoritism).clamp(0.0, 1.0) };
  }

  if a.is_empty() || b.is_empty() {
    return 0.0;
  }

  let a_chars = a.chars().collect::<Vec<_>>();
  let b_chars = b.chars().collect::<Vec<_>>();

  let jaro = jaro(&a_chars, &b_chars);

  let mut score = if jaro >= config.jaro_winkler_boost_threshold {
    let prefix = a_chars.iter().zip(b_chars.iter()).take(config.jaro_winkler_prefix_size).take_while(|(x, y)| x == y).count();

    jaro + prefix as f64 * 0.1 * (1.0 - jaro)
  } else {
    jaro
  };

  let short = a_chars.len().min(b_chars.len()) as f64;
  let long = a_chars.len().max(b_chars.len()) as f64;

  if short < long * config.length_difference_cutoff_factor {
    score *= 1.0 - config.length_difference_penalty_weight * (1.0 - short / long);
  }

  if a_chars[0] != b_chars[0] {
    score *= config.different_letter_penalty_weight;
  }

  score.clamp(0.0, 1.0)
}

fn jaro(a: &[char], b: &[char]) -> f64 {
  let window = (a.len().max(b.len()) / 2).saturating_sub(1);
  let mut b_taken = vec![false; b.len()];
  let mut a_matched = vec![false; a.len()];
  let mut matches = 0usize;

  for (i, ca) in a.iter().enumerate() {
    let low = i.saturating_sub(window);
    let high = (i + window + 1).min(b.len());

    for j in low..high {
      if !b_taken[j] && b[j] == *ca {
        b_taken[j] = true;
        a_matched[i] = true;
        matches += 1;

        break;
      }
    }
  }

  if matches == 0 {
    return 0.0;
  }

  let a_sequence = a.iter().enumerate().filter(|(i, _)| a_matched[*i]).map(|(_, c)| *c);
  let b_sequence = b.iter().enumerate().filter(|(j, _)| b_taken[*j]).map(|(_, c)| *c);
  let transposed = a_sequence.zip(b_sequence).filter(|(x, y)| x != y).count();

  let m = matches as f64;
  let t = (transposed / 2) as f64;

  (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}
