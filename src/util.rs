//! Small text helpers shared by the game engine and the services.

/// Punctuation removed before any answer comparison. Nothing else is stripped.
const IGNORED_PUNCTUATION: [char; 8] = ['.', ',', '!', '?', ';', ':', '"', '\''];

/// Split verse text on runs of whitespace. Punctuation stays attached to words.
pub fn tokenize(text: &str) -> Vec<String> {
  text.split_whitespace().map(str::to_string).collect()
}

/// Lowercase, strip the ignored punctuation, trim.
/// Applying it twice gives the same result as applying it once.
pub fn normalize(s: &str) -> String {
  s.to_lowercase()
    .chars()
    .filter(|c| !IGNORED_PUNCTUATION.contains(c))
    .collect::<String>()
    .trim()
    .to_string()
}

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings (char-boundary aware).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_strips_only_listed_punctuation() {
    assert_eq!(normalize("  \"Love,\" IS patient!  "), "love is patient");
    assert_eq!(normalize("don't"), "dont");
    // hyphens and parentheses are kept
    assert_eq!(normalize("(long-suffering)"), "(long-suffering)");
  }

  #[test]
  fn normalize_is_idempotent() {
    let samples = [
      "For God so loved the world,",
      "  ' . ; : '  ",
      "Ünïcode Ärger: ÉÉ!",
      "",
      "a\tb\nc.",
      "\"Jesus wept.\"",
    ];
    for s in samples {
      let once = normalize(s);
      assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
    }
  }

  #[test]
  fn tokenize_collapses_whitespace_runs() {
    assert_eq!(tokenize("  In the\tbeginning \n God "), vec!["In", "the", "beginning", "God"]);
    assert!(tokenize("   ").is_empty());
  }

  #[test]
  fn fill_template_replaces_all_keys() {
    let out = fill_template("/bibles/{bible}/verses/{verse}", &[("bible", "de4e"), ("verse", "JHN.3.16")]);
    assert_eq!(out, "/bibles/de4e/verses/JHN.3.16");
  }

  #[test]
  fn trunc_for_log_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let t = trunc_for_log("ééééé", 2);
    assert!(t.starts_with("éé…"));
  }
}
