//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings.
/// Counts characters, not bytes: model output here is mostly Cyrillic and a
/// byte cut could land inside a code point.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_chars).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_replaces_all_keys() {
    let out = fill_template("{score} из {total}", &[("score", "7"), ("total", "10")]);
    assert_eq!(out, "7 из 10");
  }

  #[test]
  fn truncation_respects_character_boundaries() {
    let s = "Вопрос про рыбалку";
    let t = trunc_for_log(s, 6);
    assert!(t.starts_with("Вопрос…"));
    assert!(trunc_for_log("short", 10) == "short");
  }
}
