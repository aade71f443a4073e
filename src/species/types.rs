use serde::{Deserialize, Serialize};

/// One endangered species entry as held by the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesRecord {
  pub id: i64,
  pub name: Option<String>,
  /// Taxonomic group, e.g. "Mammals". Partition key of the local store.
  pub category: Option<String>,
  pub scientific_name: Option<String>,
  pub conservation_status: Option<String>,
  pub image_url: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
  /// Epoch millis of the fetch that produced this record
  pub last_fetched: i64,
}

impl SpeciesRecord {
  /// Age of this record relative to `now_millis`.
  pub fn age_millis(&self, now_millis: i64) -> i64 {
    now_millis - self.last_fetched
  }

  /// Display name, falling back to the scientific name and then the id.
  pub fn display_name(&self) -> String {
    self
      .name
      .clone()
      .or_else(|| self.scientific_name.clone())
      .unwrap_or_else(|| format!("#{}", self.id))
  }
}

/// Normalize a category to the form used as the store key.
///
/// A lowercase first character is title-cased and the rest is kept as
/// given, so "mammals" and "Mammals" address the same partition. Any other
/// first character is left alone.
pub fn normalize_category(category: &str) -> String {
  let mut chars = category.chars();
  match chars.next() {
    Some(first) if first.is_lowercase() => {
      let mut key = titlecase(first);
      key.extend(chars);
      key
    }
    Some(_) => category.to_string(),
    None => String::new(),
  }
}

/// Title case of one character. Digraphs have their own title-case form;
/// a character whose upper case expands keeps only the first letter upper
/// ('ß' becomes "Ss").
fn titlecase(c: char) -> String {
  match c {
    '\u{01C4}' | '\u{01C5}' | '\u{01C6}' => '\u{01C5}'.to_string(),
    '\u{01C7}' | '\u{01C8}' | '\u{01C9}' => '\u{01C8}'.to_string(),
    '\u{01CA}' | '\u{01CB}' | '\u{01CC}' => '\u{01CB}'.to_string(),
    '\u{01F1}' | '\u{01F2}' | '\u{01F3}' => '\u{01F2}'.to_string(),
    _ => {
      let mut upper = c.to_uppercase();
      let mut out: String = upper.next().into_iter().collect();
      out.extend(upper.flat_map(char::to_lowercase));
      out
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalize_lowercase() {
    assert_eq!(normalize_category("mammals"), "Mammals");
  }

  #[test]
  fn test_normalize_keeps_rest_as_given() {
    assert_eq!(normalize_category("Birds"), "Birds");
    assert_eq!(normalize_category("rEPTILES"), "REPTILES");
  }

  #[test]
  fn test_normalize_digraph_uses_titlecase() {
    // dž -> Dž, not DŽ
    assert_eq!(normalize_category("\u{01C6}ungla"), "\u{01C5}ungla");
    // Already title case, not lowercase: untouched
    assert_eq!(normalize_category("\u{01C5}ungla"), "\u{01C5}ungla");
  }

  #[test]
  fn test_normalize_other_first_chars() {
    assert_eq!(normalize_category("1mammals"), "1mammals");
    assert_eq!(normalize_category("\u{00DF}x"), "Ssx");
  }

  #[test]
  fn test_normalize_empty() {
    assert_eq!(normalize_category(""), "");
  }

  #[test]
  fn test_display_name_fallbacks() {
    let mut record = SpeciesRecord {
      id: 7,
      name: None,
      category: None,
      scientific_name: Some("Panthera tigris".into()),
      conservation_status: None,
      image_url: None,
      created_at: None,
      updated_at: None,
      last_fetched: 0,
    };
    assert_eq!(record.display_name(), "Panthera tigris");

    record.scientific_name = None;
    assert_eq!(record.display_name(), "#7");
  }
}
