//! Human reference ("1 Corinthians 13:4-7") → scripture API verse id ("1CO.13.4-1CO.13.7").
//!
//! Accepted shape, anchored at the start (anything after the match is ignored):
//!   [digit][space]Letters <whitespace> chapter:verse[-verseEnd]
//! A reference that doesn't fit is passed through unchanged; the API lookup then
//! fails and the resolver falls back to local text.

use std::collections::HashMap;

/// Fixed book codes understood by the scripture API.
const BOOK_CODES: &[(&str, &str)] = &[
  ("Genesis", "GEN"),
  ("Exodus", "EXO"),
  ("Matthew", "MAT"),
  ("Mark", "MRK"),
  ("Luke", "LUK"),
  ("John", "JHN"),
  ("Romans", "ROM"),
  ("Psalm", "PSA"),
  ("Psalms", "PSA"),
  ("1 Corinthians", "1CO"),
  ("2 Corinthians", "2CO"),
  ("Galatians", "GAL"),
  ("Ephesians", "EPH"),
  ("Philippians", "PHP"),
  ("Colossians", "COL"),
  ("1 Thessalonians", "1TH"),
  ("2 Thessalonians", "2TH"),
  ("Revelation", "REV"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedReference {
  pub book: String,
  pub chapter: String,
  pub verse_start: String,
  pub verse_end: Option<String>,
}

/// Book-name → code table: the built-in entries plus any configured extras.
/// Extras win over built-ins with the same name.
#[derive(Clone, Debug, Default)]
pub struct BookCodes {
  extra: HashMap<String, String>,
}

impl BookCodes {
  pub fn with_overrides(extra: HashMap<String, String>) -> Self {
    Self { extra }
  }

  /// Known code, or the first three characters of the name uppercased.
  pub fn code_for(&self, book: &str) -> String {
    if let Some(code) = self.extra.get(book) {
      return code.clone();
    }
    BOOK_CODES
      .iter()
      .find(|(name, _)| *name == book)
      .map(|(_, code)| code.to_string())
      .unwrap_or_else(|| book.chars().take(3).collect::<String>().to_uppercase())
  }
}

pub fn parse_reference(reference: &str) -> Option<ParsedReference> {
  let mut cur = Cursor::new(reference);

  let book_start = cur.pos;
  cur.eat_one(|c| c.is_ascii_digit());
  cur.eat_one(char::is_whitespace);
  if cur.eat_many(|c| c.is_ascii_alphabetic()) == 0 {
    return None;
  }
  let book = reference[book_start..cur.pos].trim().to_string();

  if cur.eat_many(char::is_whitespace) == 0 {
    return None;
  }
  let chapter = cur.digits()?;
  if !cur.eat_one(|c| c == ':') {
    return None;
  }
  let verse_start = cur.digits()?;

  // "-N" is optional; a dangling '-' just ends the match
  let verse_end = {
    let save = cur.pos;
    if cur.eat_one(|c| c == '-') {
      match cur.digits() {
        Some(d) => Some(d),
        None => {
          cur.pos = save;
          None
        }
      }
    } else {
      None
    }
  };

  Some(ParsedReference { book, chapter, verse_start, verse_end })
}

/// Convert a human reference into the API's verse id, or return it unchanged.
pub fn to_verse_id(reference: &str, codes: &BookCodes) -> String {
  let Some(p) = parse_reference(reference) else {
    return reference.to_string();
  };
  let code = codes.code_for(&p.book);
  match p.verse_end {
    Some(end) => format!("{code}.{ch}.{v}-{code}.{ch}.{end}", ch = p.chapter, v = p.verse_start),
    None => format!("{code}.{}.{}", p.chapter, p.verse_start),
  }
}

struct Cursor<'a> {
  src: &'a str,
  pos: usize,
}

impl<'a> Cursor<'a> {
  fn new(src: &'a str) -> Self {
    Self { src, pos: 0 }
  }

  fn peek(&self) -> Option<char> {
    self.src[self.pos..].chars().next()
  }

  fn eat_one(&mut self, pred: impl Fn(char) -> bool) -> bool {
    match self.peek() {
      Some(c) if pred(c) => {
        self.pos += c.len_utf8();
        true
      }
      _ => false,
    }
  }

  fn eat_many(&mut self, pred: impl Fn(char) -> bool) -> usize {
    let mut n = 0;
    while self.eat_one(&pred) {
      n += 1;
    }
    n
  }

  fn digits(&mut self) -> Option<String> {
    let start = self.pos;
    if self.eat_many(|c| c.is_ascii_digit()) == 0 {
      return None;
    }
    Some(self.src[start..self.pos].to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn id(reference: &str) -> String {
    to_verse_id(reference, &BookCodes::default())
  }

  #[test]
  fn single_verse_maps_known_book() {
    assert_eq!(id("John 3:16"), "JHN.3.16");
    assert_eq!(id("Psalm 23:1"), "PSA.23.1");
    assert_eq!(id("Psalms 46:10"), "PSA.46.10");
  }

  #[test]
  fn numbered_book_with_range() {
    assert_eq!(id("1 Corinthians 13:4-7"), "1CO.13.4-1CO.13.7");
    assert_eq!(id("2 Thessalonians 3:3"), "2TH.3.3");
  }

  #[test]
  fn unknown_book_falls_back_to_three_letters() {
    assert_eq!(id("Proverbs 3:5-6"), "PRO.3.5-PRO.3.6");
    assert_eq!(id("Isaiah 40:31"), "ISA.40.31");
    assert_eq!(id("1 Peter 5:7"), "1 P.5.7");
    assert_eq!(id("1John 4:8"), "1JO.4.8");
  }

  #[test]
  fn unmatched_reference_passes_through() {
    assert_eq!(id("Song of Solomon 2:4"), "Song of Solomon 2:4");
    assert_eq!(id("John 3"), "John 3");
    assert_eq!(id("3:16"), "3:16");
    assert_eq!(id(""), "");
  }

  #[test]
  fn trailing_text_and_dangling_dash_are_ignored() {
    assert_eq!(id("Romans 8:28 (NIV)"), "ROM.8.28");
    assert_eq!(id("Romans 8:28-"), "ROM.8.28");
    assert_eq!(id("Romans  8:28-30b"), "ROM.8.28-ROM.8.30");
  }

  #[test]
  fn parse_exposes_parts() {
    let p = parse_reference("2 Corinthians 5:17").unwrap();
    assert_eq!(p.book, "2 Corinthians");
    assert_eq!(p.chapter, "5");
    assert_eq!(p.verse_start, "17");
    assert_eq!(p.verse_end, None);
  }

  #[test]
  fn configured_codes_override_and_extend() {
    let mut extra = HashMap::new();
    extra.insert("Proverbs".to_string(), "PRO".to_string());
    extra.insert("John".to_string(), "JOH".to_string());
    extra.insert("1 Peter".to_string(), "1PE".to_string());
    let codes = BookCodes::with_overrides(extra);
    assert_eq!(to_verse_id("John 1:1", &codes), "JOH.1.1");
    assert_eq!(to_verse_id("1 Peter 5:7", &codes), "1PE.5.7");
    assert_eq!(to_verse_id("Mark 1:1", &codes), "MRK.1.1");
  }
}
