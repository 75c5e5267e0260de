//! Request descriptors: the canonical keys of the query cache.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// One primitive element of a descriptor.
///
/// Maps are ordered so two descriptors built with the same fields in a
/// different order serialize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
  Null,
  Bool(bool),
  Int(i64),
  Str(String),
  Map(BTreeMap<String, Param>),
}

impl Param {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Param::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Param::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&BTreeMap<String, Param>> {
    match self {
      Param::Map(m) => Some(m),
      _ => None,
    }
  }

  /// Build a map param from `(field, value)` pairs.
  pub fn map<K, V, I>(pairs: I) -> Self
  where
    K: Into<String>,
    V: Into<Param>,
    I: IntoIterator<Item = (K, V)>,
  {
    Param::Map(
      pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect(),
    )
  }
}

impl From<&str> for Param {
  fn from(s: &str) -> Self {
    Param::Str(s.to_string())
  }
}

impl From<String> for Param {
  fn from(s: String) -> Self {
    Param::Str(s)
  }
}

impl From<&String> for Param {
  fn from(s: &String) -> Self {
    Param::Str(s.clone())
  }
}

impl From<i64> for Param {
  fn from(i: i64) -> Self {
    Param::Int(i)
  }
}

impl From<u32> for Param {
  fn from(i: u32) -> Self {
    Param::Int(i64::from(i))
  }
}

impl From<bool> for Param {
  fn from(b: bool) -> Self {
    Param::Bool(b)
  }
}

impl<T: Into<Param>> From<Option<T>> for Param {
  fn from(v: Option<T>) -> Self {
    v.map(Into::into).unwrap_or(Param::Null)
  }
}

impl fmt::Display for Param {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Param::Null => write!(f, "-"),
      Param::Bool(b) => write!(f, "{}", b),
      Param::Int(i) => write!(f, "{}", i),
      Param::Str(s) => write!(f, "{:?}", s),
      Param::Map(m) => {
        write!(f, "{{")?;
        for (i, (k, v)) in m.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}")
      }
    }
  }
}

/// Identifies one fetchable resource: a category followed by parameters.
///
/// Equality is structural. `key()` is the stable string form used by the
/// cache, `hash()` the fixed-length form used for persisted snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Descriptor {
  parts: Vec<Param>,
}

impl Descriptor {
  pub fn new(category: impl Into<String>) -> Self {
    Self {
      parts: vec![Param::Str(category.into())],
    }
  }

  /// Append a parameter.
  pub fn with(mut self, param: impl Into<Param>) -> Self {
    self.parts.push(param.into());
    self
  }

  /// Append a map parameter built from `(field, value)` pairs.
  pub fn with_map<K, V, I>(self, pairs: I) -> Self
  where
    K: Into<String>,
    V: Into<Param>,
    I: IntoIterator<Item = (K, V)>,
  {
    self.with(Param::map(pairs))
  }

  pub fn category(&self) -> &str {
    self.parts.first().and_then(Param::as_str).unwrap_or("")
  }

  /// Parameters after the category.
  pub fn params(&self) -> &[Param] {
    self.parts.get(1..).unwrap_or(&[])
  }

  pub fn param(&self, index: usize) -> Option<&Param> {
    self.params().get(index)
  }

  /// String field of a map parameter. Missing fields read as "".
  pub fn map_str(&self, index: usize, field: &str) -> &str {
    self
      .param(index)
      .and_then(Param::as_map)
      .and_then(|m| m.get(field))
      .and_then(Param::as_str)
      .unwrap_or("")
  }

  /// Stable cache key. Equal keys mean structurally equal descriptors.
  pub fn key(&self) -> String {
    // A Vec<Param> holds only strings, ints, bools, nulls and string-keyed
    // maps, none of which can fail to serialize.
    serde_json::to_string(&self.parts).unwrap_or_default()
  }

  /// Hex SHA-256 of the key.
  pub fn hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.key().as_bytes());
    hex::encode(hasher.finalize())
  }

  fn starts_with(&self, prefix: &[Param]) -> bool {
    self.parts.len() >= prefix.len() && self.parts[..prefix.len()] == *prefix
  }
}

impl fmt::Display for Descriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.category())?;
    for p in self.params() {
      write!(f, " {}", p)?;
    }
    Ok(())
  }
}

/// Which cache entries a mutation affects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorPattern {
  /// Every descriptor whose leading elements equal the given ones.
  Prefix(Vec<Param>),
  /// Exactly one descriptor.
  Exact(Descriptor),
}

impl DescriptorPattern {
  /// Every descriptor.
  pub fn all() -> Self {
    DescriptorPattern::Prefix(Vec::new())
  }

  /// Every descriptor of a category.
  pub fn category(name: impl Into<String>) -> Self {
    DescriptorPattern::Prefix(vec![Param::Str(name.into())])
  }

  pub fn prefix(descriptor: &Descriptor) -> Self {
    DescriptorPattern::Prefix(descriptor.parts.clone())
  }

  pub fn exact(descriptor: &Descriptor) -> Self {
    DescriptorPattern::Exact(descriptor.clone())
  }

  pub fn matches(&self, descriptor: &Descriptor) -> bool {
    match self {
      DescriptorPattern::Prefix(prefix) => descriptor.starts_with(prefix),
      DescriptorPattern::Exact(d) => d == descriptor,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn search(q: &str, location: &str) -> Descriptor {
    Descriptor::new("internships").with_map([("q", q), ("location", location)])
  }

  #[test]
  fn test_structural_equality() {
    let a = search("intern", "India");
    let b = Descriptor::new("internships").with_map([("location", "India"), ("q", "intern")]);
    assert_eq!(a, b);
    assert_eq!(a.key(), b.key());
    assert_eq!(a.hash(), b.hash());
  }

  #[test]
  fn test_different_params_different_key() {
    assert_ne!(search("intern", "India").key(), search("intern", "Remote").key());
    assert_ne!(
      Descriptor::new("roadmap").with(1i64).key(),
      Descriptor::new("roadmap").with("1").key()
    );
  }

  #[test]
  fn test_key_format() {
    let d = Descriptor::new("roadmap").with("data-scientist");
    assert_eq!(d.key(), r#"["roadmap","data-scientist"]"#);
    assert_eq!(d.hash().len(), 64);
  }

  #[test]
  fn test_accessors() {
    let d = search("intern", "India");
    assert_eq!(d.category(), "internships");
    assert_eq!(d.map_str(0, "q"), "intern");
    assert_eq!(d.map_str(0, "location"), "India");
    assert_eq!(d.map_str(0, "missing"), "");
    assert_eq!(d.map_str(5, "q"), "");
  }

  #[test]
  fn test_option_param_is_null() {
    let d = Descriptor::new("books").with(None::<String>);
    assert_eq!(d.param(0), Some(&Param::Null));
    assert_eq!(d.key(), r#"["books",null]"#);
  }

  #[test]
  fn test_key_deserializes_back() {
    let d = search("intern", "India").with(3u32).with(true);
    let parts: Vec<Param> = serde_json::from_str(&d.key()).unwrap();
    assert_eq!(Descriptor { parts }, d);
  }

  #[test]
  fn test_category_pattern() {
    let pattern = DescriptorPattern::category("internships");
    assert!(pattern.matches(&search("intern", "India")));
    assert!(pattern.matches(&Descriptor::new("internships")));
    assert!(!pattern.matches(&Descriptor::new("books")));
    assert!(DescriptorPattern::all().matches(&Descriptor::new("books")));
  }

  #[test]
  fn test_prefix_and_exact_patterns() {
    let roadmap = Descriptor::new("roadmap").with("ux-designer");
    let detailed = roadmap.clone().with(2i64);

    let prefix = DescriptorPattern::prefix(&roadmap);
    assert!(prefix.matches(&roadmap));
    assert!(prefix.matches(&detailed));
    assert!(!prefix.matches(&Descriptor::new("roadmap").with("analyst")));

    let exact = DescriptorPattern::exact(&roadmap);
    assert!(exact.matches(&roadmap));
    assert!(!exact.matches(&detailed));
  }

  #[test]
  fn test_display() {
    let d = search("intern", "India");
    assert_eq!(d.to_string(), r#"internships {location: "India", q: "intern"}"#);
  }
}
