//! Named-entity records and the co-occurrence counter.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

// ─── Labels ──────────────────────────────────────────────────────────────────

/// NER label attached to a mention. Unknown labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityLabel {
  Person,
  Org,
  Gpe,
  Loc,
  Norp,
  Other(String),
}

impl EntityLabel {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Person => "PERSON",
      Self::Org => "ORG",
      Self::Gpe => "GPE",
      Self::Loc => "LOC",
      Self::Norp => "NORP",
      Self::Other(s) => s,
    }
  }
}

impl From<String> for EntityLabel {
  fn from(s: String) -> Self {
    match s.to_ascii_uppercase().as_str() {
      "PERSON" => Self::Person,
      "ORG" => Self::Org,
      "GPE" => Self::Gpe,
      "LOC" => Self::Loc,
      "NORP" => Self::Norp,
      _ => Self::Other(s),
    }
  }
}

impl From<&str> for EntityLabel {
  fn from(s: &str) -> Self { Self::from(s.to_owned()) }
}

impl From<EntityLabel> for String {
  fn from(l: EntityLabel) -> Self { l.as_str().to_owned() }
}

impl std::fmt::Display for EntityLabel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// An entity aggregated over the corpus (or over a file subset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
  pub name:     String,
  pub label:    EntityLabel,
  pub mentions: i64,
  pub files:    i64,
}

/// A single per-file mention row, joined with its file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMention {
  pub name:     String,
  pub label:    EntityLabel,
  pub file_id:  i64,
  pub filename: String,
  pub dataset:  i64,
  pub mentions: i64,
}

/// An undirected edge; `a < b` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooccurrenceEdge {
  pub a:      String,
  pub b:      String,
  pub weight: i64,
}

impl CooccurrenceEdge {
  /// Build an edge in canonical (lexicographic) order.
  pub fn new(x: impl Into<String>, y: impl Into<String>, weight: i64) -> Self {
    let (x, y) = (x.into(), y.into());
    if x <= y {
      Self { a: x, b: y, weight }
    } else {
      Self { a: y, b: x, weight }
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooccurrenceReport {
  pub documents:         i64,
  pub skipped_documents: i64,
  pub pairs:             i64,
}

// ─── Counter ─────────────────────────────────────────────────────────────────

/// Counts, for each unordered pair of distinct entities, the number of
/// documents containing both.
///
/// Names are interned so a pair costs two `u32`s regardless of name length.
/// A document contributes at most 1 to any pair.
pub struct CooccurrenceCounter {
  max_entities: usize,
  ids:          HashMap<String, u32>,
  names:        Vec<String>,
  pairs:        HashMap<(u32, u32), i64>,
  report:       CooccurrenceReport,
}

impl CooccurrenceCounter {
  /// Documents with more than `max_entities` distinct names are skipped.
  pub fn new(max_entities: usize) -> Self {
    Self {
      max_entities,
      ids: HashMap::new(),
      names: Vec::new(),
      pairs: HashMap::new(),
      report: CooccurrenceReport::default(),
    }
  }

  fn intern(&mut self, name: &str) -> u32 {
    if let Some(&id) = self.ids.get(name) {
      return id;
    }
    let id = self.names.len() as u32;
    self.names.push(name.to_owned());
    self.ids.insert(name.to_owned(), id);
    id
  }

  /// Add one document's mentions. Returns `false` if it was skipped.
  pub fn add_document<I, S>(&mut self, names: I) -> bool
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let distinct: BTreeSet<String> = names
      .into_iter()
      .map(|n| n.as_ref().to_owned())
      .filter(|n| !n.is_empty())
      .collect();

    if distinct.is_empty() {
      return true;
    }
    if distinct.len() > self.max_entities {
      self.report.skipped_documents += 1;
      return false;
    }
    self.report.documents += 1;

    // Sorted input, so (ids[i], ids[j]) with i < j is already canonical.
    let ids: Vec<u32> = distinct.iter().map(|n| self.intern(n)).collect();
    for (i, &a) in ids.iter().enumerate() {
      for &b in &ids[i + 1..] {
        *self.pairs.entry((a, b)).or_insert(0) += 1;
      }
    }
    true
  }

  pub fn report(&self) -> CooccurrenceReport {
    CooccurrenceReport { pairs: self.pairs.len() as i64, ..self.report.clone() }
  }

  /// Consume the counter, returning edges sorted by weight desc then names.
  pub fn into_edges(self) -> (Vec<CooccurrenceEdge>, CooccurrenceReport) {
    let report = self.report();
    let names = self.names;
    let mut edges: Vec<CooccurrenceEdge> = self
      .pairs
      .into_iter()
      .map(|((a, b), weight)| CooccurrenceEdge {
        a: names[a as usize].clone(),
        b: names[b as usize].clone(),
        weight,
      })
      .collect();
    edges.sort_by(|x, y| {
      y.weight.cmp(&x.weight).then_with(|| (&x.a, &x.b).cmp(&(&y.a, &y.b)))
    });
    (edges, report)
  }
}
