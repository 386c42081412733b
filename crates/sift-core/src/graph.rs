//! Entity graph assembly for external rendering.
//!
//! The backend supplies candidate nodes and edges; [`assemble`] applies the
//! selection and styling rules and returns a serializable [`Graph`]. The
//! graph is derived data: it may be cached to disk but is never the record.

use std::{
  collections::{BTreeMap, BTreeSet},
  path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  entity::{CooccurrenceEdge, EntityLabel, EntitySummary},
};

/// Parameters for [`CorpusStore::build_graph`](crate::store::CorpusStore::build_graph).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphParams {
  pub min_shared_files: i64,
  pub max_nodes:        usize,
  pub include_types:    Vec<EntityLabel>,
  /// Normalized names always included, with edges relaxed to weight ≥ 1.
  pub priority:         BTreeSet<String>,
  /// Normalized names rendered as the corpus's central subject.
  pub central:          BTreeSet<String>,
}

impl Default for GraphParams {
  fn default() -> Self {
    Self {
      min_shared_files: 3,
      max_nodes:        100,
      include_types:    vec![EntityLabel::Person, EntityLabel::Org],
      priority:         BTreeSet::new(),
      central:          BTreeSet::new(),
    }
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
  Diamond,
  Star,
  Dot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub id:       String,
  pub label:    String,
  pub kind:     EntityLabel,
  pub files:    i64,
  pub mentions: i64,
  pub size:     i64,
  pub color:    String,
  pub shape:    Shape,
  pub title:    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub a:      String,
  pub b:      String,
  pub weight: i64,
  pub title:  String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
}

impl Graph {
  /// Write the graph as pretty JSON, creating parent directories.
  pub fn write_cache(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
    Ok(())
  }
}

// ─── Styling ─────────────────────────────────────────────────────────────────

const CENTRAL_COLOR: &str = "#00ff41";
const PRIORITY_COLOR: &str = "#f1c40f";
const PERSON_COLOR: &str = "#e74c3c";
const ORG_COLOR: &str = "#3498db";
const OTHER_COLOR: &str = "#95a5a6";

/// Base size grows with file count and saturates at 50.
fn base_size(files: i64) -> i64 { (8 + files.saturating_mul(2)).min(50) }

fn style(summary: &EntitySummary, params: &GraphParams) -> (&'static str, i64, Shape) {
  if params.central.contains(&summary.name) {
    (CENTRAL_COLOR, 60, Shape::Diamond)
  } else if params.priority.contains(&summary.name) {
    (PRIORITY_COLOR, base_size(summary.files).max(25), Shape::Star)
  } else {
    let color = match summary.label {
      EntityLabel::Person => PERSON_COLOR,
      EntityLabel::Org => ORG_COLOR,
      _ => OTHER_COLOR,
    };
    (color, base_size(summary.files), Shape::Dot)
  }
}

fn node(summary: EntitySummary, params: &GraphParams) -> Node {
  let (color, size, shape) = style(&summary, params);
  let title = format!(
    "{}\n{}\n{} files, {} mentions",
    summary.name, summary.label, summary.files, summary.mentions
  );
  Node {
    id: summary.name.clone(),
    label: summary.name,
    kind: summary.label,
    files: summary.files,
    mentions: summary.mentions,
    size,
    color: color.to_owned(),
    shape,
    title,
  }
}

// ─── Assembly ────────────────────────────────────────────────────────────────

/// Candidate data fetched by a backend for [`assemble`].
#[derive(Debug, Clone, Default)]
pub struct GraphInputs {
  /// Top entities of the included types, already thresholded and limited.
  pub top:            Vec<EntitySummary>,
  /// Summaries for priority names present in the corpus, any label.
  pub priority:       Vec<EntitySummary>,
  /// Edges with weight ≥ `min_shared_files`.
  pub edges:          Vec<CooccurrenceEdge>,
  /// Edges with weight ≥ 1 touching a priority name.
  pub priority_edges: Vec<CooccurrenceEdge>,
}

/// Apply node/edge selection and styling.
pub fn assemble(params: &GraphParams, inputs: GraphInputs) -> Graph {
  let mut selected: BTreeMap<String, EntitySummary> = BTreeMap::new();
  for summary in inputs.top.into_iter().take(params.max_nodes) {
    selected.entry(summary.name.clone()).or_insert(summary);
  }
  for summary in inputs.priority {
    if params.priority.contains(&summary.name) {
      selected.entry(summary.name.clone()).or_insert(summary);
    }
  }

  let mut weights: BTreeMap<(String, String), i64> = BTreeMap::new();
  for e in inputs.edges {
    if e.weight >= params.min_shared_files {
      weights.entry((e.a, e.b)).or_insert(e.weight);
    }
  }
  for e in inputs.priority_edges {
    let touches = params.priority.contains(&e.a) || params.priority.contains(&e.b);
    if touches && e.weight >= 1 {
      weights.entry((e.a, e.b)).or_insert(e.weight);
    }
  }

  let mut edges: Vec<Edge> = weights
    .into_iter()
    .filter(|((a, b), _)| selected.contains_key(a) && selected.contains_key(b))
    .map(|((a, b), weight)| Edge { a, b, weight, title: format!("{weight} shared files") })
    .collect();
  edges.sort_by(|x, y| y.weight.cmp(&x.weight).then_with(|| (&x.a, &x.b).cmp(&(&y.a, &y.b))));

  let mut nodes: Vec<Node> = selected.into_values().map(|s| node(s, params)).collect();
  nodes.sort_by(|x, y| y.files.cmp(&x.files).then_with(|| x.id.cmp(&y.id)));

  Graph { nodes, edges }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn person(name: &str, files: i64) -> EntitySummary {
    EntitySummary { name: name.into(), label: EntityLabel::Person, mentions: files * 3, files }
  }

  fn params() -> GraphParams {
    GraphParams {
      min_shared_files: 3,
      max_nodes: 2,
      priority: ["prince andrew".to_string()].into(),
      central: ["jeffrey epstein".to_string()].into(),
      ..GraphParams::default()
    }
  }

  #[test]
  fn priority_names_survive_thresholds() {
    let graph = assemble(&params(), GraphInputs {
      top:            vec![person("jeffrey epstein", 40), person("ghislaine maxwell", 20)],
      priority:       vec![person("prince andrew", 1)],
      edges:          vec![CooccurrenceEdge::new("jeffrey epstein", "ghislaine maxwell", 15)],
      priority_edges: vec![CooccurrenceEdge::new("prince andrew", "jeffrey epstein", 1)],
    });

    assert_eq!(graph.nodes.len(), 3);
    assert!(graph.nodes.iter().any(|n| n.id == "prince andrew" && n.shape == Shape::Star));
    assert_eq!(graph.edges.len(), 2);
    assert!(graph.edges.iter().any(|e| e.weight == 1));
  }

  #[test]
  fn edges_to_pruned_nodes_are_dropped() {
    let graph = assemble(&params(), GraphInputs {
      top:   vec![person("a", 10), person("b", 9), person("c", 8)],
      edges: vec![CooccurrenceEdge::new("a", "b", 5), CooccurrenceEdge::new("a", "c", 5)],
      ..GraphInputs::default()
    });

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!((graph.edges[0].a.as_str(), graph.edges[0].b.as_str()), ("a", "b"));
  }

  #[test]
  fn existing_edges_are_not_overwritten_by_priority_edges() {
    let graph = assemble(&params(), GraphInputs {
      top:            vec![person("a", 10)],
      priority:       vec![person("prince andrew", 2)],
      edges:          vec![CooccurrenceEdge::new("a", "prince andrew", 7)],
      priority_edges: vec![CooccurrenceEdge::new("a", "prince andrew", 1)],
    });
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].weight, 7);
    assert_eq!(graph.edges[0].title, "7 shared files");
  }

  #[test]
  fn below_threshold_edges_need_a_priority_endpoint() {
    let graph = assemble(&params(), GraphInputs {
      top:   vec![person("a", 10), person("b", 9)],
      edges: vec![CooccurrenceEdge::new("a", "b", 2)],
      ..GraphInputs::default()
    });
    assert!(graph.edges.is_empty());
  }

  #[test]
  fn sizes_saturate_and_distinguish_roles() {
    let p = params();
    let central = node(person("jeffrey epstein", 500), &p);
    assert_eq!((central.size, central.shape, central.color.as_str()), (60, Shape::Diamond, CENTRAL_COLOR));

    let vip = node(person("prince andrew", 1), &p);
    assert_eq!((vip.size, vip.color.as_str()), (25, PRIORITY_COLOR));

    let big = node(person("someone", 1_000), &p);
    assert_eq!((big.size, big.color.as_str()), (50, PERSON_COLOR));

    let org = node(
      EntitySummary { name: "fbi".into(), label: EntityLabel::Org, mentions: 9, files: 3 },
      &p,
    );
    assert_eq!((org.size, org.color.as_str(), org.shape), (14, ORG_COLOR, Shape::Dot));
    assert_eq!(org.title, "fbi\nORG\n3 files, 9 mentions");
  }
}
