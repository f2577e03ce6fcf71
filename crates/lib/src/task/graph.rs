//! Task dependency graph and run scheduling.
//!
//! Edges point from a task to its prerequisites and carry the declared
//! position, so a schedule visits prerequisites in the order they were written.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::platform::{HostPlatform, Toolchain};

use super::{TaskError, TaskId};

pub struct TaskGraph {
  graph: DiGraph<TaskId, usize>,
  nodes: HashMap<TaskId, NodeIndex>,
}

impl TaskGraph {
  /// The standard graph for a host; `build:choose` resolves to the host's full build.
  pub fn standard(platform: &HostPlatform) -> Result<Self, TaskError> {
    let full_build = match platform.toolchain() {
      Toolchain::CrossPlatform => TaskId::BuildMonoFull,
      Toolchain::Native => TaskId::BuildMsFull,
    };

    Self::from_edges(TaskId::ALL.into_iter().map(|task| {
      let prerequisites = match task {
        TaskId::BuildChoose => vec![full_build],
        other => other.prerequisites().to_vec(),
      };
      (task, prerequisites)
    }))
  }

  fn from_edges(edges: impl IntoIterator<Item = (TaskId, Vec<TaskId>)>) -> Result<Self, TaskError> {
    let edges: Vec<_> = edges.into_iter().collect();
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for (task, _) in &edges {
      nodes.insert(*task, graph.add_node(*task));
    }

    for (task, prerequisites) in &edges {
      for (position, prerequisite) in prerequisites.iter().enumerate() {
        let to = *nodes
          .entry(*prerequisite)
          .or_insert_with(|| graph.add_node(*prerequisite));
        graph.add_edge(nodes[task], to, position);
      }
    }

    let dag = Self { graph, nodes };
    dag.verify_acyclic()?;
    Ok(dag)
  }

  fn verify_acyclic(&self) -> Result<(), TaskError> {
    toposort(&self.graph, None).map_err(|_| TaskError::CycleDetected)?;
    Ok(())
  }

  /// Direct prerequisites of `task` in declared order.
  pub fn prerequisites(&self, task: TaskId) -> Vec<TaskId> {
    let Some(&idx) = self.nodes.get(&task) else {
      return Vec::new();
    };
    let mut edges: Vec<_> = self
      .graph
      .edges(idx)
      .map(|e| (*e.weight(), self.graph[e.target()]))
      .collect();
    edges.sort_by_key(|(position, _)| *position);
    edges.into_iter().map(|(_, task)| task).collect()
  }

  /// Execution order for `targets`: depth-first, prerequisites before the
  /// task that declares them, every task at most once.
  pub fn schedule(&self, targets: &[TaskId]) -> Vec<TaskId> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    for target in targets {
      self.visit(*target, &mut visited, &mut order);
    }
    order
  }

  fn visit(&self, task: TaskId, visited: &mut HashSet<TaskId>, order: &mut Vec<TaskId>) {
    if !visited.insert(task) {
      return;
    }
    for prerequisite in self.prerequisites(task) {
      self.visit(prerequisite, visited, order);
    }
    order.push(task);
  }
}
