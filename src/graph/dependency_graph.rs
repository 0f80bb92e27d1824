use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::debug;

use crate::error::ScheduleError;
use crate::task::{Task, TaskId};

/// A dependency id that does not resolve inside the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub task: TaskId,
    pub dependency: TaskId,
}

/// Dependency graph over one scheduling request.
///
/// Nodes carry the position of the task in the input slice and are created in
/// input order. Edges point from a task to each of its dependencies.
pub struct DependencyGraph<'a> {
    pub graph: DiGraph<usize, ()>,
    pub id_to_index: HashMap<&'a TaskId, NodeIndex>,
    tasks: &'a [Task],
    dangling: Vec<DanglingReference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

struct Frame {
    node: NodeIndex,
    pending: std::vec::IntoIter<NodeIndex>,
}

impl<'a> DependencyGraph<'a> {
    pub fn build(tasks: &'a [Task]) -> Result<Self, ScheduleError> {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut id_to_index: HashMap<&'a TaskId, NodeIndex> = HashMap::with_capacity(tasks.len());

        // Add nodes first
        for (position, task) in tasks.iter().enumerate() {
            let node_ix = graph.add_node(position);
            if id_to_index.insert(&task.id, node_ix).is_some() {
                return Err(ScheduleError::DuplicateTask(task.id.clone()));
            }
        }

        // Add edges: task -> dependency
        let mut dangling = Vec::new();
        for task in tasks {
            let from = id_to_index[&task.id];
            for dep in &task.dependencies {
                match id_to_index.get(dep) {
                    Some(&to) => {
                        graph.update_edge(from, to, ());
                    }
                    None => {
                        debug!(task = %task.id, dependency = %dep, "dependency outside working set");
                        dangling.push(DanglingReference {
                            task: task.id.clone(),
                            dependency: dep.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            graph,
            id_to_index,
            tasks,
            dangling,
        })
    }

    pub fn task(&self, node: NodeIndex) -> &'a Task {
        &self.tasks[self.graph[node]]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// Dependencies of `node` inside the working set, in declared order.
    pub fn dependencies_of(&self, node: NodeIndex) -> Vec<NodeIndex> {
        // petgraph walks adjacency newest-first
        let mut deps: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        deps.reverse();
        deps
    }

    /// Dependency-first ordering of every task, or the first cycle found.
    ///
    /// Roots are visited in input order and each task's dependencies in declared
    /// order; a task is emitted once all of its dependencies have been emitted.
    pub fn execution_order(&self) -> Result<Vec<NodeIndex>, ScheduleError> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut stack: Vec<Frame> = Vec::new();

        for root in self.graph.node_indices() {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }
            marks[root.index()] = Mark::InProgress;
            stack.push(self.frame(root));

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                let Some(dep) = frame.pending.next() else {
                    marks[node.index()] = Mark::Done;
                    order.push(node);
                    stack.pop();
                    continue;
                };

                match marks[dep.index()] {
                    Mark::Unvisited => {
                        marks[dep.index()] = Mark::InProgress;
                        stack.push(self.frame(dep));
                    }
                    Mark::InProgress => return Err(self.cycle_error(&stack, dep)),
                    Mark::Done => {}
                }
            }
        }

        Ok(order)
    }

    fn frame(&self, node: NodeIndex) -> Frame {
        Frame {
            node,
            pending: self.dependencies_of(node).into_iter(),
        }
    }

    fn cycle_error(&self, stack: &[Frame], reentered: NodeIndex) -> ScheduleError {
        let start = stack
            .iter()
            .position(|frame| frame.node == reentered)
            .unwrap_or(0);
        let mut path: Vec<TaskId> = stack[start..]
            .iter()
            .map(|frame| self.task(frame.node).id.clone())
            .collect();
        path.push(self.task(reentered).id.clone());
        ScheduleError::Cycle { path }
    }
}
