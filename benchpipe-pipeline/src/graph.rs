//! Pipeline Task Graph
//!
//! In-process DAG scheduler. The orchestrator declares named tasks and
//! "depends on" edges; scheduling happens here. Tasks at the same dependency
//! depth have no edges between them and run concurrently on a rayon pool;
//! a task whose dependency did not complete is recorded as skipped and never
//! run, so a failed Compile can never execute a stale artifact.

use fxhash::{FxHashMap, FxHashSet};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors from graph construction and scheduling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// A task with this id was already registered.
    #[error("duplicate task name: {0}")]
    DuplicateTask(String),

    /// An edge referenced a task that does not exist in the graph.
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// A cycle was detected during topological sort.
    #[error("cycle detected at task: {0}")]
    CycleDetected(String),

    /// The rayon worker pool could not be built.
    #[error("failed to build scheduler pool: {0}")]
    Scheduler(String),
}

/// Work performed by one task. Returns an error to fail the stage.
pub type TaskAction = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Final status of one task after a graph run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task's action ran to completion (markers complete trivially).
    Completed,
    /// The task's action returned an error.
    Failed {
        /// Rendered error chain.
        message: String,
    },
    /// A dependency failed or was itself skipped; the task never ran.
    Skipped {
        /// The dependency that blocked this task.
        blocked_on: String,
    },
}

/// Outcome of one task in a graph run.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// Task identifier.
    pub id: String,
    /// Final status.
    pub status: TaskStatus,
}

impl TaskOutcome {
    /// Whether the task completed.
    pub fn is_completed(&self) -> bool {
        matches!(self.status, TaskStatus::Completed)
    }
}

struct PipelineTask {
    /// `None` marks an external task (e.g. the platform's normal compilation)
    /// that only exists as a dependency anchor.
    action: Option<TaskAction>,
}

/// Named units of work with declared dependency edges.
#[derive(Default)]
pub struct TaskGraph {
    tasks: FxHashMap<String, PipelineTask>,
    /// task -> set of tasks it depends on
    edges: FxHashMap<String, FxHashSet<String>>,
    /// Insertion order, for deterministic sorting and reporting.
    order: Vec<String>,
}

impl TaskGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Ids must be unique.
    pub fn add_task(
        &mut self,
        id: impl Into<String>,
        action: TaskAction,
    ) -> Result<(), GraphError> {
        self.insert(id.into(), Some(action))
    }

    /// Register an external marker task with no action of its own.
    pub fn add_marker(&mut self, id: impl Into<String>) -> Result<(), GraphError> {
        self.insert(id.into(), None)
    }

    fn insert(&mut self, id: String, action: Option<TaskAction>) -> Result<(), GraphError> {
        if self.tasks.contains_key(&id) {
            return Err(GraphError::DuplicateTask(id));
        }
        self.order.push(id.clone());
        self.tasks.insert(id, PipelineTask { action });
        Ok(())
    }

    /// Declare that `from` depends on `to`. Both tasks must already exist.
    pub fn add_dependency(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<(), GraphError> {
        let from = from.into();
        let to = to.into();
        if !self.tasks.contains_key(&from) {
            return Err(GraphError::UnknownTask(from));
        }
        if !self.tasks.contains_key(&to) {
            return Err(GraphError::UnknownTask(to));
        }
        self.edges.entry(from).or_default().insert(to);
        Ok(())
    }

    /// Whether a task with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Registered task ids in insertion order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Dependencies declared for a task.
    pub fn dependencies(&self, id: &str) -> Option<&FxHashSet<String>> {
        self.edges.get(id)
    }

    /// Order tasks so that dependencies come before dependents.
    ///
    /// Deterministic for a fixed insertion order; cycles are rejected.
    pub fn topological_sort(&self) -> Result<Vec<String>, GraphError> {
        let mut result = Vec::with_capacity(self.order.len());
        let mut visited = FxHashSet::default();
        let mut in_progress = FxHashSet::default();

        for id in &self.order {
            if !visited.contains(id) {
                self.visit(id, &mut visited, &mut in_progress, &mut result)?;
            }
        }
        Ok(result)
    }

    fn visit(
        &self,
        id: &str,
        visited: &mut FxHashSet<String>,
        in_progress: &mut FxHashSet<String>,
        result: &mut Vec<String>,
    ) -> Result<(), GraphError> {
        if in_progress.contains(id) {
            return Err(GraphError::CycleDetected(id.to_string()));
        }
        if visited.contains(id) {
            return Ok(());
        }

        in_progress.insert(id.to_string());
        if let Some(deps) = self.edges.get(id) {
            // Visit in insertion order for deterministic output.
            for dep in self.order.iter().filter(|candidate| deps.contains(*candidate)) {
                self.visit(dep, visited, in_progress, result)?;
            }
        }
        in_progress.remove(id);

        visited.insert(id.to_string());
        result.push(id.to_string());
        Ok(())
    }

    /// Group tasks into dependency levels: every task sits one level above its
    /// deepest dependency, so tasks within one level are mutually independent.
    fn levels(&self) -> Result<Vec<Vec<String>>, GraphError> {
        let sorted = self.topological_sort()?;
        let mut depth: FxHashMap<&str, usize> = FxHashMap::default();
        let mut levels: Vec<Vec<String>> = Vec::new();

        for id in &sorted {
            let level = self
                .edges
                .get(id)
                .map(|deps| {
                    deps.iter()
                        .map(|dep| depth.get(dep.as_str()).copied().unwrap_or(0) + 1)
                        .max()
                        .unwrap_or(0)
                })
                .unwrap_or(0);
            depth.insert(id, level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(id.clone());
        }
        Ok(levels)
    }

    /// Run every task, respecting dependency edges.
    ///
    /// Up to `jobs` independent tasks run concurrently. Returns one outcome
    /// per task in registration order; scheduling itself only fails on a
    /// malformed graph, task failures are reported through the outcomes.
    pub fn run(&self, jobs: usize) -> Result<Vec<TaskOutcome>, GraphError> {
        let levels = self.levels()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
            .map_err(|e| GraphError::Scheduler(e.to_string()))?;

        let mut statuses: FxHashMap<String, TaskStatus> = FxHashMap::default();

        for level in levels {
            let level_outcomes: Vec<(String, TaskStatus)> = pool.install(|| {
                level
                    .par_iter()
                    .map(|id| (id.clone(), self.run_task(id, &statuses)))
                    .collect()
            });
            statuses.extend(level_outcomes);
        }

        Ok(self
            .order
            .iter()
            .map(|id| TaskOutcome {
                id: id.clone(),
                status: statuses
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| TaskStatus::Skipped {
                        blocked_on: id.clone(),
                    }),
            })
            .collect())
    }

    fn run_task(&self, id: &str, statuses: &FxHashMap<String, TaskStatus>) -> TaskStatus {
        if let Some(deps) = self.edges.get(id) {
            for dep in self.order.iter().filter(|candidate| deps.contains(*candidate)) {
                match statuses.get(dep) {
                    Some(TaskStatus::Completed) => {}
                    _ => {
                        info!(task = id, blocked_on = %dep, "skipping task");
                        return TaskStatus::Skipped {
                            blocked_on: dep.clone(),
                        };
                    }
                }
            }
        }

        let task = match self.tasks.get(id) {
            Some(task) => task,
            None => {
                return TaskStatus::Skipped {
                    blocked_on: id.to_string(),
                }
            }
        };

        match &task.action {
            None => TaskStatus::Completed,
            Some(action) => {
                debug!(task = id, "running task");
                match action() {
                    Ok(()) => TaskStatus::Completed,
                    Err(e) => {
                        error!(task = id, error = %e, "task failed");
                        TaskStatus::Failed {
                            message: format!("{e:#}"),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn noop() -> TaskAction {
        Box::new(|| Ok(()))
    }

    #[test]
    fn topological_sort_orders_dependencies_first() {
        let mut graph = TaskGraph::new();
        graph.add_task("exec", noop()).unwrap();
        graph.add_task("compile", noop()).unwrap();
        graph.add_task("generate", noop()).unwrap();
        graph.add_dependency("exec", "compile").unwrap();
        graph.add_dependency("compile", "generate").unwrap();

        let sorted = graph.topological_sort().unwrap();
        let pos = |id: &str| sorted.iter().position(|x| x == id).unwrap();
        assert!(pos("generate") < pos("compile"));
        assert!(pos("compile") < pos("exec"));
    }

    #[test]
    fn cycle_is_rejected() {
        let mut graph = TaskGraph::new();
        graph.add_task("a", noop()).unwrap();
        graph.add_task("b", noop()).unwrap();
        graph.add_task("c", noop()).unwrap();
        graph.add_dependency("a", "b").unwrap();
        graph.add_dependency("b", "c").unwrap();
        graph.add_dependency("c", "a").unwrap();

        assert!(matches!(
            graph.topological_sort(),
            Err(GraphError::CycleDetected(_))
        ));
    }

    #[test]
    fn duplicate_task_name_is_an_error() {
        let mut graph = TaskGraph::new();
        graph.add_task("mainBenchmark", noop()).unwrap();
        assert!(matches!(
            graph.add_task("mainBenchmark", noop()),
            Err(GraphError::DuplicateTask(_))
        ));
    }

    #[test]
    fn edges_require_known_tasks() {
        let mut graph = TaskGraph::new();
        graph.add_task("a", noop()).unwrap();
        assert!(matches!(
            graph.add_dependency("a", "ghost"),
            Err(GraphError::UnknownTask(_))
        ));
    }

    #[test]
    fn run_executes_chain_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let record = |log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str| -> TaskAction {
            let log = Arc::clone(log);
            Box::new(move || {
                log.lock().unwrap().push(label);
                Ok(())
            })
        };

        let mut graph = TaskGraph::new();
        graph.add_task("generate", record(&log, "generate")).unwrap();
        graph.add_task("compile", record(&log, "compile")).unwrap();
        graph.add_task("exec", record(&log, "exec")).unwrap();
        graph.add_dependency("compile", "generate").unwrap();
        graph.add_dependency("exec", "compile").unwrap();

        let outcomes = graph.run(4).unwrap();
        assert!(outcomes.iter().all(TaskOutcome::is_completed));
        assert_eq!(*log.lock().unwrap(), vec!["generate", "compile", "exec"]);
    }

    #[test]
    fn failure_skips_dependents() {
        let mut graph = TaskGraph::new();
        graph.add_task("generate", noop()).unwrap();
        graph
            .add_task("compile", Box::new(|| anyhow::bail!("compiler crashed")))
            .unwrap();
        graph.add_task("exec", noop()).unwrap();
        graph.add_dependency("compile", "generate").unwrap();
        graph.add_dependency("exec", "compile").unwrap();

        let outcomes = graph.run(1).unwrap();
        let by_id: std::collections::HashMap<_, _> = outcomes
            .iter()
            .map(|o| (o.id.as_str(), o.status.clone()))
            .collect();

        assert_eq!(by_id["generate"], TaskStatus::Completed);
        assert!(matches!(by_id["compile"], TaskStatus::Failed { .. }));
        assert_eq!(
            by_id["exec"],
            TaskStatus::Skipped {
                blocked_on: "compile".to_string()
            }
        );
    }

    #[test]
    fn marker_tasks_complete_without_running() {
        let mut graph = TaskGraph::new();
        graph.add_marker("compileMainClasses").unwrap();
        graph.add_task("generate", noop()).unwrap();
        graph.add_dependency("generate", "compileMainClasses").unwrap();

        let outcomes = graph.run(1).unwrap();
        assert!(outcomes.iter().all(TaskOutcome::is_completed));
    }

    #[test]
    fn independent_chains_run_concurrently() {
        // Two chains with no cross edges; jobs=2 must not deadlock and both
        // chains must keep their internal order.
        let log = Arc::new(Mutex::new(Vec::new()));
        let record = |log: &Arc<Mutex<Vec<String>>>, label: String| -> TaskAction {
            let log = Arc::clone(log);
            Box::new(move || {
                log.lock().unwrap().push(label.clone());
                Ok(())
            })
        };

        let mut graph = TaskGraph::new();
        for chain in ["alpha", "beta"] {
            let gen = format!("{chain}Generate");
            let compile = format!("{chain}Benchmark");
            graph.add_task(&gen, record(&log, gen.clone())).unwrap();
            graph
                .add_task(&compile, record(&log, compile.clone()))
                .unwrap();
            graph.add_dependency(&compile, &gen).unwrap();
        }

        let outcomes = graph.run(2).unwrap();
        assert!(outcomes.iter().all(TaskOutcome::is_completed));

        let log = log.lock().unwrap();
        for chain in ["alpha", "beta"] {
            let gen = log
                .iter()
                .position(|l| l == &format!("{chain}Generate"))
                .unwrap();
            let compile = log
                .iter()
                .position(|l| l == &format!("{chain}Benchmark"))
                .unwrap();
            assert!(gen < compile);
        }
    }
}
