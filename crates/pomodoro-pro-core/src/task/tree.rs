//! Arena-backed task forest.
//!
//! All tasks live in one table keyed by id; each record keeps the ordered
//! ids of its children and the roots are kept as a separate ordered list.
//! A mutation touches only the affected records and then walks upward from
//! the mutated node to refresh aggregate durations.
//!
//! ## Invariants
//!
//! - Ids are unique across the forest (the table is keyed by id).
//! - Subtasks are only ever appended, so no cycles can form.
//! - A task with children has `duration == sum(children.duration)`.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::{Task, TaskId};
use crate::error::TaskError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    text: String,
    duration: u64,
    completed: bool,
    parent: Option<TaskId>,
    children: Vec<TaskId>,
}

/// Borrowed view of a single task record.
#[derive(Debug, Clone, Copy)]
pub struct TaskView<'a> {
    pub id: &'a TaskId,
    pub text: &'a str,
    pub duration: u64,
    pub completed: bool,
    pub parent: Option<&'a TaskId>,
    pub children: &'a [TaskId],
}

/// The task forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskTree {
    nodes: HashMap<TaskId, Node>,
    roots: Vec<TaskId>,
}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a nested forest (e.g. a store snapshot).
    ///
    /// Containment is authoritative: a stored `parentId` that disagrees
    /// with the nesting is ignored. If the same id appears twice, the first
    /// occurrence in pre-order wins and the later one is dropped together
    /// with its subtree.
    pub fn from_forest(forest: &[Task]) -> Self {
        let mut tree = Self::new();
        for task in forest {
            if let Some(id) = tree.insert_subtree(task, None) {
                tree.roots.push(id);
            }
        }
        tree.recompute_durations();
        tree
    }

    /// Materialize the whole forest as nested tasks.
    pub fn to_forest(&self) -> Vec<Task> {
        self.roots.iter().filter_map(|id| self.find(id)).collect()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of tasks at every depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskView<'_>> {
        let (id, node) = self.nodes.get_key_value(id)?;
        Some(TaskView {
            id,
            text: &node.text,
            duration: node.duration,
            completed: node.completed,
            parent: node.parent.as_ref(),
            children: &node.children,
        })
    }

    /// Owned snapshot of a task and its subtree.
    pub fn find(&self, id: &TaskId) -> Option<Task> {
        let node = self.nodes.get(id)?;
        Some(Task {
            id: id.clone(),
            text: node.text.clone(),
            duration: node.duration,
            completed: node.completed,
            subtasks: node
                .children
                .iter()
                .filter_map(|child| self.find(child))
                .collect(),
            parent_id: node.parent.clone(),
        })
    }

    /// Like [`find`](Self::find) but reports a missing id as an error.
    pub fn require(&self, id: &TaskId) -> Result<Task, TaskError> {
        self.find(id).ok_or_else(|| TaskError::NotFound(id.clone()))
    }

    /// Root tasks that are not completed, in order.
    pub fn active_roots(&self) -> Vec<Task> {
        self.roots_where(|node| !node.completed)
    }

    /// Root tasks that are completed, in order.
    pub fn completed_roots(&self) -> Vec<Task> {
        self.roots_where(|node| node.completed)
    }

    /// Seconds needed to get through every active root task, counting one
    /// break between consecutive tasks.
    pub fn total_remaining_time(&self, break_duration: u64) -> u64 {
        let active: Vec<&Node> = self
            .roots
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|node| !node.completed)
            .collect();
        let work = active
            .iter()
            .map(|node| node.duration)
            .fold(0, u64::saturating_add);
        let breaks = (active.len().saturating_sub(1) as u64).saturating_mul(break_duration);
        work.saturating_add(breaks)
    }

    /// Wall-clock time at which the active tasks would be done.
    pub fn finish_at(&self, now: DateTime<Utc>, break_duration: u64) -> DateTime<Utc> {
        let secs = i64::try_from(self.total_remaining_time(break_duration)).unwrap_or(i64::MAX);
        Duration::try_seconds(secs)
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a new leaf to the roots.
    pub fn add_root(&mut self, text: impl Into<String>, duration: u64) -> TaskId {
        let id = self.fresh_id();
        self.nodes.insert(id.clone(), leaf(text.into(), duration, None));
        self.roots.push(id.clone());
        id
    }

    /// Append a new leaf under `parent`. Returns `None` (and changes
    /// nothing) when the parent does not exist.
    pub fn add_subtask(
        &mut self,
        parent: &TaskId,
        text: impl Into<String>,
        duration: u64,
    ) -> Option<TaskId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let id = self.fresh_id();
        self.nodes
            .insert(id.clone(), leaf(text.into(), duration, Some(parent.clone())));
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(id.clone());
        }
        self.recompute_upward(parent);
        Some(id)
    }

    /// Append a pre-built subtree as a new root. Ids already present in the
    /// tree are skipped with their subtrees.
    pub fn insert_root(&mut self, task: &Task) -> Option<TaskId> {
        let id = self.insert_subtree(task, None)?;
        self.roots.push(id.clone());
        self.recompute_subtree(&id);
        Some(id)
    }

    /// Flip `completed` on a single task. Returns the new value, or `None`
    /// if the id is unknown.
    pub fn toggle_completion(&mut self, id: &TaskId) -> Option<bool> {
        let node = self.nodes.get_mut(id)?;
        node.completed = !node.completed;
        Some(node.completed)
    }

    /// Set `completed` on a single task. Returns `false` if the id is unknown.
    pub fn set_completed(&mut self, id: &TaskId, completed: bool) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.completed = completed;
                true
            }
            None => false,
        }
    }

    /// Remove a task and its whole subtree. Returns the removed ids
    /// (pre-order), or `None` if the id is unknown.
    pub fn delete(&mut self, id: &TaskId) -> Option<Vec<TaskId>> {
        let parent = self.nodes.get(id)?.parent.clone();

        match &parent {
            Some(parent_id) => {
                if let Some(node) = self.nodes.get_mut(parent_id) {
                    node.children.retain(|child| child != id);
                }
            }
            None => self.roots.retain(|root| root != id),
        }

        let mut removed = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children.into_iter().rev());
                removed.push(current);
            }
        }

        if let Some(parent_id) = parent {
            self.recompute_upward(&parent_id);
        }
        Some(removed)
    }

    /// Full bottom-up pass: leaves keep their duration, every other task
    /// becomes the sum of its recomputed children.
    pub fn recompute_durations(&mut self) {
        let roots = self.roots.clone();
        for root in &roots {
            self.recompute_subtree(root);
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn roots_where(&self, keep: impl Fn(&Node) -> bool) -> Vec<Task> {
        self.roots
            .iter()
            .filter(|id| self.nodes.get(*id).is_some_and(&keep))
            .filter_map(|id| self.find(id))
            .collect()
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    fn insert_subtree(&mut self, task: &Task, parent: Option<&TaskId>) -> Option<TaskId> {
        if self.nodes.contains_key(&task.id) {
            tracing::warn!(task_id = %task.id, "duplicate task id in snapshot; keeping first occurrence");
            return None;
        }
        self.nodes.insert(
            task.id.clone(),
            Node {
                text: task.text.clone(),
                duration: task.duration,
                completed: task.completed,
                parent: parent.cloned(),
                children: Vec::new(),
            },
        );
        let children: Vec<TaskId> = task
            .subtasks
            .iter()
            .filter_map(|sub| self.insert_subtree(sub, Some(&task.id)))
            .collect();
        if let Some(node) = self.nodes.get_mut(&task.id) {
            node.children = children;
        }
        Some(task.id.clone())
    }

    /// Recompute `id` and everything below it; returns the new duration.
    fn recompute_subtree(&mut self, id: &TaskId) -> u64 {
        let children = match self.nodes.get(id) {
            Some(node) => node.children.clone(),
            None => return 0,
        };
        if children.is_empty() {
            return self.nodes.get(id).map(|node| node.duration).unwrap_or(0);
        }
        let total = children
            .iter()
            .map(|child| self.recompute_subtree(child))
            .fold(0, u64::saturating_add);
        if let Some(node) = self.nodes.get_mut(id) {
            node.duration = total;
        }
        total
    }

    /// Refresh durations from `id` up to its root. Children of `id` are
    /// assumed to be correct already.
    fn recompute_upward(&mut self, id: &TaskId) {
        let mut current = Some(id.clone());
        while let Some(id) = current {
            let Some(node) = self.nodes.get(&id) else {
                break;
            };
            if !node.children.is_empty() {
                let total = node
                    .children
                    .iter()
                    .filter_map(|child| self.nodes.get(child))
                    .map(|child| child.duration)
                    .fold(0, u64::saturating_add);
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.duration = total;
                }
            }
            current = self.nodes.get(&id).and_then(|node| node.parent.clone());
        }
    }
}

fn leaf(text: String, duration: u64, parent: Option<TaskId>) -> Node {
    Node {
        text,
        duration,
        completed: false,
        parent,
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> (TaskTree, TaskId, TaskId, TaskId) {
        let mut tree = TaskTree::new();
        let report = tree.add_root("Report", 3600);
        let intro = tree.add_subtask(&report, "Intro", 600).unwrap();
        let body = tree.add_subtask(&report, "Body", 1200).unwrap();
        (tree, report, intro, body)
    }

    #[test]
    fn add_root_creates_incomplete_leaf() {
        let mut tree = TaskTree::new();
        let id = tree.add_root("Email", 300);
        let task = tree.find(&id).unwrap();
        assert_eq!(task.text, "Email");
        assert_eq!(task.duration, 300);
        assert!(!task.completed);
        assert!(task.subtasks.is_empty());
        assert!(task.parent_id.is_none());
    }

    #[test]
    fn add_subtask_recomputes_parent() {
        let (tree, report, intro, _) = sample();
        let task = tree.find(&report).unwrap();
        assert_eq!(task.duration, 1800);
        assert_eq!(task.subtasks.len(), 2);
        assert_eq!(tree.get(&intro).unwrap().parent, Some(&report));
    }

    #[test]
    fn add_subtask_to_missing_parent_is_noop() {
        let (mut tree, ..) = sample();
        let before = tree.clone();
        assert!(tree.add_subtask(&TaskId::from("nope"), "x", 60).is_none());
        assert_eq!(tree, before);
    }

    #[test]
    fn nested_durations_propagate_to_root() {
        let (mut tree, report, intro, _) = sample();
        tree.add_subtask(&intro, "Outline", 120).unwrap();
        tree.add_subtask(&intro, "Draft", 180).unwrap();
        assert_eq!(tree.get(&intro).unwrap().duration, 300);
        assert_eq!(tree.get(&report).unwrap().duration, 1500);
    }

    #[test]
    fn toggle_affects_only_target() {
        let (mut tree, report, intro, body) = sample();
        assert_eq!(tree.toggle_completion(&report), Some(true));
        assert!(!tree.get(&intro).unwrap().completed);
        assert!(!tree.get(&body).unwrap().completed);
        assert_eq!(tree.toggle_completion(&TaskId::from("missing")), None);
    }

    #[test]
    fn delete_removes_subtree_and_updates_parent() {
        let (mut tree, report, intro, body) = sample();
        let leaf = tree.add_subtask(&intro, "Outline", 100).unwrap();

        let removed = tree.delete(&intro).unwrap();
        assert_eq!(removed, vec![intro.clone(), leaf.clone()]);
        assert!(!tree.contains(&intro));
        assert!(!tree.contains(&leaf));
        assert_eq!(tree.get(&report).unwrap().children, &[body][..]);
        assert_eq!(tree.get(&report).unwrap().duration, 1200);
    }

    #[test]
    fn deleting_last_child_keeps_parent_duration() {
        let mut tree = TaskTree::new();
        let parent = tree.add_root("Parent", 100);
        let child = tree.add_subtask(&parent, "Child", 900).unwrap();
        tree.delete(&child);
        assert_eq!(tree.get(&parent).unwrap().duration, 900);
    }

    #[test]
    fn delete_missing_is_noop() {
        let (mut tree, ..) = sample();
        let before = tree.clone();
        assert!(tree.delete(&TaskId::from("ghost")).is_none());
        assert_eq!(tree, before);
    }

    #[test]
    fn forest_round_trip_preserves_order_and_parents() {
        let (tree, report, intro, body) = sample();
        let forest = tree.to_forest();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtasks[0].id, intro);
        assert_eq!(forest[0].subtasks[1].id, body);
        assert_eq!(forest[0].subtasks[0].parent_id.as_ref(), Some(&report));

        let rebuilt = TaskTree::from_forest(&forest);
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn import_recomputes_stale_parent_duration() {
        let json = r#"[{"id":"p","text":"P","duration":1,"subtasks":[
            {"id":"a","text":"A","duration":60,"parentId":"p"},
            {"id":"b","text":"B","duration":90,"parentId":"p"}]}]"#;
        let forest: Vec<Task> = serde_json::from_str(json).unwrap();
        let tree = TaskTree::from_forest(&forest);
        assert_eq!(tree.get(&TaskId::from("p")).unwrap().duration, 150);
    }

    #[test]
    fn import_keeps_first_duplicate() {
        let json = r#"[
            {"id":"x","text":"First","duration":60},
            {"id":"y","text":"Other","duration":60,"subtasks":[
                {"id":"x","text":"Second","duration":30}]}]"#;
        let forest: Vec<Task> = serde_json::from_str(json).unwrap();
        let tree = TaskTree::from_forest(&forest);
        assert_eq!(tree.get(&TaskId::from("x")).unwrap().text, "First");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn views_partition_roots_and_count_breaks() {
        let mut tree = TaskTree::new();
        let a = tree.add_root("A", 1500);
        tree.add_root("B", 1500);
        tree.add_root("C", 600);
        tree.toggle_completion(&a);

        assert_eq!(tree.active_roots().len(), 2);
        assert_eq!(tree.completed_roots()[0].id, a);
        assert_eq!(tree.total_remaining_time(300), 1500 + 600 + 300);

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(
            tree.finish_at(now, 300),
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 40, 0).unwrap()
        );
    }

    #[test]
    fn require_reports_missing_task() {
        let tree = TaskTree::new();
        let err = tree.require(&TaskId::from("zz")).unwrap_err();
        assert_eq!(err, TaskError::NotFound(TaskId::from("zz")));
    }

    #[test]
    fn huge_durations_saturate_instead_of_overflowing() {
        let mut tree = TaskTree::new();
        let root = tree.add_root("Root", 1);
        tree.add_subtask(&root, "A", u64::MAX).unwrap();
        tree.add_subtask(&root, "B", 1).unwrap();
        assert_eq!(tree.get(&root).unwrap().duration, u64::MAX);

        tree.add_root("Other", 600);
        assert_eq!(tree.total_remaining_time(u64::MAX), u64::MAX);
        assert_eq!(
            tree.finish_at(Utc::now(), 300),
            DateTime::<Utc>::MAX_UTC
        );

        let imported = TaskTree::from_forest(&tree.to_forest());
        assert_eq!(imported.get(&root).unwrap().duration, u64::MAX);
    }
}
