//! Event aggregation into an aligned tree.
//!
//! # Algorithm Summary
//!
//! 1. Pick the alignment event of every session; sessions without one are skipped
//! 2. The alignment event becomes (or increments) a depth-0 child of the root
//! 3. Walk forward from it, each event becoming a child of the previous step's node
//! 4. Walk backward from it the same way, on the node's "before" side
//!
//! Children are keyed by event name, so repeated names at the same position
//! merge into one node whose count grows. Nodes live in an arena and refer to
//! their parent by index.

use indexmap::IndexMap;
use serde::Serialize;

use crate::align::Alignment;
use crate::event::{Event, EventRef, Session};
use crate::types::{FlowError, NodeId, Side};

/// Name given to the synthetic root node.
pub const ROOT_NAME: &str = "root";

/// One distinct event name at one position relative to the alignment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Signed offset from the alignment event.
    pub depth: i32,
    /// Number of sessions that passed through this node.
    pub count: usize,
    /// `None` only for the root.
    pub parent: Option<NodeId>,
    /// Sum of each contributing event's offset from its alignment event.
    pub elapsed_total_ms: i64,
    /// Every input event merged into this node.
    pub events: Vec<EventRef>,
    after: IndexMap<String, NodeId>,
    before: IndexMap<String, NodeId>,
}

impl Node {
    fn new(id: NodeId, name: String, depth: i32, parent: Option<NodeId>) -> Self {
        Self {
            id,
            name,
            depth,
            count: 0,
            parent,
            elapsed_total_ms: 0,
            events: Vec::new(),
            after: IndexMap::new(),
            before: IndexMap::new(),
        }
    }

    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub const fn side(&self) -> Side {
        Side::of_depth(self.depth)
    }

    /// Mean offset from the alignment event, in milliseconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_elapsed_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.elapsed_total_ms as f64 / self.count as f64
        }
    }

    /// Child ids on one side, in first-insertion order.
    pub fn children_on(&self, side: Side) -> impl Iterator<Item = NodeId> + '_ {
        let map = match side {
            Side::After => &self.after,
            Side::Before => &self.before,
        };
        map.values().copied()
    }

    /// All child ids: the after side first, then the before side.
    pub fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.after.values().chain(self.before.values()).copied()
    }

    pub fn has_children(&self) -> bool {
        !self.after.is_empty() || !self.before.is_empty()
    }

    fn record(&mut self, event_ref: EventRef, offset_ms: i64) -> Result<(), FlowError> {
        self.elapsed_total_ms = self.elapsed_total_ms.checked_add(offset_ms).ok_or(
            FlowError::ElapsedOverflow {
                session: event_ref.session,
                index: event_ref.event,
            },
        )?;
        self.count += 1;
        self.events.push(event_ref);
        Ok(())
    }
}

/// The aggregated tree, rooted at a synthetic node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            nodes: vec![Node::new(NodeId::ROOT, ROOT_NAME.to_string(), 0, None)],
        }
    }
}

impl Graph {
    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Every node, root first, in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Every node except the root.
    pub fn event_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().skip(1)
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing was aggregated.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Children of `id`; empty when `id` is not in this graph.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.get(id)
            .into_iter()
            .flat_map(|node| node.child_ids())
            .filter_map(|child| self.get(child))
    }

    pub fn children_on(&self, id: NodeId, side: Side) -> impl Iterator<Item = &Node> + '_ {
        self.get(id)
            .into_iter()
            .flat_map(move |node| node.children_on(side))
            .filter_map(|child| self.get(child))
    }

    /// Smallest and largest mean elapsed offset over the event nodes,
    /// `[0, 0]` when the graph is empty.
    pub fn elapsed_extent(&self) -> [f64; 2] {
        self.event_nodes()
            .map(Node::mean_elapsed_ms)
            .fold(None, |extent: Option<[f64; 2]>, value| {
                Some(match extent {
                    None => [value, value],
                    Some([lo, hi]) => [lo.min(value), hi.max(value)],
                })
            })
            .unwrap_or([0.0, 0.0])
    }

    /// The chain of nodes leading to `id`, from the alignment node down to
    /// `id` itself. The root is never included.
    pub fn path_to(&self, id: NodeId) -> Vec<&Node> {
        let mut path = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            if node.is_root() {
                break;
            }
            path.push(node);
            current = node.parent.and_then(|parent| self.get(parent));
        }
        path.reverse();
        path
    }

    /// Renders [`Graph::path_to`] as `A > B > C`.
    pub fn breadcrumb(&self, id: NodeId) -> String {
        self.path_to(id)
            .iter()
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    fn child_or_insert(&mut self, parent: NodeId, side: Side, name: &str, depth: i32) -> NodeId {
        let existing = match side {
            Side::After => self.nodes[parent.0].after.get(name),
            Side::Before => self.nodes[parent.0].before.get(name),
        };
        if let Some(&id) = existing {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(id, name.to_string(), depth, Some(parent)));
        let parent_node = &mut self.nodes[parent.0];
        match side {
            Side::After => parent_node.after.insert(name.to_string(), id),
            Side::Before => parent_node.before.insert(name.to_string(), id),
        };
        id
    }

    fn add_event(
        &mut self,
        parent: NodeId,
        side: Side,
        depth: i32,
        event: &Event,
        event_ref: EventRef,
        zero_ms: i64,
    ) -> Result<NodeId, FlowError> {
        let offset_ms = event
            .elapsed_ms
            .checked_sub(zero_ms)
            .ok_or(FlowError::ElapsedOverflow {
                session: event_ref.session,
                index: event_ref.event,
            })?;
        let id = self.child_or_insert(parent, side, &event.name, depth);
        self.nodes[id.0].record(event_ref, offset_ms)?;
        Ok(id)
    }
}

/// Builds the graph for sessions aligned on `alignment`.
pub fn build_graph(sessions: &[Session], alignment: &Alignment) -> Result<Graph, FlowError> {
    build_graph_with(sessions, |events| alignment.find(events))
}

/// Builds the graph using an arbitrary predicate returning each session's
/// depth-0 index, or `None` to skip the session.
pub fn build_graph_with<F>(sessions: &[Session], find_alignment: F) -> Result<Graph, FlowError>
where
    F: Fn(&[Event]) -> Option<usize>,
{
    for (idx, session) in sessions.iter().enumerate() {
        validate_session(idx, session)?;
    }

    let mut graph = Graph::default();

    for (session_idx, session) in sessions.iter().enumerate() {
        let events = &session.events;
        let Some(align_idx) = find_alignment(events) else {
            tracing::trace!(session = %session.id, "no alignment event, skipping session");
            continue;
        };
        if align_idx >= events.len() {
            return Err(FlowError::AlignmentOutOfBounds {
                session: session_idx,
                index: align_idx,
                len: events.len(),
            });
        }

        graph.nodes[NodeId::ROOT.0].count += 1;
        let zero_ms = events[align_idx].elapsed_ms;
        let at = |event: usize| EventRef {
            session: session_idx,
            event,
        };

        let anchor = graph.add_event(
            NodeId::ROOT,
            Side::After,
            0,
            &events[align_idx],
            at(align_idx),
            zero_ms,
        )?;

        let mut parent = anchor;
        let mut depth = 0;
        for (idx, event) in events.iter().enumerate().skip(align_idx + 1) {
            depth += 1;
            parent = graph.add_event(parent, Side::After, depth, event, at(idx), zero_ms)?;
        }

        let mut parent = anchor;
        let mut depth = 0;
        for (idx, event) in events.iter().enumerate().take(align_idx).rev() {
            depth -= 1;
            parent = graph.add_event(parent, Side::Before, depth, event, at(idx), zero_ms)?;
        }
    }

    tracing::debug!(
        sessions = sessions.len(),
        aligned = graph.root().count,
        nodes = graph.len() - 1,
        "built event graph"
    );
    Ok(graph)
}

fn validate_session(session_idx: usize, session: &Session) -> Result<(), FlowError> {
    let mut previous_ms: Option<i64> = None;
    for (idx, event) in session.events.iter().enumerate() {
        if event.name.is_empty() {
            return Err(FlowError::EmptyEventName {
                session: session_idx,
                index: idx,
            });
        }
        if let Some(previous_ms) = previous_ms {
            if event.elapsed_ms < previous_ms {
                return Err(FlowError::UnorderedSession {
                    session: session_idx,
                    index: idx,
                    elapsed_ms: event.elapsed_ms,
                    previous_ms,
                });
            }
        }
        previous_ms = Some(event.elapsed_ms);
    }
    Ok(())
}
