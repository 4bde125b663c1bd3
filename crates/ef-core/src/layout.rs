//! Stacked layout of the aggregated tree.
//!
//! Each node is a bar whose x comes from the chosen horizontal scale and whose
//! height comes from the count scale. Siblings are stacked downward from their
//! parent's top edge, most frequent first. Nodes after the alignment event live
//! in the "after" band and nodes before it in the "before" band.

use serde::Serialize;

use crate::graph::{Graph, Node};
use crate::scale::{Measure, Scales};
use crate::types::{NodeId, Side};

/// Smallest height a bar is drawn with.
pub const MIN_DRAW_HEIGHT: f64 = 1.0;

/// A positioned node.
///
/// `height` is the bar's share of its band and drives stacking. `draw_height`
/// is never below [`MIN_DRAW_HEIGHT`], so rare nodes stay visible.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeBox {
    pub id: NodeId,
    pub name: String,
    pub depth: i32,
    pub count: usize,
    pub side: Side,
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub draw_height: f64,
    pub color: &'static str,
}

/// A horizontal connector from a parent's column to a child's bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkBox {
    pub source: NodeId,
    pub target: NodeId,
    pub x0: f64,
    pub x1: f64,
    pub y: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<NodeBox>,
    pub links: Vec<LinkBox>,
}

struct Placer<'a> {
    graph: &'a Graph,
    scales: &'a Scales,
    x: Measure,
    layout: Layout,
}

impl Placer<'_> {
    /// Stacks the children of `parent` on `side`, starting at `top`.
    /// Returns the total height used.
    fn place_children(&mut self, parent: &Node, side: Side, top: f64) -> f64 {
        let graph = self.graph;
        let mut children: Vec<&Node> = graph.children_on(parent.id, side).collect();
        children.sort_by(|a, b| b.count.cmp(&a.count));

        let mut cursor = top;
        for child in children {
            let height = self.scales.event_count.position(child);
            self.place(parent, child, cursor, height);
            cursor += height;
        }
        cursor - top
    }

    fn place(&mut self, parent: &Node, node: &Node, top: f64, height: f64) {
        let x_scale = self.scales.numeric(self.x);
        let x = x_scale.position(node);

        if !parent.is_root() {
            self.layout.links.push(LinkBox {
                source: parent.id,
                target: node.id,
                x0: x_scale.position(parent),
                x1: x,
                y: top,
                height,
            });
        }
        self.layout.nodes.push(NodeBox {
            id: node.id,
            name: node.name.clone(),
            depth: node.depth,
            count: node.count,
            side: node.side(),
            x,
            y: top,
            height,
            draw_height: height.max(MIN_DRAW_HEIGHT),
            color: self.scales.node_color.color_of(node),
        });

        // The anchor's before side is stacked separately by `layout`.
        self.place_children(node, node.side(), top);
    }
}

/// Lays out every node of `graph`, using `x` for horizontal positions.
pub fn layout(graph: &Graph, scales: &Scales, x: Measure) -> Layout {
    let mut placer = Placer {
        graph,
        scales,
        x,
        layout: Layout::default(),
    };

    let root = graph.root();
    let mut anchors: Vec<&Node> = graph.children_on(root.id, Side::After).collect();
    anchors.sort_by(|a, b| b.count.cmp(&a.count));

    let mut after_cursor = scales.bands.after.start;
    let mut before_cursor = scales.bands.before.start;
    for anchor in anchors {
        let height = scales.event_count.position(anchor);
        placer.place(root, anchor, after_cursor, height);
        after_cursor += height;
        before_cursor += placer.place_children(anchor, Side::Before, before_cursor);
    }

    tracing::debug!(
        nodes = placer.layout.nodes.len(),
        links = placer.layout.links.len(),
        "laid out graph"
    );
    placer.layout
}
