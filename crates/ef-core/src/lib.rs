//! Core logic for event flow diagrams.
//!
//! This crate contains:
//! - Ingestion: grouping flat event records into ordered sessions
//! - Alignment: picking the depth-0 event of each session
//! - Aggregation: merging aligned sessions into a counted tree
//! - Scales: deriving domains and pixel/colour mappings from the tree
//! - Layout: stacking the tree's nodes into positioned bars

pub mod align;
pub mod event;
mod graph;
pub mod ingest;
pub mod layout;
pub mod scale;
mod types;

pub use align::{Alignment, EventMatcher};
pub use event::{Event, EventRef, Session};
pub use graph::{Graph, Node, ROOT_NAME, build_graph, build_graph_with};
pub use ingest::{EventRecord, group_sessions};
pub use layout::{Layout, LinkBox, MIN_DRAW_HEIGHT, NodeBox, layout};
pub use scale::{
    Band, Bands, ColorScale, LinearScale, Measure, NumericScale, Scales, TimeUnit, build_scales,
};
pub use types::{FlowError, NodeId, Side};
