//! Tree command: prints the aggregated event tree.

use std::io::Write;

use anyhow::Result;
use ef_core::{Alignment, Graph, Node, Session, Side, TimeUnit};
use serde_json::{Value, json};

pub fn run<W: Write>(
    writer: &mut W,
    sessions: &[Session],
    alignment: &Alignment,
    json: bool,
) -> Result<()> {
    let graph = ef_core::build_graph(sessions, alignment)?;

    if json {
        let anchors: Vec<Value> = sorted_children(&graph, graph.root(), Side::After)
            .into_iter()
            .map(|node| node_json(&graph, node))
            .collect();
        let output = json!({
            "alignment": alignment.to_string(),
            "sessions": sessions.len(),
            "aligned": graph.root().count,
            "nodes": anchors,
        });
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    let unit = TimeUnit::from_extent(graph.elapsed_extent());

    writeln!(
        writer,
        "aligned {} of {} sessions on {alignment}",
        graph.root().count,
        sessions.len()
    )?;
    for anchor in sorted_children(&graph, graph.root(), Side::After) {
        write_node(writer, &graph, unit, anchor, 0, "")?;
    }
    Ok(())
}

/// Children on one side, most frequent first.
fn sorted_children<'a>(graph: &'a Graph, node: &Node, side: Side) -> Vec<&'a Node> {
    let mut children: Vec<&Node> = graph.children_on(node.id, side).collect();
    children.sort_by(|a, b| b.count.cmp(&a.count));
    children
}

fn write_node<W: Write>(
    writer: &mut W,
    graph: &Graph,
    unit: TimeUnit,
    node: &Node,
    level: usize,
    marker: &str,
) -> Result<()> {
    writeln!(
        writer,
        "{:indent$}{marker}{} x{} @{}",
        "",
        node.name,
        node.count,
        unit.format(node.mean_elapsed_ms()),
        indent = level * 2
    )?;
    for (side, marker) in [(Side::After, "> "), (Side::Before, "< ")] {
        for child in sorted_children(graph, node, side) {
            write_node(writer, graph, unit, child, level + 1, marker)?;
        }
    }
    Ok(())
}

fn node_json(graph: &Graph, node: &Node) -> Value {
    let side = |side: Side| -> Vec<Value> {
        sorted_children(graph, node, side)
            .into_iter()
            .map(|child| node_json(graph, child))
            .collect()
    };
    json!({
        "name": node.name,
        "depth": node.depth,
        "count": node.count,
        "mean_elapsed_ms": node.mean_elapsed_ms(),
        "path": graph.breadcrumb(node.id),
        "after": side(Side::After),
        "before": side(Side::Before),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use ef_core::{Event, EventMatcher};
    use insta::assert_snapshot;

    fn session(id: &str, events: &[(&str, i64)]) -> Session {
        Session::new(
            id,
            events
                .iter()
                .map(|(name, ms)| Event::new(*name, *ms))
                .collect(),
        )
    }

    fn render(sessions: &[Session], alignment: &Alignment, json: bool) -> String {
        let mut output = Vec::new();
        run(&mut output, sessions, alignment, json).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_tree_command_renders_both_sides() {
        let sessions = vec![
            session("1", &[("login", 0), ("search", 4_000), ("view", 9_000)]),
            session("2", &[("home", 0), ("search", 1_000), ("view", 2_000)]),
            session("3", &[("search", 0), ("buy", 30_000)]),
            session("4", &[("home", 0)]),
        ];
        let alignment = Alignment::new(EventMatcher::Named("search".into()), 1).unwrap();

        let output = render(&sessions, &alignment, false);
        assert_snapshot!(output.trim_end(), @r"
        aligned 3 of 4 sessions on search#1
        search x3 @0s
          > view x2 @3s
          > buy x1 @30s
          < login x1 @-4s
          < home x1 @-1s
        ");
    }

    #[test]
    fn test_tree_command_picks_unit_from_offsets() {
        let sessions = vec![session("1", &[("A", 0), ("B", 150_000)])];
        let alignment = Alignment::new(EventMatcher::Named("A".into()), 1).unwrap();

        let output = render(&sessions, &alignment, false);
        assert_snapshot!(output.trim_end(), @r"
        aligned 1 of 1 sessions on A#1
        A x1 @0min
          > B x1 @2.5min
        ");
    }

    #[test]
    fn test_tree_command_with_no_sessions() {
        let output = render(&[], &Alignment::default(), false);
        assert_eq!(output, "aligned 0 of 0 sessions on *#1\n");
    }

    #[test]
    fn test_tree_command_json() {
        let sessions = vec![
            session("1", &[("A", 0), ("B", 5)]),
            session("2", &[("A", 0), ("C", 7)]),
        ];
        let alignment = Alignment::new(EventMatcher::Named("A".into()), 1).unwrap();

        let output = render(&sessions, &alignment, true);
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["aligned"], 2);
        assert_eq!(value["alignment"], "A#1");

        let anchor = &value["nodes"][0];
        assert_eq!(anchor["name"], "A");
        assert_eq!(anchor["count"], 2);
        let after: Vec<_> = anchor["after"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| (n["name"].as_str().unwrap(), n["count"].as_u64().unwrap()))
            .collect();
        assert_eq!(after, [("B", 1), ("C", 1)]);
        assert_eq!(anchor["after"][1]["path"], "A > C");
        assert!(anchor["before"].as_array().unwrap().is_empty());
    }
}
