//! Layout command: prints positioned nodes and links as JSONL.

use std::io::Write;

use anyhow::Result;
use ef_core::{Alignment, LinkBox, NodeBox, Session};
use serde::Serialize;

use crate::XAxis;

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Item<'a> {
    Node(&'a NodeBox),
    Link(&'a LinkBox),
}

pub fn run<W: Write>(
    writer: &mut W,
    sessions: &[Session],
    alignment: &Alignment,
    (width, height): (f64, f64),
    x_axis: XAxis,
) -> Result<()> {
    let graph = ef_core::build_graph(sessions, alignment)?;
    let scales = ef_core::build_scales(&graph, width, height)?;
    let layout = ef_core::layout(&graph, &scales, x_axis.measure());

    let items = layout
        .nodes
        .iter()
        .map(Item::Node)
        .chain(layout.links.iter().map(Item::Link));
    for item in items {
        writeln!(writer, "{}", serde_json::to_string(&item)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use ef_core::{Event, EventMatcher};
    use serde_json::Value;

    fn session(id: &str, events: &[(&str, i64)]) -> Session {
        Session::new(
            id,
            events
                .iter()
                .map(|(name, ms)| Event::new(*name, *ms))
                .collect(),
        )
    }

    fn render(x_axis: XAxis) -> Vec<Value> {
        let sessions = vec![
            session("1", &[("home", 0), ("A", 10), ("B", 15)]),
            session("2", &[("A", 0), ("C", 7)]),
        ];
        let alignment = Alignment::new(EventMatcher::Named("A".into()), 1).unwrap();
        let mut output = Vec::new();
        run(&mut output, &sessions, &alignment, (100.0, 100.0), x_axis).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_layout_command_emits_nodes_then_links() {
        let items = render(XAxis::Sequence);
        let kinds: Vec<_> = items.iter().map(|i| i["type"].as_str().unwrap()).collect();
        assert_eq!(kinds, ["node", "node", "node", "node", "link", "link", "link"]);

        let home = items.iter().find(|i| i["name"] == "home").unwrap();
        assert_eq!(home["side"], "before");
        assert_eq!(home["depth"], -1);
        assert_eq!(home["x"], 0.0);
        assert!(home["draw_height"].as_f64().unwrap() >= home["height"].as_f64().unwrap());
    }

    #[test]
    fn test_layout_command_uses_elapsed_axis() {
        let items = render(XAxis::Elapsed);
        // Offsets range from -10ms (home) to 7ms (C).
        let c = items.iter().find(|i| i["name"] == "C").unwrap();
        assert_eq!(c["x"], 100.0);
        let anchor = items.iter().find(|i| i["name"] == "A").unwrap();
        let expected = 100.0 * 10.0 / 17.0;
        assert!((anchor["x"].as_f64().unwrap() - expected).abs() < 1e-9);
    }
}
