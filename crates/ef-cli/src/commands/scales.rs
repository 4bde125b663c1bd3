//! Scales command: prints the domains and mappings derived from the tree.

use std::io::Write;

use anyhow::Result;
use ef_core::{Alignment, NumericScale, Scales, Session};
use serde_json::{Value, json};

/// Number of ticks shown per numeric axis.
const TICK_COUNT: usize = 5;

pub fn run<W: Write>(
    writer: &mut W,
    sessions: &[Session],
    alignment: &Alignment,
    (width, height): (f64, f64),
    json: bool,
) -> Result<()> {
    let graph = ef_core::build_graph(sessions, alignment)?;
    let scales = ef_core::build_scales(&graph, width, height)?;

    if json {
        writeln!(
            writer,
            "{}",
            serde_json::to_string_pretty(&scales_json(&scales))?
        )?;
        return Ok(());
    }

    for scale in [&scales.elapsed_time, &scales.event_sequence, &scales.event_count] {
        let [d0, d1] = scale.domain();
        let [r0, r1] = scale.range();
        let ticks: Vec<String> = scale
            .linear
            .ticks(TICK_COUNT)
            .into_iter()
            .map(|tick| scale.tick_format(tick))
            .collect();
        writeln!(
            writer,
            "{}: {} .. {} -> {r0} .. {r1} [{}]",
            scale.label(),
            scale.tick_format(d0),
            scale.tick_format(d1),
            ticks.join(", ")
        )?;
    }

    let bands = scales.bands;
    writeln!(
        writer,
        "Bands: after {} .. {}, before {} .. {}",
        bands.after.start, bands.after.end, bands.before.start, bands.before.end
    )?;

    writeln!(writer, "{}:", scales.node_color.label())?;
    for name in scales.node_color.domain() {
        writeln!(writer, "  {name} {}", scales.node_color.scale(name))?;
    }
    Ok(())
}

fn numeric_json(scale: &NumericScale) -> Value {
    json!({
        "label": scale.label(),
        "domain": scale.domain(),
        "range": scale.range(),
        "unit": scale.time_unit.map(|unit| unit.suffix()),
        "ticks": scale
            .linear
            .ticks(TICK_COUNT)
            .into_iter()
            .map(|tick| scale.tick_format(tick))
            .collect::<Vec<_>>(),
    })
}

fn scales_json(scales: &Scales) -> Value {
    let colors: serde_json::Map<String, Value> = scales
        .node_color
        .domain()
        .map(|name| (name.to_string(), json!(scales.node_color.scale(name))))
        .collect();
    json!({
        "elapsed_time": numeric_json(&scales.elapsed_time),
        "event_sequence": numeric_json(&scales.event_sequence),
        "event_count": numeric_json(&scales.event_count),
        "node_color": {
            "label": scales.node_color.label(),
            "colors": colors,
        },
        "bands": scales.bands,
    })
}
