//! Scale derivation from an aggregated graph.
//!
//! One pass over the graph collects the domain extrema of every measure; the
//! scales are then plain linear (or ordinal) mappings onto the requested pixel
//! dimensions. Scales are rebuilt wholesale whenever the graph or dimensions
//! change.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::graph::{Graph, Node};
use crate::types::{FlowError, Side};

/// Categorical palette used for event names, cycled when exhausted.
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;

/// A continuous mapping from a domain interval onto a range interval.
///
/// A zero-width domain maps every value to the middle of the range instead of
/// dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: [f64; 2],
    pub range: [f64; 2],
}

impl LinearScale {
    pub const fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn is_degenerate(&self) -> bool {
        (self.domain[1] - self.domain[0]).abs() < f64::EPSILON
    }

    pub fn apply(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if self.is_degenerate() {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if (r1 - r0).abs() < f64::EPSILON {
            return (d0 + d1) / 2.0;
        }
        d0 + (pixel - r0) / (r1 - r0) * (d1 - d0)
    }

    /// `count` evenly spaced domain values, both ends included.
    #[allow(clippy::cast_precision_loss)]
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let [d0, d1] = self.domain;
        if self.is_degenerate() || count < 2 {
            return vec![d0];
        }
        let step = (d1 - d0) / (count - 1) as f64;
        (0..count).map(|i| d0 + step * i as f64).collect()
    }
}

/// Unit used to label elapsed-time ticks, picked from the size of the extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Picks the unit for an elapsed-time domain.
    ///
    /// The largest absolute value must reach two whole units before that unit
    /// is used, so a 90 second extent is labelled in seconds.
    pub fn from_extent(extent: [f64; 2]) -> Self {
        let max_abs = extent[0].abs().max(extent[1].abs());
        if max_abs >= 2.0 * MS_PER_DAY {
            Self::Days
        } else if max_abs >= 2.0 * MS_PER_HOUR {
            Self::Hours
        } else if max_abs >= 2.0 * MS_PER_MINUTE {
            Self::Minutes
        } else if max_abs >= 2.0 * MS_PER_SECOND {
            Self::Seconds
        } else {
            Self::Milliseconds
        }
    }

    pub const fn millis(self) -> f64 {
        match self {
            Self::Milliseconds => 1.0,
            Self::Seconds => MS_PER_SECOND,
            Self::Minutes => MS_PER_MINUTE,
            Self::Hours => MS_PER_HOUR,
            Self::Days => MS_PER_DAY,
        }
    }

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "min",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }

    /// Formats a millisecond value in this unit, e.g. `1.5min`.
    pub fn format(self, ms: f64) -> String {
        format!("{}{}", format_number(ms / self.millis()), self.suffix())
    }
}

/// Renders a number with at most one decimal, dropping a trailing `.0`.
fn format_number(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid printing "-0".
    let rounded = if rounded.abs() < f64::EPSILON { 0.0 } else { rounded };
    if rounded.fract().abs() < 1e-9 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

/// The node value a numeric scale reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Mean offset from the alignment event, in milliseconds.
    ElapsedTime,
    /// Signed depth.
    EventSequence,
    /// Number of sessions through the node.
    EventCount,
}

impl Measure {
    #[allow(clippy::cast_precision_loss)]
    pub fn value(self, node: &Node) -> f64 {
        match self {
            Self::ElapsedTime => node.mean_elapsed_ms(),
            Self::EventSequence => f64::from(node.depth),
            Self::EventCount => node.count as f64,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ElapsedTime => "Elapsed time",
            Self::EventSequence => "Event sequence",
            Self::EventCount => "# Events",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ElapsedTime => "elapsed_time",
            Self::EventSequence => "event_sequence",
            Self::EventCount => "event_count",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "elapsed_time" | "elapsed" => Ok(Self::ElapsedTime),
            "event_sequence" | "sequence" => Ok(Self::EventSequence),
            "event_count" | "count" => Ok(Self::EventCount),
            _ => Err(format!("unknown measure: {s}")),
        }
    }
}

/// A numeric scale bound to the node measure it reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericScale {
    pub measure: Measure,
    pub linear: LinearScale,
    /// Present only on the elapsed-time scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<TimeUnit>,
}

impl NumericScale {
    fn new(measure: Measure, domain: [f64; 2], range: [f64; 2]) -> Self {
        let time_unit = (measure == Measure::ElapsedTime).then(|| TimeUnit::from_extent(domain));
        Self {
            measure,
            linear: LinearScale::new(domain, range),
            time_unit,
        }
    }

    pub fn scale(&self, value: f64) -> f64 {
        self.linear.apply(value)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        self.linear.invert(pixel)
    }

    pub fn accessor(&self, node: &Node) -> f64 {
        self.measure.value(node)
    }

    /// `scale(accessor(node))`.
    pub fn position(&self, node: &Node) -> f64 {
        self.scale(self.accessor(node))
    }

    pub const fn label(&self) -> &'static str {
        self.measure.label()
    }

    pub const fn domain(&self) -> [f64; 2] {
        self.linear.domain
    }

    pub const fn range(&self) -> [f64; 2] {
        self.linear.range
    }

    pub fn tick_format(&self, value: f64) -> String {
        match self.time_unit {
            Some(unit) => unit.format(value),
            None => format_number(value),
        }
    }
}

/// Ordinal mapping from event names to palette colours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorScale {
    names: IndexMap<String, usize>,
}

impl ColorScale {
    pub const LABEL: &'static str = "Event type";

    fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = IndexMap::new();
        for name in names {
            let next = map.len();
            map.entry(name.to_string()).or_insert(next);
        }
        Self { names: map }
    }

    /// Colour for an event name. Unknown names get the first palette entry.
    pub fn scale(&self, name: &str) -> &'static str {
        let idx = self.names.get(name).copied().unwrap_or(0);
        PALETTE[idx % PALETTE.len()]
    }

    pub fn accessor<'a>(&self, node: &'a Node) -> &'a str {
        &node.name
    }

    pub fn color_of(&self, node: &Node) -> &'static str {
        self.scale(self.accessor(node))
    }

    pub const fn label(&self) -> &'static str {
        Self::LABEL
    }

    /// Distinct event names in first-seen order.
    pub fn domain(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A contiguous vertical pixel interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub start: f64,
    pub end: f64,
}

impl Band {
    pub fn height(&self) -> f64 {
        self.end - self.start
    }
}

/// Vertical bands reserved for each side of the alignment event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bands {
    pub after: Band,
    pub before: Band,
}

impl Bands {
    pub const fn get(&self, side: Side) -> Band {
        match side {
            Side::After => self.after,
            Side::Before => self.before,
        }
    }
}

/// Every scale derived for one (graph, width, height).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scales {
    pub elapsed_time: NumericScale,
    pub event_sequence: NumericScale,
    pub event_count: NumericScale,
    pub node_color: ColorScale,
    pub bands: Bands,
}

impl Scales {
    pub const fn numeric(&self, measure: Measure) -> &NumericScale {
        match measure {
            Measure::ElapsedTime => &self.elapsed_time,
            Measure::EventSequence => &self.event_sequence,
            Measure::EventCount => &self.event_count,
        }
    }
}

/// Domain extrema gathered in one traversal.
#[derive(Debug, Default)]
struct Extents {
    elapsed: Option<[f64; 2]>,
    depth: Option<[i32; 2]>,
    after_max: usize,
    before_max: usize,
}

fn widen<T: PartialOrd + Copy>(extent: Option<[T; 2]>, value: T) -> [T; 2] {
    match extent {
        None => [value, value],
        Some([lo, hi]) => [
            if value < lo { value } else { lo },
            if value > hi { value } else { hi },
        ],
    }
}

fn collect_extents(graph: &Graph) -> Extents {
    let mut extents = Extents::default();
    let mut per_depth: HashMap<i32, usize> = HashMap::new();

    for node in graph.event_nodes() {
        extents.elapsed = Some(widen(extents.elapsed, node.mean_elapsed_ms()));
        extents.depth = Some(widen(extents.depth, node.depth));
        *per_depth.entry(node.depth).or_insert(0) += node.count;
    }

    for (depth, total) in per_depth {
        match Side::of_depth(depth) {
            Side::After => extents.after_max = extents.after_max.max(total),
            Side::Before => extents.before_max = extents.before_max.max(total),
        }
    }
    extents
}

/// Builds every scale for `graph` drawn into `width` x `height` pixels.
#[allow(clippy::cast_precision_loss)]
pub fn build_scales(graph: &Graph, width: f64, height: f64) -> Result<Scales, FlowError> {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if !valid(width) || !valid(height) {
        return Err(FlowError::InvalidDimensions { width, height });
    }

    let extents = collect_extents(graph);
    let elapsed = extents.elapsed.unwrap_or([0.0, 0.0]);
    let [min_depth, max_depth] = extents.depth.unwrap_or([0, 0]);
    let total = extents.after_max + extents.before_max;

    let bands = if total == 0 {
        Bands {
            after: Band {
                start: 0.0,
                end: height,
            },
            before: Band {
                start: height,
                end: height,
            },
        }
    } else {
        let split = height * extents.after_max as f64 / total as f64;
        Bands {
            after: Band {
                start: 0.0,
                end: split,
            },
            before: Band {
                start: split,
                end: height,
            },
        }
    };

    let scales = Scales {
        elapsed_time: NumericScale::new(Measure::ElapsedTime, elapsed, [0.0, width]),
        event_sequence: NumericScale::new(
            Measure::EventSequence,
            [f64::from(min_depth), f64::from(max_depth)],
            [0.0, width],
        ),
        event_count: NumericScale::new(Measure::EventCount, [0.0, total as f64], [0.0, height]),
        node_color: ColorScale::new(graph.event_nodes().map(|node| node.name.as_str())),
        bands,
    };

    tracing::debug!(
        elapsed_min = elapsed[0],
        elapsed_max = elapsed[1],
        min_depth,
        max_depth,
        after_max = extents.after_max,
        before_max = extents.before_max,
        colors = scales.node_color.len(),
        "built scales"
    );
    Ok(scales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{Alignment, EventMatcher};
    use crate::event::{Event, Session};
    use crate::graph::build_graph;

    fn session(id: &str, events: &[(&str, i64)]) -> Session {
        Session::new(
            id,
            events
                .iter()
                .map(|(name, ms)| Event::new(*name, *ms))
                .collect(),
        )
    }

    fn graph_on(name: &str, sessions: &[Session]) -> Graph {
        let alignment = Alignment::new(EventMatcher::Named(name.to_string()), 1).unwrap();
        build_graph(sessions, &alignment).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_linear_scale_maps_and_inverts() {
        let scale = LinearScale::new([-10.0, 10.0], [0.0, 200.0]);
        assert!(close(scale.apply(0.0), 100.0));
        assert!(close(scale.apply(10.0), 200.0));
        assert!(close(scale.invert(50.0), -5.0));
    }

    #[test]
    fn test_degenerate_domain_maps_to_range_middle() {
        let scale = LinearScale::new([3.0, 3.0], [0.0, 80.0]);
        assert!(scale.is_degenerate());
        assert!(close(scale.apply(3.0), 40.0));
        assert!(close(scale.apply(1_000.0), 40.0));
        assert_eq!(scale.ticks(5), [3.0]);
    }

    #[test]
    fn test_ticks_span_the_domain() {
        let scale = LinearScale::new([0.0, 100.0], [0.0, 1.0]);
        assert_eq!(scale.ticks(5), [0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_time_unit_thresholds() {
        assert_eq!(TimeUnit::from_extent([0.0, 1_999.0]), TimeUnit::Milliseconds);
        assert_eq!(TimeUnit::from_extent([-2_000.0, 0.0]), TimeUnit::Seconds);
        assert_eq!(TimeUnit::from_extent([0.0, 90_000.0]), TimeUnit::Seconds);
        assert_eq!(TimeUnit::from_extent([0.0, 120_000.0]), TimeUnit::Minutes);
        assert_eq!(TimeUnit::from_extent([0.0, 3.0 * MS_PER_HOUR]), TimeUnit::Hours);
        assert_eq!(TimeUnit::from_extent([-5.0 * MS_PER_DAY, 0.0]), TimeUnit::Days);
    }

    #[test]
    fn test_time_unit_formatting() {
        assert_eq!(TimeUnit::Milliseconds.format(250.0), "250ms");
        assert_eq!(TimeUnit::Seconds.format(1_500.0), "1.5s");
        assert_eq!(TimeUnit::Minutes.format(-180_000.0), "-3min");
        assert_eq!(TimeUnit::Hours.format(0.0), "0h");
        assert_eq!(TimeUnit::Days.format(-0.01), "0d");
    }

    #[test]
    fn test_example_graph_scales() {
        let sessions = vec![
            session("1", &[("A", 0), ("B", 5)]),
            session("2", &[("A", 0), ("C", 7)]),
        ];
        let graph = graph_on("A", &sessions);
        let scales = build_scales(&graph, 600.0, 300.0).unwrap();

        assert_eq!(scales.elapsed_time.domain(), [0.0, 7.0]);
        assert_eq!(scales.elapsed_time.time_unit, Some(TimeUnit::Milliseconds));
        assert_eq!(scales.elapsed_time.label(), "Elapsed time");
        assert_eq!(scales.event_sequence.domain(), [0.0, 1.0]);
        assert_eq!(scales.event_count.domain(), [0.0, 2.0]);
        assert_eq!(scales.event_count.range(), [0.0, 300.0]);
        assert!(close(scales.bands.after.height(), 300.0));
        assert!(close(scales.bands.before.height(), 0.0));

        let names: Vec<_> = scales.node_color.domain().collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(scales.node_color.scale("B"), PALETTE[1]);
    }

    #[test]
    fn test_domains_bracket_every_node() {
        let sessions = vec![
            session("1", &[("X", 0), ("A", 100), ("B", 400), ("C", 900)]),
            session("2", &[("Y", 0), ("Z", 50), ("A", 3_000)]),
            session("3", &[("A", 0), ("B", 20)]),
        ];
        let graph = graph_on("A", &sessions);
        let scales = build_scales(&graph, 500.0, 250.0).unwrap();

        for node in graph.event_nodes() {
            for scale in [&scales.elapsed_time, &scales.event_sequence, &scales.event_count] {
                let [lo, hi] = scale.domain();
                let value = scale.accessor(node);
                assert!(
                    lo <= value && value <= hi,
                    "{} value {value} of {} outside [{lo}, {hi}]",
                    scale.label(),
                    node.name
                );
                let px = scale.position(node);
                let [r0, r1] = scale.range();
                assert!(r0 - 1e-9 <= px && px <= r1 + 1e-9);
            }
        }
    }

    #[test]
    fn test_bands_split_proportionally() {
        // After side peaks at 2 (depth 0), before side peaks at 2 (depth -1).
        let sessions = vec![
            session("1", &[("P", 0), ("A", 1)]),
            session("2", &[("Q", 0), ("A", 1)]),
        ];
        let graph = graph_on("A", &sessions);
        let scales = build_scales(&graph, 100.0, 400.0).unwrap();
        assert!(close(scales.bands.after.end, 200.0));
        assert!(close(scales.bands.before.start, 200.0));
        assert!(close(scales.bands.before.end, 400.0));
        assert!(close(scales.event_count.scale(2.0), 200.0));
        assert_eq!(scales.bands.get(Side::Before), scales.bands.before);
    }

    #[test]
    fn test_bands_follow_unequal_sides() {
        // After peaks at 3; only one session has an event before the anchor.
        let sessions = vec![
            session("1", &[("P", 0), ("A", 1)]),
            session("2", &[("A", 0)]),
            session("3", &[("A", 0), ("B", 1)]),
        ];
        let graph = graph_on("A", &sessions);
        let scales = build_scales(&graph, 100.0, 400.0).unwrap();
        assert!(close(scales.bands.after.height(), 300.0));
        assert!(close(scales.bands.before.height(), 100.0));
        let total = scales.bands.after.height() + scales.bands.before.height();
        assert!(close(total, scales.event_count.range()[1]));
    }

    #[test]
    fn test_empty_graph_gives_degenerate_scales() {
        let graph = build_graph(&[], &Alignment::default()).unwrap();
        let scales = build_scales(&graph, 200.0, 100.0).unwrap();

        assert!(scales.elapsed_time.linear.is_degenerate());
        assert!(close(scales.elapsed_time.scale(0.0), 100.0));
        assert!(close(scales.event_count.scale(5.0), 50.0));
        assert!(scales.node_color.is_empty());
        assert_eq!(scales.node_color.scale("anything"), PALETTE[0]);
        assert!(close(scales.bands.after.height(), 100.0));
    }

    #[test]
    fn test_single_node_graph_centres_the_anchor() {
        let graph = graph_on("A", &[session("1", &[("A", 0)])]);
        let scales = build_scales(&graph, 300.0, 100.0).unwrap();
        let anchor = graph.event_nodes().next().unwrap();
        assert!(close(scales.elapsed_time.position(anchor), 150.0));
        assert!(close(scales.event_count.position(anchor), 100.0));
    }

    #[test]
    fn test_palette_cycles() {
        let names: Vec<String> = (0..12).map(|i| format!("e{i}")).collect();
        let colors = ColorScale::new(names.iter().map(String::as_str));
        assert_eq!(colors.scale("e10"), PALETTE[0]);
        assert_eq!(colors.scale("e11"), PALETTE[1]);
    }

    #[test]
    fn test_tick_format_depends_on_scale() {
        let sessions = vec![session("1", &[("A", 0), ("B", 150_000)])];
        let graph = graph_on("A", &sessions);
        let scales = build_scales(&graph, 100.0, 100.0).unwrap();
        assert_eq!(scales.elapsed_time.time_unit, Some(TimeUnit::Minutes));
        assert_eq!(scales.elapsed_time.tick_format(150_000.0), "2.5min");
        assert_eq!(scales.event_count.tick_format(1.0), "1");
        assert_eq!(scales.event_sequence.time_unit, None);
    }

    #[test]
    fn test_invalid_dimensions_are_rejected() {
        let graph = Graph::default();
        assert!(matches!(
            build_scales(&graph, -1.0, 10.0),
            Err(FlowError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            build_scales(&graph, 10.0, f64::NAN),
            Err(FlowError::InvalidDimensions { .. })
        ));
        assert!(build_scales(&graph, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_measure_parses_short_names() {
        assert_eq!("elapsed".parse::<Measure>().unwrap(), Measure::ElapsedTime);
        assert_eq!("event_sequence".parse::<Measure>().unwrap(), Measure::EventSequence);
        assert!("bogus".parse::<Measure>().is_err());
    }
}
