//! Bar-chart layout for monthly keyword trend data.

pub const NO_TREND_DATA: &str = "No trend data available.";

const PADDING_TOP: f64 = 10.0;
const PADDING_RIGHT: f64 = 10.0;
// Room for rotated month labels.
const PADDING_BOTTOM: f64 = 50.0;
const PADDING_LEFT: f64 = 30.0;
const PADDING_INNER: f64 = 0.2;
const PADDING_OUTER: f64 = 0.1;
const Y_TICK_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub month: String,
    pub year: i32,
    pub value: f64,
}

impl TrendPoint {
    /// Short axis label, e.g. `Jan/24`.
    pub fn label(&self) -> String {
        let month: String = self.month.chars().take(3).collect();
        format!("{month}/{:02}", self.year.rem_euclid(100))
    }

    pub fn tooltip(&self) -> String {
        format!("{} {}: {}", self.month, self.year, format_tick(self.value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub plot_left: f64,
    pub plot_right: f64,
    pub baseline: f64,
    pub y_domain: (f64, f64),
    pub bars: Vec<Bar>,
    pub y_ticks: Vec<Tick>,
}

/// Lays out one bar per point. Returns `None` when there is nothing to draw.
pub fn layout(points: &[TrendPoint], width: f64, height: f64) -> Option<ChartLayout> {
    if points.is_empty() {
        return None;
    }

    let plot_left = PADDING_LEFT;
    let plot_right = width - PADDING_RIGHT;
    let band = BandScale::new(points.len(), plot_left, plot_right);

    let y_domain = y_domain(points);
    let y_range = (height - PADDING_BOTTOM, PADDING_TOP);
    let y = |value: f64| linear(value, y_domain, y_range);
    let baseline = y(0.0);

    let bars = points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let top = y(point.value.max(0.0));
            let bottom = y(point.value.min(0.0));
            Bar {
                label: point.label(),
                x: band.position(index),
                y: top,
                width: band.bandwidth,
                height: (bottom - top).abs(),
                tooltip: point.tooltip(),
            }
        })
        .collect();

    let y_ticks = ticks(y_domain.0, y_domain.1, Y_TICK_COUNT)
        .into_iter()
        .map(|value| Tick {
            value,
            y: y(value),
            label: format_tick(value),
        })
        .collect();

    Some(ChartLayout {
        width,
        height,
        plot_left,
        plot_right,
        baseline,
        y_domain,
        bars,
        y_ticks,
    })
}

struct BandScale {
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    fn new(count: usize, range_start: f64, range_stop: f64) -> Self {
        let n = count as f64;
        let step = (range_stop - range_start) / (n - PADDING_INNER + PADDING_OUTER * 2.0).max(1.0);
        // Centered alignment.
        let start = range_start + (range_stop - range_start - step * (n - PADDING_INNER)) * 0.5;
        Self {
            start,
            step,
            bandwidth: step * (1.0 - PADDING_INNER),
        }
    }

    fn position(&self, index: usize) -> f64 {
        self.start + self.step * index as f64
    }
}

/// Domain always includes zero and is padded by 5% of the span.
fn y_domain(points: &[TrendPoint]) -> (f64, f64) {
    let mut min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let mut max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);

    min = if min > 0.0 { 0.0 } else { min - (max - min) * 0.05 };
    max = if max < 0.0 { 0.0 } else { max + (max - min) * 0.05 };
    if min == max {
        min = if min > 0.0 { 0.0 } else { min - 1.0 };
        max = if max == 0.0 { 1.0 } else { max + 1.0 };
    }
    if max < min {
        max = min + 1.0;
    }
    (min, max)
}

fn linear(value: f64, domain: (f64, f64), range: (f64, f64)) -> f64 {
    let span = domain.1 - domain.0;
    if span == 0.0 {
        return range.0;
    }
    range.0 + (value - domain.0) / span * (range.1 - range.0)
}

/// Evenly spaced "nice" tick values covering the domain.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !(stop > start) {
        return Vec::new();
    }
    let raw_step = (stop - start) / count as f64;
    let power = raw_step.log10().floor();
    let base = 10f64.powf(power);
    let error = raw_step / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    let step = factor * base;
    let first = (start / step).ceil() as i64;
    let last = (stop / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Axis/tooltip number format: one significant digit with SI suffix from 1,000 up,
/// whole numbers below. Giga is spelled `B`.
pub fn format_tick(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let whole = value.round();
    if whole.abs() < 1000.0 {
        return format!("{whole:.0}");
    }
    let rounded = round_significant(value, 1);
    let exponent = ((rounded.abs().log10() / 3.0).floor() as i32).clamp(1, 4);
    let scaled = rounded / 10f64.powi(exponent * 3);
    let suffix = match exponent {
        1 => "k",
        2 => "M",
        3 => "B",
        _ => "T",
    };
    format!("{scaled:.0}{suffix}")
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let shift = digits - 1 - magnitude;
    // Dividing by an exact power of ten avoids 0.001-style representation error.
    if shift >= 0 {
        let factor = 10f64.powi(shift);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-shift);
        (value / factor).round() * factor
    }
}
