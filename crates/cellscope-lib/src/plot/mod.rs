use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

impl Axis {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

/// 0xRRGGBB.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn hex(&self) -> String {
        format!("#{:06X}", self.0)
    }
}

/// ColorBrewer Set1, cycled by combination index.
pub const SET1: [Color; 9] = [
    Color(0xE41A1C),
    Color(0x377EB8),
    Color(0x4DAF4A),
    Color(0x984EA3),
    Color(0xFF7F00),
    Color(0xFFFF33),
    Color(0xA65628),
    Color(0xF781BF),
    Color(0x999999),
];

pub fn palette_color(index: usize) -> Color {
    SET1[index % SET1.len()]
}

/// Diverging red → yellow → green scale (ColorBrewer RdYlGn, 11 classes).
const RDYLGN: [u32; 11] = [
    0xA50026, 0xD73027, 0xF46D43, 0xFDAE61, 0xFEE08B, 0xFFFFBF, 0xD9EF8B, 0xA6D96A, 0x66BD63,
    0x1A9850, 0x006837,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorScale {
    RdYlGn,
}

impl ColorScale {
    /// Colour at `t` in `[0, 1]`, linearly interpolated between stops.
    pub fn sample(&self, t: f64) -> Color {
        let stops = match self {
            ColorScale::RdYlGn => &RDYLGN,
        };
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let pos = t * (stops.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(stops.len() - 1);
        let frac = pos - lo as f64;
        let (r0, g0, b0) = Color(stops[lo]).rgb();
        let (r1, g1, b1) = Color(stops[hi]).rgb();
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        Color::from_rgb(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Shaded region between `upper` and `lower`, both in ascending x order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandSeries {
    pub name: String,
    pub upper: Vec<[f64; 2]>,
    pub lower: Vec<[f64; 2]>,
    pub color: Color,
    pub opacity: f64,
}

impl BandSeries {
    /// Closed outline: upper left → right, then lower right → left.
    pub fn outline(&self) -> Vec<[f64; 2]> {
        self.upper
            .iter()
            .copied()
            .chain(self.lower.iter().rev().copied())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramSeries {
    pub name: String,
    pub bins: Vec<Bin>,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Band(BandSeries),
    Histogram(HistogramSeries),
    Bar(BarSeries),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub legend_title: Option<String>,
    /// Set when the figure stands in for a chart that could not be drawn.
    pub notice: Option<String>,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis::default(),
            y: Axis::default(),
            legend_title: None,
            notice: None,
            series: Vec::new(),
        }
    }

    /// Empty figure whose title carries `message`.
    pub fn notice(message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fig = Self::new(Some(message.clone()));
        fig.notice = Some(message);
        fig
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn is_notice(&self) -> bool {
        self.notice.is_some()
    }

    /// Finite data extent as `(x_min, x_max, y_min, y_max)`. Histograms and
    /// bars include the zero baseline; bars use their category index as x.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points: Vec<[f64; 2]> = Vec::new();
        for series in &self.series {
            match series {
                Series::Line(line) => points.extend(line.points.iter().copied()),
                Series::Band(band) => points.extend(band.outline()),
                Series::Histogram(hist) => {
                    for bin in &hist.bins {
                        points.push([bin.start, 0.0]);
                        points.push([bin.end, bin.count as f64]);
                    }
                }
                Series::Bar(bar) => {
                    for (i, value) in bar.values.iter().enumerate() {
                        points.push([i as f64 - 0.5, 0.0]);
                        points.push([i as f64 + 0.5, *value]);
                    }
                }
            }
        }
        let finite = points
            .into_iter()
            .filter(|p| p[0].is_finite() && p[1].is_finite());
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for [x, y] in finite {
            bounds = Some(match bounds {
                None => (x, x, y, y),
                Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
            });
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        assert_eq!(palette_color(0), Color(0xE41A1C));
        assert_eq!(palette_color(9), palette_color(0));
    }

    #[test]
    fn color_scale_endpoints() {
        assert_eq!(ColorScale::RdYlGn.sample(0.0), Color(0xA50026));
        assert_eq!(ColorScale::RdYlGn.sample(1.0), Color(0x006837));
        assert_eq!(ColorScale::RdYlGn.sample(0.5), Color(0xFFFFBF));
    }

    #[test]
    fn band_outline_closes_loop() {
        let band = BandSeries {
            name: "b".into(),
            upper: vec![[0.0, 2.0], [1.0, 3.0]],
            lower: vec![[0.0, 0.0], [1.0, 1.0]],
            color: Color(0),
            opacity: 0.2,
        };
        assert_eq!(
            band.outline(),
            vec![[0.0, 2.0], [1.0, 3.0], [1.0, 1.0], [0.0, 0.0]]
        );
    }

    #[test]
    fn bounds_skip_non_finite_points() {
        let mut fig = Figure::new(Some("t".to_string()));
        fig.add_series(Series::Line(LineSeries {
            name: "l".into(),
            points: vec![[0.0, 1.0], [1.0, f64::NAN], [2.0, 5.0]],
            style: Style {
                width: 2.0,
                color: Color(0),
            },
        }));
        assert_eq!(fig.bounds(), Some((0.0, 2.0, 1.0, 5.0)));
        assert_eq!(Figure::notice("empty").bounds(), None);
    }
}
