use anyhow::Result;
use cellscope_lib::{
    chart::{Diagnostics, Heatmap, PhaseCheck},
    format_number,
    plot::{Color as PlotColor, Figure, Series as FigSeries},
    ChartDescription, ExportFormat,
};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const PANEL_SIZE: (u32, u32) = (800, 480);
const HEATMAP_SIZE: (u32, u32) = (1000, 600);
const DIAGNOSTICS_SIZE: (u32, u32) = (1000, 800);

fn rgb(color: PlotColor) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

fn grid_shape(panels: usize) -> (usize, usize) {
    let cols = if panels <= 1 { 1 } else { 2 };
    (panels.div_ceil(cols).max(1), cols)
}

fn canvas_size(chart: &ChartDescription) -> (u32, u32) {
    match chart {
        ChartDescription::Individual { .. } => PANEL_SIZE,
        ChartDescription::Multi { panels, .. } => {
            let (rows, cols) = grid_shape(panels.len());
            (PANEL_SIZE.0 * cols as u32, PANEL_SIZE.1 * rows as u32)
        }
        ChartDescription::Heatmap { .. } => HEATMAP_SIZE,
        ChartDescription::Diagnostics { .. } => DIAGNOSTICS_SIZE,
    }
}

fn pad_range(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

/// Label for an integer tick position, blank between cells.
fn index_label(labels: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Draw `chart` into `out_dir/<filename>.<ext>`. PNG output is scaled by the
/// export scale; SVG is vector and keeps the base size.
pub fn render_chart(chart: &ChartDescription, out_dir: &Path) -> Result<PathBuf> {
    let export = chart.export();
    let (w, h) = canvas_size(chart);
    let path = out_dir.join(format!(
        "{}.{}",
        export.filename,
        export.format.extension()
    ));
    match export.format {
        ExportFormat::Png => {
            let scale = export.scale.max(1);
            let root = BitMapBackend::new(&path, (w * scale, h * scale)).into_drawing_area();
            draw_chart(&root, chart)?;
            root.present()?;
        }
        ExportFormat::Svg => {
            let root = SVGBackend::new(&path, (w, h)).into_drawing_area();
            draw_chart(&root, chart)?;
            root.present()?;
        }
    }
    log::info!("Wrote {}", path.display());
    Ok(path)
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartDescription,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    match chart {
        ChartDescription::Individual { panel, .. } => draw_figure(root, &panel.figure),
        ChartDescription::Multi { panels, .. } => {
            if panels.is_empty() {
                return draw_notice(root, "No channel data available");
            }
            let areas = root.split_evenly(grid_shape(panels.len()));
            for (area, panel) in areas.iter().zip(panels) {
                draw_figure(area, &panel.figure)?;
            }
            Ok(())
        }
        ChartDescription::Heatmap { heatmap, .. } => draw_heatmap(root, heatmap),
        ChartDescription::Diagnostics { diagnostics, .. } => draw_diagnostics(root, diagnostics),
    }
}

fn draw_notice<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, message: &str) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    area.draw(&Text::new(
        message.to_string(),
        (20, 20),
        ("sans-serif", 20).into_font(),
    ))?;
    Ok(())
}

fn draw_figure<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, fig: &Figure) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    if let Some(notice) = &fig.notice {
        return draw_notice(area, notice);
    }
    let title = fig.title.clone().unwrap_or_else(|| "Plot".into());
    let Some((x0, x1, y0, y1)) = fig.bounds() else {
        return draw_notice(area, &format!("{}: nothing to plot", title));
    };
    let (x0, x1) = pad_range(x0, x1);
    let (y0, y1) = pad_range(y0, y1);
    let categories: Vec<String> = fig
        .series
        .iter()
        .find_map(|s| match s {
            FigSeries::Bar(bar) => Some(bar.categories.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let x_fmt = |x: &f64| index_label(&categories, *x);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(fig.x.label.clone().unwrap_or_default())
        .y_desc(fig.y.label.clone().unwrap_or_default());
    if !categories.is_empty() {
        mesh.x_labels(categories.len().min(48))
            .x_label_formatter(&x_fmt);
    }
    mesh.draw()?;

    let mut has_legend = false;
    for series in &fig.series {
        match series {
            FigSeries::Line(line) => {
                let color = rgb(line.style.color);
                let width = line.style.width.max(1.0) as u32;
                chart
                    .draw_series(LineSeries::new(
                        line.points
                            .iter()
                            .filter(|p| p[0].is_finite() && p[1].is_finite())
                            .map(|p| (p[0], p[1])),
                        color.stroke_width(width),
                    ))?
                    .label(line.name.clone())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                has_legend = true;
            }
            FigSeries::Band(band) => {
                let color = rgb(band.color);
                let outline: Vec<(f64, f64)> =
                    band.outline().into_iter().map(|p| (p[0], p[1])).collect();
                if outline.len() >= 3 {
                    chart.draw_series(std::iter::once(Polygon::new(
                        outline,
                        color.mix(band.opacity).filled(),
                    )))?;
                }
            }
            FigSeries::Histogram(hist) => {
                let color = rgb(hist.color);
                chart.draw_series(hist.bins.iter().filter(|b| b.count > 0).map(|b| {
                    Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], color.filled())
                }))?;
            }
            FigSeries::Bar(bar) => {
                let color = rgb(bar.color);
                chart.draw_series(
                    bar.values
                        .iter()
                        .copied()
                        .enumerate()
                        .filter(|(_, v)| v.is_finite())
                        .map(|(i, v)| {
                            let x = i as f64;
                            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, v)], color.filled())
                        }),
                )?;
            }
        }
    }

    if has_legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    Ok(())
}

fn draw_heatmap<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, map: &Heatmap) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    let ncols = map.times.len();
    let nrows = map.rows.len();
    if ncols == 0 || nrows == 0 {
        return draw_notice(area, &map.title);
    }
    let (lo, hi) = map.value_range().unwrap_or((0.0, 1.0));
    let span = if hi > lo { hi - lo } else { 1.0 };

    let width = area.dim_in_pixel().0 as i32;
    let (chart_area, scale_area) = area.split_horizontally((width - 110).max(100));

    let time_labels: Vec<String> = map.times.iter().map(|t| format_number(*t)).collect();
    // Row 0 is drawn at the top.
    let row_labels: Vec<String> = map.rows.iter().rev().map(|r| r.label.clone()).collect();
    let x_fmt = |x: &f64| index_label(&time_labels, *x);
    let y_fmt = |y: &f64| index_label(&row_labels, *y);

    let mut chart = ChartBuilder::on(&chart_area)
        .margin(10)
        .caption(map.title.clone(), ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(180)
        .build_cartesian_2d(-0.5..ncols as f64 - 0.5, -0.5..nrows as f64 - 0.5)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(map.x.label.clone().unwrap_or_default())
        .y_desc(map.y.label.clone().unwrap_or_default())
        .x_labels(ncols.min(24))
        .y_labels(nrows)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()?;

    chart.draw_series(map.rows.iter().enumerate().flat_map(|(r, row)| {
        let y = (nrows - 1 - r) as f64;
        row.values
            .iter()
            .copied()
            .enumerate()
            .filter_map(move |(c, value)| {
                value.map(|v| {
                    let color = rgb(map.color_scale.sample((v - lo) / span));
                    let x = c as f64;
                    Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
                })
            })
    }))?;

    let mut bar = ChartBuilder::on(&scale_area)
        .margin(10)
        .margin_top(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, lo..lo + span)?;
    bar.configure_mesh()
        .disable_mesh()
        .x_labels(0)
        .y_desc(map.color_label.clone())
        .draw()?;
    let steps = 64;
    bar.draw_series((0..steps).map(|i| {
        let t0 = i as f64 / steps as f64;
        let t1 = (i + 1) as f64 / steps as f64;
        let color = rgb(map.color_scale.sample((t0 + t1) / 2.0));
        Rectangle::new([(0.0, lo + t0 * span), (1.0, lo + t1 * span)], color.filled())
    }))?;
    Ok(())
}

fn draw_diagnostics<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    diag: &Diagnostics,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    match &diag.phase {
        PhaseCheck::Figures { histogram, wells } => {
            let areas = area.split_evenly((2, 1));
            draw_figure(&areas[0], histogram)?;
            draw_figure(&areas[1], wells)?;
            Ok(())
        }
        PhaseCheck::Unavailable { message } => draw_notice(
            area,
            &format!("{} Sheets: {}", message, diag.sheets.join(", ")),
        ),
    }
}
