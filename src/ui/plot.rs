use eframe::egui::{RichText, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoint, PlotPoints, PlotUi,
    Points,
};

use crate::chart::{AxisScale, ChartKind, ChartSpec, SeriesGroup, count_into, histogram_bins};
use crate::color::{ColorMap, DEFAULT_SERIES_COLOR};
use crate::data::model::Dataset;
use crate::data::stats::box_summary;
use crate::state::{AppState, ChartOutcome};

// ---------------------------------------------------------------------------
// Chart section (central panel)
// ---------------------------------------------------------------------------

/// Render the chart for the current settings, or the reason there is none.
pub fn chart_section(ui: &mut Ui, state: &AppState) {
    ui.heading("Interactive Visualization");

    let (Some(outcome), Some(filtered)) = (&state.chart, &state.filtered) else {
        return;
    };

    match outcome {
        ChartOutcome::NoData => {
            ui.label(
                RichText::new("No data left after filtering. Adjust filters in the sidebar.")
                    .color(ui.visuals().warn_fg_color),
            );
        }
        ChartOutcome::MissingAxis(_) => {
            ui.label(
                RichText::new("Please select a Y-axis column in the sidebar.")
                    .color(ui.visuals().error_fg_color),
            );
        }
        ChartOutcome::Invalid(msg) => {
            ui.label(RichText::new(msg).color(ui.visuals().error_fg_color));
        }
        ChartOutcome::Ready(spec) => {
            ui.strong(&spec.title);
            draw_chart(ui, filtered, spec, state.color_map.as_ref());
        }
    }
}

fn group_color(group: &SeriesGroup, colors: Option<&ColorMap>) -> eframe::egui::Color32 {
    match (&group.key, colors) {
        (Some(key), Some(map)) => map.color_for(key),
        _ => DEFAULT_SERIES_COLOR,
    }
}

/// Draw a chart spec with `egui_plot`.
fn draw_chart(ui: &mut Ui, dataset: &Dataset, spec: &ChartSpec, colors: Option<&ColorMap>) {
    let horizontal_box = spec.kind == ChartKind::Box && spec.y.is_none();

    let y_label = match (&spec.y, spec.kind) {
        (_, ChartKind::Histogram) => "count".to_string(),
        (Some(y), _) => y.column.clone(),
        (None, _) => String::new(),
    };

    let mut plot = Plot::new("chart")
        .legend(Legend::default())
        .height(420.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true);

    if horizontal_box {
        plot = plot.x_axis_label(spec.x.column.clone());
    } else {
        plot = plot.x_axis_label(spec.x.column.clone()).y_axis_label(y_label);
        if let AxisScale::Categorical { .. } = &spec.x.scale {
            let scale = spec.x.scale.clone();
            plot = plot.x_axis_formatter(move |mark, _range| {
                scale.label_at(mark.value).unwrap_or_default()
            });
        }
        if let Some(y) = &spec.y {
            if let AxisScale::Categorical { .. } = &y.scale {
                let scale = y.scale.clone();
                plot = plot.y_axis_formatter(move |mark, _range| {
                    scale.label_at(mark.value).unwrap_or_default()
                });
            }
        }
    }

    if spec.kind == ChartKind::Scatter {
        let hover = hover_texts(dataset, spec);
        plot = plot.label_formatter(move |name, value| nearest_hover(&hover, name, value));
    }

    plot.show(ui, |plot_ui| match spec.kind {
        ChartKind::Line => draw_lines(plot_ui, dataset, spec, colors),
        ChartKind::Scatter => draw_points(plot_ui, dataset, spec, colors),
        ChartKind::Bar => draw_bars(plot_ui, dataset, spec, colors),
        ChartKind::Histogram => draw_histogram(plot_ui, dataset, spec, colors),
        ChartKind::Box => draw_boxes(plot_ui, dataset, spec, colors),
    });
}

fn draw_lines(
    plot_ui: &mut PlotUi,
    dataset: &Dataset,
    spec: &ChartSpec,
    colors: Option<&ColorMap>,
) {
    for group in &spec.groups {
        let points: PlotPoints = spec
            .xy_points(dataset, group)
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        plot_ui.line(
            Line::new(points)
                .name(&group.label)
                .color(group_color(group, colors))
                .width(1.5),
        );
    }
}

fn draw_points(
    plot_ui: &mut PlotUi,
    dataset: &Dataset,
    spec: &ChartSpec,
    colors: Option<&ColorMap>,
) {
    for group in &spec.groups {
        let points: PlotPoints = spec
            .xy_points(dataset, group)
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        plot_ui.points(
            Points::new(points)
                .name(&group.label)
                .color(group_color(group, colors))
                .radius(3.0),
        );
    }
}

fn draw_bars(
    plot_ui: &mut PlotUi,
    dataset: &Dataset,
    spec: &ChartSpec,
    colors: Option<&ColorMap>,
) {
    let points: Vec<Vec<[f64; 2]>> = spec
        .groups
        .iter()
        .map(|g| spec.xy_points(dataset, g).into_iter().map(|(_, p)| p).collect())
        .collect();
    let (xs, heights) = stacked_bar_heights(&points);
    let width = bar_width(&xs);

    let mut stacked: Vec<BarChart> = Vec::new();
    for (group, sums) in spec.groups.iter().zip(heights) {
        let color = group_color(group, colors);
        let bars: Vec<Bar> = xs
            .iter()
            .zip(sums)
            .map(|(&x, y)| Bar::new(x, y).width(width).fill(color))
            .collect();
        let below: Vec<&BarChart> = stacked.iter().collect();
        let chart = BarChart::new(bars)
            .name(&group.label)
            .color(color)
            .stack_on(&below);
        stacked.push(chart);
    }
    for chart in stacked {
        plot_ui.bar_chart(chart);
    }
}

/// Bar heights per group over the shared, sorted x positions.
///
/// Rows that share an x within a group are summed, and a group with no row at
/// some x gets a zero bar there. Stacking matches bars by index, so every
/// group needs the same positions.
fn stacked_bar_heights(groups: &[Vec<[f64; 2]>]) -> (Vec<f64>, Vec<Vec<f64>>) {
    let mut xs: Vec<f64> = groups.iter().flatten().map(|p| p[0]).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();

    let heights = groups
        .iter()
        .map(|points| {
            let mut sums = vec![0.0; xs.len()];
            for [x, y] in points {
                if let Ok(i) = xs.binary_search_by(|p| p.total_cmp(x)) {
                    sums[i] += y;
                }
            }
            sums
        })
        .collect();
    (xs, heights)
}

fn draw_histogram(
    plot_ui: &mut PlotUi,
    dataset: &Dataset,
    spec: &ChartSpec,
    colors: Option<&ColorMap>,
) {
    let nbins = spec.nbins.unwrap_or(30);
    let all: Vec<f64> = spec
        .groups
        .iter()
        .flat_map(|g| spec.x_positions(dataset, g))
        .collect();

    // Categorical x: one bar per category instead of numeric bins.
    let edges = match &spec.x.scale {
        AxisScale::Numeric => histogram_bins(&all, nbins),
        AxisScale::Categorical { categories } => (0..categories.len())
            .map(|i| crate::chart::HistogramBin {
                start: i as f64 - 0.4,
                end: i as f64 + 0.4,
                count: 0,
            })
            .collect(),
    };

    let mut stacked: Vec<BarChart> = Vec::new();
    for group in &spec.groups {
        let color = group_color(group, colors);
        let counts = count_into(&edges, &spec.x_positions(dataset, group));
        let bars: Vec<Bar> = counts
            .iter()
            .map(|b| {
                Bar::new((b.start + b.end) / 2.0, b.count as f64)
                    .width(b.end - b.start)
                    .fill(color)
            })
            .collect();
        let below: Vec<&BarChart> = stacked.iter().collect();
        let chart = BarChart::new(bars)
            .name(&group.label)
            .color(color)
            .stack_on(&below);
        stacked.push(chart);
    }
    for chart in stacked {
        plot_ui.bar_chart(chart);
    }
}

fn draw_boxes(
    plot_ui: &mut PlotUi,
    dataset: &Dataset,
    spec: &ChartSpec,
    colors: Option<&ColorMap>,
) {
    let n_groups = spec.groups.len().max(1) as f64;
    let slot_width = 0.8 / n_groups;

    for (gi, group) in spec.groups.iter().enumerate() {
        let color = group_color(group, colors);
        let mut boxes: Vec<BoxElem> = Vec::new();

        if spec.y.is_some() {
            // One box of y values per distinct x position.
            let mut by_x: Vec<(f64, Vec<f64>)> = Vec::new();
            for (_, [x, y]) in spec.xy_points(dataset, group) {
                match by_x.iter_mut().find(|(px, _)| *px == x) {
                    Some((_, ys)) => ys.push(y),
                    None => by_x.push((x, vec![y])),
                }
            }
            let offset = (gi as f64 - (n_groups - 1.0) / 2.0) * slot_width;
            for (x, ys) in by_x {
                if let Some(b) = box_summary(&ys) {
                    boxes.push(
                        BoxElem::new(x + offset, spread(&b))
                            .name(&group.label)
                            .box_width(slot_width * 0.9)
                            .fill(color.linear_multiply(0.3))
                            .stroke(eframe::egui::Stroke::new(1.5, color)),
                    );
                }
            }
            plot_ui.box_plot(BoxPlot::new(boxes).name(&group.label).color(color));
        } else {
            // No y: one horizontal box of x values per group.
            if let Some(b) = box_summary(&spec.x_positions(dataset, group)) {
                boxes.push(
                    BoxElem::new(gi as f64, spread(&b))
                        .name(&group.label)
                        .box_width(0.5)
                        .fill(color.linear_multiply(0.3))
                        .stroke(eframe::egui::Stroke::new(1.5, color)),
                );
            }
            plot_ui.box_plot(
                BoxPlot::new(boxes)
                    .name(&group.label)
                    .color(color)
                    .horizontal(),
            );
        }
    }
}

fn spread(b: &crate::data::stats::BoxSummary) -> BoxSpread {
    BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker)
}

/// 80% of the smallest gap between distinct x positions.
fn bar_width(xs: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |a| a.min(gap))))
        .map_or(0.8, |gap| gap * 0.8)
}

// ---------------------------------------------------------------------------
// Scatter hover: every column of the row under the cursor
// ---------------------------------------------------------------------------

struct HoverPoint {
    group: String,
    xy: [f64; 2],
    text: String,
}

fn hover_texts(dataset: &Dataset, spec: &ChartSpec) -> Vec<HoverPoint> {
    let columns: Vec<(usize, &str)> = spec
        .hover_columns
        .iter()
        .filter_map(|c| dataset.column_index(c).map(|i| (i, c.as_str())))
        .collect();

    spec.groups
        .iter()
        .flat_map(|group| {
            spec.xy_points(dataset, group)
                .into_iter()
                .map(|(row, xy)| {
                    let text = columns
                        .iter()
                        .filter_map(|(i, name)| {
                            dataset.value(row, *i).map(|v| format!("{name}: {v}"))
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    HoverPoint {
                        group: group.label.clone(),
                        xy,
                        text,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn nearest_hover(points: &[HoverPoint], name: &str, value: &PlotPoint) -> String {
    points
        .iter()
        .filter(|p| name.is_empty() || p.group == name)
        .min_by(|a, b| {
            let da = (a.xy[0] - value.x).powi(2) + (a.xy[1] - value.y).powi(2);
            let db = (b.xy[0] - value.x).powi(2) + (b.xy[1] - value.y).powi(2);
            da.total_cmp(&db)
        })
        .map(|p| p.text.clone())
        .unwrap_or_else(|| format!("x = {:.4}\ny = {:.4}", value.x, value.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_width_follows_tightest_gap() {
        assert_eq!(bar_width(&[0.0, 1.0, 3.0]), 0.8);
        assert!((bar_width(&[10.0, 10.5, 20.0]) - 0.4).abs() < 1e-12);
        assert_eq!(bar_width(&[5.0, 5.0]), 0.8);
    }

    #[test]
    fn bars_sum_rows_sharing_an_x_and_align_groups() {
        // COUNTY positions 0 and 1; two tracts of one county land on x = 0.
        let taos = vec![[0.0, 3721.0], [0.0, 1200.0], [1.0, 500.0]];
        let lea = vec![[1.0, 800.0], [2.0, 50.0]];
        let (xs, heights) = stacked_bar_heights(&[taos, lea]);

        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
        assert_eq!(heights[0], vec![4921.0, 500.0, 0.0]);
        assert_eq!(heights[1], vec![0.0, 800.0, 50.0]);
    }

    #[test]
    fn hover_picks_nearest_point_of_the_series() {
        let points = vec![
            HoverPoint { group: "Taos".into(), xy: [0.0, 0.0], text: "a".into() },
            HoverPoint { group: "Lea".into(), xy: [1.0, 1.0], text: "b".into() },
        ];
        assert_eq!(nearest_hover(&points, "Taos", &PlotPoint::new(0.9, 0.9)), "a");
        assert_eq!(nearest_hover(&points, "", &PlotPoint::new(0.9, 0.9)), "b");
        assert!(nearest_hover(&points, "Luna", &PlotPoint::new(0.0, 0.0)).starts_with("x = "));
    }
}
