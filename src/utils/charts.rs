//! SVG Chart Generator for Experiment Results
//!
//! Generates clean SVG charts for the training curves, the confusion matrix
//! heatmap, and the ROC curves. These can be used directly in presentations
//! or reports.

use std::fs;
use std::path::Path;

/// Chart styling constants
const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 80.0;
const MARGIN_LEFT: f64 = 80.0;

const COLOR_TRAIN: &str = "#3498db";
const COLOR_VAL: &str = "#2ecc71";
const COLOR_GRID: &str = "#ecf0f1";
const COLOR_AXIS: &str = "#2c3e50";
const COLOR_TEXT: &str = "#2c3e50";

/// Palette cycled through for per-class ROC curves
const CLASS_COLORS: [&str; 6] = [
    "#3498db", "#2ecc71", "#e74c3c", "#9b59b6", "#f39c12", "#16a085",
];

/// A data point for a line chart
#[derive(Debug, Clone)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

/// A data series for line charts
#[derive(Debug, Clone)]
pub struct DataSeries {
    pub name: String,
    pub points: Vec<DataPoint>,
    pub color: String,
    pub dashed: bool,
}

impl DataSeries {
    /// Build a series from per-epoch values (x = epoch number, 1-based)
    pub fn from_epochs(name: &str, values: &[f64], color: &str) -> Self {
        Self {
            name: name.to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &y)| DataPoint {
                    x: (i + 1) as f64,
                    y,
                })
                .collect(),
            color: color.to_string(),
            dashed: false,
        }
    }
}

/// Generate a train-vs-validation curve chart for one metric
pub fn generate_metric_chart(
    title: &str,
    y_label: &str,
    train: &[f64],
    validation: &[f64],
    output_path: &Path,
) -> std::io::Result<()> {
    let series = vec![
        DataSeries::from_epochs("train", train, COLOR_TRAIN),
        DataSeries::from_epochs("val", validation, COLOR_VAL),
    ];
    generate_line_chart(title, "Epochs", y_label, &series, output_path)
}

/// Generate a line chart SVG with a data-driven y range
pub fn generate_line_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[DataSeries],
    output_path: &Path,
) -> std::io::Result<()> {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let (x_min, x_max, y_min, y_max) = find_ranges(series);
    let y_min = y_min.min(0.0);
    let y_max = if (y_max - y_min).abs() < f64::EPSILON {
        y_min + 1.0
    } else {
        y_max
    };
    let x_span = (x_max - x_min).max(f64::EPSILON);
    let y_span = y_max - y_min;

    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str(&format!(
        r#"<text x="{}" y="35" text-anchor="middle" font-family="Arial, sans-serif" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
        CHART_WIDTH / 2.0,
        COLOR_TEXT,
        escape_xml(title)
    ));

    // Grid lines and y-axis labels
    for i in 0..=5 {
        let y = MARGIN_TOP + plot_height - (i as f64 / 5.0) * plot_height;
        let value = y_min + (i as f64 / 5.0) * y_span;

        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
            MARGIN_LEFT,
            y,
            MARGIN_LEFT + plot_width,
            y,
            COLOR_GRID
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="12" fill="{}">{:.2}</text>"#,
            MARGIN_LEFT - 10.0,
            y + 4.0,
            COLOR_TEXT,
            value
        ));
    }

    // Axes
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT,
        MARGIN_TOP + plot_height,
        MARGIN_LEFT + plot_width,
        MARGIN_TOP + plot_height,
        COLOR_AXIS
    ));
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        MARGIN_TOP + plot_height,
        COLOR_AXIS
    ));

    // Axis labels
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}">{}</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        CHART_HEIGHT - 20.0,
        COLOR_TEXT,
        escape_xml(x_label)
    ));
    svg.push_str(&format!(
        r#"<text x="20" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}" transform="rotate(-90 20 {})">{}</text>"#,
        CHART_HEIGHT / 2.0,
        COLOR_TEXT,
        CHART_HEIGHT / 2.0,
        escape_xml(y_label)
    ));

    // Plot each series
    for series_data in series {
        if series_data.points.is_empty() {
            continue;
        }

        let mut path = String::new();
        for (i, point) in series_data.points.iter().enumerate() {
            let x = MARGIN_LEFT + ((point.x - x_min) / x_span) * plot_width;
            let y = MARGIN_TOP + plot_height - ((point.y - y_min) / y_span) * plot_height;

            if i == 0 {
                path.push_str(&format!("M {} {}", x, y));
            } else {
                path.push_str(&format!(" L {} {}", x, y));
            }
        }

        let dash = if series_data.dashed {
            r#" stroke-dasharray="8 4""#
        } else {
            ""
        };
        svg.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="2.5"{}/>"#,
            path, series_data.color, dash
        ));
    }

    // Legend
    let mut legend_y = MARGIN_TOP + 10.0;
    for series_data in series {
        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}"/>"#,
            CHART_WIDTH - MARGIN_RIGHT - 220.0,
            legend_y,
            series_data.color
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
            CHART_WIDTH - MARGIN_RIGHT - 200.0,
            legend_y + 12.0,
            COLOR_TEXT,
            escape_xml(&series_data.name)
        ));
        legend_y += 22.0;
    }

    svg.push_str("</svg>");

    fs::write(output_path, svg)
}

/// Generate a confusion-matrix heatmap SVG
///
/// Cells are shaded on a white-to-green ramp by count, with the raw count
/// annotated in each cell.
pub fn generate_confusion_heatmap(
    title: &str,
    matrix: &[usize],
    num_classes: usize,
    class_names: &[&str],
    output_path: &Path,
) -> std::io::Result<()> {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT - 80.0;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let cell_w = plot_width / num_classes as f64;
    let cell_h = plot_height / num_classes as f64;
    let max_count = matrix.iter().copied().max().unwrap_or(0).max(1);

    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str(&format!(
        r#"<text x="{}" y="35" text-anchor="middle" font-family="Arial, sans-serif" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
        CHART_WIDTH / 2.0,
        COLOR_TEXT,
        escape_xml(title)
    ));

    for row in 0..num_classes {
        for col in 0..num_classes {
            let count = matrix[row * num_classes + col];
            let intensity = count as f64 / max_count as f64;

            // White-to-green ramp
            let r = (255.0 - 180.0 * intensity) as u8;
            let g = (255.0 - 90.0 * intensity) as u8;
            let b = (255.0 - 180.0 * intensity) as u8;

            let x = MARGIN_LEFT + col as f64 * cell_w;
            let y = MARGIN_TOP + row as f64 * cell_h;

            svg.push_str(&format!(
                r##"<rect x="{}" y="{}" width="{}" height="{}" fill="rgb({},{},{})" stroke="#bdc3c7" stroke-width="1"/>"##,
                x, y, cell_w, cell_h, r, g, b
            ));

            let text_color = if intensity > 0.6 { "white" } else { COLOR_TEXT };
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="16" font-weight="bold" fill="{}">{}</text>"#,
                x + cell_w / 2.0,
                y + cell_h / 2.0 + 5.0,
                text_color,
                count
            ));
        }
    }

    // Row labels (ground truth) and column labels (predictions)
    for (idx, name) in class_names.iter().enumerate().take(num_classes) {
        let y = MARGIN_TOP + idx as f64 * cell_h + cell_h / 2.0;
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="11" fill="{}">{}</text>"#,
            MARGIN_LEFT - 8.0,
            y + 4.0,
            COLOR_TEXT,
            escape_xml(name)
        ));

        let x = MARGIN_LEFT + idx as f64 * cell_w + cell_w / 2.0;
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="11" fill="{}">{}</text>"#,
            x,
            MARGIN_TOP + plot_height + 20.0,
            COLOR_TEXT,
            escape_xml(name)
        ));
    }

    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="13" font-weight="bold" fill="{}">Predictions</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        CHART_HEIGHT - 20.0,
        COLOR_TEXT
    ));
    svg.push_str(&format!(
        r#"<text x="20" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="13" font-weight="bold" fill="{}" transform="rotate(-90 20 {})">Ground Truth</text>"#,
        CHART_HEIGHT / 2.0,
        COLOR_TEXT,
        CHART_HEIGHT / 2.0
    ));

    svg.push_str("</svg>");

    fs::write(output_path, svg)
}

/// A labelled ROC curve ready for plotting
#[derive(Debug, Clone)]
pub struct RocSeries {
    pub name: String,
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub auc: f64,
}

/// Generate an ROC chart SVG with the chance diagonal
///
/// Each curve's legend entry carries its AUC. Axes are fixed to [0, 1].
pub fn generate_roc_chart(
    title: &str,
    curves: &[RocSeries],
    output_path: &Path,
) -> std::io::Result<()> {
    let mut series: Vec<DataSeries> = Vec::with_capacity(curves.len() + 1);

    for (idx, curve) in curves.iter().enumerate() {
        series.push(DataSeries {
            name: format!("{} (area = {:.4})", curve.name, curve.auc),
            points: curve
                .fpr
                .iter()
                .zip(curve.tpr.iter())
                .map(|(&x, &y)| DataPoint { x, y })
                .collect(),
            color: CLASS_COLORS[idx % CLASS_COLORS.len()].to_string(),
            dashed: false,
        });
    }

    // Chance diagonal
    series.push(DataSeries {
        name: "chance".to_string(),
        points: vec![DataPoint { x: 0.0, y: 0.0 }, DataPoint { x: 1.0, y: 1.0 }],
        color: "#34495e".to_string(),
        dashed: true,
    });

    generate_line_chart(
        title,
        "False Positive Rate",
        "True Positive Rate",
        &series,
        output_path,
    )
}

fn find_ranges(series: &[DataSeries]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for s in series {
        for p in &s.points {
            x_min = x_min.min(p.x);
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
    }

    if !x_min.is_finite() {
        (0.0, 1.0, 0.0, 1.0)
    } else {
        (x_min, x_max, y_min, y_max)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_chart_generation() {
        let train = vec![0.5, 0.7, 0.85, 0.9];
        let val = vec![0.45, 0.65, 0.8, 0.82];

        let path = std::env::temp_dir().join("bioad_test_metric_chart.svg");
        generate_metric_chart("Bio-AD Accuracy", "Accuracy", &train, &val, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<svg"));
        assert!(content.contains("Bio-AD Accuracy"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_confusion_heatmap_generation() {
        let matrix = vec![10, 1, 0, 0, 2, 8, 1, 0, 0, 1, 9, 1, 0, 0, 2, 7];
        let names = ["Mild", "Moderate", "Non", "VeryMild"];

        let path = std::env::temp_dir().join("bioad_test_heatmap.svg");
        generate_confusion_heatmap("Confusion Matrix", &matrix, 4, &names, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Ground Truth"));
        assert!(content.contains("Predictions"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_roc_chart_generation() {
        let curves = vec![RocSeries {
            name: "Non-Demented".to_string(),
            fpr: vec![0.0, 0.1, 0.5, 1.0],
            tpr: vec![0.0, 0.7, 0.9, 1.0],
            auc: 0.87,
        }];

        let path = std::env::temp_dir().join("bioad_test_roc.svg");
        generate_roc_chart("Receiver Operating Characteristic", &curves, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("area = 0.8700"));
        assert!(content.contains("stroke-dasharray"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&c"), "a&lt;b&gt;&amp;c");
    }
}
