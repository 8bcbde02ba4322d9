//! PNG rendering with plotters' bitmap backend.

use anyhow::{anyhow, Result};
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use std::path::Path;
use tracing::{info, warn};

use super::{describe::quantile, frame::ListingRow, neighbourhood::NeighbourhoodPrice};

pub const PRICE_DISTRIBUTION_FILE: &str = "price_distribution.png";
pub const HEATMAP_FILE: &str = "neighborhood_price_heatmap.png";

const BOX_SIZE: (u32, u32) = (1200, 600);
const HEATMAP_SIZE: (u32, u32) = (1200, 800);
const FONT: &str = "sans-serif";

/// Non-null prices per category, categories in first-appearance order.
pub fn prices_by<F>(rows: &[ListingRow], key: F) -> Vec<(String, Vec<f64>)>
where
    F: Fn(&ListingRow) -> Option<&str>,
{
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for r in rows {
        let Some(k) = key(r) else { continue };
        let idx = match groups.iter().position(|(name, _)| name == k) {
            Some(i) => i,
            None => {
                groups.push((k.to_string(), Vec::new()));
                groups.len() - 1
            }
        };
        if let Some(p) = r.price {
            groups[idx].1.push(p);
        }
    }
    groups
}

/// Two side-by-side box plots (price by room type, price by city), y-axis
/// clipped to the 95th percentile of all prices.
pub fn render_price_distribution(rows: &[ListingRow], path: &Path) -> Result<()> {
    let prices: Vec<f64> = rows.iter().filter_map(|r| r.price).collect();
    let y_max = quantile(&prices, 0.95);
    if y_max.is_nan() || y_max <= 0.0 {
        warn!(path = %path.display(), "no positive prices; skipping box plots");
        return Ok(());
    }

    let root = BitMapBackend::new(path, BOX_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (left, right) = root.split_horizontally(BOX_SIZE.0 / 2);

    draw_box_panel(
        &left,
        "Price Distribution by Room Type",
        "Room Type",
        &prices_by(rows, |r| r.room_type.as_deref()),
        y_max,
    )?;
    draw_box_panel(
        &right,
        "Price Distribution by City",
        "City",
        &prices_by(rows, |r| r.city.as_deref()),
        y_max,
    )?;

    root.present()
        .map_err(|e| anyhow!("writing {}: {e}", path.display()))?;
    info!(path = %path.display(), "box plots written");
    Ok(())
}

fn draw_box_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    x_desc: &str,
    groups: &[(String, Vec<f64>)],
    y_max: f64,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let labels: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
    let n = groups.len().max(1) as u32;

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..n).into_segmented(), 0f32..y_max as f32)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc("Price")
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(
        groups
            .iter()
            .enumerate()
            .filter(|(_, (_, values))| !values.is_empty())
            .map(|(i, (_, values))| {
                Boxplot::new_vertical(SegmentValue::CenterOf(i as u32), &Quartiles::new(values))
                    .width(40)
                    .style(BLUE)
            }),
    )?;
    Ok(())
}

/// Viridis approximated by linear interpolation between five anchors.
pub fn viridis(t: f64) -> RGBColor {
    const STOPS: [(u8, u8, u8); 5] = [
        (68, 1, 84),
        (59, 82, 139),
        (33, 145, 140),
        (94, 201, 98),
        (253, 231, 37),
    ];
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (STOPS.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(STOPS.len() - 1);
    let frac = pos - lo as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(
        mix(STOPS[lo].0, STOPS[hi].0),
        mix(STOPS[lo].1, STOPS[hi].1),
        mix(STOPS[lo].2, STOPS[hi].2),
    )
}

/// Single-row heatmap of mean price per neighbourhood group, values annotated.
pub fn render_neighbourhood_heatmap(groups: &[NeighbourhoodPrice], path: &Path) -> Result<()> {
    if groups.is_empty() {
        warn!(path = %path.display(), "no neighbourhood has enough listings; skipping heatmap");
        return Ok(());
    }

    let priced = groups.iter().map(|g| g.mean_price).filter(|p| p.is_finite());
    let (lo, hi) = priced.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p), hi.max(p))
    });
    let span = if hi > lo { hi - lo } else { 1.0 };

    let root = BitMapBackend::new(path, HEATMAP_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
    let n = groups.len() as u32;
    let mut chart = ChartBuilder::on(&root)
        .caption("Average Price by Neighborhood (Top 20)", (FONT, 24))
        .margin(20)
        .x_label_area_size(260)
        .y_label_area_size(40)
        .build_cartesian_2d((0u32..n).into_segmented(), 0f64..1f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_labels(groups.len())
        .x_label_style(
            TextStyle::from((FONT, 12).into_font()).transform(FontTransform::Rotate90),
        )
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(groups.iter().enumerate().map(|(i, g)| {
        let color = if g.mean_price.is_finite() {
            viridis((g.mean_price - lo) / span)
        } else {
            RGBColor(200, 200, 200)
        };
        Rectangle::new(
            [
                (SegmentValue::Exact(i as u32), 0.0),
                (SegmentValue::Exact(i as u32 + 1), 1.0),
            ],
            color.filled(),
        )
    }))?;

    let annotation = TextStyle::from((FONT, 14).into_font())
        .color(&WHITE)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(groups.iter().enumerate().map(|(i, g)| {
        let text = if g.mean_price.is_finite() {
            format!("{:.0}", g.mean_price)
        } else {
            "nan".to_string()
        };
        Text::new(text, (SegmentValue::CenterOf(i as u32), 0.5), annotation.clone())
    }))?;

    root.present()
        .map_err(|e| anyhow!("writing {}: {e}", path.display()))?;
    info!(path = %path.display(), groups = groups.len(), "heatmap written");
    Ok(())
}
