use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use qsim_station::ExperimentSummary;

/// Plots average wait and server utilization against the number of servers.
pub(crate) fn plot_sweep(path: &Path, points: &[(u32, ExperimentSummary)]) -> Result<(), Box<dyn Error>> {
    if points.is_empty() {
        return Ok(());
    }
    let min_servers = points.iter().map(|p| p.0).min().unwrap_or(1);
    let max_servers = points.iter().map(|p| p.0).max().unwrap_or(1);
    let max_y = points
        .iter()
        .map(|(_, s)| f64::max(s.avg_wait_min, s.utilization_pct))
        .fold(0., f64::max)
        * 1.1;

    let root_area = BitMapBackend::new(path, (1400, 1000)).into_drawing_area();
    root_area.fill(&WHITE)?;
    let mut ctx = ChartBuilder::on(&root_area)
        .caption("Service station: staffing sweep", ("sans-serif", 30))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 60)
        .build_cartesian_2d(min_servers..max_servers + 1, 0.0..f64::max(max_y, 1.))?;
    ctx.configure_mesh()
        .x_desc("number of servers")
        .y_desc("performance metric")
        .draw()?;

    let series: [(&str, RGBColor, fn(&ExperimentSummary) -> f64); 2] = [
        ("average wait (min)", BLUE, |s| s.avg_wait_min),
        ("server utilization (%)", RED, |s| s.utilization_pct),
    ];
    for (label, color, metric) in series {
        let style = ShapeStyle::from(&color).filled();
        ctx.draw_series(LineSeries::new(points.iter().map(|(c, s)| (*c, metric(s))), style).point_size(5))?
            .label(label)
            .legend(move |pos| Circle::new(pos, 5, style));
    }
    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;
    root_area.present()?;
    Ok(())
}
