use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Plot, PlotPoint, Text};

use crate::state::{AppState, SectionId};

// ---------------------------------------------------------------------------
// Bar chart (one per section)
// ---------------------------------------------------------------------------

/// The reference dashboard's series color (#2C73D2).
const BAR_COLOR: Color32 = Color32::from_rgb(0x2C, 0x73, 0xD2);

/// Render one section's aggregated means as a labelled bar chart.
pub fn bar_chart(ui: &mut Ui, state: &AppState, id: SectionId) {
    let section = match id {
        SectionId::WaterAddition => &state.water_addition,
        SectionId::WaterSuction => &state.water_suction,
        SectionId::Packing => &state.packing,
    };
    let series = &section.series;

    ui.label(RichText::new(id.chart_title()).strong());

    if series.is_empty() {
        ui.weak("Sin datos para los filtros seleccionados.");
        return;
    }

    let labels: Vec<String> = series.iter().map(|g| g.label.clone()).collect();
    let bars: Vec<Bar> = series
        .iter()
        .enumerate()
        .map(|(i, g)| {
            Bar::new(i as f64, g.mean)
                .name(format!("{} (n={})", g.label, g.count))
                .width(0.6)
                .fill(BAR_COLOR)
        })
        .collect();

    let max_mean = series.iter().map(|g| g.mean).fold(0.0_f64, f64::max);

    Plot::new(format!("chart-{id:?}"))
        .height(320.0)
        .y_axis_label("Tiempo promedio [s]")
        .x_axis_formatter(move |mark, _range| {
            // Only integer positions carry a group label.
            let rounded = mark.value.round();
            if rounded < 0.0 || (mark.value - rounded).abs() > 1e-6 {
                return String::new();
            }
            labels.get(rounded as usize).cloned().unwrap_or_default()
        })
        .include_y(0.0)
        .include_y(max_mean * 1.15)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));

            // Rounded mean above each bar, like the reference dashboard.
            for (i, group) in series.iter().enumerate() {
                plot_ui.text(Text::new(
                    PlotPoint::new(i as f64, group.mean + max_mean * 0.04),
                    RichText::new(format!("{:.2}", group.mean)).strong(),
                ));
            }
        });
}
