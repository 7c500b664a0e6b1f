use egui::{Align2, ComboBox, DragValue, Image, Slider, Ui, Window, vec2};
use globe_tiles::{Layer, sources::Attribution};

use crate::app::{Shown, TilesApp};

const CELL_SIZE: f32 = 128.;

pub fn grid(ui: &mut Ui, shown: &Shown) {
    let size = usize::from(shown.grid.size.get());

    egui::Grid::new("tiles")
        .spacing([2., 2.])
        .show(ui, |ui| {
            for row in shown.textures.chunks(size) {
                for texture in row {
                    match texture {
                        Some(texture) => {
                            ui.add(
                                Image::new(texture).fit_to_exact_size(vec2(CELL_SIZE, CELL_SIZE)),
                            );
                        }
                        None => {
                            ui.allocate_space(vec2(CELL_SIZE, CELL_SIZE));
                        }
                    }
                }
                ui.end_row();
            }
        });

    ui.label(format!(
        "{} around {} (zoom {})",
        shown.grid.layer, shown.grid.center, shown.grid.zoom
    ));
}

pub fn controls(app: &mut TilesApp, ui: &Ui) {
    Window::new("Controls")
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .anchor(Align2::RIGHT_TOP, [-10., 10.])
        .show(ui.ctx(), |ui| {
            let selection = &mut app.selection;

            ComboBox::from_label("Layer")
                .selected_text(selection.layer.to_string())
                .show_ui(ui, |ui| {
                    for layer in Layer::ALL {
                        ui.selectable_value(&mut selection.layer, layer, layer.to_string());
                    }
                });

            ui.horizontal(|ui| {
                ui.label("lat");
                ui.add(DragValue::new(&mut selection.lat).range(-90.0..=90.0).speed(0.01));
                ui.label("lon");
                ui.add(DragValue::new(&mut selection.lon).range(-180.0..=180.0).speed(0.01));
            });

            ui.add(Slider::new(&mut selection.zoom, 0..=22).text("zoom"));

            let range = app.providers().zoom_range(app.selection.layer);
            if !range.contains(&app.selection.zoom) {
                ui.label(format!("{} goes up to {}", app.selection.layer, range.end()));
            }

            ui.horizontal(|ui| {
                if ui.button("Fetch").clicked() {
                    app.fetch();
                }

                if app.is_loading() {
                    ui.spinner();
                }
            });

            ui.label(format!("downloads in progress: {}", app.http.stats().in_progress));
        });
}

pub fn acknowledge(ui: &Ui, attribution: Attribution) {
    Window::new("Acknowledge")
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .anchor(Align2::LEFT_BOTTOM, [10., -10.])
        .show(ui.ctx(), |ui| {
            ui.horizontal(|ui| {
                ui.label("imagery provided by");
                ui.hyperlink_to(attribution.text, attribution.url);
            });
        });
}
