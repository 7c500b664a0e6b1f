use egui::{Context, TextureHandle, TextureOptions};
use globe_tiles::{
    GridFetcher, GridIo, GridRequest, HttpFetch, Layer, Providers, TextureLoader, TileGrid,
    lat_lon,
};

use crate::windows;

/// What the user wants to look at.
pub struct Selection {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
    pub layer: Layer,
}

impl Default for Selection {
    fn default() -> Self {
        // Manhattan.
        Self {
            lat: 40.71,
            lon: -74.00,
            zoom: 14,
            layer: Layer::Streets,
        }
    }
}

impl Selection {
    fn request(&self) -> GridRequest {
        GridRequest::new(lat_lon(self.lat, self.lon), self.zoom, self.layer)
    }
}

/// Fetched grid, uploaded to the GPU. One slot per cell, so rows stay aligned even when a
/// texture could not be shown.
pub struct Shown {
    pub grid: TileGrid,
    pub textures: Vec<Option<TextureHandle>>,
}

pub struct TilesApp {
    pub selection: Selection,
    pub shown: Option<Shown>,
    pub http: HttpFetch,
    io: GridIo<HttpFetch>,
    providers: Providers,
}

impl TilesApp {
    pub fn new(egui_ctx: Context) -> Self {
        let http = HttpFetch::new();
        let providers = Providers::from_env();
        let loader = TextureLoader::new(http.clone(), providers.clone());

        let io = GridIo::new(GridFetcher::new(loader), move || egui_ctx.request_repaint());

        let app = Self {
            selection: Selection::default(),
            shown: None,
            http,
            io,
            providers,
        };
        app.fetch();
        app
    }

    pub fn fetch(&self) {
        self.io.request(self.selection.request());
    }

    pub fn is_loading(&self) -> bool {
        self.io.is_loading()
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    fn upload(ctx: &Context, grid: TileGrid) -> Shown {
        let textures = grid
            .cells
            .iter()
            .enumerate()
            .map(|(index, cell)| match cell.texture.to_color_image() {
                Ok(image) => Some(ctx.load_texture(
                    format!("cell-{index}"),
                    image,
                    TextureOptions::default(),
                )),
                Err(e) => {
                    log::warn!("Cannot show cell {index}: {e}.");
                    None
                }
            })
            .collect();

        Shown { grid, textures }
    }
}

impl eframe::App for TilesApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if let Some(grid) = self.io.poll() {
            log::debug!("Got grid around {}.", grid.center);
            self.shown = Some(Self::upload(ctx, grid));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(shown) = &self.shown {
                windows::grid(ui, shown);
            }

            windows::controls(self, ui);
            windows::acknowledge(ui, self.providers().attribution(self.selection.layer));
        });
    }
}
