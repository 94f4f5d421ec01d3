//! Dashboard panels drawn with egui

use eframe::egui::{self, Color32, FontId, RichText, Sense};

use crate::models::{NewsArticle, Stock, TrafficCamera, TravelRoute, WeatherData};
use crate::player::DecodedFrame;

const RED: Color32 = Color32::from_rgb(220, 38, 38);
const GREEN: Color32 = Color32::from_rgb(22, 163, 74);
const TICKER_BG: Color32 = Color32::from_rgb(17, 24, 39);
const TICKER_SPEED: f32 = 60.0; // points per second

/// Texture holding the most recent decoded video frame
#[derive(Default)]
pub struct VideoSurface {
    texture: Option<egui::TextureHandle>,
}

impl VideoSurface {
    /// Upload `frame` if there is a new one
    pub fn update(&mut self, ctx: &egui::Context, frame: Option<DecodedFrame>) {
        let Some(frame) = frame else { return };
        let size = [frame.width as usize, frame.height as usize];
        let image = egui::ColorImage::from_rgb(size, &frame.data);
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                let texture = ctx.load_texture("video_frame", image, egui::TextureOptions::LINEAR);
                self.texture = Some(texture);
            }
        }
    }

    pub fn clear(&mut self) {
        self.texture = None;
    }

    pub fn has_frame(&self) -> bool {
        self.texture.is_some()
    }

    /// Draw the frame letterboxed into the available space
    pub fn show(&self, ui: &mut egui::Ui) {
        let Some(ref texture) = self.texture else { return };
        let available = ui.available_size();
        let tex_size = texture.size_vec2();
        let aspect = tex_size.x / tex_size.y;

        let (width, height) = if available.x / available.y > aspect {
            (available.y * aspect, available.y)
        } else {
            (available.x, available.x / aspect)
        };

        ui.centered_and_justified(|ui| {
            ui.image((texture.id(), egui::vec2(width, height)));
        });
    }
}

/// Centered status text over the video area, with an optional action button.
/// Returns true when the button was clicked.
pub fn video_message(ui: &mut egui::Ui, text: &str, color: Color32, action: Option<&str>) -> bool {
    let mut clicked = false;
    ui.vertical_centered(|ui| {
        ui.add_space((ui.available_height() / 2.0 - 30.0).max(0.0));
        ui.label(RichText::new(text).size(20.0).color(color));
        if let Some(action) = action {
            ui.add_space(10.0);
            clicked = ui.button(RichText::new(action).size(18.0)).clicked();
        }
    });
    clicked
}

/// Spinner plus text while a stream connects
pub fn connecting(ui: &mut egui::Ui, title: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space((ui.available_height() / 2.0 - 30.0).max(0.0));
        ui.spinner();
        ui.label(format!("Connecting to {}...", title));
    });
}

/// Card for embedded-player streams; the player itself opens in the browser
pub fn embedded_card(ui: &mut egui::Ui, title: &str, source: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space((ui.available_height() / 2.0 - 40.0).max(0.0));
        ui.label(RichText::new(title).size(22.0).strong());
        ui.add_space(8.0);
        ui.hyperlink_to("▶ Open live player", source);
    });
}

/// Top headline in a dark box at the bottom left of the video
pub fn headline_overlay(ui: &mut egui::Ui, rect: egui::Rect, article: &NewsArticle) {
    let area = egui::Rect::from_min_size(
        rect.left_bottom() + egui::vec2(16.0, -110.0),
        egui::vec2((rect.width() * 0.6).min(560.0), 80.0),
    );
    ui.scope_builder(egui::UiBuilder::new().max_rect(area), |ui| {
        egui::Frame::new()
            .fill(Color32::from_black_alpha(180))
            .inner_margin(egui::Margin::same(12))
            .corner_radius(4.0)
            .show(ui, |ui| {
                ui.horizontal_top(|ui| {
                    let (square, _) =
                        ui.allocate_exact_size(egui::vec2(14.0, 14.0), Sense::hover());
                    ui.painter().rect_filled(square, 0.0, RED);
                    ui.add(
                        egui::Label::new(
                            RichText::new(&article.headline)
                                .size(22.0)
                                .strong()
                                .color(Color32::WHITE),
                        )
                        .wrap(),
                    );
                });
            });
    });
}

/// Current time, weekday and date
pub fn clock(ui: &mut egui::Ui) {
    let now = chrono::Local::now();
    ui.vertical_centered(|ui| {
        ui.label(RichText::new(now.format("%H:%M:%S").to_string()).size(40.0).strong());
        ui.label(RichText::new(now.format("%A").to_string()).size(18.0).color(RED));
        ui.label(RichText::new(now.format("%B %-d, %Y").to_string()).weak());
    });
}

pub fn weather_panel(ui: &mut egui::Ui, weather: &WeatherData) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(&weather.city).size(20.0).strong());
            ui.horizontal(|ui| {
                ui.label(RichText::new(weather.icon.glyph()).size(42.0));
                ui.vertical(|ui| {
                    let temperature = format!("{}°", weather.temperature);
                    ui.label(RichText::new(temperature).size(36.0).strong());
                    ui.label(&weather.condition);
                });
            });
            ui.label(format!(
                "Feels like {}°  ·  Here {}°",
                weather.feels_like, weather.location_specific_temp
            ));
        });

        ui.separator();
        ui.columns(weather.forecast.len().max(1), |columns| {
            for (column, day) in columns.iter_mut().zip(&weather.forecast) {
                column.vertical_centered(|ui| {
                    ui.label(RichText::new(&day.day).strong());
                    ui.label(RichText::new(day.icon.glyph()).size(22.0));
                    ui.label(format!("{}°", day.temp));
                });
            }
        });
    });
}

pub fn travel_panel(ui: &mut egui::Ui, routes: &[TravelRoute], cameras: &[TrafficCamera]) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("TEEVO.COM").small().weak());
            ui.label(RichText::new("TRAVEL TIMES RIGHT NOW").size(18.0).strong());
        });
        ui.separator();

        for camera in cameras {
            banner(ui, &camera.name);
            ui.vertical_centered(|ui| {
                ui.hyperlink_to("📷 Watch live camera", &camera.source);
            });
            ui.add_space(6.0);
        }

        for route in routes {
            banner(ui, &route.name);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(&route.location).strong());
            });
            ui.columns(2, |columns| {
                minutes_box(&mut columns[0], "NOW", route.now_minutes, RED);
                minutes_box(&mut columns[1], "NORMAL", route.normal_minutes, Color32::BLACK);
            });
            ui.add_space(6.0);
        }
    });
}

fn banner(ui: &mut egui::Ui, text: &str) {
    egui::Frame::new().fill(GREEN).inner_margin(egui::Margin::same(4)).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(text).size(18.0).strong().color(Color32::WHITE));
        });
    });
}

fn minutes_box(ui: &mut egui::Ui, label: &str, minutes: u32, fill: Color32) {
    egui::Frame::new().fill(fill).inner_margin(egui::Margin::same(6)).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(label).strong().color(Color32::WHITE));
            ui.label(
                RichText::new(format!("{} MIN", minutes))
                    .size(22.0)
                    .strong()
                    .color(Color32::WHITE),
            );
        });
    });
}

/// Horizontally scrolling stock prices
pub fn stock_ticker(ui: &mut egui::Ui, stocks: &[Stock]) {
    if stocks.is_empty() {
        return;
    }
    let (rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 36.0), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, TICKER_BG);

    let symbol_font = FontId::proportional(14.0);
    let value_font = FontId::proportional(18.0);
    let y = rect.center().y;

    // Lay out one pass to learn its width, then draw it twice for a seamless loop
    let draw_pass = |start_x: f32, paint: bool| -> f32 {
        let mut x = start_x;
        for stock in stocks {
            let up = stock.change >= 0.0;
            let color = if up { GREEN } else { RED };
            let parts = [
                (stock.symbol.clone(), symbol_font.clone(), Color32::GRAY),
                (format!("{:.2}", stock.price), value_font.clone(), Color32::WHITE),
                ((if up { "▲" } else { "▼" }).to_string(), value_font.clone(), color),
                (format!("{:.2}", stock.change.abs()), value_font.clone(), color),
            ];
            for (text, font, color) in parts {
                let galley = painter.layout_no_wrap(text, font, color);
                let size = galley.size();
                if paint {
                    painter.galley(egui::pos2(x, y - size.y / 2.0), galley, color);
                }
                x += size.x + 6.0;
            }
            x += 24.0;
        }
        x - start_x
    };

    let pass_width = draw_pass(0.0, false).max(1.0);
    let time = ui.ctx().input(|i| i.time) as f32;
    let offset = (time * TICKER_SPEED) % pass_width;
    let mut x = rect.left() - offset;
    while x < rect.right() {
        draw_pass(x, true);
        x += pass_width;
    }
    ui.ctx().request_repaint();
}

/// Red bar with the current alert
pub fn alert_bar(ui: &mut egui::Ui, message: &str) {
    egui::Frame::new().fill(RED).inner_margin(egui::Margin::symmetric(12, 6)).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.label(RichText::new("ALERT").strong().color(Color32::YELLOW));
            ui.label(RichText::new(message).strong().color(Color32::WHITE));
        });
    });
}
