//! An animated speedometer gauge widget.
//!
//! The dial is a circular face with 17 tick segments over a 0..160 speed
//! range, numeric labels on every other tick, and a needle that swings
//! between speeds with a deliberate wobble. Hosts call [`Speedometer::drive`]
//! and [`Speedometer::stop_drive`] (or feed [`SpeedometerCommand`]s through a
//! channel), pump [`Speedometer::tick`] from their frame callback, and draw
//! with [`Speedometer::render`]. A self-contained winit/pixels window runner
//! is provided for hosts that just want a window.

pub mod animation;
pub mod config;
pub mod geometry;

pub use animation::{AnimationController, Phase};
pub use config::{Color, SpeedometerConfig};
pub use geometry::DialLayout;

use rusttype::{Font, Scale};
use tracing::{debug, warn};

use std::sync::mpsc::Receiver;
use std::time::Instant;

use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use pixels::{Pixels, SurfaceTexture};

use geometry::{point_on_circle, speed_to_angle, Point, LABEL_TEXT};

/// Host-to-widget messages for the channel-driven window runner.
#[derive(Debug, Clone)]
pub enum SpeedometerCommand {
    Drive,
    StopDrive,
}

/// The speedometer widget: styling, size-derived layout, and animated state.
pub struct Speedometer {
    config: SpeedometerConfig,
    layout: DialLayout,
    controller: AnimationController,
    font: Option<Font<'static>>,
}

impl Speedometer {
    pub fn new(config: SpeedometerConfig) -> Self {
        let font = if config.font_data.is_empty() {
            None
        } else {
            let parsed = Font::try_from_vec(config.font_data.clone());
            if parsed.is_none() {
                warn!("label font bytes did not parse, dial numbers will be skipped");
            }
            parsed
        };
        let layout = DialLayout::new(config.default_size);
        Self {
            config,
            layout,
            controller: AnimationController::new(),
            font,
        }
    }

    /// Begin (or restart) the acceleration animation.
    pub fn drive(&mut self) {
        self.controller.drive();
    }

    /// Begin the deceleration animation back to a stopped, black needle.
    pub fn stop_drive(&mut self) {
        self.controller.stop_drive();
    }

    /// The host's drawable square changed; rebuild the dial layout.
    pub fn on_resize(&mut self, size: u32) {
        if size != self.layout.size {
            debug!(size, "rebuilding dial layout");
            self.layout = DialLayout::new(size);
        }
    }

    /// Advance the animations by `dt_ms`. Returns true when a redraw is
    /// warranted.
    pub fn tick(&mut self, dt_ms: u64) -> bool {
        self.controller.tick(dt_ms)
    }

    pub fn current_speed(&self) -> i32 {
        self.controller.current_speed()
    }

    pub fn arrow_color(&self) -> Color {
        self.controller.arrow_color()
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn layout(&self) -> &DialLayout {
        &self.layout
    }

    /// Draw the gauge onto the surface. Pure read of the layout and the
    /// animated state.
    pub fn render(&self, canvas: &mut Canvas) {
        let layout = &self.layout;
        let center = (layout.center, layout.center);
        let mut scene = Scene::new();

        scene.add(DrawCommand::Clear(self.config.background_color));
        // outer edging, stroked on the face-radius centerline
        scene.add(DrawCommand::Ring {
            center,
            radius: layout.face_radius,
            thickness: layout.edging_width,
            color: self.config.outer_edging_color,
        });
        // face with the white-core gradient, covering the ring's inner half
        scene.add(DrawCommand::RadialFace {
            center,
            radius: layout.face_radius,
            edge_color: self.config.background_color,
        });
        for &(start, end) in &layout.segments {
            scene.add(DrawCommand::Line {
                start,
                end,
                thickness: layout.tick_thickness,
                color: self.config.segments_color,
            });
        }
        for (&position, text) in layout.labels.iter().zip(LABEL_TEXT) {
            scene.add(DrawCommand::Text {
                position,
                text: text.to_string(),
                size: layout.label_text_size,
                color: self.config.segments_color,
            });
        }
        let angle = speed_to_angle(self.controller.current_speed());
        scene.add(DrawCommand::Line {
            start: center,
            end: point_on_circle(layout.needle_length, layout.center, angle as f64),
            thickness: layout.tick_thickness,
            color: self.controller.arrow_color(),
        });

        scene.render(canvas, self.font.as_ref());
    }

    /// Open a window and run until closed. Space starts a drive, S stops it.
    pub fn show(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.run_window(None)
    }

    /// Like [`show`](Self::show), but drive/stop signals arrive over a
    /// channel, drained once per frame.
    pub fn show_with_commands(
        &mut self,
        receiver: Receiver<SpeedometerCommand>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.run_window(Some(receiver))
    }

    fn run_window(
        &mut self,
        receiver: Option<Receiver<SpeedometerCommand>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let side = self.config.default_size as f64;
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(side, side))
            .build(&event_loop)?;
        let window = std::sync::Arc::new(window);

        let window_clone = window.clone();
        let size = window.inner_size();
        let mut fb_width = size.width as usize;
        let mut fb_height = size.height as usize;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;
        self.on_resize(size.width.min(size.height));

        let frame_duration = std::time::Duration::from_secs_f64(1.0 / self.config.max_framerate);
        let mut last_frame = Instant::now();
        let mut last_tick = Instant::now();

        event_loop.run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        fb_width = new_size.width as usize;
                        fb_height = new_size.height as usize;
                        let _ = pixels.resize_buffer(new_size.width, new_size.height);
                        let _ = pixels.resize_surface(new_size.width, new_size.height);
                        self.on_resize(new_size.width.min(new_size.height));
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state == ElementState::Pressed && !event.repeat {
                            match &event.logical_key {
                                Key::Named(NamedKey::Space) => self.drive(),
                                Key::Character(c) if c.as_str() == "s" || c.as_str() == "S" => {
                                    self.stop_drive()
                                }
                                _ => {}
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Some(ref receiver) = receiver {
                            while let Ok(command) = receiver.try_recv() {
                                match command {
                                    SpeedometerCommand::Drive => self.drive(),
                                    SpeedometerCommand::StopDrive => self.stop_drive(),
                                }
                            }
                        }
                        let dt_ms = last_tick.elapsed().as_millis() as u64;
                        last_tick = Instant::now();
                        self.tick(dt_ms);

                        let frame = pixels.frame_mut();
                        let mut canvas = Canvas::new(frame, fb_width, fb_height);
                        self.render(&mut canvas);
                        let _ = pixels.render();
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if last_frame.elapsed() >= frame_duration {
                        window_clone.request_redraw();
                        last_frame = Instant::now();
                    }
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}

// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================

#[derive(Clone, Debug)]
enum DrawCommand {
    Clear(Color),
    Ring {
        center: Point,
        radius: f32,
        thickness: f32,
        color: Color,
    },
    RadialFace {
        center: Point,
        radius: f32,
        edge_color: Color,
    },
    Line {
        start: Point,
        end: Point,
        thickness: f32,
        color: Color,
    },
    Text {
        position: Point,
        text: String,
        size: f32,
        color: Color,
    },
}

struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    fn add(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    fn render(&self, canvas: &mut Canvas, font: Option<&Font>) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => {
                    canvas.clear(*color);
                }
                DrawCommand::Ring {
                    center,
                    radius,
                    thickness,
                    color,
                } => {
                    draw_ring(canvas, *center, *radius, *thickness, *color);
                }
                DrawCommand::RadialFace {
                    center,
                    radius,
                    edge_color,
                } => {
                    draw_radial_face(canvas, *center, *radius, *edge_color);
                }
                DrawCommand::Line {
                    start,
                    end,
                    thickness,
                    color,
                } => {
                    draw_line(canvas, *start, *end, *thickness, *color);
                }
                DrawCommand::Text {
                    position,
                    text,
                    size,
                    color,
                } => {
                    if let Some(font) = font {
                        draw_text(canvas, *position, text, font, Scale::uniform(*size), *color);
                    }
                }
            }
        }
    }
}

/// A borrowed RGBA framebuffer.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    fn clear(&mut self, color: Color) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, 0xff]);
        }
    }
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

fn set_pixel(canvas: &mut Canvas, x: i32, y: i32, color: Color, alpha: f32) {
    if x < 0 || y < 0 || x as usize >= canvas.width || y as usize >= canvas.height {
        return;
    }
    let idx = (y as usize * canvas.width + x as usize) * 4;
    let src = [color.r as f32, color.g as f32, color.b as f32];
    let dst = [
        canvas.frame[idx] as f32,
        canvas.frame[idx + 1] as f32,
        canvas.frame[idx + 2] as f32,
    ];
    let a = alpha.clamp(0.0, 1.0);
    let out = [
        (src[0] * a + dst[0] * (1.0 - a)).round() as u8,
        (src[1] * a + dst[1] * (1.0 - a)).round() as u8,
        (src[2] * a + dst[2] * (1.0 - a)).round() as u8,
        0xff,
    ];
    canvas.frame[idx..idx + 4].copy_from_slice(&out);
}

/// Anti-aliased thick line between two points, used for ticks and the needle.
fn draw_line(canvas: &mut Canvas, start: Point, end: Point, thickness: f32, color: Color) {
    let (x0, y0) = start;
    let (x1, y1) = end;
    let pad = thickness.ceil() as i32 + 1;
    let min_x = x0.min(x1).floor() as i32 - pad;
    let max_x = x0.max(x1).ceil() as i32 + pad;
    let min_y = y0.min(y1).floor() as i32 - pad;
    let max_y = y0.max(y1).ceil() as i32 + pad;
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = dx * dx + dy * dy;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32 - x0;
            let py = y as f32 - y0;
            let t = if len_sq > 0.0 {
                ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let lx = x0 + t * dx;
            let ly = y0 + t * dy;
            let dist = ((lx - x as f32).powi(2) + (ly - y as f32).powi(2)).sqrt();
            let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                set_pixel(canvas, x, y, color, aa);
            }
        }
    }
}

/// Stroked circle centered on `center`, `thickness` wide around `radius`.
fn draw_ring(canvas: &mut Canvas, center: Point, radius: f32, thickness: f32, color: Color) {
    let (cx, cy) = center;
    let outer = radius + thickness / 2.0;
    let inner = (radius - thickness / 2.0).max(0.0);
    let min_x = (cx - outer).floor() as i32 - 1;
    let max_x = (cx + outer).ceil() as i32 + 1;
    let min_y = (cy - outer).floor() as i32 - 1;
    let max_y = (cy + outer).ceil() as i32 + 1;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let aa = if dist > outer {
                1.0 - (dist - outer).min(1.0)
            } else if dist < inner {
                1.0 - (inner - dist).min(1.0)
            } else {
                1.0
            };
            if aa > 0.0 {
                set_pixel(canvas, x, y, color, aa);
            }
        }
    }
}

/// Filled disc fading from a white core to `edge_color` at the rim.
fn draw_radial_face(canvas: &mut Canvas, center: Point, radius: f32, edge_color: Color) {
    let (cx, cy) = center;
    let min_x = (cx - radius).floor() as i32;
    let max_x = (cx + radius).ceil() as i32;
    let min_y = (cy - radius).floor() as i32;
    let max_y = (cy + radius).ceil() as i32;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > radius + 1.0 {
                continue;
            }
            let t = (dist / radius).clamp(0.0, 1.0) as f64;
            let color = Color::WHITE.lerp(edge_color, t);
            let aa = if dist > radius {
                1.0 - (dist - radius).min(1.0)
            } else {
                1.0
            };
            if aa > 0.0 {
                set_pixel(canvas, x, y, color, aa);
            }
        }
    }
}

/// Text centered on `position`.
fn draw_text(
    canvas: &mut Canvas,
    position: Point,
    text: &str,
    font: &Font,
    scale: Scale,
    color: Color,
) {
    use rusttype::{point, PositionedGlyph};
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .collect();
    let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    let width_px = if min_x < max_x { max_x - min_x } else { 0 };
    let height_px = if min_y < max_y { max_y - min_y } else { 0 };
    let offset_x = position.0.round() as i32 - width_px / 2;
    let offset_y = position.1.round() as i32 - height_px / 2;
    for glyph in glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x + gx as i32 + bb.min.x - min_x;
                let py = offset_y + gy as i32 + bb.min.y - min_y;
                set_pixel(canvas, px, py, color, v);
            });
        }
    }
}
