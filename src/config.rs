use bon::Builder;

/// Color representation for gauge elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub const RED: Color = Color::new(0xff, 0x00, 0x00);
    pub const GRAY: Color = Color::new(0x88, 0x88, 0x88);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel linear interpolation towards `other`, `t` in [0, 1].
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }
}

/// Style-time configuration for a speedometer instance.
///
/// Everything here is fixed at construction; runtime state (current speed,
/// needle color) lives in the animation controller.
#[derive(Debug, Clone, Builder)]
pub struct SpeedometerConfig {
    #[builder(default = "Speedometer".to_string())]
    pub title: String,

    /// Side length of the dial square when the host imposes no size.
    /// Historical instances used 400 and 550.
    #[builder(default = 400)]
    pub default_size: u32,
    #[builder(default = 60.0)]
    pub max_framerate: f64,

    // Colors
    #[builder(default = Color::BLACK)]
    pub background_color: Color,
    #[builder(default = Color::new(0xb2, 0xff, 0x59))]
    pub segments_color: Color,
    #[builder(default = Color::GRAY)]
    pub outer_edging_color: Color,

    /// Raw TTF/OTF bytes for the dial numbers. When empty or unparseable,
    /// labels are skipped.
    #[builder(default = Vec::new())]
    pub font_data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_and_midpoint() {
        assert_eq!(Color::BLACK.lerp(Color::RED, 0.0), Color::BLACK);
        assert_eq!(Color::BLACK.lerp(Color::RED, 1.0), Color::RED);
        assert_eq!(
            Color::BLACK.lerp(Color::WHITE, 0.5),
            Color::new(0x80, 0x80, 0x80)
        );
    }

    #[test]
    fn lerp_clamps_fraction() {
        assert_eq!(Color::BLACK.lerp(Color::RED, 2.5), Color::RED);
        assert_eq!(Color::BLACK.lerp(Color::RED, -1.0), Color::BLACK);
    }

    #[test]
    fn builder_defaults_match_stock_styling() {
        let config = SpeedometerConfig::builder().build();
        assert_eq!(config.default_size, 400);
        assert_eq!(config.background_color, Color::BLACK);
        assert_eq!(config.segments_color, Color::new(0xb2, 0xff, 0x59));
        assert_eq!(config.outer_edging_color, Color::GRAY);
    }
}
