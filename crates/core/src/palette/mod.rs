use serde::{Deserialize, Serialize};

const DEFAULT_COLORS: &[&str] = &["#00d2ff", "#3a7bd5", "#9d50bb", "#ff4e50", "#f9d423"];

/// CSS basic keywords plus the common aliases hosts pass through.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("silver", [192, 192, 192]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("white", [255, 255, 255]),
    ("maroon", [128, 0, 0]),
    ("red", [255, 0, 0]),
    ("purple", [128, 0, 128]),
    ("fuchsia", [255, 0, 255]),
    ("magenta", [255, 0, 255]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("olive", [128, 128, 0]),
    ("yellow", [255, 255, 0]),
    ("navy", [0, 0, 128]),
    ("blue", [0, 0, 255]),
    ("teal", [0, 128, 128]),
    ("aqua", [0, 255, 255]),
    ("cyan", [0, 255, 255]),
    ("orange", [255, 165, 0]),
];

/// Straight (non-premultiplied) RGBA color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Copy with alpha multiplied by `alpha`, clamped to `[0, 1]`.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (self.a * alpha).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Scales the RGB channels, e.g. to shade a face.
    pub fn shade(self, factor: f32) -> Self {
        Self {
            r: (self.r * factor).clamp(0.0, 1.0),
            g: (self.g * factor).clamp(0.0, 1.0),
            b: (self.b * factor).clamp(0.0, 1.0),
            a: self.a,
        }
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Parses a CSS-like color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`,
    /// `rgba()`, `hsl()`, `hsla()` or a basic named color.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        if value == "transparent" {
            return Some(Self::rgba(0.0, 0.0, 0.0, 0.0));
        }
        if let Some((_, [r, g, b])) = NAMED_COLORS.iter().find(|(name, _)| *name == value) {
            return Some(Self::from_rgb8(*r, *g, *b));
        }

        let (name, args) = value.split_once('(')?;
        let args: Vec<&str> = args.strip_suffix(')')?.split(',').map(str::trim).collect();
        match (name.trim(), args.as_slice()) {
            ("rgb", [r, g, b]) => Some(Self::rgba(channel(r)?, channel(g)?, channel(b)?, 1.0)),
            ("rgba", [r, g, b, a]) => Some(Self::rgba(
                channel(r)?,
                channel(g)?,
                channel(b)?,
                a.parse::<f32>().ok()?.clamp(0.0, 1.0),
            )),
            ("hsl", [h, s, l]) => Some(hsl(h.parse().ok()?, percent(s)?, percent(l)?, 1.0)),
            ("hsla", [h, s, l, a]) => Some(hsl(
                h.parse().ok()?,
                percent(s)?,
                percent(l)?,
                a.parse::<f32>().ok()?.clamp(0.0, 1.0),
            )),
            _ => None,
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Color::from_rgb8(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
        )),
        6 => Some(Color::from_rgb8(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::from_rgb8(byte(0)?, byte(2)?, byte(4)?).with_alpha(byte(6)? as f32 / 255.0)),
        _ => None,
    }
}

fn channel(value: &str) -> Option<f32> {
    Some((value.parse::<f32>().ok()? / 255.0).clamp(0.0, 1.0))
}

fn percent(value: &str) -> Option<f32> {
    let number = value.strip_suffix('%').unwrap_or(value);
    Some((number.trim().parse::<f32>().ok()? / 100.0).clamp(0.0, 1.0))
}

fn hsl(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Color {
    let hue = hue.rem_euclid(360.0) / 360.0;
    if saturation == 0.0 {
        return Color::rgba(lightness, lightness, lightness, alpha);
    }
    let q = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;
    let component = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    Color::rgba(
        component(hue + 1.0 / 3.0),
        component(hue),
        component(hue - 1.0 / 3.0),
        alpha,
    )
}

/// Resolves style color indices against the host's color list.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    colors: Vec<Color>,
}

impl ColorPalette {
    /// Builds a palette from host color strings. Unparseable entries become
    /// white; an empty list selects the built-in palette.
    pub fn new<S: AsRef<str>>(colors: &[S]) -> Self {
        let mut parsed: Vec<Color> = colors
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                Color::parse(raw).unwrap_or_else(|| {
                    tracing::warn!(color = raw, "unparseable color; using white");
                    Color::WHITE
                })
            })
            .collect();
        if parsed.is_empty() {
            parsed = DEFAULT_COLORS.iter().filter_map(|raw| Color::parse(raw)).collect();
        }
        Self { colors: parsed }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for `index`, cycling through the list.
    pub fn color(&self, index: usize) -> Color {
        self.colors
            .get(index % self.colors.len().max(1))
            .copied()
            .unwrap_or(Color::WHITE)
    }

    pub fn color_alpha(&self, index: usize, alpha: f32) -> Color {
        self.color(index).with_alpha(alpha)
    }

    /// Interpolates across the whole list at `t` in `[0, 1]`.
    pub fn gradient(&self, t: f32) -> Color {
        if self.colors.len() < 2 {
            return self.color(0);
        }
        let scaled = t.clamp(0.0, 1.0) * (self.colors.len() - 1) as f32;
        let index = (scaled.floor() as usize).min(self.colors.len() - 2);
        self.colors[index].lerp(self.colors[index + 1], scaled - index as f32)
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::new::<&str>(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color, b: Color) -> bool {
        (a.r - b.r).abs() < 1e-3 && (a.g - b.g).abs() < 1e-3 && (a.b - b.b).abs() < 1e-3 && (a.a - b.a).abs() < 1e-3
    }

    #[test]
    fn parses_hex_forms() {
        assert!(close(Color::parse("#f00").unwrap(), Color::rgba(1.0, 0.0, 0.0, 1.0)));
        assert!(close(Color::parse("#00ff80").unwrap(), Color::rgba(0.0, 1.0, 128.0 / 255.0, 1.0)));
        assert!(close(Color::parse("#FFFFFF80").unwrap(), Color::rgba(1.0, 1.0, 1.0, 128.0 / 255.0)));
        assert!(Color::parse("#12345").is_none());
    }

    #[test]
    fn parses_raw_function_strings() {
        assert!(close(Color::parse("rgb(255, 0, 0)").unwrap(), Color::rgba(1.0, 0.0, 0.0, 1.0)));
        assert!(close(Color::parse("rgba(0,0,255,0.5)").unwrap(), Color::rgba(0.0, 0.0, 1.0, 0.5)));
        assert!(close(Color::parse("hsl(120, 100%, 50%)").unwrap(), Color::rgba(0.0, 1.0, 0.0, 1.0)));
        assert!(Color::parse("rgb(1, 2)").is_none());
    }

    #[test]
    fn parses_named_colors() {
        assert!(close(Color::parse("red").unwrap(), Color::rgba(1.0, 0.0, 0.0, 1.0)));
        assert!(close(Color::parse(" Navy ").unwrap(), Color::rgba(0.0, 0.0, 128.0 / 255.0, 1.0)));
        assert_eq!(Color::parse("transparent").unwrap().a, 0.0);
        assert!(Color::parse("notacolor").is_none());

        let palette = ColorPalette::new(&["red", "blue"]);
        assert!(close(palette.color(1), Color::rgba(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn palette_cycles_and_blends_alpha() {
        let palette = ColorPalette::new(&["#ff0000", "#0000ff"]);

        assert_eq!(palette.color(2), palette.color(0));
        assert!((palette.color_alpha(1, 0.25).a - 0.25).abs() < 1e-6);
        assert!(close(palette.gradient(0.5), Color::rgba(0.5, 0.0, 0.5, 1.0)));
    }

    #[test]
    fn bad_or_missing_colors_still_resolve() {
        let palette = ColorPalette::new(&["nonsense"]);
        assert_eq!(palette.color(7), Color::WHITE);

        let fallback = ColorPalette::default();
        assert_eq!(fallback.len(), DEFAULT_COLORS.len());
    }
}
