use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const BLACK: Rgb = Rgb::hex(0x000000);
    pub(crate) const WHITE: Rgb = Rgb::hex(0xffffff);

    pub(crate) const fn hex(v: u32) -> Rgb {
        Rgb {
            r: ((v >> 16) & 0xff) as u8,
            g: ((v >> 8) & 0xff) as u8,
            b: (v & 0xff) as u8,
        }
    }

    pub(crate) fn to_color(self) -> Color {
        Color::Rgb { r: self.r, g: self.g, b: self.b }
    }

    pub(crate) fn mix(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: lerp_u8(self.r, other.r, t),
            g: lerp_u8(self.g, other.g, t),
            b: lerp_u8(self.b, other.b, t),
        }
    }

    pub(crate) fn scale(self, k: f32) -> Rgb {
        let k = k.max(0.0);
        Rgb {
            r: ((self.r as f32) * k).clamp(0.0, 255.0) as u8,
            g: ((self.g as f32) * k).clamp(0.0, 255.0) as u8,
            b: ((self.b as f32) * k).clamp(0.0, 255.0) as u8,
        }
    }

    pub(crate) fn add(self, o: Rgb) -> Rgb {
        Rgb {
            r: self.r.saturating_add(o.r),
            g: self.g.saturating_add(o.g),
            b: self.b.saturating_add(o.b),
        }
    }

    pub(crate) fn modulate(self, light: Rgb) -> Rgb {
        Rgb {
            r: ((self.r as u16 * light.r as u16) / 255) as u8,
            g: ((self.g as u16 * light.g as u16) / 255) as u8,
            b: ((self.b as u16 * light.b as u16) / 255) as u8,
        }
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let aa = a as f32;
    let bb = b as f32;
    (aa + (bb - aa) * t).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_unpacks_channels() {
        let c = Rgb::hex(0x3498db);
        assert_eq!((c.r, c.g, c.b), (0x34, 0x98, 0xdb));
    }

    #[test]
    fn test_mix_endpoints_and_midpoint() {
        let a = Rgb::BLACK;
        let b = Rgb::hex(0x888888);
        assert_eq!(a.mix(b, 0.0), a);
        assert_eq!(a.mix(b, 1.0), b);
        assert_eq!(a.mix(b, 0.5), Rgb::hex(0x444444));
        assert_eq!(a.mix(b, 7.0), b);
    }

    #[test]
    fn test_scale_saturates() {
        assert_eq!(Rgb::hex(0x808080).scale(4.0), Rgb::WHITE);
        assert_eq!(Rgb::WHITE.scale(-1.0), Rgb::BLACK);
    }

    #[test]
    fn test_modulate_by_white_is_identity() {
        let c = Rgb::hex(0xe67e22);
        assert_eq!(c.modulate(Rgb::WHITE), c);
        assert_eq!(c.modulate(Rgb::BLACK), Rgb::BLACK);
    }
}
