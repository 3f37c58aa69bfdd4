use crate::color::Rgb;
use crate::frame::Orrery;
use crate::overlay::BodyFootprint;
use crate::projector::{Projector, ScreenPoint};
use crate::scene::{Material, Mesh, Scene};
use crate::term::{Cell, CellBuffer, TextStyle};
use glam::Vec3;
use std::f32::consts::TAU;

/// A star lights its cell only when it lands in this corner of the cell,
/// so point-sized stars stay sparse on a coarse grid.
const STAR_SUBCELL_X: f32 = 0.3;
const STAR_SUBCELL_Y: f32 = 0.15;
const TOOLTIP_BG: Rgb = Rgb::hex(0x333333);

pub(crate) struct DepthBuffer {
    w: u16,
    h: u16,
    z: Vec<f32>,
}

impl DepthBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            z: vec![f32::INFINITY; w as usize * h as usize],
        }
    }

    pub(crate) fn resize(&mut self, w: u16, h: u16) {
        if self.w != w || self.h != h {
            *self = Self::new(w, h);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.z.fill(f32::INFINITY);
    }

    fn slot(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.w as i32 || y >= self.h as i32 {
            return None;
        }
        Some(y as usize * self.w as usize + x as usize)
    }

    pub(crate) fn test(&self, x: i32, y: i32, depth: f32) -> bool {
        self.slot(x, y).is_some_and(|i| depth < self.z[i])
    }

    pub(crate) fn test_and_set(&mut self, x: i32, y: i32, depth: f32) -> bool {
        match self.slot(x, y) {
            Some(i) if depth < self.z[i] => {
                self.z[i] = depth;
                true
            }
            _ => false,
        }
    }
}

pub(crate) fn draw_scene(buf: &mut CellBuffer, depth: &mut DepthBuffer, frame: &Orrery) {
    let vp = frame.viewport();
    let (vw, vh) = (vp.width as u16, vp.height as u16);
    depth.resize(vw, vh);
    depth.clear();

    let scene = &frame.scene;
    let bg = scene.background;
    buf.fill_rect(0, 0, vw, vh, bg.to_color());

    let proj = frame.projector();
    draw_stars(buf, depth, scene, &proj);
    draw_orbits(buf, depth, scene, &proj);
    draw_bodies(buf, depth, scene, frame.overlay.footprints(), &proj);
    draw_labels(buf, frame, vw);
    draw_tooltips(buf, frame, vw);
}

fn put(buf: &mut CellBuffer, x: i32, y: i32, ch: char, fg: Rgb, bg: Rgb) {
    if x >= 0 && y >= 0 {
        buf.set(
            x as u16,
            y as u16,
            Cell {
                ch,
                fg: fg.to_color(),
                bg: bg.to_color(),
                bold: false,
            },
        );
    }
}

fn draw_stars<P: Projector>(buf: &mut CellBuffer, depth: &mut DepthBuffer, scene: &Scene, proj: &P) {
    let bg = scene.background;
    let fg = bg.mix(scene.stars.color, scene.stars.opacity);
    for p in &scene.stars.points {
        let sp = proj.project(*p);
        if !sp.in_frustum() {
            continue;
        }
        let (fx, fy) = (sp.x.floor(), sp.y.floor());
        if sp.x - fx > STAR_SUBCELL_X || sp.y - fy > STAR_SUBCELL_Y {
            continue;
        }
        let (x, y) = (fx as i32, fy as i32);
        if depth.test_and_set(x, y, sp.w) {
            let ch = if sp.w < 1500.0 { '·' } else { '.' };
            put(buf, x, y, ch, fg, bg);
        }
    }
}

const NEAR_W: f32 = 0.1;

fn clip_to_front<P: Projector>(a: Vec3, b: Vec3, proj: &P) -> Option<(ScreenPoint, ScreenPoint)> {
    let (pa, pb) = (proj.project(a), proj.project(b));
    match (pa.w >= NEAR_W, pb.w >= NEAR_W) {
        (true, true) => Some((pa, pb)),
        (false, false) => None,
        (a_front, _) => {
            // clip w is affine in world space
            let t = (NEAR_W - pa.w) / (pb.w - pa.w);
            let cut = proj.project(a.lerp(b, t));
            Some(if a_front { (pa, cut) } else { (cut, pb) })
        }
    }
}

fn clip_to_rect(a: ScreenPoint, b: ScreenPoint, w: f32, h: f32) -> Option<(ScreenPoint, ScreenPoint)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    for (p, q) in [(-dx, a.x), (dx, w - a.x), (-dy, a.y), (dy, h - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f32| ScreenPoint {
        x: a.x + dx * t,
        y: a.y + dy * t,
        ndc: a.ndc.lerp(b.ndc, t),
        w: a.w + (b.w - a.w) * t,
    };
    Some((at(t0), at(t1)))
}

fn walk_segment(a: ScreenPoint, b: ScreenPoint, mut plot: impl FnMut(i32, i32, f32)) {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
    let n = steps as usize;
    for i in 0..=n {
        let t = i as f32 / steps;
        plot(
            (a.x + dx * t).floor() as i32,
            (a.y + dy * t).floor() as i32,
            a.w + (b.w - a.w) * t,
        );
    }
}

fn draw_orbits<P: Projector>(buf: &mut CellBuffer, depth: &mut DepthBuffer, scene: &Scene, proj: &P) {
    let bg = scene.background;
    let (vw, vh) = (depth.w as f32, depth.h as f32);
    for ring in scene.orbit_rings.iter().filter(|r| r.visible) {
        let fg = bg.mix(ring.color, ring.opacity);
        for pair in ring.points.windows(2) {
            let visible = clip_to_front(pair[0], pair[1], proj).and_then(|(a, b)| clip_to_rect(a, b, vw, vh));
            let Some((a, b)) = visible else {
                continue;
            };
            walk_segment(a, b, |x, y, w| {
                if depth.test_and_set(x, y, w) {
                    put(buf, x, y, '·', fg, bg);
                }
            });
        }
    }
}

fn draw_bodies<P: Projector>(
    buf: &mut CellBuffer,
    depth: &mut DepthBuffer,
    scene: &Scene,
    footprints: &[BodyFootprint],
    proj: &P,
) {
    let mut order: Vec<&BodyFootprint> = footprints.iter().collect();
    order.sort_by(|a, b| b.disc.center.w.total_cmp(&a.disc.center.w));

    for fp in order {
        let Some(mesh) = scene.body_mesh(fp.body) else {
            continue;
        };
        if !mesh.visible || !fp.disc.center.in_front() {
            continue;
        }
        draw_sphere(buf, depth, scene, mesh, fp, proj);
        if let Some(glow) = mesh.glow {
            let k = glow.radius / mesh.radius.max(1e-3);
            draw_halo(buf, depth, scene.background, fp, k, glow.color, glow.opacity);
        }
        if let Some(ring) = mesh.ring {
            let bg = scene.background;
            let fg = bg.mix(ring.color, ring.opacity);
            let span = fp.disc.rx * ring.outer / mesh.radius.max(1e-3);
            let samples = ((TAU * span * 2.0).ceil() as usize).clamp(48, 2048);
            for ri in 0..4 {
                let r = ring.inner + (ring.outer - ring.inner) * (ri as f32 + 0.5) / 4.0;
                for si in 0..samples {
                    let a = TAU * si as f32 / samples as f32;
                    let q = mesh.position + Vec3::new(r * a.cos(), 0.0, r * a.sin());
                    let sp = proj.project(q);
                    if !sp.in_front() {
                        continue;
                    }
                    let (x, y) = (sp.x.floor() as i32, sp.y.floor() as i32);
                    if depth.test_and_set(x, y, sp.w) {
                        put(buf, x, y, if ri % 2 == 0 { '─' } else { '╌' }, fg, bg);
                    }
                }
            }
        }
    }
}

fn draw_sphere<P: Projector>(
    buf: &mut CellBuffer,
    depth: &mut DepthBuffer,
    scene: &Scene,
    mesh: &Mesh,
    fp: &BodyFootprint,
    proj: &P,
) {
    let (right, up) = proj.basis();
    let back = right.cross(up);
    let d = fp.disc;
    let bg = scene.background;
    let x0 = ((d.center.x - d.rx).floor() as i32).max(0);
    let x1 = ((d.center.x + d.rx).ceil() as i32).min(buf.w as i32);
    let y0 = ((d.center.y - d.ry).floor() as i32).max(0);
    let y1 = ((d.center.y + d.ry).ceil() as i32).min(buf.h as i32);

    let mut covered = false;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let u = (x as f32 + 0.5 - d.center.x) / d.rx.max(1e-3);
            let v = (y as f32 + 0.5 - d.center.y) / d.ry.max(1e-3);
            let d2 = u * u + v * v;
            if d2 > 1.0 {
                continue;
            }
            covered = true;
            let nz = (1.0 - d2).sqrt();
            let n = (right * u - up * v + back * nz).normalize_or_zero();
            if !depth.test_and_set(x, y, d.center.w - nz * mesh.radius) {
                continue;
            }
            let (ch, fg) = shade(scene, mesh, n, nz);
            put(buf, x, y, ch, fg, bg);
        }
    }

    // too small to cover any cell center: still show a dot
    if !covered {
        let (x, y) = (d.center.x.floor() as i32, d.center.y.floor() as i32);
        if depth.test_and_set(x, y, d.center.w) {
            let (_, fg) = shade(scene, mesh, back, 1.0);
            put(buf, x, y, '•', fg, bg);
        }
    }
}

fn shade(scene: &Scene, mesh: &Mesh, n: Vec3, facing: f32) -> (char, Rgb) {
    match mesh.material {
        Material::Emissive => ('█', mesh.color.mix(Rgb::WHITE, 0.25 * facing)),
        Material::Lit => {
            let lights = &scene.lighting;
            let surface = mesh.position + n * mesh.radius;
            let to_key = (lights.key.position - surface).normalize_or_zero();
            let diffuse = n.dot(to_key).max(0.0);
            let ambient = lights.ambient.r as f32 / 255.0;
            let key = diffuse * lights.key.intensity * lights.key.attenuation(surface);
            let glow = diffuse * lights.sun_glow.intensity * lights.sun_glow.attenuation(surface);

            // surface bands turn with the body's spin
            let lon = n.z.atan2(n.x) + mesh.spin;
            let band = 0.9 + 0.1 * (4.0 * lon).sin();

            let lum = (ambient + key).min(1.0);
            let color = mesh
                .color
                .scale((ambient + key).min(1.2) * band)
                .add(mesh.color.modulate(lights.sun_glow.color).scale(glow * 0.15));
            let ch = if lum >= 0.75 {
                '█'
            } else if lum >= 0.5 {
                '▓'
            } else if lum >= 0.3 {
                '▒'
            } else {
                '░'
            };
            (ch, color)
        }
    }
}

fn draw_halo(
    buf: &mut CellBuffer,
    depth: &mut DepthBuffer,
    bg: Rgb,
    fp: &BodyFootprint,
    k: f32,
    color: Rgb,
    opacity: f32,
) {
    let d = fp.disc;
    let (rx, ry) = (d.rx * k, d.ry * k);
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let tint = bg.mix(color, opacity);
    let ys = ((d.center.y - ry).floor() as i32).max(0)..=((d.center.y + ry).ceil() as i32).min(buf.h as i32);
    for y in ys {
        let xs = ((d.center.x - rx).floor() as i32).max(0)..=((d.center.x + rx).ceil() as i32).min(buf.w as i32);
        for x in xs {
            let u = (x as f32 + 0.5 - d.center.x) / rx;
            let v = (y as f32 + 0.5 - d.center.y) / ry;
            let d2 = u * u + v * v;
            if d2 > 1.0 || d2 * k * k <= 1.0 {
                continue;
            }
            if depth.test(x, y, d.center.w) {
                put(buf, x, y, ' ', tint, tint);
            }
        }
    }
}

fn label_fg(frame: &Orrery) -> Rgb {
    if frame.view.dark_mode {
        Rgb::WHITE
    } else {
        Rgb::hex(0x202020)
    }
}

fn draw_labels(buf: &mut CellBuffer, frame: &Orrery, max_x: u16) {
    let style = TextStyle {
        fg: label_fg(frame).to_color(),
        bg: None,
        bold: true,
    };
    for label in frame.overlay.labels() {
        if !label.visible || !label.on_screen {
            continue;
        }
        let rx = frame
            .overlay
            .footprints()
            .iter()
            .find(|f| f.body == label.body)
            .map_or(0.0, |f| f.disc.rx);
        let x = label_column(label.x, rx);
        buf.draw_text_clipped(x, label.y.floor() as i32, label.text, max_x, style);
    }
}

fn draw_tooltips(buf: &mut CellBuffer, frame: &Orrery, max_x: u16) {
    let style = TextStyle {
        fg: Rgb::WHITE.to_color(),
        bg: Some(TOOLTIP_BG.to_color()),
        bold: false,
    };
    // only the hovered body's tooltip can be visible
    let tip = frame.overlay.hovered().and_then(|b| frame.overlay.tooltip(b));
    if let Some(tip) = tip.filter(|t| t.visible && t.on_screen) {
        let ry = frame
            .overlay
            .footprints()
            .iter()
            .find(|f| f.body == tip.body)
            .map_or(0.0, |f| f.disc.ry);
        let text = format!(" {} ", tip.text);
        let (x, y) = tooltip_origin(tip.x, tip.y, ry, text.chars().count());
        buf.draw_text_clipped(x, y, &text, max_x, style);
    }
}

/// One cell right of the disc. Projections near the camera plane saturate
/// at the i32 limits.
fn label_column(x: f32, rx: f32) -> i32 {
    ((x + rx).ceil() as i32).saturating_add(1)
}

fn tooltip_origin(x: f32, y: f32, ry: f32, width: usize) -> (i32, i32) {
    let col = (x.round() as i32).saturating_sub(width as i32 / 2);
    let row = ((y - ry).floor() as i32).saturating_sub(1).max(0);
    (col, row)
}
