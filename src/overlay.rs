use crate::body::{BodyId, BodyRegistry};
use crate::projector::{ProjectedSphere, Projector};
use crate::scene::Scene;

#[derive(Clone, Debug)]
pub(crate) struct Label {
    pub(crate) body: BodyId,
    pub(crate) text: &'static str,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) visible: bool,
    pub(crate) on_screen: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Tooltip {
    pub(crate) body: BodyId,
    pub(crate) text: &'static str,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) visible: bool,
    pub(crate) on_screen: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HoverEvent {
    Enter(BodyId),
    Leave(BodyId),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct BodyFootprint {
    pub(crate) body: BodyId,
    pub(crate) disc: ProjectedSphere,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Overlay {
    labels: Vec<Label>,
    tooltips: Vec<Tooltip>,
    footprints: Vec<BodyFootprint>,
    hovered: Option<BodyId>,
}

impl Overlay {
    pub(crate) fn for_bodies(bodies: &BodyRegistry) -> Self {
        let labels = bodies
            .iter()
            .map(|(id, b)| Label {
                body: id,
                text: b.name,
                x: 0.0,
                y: 0.0,
                visible: true,
                on_screen: false,
            })
            .collect();
        let tooltips = bodies
            .planets()
            .map(|(id, b)| Tooltip {
                body: id,
                text: b.name,
                x: 0.0,
                y: 0.0,
                visible: false,
                on_screen: false,
            })
            .collect();
        Self {
            labels,
            tooltips,
            footprints: Vec::new(),
            hovered: None,
        }
    }

    pub(crate) fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[cfg(test)]
    pub(crate) fn tooltips(&self) -> &[Tooltip] {
        &self.tooltips
    }

    pub(crate) fn footprints(&self) -> &[BodyFootprint] {
        &self.footprints
    }

    pub(crate) fn hovered(&self) -> Option<BodyId> {
        self.hovered
    }

    pub(crate) fn tooltip(&self, body: BodyId) -> Option<&Tooltip> {
        self.tooltips.iter().find(|t| t.body == body)
    }

    pub(crate) fn update<P: Projector>(&mut self, scene: &Scene, projector: &P, show_labels: bool) {
        self.footprints.clear();
        for (id, body) in scene.bodies.iter() {
            let radius = scene.mesh(body.mesh).map_or(0.0, |m| m.radius);
            let disc = projector.project_sphere(body.world_position(), radius);
            self.footprints.push(BodyFootprint { body: id, disc });
        }

        for label in &mut self.labels {
            if let Some(fp) = self.footprints.iter().find(|f| f.body == label.body) {
                let c = fp.disc.center;
                label.x = c.x;
                label.y = c.y;
                label.on_screen = c.in_front();
            }
        }
        self.set_labels_visible(show_labels);
        for tip in &mut self.tooltips {
            if let Some(fp) = self.footprints.iter().find(|f| f.body == tip.body) {
                let c = fp.disc.center;
                tip.x = c.x;
                tip.y = c.y;
                tip.on_screen = c.in_front();
            }
        }
    }

    pub(crate) fn set_labels_visible(&mut self, visible: bool) {
        for label in &mut self.labels {
            label.visible = visible;
        }
    }

    pub(crate) fn pick(&self, x: f32, y: f32) -> Option<BodyId> {
        self.footprints
            .iter()
            .filter(|f| f.disc.contains(x, y))
            .min_by(|a, b| a.disc.center.w.total_cmp(&b.disc.center.w))
            .map(|f| f.body)
    }

    pub(crate) fn pointer_moved(&mut self, at: Option<(f32, f32)>) -> Vec<HoverEvent> {
        let next = at.and_then(|(x, y)| self.pick(x, y));
        if next == self.hovered {
            return Vec::new();
        }
        let mut events = Vec::with_capacity(2);
        if let Some(prev) = self.hovered.take() {
            self.set_tooltip(prev, false);
            events.push(HoverEvent::Leave(prev));
        }
        if let Some(body) = next {
            self.set_tooltip(body, true);
            events.push(HoverEvent::Enter(body));
        }
        self.hovered = next;
        events
    }

    fn set_tooltip(&mut self, body: BodyId, visible: bool) {
        if let Some(tip) = self.tooltips.iter_mut().find(|t| t.body == body) {
            tip.visible = visible;
        }
    }
}
