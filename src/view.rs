use std::time::Duration;

use egui::{
    epaint::QuadraticBezierShape, Align2, Color32, FontId, Painter, Pos2, Rect, Response, Sense,
    Shape, Stroke, StrokeKind, Ui, Vec2, Widget,
};
use instant::Instant;

use crate::{
    elements::NODE_SIZE,
    filter::VisibleSet,
    projection::{content_preview, format_duration, project_status, ProjectedNode},
    settings::{SettingsInteraction, SettingsStyle},
    viewport::ViewportState,
    ExecutionEdge, ExecutionGraph, ExecutionNode, NodeType, Status, VisualizerSession,
};

const CARD_RADIUS: f32 = 8.;
const CARD_PADDING: f32 = 12.;
const ARROW_ANGLE: f32 = std::f32::consts::TAU / 30.;
const ARROW_SIZE: f32 = 8.;
const DASH: f32 = 8.;
const GAP: f32 = 4.;
/// Below this on-screen font size card text is skipped.
const MIN_TEXT_SIZE: f32 = 4.;

const TEXT_COLOR: Color32 = Color32::from_rgb(17, 24, 39);
const TEXT_MUTED: Color32 = Color32::from_rgb(75, 85, 99);

/// Background and border color of a node card.
pub fn node_colors(node_type: NodeType) -> (Color32, Color32) {
    match node_type {
        NodeType::Prompt => (
            Color32::from_rgb(219, 234, 254),
            Color32::from_rgb(59, 130, 246),
        ),
        NodeType::Model => (
            Color32::from_rgb(220, 252, 231),
            Color32::from_rgb(34, 197, 94),
        ),
        NodeType::Tool => (
            Color32::from_rgb(255, 237, 213),
            Color32::from_rgb(249, 115, 22),
        ),
        NodeType::Memory => (
            Color32::from_rgb(243, 232, 255),
            Color32::from_rgb(168, 85, 247),
        ),
        NodeType::Output => (
            Color32::from_rgb(243, 244, 246),
            Color32::from_rgb(107, 114, 128),
        ),
        NodeType::Error => (
            Color32::from_rgb(254, 226, 226),
            Color32::from_rgb(239, 68, 68),
        ),
    }
}

pub fn status_color(status: Status) -> Color32 {
    match status {
        Status::Completed => Color32::from_rgb(22, 163, 74),
        Status::Processing => Color32::from_rgb(37, 99, 235),
        Status::Error => Color32::from_rgb(220, 38, 38),
        Status::Pending => Color32::from_rgb(156, 163, 175),
    }
}

/// Id of the topmost visible node under `local`, a widget-local position.
pub fn node_at(visible: &VisibleSet<'_>, viewport: &ViewportState, local: Pos2) -> Option<String> {
    let canvas = viewport.screen_to_canvas_pos(local);
    visible
        .nodes
        .iter()
        .rev()
        .find(|p| Rect::from_min_size(p.node.location(), NODE_SIZE).contains(canvas))
        .map(|p| p.id().to_string())
}

/// Widget drawing a [`VisualizerSession`] and feeding pointer input back into it.
///
/// Every frame the widget polls the step clock, so hosts only need to add it
/// to a `Ui`. Repaints are scheduled at the clock's next deadline.
pub struct ExecutionView<'a> {
    session: &'a mut VisualizerSession,
    settings_interaction: SettingsInteraction,
    settings_style: SettingsStyle,
}

impl Widget for ExecutionView<'_> {
    fn ui(mut self, ui: &mut Ui) -> Response {
        let now = Instant::now();
        self.session.tick(now);

        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let origin = response.rect.min.to_vec2();

        if self.session.take_fit_request() {
            self.session.fit_to_view(response.rect.size());
        }
        self.handle_navigation(ui, &response, origin);
        self.handle_clicks(&response, origin);

        let hovered = response
            .hover_pos()
            .and_then(|pos| self.node_under(pos - origin));

        let time = ui.input(|i| i.time) as f32;
        let animating = self.draw(&painter, origin, time);

        let show_tooltip =
            self.settings_interaction.node_tooltip && !self.session.viewport().is_dragging();
        let response = match hovered {
            Some(id) if show_tooltip => {
                let graph = self.session.graph();
                let step = self.session.current_step();
                response.on_hover_ui_at_pointer(|ui| node_tooltip(ui, graph, step, &id))
            }
            _ => response,
        };

        if animating {
            ui.ctx().request_repaint();
        } else if let Some(deadline) = self.session.next_deadline() {
            let wait = if deadline > now {
                deadline - now
            } else {
                Duration::ZERO
            };
            ui.ctx().request_repaint_after(wait);
        }

        response
    }
}

impl<'a> ExecutionView<'a> {
    pub fn new(session: &'a mut VisualizerSession) -> Self {
        Self {
            session,
            settings_interaction: SettingsInteraction::default(),
            settings_style: SettingsStyle::default(),
        }
    }

    pub fn with_interactions(mut self, settings: &SettingsInteraction) -> Self {
        self.settings_interaction = settings.clone();
        self
    }

    pub fn with_styles(mut self, settings: &SettingsStyle) -> Self {
        self.settings_style = settings.clone();
        self
    }

    fn node_under(&self, local: Pos2) -> Option<String> {
        let frame = self.session.frame();
        node_at(&frame.visible, &self.session.viewport().state(), local)
    }

    fn handle_clicks(&mut self, response: &Response, origin: Vec2) {
        if !self.settings_interaction.node_select || !response.clicked() {
            return;
        }
        let Some(pos) = response.interact_pointer_pos() else {
            return;
        };
        if let Some(id) = self.node_under(pos - origin) {
            self.session.select(&id);
        }
    }

    fn handle_navigation(&mut self, ui: &Ui, response: &Response, origin: Vec2) {
        if !self.session.viewport().settings().zoom_and_pan {
            return;
        }

        if response.drag_started() {
            let start = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(pos) = start {
                let local = pos - origin;
                let over_node = self.node_under(local).is_some();
                self.session.begin_drag(local, over_node);
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.session.drag_to(pos - origin);
            }
        }
        if response.drag_stopped() {
            self.session.end_drag();
        }

        if response.hovered() {
            let delta_y = ui.input(|i| i.raw_scroll_delta.y);
            // egui reports scrolling down as negative
            self.session.apply_wheel(-delta_y);
        }
    }

    /// Draws edges under nodes. Returns whether any animated edge was drawn.
    fn draw(&self, p: &Painter, origin: Vec2, time: f32) -> bool {
        let frame = self.session.frame();
        let viewport = self.session.viewport().state();

        let mut animating = false;
        for e in &frame.visible.edges {
            animating |= e.animated;
            self.draw_edge(p, &frame.visible, e, &viewport, origin, time);
        }
        for n in &frame.visible.nodes {
            self.draw_node(p, n, &viewport, origin);
        }

        animating
    }

    fn draw_edge(
        &self,
        p: &Painter,
        visible: &VisibleSet<'_>,
        e: &ExecutionEdge,
        viewport: &ViewportState,
        origin: Vec2,
        time: f32,
    ) {
        let (Some(from), Some(to)) = (visible.node(&e.from), visible.node(&e.to)) else {
            return;
        };

        let start = viewport.canvas_to_screen_pos(from.node.output_anchor()) + origin;
        let tip = viewport.canvas_to_screen_pos(to.node.input_anchor()) + origin;
        let control = Pos2::new((start.x + tip.x) / 2., start.y);

        let width = viewport.canvas_to_screen_size(self.settings_style.edge_width);
        let color = if e.animated {
            status_color(Status::Processing)
        } else {
            self.settings_style.edge_color
        };
        let stroke = Stroke::new(width, color);

        let curve = QuadraticBezierShape::from_points_stroke(
            [start, control, tip],
            false,
            Color32::TRANSPARENT,
            stroke,
        );
        if e.animated {
            let dash = viewport.canvas_to_screen_size(DASH);
            let gap = viewport.canvas_to_screen_size(GAP);
            let offset = (time * 40. * viewport.zoom) % (dash + gap);
            p.extend(Shape::dashed_line_with_offset(
                &curve.flatten(None),
                stroke,
                &[dash],
                &[gap],
                dash + gap - offset,
            ));
        } else {
            p.add(curve);
        }

        let dir = (control - tip).normalized();
        let size = viewport.canvas_to_screen_size(ARROW_SIZE);
        p.line_segment([tip, tip + rotate_vector(dir, ARROW_ANGLE) * size], stroke);
        p.line_segment([tip, tip + rotate_vector(dir, -ARROW_ANGLE) * size], stroke);
    }

    fn draw_node(&self, p: &Painter, n: &ProjectedNode<'_>, viewport: &ViewportState, origin: Vec2) {
        let node = n.node;
        let zoom = viewport.zoom;
        let rect = Rect::from_min_size(
            viewport.canvas_to_screen_pos(node.location()) + origin,
            NODE_SIZE * zoom,
        );
        let radius = CARD_RADIUS * zoom;
        let (fill, border) = node_colors(node.node_type());

        p.rect_filled(rect, radius, fill);
        p.rect_stroke(rect, radius, Stroke::new(2. * zoom, border), StrokeKind::Inside);

        if n.status != Status::Pending {
            p.rect_stroke(
                rect.expand(2. * zoom),
                radius,
                Stroke::new(2. * zoom, status_color(n.status)),
                StrokeKind::Outside,
            );
        }
        if self.session.selection().is_selected(node.id()) {
            p.rect_stroke(
                rect.expand(6. * zoom),
                radius,
                Stroke::new(2. * zoom, TEXT_COLOR),
                StrokeKind::Outside,
            );
        }

        let title_size = 14. * zoom;
        if title_size < MIN_TEXT_SIZE {
            return;
        }
        let body_size = 11. * zoom;
        let pad = CARD_PADDING * zoom;
        let p = p.with_clip_rect(rect);

        p.text(
            rect.left_top() + Vec2::splat(pad),
            Align2::LEFT_TOP,
            node.title(),
            FontId::proportional(title_size),
            TEXT_COLOR,
        );
        p.text(
            rect.right_top() + Vec2::new(-pad, pad),
            Align2::RIGHT_TOP,
            format!("{}ms", node.metrics().latency_ms),
            FontId::monospace(body_size),
            TEXT_MUTED,
        );

        let preview = content_preview(node.content(), self.settings_style.content_preview_chars)
            .replace('\n', " ");
        let galley = p.layout(
            preview,
            FontId::proportional(body_size),
            TEXT_MUTED,
            rect.width() - 2. * pad,
        );
        p.galley(
            rect.left_top() + Vec2::new(pad, pad + title_size * 1.4),
            galley,
            TEXT_MUTED,
        );

        let metrics = node.metrics();
        p.text(
            rect.left_bottom() + Vec2::new(pad, -pad / 2.),
            Align2::LEFT_BOTTOM,
            format!("Tokens: {}", metrics.token_count),
            FontId::proportional(body_size),
            TEXT_MUTED,
        );
        p.text(
            rect.right_bottom() + Vec2::new(-pad, -pad / 2.),
            Align2::RIGHT_BOTTOM,
            format!("Confidence: {:.0}%", metrics.confidence_percent()),
            FontId::proportional(body_size),
            TEXT_MUTED,
        );
    }
}

fn node_tooltip(ui: &mut Ui, graph: &ExecutionGraph, step: usize, id: &str) {
    let Some(node) = graph.node(id) else {
        return;
    };
    ui.strong(node.title());
    for row in tooltip_rows(node, step) {
        ui.label(row);
    }
}

fn tooltip_rows(node: &ExecutionNode, step: usize) -> [String; 5] {
    let metrics = node.metrics();
    [
        format!("Status: {}", project_status(node, step)),
        format!("Latency: {}ms", metrics.latency_ms),
        format!("Tokens: {}", metrics.token_count),
        format!("Confidence: {:.1}%", metrics.confidence_percent()),
        format!("Time: T+{}", format_duration(node.started_at_offset_ms())),
    ]
}

fn rotate_vector(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(cos * v.x - sin * v.y, sin * v.x + cos * v.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::filter_visible, mock::sentiment_analysis_graph, projection::project_nodes,
    };

    #[test]
    fn test_node_at_respects_viewport() {
        let g = sentiment_analysis_graph().unwrap();
        let nodes = project_nodes(&g, 0);
        let visible = filter_visible(&nodes, &[], &crate::FilterState::default());

        let identity = ViewportState::default();
        assert_eq!(
            node_at(&visible, &identity, Pos2::new(110., 210.)).as_deref(),
            Some("start")
        );
        assert_eq!(node_at(&visible, &identity, Pos2::new(50., 50.)), None);

        let zoomed = ViewportState {
            pan: Vec2::new(-100., 0.),
            zoom: 0.5,
        };
        // llm-1 sits at (350, 200), i.e. (75, 100) on screen
        assert_eq!(
            node_at(&visible, &zoomed, Pos2::new(80., 110.)).as_deref(),
            Some("llm-1")
        );
    }

    #[test]
    fn test_hidden_nodes_are_not_hit() {
        let g = sentiment_analysis_graph().unwrap();
        let nodes = project_nodes(&g, 0);
        let mut filter = crate::FilterState::default();
        filter.toggle(NodeType::Prompt, false);
        let visible = filter_visible(&nodes, &[], &filter);

        assert_eq!(
            node_at(&visible, &ViewportState::default(), Pos2::new(110., 210.)),
            None
        );
    }

    #[test]
    fn test_palette_is_distinct() {
        let borders: std::collections::HashSet<_> =
            NodeType::ALL.iter().map(|t| node_colors(*t).1).collect();
        assert_eq!(borders.len(), NodeType::ALL.len());
        assert_ne!(status_color(Status::Completed), status_color(Status::Pending));
    }

    #[test]
    fn test_widget_runs_headless() {
        let ctx = egui::Context::default();
        let mut session = VisualizerSession::new(sentiment_analysis_graph().unwrap());
        session.seek(2);

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.add(
                    ExecutionView::new(&mut session)
                        .with_interactions(&SettingsInteraction::default().with_node_tooltip(false))
                        .with_styles(&SettingsStyle::default().with_content_preview_chars(20)),
                );
            });
        });

        assert_eq!(session.current_step(), 2);
    }

    #[test]
    fn test_widget_fits_graph_on_request() {
        let ctx = egui::Context::default();
        let mut session = VisualizerSession::new(sentiment_analysis_graph().unwrap());
        session.request_fit();

        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(800., 600.))),
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.add(ExecutionView::new(&mut session));
            });
        });

        assert!(!session.take_fit_request());
        assert!(session.viewport().zoom() < 1.);
    }

    #[test]
    fn test_tooltip_shows_start_time() {
        let g = sentiment_analysis_graph().unwrap();
        let llm = g.node("llm-1").unwrap();
        let rows = tooltip_rows(llm, 1);
        assert_eq!(rows[0], "Status: processing");
        assert_eq!(rows[4], "Time: T+2.0s");
        assert_eq!(tooltip_rows(g.node("start").unwrap(), 1)[4], "Time: T+0ms");
    }
}
