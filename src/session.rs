use egui::{Pos2, Vec2};
use instant::Instant;
use log::info;

#[cfg(feature = "events")]
use crate::events::{
    Event, EventSink, PayloadNodeDeselect, PayloadNodeSelect, PayloadPan, PayloadSpeed,
    PayloadStep, PayloadZoom,
};
use crate::{
    error::{ExportError, PlaybackError},
    filter::{filter_visible, FilterState, VisibleSet},
    playback::{ExecutionMode, PlaybackState, Seek, StepClock},
    projection::{project_edges, project_nodes, project_timeline, ProjectedNode, TimelineEntry},
    selection::{NodeDetail, Selection},
    settings::{SettingsNavigation, SettingsPlayback},
    snapshot::{Snapshot, SnapshotExporter},
    viewport::{Viewport, ViewportState},
    ExecutionEdge, ExecutionGraph, ExecutionNode, NodeType,
};

/// Everything a renderer needs for one update.
#[derive(Clone, Debug)]
pub struct Frame<'a> {
    pub playback: PlaybackState,
    /// All nodes with their status, in execution order.
    pub nodes: Vec<ProjectedNode<'a>>,
    /// All edges present at the current step.
    pub edges: Vec<ExecutionEdge>,
    /// Nodes and edges left after filtering.
    pub visible: VisibleSet<'a>,
}

/// Figures shown in the status bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub is_playing: bool,
    pub completed_nodes: usize,
    pub total_nodes: usize,
    pub zoom_percent: u32,
    pub speed: f32,
    pub visible_types: usize,
    pub total_types: usize,
    pub latency_threshold_ms: u32,
}

/// One playback session over a fixed execution graph.
///
/// Owns the step clock, filter, viewport and selection and keeps them
/// consistent: every change that can hide nodes re-checks the selection.
pub struct VisualizerSession {
    graph: ExecutionGraph,
    clock: StepClock,
    filter: FilterState,
    viewport: Viewport,
    selection: Selection,
    mode: ExecutionMode,
    speed_options: Vec<f32>,
    /// Set by [`VisualizerSession::request_fit`], consumed by the widget
    /// once it knows its size.
    fit_requested: bool,

    #[cfg(feature = "events")]
    sink: Option<Box<dyn EventSink>>,
}

impl VisualizerSession {
    pub fn new(graph: ExecutionGraph) -> Self {
        let settings = SettingsPlayback::default();
        Self {
            clock: StepClock::new(graph.total_steps(), &settings),
            speed_options: settings.speed_options,
            graph,
            filter: FilterState::default(),
            viewport: Viewport::default(),
            selection: Selection::default(),
            mode: ExecutionMode::default(),
            fit_requested: false,

            #[cfg(feature = "events")]
            sink: None,
        }
    }

    /// Replaces the step clock. Playback returns to step 0, paused.
    pub fn with_settings_playback(mut self, settings: SettingsPlayback) -> Self {
        self.clock = StepClock::new(self.graph.total_steps(), &settings);
        self.speed_options = settings.speed_options;
        self
    }

    pub fn with_settings_navigation(mut self, settings: SettingsNavigation) -> Self {
        self.viewport = Viewport::new(settings);
        self
    }

    #[cfg(feature = "events")]
    /// Supply a sink that will receive playback, navigation and selection events.
    pub fn with_event_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn graph(&self) -> &ExecutionGraph {
        &self.graph
    }

    pub fn playback(&self) -> PlaybackState {
        self.clock.state()
    }

    pub fn current_step(&self) -> usize {
        self.clock.current_step()
    }

    /// Node executed at the current step.
    pub fn current_node(&self) -> Option<&ExecutionNode> {
        self.graph.node_by_ordinal(self.clock.current_step())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.clock.next_deadline()
    }

    pub fn speed_options(&self) -> &[f32] {
        &self.speed_options
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ExecutionMode) {
        if self.mode != mode {
            info!("execution mode changed {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    // Playback

    /// Advances playback if the step timer is due. Returns the new step.
    ///
    /// A clock that disarms itself, with or without advancing, is reported
    /// as paused.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        let was_playing = self.clock.is_playing();
        let step = self.clock.tick(now);

        if step.is_some() {
            self.step_changed();
        }
        #[cfg(feature = "events")]
        if was_playing && !self.clock.is_playing() {
            self.publish(Event::PlaybackPaused(PayloadStep {
                step: self.clock.current_step(),
            }));
        }
        #[cfg(not(feature = "events"))]
        let _ = was_playing;

        step
    }

    /// Starts playing; at the last step this rewinds to step 0 first.
    pub fn play(&mut self, now: Instant) {
        let before = self.clock.current_step();
        self.clock.play(now);
        if self.clock.current_step() != before {
            self.step_changed();
        }
        #[cfg(feature = "events")]
        self.publish(Event::PlaybackStarted(PayloadStep {
            step: self.clock.current_step(),
        }));
    }

    pub fn pause(&mut self) {
        let was_playing = self.clock.is_playing();
        self.clock.pause();
        #[cfg(feature = "events")]
        if was_playing {
            self.publish(Event::PlaybackPaused(PayloadStep {
                step: self.clock.current_step(),
            }));
        }
        #[cfg(not(feature = "events"))]
        let _ = was_playing;
    }

    pub fn toggle_playback(&mut self, now: Instant) {
        if self.clock.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
    }

    pub fn stop(&mut self) {
        self.clock.stop();
        self.step_changed();
        #[cfg(feature = "events")]
        self.publish(Event::PlaybackStopped);
    }

    pub fn restart(&mut self, now: Instant) {
        self.clock.restart(now);
        self.step_changed();
        #[cfg(feature = "events")]
        self.publish(Event::PlaybackStarted(PayloadStep { step: 0 }));
    }

    pub fn seek(&mut self, step: usize) -> Seek {
        let seek = self.clock.seek(step);
        self.step_changed();
        seek
    }

    pub fn seek_end(&mut self) -> Seek {
        let seek = self.clock.seek_end();
        self.step_changed();
        seek
    }

    pub fn step_forward(&mut self) -> Seek {
        let seek = self.clock.step_forward();
        self.step_changed();
        seek
    }

    pub fn step_back(&mut self) -> Seek {
        let seek = self.clock.step_back();
        self.step_changed();
        seek
    }

    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidSpeed`] for speeds outside
    /// [`SPEED_MIN`](crate::SPEED_MIN)..=[`SPEED_MAX`](crate::SPEED_MAX).
    pub fn set_speed(&mut self, speed: f32, now: Instant) -> Result<(), PlaybackError> {
        self.clock.set_speed(speed, now)?;
        #[cfg(feature = "events")]
        self.publish(Event::SpeedChanged(PayloadSpeed { speed }));
        Ok(())
    }

    #[cfg_attr(not(feature = "events"), allow(clippy::unused_self))]
    fn step_changed(&self) {
        #[cfg(feature = "events")]
        self.publish(Event::StepChanged(PayloadStep {
            step: self.clock.current_step(),
        }));
    }

    // Filtering

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.reconcile_selection();
    }

    pub fn toggle_node_type(&mut self, node_type: NodeType, enabled: bool) {
        self.filter.toggle(node_type, enabled);
        self.reconcile_selection();
    }

    pub fn set_latency_threshold(&mut self, ms: u32) {
        self.filter.latency_threshold_ms = ms;
        self.reconcile_selection();
    }

    fn reconcile_selection(&mut self) {
        let nodes = project_nodes(&self.graph, self.clock.current_step());
        let visible = filter_visible(&nodes, &[], &self.filter);
        let dropped = self.selection.reconcile(&visible);

        #[cfg(feature = "events")]
        if let Some(id) = dropped {
            self.publish(Event::SelectionCleared(PayloadNodeDeselect { id }));
        }
        #[cfg(not(feature = "events"))]
        let _ = dropped;
    }

    // Selection

    /// Selects a visible node; selecting a hidden node clears the selection.
    pub fn select(&mut self, id: &str) -> bool {
        let nodes = project_nodes(&self.graph, self.clock.current_step());
        let visible = filter_visible(&nodes, &[], &self.filter);
        let previous = self.selection.selected().map(str::to_string);
        let selected = self.selection.select(id, &visible);

        #[cfg(feature = "events")]
        {
            if let Some(prev) = previous.filter(|prev| !(selected && prev == id)) {
                self.publish(Event::NodeDeselect(PayloadNodeDeselect { id: prev }));
            }
            if selected {
                self.publish(Event::NodeSelect(PayloadNodeSelect { id: id.to_string() }));
            }
        }
        #[cfg(not(feature = "events"))]
        let _ = previous;

        selected
    }

    /// Clears the selection, as the details panel close button does.
    pub fn close_details(&mut self) {
        let closed = self.selection.close();
        #[cfg(feature = "events")]
        if let Some(id) = closed {
            self.publish(Event::NodeDeselect(PayloadNodeDeselect { id }));
        }
        #[cfg(not(feature = "events"))]
        let _ = closed;
    }

    pub fn detail(&self) -> Option<NodeDetail> {
        self.selection.detail(&self.graph, self.clock.current_step())
    }

    // Navigation

    pub fn apply_wheel(&mut self, delta_y: f32) {
        let before = self.viewport.zoom();
        let after = self.viewport.apply_wheel(delta_y);
        self.zoom_changed(before, after);
    }

    pub fn zoom_in(&mut self) {
        let before = self.viewport.zoom();
        let after = self.viewport.zoom_in();
        self.zoom_changed(before, after);
    }

    pub fn zoom_out(&mut self) {
        let before = self.viewport.zoom();
        let after = self.viewport.zoom_out();
        self.zoom_changed(before, after);
    }

    pub fn reset_zoom(&mut self) {
        let before = self.viewport.zoom();
        self.viewport.reset_zoom();
        self.zoom_changed(before, self.viewport.zoom());
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset_view();
    }

    /// Asks the widget to fit the graph on its next frame.
    pub fn request_fit(&mut self) {
        self.fit_requested = true;
    }

    /// Returns and clears a pending [`VisualizerSession::request_fit`].
    pub fn take_fit_request(&mut self) -> bool {
        std::mem::take(&mut self.fit_requested)
    }

    /// Zooms and pans so every node card fits a widget of `size`.
    pub fn fit_to_view(&mut self, size: Vec2) {
        let before = self.viewport.zoom();
        let after = self.viewport.fit_to(self.graph.bounds(), size);
        self.zoom_changed(before, after);
    }

    pub fn begin_drag(&mut self, pointer: Pos2, over_node: bool) -> bool {
        self.viewport.begin_drag(pointer, over_node)
    }

    pub fn drag_to(&mut self, pointer: Pos2) -> Option<Vec2> {
        let diff = self.viewport.drag_to(pointer)?;
        #[cfg(feature = "events")]
        {
            let pan = self.viewport.pan();
            self.publish(Event::Pan(PayloadPan {
                diff: [diff.x, diff.y],
                new_pan: [pan.x, pan.y],
            }));
        }
        Some(diff)
    }

    pub fn end_drag(&mut self) {
        self.viewport.end_drag();
    }

    #[cfg_attr(not(feature = "events"), allow(clippy::unused_self))]
    fn zoom_changed(&self, before: f32, after: f32) {
        #[cfg(feature = "events")]
        if before != after {
            self.publish(Event::Zoom(PayloadZoom { new_zoom: after }));
        }
        #[cfg(not(feature = "events"))]
        let _ = (before, after);
    }

    // Projections

    /// Projects the graph at the current step through the filter.
    pub fn frame(&self) -> Frame<'_> {
        let step = self.clock.current_step();
        let nodes = project_nodes(&self.graph, step);
        let edges = project_edges(&self.graph, step);
        let visible = filter_visible(&nodes, &edges, &self.filter);

        Frame {
            playback: self.clock.state(),
            nodes,
            edges,
            visible,
        }
    }

    pub fn timeline(&self) -> Vec<TimelineEntry> {
        project_timeline(&self.graph, self.clock.current_step())
    }

    pub fn summary(&self) -> Summary {
        let playback = self.clock.state();
        Summary {
            is_playing: playback.is_playing,
            completed_nodes: (playback.current_step + 1).min(self.graph.len()),
            total_nodes: self.graph.len(),
            zoom_percent: self.viewport.zoom_percent(),
            speed: playback.speed,
            visible_types: self.filter.visible_type_count(),
            total_types: NodeType::ALL.len(),
            latency_threshold_ms: self.filter.latency_threshold_ms,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current_step: self.clock.current_step(),
            selected_node_id: self.selection.selected().map(str::to_string),
            filter: self.filter.clone(),
            viewport: self.viewport_state(),
            mode: self.mode,
        }
    }

    /// # Errors
    ///
    /// Returns [`ExportError`] when `exporter` fails to encode the snapshot.
    pub fn export(&self, exporter: &dyn SnapshotExporter) -> Result<Vec<u8>, ExportError> {
        let snapshot = self.snapshot();
        info!(
            "exporting snapshot at step {} as {:?}",
            snapshot.current_step,
            exporter.format()
        );
        exporter.export(&snapshot)
    }

    /// Ends the session, releasing the step timer.
    pub fn teardown(self) -> PlaybackState {
        info!("visualizer session torn down");
        self.clock.teardown()
    }

    fn viewport_state(&self) -> ViewportState {
        self.viewport.state()
    }

    #[cfg(feature = "events")]
    fn publish(&self, event: Event) {
        if let Some(sink) = &self.sink {
            sink.send(event);
        }
    }
}
