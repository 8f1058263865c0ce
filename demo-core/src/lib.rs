use std::time::{Duration, SystemTime, UNIX_EPOCH};

use blackbox_explorer::{
    exporter_for, format_duration,
    keybindings::{apply as apply_command, dispatch as dispatch_keybindings},
    mock::{self, SystemMetrics, SESSIONS},
    node_colors, progress, status_color, ExecutionMode, ExecutionView, ExportFormat, GraphError,
    LogLevel, NodeDetail, NodeType, SettingsInteraction, SettingsStyle, Status, VisualizerSession,
};
use eframe::{App, CreationContext};
use egui::{
    CentralPanel, ComboBox, Context, ProgressBar, RichText, ScrollArea, SidePanel, Slider,
    TopBottomPanel, Ui,
};
use instant::Instant;
use log::{info, warn};

mod status;
mod ui_consts;

use status::{Notice, NoticeBoard};
use ui_consts::{HEADING_TEXT_SIZE, SECTION_SPACING, SIDE_PANEL_WIDTH, TIMELINE_BAR_HEIGHT};

#[cfg(feature = "events")]
use blackbox_explorer::events::Event;
#[cfg(feature = "events")]
use crossbeam::channel::{unbounded, Receiver};

#[cfg(feature = "events")]
pub const EVENTS_LIMIT: usize = 100;

/// Upper end of the latency threshold slider.
const LATENCY_SLIDER_MAX_MS: u32 = 2000;
/// Latencies at or above these are drawn as slow and very slow.
const LATENCY_WARN_MS: u32 = 500;
const LATENCY_SLOW_MS: u32 = 1000;
/// Token count that fills the metrics bar.
const TOKEN_BAR_MAX: u32 = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum DetailTab {
    #[default]
    Overview,
    Content,
    Metrics,
    Logs,
}

impl DetailTab {
    const ALL: [DetailTab; 4] = [
        DetailTab::Overview,
        DetailTab::Content,
        DetailTab::Metrics,
        DetailTab::Logs,
    ];

    fn label(self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Content => "Content",
            DetailTab::Metrics => "Metrics",
            DetailTab::Logs => "Logs",
        }
    }
}

pub struct DemoApp {
    session: VisualizerSession,
    settings_interaction: SettingsInteraction,
    settings_style: SettingsStyle,
    active_session: usize,
    system: SystemMetrics,
    system_refreshed_at: Instant,
    notices: NoticeBoard,
    detail_tab: DetailTab,
    #[cfg(feature = "events")]
    event_consumer: Receiver<Event>,
    #[cfg(feature = "events")]
    last_events: Vec<String>,
}

impl DemoApp {
    /// # Errors
    ///
    /// Returns [`GraphError`] if the sample session does not form a valid graph.
    pub fn new(_: &CreationContext<'_>) -> Result<Self, GraphError> {
        let session = VisualizerSession::new(mock::sentiment_analysis_graph()?);

        #[cfg(feature = "events")]
        let (session, event_consumer) = {
            let (tx, rx) = unbounded();
            (session.with_event_sink(Box::new(tx)), rx)
        };

        Ok(Self {
            session,
            settings_interaction: SettingsInteraction::default(),
            settings_style: SettingsStyle::default(),
            active_session: 0,
            system: SystemMetrics::default(),
            system_refreshed_at: Instant::now(),
            notices: NoticeBoard::default(),
            detail_tab: DetailTab::default(),
            #[cfg(feature = "events")]
            event_consumer,
            #[cfg(feature = "events")]
            last_events: Vec::new(),
        })
    }

    fn process_keybindings(&mut self, ctx: &Context, now: Instant) {
        for cmd in dispatch_keybindings(ctx) {
            apply_command(&mut self.session, cmd, now);
        }
    }

    fn refresh_system_metrics(&mut self, ctx: &Context, now: Instant) {
        let period = Duration::from_millis(SystemMetrics::REFRESH_MS);
        if now.saturating_duration_since(self.system_refreshed_at) >= period {
            self.system.drift(&mut rand::rng());
            self.system_refreshed_at = now;
        }
        ctx.request_repaint_after(period);
    }

    #[cfg(feature = "events")]
    fn drain_events(&mut self) {
        for e in self.event_consumer.try_iter() {
            self.last_events.push(format!("{e:?}"));
        }
        if self.last_events.len() > EVENTS_LIMIT {
            let excess = self.last_events.len() - EVENTS_LIMIT;
            self.last_events.drain(..excess);
        }
    }

    fn ui_header(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Live Execution Visualizer").size(HEADING_TEXT_SIZE));
            ui.separator();

            let before = self.active_session;
            ComboBox::from_id_salt("session")
                .selected_text(SESSIONS[self.active_session].name)
                .show_ui(ui, |ui| {
                    for (i, s) in SESSIONS.iter().enumerate() {
                        ui.selectable_value(&mut self.active_session, i, s.name);
                    }
                });
            if before != self.active_session {
                let s = SESSIONS[self.active_session];
                info!("switched to session {}", s.id);
                self.notices
                    .post(Notice::SessionSwitched { name: s.name }, Instant::now());
            }

            ui.separator();
            for mode in ExecutionMode::ALL {
                if ui
                    .selectable_label(self.session.mode() == mode, mode.label())
                    .clicked()
                {
                    self.session.set_mode(mode);
                }
            }

            ui.separator();
            let s = self.system;
            ui.label(format!("Connections: {}", s.active_connections));
            ui.label(format!("Avg response: {:.2}s", s.avg_response_time));
            ui.label(format!("Errors: {:.1}%", s.error_rate_percent()));
            ui.label(format!("Throughput: {}/min", s.throughput));
        });
    }

    fn ui_controls(&mut self, ui: &mut Ui, now: Instant) {
        ScrollArea::vertical().show(ui, |ui| {
            self.ui_transport(ui, now);
            ui.add_space(SECTION_SPACING);
            ui.separator();
            self.ui_filters(ui);
            ui.add_space(SECTION_SPACING);
            ui.separator();
            self.ui_view(ui);
            ui.add_space(SECTION_SPACING);
            ui.separator();
            self.ui_export(ui);
            #[cfg(feature = "events")]
            {
                ui.add_space(SECTION_SPACING);
                ui.separator();
                self.ui_events(ui);
            }
        });
    }

    fn ui_transport(&mut self, ui: &mut Ui, now: Instant) {
        ui.heading("Playback");
        let playback = self.session.playback();

        ui.horizontal(|ui| {
            if ui.button("⏮").on_hover_text("First step (home)").clicked() {
                self.session.seek(0);
            }
            if ui.button("◀").on_hover_text("Step back").clicked() {
                self.session.step_back();
            }
            let toggle = if playback.is_playing { "⏸" } else { "▶" };
            if ui.button(toggle).on_hover_text("Play / pause (space)").clicked() {
                self.session.toggle_playback(now);
            }
            if ui.button("▶|").on_hover_text("Step forward").clicked() {
                self.session.step_forward();
            }
            if ui.button("⏭").on_hover_text("Last step (end)").clicked() {
                self.session.seek_end();
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Restart").clicked() {
                self.session.restart(now);
            }
            if ui.button("Stop").clicked() {
                self.session.stop();
            }
        });

        let mut step = playback.current_step;
        let last = playback.total_steps.saturating_sub(1);
        if ui
            .add(Slider::new(&mut step, 0..=last).text("Step"))
            .changed()
        {
            self.session.seek(step);
        }
        ui.add(
            ProgressBar::new(progress(playback.current_step, playback.total_steps) / 100.)
                .show_percentage(),
        );

        let options = self.session.speed_options().to_vec();
        ComboBox::from_label("Speed")
            .selected_text(format!("{}x", playback.speed))
            .show_ui(ui, |ui| {
                for speed in options {
                    if ui
                        .selectable_label(playback.speed == speed, format!("{speed}x"))
                        .clicked()
                    {
                        if let Err(e) = self.session.set_speed(speed, now) {
                            warn!("{e}");
                        }
                    }
                }
            });
    }

    fn ui_filters(&mut self, ui: &mut Ui) {
        ui.heading("Filters");
        for t in NodeType::ALL {
            let mut on = self.session.filter().is_type_visible(t);
            let (_, border) = node_colors(t);
            if ui
                .checkbox(&mut on, RichText::new(t.label()).color(border))
                .changed()
            {
                self.session.toggle_node_type(t, on);
            }
        }

        let mut threshold = self.session.filter().latency_threshold_ms;
        if ui
            .add(
                Slider::new(&mut threshold, 0..=LATENCY_SLIDER_MAX_MS)
                    .suffix("ms")
                    .text("Min latency"),
            )
            .changed()
        {
            self.session.set_latency_threshold(threshold);
        }
    }

    fn ui_view(&mut self, ui: &mut Ui) {
        ui.heading("View");
        let viewport = self.session.viewport();
        let (can_in, can_out) = (viewport.can_zoom_in(), viewport.can_zoom_out());
        ui.horizontal(|ui| {
            if ui.add_enabled(can_out, egui::Button::new("−")).clicked() {
                self.session.zoom_out();
            }
            ui.label(format!("{}%", self.session.viewport().zoom_percent()));
            if ui.add_enabled(can_in, egui::Button::new("+")).clicked() {
                self.session.zoom_in();
            }
            if ui.button("Reset").clicked() {
                self.session.reset_view();
            }
            if ui.button("Fit").on_hover_text("Fit graph (F)").clicked() {
                self.session.request_fit();
            }
        });
        ui.checkbox(&mut self.settings_interaction.node_tooltip, "Tooltips");
        ui.checkbox(&mut self.settings_interaction.node_select, "Select nodes");
    }

    fn ui_export(&mut self, ui: &mut Ui) {
        ui.heading("Export");
        for format in ExportFormat::ALL {
            if ui.button(format.label()).clicked() {
                self.export(format);
            }
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let now = Instant::now();
        let bytes =
            exporter_for(format).and_then(|exporter| self.session.export(exporter.as_ref()));
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("export failed: {e}");
                let reason = e.to_string();
                self.notices.post(Notice::ExportFailed { format, reason }, now);
                return;
            }
        };

        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let name = format.file_name(ts);
        match std::fs::write(&name, bytes) {
            Ok(()) => {
                info!("snapshot written to {name}");
                self.notices.post(Notice::Exported { file: name }, now);
            }
            Err(e) => {
                warn!("failed to write {name}: {e}");
                let reason = format!("cannot write {name}: {e}");
                self.notices.post(Notice::ExportFailed { format, reason }, now);
            }
        }
    }

    #[cfg(feature = "events")]
    fn ui_events(&mut self, ui: &mut Ui) {
        ui.heading("Events");
        if ui.button("Clear").clicked() {
            self.last_events.clear();
        }
        ScrollArea::vertical()
            .id_salt("events")
            .max_height(200.)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for e in &self.last_events {
                    ui.monospace(e);
                }
            });
    }

    fn ui_timeline(&mut self, ui: &mut Ui) {
        let rows = self.session.timeline();
        let current = self.session.current_step();
        let end_ms = rows
            .iter()
            .map(|r| r.started_at_offset_ms + u64::from(r.duration_ms))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut seek_to = None;
        ui.horizontal(|ui| {
            ui.strong("Timeline");
            if ui.small_button("⏮").on_hover_text("First step").clicked() {
                seek_to = Some(0);
            }
            if ui.small_button("⏭").on_hover_text("Last step").clicked() {
                seek_to = Some(rows.len().saturating_sub(1));
            }
        });
        for (i, row) in rows.iter().enumerate() {
            ui.horizontal(|ui| {
                let (_, border) = node_colors(row.node_type);
                let title = RichText::new(&row.title).color(border);
                if ui
                    .selectable_label(i == current, title)
                    .on_hover_text("Jump to this step")
                    .clicked()
                {
                    seek_to = Some(i);
                }
                ui.label(RichText::new(row.status.label()).color(status_color(row.status)));
                ui.label(format!("+{}", format_duration(row.started_at_offset_ms)));

                let width = ui.available_width().max(1.);
                let (rect, response) = ui.allocate_exact_size(
                    egui::vec2(width, TIMELINE_BAR_HEIGHT),
                    egui::Sense::click(),
                );
                let start =
                    rect.left() + rect.width() * row.started_at_offset_ms as f32 / end_ms as f32;
                let len = (rect.width() * row.duration_ms as f32 / end_ms as f32).max(2.);
                let bar = egui::Rect::from_min_size(
                    egui::pos2(start, rect.top()),
                    egui::vec2(len, rect.height()),
                );
                ui.painter().rect_filled(bar, 2., status_color(row.status));
                if response.clicked() {
                    seek_to = Some(i);
                }
            });
        }

        if let Some(step) = seek_to {
            self.session.seek(step);
        }
    }

    fn ui_details(&mut self, ui: &mut Ui) {
        let Some(detail) = self.session.detail() else {
            return;
        };

        ui.horizontal(|ui| {
            ui.heading(&detail.title);
            if ui.button("✕").clicked() {
                self.session.close_details();
            }
        });
        ui.horizontal(|ui| {
            for tab in DetailTab::ALL {
                ui.selectable_value(&mut self.detail_tab, tab, tab.label());
            }
        });
        ui.separator();

        ScrollArea::vertical().show(ui, |ui| match self.detail_tab {
            DetailTab::Overview => ui_detail_overview(ui, &detail),
            DetailTab::Content => ui_detail_content(ui, &detail),
            DetailTab::Metrics => ui_detail_metrics(ui, &detail),
            DetailTab::Logs => ui_detail_logs(ui, &detail),
        });
    }

    fn ui_status_bar(&self, ui: &mut Ui) {
        let s = self.session.summary();
        ui.horizontal(|ui| {
            let state = if s.is_playing { "Playing" } else { "Paused" };
            ui.label(state);
            ui.separator();
            ui.label(format!("Nodes: {}/{}", s.completed_nodes, s.total_nodes));
            ui.separator();
            ui.label(format!("Zoom: {}%", s.zoom_percent));
            ui.separator();
            ui.label(format!("Speed: {}x", s.speed));
            ui.separator();
            ui.label(format!("Filters: {}/{}", s.visible_types, s.total_types));
            if s.latency_threshold_ms > 0 {
                ui.label(format!("≥ {}ms", s.latency_threshold_ms));
            }

            if let Some(node) = self.session.current_node() {
                ui.separator();
                ui.label(format!("At: {}", node.title()));
            }

            if let Some(notice) = self.notices.active(Instant::now()) {
                ui.separator();
                let color = match notice {
                    Notice::ExportFailed { .. } => status_color(Status::Error),
                    Notice::Exported { .. } => status_color(Status::Completed),
                    Notice::SessionSwitched { .. } => ui.visuals().text_color(),
                };
                ui.label(RichText::new(notice.text()).color(color));
            }
        });
    }
}

fn ui_detail_overview(ui: &mut Ui, detail: &NodeDetail) {
    let (_, border) = node_colors(detail.node_type);
    ui.label(RichText::new(format!("{} node", detail.node_type)).color(border));
    ui.label(RichText::new(detail.status.label()).color(status_color(detail.status)));
    ui.label(format!("Started at +{}", format_duration(detail.started_at_offset_ms)));
    ui.add_space(SECTION_SPACING);
    ui.strong("Quick metrics");
    ui.label(format!("Latency: {}ms", detail.metrics.latency_ms));
    ui.label(format!("Tokens: {}", detail.metrics.token_count));
    ui.add(
        ProgressBar::new(detail.metrics.confidence)
            .text(format!("Confidence {:.1}%", detail.metrics.confidence_percent())),
    );
    if !detail.connections.is_empty() {
        ui.add_space(SECTION_SPACING);
        ui.strong("Connections");
        for to in &detail.connections {
            ui.label(format!("→ {to}"));
        }
    }
}

fn ui_detail_content(ui: &mut Ui, detail: &NodeDetail) {
    ui.monospace(&detail.content);
    ui.add_space(SECTION_SPACING);
    let stats = detail.content_stats();
    ui.label(format!("Characters: {}", stats.chars));
    ui.label(format!("Words: {}", stats.words));
    ui.label(format!("Lines: {}", stats.lines));
    if ui.button("Copy content").clicked() {
        ui.ctx().copy_text(detail.content.clone());
    }
}

fn ui_detail_metrics(ui: &mut Ui, detail: &NodeDetail) {
    let m = detail.metrics;
    let latency_color = if m.latency_ms < LATENCY_WARN_MS {
        status_color(Status::Completed)
    } else if m.latency_ms < LATENCY_SLOW_MS {
        status_color(Status::Processing)
    } else {
        status_color(Status::Error)
    };
    ui.label(format!("Execution latency: {}ms", m.latency_ms));
    ui.add(
        ProgressBar::new((m.latency_ms as f32 / LATENCY_SLIDER_MAX_MS as f32).min(1.))
            .fill(latency_color),
    );
    ui.label(format!("Token count: {}", m.token_count));
    ui.add(ProgressBar::new((m.token_count as f32 / TOKEN_BAR_MAX as f32).min(1.)));
    ui.label(format!("Confidence: {:.1}%", m.confidence_percent()));
    ui.add(ProgressBar::new(m.confidence));
}

fn ui_detail_logs(ui: &mut Ui, detail: &NodeDetail) {
    let log = detail.log();
    if log.is_empty() {
        ui.weak("No log entries yet");
        return;
    }
    for entry in log {
        let color = match entry.level {
            LogLevel::Error => status_color(Status::Error),
            LogLevel::Info => status_color(Status::Processing),
            LogLevel::Debug => ui.visuals().weak_text_color(),
        };
        ui.horizontal(|ui| {
            ui.monospace(format!("+{}", format_duration(entry.offset_ms)));
            ui.label(RichText::new(entry.level.label()).monospace().color(color));
            ui.label(&entry.message);
        });
    }
}

impl App for DemoApp {
    fn update(&mut self, ctx: &Context, _: &mut eframe::Frame) {
        let now = Instant::now();
        self.process_keybindings(ctx, now);
        self.refresh_system_metrics(ctx, now);
        #[cfg(feature = "events")]
        self.drain_events();

        TopBottomPanel::top("header").show(ctx, |ui| self.ui_header(ui));
        TopBottomPanel::bottom("status_bar").show(ctx, |ui| self.ui_status_bar(ui));
        TopBottomPanel::bottom("timeline")
            .resizable(true)
            .show(ctx, |ui| self.ui_timeline(ui));
        SidePanel::left("controls")
            .default_width(SIDE_PANEL_WIDTH)
            .show(ctx, |ui| self.ui_controls(ui, now));

        if self.session.selection().selected().is_some() {
            SidePanel::right("details")
                .default_width(SIDE_PANEL_WIDTH)
                .show(ctx, |ui| self.ui_details(ui));
        }

        CentralPanel::default().show(ctx, |ui| {
            ui.add(
                ExecutionView::new(&mut self.session)
                    .with_interactions(&self.settings_interaction)
                    .with_styles(&self.settings_style),
            );
        });
    }
}
