use egui::{Context, Key};
use instant::Instant;

use crate::VisualizerSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePlay,
    StepBack,
    StepForward,
    FirstStep,
    LastStep,
    ClearSelection,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    FitView,
}

/// Collects the commands triggered by this frame's keyboard input.
///
/// Keys typed into a focused text field are left alone.
pub fn dispatch(ctx: &Context) -> Vec<Command> {
    if ctx.wants_keyboard_input() {
        return Vec::new();
    }

    let mut cmds = Vec::new();
    ctx.input(|i| {
        if i.modifiers.any() && !i.modifiers.shift_only() {
            return;
        }

        if i.key_pressed(Key::Space) {
            cmds.push(Command::TogglePlay);
        }
        if i.key_pressed(Key::ArrowLeft) {
            cmds.push(Command::StepBack);
        }
        if i.key_pressed(Key::ArrowRight) {
            cmds.push(Command::StepForward);
        }
        if i.key_pressed(Key::Home) {
            cmds.push(Command::FirstStep);
        }
        if i.key_pressed(Key::End) {
            cmds.push(Command::LastStep);
        }
        if i.key_pressed(Key::Escape) {
            cmds.push(Command::ClearSelection);
        }
        // '+' arrives as shift + '=' on most layouts
        if i.key_pressed(Key::Equals) || i.key_pressed(Key::Plus) {
            cmds.push(Command::ZoomIn);
        }
        if i.key_pressed(Key::Minus) {
            cmds.push(Command::ZoomOut);
        }
        if i.key_pressed(Key::Num0) {
            cmds.push(Command::ResetZoom);
        }
        if i.key_pressed(Key::F) {
            cmds.push(Command::FitView);
        }
    });

    cmds
}

pub fn apply(session: &mut VisualizerSession, cmd: Command, now: Instant) {
    match cmd {
        Command::TogglePlay => session.toggle_playback(now),
        Command::StepBack => {
            session.step_back();
        }
        Command::StepForward => {
            session.step_forward();
        }
        Command::FirstStep => {
            session.seek(0);
        }
        Command::LastStep => {
            session.seek_end();
        }
        Command::ClearSelection => session.close_details(),
        Command::ZoomIn => session.zoom_in(),
        Command::ZoomOut => session.zoom_out(),
        Command::ResetZoom => session.reset_zoom(),
        Command::FitView => session.request_fit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::sentiment_analysis_graph;

    fn press(key: Key) -> egui::RawInput {
        egui::RawInput {
            events: vec![egui::Event::Key {
                key,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers: egui::Modifiers::NONE,
            }],
            ..Default::default()
        }
    }

    fn dispatched(key: Key) -> Vec<Command> {
        let ctx = Context::default();
        let mut cmds = Vec::new();
        let _ = ctx.run(press(key), |ctx| cmds = dispatch(ctx));
        cmds
    }

    #[test]
    fn test_dispatch_keys() {
        assert_eq!(dispatched(Key::Space), vec![Command::TogglePlay]);
        assert_eq!(dispatched(Key::ArrowLeft), vec![Command::StepBack]);
        assert_eq!(dispatched(Key::ArrowRight), vec![Command::StepForward]);
        assert_eq!(dispatched(Key::Escape), vec![Command::ClearSelection]);
        assert_eq!(dispatched(Key::Equals), vec![Command::ZoomIn]);
        assert_eq!(dispatched(Key::Minus), vec![Command::ZoomOut]);
        assert_eq!(dispatched(Key::Num0), vec![Command::ResetZoom]);
        assert_eq!(dispatched(Key::Home), vec![Command::FirstStep]);
        assert_eq!(dispatched(Key::End), vec![Command::LastStep]);
        assert_eq!(dispatched(Key::F), vec![Command::FitView]);
        assert!(dispatched(Key::A).is_empty());
    }

    #[test]
    fn test_apply_commands() {
        let now = Instant::now();
        let mut s = VisualizerSession::new(sentiment_analysis_graph().unwrap());

        apply(&mut s, Command::StepForward, now);
        apply(&mut s, Command::StepForward, now);
        apply(&mut s, Command::StepBack, now);
        assert_eq!(s.current_step(), 1);

        apply(&mut s, Command::LastStep, now);
        assert_eq!(s.current_step(), 5);
        apply(&mut s, Command::FirstStep, now);
        assert_eq!(s.current_step(), 0);

        apply(&mut s, Command::FitView, now);
        assert!(s.take_fit_request());

        apply(&mut s, Command::TogglePlay, now);
        assert!(s.playback().is_playing);
        apply(&mut s, Command::TogglePlay, now);
        assert!(!s.playback().is_playing);

        apply(&mut s, Command::ZoomIn, now);
        assert_eq!(s.viewport().zoom_percent(), 120);
        apply(&mut s, Command::ResetZoom, now);
        assert_eq!(s.viewport().zoom(), 1.);

        s.select("llm-1");
        apply(&mut s, Command::ClearSelection, now);
        assert_eq!(s.selection().selected(), None);
    }
}
