//! egui events to viewport input events.

use egui::{Event, MouseWheelUnit, Pos2};
use glam::Vec2;

use vcad_viewport_lib::input::{
    InputEvent, Key, KeyEvent, PointerButton, PointerEvent, TouchEvent, TouchPhase,
};

/// Points of scroll that count as one wheel notch
const POINTS_PER_NOTCH: f32 = 50.0;

/// Translate one egui event; positions become relative to `origin`.
pub fn translate(event: &Event, origin: Pos2) -> Option<InputEvent> {
    let local = |pos: Pos2| Vec2::new(pos.x - origin.x, pos.y - origin.y);
    match event {
        Event::PointerButton { pos, button, pressed, .. } => {
            let button = match button {
                egui::PointerButton::Primary => PointerButton::Primary,
                egui::PointerButton::Secondary => PointerButton::Secondary,
                egui::PointerButton::Middle => PointerButton::Middle,
                _ => return None,
            };
            let event = if *pressed {
                PointerEvent::Down { button, position: local(*pos) }
            } else {
                PointerEvent::Up { button }
            };
            Some(InputEvent::Pointer(event))
        }
        Event::PointerMoved(pos) => Some(InputEvent::Pointer(PointerEvent::Move { position: local(*pos) })),
        Event::PointerGone | Event::WindowFocused(false) => Some(InputEvent::Pointer(PointerEvent::Leave)),
        Event::MouseWheel { unit, delta, .. } => {
            let notches = match unit {
                MouseWheelUnit::Point => delta.y / POINTS_PER_NOTCH,
                MouseWheelUnit::Line => delta.y,
                MouseWheelUnit::Page => delta.y * 3.0,
            };
            (notches != 0.0).then_some(InputEvent::Pointer(PointerEvent::Wheel { delta: notches }))
        }
        Event::Touch { id, phase, pos, .. } => {
            let phase = match phase {
                egui::TouchPhase::Start => TouchPhase::Start,
                egui::TouchPhase::Move => TouchPhase::Move,
                egui::TouchPhase::End => TouchPhase::End,
                egui::TouchPhase::Cancel => TouchPhase::Cancel,
            };
            Some(InputEvent::Touch(TouchEvent {
                id: id.0,
                phase,
                position: local(*pos),
            }))
        }
        Event::Key { key, pressed, modifiers, .. } => {
            let key = match key {
                egui::Key::ArrowUp => Key::ArrowUp,
                egui::Key::ArrowDown => Key::ArrowDown,
                egui::Key::ArrowLeft => Key::ArrowLeft,
                egui::Key::ArrowRight => Key::ArrowRight,
                _ => Key::Other,
            };
            Some(InputEvent::Key(KeyEvent {
                key,
                pressed: *pressed,
                shift: modifiers.shift,
            }))
        }
        _ => None,
    }
}
