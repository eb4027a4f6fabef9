//! Input events and their dispatch
//!
//! Input comes from whatever windowing layer the application uses, through
//! the [`EventSource`] trait. At the start of every frame the engine polls the
//! source once and hands the batch to the [`EventDispatcher`], which runs the
//! callback registered for each event's type, in the order the events were
//! emitted.

use std::collections::{HashMap, VecDeque};

use crate::scene::Scene;

/// Kind of an input event; callbacks are registered per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The user asked to close the application
    Quit,
    /// A key was pressed
    KeyDown,
    /// A key was released
    KeyUp,
    /// The pointer moved
    MouseMove,
    /// A mouse button was pressed
    MouseButtonDown,
    /// A mouse button was released
    MouseButtonUp,
    /// The wheel scrolled
    MouseWheel,
}

/// Keys the engine knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// Q key
    Q,
    /// E key
    E,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Space bar
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Any other key, by platform scancode
    Other(u32),
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left button
    Left,
    /// Right button
    Right,
    /// Middle button
    Middle,
}

/// Data carried by an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventPayload {
    /// Nothing beyond the type
    None,
    /// Key that went down or up
    Key(KeyCode),
    /// Pointer position in window pixels
    Pointer {
        /// Horizontal position
        x: f32,
        /// Vertical position
        y: f32,
    },
    /// Button and the pointer position when it changed
    Button {
        /// Which button
        button: MouseButton,
        /// Horizontal position
        x: f32,
        /// Vertical position
        y: f32,
    },
    /// Scroll amount, positive away from the user
    Wheel(f32),
}

/// One polled input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    /// What happened
    pub event_type: EventType,
    /// Details
    pub payload: EventPayload,
}

impl InputEvent {
    /// Close request
    pub fn quit() -> Self {
        Self {
            event_type: EventType::Quit,
            payload: EventPayload::None,
        }
    }

    /// Key press
    pub fn key_down(key: KeyCode) -> Self {
        Self {
            event_type: EventType::KeyDown,
            payload: EventPayload::Key(key),
        }
    }

    /// Key release
    pub fn key_up(key: KeyCode) -> Self {
        Self {
            event_type: EventType::KeyUp,
            payload: EventPayload::Key(key),
        }
    }

    /// Pointer movement
    pub fn mouse_move(x: f32, y: f32) -> Self {
        Self {
            event_type: EventType::MouseMove,
            payload: EventPayload::Pointer { x, y },
        }
    }

    /// Button press or release
    pub fn mouse_button(button: MouseButton, pressed: bool, x: f32, y: f32) -> Self {
        let event_type = if pressed {
            EventType::MouseButtonDown
        } else {
            EventType::MouseButtonUp
        };
        Self {
            event_type,
            payload: EventPayload::Button { button, x, y },
        }
    }

    /// Wheel scroll
    pub fn mouse_wheel(delta: f32) -> Self {
        Self {
            event_type: EventType::MouseWheel,
            payload: EventPayload::Wheel(delta),
        }
    }

    /// The key of a key event
    pub fn key(&self) -> Option<KeyCode> {
        match self.payload {
            EventPayload::Key(key) => Some(key),
            _ => None,
        }
    }
}

/// Whether the frame loop should keep going after a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFlow {
    /// Keep running
    #[default]
    Continue,
    /// Stop at the end of this frame
    Exit,
}

/// The windowing side of the engine
pub trait EventSource {
    /// Every event that arrived since the last poll, oldest first
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

/// Replays prepared event batches, one batch per poll
///
/// Once the script runs out every poll returns nothing. Used for headless
/// runs and tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEventSource {
    frames: VecDeque<Vec<InputEvent>>,
}

impl ScriptedEventSource {
    /// Empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: queue the events for the next unscripted frame
    pub fn with_frame(mut self, events: Vec<InputEvent>) -> Self {
        self.push_frame(events);
        self
    }

    /// Queue the events for the next unscripted frame
    pub fn push_frame(&mut self, events: Vec<InputEvent>) {
        self.frames.push_back(events);
    }

    /// Builder pattern: queue `count` frames without input
    pub fn with_idle_frames(mut self, count: usize) -> Self {
        self.frames.extend(std::iter::repeat_with(Vec::new).take(count));
        self
    }

    /// Scripted frames not yet polled
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl EventSource for ScriptedEventSource {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.frames.pop_front().unwrap_or_default()
    }
}

/// Callback run for every event of one type
pub type EventCallback = Box<dyn FnMut(&InputEvent, &mut Scene) -> EventFlow>;

/// Routes polled events to their callbacks
///
/// Each type has at most one callback; registering another replaces it.
/// A quit event always sets the exit flag, whether or not a callback is
/// registered for it.
#[derive(Default)]
pub struct EventDispatcher {
    callbacks: HashMap<EventType, EventCallback>,
    exit_requested: bool,
}

impl EventDispatcher {
    /// Dispatcher with no callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback for `event_type`, returning the one it replaces
    pub fn on(&mut self, event_type: EventType, callback: EventCallback) -> Option<EventCallback> {
        self.callbacks.insert(event_type, callback)
    }

    /// Unregister the callback for `event_type`
    pub fn remove(&mut self, event_type: EventType) -> bool {
        self.callbacks.remove(&event_type).is_some()
    }

    /// Whether a callback is registered for `event_type`
    pub fn handles(&self, event_type: EventType) -> bool {
        self.callbacks.contains_key(&event_type)
    }

    /// Run the callbacks for a batch of events, in order
    ///
    /// Returns how many callbacks ran. The whole batch is dispatched even
    /// after an exit request; the loop stops at the frame boundary.
    pub fn dispatch(&mut self, events: &[InputEvent], scene: &mut Scene) -> usize {
        let mut invoked = 0;
        for event in events {
            if event.event_type == EventType::Quit {
                log::info!("Quit event received");
                self.exit_requested = true;
            }
            let Some(callback) = self.callbacks.get_mut(&event.event_type) else {
                continue;
            };
            invoked += 1;
            if callback(event, scene) == EventFlow::Exit {
                log::debug!("{:?} callback requested exit", event.event_type);
                self.exit_requested = true;
            }
        }
        invoked
    }

    /// Whether a quit event or a callback asked the loop to stop
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Forget a previous exit request
    pub fn reset_exit(&mut self) {
        self.exit_requested = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::geometry::Shape;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_scripted_source_replays_batches() {
        let mut source = ScriptedEventSource::new()
            .with_frame(vec![InputEvent::key_down(KeyCode::W)])
            .with_idle_frames(1)
            .with_frame(vec![InputEvent::quit()]);

        assert_eq!(source.remaining(), 3);
        assert_eq!(source.poll_events(), vec![InputEvent::key_down(KeyCode::W)]);
        assert!(source.poll_events().is_empty());
        assert_eq!(source.poll_events(), vec![InputEvent::quit()]);
        assert!(source.poll_events().is_empty());
    }

    #[test]
    fn test_callbacks_run_once_per_event_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        let keys = Rc::clone(&seen);
        dispatcher.on(
            EventType::KeyDown,
            Box::new(move |event: &InputEvent, _: &mut Scene| {
                keys.borrow_mut().push(event.key());
                EventFlow::Continue
            }),
        );

        let mut scene = Scene::new();
        let events = [
            InputEvent::key_down(KeyCode::A),
            InputEvent::mouse_move(3.0, 4.0),
            InputEvent::key_up(KeyCode::A),
            InputEvent::key_down(KeyCode::D),
        ];
        assert_eq!(dispatcher.dispatch(&events, &mut scene), 2);
        assert_eq!(*seen.borrow(), vec![Some(KeyCode::A), Some(KeyCode::D)]);
        assert!(!dispatcher.exit_requested());
    }

    #[test]
    fn test_callbacks_can_move_shapes() {
        let mut scene = Scene::new();
        let paddle = scene.add_shape(Shape::cube(1.0, Vec3::zeros(), None));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.on(
            EventType::KeyDown,
            Box::new(move |event: &InputEvent, scene: &mut Scene| {
                if event.key() == Some(KeyCode::Right) {
                    if let Some(shape) = scene.shape_mut(paddle) {
                        shape.translate_by(Vec3::new(0.5, 0.0, 0.0));
                    }
                }
                EventFlow::Continue
            }),
        );

        dispatcher.dispatch(&[InputEvent::key_down(KeyCode::Right)], &mut scene);
        assert_eq!(scene.shape(paddle).unwrap().translation(), Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_quit_sets_exit_without_a_callback() {
        let mut dispatcher = EventDispatcher::new();
        let mut scene = Scene::new();
        assert_eq!(dispatcher.dispatch(&[InputEvent::quit()], &mut scene), 0);
        assert!(dispatcher.exit_requested());

        dispatcher.reset_exit();
        assert!(!dispatcher.exit_requested());
    }

    #[test]
    fn test_callback_exit_and_replacement() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.on(EventType::KeyDown, Box::new(|_: &InputEvent, _: &mut Scene| EventFlow::Continue));
        let replaced = dispatcher.on(
            EventType::KeyDown,
            Box::new(|event: &InputEvent, _: &mut Scene| {
                if event.key() == Some(KeyCode::Escape) {
                    EventFlow::Exit
                } else {
                    EventFlow::Continue
                }
            }),
        );
        assert!(replaced.is_some());

        let mut scene = Scene::new();
        dispatcher.dispatch(&[InputEvent::key_down(KeyCode::Space)], &mut scene);
        assert!(!dispatcher.exit_requested());
        dispatcher.dispatch(&[InputEvent::key_down(KeyCode::Escape)], &mut scene);
        assert!(dispatcher.exit_requested());

        assert!(dispatcher.remove(EventType::KeyDown));
        assert!(!dispatcher.handles(EventType::KeyDown));
    }
}
