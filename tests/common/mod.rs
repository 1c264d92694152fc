#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use slotmap::SlotMap;
use strata::{
    Backend, BackendError, BackendKind, Canvas, Color, Engine, Image, RenderKey, RenderState,
    RenderUpdateFlags, Shape,
};

/// A call made on a [`Recorder`]. Paints are identified by their fill color,
/// or by the color of the first pixel for images.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ResetTarget,
    BeginFrame,
    EndFrame,
    Sync,
    Prepare(Color),
    Render(Color),
    Dispose(Color),
}

/// A log of backend calls that outlives the canvas owning the backend.
pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// A backend that records every call instead of drawing.
pub struct Recorder {
    pub ready: bool,
    /// Makes `render` fail for paints of this color.
    pub fail_render: Option<Color>,
    /// Makes `prepare_*` fail for paints of this color.
    pub fail_prepare: Option<Color>,
    events: EventLog,
    nodes: SlotMap<RenderKey, Node>,
}

struct Node {
    color: Color,
    opacity: u8,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            ready: true,
            fail_render: None,
            fail_prepare: None,
            events: EventLog::default(),
            nodes: SlotMap::with_key(),
        }
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// A handle to the event log that stays readable after the
    /// recorder is dropped.
    pub fn event_log(&self) -> EventLog {
        Rc::clone(&self.events)
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Effective opacity a paint of `color` was last prepared with.
    pub fn opacity_of(&self, color: Color) -> Option<u8> {
        self.nodes
            .values()
            .find(|node| node.color == color)
            .map(|node| node.opacity)
    }

    fn prepare(
        &mut self,
        cache: Option<RenderKey>,
        color: Color,
        opacity: u8,
    ) -> Result<RenderKey, BackendError> {
        if !self.ready {
            return Err(BackendError::NoTarget);
        }
        if self.fail_prepare == Some(color) {
            return Err(BackendError::InvalidTarget {
                width: 0,
                height: 0,
            });
        }
        self.record(Event::Prepare(color));
        let node = Node { color, opacity };
        match cache.and_then(|key| self.nodes.get_mut(key).map(|slot| (key, slot))) {
            Some((key, slot)) => {
                *slot = node;
                Ok(key)
            }
            None => Ok(self.nodes.insert(node)),
        }
    }
}

impl Backend for Recorder {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn reset_target(&mut self) -> Result<(), BackendError> {
        self.record(Event::ResetTarget);
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), BackendError> {
        self.record(Event::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        self.record(Event::EndFrame);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), BackendError> {
        self.record(Event::Sync);
        Ok(())
    }

    fn prepare_shape(
        &mut self,
        cache: Option<RenderKey>,
        shape: &Shape,
        state: &RenderState<'_>,
        _flags: RenderUpdateFlags,
    ) -> Result<RenderKey, BackendError> {
        let color = shape.fill().unwrap_or(Color::TRANSPARENT);
        self.prepare(cache, color, state.opacity)
    }

    fn prepare_image(
        &mut self,
        cache: Option<RenderKey>,
        image: &Image,
        state: &RenderState<'_>,
        _flags: RenderUpdateFlags,
    ) -> Result<RenderKey, BackendError> {
        let color = Color::from_argb(image.pixels()[0]);
        self.prepare(cache, color, state.opacity)
    }

    fn render(&mut self, key: RenderKey) -> Result<(), BackendError> {
        let color = self.nodes.get(key).ok_or(BackendError::StaleKey)?.color;
        if self.fail_render == Some(color) {
            return Err(BackendError::NotPrepared);
        }
        self.record(Event::Render(color));
        Ok(())
    }

    fn dispose(&mut self, key: RenderKey) {
        if let Some(node) = self.nodes.remove(key) {
            self.record(Event::Dispose(node.color));
        }
    }
}

pub const RED: Color = Color::rgb(255, 0, 0);
pub const GREEN: Color = Color::rgb(0, 255, 0);
pub const BLUE: Color = Color::rgb(0, 0, 255);
pub const WHITE: Color = Color::WHITE;

pub fn circle(color: Color) -> Shape {
    let mut shape = Shape::new();
    shape.append_circle(0., 0., 10., 10.).set_fill(color);
    shape
}

pub fn canvas() -> Canvas<Recorder> {
    let engine = Engine::new();
    engine.init(BackendKind::Software, 0).unwrap();
    Canvas::new(&engine, Recorder::new()).unwrap()
}

/// Colors rendered by `events`, in order.
pub fn rendered(events: &[Event]) -> Vec<Color> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Render(color) => Some(*color),
            _ => None,
        })
        .collect()
}

/// Colors prepared by `events`, in order.
pub fn prepared(events: &[Event]) -> Vec<Color> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Prepare(color) => Some(*color),
            _ => None,
        })
        .collect()
}
