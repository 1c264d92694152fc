use std::slice;

use glam::{Affine2, UVec2};
use slotmap::SlotMap;

use crate::{
    backend::{average_scale, Clip, RenderKey, RenderState, RenderUpdateFlags},
    Backend, BackendError, BackendKind, Color, FillRule, Image, PathSegment, Shape,
    StrokeSettings,
};

/// A low-level command emitted by a [`CommandBackend`].
///
/// A frame is a stream of `Command`s. The stream is _flattened_: each
/// `Command` is one atomic unit and contains no heap-allocated data.
/// Paths are emitted in target space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Command {
    /// Sets the current paint to a solid color, with opacity already applied.
    UseSolidPaint(Color),

    /// Clears the currently staged path.
    ClearPath,
    /// Pushes a segment onto the current path.
    PushPathSegment(PathSegment),

    /// Intersects the clip with the currently staged path, then
    /// clears the staged path.
    IntersectClipWithPath { fill_rule: FillRule },
    /// Clears the clip.
    ClearClip,

    /// Fills the current path with the current paint.
    FillPath { fill_rule: FillRule },
    /// Strokes the current path with the current paint.
    StrokePath { stroke_settings: StrokeSettings },
    /// Draws the image prepared under `key`. Look it up with
    /// [`CommandBackend::image`].
    DrawImage {
        key: RenderKey,
        transform: Affine2,
        opacity: u8,
    },
}

/// An immutable stream of `Command`s.
#[derive(Debug, Clone)]
pub struct CommandStream<'a> {
    commands: slice::Iter<'a, Command>,
}

impl<'a> Iterator for CommandStream<'a> {
    type Item = Command;

    fn next(&mut self) -> Option<Self::Item> {
        self.commands.next().copied()
    }
}

/// A buffer of `Command`s.
#[derive(Debug, Default)]
struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    fn push_path(&mut self, segments: &[PathSegment]) -> &mut Self {
        self.push(Command::ClearPath);
        self.commands
            .extend(segments.iter().copied().map(Command::PushPathSegment));
        self
    }

    fn to_stream(&self) -> CommandStream {
        CommandStream {
            commands: self.commands.iter(),
        }
    }

    fn clear(&mut self) {
        self.commands.clear()
    }
}

struct Node {
    commands: CommandBuffer,
    image: Option<Image>,
}

/// A backend that records flattened draw commands instead of rasterizing.
///
/// Preparing a paint records its commands once; drawing a frame appends
/// the recorded commands of every paint in z-order. After
/// [`end_frame`](Backend::end_frame) the frame can be replayed through
/// [`commands`](CommandBackend::commands), e.g. by a GPU renderer.
#[derive(Default)]
pub struct CommandBackend {
    viewport: Option<UVec2>,
    nodes: SlotMap<RenderKey, Node>,
    frame: CommandBuffer,
    in_frame: bool,
}

impl CommandBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the size of the target the commands are meant for.
    /// The backend is not ready until this is called.
    pub fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidTarget { width, height });
        }
        self.viewport = Some(UVec2::new(width, height));
        Ok(())
    }

    pub fn viewport(&self) -> Option<UVec2> {
        self.viewport
    }

    /// Commands recorded by the latest frame.
    pub fn commands(&self) -> CommandStream {
        self.frame.to_stream()
    }

    /// The image prepared under `key`, as referenced by [`Command::DrawImage`].
    pub fn image(&self, key: RenderKey) -> Option<&Image> {
        self.nodes.get(key).and_then(|node| node.image.as_ref())
    }

    /// Number of paints with prepared state.
    pub fn prepared_count(&self) -> usize {
        self.nodes.len()
    }

    fn record(&mut self, cache: Option<RenderKey>, node: Node) -> RenderKey {
        match cache.and_then(|key| self.nodes.get_mut(key).map(|slot| (key, slot))) {
            Some((key, slot)) => {
                *slot = node;
                key
            }
            None => self.nodes.insert(node),
        }
    }

    fn is_current(&self, cache: Option<RenderKey>, flags: RenderUpdateFlags) -> Option<RenderKey> {
        cache.filter(|&key| flags.is_empty() && self.nodes.contains_key(key))
    }
}

fn push_clips(buffer: &mut CommandBuffer, clips: &[Clip]) {
    for clip in clips {
        buffer.push_path(clip.path.segments()).push(Command::IntersectClipWithPath {
            fill_rule: clip.fill_rule,
        });
    }
}

impl Backend for CommandBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::CommandStream
    }

    fn is_ready(&self) -> bool {
        self.viewport.is_some()
    }

    fn reset_target(&mut self) -> Result<(), BackendError> {
        if !self.is_ready() {
            return Err(BackendError::NoTarget);
        }
        self.frame.clear();
        self.in_frame = false;
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), BackendError> {
        if !self.is_ready() {
            return Err(BackendError::NoTarget);
        }
        if self.in_frame {
            return Err(BackendError::FrameInProgress);
        }
        self.frame.clear();
        self.in_frame = true;
        log::trace!("Began command frame");
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        if !self.in_frame {
            return Err(BackendError::NoFrame);
        }
        self.in_frame = false;
        log::trace!(
            "Ended command frame with {} commands",
            self.frame.commands.len()
        );
        Ok(())
    }

    fn prepare_shape(
        &mut self,
        cache: Option<RenderKey>,
        shape: &Shape,
        state: &RenderState<'_>,
        flags: RenderUpdateFlags,
    ) -> Result<RenderKey, BackendError> {
        if let Some(key) = self.is_current(cache, flags) {
            return Ok(key);
        }

        let mut commands = CommandBuffer::default();
        push_clips(&mut commands, state.clips);

        let path = shape.path().transformed(&state.transform);
        commands.push_path(path.segments());
        if let Some(color) = shape.fill() {
            commands
                .push(Command::UseSolidPaint(color.with_opacity(state.opacity)))
                .push(Command::FillPath {
                    fill_rule: shape.fill_rule(),
                });
        }
        if let Some(stroke) = shape.stroke() {
            let stroke_settings = StrokeSettings {
                width: stroke.width * average_scale(&state.transform),
                ..*stroke
            };
            commands
                .push(Command::UseSolidPaint(
                    stroke.color.with_opacity(state.opacity),
                ))
                .push(Command::StrokePath { stroke_settings });
        }

        if !state.clips.is_empty() {
            commands.push(Command::ClearClip);
        }

        Ok(self.record(
            cache,
            Node {
                commands,
                image: None,
            },
        ))
    }

    fn prepare_image(
        &mut self,
        cache: Option<RenderKey>,
        image: &Image,
        state: &RenderState<'_>,
        flags: RenderUpdateFlags,
    ) -> Result<RenderKey, BackendError> {
        if let Some(key) = self.is_current(cache, flags) {
            return Ok(key);
        }

        let key = self.record(
            cache,
            Node {
                commands: CommandBuffer::default(),
                image: Some(image.clone()),
            },
        );

        let node = &mut self.nodes[key];
        push_clips(&mut node.commands, state.clips);
        node.commands.push(Command::DrawImage {
            key,
            transform: state.transform,
            opacity: state.opacity,
        });
        if !state.clips.is_empty() {
            node.commands.push(Command::ClearClip);
        }
        Ok(key)
    }

    fn render(&mut self, key: RenderKey) -> Result<(), BackendError> {
        if !self.in_frame {
            return Err(BackendError::NoFrame);
        }
        let node = self.nodes.get(key).ok_or(BackendError::StaleKey)?;
        self.frame
            .commands
            .extend_from_slice(&node.commands.commands);
        Ok(())
    }

    fn dispose(&mut self, key: RenderKey) {
        self.nodes.remove(key);
    }
}
