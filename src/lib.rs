//! A retained-mode 2D scene graph.
//!
//! Build a tree of [`Paint`]s (shapes, scenes grouping other paints,
//! and images), move them into a [`Canvas`], reorder them, and draw
//! them through a pluggable [`Backend`].
//!
//! ```
//! use strata::{BackendKind, Canvas, Color, CommandBackend, Engine, Shape};
//!
//! let engine = Engine::new();
//! engine.init(BackendKind::CommandStream, 0)?;
//!
//! let mut backend = CommandBackend::new();
//! backend.set_viewport(800, 600)?;
//! let mut canvas = Canvas::new(&engine, backend)?;
//!
//! let mut shape = Shape::new();
//! shape.append_rect(0., 0., 400., 400., 50., 50.).set_fill(Color::rgb(0, 0, 255));
//! let id = canvas.push(shape)?;
//! canvas.raise(id)?;
//! canvas.draw()?;
//! canvas.sync()?;
//!
//! drop(canvas);
//! engine.term(BackendKind::CommandStream)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod backend;
mod canvas;
mod color;
mod engine;
mod error;
mod paint;
mod path;
mod thread_pool;
mod types;

#[cfg(feature = "software")]
pub use backend::software::{SoftwareBackend, SoftwareBackendBuilder};
pub use backend::{
    command::{Command, CommandBackend, CommandStream},
    Backend, Clip, RenderKey, RenderState, RenderUpdateFlags,
};
pub use canvas::Canvas;
pub use color::Color;
pub use engine::{BackendKind, Engine};
pub use error::{BackendError, Error, ErrorKind, Result};
pub use paint::{Image, Paint, PaintId, PaintKind, Scene, Shape};
pub use path::{Path, PathBuilder, PathSegment};
pub use thread_pool::WorkerPool;
pub use types::{Colorspace, FillRule, LineCap, LineJoin, StrokeSettings};

pub extern crate glam;
