//! Builds two scenes, reorders them and their children, and renders the
//! result. Run with `sw` (default) to write `shapes_order.png`, or with
//! `commands` to print the recorded command stream.

use anyhow::{bail, Context as _};
use simple_logger::SimpleLogger;
use strata::{
    Backend, BackendKind, Canvas, Color, Colorspace, CommandBackend, Engine, Scene, Shape,
    SoftwareBackend,
};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 800;

fn circle(cx: f32, cy: f32, color: Color) -> Shape {
    let mut shape = Shape::new();
    shape.append_circle(cx, cy, 100., 100.).set_fill(color);
    shape
}

fn draw_commands<B: Backend>(canvas: &mut Canvas<B>) -> anyhow::Result<()> {
    let mut scene1 = Scene::new();
    let blue = scene1.push(circle(300., 200., Color::rgb(0, 0, 255)))?;
    let red = scene1.push(circle(200., 200., Color::rgb(255, 0, 0)))?;
    let green = scene1.push(circle(250., 250., Color::rgb(0, 255, 0)))?;

    let mut scene2 = Scene::new();
    let mut white = Shape::new();
    white
        .append_rect(200., 100., 300., 300., 0., 0.)
        .set_fill(Color::WHITE);
    scene2.push(white)?;

    let scene1 = canvas.push(scene1)?;
    let scene2 = canvas.push(scene2)?;

    // (white) -> (blue -> red -> green)
    canvas.move_above(scene1, scene2)?;

    let children = canvas
        .get_mut(scene1)
        .and_then(|paint| paint.as_scene_mut())
        .context("scene was not pushed")?;
    // (white) -> (red -> green -> blue)
    children.raise(blue)?;
    // (white) -> (green -> red -> blue)
    children.lower(green)?;
    // (white) -> (green -> blue -> red)
    children.move_below(blue, red)?;

    Ok(())
}

fn software(engine: &Engine) -> anyhow::Result<()> {
    engine.init(BackendKind::Software, 4)?;

    let mut backend = SoftwareBackend::new(engine);
    backend.set_target(WIDTH, HEIGHT, Colorspace::Abgr8888)?;
    let mut canvas = Canvas::new(engine, backend)?;
    draw_commands(&mut canvas)?;
    canvas.draw()?;
    canvas.sync()?;

    // Abgr8888 words are RGBA bytes in little-endian order.
    let bytes = canvas
        .backend()
        .pixels()?
        .into_iter()
        .flat_map(u32::to_le_bytes)
        .collect::<Vec<u8>>();
    let image = image::RgbaImage::from_raw(WIDTH, HEIGHT, bytes)
        .context("pixel buffer does not match target size")?;
    image.save("shapes_order.png")?;
    println!("Wrote shapes_order.png");

    drop(canvas);
    engine.term(BackendKind::Software)?;
    Ok(())
}

fn commands(engine: &Engine) -> anyhow::Result<()> {
    engine.init(BackendKind::CommandStream, 0)?;

    let mut backend = CommandBackend::new();
    backend.set_viewport(WIDTH, HEIGHT)?;
    let mut canvas = Canvas::new(engine, backend)?;
    draw_commands(&mut canvas)?;
    canvas.draw()?;

    for command in canvas.backend().commands() {
        println!("{:?}", command);
    }

    drop(canvas);
    engine.term(BackendKind::CommandStream)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()?;

    let engine = Engine::new();
    match std::env::args().nth(1).as_deref() {
        None | Some("sw") => software(&engine),
        Some("commands") => commands(&engine),
        Some(other) => bail!("unknown backend '{}', expected 'sw' or 'commands'", other),
    }
}
