#![cfg(feature = "software")]

use strata::{
    glam::vec2, BackendKind, Canvas, Color, Colorspace, Engine, Image, Paint, Scene, Shape,
    SoftwareBackend,
};

const RED: Color = Color::rgb(255, 0, 0);
const GREEN: Color = Color::rgb(0, 255, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

fn canvas(engine: &Engine) -> Canvas<SoftwareBackend> {
    let mut backend = SoftwareBackend::builder(engine).anti_alias(false).build();
    backend.set_target(64, 64, Colorspace::Argb8888).unwrap();
    Canvas::new(engine, backend).unwrap()
}

fn rect(x: f32, y: f32, w: f32, h: f32, color: Color) -> Shape {
    let mut shape = Shape::new();
    shape.append_rect(x, y, w, h, 0., 0.).set_fill(color);
    shape
}

#[test]
fn top_paint_wins() {
    let engine = Engine::new();
    engine.init(BackendKind::Software, 2).unwrap();
    let mut canvas = canvas(&engine);

    let red = canvas.push(rect(0., 0., 32., 32., RED)).unwrap();
    let green = canvas.push(rect(16., 16., 32., 32., GREEN)).unwrap();
    canvas.draw().unwrap();
    canvas.sync().unwrap();
    assert_eq!(canvas.backend().pixel(20, 20), Some(GREEN));
    assert_eq!(canvas.backend().pixel(4, 4), Some(RED));

    canvas.move_above(red, green).unwrap();
    canvas.draw().unwrap();
    assert_eq!(canvas.backend().pixel(20, 20), Some(RED));
    assert_eq!(canvas.backend().pixel(40, 40), Some(GREEN));

    drop(canvas);
    engine.term(BackendKind::Software).unwrap();
}

#[test]
fn scene_transform_and_clip_apply_to_children() {
    let engine = Engine::new();
    engine.init(BackendKind::Software, 0).unwrap();
    let mut canvas = canvas(&engine);

    let mut scene = Scene::new();
    scene.push(rect(0., 0., 20., 20., BLUE)).unwrap();
    let mut paint = Paint::from(scene);
    paint.translate(vec2(10., 10.));
    paint.set_clip(Some(rect(0., 0., 10., 20., Color::WHITE)));
    canvas.push(paint).unwrap();
    canvas.draw().unwrap();

    let backend = canvas.backend();
    assert_eq!(backend.pixel(12, 12), Some(BLUE));
    assert_eq!(backend.pixel(25, 12), Some(Color::TRANSPARENT));
    assert_eq!(backend.pixel(5, 5), Some(Color::TRANSPARENT));
}

#[test]
fn images_are_composited() {
    let engine = Engine::new();
    engine.init(BackendKind::Software, 0).unwrap();
    let mut canvas = canvas(&engine);

    canvas.push(rect(0., 0., 64., 64., Color::WHITE)).unwrap();
    let mut image = Paint::from(Image::filled(8, 8, GREEN));
    image.translate(vec2(4., 4.));
    canvas.push(image).unwrap();
    canvas.draw().unwrap();

    assert_eq!(canvas.backend().pixel(6, 6), Some(GREEN));
    assert_eq!(canvas.backend().pixel(20, 20), Some(Color::WHITE));
}

#[test]
fn clear_resets_target() {
    let engine = Engine::new();
    engine.init(BackendKind::Software, 0).unwrap();
    let mut canvas = canvas(&engine);
    canvas.push(rect(0., 0., 64., 64., RED)).unwrap();
    canvas.draw().unwrap();
    assert_eq!(canvas.backend().pixel(1, 1), Some(RED));

    canvas.clear().unwrap();
    assert_eq!(canvas.backend().pixel(1, 1), Some(Color::TRANSPARENT));
    assert_eq!(canvas.backend().prepared_count(), 0);
    assert!(canvas
        .backend()
        .pixels()
        .unwrap()
        .iter()
        .all(|&pixel| pixel == 0));
}
