//! Random reorder sequences checked against a plain `Vec` model.

mod common;

use common::*;
use strata::{Color, ErrorKind, PaintId, Scene};

const ITERATIONS: usize = 500;

fn shade(i: usize) -> Color {
    Color::rgb(i as u8, 0, 0)
}

#[test]
fn canvas_matches_model() {
    let rng = fastrand::Rng::with_seed(0x5eed);
    for round in 0..8 {
        let mut canvas = canvas();
        let count = 1 + round * 3;
        let ids: Vec<PaintId> = (0..count)
            .map(|i| canvas.push(circle(shade(i))).unwrap())
            .collect();
        let mut model: Vec<usize> = (0..count).collect();

        for _ in 0..ITERATIONS {
            let a = rng.usize(..count);
            let b = rng.usize(..count);
            let id = ids[a];
            let reference = ids[b];
            let position = |model: &[usize], x: usize| model.iter().position(|&m| m == x).unwrap();

            match rng.u8(..4) {
                0 => {
                    canvas.raise(id).unwrap();
                    model.remove(position(&model, a));
                    model.push(a);
                }
                1 => {
                    canvas.lower(id).unwrap();
                    model.remove(position(&model, a));
                    model.insert(0, a);
                }
                2 => {
                    let result = canvas.move_above(id, reference);
                    if a == b {
                        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
                    } else {
                        result.unwrap();
                        model.remove(position(&model, a));
                        let at = position(&model, b) + 1;
                        model.insert(at, a);
                    }
                }
                _ => {
                    let result = canvas.move_below(id, reference);
                    if a == b {
                        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
                    } else {
                        result.unwrap();
                        model.remove(position(&model, a));
                        let at = position(&model, b);
                        model.insert(at, a);
                    }
                }
            }

            let expected: Vec<PaintId> = model.iter().map(|&i| ids[i]).collect();
            assert_eq!(canvas.ids().collect::<Vec<_>>(), expected);
        }

        canvas.backend_mut().take_events();
        canvas.draw().unwrap();
        let expected: Vec<Color> = model.iter().map(|&i| shade(i)).collect();
        assert_eq!(rendered(&canvas.backend_mut().take_events()), expected);
    }
}

#[test]
fn scene_matches_model() {
    let rng = fastrand::Rng::with_seed(42);
    let count = 12;
    let mut scene = Scene::new();
    let ids: Vec<PaintId> = (0..count)
        .map(|i| scene.push(circle(shade(i))).unwrap())
        .collect();
    let mut model: Vec<usize> = (0..count).collect();

    for _ in 0..ITERATIONS {
        let a = rng.usize(..count);
        let b = loop {
            let b = rng.usize(..count);
            if b != a {
                break b;
            }
        };
        let pos_a = model.iter().position(|&m| m == a).unwrap();
        model.remove(pos_a);
        let pos_b = model.iter().position(|&m| m == b).unwrap();
        if rng.bool() {
            scene.move_above(ids[a], ids[b]).unwrap();
            model.insert(pos_b + 1, a);
        } else {
            scene.move_below(ids[a], ids[b]).unwrap();
            model.insert(pos_b, a);
        }
        assert_eq!(scene.len(), count);
    }

    let fills: Vec<Color> = scene
        .iter()
        .filter_map(|paint| paint.as_shape().and_then(|shape| shape.fill()))
        .collect();
    let expected: Vec<Color> = model.iter().map(|&i| shade(i)).collect();
    assert_eq!(fills, expected);
}

#[test]
fn foreign_ids_never_reorder() {
    let rng = fastrand::Rng::with_seed(7);
    let mut first = canvas();
    let mut second = canvas();
    let ids: Vec<PaintId> = (0..6)
        .map(|i| first.push(circle(shade(i))).unwrap())
        .collect();
    let foreign: Vec<PaintId> = (0..6)
        .map(|i| second.push(circle(shade(i))).unwrap())
        .collect();

    for _ in 0..100 {
        let own = ids[rng.usize(..ids.len())];
        let other = foreign[rng.usize(..foreign.len())];
        assert_eq!(first.raise(other).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            first.move_above(own, other).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            first.move_below(other, own).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
    assert_eq!(first.ids().collect::<Vec<_>>(), ids);
}
