use super::{next_content_id, PaintList};
use crate::{Paint, PaintId, Result};

/// A group of paints drawn together.
///
/// A scene owns its children and orders them exactly like a
/// [`Canvas`](crate::Canvas) orders its top-level paints: index 0 is drawn
/// first. The scene's transform, opacity and clip apply to every child.
///
/// Scenes have no backend, so pushing or reordering children does not
/// prepare anything. Children pushed after the scene itself was pushed
/// into a canvas must be prepared with [`Canvas::update`](crate::Canvas::update)
/// before the next draw.
#[derive(Debug)]
pub struct Scene {
    id: u64,
    paints: PaintList,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            id: next_content_id(),
            paints: PaintList::new(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Takes ownership of `paint`, placing it above every other child.
    ///
    /// Fails with [`Error::Corruption`](crate::Error::Corruption) if the
    /// paint is invalid, leaving the scene unchanged.
    pub fn push(&mut self, paint: impl Into<Paint>) -> Result<PaintId> {
        self.paints.push(paint.into())
    }

    pub fn reserve(&mut self, additional: usize) {
        self.paints.reserve(additional);
    }

    pub fn len(&self) -> usize {
        self.paints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paints.is_empty()
    }

    pub fn contains(&self, id: PaintId) -> bool {
        self.paints.contains(id)
    }

    /// Ids of the children in draw order, bottom first.
    pub fn ids(&self) -> impl Iterator<Item = PaintId> + '_ {
        self.paints.ids()
    }

    /// Children in draw order, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = &Paint> + '_ {
        self.paints.iter()
    }

    pub fn get(&self, id: PaintId) -> Option<&Paint> {
        self.paints.get(id)
    }

    pub fn get_mut(&mut self, id: PaintId) -> Option<&mut Paint> {
        self.paints.get_mut(id)
    }

    /// Moves a child to the top.
    pub fn raise(&mut self, id: PaintId) -> Result<()> {
        self.paints.raise(id)
    }

    /// Moves a child to the bottom.
    pub fn lower(&mut self, id: PaintId) -> Result<()> {
        self.paints.lower(id)
    }

    /// Moves `id` directly above `reference`.
    pub fn move_above(&mut self, id: PaintId, reference: PaintId) -> Result<()> {
        self.paints.move_above(id, reference)
    }

    /// Moves `id` directly below `reference`.
    pub fn move_below(&mut self, id: PaintId, reference: PaintId) -> Result<()> {
        self.paints.move_below(id, reference)
    }

    pub(crate) fn paints(&self) -> &PaintList {
        &self.paints
    }

    pub(crate) fn paints_mut(&mut self) -> &mut PaintList {
        &mut self.paints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, ErrorKind, Image, Shape};

    fn colored(r: u8, g: u8, b: u8) -> Shape {
        let mut shape = Shape::new();
        shape
            .append_circle(0., 0., 10., 10.)
            .set_fill(Color::rgb(r, g, b));
        shape
    }

    fn fills(scene: &Scene) -> Vec<Color> {
        scene
            .iter()
            .filter_map(|paint| paint.as_shape().and_then(Shape::fill))
            .collect()
    }

    #[test]
    fn reorders_children() {
        let blue = Color::rgb(0, 0, 255);
        let red = Color::rgb(255, 0, 0);
        let green = Color::rgb(0, 255, 0);

        let mut scene = Scene::new();
        let b = scene.push(colored(0, 0, 255)).unwrap();
        let r = scene.push(colored(255, 0, 0)).unwrap();
        let g = scene.push(colored(0, 255, 0)).unwrap();

        scene.raise(b).unwrap();
        assert_eq!(fills(&scene), vec![red, green, blue]);
        scene.lower(g).unwrap();
        assert_eq!(fills(&scene), vec![green, red, blue]);
        scene.move_below(b, r).unwrap();
        assert_eq!(fills(&scene), vec![green, blue, red]);
        scene.move_above(g, r).unwrap();
        assert_eq!(fills(&scene), vec![blue, red, green]);
    }

    #[test]
    fn invalid_children_are_rejected() {
        let mut scene = Scene::new();
        scene.push(colored(1, 2, 3)).unwrap();
        let err = scene.push(Image::new(4, 4, vec![0; 3])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corruption);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn ids_from_other_scenes_are_not_found() {
        let mut a = Scene::new();
        let mut b = Scene::new();
        let a1 = a.push(Shape::new()).unwrap();
        let b1 = b.push(Shape::new()).unwrap();
        assert!(!a.contains(b1));
        assert_eq!(a.raise(b1).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(a.move_above(a1, b1).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(a.ids().collect::<Vec<_>>(), vec![a1]);
    }
}
