use glam::Affine3A;

use crate::components::MeshFlags;
use crate::entity::Entity;
use crate::model::{Model, SubMesh};

/// One visible submesh handed to an [`Effect`].
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub entity: Entity,
    pub world: Affine3A,
    pub model: &'a Model,
    pub submesh_index: usize,
    pub submesh: &'a SubMesh,
    pub flags: MeshFlags,
}

/// Rendering capability invoked per visible submesh during traversal.
///
/// The scene decides *what* is drawn; the effect decides *how*. Any
/// `FnMut(&DrawItem)` closure is an effect.
pub trait Effect {
    fn draw(&mut self, item: &DrawItem<'_>);
}

impl<F> Effect for F
where
    F: FnMut(&DrawItem<'_>) + ?Sized,
{
    fn draw(&mut self, item: &DrawItem<'_>) {
        self(item);
    }
}
