//! Immutable model assets referenced by [`StaticMesh`](crate::StaticMesh).
//!
//! Loading is external; a model here is just named submeshes with their
//! local-space bounds, which is all culling and CPU picking need.

use std::borrow::Cow;

use glam::Vec3;
use toy_core::BoundingBox;

#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub name: Cow<'static, str>,
    pub bounds: BoundingBox,
}

impl SubMesh {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, bounds: BoundingBox) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    name: Cow<'static, str>,
    submeshes: Vec<SubMesh>,
    bounds: BoundingBox,
}

impl Model {
    /// Builds a model from its submeshes. The aggregate bounds are the union
    /// of the submesh bounds (a degenerate box at the origin when empty).
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, submeshes: Vec<SubMesh>) -> Self {
        let bounds = submeshes
            .iter()
            .map(|s| s.bounds)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or(BoundingBox::new(Vec3::ZERO, Vec3::ZERO));

        Self {
            name: name.into(),
            submeshes,
            bounds,
        }
    }

    /// Single-submesh cube centered at the origin.
    #[must_use]
    pub fn cube(name: impl Into<Cow<'static, str>>, half_extent: f32) -> Self {
        let name = name.into();
        let submesh = SubMesh::new(
            name.clone(),
            BoundingBox::from_half_extents(Vec3::splat(half_extent)),
        );
        Self::new(name, vec![submesh])
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    #[inline]
    #[must_use]
    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    #[inline]
    #[must_use]
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }
}
