use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::model::Model;

bitflags! {
    /// Marker flags of a [`StaticMesh`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeshFlags: u8 {
        /// Drawn by the skybox pass only.
        const SKYBOX      = 1 << 0;
        /// Visual proxy of a camera; never casts shadows.
        const CAMERA      = 1 << 1;
        const CAST_SHADOW = 1 << 2;
    }
}

/// Reference to an immutable [`Model`] plus last-culled visibility.
///
/// `submodel_in_frustum` is resized by each culling pass to the model's
/// submesh count, so it is only meaningful after the first pass.
#[derive(Debug, Clone)]
pub struct StaticMesh {
    pub model: Arc<Model>,
    pub submodel_in_frustum: SmallVec<[bool; 8]>,
    pub in_frustum: bool,
    pub flags: MeshFlags,
}

impl StaticMesh {
    #[must_use]
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            submodel_in_frustum: SmallVec::new(),
            in_frustum: false,
            flags: MeshFlags::CAST_SHADOW,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MeshFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_skybox(&self) -> bool {
        self.flags.contains(MeshFlags::SKYBOX)
    }

    #[inline]
    #[must_use]
    pub fn is_camera(&self) -> bool {
        self.flags.contains(MeshFlags::CAMERA)
    }
}
