//! Picking System
//!
//! GPU-readback entity picking. Each update (while the primary button is held
//! and no gizmo drag is active):
//!
//! 1. map the pointer into viewport-local space, rejecting positions outside
//!    `[0, width) x [0, height)`
//! 2. reallocate the staging resource if the entity-ID target size drifted
//! 3. copy the target into staging, map it (blocking) and unpack it row by
//!    row honoring the row pitch
//! 4. read the id under the pointer and update the selection
//!
//! The staging resource follows a small state machine:
//!
//! ```text
//! Uninitialized ──first pick──▶ Sized(w, h) ──target resized──▶ Sized(w', h')
//! ```
//!
//! Reallocation is lazy: only a size change triggers it.

use glam::Vec2;
use toy_core::{Result, Subsystem, SubsystemSlot, ToyError};
use toy_render::{EntityIdReadback, unpack_rows};
use toy_scene::{Entity, Scene, is_reserved_id};

use crate::editing::EditingSystem;
use crate::input::{Input, MouseButton};

/// Screen-space rectangle of the scene viewport. `origin` is the top-left
/// corner in window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Viewport {
    #[must_use]
    pub const fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Viewport covering a whole `width` x `height` window.
    #[must_use]
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width as f32, height as f32))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingState {
    Uninitialized,
    Sized { width: u32, height: u32 },
}

/// Result of one [`PickingSystem::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// No pick this frame: button up, gizmo drag, pointer outside the viewport.
    Skipped,
    /// Background, sentinel, or a stale id was under the pointer.
    Clear,
    Select(Entity),
}

pub struct PickingSystem {
    staging: StagingState,
    allocations: u32,
    pixels: Vec<u32>,
}

impl Subsystem for PickingSystem {
    const SLOT: SubsystemSlot = SubsystemSlot::Picking;
}

impl Default for PickingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl PickingSystem {
    #[must_use]
    pub fn new() -> Self {
        Self {
            staging: StagingState::Uninitialized,
            allocations: 0,
            pixels: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn staging_state(&self) -> StagingState {
        self.staging
    }

    /// How many times the staging resource has been (re)allocated.
    #[inline]
    #[must_use]
    pub fn staging_allocations(&self) -> u32 {
        self.allocations
    }

    /// Viewport-local position of `pointer`, or `None` outside the viewport.
    /// The right and bottom edges are excluded.
    #[must_use]
    pub fn map_pointer(viewport: &Viewport, pointer: Vec2) -> Option<Vec2> {
        let local = pointer - viewport.origin;
        let inside = local.x >= 0.0
            && local.y >= 0.0
            && local.x < viewport.size.x
            && local.y < viewport.size.y;
        inside.then_some(local)
    }

    pub fn update(
        &mut self,
        input: &Input,
        viewport: &Viewport,
        readback: &mut dyn EntityIdReadback,
        scene: &Scene,
        editing: &mut EditingSystem,
    ) -> Result<PickOutcome> {
        if editing.is_manipulating() || !input.get_mouse_button(MouseButton::Left) {
            return Ok(PickOutcome::Skipped);
        }

        let Some(local) = Self::map_pointer(viewport, input.mouse_position()) else {
            return Ok(PickOutcome::Skipped);
        };

        let (width, height) = readback.target_size();
        if width == 0 || height == 0 {
            return Ok(PickOutcome::Skipped);
        }

        self.ensure_staging(readback, width, height)?;
        readback.copy_target_to_staging()?;

        let pixels = &mut self.pixels;
        let mut unpacked = Err(ToyError::ReadbackFailed(
            "staging buffer was never handed to the reader".into(),
        ));
        readback.read_staging(&mut |bytes, row_pitch| {
            unpacked = unpack_rows(bytes, row_pitch, width, height, pixels);
        })?;
        unpacked?;

        // The UI viewport and the target may differ in size.
        let x = ((local.x * width as f32 / viewport.size.x) as u32).min(width - 1);
        let y = ((local.y * height as f32 / viewport.size.y) as u32).min(height - 1);
        let index = (y * width + x) as usize;
        let Some(&id) = self.pixels.get(index) else {
            return Err(ToyError::ReadbackFailed(format!(
                "pixel ({x}, {y}) is outside the {} unpacked ids",
                self.pixels.len()
            )));
        };

        if is_reserved_id(id) {
            editing.unselect();
            return Ok(PickOutcome::Clear);
        }

        Ok(match editing.select(scene, id) {
            Some(entity) => PickOutcome::Select(entity),
            None => {
                log::debug!("Picked id {id} does not resolve to a live entity");
                PickOutcome::Clear
            }
        })
    }

    fn ensure_staging(
        &mut self,
        readback: &mut dyn EntityIdReadback,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let wanted = StagingState::Sized { width, height };
        if self.staging == wanted {
            return Ok(());
        }

        readback.recreate_staging(width, height)?;
        self.staging = wanted;
        self.allocations += 1;
        log::debug!("Picking staging reallocated to {width}x{height}");
        Ok(())
    }
}

impl std::fmt::Debug for PickingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickingSystem")
            .field("staging", &self.staging)
            .field("allocations", &self.allocations)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(Vec2::new(10.0, 20.0), Vec2::new(100.0, 50.0))
    }

    #[test]
    fn pointer_is_made_viewport_local() {
        let local = PickingSystem::map_pointer(&viewport(), Vec2::new(15.0, 30.0));
        assert_eq!(local, Some(Vec2::new(5.0, 10.0)));
    }

    #[test]
    fn right_and_bottom_edges_are_outside() {
        let vp = viewport();
        assert!(PickingSystem::map_pointer(&vp, Vec2::new(110.0, 20.0)).is_none());
        assert!(PickingSystem::map_pointer(&vp, Vec2::new(10.0, 70.0)).is_none());
        assert!(PickingSystem::map_pointer(&vp, Vec2::new(109.9, 69.9)).is_some());
        assert!(PickingSystem::map_pointer(&vp, Vec2::new(9.9, 20.0)).is_none());
    }
}
