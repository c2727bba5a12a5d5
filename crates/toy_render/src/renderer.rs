use glam::Mat4;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use toy_core::{Result, ToyError};
use toy_scene::Scene;

use crate::bounds_pass::BoundsPass;
use crate::context::WgpuContext;
use crate::entity_id::EntityIdTarget;
use crate::readback::WgpuEntityIdReadback;
use crate::settings::RendererSettings;

/// What a frame does with the outcome of acquiring the surface texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Acquired {
    Present,
    PresentThenReconfigure,
    Reconfigure,
    Skip,
    Fail,
}

fn classify(current: &wgpu::CurrentSurfaceTexture) -> Acquired {
    use wgpu::CurrentSurfaceTexture as C;
    match current {
        C::Success(_) => Acquired::Present,
        C::Suboptimal(_) => Acquired::PresentThenReconfigure,
        C::Lost | C::Outdated => Acquired::Reconfigure,
        C::Timeout | C::Occluded => Acquired::Skip,
        C::Validation => Acquired::Fail,
    }
}

/// Window renderer: surface, entity-ID target and the bounds pass.
///
/// The entity-ID target always matches the surface size.
pub struct Renderer {
    ctx: WgpuContext,
    readback: WgpuEntityIdReadback,
    bounds: BoundsPass,
}

impl Renderer {
    pub async fn new<W>(
        window: W,
        settings: &RendererSettings,
        width: u32,
        height: u32,
    ) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let ctx = WgpuContext::new(window, settings, width, height).await?;
        let (w, h) = ctx.size();

        let target = EntityIdTarget::new(
            &ctx.device,
            w,
            h,
            settings.entity_id_format,
            settings.depth_format,
        );
        let bounds = BoundsPass::new(&ctx.device, ctx.color_format(), &target);
        let readback = WgpuEntityIdReadback::new(ctx.device.clone(), ctx.queue.clone(), target);

        log::info!("Renderer initialized at {w}x{h}");
        Ok(Self {
            ctx,
            readback,
            bounds,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.ctx.resize(width, height);
        self.readback.resize_target(width, height);
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.ctx.size()
    }

    #[inline]
    pub fn readback_mut(&mut self) -> &mut WgpuEntityIdReadback {
        &mut self.readback
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &WgpuContext {
        &self.ctx
    }

    /// Draws the visible lists of `scene` into the entity-ID target and the
    /// surface, then presents.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped. A
    /// suboptimal one is presented, then reconfigured.
    pub fn render(&mut self, scene: &Scene, view_proj: Mat4) -> Result<()> {
        let current = self.ctx.surface.get_current_texture();
        let acquired = classify(&current);
        let output = match current {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            _ => {
                match acquired {
                    Acquired::Reconfigure => self.reconfigure_surface(),
                    Acquired::Fail => {
                        return Err(ToyError::SurfaceError(
                            "surface texture acquisition failed validation".to_string(),
                        ));
                    }
                    _ => log::debug!("Surface unavailable ({acquired:?}), skipping frame"),
                }
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.bounds
            .prepare(&self.ctx.device, &self.ctx.queue, scene, view_proj);

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        self.bounds
            .encode(&mut encoder, self.readback.target(), &view, self.ctx.clear_color);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        output.present();
        if acquired == Acquired::PresentThenReconfigure {
            self.reconfigure_surface();
        }
        Ok(())
    }

    fn reconfigure_surface(&mut self) {
        let (w, h) = self.ctx.size();
        self.ctx.resize(w, h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_surfaces_are_reconfigured_and_busy_ones_skipped() {
        use wgpu::CurrentSurfaceTexture as C;
        assert_eq!(classify(&C::Lost), Acquired::Reconfigure);
        assert_eq!(classify(&C::Outdated), Acquired::Reconfigure);
        assert_eq!(classify(&C::Timeout), Acquired::Skip);
        assert_eq!(classify(&C::Occluded), Acquired::Skip);
        assert_eq!(classify(&C::Validation), Acquired::Fail);
    }
}
