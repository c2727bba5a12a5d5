//! Bounds Pass
//!
//! Draws every visible submesh as its oriented bounding box, twice:
//! - into the entity-ID target, writing the entity index per pixel
//! - into the surface as a flat-shaded preview
//!
//! The skybox and camera proxies write [`SENTINEL_ID`].

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use toy_scene::{DrawItem, MeshFlags, SENTINEL_ID, Scene};
use wgpu::util::DeviceExt;

use crate::entity_id::EntityIdTarget;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Instance {
    model: [[f32; 4]; 4],
    entity_id: u32,
    _pad: [u32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
}

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    2 => Float32x4,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Uint32,
];

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

/// Unit cube centered at the origin, 36 vertices with face normals.
fn unit_cube() -> Vec<Vertex> {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::Z, Vec3::NEG_X),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::X, Vec3::NEG_Y),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let center = normal * 0.5;
        let corner = |su: f32, sv: f32| Vertex {
            position: (center + u * (0.5 * su) + v * (0.5 * sv)).to_array(),
            normal: normal.to_array(),
        };
        let quad = [
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ];
        vertices.extend_from_slice(&[quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
    }
    vertices
}

fn instance_for(item: &DrawItem<'_>, entity_id: u32) -> Instance {
    let bounds = &item.submesh.bounds;
    let local = Mat4::from_scale_rotation_translation(
        bounds.size().max(Vec3::splat(1e-4)),
        glam::Quat::IDENTITY,
        bounds.center(),
    );
    Instance {
        model: (Mat4::from(item.world) * local).to_cols_array_2d(),
        entity_id,
        _pad: [0; 3],
    }
}

/// Opaque depth test shared by both pipelines.
fn depth_state(format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format,
        depth_write_enabled: Some(true),
        depth_compare: Some(wgpu::CompareFunction::Less),
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub struct BoundsPass {
    id_pipeline: wgpu::RenderPipeline,
    preview_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instances: Vec<Instance>,
}

impl BoundsPass {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        id_target: &EntityIdTarget,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bounds Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/bounds.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bounds Globals Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bounds Globals"),
            contents: bytemuck::bytes_of(&Globals {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bounds Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bounds Pipeline Layout"),
            bind_group_layouts: &[Some(&globals_layout)],
            immediate_size: 0,
        });

        let id_pipeline = Self::create_pipeline(
            device,
            &layout,
            &shader,
            "fs_entity_id",
            id_target.format(),
            id_target.depth_format(),
        );
        let preview_pipeline = Self::create_pipeline(
            device,
            &layout,
            &shader,
            "fs_preview",
            color_format,
            id_target.depth_format(),
        );

        let cube = unit_cube();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bounds Cube"),
            contents: bytemuck::cast_slice(&cube),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_capacity = 64;
        let instance_buffer = Self::create_instance_buffer(device, instance_capacity);

        Self {
            id_pipeline,
            preview_pipeline,
            globals_buffer,
            globals_bind_group,
            vertex_buffer,
            vertex_count: cube.len() as u32,
            instance_buffer,
            instance_capacity,
            instances: Vec::new(),
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        fragment_entry: &str,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(fragment_entry),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRIBUTES,
                    },
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // The camera sits inside the skybox box.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(depth_format)),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bounds Instances"),
            size: (capacity * std::mem::size_of::<Instance>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Collects the visible draw items of `scene` and uploads them together
    /// with `view_proj`. Uses the lists of the last culling pass.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        view_proj: Mat4,
    ) {
        self.instances.clear();

        let instances = &mut self.instances;
        scene.render_skybox(&mut |item: &DrawItem<'_>| {
            instances.push(instance_for(item, SENTINEL_ID));
        });
        scene.render_static_mesh(&mut |item: &DrawItem<'_>| {
            let id = if item.flags.contains(MeshFlags::CAMERA) {
                SENTINEL_ID
            } else {
                item.entity.id()
            };
            instances.push(instance_for(item, id));
        });

        if self.instances.len() > self.instance_capacity {
            self.instance_capacity = self.instances.len().next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(device, self.instance_capacity);
            log::debug!("Bounds instance buffer grown to {}", self.instance_capacity);
        }

        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals {
                view_proj: view_proj.to_cols_array_2d(),
            }),
        );
        if !self.instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
        }
    }

    /// Encodes the entity-ID pass and the preview pass. The preview shares the
    /// ID target's depth attachment, so `color_view` must match its size.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        id_target: &EntityIdTarget,
        color_view: &wgpu::TextureView,
        clear_color: wgpu::Color,
    ) {
        self.draw(
            encoder,
            "Entity ID Pass",
            &self.id_pipeline,
            id_target.view(),
            id_target.depth_view(),
            wgpu::Color::TRANSPARENT,
        );
        self.draw(
            encoder,
            "Preview Pass",
            &self.preview_pipeline,
            color_view,
            id_target.depth_view(),
            clear_color,
        );
    }

    fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        clear: wgpu::Color,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if self.instances.is_empty() {
            return;
        }

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..self.instances.len() as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_spans_half_extents() {
        let cube = unit_cube();
        assert_eq!(cube.len(), 36);
        for v in &cube {
            for c in v.position {
                assert!((c.abs() - 0.5).abs() < 1e-6, "corner component {c} is not +-0.5");
            }
        }
    }

    #[test]
    fn depth_test_writes_and_keeps_nearest() {
        let state = depth_state(wgpu::TextureFormat::Depth32Float);
        assert_eq!(state.depth_write_enabled, Some(true));
        assert_eq!(state.depth_compare, Some(wgpu::CompareFunction::Less));
        assert!(!state.stencil.is_enabled());
    }

    #[test]
    fn instance_layout_is_vertex_friendly() {
        assert_eq!(std::mem::size_of::<Instance>(), 80);
        assert_eq!(INSTANCE_ATTRIBUTES[4].offset, 64);
    }
}
