use std::borrow::Cow;
use std::mem::{offset_of, size_of};

use wgpu::util::DeviceExt;

use crate::compile::{ShaderProgram, UniformSlot};
use crate::error::{HostError, ShaderStageKind};

use super::uniforms::ShaderUniforms;

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

/// Render pipeline plus the uniform buffer and bind group it reads.
pub(crate) struct QuadPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
}

impl QuadPipeline {
    /// Instantiates `program` on the device.
    ///
    /// Module creation errors surface as [`HostError::ShaderCompile`];
    /// pipeline creation errors (stage interface, layout) surface as
    /// [`HostError::ShaderLink`].
    pub fn new(
        device: &wgpu::Device,
        program: &ShaderProgram,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self, HostError> {
        check_uniform_mirror(program)?;

        let vertex_module = create_module(
            device,
            ShaderStageKind::Vertex,
            program.vertex_glsl(),
            "quad vertex shader",
        )?;
        let fragment_module = create_module(
            device,
            ShaderStageKind::Fragment,
            program.fragment_glsl(),
            "pattern fragment shader",
        )?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: size_of::<ShaderUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pattern pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("pattern pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[quad_buffer_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(HostError::link(error.to_string()));
        }

        tracing::debug!(?surface_format, "created pattern pipeline");
        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
        })
    }
}

/// Uploads the quad as a vertex buffer.
pub(crate) fn create_quad_buffer(device: &wgpu::Device, vertices: &[[f32; 2]]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("fullscreen quad"),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

fn quad_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: size_of::<[f32; 2]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &QUAD_ATTRIBUTES,
    }
}

fn create_module(
    device: &wgpu::Device,
    stage: ShaderStageKind,
    source: &str,
    label: &str,
) -> Result<wgpu::ShaderModule, HostError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_owned()),
            stage: stage.to_naga(),
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(HostError::compile(stage, error.to_string())),
        None => Ok(module),
    }
}

/// The GPU backend writes whole [`ShaderUniforms`] blocks, so the reflected
/// offsets must agree with the CPU mirror.
fn check_uniform_mirror(program: &ShaderProgram) -> Result<(), HostError> {
    let locations = program.uniforms();
    for location in [locations.resolution, locations.time] {
        let expected = match location.slot {
            UniformSlot::Resolution => offset_of!(ShaderUniforms, i_resolution),
            UniformSlot::Time => offset_of!(ShaderUniforms, i_time),
        } as u32;
        if location.offset != expected {
            return Err(HostError::link(format!(
                "uniform {:?} reflected at offset {}, uniform buffer expects {expected}",
                location.slot, location.offset
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::ProgramSource;

    #[test]
    fn pattern_program_matches_uniform_mirror() {
        let program = ShaderProgram::build(&ProgramSource::pattern()).expect("program");
        check_uniform_mirror(&program).expect("offsets agree");
    }

    #[test]
    fn quad_layout_is_tightly_packed_vec2() {
        let layout = quad_buffer_layout();
        assert_eq!(layout.array_stride, 8);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
    }
}
