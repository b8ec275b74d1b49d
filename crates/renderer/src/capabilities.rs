//! Device capability resolution.
//!
//! The renderer needs five things from the device before any asset is loaded.
//! They are resolved in a fixed order and the first one that is missing stops
//! resolution with an error naming it, so callers can report exactly what the
//! device lacks instead of failing somewhere inside pipeline creation.

use std::fmt;

use crate::geometry::BoxVertex;

/// Size in bytes of the scene uniform block (model-view-projection + color).
pub const UNIFORM_BLOCK_SIZE: u64 = (16 + 4) * 4;

/// Vertex attributes consumed per box vertex: position, texcoord, light vector.
pub const VERTEX_ATTRIBUTES: u64 = 3;

/// A named device requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Room for separate program-parameter and texture bind groups.
    ProgramObjects,
    /// At least one uniform buffer visible to each program stage.
    ProgramBinding,
    /// Uniform bindings large enough for the scene parameter block.
    ProgramUpload,
    /// At least one sampled texture and sampler per stage.
    TextureUnits,
    /// Enough vertex attributes for the primary and secondary coordinates.
    MultiTexCoords,
}

impl Capability {
    /// Resolution order.
    pub const ALL: [Capability; 5] = [
        Capability::ProgramObjects,
        Capability::ProgramBinding,
        Capability::ProgramUpload,
        Capability::TextureUnits,
        Capability::MultiTexCoords,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Capability::ProgramObjects => "program-objects",
            Capability::ProgramBinding => "program-binding",
            Capability::ProgramUpload => "program-upload",
            Capability::TextureUnits => "texture-units",
            Capability::MultiTexCoords => "multi-texcoords",
        }
    }

    /// Minimum value the probe must report for this capability.
    pub fn required(self) -> u64 {
        match self {
            Capability::ProgramObjects => 2,
            Capability::ProgramBinding => 1,
            Capability::ProgramUpload => UNIFORM_BLOCK_SIZE,
            Capability::TextureUnits => 1,
            Capability::MultiTexCoords => VERTEX_ATTRIBUTES,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of capability readings, usually a device's limits.
pub trait CapabilityProbe {
    /// Amount of `capability` the device provides.
    fn available(&self, capability: Capability) -> u64;
    /// Largest texture edge the device accepts.
    fn max_texture_dimension(&self) -> u32;
}

impl CapabilityProbe for wgpu::Limits {
    fn available(&self, capability: Capability) -> u64 {
        match capability {
            Capability::ProgramObjects => u64::from(self.max_bind_groups),
            Capability::ProgramBinding => u64::from(self.max_uniform_buffers_per_shader_stage),
            Capability::ProgramUpload => u64::from(self.max_uniform_buffer_binding_size),
            Capability::TextureUnits => u64::from(
                self.max_sampled_textures_per_shader_stage
                    .min(self.max_samplers_per_shader_stage),
            ),
            Capability::MultiTexCoords => {
                let stride = std::mem::size_of::<BoxVertex>() as u32;
                if self.max_vertex_buffer_array_stride < stride {
                    0
                } else {
                    u64::from(self.max_vertex_attributes)
                }
            }
        }
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension_2d
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("device lacks capability '{capability}': requires {required}, found {available}")]
pub struct MissingCapability {
    pub capability: Capability,
    pub required: u64,
    pub available: u64,
}

/// Resolved capability table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    resolved: [(Capability, u64); 5],
    max_texture_dimension: u32,
}

impl Capabilities {
    /// Resolves every capability in order, stopping at the first missing one.
    pub fn resolve<P: CapabilityProbe + ?Sized>(probe: &P) -> Result<Self, MissingCapability> {
        let mut resolved = [(Capability::ProgramObjects, 0); 5];
        for (slot, capability) in resolved.iter_mut().zip(Capability::ALL) {
            let available = probe.available(capability);
            let required = capability.required();
            if available < required {
                return Err(MissingCapability {
                    capability,
                    required,
                    available,
                });
            }
            *slot = (capability, available);
        }

        Ok(Self {
            resolved,
            max_texture_dimension: probe.max_texture_dimension(),
        })
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    /// Resolved amount for `capability`.
    pub fn get(&self, capability: Capability) -> u64 {
        self.resolved
            .iter()
            .find(|(resolved, _)| *resolved == capability)
            .map(|(_, amount)| *amount)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, u64)> + '_ {
        self.resolved.iter().copied()
    }
}
