//! WGSL front end for the wgpu context: compile with naga and reflect each
//! stage's interface so names can be resolved to locations after linking.

use std::collections::{BTreeMap, BTreeSet};

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{
    AddressSpace, Binding, Handle, ImageClass, ImageDimension, Module, Scalar, ScalarKind, Type,
    TypeInner, VectorSize,
};

use crate::core::ShaderStage;

/// A `@location` input or output of an entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    pub name: String,
    pub location: u32,
    /// Vertex buffer format, for f32 scalars and vectors only
    pub format: Option<wgpu::VertexFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `var<uniform> m: mat4x4<f32>`
    Matrix,
    /// `texture_2d<f32>`
    Texture,
    /// Non-comparison `sampler`
    Sampler,
}

/// A global bound with `@group(0) @binding(n)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub binding: u32,
    pub kind: ResourceKind,
}

/// What one compiled stage consumes and produces
#[derive(Debug, Clone)]
pub struct StageInterface {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub inputs: Vec<Varying>,
    pub outputs: Vec<Varying>,
    pub resources: Vec<Resource>,
}

/// Parse, validate and reflect one stage. Errors are compiler diagnostics.
pub fn compile(stage: ShaderStage, source: &str) -> Result<StageInterface, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| format!("validation error: {e}"))?;

    reflect(&module, stage)
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

fn reflect(module: &Module, stage: ShaderStage) -> Result<StageInterface, String> {
    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga_stage(stage))
        .ok_or_else(|| format!("no @{stage} entry point in module"))?;

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_varyings(module, arg.ty, arg.binding.as_ref(), arg.name.as_deref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_varyings(module, result.ty, result.binding.as_ref(), None, &mut outputs);
    }

    if stage == ShaderStage::Vertex {
        if let Some(bad) = inputs.iter().find(|v| v.format.is_none()) {
            return Err(format!(
                "vertex input '{}' at @location({}) must be f32 or vecN<f32>",
                bad.name, bad.location
            ));
        }
    }

    Ok(StageInterface {
        stage,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        resources: reflect_resources(module)?,
    })
}

/// Flatten a binding or a struct of bindings into its `@location` entries
fn collect_varyings(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(Varying {
            name: name.unwrap_or_default().to_string(),
            location: *location,
            format: vertex_format(&module.types[ty].inner),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_varyings(module, member.ty, member.binding.as_ref(), member.name.as_deref(), out);
                }
            }
        }
    }
}

fn vertex_format(inner: &TypeInner) -> Option<wgpu::VertexFormat> {
    const F32: Scalar = Scalar { kind: ScalarKind::Float, width: 4 };

    match *inner {
        TypeInner::Scalar(scalar) if scalar == F32 => Some(wgpu::VertexFormat::Float32),
        TypeInner::Vector { size, scalar } if scalar == F32 => Some(match size {
            VectorSize::Bi => wgpu::VertexFormat::Float32x2,
            VectorSize::Tri => wgpu::VertexFormat::Float32x3,
            VectorSize::Quad => wgpu::VertexFormat::Float32x4,
        }),
        _ => None,
    }
}

fn reflect_resources(module: &Module) -> Result<Vec<Resource>, String> {
    let mut resources = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let Some(rb) = &var.binding else {
            continue;
        };
        let name = var.name.clone().unwrap_or_default();

        if rb.group != 0 {
            return Err(format!("resource '{}' must be in @group(0), found @group({})", name, rb.group));
        }

        let inner = &module.types[var.ty].inner;
        let kind = match (var.space, inner) {
            (
                AddressSpace::Uniform,
                TypeInner::Matrix { columns: VectorSize::Quad, rows: VectorSize::Quad, scalar },
            ) if scalar.kind == ScalarKind::Float && scalar.width == 4 => ResourceKind::Matrix,
            (
                AddressSpace::Handle,
                TypeInner::Image {
                    dim: ImageDimension::D2,
                    arrayed: false,
                    class: ImageClass::Sampled { kind: ScalarKind::Float, multi: false },
                },
            ) => ResourceKind::Texture,
            (AddressSpace::Handle, TypeInner::Sampler { comparison: false }) => ResourceKind::Sampler,
            _ => return Err(format!("resource '{}' has an unsupported type", name)),
        };

        resources.push(Resource { name, binding: rb.binding, kind });
    }

    resources.sort_by_key(|r| r.binding);
    Ok(resources)
}

/// Check that two stages fit together and merge their resources
///
/// Every fragment input must be written by the vertex stage, and a binding
/// used by both stages must have the same kind in each.
pub fn link(vertex: &StageInterface, fragment: &StageInterface) -> Result<Vec<Resource>, String> {
    let written: BTreeSet<u32> = vertex.outputs.iter().map(|v| v.location).collect();
    let mut problems = Vec::new();

    for input in &fragment.inputs {
        if !written.contains(&input.location) {
            problems.push(format!(
                "fragment input '{}' at @location({}) is not written by the vertex stage",
                input.name, input.location
            ));
        }
    }

    let mut merged: BTreeMap<u32, Resource> = BTreeMap::new();
    for resource in vertex.resources.iter().chain(&fragment.resources) {
        match merged.get(&resource.binding) {
            Some(existing) if existing.kind != resource.kind => problems.push(format!(
                "@binding({}) is {:?} '{}' in one stage and {:?} '{}' in the other",
                resource.binding, existing.kind, existing.name, resource.kind, resource.name
            )),
            Some(_) => {}
            None => {
                merged.insert(resource.binding, resource.clone());
            }
        }
    }

    if problems.is_empty() {
        Ok(merged.into_values().collect())
    } else {
        Err(problems.join("\n"))
    }
}
