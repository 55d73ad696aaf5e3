use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading a shader stage. All of them are fatal at
/// startup; there is no retry path.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse shader {}:\n{message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("shader {} failed validation: {message}", path.display())]
    Validate { path: PathBuf, message: String },
    #[error("shader {} has no {stage:?} entry point", path.display())]
    MissingEntryPoint { path: PathBuf, stage: Stage },
}

/// Pipeline stage a shader file is loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// A WGSL shader stage read from disk, parsed and validated with naga.
///
/// Loading fails fast on unreadable, unparsable, or invalid sources and when
/// the file lacks an entry point for the requested stage. The contents are
/// otherwise the shader author's business.
#[derive(Debug)]
pub struct ShaderStage {
    path: PathBuf,
    source: String,
    module: naga::Module,
    entry_point: String,
}

impl ShaderStage {
    pub fn load(path: &Path, stage: Stage) -> Result<Self, ShaderError> {
        let source = fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_source(path, source, stage)
    }

    fn from_source(path: &Path, source: String, stage: Stage) -> Result<Self, ShaderError> {
        let module =
            naga::front::wgsl::parse_str(&source).map_err(|err| ShaderError::Parse {
                path: path.to_owned(),
                message: err.emit_to_string(&source),
            })?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|err| ShaderError::Validate {
                path: path.to_owned(),
                message: err.into_inner().to_string(),
            })?;

        let entry_point = module
            .entry_points
            .iter()
            .find(|ep| ep.stage == stage.to_naga())
            .map(|ep| ep.name.clone())
            .ok_or(ShaderError::MissingEntryPoint {
                path: path.to_owned(),
                stage,
            })?;

        Ok(Self {
            path: path.to_owned(),
            source,
            module,
            entry_point,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

/// Resolved location of a named uniform: byte offset and size within the
/// shader's uniform block. The analog of a classic GL uniform location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: u64,
    pub size: u64,
}

/// Reflection of a shader's `var<uniform>` block: member names mapped to
/// byte-offset slots, resolved once at program load.
///
/// A shader with no uniform block reflects to an empty block; every lookup
/// then returns the "not found" sentinel, which is a valid configuration.
#[derive(Debug, Default)]
pub struct UniformBlock {
    members: Vec<(String, UniformSlot)>,
    size: u64,
    binding: Option<(u32, u32)>,
}

impl UniformBlock {
    pub fn from_module(module: &naga::Module) -> Self {
        let Some(global) = module
            .global_variables
            .iter()
            .map(|(_, var)| var)
            .find(|var| var.space == naga::AddressSpace::Uniform)
        else {
            return Self::default();
        };

        let binding = global
            .binding
            .as_ref()
            .map(|b| (b.group, b.binding));

        let ty = &module.types[global.ty];
        let naga::TypeInner::Struct { ref members, span } = ty.inner else {
            return Self {
                members: Vec::new(),
                size: 0,
                binding,
            };
        };

        let ctx = module.to_ctx();
        let resolved = members
            .iter()
            .filter_map(|member| {
                let name = member.name.clone()?;
                let size = module.types[member.ty].inner.size(ctx) as u64;
                Some((
                    name,
                    UniformSlot {
                        offset: member.offset as u64,
                        size,
                    },
                ))
            })
            .collect();

        Self {
            members: resolved,
            size: span as u64,
            binding,
        }
    }

    /// Look up a member by name. `None` is the "not found" sentinel;
    /// uploads to it are expected to no-op.
    pub fn resolve(&self, name: &str) -> Option<UniformSlot> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, slot)| *slot)
    }

    /// Total block size in bytes (the struct's span, including padding).
    pub fn size(&self) -> u64 {
        self.size
    }

    /// `(group, binding)` of the block, when one exists.
    pub fn binding(&self) -> Option<(u32, u32)> {
        self.binding
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r#"
struct RaymarchUniforms {
    view_inv: mat4x4<f32>,
    fov_y: f32,
}

@group(0) @binding(0)
var<uniform> u: RaymarchUniforms;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return u.view_inv * vec4<f32>(uv, u.fov_y, 1.0);
}
"#;

    fn fragment_stage(source: &str) -> ShaderStage {
        ShaderStage::from_source(Path::new("test.wgsl"), source.to_owned(), Stage::Fragment)
            .expect("test shader loads")
    }

    #[test]
    fn reflects_member_offsets() {
        let stage = fragment_stage(FRAGMENT);
        let block = UniformBlock::from_module(stage.module());

        let view_inv = block.resolve("view_inv").expect("view_inv present");
        assert_eq!(view_inv.offset, 0);
        assert_eq!(view_inv.size, 64);

        let fov = block.resolve("fov_y").expect("fov_y present");
        assert_eq!(fov.offset, 64);
        assert_eq!(fov.size, 4);

        assert_eq!(block.binding(), Some((0, 0)));
        // Uniform blocks pad to 16-byte alignment.
        assert!(block.size() >= 68);
    }

    #[test]
    fn unknown_name_resolves_to_sentinel() {
        let stage = fragment_stage(FRAGMENT);
        let block = UniformBlock::from_module(stage.module());
        assert_eq!(block.resolve("resolution"), None);
    }

    #[test]
    fn shader_without_uniform_block_reflects_empty() {
        let stage = fragment_stage(
            r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#,
        );
        let block = UniformBlock::from_module(stage.module());
        assert!(block.is_empty());
        assert_eq!(block.resolve("view_inv"), None);
    }

    #[test]
    fn parse_failure_is_reported() {
        let err = ShaderStage::from_source(
            Path::new("broken.wgsl"),
            "fn oops( {".to_owned(),
            Stage::Fragment,
        )
        .unwrap_err();
        assert!(matches!(err, ShaderError::Parse { .. }));
    }

    #[test]
    fn missing_entry_point_is_reported() {
        let err = ShaderStage::from_source(
            Path::new("vertex_only.wgsl"),
            r#"
@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(0.0, 0.0, 0.0, 1.0);
}
"#
            .to_owned(),
            Stage::Fragment,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ShaderError::MissingEntryPoint {
                stage: Stage::Fragment,
                ..
            }
        ));
    }

    #[test]
    fn entry_point_name_comes_from_the_module() {
        let stage = fragment_stage(FRAGMENT);
        assert_eq!(stage.entry_point(), "fs_main");
    }
}
