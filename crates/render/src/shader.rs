//! Versioned shader templates with named insertion points.
//!
//! A template marks each insertion point with a line of the form
//! `//#hook <name>`. Injected code is placed directly after the marker, and
//! the marker is kept so later patches can compose at the same point.

use std::fmt;

pub const HOOK_PREFIX: &str = "//#hook ";

/// Named insertion points a vertex-stage template can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Module scope, after the template's own bindings.
    Declarations,
    /// Inside the vertex input struct.
    VertexAttributes,
    /// In the vertex entry point, after `var transformed` holds the input
    /// position and before any further transform. `vertex` names the input.
    BeginVertex,
}

impl Hook {
    pub fn name(self) -> &'static str {
        match self {
            Hook::Declarations => "declarations",
            Hook::VertexAttributes => "vertex_attributes",
            Hook::BeginVertex => "begin_vertex",
        }
    }

    pub const ALL: [Hook; 3] = [Hook::Declarations, Hook::VertexAttributes, Hook::BeginVertex];
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShaderError {
    #[error("template `{template}` has no `{hook}` hook")]
    MissingHook { template: String, hook: Hook },
    #[error("template `{template}` declares `{hook}` more than once")]
    DuplicateHook { template: String, hook: Hook },
    #[error("template `{template}` is v{found}, patch expects v{expected}")]
    VersionMismatch {
        template: String,
        found: u32,
        expected: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderTemplate {
    name: String,
    version: u32,
    source: String,
}

impl ShaderTemplate {
    /// Wrap `source`, rejecting templates that repeat a hook marker.
    pub fn new(name: &str, version: u32, source: &str) -> Result<Self, ShaderError> {
        let template = Self {
            name: name.to_string(),
            version,
            source: source.to_string(),
        };
        for hook in Hook::ALL {
            if template.marker_lines(hook).count() > 1 {
                return Err(ShaderError::DuplicateHook {
                    template: template.name,
                    hook,
                });
            }
        }
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    fn marker_lines(&self, hook: Hook) -> impl Iterator<Item = &str> {
        self.source
            .lines()
            .filter(move |line| line.trim() == format!("{HOOK_PREFIX}{}", hook.name()))
    }

    pub fn has_hook(&self, hook: Hook) -> bool {
        self.marker_lines(hook).next().is_some()
    }

    /// Insert `code` on the lines following `hook`'s marker, matching the
    /// marker's indentation.
    pub fn inject(&mut self, hook: Hook, code: &str) -> Result<(), ShaderError> {
        let marker = format!("{HOOK_PREFIX}{}", hook.name());
        let mut out = String::with_capacity(self.source.len() + code.len() + 64);
        let mut found = false;
        for line in self.source.lines() {
            out.push_str(line);
            out.push('\n');
            if line.trim() == marker {
                found = true;
                let indent = &line[..line.len() - line.trim_start().len()];
                for code_line in code.lines() {
                    if !code_line.trim().is_empty() {
                        out.push_str(indent);
                        out.push_str(code_line);
                    }
                    out.push('\n');
                }
            }
        }
        if !found {
            return Err(ShaderError::MissingHook {
                template: self.name.clone(),
                hook,
            });
        }
        self.source = out;
        Ok(())
    }
}

/// Injects the infinite-scroll displacement into a grid vertex stage.
///
/// The patch declares a `GridScroll { time, speed, size }` uniform at
/// `@group(1) @binding(0)` and a per-vertex `moveable: f32` at
/// `@location(2)`. Vertices with the flag set get
/// `z' = mod((z - start) + time * speed, size) + start` with `start = -size/2`.
pub struct GridShaderPatcher;

impl GridShaderPatcher {
    /// Template version this patch is written against.
    pub const TEMPLATE_VERSION: u32 = 1;

    const DECLARATIONS: &'static str = r#"struct GridScroll {
    time: f32,
    speed: f32,
    size: f32,
    _pad: f32,
};

@group(1) @binding(0)
var<uniform> scroll: GridScroll;"#;

    const ATTRIBUTES: &'static str = "@location(2) moveable: f32,";

    const DISPLACEMENT: &'static str = r#"if (floor(vertex.moveable + 0.1) > 0.5) {
    let start = scroll.size * -0.5;
    let shifted = (vertex.position.z - start) + scroll.time * scroll.speed;
    let wrapped = shifted - scroll.size * floor(shifted / scroll.size);
    transformed.z = select(wrapped, 0.0, wrapped < 0.0 || wrapped >= scroll.size) + start;
}"#;

    pub fn patch(mut template: ShaderTemplate) -> Result<ShaderTemplate, ShaderError> {
        if template.version != Self::TEMPLATE_VERSION {
            return Err(ShaderError::VersionMismatch {
                template: template.name,
                found: template.version,
                expected: Self::TEMPLATE_VERSION,
            });
        }
        for hook in Hook::ALL {
            if !template.has_hook(hook) {
                return Err(ShaderError::MissingHook {
                    template: template.name,
                    hook,
                });
            }
        }
        template.inject(Hook::Declarations, Self::DECLARATIONS)?;
        template.inject(Hook::VertexAttributes, Self::ATTRIBUTES)?;
        template.inject(Hook::BeginVertex, Self::DISPLACEMENT)?;
        tracing::info!(template = template.name(), "grid scroll patch applied");
        tracing::debug!("patched grid shader:\n{}", template.source());
        Ok(template)
    }
}
