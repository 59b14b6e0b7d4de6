use std::fmt;

/// Pipeline role of a shader stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }

    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub fn to_wgpu(self) -> wgpu::ShaderStages {
        match self {
            ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// WGSL source text for a single stage.
///
/// The text is borrowed for the duration of compilation only. The module must
/// contain an entry point for `stage`; other entry points are ignored.
#[derive(Debug, Copy, Clone)]
pub struct ShaderSource<'a> {
    pub stage: ShaderStage,
    pub label: Option<&'a str>,
    pub text: &'a str,
}

impl<'a> ShaderSource<'a> {
    #[inline]
    pub const fn new(stage: ShaderStage, text: &'a str) -> Self {
        Self { stage, label: None, text }
    }

    #[inline]
    pub const fn vertex(text: &'a str) -> Self {
        Self::new(ShaderStage::Vertex, text)
    }

    #[inline]
    pub const fn fragment(text: &'a str) -> Self {
        Self::new(ShaderStage::Fragment, text)
    }

    #[inline]
    pub const fn with_label(self, label: &'a str) -> Self {
        Self { label: Some(label), ..self }
    }

    /// Label used in diagnostics and GPU object names.
    ///
    /// Falls back to the stage name when no label was given.
    pub fn display_label(&self) -> &'a str {
        self.label.unwrap_or(self.stage.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_label_falls_back_to_stage_name() {
        assert_eq!(ShaderSource::vertex("").display_label(), "vertex");
        assert_eq!(ShaderSource::fragment("").display_label(), "fragment");
    }

    #[test]
    fn with_label_keeps_stage_and_text() {
        let src = ShaderSource::fragment("@fragment fn main() {}").with_label("orange.frag");
        assert_eq!(src.stage, ShaderStage::Fragment);
        assert_eq!(src.display_label(), "orange.frag");
        assert!(src.text.starts_with("@fragment"));
    }

    #[test]
    fn stage_maps_to_wgpu_visibility() {
        assert_eq!(ShaderStage::Vertex.to_wgpu(), wgpu::ShaderStages::VERTEX);
        assert_eq!(ShaderStage::Fragment.to_wgpu(), wgpu::ShaderStages::FRAGMENT);
    }
}
