/// Vertex element descriptors: format, semantic usage and placement

/// Data format of a single vertex element
///
/// Defines the data type and component count of one per-vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementFormat {
    /// float (4 bytes)
    Single,
    /// vec2 (8 bytes)
    Vector2,
    /// vec3 (12 bytes)
    Vector3,
    /// vec4 (16 bytes)
    Vector4,
    /// Packed RGBA8 color (4 bytes)
    Color,
    /// Four unsigned bytes (4 bytes)
    Byte4,
    /// Two signed shorts (4 bytes)
    Short2,
    /// Four signed shorts (8 bytes)
    Short4,
    /// Two normalized signed shorts (4 bytes)
    NormalizedShort2,
    /// Four normalized signed shorts (8 bytes)
    NormalizedShort4,
    /// Two half floats (4 bytes)
    HalfVector2,
    /// Four half floats (8 bytes)
    HalfVector4,
}

impl VertexElementFormat {
    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            VertexElementFormat::Single
            | VertexElementFormat::Color
            | VertexElementFormat::Byte4
            | VertexElementFormat::Short2
            | VertexElementFormat::NormalizedShort2
            | VertexElementFormat::HalfVector2 => 4,

            VertexElementFormat::Vector2
            | VertexElementFormat::Short4
            | VertexElementFormat::NormalizedShort4
            | VertexElementFormat::HalfVector4 => 8,

            VertexElementFormat::Vector3 => 12,
            VertexElementFormat::Vector4 => 16,
        }
    }
}

/// Shader semantic of a vertex element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementUsage {
    Position,
    Color,
    TextureCoordinate,
    Normal,
    Binormal,
    Tangent,
    BlendIndices,
    BlendWeight,
    Depth,
    Fog,
    PointSize,
    Sample,
    TessellateFactor,
}

/// One element of a vertex layout
///
/// `usage_index` distinguishes several elements sharing a semantic
/// (e.g. two texture coordinate sets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    /// Byte offset from the start of the vertex
    pub offset: u32,
    /// Data format
    pub format: VertexElementFormat,
    /// Semantic usage
    pub usage: VertexElementUsage,
    /// Semantic index
    pub usage_index: u32,
}

impl VertexElement {
    pub const fn new(
        offset: u32,
        format: VertexElementFormat,
        usage: VertexElementUsage,
        usage_index: u32,
    ) -> Self {
        Self { offset, format, usage, usage_index }
    }

    /// First byte past this element, `None` if it lies beyond `u32::MAX`
    pub fn end(&self) -> Option<u32> {
        self.offset.checked_add(self.format.size_bytes())
    }
}
