/// Vertex structs that describe their own layout.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use super::vertex_declaration::VertexDeclaration;
use super::vertex_element::{VertexElement, VertexElementFormat, VertexElementUsage};

/// A plain-data vertex type exposing its VertexDeclaration
///
/// Returning `None` means the type has no usable layout;
/// `VertexDeclaration::from_type` reports that as `InvalidLayout`.
pub trait VertexType: Pod {
    fn vertex_declaration() -> Option<VertexDeclaration>;
}

/// Position only
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VertexPosition {
    pub position: Vec3,
}

impl VertexPosition {
    pub const ELEMENTS: [VertexElement; 1] = [
        VertexElement::new(0, VertexElementFormat::Vector3, VertexElementUsage::Position, 0),
    ];

    pub fn new(position: Vec3) -> Self {
        Self { position }
    }
}

impl VertexType for VertexPosition {
    fn vertex_declaration() -> Option<VertexDeclaration> {
        VertexDeclaration::get_or_create(12, &Self::ELEMENTS).ok()
    }
}

/// Position + packed RGBA color
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VertexPositionColor {
    pub position: Vec3,
    pub color: [u8; 4],
}

impl VertexPositionColor {
    pub const ELEMENTS: [VertexElement; 2] = [
        VertexElement::new(0, VertexElementFormat::Vector3, VertexElementUsage::Position, 0),
        VertexElement::new(12, VertexElementFormat::Color, VertexElementUsage::Color, 0),
    ];

    pub fn new(position: Vec3, color: [u8; 4]) -> Self {
        Self { position, color }
    }
}

impl VertexType for VertexPositionColor {
    fn vertex_declaration() -> Option<VertexDeclaration> {
        VertexDeclaration::get_or_create(16, &Self::ELEMENTS).ok()
    }
}

/// Position + texture coordinate (20 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VertexPositionTexture {
    pub position: Vec3,
    pub texture_coordinate: Vec2,
}

impl VertexPositionTexture {
    pub const ELEMENTS: [VertexElement; 2] = [
        VertexElement::new(0, VertexElementFormat::Vector3, VertexElementUsage::Position, 0),
        VertexElement::new(12, VertexElementFormat::Vector2, VertexElementUsage::TextureCoordinate, 0),
    ];

    pub fn new(position: Vec3, texture_coordinate: Vec2) -> Self {
        Self { position, texture_coordinate }
    }
}

impl VertexType for VertexPositionTexture {
    fn vertex_declaration() -> Option<VertexDeclaration> {
        VertexDeclaration::get_or_create(20, &Self::ELEMENTS).ok()
    }
}

/// Position + normal + texture coordinate (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VertexPositionNormalTexture {
    pub position: Vec3,
    pub normal: Vec3,
    pub texture_coordinate: Vec2,
}

impl VertexPositionNormalTexture {
    pub const ELEMENTS: [VertexElement; 3] = [
        VertexElement::new(0, VertexElementFormat::Vector3, VertexElementUsage::Position, 0),
        VertexElement::new(12, VertexElementFormat::Vector3, VertexElementUsage::Normal, 0),
        VertexElement::new(24, VertexElementFormat::Vector2, VertexElementUsage::TextureCoordinate, 0),
    ];

    pub fn new(position: Vec3, normal: Vec3, texture_coordinate: Vec2) -> Self {
        Self { position, normal, texture_coordinate }
    }
}

impl VertexType for VertexPositionNormalTexture {
    fn vertex_declaration() -> Option<VertexDeclaration> {
        VertexDeclaration::get_or_create(32, &Self::ELEMENTS).ok()
    }
}

/// Position + color + texture coordinate (24 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VertexPositionColorTexture {
    pub position: Vec3,
    pub color: [u8; 4],
    pub texture_coordinate: Vec2,
}

impl VertexPositionColorTexture {
    pub const ELEMENTS: [VertexElement; 3] = [
        VertexElement::new(0, VertexElementFormat::Vector3, VertexElementUsage::Position, 0),
        VertexElement::new(12, VertexElementFormat::Color, VertexElementUsage::Color, 0),
        VertexElement::new(16, VertexElementFormat::Vector2, VertexElementUsage::TextureCoordinate, 0),
    ];

    pub fn new(position: Vec3, color: [u8; 4], texture_coordinate: Vec2) -> Self {
        Self { position, color, texture_coordinate }
    }
}

impl VertexType for VertexPositionColorTexture {
    fn vertex_declaration() -> Option<VertexDeclaration> {
        VertexDeclaration::get_or_create(24, &Self::ELEMENTS).ok()
    }
}
