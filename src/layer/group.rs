use macroquad::prelude::{vec2, Vec2};

use crate::layer::Layer;

/// Layer holding a single background image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageLayer {
    image: Option<String>,
    size: Vec2,
    pub wrap_x: bool,
    pub wrap_y: bool,
}

impl ImageLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Image size in pixels, zero until an image is set.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub(crate) fn set_image(&mut self, image: impl Into<String>, width: u32, height: u32) {
        self.image = Some(image.into());
        self.size = vec2(width as f32, height as f32);
    }

    pub(crate) fn clear(&mut self) {
        self.image = None;
        self.size = Vec2::ZERO;
    }
}

/// Ordered container of child layers.
#[derive(Debug, Default)]
pub struct GroupLayer {
    children: Vec<Layer>,
}

impl GroupLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct children sorted by index.
    pub fn children(&self) -> &[Layer] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Layer] {
        &mut self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&Layer> {
        self.children.iter().find(|c| c.name() == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.children.iter_mut().find(|c| c.name() == name)
    }

    /// Highest index among the direct children.
    pub fn last_child_index(&self) -> Option<u32> {
        self.children.iter().map(Layer::index).max()
    }

    pub(crate) fn push(&mut self, child: Layer) {
        let pos = self
            .children
            .partition_point(|c| c.index() <= child.index());
        self.children.insert(pos, child);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Layer> {
        let pos = self.children.iter().position(|c| c.name() == name)?;
        Some(self.children.remove(pos))
    }

    pub(crate) fn take_all(&mut self) -> Vec<Layer> {
        std::mem::take(&mut self.children)
    }
}
