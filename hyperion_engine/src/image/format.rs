/// Pixel formats and image sampling enums

/// Internal pixel format of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(non_camel_case_types)]
pub enum InternalFormat {
    #[default]
    None,

    // 8-bit unorm
    R8,
    RG8,
    RGB8,
    RGBA8,

    // 16-bit unorm
    R16,
    RG16,
    RGB16,
    RGBA16,

    // 32-bit uint
    R32,
    RG32,
    RGB32,
    RGBA32,

    // 16-bit float
    R16F,
    RG16F,
    RGB16F,
    RGBA16F,

    // 32-bit float
    R32F,
    RG32F,
    RGB32F,
    RGBA32F,

    // Swapchain-style formats
    BGRA8_UNORM,
    BGRA8_SRGB,

    // Depth
    DEPTH_16,
    DEPTH_24,
    DEPTH_32,
    DEPTH_32F,
}

/// Component layout family of an internal format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseFormat {
    None,
    R,
    RG,
    RGB,
    RGBA,
    BGRA,
    Depth,
}

impl BaseFormat {
    pub fn num_components(&self) -> u32 {
        match self {
            BaseFormat::None => 0,
            BaseFormat::R => 1,
            BaseFormat::RG => 2,
            BaseFormat::RGB => 3,
            BaseFormat::RGBA => 4,
            BaseFormat::BGRA => 4,
            BaseFormat::Depth => 1,
        }
    }
}

const FAMILY_8: [InternalFormat; 4] = [
    InternalFormat::R8,
    InternalFormat::RG8,
    InternalFormat::RGB8,
    InternalFormat::RGBA8,
];
const FAMILY_16: [InternalFormat; 4] = [
    InternalFormat::R16,
    InternalFormat::RG16,
    InternalFormat::RGB16,
    InternalFormat::RGBA16,
];
const FAMILY_32: [InternalFormat; 4] = [
    InternalFormat::R32,
    InternalFormat::RG32,
    InternalFormat::RGB32,
    InternalFormat::RGBA32,
];
const FAMILY_16F: [InternalFormat; 4] = [
    InternalFormat::R16F,
    InternalFormat::RG16F,
    InternalFormat::RGB16F,
    InternalFormat::RGBA16F,
];
const FAMILY_32F: [InternalFormat; 4] = [
    InternalFormat::R32F,
    InternalFormat::RG32F,
    InternalFormat::RGB32F,
    InternalFormat::RGBA32F,
];

impl InternalFormat {
    pub fn base_format(&self) -> BaseFormat {
        use InternalFormat::*;

        match self {
            None => BaseFormat::None,
            R8 | R16 | R32 | R16F | R32F => BaseFormat::R,
            RG8 | RG16 | RG32 | RG16F | RG32F => BaseFormat::RG,
            RGB8 | RGB16 | RGB32 | RGB16F | RGB32F => BaseFormat::RGB,
            RGBA8 | RGBA16 | RGBA32 | RGBA16F | RGBA32F => BaseFormat::RGBA,
            BGRA8_UNORM | BGRA8_SRGB => BaseFormat::BGRA,
            DEPTH_16 | DEPTH_24 | DEPTH_32 | DEPTH_32F => BaseFormat::Depth,
        }
    }

    pub fn num_components(&self) -> u32 {
        self.base_format().num_components()
    }

    pub fn is_depth(&self) -> bool {
        self.base_format() == BaseFormat::Depth
    }

    pub fn is_float(&self) -> bool {
        self.family() == Some(&FAMILY_16F)
            || self.family() == Some(&FAMILY_32F)
            || *self == InternalFormat::DEPTH_32F
    }

    /// Bytes per component (depth formats count as one component)
    pub fn bytes_per_component(&self) -> u32 {
        use InternalFormat::*;

        match self {
            None => 0,
            R8 | RG8 | RGB8 | RGBA8 | BGRA8_UNORM | BGRA8_SRGB => 1,
            R16 | RG16 | RGB16 | RGBA16 | R16F | RG16F | RGB16F | RGBA16F | DEPTH_16 => 2,
            R32 | RG32 | RGB32 | RGBA32 | R32F | RG32F | RGB32F | RGBA32F => 4,
            DEPTH_24 | DEPTH_32 | DEPTH_32F => 4,
        }
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.num_components() * self.bytes_per_component()
    }

    fn family(&self) -> Option<&'static [InternalFormat; 4]> {
        [&FAMILY_8, &FAMILY_16, &FAMILY_32, &FAMILY_16F, &FAMILY_32F]
            .into_iter()
            .find(|family| family.contains(self))
    }

    /// Same numeric family with `num_components` components
    ///
    /// `0` yields `None`; other counts are clamped to 1..=4. BGRA formats move
    /// into the 8-bit family when fewer than four components are requested.
    /// Depth formats only answer a request for one component.
    pub fn with_num_components(&self, num_components: u32) -> InternalFormat {
        if num_components == 0 {
            return InternalFormat::None;
        }
        let n = num_components.clamp(1, 4);

        match self.base_format() {
            BaseFormat::None => InternalFormat::None,
            BaseFormat::Depth if n == 1 => *self,
            BaseFormat::Depth => InternalFormat::None,
            BaseFormat::BGRA if n == 4 => *self,
            BaseFormat::BGRA => FAMILY_8[n as usize - 1],
            _ => match self.family() {
                Some(family) => family[n as usize - 1],
                None => InternalFormat::None,
            },
        }
    }
}

/// Image dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageType {
    #[default]
    Texture2D,
    Texture3D,
    Cubemap,
}

impl ImageType {
    pub fn num_faces(&self) -> u32 {
        match self {
            ImageType::Cubemap => 6,
            _ => 1,
        }
    }
}

/// Sampler filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
    /// Linear filtering across a generated mip chain
    LinearMipmap,
}

impl FilterMode {
    pub fn is_mipmapped(&self) -> bool {
        matches!(self, FilterMode::LinearMipmap)
    }
}

/// Sampler addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    ClampToBorder,
    Repeat,
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
