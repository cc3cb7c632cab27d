/// Image - host pixel data plus the GPU image built from it
///
/// An `Image` is created from optional face-major host bytes. `create`
/// allocates the GPU image; `create_with_state` also uploads the bytes,
/// builds the mip chain and leaves the image in the requested state. Host
/// bytes are released once uploaded.

use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferDesc, BufferImageCopy, BufferUsage, CommandList, Extent2D, Extent3D, FormatFeatures,
    GpuBuffer, GpuImage, GpuImageDesc, GraphicsDevice, ImageBlit, ImageFormatQuery,
    ImageTiling, ImageUsage, MemoryLocation, ResourceState, SubresourceRange,
};
use crate::image::{BaseFormat, FilterMode, ImageType, InternalFormat, WrapMode};
use crate::object::{GpuComponent, Id, Identified};
use crate::{engine_bail, engine_debug, engine_error, engine_warn};

const LOG_SOURCE: &str = "hyperion::Image";

pub struct Image {
    id: Id<Image>,
    extent: Extent3D,
    format: InternalFormat,
    image_type: ImageType,
    filter_mode: FilterMode,
    wrap_mode: WrapMode,
    tiling: ImageTiling,
    usage: ImageUsage,
    bytes: Option<Vec<u8>>,
    state: ResourceState,
    gpu_image: Option<Box<dyn GpuImage>>,
}

impl Image {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extent: Extent3D,
        format: InternalFormat,
        image_type: ImageType,
        filter_mode: FilterMode,
        wrap_mode: WrapMode,
        tiling: ImageTiling,
        usage: ImageUsage,
        bytes: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id: Id::BAD,
            extent,
            format,
            image_type,
            filter_mode,
            wrap_mode,
            tiling,
            usage,
            bytes,
            state: ResourceState::Undefined,
            gpu_image: None,
        }
    }

    /// Sampled texture filled from host bytes
    pub fn texture(
        extent: Extent3D,
        format: InternalFormat,
        image_type: ImageType,
        filter_mode: FilterMode,
        wrap_mode: WrapMode,
        bytes: Option<Vec<u8>>,
    ) -> Self {
        // Blitting the mip chain reads back from the image itself
        let mut usage = ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED;
        if filter_mode.is_mipmapped() {
            usage |= ImageUsage::TRANSFER_SRC;
        }

        Self::new(
            extent,
            format,
            image_type,
            filter_mode,
            wrap_mode,
            ImageTiling::Optimal,
            usage,
            bytes,
        )
    }

    /// Shader-writable image (nearest filtering)
    pub fn storage(
        extent: Extent3D,
        format: InternalFormat,
        image_type: ImageType,
        bytes: Option<Vec<u8>>,
    ) -> Self {
        let mut usage = ImageUsage::STORAGE | ImageUsage::SAMPLED;
        if bytes.is_some() {
            usage |= ImageUsage::TRANSFER_DST;
        }

        Self::new(
            extent,
            format,
            image_type,
            FilterMode::Nearest,
            WrapMode::ClampToEdge,
            ImageTiling::Optimal,
            usage,
            bytes,
        )
    }

    /// Render target attachment, sampleable by later passes
    pub fn framebuffer_attachment(extent: Extent2D, format: InternalFormat) -> Self {
        let attachment = if format.is_depth() {
            ImageUsage::DEPTH_STENCIL_ATTACHMENT
        } else {
            ImageUsage::COLOR_ATTACHMENT
        };

        Self::new(
            extent.into(),
            format,
            ImageType::Texture2D,
            FilterMode::Nearest,
            WrapMode::ClampToEdge,
            ImageTiling::Optimal,
            attachment | ImageUsage::SAMPLED,
            None,
        )
    }

    // ===== ACCESSORS =====

    pub fn extent(&self) -> Extent3D {
        self.extent
    }

    pub fn format(&self) -> InternalFormat {
        self.format
    }

    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    pub fn tiling(&self) -> ImageTiling {
        self.tiling
    }

    pub fn usage(&self) -> ImageUsage {
        self.usage
    }

    /// Current tracked resource state
    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Host bytes are waiting to be uploaded
    pub fn has_pending_data(&self) -> bool {
        self.bytes.is_some()
    }

    pub fn gpu_image(&self) -> Option<&dyn GpuImage> {
        self.gpu_image.as_deref()
    }

    pub fn is_created(&self) -> bool {
        self.gpu_image.is_some()
    }

    pub fn num_faces(&self) -> u32 {
        self.image_type.num_faces()
    }

    /// `width * height * depth * bytes_per_pixel * faces`
    pub fn size(&self) -> usize {
        self.extent.width as usize
            * self.extent.height as usize
            * self.extent.depth as usize
            * self.format.bytes_per_pixel() as usize
            * self.num_faces() as usize
    }

    pub fn num_mipmaps(&self) -> u32 {
        if !self.filter_mode.is_mipmapped() {
            return 1;
        }
        let largest = self.extent.width.max(self.extent.height).max(self.extent.depth).max(1);
        u32::BITS - largest.leading_zeros()
    }

    // ===== CREATION =====

    /// Allocate the GPU image for the full mip chain; no data transfer
    pub fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.allocate(device)
    }

    /// Allocate, upload pending host bytes and transition to `target_state`
    pub fn create_with_state(
        &mut self,
        device: &mut dyn GraphicsDevice,
        target_state: ResourceState,
    ) -> Result<()> {
        if let Some(bytes) = &self.bytes {
            if bytes.len() != self.size() {
                let message = format!(
                    "host data is {} bytes, expected {} for {}x{}x{} {:?} ({} face(s))",
                    bytes.len(),
                    self.size(),
                    self.extent.width,
                    self.extent.height,
                    self.extent.depth,
                    self.format,
                    self.num_faces()
                );
                engine_error!(LOG_SOURCE, "{}", message);
                return Err(Error::InvalidResource(message));
            }
        }

        self.allocate(device)?;

        let mip_levels = self.num_mipmaps();
        if self.bytes.is_some()
            && mip_levels > 1
            && !device.supports_format_features(
                self.format,
                self.tiling,
                FormatFeatures::BLIT_SRC
                    | FormatFeatures::BLIT_DST
                    | FormatFeatures::SAMPLED_IMAGE_FILTER_LINEAR,
            )
        {
            engine_bail!(
                LOG_SOURCE,
                "format {:?} does not support linear blitting, cannot generate mipmaps",
                self.format
            );
        }

        let staging = match &self.bytes {
            Some(bytes) => {
                let buffer = device.create_buffer(&BufferDesc {
                    size: bytes.len() as u64,
                    usage: BufferUsage::Staging,
                    location: MemoryLocation::CpuToGpu,
                })?;
                buffer.update(0, bytes)?;
                Some(buffer)
            }
            None => None,
        };

        let Some(gpu_image) = self.gpu_image.as_deref() else {
            engine_bail!(LOG_SOURCE, "image was not allocated");
        };

        let layers = self.num_faces();
        let face_size = (self.size() / layers as usize) as u64;
        let extent = self.extent;

        device.execute_one_time(&mut |cmd: &mut dyn CommandList| match staging.as_deref() {
            Some(staging) => record_upload(
                cmd,
                gpu_image,
                staging,
                extent,
                face_size,
                layers,
                mip_levels,
                target_state,
            ),
            None => cmd.pipeline_barrier(
                gpu_image,
                SubresourceRange::whole(mip_levels, layers),
                ResourceState::Undefined,
                target_state,
            ),
        })?;

        drop(staging);
        self.bytes = None;
        self.state = target_state;

        engine_debug!(
            LOG_SOURCE,
            "Image {:?} created ({:?}, {} mip(s), state {:?})",
            self.id,
            self.format,
            mip_levels,
            target_state
        );
        Ok(())
    }

    fn format_query(&self) -> ImageFormatQuery {
        ImageFormatQuery {
            format: self.format,
            image_type: self.image_type,
            tiling: self.tiling,
            usage: self.usage,
        }
    }

    fn allocate(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if !device.supports_image_format(&self.format_query()) {
            self.widen_to_four_components()?;

            if !device.supports_image_format(&self.format_query()) {
                engine_bail!(
                    LOG_SOURCE,
                    "no supported format for image (tried {:?} after widening)",
                    self.format
                );
            }
        }

        let desc = GpuImageDesc {
            extent: self.extent,
            format: self.format,
            image_type: self.image_type,
            tiling: self.tiling,
            usage: self.usage,
            mip_levels: self.num_mipmaps(),
            filter_mode: self.filter_mode,
            wrap_mode: self.wrap_mode,
        };
        self.gpu_image = Some(device.create_image(&desc)?);
        Ok(())
    }

    /// Format fallback: widen a color format to four components, expanding
    /// host pixels (new G/B are zero, new alpha is opaque)
    fn widen_to_four_components(&mut self) -> Result<()> {
        let widenable = matches!(
            self.format.base_format(),
            BaseFormat::R | BaseFormat::RG | BaseFormat::RGB
        );
        if !widenable {
            engine_bail!(
                LOG_SOURCE,
                "format {:?} is not supported by the device and has no fallback",
                self.format
            );
        }

        let widened = self.format.with_num_components(4);
        engine_warn!(
            LOG_SOURCE,
            "format {:?} not supported, falling back to {:?}",
            self.format,
            widened
        );

        if let Some(bytes) = &self.bytes {
            self.bytes = Some(expand_components(bytes, self.format, widened));
        }
        self.format = widened;
        Ok(())
    }

    // ===== STATE =====

    /// Transition the whole image from its tracked state to `new_state`
    pub fn insert_barrier(
        &mut self,
        cmd: &mut dyn CommandList,
        new_state: ResourceState,
    ) -> Result<()> {
        let Some(gpu_image) = self.gpu_image.as_deref() else {
            engine_bail!(LOG_SOURCE, "barrier on image {:?} before create", self.id);
        };

        cmd.pipeline_barrier(
            gpu_image,
            SubresourceRange::whole(self.num_mipmaps(), self.num_faces()),
            self.state,
            new_state,
        )?;
        self.state = new_state;
        Ok(())
    }

    /// Release the GPU image; safe in every state
    pub fn destroy(&mut self) {
        self.gpu_image = None;
        self.state = ResourceState::Undefined;
    }
}

impl Identified for Image {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

impl GpuComponent for Image {
    fn destroy(&mut self) -> Result<()> {
        Image::destroy(self);
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn record_upload(
    cmd: &mut dyn CommandList,
    image: &dyn GpuImage,
    staging: &dyn GpuBuffer,
    extent: Extent3D,
    face_size: u64,
    layers: u32,
    mip_levels: u32,
    target_state: ResourceState,
) -> Result<()> {
    cmd.pipeline_barrier(
        image,
        SubresourceRange::whole(mip_levels, layers),
        ResourceState::Undefined,
        ResourceState::CopyDst,
    )?;

    for face in 0..layers {
        cmd.copy_buffer_to_image(
            staging,
            image,
            BufferImageCopy {
                buffer_offset: face as u64 * face_size,
                mip_level: 0,
                layer: face,
                extent,
            },
        )?;
    }

    if mip_levels == 1 {
        return cmd.pipeline_barrier(
            image,
            SubresourceRange::whole(1, layers),
            ResourceState::CopyDst,
            target_state,
        );
    }

    for level in 1..mip_levels {
        cmd.pipeline_barrier(
            image,
            SubresourceRange::mip(level - 1, layers),
            ResourceState::CopyDst,
            ResourceState::CopySrc,
        )?;
        cmd.blit_image(
            image,
            ImageBlit {
                src_mip_level: level - 1,
                src_extent: extent.mip(level - 1),
                dst_mip_level: level,
                dst_extent: extent.mip(level),
                layer_count: layers,
            },
        )?;
    }

    // Every level but the last was read by a blit
    cmd.pipeline_barrier(
        image,
        SubresourceRange {
            base_mip_level: 0,
            mip_level_count: mip_levels - 1,
            base_layer: 0,
            layer_count: layers,
        },
        ResourceState::CopySrc,
        target_state,
    )?;
    cmd.pipeline_barrier(
        image,
        SubresourceRange::mip(mip_levels - 1, layers),
        ResourceState::CopyDst,
        target_state,
    )
}

/// Component value representing 1.0 for `format`, little-endian
fn one_value(format: InternalFormat) -> Vec<u8> {
    match (format.bytes_per_component(), format.is_float()) {
        (1, _) => vec![0xFF],
        (2, true) => 0x3C00u16.to_le_bytes().to_vec(),
        (2, false) => 0xFFFFu16.to_le_bytes().to_vec(),
        (4, true) => 1.0f32.to_le_bytes().to_vec(),
        (4, false) => 0xFFFF_FFFFu32.to_le_bytes().to_vec(),
        _ => Vec::new(),
    }
}

/// Copy pixels from `from` into the wider `to` layout of the same family
pub(crate) fn expand_components(bytes: &[u8], from: InternalFormat, to: InternalFormat) -> Vec<u8> {
    let component_size = from.bytes_per_component() as usize;
    let src_pixel = from.bytes_per_pixel() as usize;
    let dst_components = to.num_components() as usize;
    let alpha = one_value(to);

    if src_pixel == 0 {
        return Vec::new();
    }

    let pixel_count = bytes.len() / src_pixel;
    let mut expanded = Vec::with_capacity(pixel_count * dst_components * component_size);

    for pixel in bytes.chunks_exact(src_pixel) {
        expanded.extend_from_slice(pixel);
        for component in from.num_components() as usize..dst_components {
            if component == 3 {
                expanded.extend_from_slice(&alpha);
            } else {
                expanded.extend(std::iter::repeat(0u8).take(component_size));
            }
        }
    }
    expanded
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
