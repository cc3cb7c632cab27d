/*!
# Hyperion Engine

GPU resource and frame-graph execution layer of the Hyperion rendering engine.

The crate is backend-agnostic: everything GPU-facing goes through the
`GraphicsDevice` trait family, implemented by a backend crate
(`hyperion_engine_renderer_vulkan`).

## Architecture

- **Engine**: explicit context owning the device and every render subsystem
- **GraphicsDevice**: factory for GPU images, buffers, passes, pipelines and command lists
- **Image**: textures and attachments with tracked resource state and upload
- **RenderBucket**: per-bucket render targets and graphics pipelines
- **PostEffect / PostProcessing**: full-screen passes and the filter chain
- **DeferredRenderer**: per-frame sequence (shadows, g-buffer, filters, composite)
- **DescriptorPool / ShaderGlobals**: descriptor registry and per-frame global buffers
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod callbacks;
pub mod asset;
pub mod utils;
pub mod object;
pub mod image;
pub mod graphics_device;
pub mod render;

// Main hyperion namespace module
pub mod hyperion {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine context
    pub use crate::engine::{Engine, EngineState};

    // Configuration
    pub use crate::config::{EngineConfig, TextureFormatDefault, TextureFormatDefaults};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Host-side images and formats
    pub mod image {
        pub use crate::image::*;
    }

    // Backend-facing traits and descriptors
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Identity tables and shared handles
    pub mod object {
        pub use crate::object::*;
    }

    // Buckets, pipelines, post effects and the deferred path
    pub mod render {
        pub use crate::render::*;
    }

    pub mod callbacks {
        pub use crate::callbacks::*;
    }

    pub mod asset {
        pub use crate::asset::*;
    }
}

// Re-export math library at crate root
pub use glam;
