//! wgpu backend for the fullscreen quad.
//!
//! - `context` owns instance/adapter/device/surface wiring and reconfigures
//!   the swapchain when the window resizes.
//! - `pipeline` compiles the wrapped GLSL and builds the triangle-strip
//!   pipeline with its uniform and vertex buffers.
//! - `state` glues both together and implements [`DrawTarget`](crate::DrawTarget).

mod context;
mod pipeline;
mod state;

pub(crate) use state::GpuState;
