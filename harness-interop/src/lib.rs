//! Creates an `ocl-harness` `Context` which shares objects with a graphics
//! context.
//!
//! Make a `GlContext` current on the thread, then build the compute context
//! with `get_context` or `interop_context`. Buffers and textures created
//! from the graphics side are wrapped with `Buffer::from_gl_buffer` and
//! `Image::from_gl_texture_2d`, and must be acquired before kernels use them
//! and released afterwards.

mod error;
mod gl;
mod native;

use log::{debug, info};
use ocl_harness::builders::ContextProperties;
use ocl_harness::flags::DeviceType;
use ocl_harness::{Context, Device, Platform};

pub use crate::error::{InteropError, InteropResult};
pub use crate::gl::{GlBuffer, GlContext, GlTexture, NativeHandles};
pub use crate::native::{CglContext, GlxContext, NativeGraphicsContext, WglContext};

/// Returns the context properties of the graphics context current on this
/// thread, using the provider for the target's window system.
pub fn get_properties_list() -> InteropResult<ContextProperties> {
    #[cfg(target_os = "windows")]
    let provider = WglContext::current()?;

    #[cfg(target_os = "macos")]
    let provider = CglContext::current()?;

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let provider = GlxContext::current()?;

    Ok(provider.properties())
}

/// Builds a context on `device` which shares with the current graphics
/// context.
pub fn interop_context(device: &Device) -> InteropResult<Context> {
    let properties = get_properties_list()?;
    let platform = device.platform()?;

    let context = Context::builder()
        .properties(properties)
        .platform(platform)
        .devices(device.clone())
        .build()?;

    info!("Interop context created on '{}'.", device.name().unwrap_or_default());
    Ok(context)
}

/// Returns a sharing context on the first GPU, of any platform, which
/// accepts one.
pub fn get_context() -> InteropResult<Context> {
    for platform in Platform::list()? {
        for device in Device::list(&platform, Some(DeviceType::GPU))? {
            match interop_context(&device) {
                Ok(context) => return Ok(context),
                Err(InteropError::NoCurrentContext) => return Err(InteropError::NoCurrentContext),
                Err(err) => debug!("get_context: skipping device: {}", err),
            }
        }
    }
    Err(InteropError::NoSharingDevice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_need_a_current_context() {
        GlContext::release_current();
        match get_properties_list() {
            Err(InteropError::NoCurrentContext) => (),
            other => panic!("expected no current context, found: {:?}", other),
        }
    }

    #[test]
    fn providers_order_their_properties() {
        let glx = GlxContext { context: 7, display: 9 }.properties();
        assert_eq!(glx, ContextProperties::new().gl_context(7).glx_display(9));
        assert!(glx.contains_gl_context_or_sharegroup());

        let wgl = WglContext { context: 7, hdc: 3 }.properties();
        assert_eq!(wgl.len(), 2);

        let cgl = CglContext { sharegroup: 5 }.properties();
        assert!(cgl.contains_gl_context_or_sharegroup());
        assert_eq!(cgl.len(), 1);
    }

    #[test]
    fn current_context_is_per_thread() {
        let gl = GlContext::new();
        gl.make_current();
        assert!(gl.is_current());
        assert!(get_properties_list().unwrap().contains_gl_context_or_sharegroup());

        std::thread::spawn(|| {
            assert!(get_properties_list().is_err());
        }).join().unwrap();

        GlContext::release_current();
        assert!(!gl.is_current());
    }
}
