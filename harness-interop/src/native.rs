//! Providers of the context properties which tie a compute context to the
//! current graphics context, one per window system.

use ocl_harness::builders::ContextProperties;
use crate::error::InteropResult;
use crate::gl::NativeHandles;

/// A graphics context as seen by its window system.
pub trait NativeGraphicsContext {
    /// Returns the context properties naming this graphics context, in the
    /// order the compute context expects them.
    fn properties(&self) -> ContextProperties;
}

/// A GLX context and its X display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlxContext {
    pub context: usize,
    pub display: usize,
}

impl GlxContext {
    pub fn current() -> InteropResult<GlxContext> {
        let handles = NativeHandles::current()?;
        Ok(GlxContext { context: handles.context, display: handles.display })
    }
}

impl NativeGraphicsContext for GlxContext {
    fn properties(&self) -> ContextProperties {
        ContextProperties::new()
            .gl_context(self.context)
            .glx_display(self.display)
    }
}

/// A WGL context and its device context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WglContext {
    pub context: usize,
    pub hdc: usize,
}

impl WglContext {
    pub fn current() -> InteropResult<WglContext> {
        let handles = NativeHandles::current()?;
        Ok(WglContext { context: handles.context, hdc: handles.hdc })
    }
}

impl NativeGraphicsContext for WglContext {
    fn properties(&self) -> ContextProperties {
        ContextProperties::new()
            .gl_context(self.context)
            .wgl_hdc(self.hdc)
    }
}

/// A CGL share group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CglContext {
    pub sharegroup: usize,
}

impl CglContext {
    pub fn current() -> InteropResult<CglContext> {
        let handles = NativeHandles::current()?;
        Ok(CglContext { sharegroup: handles.sharegroup })
    }
}

impl NativeGraphicsContext for CglContext {
    fn properties(&self) -> ContextProperties {
        ContextProperties::new().cgl_sharegroup(self.sharegroup)
    }
}
