//! Various structures used by the API.

use crate::error::{api_err, Result};
use crate::{
    ImageChannelDataType, ImageChannelOrder, KernelArgAccessQualifier, KernelArgAddressQualifier,
    PlatformId, Status,
};

//=============================================================================
//============================ CONTEXT PROPERTIES =============================
//=============================================================================

/// A context property value.
#[derive(Clone, Debug, PartialEq)]
pub enum ContextPropertyValue {
    Platform(PlatformId),
    InteropUserSync(bool),
    GlContextKhr(usize),
    EglDisplayKhr(usize),
    GlxDisplayKhr(usize),
    WglHdcKhr(usize),
    CglSharegroupKhr(usize),
}

/// Context properties list.
///
/// Order is preserved; setting a property which already exists replaces its
/// value in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextProperties {
    props: Vec<ContextPropertyValue>,
}

impl ContextProperties {
    /// Returns an empty new list of context properties
    pub fn new() -> ContextProperties {
        ContextProperties { props: Vec::with_capacity(4) }
    }

    fn set(&mut self, prop: ContextPropertyValue) {
        let discriminant = std::mem::discriminant(&prop);
        match self.props.iter_mut().find(|p| std::mem::discriminant(&**p) == discriminant) {
            Some(existing) => *existing = prop,
            None => self.props.push(prop),
        }
    }

    /// Specifies a platform (builder-style).
    pub fn platform(mut self, platform: PlatformId) -> ContextProperties {
        self.set(ContextPropertyValue::Platform(platform));
        self
    }

    /// Specifies whether the user is responsible for synchronization between
    /// graphics and compute (builder-style).
    pub fn interop_user_sync(mut self, sync: bool) -> ContextProperties {
        self.set(ContextPropertyValue::InteropUserSync(sync));
        self
    }

    /// Specifies a graphics context handle (builder-style).
    pub fn gl_context(mut self, handle: usize) -> ContextProperties {
        self.set(ContextPropertyValue::GlContextKhr(handle));
        self
    }

    /// Specifies a Display pointer for the GLX context (builder-style).
    pub fn glx_display(mut self, handle: usize) -> ContextProperties {
        self.set(ContextPropertyValue::GlxDisplayKhr(handle));
        self
    }

    /// Specifies a display handle for an EGL context (builder-style).
    pub fn egl_display(mut self, handle: usize) -> ContextProperties {
        self.set(ContextPropertyValue::EglDisplayKhr(handle));
        self
    }

    /// Specifies a Display pointer for the WGL HDC (builder-style).
    pub fn wgl_hdc(mut self, handle: usize) -> ContextProperties {
        self.set(ContextPropertyValue::WglHdcKhr(handle));
        self
    }

    /// Specifies a CGL share group (builder-style).
    pub fn cgl_sharegroup(mut self, handle: usize) -> ContextProperties {
        self.set(ContextPropertyValue::CglSharegroupKhr(handle));
        self
    }

    /// Pushes a property value onto this list.
    pub fn and(mut self, prop: ContextPropertyValue) -> ContextProperties {
        self.set(prop);
        self
    }

    /// Returns the platform, if one has been specified.
    pub fn get_platform(&self) -> Option<&PlatformId> {
        self.props.iter().find_map(|p| match *p {
            ContextPropertyValue::Platform(ref plat) => Some(plat),
            _ => None,
        })
    }

    /// Returns true if a graphics context or share group has been specified.
    pub fn contains_gl_context_or_sharegroup(&self) -> bool {
        self.props.iter().any(|p| match *p {
            ContextPropertyValue::GlContextKhr(_) | ContextPropertyValue::CglSharegroupKhr(_) => true,
            _ => false,
        })
    }

    /// Returns the property values in order.
    pub fn iter(&self) -> std::slice::Iter<ContextPropertyValue> {
        self.props.iter()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

impl From<Vec<ContextPropertyValue>> for ContextProperties {
    fn from(props: Vec<ContextPropertyValue>) -> ContextProperties {
        props.into_iter().fold(ContextProperties::new(), |cp, p| cp.and(p))
    }
}

//=============================================================================
//=============================== IMAGE FORMAT ================================
//=============================================================================

/// Image format properties used by `Image`.
///
/// A structure that describes format properties of the image to be
/// allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageFormat {
    pub channel_order: ImageChannelOrder,
    pub channel_data_type: ImageChannelDataType,
}

impl ImageFormat {
    pub fn new(order: ImageChannelOrder, data_type: ImageChannelDataType) -> ImageFormat {
        ImageFormat {
            channel_order: order,
            channel_data_type: data_type,
        }
    }

    /// Four float channels.
    pub fn new_rgba() -> ImageFormat {
        ImageFormat::new(ImageChannelOrder::Rgba, ImageChannelDataType::Float)
    }

    /// Number of channels stored per pixel.
    pub fn channel_count(&self) -> usize {
        use crate::ImageChannelOrder::*;
        match self.channel_order {
            R | A | Intensity | Luminance => 1,
            Rg | Ra => 2,
            Rgb => 3,
            Rgba | Bgra | Argb => 4,
        }
    }

    /// Size in bytes of one channel, or of the whole pixel for packed types.
    fn element_size(&self) -> usize {
        use crate::ImageChannelDataType::*;
        match self.channel_data_type {
            SnormInt8 | UnormInt8 | SignedInt8 | UnsignedInt8 => 1,
            SnormInt16 | UnormInt16 | SignedInt16 | UnsignedInt16 | HalfFloat => 2,
            UnormShort565 | UnormShort555 => 2,
            SignedInt32 | UnsignedInt32 | Float => 4,
        }
    }

    /// Returns true if the data type packs every channel into one element.
    pub fn is_packed(&self) -> bool {
        match self.channel_data_type {
            ImageChannelDataType::UnormShort565 | ImageChannelDataType::UnormShort555 => true,
            _ => false,
        }
    }

    /// Returns true if the runtime can store and sample this format.
    pub fn is_supported(&self) -> bool {
        use crate::ImageChannelDataType::*;
        use crate::ImageChannelOrder::*;
        match (self.channel_order, self.channel_data_type) {
            (_, HalfFloat) => false,
            (Rgb, UnormShort565) | (Rgb, UnormShort555) => true,
            (Rgb, _) | (_, UnormShort565) | (_, UnormShort555) => false,
            (Luminance, dt) | (Intensity, dt) => match dt {
                UnormInt8 | UnormInt16 | SnormInt8 | SnormInt16 | Float => true,
                _ => false,
            },
            (Argb, dt) | (Bgra, dt) => match dt {
                UnormInt8 | SnormInt8 | SignedInt8 | UnsignedInt8 => true,
                _ => false,
            },
            _ => true,
        }
    }

    /// Returns the size in bytes of one pixel or an error if the format is
    /// not supported.
    pub fn pixel_size(&self) -> Result<usize> {
        if !self.is_supported() {
            return Err(api_err(
                Status::ImageFormatNotSupported,
                "ImageFormat::pixel_size",
                format!("{:?}", self),
            ));
        }
        if self.is_packed() {
            Ok(self.element_size())
        } else {
            Ok(self.element_size() * self.channel_count())
        }
    }
}

/// Describes the dimensions of a two dimensional image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub image_width: usize,
    pub image_height: usize,
    /// Host row pitch in bytes. Zero means `width * pixel_size`.
    pub image_row_pitch: usize,
}

impl ImageDescriptor {
    pub fn new_2d(width: usize, height: usize, row_pitch: usize) -> ImageDescriptor {
        ImageDescriptor {
            image_width: width,
            image_height: height,
            image_row_pitch: row_pitch,
        }
    }
}

//=============================================================================
//============================ KERNEL SIGNATURES ==============================
//=============================================================================

/// The kind of value a kernel parameter accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// A `__global` or `__constant` pointer (a buffer).
    Pointer,
    /// A `__local` pointer (a size-only reservation).
    LocalPointer,
    /// An `image2d_t`.
    Image,
    /// A `sampler_t`.
    Sampler,
    /// A value passed by copy. `size` is `None` for types the compiler does
    /// not know the size of (structs, typedefs).
    Scalar { size: Option<usize> },
}

/// A declared kernel parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelParam {
    pub name: String,
    pub type_name: String,
    pub address: KernelArgAddressQualifier,
    pub access: KernelArgAccessQualifier,
    pub kind: ParamKind,
}

/// A kernel entry point as declared in program source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelSignature {
    pub name: String,
    pub params: Vec<KernelParam>,
    /// Line of the declaration within the preprocessed source.
    pub line: usize,
}

impl KernelSignature {
    /// Returns the index of the parameter named `name`.
    pub fn param_idx(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}
