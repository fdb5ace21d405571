//! Image texel encoding, decoding, and sampling.

use std::cell::Cell;

use super::memory::ImageLayout;
use crate::{AddressingMode, Context, FilterMode, ImageChannelDataType, ImageChannelOrder,
    ImageFormat};

/// Sampler state used by image reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerDesc {
    pub normalized_coords: bool,
    pub addressing_mode: AddressingMode,
    pub filter_mode: FilterMode,
}

impl Default for SamplerDesc {
    fn default() -> SamplerDesc {
        SamplerDesc {
            normalized_coords: false,
            addressing_mode: AddressingMode::ClampToEdge,
            filter_mode: FilterMode::Nearest,
        }
    }
}

pub(crate) struct SamplerObj {
    pub(crate) id: u64,
    pub(crate) context: Context,
    pub(crate) desc: SamplerDesc,
}

//=============================================================================
//============================ TEXEL CONVERSION ===============================
//=============================================================================

/// Indices into RGBA for each stored channel, in storage order.
fn channel_map(order: ImageChannelOrder) -> &'static [usize] {
    use crate::ImageChannelOrder::*;
    match order {
        R | Luminance | Intensity => &[0],
        A => &[3],
        Rg => &[0, 1],
        Ra => &[0, 3],
        Rgb => &[0, 1, 2],
        Rgba => &[0, 1, 2, 3],
        Bgra => &[2, 1, 0, 3],
        Argb => &[3, 0, 1, 2],
    }
}

/// Fills in the channels a format does not store.
fn expand(order: ImageChannelOrder, mut rgba: [f32; 4]) -> [f32; 4] {
    match order {
        ImageChannelOrder::Luminance => [rgba[0], rgba[0], rgba[0], 1.0],
        ImageChannelOrder::Intensity => [rgba[0]; 4],
        _ => {
            if !channel_map(order).contains(&3) {
                rgba[3] = 1.0;
            }
            rgba
        }
    }
}

fn read_element(dt: ImageChannelDataType, bytes: &[u8]) -> f32 {
    use crate::ImageChannelDataType::*;
    match dt {
        SnormInt8 => (bytes[0] as i8 as f32 / 127.0).max(-1.0),
        UnormInt8 => bytes[0] as f32 / 255.0,
        SignedInt8 => bytes[0] as i8 as f32,
        UnsignedInt8 => bytes[0] as f32,
        SnormInt16 => (i16::from_ne_bytes([bytes[0], bytes[1]]) as f32 / 32767.0).max(-1.0),
        UnormInt16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as f32 / 65535.0,
        SignedInt16 => i16::from_ne_bytes([bytes[0], bytes[1]]) as f32,
        UnsignedInt16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as f32,
        SignedInt32 => i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
        UnsignedInt32 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
        Float => f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        UnormShort565 | UnormShort555 | HalfFloat => 0.0,
    }
}

fn write_element(dt: ImageChannelDataType, val: f32, out: &mut [u8]) {
    use crate::ImageChannelDataType::*;
    match dt {
        SnormInt8 => out[0] = (val.max(-1.0).min(1.0) * 127.0).round() as i8 as u8,
        UnormInt8 => out[0] = (val.max(0.0).min(1.0) * 255.0).round() as u8,
        SignedInt8 => out[0] = val as i8 as u8,
        UnsignedInt8 => out[0] = val as u8,
        SnormInt16 => out[..2].copy_from_slice(
            &((val.max(-1.0).min(1.0) * 32767.0).round() as i16).to_ne_bytes()),
        UnormInt16 => out[..2].copy_from_slice(
            &((val.max(0.0).min(1.0) * 65535.0).round() as u16).to_ne_bytes()),
        SignedInt16 => out[..2].copy_from_slice(&(val as i16).to_ne_bytes()),
        UnsignedInt16 => out[..2].copy_from_slice(&(val as u16).to_ne_bytes()),
        SignedInt32 => out[..4].copy_from_slice(&(val as i32).to_ne_bytes()),
        UnsignedInt32 => out[..4].copy_from_slice(&(val as u32).to_ne_bytes()),
        Float => out[..4].copy_from_slice(&val.to_ne_bytes()),
        UnormShort565 | UnormShort555 | HalfFloat => (),
    }
}

/// Decodes one texel into RGBA.
pub(crate) fn decode_texel(format: &ImageFormat, bytes: &[u8]) -> [f32; 4] {
    let mut rgba = [0.0f32, 0.0, 0.0, 0.0];

    match format.channel_data_type {
        ImageChannelDataType::UnormShort565 => {
            let v = u16::from_ne_bytes([bytes[0], bytes[1]]);
            rgba[0] = ((v >> 11) & 0x1F) as f32 / 31.0;
            rgba[1] = ((v >> 5) & 0x3F) as f32 / 63.0;
            rgba[2] = (v & 0x1F) as f32 / 31.0;
        },
        ImageChannelDataType::UnormShort555 => {
            let v = u16::from_ne_bytes([bytes[0], bytes[1]]);
            rgba[0] = ((v >> 10) & 0x1F) as f32 / 31.0;
            rgba[1] = ((v >> 5) & 0x1F) as f32 / 31.0;
            rgba[2] = (v & 0x1F) as f32 / 31.0;
        },
        dt => {
            let elem = bytes.len() / format.channel_count();
            for (i, &ch) in channel_map(format.channel_order).iter().enumerate() {
                rgba[ch] = read_element(dt, &bytes[i * elem..(i + 1) * elem]);
            }
        },
    }

    expand(format.channel_order, rgba)
}

/// Encodes RGBA into one texel.
pub(crate) fn encode_texel(format: &ImageFormat, rgba: [f32; 4], out: &mut [u8]) {
    let unorm = |v: f32, max: f32| (v.max(0.0).min(1.0) * max).round() as u16;

    match format.channel_data_type {
        ImageChannelDataType::UnormShort565 => {
            let v = (unorm(rgba[0], 31.0) << 11) | (unorm(rgba[1], 63.0) << 5) | unorm(rgba[2], 31.0);
            out[..2].copy_from_slice(&v.to_ne_bytes());
        },
        ImageChannelDataType::UnormShort555 => {
            let v = (unorm(rgba[0], 31.0) << 10) | (unorm(rgba[1], 31.0) << 5) | unorm(rgba[2], 31.0);
            out[..2].copy_from_slice(&v.to_ne_bytes());
        },
        dt => {
            let elem = out.len() / format.channel_count();
            for (i, &ch) in channel_map(format.channel_order).iter().enumerate() {
                write_element(dt, rgba[ch], &mut out[i * elem..(i + 1) * elem]);
            }
        },
    }
}

//=============================================================================
//================================ IMAGE VIEW =================================
//=============================================================================

/// A kernel's view of an image argument.
pub struct ImageView<'a> {
    pub(crate) cells: &'a [Cell<u8>],
    pub(crate) layout: &'a ImageLayout,
}

impl<'a> ImageView<'a> {
    pub fn width(&self) -> usize {
        self.layout.width
    }

    pub fn height(&self) -> usize {
        self.layout.height
    }

    pub fn format(&self) -> ImageFormat {
        self.layout.format
    }

    fn texel_range(&self, x: usize, y: usize) -> std::ops::Range<usize> {
        let start = y * self.layout.row_pitch + x * self.layout.pixel_size;
        start..start + self.layout.pixel_size
    }

    /// Reads the texel at integer coordinates without a sampler. Returns
    /// `None` when out of bounds.
    pub fn texel(&self, x: usize, y: usize) -> Option<[f32; 4]> {
        if x >= self.layout.width || y >= self.layout.height {
            return None;
        }
        let mut buf = [0u8; 16];
        let range = self.texel_range(x, y);
        let len = range.len();
        for (b, cell) in buf.iter_mut().zip(&self.cells[range]) {
            *b = cell.get();
        }
        Some(decode_texel(&self.layout.format, &buf[..len]))
    }

    /// The border color for `Clamp` addressing.
    fn border(&self) -> [f32; 4] {
        if channel_map(self.layout.format.channel_order).contains(&3) {
            [0.0; 4]
        } else {
            [0.0, 0.0, 0.0, 1.0]
        }
    }

    /// Resolves an unnormalized coordinate index along one axis, returning
    /// `None` for a border texel.
    fn address(&self, idx: i64, extent: usize, mode: AddressingMode) -> Option<usize> {
        let ext = extent as i64;
        match mode {
            AddressingMode::Clamp => {
                if idx < 0 || idx >= ext { None } else { Some(idx as usize) }
            },
            AddressingMode::Repeat => Some(idx.rem_euclid(ext) as usize),
            AddressingMode::MirroredRepeat => {
                let period = 2 * ext;
                let m = idx.rem_euclid(period);
                let mirrored = if m < ext { m } else { period - 1 - m };
                Some(mirrored as usize)
            },
            AddressingMode::ClampToEdge | AddressingMode::None => {
                Some(idx.max(0).min(ext - 1) as usize)
            },
        }
    }

    fn fetch(&self, x: i64, y: i64, mode: AddressingMode) -> [f32; 4] {
        match (self.address(x, self.layout.width, mode), self.address(y, self.layout.height, mode)) {
            (Some(xi), Some(yi)) => self.texel(xi, yi).unwrap_or_else(|| self.border()),
            _ => self.border(),
        }
    }

    /// Samples the image at floating point coordinates.
    pub fn read_imagef(&self, sampler: &SamplerDesc, coord: [f32; 2]) -> [f32; 4] {
        let (mut u, mut v) = (coord[0], coord[1]);
        if sampler.normalized_coords {
            u *= self.layout.width as f32;
            v *= self.layout.height as f32;
        }

        match sampler.filter_mode {
            FilterMode::Nearest => {
                self.fetch(u.floor() as i64, v.floor() as i64, sampler.addressing_mode)
            },
            FilterMode::Linear => {
                let (us, vs) = (u - 0.5, v - 0.5);
                let (i0, j0) = (us.floor() as i64, vs.floor() as i64);
                let (a, b) = (us - us.floor(), vs - vs.floor());
                let mode = sampler.addressing_mode;
                let t00 = self.fetch(i0, j0, mode);
                let t10 = self.fetch(i0 + 1, j0, mode);
                let t01 = self.fetch(i0, j0 + 1, mode);
                let t11 = self.fetch(i0 + 1, j0 + 1, mode);
                let mut out = [0.0f32; 4];
                for c in 0..4 {
                    out[c] = (1.0 - a) * (1.0 - b) * t00[c] + a * (1.0 - b) * t10[c]
                        + (1.0 - a) * b * t01[c] + a * b * t11[c];
                }
                out
            },
        }
    }

    /// Samples the image at integer coordinates returning unsigned channels.
    pub fn read_imageui(&self, sampler: &SamplerDesc, coord: [i32; 2]) -> [u32; 4] {
        let t = self.fetch(coord[0] as i64, coord[1] as i64, sampler.addressing_mode);
        [t[0] as u32, t[1] as u32, t[2] as u32, t[3] as u32]
    }

    /// Samples the image at integer coordinates returning signed channels.
    pub fn read_imagei(&self, sampler: &SamplerDesc, coord: [i32; 2]) -> [i32; 4] {
        let t = self.fetch(coord[0] as i64, coord[1] as i64, sampler.addressing_mode);
        [t[0] as i32, t[1] as i32, t[2] as i32, t[3] as i32]
    }

    /// Writes a texel. Out of bounds writes are discarded.
    pub fn write_imagef(&self, coord: [i32; 2], color: [f32; 4]) {
        if coord[0] < 0 || coord[1] < 0 {
            return;
        }
        let (x, y) = (coord[0] as usize, coord[1] as usize);
        if x >= self.layout.width || y >= self.layout.height {
            return;
        }
        let mut buf = [0u8; 16];
        let range = self.texel_range(x, y);
        let len = range.len();
        encode_texel(&self.layout.format, color, &mut buf[..len]);
        for (cell, &b) in self.cells[range].iter().zip(buf.iter()) {
            cell.set(b);
        }
    }

    /// Writes a texel of an unsigned integer format.
    pub fn write_imageui(&self, coord: [i32; 2], color: [u32; 4]) {
        self.write_imagef(coord, [color[0] as f32, color[1] as f32, color[2] as f32,
            color[3] as f32]);
    }

    /// Writes a texel of a signed integer format.
    pub fn write_imagei(&self, coord: [i32; 2], color: [i32; 4]) {
        self.write_imagef(coord, [color[0] as f32, color[1] as f32, color[2] as f32,
            color[3] as f32]);
    }
}
