//! Kernel families: OpenCL C declarations paired with native implementations.
//!
//! Each module exposes its source as `SRC` and its implementations through
//! `library()`. Pass both to a program builder:
//!
//! ```rust,ignore
//! let program = Program::builder()
//!     .src(reduction::SRC)
//!     .kernels(reduction::library())
//!     .build(&context)?;
//! ```

pub mod bitonic;
pub mod events;
pub mod fft;
pub mod image;
pub mod interop;
pub mod matrix;
pub mod misc;
pub mod radix;
pub mod reduction;
pub mod search;

use crate::core::KernelLibrary;

/// Returns a library holding every kernel of every family.
pub fn all() -> KernelLibrary {
    let mut lib = KernelLibrary::new();
    for family in &[bitonic::library(), events::library(), fft::library(), image::library(),
            interop::library(), matrix::library(), misc::library(), radix::library(),
            reduction::library(), search::library()] {
        lib.extend(family);
    }
    lib
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_do_not_collide() {
        let total = bitonic::library().len() + events::library().len() + fft::library().len()
            + image::library().len() + interop::library().len() + matrix::library().len()
            + misc::library().len() + radix::library().len() + reduction::library().len()
            + search::library().len();
        assert_eq!(all().len(), total);
    }
}
