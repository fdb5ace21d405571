//! `ocl-harness` standard types.

mod platform;
mod device;
mod context;
mod program;
mod kernel;
mod queue;
mod buffer;
mod image;
mod sampler;
mod pro_que;
mod event;
mod spatial_dims;

pub use self::platform::{PlatformError, Extensions, Platform};
pub use self::device::{DeviceError, Device, DeviceSpecifier};
pub use self::context::{Context, ContextBuilder};
pub use self::program::{Program, ProgramBuilder, BuildOpt};
pub use self::queue::Queue;
pub use self::kernel::{ArgValConverter, KernelError, KernelCmd, Kernel, KernelBuilder};
pub use self::buffer::{BufferCmdKind, BufferCmdDataShape, BufferCmd, Buffer, QueCtx,
    BufferBuilder, BufferReadCmd, BufferWriteCmd, BufferMapCmd, BufferCmdError, ReadDst,
    WriteSrc};
pub use self::image::{ImageCmdError, ImageCmdKind, ImageCmd, Image, ImageBuilder};
pub use self::sampler::Sampler;
pub use self::pro_que::{ProQue, ProQueBuilder};
pub use self::event::{Event, EventList};
pub use self::spatial_dims::SpatialDims;
pub use self::traits::{MemLen, WorkDims};
pub use self::types::EventSlot;
pub(crate) use self::types::wait_list;


//=============================================================================
//================================== TYPES ====================================
//=============================================================================

mod types {
    use crate::core::Event as EventCore;
    use crate::standard::{Event, EventList};

    /// A destination for the event created by an enqueued command.
    ///
    /// Either an empty (or to be replaced) `Event` or an `EventList` which
    /// the new event is pushed onto.
    #[derive(Debug)]
    pub enum EventSlot<'a> {
        Event(&'a mut Event),
        EventList(&'a mut EventList),
    }

    impl<'a> EventSlot<'a> {
        /// Stores `event` in this slot.
        pub(crate) fn fill(self, event: EventCore) {
            match self {
                EventSlot::Event(e) => *e = Event::from(event),
                EventSlot::EventList(el) => el.push(Event::from(event)),
            }
        }
    }

    impl<'a> From<&'a mut Event> for EventSlot<'a> {
        fn from(e: &'a mut Event) -> EventSlot<'a> {
            EventSlot::Event(e)
        }
    }

    impl<'a> From<&'a mut EventList> for EventSlot<'a> {
        fn from(el: &'a mut EventList) -> EventSlot<'a> {
            EventSlot::EventList(el)
        }
    }

    /// Returns the core events of a wait list, skipping empty events.
    ///
    /// Returns `None` if there is nothing to wait on.
    pub(crate) fn wait_list(ewait: Option<&EventList>) -> Option<Vec<EventCore>> {
        let events: Vec<EventCore> = ewait?.iter()
            .filter_map(|e| e.as_core().cloned())
            .collect();

        if events.is_empty() { None } else { Some(events) }
    }
}

//=============================================================================
//================================== TRAITS ===================================
//=============================================================================

mod traits {
    use std::fmt::Debug;
    use num_traits::{Num, ToPrimitive};
    use crate::SpatialDims;
    use super::spatial_dims::to_usize;

    /// Types which have properties describing the amount of work to be done
    /// in multiple dimensions.
    pub trait WorkDims {
        /// Returns the number of dimensions defined.
        fn dim_count(&self) -> u32;

        /// Returns an array representing the amount of work to be done by a kernel.
        ///
        /// Unspecified dimensions (for example, the 3rd dimension in a
        /// 1-dimensional work size) are set equal to `1`.
        fn to_work_size(&self) -> Option<[usize; 3]>;

        /// Returns an array representing the offset of a work item or memory
        /// location.
        ///
        /// Unspecified dimensions are set equal to `0`.
        fn to_work_offset(&self) -> Option<[usize; 3]>;
    }


    /// Types which have properties allowing them to be used to define the size
    /// of a volume of memory.
    ///
    /// Units are expressed in `bytes / size_of(T)` just like `Vec::len()`.
    pub trait MemLen {
        /// Returns the exact number of elements of a volume of memory
        /// (equivalent to `Vec::len()`).
        fn to_len(&self) -> usize;

        /// Returns the length of a volume of memory padded to the next
        /// multiple of `incr`.
        fn to_len_padded(&self, incr: usize) -> usize;

        /// Returns the exact lengths of each dimension of a volume of memory.
        fn to_lens(&self) -> [usize; 3];
    }

    impl<'a, D> MemLen for &'a D where D: MemLen {
        fn to_len(&self) -> usize { (*self).to_len() }
        fn to_len_padded(&self, incr: usize) -> usize { (*self).to_len_padded(incr) }
        fn to_lens(&self) -> [usize; 3] { (*self).to_lens() }
    }

    impl MemLen for usize {
        fn to_len(&self) -> usize { *self }
        fn to_len_padded(&self, incr: usize) -> usize {
            SpatialDims::One(*self).to_len_padded(incr)
        }
        fn to_lens(&self) -> [usize; 3] { [*self, 1, 1] }
    }

    impl<D> MemLen for [D; 1] where D: Num + ToPrimitive + Debug + Copy {
        fn to_len(&self) -> usize {
            SpatialDims::One(to_usize(self[0])).to_len()
        }
        fn to_len_padded(&self, incr: usize) -> usize {
            SpatialDims::One(to_usize(self[0])).to_len_padded(incr)
        }
        fn to_lens(&self) -> [usize; 3] { [to_usize(self[0]), 1, 1] }
    }

    impl<D> MemLen for (D, D) where D: Num + ToPrimitive + Debug + Copy {
        fn to_len(&self) -> usize {
            SpatialDims::Two(to_usize(self.0), to_usize(self.1)).to_len()
        }
        fn to_len_padded(&self, incr: usize) -> usize {
            SpatialDims::Two(to_usize(self.0), to_usize(self.1)).to_len_padded(incr)
        }
        fn to_lens(&self) -> [usize; 3] { [to_usize(self.0), to_usize(self.1), 1] }
    }

    impl<D> MemLen for [D; 2] where D: Num + ToPrimitive + Debug + Copy {
        fn to_len(&self) -> usize {
            SpatialDims::Two(to_usize(self[0]), to_usize(self[1])).to_len()
        }
        fn to_len_padded(&self, incr: usize) -> usize {
            SpatialDims::Two(to_usize(self[0]), to_usize(self[1])).to_len_padded(incr)
        }
        fn to_lens(&self) -> [usize; 3] { [to_usize(self[0]), to_usize(self[1]), 1] }
    }

    impl<D> MemLen for [D; 3] where D: Num + ToPrimitive + Debug + Copy {
        fn to_len(&self) -> usize {
            SpatialDims::Three(to_usize(self[0]), to_usize(self[1]), to_usize(self[2]))
                .to_len()
        }
        fn to_len_padded(&self, incr: usize) -> usize {
            SpatialDims::Three(to_usize(self[0]), to_usize(self[1]), to_usize(self[2]))
                .to_len_padded(incr)
        }
        fn to_lens(&self) -> [usize; 3] {
            [to_usize(self[0]), to_usize(self[1]), to_usize(self[2])]
        }
    }
}
