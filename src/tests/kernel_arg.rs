use std::thread;
use std::time::Duration;
use harness_extras::kernels::image;
use crate::enums::Status;
use crate::error::Error;
use crate::standard::{Buffer, Image, Kernel, KernelError, ProQue, Sampler};
use crate::tests::misc_pro_que;

const DS_LEN: usize = 1024;


fn set_arg(kernel: &mut Kernel, pro_que: &ProQue) {
    let buffer = pro_que.create_buffer::<f32>().unwrap();
    kernel.set_arg("buf", Some(&buffer)).unwrap();
}

/// Assign a buffer as a kernel argument then let it fall out of scope. The
/// kernel must keep the memory alive until it is replaced.
#[test]
fn kernel_arg_ptr_out_of_scope() {
    let pro_que = misc_pro_que(DS_LEN);

    let mut kernel = pro_que.kernel_builder("add")
        .arg_named("buf", None::<&Buffer<f32>>)
        .arg(10.0f32)
        .build().unwrap();

    set_arg(&mut kernel, &pro_que);
    thread::sleep(Duration::from_millis(100));

    for _ in 0..5 {
        kernel.enq().unwrap();
    }
    pro_que.queue().finish().unwrap();
}

/// Owned buffer arguments work and do not restrict the lifetime of the
/// `KernelBuilder`.
#[test]
fn kernel_arg_owned_mem() {
    let pro_que = misc_pro_que(DS_LEN);
    let buffer = pro_que.create_buffer::<f32>().unwrap();

    let kernel_builder = {
        let buf_clone = buffer.clone();

        let mut kb = pro_que.kernel_builder("add");
        kb.arg_named("buf", buf_clone);
        kb.arg(10.0f32);
        kb
    };

    let kernel = kernel_builder.build().unwrap();

    for _ in 0..5 {
        kernel.enq().unwrap();
    }

    let mut output_vec = vec![1000.0f32; DS_LEN * 2];
    buffer.read(&mut output_vec).len(DS_LEN).enq().unwrap();

    for (idx, e) in output_vec.iter().enumerate() {
        if idx < DS_LEN {
            assert_eq!(*e, 50.0);
        } else {
            assert_eq!(*e, 1000.0);
        }
    }
}

/// `None` named image and sampler arguments may be declared and assigned
/// later.
#[test]
fn kernel_arg_named_none() -> crate::Result<()> {
    let pro_que = ProQue::builder()
        .src(image::SRC)
        .kernels(image::library())
        .dims([16, 16])
        .build()?;

    let kernel = pro_que.kernel_builder("texture_filter")
        .arg_named("src", None::<&Image<f32>>)
        .arg_sampler_named("sampler", None)
        .arg_named("dst", None::<&Image<f32>>)
        .build()?;

    // Enqueueing with unassigned arguments is refused.
    let err = kernel.enq().unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidKernelArgs));

    let sampler = Sampler::with_defaults(pro_que.context())?;
    kernel.set_arg_sampler("sampler", &sampler)?;
    assert_eq!(kernel.named_arg_idx("sampler"), Some(1));
    assert_eq!(kernel.named_arg_idx("dst"), Some(2));
    Ok(())
}

#[test]
fn args_may_be_set_by_source_name() {
    let pro_que = misc_pro_que(DS_LEN);
    let buffer = pro_que.buffer_builder::<f32>().fill_val(1.0).build().unwrap();

    let kernel = pro_que.kernel_builder("multiply")
        .arg(&buffer)
        .arg(0.0f32)
        .build().unwrap();
    assert_eq!(kernel.name(), "multiply");
    assert_eq!(kernel.num_args(), 2);

    kernel.set_arg("coeff", 3.0f32).unwrap();
    kernel.enq().unwrap();

    let mut vec = vec![0.0f32; DS_LEN];
    buffer.read(&mut vec).enq().unwrap();
    assert!(vec.iter().all(|&v| v == 3.0));
}

#[test]
fn mismatched_arg_type_is_rejected() {
    let pro_que = misc_pro_que(DS_LEN);
    let buffer = pro_que.create_buffer::<f32>().unwrap();

    // `addend` is declared as a float.
    match pro_que.kernel_builder("add").arg(&buffer).arg(10.0f64).build() {
        Err(Error::Kernel(KernelError::ArgTypeMismatch { idx, ref arg_name, .. })) => {
            assert_eq!(idx, 1);
            assert_eq!(arg_name, "addend");
        },
        other => panic!("expected a type mismatch, found: {:?}", other.map(|k| k.name())),
    }

    let kernel = pro_que.kernel_builder("add").arg(&buffer).arg(10.0f32).build().unwrap();
    let u32_buffer = pro_que.create_buffer::<u32>().unwrap();
    match kernel.set_arg(0u32, &u32_buffer) {
        Err(Error::Kernel(KernelError::ArgTypeMismatch { idx: 0, .. })) => (),
        other => panic!("expected a type mismatch, found: {:?}", other),
    }
}

#[test]
fn wrong_arg_count_is_rejected() {
    let pro_que = misc_pro_que(DS_LEN);
    let buffer = pro_que.create_buffer::<f32>().unwrap();

    match pro_que.kernel_builder("add").arg(&buffer).build() {
        Err(Error::Kernel(KernelError::BuilderWrongArgCount { required, specified })) => {
            assert_eq!((required, specified), (2, 1));
        },
        other => panic!("expected a wrong arg count, found: {:?}", other.map(|k| k.name())),
    }
}

#[test]
fn unknown_arg_name_is_rejected() {
    let pro_que = misc_pro_que(DS_LEN);
    let buffer = pro_que.create_buffer::<f32>().unwrap();
    let kernel = pro_que.kernel_builder("add").arg(&buffer).arg(1.0f32).build().unwrap();

    match kernel.set_arg("subtrahend", 1.0f32) {
        Err(Error::Kernel(KernelError::NamedArgsInvalidArgName(ref name))) => {
            assert_eq!(name, "subtrahend");
        },
        other => panic!("expected an invalid arg name, found: {:?}", other),
    }
    assert_eq!(kernel.named_arg_idx("subtrahend"), None);
    assert_eq!(kernel.named_arg_idx("addend"), Some(1));
}
