use crate::tests::{build, default_queue, library, ADD_SRC};
use crate::{
    Error, KernelLibrary, ProgramBuildInfo, ProgramBuildInfoResult, ProgramBuildStatus,
    ProgramInfo, ProgramInfoResult, Status,
};

#[test]
#[should_panic]
fn unbalanced_braces() {
    let kernel = r#"
        kernel void add(global float* buffer, float addend) {
            buffer[get_global_id(0)] += addend;
    "#;

    let (_device, context, _queue) = default_queue(None);
    build(&context, kernel).unwrap();
}

#[test]
fn build_failure_carries_log() {
    let src = r#"
        __kernel void add(__global float* buffer, float addend) {
            buffer[get_global_id(0)] += addend;
        }

        __kernel void missing(__global float* buffer) {
            buffer[0] = 1.0f;
        }
    "#;

    let (device, context, _queue) = default_queue(None);
    let program = crate::create_program_with_source(&context, &[src.to_owned()], &library())
        .unwrap();

    let log = match crate::build_program(&program, None, "") {
        Err(Error::BuildFailed { log }) => log,
        other => panic!("expected a build failure, found: {:?}", other),
    };
    assert!(log.contains("<program source>:6: error: no native implementation of kernel \
        'missing'"), "log: {}", log);

    match crate::get_program_build_info(&program, &device, ProgramBuildInfo::BuildStatus).unwrap() {
        ProgramBuildInfoResult::BuildStatus(s) => assert_eq!(s, ProgramBuildStatus::Error),
        other => panic!("unexpected result: {:?}", other),
    }
    match crate::get_program_build_info(&program, &device, ProgramBuildInfo::BuildLog).unwrap() {
        ProgramBuildInfoResult::BuildLog(l) => assert_eq!(l, log),
        other => panic!("unexpected result: {:?}", other),
    }

    let err = crate::create_kernel(&program, "add").unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidProgramExecutable));
}

#[test]
fn unknown_build_option() {
    let (_device, context, _queue) = default_queue(None);
    let program = crate::create_program_with_source(&context, &[ADD_SRC.to_owned()], &library())
        .unwrap();

    match crate::build_program(&program, None, "-cl-no-such-thing") {
        Err(Error::BuildFailed { log }) => assert!(log.contains("-cl-no-such-thing")),
        other => panic!("expected a build failure, found: {:?}", other),
    }

    crate::build_program(&program, None, "-cl-fast-relaxed-math -D WIDTH=4").unwrap();
}

#[test]
fn unknown_entry_point() {
    let (_device, context, _queue) = default_queue(None);
    let program = build(&context, ADD_SRC).unwrap();

    match crate::create_kernel(&program, "subtract") {
        Err(Error::UnknownEntryPoint(ref name)) => assert_eq!(name, "subtract"),
        other => panic!("expected an unknown entry point, found: {:?}", other),
    }
}

#[test]
fn kernel_enumeration() {
    let src = r#"
        __kernel void add(__global float* buffer, float addend) {
            buffer[get_global_id(0)] += addend;
        }

        /* A prototype is not a definition. */
        __kernel void copy_u32(__global const uint* src, __global uint* dst);

        __kernel void copy_u32(__global const uint* src, __global uint* dst) {
            dst[get_global_id(0)] = src[get_global_id(0)];
        }
    "#;

    let (_device, context, _queue) = default_queue(None);
    let program = build(&context, src).unwrap();

    match crate::get_program_info(&program, ProgramInfo::KernelNames).unwrap() {
        ProgramInfoResult::KernelNames(names) => assert_eq!(names, "add;copy_u32"),
        other => panic!("unexpected result: {:?}", other),
    }

    let kernels = crate::create_kernels_in_program(&program).unwrap();
    let names: Vec<&str> = kernels.iter().map(|k| k.name()).collect();
    assert_eq!(names, ["add", "copy_u32"]);
    assert_eq!(kernels[1].signature().params[0].type_name, "uint*");
}

#[test]
fn rebuild_with_attached_kernels_fails() {
    let (_device, context, _queue) = default_queue(None);
    let program = build(&context, ADD_SRC).unwrap();

    let kernel = crate::create_kernel(&program, "add").unwrap();
    let err = crate::build_program(&program, None, "").unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidOperation));

    drop(kernel);
    crate::build_program(&program, None, "").unwrap();
}

#[test]
fn conditional_compilation_selects_kernels() {
    let src = r#"
        #ifdef USE_ADD
        __kernel void add(__global float* buffer, float addend) {
            buffer[get_global_id(0)] += addend;
        }
        #else
        __kernel void unavailable(__global float* buffer) { }
        #endif
    "#;

    let (_device, context, _queue) = default_queue(None);
    let lib = KernelLibrary::new().with("add", crate::tests::add);
    let program = crate::create_program_with_source(&context, &[src.to_owned()], &lib).unwrap();

    assert!(crate::build_program(&program, None, "").is_err());
    crate::build_program(&program, None, "-D USE_ADD").unwrap();
    crate::create_kernel(&program, "add").unwrap();
}
