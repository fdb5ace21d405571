//! Builds kernel source and prints what the program reports about the
//! kernels it declares: their arguments and their work-group limits on the
//! device.
//!
//! Usage: `kernel_info [file] [kernel]`. Without a file every file under
//! `demos/kernels/` is inspected. Without a kernel name every kernel in the
//! file is.

use std::path::PathBuf;
use find_folder::Search;
use ocl_harness::core::{self, DeviceId};
use ocl_harness::enums::{KernelArgInfo, KernelInfo, KernelInfoResult, KernelWorkGroupInfo,
    ProgramBuildInfo};
use ocl_harness::{Context, KernelLibrary, Program, Result};
use ocl_harness::builders::ProgramBuilder;
use harness_extras::kernels;

static TAB: &str = "    ";

fn families() -> Vec<(&'static str, KernelLibrary)> {
    vec![
        ("bitonic.cl", kernels::bitonic::library()),
        ("events.cl", kernels::events::library()),
        ("fft.cl", kernels::fft::library()),
        ("image.cl", kernels::image::library()),
        ("interop.cl", kernels::interop::library()),
        ("matrix.cl", kernels::matrix::library()),
        ("misc.cl", kernels::misc::library()),
        ("radix.cl", kernels::radix::library()),
        ("reduction.cl", kernels::reduction::library()),
        ("search.cl", kernels::search::library()),
    ]
}

fn print_kernel(program: &Program, name: &str, device: &DeviceId) -> Result<()> {
    let kernel = core::create_kernel(program.as_core(), name)?;
    let num_args = match core::get_kernel_info(&kernel, KernelInfo::NumArgs)? {
        KernelInfoResult::NumArgs(n) => n,
        other => return Err(format!("unexpected kernel info: {}", other).into()),
    };
    println!("{}{} ({} arguments)", TAB, core::get_kernel_info(&kernel, KernelInfo::FunctionName)?,
        num_args);

    for idx in 0..num_args {
        println!("{t}{t}[{}] {} {} {} {}", idx,
            core::get_kernel_arg_info(&kernel, idx, KernelArgInfo::AddressQualifier)?,
            core::get_kernel_arg_info(&kernel, idx, KernelArgInfo::AccessQualifier)?,
            core::get_kernel_arg_info(&kernel, idx, KernelArgInfo::TypeName)?,
            core::get_kernel_arg_info(&kernel, idx, KernelArgInfo::Name)?,
            t = TAB);
    }
    for &(label, info) in &[
        ("Work-group size", KernelWorkGroupInfo::WorkGroupSize),
        ("Preferred multiple", KernelWorkGroupInfo::PreferredWorkGroupSizeMultiple),
        ("Local memory", KernelWorkGroupInfo::LocalMemSize),
        ("Private memory", KernelWorkGroupInfo::PrivateMemSize),
    ] {
        println!("{t}{t}{}: {}", label, core::get_kernel_work_group_info(&kernel, device, info)?,
            t = TAB);
    }
    Ok(())
}

fn inspect(context: &Context, path: PathBuf, library: KernelLibrary, kernel: Option<&str>)
        -> Result<()> {
    let device = context.devices()[0].clone();
    let mut builder = ProgramBuilder::new();
    builder.src_file(path.clone()).kernels(library);
    let program = builder.build(context)?;

    println!("{} ({}):", path.display(),
        program.build_info(&device, ProgramBuildInfo::BuildStatus)?);
    match kernel {
        Some(name) => print_kernel(&program, name, device.as_core())?,
        None => for name in program.kernel_names()? {
            print_kernel(&program, &name, device.as_core())?;
        },
    }
    Ok(())
}

fn kernel_info() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (file, kernel) = (args.next(), args.next());
    let context = Context::builder().build()?;
    println!("{}", context);

    match file {
        Some(file) => {
            // Native bodies for any kernel the demos ship.
            inspect(&context, PathBuf::from(file), kernels::all(), kernel.as_deref())
        },
        None => {
            let kernel_dir = Search::ParentsThenKids(3, 3).for_folder("demos")
                .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?
                .join("kernels");
            for (file, library) in families() {
                inspect(&context, kernel_dir.join(file), library, None)?;
            }
            Ok(())
        },
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = kernel_info() {
        println!("{}", err);
        std::process::exit(1);
    }
}
