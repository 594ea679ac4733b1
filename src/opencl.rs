//! OpenCL target vocabulary.
//!
//! Every piece of generated host or kernel text is spelled here. The
//! rewriters decide *what* to emit; this module decides how it reads.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::config::ProgramSource;
use crate::cuda::{Axis, BuiltinVar};

/// Opaque device-buffer handle type.
pub const BUFFER_TYPE: &str = "cl_mem";

/// Replacement for the declared type of a variable that receives a buffer.
pub const BUFFER_DECL: &str = "cl_mem ";

/// Barrier replacing `__syncthreads()`.
pub const LOCAL_BARRIER: &str = "barrier(CLK_LOCAL_MEM_FENCE)";

pub const RELEASE_CONTEXT: &str = "clReleaseContext(clContext)";

pub const FINISH_QUEUE: &str = "clFinish(clCommandQueue)";

pub const DEFAULT_DEVICE_TYPE: &str = "CL_DEVICE_TYPE_GPU";

/// Global handle of the kernel object created for `kernel`.
pub fn kernel_handle(kernel: &str) -> String {
    format!("clKernel_{}", kernel)
}

/// Work-item function replacing a built-in accessor.
pub fn work_item_query(var: BuiltinVar, axis: Axis) -> String {
    let function = match var {
        BuiltinVar::ThreadIdx => "get_local_id",
        BuiltinVar::BlockIdx => "get_group_id",
        BuiltinVar::BlockDim => "get_local_size",
        BuiltinVar::GridDim => "get_num_groups",
    };
    format!("{}({})", function, axis.index())
}

pub fn create_buffer(target: &str, size: &str) -> String {
    format!(
        "{} = clCreateBuffer(clContext, CL_MEM_READ_WRITE, {}, NULL, NULL)",
        target, size
    )
}

pub fn release_buffer(buffer: &str) -> String {
    format!("clReleaseMemObject({})", buffer)
}

/// Host-to-host copy stays a plain `memcpy`.
pub fn host_copy(dst: &str, src: &str, count: &str) -> String {
    format!("memcpy({}, {}, {})", dst, src, count)
}

pub fn write_buffer(dst: &str, src: &str, count: &str) -> String {
    format!(
        "clEnqueueWriteBuffer(clCommandQueue, {}, CL_TRUE, 0, {}, {}, 0, NULL, NULL)",
        dst, count, src
    )
}

pub fn read_buffer(dst: &str, src: &str, count: &str) -> String {
    format!(
        "clEnqueueReadBuffer(clCommandQueue, {}, CL_TRUE, 0, {}, {}, 0, NULL, NULL)",
        src, count, dst
    )
}

/// Device-to-device copy as a single queue operation.
pub fn copy_buffer(dst: &str, src: &str, count: &str) -> String {
    format!(
        "clEnqueueCopyBuffer(clCommandQueue, {}, {}, 0, 0, {}, 0, NULL, NULL)",
        src, dst, count
    )
}

/// One argument binding, terminated.
pub fn set_kernel_arg(kernel: &str, index: usize, size_type: &str, var: &str) -> String {
    format!(
        "clSetKernelArg({}, {}, sizeof({}), &{});\n",
        kernel_handle(kernel),
        index,
        size_type,
        var
    )
}

pub fn local_work_size(axis: usize, value: u64) -> String {
    format!("localWorkSize[{}] = {};\n", axis, value)
}

/// Grid operands count work-groups; OpenCL wants work-items.
pub fn global_work_size(axis: usize, groups: u64) -> String {
    format!(
        "globalWorkSize[{}] = {}*localWorkSize[{}];\n",
        axis, groups, axis
    )
}

/// The enqueue call. Unterminated: the launch statement's `;` closes it.
pub fn enqueue_kernel(kernel: &str) -> String {
    format!(
        "clEnqueueNDRangeKernel(clCommandQueue, {}, 3, NULL, globalWorkSize, localWorkSize, 0, NULL, NULL)",
        kernel_handle(kernel)
    )
}

/// Declarations inserted at the top of the translated file.
pub fn preamble(kernels: &BTreeSet<String>) -> String {
    let mut out = String::from(
        "#ifdef __APPLE__\n\
         #include <OpenCL/opencl.h>\n\
         #else\n\
         #include <CL/opencl.h>\n\
         #endif\n\n\
         cl_platform_id clPlatform;\n\
         cl_device_id clDevice;\n\
         cl_context clContext;\n\
         cl_command_queue clCommandQueue;\n\
         cl_program clProgram;\n\n\
         size_t globalWorkSize[3];\n\
         size_t localWorkSize[3];\n\n",
    );
    for kernel in kernels {
        let _ = writeln!(out, "cl_kernel {};", kernel_handle(kernel));
    }
    out
}

/// Handle acquisition, inserted right after the entry point's `{`.
pub fn init_block(kernels: &BTreeSet<String>, device_type: &str, source: &ProgramSource) -> String {
    let mut out = String::from("\n");
    out.push_str("clGetPlatformIDs(1, &clPlatform, NULL);\n");
    let _ = writeln!(
        out,
        "clGetDeviceIDs(clPlatform, {}, 1, &clDevice, NULL);",
        device_type
    );
    out.push_str("clContext = clCreateContext(NULL, 1, &clDevice, NULL, NULL, NULL);\n");
    out.push_str("clCommandQueue = clCreateCommandQueue(clContext, clDevice, 0, NULL);\n");
    let _ = writeln!(
        out,
        "clProgram = clCreateProgramWithSource(clContext, {}, {}, {}, NULL);",
        source.count, source.strings, source.lengths
    );
    out.push_str("clBuildProgram(clProgram, 1, &clDevice, NULL, NULL, NULL);\n");
    for kernel in kernels {
        let _ = writeln!(
            out,
            "{} = clCreateKernel(clProgram, \"{}\", NULL);",
            kernel_handle(kernel),
            kernel
        );
    }
    out
}

/// Handle release, inserted right before the entry point's `}`.
pub fn cleanup_block(kernels: &BTreeSet<String>) -> String {
    let mut out = String::from("\n");
    for kernel in kernels {
        let _ = writeln!(out, "clReleaseKernel({});", kernel_handle(kernel));
    }
    out.push_str("clReleaseProgram(clProgram);\n");
    out.push_str("clReleaseCommandQueue(clCommandQueue);\n");
    out.push_str("clReleaseContext(clContext);\n");
    out
}
