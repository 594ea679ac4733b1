//! CUDA source vocabulary: built-in variables, intrinsics, runtime calls.
//!
//! Everything the rewriters match on is named here, so matching is done
//! on resolved symbols rather than on re-printed source text.

/// Built-in index and dimension variables available in device code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinVar {
    ThreadIdx,
    BlockIdx,
    BlockDim,
    GridDim,
}

impl BuiltinVar {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "threadIdx" => Some(BuiltinVar::ThreadIdx),
            "blockIdx" => Some(BuiltinVar::BlockIdx),
            "blockDim" => Some(BuiltinVar::BlockDim),
            "gridDim" => Some(BuiltinVar::GridDim),
            _ => None,
        }
    }
}

/// Component of a `uint3`/`dim3` built-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn from_member(member: &str) -> Option<Self> {
        match member {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Names the resolver binds to CUDA built-ins when no user declaration
/// shadows them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Var(BuiltinVar),
    /// `__syncthreads()`
    SyncThreads,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(var) = BuiltinVar::from_name(name) {
            return Some(Builtin::Var(var));
        }
        match name {
            "__syncthreads" => Some(Builtin::SyncThreads),
            _ => None,
        }
    }
}

/// Default naming prefix of runtime API functions.
pub const API_PREFIX: &str = "cuda";

/// Runtime API entry points with a known translation (or a known refusal).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeCall {
    ThreadExit,
    ThreadSynchronize,
    SetDevice,
    Malloc,
    Free,
    Memcpy,
    Memset,
}

impl RuntimeCall {
    /// Look up a call by the part of its name after the API prefix:
    /// `Malloc` for `cudaMalloc`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "ThreadExit" => Some(RuntimeCall::ThreadExit),
            "ThreadSynchronize" => Some(RuntimeCall::ThreadSynchronize),
            "SetDevice" => Some(RuntimeCall::SetDevice),
            "Malloc" => Some(RuntimeCall::Malloc),
            "Free" => Some(RuntimeCall::Free),
            "Memcpy" => Some(RuntimeCall::Memcpy),
            "Memset" => Some(RuntimeCall::Memset),
            _ => None,
        }
    }

    /// Number of arguments the call takes.
    pub fn arity(&self) -> usize {
        match self {
            RuntimeCall::ThreadExit | RuntimeCall::ThreadSynchronize => 0,
            RuntimeCall::SetDevice | RuntimeCall::Free => 1,
            RuntimeCall::Malloc => 2,
            RuntimeCall::Memset => 3,
            RuntimeCall::Memcpy => 4,
        }
    }
}

/// Direction operand of `cudaMemcpy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemcpyKind {
    HostToHost,
    HostToDevice,
    DeviceToHost,
    DeviceToDevice,
}

impl MemcpyKind {
    /// Look up a kind by the part of its name after the API prefix:
    /// `MemcpyHostToDevice` for `cudaMemcpyHostToDevice`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "MemcpyHostToHost" => Some(MemcpyKind::HostToHost),
            "MemcpyHostToDevice" => Some(MemcpyKind::HostToDevice),
            "MemcpyDeviceToHost" => Some(MemcpyKind::DeviceToHost),
            "MemcpyDeviceToDevice" => Some(MemcpyKind::DeviceToDevice),
            _ => None,
        }
    }
}

/// Type names CUDA headers declare that the front-end never sees.
const HEADER_TYPE_NAMES: &[&str] = &[
    "dim3",
    "uint3",
    "int2",
    "int3",
    "int4",
    "uint2",
    "uint4",
    "float2",
    "float3",
    "float4",
    "double2",
    "double3",
    "double4",
    "char2",
    "char4",
    "uchar2",
    "uchar4",
    "uint",
    "ushort",
    "uchar",
    "cudaError",
    "cudaMemcpyKind",
    "cudaDeviceProp",
    "FILE",
];

/// True for identifiers that name a type declared in a header: the fixed
/// CUDA vector/handle types plus the `*_t` convention (`size_t`,
/// `cudaError_t`, `cudaStream_t`, ...).
pub fn is_header_type_name(name: &str) -> bool {
    HEADER_TYPE_NAMES.contains(&name) || (name.len() > 2 && name.ends_with("_t"))
}

/// The type constructed implicitly for launch-configuration operands.
pub const LAUNCH_SHAPE_TYPE: &str = "dim3";
