pub mod project;

use serde::Deserialize;

use crate::cuda::API_PREFIX;
use crate::opencl::DEFAULT_DEVICE_TYPE;

/// Knobs of one translation run.
///
/// Every field has a default, so a `[translate]` table only needs the keys
/// it changes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslateOptions {
    /// Function whose body receives OpenCL setup and teardown.
    pub entry_point: String,
    /// Naming prefix that marks runtime API calls.
    pub api_prefix: String,
    /// Device class passed to `clGetDeviceIDs`.
    pub device_type: String,
    pub program_source: ProgramSource,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            entry_point: "main".to_string(),
            api_prefix: API_PREFIX.to_string(),
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
            program_source: ProgramSource::default(),
        }
    }
}

/// Host identifiers holding the kernel program text handed to
/// `clCreateProgramWithSource`. The kernel-source artifact itself is not
/// produced, so the user supplies these.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgramSource {
    pub count: String,
    pub strings: String,
    pub lengths: String,
}

impl Default for ProgramSource {
    fn default() -> Self {
        Self {
            count: "count".to_string(),
            strings: "strings".to_string(),
            lengths: "lengths".to_string(),
        }
    }
}
