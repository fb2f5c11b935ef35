//! Compilation policy — decides when to JIT-compile a function
//!
//! Uses call counts and loop counts from profiling to determine
//! when a function is "hot enough" to warrant compilation.

use super::counters::FunctionProfile;

/// Configuration for when to trigger JIT compilation
#[derive(Debug, Clone)]
pub struct CompilationPolicy {
    /// Call count threshold before compiling (default: 1000)
    pub call_threshold: u32,
    /// Loop iteration threshold before compiling (default: 10_000)
    pub loop_threshold: u32,
    /// Maximum bytecode size to compile (skip very large functions)
    pub max_function_size: usize,
}

impl CompilationPolicy {
    /// Create a policy with default thresholds
    pub fn new() -> Self {
        CompilationPolicy {
            call_threshold: 1000,
            loop_threshold: 10_000,
            max_function_size: 4096,
        }
    }

    /// Check if a function should be compiled based on its profile and code size
    pub fn should_compile(&self, profile: &FunctionProfile, code_size: usize) -> bool {
        // Don't compile if already available or in progress
        if profile.is_jit_available() || profile.compiling.load(std::sync::atomic::Ordering::Relaxed) {
            return false;
        }

        // Don't compile very large functions
        if code_size > self.max_function_size {
            return false;
        }

        let calls = profile.call_count.load(std::sync::atomic::Ordering::Relaxed);
        let loops = profile.loop_count.load(std::sync::atomic::Ordering::Relaxed);

        calls >= self.call_threshold || loops >= self.loop_threshold
    }
}

impl Default for CompilationPolicy {
    fn default() -> Self {
        Self::new()
    }
}
