/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! WGSL shader sources for the GPU backend
//!
//! Each kernel is compiled with the f64 math preamble prepended. The
//! preamble provides software `sin_f64`/`cos_f64`/`exp_f64` because
//! the SPIR-V extended instruction set restricts those operations to
//! 16- and 32-bit floats; `sqrt` and `abs` are width-generic and the
//! kernels call them natively.

/// Software f64 transcendentals shared by every kernel
pub const MATH_F64_PREAMBLE: &str = include_str!("shaders/math_f64.wgsl");

/// F(Q) partial sums over a slice-partitioned pair range
pub const SHADER_FQ: &str = include_str!("shaders/debye_fq_f64.wgsl");

/// F(Q) partial sums with per-pair thermal damping
pub const SHADER_FQ_ADP: &str = include_str!("shaders/debye_fq_adp_f64.wgsl");

/// One-sided gradient accumulation, one thread per (atom, Q bin)
pub const SHADER_GRAD: &str = include_str!("shaders/debye_grad_f64.wgsl");

/// One-sided gradient accumulation with thermal damping
pub const SHADER_GRAD_ADP: &str = include_str!("shaders/debye_grad_adp_f64.wgsl");

/// Compose a kernel with the math preamble into one compilable module
pub fn with_math_f64(kernel: &str) -> String {
    format!("{MATH_F64_PREAMBLE}\n{kernel}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const KERNELS: &[(&str, &str)] = &[
        ("SHADER_FQ", SHADER_FQ),
        ("SHADER_FQ_ADP", SHADER_FQ_ADP),
        ("SHADER_GRAD", SHADER_GRAD),
        ("SHADER_GRAD_ADP", SHADER_GRAD_ADP),
    ];

    #[test]
    fn each_kernel_non_empty() {
        for (name, shader) in KERNELS {
            assert!(shader.len() > 100, "{name} should be substantial");
        }
    }

    #[test]
    fn each_kernel_has_compute_entry() {
        for (name, shader) in KERNELS {
            assert!(shader.contains("@compute"), "{name} must contain @compute");
            assert!(
                shader.contains("@workgroup_size(8, 8)"),
                "{name} must use the 8x8 workgroup"
            );
            assert!(shader.contains("fn main"), "{name} must expose fn main");
        }
    }

    #[test]
    fn each_kernel_has_binding_declarations() {
        for (name, shader) in KERNELS {
            assert!(shader.contains("@group(0)"), "{name} must bind group 0");
            assert!(
                shader.contains("var<storage, read_write>"),
                "{name} must declare an output buffer"
            );
        }
    }

    #[test]
    fn preamble_defines_every_helper_the_kernels_call() {
        for helper in ["fn sin_f64", "fn cos_f64", "fn exp_f64"] {
            assert!(
                MATH_F64_PREAMBLE.contains(helper),
                "preamble must define {helper}"
            );
        }
        for (name, shader) in KERNELS {
            let composed = with_math_f64(shader);
            assert!(
                composed.find("fn sin_f64") < composed.find("@compute"),
                "{name} must see the preamble before its entry point"
            );
        }
    }

    #[test]
    fn adp_kernels_bind_the_extra_buffer() {
        for (name, shader) in [("SHADER_FQ_ADP", SHADER_FQ_ADP), ("SHADER_GRAD_ADP", SHADER_GRAD_ADP)] {
            assert!(shader.contains("adps"), "{name} must bind the adps buffer");
            assert!(
                shader.contains("exp_f64"),
                "{name} must apply thermal damping"
            );
        }
        for (name, shader) in [("SHADER_FQ", SHADER_FQ), ("SHADER_GRAD", SHADER_GRAD)] {
            assert!(
                !shader.contains("adps"),
                "{name} must not reference adps"
            );
        }
    }
}
