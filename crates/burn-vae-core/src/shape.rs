//! Integer shape arithmetic for convolution stacks.
//!
//! Dense layers need their input width at construction time, so model
//! configs walk the conv schedule with these formulae to size the flatten
//! boundary, and check that a transposed-conv decoder reproduces the
//! input resolution.

/// Output side length of a convolution with symmetric padding.
pub fn conv_out_dim(input: usize, kernel: usize, stride: usize, padding: usize) -> usize {
    (input + 2 * padding - kernel) / stride + 1
}

/// Output side length of a transposed convolution without padding.
pub fn conv_transpose_out_dim(input: usize, kernel: usize, stride: usize) -> usize {
    (input - 1) * stride + kernel
}

/// Symmetric padding that preserves the input size at stride 1 for odd
/// kernels; even kernels round down.
pub fn same_padding(kernel: usize) -> usize {
    (kernel - 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_schedule_dims() {
        // Kernel 4 convs at strides [2, 2, 2, 1] over a 28x28 input.
        let mut dim = 28;
        let mut dims = Vec::new();
        for stride in [2, 2, 2, 1] {
            dim = conv_out_dim(dim, 4, stride, same_padding(4));
            dims.push(dim);
        }
        assert_eq!(dims, vec![14, 7, 3, 2]);
    }

    #[test]
    fn decoder_schedule_reaches_input_resolution() {
        // Transposed convs from a 1x1 seed: kernels [4, 5, 5, 4] at
        // strides [2, 2, 2, 1] land exactly on 28.
        let mut dim = 1;
        for (kernel, stride) in [(4, 2), (5, 2), (5, 2), (4, 1)] {
            dim = conv_transpose_out_dim(dim, kernel, stride);
        }
        assert_eq!(dim, 28);
    }

    #[test]
    fn same_padding_preserves_odd_kernel_dims() {
        assert_eq!(conv_out_dim(28, 3, 1, same_padding(3)), 28);
        assert_eq!(conv_out_dim(28, 5, 1, same_padding(5)), 28);
    }
}
