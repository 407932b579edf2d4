//! Convolution kernels.
//!
//! [`Kernel::generate`] builds a square `size × size` weight matrix for a
//! [`KernelKind`]. Weights are derived from the requested size rather than
//! stored as fixed 3×3/5×5 tables:
//!
//! | kind               | weights                                       | sum |
//! |--------------------|-----------------------------------------------|-----|
//! | `box_blur`         | `1/n²` everywhere                             | 1   |
//! | `gaussian_blur`    | outer product of binomial rows, normalised    | 1   |
//! | `motion_blur`      | `1/n` on the main diagonal                    | 1   |
//! | `sharpen`          | `-1` on the centre cross, centre `4c + 1`     | 1   |
//! | `edges_horizontal` | `±(c + 1 - |row - c|)` left/right of centre   | 0   |
//! | `edges_vertical`   | transpose of `edges_horizontal`               | 0   |
//! | `emboss`           | `(row - c) + (col - c)`, centre `1`           | 1   |
//! | `outline`          | `-1` everywhere, centre `n² - 1`              | 0   |
//!
//! where `n` is the size and `c = n / 2` the centre offset.

use crate::core::error::{OperationError, OperationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest supported kernel size.
pub const MIN_KERNEL_SIZE: u32 = 3;

/// Largest supported kernel size.
pub const MAX_KERNEL_SIZE: u32 = 255;

/// Named convolution kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    BoxBlur,
    GaussianBlur,
    /// Diagonal streak blur.
    MotionBlur,
    Sharpen,
    /// Responds to intensity changes along x.
    #[serde(rename = "edges_horizontal")]
    HorizontalEdge,
    /// Responds to intensity changes along y.
    #[serde(rename = "edges_vertical")]
    VerticalEdge,
    Emboss,
    Outline,
}

impl KernelKind {
    /// Every supported kind.
    pub const ALL: [KernelKind; 8] = [
        KernelKind::BoxBlur,
        KernelKind::GaussianBlur,
        KernelKind::MotionBlur,
        KernelKind::Sharpen,
        KernelKind::HorizontalEdge,
        KernelKind::VerticalEdge,
        KernelKind::Emboss,
        KernelKind::Outline,
    ];

    /// Stable identifier, shared with operation request types.
    pub fn id(&self) -> &'static str {
        match self {
            KernelKind::BoxBlur => "box_blur",
            KernelKind::GaussianBlur => "gaussian_blur",
            KernelKind::MotionBlur => "motion_blur",
            KernelKind::Sharpen => "sharpen",
            KernelKind::HorizontalEdge => "edges_horizontal",
            KernelKind::VerticalEdge => "edges_vertical",
            KernelKind::Emboss => "emboss",
            KernelKind::Outline => "outline",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            KernelKind::BoxBlur => "Box Blur",
            KernelKind::GaussianBlur => "Gaussian Blur",
            KernelKind::MotionBlur => "Motion Blur",
            KernelKind::Sharpen => "Sharpen",
            KernelKind::HorizontalEdge => "Horizontal Edges",
            KernelKind::VerticalEdge => "Vertical Edges",
            KernelKind::Emboss => "Emboss",
            KernelKind::Outline => "Outline",
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for KernelKind {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KernelKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| OperationError::UnsupportedKernel {
                kind: s.to_string(),
                size: MIN_KERNEL_SIZE,
            })
    }
}

/// A square matrix of convolution weights, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    kind: KernelKind,
    size: u32,
    weights: Vec<f32>,
}

impl Kernel {
    /// Generate the kernel for `kind` at `size`.
    ///
    /// Fails with `UnsupportedKernel` unless `size` is odd and within
    /// [`MIN_KERNEL_SIZE`]..=[`MAX_KERNEL_SIZE`].
    pub fn generate(kind: KernelKind, size: u32) -> OperationResult<Self> {
        if !(MIN_KERNEL_SIZE..=MAX_KERNEL_SIZE).contains(&size) || size % 2 == 0 {
            return Err(OperationError::unsupported_kernel(kind, size));
        }

        let n = size as usize;
        let c = (n / 2) as i64;
        let mut weights = vec![0.0f32; n * n];

        match kind {
            KernelKind::BoxBlur => {
                weights.fill(1.0 / (n * n) as f32);
            }
            KernelKind::GaussianBlur => {
                let row = binomial_row(n);
                let total: f64 = row.iter().sum::<f64>().powi(2);
                for (j, wy) in row.iter().enumerate() {
                    for (i, wx) in row.iter().enumerate() {
                        weights[j * n + i] = (wx * wy / total) as f32;
                    }
                }
            }
            KernelKind::MotionBlur => {
                for d in 0..n {
                    weights[d * n + d] = 1.0 / n as f32;
                }
            }
            KernelKind::Sharpen => {
                for d in 0..n {
                    weights[c as usize * n + d] = -1.0;
                    weights[d * n + c as usize] = -1.0;
                }
                weights[c as usize * n + c as usize] = (4 * c + 1) as f32;
            }
            KernelKind::HorizontalEdge | KernelKind::VerticalEdge => {
                for j in 0..n as i64 {
                    for i in 0..n as i64 {
                        let (across, along) = match kind {
                            KernelKind::HorizontalEdge => (i, j),
                            _ => (j, i),
                        };
                        let magnitude = (c + 1 - (along - c).abs()) as f32;
                        let sign = (c - across).signum() as f32;
                        weights[(j * n as i64 + i) as usize] = sign * magnitude;
                    }
                }
            }
            KernelKind::Emboss => {
                for j in 0..n as i64 {
                    for i in 0..n as i64 {
                        weights[(j * n as i64 + i) as usize] = ((j - c) + (i - c)) as f32;
                    }
                }
                weights[c as usize * n + c as usize] = 1.0;
            }
            KernelKind::Outline => {
                weights.fill(-1.0);
                weights[c as usize * n + c as usize] = (n * n - 1) as f32;
            }
        }

        Ok(Self { kind, size, weights })
    }

    /// The kind this kernel was generated for.
    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    /// Side length of the matrix.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Offset of the centre cell, `floor(size / 2)`.
    pub fn center(&self) -> u32 {
        self.size / 2
    }

    /// Weight at column `i`, row `j`.
    #[inline]
    pub fn weight(&self, i: u32, j: u32) -> f32 {
        self.weights[(j * self.size + i) as usize]
    }

    /// Row-major weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Rows of the matrix.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.weights.chunks(self.size as usize)
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// Row `n - 1` of Pascal's triangle.
fn binomial_row(n: usize) -> Vec<f64> {
    let mut row = vec![1.0f64];
    for _ in 1..n {
        let mut next = vec![1.0f64; row.len() + 1];
        for k in 1..row.len() {
            next[k] = row[k - 1] + row[k];
        }
        row = next;
    }
    row
}
