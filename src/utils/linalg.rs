//! Small dense linear algebra helpers over flat row-major slices.
//!
//! The model internals operate on plain `f32` slices; matrices are stored
//! row-major as `rows * cols` contiguous values.

/// Dot product of two equally sized slices.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// `y = M x` for a row-major `rows x cols` matrix.
pub fn matvec(m: &[f32], rows: usize, cols: usize, x: &[f32]) -> Vec<f32> {
    debug_assert_eq!(m.len(), rows * cols);
    debug_assert_eq!(x.len(), cols);
    (0..rows).map(|r| dot(&m[r * cols..(r + 1) * cols], x)).collect()
}

/// `y = M^T x` for a row-major `rows x cols` matrix.
pub fn matvec_t(m: &[f32], rows: usize, cols: usize, x: &[f32]) -> Vec<f32> {
    debug_assert_eq!(m.len(), rows * cols);
    debug_assert_eq!(x.len(), rows);
    let mut y = vec![0.0; cols];
    for r in 0..rows {
        let row = &m[r * cols..(r + 1) * cols];
        for (c, &w) in row.iter().enumerate() {
            y[c] += w * x[r];
        }
    }
    y
}

/// `M += a x^T`: accumulate the outer product of `a` (rows) and `x` (cols).
pub fn outer_acc(m: &mut [f32], a: &[f32], x: &[f32]) {
    debug_assert_eq!(m.len(), a.len() * x.len());
    let cols = x.len();
    for (r, &ar) in a.iter().enumerate() {
        let row = &mut m[r * cols..(r + 1) * cols];
        for (c, &xc) in x.iter().enumerate() {
            row[c] += ar * xc;
        }
    }
}
