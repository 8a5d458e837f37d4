use crate::error::{Result, TensorError};
use crate::kernels;
use crate::params::{Conv2dDims, Conv2dParams, PadMode, Pool2dDims, Pool2dParams};
use crate::shape::Shape;

/// An owned, contiguous, row-major f32 tensor.
///
/// A convenience wrapper pairing a buffer with its shape. Every method
/// validates shapes and delegates to the slice kernels in [`crate::kernels`],
/// returning a freshly allocated result.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: Shape,
}

impl Tensor {
    /// Create a new tensor from f32 data and a shape.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn new(data: Vec<f32>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {:?} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        Tensor { data, shape }
    }

    /// Fallible counterpart of [`Tensor::new`].
    pub fn from_vec(data: Vec<f32>, shape: Shape) -> Result<Self> {
        if data.len() != shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape })
    }

    /// Create a tensor with every element set to `value`.
    pub fn full(shape: Shape, value: f32) -> Self {
        let mut data = vec![0.0; shape.numel()];
        kernels::constant(&mut data, value);
        Tensor { data, shape }
    }

    /// Create a zero-filled tensor with the given shape.
    pub fn zeros(shape: Shape) -> Self {
        Self::full(shape, 0.0)
    }

    /// Create a tensor filled with ones with the given shape.
    pub fn ones(shape: Shape) -> Self {
        Self::full(shape, 1.0)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Element at a multi-dimensional index.
    pub fn get(&self, index: &[usize]) -> Result<f32> {
        Ok(self.data[self.shape.offset(index)?])
    }

    /// Run a flat element-wise kernel such as [`kernels::relu`] over the tensor.
    pub fn map(&self, kernel: fn(&[f32], &mut [f32]) -> Result<()>) -> Result<Tensor> {
        let mut out = vec![0.0; self.numel()];
        kernel(&self.data, &mut out)?;
        Ok(Tensor::new(out, self.shape.clone()))
    }

    /// Run a flat binary kernel such as [`kernels::add`] against a tensor of
    /// the same shape.
    pub fn zip_with(&self, other: &Tensor, kernel: fn(&[f32], &[f32], &mut [f32]) -> Result<()>) -> Result<Tensor> {
        self.expect_same_shape(other)?;
        let mut out = vec![0.0; self.numel()];
        kernel(&self.data, &other.data, &mut out)?;
        Ok(Tensor::new(out, self.shape.clone()))
    }

    fn expect_same_shape(&self, other: &Tensor) -> Result<()> {
        if self.shape != other.shape {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: other.shape.dims().to_vec(),
            });
        }
        Ok(())
    }

    /// Reshape the tensor, returning a new tensor with the same data but
    /// a different shape.
    ///
    /// The total number of elements must remain the same.
    pub fn reshape(&self, new_shape: Shape) -> Result<Tensor> {
        if self.shape.numel() != new_shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: new_shape.dims().to_vec(),
            });
        }
        let mut out = vec![0.0; self.numel()];
        kernels::reshape(&self.data, &mut out)?;
        Ok(Tensor::new(out, new_shape))
    }

    /// Drop axis `axis`, which must have size 1.
    pub fn squeeze(&self, axis: isize) -> Result<Tensor> {
        let axis = self.shape.resolve_axis(axis)?;
        if self.shape.dim(axis) != 1 {
            return Err(TensorError::InvalidParameter {
                op: "squeeze",
                reason: format!("axis {axis} of shape {} has size {}", self.shape, self.shape.dim(axis)),
            });
        }
        let mut dims = self.shape.dims().to_vec();
        dims.remove(axis);
        let mut out = vec![0.0; self.numel()];
        kernels::squeeze(&self.data, &mut out)?;
        Ok(Tensor::new(out, Shape::new(dims)))
    }

    /// Insert a size-1 axis at `axis`; valid positions are `-(ndim+1)..=ndim`.
    pub fn unsqueeze(&self, axis: isize) -> Result<Tensor> {
        let ndim = self.shape.ndim() as isize;
        let pos = if axis < 0 { axis + ndim + 1 } else { axis };
        if pos < 0 || pos > ndim {
            return Err(TensorError::InvalidAxis {
                axis,
                ndim: self.shape.ndim(),
            });
        }
        let mut dims = self.shape.dims().to_vec();
        dims.insert(pos as usize, 1);
        let mut out = vec![0.0; self.numel()];
        kernels::unsqueeze(&self.data, &mut out)?;
        Ok(Tensor::new(out, Shape::new(dims)))
    }

    /// Reorder axes: output axis `j` is input axis `perm[j]`.
    pub fn permute(&self, perm: &[usize]) -> Result<Tensor> {
        let dims = kernels::permuted_shape(self.shape.dims(), perm)?;
        let mut out = vec![0.0; self.numel()];
        kernels::transpose(&self.data, &mut out, self.shape.dims(), perm)?;
        Ok(Tensor::new(out, Shape::new(dims)))
    }

    /// Matrix multiplication of two 2D tensors.
    ///
    /// self is [m, k], other is [k, n], result is [m, n].
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor> {
        if self.shape.ndim() != 2 || other.shape.ndim() != 2 {
            return Err(TensorError::Other("matmul requires 2D tensors".to_string()));
        }

        let m = self.shape.dim(0);
        let k = self.shape.dim(1);
        let k2 = other.shape.dim(0);
        let n = other.shape.dim(1);

        if k != k2 {
            return Err(TensorError::MatmulMismatch { m, k, k2, n });
        }

        let mut out = vec![0.0; m * n];
        kernels::matmul(&self.data, &other.data, &mut out, m, k, n)?;
        Ok(Tensor::new(out, Shape::new(vec![m, n])))
    }

    fn along_axis(
        &self,
        axis: isize,
        kernel: fn(&[f32], &mut [f32], &[usize], isize) -> Result<()>,
    ) -> Result<Tensor> {
        let mut out = vec![0.0; self.numel()];
        kernel(&self.data, &mut out, self.shape.dims(), axis)?;
        Ok(Tensor::new(out, self.shape.clone()))
    }

    pub fn softmax(&self, axis: isize) -> Result<Tensor> {
        self.along_axis(axis, kernels::softmax)
    }

    pub fn log_softmax(&self, axis: isize) -> Result<Tensor> {
        self.along_axis(axis, kernels::log_softmax)
    }

    pub fn softmin(&self, axis: isize) -> Result<Tensor> {
        self.along_axis(axis, kernels::softmin)
    }

    /// Gated linear unit along `dim`, which is halved in the result.
    pub fn glu(&self, dim: isize) -> Result<Tensor> {
        let axis = self.shape.resolve_axis(dim)?;
        let mut dims = self.shape.dims().to_vec();
        dims[axis] /= 2;
        let mut out = vec![0.0; self.numel() / 2];
        kernels::glu(&self.data, &mut out, self.shape.dims(), dim)?;
        Ok(Tensor::new(out, Shape::new(dims)))
    }

    /// Stride-1 window of extent `extent` starting at `start`.
    pub fn slice(&self, start: &[usize], extent: &[usize]) -> Result<Tensor> {
        let out_shape = Shape::from_slice(extent);
        let mut out = vec![0.0; out_shape.numel()];
        kernels::slice(&self.data, self.shape.dims(), &mut out, extent, start)?;
        Ok(Tensor::new(out, out_shape))
    }

    /// Pad with `[before_0, after_0, before_1, after_1, ...]`.
    pub fn pad(&self, pads: &[usize], mode: PadMode) -> Result<Tensor> {
        let out_shape = Shape::new(kernels::padded_shape(self.shape.dims(), pads, mode)?);
        let mut out = vec![0.0; out_shape.numel()];
        kernels::pad(&self.data, &mut out, self.shape.dims(), pads, mode)?;
        Ok(Tensor::new(out, out_shape))
    }

    pub fn broadcast_to(&self, shape: &Shape) -> Result<Tensor> {
        let mut out = vec![0.0; shape.numel()];
        kernels::broadcast_to(&self.data, self.shape.dims(), &mut out, shape.dims())?;
        Ok(Tensor::new(out, shape.clone()))
    }

    /// Concatenate tensors of equal rank along `axis`; every other dim must agree.
    pub fn cat(tensors: &[&Tensor], axis: isize) -> Result<Tensor> {
        let first = tensors
            .first()
            .ok_or_else(|| TensorError::Other("cat requires at least one tensor".to_string()))?;
        let axis = first.shape.resolve_axis(axis)?;
        let mut dims = first.shape.dims().to_vec();
        let mut axis_lens = Vec::with_capacity(tensors.len());
        for t in tensors {
            let same_rest = t.shape.ndim() == dims.len()
                && (0..dims.len()).all(|d| d == axis || t.shape.dim(d) == dims[d]);
            if !same_rest {
                return Err(TensorError::ShapeMismatch {
                    expected: first.shape.dims().to_vec(),
                    got: t.shape.dims().to_vec(),
                });
            }
            axis_lens.push(t.shape.dim(axis));
        }
        dims[axis] = axis_lens.iter().sum();

        let (outer, _, inner) = first.shape.split_at_axis(axis);
        let out_shape = Shape::new(dims);
        let mut out = vec![0.0; out_shape.numel()];
        let inputs: Vec<&[f32]> = tensors.iter().map(|t| t.data()).collect();
        kernels::concat_axis(&inputs, &axis_lens, outer, inner, &mut out)?;
        Ok(Tensor::new(out, out_shape))
    }

    fn expect_rank(&self, op: &'static str, rank: usize) -> Result<()> {
        if self.shape.ndim() != rank {
            return Err(TensorError::InvalidParameter {
                op,
                reason: format!("expected a rank-{rank} tensor, got shape {}", self.shape),
            });
        }
        Ok(())
    }

    /// NHWC convolution with an `[kernel_h, kernel_w, in_channels, out_channels]` weight.
    pub fn conv2d(&self, weight: &Tensor, bias: Option<&Tensor>, params: &Conv2dParams) -> Result<Tensor> {
        self.expect_rank("conv2d", 4)?;
        weight.expect_rank("conv2d", 4)?;
        let d = self.shape.dims();
        let w = weight.shape.dims();
        if w[2] != d[3] {
            return Err(TensorError::ShapeMismatch {
                expected: vec![w[0], w[1], d[3], w[3]],
                got: w.to_vec(),
            });
        }
        let dims = Conv2dDims {
            batch: d[0],
            in_h: d[1],
            in_w: d[2],
            in_channels: d[3],
            kernel_h: w[0],
            kernel_w: w[1],
            out_channels: w[3],
        };
        let (out_h, out_w) = dims.output_hw(params)?;
        let mut out = vec![0.0; dims.output_len(params)?];
        kernels::conv2d(&self.data, &weight.data, bias.map(|b| b.data()), &mut out, &dims, params)?;
        Ok(Tensor::new(out, Shape::new(vec![dims.batch, out_h, out_w, dims.out_channels])))
    }

    fn pool2d(
        &self,
        op: &'static str,
        params: &Pool2dParams,
        kernel: fn(&[f32], &mut [f32], &Pool2dDims, &Pool2dParams) -> Result<()>,
    ) -> Result<Tensor> {
        self.expect_rank(op, 4)?;
        let d = self.shape.dims();
        let dims = Pool2dDims {
            batch: d[0],
            height: d[1],
            width: d[2],
            channels: d[3],
        };
        let (out_h, out_w) = dims.output_hw(params)?;
        let mut out = vec![0.0; dims.output_len(params)?];
        kernel(&self.data, &mut out, &dims, params)?;
        Ok(Tensor::new(out, Shape::new(vec![dims.batch, out_h, out_w, dims.channels])))
    }

    /// NHWC max pooling.
    pub fn max_pool2d(&self, params: &Pool2dParams) -> Result<Tensor> {
        self.pool2d("maxpool2d", params, kernels::maxpool2d)
    }

    /// NHWC average pooling, padding counted in the window area.
    pub fn avg_pool2d(&self, params: &Pool2dParams) -> Result<Tensor> {
        self.pool2d("avgpool2d", params, kernels::avgpool2d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn arange(shape: &[usize]) -> Tensor {
        let n: usize = shape.iter().product();
        Tensor::new((0..n).map(|i| i as f32).collect(), Shape::from_slice(shape))
    }

    #[test]
    fn test_new_tensor() {
        let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Shape::new(vec![2, 3]));
        assert_eq!(t.shape().ndim(), 2);
        assert_eq!(t.shape().dim(0), 2);
        assert_eq!(t.shape().dim(1), 3);
        assert_eq!(t.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(t.get(&[1, 0]).unwrap(), 4.0);
        assert!(t.get(&[2, 0]).is_err());
    }

    #[test]
    fn test_zeros_ones_full() {
        let z = Tensor::zeros(Shape::new(vec![2, 3]));
        assert_eq!(z.data(), &[0.0; 6]);

        let o = Tensor::ones(Shape::new(vec![3]));
        assert_eq!(o.data(), &[1.0, 1.0, 1.0]);

        let s = Tensor::full(Shape::scalar(), 4.0);
        assert_eq!(s.data(), &[4.0]);
    }

    #[test]
    fn test_from_vec_mismatch() {
        assert!(Tensor::from_vec(vec![1.0, 2.0], Shape::new(vec![3])).is_err());
    }

    #[test]
    #[should_panic]
    fn test_new_shape_mismatch_panics() {
        let _t = Tensor::new(vec![1.0, 2.0], Shape::new(vec![3]));
    }

    #[test]
    fn test_reshape() {
        let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Shape::new(vec![2, 3]));
        let r = t.reshape(Shape::new(vec![3, 2])).unwrap();
        assert_eq!(r.shape().dims(), &[3, 2]);
        assert_eq!(r.data(), t.data());
        let back = r.reshape(Shape::new(vec![2, 3])).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_reshape_mismatch() {
        let t = Tensor::new(vec![1.0, 2.0, 3.0], Shape::new(vec![3]));
        assert!(t.reshape(Shape::new(vec![2, 2])).is_err());
    }

    #[test]
    fn test_squeeze_unsqueeze() {
        let t = arange(&[2, 1, 3]);
        let s = t.squeeze(1).unwrap();
        assert_eq!(s.shape().dims(), &[2, 3]);
        assert!(t.squeeze(0).is_err());
        let u = s.unsqueeze(-1).unwrap();
        assert_eq!(u.shape().dims(), &[2, 3, 1]);
        let u = s.unsqueeze(0).unwrap();
        assert_eq!(u.shape().dims(), &[1, 2, 3]);
        assert!(s.unsqueeze(3).is_err());
    }

    #[test]
    fn test_map_and_zip_with() {
        let t = Tensor::new(vec![-1.0, 0.5, 2.0], Shape::new(vec![3]));
        let r = t.map(kernels::relu).unwrap();
        assert_eq!(r.data(), &[0.0, 0.5, 2.0]);
        let s = t.zip_with(&r, kernels::add).unwrap();
        assert_eq!(s.data(), &[-1.0, 1.0, 4.0]);
        let other = Tensor::zeros(Shape::new(vec![1, 3]));
        assert!(t.zip_with(&other, kernels::add).is_err());
    }

    #[test]
    fn test_matmul() {
        let a = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], Shape::new(vec![2, 2]));
        let b = Tensor::new(vec![5.0, 6.0, 7.0, 8.0], Shape::new(vec![2, 2]));
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape().dims(), &[2, 2]);
        assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul_dimension_mismatch() {
        let a = Tensor::new(vec![1.0, 2.0, 3.0], Shape::new(vec![1, 3]));
        let b = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], Shape::new(vec![2, 2]));
        assert!(matches!(a.matmul(&b), Err(TensorError::MatmulMismatch { .. })));
    }

    #[test]
    fn test_permute() {
        let t = arange(&[2, 3]);
        let p = t.permute(&[1, 0]).unwrap();
        assert_eq!(p.shape().dims(), &[3, 2]);
        assert_eq!(p.data(), &[0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let t = arange(&[3, 4]);
        let s = t.softmax(-1).unwrap();
        for row in s.data().chunks(4) {
            assert_abs_diff_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        }
        let l = t.log_softmax(1).unwrap();
        for (a, b) in s.data().iter().zip(l.data()) {
            assert_abs_diff_eq!(*a, b.exp(), epsilon = 1e-6);
        }
        assert!(t.softmin(2).is_err());
    }

    #[test]
    fn test_glu_halves_dim() {
        let t = Tensor::new(vec![1.0, 2.0, 0.0, 0.0], Shape::new(vec![1, 4]));
        let g = t.glu(-1).unwrap();
        assert_eq!(g.shape().dims(), &[1, 2]);
        assert_abs_diff_eq!(g.data()[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(g.data()[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_slice_and_pad() {
        let t = arange(&[4, 4]);
        let s = t.slice(&[1, 1], &[2, 2]).unwrap();
        assert_eq!(s.data(), &[5.0, 6.0, 9.0, 10.0]);
        let p = s.pad(&[0, 1, 1, 0], PadMode::Constant(-1.0)).unwrap();
        assert_eq!(p.shape().dims(), &[3, 3]);
        assert_eq!(p.data(), &[-1.0, 5.0, 6.0, -1.0, 9.0, 10.0, -1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_broadcast_to() {
        let t = Tensor::new(vec![1.0, 2.0], Shape::new(vec![2, 1]));
        let b = t.broadcast_to(&Shape::new(vec![2, 2])).unwrap();
        assert_eq!(b.data(), &[1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_cat_along_axes() {
        let a = arange(&[2, 2]);
        let b = Tensor::ones(Shape::new(vec![2, 1]));
        let c = Tensor::cat(&[&a, &b], 1).unwrap();
        assert_eq!(c.shape().dims(), &[2, 3]);
        assert_eq!(c.data(), &[0.0, 1.0, 1.0, 2.0, 3.0, 1.0]);

        let r = Tensor::cat(&[&a, &a], 0).unwrap();
        assert_eq!(r.shape().dims(), &[4, 2]);
        assert_eq!(&r.data()[4..], a.data());

        assert!(Tensor::cat(&[&a, &b], 0).is_err());
        assert!(Tensor::cat(&[], 0).is_err());
    }

    #[test]
    fn test_conv2d_and_pool_shapes() {
        let x = Tensor::new((1..=9).map(|i| i as f32).collect(), Shape::new(vec![1, 3, 3, 1]));
        let w = Tensor::new(vec![1.0, 0.0, 0.0, 1.0], Shape::new(vec![2, 2, 1, 1]));
        let y = x.conv2d(&w, None, &Conv2dParams::default()).unwrap();
        assert_eq!(y.shape().dims(), &[1, 2, 2, 1]);
        assert_eq!(y.data(), &[6.0, 8.0, 12.0, 14.0]);

        let p = x.max_pool2d(&Pool2dParams::square(2)).unwrap();
        assert_eq!(p.shape().dims(), &[1, 1, 1, 1]);
        assert_eq!(p.data(), &[5.0]);
        let a = x.avg_pool2d(&Pool2dParams::square(2)).unwrap();
        assert_eq!(a.data(), &[3.0]);
    }

    #[test]
    fn test_conv2d_rejects_channel_mismatch() {
        let x = Tensor::zeros(Shape::new(vec![1, 3, 3, 2]));
        let w = Tensor::zeros(Shape::new(vec![2, 2, 1, 1]));
        assert!(x.conv2d(&w, None, &Conv2dParams::default()).is_err());
        assert!(Tensor::zeros(Shape::new(vec![3, 3])).max_pool2d(&Pool2dParams::default()).is_err());
    }
}
