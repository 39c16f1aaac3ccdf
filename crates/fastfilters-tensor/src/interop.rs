use ndarray::{ArrayD, ArrayViewD, IxDyn};

use crate::{Tensor, TensorError};

impl<T: Clone> Tensor<T> {
    /// Copy an ndarray view into a row-major tensor.
    ///
    /// Works for any memory order of the source view; the elements are read in
    /// logical row-major order.
    pub fn from_ndarray(array: ArrayViewD<'_, T>) -> Result<Self, TensorError> {
        let data = array.iter().cloned().collect::<Vec<_>>();
        Tensor::from_shape_vec(array.shape(), data)
    }
}

impl<T> Tensor<T> {
    /// Convert the tensor into an owned ndarray with the same shape.
    pub fn into_ndarray(self) -> Result<ArrayD<T>, TensorError> {
        let shape = self.shape().to_vec();
        let numel = self.numel();
        ArrayD::from_shape_vec(IxDyn(&shape), self.into_vec())
            .map_err(|_| TensorError::invalid_shape(shape.iter().product(), numel))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array, IxDyn};

    use crate::{Tensor, TensorError};

    #[test]
    fn test_from_ndarray_standard_layout() -> Result<(), TensorError> {
        let array = Array::from_shape_fn(IxDyn(&[2, 3]), |idx| (idx[0] * 3 + idx[1]) as f32);
        let tensor = Tensor::from_ndarray(array.view())?;
        assert_eq!(tensor.shape(), &[2, 3]);
        assert_eq!(tensor.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        Ok(())
    }

    #[test]
    fn test_from_ndarray_transposed_view() -> Result<(), TensorError> {
        let array = Array::from_shape_fn(IxDyn(&[2, 3]), |idx| (idx[0] * 3 + idx[1]) as u8);
        let tensor = Tensor::from_ndarray(array.t())?;
        assert_eq!(tensor.shape(), &[3, 2]);
        assert_eq!(tensor.as_slice(), &[0, 3, 1, 4, 2, 5]);
        Ok(())
    }

    #[test]
    fn test_into_ndarray() -> Result<(), TensorError> {
        let tensor = Tensor::from_shape_vec(&[2, 2, 1], vec![1u8, 2, 3, 4])?;
        let array = tensor.into_ndarray()?;
        assert_eq!(array.shape(), &[2, 2, 1]);
        assert_eq!(array[[1, 0, 0]], 3);
        Ok(())
    }
}
