//! # Dense Matrix Engine
//!
//! A fixed-shape, row-major matrix of `f64` values. Every structure above this
//! module (layers, networks, optimizer state, replay memory) is built from
//! matrices sized once at construction, and every arithmetic operation here
//! writes into storage that already exists. Nothing in the training or
//! inference path allocates.
//!
//! ## Shape contract
//!
//! Operations do not validate operand shapes in release builds. Each one
//! documents its precondition and checks it with `debug_assert!`, so a shape
//! error is a panic in debug builds and unspecified numeric garbage otherwise.
//!
//! ## Binary format
//!
//! ```text
//! [rows: i32][columns: i32][rows * columns f64 values, row-major]
//! ```
//!
//! Integers and floats are fixed-width little-endian (bincode's default
//! encoding). There is no header, magic number or version tag.

use ndarray::linalg::general_mat_mul;
use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};
use ndarray_rand::rand_distr::Uniform;
use rand::Rng;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};
use std::path::Path;

use crate::error::{PallasError, Result};

const MAX_RESERVED_VALUES: usize = 1 << 16;

/// A dense two-dimensional buffer of `f64` values with an immutable shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    data: Array2<f64>,
}

impl Matrix {
    /// Create a zero-filled matrix.
    pub fn new(rows: usize, columns: usize) -> Self {
        Matrix {
            data: Array2::zeros((rows, columns)),
        }
    }

    /// The sentinel returned by [`Matrix::read`] when a record cannot be read:
    /// zero rows, zero columns and no storage.
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    /// Build a matrix from row-major values.
    pub fn from_shape_vec(rows: usize, columns: usize, values: Vec<f64>) -> Result<Self> {
        let actual = values.len();
        let data = Array2::from_shape_vec((rows, columns), values).map_err(|_| {
            PallasError::dimension_mismatch(
                format!("{} values", rows * columns),
                format!("{} values", actual),
            )
        })?;
        Ok(Matrix { data })
    }

    pub fn from_array(data: Array2<f64>) -> Self {
        // Force standard layout so row-major iteration matches the file format.
        Matrix {
            data: data.as_standard_layout().into_owned(),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn columns(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Number of elements, `rows * columns`.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn as_array_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.data[[row, column]]
    }

    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        self.data[[row, column]] = value;
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, f64> {
        self.data.row(row)
    }

    pub fn row_mut(&mut self, row: usize) -> ArrayViewMut1<'_, f64> {
        self.data.row_mut(row)
    }

    /// Copy `values` into `row`, starting at `column`.
    ///
    /// Precondition: `column + values.len() <= self.columns()`.
    pub fn set_row_segment(&mut self, row: usize, column: usize, values: &[f64]) {
        debug_assert!(column + values.len() <= self.columns());
        let mut target = self.data.row_mut(row);
        for (dst, &src) in target.iter_mut().skip(column).zip(values) {
            *dst = src;
        }
    }

    /// Copy `length` values of `src`'s row `src_row` starting at `src_column`
    /// into this matrix's row `row` starting at `column`.
    pub fn copy_row_segment(
        &mut self,
        row: usize,
        column: usize,
        src: &Matrix,
        src_row: usize,
        src_column: usize,
        length: usize,
    ) {
        debug_assert!(column + length <= self.columns());
        debug_assert!(src_column + length <= src.columns());
        let source = src.data.row(src_row);
        let mut target = self.data.row_mut(row);
        for (dst, &value) in target
            .iter_mut()
            .skip(column)
            .zip(source.iter().skip(src_column))
            .take(length)
        {
            *dst = value;
        }
    }

    /// Set every element to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Element-wise assignment from a matrix of the same shape.
    pub fn copy_from(&mut self, src: &Matrix) {
        debug_assert_eq!(self.shape(), src.shape());
        self.data.assign(&src.data);
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Draw every element uniformly from `[min, max]`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, min: f64, max: f64, rng: &mut R) {
        let dist = Uniform::new_inclusive(min, max);
        self.data.mapv_inplace(|_| rng.sample(&dist));
    }

    /// `result = a + b`. All three shapes must be equal.
    pub fn sum_into(a: &Matrix, b: &Matrix, result: &mut Matrix) {
        debug_assert_eq!(a.shape(), b.shape());
        debug_assert_eq!(a.shape(), result.shape());
        ndarray::Zip::from(&mut result.data)
            .and(&a.data)
            .and(&b.data)
            .for_each(|r, &x, &y| *r = x + y);
    }

    /// `result = a - b`. All three shapes must be equal.
    pub fn difference_into(a: &Matrix, b: &Matrix, result: &mut Matrix) {
        debug_assert_eq!(a.shape(), b.shape());
        debug_assert_eq!(a.shape(), result.shape());
        ndarray::Zip::from(&mut result.data)
            .and(&a.data)
            .and(&b.data)
            .for_each(|r, &x, &y| *r = x - y);
    }

    /// Element-wise (Hadamard) product in place.
    pub fn odot(&mut self, src: &Matrix) {
        debug_assert_eq!(self.shape(), src.shape());
        self.data.zip_mut_with(&src.data, |d, &s| *d *= s);
    }

    /// `result = a · b`.
    ///
    /// Precondition: `a` is `r x k`, `b` is `k x c`, `result` is `r x c`.
    pub fn dot_into(a: &Matrix, b: &Matrix, result: &mut Matrix) {
        debug_assert_eq!(a.columns(), b.rows());
        debug_assert_eq!(result.shape(), (a.rows(), b.columns()));
        general_mat_mul(1.0, &a.data, &b.data, 0.0, &mut result.data);
    }

    /// `result = mᵗ`.
    pub fn transpose_into(m: &Matrix, result: &mut Matrix) {
        debug_assert_eq!(result.shape(), (m.columns(), m.rows()));
        result.data.assign(&m.data.t());
    }

    /// `result = (a · b)ᵗ`, computed as `bᵗ · aᵗ` without an intermediate.
    ///
    /// Precondition: `a` is `r x k`, `b` is `k x c`, `result` is `c x r`.
    pub fn dot_transpose_into(a: &Matrix, b: &Matrix, result: &mut Matrix) {
        debug_assert_eq!(a.columns(), b.rows());
        debug_assert_eq!(result.shape(), (b.columns(), a.rows()));
        general_mat_mul(1.0, &b.data.t(), &a.data.t(), 0.0, &mut result.data);
    }

    /// Sum `m` over its rows, transpose the resulting row into a column and
    /// replicate that column across every column of `result`.
    ///
    /// Precondition: `m` is `n x c`, `result` is `c x k` for any `k >= 1`.
    /// Reduces a `batch x out` delta matrix into the broadcast `out x batch`
    /// bias gradient.
    pub fn sum_rows_transpose_into(m: &Matrix, result: &mut Matrix) {
        debug_assert_eq!(result.rows(), m.columns());
        for (column, mut out) in m
            .data
            .axis_iter(Axis(1))
            .zip(result.data.axis_iter_mut(Axis(0)))
        {
            out.fill(column.sum());
        }
    }

    /// Apply `f` to every element in place.
    pub fn apply<F: FnMut(f64) -> f64>(&mut self, f: F) {
        self.data.mapv_inplace(f);
    }

    /// L2 norm over all elements.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.data.sum() / self.len() as f64
    }

    /// Serialize as `[rows][columns][values]`.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        bincode::serialize_into(&mut *writer, &(self.rows() as i32))?;
        bincode::serialize_into(&mut *writer, &(self.columns() as i32))?;
        for value in self.data.iter() {
            bincode::serialize_into(&mut *writer, value)?;
        }
        Ok(())
    }

    /// Read one matrix record, reporting why it failed.
    pub fn try_read<R: Read>(reader: &mut R) -> Result<Self> {
        let (rows, columns) = Self::read_header(reader)?;
        Self::read_values(reader, rows, columns)
    }

    /// Read the `[rows][columns]` header of a record. Both dimensions must be
    /// positive and their product must fit in `usize`.
    pub fn read_header<R: Read>(reader: &mut R) -> Result<(usize, usize)> {
        let rows: i32 = bincode::deserialize_from(&mut *reader)?;
        let columns: i32 = bincode::deserialize_from(&mut *reader)?;
        if rows <= 0 || columns <= 0 {
            return Err(PallasError::SerializationError(format!(
                "non-positive matrix dimensions {}x{}",
                rows, columns
            )));
        }
        let (rows, columns) = (rows as usize, columns as usize);
        if rows.checked_mul(columns).is_none() {
            return Err(PallasError::SerializationError(format!(
                "matrix dimensions {}x{} overflow",
                rows, columns
            )));
        }
        Ok((rows, columns))
    }

    /// Read the `rows * columns` values following a header.
    ///
    /// The header is untrusted, so storage grows with the values actually read
    /// and a truncated record fails with [`PallasError::ShortRead`] before any
    /// large allocation.
    pub fn read_values<R: Read>(reader: &mut R, rows: usize, columns: usize) -> Result<Self> {
        let len = rows.checked_mul(columns).ok_or_else(|| {
            PallasError::SerializationError(format!("matrix dimensions {}x{} overflow", rows, columns))
        })?;
        let mut values = Vec::with_capacity(len.min(MAX_RESERVED_VALUES));
        for _ in 0..len {
            values.push(bincode::deserialize_from::<_, f64>(&mut *reader)?);
        }
        Self::from_shape_vec(rows, columns, values)
    }

    /// Read one matrix record. A short read or a non-positive dimension
    /// product yields [`Matrix::empty`] instead of an error.
    pub fn read<R: Read>(reader: &mut R) -> Self {
        Self::try_read(reader).unwrap_or_else(|_| Self::empty())
    }

    /// Read a single matrix from a file; the sentinel empty matrix if the file
    /// cannot be opened or read.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match File::open(path) {
            Ok(file) => Self::read(&mut BufReader::new(file)),
            Err(_) => Self::empty(),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl AddAssign<&Matrix> for Matrix {
    fn add_assign(&mut self, rhs: &Matrix) {
        debug_assert_eq!(self.shape(), rhs.shape());
        self.data.zip_mut_with(&rhs.data, |d, &s| *d += s);
    }
}

impl SubAssign<&Matrix> for Matrix {
    fn sub_assign(&mut self, rhs: &Matrix) {
        debug_assert_eq!(self.shape(), rhs.shape());
        self.data.zip_mut_with(&rhs.data, |d, &s| *d -= s);
    }
}

impl MulAssign<f64> for Matrix {
    fn mul_assign(&mut self, rhs: f64) {
        self.data.mapv_inplace(|v| v * rhs);
    }
}

impl DivAssign<f64> for Matrix {
    fn div_assign(&mut self, rhs: f64) {
        self.data.mapv_inplace(|v| v / rhs);
    }
}
