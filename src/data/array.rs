/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Named columns with scalar attributes, the value returned by every solver

use super::errors::{DataError, Result};
use crate::utils::math::interpolate_table;
use crate::utils::Vector3D;
use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Role of a column, the axes a plot or fit would use
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Independent variable, usually q
    X,
    /// Dependent variable, usually S(q)
    Y,
    /// Second independent variable
    Z,
    /// Third independent variable
    W,
}

/// Attribute value pinned to a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Float(f64),
    Int(i64),
    Text(String),
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
    ComplexVector(Vec<[f64; 2]>),
}

impl AttrValue {
    /// Scalar view of the value, integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<usize> for AttrValue {
    fn from(v: usize) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Vector(v)
    }
}

impl From<Vec<Vec<f64>>> for AttrValue {
    fn from(v: Vec<Vec<f64>>) -> Self {
        AttrValue::Matrix(v)
    }
}

impl From<Vector3D> for AttrValue {
    fn from(v: Vector3D) -> Self {
        AttrValue::Vector(v.to_array().to_vec())
    }
}

impl From<Vec<Vector3D>> for AttrValue {
    fn from(v: Vec<Vector3D>) -> Self {
        AttrValue::Matrix(v.iter().map(|p| p.to_array().to_vec()).collect())
    }
}

impl From<Vec<Complex64>> for AttrValue {
    fn from(v: Vec<Complex64>) -> Self {
        AttrValue::ComplexVector(v.iter().map(|c| [c.re, c.im]).collect())
    }
}

/// Serialized form, columns as plain vectors
#[derive(Serialize, Deserialize)]
struct DataArrayRecord {
    columns: Vec<(String, Vec<f64>)>,
    roles: Vec<(ColumnRole, usize)>,
    attrs: BTreeMap<String, AttrValue>,
}

/// Ordered named columns of equal length plus free-form attributes
///
/// The first pushed column takes the x role and the second the y role.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataArray {
    columns: Vec<(String, Array1<f64>)>,
    roles: BTreeMap<ColumnRole, usize>,
    attrs: BTreeMap<String, AttrValue>,
}

impl DataArray {
    /// Create an empty data array
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a data array from named columns
    pub fn from_columns<S: AsRef<str>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        let mut data = Self::new();
        for (name, values) in columns {
            data.push_column(name.as_ref(), values)?;
        }
        Ok(data)
    }

    /// Append a column, which must match the length of the existing ones
    pub fn push_column<V: Into<Array1<f64>>>(&mut self, name: &str, values: V) -> Result<()> {
        let values = values.into();
        if let Some((first, existing)) = self.columns.first() {
            if existing.len() != values.len() {
                return Err(DataError::LengthMismatch(format!(
                    "column '{}' has {} values, '{}' has {}",
                    name,
                    values.len(),
                    first,
                    existing.len()
                )));
            }
        }
        if self.columns.iter().any(|(n, _)| n == name) {
            return Err(DataError::InvalidData(format!("duplicate column '{name}'")));
        }
        let index = self.columns.len();
        match index {
            0 => {
                self.roles.insert(ColumnRole::X, 0);
            }
            1 => {
                self.roles.insert(ColumnRole::Y, 1);
            }
            _ => {}
        }
        self.columns.push((name.to_string(), values));
        Ok(())
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Result<&Array1<f64>> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Assign a role to a named column
    pub fn set_role(&mut self, role: ColumnRole, name: &str) -> Result<()> {
        let index = self
            .columns
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))?;
        self.roles.insert(role, index);
        Ok(())
    }

    /// Column holding a role
    pub fn role(&self, role: ColumnRole) -> Option<&Array1<f64>> {
        self.roles.get(&role).map(|&i| &self.columns[i].1)
    }

    /// The x column
    pub fn x(&self) -> Result<&Array1<f64>> {
        self.role(ColumnRole::X)
            .ok_or_else(|| DataError::MissingColumn("x role".to_string()))
    }

    /// The y column
    pub fn y(&self) -> Result<&Array1<f64>> {
        self.role(ColumnRole::Y)
            .ok_or_else(|| DataError::MissingColumn("y role".to_string()))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    /// True if there are no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pin an attribute
    pub fn set_attr<V: Into<AttrValue>>(&mut self, name: &str, value: V) {
        self.attrs.insert(name.to_string(), value.into());
    }

    /// Attribute by name
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Scalar attribute by name
    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attrs.get(name).and_then(AttrValue::as_f64)
    }

    /// All attributes
    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    /// Linear interpolation of y onto new x values, clamped at the ends
    pub fn interp(&self, x_new: &[f64]) -> Result<Vec<f64>> {
        let sorted = self.sorted_by_x()?;
        let x = sorted.x()?.to_vec();
        let y = sorted.y()?.to_vec();
        x_new
            .iter()
            .map(|&v| {
                interpolate_table(v, &x, &y).map_err(|e| DataError::InvalidData(e.to_string()))
            })
            .collect()
    }

    /// Copy with all rows sorted by ascending x
    pub fn sorted_by_x(&self) -> Result<DataArray> {
        let x = self.x()?;
        let mut order: Vec<usize> = (0..x.len()).collect();
        order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));
        Ok(self.select_rows(&order))
    }

    fn select_rows(&self, rows: &[usize]) -> DataArray {
        DataArray {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), rows.iter().map(|&i| c[i]).collect()))
                .collect(),
            roles: self.roles.clone(),
            attrs: self.attrs.clone(),
        }
    }

    fn bin_mean(&self, edges: &[f64], centers: Option<&[f64]>, fill: f64) -> Result<DataArray> {
        let x = self.x()?;
        let nbins = edges.len().saturating_sub(1);
        let mut sums = vec![vec![0.0; nbins]; self.columns.len()];
        let mut counts = vec![0usize; nbins];
        for (row, &xv) in x.iter().enumerate() {
            if xv < edges[0] || xv > edges[nbins] {
                continue;
            }
            let bin = (edges.partition_point(|&e| e <= xv)).clamp(1, nbins) - 1;
            counts[bin] += 1;
            for (c, (_, col)) in self.columns.iter().enumerate() {
                sums[c][bin] += col[row];
            }
        }
        let x_index = self.roles.get(&ColumnRole::X).copied().unwrap_or(0);
        let keep: Vec<usize> = match centers {
            Some(_) => (0..nbins).collect(),
            None => (0..nbins).filter(|&b| counts[b] > 0).collect(),
        };
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(c, (name, _))| {
                let values: Array1<f64> = keep
                    .iter()
                    .map(|&b| match centers {
                        Some(cs) if c == x_index => cs[b],
                        _ if counts[b] > 0 => sums[c][b] / counts[b] as f64,
                        _ => fill,
                    })
                    .collect();
                (name.clone(), values)
            })
            .collect();
        Ok(DataArray {
            columns,
            roles: self.roles.clone(),
            attrs: self.attrs.clone(),
        })
    }

    /// Reduce to at most `n` rows by averaging all columns in equal x intervals
    ///
    /// Empty intervals are dropped.
    pub fn prune_mean(&self, n: usize) -> Result<DataArray> {
        if n == 0 {
            return Err(DataError::InvalidData(
                "number of points must be positive".to_string(),
            ));
        }
        let x = self.x()?;
        if x.is_empty() {
            return Ok(self.clone());
        }
        let min = x.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let width = if max > min { (max - min) / n as f64 } else { 1.0 };
        let mut edges: Vec<f64> = (0..=n).map(|i| min + i as f64 * width).collect();
        edges[n] = edges[n].max(max);
        self.bin_mean(&edges, None, 0.0)
    }

    /// Average all columns in intervals around the given ascending x values
    ///
    /// Interval edges are the midpoints between neighbours; intervals without rows
    /// hold `fill`.
    pub fn bin_mean_onto(&self, centers: &[f64], fill: f64) -> Result<DataArray> {
        if centers.is_empty() {
            return Err(DataError::InvalidData("no target values".to_string()));
        }
        if centers.windows(2).any(|w| w[1] <= w[0]) {
            return Err(DataError::InvalidData(
                "target values must be strictly ascending".to_string(),
            ));
        }
        let n = centers.len();
        let half = if n > 1 {
            (centers[1] - centers[0]) / 2.0
        } else {
            f64::INFINITY
        };
        let last_half = if n > 1 {
            (centers[n - 1] - centers[n - 2]) / 2.0
        } else {
            f64::INFINITY
        };
        let mut edges = Vec::with_capacity(n + 1);
        edges.push(centers[0] - half);
        edges.extend(centers.windows(2).map(|w| 0.5 * (w[0] + w[1])));
        edges.push(centers[n - 1] + last_half);
        self.bin_mean(&edges, Some(centers), fill)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        let record = DataArrayRecord {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.to_vec()))
                .collect(),
            roles: self.roles.iter().map(|(&r, &i)| (r, i)).collect(),
            attrs: self.attrs.clone(),
        };
        Ok(serde_json::to_string(&record)?)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let record: DataArrayRecord = serde_json::from_str(json)?;
        let mut data = DataArray::new();
        for (name, values) in record.columns {
            data.push_column(&name, values)?;
        }
        for &(role, index) in &record.roles {
            if index >= data.columns.len() {
                return Err(DataError::InvalidData(format!(
                    "role {role:?} points to missing column {index}"
                )));
            }
        }
        data.roles = record.roles.into_iter().collect();
        data.attrs = record.attrs;
        Ok(data)
    }

    /// Write as JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
