//! Tensor geometry: element type, memory format and the four canonical extent axes
//! (batch, feature and two spatial axes).

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Element type stored in a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    F16,
    F32,
    I8,
    U8,
}

impl DataType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::F16 => 2,
            DataType::F32 => 4,
            DataType::I8 | DataType::U8 => 1,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::F16 => "f16",
            DataType::F32 => "f32",
            DataType::I8 => "i8",
            DataType::U8 => "u8",
        };
        write!(f, "{}", s)
    }
}

/// Memory format, i.e. the order in which the axes are laid out in memory,
/// from outermost to innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Bfyx,
    Yxfb,
    Byxf,
    Fyxb,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::Bfyx => "bfyx",
            Format::Yxfb => "yxfb",
            Format::Byxf => "byxf",
            Format::Fyxb => "fyxb",
        };
        write!(f, "{}", s)
    }
}

/// Size of a tensor along the batch, feature and spatial axes.
///
/// An axis set to `None` is collapsed: it does not count towards the
/// [rank](Extent::rank) of the extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    #[serde(default)]
    pub batch: Option<u32>,
    #[serde(default)]
    pub feature: Option<u32>,
    /// x and y
    #[serde(default)]
    pub spatial: [Option<u32>; 2],
}

impl Extent {
    /// Extent with all four axes populated.
    pub fn new(batch: u32, feature: u32, x: u32, y: u32) -> Self {
        Self {
            batch: Some(batch),
            feature: Some(feature),
            spatial: [Some(x), Some(y)],
        }
    }

    pub fn from_axes(batch: Option<u32>, feature: Option<u32>, spatial: [Option<u32>; 2]) -> Self {
        Self {
            batch,
            feature,
            spatial,
        }
    }

    fn axes(&self) -> impl Iterator<Item = Option<u32>> + '_ {
        [self.batch, self.feature]
            .into_iter()
            .chain(self.spatial.iter().copied())
    }

    /// Values of the populated axes, in batch, feature, x, y order.
    pub fn raw(&self) -> Vec<u32> {
        self.axes().flatten().collect()
    }

    /// Number of populated axes.
    pub fn rank(&self) -> usize {
        self.axes().flatten().count()
    }

    /// Number of elements spanned by the populated axes, or `None` if it does not fit in a
    /// `u64`. An extent without populated axes spans no element.
    pub fn count(&self) -> Option<u64> {
        if self.rank() == 0 {
            return Some(0);
        }
        self.axes()
            .flatten()
            .try_fold(1u64, |acc, v| acc.checked_mul(u64::from(v)))
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axes = self
            .axes()
            .map(|axis| axis.map_or_else(|| "_".to_string(), |v| v.to_string()))
            .join("x");
        write!(f, "{}", axes)
    }
}

/// Full description of a tensor: what it stores, how it is stored and how big it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    pub data_type: DataType,
    pub format: Format,
    pub extent: Extent,
}

impl Layout {
    pub fn new(data_type: DataType, format: Format, extent: Extent) -> Self {
        Self {
            data_type,
            format,
            extent,
        }
    }

    /// Number of bytes needed to store a tensor with this layout, without padding, or `None`
    /// if it does not fit in a `u64`.
    pub fn bytes_count(&self) -> Option<u64> {
        self.extent
            .count()?
            .checked_mul(self.data_type.size_in_bytes() as u64)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.data_type, self.format, self.extent)
    }
}
