//! Sparkplug data types and the typed values a metric can carry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed Sparkplug-B data-type table.
///
/// Tags are fixed by the protocol: the name/tag mapping is a bijection over
/// 0..=34 and tag 0 (`Unknown`) is reserved, never attached to a real sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum DataType {
    Unknown,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Boolean,
    String,
    DateTime,
    Text,
    Uuid,
    DataSet,
    Bytes,
    File,
    Template,
    PropertySet,
    PropertySetList,
    Int8Array,
    Int16Array,
    Int32Array,
    Int64Array,
    UInt8Array,
    UInt16Array,
    UInt32Array,
    UInt64Array,
    FloatArray,
    DoubleArray,
    BooleanArray,
    StringArray,
    DateTimeArray,
}

/// All 35 data types, in tag order.
pub const ALL_DATA_TYPES: [DataType; 35] = [
    DataType::Unknown,
    DataType::Int8,
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::UInt8,
    DataType::UInt16,
    DataType::UInt32,
    DataType::UInt64,
    DataType::Float,
    DataType::Double,
    DataType::Boolean,
    DataType::String,
    DataType::DateTime,
    DataType::Text,
    DataType::Uuid,
    DataType::DataSet,
    DataType::Bytes,
    DataType::File,
    DataType::Template,
    DataType::PropertySet,
    DataType::PropertySetList,
    DataType::Int8Array,
    DataType::Int16Array,
    DataType::Int32Array,
    DataType::Int64Array,
    DataType::UInt8Array,
    DataType::UInt16Array,
    DataType::UInt32Array,
    DataType::UInt64Array,
    DataType::FloatArray,
    DataType::DoubleArray,
    DataType::BooleanArray,
    DataType::StringArray,
    DataType::DateTimeArray,
];

impl DataType {
    /// Numeric wire tag for this data type.
    pub fn tag(&self) -> u32 {
        *self as u32
    }

    /// Look up a data type by its wire tag.
    pub fn from_tag(tag: u32) -> Option<DataType> {
        ALL_DATA_TYPES.get(tag as usize).copied()
    }

    /// Protocol name for this data type.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Unknown => "Unknown",
            DataType::Int8 => "Int8",
            DataType::Int16 => "Int16",
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::UInt8 => "UInt8",
            DataType::UInt16 => "UInt16",
            DataType::UInt32 => "UInt32",
            DataType::UInt64 => "UInt64",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::Boolean => "Boolean",
            DataType::String => "String",
            DataType::DateTime => "DateTime",
            DataType::Text => "Text",
            DataType::Uuid => "UUID",
            DataType::DataSet => "DataSet",
            DataType::Bytes => "Bytes",
            DataType::File => "File",
            DataType::Template => "Template",
            DataType::PropertySet => "PropertySet",
            DataType::PropertySetList => "PropertySetList",
            DataType::Int8Array => "Int8Array",
            DataType::Int16Array => "Int16Array",
            DataType::Int32Array => "Int32Array",
            DataType::Int64Array => "Int64Array",
            DataType::UInt8Array => "UInt8Array",
            DataType::UInt16Array => "UInt16Array",
            DataType::UInt32Array => "UInt32Array",
            DataType::UInt64Array => "UInt64Array",
            DataType::FloatArray => "FloatArray",
            DataType::DoubleArray => "DoubleArray",
            DataType::BooleanArray => "BooleanArray",
            DataType::StringArray => "StringArray",
            DataType::DateTimeArray => "DateTimeArray",
        }
    }

    /// Look up a data type by its protocol name.
    pub fn from_name(name: &str) -> Option<DataType> {
        ALL_DATA_TYPES.iter().copied().find(|d| d.name() == name)
    }

    /// Whether this data type is an integer-like scalar.
    ///
    /// All eight integer widths share the single 32-bit value slot on the
    /// wire, regardless of declared width or signedness.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }
}

impl From<DataType> for u32 {
    fn from(d: DataType) -> u32 {
        d.tag()
    }
}

/// Error for an out-of-table tag during deserialization.
#[derive(Debug, Error)]
#[error("unknown datatype tag {0}")]
pub struct UnknownTag(pub u32);

impl TryFrom<u32> for DataType {
    type Error = UnknownTag;

    fn try_from(tag: u32) -> Result<DataType, UnknownTag> {
        DataType::from_tag(tag).ok_or(UnknownTag(tag))
    }
}

/// A typed metric value, one wire slot active per metric.
///
/// Variant names mirror the value fields of the Sparkplug metric schema.
/// `Int` is the shared 32-bit container every integer-like data type narrows
/// into, regardless of declared width or signedness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    #[serde(rename = "intValue")]
    Int(u32),
    #[serde(rename = "floatValue")]
    Float(f32),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    #[serde(rename = "stringValue")]
    String(String),
}

impl MetricValue {
    /// Name of the active value slot.
    pub fn slot_name(&self) -> &'static str {
        match self {
            MetricValue::Int(_) => "int",
            MetricValue::Float(_) => "float",
            MetricValue::Double(_) => "double",
            MetricValue::Boolean(_) => "boolean",
            MetricValue::String(_) => "string",
        }
    }

    /// Whether this value fills the slot `data_type` encodes into.
    pub fn matches(&self, data_type: DataType) -> bool {
        match self {
            MetricValue::Boolean(_) => data_type == DataType::Boolean,
            MetricValue::String(_) => data_type == DataType::String,
            MetricValue::Float(_) => data_type == DataType::Float,
            MetricValue::Double(_) => data_type == DataType::Double,
            MetricValue::Int(_) => data_type.is_integer(),
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            MetricValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetricValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Int(v)
    }
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Float(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Double(v)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Boolean(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::String(v.to_string())
    }
}
