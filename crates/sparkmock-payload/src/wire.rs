//! Compact wire codec for the Sparkplug payload schema.
//!
//! Hand-written protobuf tag/length/value encoding, byte-exact with the
//! standard Sparkplug-B `Payload` message so real protocol consumers can
//! decode what the simulator publishes. Field numbers:
//!
//! ```text
//! Payload: timestamp = 1 (varint)   Metric: name          = 1  (len)
//!          metrics   = 2 (len)              timestamp     = 3  (varint)
//!          seq       = 3 (varint)           datatype      = 4  (varint)
//!                                           int_value     = 10 (varint)
//!                                           float_value   = 12 (fixed32)
//!                                           double_value  = 13 (fixed64)
//!                                           boolean_value = 14 (varint)
//!                                           string_value  = 15 (len)
//! ```
//!
//! The decoder exists for round-trip verification and tooling; it skips
//! fields it does not know about.

use crate::error::DecodeError;
use crate::payload::{Metric, Payload};
use crate::types::{DataType, MetricValue};

const PAYLOAD_TIMESTAMP: u32 = 1;
const PAYLOAD_METRICS: u32 = 2;
const PAYLOAD_SEQ: u32 = 3;

const METRIC_NAME: u32 = 1;
const METRIC_TIMESTAMP: u32 = 3;
const METRIC_DATATYPE: u32 = 4;
const METRIC_INT_VALUE: u32 = 10;
const METRIC_FLOAT_VALUE: u32 = 12;
const METRIC_DOUBLE_VALUE: u32 = 13;
const METRIC_BOOLEAN_VALUE: u32 = 14;
const METRIC_STRING_VALUE: u32 = 15;

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

/// Serialize a payload to the compact wire format.
pub fn encode(payload: &Payload) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + payload.metrics.len() * 32);

    put_tag(&mut buf, PAYLOAD_TIMESTAMP, WIRE_VARINT);
    put_varint(&mut buf, payload.timestamp);

    for metric in &payload.metrics {
        let body = encode_metric(metric);
        put_tag(&mut buf, PAYLOAD_METRICS, WIRE_LEN);
        put_varint(&mut buf, body.len() as u64);
        buf.extend_from_slice(&body);
    }

    put_tag(&mut buf, PAYLOAD_SEQ, WIRE_VARINT);
    put_varint(&mut buf, u64::from(payload.seq));

    buf
}

fn encode_metric(metric: &Metric) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + metric.name.len());

    put_tag(&mut buf, METRIC_NAME, WIRE_LEN);
    put_varint(&mut buf, metric.name.len() as u64);
    buf.extend_from_slice(metric.name.as_bytes());

    put_tag(&mut buf, METRIC_TIMESTAMP, WIRE_VARINT);
    put_varint(&mut buf, metric.timestamp);

    put_tag(&mut buf, METRIC_DATATYPE, WIRE_VARINT);
    put_varint(&mut buf, u64::from(metric.data_type.tag()));

    match &metric.value {
        MetricValue::Int(v) => {
            put_tag(&mut buf, METRIC_INT_VALUE, WIRE_VARINT);
            put_varint(&mut buf, u64::from(*v));
        }
        MetricValue::Float(v) => {
            put_tag(&mut buf, METRIC_FLOAT_VALUE, WIRE_FIXED32);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        MetricValue::Double(v) => {
            put_tag(&mut buf, METRIC_DOUBLE_VALUE, WIRE_FIXED64);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        MetricValue::Boolean(v) => {
            put_tag(&mut buf, METRIC_BOOLEAN_VALUE, WIRE_VARINT);
            put_varint(&mut buf, u64::from(*v));
        }
        MetricValue::String(v) => {
            put_tag(&mut buf, METRIC_STRING_VALUE, WIRE_LEN);
            put_varint(&mut buf, v.len() as u64);
            buf.extend_from_slice(v.as_bytes());
        }
    }

    buf
}

/// Decode a compact-format payload.
pub fn decode(bytes: &[u8]) -> Result<Payload, DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut payload = Payload::new(0, 0);

    while !reader.done() {
        let (field, wire_type) = reader.tag()?;
        match field {
            PAYLOAD_TIMESTAMP => payload.timestamp = reader.varint()?,
            PAYLOAD_METRICS => {
                let len = reader.varint()? as usize;
                let body = reader.bytes(len)?;
                payload.metrics.push(decode_metric(body)?);
            }
            PAYLOAD_SEQ => {
                let raw = reader.varint()?;
                payload.seq =
                    u8::try_from(raw).map_err(|_| DecodeError::SeqOutOfRange(raw))?;
            }
            _ => reader.skip(field, wire_type)?,
        }
    }

    Ok(payload)
}

fn decode_metric(bytes: &[u8]) -> Result<Metric, DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut name = String::new();
    let mut timestamp = 0u64;
    let mut data_type = DataType::Unknown;
    let mut value: Option<MetricValue> = None;

    while !reader.done() {
        let (field, wire_type) = reader.tag()?;
        match field {
            METRIC_NAME => {
                let len = reader.varint()? as usize;
                name = std::str::from_utf8(reader.bytes(len)?)
                    .map_err(|_| DecodeError::InvalidUtf8)?
                    .to_string();
            }
            METRIC_TIMESTAMP => timestamp = reader.varint()?,
            METRIC_DATATYPE => {
                let raw = reader.varint()?;
                data_type = u32::try_from(raw)
                    .ok()
                    .and_then(DataType::from_tag)
                    .ok_or(DecodeError::UnknownDataType(raw))?;
            }
            METRIC_INT_VALUE => {
                let raw = reader.varint()?;
                value = Some(MetricValue::Int(raw as u32));
            }
            METRIC_FLOAT_VALUE => {
                value = Some(MetricValue::Float(f32::from_le_bytes(reader.fixed32()?)));
            }
            METRIC_DOUBLE_VALUE => {
                value = Some(MetricValue::Double(f64::from_le_bytes(reader.fixed64()?)));
            }
            METRIC_BOOLEAN_VALUE => {
                value = Some(MetricValue::Boolean(reader.varint()? != 0));
            }
            METRIC_STRING_VALUE => {
                let len = reader.varint()? as usize;
                let s = std::str::from_utf8(reader.bytes(len)?)
                    .map_err(|_| DecodeError::InvalidUtf8)?;
                value = Some(MetricValue::String(s.to_string()));
            }
            _ => reader.skip(field, wire_type)?,
        }
    }

    let value = value.ok_or_else(|| DecodeError::MissingValue(name.clone()))?;
    Ok(Metric {
        name,
        timestamp,
        data_type,
        value,
    })
}

fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

fn put_tag(buf: &mut Vec<u8>, field: u32, wire_type: u8) {
    put_varint(buf, (u64::from(field) << 3) | u64::from(wire_type));
}

/// Cursor over a wire-format buffer.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn done(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn tag(&mut self) -> Result<(u32, u8), DecodeError> {
        let raw = self.varint()?;
        Ok(((raw >> 3) as u32, (raw & 0x07) as u8))
    }

    fn varint(&mut self) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or(DecodeError::UnexpectedEof(self.pos))?;
            self.pos += 1;
            if shift >= 64 {
                return Err(DecodeError::VarintOverflow(self.pos));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::UnexpectedEof(self.buf.len()))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn fixed32(&mut self) -> Result<[u8; 4], DecodeError> {
        let slice = self.bytes(4)?;
        Ok([slice[0], slice[1], slice[2], slice[3]])
    }

    fn fixed64(&mut self) -> Result<[u8; 8], DecodeError> {
        let slice = self.bytes(8)?;
        let mut out = [0u8; 8];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn skip(&mut self, field: u32, wire_type: u8) -> Result<(), DecodeError> {
        match wire_type {
            WIRE_VARINT => {
                self.varint()?;
            }
            WIRE_FIXED64 => {
                self.bytes(8)?;
            }
            WIRE_LEN => {
                let len = self.varint()? as usize;
                self.bytes(len)?;
            }
            WIRE_FIXED32 => {
                self.bytes(4)?;
            }
            other => {
                return Err(DecodeError::UnsupportedWireType {
                    field,
                    wire_type: other,
                })
            }
        }
        Ok(())
    }
}
