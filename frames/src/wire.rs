//! Protobuf form of [`Frame`].
//!
//! The payload travels as a `google.protobuf.Value` tree. Protobuf has a
//! single double-precision number kind, so integral numbers that fit an
//! `i64` are restored as JSON integers on the way back; everything else
//! stays a float.

use prost::Message;
use prost_types::value::Kind;
use prost_types::{ListValue, NullValue, Struct};
use serde_json::{Map, Number, Value};

use crate::{CodecError, Frame, Status};

/// Largest magnitude at which every integer is exactly representable in f64.
const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;

#[derive(Clone, PartialEq, Message)]
pub(crate) struct WireFrame {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, optional, tag = "2")]
    pub parent_id: Option<String>,
    #[prost(int64, tag = "3")]
    pub ts: i64,
    #[prost(string, optional, tag = "4")]
    pub room_id: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub from: Option<String>,
    #[prost(string, tag = "6")]
    pub syscall: String,
    #[prost(enumeration = "WireStatus", tag = "7")]
    pub status: i32,
    #[prost(message, optional, tag = "8")]
    pub data: Option<prost_types::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
pub(crate) enum WireStatus {
    Request = 0,
    Done = 1,
}

impl From<Status> for WireStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Request => Self::Request,
            Status::Done => Self::Done,
        }
    }
}

impl TryFrom<i32> for Status {
    type Error = CodecError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match WireStatus::try_from(raw) {
            Ok(WireStatus::Request) => Ok(Self::Request),
            Ok(WireStatus::Done) => Ok(Self::Done),
            Err(_) => Err(CodecError::InvalidStatus(raw)),
        }
    }
}

impl From<&Frame> for WireFrame {
    fn from(frame: &Frame) -> Self {
        Self {
            id: frame.id.clone(),
            parent_id: frame.parent_id.clone(),
            ts: frame.ts,
            room_id: frame.room_id.clone(),
            from: frame.from.clone(),
            syscall: frame.syscall.clone(),
            status: WireStatus::from(frame.status) as i32,
            data: Some(to_proto(&frame.data)),
        }
    }
}

impl TryFrom<WireFrame> for Frame {
    type Error = CodecError;

    fn try_from(wire: WireFrame) -> Result<Self, Self::Error> {
        let status = Status::try_from(wire.status)?;
        let data = match &wire.data {
            Some(value) => to_json(value),
            None => Value::Object(Map::new()),
        };
        Ok(Self {
            id: wire.id,
            parent_id: wire.parent_id,
            ts: wire.ts,
            room_id: wire.room_id,
            from: wire.from,
            syscall: wire.syscall,
            status,
            data,
        })
    }
}

/// `WireFrame::from` resolves to the generated accessor for the `from`
/// field, so the conversion is spelled out.
pub(crate) fn encode(frame: &Frame) -> Vec<u8> {
    <WireFrame as From<&Frame>>::from(frame).encode_to_vec()
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Frame, CodecError> {
    Frame::try_from(WireFrame::decode(bytes)?)
}

pub(crate) fn to_proto(value: &Value) -> prost_types::Value {
    let kind = match value {
        Value::Null => Kind::NullValue(NullValue::NullValue.into()),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or_default()),
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Array(items) => Kind::ListValue(ListValue { values: items.iter().map(to_proto).collect() }),
        Value::Object(fields) => Kind::StructValue(Struct {
            fields: fields.iter().map(|(key, field)| (key.clone(), to_proto(field))).collect(),
        }),
    };
    prost_types::Value { kind: Some(kind) }
}

fn to_json(value: &prost_types::Value) -> Value {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::NumberValue(n)) => number(*n),
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::ListValue(list)) => Value::Array(list.values.iter().map(to_json).collect()),
        Some(Kind::StructValue(object)) => Value::Object(
            object.fields.iter().map(|(key, field)| (key.clone(), to_json(field))).collect(),
        ),
    }
}

/// Non-finite numbers have no JSON form and become `null`.
#[allow(clippy::cast_possible_truncation)]
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < EXACT_INT_LIMIT {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;
