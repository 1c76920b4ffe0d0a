//! JSON has no representation for NaN or infinities, which serde_json silently writes as `null`.
//! [`ensure_finite`] walks a value with a serializer that only looks at floats and rejects them.

use std::fmt;

use serde::{Serialize, ser};

use crate::SerializationError;

pub(crate) fn ensure_finite<T: Serialize + ?Sized>(value: &T) -> Result<(), SerializationError> {
    match value.serialize(FiniteCheck) {
        Ok(()) => Ok(()),
        Err(CheckError::NonFinite(value)) => Err(SerializationError::NonFiniteNumber { value }),
        Err(CheckError::Custom(message)) => Err(SerializationError::Json(ser::Error::custom(message))),
    }
}

#[derive(Debug)]
enum CheckError {
    NonFinite(f64),
    Custom(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::NonFinite(value) => write!(f, "{value} cannot be represented in JSON"),
            CheckError::Custom(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CheckError {}

impl ser::Error for CheckError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CheckError::Custom(msg.to_string())
    }
}

struct FiniteCheck;

type CheckResult = Result<(), CheckError>;

fn check_float(value: f64) -> CheckResult {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CheckError::NonFinite(value))
    }
}

impl ser::Serializer for FiniteCheck {
    type Ok = ();
    type Error = CheckError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> CheckResult {
        Ok(())
    }

    fn serialize_i8(self, _: i8) -> CheckResult {
        Ok(())
    }

    fn serialize_i16(self, _: i16) -> CheckResult {
        Ok(())
    }

    fn serialize_i32(self, _: i32) -> CheckResult {
        Ok(())
    }

    fn serialize_i64(self, _: i64) -> CheckResult {
        Ok(())
    }

    fn serialize_i128(self, _: i128) -> CheckResult {
        Ok(())
    }

    fn serialize_u8(self, _: u8) -> CheckResult {
        Ok(())
    }

    fn serialize_u16(self, _: u16) -> CheckResult {
        Ok(())
    }

    fn serialize_u32(self, _: u32) -> CheckResult {
        Ok(())
    }

    fn serialize_u64(self, _: u64) -> CheckResult {
        Ok(())
    }

    fn serialize_u128(self, _: u128) -> CheckResult {
        Ok(())
    }

    fn serialize_f32(self, value: f32) -> CheckResult {
        check_float(f64::from(value))
    }

    fn serialize_f64(self, value: f64) -> CheckResult {
        check_float(value)
    }

    fn serialize_char(self, _: char) -> CheckResult {
        Ok(())
    }

    fn serialize_str(self, _: &str) -> CheckResult {
        Ok(())
    }

    fn serialize_bytes(self, _: &[u8]) -> CheckResult {
        Ok(())
    }

    fn serialize_none(self) -> CheckResult {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_unit(self) -> CheckResult {
        Ok(())
    }

    fn serialize_unit_struct(self, _: &'static str) -> CheckResult {
        Ok(())
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> CheckResult {
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(self, _: &'static str, value: &T) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_tuple_variant(self, _: &'static str, _: u32, _: &'static str, _: usize) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_struct_variant(self, _: &'static str, _: u32, _: &'static str, _: usize) -> Result<Self, CheckError> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> CheckResult {
        key.serialize(FiniteCheck)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, _: &'static str, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, _: &'static str, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}
