// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Conversion between raw Modbus registers and typed values.
//!
//! Word-sized values are assembled from big-endian bytes after reordering
//! according to the configured [`ByteOrder`]:
//!
//! ```text
//! value bytes      A B C D
//! BigEndian        [AB] [CD]
//! LittleEndian     [DC] [BA]
//! MidBigEndian     [CD] [AB]
//! MidLittleEndian  [BA] [DC]
//! ```
//!
//! Coils and discrete inputs carry bits only. A single bit decodes to
//! [`TypedValue::Bool`], a wider block to [`TypedValue::Bits`].

use crate::error::{ConversionError, ModbusError, ModbusResult, UnsupportedOperationError};
use crate::types::{ByteOrder, ModbusDataType, RegisterType};

use super::TypedValue;

// =============================================================================
// DataConverter
// =============================================================================

/// Converter for register and bit blocks.
///
/// # Example
///
/// ```
/// use gridlink_modbus::client::{DataConverter, TypedValue};
/// use gridlink_modbus::types::{ByteOrder, ModbusDataType};
///
/// let converter = DataConverter::new(ByteOrder::BigEndian);
/// let value = converter
///     .decode_registers(&[0x4248, 0x0000], ModbusDataType::Float32)
///     .unwrap();
/// assert_eq!(value, TypedValue::Float32(50.0));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DataConverter {
    byte_order: ByteOrder,
}

impl DataConverter {
    /// Creates a new converter with the given byte order.
    pub fn new(byte_order: ByteOrder) -> Self {
        Self { byte_order }
    }

    /// Returns the byte order.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Rejects data types that bit registers cannot carry.
    pub fn check_bit_type(register_type: RegisterType, data_type: ModbusDataType) -> ModbusResult<()> {
        if register_type.is_bit() && !data_type.is_bit_compatible() {
            return Err(ModbusError::unsupported(UnsupportedOperationError::DataType {
                register_type,
                data_type,
            }));
        }
        Ok(())
    }

    // =========================================================================
    // From Registers
    // =========================================================================

    /// Decodes a register block as `data_type`.
    pub fn decode_registers(
        &self,
        registers: &[u16],
        data_type: ModbusDataType,
    ) -> ModbusResult<TypedValue> {
        let value = match data_type {
            ModbusDataType::Bool => {
                let word = Self::require(registers, 1)?[0];
                TypedValue::Bool(word != 0)
            }
            ModbusDataType::Int8 => {
                let word = Self::require(registers, 1)?[0];
                TypedValue::Int8((word & 0xFF) as u8 as i8)
            }
            ModbusDataType::UInt8 => {
                let word = Self::require(registers, 1)?[0];
                TypedValue::UInt8((word & 0xFF) as u8)
            }
            ModbusDataType::Int16 => {
                let bytes = self.ordered_bytes::<2>(Self::require(registers, 1)?);
                TypedValue::Int16(i16::from_be_bytes(bytes))
            }
            ModbusDataType::UInt16 => {
                let bytes = self.ordered_bytes::<2>(Self::require(registers, 1)?);
                TypedValue::UInt16(u16::from_be_bytes(bytes))
            }
            ModbusDataType::Int32 => {
                let bytes = self.ordered_bytes::<4>(Self::require(registers, 2)?);
                TypedValue::Int32(i32::from_be_bytes(bytes))
            }
            ModbusDataType::UInt32 => {
                let bytes = self.ordered_bytes::<4>(Self::require(registers, 2)?);
                TypedValue::UInt32(u32::from_be_bytes(bytes))
            }
            ModbusDataType::Int64 => {
                let bytes = self.ordered_bytes::<8>(Self::require(registers, 4)?);
                TypedValue::Int64(i64::from_be_bytes(bytes))
            }
            ModbusDataType::UInt64 => {
                let bytes = self.ordered_bytes::<8>(Self::require(registers, 4)?);
                TypedValue::UInt64(u64::from_be_bytes(bytes))
            }
            ModbusDataType::Float32 => {
                let bytes = self.ordered_bytes::<4>(Self::require(registers, 2)?);
                TypedValue::Float32(f32::from_be_bytes(bytes))
            }
            ModbusDataType::Float64 => {
                let bytes = self.ordered_bytes::<8>(Self::require(registers, 4)?);
                TypedValue::Float64(f64::from_be_bytes(bytes))
            }
            ModbusDataType::String => TypedValue::String(Self::registers_to_string(registers)?),
        };

        Ok(value)
    }

    /// Returns the first `count` registers or an insufficient data error.
    fn require(registers: &[u16], count: usize) -> ModbusResult<&[u16]> {
        registers.get(..count).ok_or_else(|| {
            ModbusError::conversion(ConversionError::insufficient_data(
                count * 2,
                registers.len() * 2,
            ))
        })
    }

    /// Reassembles value bytes in big-endian order from wire registers.
    fn ordered_bytes<const N: usize>(&self, registers: &[u16]) -> [u8; N] {
        let words: Vec<u16> = match self.byte_order {
            ByteOrder::BigEndian | ByteOrder::MidLittleEndian => registers.to_vec(),
            ByteOrder::LittleEndian | ByteOrder::MidBigEndian => {
                registers.iter().rev().copied().collect()
            }
        };

        let mut bytes = [0u8; N];
        for (i, word) in words.iter().enumerate().take(N / 2) {
            let [hi, lo] = word.to_be_bytes();
            let (first, second) = match self.byte_order {
                ByteOrder::BigEndian | ByteOrder::MidBigEndian => (hi, lo),
                ByteOrder::LittleEndian | ByteOrder::MidLittleEndian => (lo, hi),
            };
            bytes[i * 2] = first;
            bytes[i * 2 + 1] = second;
        }
        bytes
    }

    /// Converts registers to an ASCII string, stopping at the first NUL.
    fn registers_to_string(registers: &[u16]) -> ModbusResult<String> {
        let bytes: Vec<u8> = registers.iter().flat_map(|r| r.to_be_bytes()).collect();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());

        String::from_utf8(bytes[..end].to_vec())
            .map_err(|e| ModbusError::conversion(ConversionError::invalid_encoding(e.to_string())))
    }

    // =========================================================================
    // To Registers
    // =========================================================================

    /// Encodes `value` as `data_type` into wire registers.
    ///
    /// Numeric values are coerced to `data_type` when the conversion is
    /// lossless; out-of-range values fail with an overflow error.
    pub fn encode_registers(
        &self,
        value: &TypedValue,
        data_type: ModbusDataType,
    ) -> ModbusResult<Vec<u16>> {
        let registers = match value.coerce(data_type)? {
            TypedValue::Bool(v) => vec![u16::from(v)],
            TypedValue::Int8(v) => vec![u16::from(v as u8)],
            TypedValue::UInt8(v) => vec![u16::from(v)],
            TypedValue::Int16(v) => self.words_from_bytes(&v.to_be_bytes()),
            TypedValue::UInt16(v) => self.words_from_bytes(&v.to_be_bytes()),
            TypedValue::Int32(v) => self.words_from_bytes(&v.to_be_bytes()),
            TypedValue::UInt32(v) => self.words_from_bytes(&v.to_be_bytes()),
            TypedValue::Int64(v) => self.words_from_bytes(&v.to_be_bytes()),
            TypedValue::UInt64(v) => self.words_from_bytes(&v.to_be_bytes()),
            TypedValue::Float32(v) => self.words_from_bytes(&v.to_be_bytes()),
            TypedValue::Float64(v) => self.words_from_bytes(&v.to_be_bytes()),
            TypedValue::String(s) => Self::string_to_registers(&s),
            TypedValue::Bits(_) => {
                return Err(ModbusError::type_mismatch(data_type.as_str(), "bits"));
            }
        };

        Ok(registers)
    }

    /// Splits big-endian value bytes into wire registers.
    fn words_from_bytes(&self, bytes: &[u8]) -> Vec<u16> {
        let mut words: Vec<u16> = bytes
            .chunks(2)
            .map(|chunk| {
                let a = chunk.first().copied().unwrap_or(0);
                let b = chunk.get(1).copied().unwrap_or(0);
                match self.byte_order {
                    ByteOrder::BigEndian | ByteOrder::MidBigEndian => u16::from_be_bytes([a, b]),
                    ByteOrder::LittleEndian | ByteOrder::MidLittleEndian => {
                        u16::from_be_bytes([b, a])
                    }
                }
            })
            .collect();

        if matches!(
            self.byte_order,
            ByteOrder::LittleEndian | ByteOrder::MidBigEndian
        ) {
            words.reverse();
        }
        words
    }

    /// Packs a string two characters per register, NUL padded.
    fn string_to_registers(s: &str) -> Vec<u16> {
        s.as_bytes()
            .chunks(2)
            .map(|chunk| {
                let hi = chunk.first().copied().unwrap_or(0);
                let lo = chunk.get(1).copied().unwrap_or(0);
                u16::from_be_bytes([hi, lo])
            })
            .collect()
    }

    // =========================================================================
    // Bits
    // =========================================================================

    /// Decodes a bit block read from coils or discrete inputs.
    pub fn decode_bits(bits: &[bool], size: u16) -> ModbusResult<TypedValue> {
        let size = usize::from(size.max(1));
        let block = bits.get(..size).ok_or_else(|| {
            ModbusError::conversion(ConversionError::insufficient_data(size, bits.len()))
        })?;

        Ok(match block {
            [single] => TypedValue::Bool(*single),
            many => TypedValue::Bits(many.to_vec()),
        })
    }

    /// Encodes a value for a coil write.
    pub fn encode_bits(value: &TypedValue) -> ModbusResult<Vec<bool>> {
        match value {
            TypedValue::Bits(bits) if !bits.is_empty() => Ok(bits.clone()),
            TypedValue::Bits(_) => Err(ModbusError::conversion(
                ConversionError::insufficient_data(1, 0),
            )),
            other => Ok(vec![other.as_bool()?]),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FLOAT_50: f32 = 50.0; // 0x42480000

    #[test]
    fn test_decode_uint16_and_int16() {
        let converter = DataConverter::default();
        assert_eq!(
            converter.decode_registers(&[0x1234], ModbusDataType::UInt16).unwrap(),
            TypedValue::UInt16(0x1234)
        );
        assert_eq!(
            converter.decode_registers(&[0xFFFF], ModbusDataType::Int16).unwrap(),
            TypedValue::Int16(-1)
        );
    }

    #[test]
    fn test_decode_float32_all_byte_orders() {
        let cases = [
            (ByteOrder::BigEndian, [0x4248, 0x0000]),
            (ByteOrder::LittleEndian, [0x0000, 0x4842]),
            (ByteOrder::MidBigEndian, [0x0000, 0x4248]),
            (ByteOrder::MidLittleEndian, [0x4842, 0x0000]),
        ];

        for (order, registers) in cases {
            let converter = DataConverter::new(order);
            let value = converter
                .decode_registers(&registers, ModbusDataType::Float32)
                .unwrap();
            assert_eq!(value, TypedValue::Float32(FLOAT_50), "byte order {order}");
        }
    }

    #[test]
    fn test_encode_uint32_all_byte_orders() {
        let value = TypedValue::UInt32(0x0102_0304);
        let cases = [
            (ByteOrder::BigEndian, vec![0x0102, 0x0304]),
            (ByteOrder::LittleEndian, vec![0x0403, 0x0201]),
            (ByteOrder::MidBigEndian, vec![0x0304, 0x0102]),
            (ByteOrder::MidLittleEndian, vec![0x0201, 0x0403]),
        ];

        for (order, expected) in cases {
            let converter = DataConverter::new(order);
            let registers = converter
                .encode_registers(&value, ModbusDataType::UInt32)
                .unwrap();
            assert_eq!(registers, expected, "byte order {order}");
        }
    }

    #[test]
    fn test_decode_insufficient_registers() {
        let converter = DataConverter::default();
        let err = converter
            .decode_registers(&[0x4248], ModbusDataType::Float32)
            .unwrap_err();
        assert!(matches!(
            err,
            ModbusError::Conversion(ConversionError::InsufficientData { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_string_round_trip_padding() {
        let converter = DataConverter::default();
        let value = converter
            .decode_registers(&[0x4142, 0x4300], ModbusDataType::String)
            .unwrap();
        assert_eq!(value, TypedValue::String("ABC".to_string()));

        let registers = converter
            .encode_registers(&TypedValue::String("ABC".into()), ModbusDataType::String)
            .unwrap();
        assert_eq!(registers, vec![0x4142, 0x4300]);
    }

    #[test]
    fn test_encode_coerces_numeric_values() {
        let converter = DataConverter::default();
        let registers = converter
            .encode_registers(&TypedValue::Int64(7), ModbusDataType::UInt16)
            .unwrap();
        assert_eq!(registers, vec![7]);

        let overflow = converter.encode_registers(&TypedValue::Int32(70_000), ModbusDataType::UInt16);
        assert!(matches!(
            overflow,
            Err(ModbusError::Conversion(ConversionError::Overflow { .. }))
        ));
    }

    #[test]
    fn test_bits() {
        assert_eq!(
            DataConverter::decode_bits(&[true, false, false], 1).unwrap(),
            TypedValue::Bool(true)
        );
        assert_eq!(
            DataConverter::decode_bits(&[true, false, true, false], 3).unwrap(),
            TypedValue::Bits(vec![true, false, true])
        );
        assert!(DataConverter::decode_bits(&[true], 2).is_err());

        assert_eq!(DataConverter::encode_bits(&TypedValue::Bool(true)).unwrap(), vec![true]);
        assert_eq!(DataConverter::encode_bits(&TypedValue::UInt16(0)).unwrap(), vec![false]);
    }

    #[test]
    fn test_check_bit_type() {
        assert!(DataConverter::check_bit_type(RegisterType::Coil, ModbusDataType::Bool).is_ok());
        assert!(DataConverter::check_bit_type(RegisterType::Coil, ModbusDataType::Float32).is_err());
        assert!(
            DataConverter::check_bit_type(RegisterType::HoldingRegister, ModbusDataType::Float32)
                .is_ok()
        );
    }
}
