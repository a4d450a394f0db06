//! Tag-dispatch MsgPack decoder.
//!
//! Builds the same arrays and objects as the JSON decoder. Multi-byte
//! fields are big-endian; running out of bytes anywhere is
//! [`MsgPackError::IncompleteInput`].

use bumpjson_mem::Arena;

use crate::builder::StringBuilder;
use crate::error::MsgPackError;
use crate::reader::Reader;
use crate::slot::{ArrayData, ObjectData, Slot, StrRef};

type DecodeResult<T> = Result<T, MsgPackError>;

pub(crate) struct MsgPackDecoder<'a, R, B> {
    arena: &'a Arena,
    reader: R,
    builder: B,
    nesting_limit: u8,
}

impl<'a, R: Reader, B: StringBuilder> MsgPackDecoder<'a, R, B> {
    pub(crate) fn new(arena: &'a Arena, reader: R, builder: B, nesting_limit: u8) -> Self {
        MsgPackDecoder {
            arena,
            reader,
            builder,
            nesting_limit,
        }
    }

    pub(crate) fn parse_value(&mut self) -> DecodeResult<Slot> {
        let tag = self.read_u8()?;
        match tag {
            0x00..=0x7f => Ok(Slot::Integer(i64::from(tag))),
            0x80..=0x8f => self.parse_object(usize::from(tag & 0x0f)),
            0x90..=0x9f => self.parse_array(usize::from(tag & 0x0f)),
            0xa0..=0xbf => self.read_string(usize::from(tag & 0x1f)).map(Slot::String),
            0xc0 => Ok(Slot::Null),
            0xc2 => Ok(Slot::Bool(false)),
            0xc3 => Ok(Slot::Bool(true)),
            0xca => {
                let bits = u32::from_be_bytes(self.read_bytes()?);
                Ok(Slot::Float(f64::from(f32::from_bits(bits))))
            }
            0xcb => Ok(Slot::Float(f64::from_be_bytes(self.read_bytes()?))),
            0xcc => Ok(Slot::Integer(i64::from(self.read_u8()?))),
            0xcd => Ok(Slot::Integer(i64::from(u16::from_be_bytes(self.read_bytes()?)))),
            0xce => Ok(Slot::Integer(i64::from(u32::from_be_bytes(self.read_bytes()?)))),
            0xcf => {
                let value = u64::from_be_bytes(self.read_bytes()?);
                Ok(i64::try_from(value).map_or(Slot::Float(value as f64), Slot::Integer))
            }
            0xd0 => Ok(Slot::Integer(i64::from(i8::from_be_bytes(self.read_bytes()?)))),
            0xd1 => Ok(Slot::Integer(i64::from(i16::from_be_bytes(self.read_bytes()?)))),
            0xd2 => Ok(Slot::Integer(i64::from(i32::from_be_bytes(self.read_bytes()?)))),
            0xd3 => Ok(Slot::Integer(i64::from_be_bytes(self.read_bytes()?))),
            0xd9 => {
                let len = self.read_u8()?;
                self.read_string(usize::from(len)).map(Slot::String)
            }
            0xda => {
                let len = self.read_u16()?;
                self.read_string(len).map(Slot::String)
            }
            0xdb => {
                let len = self.read_u32()?;
                self.read_string(len).map(Slot::String)
            }
            0xdc => {
                let len = self.read_u16()?;
                self.parse_array(len)
            }
            0xdd => {
                let len = self.read_u32()?;
                self.parse_array(len)
            }
            0xde => {
                let len = self.read_u16()?;
                self.parse_object(len)
            }
            0xdf => {
                let len = self.read_u32()?;
                self.parse_object(len)
            }
            0xe0..=0xff => Ok(Slot::Integer(i64::from(tag as i8))),
            // 0xc1 (never used), bin 8/16/32, ext 8/16/32 and fixext.
            0xc1 | 0xc4..=0xc9 | 0xd4..=0xd8 => Err(MsgPackError::InvalidInput),
        }
    }

    fn parse_nested(&mut self) -> DecodeResult<Slot> {
        self.nesting_limit -= 1;
        let value = self.parse_value();
        self.nesting_limit += 1;
        value
    }

    fn parse_array(&mut self, len: usize) -> DecodeResult<Slot> {
        if self.nesting_limit == 0 {
            return Err(MsgPackError::TooDeep);
        }
        let ptr = self.arena.alloc(ArrayData::new())?;
        // SAFETY: freshly allocated; the arena outlives the decoder.
        let array = unsafe { ptr.as_ref() };

        for _ in 0..len {
            let value = self.parse_nested()?;
            array.push(self.arena, value)?;
        }
        Ok(Slot::Array(ptr))
    }

    fn parse_object(&mut self, len: usize) -> DecodeResult<Slot> {
        if self.nesting_limit == 0 {
            return Err(MsgPackError::TooDeep);
        }
        let ptr = self.arena.alloc(ObjectData::new())?;
        // SAFETY: freshly allocated; the arena outlives the decoder.
        let object = unsafe { ptr.as_ref() };

        for _ in 0..len {
            let key = self.read_key()?;
            let value = self.parse_nested()?;
            if self.builder.keeps_text() {
                object.insert(self.arena, key, value)?;
            } else {
                object.push(self.arena, key, value)?;
            }
        }
        Ok(Slot::Object(ptr))
    }

    /// Only string tags are accepted as keys.
    fn read_key(&mut self) -> DecodeResult<StrRef> {
        let tag = self.read_u8()?;
        let len = match tag {
            0xa0..=0xbf => usize::from(tag & 0x1f),
            0xd9 => usize::from(self.read_u8()?),
            0xda => self.read_u16()?,
            0xdb => self.read_u32()?,
            _ => return Err(MsgPackError::InvalidInput),
        };
        self.read_string(len)
    }

    fn read_string(&mut self, len: usize) -> DecodeResult<StrRef> {
        self.builder.start();
        for _ in 0..len {
            let b = self.read_u8()?;
            self.builder.append(b);
        }
        Ok(self.builder.finish()?)
    }

    fn read_u8(&mut self) -> DecodeResult<u8> {
        let b = self.reader.current().ok_or(MsgPackError::IncompleteInput)?;
        self.reader.advance();
        Ok(b)
    }

    fn read_bytes<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut buf = [0u8; N];
        for b in &mut buf {
            *b = self.read_u8()?;
        }
        Ok(buf)
    }

    fn read_u16(&mut self) -> DecodeResult<usize> {
        Ok(usize::from(u16::from_be_bytes(self.read_bytes()?)))
    }

    fn read_u32(&mut self) -> DecodeResult<usize> {
        let len = u32::from_be_bytes(self.read_bytes()?);
        usize::try_from(len).map_err(|_| MsgPackError::InvalidInput)
    }
}
