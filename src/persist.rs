//! Byte layout for saving a container to a stream and rebuilding it.
//!
//! Every container writes `size: i32` first, then whatever configuration it
//! carries, then its payload records in iteration order. Restoring re-runs
//! the container's ordinary insertion path, so shape information (bucket
//! placement, node colours) is never persisted. Numbers are big-endian.

use crate::compare::{NaturalOrder, ReverseOrder};
use crate::config::check_load_factor;
use crate::error::{CollectionError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Codec for one payload value.
pub trait Record: Sized {
    fn write_record<W: Write>(&self, w: &mut W) -> Result<()>;
    fn read_record<R: Read>(r: &mut R) -> Result<Self>;
}

/// Codec for a whole container.
pub trait Persist: Sized {
    fn persist<W: Write>(&self, w: &mut W) -> Result<()>;
    fn restore<R: Read>(r: &mut R) -> Result<Self>;
}

pub fn to_bytes<T: Persist>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    value.persist(&mut buf)?;
    Ok(buf)
}

pub fn from_bytes<T: Persist>(mut bytes: &[u8]) -> Result<T> {
    T::restore(&mut bytes)
}

pub(crate) fn write_len<W: Write>(w: &mut W, len: usize) -> Result<()> {
    let len = i32::try_from(len)
        .map_err(|_| CollectionError::InvalidArgument("too many elements to persist"))?;
    w.write_i32::<BigEndian>(len)?;
    Ok(())
}

pub(crate) fn read_len<R: Read>(r: &mut R) -> Result<usize> {
    let len = r.read_i32::<BigEndian>()?;
    usize::try_from(len).map_err(|_| CollectionError::CorruptData(format!("negative size {len}")))
}

pub(crate) fn write_load_factor<W: Write>(w: &mut W, load_factor: f64) -> Result<()> {
    w.write_f64::<BigEndian>(load_factor)?;
    Ok(())
}

pub(crate) fn read_load_factor<R: Read>(r: &mut R) -> Result<f64> {
    let lf = r.read_f64::<BigEndian>()?;
    check_load_factor(lf)
        .map_err(|_| CollectionError::CorruptData(format!("load factor {lf} not on (0, 1)")))
}

fn read_tag<R: Read>(r: &mut R, what: &str) -> Result<u8> {
    let tag = r.read_u8()?;
    if tag > 1 {
        return Err(CollectionError::CorruptData(format!("bad {what} tag {tag}")));
    }
    Ok(tag)
}

macro_rules! int_record {
    ($ty:ty, $write:ident, $read:ident) => {
        impl Record for $ty {
            fn write_record<W: Write>(&self, w: &mut W) -> Result<()> {
                w.$write::<BigEndian>(*self)?;
                Ok(())
            }
            fn read_record<R: Read>(r: &mut R) -> Result<Self> {
                Ok(r.$read::<BigEndian>()?)
            }
        }
    };
}

int_record!(i32, write_i32, read_i32);
int_record!(u32, write_u32, read_u32);
int_record!(i64, write_i64, read_i64);
int_record!(u64, write_u64, read_u64);
int_record!(f64, write_f64, read_f64);

impl Record for u8 {
    fn write_record<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(*self)?;
        Ok(())
    }
    fn read_record<R: Read>(r: &mut R) -> Result<Self> {
        Ok(r.read_u8()?)
    }
}

impl Record for bool {
    fn write_record<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(u8::from(*self))?;
        Ok(())
    }
    fn read_record<R: Read>(r: &mut R) -> Result<Self> {
        Ok(read_tag(r, "bool")? == 1)
    }
}

impl Record for () {
    fn write_record<W: Write>(&self, _w: &mut W) -> Result<()> {
        Ok(())
    }
    fn read_record<R: Read>(_r: &mut R) -> Result<Self> {
        Ok(())
    }
}

impl Record for String {
    fn write_record<W: Write>(&self, w: &mut W) -> Result<()> {
        let len = u32::try_from(self.len())
            .map_err(|_| CollectionError::InvalidArgument("string too long to persist"))?;
        w.write_u32::<BigEndian>(len)?;
        w.write_all(self.as_bytes())?;
        Ok(())
    }
    fn read_record<R: Read>(r: &mut R) -> Result<Self> {
        let len = r.read_u32::<BigEndian>()? as usize;
        // Read through `take` so a corrupt length cannot force a huge allocation.
        let mut buf = Vec::new();
        r.take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        String::from_utf8(buf).map_err(|e| CollectionError::CorruptData(e.to_string()))
    }
}

impl<T: Record> Record for Option<T> {
    fn write_record<W: Write>(&self, w: &mut W) -> Result<()> {
        match self {
            None => w.write_u8(0)?,
            Some(v) => {
                w.write_u8(1)?;
                v.write_record(w)?;
            }
        }
        Ok(())
    }
    fn read_record<R: Read>(r: &mut R) -> Result<Self> {
        match read_tag(r, "option")? {
            0 => Ok(None),
            _ => Ok(Some(T::read_record(r)?)),
        }
    }
}

impl<A: Record, B: Record> Record for (A, B) {
    fn write_record<W: Write>(&self, w: &mut W) -> Result<()> {
        self.0.write_record(w)?;
        self.1.write_record(w)
    }
    fn read_record<R: Read>(r: &mut R) -> Result<Self> {
        let a = A::read_record(r)?;
        let b = B::read_record(r)?;
        Ok((a, b))
    }
}

const NATURAL_ORDER_TAG: u8 = 0;
const REVERSE_ORDER_TAG: u8 = 1;

fn expect_order_tag<R: Read>(r: &mut R, expected: u8) -> Result<()> {
    let tag = r.read_u8()?;
    if tag != expected {
        return Err(CollectionError::CorruptData(format!(
            "comparison rule {tag} does not match expected rule {expected}"
        )));
    }
    Ok(())
}

impl Record for NaturalOrder {
    fn write_record<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(NATURAL_ORDER_TAG)?;
        Ok(())
    }
    fn read_record<R: Read>(r: &mut R) -> Result<Self> {
        expect_order_tag(r, NATURAL_ORDER_TAG)?;
        Ok(NaturalOrder)
    }
}

impl Record for ReverseOrder {
    fn write_record<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(REVERSE_ORDER_TAG)?;
        Ok(())
    }
    fn read_record<R: Read>(r: &mut R) -> Result<Self> {
        expect_order_tag(r, REVERSE_ORDER_TAG)?;
        Ok(ReverseOrder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Record>(v: &T) -> T {
        let mut buf = Vec::new();
        v.write_record(&mut buf).unwrap();
        T::read_record(&mut buf.as_slice()).unwrap()
    }

    #[test]
    fn scalar_and_string_records() {
        assert_eq!(roundtrip(&-7i32), -7);
        assert_eq!(roundtrip(&u64::MAX), u64::MAX);
        assert_eq!(roundtrip(&"héllo".to_string()), "héllo");
        assert_eq!(roundtrip(&Some(3i64)), Some(3));
        assert_eq!(roundtrip(&None::<String>), None);
        assert_eq!(roundtrip(&(1u32, true)), (1, true));
    }

    #[test]
    fn int32_is_big_endian() {
        let mut buf = Vec::new();
        1i32.write_record(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 1]);
    }

    #[test]
    fn negative_size_is_corrupt() {
        let mut buf = Vec::new();
        buf.write_i32::<BigEndian>(-1).unwrap();
        assert!(matches!(
            read_len(&mut buf.as_slice()),
            Err(CollectionError::CorruptData(_))
        ));
    }

    #[test]
    fn load_factor_outside_open_interval_is_corrupt() {
        for lf in [0.0, 1.0, 2.5] {
            let mut buf = Vec::new();
            write_load_factor(&mut buf, lf).unwrap();
            assert!(matches!(
                read_load_factor(&mut buf.as_slice()),
                Err(CollectionError::CorruptData(_))
            ));
        }
    }

    #[test]
    fn invalid_utf8_and_bad_tags_are_corrupt() {
        let mut buf = Vec::new();
        buf.write_u32::<BigEndian>(2).unwrap();
        buf.extend_from_slice(&[0xff, 0xfe]);
        assert!(matches!(
            String::read_record(&mut buf.as_slice()),
            Err(CollectionError::CorruptData(_))
        ));

        let tag = [7u8];
        assert!(matches!(
            Option::<u8>::read_record(&mut &tag[..]),
            Err(CollectionError::CorruptData(_))
        ));
    }

    #[test]
    fn truncated_string_is_io_error() {
        let mut buf = Vec::new();
        buf.write_u32::<BigEndian>(10).unwrap();
        buf.extend_from_slice(b"abc");
        assert!(matches!(
            String::read_record(&mut buf.as_slice()),
            Err(CollectionError::Io(_))
        ));
    }

    #[test]
    fn comparator_rules_are_tagged() {
        let mut buf = Vec::new();
        ReverseOrder.write_record(&mut buf).unwrap();
        assert!(ReverseOrder::read_record(&mut buf.as_slice()).is_ok());
        assert!(matches!(
            NaturalOrder::read_record(&mut buf.as_slice()),
            Err(CollectionError::CorruptData(_))
        ));
    }
}
