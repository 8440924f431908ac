//! A minimal, self-describing on-disk container: a flat sequence of
//! tagged, length-prefixed records standing in for the HDF5/CGNS-flavored
//! hierarchical container the original pipeline wrote with `h5py` (real
//! HDF5/CGNS I/O is out of scope, see SPEC_FULL.md §6). `ContainerWriter`
//! reproduces the same *logical* group/array names the original used
//! (`Base`, `NodeZone`, `Zone<n>`, `GridCoordinates`, ...) as nested
//! `GroupStart`/`GroupEnd` records around plain typed arrays.

use crate::error::{Error, Result};
use std::io::{self, Read, Write};

const MAGIC: &[u8; 4] = b"TPRT";
const FORMAT_VERSION: u32 = 1;

#[repr(u8)]
enum Tag {
    GroupStart = 1,
    GroupEnd = 2,
    F32Array = 3,
    U32Array = 4,
    I32Array = 5,
    Bytes = 6,
    Str = 7,
}

fn write_name(w: &mut impl Write, name: &str) -> io::Result<()> {
    let bytes = name.as_bytes();
    w.write_all(&(bytes.len() as u16).to_le_bytes())?;
    w.write_all(bytes)
}

fn read_name(r: &mut impl Read) -> io::Result<String> {
    let mut len_buf = [0u8; 2];
    r.read_exact(&mut len_buf)?;
    let len = u16::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub struct ContainerWriter<W: Write> {
    inner: W,
}

impl<W: Write> ContainerWriter<W> {
    pub fn new(mut inner: W) -> Result<Self> {
        inner.write_all(MAGIC)?;
        inner.write_all(&FORMAT_VERSION.to_le_bytes())?;
        Ok(ContainerWriter { inner })
    }

    pub fn begin_group(&mut self, name: &str) -> Result<()> {
        self.inner.write_all(&[Tag::GroupStart as u8])?;
        write_name(&mut self.inner, name)?;
        Ok(())
    }

    pub fn end_group(&mut self) -> Result<()> {
        self.inner.write_all(&[Tag::GroupEnd as u8])?;
        Ok(())
    }

    pub fn write_f32_array(&mut self, name: &str, values: &[f32]) -> Result<()> {
        self.inner.write_all(&[Tag::F32Array as u8])?;
        write_name(&mut self.inner, name)?;
        self.inner.write_all(&(values.len() as u64).to_le_bytes())?;
        for v in values {
            self.inner.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn write_u32_array(&mut self, name: &str, values: &[u32]) -> Result<()> {
        self.inner.write_all(&[Tag::U32Array as u8])?;
        write_name(&mut self.inner, name)?;
        self.inner.write_all(&(values.len() as u64).to_le_bytes())?;
        for v in values {
            self.inner.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn write_i32_array(&mut self, name: &str, values: &[i32]) -> Result<()> {
        self.inner.write_all(&[Tag::I32Array as u8])?;
        write_name(&mut self.inner, name)?;
        self.inner.write_all(&(values.len() as u64).to_le_bytes())?;
        for v in values {
            self.inner.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.inner.write_all(&[Tag::Bytes as u8])?;
        write_name(&mut self.inner, name)?;
        self.inner.write_all(&(data.len() as u64).to_le_bytes())?;
        self.inner.write_all(data)?;
        Ok(())
    }

    pub fn write_str(&mut self, name: &str, value: &str) -> Result<()> {
        self.inner.write_all(&[Tag::Str as u8])?;
        write_name(&mut self.inner, name)?;
        let bytes = value.as_bytes();
        self.inner.write_all(&(bytes.len() as u32).to_le_bytes())?;
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[derive(Debug, PartialEq)]
pub enum Record {
    GroupStart(String),
    GroupEnd,
    F32Array(String, Vec<f32>),
    U32Array(String, Vec<u32>),
    I32Array(String, Vec<i32>),
    Bytes(String, Vec<u8>),
    Str(String, String),
}

pub struct ContainerReader<R: Read> {
    inner: R,
}

impl<R: Read> ContainerReader<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        inner.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::MalformedInput("not a tetrapart container file".to_string()));
        }
        let mut version_buf = [0u8; 4];
        inner.read_exact(&mut version_buf)?;
        let version = u32::from_le_bytes(version_buf);
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedInput(format!(
                "unsupported container format version {version}"
            )));
        }
        Ok(ContainerReader { inner })
    }

    /// Reads the next record, or `Ok(None)` at a clean end of stream.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let mut tag_buf = [0u8; 1];
        match self.inner.read(&mut tag_buf)? {
            0 => return Ok(None),
            _ => {}
        }
        let record = match tag_buf[0] {
            t if t == Tag::GroupStart as u8 => Record::GroupStart(read_name(&mut self.inner)?),
            t if t == Tag::GroupEnd as u8 => Record::GroupEnd,
            t if t == Tag::F32Array as u8 => {
                let name = read_name(&mut self.inner)?;
                let values = read_f32_array(&mut self.inner)?;
                Record::F32Array(name, values)
            }
            t if t == Tag::U32Array as u8 => {
                let name = read_name(&mut self.inner)?;
                let values = read_u32_array(&mut self.inner)?;
                Record::U32Array(name, values)
            }
            t if t == Tag::I32Array as u8 => {
                let name = read_name(&mut self.inner)?;
                let values = read_i32_array(&mut self.inner)?;
                Record::I32Array(name, values)
            }
            t if t == Tag::Bytes as u8 => {
                let name = read_name(&mut self.inner)?;
                let mut len_buf = [0u8; 8];
                self.inner.read_exact(&mut len_buf)?;
                let len = u64::from_le_bytes(len_buf) as usize;
                let mut data = vec![0u8; len];
                self.inner.read_exact(&mut data)?;
                Record::Bytes(name, data)
            }
            t if t == Tag::Str as u8 => {
                let name = read_name(&mut self.inner)?;
                let mut len_buf = [0u8; 4];
                self.inner.read_exact(&mut len_buf)?;
                let len = u32::from_le_bytes(len_buf) as usize;
                let mut data = vec![0u8; len];
                self.inner.read_exact(&mut data)?;
                let value = String::from_utf8(data)
                    .map_err(|e| Error::MalformedInput(e.to_string()))?;
                Record::Str(name, value)
            }
            other => {
                return Err(Error::MalformedInput(format!("unknown container tag {other}")));
            }
        };
        Ok(Some(record))
    }

    pub fn into_records(mut self) -> Result<Vec<Record>> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record);
        }
        Ok(out)
    }
}

fn read_f32_array(r: &mut impl Read) -> Result<Vec<f32>> {
    let len = read_u64_len(r)?;
    let mut out = Vec::with_capacity(len);
    let mut buf = [0u8; 4];
    for _ in 0..len {
        r.read_exact(&mut buf)?;
        out.push(f32::from_le_bytes(buf));
    }
    Ok(out)
}

fn read_u32_array(r: &mut impl Read) -> Result<Vec<u32>> {
    let len = read_u64_len(r)?;
    let mut out = Vec::with_capacity(len);
    let mut buf = [0u8; 4];
    for _ in 0..len {
        r.read_exact(&mut buf)?;
        out.push(u32::from_le_bytes(buf));
    }
    Ok(out)
}

fn read_i32_array(r: &mut impl Read) -> Result<Vec<i32>> {
    let len = read_u64_len(r)?;
    let mut out = Vec::with_capacity(len);
    let mut buf = [0u8; 4];
    for _ in 0..len {
        r.read_exact(&mut buf)?;
        out.push(i32::from_le_bytes(buf));
    }
    Ok(out)
}

fn read_u64_len(r: &mut impl Read) -> Result<usize> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf) as usize)
}
