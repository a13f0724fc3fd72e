//! UDVM memory, as seen by the operand decoder.
//!
//! the UDVM addresses its memory with 16-bit addresses, and every address computation wraps at
//! `2^16`. a UDVM may be given less than 64k of memory, in which case byte address `a` refers to
//! `memory[a % size]`. operands are decoded through [`MemoryReader`], which walks memory from an
//! execution pointer with this same wraparound.

use yaxpeax_arch::{Reader, ReadError};

/// read access to UDVM memory.
///
/// implementations handle all wraparound themselves: `read` must accept any `address`, and the
/// byte after address `0xffff` is the byte at address `0`.
pub trait Memory {
    /// fill `buf` with the bytes starting at `address`.
    fn read(&self, address: u16, buf: &mut [u8]) -> Result<(), ReadError>;

    /// read the big-endian word at `address`. the second byte is read from `address + 1`, modulo
    /// `2^16`.
    fn read_u16(&self, address: u16) -> Result<u16, ReadError> {
        let mut buf = [0u8; 2];
        self.read(address, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl<'a, M: Memory + ?Sized> Memory for &'a M {
    fn read(&self, address: u16, buf: &mut [u8]) -> Result<(), ReadError> {
        (**self).read(address, buf)
    }
}

/// a UDVM memory backed by some owned (or borrowed) byte buffer of 1 to 65536 bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UdvmMemory<T> {
    bytes: T,
}

/// the largest memory a UDVM can address.
pub const MAX_MEMORY_SIZE: usize = 0x1_0000;

impl<T: AsRef<[u8]>> UdvmMemory<T> {
    /// wrap `bytes` as UDVM memory.
    ///
    /// returns `None` if `bytes` is empty or larger than [`MAX_MEMORY_SIZE`].
    pub fn new(bytes: T) -> Option<Self> {
        let size = bytes.as_ref().len();
        if size == 0 || size > MAX_MEMORY_SIZE {
            None
        } else {
            Some(UdvmMemory { bytes })
        }
    }

    /// the number of bytes in this memory.
    pub fn size(&self) -> usize {
        self.bytes.as_ref().len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    pub fn into_inner(self) -> T {
        self.bytes
    }

    #[inline(always)]
    fn index(&self, address: u16) -> usize {
        address as usize % self.size()
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> UdvmMemory<T> {
    /// copy `data` into memory starting at `address`, wrapping exactly as reads do.
    pub fn write(&mut self, address: u16, data: &[u8]) {
        let mut address = address;
        for b in data {
            let idx = self.index(address);
            self.bytes.as_mut()[idx] = *b;
            address = address.wrapping_add(1);
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.bytes.as_mut()
    }
}

impl<T: AsRef<[u8]>> Memory for UdvmMemory<T> {
    fn read(&self, address: u16, buf: &mut [u8]) -> Result<(), ReadError> {
        let bytes = self.bytes.as_ref();
        // `new` forbids this, but `bytes` may be a `Vec` someone emptied in place.
        if bytes.is_empty() {
            return Err(ReadError::ExhaustedInput);
        }
        let mut address = address;
        for out in buf.iter_mut() {
            *out = bytes[address as usize % bytes.len()];
            address = address.wrapping_add(1);
        }
        Ok(())
    }
}

/// a [`yaxpeax_arch::Reader`] of bytes from UDVM memory, starting at some execution pointer.
///
/// this never runs out of input on its own: reading past `0xffff` continues at `0`.
pub struct MemoryReader<'a, M: ?Sized> {
    memory: &'a M,
    start: u16,
    mark: u16,
    offset: u16,
}

impl<'a, M: Memory + ?Sized> MemoryReader<'a, M> {
    pub fn new(memory: &'a M, start: u16) -> Self {
        MemoryReader {
            memory,
            start,
            mark: 0,
            offset: 0,
        }
    }

    /// the memory address the next byte will be read from.
    pub fn address(&self) -> u16 {
        self.start.wrapping_add(self.offset)
    }
}

impl<'a, M: Memory + ?Sized> Reader<u16, u8> for MemoryReader<'a, M> {
    fn next(&mut self) -> Result<u8, ReadError> {
        let mut buf = [0u8; 1];
        self.memory.read(self.address(), &mut buf)?;
        self.offset = self.offset.wrapping_add(1);
        Ok(buf[0])
    }

    fn next_n(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        self.memory.read(self.address(), buf)?;
        self.offset = self.offset.wrapping_add(buf.len() as u16);
        Ok(())
    }

    fn mark(&mut self) {
        self.mark = self.offset;
    }

    fn offset(&mut self) -> u16 {
        self.offset.wrapping_sub(self.mark)
    }

    fn total_offset(&mut self) -> u16 {
        self.offset
    }
}
