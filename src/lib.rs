//! # `yaxpeax-udvm`, a decoder for SigComp UDVM operands
//!
//! the Universal Decompressor Virtual Machine (UDVM) is the bytecode machine that SigComp (RFC
//! 3320) uses to decompress signaling messages. a UDVM program is bytecode held in a flat,
//! 16-bit-addressed memory; every instruction is an opcode byte followed by some operands, and
//! each operand is one of four variable-length encodings chosen to keep small values small.
//!
//! this crate decodes those operands. it does not know about opcodes: the dispatch loop of a
//! UDVM knows which kind of operand each instruction slot takes and asks for one operand at a
//! time. the four kinds, as RFC 3320 names them:
//!
//! * `#`, literal: an unsigned value in one, two or three bytes.
//! * `$`, reference: a memory address. the one- and two-byte forms count in 16-bit words and are
//!   doubled, the three-byte form is a byte address.
//! * `%`, multitype: ten encodings, some of which are direct values, some biased or power-of-two
//!   values, and three of which name a memory word that holds the actual value.
//! * `@`, address: a multitype operand taken as a displacement from the address of the
//!   instruction the operand belongs to.
//!
//! decoding happens in two steps. an [`OperandDecoder`] only looks at the operand's own bytes,
//! through any [`yaxpeax_arch::Reader`], and produces an [`Operand`]: multitype encodings that
//! read memory come out as [`Value::Indirect`]. [`Operand::resolve`] then performs that read
//! against a [`Memory`] and applies the instruction address for `@` operands.
//! [`OperandDecoder::decode_at`] does both against UDVM memory and advances an execution pointer.
//!
//! reference materials:
//! ```text
//! RFC 3320, Signaling Compression (SigComp): UDVM operand types
//! RFC 4077, A Negative Acknowledgement Mechanism for Signaling Compression
//! ```
//!
//! ## usage
//!
//! operands can be decoded from a plain byte slice with [`OperandDecoder::decode_slice()`]:
//! ```
//! use yaxpeax_udvm::{OperandDecoder, OperandKind, Value};
//!
//! let operand = OperandDecoder::new(OperandKind::Multitype).decode_slice(&[0x87]).unwrap();
//!
//! assert_eq!(operand.value(), Value::Immediate(128));
//! assert_eq!(operand.len(), 1);
//! assert_eq!("%128", operand.to_string());
//! ```
//!
//! a UDVM dispatch loop would rather decode straight out of its memory, where reads wrap at the
//! top of the address space:
//! ```
//! use yaxpeax_udvm::UdvmMemory;
//!
//! let mut memory = UdvmMemory::new(vec![0u8; 65536]).unwrap();
//! memory.write(0xfffe, &[0xc0, 0x01, 0x02]);
//!
//! let mut execution_pointer = 0xfffe;
//! assert_eq!(yaxpeax_udvm::literal(&memory, &mut execution_pointer), Ok(258));
//! assert_eq!(execution_pointer, 1);
//! ```
//!
//! malformed bytecode is an error, never a value. the error knows which SigComp NACK reason it
//! should be reported as:
//! ```
//! use yaxpeax_udvm::{DecodeError, NackReason, OperandDecoder, OperandKind};
//!
//! let err = OperandDecoder::new(OperandKind::Literal).decode_slice(&[0xc1, 0, 0]).unwrap_err();
//! assert_eq!(err, DecodeError::InvalidOperand);
//! assert_eq!(err.nack_reason(), NackReason::InvalidOperand);
//! assert_eq!(err.nack_reason().code(), 14);
//! ```
//!
//! ## `#![no_std]`
//!
//! `yaxpeax-udvm` is `no_std`. the `std` feature adds an `std::error::Error` impl for
//! [`DecodeError`].

#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod display;
mod memory;
mod multitype;

pub use memory::{Memory, MemoryReader, UdvmMemory, MAX_MEMORY_SIZE};
pub use multitype::{multitype_class, MultitypeClass, MULTITYPE_CLASSES, PATTERNS};

use yaxpeax_arch::{AddressDiff, Arch, Decoder, LengthedInstruction, Reader, U8Reader};

/// a trivial struct for [`yaxpeax_arch::Arch`] to be implemented on. it's only interesting for the
/// associated type parameters.
///
/// the "instruction" decoded for this architecture is a single operand. UDVM opcodes are one
/// byte each and are not interesting to decode.
#[derive(Hash, Eq, PartialEq, Debug, Copy, Clone)]
pub struct UDVM;

impl Arch for UDVM {
    type Address = u16;
    type Word = u8;
    type Instruction = Operand;
    type Decoder = OperandDecoder;
    type DecodeError = DecodeError;
    type Operand = Value;
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DecodeError {
    /// no input available but the operand would require at least one more byte to decode
    ExhaustedInput,
    /// the first byte of this operand does not begin any encoding of the requested kind
    InvalidOperand,
}

impl From<yaxpeax_arch::ReadError> for DecodeError {
    fn from(_e: yaxpeax_arch::ReadError) -> Self {
        DecodeError::ExhaustedInput
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use yaxpeax_arch::DecodeError;
        f.write_str(self.description())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

impl yaxpeax_arch::DecodeError for DecodeError {
    fn data_exhausted(&self) -> bool {
        *self == DecodeError::ExhaustedInput
    }
    fn bad_opcode(&self) -> bool {
        false
    }
    fn bad_operand(&self) -> bool {
        *self == DecodeError::InvalidOperand
    }
    fn description(&self) -> &'static str {
        match self {
            DecodeError::ExhaustedInput => "exhausted input",
            DecodeError::InvalidOperand => "invalid operand encoding",
        }
    }
}

impl DecodeError {
    /// the reason a decompressor should give in the NACK it sends back for this failure.
    ///
    /// a UDVM reads operands out of its own memory, which does not run out; the only way to
    /// exhaust input there is a memory that cannot be read at all, which is reported the way RFC
    /// 4077 reports other bad memory accesses.
    pub fn nack_reason(&self) -> NackReason {
        match self {
            DecodeError::ExhaustedInput => NackReason::Segfault,
            DecodeError::InvalidOperand => NackReason::InvalidOperand,
        }
    }
}

/// the subset of RFC 4077 NACK reason codes an operand decode can fail with.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum NackReason {
    /// `SEGFAULT`: a memory access could not be performed.
    Segfault = 4,
    /// `INVALID_OPERAND`: bytecode contained an operand encoding the UDVM does not define.
    InvalidOperand = 14,
}

impl NackReason {
    /// the one-byte reason code as carried in a NACK message.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// which of the four UDVM operand encodings to decode.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum OperandKind {
    /// `#`: a literal value.
    Literal,
    /// `$`: a memory address, doubled in the short forms.
    Reference,
    /// `%`: a multitype operand.
    Multitype,
    /// `@`: a multitype operand relative to the memory address of the instruction it is part of.
    /// the address is that of the instruction's first byte, i.e. its opcode.
    Address(u16),
}

/// the value of an operand, as far as it can be known from the operand's bytes alone.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Value {
    /// the operand's value is this number.
    Immediate(u16),
    /// the operand's value is the big-endian word stored at this memory address.
    Indirect(u16),
}

/// a decoded UDVM operand.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct Operand {
    kind: OperandKind,
    value: Value,
    length: u8,
}

impl Default for Operand {
    fn default() -> Operand {
        Operand {
            kind: OperandKind::Multitype,
            value: Value::Immediate(0),
            length: 0,
        }
    }
}

impl Operand {
    /// the kind of encoding this operand was decoded as.
    pub fn kind(&self) -> OperandKind {
        self.kind
    }

    /// the operand's value, before any memory read. for `@` operands this is the displacement,
    /// not yet added to the instruction address.
    pub fn value(&self) -> Value {
        self.value
    }

    /// the length of this operand, in bytes. `1`, `2` or `3`.
    pub fn len(&self) -> u8 {
        self.length
    }

    /// the operand's final value, if it can be known without reading memory.
    pub fn immediate(&self) -> Option<u16> {
        match self.value {
            Value::Immediate(v) => Some(self.relocate(v)),
            Value::Indirect(_) => None,
        }
    }

    /// the operand's final value: an indirect value is read from `memory`, and `@` operands are
    /// added to their instruction address, modulo `2^16`.
    pub fn resolve<M: Memory + ?Sized>(&self, memory: &M) -> Result<u16, DecodeError> {
        let v = match self.value {
            Value::Immediate(v) => v,
            Value::Indirect(address) => memory.read_u16(address)?,
        };
        Ok(self.relocate(v))
    }

    fn relocate(&self, v: u16) -> u16 {
        match self.kind {
            OperandKind::Address(instruction) => instruction.wrapping_add(v),
            _ => v,
        }
    }
}

impl LengthedInstruction for Operand {
    type Unit = AddressDiff<<UDVM as Arch>::Address>;
    fn min_size() -> Self::Unit {
        AddressDiff::from_const(1)
    }
    fn len(&self) -> Self::Unit {
        AddressDiff::from_const(self.length as u16)
    }
}

impl yaxpeax_arch::Instruction for Operand {
    fn well_defined(&self) -> bool { true }
}

/// a UDVM operand decoder, for one kind of operand.
///
/// the decoder holds no state besides the operand kind; an `@` decoder carries the address of
/// the instruction being decoded, so a dispatch loop builds a fresh one per instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OperandDecoder {
    kind: OperandKind,
}

impl Default for OperandDecoder {
    fn default() -> Self {
        OperandDecoder { kind: OperandKind::Multitype }
    }
}

impl OperandDecoder {
    pub fn new(kind: OperandKind) -> Self {
        OperandDecoder { kind }
    }

    pub fn kind(&self) -> OperandKind {
        self.kind
    }

    /// decode a slice of bytes into an operand (or error). indirect values are not resolved.
    ///
    /// this is just a higher-level interface to the [`OperandDecoder`] impl of
    /// [`yaxpeax_arch::Decoder`].
    pub fn decode_slice(&self, data: &[u8]) -> Result<Operand, <UDVM as Arch>::DecodeError> {
        self.decode(&mut U8Reader::new(data))
    }

    /// decode the operand at `*execution_pointer` in `memory`, resolve it, and advance
    /// `execution_pointer` past it.
    ///
    /// on error, `execution_pointer` is not modified. the caller should abandon the message
    /// being decompressed; there is no meaningful value to continue with.
    pub fn decode_at<M: Memory + ?Sized>(&self, memory: &M, execution_pointer: &mut u16) -> Result<u16, DecodeError> {
        let mut reader = MemoryReader::new(memory, *execution_pointer);
        let operand = self.decode(&mut reader)?;
        let value = operand.resolve(memory)?;
        tracing::trace!(
            execution_pointer = *execution_pointer,
            length = operand.len(),
            value,
            "decoded {}", operand
        );
        *execution_pointer = execution_pointer.wrapping_add(operand.len() as u16);
        Ok(value)
    }
}

/// decode a literal (`#`) operand at `*execution_pointer`, advancing it.
pub fn literal<M: Memory + ?Sized>(memory: &M, execution_pointer: &mut u16) -> Result<u16, DecodeError> {
    OperandDecoder::new(OperandKind::Literal).decode_at(memory, execution_pointer)
}

/// decode a reference (`$`) operand at `*execution_pointer`, advancing it. the result is the
/// referenced address, not the contents of memory there.
pub fn reference<M: Memory + ?Sized>(memory: &M, execution_pointer: &mut u16) -> Result<u16, DecodeError> {
    OperandDecoder::new(OperandKind::Reference).decode_at(memory, execution_pointer)
}

/// decode a multitype (`%`) operand at `*execution_pointer`, advancing it.
pub fn multitype<M: Memory + ?Sized>(memory: &M, execution_pointer: &mut u16) -> Result<u16, DecodeError> {
    OperandDecoder::new(OperandKind::Multitype).decode_at(memory, execution_pointer)
}

/// decode an address (`@`) operand at `*execution_pointer`, advancing it.
/// `instruction_address` is the address of the opcode of the instruction being decoded.
pub fn address<M: Memory + ?Sized>(memory: &M, execution_pointer: &mut u16, instruction_address: u16) -> Result<u16, DecodeError> {
    OperandDecoder::new(OperandKind::Address(instruction_address)).decode_at(memory, execution_pointer)
}

#[inline(always)]
fn read_u16<T: Reader<<UDVM as Arch>::Address, <UDVM as Arch>::Word>>(words: &mut T) -> Result<u16, DecodeError> {
    let mut buf = [0u8; 2];
    words.next_n(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// the low bits of a two-byte operand whose first byte has already been read.
#[inline(always)]
fn read_low_bits<T: Reader<<UDVM as Arch>::Address, <UDVM as Arch>::Word>>(first: u8, mask: u16, words: &mut T) -> Result<u16, DecodeError> {
    let second = words.next()?;
    Ok(u16::from_be_bytes([first, second]) & mask)
}

/// the field shared by literal and reference operands:
/// ```text
/// 0nnnnnnn
/// 10nnnnnn nnnnnnnn
/// 11000000 nnnnnnnn nnnnnnnn
/// ```
/// along with `true` if this was one of the two short forms.
fn read_prefixed<T: Reader<<UDVM as Arch>::Address, <UDVM as Arch>::Word>>(first: u8, words: &mut T) -> Result<(u16, bool), DecodeError> {
    match first >> 6 {
        0b00 |
        0b01 => {
            Ok(((first & 0x7f) as u16, true))
        }
        0b10 => {
            Ok((read_low_bits(first, 0x3fff, words)?, true))
        }
        _ => {
            // only `11000000` is defined; the rest of `11xxxxxx` is reserved
            if first != 0b1100_0000 {
                return Err(DecodeError::InvalidOperand);
            }
            Ok((read_u16(words)?, false))
        }
    }
}

fn read_multitype<T: Reader<<UDVM as Arch>::Address, <UDVM as Arch>::Word>>(first: u8, words: &mut T) -> Result<Value, DecodeError> {
    let class = multitype_class(first).ok_or(DecodeError::InvalidOperand)?;

    let value = match class {
        MultitypeClass::Direct6 => {
            Value::Immediate((first & 0x3f) as u16)
        }
        MultitypeClass::Indirect6 => {
            Value::Indirect(2 * (first & 0x3f) as u16)
        }
        MultitypeClass::PowerOfTwo6 => {
            Value::Immediate(1 << (6 + (first & 0b1)))
        }
        MultitypeClass::PowerOfTwo8 => {
            Value::Immediate(1 << (8 + (first & 0b111)))
        }
        MultitypeClass::Biased5 => {
            Value::Immediate(65504 + (first & 0x1f) as u16)
        }
        MultitypeClass::Biased12 => {
            Value::Immediate(61440 + read_low_bits(first, 0x0fff, words)?)
        }
        MultitypeClass::Direct13 => {
            Value::Immediate(read_low_bits(first, 0x1fff, words)?)
        }
        MultitypeClass::Indirect13 => {
            Value::Indirect(read_low_bits(first, 0x1fff, words)?)
        }
        MultitypeClass::Direct16 => {
            Value::Immediate(read_u16(words)?)
        }
        MultitypeClass::Indirect16 => {
            Value::Indirect(read_u16(words)?)
        }
    };

    Ok(value)
}

impl Decoder<UDVM> for OperandDecoder {
    fn decode_into<T: Reader<<UDVM as Arch>::Address, <UDVM as Arch>::Word>>(&self, operand: &mut Operand, words: &mut T) -> Result<(), <UDVM as Arch>::DecodeError> {
        operand.kind = self.kind;
        operand.value = Value::Immediate(0);
        operand.length = 0;
        words.mark();
        let first = words.next()?;

        let value = match self.kind {
            OperandKind::Literal => {
                read_prefixed(first, words).map(|(n, _)| Value::Immediate(n))
            }
            OperandKind::Reference => {
                // short forms count 16-bit words, the long form is a byte address
                read_prefixed(first, words).map(|(n, short)| {
                    Value::Immediate(if short { n * 2 } else { n })
                })
            }
            OperandKind::Multitype |
            OperandKind::Address(_) => {
                read_multitype(first, words)
            }
        };

        operand.value = value.map_err(|e| {
            if e == DecodeError::InvalidOperand {
                tracing::debug!(first_byte = first, kind = %self.kind, "invalid operand encoding");
            }
            e
        })?;
        operand.length = words.offset() as u8;
        Ok(())
    }
}
