use core::fmt;

use crate::{MultitypeClass, NackReason, Operand, OperandKind, Value};

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.kind(), self.value()) {
            (OperandKind::Literal, value) => {
                write!(f, "#{}", value)
            }
            (OperandKind::Reference, Value::Immediate(address)) => {
                write!(f, "${:#06x}", address)
            }
            (OperandKind::Reference, value) => {
                write!(f, "${}", value)
            }
            (OperandKind::Multitype, value) => {
                write!(f, "%{}", value)
            }
            (OperandKind::Address(instruction), Value::Immediate(displacement)) => {
                write!(f, "@{:#06x}", instruction.wrapping_add(displacement))
            }
            // the displacement is only known once memory is read
            (OperandKind::Address(instruction), Value::Indirect(address)) => {
                write!(f, "@{:#06x}+[{:#06x}]", instruction, address)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Immediate(v) => write!(f, "{}", v),
            Value::Indirect(address) => write!(f, "[{:#06x}]", address),
        }
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperandKind::Literal => f.write_str("literal"),
            OperandKind::Reference => f.write_str("reference"),
            OperandKind::Multitype => f.write_str("multitype"),
            OperandKind::Address(instruction) => write!(f, "address (instruction at {:#06x})", instruction),
        }
    }
}

impl fmt::Display for MultitypeClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pattern = match self {
            MultitypeClass::Direct6 => "00nnnnnn",
            MultitypeClass::Indirect6 => "01nnnnnn",
            MultitypeClass::PowerOfTwo6 => "1000011n",
            MultitypeClass::PowerOfTwo8 => "10001nnn",
            MultitypeClass::Biased5 => "111nnnnn",
            MultitypeClass::Biased12 => "1001nnnn nnnnnnnn",
            MultitypeClass::Direct13 => "101nnnnn nnnnnnnn",
            MultitypeClass::Indirect13 => "110nnnnn nnnnnnnn",
            MultitypeClass::Direct16 => "10000000 nnnnnnnn nnnnnnnn",
            MultitypeClass::Indirect16 => "10000001 nnnnnnnn nnnnnnnn",
        };
        write!(f, "class {} ({})", self.number(), pattern)
    }
}

impl fmt::Display for NackReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NackReason::Segfault => f.write_str("SEGFAULT"),
            NackReason::InvalidOperand => f.write_str("INVALID_OPERAND"),
        }
    }
}
