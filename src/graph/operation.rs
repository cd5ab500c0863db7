use crate::utils::Result;
use std::fmt;

/// Alignment operation of a query against a single graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Match(u32),
    Mismatch(u32),
    Ins(u32),
    Del(u32),
    SoftClip(u32),
    Missing(u32),
}

impl Operation {
    pub fn ref_len(&self) -> usize {
        match self {
            Operation::Match(len)
            | Operation::Mismatch(len)
            | Operation::Del(len)
            | Operation::Missing(len) => *len as usize,
            Operation::Ins(_) | Operation::SoftClip(_) => 0,
        }
    }

    pub fn query_len(&self) -> usize {
        match self {
            Operation::Match(len)
            | Operation::Mismatch(len)
            | Operation::Ins(len)
            | Operation::SoftClip(len)
            | Operation::Missing(len) => *len as usize,
            Operation::Del(_) => 0,
        }
    }

    pub fn length(&self) -> u32 {
        match self {
            Operation::Match(len)
            | Operation::Mismatch(len)
            | Operation::Ins(len)
            | Operation::Del(len)
            | Operation::SoftClip(len)
            | Operation::Missing(len) => *len,
        }
    }

    fn code(&self) -> char {
        match self {
            Operation::Match(_) => 'M',
            Operation::Mismatch(_) => 'X',
            Operation::Ins(_) => 'I',
            Operation::Del(_) => 'D',
            Operation::SoftClip(_) => 'S',
            Operation::Missing(_) => 'N',
        }
    }

    fn from_code(code: char, len: u32) -> Result<Self> {
        match code {
            'M' => Ok(Operation::Match(len)),
            'X' => Ok(Operation::Mismatch(len)),
            'I' => Ok(Operation::Ins(len)),
            'D' => Ok(Operation::Del(len)),
            'S' => Ok(Operation::SoftClip(len)),
            'N' => Ok(Operation::Missing(len)),
            _ => Err(format!("Unknown alignment operation: '{}'", code)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.length(), self.code())
    }
}

/// Longest operation accepted when decoding
pub const MAX_OPERATION_LEN: u32 = i32::MAX as u32;

/// Decodes a CIGAR-like string such as `3M1X2I` into operations
pub fn decode_operations(encoding: &str) -> Result<Vec<Operation>> {
    let mut ops = Vec::new();
    let mut len_start = 0;
    for (index, code) in encoding.char_indices() {
        if code.is_ascii_digit() {
            continue;
        }
        let len_str = &encoding[len_start..index];
        let len: u32 = len_str
            .parse()
            .map_err(|_| format!("Invalid operation length in '{}'", encoding))?;
        if len == 0 {
            return Err(format!("Zero-length operation in '{}'", encoding));
        }
        if len > MAX_OPERATION_LEN {
            return Err(format!("Operation too long in '{}'", encoding));
        }
        ops.push(Operation::from_code(code, len)?);
        len_start = index + code.len_utf8();
    }

    if len_start != encoding.len() {
        return Err(format!("Dangling operation length in '{}'", encoding));
    }
    if ops.is_empty() {
        return Err("Empty operation encoding".to_string());
    }

    Ok(ops)
}
