//! Bytecode forms and jump-destination analysis.
//!
//! Raw code is promoted into a padded, analyzed form exactly once, when it
//! is loaded or deployed; the analyzed form is immutable and cheap to share
//! afterwards. Padding guarantees a decoder reading past the logical end
//! observes STOP instead of running out of the buffer.

use std::sync::Arc;

use bitvec::vec::BitVec;
use bytes::Bytes;
use ethereum_types::H256;
use keccak_hash::keccak;

use crate::constants::BYTECODE_PADDING;

pub const OP_JUMPDEST: u8 = 0x5b;
pub const OP_PUSH1: u8 = 0x60;
pub const OP_PUSH32: u8 = 0x7f;

/// Bitmap of byte offsets holding a JUMPDEST opcode at an instruction
/// boundary. Shared by every execution of the same code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JumpTable(Arc<BitVec>);

impl JumpTable {
    pub fn new(bits: BitVec) -> Self {
        Self(Arc::new(bits))
    }

    pub fn is_valid(&self, pc: usize) -> bool {
        self.0.get(pc).is_some_and(|bit| *bit)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Contract code in one of its three preprocessing stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bytecode {
    /// Code as loaded, before any validation.
    Raw(Bytes),
    /// Padded with STOP terminators; `original_len` is the logical length.
    Checked { code: Bytes, original_len: usize },
    /// Padded and scanned for legal jump destinations.
    Analyzed(AnalyzedBytecode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedBytecode {
    pub code: Bytes,
    pub original_len: usize,
    pub jump_table: JumpTable,
}

impl Default for Bytecode {
    fn default() -> Self {
        Self::new()
    }
}

impl Bytecode {
    /// Empty analyzed code: a single STOP terminator with logical length zero.
    pub fn new() -> Self {
        Self::Analyzed(AnalyzedBytecode {
            code: Bytes::from_static(&[0]),
            original_len: 0,
            jump_table: JumpTable::default(),
        })
    }

    pub fn raw(code: Bytes) -> Self {
        if code.is_empty() {
            return Self::new();
        }
        Self::Raw(code)
    }

    /// Pads `raw` so any fixed-width read near the tail stays in bounds, and
    /// records the logical length.
    pub fn checked(raw: Bytes) -> Self {
        if raw.is_empty() {
            return Self::new();
        }
        let original_len = raw.len();
        Self::Checked {
            code: pad(&raw),
            original_len,
        }
    }

    /// Scans `raw` once, marking every JUMPDEST that sits at an instruction
    /// boundary. Immediate bytes of a push are skipped without inspection, so
    /// a `0x5b` inside push data never becomes a jump target.
    pub fn analyze(raw: Bytes) -> Self {
        if raw.is_empty() {
            return Self::new();
        }

        let original_len = raw.len();
        let mut jump_table = BitVec::repeat(false, original_len);

        let mut i = 0;
        while i < original_len {
            let opcode = raw[i];
            if opcode == OP_JUMPDEST {
                jump_table.set(i, true);
                i += 1;
            } else if (OP_PUSH1..=OP_PUSH32).contains(&opcode) {
                let immediate_width = usize::from(opcode - OP_PUSH1) + 1;
                i += immediate_width + 1;
            } else {
                i += 1;
            }
        }

        Self::Analyzed(AnalyzedBytecode {
            code: pad(&raw),
            original_len,
            jump_table: JumpTable::new(jump_table),
        })
    }

    /// Promotes the code to its analyzed form, a no-op if already there.
    pub fn into_analyzed(self) -> Self {
        match self {
            Self::Raw(code) => Self::analyze(code),
            // Checked code carries padding; reanalyze from the logical bytes.
            Self::Checked { code, original_len } => Self::analyze(code.slice(0..original_len)),
            analyzed @ Self::Analyzed(_) => analyzed,
        }
    }

    /// The logical (pre-padding) code length.
    pub fn original_len(&self) -> usize {
        match self {
            Self::Raw(code) => code.len(),
            Self::Checked { original_len, .. } => *original_len,
            Self::Analyzed(analyzed) => analyzed.original_len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.original_len() == 0
    }

    /// The physical buffer, padded for the checked and analyzed forms.
    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Raw(code) => code,
            Self::Checked { code, .. } => code,
            Self::Analyzed(analyzed) => &analyzed.code,
        }
    }

    /// The logical bytes, without padding.
    pub fn logical_bytes(&self) -> Bytes {
        self.bytes().slice(0..self.original_len())
    }

    /// True when `pc` is a legal jump destination. Only analyzed code has
    /// jump targets.
    pub fn is_valid_jump(&self, pc: usize) -> bool {
        match self {
            Self::Analyzed(analyzed) => {
                pc < analyzed.original_len && analyzed.jump_table.is_valid(pc)
            }
            Self::Raw(_) | Self::Checked { .. } => false,
        }
    }

    /// keccak256 of the logical code.
    pub fn hash(&self) -> H256 {
        keccak(self.logical_bytes())
    }
}

fn pad(raw: &[u8]) -> Bytes {
    let mut padded = Vec::with_capacity(raw.len() + BYTECODE_PADDING);
    padded.extend_from_slice(raw);
    padded.resize(raw.len() + BYTECODE_PADDING, 0);
    padded.into()
}
