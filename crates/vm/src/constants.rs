use ethereum_types::H256;

pub const WORD_SIZE_IN_BYTES_USIZE: usize = 32;
pub const WORD_SIZE_IN_BYTES_U64: u64 = 32;

pub const STACK_LIMIT: usize = 1024;

/// keccak256 of the empty byte string, the code hash of accounts without code.
pub const EMPTY_CODE_HASH: H256 = H256([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

pub const MEMORY_EXPANSION_QUOTIENT: usize = 512;

// https://eips.ethereum.org/EIPS/eip-170
pub const MAX_CODE_SIZE: usize = 0x6000;
// https://eips.ethereum.org/EIPS/eip-3860
pub const INIT_CODE_MAX_SIZE: usize = 49152;

/// Stop-opcode padding appended past the logical end of checked bytecode so
/// a fixed-width read near the tail never runs out of the buffer.
pub const BYTECODE_PADDING: usize = 33;

// Transaction costs in gas
pub const TX_BASE_COST: u64 = 21000;

// Refund quotients applied by the transaction finalizer, not by this crate.
// https://eips.ethereum.org/EIPS/eip-3529
pub const REFUND_QUOTIENT: u64 = 2;
pub const REFUND_QUOTIENT_LONDON: u64 = 5;
