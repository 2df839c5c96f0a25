use thiserror::Error;

/// Failure reported by the backing store.
///
/// Any such failure aborts the whole transaction: once a lookup fails the
/// cached state can no longer be trusted. Retrying belongs to the store
/// implementation, never to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("database error: {0}")]
pub struct DatabaseError(pub String);

/// Programming errors. These mean a caller broke an API contract, not that
/// execution ran into a chain-rule failure, so they abort loudly instead of
/// being folded into a halt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("account was not loaded into the store before use")]
    AccountNotLoaded,
    #[error("journal has no open frame")]
    NoOpenFrame,
    #[error("checkpoint does not match the innermost open frame")]
    StaleCheckpoint,
    #[error("transaction finalized with call frames still open")]
    UnbalancedFrames,
    #[error("arithmetic operation overflowed")]
    Overflow,
    #[error("arithmetic operation underflowed")]
    Underflow,
    #[error("{0}")]
    Custom(String),
}

impl InternalError {
    pub fn msg(msg: &str) -> Self {
        Self::Custom(msg.to_string())
    }
}

/// Hard failures that consume all remaining gas and halt the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ExceptionalHalt {
    #[error("out of gas")]
    OutOfGas,
    #[error("value is too big for the target type")]
    VeryLargeNumber,
    #[error("jump to an invalid destination")]
    InvalidJump,
    #[error("invalid opcode")]
    InvalidOpcode,
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("state modification inside a static call")]
    WriteInStaticContext,
    #[error("deployed code exceeds the maximum code size")]
    ContractSizeLimit,
    #[error("initcode exceeds the maximum initcode size")]
    InitcodeSizeExceeded,
    #[error("account nonce reached its maximum")]
    NonceOverflow,
    #[error("contract creation collision")]
    CreateCollision,
    #[error("balance overflow on payment")]
    OverflowPayment,
}

/// Any way an operation of this crate can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    #[error(transparent)]
    Halt(#[from] ExceptionalHalt),
    #[error("revert opcode executed")]
    RevertOpcode,
    #[error("insufficient balance for transfer")]
    OutOfFunds,
    #[error("call depth limit reached")]
    CallTooDeep,
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl VMError {
    /// Errors that must abort the whole transaction instead of being handled
    /// as a halt or revert of the current call.
    pub fn should_propagate(&self) -> bool {
        matches!(self, VMError::Internal(_) | VMError::Database(_))
    }
}

/// Low-level result of one unit of execution.
///
/// `Continue` and `SubcallPending` only steer the dispatch loop and must
/// never reach an external caller; [`InstructionResult::into_result`]
/// enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionResult {
    /// Keep executing the current frame.
    Continue,
    /// A nested call or create has been set up and awaits execution.
    SubcallPending,
    Stop,
    Return,
    SelfDestruct,
    Revert,
    /// Nested call beyond the depth limit. Rolls state back like a revert
    /// but is reported separately.
    CallTooDeep,
    /// Value transfer exceeding the sender balance. Same rollback behavior
    /// as a revert.
    OutOfFunds,
    Halt(ExceptionalHalt),
    FatalExternalError,
}

impl InstructionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Stop | Self::Return | Self::SelfDestruct)
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Revert | Self::CallTooDeep | Self::OutOfFunds)
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt(_))
    }

    /// Maps the low-level result onto the external-facing taxonomy, failing
    /// loudly on the two dispatch-loop-internal markers.
    pub fn into_result(self) -> Result<ExecutionResult, InternalError> {
        match self {
            Self::Continue | Self::SubcallPending => Err(InternalError::msg(
                "internal execution marker leaked out of the dispatch loop",
            )),
            Self::Stop => Ok(ExecutionResult::Success {
                reason: SuccessReason::Stop,
            }),
            Self::Return => Ok(ExecutionResult::Success {
                reason: SuccessReason::Return,
            }),
            Self::SelfDestruct => Ok(ExecutionResult::Success {
                reason: SuccessReason::SelfDestruct,
            }),
            Self::Revert | Self::CallTooDeep | Self::OutOfFunds => Ok(ExecutionResult::Revert),
            Self::Halt(reason) => Ok(ExecutionResult::Halt { reason }),
            Self::FatalExternalError => Ok(ExecutionResult::FatalExternalError),
        }
    }
}

impl From<VMError> for InstructionResult {
    fn from(error: VMError) -> Self {
        match error {
            VMError::Halt(halt) => Self::Halt(halt),
            VMError::RevertOpcode => Self::Revert,
            VMError::OutOfFunds => Self::OutOfFunds,
            VMError::CallTooDeep => Self::CallTooDeep,
            // Structural misuse and store failures both poison the
            // transaction as a whole.
            VMError::Internal(_) | VMError::Database(_) => Self::FatalExternalError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessReason {
    Stop,
    Return,
    SelfDestruct,
}

/// External-facing outcome of a call or transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    Success { reason: SuccessReason },
    Revert,
    Halt { reason: ExceptionalHalt },
    FatalExternalError,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
