//! Application services for the invocation ledger.

mod ledger;

pub use ledger::{
    InvocationLedgerError, InvocationLedgerResult, InvocationLedgerService,
    RecordInvocationRequest,
};
