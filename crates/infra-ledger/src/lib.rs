// PhotoQueue Infrastructure - Ledger Adapter
// Implements: LedgerSink (append-only JSON lines file)

mod jsonl_sink;

pub use jsonl_sink::{JsonlLedgerSink, LedgerRecord};
