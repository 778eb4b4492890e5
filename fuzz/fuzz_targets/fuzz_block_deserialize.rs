#![no_main]

use libfuzzer_sys::fuzz_target;
use rai_ledger::Block;

// The block codec must never panic on attacker-controlled bytes, and any
// block it does accept must re-serialize to the exact input.
fuzz_target!(|data: &[u8]| {
    if let Some(block) = Block::from_bytes(data) {
        assert_eq!(block.serialize(), data);
        let _ = block.hash();
        let _ = block.root();
    }
});
