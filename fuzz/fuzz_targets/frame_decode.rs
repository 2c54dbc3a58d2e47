//! Fuzz target for frame decoding
//!
//! Feeds arbitrary text to both frame decoders to find:
//! - Parser panics on malformed JSON
//! - Envelopes with unknown event names or mismatched payloads that slip
//!   through
//! - Frames that decode but do not survive a re-encode
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use parley_proto::{ClientFrame, ServerFrame};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(frame) = ServerFrame::decode(text) {
        let encoded = frame.encode().expect("decoded frame must re-encode");
        let again = ServerFrame::decode(&encoded).expect("re-encoded frame must decode");
        assert_eq!(frame, again);
    }

    if let Ok(frame) = ClientFrame::decode(text) {
        let encoded = frame.encode().expect("decoded frame must re-encode");
        let again = ClientFrame::decode(&encoded).expect("re-encoded frame must decode");
        assert_eq!(frame, again);
    }
});
