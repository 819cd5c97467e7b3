//! Fuzz target for DN parsing.
//!
//! Parses arbitrary strings as distinguished names and checks that every
//! accepted DN survives a render/parse cycle.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_dn_parsing -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use xavyo_directory::{Dn, Rdn};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(dn) = Dn::parse(s) {
            let rendered = dn.to_string();
            let reparsed = Dn::parse(&rendered).unwrap();
            assert_eq!(dn, reparsed);

            if let Some(parent) = dn.parent() {
                assert!(dn.is_descendant_of(&parent));
            }
        }
    }

    // Any value is a valid RDN value once escaped.
    if let Ok(rdn) = Rdn::single("cn", data.to_vec()) {
        let dn = Dn::from_rdn_and_parent(rdn, &Dn::root());
        let reparsed = Dn::parse(&dn.to_string()).unwrap();
        assert_eq!(reparsed.rdn().and_then(|r| r.value_of("cn")), Some(data));
    }
});
