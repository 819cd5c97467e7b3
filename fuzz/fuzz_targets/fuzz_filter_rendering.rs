//! Fuzz target for filter rendering.
//!
//! Renders equality filters built from arbitrary attribute values and checks
//! that no special character leaks into the RFC 4515 string unescaped.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_filter_rendering -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use xavyo_directory::filter::escape_filter_value;
use xavyo_directory::Filter;

fuzz_target!(|data: &[u8]| {
    let escaped = escape_filter_value(data);
    assert!(!escaped.contains(['(', ')', '*', '\0']));

    let filter = Filter::and(vec![
        Filter::eq("objectClass", "person"),
        Filter::eq("cn", data.to_vec()),
    ]);
    let rendered = filter.to_string();
    assert_eq!(rendered, format!("(&(objectClass=person)(cn={escaped}))"));
    assert_eq!(rendered.matches('(').count(), 3);
});
