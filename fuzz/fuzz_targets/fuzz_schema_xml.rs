// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use uacodec::{SchemaDocument, SchemaSet};

fuzz_target!(|data: &[u8]| {
    // Schema Documents are text
    if let Ok(xml) = std::str::from_utf8(data) {
        if let Ok(doc) = SchemaDocument::parse_xml(xml) {
            let _ = SchemaSet::single(doc);
        }
    }
});
