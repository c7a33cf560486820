//! Key-to-name tables shared between the decoder's `warn!` diagnostics and
//! the pretty-printer's key annotations, so the two never drift apart (the
//! source keeps this knowledge in two places; generating it once is the
//! improvement noted in DESIGN.md).

pub(crate) fn preamble_key_name(key: i64) -> Option<&'static str> {
    match key {
        0 => Some("version_major"),
        1 => Some("version_minor"),
        2 => Some("version_private"),
        3 => Some("block_parameters"),
        4 => Some("legacy_generator_id"),
        5 => Some("legacy_host_id"),
        _ => None,
    }
}

pub(crate) fn block_key_name(key: i64) -> Option<&'static str> {
    match key {
        0 => Some("preamble"),
        1 => Some("statistics"),
        2 => Some("tables"),
        3 => Some("queries"),
        4 => Some("address_events"),
        _ => None,
    }
}

pub(crate) fn block_tables_key_name(key: i64) -> Option<&'static str> {
    match key {
        0 => Some("addresses"),
        1 => Some("class_ids"),
        2 => Some("name_rdata"),
        3 => Some("q_sigs"),
        4 => Some("question_list"),
        5 => Some("qrr"),
        6 => Some("rr_list"),
        7 => Some("rrs"),
        _ => None,
    }
}
