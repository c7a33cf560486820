//! The C-DNS data model: one struct or enum per wire entity, holding
//! already-decoded, schema-normalized values. Nothing in this module reads
//! bytes; see `decode` for that.

use std::borrow::Cow;

use crate::schema::TableIndex;

/// Top-level decode result for one `[FileType, Preamble, BlockList]` file.
/// `File` (see `file.rs`) is the stateful driver around this; `Preamble` is
/// the data it captures once.
#[derive(Debug, Clone)]
pub struct Preamble {
    pub version_major: i64,
    pub version_minor: i64,
    pub version_private: i64,
    pub block_parameters: BlockParameters,
    pub legacy_generator_id: Option<String>,
    pub legacy_host_id: Option<String>,
}

/// `block_parameters`'s shape switches on `version_major`: the RFC form is
/// an array of one-or-more `BlockParameter`; draft-04 wrote a single flat
/// `BlockParameterOld` map instead of an array. Both are kept (DESIGN.md
/// open question) rather than normalized into one shape, since draft-04's
/// map doesn't carry enough fields to synthesize an RFC `BlockParameter`.
#[derive(Debug, Clone)]
pub enum BlockParameters {
    Rfc(Vec<BlockParameter>),
    Old(BlockParameterOld),
}

impl BlockParameters {
    /// `ticks_per_second` for the parameter set at `index`, or the 1e6
    /// default if the index is out of range or this is the draft-04 form
    /// (draft-04 timestamps are already microseconds).
    pub fn ticks_per_second(&self, index: Option<usize>) -> i64 {
        match self {
            Self::Rfc(params) => index
                .and_then(|i| params.get(i))
                .map(|p| p.storage.ticks_per_second)
                .unwrap_or(1_000_000),
            Self::Old(_) => 1_000_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockParameter {
    pub storage: StorageParameter,
    pub collection: CollectionParameters,
}

#[derive(Debug, Clone)]
pub struct StorageParameter {
    pub ticks_per_second: i64,
    pub max_block_items: Option<i64>,
    pub storage_hints: StorageHints,
    pub opcodes: Vec<i64>,
    pub rr_types: Vec<i64>,
    pub storage_flags: Option<i64>,
    pub client_address_prefix_ipv4: Option<i64>,
    pub client_address_prefix_ipv6: Option<i64>,
    pub server_address_prefix_ipv4: Option<i64>,
    pub server_address_prefix_ipv6: Option<i64>,
    pub sampling_method: Option<Vec<u8>>,
    pub anonymization_method: Option<Vec<u8>>,
}

impl Default for StorageParameter {
    fn default() -> Self {
        Self {
            ticks_per_second: 1_000_000,
            max_block_items: None,
            storage_hints: StorageHints::default(),
            opcodes: Vec::new(),
            rr_types: Vec::new(),
            storage_flags: None,
            client_address_prefix_ipv4: None,
            client_address_prefix_ipv6: None,
            server_address_prefix_ipv4: None,
            server_address_prefix_ipv6: None,
            sampling_method: None,
            anonymization_method: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageHints {
    pub query_response_hints: i64,
    pub query_response_signature_hints: i64,
    pub rr_hints: i64,
    pub other_data_hints: i64,
}

impl Default for StorageHints {
    fn default() -> Self {
        Self {
            query_response_hints: -1,
            query_response_signature_hints: -1,
            rr_hints: -1,
            other_data_hints: -1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectionParameters {
    pub query_timeout: Option<i64>,
    pub skew_timeout: Option<i64>,
    pub snaplen: Option<i64>,
    pub promisc: Option<bool>,
    pub interfaces: Vec<Vec<u8>>,
    pub server_addresses: Vec<Vec<u8>>,
    pub vlan_id: Vec<Vec<u8>>,
    pub filter: Option<Vec<u8>>,
    pub query_options: Option<i64>,
    pub response_options: Option<i64>,
    pub generator_id: Option<String>,
    pub host_id: Option<String>,
}

/// The draft-04 flat parameter map. No `vlan_id`: draft-04 writers never
/// actually encoded it in practice, even though the RFC language implies
/// the key exists (see DESIGN.md).
#[derive(Debug, Clone, Default)]
pub struct BlockParameterOld {
    pub query_timeout: Option<i64>,
    pub skew_timeout: Option<i64>,
    pub snaplen: Option<i64>,
    /// An integer on the wire, not a CBOR boolean, here — unlike
    /// `CollectionParameters::promisc` (see DESIGN.md).
    pub promisc: Option<i64>,
    pub interfaces: Vec<Vec<u8>>,
    pub server_addresses: Vec<Vec<u8>>,
    pub filter: Option<Vec<u8>>,
    pub query_options: Option<i64>,
    pub response_options: Option<i64>,
    /// Text, not integer, on the wire here — unlike the RFC form's
    /// `StorageParameter::rr_types` (see DESIGN.md).
    pub accept_rr_types: Vec<String>,
    pub ignore_rr_types: Vec<String>,
    pub max_block_qr_items: Option<i64>,
    /// Also an integer on the wire, not a CBOR boolean (see DESIGN.md).
    pub collect_malformed: Option<i64>,
}

/// One decoded block: its own preamble, counters, dedup tables and the
/// queries/address events that reference them. `'a` ties borrowed
/// byte/text table entries to the `File`'s buffer.
#[derive(Debug, Clone)]
pub struct Block<'a> {
    pub preamble: BlockPreamble,
    pub statistics: BlockStatistics,
    pub tables: BlockTables<'a>,
    pub queries: Vec<Query>,
    pub address_events: Vec<AddressEventCount>,
    pub block_start_us: u64,
}

#[derive(Debug, Clone, Default)]
pub struct BlockPreamble {
    pub earliest_time_sec: i64,
    pub earliest_time_usec: i64,
    pub block_parameter_index: TableIndex,
}

#[derive(Debug, Clone, Default)]
pub struct BlockStatistics {
    pub processed_messages: Option<i64>,
    pub qr_data_items: Option<i64>,
    pub unmatched_queries: Option<i64>,
    pub unmatched_responses: Option<i64>,
    pub discarded_opcode: Option<i64>,
    /// draft-04's `partially_malformed_items` (key 5) is coalesced into
    /// this field rather than kept distinct (DESIGN.md open question).
    pub malformed_items: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockTables<'a> {
    pub addresses: Vec<Cow<'a, [u8]>>,
    pub class_ids: Vec<ClassId>,
    pub name_rdata: Vec<Cow<'a, [u8]>>,
    pub q_sigs: Vec<QuerySignature>,
    pub question_list: Vec<Vec<i64>>,
    pub qrr: Vec<QuestionRR>,
    pub rr_list: Vec<Vec<i64>>,
    pub rrs: Vec<ResourceRecord>,
}

/// `class_ids` entries: the one table with a strict unknown-key rule
/// (DESIGN.md / `cdns_class_id::parse_map_item`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassId {
    pub rr_type: i64,
    pub rr_class: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionRR {
    pub name_index: TableIndex,
    pub classtype_index: TableIndex,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceRecord {
    pub name_index: TableIndex,
    pub classtype_index: TableIndex,
    pub ttl: Option<i64>,
    pub rdata_index: TableIndex,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub time_offset_usec: i64,
    pub client_address_index: TableIndex,
    pub client_port: Option<i64>,
    pub transaction_id: Option<i64>,
    pub query_signature_index: TableIndex,
    pub client_hoplimit: Option<i64>,
    pub delay_usec: Option<i64>,
    pub query_name_index: TableIndex,
    pub query_size: Option<i64>,
    pub response_size: Option<i64>,
    pub response_processing_data: Option<ResponseProcessingData>,
    pub query_extended: QrExtended,
    pub response_extended: QrExtended,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QrExtended {
    pub question_index: TableIndex,
    pub answer_index: TableIndex,
    pub authority_index: TableIndex,
    pub additional_index: TableIndex,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseProcessingData {
    pub bailiwick_index: TableIndex,
    pub processing_flags: Option<i64>,
    pub is_present: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QuerySignature {
    pub server_address_index: TableIndex,
    pub server_port: Option<i64>,
    pub qr_transport_flags: i64,
    /// RFC only; `None` on a draft-04 file.
    pub qr_type: Option<i64>,
    pub qr_sig_flags: i64,
    pub query_opcode: Option<i64>,
    pub qr_dns_flags: i64,
    pub query_rcode: Option<i64>,
    pub query_classtype_index: TableIndex,
    pub query_qdcount: Option<i64>,
    pub query_ancount: Option<i64>,
    pub query_nscount: Option<i64>,
    pub query_arcount: Option<i64>,
    pub edns_version: Option<i64>,
    pub udp_buf_size: Option<i64>,
    pub opt_rdata_index: TableIndex,
    pub response_rcode: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct AddressEventCount {
    pub ae_type: Option<i64>,
    pub ae_code: Option<i64>,
    /// RFC only.
    pub ae_transport_flags: Option<i64>,
    pub ae_address_index: TableIndex,
    pub ae_count: Option<i64>,
}
