//! Bit-packed flag word decoders.
//!
//! Three flag words appear on the wire: the block-scope DNS flags word
//! (`get_dns_flags`/`get_edns_flags`, schema-independent), and two words
//! carried per `QuerySignature` whose bit layout is schema-dependent:
//! transport flags and signature flags.

use crate::schema::Schema;

/// `transport_protocol` enum values (`QuerySignature::qr_transport_flags`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportProtocol {
    Udp,
    Tcp,
    Tls,
    Dtls,
    Https,
    NonStandard(u8),
}

impl TransportProtocol {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::Udp,
            1 => Self::Tcp,
            2 => Self::Tls,
            3 => Self::Dtls,
            4 => Self::Https,
            15 => Self::NonStandard(15),
            other => Self::NonStandard(other),
        }
    }
}

/// The transport flag word on a `QuerySignature`, with schema-dependent bit
/// positions.
#[derive(Debug, Clone, Copy)]
pub struct TransportFlags {
    raw: i64,
    schema: Schema,
}

impl TransportFlags {
    pub fn new(raw: i64, schema: Schema) -> Self {
        Self { raw, schema }
    }

    /// `false` = IPv4, `true` = IPv6.
    pub fn ip_protocol_is_v6(self) -> bool {
        match self.schema {
            Schema::Rfc8618 => self.raw & 0x01 != 0,
            Schema::Draft04 => self.raw & 0x02 != 0,
        }
    }

    pub fn transport_protocol(self) -> TransportProtocol {
        let bits = match self.schema {
            Schema::Rfc8618 => ((self.raw >> 1) & 0x0F) as u8,
            Schema::Draft04 => (self.raw & 0x01) as u8,
        };
        TransportProtocol::from_bits(bits)
    }

    pub fn has_trailing_bytes(self) -> bool {
        match self.schema {
            Schema::Rfc8618 => self.raw & 0x20 != 0,
            Schema::Draft04 => self.raw & 0x04 != 0,
        }
    }
}

/// The `qr_sig_flags` word on a `QuerySignature`, with schema-dependent bit
/// masks.
#[derive(Debug, Clone, Copy)]
pub struct SignatureFlags {
    raw: i64,
    schema: Schema,
}

impl SignatureFlags {
    pub fn new(raw: i64, schema: Schema) -> Self {
        Self { raw, schema }
    }

    pub fn is_query_present(self) -> bool {
        self.raw & 0x01 != 0
    }

    pub fn is_response_present(self) -> bool {
        self.raw & 0x02 != 0
    }

    pub fn is_query_present_with_opt(self) -> bool {
        let mask = match self.schema {
            Schema::Rfc8618 => 0x04,
            Schema::Draft04 => 0x08,
        };
        self.raw & mask != 0
    }

    pub fn is_response_present_with_opt(self) -> bool {
        let mask = match self.schema {
            Schema::Rfc8618 => 0x08,
            Schema::Draft04 => 0x10,
        };
        self.raw & mask != 0
    }

    /// Draft-04 never defined this bit independently of
    /// `response_present_with_no_question`; the original reader guesses by
    /// aliasing the two. Preserved here rather than guessed at afresh.
    pub fn is_query_present_with_no_question(self) -> bool {
        match self.schema {
            Schema::Rfc8618 => self.raw & 0x10 != 0,
            Schema::Draft04 => self.is_response_present_with_no_question(),
        }
    }

    pub fn is_response_present_with_no_question(self) -> bool {
        self.raw & 0x20 != 0
    }
}

/// Block-scope DNS flags extractor: not schema-dependent, pulled straight
/// out of the packed `qr_dns_flags` word on a `Query`.
pub fn get_dns_flags(q_dns_flags: u16, is_response: bool) -> u16 {
    if is_response {
        (q_dns_flags >> 8) & 0x7E
    } else {
        q_dns_flags & 0x7C
    }
}

/// Promotes the EDNS DO bit (bit 7 of the packed word) to bit 15.
pub fn get_edns_flags(q_dns_flags: u16) -> u16 {
    (q_dns_flags << 8) & (1 << 15)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transport_flags_rfc() {
        let f = TransportFlags::new(0b0000_0011, Schema::Rfc8618);
        assert!(!f.ip_protocol_is_v6());
        assert_eq!(f.transport_protocol(), TransportProtocol::Tcp);
    }

    #[test]
    fn transport_flags_draft04() {
        // bit1 set => v6, bit0 clear => udp
        let f = TransportFlags::new(0b0000_0010, Schema::Draft04);
        assert!(f.ip_protocol_is_v6());
        assert_eq!(f.transport_protocol(), TransportProtocol::Udp);
    }

    #[test]
    fn signature_flags_no_question_alias() {
        let f = SignatureFlags::new(0x20, Schema::Draft04);
        assert!(f.is_response_present_with_no_question());
        assert!(f.is_query_present_with_no_question());
    }

    #[test]
    fn signature_flags_rfc_independent() {
        let f = SignatureFlags::new(0x10, Schema::Rfc8618);
        assert!(f.is_query_present_with_no_question());
        assert!(!f.is_response_present_with_no_question());
    }

    #[test]
    fn dns_flags_extraction() {
        let f: u16 = 0b1111_1111_1111_1111;
        assert_eq!(get_dns_flags(f, true), 0x7E);
        assert_eq!(get_dns_flags(f, false), 0x7C);
        assert_eq!(get_edns_flags(f), 1 << 15);
    }
}
