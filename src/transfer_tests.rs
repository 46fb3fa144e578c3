// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for AXFR snapshot handling.

#[cfg(test)]
mod tests {
    use hickory_client::rr::{rdata, Name, RData, Record as DnsRecord};
    use std::str::FromStr;
    use std::time::Duration;

    use crate::errors::FetchError;
    use crate::transfer::{snapshot_from_records, AxfrSnapshotProvider, ZoneSnapshotProvider};
    use crate::tsig::{KeyAlgorithm, TsigKey};

    fn name(value: &str) -> Name {
        Name::from_str(value).unwrap()
    }

    fn soa(serial: u32) -> DnsRecord {
        DnsRecord::from_rdata(
            name("example.com."),
            3600,
            RData::SOA(rdata::SOA::new(
                name("ns1.example.com."),
                name("admin.example.com."),
                serial,
                3600,
                600,
                604_800,
                86400,
            )),
        )
    }

    fn a(owner: &str, octet: u8) -> DnsRecord {
        DnsRecord::from_rdata(name(owner), 300, RData::A(rdata::A::new(192, 0, 2, octet)))
    }

    #[test]
    fn test_trailing_soa_is_dropped() {
        let raw = vec![soa(7), a("www.example.com.", 1), a("api.example.com.", 2), soa(7)];
        let state = snapshot_from_records("example.com", &raw);

        assert_eq!(state.origin, "example.com.");
        assert_eq!(state.records.len(), 3);
        assert_eq!(state.records.iter().filter(|r| r.is_soa()).count(), 1);
        assert_eq!(state.default_ttl, Some(3600));
    }

    #[test]
    fn test_records_keep_transfer_order() {
        let raw = vec![soa(1), a("b.example.com.", 2), a("a.example.com.", 1), soa(1)];
        let state = snapshot_from_records("example.com.", &raw);

        assert_eq!(state.records[1].name, "b.example.com.");
        assert_eq!(state.records[2].name, "a.example.com.");
    }

    #[test]
    fn test_snapshot_without_soa() {
        let state = snapshot_from_records("example.com.", &[a("www.example.com.", 1)]);
        assert!(state.find_soa().is_none());
        assert_eq!(state.default_ttl, None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_fetch_error() {
        let key = TsigKey {
            name: "transfer-key".to_string(),
            algorithm: KeyAlgorithm::HmacSha256,
            secret: "dGVzdHNlY3JldA==".to_string(),
        };
        // Port 9 on loopback is not expected to run a DNS server
        let provider = AxfrSnapshotProvider::new("127.0.0.1:9", key, Duration::from_millis(500));

        let result = provider.fetch("example.com").await;
        assert!(matches!(
            result,
            Err(FetchError::TransferFailed { .. } | FetchError::TransferTimeout { .. })
        ));
    }
}
