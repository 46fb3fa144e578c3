// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for dynamic update construction.

#[cfg(test)]
mod tests {
    use hickory_client::rr::DNSClass;

    use crate::diff::{diff_zones, ZoneDiff};
    use crate::record::Record;
    use crate::update::{
        build_update_operations, to_nsupdate_script, validate_operations, UpdateOperation,
    };
    use crate::zone::ZoneState;

    fn a(name: &str, ttl: u32, ip: &str) -> Record {
        Record::new(name, "A", ttl, ip)
    }

    #[test]
    fn test_ttl_change_is_delete_then_add() {
        let desired = ZoneState::new("example.com.")
            .with_records(vec![a("api.example.com.", 600, "9.9.9.9")]);
        let current = ZoneState::new("example.com.")
            .with_records(vec![a("api.example.com.", 300, "9.9.9.9")]);

        let operations = build_update_operations(&diff_zones(&desired, &current));

        assert_eq!(
            operations,
            vec![
                UpdateOperation::Delete(a("api.example.com.", 300, "9.9.9.9")),
                UpdateOperation::Add(a("api.example.com.", 600, "9.9.9.9")),
            ]
        );
    }

    #[test]
    fn test_operation_order() {
        let diff = ZoneDiff {
            added: vec![a("new.example.com.", 300, "192.0.2.3")],
            removed: vec![a("old.example.com.", 300, "192.0.2.4")],
            ttl_changed: vec![(
                a("ttl.example.com.", 300, "192.0.2.5"),
                a("ttl.example.com.", 900, "192.0.2.5"),
            )],
        };

        let rendered: Vec<String> = build_update_operations(&diff)
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            rendered,
            vec![
                "update delete old.example.com. A 192.0.2.4",
                "update delete ttl.example.com. A 192.0.2.5",
                "update add new.example.com. 300 A 192.0.2.3",
                "update add ttl.example.com. 900 A 192.0.2.5",
            ]
        );
    }

    #[test]
    fn test_empty_diff_has_no_operations() {
        assert!(build_update_operations(&ZoneDiff::default()).is_empty());
    }

    #[test]
    fn test_delete_uses_class_none_and_zero_ttl() {
        let rr = UpdateOperation::Delete(a("www.example.com.", 300, "192.0.2.1"))
            .to_hickory()
            .unwrap();
        assert_eq!(rr.dns_class(), DNSClass::NONE);
        assert_eq!(rr.ttl(), 0);

        let rr = UpdateOperation::Add(a("www.example.com.", 300, "192.0.2.1"))
            .to_hickory()
            .unwrap();
        assert_eq!(rr.dns_class(), DNSClass::IN);
        assert_eq!(rr.ttl(), 300);
    }

    #[test]
    fn test_display_includes_priority() {
        let op = UpdateOperation::Add(
            Record::new("example.com.", "mx", 3600, "mail.example.com.").with_priority(10),
        );
        assert_eq!(op.to_string(), "update add example.com. 3600 MX 10 mail.example.com.");
        assert_eq!(op.action(), "add");
    }

    #[test]
    fn test_nsupdate_script() {
        let operations = vec![
            UpdateOperation::Delete(a("old.example.com.", 300, "192.0.2.4")),
            UpdateOperation::Add(a("new.example.com.", 300, "192.0.2.3")),
        ];

        assert_eq!(
            to_nsupdate_script("example.com.", &operations),
            "zone example.com.\n\
             update delete old.example.com. A 192.0.2.4\n\
             update add new.example.com. 300 A 192.0.2.3\n\
             send\n"
        );
    }

    #[test]
    fn test_validate_operations_rejects_unsupported_type() {
        let operations = vec![
            UpdateOperation::Add(a("ok.example.com.", 300, "192.0.2.1")),
            UpdateOperation::Add(Record::new("example.com.", "HINFO", 300, "cpu os")),
        ];
        assert!(validate_operations(&operations).is_err());
        assert!(validate_operations(&operations[..1]).is_ok());
    }
}
