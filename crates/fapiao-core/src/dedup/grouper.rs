//! Incremental grouping of records by invoice code and invoice number.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::record::InvoiceRecord;

/// Identifier of a duplicate group. Assigned from 1 upwards, never reused.
pub type GroupId = u32;

/// Two groups that turned out to be the same invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupMerge {
    /// Group that survives, the smaller id.
    pub retained: GroupId,
    /// Group whose members moved into `retained`; its id is retired.
    pub absorbed: GroupId,
}

/// What happened when a record was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GroupOutcome {
    /// Group the record now belongs to; `None` when it has neither code
    /// nor number.
    pub group_id: Option<GroupId>,
    /// The record was newly inserted into a group that now has two or more
    /// members.
    pub duplicate: bool,
    /// Merge triggered by this record, if any.
    pub merge: Option<GroupMerge>,
}

#[derive(Debug, Default)]
struct Group {
    members: BTreeSet<String>,
    codes: BTreeSet<String>,
    numbers: BTreeSet<String>,
}

/// Partition of source files into duplicate-invoice groups.
///
/// Records must be added one at a time in a fixed order (file-name order in
/// batch runs); merges depend on that order only for which id survives and
/// when the duplicate signal fires, never for the final partition.
#[derive(Debug)]
pub struct DuplicateGrouper {
    next_id: GroupId,
    groups: BTreeMap<GroupId, Group>,
    code_to_group: HashMap<String, GroupId>,
    number_to_group: HashMap<String, GroupId>,
    member_to_group: HashMap<String, GroupId>,
}

impl DuplicateGrouper {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            groups: BTreeMap::new(),
            code_to_group: HashMap::new(),
            number_to_group: HashMap::new(),
            member_to_group: HashMap::new(),
        }
    }

    /// Add one record and report its group.
    ///
    /// The duplicate flag is raised for every new insertion that leaves the
    /// group with at least two members, so a group of three raises it for
    /// its second and third files.
    pub fn add(&mut self, record: &InvoiceRecord) -> GroupOutcome {
        let code = non_empty(record.invoice_code.as_deref());
        let number = non_empty(record.invoice_number.as_deref());

        if code.is_none() && number.is_none() {
            debug!("{}: no invoice code or number, not grouped", record.source_name);
            return GroupOutcome::default();
        }

        let by_code = code.and_then(|c| self.code_to_group.get(c).copied());
        let by_number = number.and_then(|n| self.number_to_group.get(n).copied());

        let (gid, merge) = match (by_code, by_number) {
            (Some(a), Some(b)) if a != b => {
                let merge = self.merge(a, b);
                (merge.retained, Some(merge))
            }
            (Some(g), _) | (None, Some(g)) => (g, None),
            (None, None) => (self.allocate(), None),
        };

        let group = self.groups.entry(gid).or_default();
        let inserted = group.members.insert(record.source_name.clone());
        if let Some(c) = code {
            group.codes.insert(c.to_string());
        }
        if let Some(n) = number {
            group.numbers.insert(n.to_string());
        }
        let size = group.members.len();

        if let Some(c) = code {
            self.code_to_group.insert(c.to_string(), gid);
        }
        if let Some(n) = number {
            self.number_to_group.insert(n.to_string(), gid);
        }
        self.member_to_group.insert(record.source_name.clone(), gid);

        let duplicate = inserted && size >= 2;
        if duplicate {
            warn!(
                "{}: possible duplicate invoice (group {}, {} files)",
                record.source_name, gid, size
            );
        }

        GroupOutcome { group_id: Some(gid), duplicate, merge }
    }

    /// Group a source file belongs to.
    pub fn group_of(&self, source_name: &str) -> Option<GroupId> {
        self.member_to_group.get(source_name).copied()
    }

    /// Members of a live group, in name order.
    pub fn members(&self, id: GroupId) -> Option<Vec<&str>> {
        self.groups
            .get(&id)
            .map(|g| g.members.iter().map(String::as_str).collect())
    }

    /// All live groups in ascending id order.
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, Vec<&str>)> + '_ {
        self.groups
            .iter()
            .map(|(id, g)| (*id, g.members.iter().map(String::as_str).collect()))
    }

    /// Live groups with two or more members.
    pub fn duplicate_groups(&self) -> Vec<(GroupId, Vec<&str>)> {
        self.groups().filter(|(_, members)| members.len() >= 2).collect()
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn allocate(&mut self) -> GroupId {
        let id = self.next_id;
        self.next_id += 1;
        self.groups.insert(id, Group::default());
        id
    }

    /// Fold the higher id into the lower one and repoint every key and
    /// member that referenced it.
    fn merge(&mut self, a: GroupId, b: GroupId) -> GroupMerge {
        let (retained, absorbed) = if a < b { (a, b) } else { (b, a) };
        let Some(gone) = self.groups.remove(&absorbed) else {
            return GroupMerge { retained, absorbed };
        };

        for code in &gone.codes {
            self.code_to_group.insert(code.clone(), retained);
        }
        for number in &gone.numbers {
            self.number_to_group.insert(number.clone(), retained);
        }
        for member in &gone.members {
            self.member_to_group.insert(member.clone(), retained);
        }

        let target = self.groups.entry(retained).or_default();
        target.members.extend(gone.members);
        target.codes.extend(gone.codes);
        target.numbers.extend(gone.numbers);

        warn!("Merged duplicate group {} into group {}", absorbed, retained);
        GroupMerge { retained, absorbed }
    }
}

impl Default for DuplicateGrouper {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(name: &str, code: &str, number: &str) -> InvoiceRecord {
        InvoiceRecord {
            source_name: name.to_string(),
            invoice_code: (!code.is_empty()).then(|| code.to_string()),
            invoice_number: (!number.is_empty()).then(|| number.to_string()),
            ..InvoiceRecord::default()
        }
    }

    fn partition(grouper: &DuplicateGrouper) -> Vec<Vec<String>> {
        let mut parts: Vec<Vec<String>> = grouper
            .groups()
            .map(|(_, m)| m.into_iter().map(str::to_string).collect())
            .collect();
        parts.sort();
        parts
    }

    #[test]
    fn test_distinct_invoices_get_distinct_groups() {
        let mut grouper = DuplicateGrouper::new();
        let a = grouper.add(&record("a.pdf", "A", "X"));
        let b = grouper.add(&record("b.pdf", "B", "Y"));

        assert_eq!(a, GroupOutcome { group_id: Some(1), duplicate: false, merge: None });
        assert_eq!(b, GroupOutcome { group_id: Some(2), duplicate: false, merge: None });
        assert!(grouper.duplicate_groups().is_empty());
    }

    #[test]
    fn test_shared_code_is_duplicate() {
        let mut grouper = DuplicateGrouper::new();
        grouper.add(&record("a.pdf", "A", "X"));
        let outcome = grouper.add(&record("b.pdf", "A", ""));

        assert_eq!(outcome.group_id, Some(1));
        assert!(outcome.duplicate);
        assert_eq!(grouper.members(1), Some(vec!["a.pdf", "b.pdf"]));
    }

    #[test]
    fn test_duplicate_signal_fires_for_every_later_member() {
        let mut grouper = DuplicateGrouper::new();
        let first = grouper.add(&record("a.pdf", "A", "X"));
        let second = grouper.add(&record("b.pdf", "A", "X"));
        let third = grouper.add(&record("c.pdf", "", "X"));

        assert!(!first.duplicate);
        assert!(second.duplicate);
        assert!(third.duplicate);
    }

    #[test]
    fn test_re_adding_same_file_is_not_a_new_duplicate() {
        let mut grouper = DuplicateGrouper::new();
        grouper.add(&record("a.pdf", "A", "X"));
        grouper.add(&record("b.pdf", "A", "X"));
        let again = grouper.add(&record("b.pdf", "A", "X"));

        assert_eq!(again.group_id, Some(1));
        assert!(!again.duplicate);
    }

    #[test]
    fn test_bridging_record_merges_groups() {
        let mut grouper = DuplicateGrouper::new();
        grouper.add(&record("1.pdf", "A", "X"));
        grouper.add(&record("2.pdf", "B", "Y"));
        let outcome = grouper.add(&record("3.pdf", "A", "Y"));

        assert_eq!(outcome.group_id, Some(1));
        assert_eq!(outcome.merge, Some(GroupMerge { retained: 1, absorbed: 2 }));
        assert!(outcome.duplicate);
        assert_eq!(grouper.len(), 1);
        assert_eq!(grouper.group_of("2.pdf"), Some(1));
        assert_eq!(grouper.members(2), None);
    }

    #[test]
    fn test_keys_of_absorbed_group_are_repointed() {
        let mut grouper = DuplicateGrouper::new();
        grouper.add(&record("1.pdf", "A", "X"));
        grouper.add(&record("2.pdf", "B", "Y"));
        grouper.add(&record("3.pdf", "A", "Y"));

        // "B" belonged to the absorbed group 2; it must now resolve to 1.
        let outcome = grouper.add(&record("4.pdf", "B", ""));
        assert_eq!(outcome.group_id, Some(1));
        assert_eq!(grouper.len(), 1);
    }

    #[test]
    fn test_new_ids_are_not_reused_after_merge() {
        let mut grouper = DuplicateGrouper::new();
        grouper.add(&record("1.pdf", "A", "X"));
        grouper.add(&record("2.pdf", "B", "Y"));
        grouper.add(&record("3.pdf", "A", "Y"));

        let outcome = grouper.add(&record("4.pdf", "C", "Z"));
        assert_eq!(outcome.group_id, Some(3));
    }

    #[test]
    fn test_final_partition_is_order_independent() {
        let records = [
            record("1.pdf", "A", "X"),
            record("2.pdf", "A", "Y"),
            record("3.pdf", "B", "Y"),
        ];
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

        for order in orders {
            let mut grouper = DuplicateGrouper::new();
            for i in order {
                grouper.add(&records[i]);
            }
            assert_eq!(
                partition(&grouper),
                vec![vec!["1.pdf".to_string(), "2.pdf".to_string(), "3.pdf".to_string()]],
                "order {:?}",
                order
            );
        }
    }

    #[test]
    fn test_records_without_keys_are_not_grouped() {
        let mut grouper = DuplicateGrouper::new();
        let outcome = grouper.add(&InvoiceRecord::empty("blank.pdf"));

        assert_eq!(outcome, GroupOutcome::default());
        assert!(grouper.is_empty());
        assert_eq!(grouper.group_of("blank.pdf"), None);

        // Whitespace-only keys count as empty too.
        let outcome = grouper.add(&record("ws.pdf", "  ", ""));
        assert_eq!(outcome.group_id, None);
    }
}
