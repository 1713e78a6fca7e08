//! Per-Machine Partitioning

use chrono::NaiveDateTime;
use sensor_ingest::MachineId;
use std::collections::BTreeMap;

/// Row indices of one machine, ordered by timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub machine_id: MachineId,
    pub rows: Vec<usize>,
}

/// Group items by machine and sort each group by timestamp.
///
/// Partitions come back in machine-id order. The per-partition sort is
/// stable, so rows sharing a timestamp keep their input order.
pub fn partition_by_machine<T, F>(items: &[T], key: F) -> Vec<Partition>
where
    F: Fn(&T) -> (&MachineId, NaiveDateTime),
{
    let mut groups: BTreeMap<&MachineId, Vec<usize>> = BTreeMap::new();
    for (idx, item) in items.iter().enumerate() {
        groups.entry(key(item).0).or_default().push(idx);
    }

    groups
        .into_iter()
        .map(|(machine_id, mut rows)| {
            rows.sort_by_key(|&idx| key(&items[idx]).1);
            Partition {
                machine_id: machine_id.clone(),
                rows,
            }
        })
        .collect()
}
