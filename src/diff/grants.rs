use std::collections::BTreeSet;

use super::Change;

/// Grants master holds that the slave lacks, then revocations of the slave's extras.
pub(super) fn diff_grants(
    object: &str,
    master_grants: &BTreeSet<String>,
    slave_grants: &BTreeSet<String>,
) -> Vec<Change> {
    let grants = master_grants
        .difference(slave_grants)
        .map(|role| Change::GrantAll {
            object: object.to_string(),
            role: role.clone(),
        });
    let revokes = slave_grants
        .difference(master_grants)
        .map(|role| Change::RevokeAll {
            object: object.to_string(),
            role: role.clone(),
        });
    grants.chain(revokes).collect()
}

pub(super) fn diff_owner(object: &str, master_owner: &str, slave_owner: &str) -> Option<Change> {
    (master_owner != slave_owner).then(|| Change::SetOwner {
        object: object.to_string(),
        owner: master_owner.to_string(),
    })
}
