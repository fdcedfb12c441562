//! Link aggregation discovery through IF-MIB ifStackStatus.

use std::collections::BTreeMap;

use crate::collector::ports::IF_TYPE;
use crate::collector::walk_indexed;
use crate::error::CollectorError;
use crate::oid::Oid;
use crate::snmp::Session;

pub const IF_STACK_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 2, 1, 3];

/// propMultiplexor, how aggregates advertise themselves in ifType.
const PROP_MULTIPLEXOR: i64 = 54;

/// Finds aggregate interfaces and their members. An aggregate is an
/// interface of type propMultiplexor(54); members hang below it in
/// ifStackStatus.
pub struct StackTrunkCollector;

impl StackTrunkCollector {
    pub async fn collect(
        &self,
        session: &Session,
    ) -> Result<BTreeMap<i64, Vec<i64>>, CollectorError> {
        let mut trunks: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (index, value) in walk_indexed(session, IF_TYPE).await? {
            if value.as_i64() == Some(PROP_MULTIPLEXOR) {
                trunks.insert(index, Vec::new());
            }
        }
        if trunks.is_empty() {
            return Ok(trunks);
        }
        for (oid, _) in session.walk(&Oid::from_arcs(IF_STACK_STATUS)).await? {
            let arcs = oid.arcs();
            if arcs.len() < 2 {
                continue;
            }
            let higher = i64::from(arcs[arcs.len() - 2]);
            let lower = i64::from(arcs[arcs.len() - 1]);
            // index 0 marks the top or bottom of a stack, not a member
            if lower == 0 {
                continue;
            }
            if let Some(members) = trunks.get_mut(&higher) {
                members.push(lower);
            }
        }
        trunks.retain(|_, members| !members.is_empty());
        Ok(trunks)
    }
}
