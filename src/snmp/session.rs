//! High-level GET/WALK operations over a [`Transport`].

use std::sync::Arc;

use crate::error::CollectorError;
use crate::oid::Oid;
use crate::snmp::pdu::{error_message, PduType, SnmpMessage, Version, NO_SUCH_NAME};
use crate::snmp::transport::Transport;
use crate::snmp::value::Value;

/// Repetition count for GETBULK requests.
const BULK_REPETITIONS: i32 = 10;

fn request_id() -> i32 {
    (rand::random::<u32>() & 0x7fff_ffff) as i32
}

/// One logical conversation with an agent. Community and version can be
/// switched mid-session, which the community-indexed FDB collectors rely on.
pub struct Session {
    transport: Arc<dyn Transport>,
    version: Version,
    community: String,
    use_bulk: bool,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, version: Version, community: &str) -> Self {
        Session {
            transport,
            version,
            community: community.to_string(),
            use_bulk: true,
        }
    }

    pub fn community(&self) -> &str {
        &self.community
    }

    pub fn set_community(&mut self, community: &str) {
        self.community = community.to_string();
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn set_use_bulk(&mut self, use_bulk: bool) {
        self.use_bulk = use_bulk;
    }

    /// Fetch scalar values. Missing objects are omitted from the result,
    /// so callers check what came back rather than relying on order.
    pub async fn get(&self, oids: &[Oid]) -> Result<Vec<(Oid, Value)>, CollectorError> {
        let msg = SnmpMessage::request(
            self.version,
            &self.community,
            PduType::Get,
            request_id(),
            oids,
        );
        let reply = self.transport.exchange(&msg).await?;
        if reply.pdu.error_status != 0 {
            if self.version == Version::V1 && reply.pdu.error_status == NO_SUCH_NAME {
                return Ok(Vec::new());
            }
            return Err(CollectorError::Snmp(
                error_message(reply.pdu.error_status).to_string(),
            ));
        }
        Ok(reply
            .pdu
            .varbinds
            .into_iter()
            .filter(|(_, value)| !value.is_exception())
            .collect())
    }

    /// Fetch a whole subtree. Uses GETBULK on v2c agents unless disabled.
    pub async fn walk(&self, base: &Oid) -> Result<Vec<(Oid, Value)>, CollectorError> {
        let mut rows = Vec::new();
        let mut cursor = base.clone();
        loop {
            let id = request_id();
            let msg = if self.version == Version::V2c && self.use_bulk {
                SnmpMessage::bulk_request(
                    &self.community,
                    id,
                    BULK_REPETITIONS,
                    std::slice::from_ref(&cursor),
                )
            } else {
                SnmpMessage::request(
                    self.version,
                    &self.community,
                    PduType::GetNext,
                    id,
                    std::slice::from_ref(&cursor),
                )
            };
            let reply = self.transport.exchange(&msg).await?;
            if reply.pdu.error_status != 0 {
                // v1 agents signal end-of-mib this way
                if self.version == Version::V1 && reply.pdu.error_status == NO_SUCH_NAME {
                    return Ok(rows);
                }
                return Err(CollectorError::Snmp(
                    error_message(reply.pdu.error_status).to_string(),
                ));
            }
            if reply.pdu.varbinds.is_empty() {
                return Ok(rows);
            }
            for (oid, value) in reply.pdu.varbinds {
                if value == Value::EndOfMibView {
                    return Ok(rows);
                }
                if !oid.starts_with(base) {
                    return Ok(rows);
                }
                if oid <= cursor {
                    // agent is not advancing, bail out instead of spinning
                    return Ok(rows);
                }
                cursor = oid.clone();
                if value.is_exception() {
                    continue;
                }
                rows.push((oid, value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::pdu::Pdu;
    use crate::snmp::transport::fake::FakeAgent;
    use async_trait::async_trait;

    fn agent_with_interfaces() -> FakeAgent {
        let mut agent = FakeAgent::new("public");
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.1", "GigabitEthernet0/1");
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.2", "GigabitEthernet0/2");
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.3", "Vlan1");
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.1", 6);
        agent
    }

    #[tokio::test]
    async fn walk_stays_inside_subtree() {
        let session = Session::new(
            Arc::new(agent_with_interfaces()),
            Version::V2c,
            "public",
        );
        let base: Oid = "1.3.6.1.2.1.2.2.1.2".parse().unwrap();
        let rows = session.walk(&base).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].0, "1.3.6.1.2.1.2.2.1.2.3".parse().unwrap());
        assert_eq!(rows[2].1.as_str().as_deref(), Some("Vlan1"));
    }

    #[tokio::test]
    async fn getnext_walk_matches_bulk_walk() {
        let mut session = Session::new(
            Arc::new(agent_with_interfaces()),
            Version::V2c,
            "public",
        );
        let base: Oid = "1.3.6.1.2.1.2.2.1.2".parse().unwrap();
        let bulk = session.walk(&base).await.unwrap();
        session.set_use_bulk(false);
        let plain = session.walk(&base).await.unwrap();
        assert_eq!(bulk, plain);
    }

    #[tokio::test]
    async fn v1_walk_ends_on_no_such_name() {
        let mut agent = FakeAgent::new("private");
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.1", 6);
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.2", 53);
        let mut session = Session::new(Arc::new(agent), Version::V1, "private");
        session.set_use_bulk(false);
        // subtree sits at the end of the scripted mib
        let base: Oid = "1.3.6.1.2.1.2.2.1.3".parse().unwrap();
        let rows = session.walk(&base).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn v1_get_on_missing_object_is_empty() {
        let agent = agent_with_interfaces();
        let session = Session::new(Arc::new(agent), Version::V1, "public");
        let oid: Oid = "1.3.6.1.2.1.1.6.0".parse().unwrap();
        let rows = session.get(&[oid]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn v2c_get_filters_exceptions() {
        let session = Session::new(
            Arc::new(agent_with_interfaces()),
            Version::V2c,
            "public",
        );
        let present: Oid = "1.3.6.1.2.1.2.2.1.2.1".parse().unwrap();
        let missing: Oid = "1.3.6.1.2.1.1.6.0".parse().unwrap();
        let rows = session.get(&[present.clone(), missing]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, present);
    }

    /// Broken agent that answers every GETNEXT with the same varbind.
    struct StuckAgent;

    #[async_trait]
    impl crate::snmp::transport::Transport for StuckAgent {
        async fn exchange(&self, msg: &SnmpMessage) -> Result<SnmpMessage, CollectorError> {
            Ok(SnmpMessage {
                version: msg.version,
                community: msg.community.clone(),
                pdu_type: PduType::Response,
                pdu: Pdu {
                    request_id: msg.pdu.request_id,
                    error_status: 0,
                    error_index: 0,
                    varbinds: vec![(
                        "1.3.6.1.2.1.2.2.1.2.1".parse().unwrap(),
                        Value::Integer(1),
                    )],
                },
            })
        }
    }

    #[tokio::test]
    async fn walk_refuses_to_spin_on_stuck_agent() {
        let mut session = Session::new(Arc::new(StuckAgent), Version::V2c, "public");
        session.set_use_bulk(false);
        let base: Oid = "1.3.6.1.2.1.2.2.1.2".parse().unwrap();
        let rows = session.walk(&base).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn wrong_community_is_a_timeout() {
        let agent = agent_with_interfaces();
        let session = Session::new(Arc::new(agent), Version::V2c, "letmein");
        let oid: Oid = "1.3.6.1.2.1.2.2.1.2.1".parse().unwrap();
        match session.get(&[oid]).await {
            Err(CollectorError::Timeout { .. }) => {}
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
