//! Exploration runs: fan the target list out to parallel per-host polls,
//! then sweep expired equipment and archive closed rows.

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::collector::Registry;
use crate::config::Config;
use crate::error::CollectorError;
use crate::model::Equipment;
use crate::persist::Writer;
use crate::snmp::{self, Session, Transport, UdpTransport, Value, Version};

/// Opens the transport to one host. A seam so tests can hand sessions to
/// scripted agents instead of the network.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn connect(&self, addr: Ipv4Addr) -> Result<Arc<dyn Transport>, CollectorError>;
}

/// The UDP factory used outside tests.
pub struct UdpFactory {
    timeout: Duration,
    tries: u32,
}

impl UdpFactory {
    pub fn new(timeout: Duration, tries: u32) -> Self {
        UdpFactory { timeout, tries }
    }
}

#[async_trait]
impl SessionFactory for UdpFactory {
    async fn connect(&self, addr: Ipv4Addr) -> Result<Arc<dyn Transport>, CollectorError> {
        let transport = UdpTransport::connect(addr, self.timeout, self.tries).await?;
        Ok(Arc::new(transport))
    }
}

/// Drives exploration runs. One run at a time; single-host refreshes are
/// allowed to overlap with a run.
pub struct Explorer {
    config: Config,
    registry: Registry,
    writer: Writer,
    factory: Arc<dyn SessionFactory>,
    exploring: AtomicBool,
}

impl Explorer {
    pub fn new(
        config: Config,
        registry: Registry,
        writer: Writer,
        factory: Arc<dyn SessionFactory>,
    ) -> Self {
        Explorer {
            config,
            registry,
            writer,
            factory,
            exploring: AtomicBool::new(false),
        }
    }

    pub fn is_exploring(&self) -> bool {
        self.exploring.load(Ordering::SeqCst)
    }

    /// Kick off a full exploration run in the background. Returns as soon
    /// as the run is scheduled.
    pub fn start_exploration(self: &Arc<Self>) -> Result<(), CollectorError> {
        if self.exploring.swap(true, Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        let explorer = Arc::clone(self);
        tokio::spawn(explorer.run());
        Ok(())
    }

    /// Refresh a single host right away, without touching the run state
    /// and without the end-of-run sweeps.
    pub async fn start_explore_ip(
        &self,
        addr: Ipv4Addr,
        community: Option<&str>,
    ) -> Result<(), CollectorError> {
        self.explore_host(addr, community).await
    }

    async fn run(self: Arc<Self>) {
        let targets = self.config.expand_targets();
        log::info!("exploration run over {} addresses", targets.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(targets)));
        let mut lanes = JoinSet::new();
        for _ in 0..self.config.parallel.max(1) {
            let explorer = Arc::clone(&self);
            let queue = Arc::clone(&queue);
            lanes.spawn(async move {
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some((addr, community)) = next else { break };
                    if let Err(e) = explorer.explore_host(addr, community.as_deref()).await {
                        log::warn!("exploration of {} failed: {}", addr, e);
                    }
                }
            });
        }
        while lanes.join_next().await.is_some() {}

        if let Err(e) = self.writer.expire_equipment(self.config.equipment_expire).await {
            log::error!("equipment expiry sweep failed: {}", e);
        }
        if let Err(e) = self.writer.archive().await {
            log::error!("archive sweep failed: {}", e);
        }
        log::info!("exploration run complete");
        self.exploring.store(false, Ordering::SeqCst);
    }

    /// Poll one device end to end: community cascade, identification,
    /// pipeline dispatch, persistence.
    async fn explore_host(
        &self,
        addr: Ipv4Addr,
        community_hint: Option<&str>,
    ) -> Result<(), CollectorError> {
        let started = Instant::now();
        let transport = self.factory.connect(addr).await?;
        let (mut session, description) =
            self.community_cascade(addr, transport, community_hint).await?;
        let mut equipment = self.identify(addr, &session, &description).await?;
        for plugin in self.registry.matching(&equipment.oid) {
            log::info!("exploring {} with the {} pipeline", addr, plugin.name());
            plugin.collect(&mut session, &mut equipment).await?;
        }
        self.writer.write(&equipment).await?;
        log::info!(
            "explored {} ({}) in {:?}",
            addr,
            equipment.name,
            started.elapsed()
        );
        Ok(())
    }

    /// Find a working community: the per-target pin first, then every
    /// configured candidate. The probe doubles as the sysDescr read.
    async fn community_cascade(
        &self,
        addr: Ipv4Addr,
        transport: Arc<dyn Transport>,
        hint: Option<&str>,
    ) -> Result<(Session, String), CollectorError> {
        let mut candidates: Vec<&str> = Vec::new();
        if let Some(hint) = hint {
            candidates.push(hint);
        }
        for community in &self.config.communities {
            if Some(community.as_str()) != hint {
                candidates.push(community);
            }
        }

        let mut session = Session::new(transport, Version::V2c, "");
        session.set_use_bulk(self.config.bulk);
        let probe = [snmp::sys_descr()];
        for community in candidates {
            session.set_community(community);
            match session.get(&probe).await {
                Ok(rows) => {
                    log::debug!("{} answered with community {}", addr, community);
                    let description = rows
                        .into_iter()
                        .next()
                        .and_then(|(_, value)| value.as_str())
                        .unwrap_or_default();
                    return Ok((session, description));
                }
                Err(e) => {
                    log::debug!("community {} failed on {}: {}", community, addr, e);
                }
            }
        }
        Err(CollectorError::NoCommunity)
    }

    /// Read the identification scalars. A device that hides its
    /// sysObjectID cannot be dispatched.
    async fn identify(
        &self,
        addr: Ipv4Addr,
        session: &Session,
        description: &str,
    ) -> Result<Equipment, CollectorError> {
        let scalars = [snmp::sys_object_id(), snmp::sys_name(), snmp::sys_location()];
        let rows = session.get(&scalars).await?;
        let mut oid = None;
        let mut name = None;
        let mut location = None;
        for (key, value) in rows {
            if key == scalars[0] {
                if let Value::Oid(v) = value {
                    oid = Some(v);
                }
            } else if key == scalars[1] {
                name = value.as_str().filter(|s| !s.is_empty());
            } else if key == scalars[2] {
                location = value.as_str().filter(|s| !s.is_empty());
            }
        }
        let Some(oid) = oid else {
            return Err(CollectorError::UnknownEquipment(snmp::sys_object_id()));
        };
        let name = name.unwrap_or_else(|| addr.to_string());
        let mut equipment = Equipment::new(addr, &name, oid, description);
        equipment.location = location;
        Ok(equipment)
    }
}
