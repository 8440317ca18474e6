use crate::config::SimulationConfig;
use crate::groundstation::{GroundStation, MessageLog};
use crate::relay::{HttpTransport, LinkTransport, RelayNode, RelayNodeBuilder};
use crate::simulation::error::{SimulationError, SimulationResult};
use crate::topology::{Node, TopologyRegistry};
use crate::vessel::{Vessel, VesselConfig};
use futures::future::join_all;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Build the topology described by `config`.
///
/// Every satellite is registered first so each configured neighbor link
/// resolves. A link listed on both ends is written twice; `validate`
/// rejects configurations where the two entries disagree.
pub fn build_registry(config: &SimulationConfig) -> SimulationResult<TopologyRegistry> {
    let registry = TopologyRegistry::new();

    for satellite in &config.satellites {
        let addr = socket_addr(&config.bind_host, satellite.port)?;
        registry.add_node(Node::new(&satellite.id, addr).with_ground_uplink(satellite.ground_uplink));
    }

    for satellite in &config.satellites {
        for neighbor in &satellite.neighbors {
            registry.update_link(
                &satellite.id,
                &neighbor.id,
                neighbor.latency(),
                neighbor.packet_loss,
            )?;
        }
    }

    tracing::info!(
        satellites = registry.len(),
        "Topology built from configuration"
    );
    Ok(registry)
}

fn socket_addr(host: &str, port: u16) -> SimulationResult<SocketAddr> {
    let addr = format!("{host}:{port}");
    addr.parse()
        .map_err(|e: std::net::AddrParseError| SimulationError::InvalidAddress {
            reason: e.to_string(),
            addr,
        })
}

async fn bind(addr: &str) -> SimulationResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| SimulationError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Entry point for running a configured mesh
pub struct Simulation;

impl Simulation {
    /// Validate `config`, bind every listener and spawn all components.
    ///
    /// All sockets are bound before any vessel starts reporting, so a port
    /// conflict fails the whole start.
    pub async fn start(config: SimulationConfig) -> SimulationResult<RunningSimulation> {
        config.validate()?;
        let registry = Arc::new(build_registry(&config)?);
        let mut handles = Vec::new();

        let station = Arc::new(GroundStation::new(MessageLog::new(&config.database_path)));
        let ingest = bind(&config.ground_station_address).await?;
        let api = bind(&config.api_address).await?;
        handles.push(tokio::spawn(log_exit(
            "ground station",
            Arc::clone(&station).serve_ingest(ingest),
        )));
        handles.push(tokio::spawn(log_exit(
            "API server",
            Arc::clone(&station).serve_api(api),
        )));

        let transport: Arc<dyn LinkTransport> =
            Arc::new(HttpTransport::new(config.relay.send_timeout())?);

        let mut nodes = Vec::with_capacity(config.satellites.len());
        for satellite in &config.satellites {
            let node = RelayNodeBuilder::new(&satellite.id, Arc::clone(&registry))
                .ground_station(&config.ground_station_address)
                .send_timeout(config.relay.send_timeout())
                .max_outbound_sends(config.relay.max_outbound_sends)
                .transport(Arc::clone(&transport))
                .build()?;
            let node = Arc::new(node);

            let listener = bind(&format!("{}:{}", config.bind_host, satellite.port)).await?;
            handles.push(tokio::spawn(log_exit(
                "satellite",
                Arc::clone(&node).serve(listener),
            )));
            nodes.push(node);
        }

        for entry in &config.vessels {
            let vessel = Vessel::new(VesselConfig {
                vessel_id: entry.id.clone(),
                satellite: satellite_endpoint(&config, &entry.satellite),
                report_interval: config.vessel_defaults.report_interval(),
                initial_ttl: config.vessel_defaults.initial_ttl,
            });
            handles.push(tokio::spawn(vessel.run(Arc::clone(&transport))));
        }

        tracing::info!(
            satellites = nodes.len(),
            vessels = config.vessels.len(),
            ground_station = %config.ground_station_address,
            api = %config.api_address,
            "Simulation running"
        );

        Ok(RunningSimulation {
            station,
            nodes,
            handles,
        })
    }
}

fn satellite_endpoint(config: &SimulationConfig, satellite_id: &str) -> String {
    let port = config
        .satellite(satellite_id)
        .map(|s| s.port)
        .unwrap_or_default();
    format!("{}:{}", config.bind_host, port)
}

async fn log_exit<E: std::fmt::Display>(
    component: &'static str,
    task: impl std::future::Future<Output = Result<(), E>>,
) {
    if let Err(e) = task.await {
        tracing::error!(component, error = %e, "Server stopped");
    }
}

/// Handles to a started mesh
pub struct RunningSimulation {
    station: Arc<GroundStation>,
    nodes: Vec<Arc<RelayNode>>,
    handles: Vec<JoinHandle<()>>,
}

impl RunningSimulation {
    pub fn ground_station(&self) -> &Arc<GroundStation> {
        &self.station
    }

    pub fn nodes(&self) -> &[Arc<RelayNode>] {
        &self.nodes
    }

    /// Stop every server and vessel and wait for their tasks to finish
    pub async fn shutdown(self) {
        for handle in &self.handles {
            handle.abort();
        }
        join_all(self.handles).await;
        tracing::info!("Simulation stopped");
    }
}
