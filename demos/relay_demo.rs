use satmesh::groundstation::{GroundStation, MessageLog};
use satmesh::message::{Message, PositionReport};
use satmesh::relay::{LinkTransport, RelayEvent, RelayNodeBuilder};
use satmesh::topology::{Node, TopologyRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("\n🛰  satmesh - Relay Mesh Demo");
    println!("==============================\n");

    // Ground station with a throwaway log
    let dir = tempfile::TempDir::new()?;
    let station = Arc::new(GroundStation::new(MessageLog::new(
        dir.path().join("database.json"),
    )));
    let station_listener = TcpListener::bind("127.0.0.1:0").await?;
    let station_addr = station_listener.local_addr()?;
    tokio::spawn(Arc::clone(&station).serve_ingest(station_listener));
    println!("📡 Ground station listening on {}", station_addr);

    // Chain A - B - C, only C has an uplink
    println!("\n🔗 Demo 1: Building topology");
    println!("-----------------------------");
    let registry = Arc::new(TopologyRegistry::new());
    let mut listeners = Vec::new();
    for (id, uplink) in [("sat-a", false), ("sat-b", false), ("sat-c", true)] {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        registry.add_node(Node::new(id, listener.local_addr()?).with_ground_uplink(uplink));
        listeners.push((id, listener));
    }
    registry.update_link("sat-a", "sat-b", Duration::from_millis(40), 0.1)?;
    registry.update_link("sat-b", "sat-c", Duration::from_millis(20), 0.0)?;

    for id in registry.node_ids() {
        if let Some(node) = registry.get(&id) {
            println!("   {} @ {} (uplink: {})", node.id, node.addr, node.ground_uplink);
            for (neighbor, link) in &node.links {
                println!("      -> {}: {}", neighbor, link);
            }
        }
    }

    let (tx, mut events) = mpsc::channel(1024);
    let mut entry = None;
    for (id, listener) in listeners {
        let node = Arc::new(
            RelayNodeBuilder::new(id, Arc::clone(&registry))
                .ground_station(station_addr.to_string())
                .events(tx.clone())
                .build()?,
        );
        if id == "sat-a" {
            entry = Some(listener.local_addr()?);
        }
        tokio::spawn(node.serve(listener));
    }
    drop(tx);
    let entry = entry.ok_or_else(|| anyhow::anyhow!("entry node missing"))?;

    // Inject reports at sat-a
    println!("\n📨 Demo 2: Sending 10 reports into sat-a (hop budget 5)");
    println!("---------------------------------------------------------");
    let transport = satmesh::relay::HttpTransport::new(Duration::from_secs(2))?;
    for id in 1..=10 {
        let report = PositionReport::new("vessel-demo", 48.85 + id as f64 * 0.01, 2.35);
        transport
            .send(&entry.to_string(), &Message::to_ground_station(id, report, 1, 5))
            .await?;
    }

    tokio::time::sleep(Duration::from_secs(1)).await;

    println!("\n📊 Demo 3: Relay events");
    println!("------------------------");
    let (mut forwarded, mut lost, mut expired, mut landed) = (0, 0, 0, 0);
    while let Ok(event) = events.try_recv() {
        match event {
            RelayEvent::Forwarded { .. } => forwarded += 1,
            RelayEvent::Lost { .. } => lost += 1,
            RelayEvent::Expired { .. } => expired += 1,
            RelayEvent::GroundStationDelivered { .. } => landed += 1,
            _ => {}
        }
    }
    println!("   Forwarded hops:          {}", forwarded);
    println!("   Lost on a link:          {}", lost);
    println!("   Expired (budget spent):  {}", expired);
    println!("   Handed to ground:        {}", landed);

    println!("\n💾 Demo 4: Ground station log");
    println!("------------------------------");
    let stored = station.log().load_all().await?;
    println!("   {} messages stored", stored.len());
    for message in stored.iter().take(5) {
        println!(
            "   #{} from {} ttl={} ({:.2}, {:.2})",
            message.id,
            message.source,
            message.ttl,
            message.content.latitude,
            message.content.longitude
        );
    }

    println!("\n✅ Demo complete\n");
    Ok(())
}
