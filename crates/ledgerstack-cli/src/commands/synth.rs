use anyhow::Context;
use tracing::info;

use ledgerstack_core::{ResourceGraph, SshPolicy};
use ledgerstack_synth::relay::IP_RANGES_URL;
use ledgerstack_synth::{synthesize, ArtifactSource, PublishedIpRanges, StaticRelayRanges};

use super::load_config;

pub async fn synth(
    config_path: Option<&str>,
    compose: &str,
    format: &str,
    out: Option<&str>,
    offline: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let compose_bytes = std::fs::read(compose)
        .with_context(|| format!("reading compose descriptor: {compose}"))?;
    let artifact = ArtifactSource::from_bytes(compose, &compose_bytes);

    let graph = if config.ssh == SshPolicy::Disabled {
        // The lookup is never consulted without an SSH rule.
        synthesize(&config, &StaticRelayRanges::new(), &artifact)?
    } else if offline {
        anyhow::bail!("--offline requires `ssh = \"disabled\"` in the config");
    } else {
        info!(url = IP_RANGES_URL, "resolving SSH relay ranges");
        let relay = PublishedIpRanges::fetch(IP_RANGES_URL).await?;
        synthesize(&config, &relay, &artifact)?
    };

    match format {
        "json" => {
            let json = graph.to_json()?;
            match out {
                Some(path) => {
                    std::fs::write(path, &json)
                        .with_context(|| format!("writing template: {path}"))?;
                    println!("✓ Template written to {path}");
                }
                None => println!("{json}"),
            }
        }
        "text" => print_summary(&graph),
        other => anyhow::bail!("unknown format: {other} (expected json or text)"),
    }
    Ok(())
}

fn print_summary(graph: &ResourceGraph) {
    println!("✓ Synthesized stack '{}' ({})", graph.stack_name, graph.region);
    println!(
        "  Nodes: {} ({}–{} × {})",
        graph.scaling_group.desired_capacity,
        graph.scaling_group.min_capacity,
        graph.scaling_group.max_capacity,
        graph.node_template.instance_type,
    );
    println!("  Open ports: {:?}", graph.firewall.open_ports());
    for output in &graph.outputs {
        println!("  {}: {}", output.name, output.value);
    }
}
