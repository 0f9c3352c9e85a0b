use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use sysinfo::Networks;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{Depth, LineLimits, Outcome, Placeholder, Source, SourceId, try_claim};
use crate::fmt::fmt_bytes_short;

/// Ports listed inline before the summary line is elided.
const MAX_INLINE_PORTS: usize = 8;

/// Local interfaces with their addresses plus listening TCP sockets.
pub struct NetworkSource {
    networks: Arc<Mutex<Networks>>,
    limits: LineLimits,
}

impl NetworkSource {
    pub fn new(limits: LineLimits) -> Self {
        Self {
            networks: Arc::new(Mutex::new(Networks::new())),
            limits,
        }
    }
}

impl Source for NetworkSource {
    fn id(&self) -> SourceId {
        SourceId::Network
    }

    fn fetch(&self, depth: Depth) -> BoxFuture<'_, Outcome> {
        let networks = Arc::clone(&self.networks);
        let limit = self.limits.for_depth(depth);
        async move {
            let interfaces = tokio::task::spawn_blocking(move || {
                let mut networks = try_claim(&*networks)?;
                networks.refresh_list();
                Some(interface_lines(&networks, depth))
            })
            .await;

            let interfaces = match interfaces {
                Ok(Some(lines)) => lines,
                Ok(None) => {
                    debug!(source = "network", "previous collection still running");
                    return Outcome::Unavailable(Placeholder::Busy { what: "network" });
                }
                Err(e) => {
                    warn!(source = "network", error = %e, "interface task failed");
                    return Outcome::Unavailable(Placeholder::Failed {
                        what: "network interfaces",
                        reason: e.to_string(),
                    });
                }
            };

            let sockets = listening_sockets().await;
            if let Err(reason) = &sockets {
                debug!(source = "network", %reason, "socket listing unavailable");
            }

            let lines = match depth {
                Depth::Summary => {
                    let ports = match &sockets {
                        Ok(sockets) => ports_line(sockets),
                        Err(reason) => sockets_unavailable(reason),
                    };
                    summary_lines(ports, interfaces, limit)
                }
                Depth::Full => {
                    let mut lines = interfaces;
                    match &sockets {
                        Ok(sockets) => {
                            lines.push(format!("listening tcp ({})", sockets.len()));
                            lines.extend(sockets.iter().map(|s| format!("  {s}")));
                        }
                        Err(reason) => lines.push(sockets_unavailable(reason)),
                    }
                    lines.truncate(limit);
                    lines
                }
            };
            Outcome::Lines(lines)
        }
        .boxed()
    }
}

fn interface_lines(networks: &Networks, depth: Depth) -> Vec<String> {
    let mut interfaces: Vec<_> = networks.list().iter().collect();
    interfaces.sort_by(|a, b| a.0.cmp(b.0));

    let mut lines = Vec::new();
    for (name, data) in interfaces {
        let addrs: Vec<String> = data
            .ip_networks()
            .iter()
            .filter(|net| depth == Depth::Full || net.addr.is_ipv4())
            .filter(|net| depth == Depth::Full || !net.addr.is_loopback())
            .map(|net| format!("{}/{}", net.addr, net.prefix))
            .collect();

        if depth == Depth::Summary {
            if addrs.is_empty() {
                continue;
            }
            lines.push(format!("{name:<8} {}", addrs.join(" ")));
        } else {
            lines.push(format!(
                "{name:<8} {} · mac {} · rx {} tx {}",
                if addrs.is_empty() { "-".to_owned() } else { addrs.join(" ") },
                data.mac_address(),
                fmt_bytes_short(data.total_received()),
                fmt_bytes_short(data.total_transmitted()),
            ));
        }
    }
    if lines.is_empty() {
        lines.push("no active interfaces".into());
    }
    lines
}

async fn listening_sockets() -> Result<Vec<String>, String> {
    let (program, args, parse): (&str, &[&str], fn(&str) -> Vec<String>) =
        if cfg!(target_os = "linux") {
            ("ss", &["-tlnH"], parse_ss_listeners)
        } else {
            ("lsof", &["-nP", "-iTCP", "-sTCP:LISTEN"], parse_lsof_listeners)
        };

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("{program}: {e}"))?;

    if !output.status.success() && output.stdout.is_empty() {
        return Err(format!("{program} exited with {}", output.status));
    }
    Ok(parse(&String::from_utf8_lossy(&output.stdout)))
}

/// Local addresses from `ss -tln` output (header line tolerated).
pub fn parse_ss_listeners(output: &str) -> Vec<String> {
    let mut out: Vec<String> = output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let state = fields.next()?;
            if state == "State" || state == "Netid" {
                return None;
            }
            fields.nth(2).map(String::from)
        })
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Local addresses from `lsof -nP -iTCP -sTCP:LISTEN` output.
pub fn parse_lsof_listeners(output: &str) -> Vec<String> {
    let mut out: Vec<String> = output
        .lines()
        .filter(|line| line.ends_with("(LISTEN)"))
        .filter_map(|line| {
            let mut fields = line.split_whitespace().rev();
            fields.next()?; // "(LISTEN)"
            fields.next().map(String::from)
        })
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Distinct port numbers of a set of `addr:port` strings, ascending.
pub fn listening_ports(sockets: &[String]) -> Vec<u16> {
    sockets
        .iter()
        .filter_map(|s| s.rsplit_once(':'))
        .filter_map(|(_, port)| port.parse().ok())
        .collect::<BTreeSet<u16>>()
        .into_iter()
        .collect()
}

/// Summary rows: the ports line first, then as many interfaces as fit.
fn summary_lines(ports: String, mut interfaces: Vec<String>, limit: usize) -> Vec<String> {
    interfaces.truncate(limit.saturating_sub(1));
    std::iter::once(ports).chain(interfaces).collect()
}

fn sockets_unavailable(reason: &str) -> String {
    format!("listening sockets unavailable ({reason})")
}

fn ports_line(sockets: &[String]) -> String {
    let ports = listening_ports(sockets);
    if ports.is_empty() {
        return "listening tcp: none".into();
    }
    let shown: Vec<String> = ports
        .iter()
        .take(MAX_INLINE_PORTS)
        .map(u16::to_string)
        .collect();
    let extra = ports.len().saturating_sub(MAX_INLINE_PORTS);
    if extra > 0 {
        format!("listening tcp: {} (+{extra})", shown.join(", "))
    } else {
        format!("listening tcp: {}", shown.join(", "))
    }
}
