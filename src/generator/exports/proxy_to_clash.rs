use std::collections::{HashMap, HashSet};

use crate::generator::yaml::clash_output::{
    ClashProxy, CommonProxyOptions, ProtocolOptions, TransportOptions,
};
use crate::models::{Client, Inbound, Protocol};
use crate::parser::{InboundSettings, Network, Security, StreamSettings};
use crate::utils::RandomSource;

/// Settings that apply to every entry of one export
pub struct ExportSettings<'a> {
    /// A fragment profile is configured; TLS entries then skip certificate
    /// verification
    pub fragment_enabled: bool,
    /// Length of generated Reality short-ids
    pub short_id_length: usize,
    pub random: &'a dyn RandomSource,
}

/// Map a protocol and client to the protocol-specific entry fields.
///
/// `settings` is the inbound's decoded settings blob; only Shadowsocks reads
/// it, for the cipher method.
pub fn protocol_options(
    protocol: &Protocol,
    client: &Client,
    settings: &InboundSettings,
) -> Option<ProtocolOptions> {
    match protocol {
        Protocol::VMess => Some(ProtocolOptions::VMess {
            uuid: client.id.clone(),
            alter_id: 0,
            cipher: client.security.clone(),
        }),
        Protocol::Vless => Some(ProtocolOptions::Vless {
            uuid: client.id.clone(),
            encryption: "none".to_string(),
        }),
        Protocol::Trojan => Some(ProtocolOptions::Trojan {
            password: client.password.clone(),
        }),
        Protocol::Shadowsocks => Some(ProtocolOptions::Shadowsocks {
            password: client.password.clone(),
            cipher: settings.method.clone(),
        }),
        Protocol::Unknown(_) => None,
    }
}

/// Map a decoded transport descriptor to the transport/security entry fields.
pub fn transport_options(stream: &StreamSettings, ext: &ExportSettings) -> TransportOptions {
    let mut options = TransportOptions::default();

    if let Some(network) = &stream.network {
        options.network = Some(network.name().to_string());
        match network {
            Network::Ws { path, headers } => {
                options.ws_path = path.clone();
                options.ws_headers = headers.clone();
            }
            Network::Http { headers } => {
                options.http_headers = headers.clone();
            }
            Network::Other(_) => {}
        }
    }

    match &stream.security {
        Some(Security::Tls) => {
            options.tls = Some(true);
            if ext.fragment_enabled {
                options.skip_cert_verify = Some(true);
            }
        }
        Some(Security::Reality(reality)) => {
            options.tls = Some(true);
            options.public_key = reality.public_key.clone();
            options.fingerprint = reality.fingerprint.clone();
            options.short_id = Some(
                reality
                    .short_id
                    .clone()
                    .unwrap_or_else(|| ext.random.seq(ext.short_id_length)),
            );
        }
        None => {}
    }

    options
}

/// Build the proxy entries for one client of one inbound, one per endpoint.
///
/// Endpoints come from the descriptor's explicit list, or default to
/// `(host, inbound.port)` when it lists none.
pub fn inbound_to_clash(
    inbound: &Inbound,
    stream: &StreamSettings,
    settings: &InboundSettings,
    client: &Client,
    host: &str,
    ext: &ExportSettings,
) -> Vec<ClashProxy> {
    let protocol = protocol_options(&inbound.protocol, client, settings);

    stream
        .endpoints(host, inbound.port)
        .into_iter()
        .map(|endpoint| {
            let name = format!("{}-{}", client.email, endpoint.dest);
            let mut proxy =
                ClashProxy::new(CommonProxyOptions::new(name, endpoint.dest, endpoint.port));
            proxy.protocol = protocol.clone();
            // Per entry, so each Reality entry without a short-id gets its own
            proxy.transport = transport_options(stream, ext);
            proxy
        })
        .collect()
}

/// Make proxy names unique within a document.
///
/// The first occurrence of a name is kept; later ones get `-2`, `-3`, ...
/// appended, skipping any suffixed name that is already taken.
pub fn dedupe_proxy_names(proxies: &mut [ClashProxy]) {
    let mut taken: HashSet<String> = proxies.iter().map(|p| p.name().to_string()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();

    for proxy in proxies.iter_mut() {
        let name = proxy.common.name.clone();
        if seen.insert(name.clone()) {
            continue;
        }
        let counter = counters.entry(name.clone()).or_insert(1);
        let renamed = loop {
            *counter += 1;
            let candidate = format!("{}-{}", name, counter);
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(renamed.clone());
        seen.insert(renamed.clone());
        proxy.common.name = renamed;
    }
}
