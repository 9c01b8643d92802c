use std::cell::Cell;
use std::collections::HashMap;

use serde_json::json;
use serde_yaml::Value;

use clashsub::interfaces::FallbackMaster;
use clashsub::utils::RandomSource;
use clashsub::{
    Client, ClientTraffic, Inbound, Protocol, Settings, SourceError, SubClashService,
    SubscriptionError, SubscriptionSource,
};

/// In-memory source: inbounds with their clients, keyed by inbound id
#[derive(Default)]
struct MemorySource {
    inbounds: Vec<Inbound>,
    clients: HashMap<u32, Vec<Client>>,
    broken_clients: Vec<u32>,
    masters: HashMap<String, FallbackMaster>,
    fail_inbounds: bool,
}

impl MemorySource {
    fn with(mut self, inbound: Inbound, clients: Vec<Client>) -> Self {
        self.clients.insert(inbound.id, clients);
        self.inbounds.push(inbound);
        self
    }
}

impl SubscriptionSource for MemorySource {
    fn inbounds_by_sub_id(&self, _sub_id: &str) -> Result<Vec<Inbound>, SourceError> {
        if self.fail_inbounds {
            return Err(SourceError::Storage("database is locked".to_string()));
        }
        Ok(self.inbounds.clone())
    }

    fn clients(&self, inbound: &Inbound) -> Result<Vec<Client>, SourceError> {
        if self.broken_clients.contains(&inbound.id) {
            return Err(SourceError::Storage("bad settings".to_string()));
        }
        Ok(self.clients.get(&inbound.id).cloned().unwrap_or_default())
    }

    fn fallback_master(
        &self,
        listen: &str,
        _stream_settings: &str,
    ) -> Result<FallbackMaster, SourceError> {
        self.masters
            .get(listen)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(listen.to_string()))
    }
}

/// Produces `r0000000`, `r1000000`, ... so generated short-ids are distinct
#[derive(Default)]
struct CountingRandom {
    calls: Cell<usize>,
}

impl RandomSource for CountingRandom {
    fn seq(&self, len: usize) -> String {
        let n = self.calls.get();
        self.calls.set(n + 1);
        let mut id = format!("r{}", n);
        while id.len() < len {
            id.push('0');
        }
        id.truncate(len);
        id
    }
}

fn inbound(id: u32, protocol: Protocol, port: u16, stream: serde_json::Value) -> Inbound {
    Inbound {
        id,
        protocol,
        port,
        stream_settings: stream.to_string(),
        ..Default::default()
    }
}

fn client(email: &str, sub_id: &str) -> Client {
    Client {
        id: format!("{}-uuid", email),
        email: email.to_string(),
        password: format!("{}-password", email),
        security: "auto".to_string(),
        enable: true,
        sub_id: sub_id.to_string(),
    }
}

fn stats(email: &str, total: i64, expiry_time: i64) -> ClientTraffic {
    ClientTraffic {
        email: email.to_string(),
        up: 10,
        down: 20,
        total,
        expiry_time,
    }
}

fn service(source: MemorySource) -> SubClashService<MemorySource, CountingRandom> {
    SubClashService::with_random(Settings::default(), source, CountingRandom::default())
}

fn document(yaml: &str) -> Value {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn test_vless_reality_default_endpoint() {
    let source = MemorySource::default().with(
        inbound(1, Protocol::Vless, 443, json!({"network": "tcp", "security": "reality"})),
        vec![client("alice", "sub-a")],
    );
    let subscription = service(source)
        .get_clash_yaml("sub-a", "example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    let proxies = doc["proxies"].as_sequence().unwrap();
    assert_eq!(proxies.len(), 1);
    let proxy = &proxies[0];
    assert_eq!(proxy["name"].as_str(), Some("alice-example.com"));
    assert_eq!(proxy["type"].as_str(), Some("vless"));
    assert_eq!(proxy["server"].as_str(), Some("example.com"));
    assert_eq!(proxy["port"].as_u64(), Some(443));
    assert_eq!(proxy["uuid"].as_str(), Some("alice-uuid"));
    assert_eq!(proxy["encryption"].as_str(), Some("none"));
    assert_eq!(proxy["tls"].as_bool(), Some(true));
    assert_eq!(proxy["network"].as_str(), Some("tcp"));
    assert_eq!(proxy["shortId"].as_str(), Some("r0000000"));
    assert!(proxy.get("publicKey").is_none());
}

#[test]
fn test_shadowsocks_cipher_from_settings() {
    let mut ss = inbound(1, Protocol::Shadowsocks, 8388, json!({}));
    ss.settings = r#"{"method":"aes-256-gcm"}"#.to_string();
    let source = MemorySource::default().with(ss, vec![client("bob", "sub-b")]);
    let subscription = service(source)
        .get_clash_yaml("sub-b", "ss.example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    let proxy = &doc["proxies"][0];
    assert_eq!(proxy["type"].as_str(), Some("ss"));
    assert_eq!(proxy["cipher"].as_str(), Some("aes-256-gcm"));
    assert_eq!(proxy["password"].as_str(), Some("bob-password"));
}

#[test]
fn test_traffic_unlimited_and_expiry_disagreement() {
    let mut vmess = inbound(1, Protocol::VMess, 10086, json!({}));
    vmess.client_stats = vec![stats("alice", 0, 1000), stats("bob", 500, 2000)];
    let source = MemorySource::default().with(
        vmess,
        vec![client("alice", "family"), client("bob", "family")],
    );
    let subscription = service(source)
        .get_clash_yaml("family", "example.com")
        .unwrap()
        .unwrap();

    assert_eq!(subscription.traffic.up, 20);
    assert_eq!(subscription.traffic.down, 40);
    assert_eq!(subscription.traffic.total, 0);
    assert_eq!(subscription.traffic.expiry_time, 0);
    assert_eq!(
        subscription.header,
        "upload=20; download=40; total=0; expire=0"
    );
}

#[test]
fn test_header_keeps_shared_expiry_in_seconds() {
    let mut trojan = inbound(1, Protocol::Trojan, 443, json!({"security": "tls"}));
    trojan.client_stats = vec![
        stats("alice", 100, 1_700_000_000_999),
        stats("bob", 200, 1_700_000_000_999),
    ];
    let source = MemorySource::default().with(
        trojan,
        vec![client("alice", "family"), client("bob", "family")],
    );
    let subscription = service(source)
        .get_clash_yaml("family", "example.com")
        .unwrap()
        .unwrap();
    assert_eq!(
        subscription.header,
        "upload=20; download=40; total=300; expire=1700000000"
    );
}

#[test]
fn test_invalid_stream_settings_degrade_to_base_fields() {
    let mut trojan = inbound(1, Protocol::Trojan, 443, json!({}));
    trojan.stream_settings = "{\"network\": ".to_string();
    let source = MemorySource::default().with(trojan, vec![client("alice", "sub-a")]);
    let subscription = service(source)
        .get_clash_yaml("sub-a", "example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    let proxy = doc["proxies"][0].as_mapping().unwrap();
    let keys: Vec<&str> = proxy.keys().filter_map(|k| k.as_str()).collect();
    assert_eq!(keys, ["name", "server", "port", "type", "password"]);
}

#[test]
fn test_inbound_lookup_failure_propagates() {
    let source = MemorySource {
        fail_inbounds: true,
        ..Default::default()
    };
    let err = service(source)
        .get_clash_yaml("sub-a", "example.com")
        .unwrap_err();
    match err {
        SubscriptionError::Source(SourceError::Storage(message)) => {
            assert_eq!(message, "database is locked")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_no_matching_clients_is_empty_not_error() {
    let mut disabled = client("carol", "sub-a");
    disabled.enable = false;
    let source = MemorySource::default()
        .with(
            inbound(1, Protocol::Vless, 443, json!({})),
            vec![disabled, client("dave", "sub-other")],
        )
        .with(inbound(2, Protocol::Trojan, 8443, json!({})), vec![]);
    assert_eq!(
        service(source).get_clash_yaml("sub-a", "example.com").unwrap(),
        None
    );

    assert_eq!(
        service(MemorySource::default())
            .get_clash_yaml("sub-a", "example.com")
            .unwrap(),
        None
    );
}

#[test]
fn test_client_lookup_failure_skips_inbound() {
    let mut source = MemorySource::default()
        .with(
            inbound(1, Protocol::Vless, 443, json!({})),
            vec![client("alice", "sub-a")],
        )
        .with(
            inbound(2, Protocol::Trojan, 8443, json!({})),
            vec![client("alice", "sub-a")],
        );
    source.broken_clients.push(1);
    let subscription = service(source)
        .get_clash_yaml("sub-a", "example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    let proxies = doc["proxies"].as_sequence().unwrap();
    assert_eq!(proxies.len(), 1);
    assert_eq!(proxies[0]["type"].as_str(), Some("trojan"));
    assert_eq!(proxies[0]["port"].as_u64(), Some(8443));
}

#[test]
fn test_external_proxies_fan_out_per_client() {
    let stream = json!({
        "network": "ws",
        "ws-path": "/ray",
        "security": "tls",
        "externalProxy": [
            {"dest": "cdn1.example.com", "port": 443},
            {"dest": "cdn2.example.com", "port": 2053},
            {"dest": "broken.example.com"}
        ]
    });
    let source = MemorySource::default().with(
        inbound(1, Protocol::VMess, 10086, stream),
        vec![client("alice", "family"), client("bob", "family")],
    );
    let subscription = service(source)
        .get_clash_yaml("family", "ignored.example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    let names: Vec<&str> = doc["proxies"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "alice-cdn1.example.com",
            "alice-cdn2.example.com",
            "bob-cdn1.example.com",
            "bob-cdn2.example.com",
        ]
    );
    let proxy = &doc["proxies"][1];
    assert_eq!(proxy["port"].as_u64(), Some(2053));
    assert_eq!(proxy["ws-path"].as_str(), Some("/ray"));
    assert_eq!(proxy["alterId"].as_u64(), Some(0));
    assert_eq!(proxy["cipher"].as_str(), Some("auto"));
    assert!(proxy.get("skip-cert-verify").is_none());
}

#[test]
fn test_groups_and_rules() {
    let source = MemorySource::default()
        .with(
            inbound(1, Protocol::Vless, 443, json!({})),
            vec![client("alice", "sub-a")],
        )
        .with(
            inbound(2, Protocol::Trojan, 8443, json!({})),
            vec![client("alice2", "sub-a")],
        );
    let subscription = service(source)
        .get_clash_yaml("sub-a", "example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    let names: Vec<&str> = doc["proxies"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    let groups = doc["proxy-groups"].as_sequence().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["name"].as_str(), Some("auto"));
    assert_eq!(groups[1]["name"].as_str(), Some("fallback"));
    for group in groups {
        assert_eq!(group["type"].as_str(), Some("select"));
        let members: Vec<&str> = group["proxies"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|p| p.as_str().unwrap())
            .collect();
        assert_eq!(members, names);
    }

    let rules: Vec<&str> = doc["rules"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    assert_eq!(
        rules,
        [
            "DOMAIN-SUFFIX,google.com,auto",
            "DOMAIN-SUFFIX,github.com,auto",
            "DOMAIN-KEYWORD,youtube,auto",
            "DOMAIN-SUFFIX,twitch.tv,auto",
            "FINAL,auto",
        ]
    );
}

#[test]
fn test_repeated_calls_do_not_accumulate_group_members() {
    let source = MemorySource::default().with(
        inbound(1, Protocol::Trojan, 443, json!({})),
        vec![client("alice", "sub-a")],
    );
    let service = service(source);

    let first = service.get_clash_yaml("sub-a", "example.com").unwrap().unwrap();
    let second = service.get_clash_yaml("sub-a", "example.com").unwrap().unwrap();
    for subscription in [&first, &second] {
        let doc = document(&subscription.yaml);
        assert_eq!(doc["proxy-groups"][0]["proxies"].as_sequence().unwrap().len(), 1);
        assert_eq!(doc["proxy-groups"][1]["proxies"].as_sequence().unwrap().len(), 1);
    }
    assert_eq!(first.yaml, second.yaml);
}

#[test]
fn test_reality_short_id_given_or_generated() {
    let given = json!({"security": "reality", "shortId": "6ba85179", "publicKey": "pk", "fingerprint": "chrome"});
    let missing = json!({"security": "reality"});
    let source = MemorySource::default()
        .with(
            inbound(1, Protocol::Vless, 443, given),
            vec![client("alice", "sub-a")],
        )
        .with(
            inbound(2, Protocol::Vless, 8443, missing.clone()),
            vec![client("bob", "sub-a")],
        )
        .with(
            inbound(3, Protocol::Vless, 9443, missing),
            vec![client("carol", "sub-a")],
        );
    let subscription = service(source)
        .get_clash_yaml("sub-a", "example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    assert_eq!(doc["proxies"][0]["shortId"].as_str(), Some("6ba85179"));
    assert_eq!(doc["proxies"][0]["publicKey"].as_str(), Some("pk"));
    assert_eq!(doc["proxies"][0]["fingerprint"].as_str(), Some("chrome"));

    let generated_b = doc["proxies"][1]["shortId"].as_str().unwrap();
    let generated_c = doc["proxies"][2]["shortId"].as_str().unwrap();
    assert_eq!(generated_b.len(), 8);
    assert_eq!(generated_c.len(), 8);
    assert_ne!(generated_b, generated_c);
}

#[test]
fn test_fragment_enables_skip_cert_verify() {
    let source = MemorySource::default().with(
        inbound(1, Protocol::Trojan, 443, json!({"security": "tls"})),
        vec![client("alice", "sub-a")],
    );
    let settings = Settings {
        fragment: "tlshello,100-200,10-20".to_string(),
        ..Default::default()
    };
    let service = SubClashService::with_random(settings, source, CountingRandom::default());
    let subscription = service.get_clash_yaml("sub-a", "example.com").unwrap().unwrap();

    let doc = document(&subscription.yaml);
    assert_eq!(doc["proxies"][0]["tls"].as_bool(), Some(true));
    assert_eq!(doc["proxies"][0]["skip-cert-verify"].as_bool(), Some(true));
}

#[test]
fn test_fallback_inbound_uses_master_address() {
    let mut child = inbound(1, Protocol::Vless, 0, json!({"network": "ws"}));
    child.listen = "@vless-ws".to_string();
    let mut unresolved = inbound(2, Protocol::Trojan, 0, json!({}));
    unresolved.listen = "@missing".to_string();

    let mut source = MemorySource::default()
        .with(child, vec![client("alice", "sub-a")])
        .with(unresolved, vec![client("bob", "sub-a")]);
    source.masters.insert(
        "@vless-ws".to_string(),
        FallbackMaster {
            listen: "0.0.0.0".to_string(),
            port: 443,
            stream_settings: json!({"network": "ws", "security": "tls"}).to_string(),
        },
    );
    let subscription = service(source)
        .get_clash_yaml("sub-a", "example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    assert_eq!(doc["proxies"][0]["port"].as_u64(), Some(443));
    assert_eq!(doc["proxies"][0]["tls"].as_bool(), Some(true));
    // Unresolved fallbacks keep their own port
    assert_eq!(doc["proxies"][1]["port"].as_u64(), Some(0));
}

#[test]
fn test_duplicate_endpoint_names_get_suffix() {
    let stream = json!({
        "externalProxy": [
            {"dest": "cdn.example.com", "port": 443},
            {"dest": "cdn.example.com", "port": 8443}
        ]
    });
    let source = MemorySource::default().with(
        inbound(1, Protocol::Trojan, 443, stream),
        vec![client("alice", "sub-a")],
    );
    let subscription = service(source)
        .get_clash_yaml("sub-a", "example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    assert_eq!(doc["proxies"][0]["name"].as_str(), Some("alice-cdn.example.com"));
    assert_eq!(doc["proxies"][1]["name"].as_str(), Some("alice-cdn.example.com-2"));
    assert_eq!(
        doc["proxy-groups"][0]["proxies"][1].as_str(),
        Some("alice-cdn.example.com-2")
    );
}

#[test]
fn test_unknown_protocol_emits_base_fields() {
    let source = MemorySource::default().with(
        inbound(1, Protocol::Unknown("socks".to_string()), 1080, json!({})),
        vec![client("alice", "sub-a")],
    );
    let subscription = service(source)
        .get_clash_yaml("sub-a", "example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    let proxy = doc["proxies"][0].as_mapping().unwrap();
    assert_eq!(proxy.len(), 3);
    assert!(proxy.get("type").is_none());
}

#[test]
fn test_all_malformed_external_proxies_generate_nothing() {
    let stream = json!({"externalProxy": ["bad", {"dest": 5, "port": 1}]});
    let source = MemorySource::default().with(
        inbound(1, Protocol::Trojan, 443, stream),
        vec![client("alice", "sub-a")],
    );
    assert_eq!(
        service(source)
            .get_clash_yaml("sub-a", "panel.example.com")
            .unwrap(),
        None
    );
}

#[test]
fn test_malformed_external_proxies_never_fall_back_to_host() {
    let source = MemorySource::default()
        .with(
            inbound(1, Protocol::Trojan, 443, json!({"externalProxy": [{"dest": "no-port"}]})),
            vec![client("alice", "sub-a")],
        )
        .with(
            inbound(2, Protocol::Vless, 8443, json!({})),
            vec![client("bob", "sub-a")],
        );
    let subscription = service(source)
        .get_clash_yaml("sub-a", "panel.example.com")
        .unwrap()
        .unwrap();

    let doc = document(&subscription.yaml);
    let proxies = doc["proxies"].as_sequence().unwrap();
    assert_eq!(proxies.len(), 1);
    assert_eq!(proxies[0]["name"].as_str(), Some("bob-panel.example.com"));
}
