//! Proxy group and routing rule scaffolding
//!
//! The default groups are built from scratch on every call. Nothing here keeps
//! state between documents, so two subscriptions never see each other's
//! proxy names.

use super::clash_output::{ClashProxy, ClashProxyGroup};

/// Names of the selector groups every document carries, in output order
pub const DEFAULT_GROUP_NAMES: [&str; 2] = ["auto", "fallback"];

/// Routing rules written when the configuration does not override them
pub const DEFAULT_RULES: [&str; 5] = [
    "DOMAIN-SUFFIX,google.com,auto",
    "DOMAIN-SUFFIX,github.com,auto",
    "DOMAIN-KEYWORD,youtube,auto",
    "DOMAIN-SUFFIX,twitch.tv,auto",
    "FINAL,auto",
];

/// Fresh, empty default groups
pub fn default_proxy_groups() -> Vec<ClashProxyGroup> {
    DEFAULT_GROUP_NAMES
        .iter()
        .map(|name| ClashProxyGroup::Select {
            name: name.to_string(),
            proxies: Vec::new(),
        })
        .collect()
}

pub fn default_rules() -> Vec<String> {
    DEFAULT_RULES.iter().map(|rule| rule.to_string()).collect()
}

/// Build the default groups, each listing every proxy name in entry order
pub fn convert_proxy_groups(proxies: &[ClashProxy]) -> Vec<ClashProxyGroup> {
    let names: Vec<String> = proxies.iter().map(|p| p.name().to_string()).collect();
    let mut groups = default_proxy_groups();
    for group in &mut groups {
        group.proxies_mut().extend(names.iter().cloned());
    }
    groups
}
