use log::error;

use crate::generator::yaml::clash_output::{ClashProxy, ClashYamlOutput};
use crate::generator::yaml::proxy_group_output::convert_proxy_groups;
use crate::models::ClientTraffic;

/// Assemble the document from the generated proxies.
///
/// Both default groups list every proxy in order; `rules` is written as given.
pub fn proxy_to_clash(proxies: Vec<ClashProxy>, rules: Vec<String>) -> ClashYamlOutput {
    let proxy_groups = convert_proxy_groups(&proxies);
    ClashYamlOutput {
        proxies,
        proxy_groups,
        rules,
    }
}

/// Serialize the document as YAML. Keys come out as `proxies`,
/// `proxy-groups`, `rules`.
pub fn proxy_to_clash_yaml(output: &ClashYamlOutput) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(output).map_err(|e| {
        error!("Failed to marshal Clash YAML: {}", e);
        e
    })
}

/// Render the `subscription-userinfo` header value.
pub fn subscription_userinfo(traffic: &ClientTraffic) -> String {
    format!(
        "upload={}; download={}; total={}; expire={}",
        traffic.up,
        traffic.down,
        traffic.total,
        traffic.expiry_secs()
    )
}
