use log::{debug, info};

use super::{SubscriptionError, SubscriptionSource};
use crate::generator::{
    dedupe_proxy_names, inbound_to_clash, proxy_to_clash, proxy_to_clash_yaml,
    subscription_userinfo, ExportSettings,
};
use crate::models::ClientTraffic;
use crate::parser::{InboundSettings, StreamSettings};
use crate::settings::Settings;
use crate::utils::{RandomSource, ThreadRandom};

/// A generated subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClashSubscription {
    /// The Clash YAML document
    pub yaml: String,
    /// `subscription-userinfo` header value
    pub header: String,
    /// Aggregated usage the header was rendered from
    pub traffic: ClientTraffic,
}

/// Builds Clash subscriptions from a [`SubscriptionSource`].
///
/// Holds configuration only. Groups, proxies and traffic are built fresh on
/// each call, so one service can serve any number of subscribers.
pub struct SubClashService<S, R = ThreadRandom> {
    settings: Settings,
    source: S,
    random: R,
}

impl<S: SubscriptionSource> SubClashService<S> {
    pub fn new(settings: Settings, source: S) -> Self {
        Self::with_random(settings, source, ThreadRandom)
    }
}

impl<S: SubscriptionSource, R: RandomSource> SubClashService<S, R> {
    pub fn with_random(settings: Settings, source: S, random: R) -> Self {
        SubClashService {
            settings,
            source,
            random,
        }
    }

    /// Generate the Clash subscription of `sub_id`.
    ///
    /// `host` is the address clients dial when an inbound lists no explicit
    /// endpoints. Returns `Ok(None)` when the subscriber has no enabled
    /// clients; that is not an error. Only a failed inbound lookup or a
    /// serialization failure is.
    pub fn get_clash_yaml(
        &self,
        sub_id: &str,
        host: &str,
    ) -> Result<Option<ClashSubscription>, SubscriptionError> {
        let inbounds = self.source.inbounds_by_sub_id(sub_id)?;
        if inbounds.is_empty() {
            return Ok(None);
        }

        let ext = ExportSettings {
            fragment_enabled: self.settings.fragment_enabled(),
            short_id_length: self.settings.short_id_length,
            random: &self.random,
        };

        let mut client_traffics = Vec::new();
        let mut proxies = Vec::new();

        for mut inbound in inbounds {
            let clients = match self.source.clients(&inbound) {
                Ok(clients) => clients,
                Err(e) => {
                    debug!("Skipping inbound {}: failed to get clients: {}", inbound.id, e);
                    continue;
                }
            };

            if inbound.listen.starts_with(self.settings.fallback_marker) {
                match self
                    .source
                    .fallback_master(&inbound.listen, &inbound.stream_settings)
                {
                    Ok(master) => {
                        inbound.listen = master.listen;
                        inbound.port = master.port;
                        inbound.stream_settings = master.stream_settings;
                    }
                    Err(e) => debug!(
                        "Keeping listen {} of inbound {}: fallback master unresolved: {}",
                        inbound.listen, inbound.id, e
                    ),
                }
            }

            // Decoded once per inbound; undecodable blobs come back empty
            let stream = StreamSettings::parse(&inbound.stream_settings);
            let settings = InboundSettings::parse(&inbound.settings);

            for client in clients.iter().filter(|client| client.belongs_to(sub_id)) {
                client_traffics.push(
                    self.source
                        .client_traffic(&inbound.client_stats, &client.email),
                );
                proxies.extend(inbound_to_clash(
                    &inbound, &stream, &settings, client, host, &ext,
                ));
            }
        }

        if proxies.is_empty() {
            debug!("No proxies generated for subscription {}", sub_id);
            return Ok(None);
        }

        dedupe_proxy_names(&mut proxies);
        let traffic = ClientTraffic::aggregate(&client_traffics);

        let proxy_count = proxies.len();
        let output = proxy_to_clash(proxies, self.settings.rules.clone());
        let yaml = proxy_to_clash_yaml(&output)?;
        let header = subscription_userinfo(&traffic);

        info!(
            "Generated Clash subscription {} with {} proxies",
            sub_id, proxy_count
        );
        Ok(Some(ClashSubscription {
            yaml,
            header,
            traffic,
        }))
    }
}
