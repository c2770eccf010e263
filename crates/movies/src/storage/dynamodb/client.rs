//! AWS SDK client setup (Imperative Shell).

use aws_sdk_dynamodb::Client;

use crate::config::Config;

/// Creates a DynamoDB client with the given configuration.
///
/// Credentials always come from the SDK's default provider chain. Region and
/// endpoint are only overridden when the configuration sets them.
pub async fn create_client(config: &Config) -> Client {
    let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if let Some(region) = &config.region {
        sdk_config_loader = sdk_config_loader.region(aws_config::Region::new(region.clone()));
    }

    if let Some(endpoint) = &config.endpoint_url {
        sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
    }

    let sdk_config = sdk_config_loader.load().await;
    Client::new(&sdk_config)
}
