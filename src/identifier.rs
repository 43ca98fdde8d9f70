/// Package identifier extraction from catalog page addresses
use crate::error::{FavesError, Result};
use crate::settings::Settings;
use regex::Regex;
use url::Url;

/// Recognizes item pages on the catalog host
///
/// Algorithm:
/// 1. Parse the address with `url`
/// 2. Require the configured catalog host
/// 3. Match the path against the configured pattern
/// 4. Return the `name` capture, which may be scoped (`@scope/name`)
///
/// Examples:
/// - https://www.npmjs.com/package/left-pad → left-pad
/// - https://www.npmjs.com/package/@types/node → @types/node
/// - https://www.npmjs.com/package/react/v/18.2.0 → react
/// - https://www.npmjs.com/search?q=pad → none
#[derive(Debug, Clone)]
pub struct PackageMatcher {
    host: String,
    pattern: Regex,
}

impl PackageMatcher {
    pub fn new(settings: &Settings) -> Result<PackageMatcher> {
        let pattern = Regex::new(&settings.package_path_pattern).map_err(|e| {
            FavesError::Config(format!("invalid package_path_pattern: {}", e))
        })?;

        if pattern.capture_names().flatten().all(|name| name != "name") {
            return Err(FavesError::Config(
                "package_path_pattern has no `name` group".to_string(),
            ));
        }

        Ok(PackageMatcher {
            host: settings.catalog_host.to_lowercase(),
            pattern,
        })
    }

    /// Package name for an item page address, `None` for anything else
    pub fn package_from_url(&self, address: &str) -> Option<String> {
        let parsed = Url::parse(address.trim()).ok()?;

        if parsed.host_str()?.to_lowercase() != self.host {
            return None;
        }

        let name = self
            .pattern
            .captures(parsed.path())?
            .name("name")?
            .as_str()
            .to_string();

        if name.is_empty() { None } else { Some(name) }
    }

    pub fn is_item_page(&self, address: &str) -> bool {
        self.package_from_url(address).is_some()
    }

    /// Same as `package_from_url`, as an error for callers that propagate
    pub fn require_package(&self, address: &str) -> Result<String> {
        self.package_from_url(address)
            .ok_or_else(|| FavesError::IdentifierUnresolvable(address.to_string()))
    }
}
