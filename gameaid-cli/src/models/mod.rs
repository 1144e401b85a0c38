pub mod storage;

use std::str::FromStr;

/// A `provider=true|false` pair as given to the `link` command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedAccount {
    pub provider: String,
    pub linked: bool,
}

impl FromStr for LinkedAccount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, linked) = s
            .split_once('=')
            .map(|(provider, linked)| (provider.trim(), linked.trim()))
            .unwrap_or((s.trim(), "true"));

        if provider.is_empty() {
            return Err(format!("Missing provider name in '{}'", s));
        }
        let linked = match linked.to_lowercase().as_str() {
            "true" | "yes" | "on" => true,
            "false" | "no" | "off" => false,
            other => {
                return Err(format!(
                    "Expected true or false for {}, got '{}'",
                    provider, other
                ))
            }
        };

        Ok(LinkedAccount {
            provider: provider.to_lowercase(),
            linked,
        })
    }
}
