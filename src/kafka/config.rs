use rdkafka::ClientConfig;
use std::collections::HashMap;

pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
pub const ISOLATION_LEVEL: &str = "isolation.level";
pub const AUTO_OFFSET_RESET: &str = "auto.offset.reset";

/// トランスポートにそのまま渡される生のプロパティ。
///
/// 同じキーが複数回設定された場合は最後の値が有効になる。値の検証はしない。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientProperties {
    properties: HashMap<String, String>,
}

impl ClientProperties {
    pub fn new() -> ClientProperties {
        ClientProperties {
            properties: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V) -> &mut ClientProperties
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn extend<I, K, V>(&mut self, properties: I) -> &mut ClientProperties
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in properties {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn to_client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        for (key, value) in &self.properties {
            config.set(key, value);
        }
        config
    }
}
