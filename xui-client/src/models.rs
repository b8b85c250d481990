//! Wire types for the panel API

use crate::error::XuiError;
use crate::nested;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `{success, msg, obj}` wrapper every non-login endpoint answers with
///
/// The transport first decodes `obj` as a raw [`Value`] so that a failed
/// call is reported from `msg` even when `obj` has an unexpected shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    /// Whether the panel accepted the request
    pub success: bool,
    /// Human readable status, authoritative when `success` is false
    #[serde(default)]
    pub msg: String,
    /// Payload; not meaningful when `success` is false
    #[serde(default)]
    pub obj: Option<T>,
}

impl Envelope<Value> {
    /// Turn a failed envelope into [`XuiError::Api`], discarding the payload
    pub(crate) fn check(self, endpoint: &str) -> Result<Option<Value>, XuiError> {
        if !self.success {
            return Err(XuiError::Api {
                endpoint: endpoint.to_string(),
                message: self.msg,
            });
        }
        Ok(self.obj)
    }

    /// Check success and decode the payload into `T`
    ///
    /// A missing or `null` payload is handed to `T` as `null`, so `Option`
    /// targets accept it and everything else reports a decode error.
    pub(crate) fn into_payload<T: DeserializeOwned>(self, endpoint: &str) -> Result<T, XuiError> {
        let obj = self.check(endpoint)?.unwrap_or(Value::Null);
        serde_json::from_value(obj).map_err(|source| XuiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// A configured listening endpoint on the proxy server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Inbound {
    pub id: i64,
    pub up: i64,
    pub down: i64,
    pub total: i64,
    pub remark: String,
    pub enable: bool,
    pub expiry_time: i64,
    pub client_stats: Option<Vec<ClientTraffic>>,
    pub listen: String,
    pub port: u16,
    pub protocol: String,
    #[serde(deserialize_with = "nested::optional")]
    pub settings: Option<Settings>,
    #[serde(deserialize_with = "nested::optional")]
    pub stream_settings: Option<StreamSettings>,
    pub tag: String,
    #[serde(deserialize_with = "nested::optional")]
    pub sniffing: Option<Sniffing>,
    #[serde(deserialize_with = "nested::optional")]
    pub allocate: Option<Allocate>,
}

impl Inbound {
    /// Clients configured on this inbound, empty if it has no settings
    pub fn clients(&self) -> &[InboundClient] {
        self.settings
            .as_ref()
            .map(|settings| settings.clients.as_slice())
            .unwrap_or_default()
    }
}

/// Protocol settings of an inbound
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub clients: Vec<InboundClient>,
    pub decryption: String,
    pub fallbacks: Vec<Value>,
}

/// A user entry attached to an inbound
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InboundClient {
    pub comment: String,
    pub email: String,
    pub enable: bool,
    pub expiry_time: i64,
    pub flow: String,
    /// Client UUID (vmess/vless)
    pub id: String,
    /// Trojan and shadowsocks clients authenticate with a password instead of a UUID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub limit_ip: i64,
    pub reset: i64,
    pub sub_id: String,
    /// Telegram id, sent by different panel versions as a number or a string
    pub tg_id: Value,
    #[serde(rename = "totalGB")]
    pub total_gb: i64,
}

/// Per-client traffic counters reported alongside an inbound
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientTraffic {
    pub id: i64,
    pub inbound_id: i64,
    pub enable: bool,
    pub email: String,
    pub up: i64,
    pub down: i64,
    pub expiry_time: i64,
    pub total: i64,
    pub reset: i64,
}

/// Transport settings of an inbound
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamSettings {
    pub network: String,
    pub security: String,
    pub external_proxy: Vec<Value>,
    pub reality_settings: RealitySettings,
    pub tcp_settings: TcpSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RealitySettings {
    pub show: bool,
    pub xver: i64,
    pub dest: String,
    pub server_names: Vec<String>,
    pub private_key: String,
    pub min_client: String,
    pub max_client: String,
    pub max_timediff: i64,
    pub short_ids: Vec<String>,
    pub settings: RealityClientSettings,
}

/// Client-facing half of the reality configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RealityClientSettings {
    pub public_key: String,
    pub fingerprint: String,
    pub server_name: String,
    pub spider_x: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpSettings {
    pub accept_proxy_protocol: bool,
    pub header: TcpHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpHeader {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sniffing {
    pub enabled: bool,
    pub dest_override: Vec<String>,
    pub metadata_only: bool,
    pub route_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allocate {
    pub strategy: String,
    pub refresh: i64,
    pub concurrency: i64,
}

/// Snapshot returned by `/server/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerStatus {
    /// CPU usage in percent
    pub cpu: f64,
    pub cpu_cores: u32,
    pub logical_pro: u32,
    pub cpu_speed_mhz: f64,
    pub mem: Usage,
    pub swap: Usage,
    pub disk: Usage,
    pub xray: XrayStatus,
    /// Host uptime in seconds
    pub uptime: u64,
    pub loads: Vec<f64>,
    pub tcp_count: u64,
    pub udp_count: u64,
    #[serde(rename = "netIO")]
    pub net_io: NetIo,
    pub net_traffic: NetTraffic,
    #[serde(rename = "publicIP")]
    pub public_ip: PublicIp,
    pub app_stats: AppStats,
}

/// Used/total pair in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub current: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XrayStatus {
    pub state: String,
    pub error_msg: String,
    pub version: String,
}

/// Current throughput in bytes per second
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetIo {
    pub up: u64,
    pub down: u64,
}

/// Total bytes since boot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetTraffic {
    pub sent: u64,
    pub recv: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicIp {
    pub ipv4: String,
    pub ipv6: String,
}

/// Resource usage of the panel process itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppStats {
    pub threads: u32,
    pub mem: u64,
    pub uptime: u64,
}
