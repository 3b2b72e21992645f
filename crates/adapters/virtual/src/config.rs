//! Simulated network configuration.

use serde::Deserialize;

use warema_bridge_domain::id::SerialNumber;

/// One simulated device on the radio network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VirtualDeviceConfig {
    pub snr: SerialNumber,
    /// Raw WMS type code reported by scans.
    #[serde(default = "default_type")]
    pub device_type: u16,
    /// Initial blind position.
    #[serde(default)]
    pub position: u8,
    /// Initial slat angle.
    #[serde(default)]
    pub angle: i8,
    /// Never answers radio requests.
    #[serde(default)]
    pub unresponsive: bool,
}

fn default_type() -> u16 {
    25
}

/// The simulated network.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VirtualStickConfig {
    pub devices: Vec<VirtualDeviceConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            [[devices]]
            snr = "123"

            [[devices]]
            snr = "777"
            device_type = 6

            [[devices]]
            snr = "456"
            position = 100
            angle = -20
            unresponsive = true
        "#;
        let config: VirtualStickConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.devices.len(), 3);
        assert_eq!(config.devices[0].device_type, 25);
        assert_eq!(config.devices[0].position, 0);
        assert!(!config.devices[0].unresponsive);
        assert_eq!(config.devices[1].device_type, 6);
        assert_eq!(config.devices[2].angle, -20);
        assert!(config.devices[2].unresponsive);
    }

    #[test]
    fn should_reject_blank_serial() {
        let toml = r#"
            [[devices]]
            snr = "  "
        "#;
        assert!(toml::from_str::<VirtualStickConfig>(toml).is_err());
    }
}
