//! `getdevicelistinfos` / `getdeviceinfos` documents

use std::str::FromStr;

use serde::Deserialize;

use crate::errors::HomeAutoError;

/// Capability block a device has to expose for an action to use it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Switch,
    PowerMeter,
    Temperature,
    Humidity,
}

/// Root of the device list document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceList {
    #[serde(rename = "@version", default)]
    pub version: Option<String>,

    #[serde(rename = "@fwversion", default)]
    pub fwversion: Option<String>,

    #[serde(rename = "device", default)]
    pub devices: Vec<RawDevice>,
}

impl DeviceList {
    pub fn from_xml(body: &str) -> Result<Self, HomeAutoError> {
        if body.trim().is_empty() {
            return Err(HomeAutoError::QueryError("empty device list".to_string()));
        }
        Ok(quick_xml::de::from_str(body)?)
    }
}

/// A device exactly as the gateway reports it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDevice {
    /// AIN
    #[serde(rename = "@identifier", default)]
    pub identifier: String,

    #[serde(rename = "@id", default)]
    pub id: Option<String>,

    #[serde(rename = "@functionbitmask", default)]
    pub functionbitmask: Option<String>,

    #[serde(rename = "@fwversion", default)]
    pub fwversion: Option<String>,

    #[serde(rename = "@manufacturer", default)]
    pub manufacturer: Option<String>,

    #[serde(rename = "@productname", default)]
    pub productname: Option<String>,

    #[serde(default)]
    pub present: u8,

    #[serde(default)]
    pub txbusy: u8,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub switch: Option<SwitchBlock>,

    #[serde(default)]
    pub powermeter: Option<PowerMeterBlock>,

    #[serde(default)]
    pub temperature: Option<TemperatureBlock>,

    #[serde(default)]
    pub humidity: Option<HumidityBlock>,
}

impl RawDevice {
    pub fn from_xml(body: &str) -> Result<Self, HomeAutoError> {
        if body.trim().is_empty() {
            return Err(HomeAutoError::QueryError("empty device info".to_string()));
        }
        Ok(quick_xml::de::from_str(body)?)
    }

    /// Whether the gateway can currently reach the device
    pub fn is_present(&self) -> bool {
        self.present == 1
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Switch => self.switch.is_some(),
            Capability::PowerMeter => self.powermeter.is_some(),
            Capability::Temperature => self.temperature.is_some(),
            Capability::Humidity => self.humidity.is_some(),
        }
    }

    pub fn function_bitmask(&self) -> Option<u32> {
        parse_field(&self.functionbitmask)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchBlock {
    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub lock: Option<String>,

    #[serde(default)]
    pub devicelock: Option<String>,
}

impl SwitchBlock {
    pub fn is_on(&self) -> Option<bool> {
        parse_field::<u8>(&self.state).map(|s| s == 1)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PowerMeterBlock {
    /// mV
    #[serde(default)]
    pub voltage: Option<String>,

    /// mW
    #[serde(default)]
    pub power: Option<String>,

    /// Wh
    #[serde(default)]
    pub energy: Option<String>,
}

impl PowerMeterBlock {
    pub fn power_milliwatts(&self) -> Option<u64> {
        parse_field(&self.power)
    }

    pub fn energy_watt_hours(&self) -> Option<u64> {
        parse_field(&self.energy)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemperatureBlock {
    /// 0.1 °C, offset already applied
    #[serde(default)]
    pub celsius: Option<String>,

    #[serde(default)]
    pub offset: Option<String>,
}

impl TemperatureBlock {
    pub fn deci_celsius(&self) -> Option<i64> {
        parse_field(&self.celsius)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HumidityBlock {
    #[serde(default)]
    pub rel_humidity: Option<String>,
}

impl HumidityBlock {
    pub fn percent(&self) -> Option<u32> {
        parse_field(&self.rel_humidity)
    }
}

fn parse_field<T: FromStr>(field: &Option<String>) -> Option<T> {
    field.as_deref().map(str::trim).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE_LIST: &str = r#"<devicelist version="1" fwversion="7.57">
<device identifier="08761 0000434" id="17" functionbitmask="35712" fwversion="04.25" manufacturer="AVM" productname="FRITZ!DECT 200">
<present>1</present><txbusy>0</txbusy><name>Living room outlet</name>
<switch><state>1</state><mode>manuell</mode><lock>0</lock><devicelock>0</devicelock></switch>
<powermeter><voltage>229512</voltage><power>2500</power><energy>123456</energy></powermeter>
<temperature><celsius>225</celsius><offset>0</offset></temperature>
</device>
<device identifier="09995 0123456" id="20" functionbitmask="320" fwversion="05.08" manufacturer="AVM" productname="FRITZ!DECT 301">
<present>0</present><txbusy>0</txbusy><name>Bedroom thermostat</name>
<temperature><celsius>-15</celsius><offset>0</offset></temperature>
</device>
<group identifier="grp1A2B3C-3E8F90D" id="900" functionbitmask="6784" fwversion="1.0" manufacturer="AVM" productname="">
<present>1</present><name>All outlets</name>
</group>
</devicelist>"#;

    #[test]
    fn test_parse_device_list() {
        let list = DeviceList::from_xml(DEVICE_LIST).unwrap();
        assert_eq!(list.version.as_deref(), Some("1"));
        assert_eq!(list.devices.len(), 2);

        let outlet = &list.devices[0];
        assert_eq!(outlet.identifier, "08761 0000434");
        assert_eq!(outlet.name, "Living room outlet");
        assert_eq!(outlet.productname.as_deref(), Some("FRITZ!DECT 200"));
        assert_eq!(outlet.function_bitmask(), Some(35712));
        assert!(outlet.is_present());
        assert!(outlet.has(Capability::Switch));
        assert!(outlet.has(Capability::PowerMeter));
        assert!(!outlet.has(Capability::Humidity));
        assert_eq!(outlet.switch.as_ref().and_then(|s| s.is_on()), Some(true));
        assert_eq!(outlet.powermeter.as_ref().and_then(|p| p.power_milliwatts()), Some(2500));

        let thermostat = &list.devices[1];
        assert!(!thermostat.is_present());
        assert_eq!(thermostat.temperature.as_ref().and_then(|t| t.deci_celsius()), Some(-15));
    }

    #[test]
    fn test_parse_single_device() {
        let body = r#"<device identifier="11630 0012345" id="21" functionbitmask="1048864" fwversion="05.10" manufacturer="AVM" productname="FRITZ!DECT 440"><present>1</present><name>Hall</name><humidity><rel_humidity>47</rel_humidity></humidity></device>"#;
        let device = RawDevice::from_xml(body).unwrap();
        assert_eq!(device.humidity.as_ref().and_then(|h| h.percent()), Some(47));
        assert!(device.switch.is_none());
    }

    #[test]
    fn test_empty_switch_state() {
        let body = r#"<device identifier="1"><present>0</present><name>Gone</name><switch><state></state><mode></mode></switch></device>"#;
        let device = RawDevice::from_xml(body).unwrap();
        assert!(device.has(Capability::Switch));
        assert_eq!(device.switch.as_ref().and_then(|s| s.is_on()), None);
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(DeviceList::from_xml("").is_err());
    }
}
