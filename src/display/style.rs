//! Per-device cosmetic sizing for the status surface.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifies the device hosting the surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
}

impl DeviceIdentity {
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
        }
    }
}

/// Text sizes in sp and padding in dp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceStyleProfile {
    pub host_text_size: f32,
    pub date_text_size: f32,
    pub hour_text_size: f32,
    pub minute_text_size: f32,
    pub update_time_size: f32,
    pub widget_padding: u32,
}

impl Default for DeviceStyleProfile {
    fn default() -> Self {
        DEFAULT_PROFILE
    }
}

const DEFAULT_PROFILE: DeviceStyleProfile = DeviceStyleProfile {
    host_text_size: 10.0,
    date_text_size: 9.0,
    hour_text_size: 9.0,
    minute_text_size: 7.0,
    update_time_size: 6.0,
    widget_padding: 4,
};

const LG_WING_PROFILE: DeviceStyleProfile = DeviceStyleProfile {
    host_text_size: 15.0,
    date_text_size: 15.0,
    hour_text_size: 15.0,
    minute_text_size: 15.0,
    update_time_size: 15.0,
    widget_padding: 5,
};

const XIAOMI_12_PRO_PROFILE: DeviceStyleProfile = DeviceStyleProfile {
    host_text_size: 10.0,
    date_text_size: 10.0,
    hour_text_size: 10.0,
    minute_text_size: 10.0,
    update_time_size: 10.0,
    widget_padding: 4,
};

const XIAOMI_MIX_FOLD_2_PROFILE: DeviceStyleProfile = DeviceStyleProfile {
    host_text_size: 12.0,
    date_text_size: 11.0,
    hour_text_size: 11.0,
    minute_text_size: 9.0,
    update_time_size: 7.0,
    widget_padding: 6,
};

/// Look up the profile for a device. Unknown devices get the default.
pub fn profile_for(device: &DeviceIdentity) -> DeviceStyleProfile {
    let (name, profile) = if is_lg_wing(device) {
        ("LG Wing", LG_WING_PROFILE)
    } else if is_xiaomi_12_pro(device) {
        ("Xiaomi 12 Pro", XIAOMI_12_PRO_PROFILE)
    } else if is_xiaomi_mix_fold_2(device) {
        ("Xiaomi MIX Fold 2", XIAOMI_MIX_FOLD_2_PROFILE)
    } else {
        ("default", DEFAULT_PROFILE)
    };
    debug!(
        manufacturer = %device.manufacturer,
        model = %device.model,
        profile = name,
        "Selected device style profile"
    );
    profile
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

fn is_lg_wing(device: &DeviceIdentity) -> bool {
    let maker = &device.manufacturer;
    (maker.eq_ignore_ascii_case("LG") || maker.eq_ignore_ascii_case("LGE"))
        && (contains_ignore_case(&device.model, "Wing")
            || contains_ignore_case(&device.model, "LM-F100"))
}

fn is_xiaomi_12_pro(device: &DeviceIdentity) -> bool {
    device.manufacturer.eq_ignore_ascii_case("Xiaomi")
        && ["2201122C", "2201122G", "12 Pro"]
            .iter()
            .any(|needle| contains_ignore_case(&device.model, needle))
}

fn is_xiaomi_mix_fold_2(device: &DeviceIdentity) -> bool {
    device.manufacturer.eq_ignore_ascii_case("Xiaomi")
        && ["22061218C", "MIX Fold 2"]
            .iter()
            .any(|needle| contains_ignore_case(&device.model, needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_devices_match() {
        assert_eq!(
            profile_for(&DeviceIdentity::new("LGE", "LM-F100N")),
            LG_WING_PROFILE
        );
        assert_eq!(
            profile_for(&DeviceIdentity::new("xiaomi", "2201122G")),
            XIAOMI_12_PRO_PROFILE
        );
        assert_eq!(
            profile_for(&DeviceIdentity::new("Xiaomi", "Xiaomi Mix Fold 2")),
            XIAOMI_MIX_FOLD_2_PROFILE
        );
    }

    #[test]
    fn unknown_device_gets_default() {
        assert_eq!(
            profile_for(&DeviceIdentity::new("Google", "Pixel 8")),
            DeviceStyleProfile::default()
        );
        assert_eq!(
            profile_for(&DeviceIdentity::default()),
            DeviceStyleProfile::default()
        );
        // Model alone is not enough.
        assert_eq!(
            profile_for(&DeviceIdentity::new("Samsung", "Wing")),
            DeviceStyleProfile::default()
        );
    }
}
