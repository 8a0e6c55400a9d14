//! Known metric descriptors per sensor family
//!
//! Display ranges are the reference scales used by presentation layers; values
//! outside them are valid data and are never clamped here.

use serde::Serialize;

use crate::classifier::SensorFamily;

/// One known metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub description: &'static str,
}

const fn metric(
    key: &'static str,
    name: &'static str,
    unit: &'static str,
    min: f64,
    max: f64,
    description: &'static str,
) -> MetricDescriptor {
    MetricDescriptor {
        key,
        name,
        unit,
        min,
        max,
        description,
    }
}

pub const IMU_METRICS: [MetricDescriptor; 4] = [
    metric("gait_cycle", "Gait cycle", "s", 0.5, 2.0, "Duration of one gait cycle"),
    metric("knee_flexion_max", "Max knee flexion", "deg", 0.0, 140.0, "Peak knee flexion angle"),
    metric("knee_extension_max", "Max knee extension", "deg", -10.0, 20.0, "Peak knee extension angle"),
    metric("foot_clearance", "Foot clearance", "cm", 0.0, 30.0, "Foot lift height during swing"),
];

pub const GAIT_PAD_METRICS: [MetricDescriptor; 5] = [
    metric("step_length", "Step length", "cm", 40.0, 120.0, "Step length per side"),
    metric("velocity", "Walking velocity", "cm/s", 80.0, 160.0, "Walking velocity"),
    metric("stance_phase_rate", "Stance phase", "%", 30.0, 70.0, "Share of the cycle in stance"),
    metric("swing_phase_rate", "Swing phase", "%", 30.0, 70.0, "Share of the cycle in swing"),
    metric("double_support_time", "Double support", "%", 10.0, 30.0, "Share of the cycle with both feet down"),
];

pub const SMART_INSOLE_METRICS: [MetricDescriptor; 8] = [
    metric("gait_speed", "Gait speed", "km/h", 0.0, 8.0, "Walking speed"),
    metric("balance", "Left/right balance", "%", 0.0, 100.0, "Load share between sides"),
    metric("foot_pressure_rear", "Rear pressure", "%", 0.0, 100.0, "Rearfoot pressure share"),
    metric("foot_pressure_mid", "Mid pressure", "%", 0.0, 100.0, "Midfoot pressure share"),
    metric("foot_pressure_fore", "Fore pressure", "%", 0.0, 100.0, "Forefoot pressure share"),
    metric("gait_distance", "Gait distance", "m", 0.0, 500.0, "Distance walked"),
    metric("stride_length", "Stride length", "cm", 0.0, 200.0, "Stride length"),
    metric(
        "foot_angle",
        "Foot angle",
        "idx",
        0.0,
        2.0,
        "Alignment index (0: varus, 1: normal alignment, 2: valgus)",
    ),
];

/// Descriptors for a family, in display order (empty for generic)
pub fn catalog_for(family: SensorFamily) -> &'static [MetricDescriptor] {
    match family {
        SensorFamily::Imu => &IMU_METRICS,
        SensorFamily::GaitPad => &GAIT_PAD_METRICS,
        SensorFamily::SmartInsole => &SMART_INSOLE_METRICS,
        SensorFamily::Generic => &[],
    }
}

/// Look up one metric of a family by key
pub fn describe(family: SensorFamily, key: &str) -> Option<&'static MetricDescriptor> {
    catalog_for(family).iter().find(|m| m.key == key)
}
