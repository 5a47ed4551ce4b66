//! Layout shared by the service integration tests: one desk on `mock0`
//! with a horn button and a throttle, bound to a Class 66.

#![allow(dead_code, reason = "each test binary uses a different part of the fixture")]

use tswio_buttons::{ButtonInputBinding, ButtonMode};
use tswio_calibration::Calibration;
use tswio_lever::{BldcParams, LeverConfig, LeverEndpoints, LeverType, Notch};
use tswio_protocol::InputConfig;
use tswio_service::outputs::{Comparison, OutputBinding};
use tswio_service::{DeviceRecord, InputRecord, Layout, LeverElement, TrainLayout, TrainRecord};
use tswio_test_helpers::must;

pub const TRANSPORT: &str = "mock0";
pub const CONFIG_ID: u32 = 7;
pub const HORN_PIN: u8 = 2;
pub const THROTTLE_PIN: u8 = 14;
pub const SANDER_LAMP_PIN: u8 = 5;
pub const DETECTION_PATH: &str = "CurrentFormation/0.ObjectClass";

pub fn class_66() -> TrainRecord {
    TrainRecord {
        id: "class66".into(),
        name: "BR Class 66".into(),
        identifier: "Class66".into(),
    }
}

pub fn throttle() -> LeverConfig {
    let notches = vec![
        Notch::gate(0, 0.0).with_input(0.0, 0.2).with_sim_input(0.0, 0.0),
        Notch::linear(1, 0.0, 1.0)
            .with_input(0.2, 1.0)
            .with_sim_input(0.1, 0.9),
    ];
    must(LeverConfig::new(
        LeverEndpoints::for_control("Throttle"),
        LeverType::Hybrid,
        notches,
    ))
}

pub fn desk() -> DeviceRecord {
    DeviceRecord {
        transport: TRANSPORT.into(),
        name: "Desk".into(),
        config_id: CONFIG_ID,
        inputs: vec![
            InputRecord {
                id: "desk/horn".into(),
                config: InputConfig::Button {
                    pin: HORN_PIN,
                    debounce: 10,
                },
                calibration: None,
            },
            InputRecord {
                id: "desk/throttle".into(),
                config: InputConfig::Analog {
                    pin: THROTTLE_PIN,
                    sensitivity: 5,
                },
                calibration: Some(Calibration {
                    min: 0,
                    max: 1000,
                    max_hardware_value: 1023,
                    inverted: false,
                    rollover: false,
                }),
            },
        ],
    }
}

pub fn layout() -> Layout {
    Layout {
        devices: vec![desk()],
        trains: vec![TrainLayout {
            train: class_66(),
            levers: vec![LeverElement {
                element_id: "throttle".into(),
                input_id: "desk/throttle".into(),
                lever: throttle(),
                bldc: Some(BldcParams::default()),
            }],
            buttons: vec![
                ButtonInputBinding::new("horn", "desk/horn", ButtonMode::Simple)
                    .with_endpoint("Horn.InputValue"),
            ],
            outputs: vec![OutputBinding {
                id: "sander-lamp".into(),
                transport: TRANSPORT.into(),
                pin: SANDER_LAMP_PIN,
                endpoint: "Sander.Function.Value".into(),
                operator: Comparison::Gt,
                threshold: 0.5,
                enabled: true,
            }],
        }],
        sequences: Vec::new(),
    }
}
