//! Whole-session behavior over mock backends

use nvsettings::attributes::ids;
use nvsettings::cli::args::{QueryArgs, ValidArgs, WatchArgs};
use nvsettings::cli::output::AttributeValue;
use nvsettings::commands::{assign, list, query, valid, watch};
use nvsettings::config::Config;
use nvsettings::domain::{ProtocolVersion, Target, TargetType, ValueType};
use nvsettings::mock::{MockDevice, MockManager, MockNvControl};
use nvsettings::nvcontrol::{NotifyKind, NvControlEvent};
use nvsettings::services::{EventMonitor, MonitorConfig};
use nvsettings::system::{load_nvml, CtrlSystem, SystemParts};
use nvsettings::{AppError, Subsystems};
use std::cell::RefCell;
use std::rc::Rc;

fn server() -> Rc<MockNvControl> {
    let nv = Rc::new(MockNvControl::new(ProtocolVersion::new(1, 29)));
    nv.set_target_count(TargetType::XScreen, 1);
    nv.set_target_count(TargetType::Gpu, 1);
    nv.set_target_count(TargetType::Cooler, 2);
    nv.set_string_value(Target::gpu(0), ids::STRING_GPU_UUID, "GPU-MOCK-0000");
    nv
}

fn session_with_nvml() -> (Rc<MockNvControl>, CtrlSystem) {
    let nv = server();
    let manager = Rc::new(MockManager::with_devices(vec![
        MockDevice::new(0).with_fan_count(2)
    ]));
    let system = CtrlSystem::from_parts(SystemParts {
        nv_control: Some(nv.clone()),
        nvml: Some(manager),
        ..Default::default()
    })
    .unwrap();
    (nv, system)
}

fn query_args(attribute: &str, target: Option<Target>) -> QueryArgs {
    QueryArgs {
        attribute: attribute.to_string(),
        target,
        display_mask: 0,
    }
}

#[test]
fn test_list_shows_backends_per_target() {
    let (_, system) = session_with_nvml();
    let list = list::list_targets(&system);

    let backends: Vec<_> = list
        .targets
        .iter()
        .map(|t| (t.target.as_str(), t.backends.clone()))
        .collect();
    assert_eq!(
        backends,
        vec![
            ("[screen:0]", vec!["nv-control"]),
            ("[gpu:0]", vec!["nv-control", "nvml"]),
            ("[fan:0]", vec!["nv-control", "nvml"]),
            ("[fan:1]", vec!["nv-control", "nvml"]),
        ]
    );
}

#[test]
fn test_query_prefers_nvml_on_gpu() {
    let (nv, system) = session_with_nvml();
    nv.set_attribute_value(Target::gpu(0), ids::GPU_CORE_TEMPERATURE, 70);

    let results = query::query(&system, &query_args("GPUCoreTemp", Some(Target::gpu(0)))).unwrap();
    assert_eq!(results.results[0].value, AttributeValue::Integer(45));

    let results = query::query(&system, &query_args("GPUUUID", None)).unwrap();
    assert_eq!(results.results.len(), 1);
    assert_eq!(
        results.results[0].value,
        AttributeValue::String("GPU-MOCK-0000".to_string())
    );
}

#[test]
fn test_assign_cooler_through_nvml() {
    let (nv, system) = session_with_nvml();
    let fan = Target::new(TargetType::Cooler, 1);
    let handle = system.target(fan).unwrap();
    let attr = system.registry().lookup("GPUTargetFanSpeed").unwrap();

    assign::write_attribute(handle, 0, attr, "65").unwrap();
    assert_eq!(handle.get_attribute(ids::THERMAL_COOLER_LEVEL), Ok(65));
    assert_eq!(nv.attribute_value(fan, ids::THERMAL_COOLER_LEVEL), None);

    let reset = system.registry().lookup("GPUFanResetToDefault").unwrap();
    assign::write_attribute(handle, 0, reset, "1").unwrap();
    assert_eq!(handle.get_attribute(ids::THERMAL_COOLER_LEVEL), Ok(50));
}

#[test]
fn test_valid_values_of_presence_flag() {
    let (_, system) = session_with_nvml();
    let report = valid::valid(
        &system,
        &ValidArgs {
            attribute: "NvmlPresent".to_string(),
            target: Some(Target::gpu(0)),
            display_mask: 0,
        },
    )
    .unwrap();
    assert_eq!(report.values.value_type, ValueType::Bool);
    assert!(report.values.permissions.readable());
    assert!(!report.values.permissions.writable());
}

#[test]
fn test_missing_nvml_library_keeps_session() {
    let mut config = Config::default();
    config.nvml.library = Some("/nonexistent/libnvidia-ml.so.1".to_string());
    config.backends.vulkan = false;

    let nvml = load_nvml(&config);
    assert!(nvml.is_none());

    let nv = server();
    nv.set_attribute_value(Target::gpu(0), ids::GPU_CORE_TEMPERATURE, 57);
    let system = CtrlSystem::from_parts(SystemParts {
        nv_control: Some(nv),
        nvml,
        subsystems: config.backends.subsystems(),
        ..Default::default()
    })
    .unwrap();

    let gpu = system.target(Target::gpu(0)).unwrap();
    assert!(!gpu.subsystems().contains(Subsystems::NVML));
    assert_eq!(gpu.get_attribute(ids::GPU_CORE_TEMPERATURE), Ok(57));
}

#[test]
fn test_watch_until_count() {
    let (nv, system) = session_with_nvml();
    for value in [60, 61, 62] {
        nv.push_event(NvControlEvent {
            kind: NotifyKind::TargetAttributeChanged,
            time: 0,
            target: Target::gpu(0),
            display_mask: 0,
            attribute: ids::GPU_CORE_TEMPERATURE,
            value,
            available: None,
        });
    }

    let values = Rc::new(RefCell::new(Vec::new()));
    let sink = {
        let values = values.clone();
        move |line: nvsettings::cli::output::EventLine| values.borrow_mut().push(line.value)
    };
    let args = WatchArgs {
        attributes: vec![],
        count: Some(2),
    };
    let mut dispatcher = watch::build_dispatcher(&system, &args, sink).unwrap();
    let config = MonitorConfig {
        max_events: args.count,
        ..Default::default()
    };
    let seen = EventMonitor::new(config, system.event_source().unwrap())
        .run(&mut dispatcher)
        .unwrap();

    assert_eq!(seen, 2);
    assert_eq!(*values.borrow(), vec![60, 61]);
}

#[test]
fn test_unknown_target() {
    let (_, system) = session_with_nvml();
    let result = query::query(&system, &query_args("GPUCoreTemp", Some(Target::gpu(4))));
    assert!(matches!(result, Err(AppError::TargetNotFound(_))));
}
