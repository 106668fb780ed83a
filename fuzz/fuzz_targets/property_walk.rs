#![no_main]

use std::fs;
use std::path::Path;

use libfuzzer_sys::fuzz_target;
use twinprop::json::{JsonReader, JsonWriter};
use twinprop::{
    begin_component, begin_response_status, properties_version, ComponentRegistry, MessageType,
    PropertyIter, PropertyKind,
};

const COMPONENTS: [&str; 3] = ["a", "thermostat", "deviceInformation"];

fuzz_target!(|data: &[u8]| {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let Ok(registry) = ComponentRegistry::new(COMPONENTS) else {
            return;
        };
        let mut reader = JsonReader::new(data);
        let _ = properties_version(&reader, MessageType::FullDocument);

        let Ok(mut iter) = PropertyIter::new(
            &mut reader,
            MessageType::WritablePatch,
            PropertyKind::Writable,
            &registry,
        ) else {
            return;
        };
        let mut out = [0u8; 512];
        let mut writer = JsonWriter::new(&mut out);
        let _ = writer.begin_object();
        loop {
            let property = match iter.next_property() {
                Ok(Some(property)) => property,
                Ok(None) | Err(_) => break,
            };
            let component = property.component();
            let Ok(name) = property.name_str() else {
                let _ = property.skip();
                break;
            };
            let Ok(value) = property.read_i32() else {
                continue;
            };
            match component {
                Some(component) => {
                    if let Ok(mut scope) = begin_component(&mut writer, component) {
                        if let Ok(mut ack) = begin_response_status(&mut scope, name, 200, value, None)
                        {
                            let _ = ack.int32(value);
                        }
                    }
                }
                None => {
                    if let Ok(mut ack) = begin_response_status(&mut writer, name, 200, value, Some(name)) {
                        let _ = ack.int32(value);
                    }
                }
            }
        }
        let _ = writer.end_object();
    }));

    if result.is_err() {
        record_panic("property_walk", data);
    }
});

fn record_panic(target: &str, data: &[u8]) {
    let hash = fnv1a64(data);
    let dir = Path::new("fuzz").join("artifacts").join(target);
    if let Err(err) = fs::create_dir_all(&dir) {
        eprintln!("fuzz panic capture failed: target={} err={}", target, err);
        return;
    }
    let path = dir.join(format!("panic_{:016x}.bin", hash));
    if let Err(err) = fs::write(&path, data) {
        eprintln!(
            "fuzz panic capture failed: target={} path={} err={}",
            target,
            path.display(),
            err
        );
        return;
    }
    eprintln!(
        "fuzz panic captured: target={} path={} len={} seed_hex={}",
        target,
        path.display(),
        data.len(),
        hex_preview(data, 64)
    );
}

fn fnv1a64(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    data.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

fn hex_preview(data: &[u8], max_len: usize) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    data.iter()
        .take(max_len)
        .flat_map(|byte| [HEX[usize::from(byte >> 4)], HEX[usize::from(byte & 0x0f)]])
        .map(char::from)
        .collect()
}
