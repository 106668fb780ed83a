use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use twinprop::json::{JsonReader, JsonWriter};
use twinprop::{
    begin_component, begin_response_status, properties_version, ComponentRegistry, MessageType,
    PropertyIter, PropertyKind, TwinResult,
};

static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
        System.alloc(layout)
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
        System.alloc_zeroed(layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
        System.realloc(ptr, layout, new_size)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

fn reset_allocations() {
    ALLOCATIONS.store(0, Ordering::SeqCst);
}

fn allocations() -> usize {
    ALLOCATIONS.load(Ordering::SeqCst)
}

fn assert_ptr_in_buffer(buffer: &[u8], ptr: *const u8) {
    let base = buffer.as_ptr() as usize;
    let end = base + buffer.len();
    let p = ptr as usize;
    assert!(base <= p && p < end, "slice pointer not in input buffer");
}

const DOC: &[u8] = br#"{"thermostat":{"target":21.5,"mode":"heat"},"$version":7,"led":true,"serial":"a\/b"}"#;

/// Walks the document, reads its version and writes an ack reply into `out`.
fn exercise<'a>(
    doc: &'a [u8],
    registry: &ComponentRegistry,
    out: &mut [u8],
) -> TwinResult<(usize, u32, Option<&'a str>, usize)> {
    let mut reader = JsonReader::new(doc);
    let version = properties_version(&reader, MessageType::WritablePatch)?;

    let mut count = 0;
    let mut mode = None;
    let mut iter = PropertyIter::new(
        &mut reader,
        MessageType::WritablePatch,
        PropertyKind::Writable,
        registry,
    )?;
    while let Some(property) = iter.next_property()? {
        count += 1;
        if property.name_equals("mode") {
            mode = Some(property.read_str()?);
        } else {
            property.skip()?;
        }
    }

    let mut writer = JsonWriter::new(out);
    writer.begin_object()?;
    let mut component = begin_component(&mut writer, "thermostat")?;
    let mut ack = begin_response_status(&mut component, "target", 200, version as i32, None)?;
    ack.int64(21)?;
    ack.end()?;
    component.end()?;
    writer.end_object()?;
    Ok((count, version, mode, writer.len()))
}

#[test]
fn codec_never_allocates() -> TwinResult<()> {
    let registry = ComponentRegistry::new(["thermostat"])?;
    let mut out = [0u8; 128];

    // First pass registers tracing callsites.
    exercise(DOC, &registry, &mut out)?;

    reset_allocations();
    let (count, version, mode, written) = exercise(DOC, &registry, &mut out)?;
    let allocated = allocations();

    assert_eq!(
        allocated, 0,
        "property traversal allocated unexpectedly"
    );
    assert_eq!(count, 4);
    assert_eq!(version, 7);
    let mode = mode.expect("expected mode property");
    assert_eq!(mode, "heat");
    assert_ptr_in_buffer(DOC, mode.as_ptr());
    assert_eq!(
        &out[..written],
        br#"{"thermostat":{"__t":"c","target":{"ac":200,"av":7,"value":21}}}"#
    );
    Ok(())
}
