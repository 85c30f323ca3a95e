//! C-ABI FFI bindings for host applications.
//!
//! All functions operate on one process-wide [`DocumentStore`] and return a
//! status code: `0` on success, negative on failure (see the `INK_*`
//! constants). Document handles cross the boundary as non-zero `u64`s.
//! Panics never unwind into the host; they are reported as
//! [`INK_ERROR_UNKNOWN`].

use std::ffi::{c_char, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::OnceLock;

use crate::config::CreateOptions;
use crate::error::{Error, Result};
use crate::ingest::{Phase, RawPoint, ToolKind};
use crate::render::{ImageFormat, RenderOptions};
use crate::store::{DocumentStore, Handle};

pub const INK_SUCCESS: i32 = 0;
pub const INK_ERROR_INVALID_HANDLE: i32 = -1;
pub const INK_ERROR_INVALID_PARAM: i32 = -2;
pub const INK_ERROR_FILE_NOT_FOUND: i32 = -3;
pub const INK_ERROR_IO: i32 = -4;
pub const INK_ERROR_UNKNOWN: i32 = -99;

/// Document handle as seen by the host. Zero is never valid.
pub type InkDocHandle = u64;

/// One pen sample.
///
/// `pressure` outside (0, 1] means no pressure. `tool`: 0 pen, 1 eraser,
/// 2 highlighter, 3 pencil. `phase`: 0 down, 1 move, 2 up.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InkStrokePoint {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub timestamp: i64,
    pub tool: i32,
    pub phase: i32,
}

impl InkStrokePoint {
    /// Unknown tool codes fall back to `tool`, unknown phases read as a move.
    fn to_raw(self, tool: ToolKind) -> RawPoint {
        RawPoint {
            x: self.x as f64,
            y: self.y as f64,
            pressure: self.pressure as f64,
            timestamp_ms: self.timestamp,
            tool: ToolKind::from_code(self.tool).unwrap_or(tool),
            phase: Phase::from_code(self.phase).unwrap_or(Phase::Move),
        }
    }
}

static STORE: OnceLock<DocumentStore> = OnceLock::new();

fn store() -> &'static DocumentStore {
    STORE.get_or_init(DocumentStore::new)
}

/// Run `f`, mapping its outcome (or a panic) to a status code.
fn guarded(f: impl FnOnce() -> Result<()>) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => INK_SUCCESS,
        Ok(Err(e)) => {
            log::debug!("FFI call failed: {}", e);
            e.kind().code()
        }
        Err(_) => {
            log::error!("Panic caught at FFI boundary");
            INK_ERROR_UNKNOWN
        }
    }
}

/// Like [`guarded`], for calls that address an existing document.
fn with_handle(raw: InkDocHandle, f: impl FnOnce(Handle) -> Result<()>) -> i32 {
    match Handle::from_raw(raw) {
        Some(handle) => guarded(|| f(handle)),
        None => INK_ERROR_INVALID_HANDLE,
    }
}

/// Borrow a required C string.
///
/// # Safety
///
/// `ptr` must be null or a valid null-terminated string that outlives `'a`.
unsafe fn c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Error::InvalidParam(format!("{} cannot be null", what)));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| Error::InvalidParam(format!("{} is not valid UTF-8", what)))
}

/// Borrow an optional C string; null reads as empty.
///
/// # Safety
///
/// Same as [`c_str`].
unsafe fn c_str_or_empty<'a>(ptr: *const c_char, what: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Ok("");
    }
    c_str(ptr, what)
}

fn write_out<T>(out: *mut T, value: T) -> Result<()> {
    if out.is_null() {
        return Err(Error::invalid("output pointer cannot be null"));
    }
    // SAFETY: non-null and, per the caller contract, valid for writes
    unsafe { out.write(value) };
    Ok(())
}

/// Initialize the library.
///
/// # Safety
///
/// `config_json` must be null or a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn ink_init(config_json: *const c_char) -> i32 {
    guarded(|| {
        let json = c_str_or_empty(config_json, "config_json")?;
        store().init_from_json(json)
    })
}

/// Close every document and release global resources.
#[no_mangle]
pub extern "C" fn ink_shutdown() -> i32 {
    guarded(|| {
        store().shutdown();
        Ok(())
    })
}

/// Create a new document with one blank page.
///
/// # Safety
///
/// `out_doc` must be valid for writes. `options_json` must be null or a
/// valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn ink_doc_create(
    out_doc: *mut InkDocHandle,
    options_json: *const c_char,
) -> i32 {
    guarded(|| {
        if out_doc.is_null() {
            return Err(Error::invalid("out_doc cannot be null"));
        }
        let options = CreateOptions::from_json(c_str_or_empty(options_json, "options_json")?)?;
        let handle = store().create(&options)?;
        write_out(out_doc, handle.as_raw())
    })
}

/// Open a saved note container.
///
/// # Safety
///
/// `out_doc` must be valid for writes; `path` must be a valid
/// null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn ink_doc_open(out_doc: *mut InkDocHandle, path: *const c_char) -> i32 {
    guarded(|| {
        if out_doc.is_null() {
            return Err(Error::invalid("out_doc cannot be null"));
        }
        let path = c_str(path, "path")?;
        let handle = store().open(Path::new(path))?;
        write_out(out_doc, handle.as_raw())
    })
}

/// Open a PDF as a new document with one page per PDF page.
///
/// # Safety
///
/// `out_doc` must be valid for writes; `pdf_path` must be a valid
/// null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn ink_doc_open_pdf(
    out_doc: *mut InkDocHandle,
    pdf_path: *const c_char,
    attach_to_document: i32,
) -> i32 {
    guarded(|| {
        if out_doc.is_null() {
            return Err(Error::invalid("out_doc cannot be null"));
        }
        let path = c_str(pdf_path, "pdf_path")?;
        let handle = store().open_pdf(Path::new(path), attach_to_document != 0)?;
        write_out(out_doc, handle.as_raw())
    })
}

/// Save a document.
///
/// # Safety
///
/// `path` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn ink_doc_save(doc: InkDocHandle, path: *const c_char) -> i32 {
    with_handle(doc, |handle| {
        let path = c_str(path, "path")?;
        store().save(handle, Path::new(path))
    })
}

/// Close a document.
#[no_mangle]
pub extern "C" fn ink_doc_close(doc: InkDocHandle) -> i32 {
    with_handle(doc, |handle| store().close(handle))
}

/// Append one gesture of `count` points as a stroke.
///
/// # Safety
///
/// `points` must point to `count` initialized `InkStrokePoint`s.
#[no_mangle]
pub unsafe extern "C" fn ink_doc_handle_stroke(
    doc: InkDocHandle,
    points: *const InkStrokePoint,
    count: i32,
) -> i32 {
    with_handle(doc, |handle| {
        if points.is_null() || count <= 0 {
            return Err(Error::invalid("stroke needs at least one point"));
        }
        let points = std::slice::from_raw_parts(points, count as usize);
        // Only the first sample decides the stroke's tool
        let tool = ToolKind::from_code(points[0].tool)?;
        let raw: Vec<RawPoint> = points.iter().map(|p| p.to_raw(tool)).collect();
        store().ingest(handle, &raw)
    })
}

/// Render one page to a PNG file.
///
/// The page is scaled uniformly to fit `width` x `height`.
///
/// # Safety
///
/// `output_path` must be a valid null-terminated UTF-8 string;
/// `options_json` must be null or one.
#[no_mangle]
pub unsafe extern "C" fn ink_doc_render_page_to_png(
    doc: InkDocHandle,
    page_index: i32,
    output_path: *const c_char,
    width: i32,
    height: i32,
    options_json: *const c_char,
) -> i32 {
    with_handle(doc, |handle| {
        let page_index = usize::try_from(page_index)
            .map_err(|_| Error::InvalidParam(format!("negative page index {}", page_index)))?;
        let path = c_str(output_path, "output_path")?;
        let options = RenderOptions::from_json(c_str_or_empty(options_json, "options_json")?)?
            .with_format(ImageFormat::Png);
        store().render(
            handle,
            page_index,
            Path::new(path),
            width.max(0) as u32,
            height.max(0) as u32,
            &options,
        )
    })
}

/// Number of pages in a document.
///
/// # Safety
///
/// `out_count` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn ink_doc_get_page_count(doc: InkDocHandle, out_count: *mut i32) -> i32 {
    with_handle(doc, |handle| {
        let count = store().page_count(handle)?;
        let count = i32::try_from(count).map_err(|_| Error::Other("page count overflow".into()))?;
        write_out(out_count, count)
    })
}

/// Size of a page in points.
///
/// # Safety
///
/// `out_width` and `out_height` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn ink_doc_get_page_size(
    doc: InkDocHandle,
    page_index: i32,
    out_width: *mut f64,
    out_height: *mut f64,
) -> i32 {
    with_handle(doc, |handle| {
        if out_width.is_null() || out_height.is_null() {
            return Err(Error::invalid("output pointer cannot be null"));
        }
        let page_index = usize::try_from(page_index)
            .map_err(|_| Error::InvalidParam(format!("negative page index {}", page_index)))?;
        let (width, height) = store().page_size(handle, page_index)?;
        write_out(out_width, width)?;
        write_out(out_height, height)
    })
}

/// Get the library version.
///
/// The returned string is statically allocated and must not be freed.
#[no_mangle]
pub extern "C" fn ink_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
