//! Thin owner of the daemon's own Xlib connection.
//!
//! The overlay window lives on winit's connection; this one is used for the
//! passive trigger grab, pointer queries, focus hand-off and reading the root
//! window pixels.

use std::ffi::CStr;
use std::mem::MaybeUninit;
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;

use anyhow::{bail, Result};
use renderer::{CaptureError, DisplaySurface, PixelLayout, Snapshot};
use x11::xlib;

pub struct XDisplay {
    raw: *mut xlib::Display,
}

impl XDisplay {
    /// Connects to `$DISPLAY`.
    pub fn open() -> Result<Self> {
        let raw = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if raw.is_null() {
            let name = std::env::var("DISPLAY").unwrap_or_default();
            bail!("failed to open X11 display '{name}'");
        }
        Ok(Self { raw })
    }

    /// Routes X protocol errors to the log instead of Xlib's default handler,
    /// which exits the process.
    ///
    /// The handler is process-wide. Only call this when no winit event loop
    /// exists; winit installs its own handler and relies on it.
    pub fn log_errors(&self) {
        unsafe {
            xlib::XSetErrorHandler(Some(log_x_error));
        }
    }

    pub fn default_root(&self) -> xlib::Window {
        unsafe { xlib::XDefaultRootWindow(self.raw) }
    }

    /// Root windows of every screen on the connection.
    pub fn roots(&self) -> Vec<xlib::Window> {
        let count = unsafe { xlib::XScreenCount(self.raw) };
        (0..count)
            .map(|screen| unsafe { xlib::XRootWindow(self.raw, screen) })
            .collect()
    }

    pub fn grab_button(&self, root: xlib::Window, button: c_uint, modifiers: c_uint) {
        unsafe {
            xlib::XGrabButton(
                self.raw,
                button,
                modifiers,
                root,
                xlib::False,
                xlib::ButtonPressMask as c_uint,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                0,
                0,
            );
        }
    }

    pub fn ungrab_button(&self, root: xlib::Window, button: c_uint, modifiers: c_uint) {
        unsafe {
            xlib::XUngrabButton(self.raw, button, modifiers, root);
        }
    }

    pub fn flush(&self) {
        unsafe {
            xlib::XFlush(self.raw);
        }
    }

    /// Blocks until the next event arrives.
    pub fn next_event(&self) -> xlib::XEvent {
        let mut event = MaybeUninit::<xlib::XEvent>::uninit();
        unsafe {
            xlib::XNextEvent(self.raw, event.as_mut_ptr());
            event.assume_init()
        }
    }

    /// Drops whatever is already queued, returning how many events that was.
    pub fn discard_pending(&self) -> usize {
        let mut discarded = 0;
        while unsafe { xlib::XPending(self.raw) } > 0 {
            let _ = self.next_event();
            discarded += 1;
        }
        discarded
    }

    /// Pointer position relative to the default root.
    pub fn query_pointer(&self) -> Option<[f32; 2]> {
        let mut root_return: xlib::Window = 0;
        let mut child_return: xlib::Window = 0;
        let (mut root_x, mut root_y, mut win_x, mut win_y): (c_int, c_int, c_int, c_int) =
            (0, 0, 0, 0);
        let mut mask: c_uint = 0;
        let on_screen = unsafe {
            xlib::XQueryPointer(
                self.raw,
                self.default_root(),
                &mut root_return,
                &mut child_return,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            )
        };
        (on_screen != xlib::False).then_some([root_x as f32, root_y as f32])
    }

    /// Gives keyboard focus to `window`, reverting to its parent once it
    /// goes away.
    pub fn focus(&self, window: xlib::Window) {
        unsafe {
            xlib::XSetInputFocus(self.raw, window, xlib::RevertToParent, xlib::CurrentTime);
        }
        self.flush();
    }

    /// The full area of `root` as a capturable surface.
    pub fn root_surface(&self, root: xlib::Window) -> Result<RootSurface<'_>> {
        let mut attributes = MaybeUninit::<xlib::XWindowAttributes>::uninit();
        let status =
            unsafe { xlib::XGetWindowAttributes(self.raw, root, attributes.as_mut_ptr()) };
        if status == 0 {
            bail!("failed to query attributes of root window {root:#x}");
        }
        let attributes = unsafe { attributes.assume_init() };
        Ok(RootSurface {
            display: self,
            root,
            width: attributes.width.max(0) as u32,
            height: attributes.height.max(0) as u32,
        })
    }
}

impl Drop for XDisplay {
    fn drop(&mut self) {
        unsafe {
            xlib::XCloseDisplay(self.raw);
        }
    }
}

/// Root window pixels, read through `XGetImage`.
pub struct RootSurface<'a> {
    display: &'a XDisplay,
    root: xlib::Window,
    width: u32,
    height: u32,
}

impl DisplaySurface for RootSurface<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_pixels(&mut self) -> Result<Snapshot, CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::EmptyRegion {
                width: self.width,
                height: self.height,
            });
        }
        let image = unsafe {
            xlib::XGetImage(
                self.display.raw,
                self.root,
                0,
                0,
                self.width,
                self.height,
                !0,
                xlib::ZPixmap,
            )
        };
        if image.is_null() {
            return Err(CaptureError::Read("XGetImage returned no image".to_string()));
        }
        let snapshot = unsafe { copy_image(&*image, self.width, self.height) };
        unsafe {
            xlib::XDestroyImage(image);
        }
        tracing::debug!(
            root = self.root,
            width = self.width,
            height = self.height,
            "read root window pixels"
        );
        snapshot
    }
}

/// Copies the pixel rows of `image` out of Xlib-owned memory.
///
/// # Safety
///
/// `image` must come from `XGetImage` for a `width`x`height` area and not yet
/// be destroyed.
unsafe fn copy_image(image: &xlib::XImage, width: u32, height: u32) -> Result<Snapshot, CaptureError> {
    if image.bits_per_pixel != 32 {
        return Err(CaptureError::UnsupportedFormat {
            bits_per_pixel: image.bits_per_pixel.max(0) as u32,
        });
    }
    if image.byte_order != xlib::LSBFirst {
        return Err(CaptureError::Read(
            "most-significant-byte-first images are not supported".to_string(),
        ));
    }
    if image.data.is_null() || image.bytes_per_line <= 0 {
        return Err(CaptureError::Read("image carries no pixel data".to_string()));
    }
    let stride = image.bytes_per_line as usize;
    let bytes = std::slice::from_raw_parts(image.data as *const u8, stride * height as usize);
    Snapshot::new(width, height, stride as u32, PixelLayout::Bgrx8, bytes.to_vec())
}

unsafe extern "C" fn log_x_error(
    display: *mut xlib::Display,
    event: *mut xlib::XErrorEvent,
) -> c_int {
    let event = &*event;
    let mut text = [0 as c_char; 256];
    xlib::XGetErrorText(
        display,
        c_int::from(event.error_code),
        text.as_mut_ptr(),
        text.len() as c_int,
    );
    let message = CStr::from_ptr(text.as_ptr()).to_string_lossy();
    tracing::warn!(
        request = event.request_code,
        resource = event.resourceid,
        error = %message,
        "X11 request failed"
    );
    0
}
