//! Frontmost application via the Core Graphics window list.

use core_foundation::base::{CFType, TCFType};
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::window::{
    copy_window_info, kCGNullWindowID, kCGWindowLayer, kCGWindowListExcludeDesktopElements,
    kCGWindowListOptionOnScreenOnly, kCGWindowOwnerName,
};

/// Owner of the front-most normal (layer 0) on-screen window.
///
/// The window list is ordered front to back, so the first layer-0 entry
/// belongs to the focused application.
pub(super) fn frontmost_app() -> Option<String> {
    let options = kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements;
    let windows = copy_window_info(options, kCGNullWindowID)?;

    let owner_key = unsafe { CFString::wrap_under_get_rule(kCGWindowOwnerName) };
    let layer_key = unsafe { CFString::wrap_under_get_rule(kCGWindowLayer) };

    for item in windows.iter() {
        let info: CFDictionary<CFString, CFType> =
            unsafe { CFDictionary::wrap_under_get_rule(*item as CFDictionaryRef) };

        let layer = info
            .find(&layer_key)
            .and_then(|value| value.downcast::<CFNumber>())
            .and_then(|number| number.to_i64());
        if layer != Some(0) {
            continue;
        }

        if let Some(owner) = info
            .find(&owner_key)
            .and_then(|value| value.downcast::<CFString>())
        {
            return Some(owner.to_string());
        }
    }

    None
}
