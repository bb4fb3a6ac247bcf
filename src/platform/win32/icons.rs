use crate::tray::icon::{render_glyph, IconResourceProvider, ICON_SIZE};
use crate::tray::shell::IconHandle;
use anyhow::{Context, Result};
use std::ffi::c_void;
use windows::Win32::Foundation::TRUE;
use windows::Win32::Graphics::Gdi::{CreateBitmap, DeleteObject, HGDIOBJ};
use windows::Win32::UI::WindowsAndMessaging::{CreateIconIndirect, DestroyIcon, HICON, ICONINFO};

fn create_icon(rgba: &[u8], size: u32) -> Result<HICON> {
    let bgra: Vec<u8> = rgba
        .chunks_exact(4)
        .flat_map(|p| [p[2], p[1], p[0], p[3]])
        .collect();
    // 1bpp mask, rows padded to 16 bits. All zero: the alpha channel decides.
    let mask = vec![0u8; (size.div_ceil(16) * 2 * size) as usize];

    unsafe {
        let color = CreateBitmap(
            size as i32,
            size as i32,
            1,
            32,
            Some(bgra.as_ptr() as *const c_void),
        );
        let mask_bitmap = CreateBitmap(
            size as i32,
            size as i32,
            1,
            1,
            Some(mask.as_ptr() as *const c_void),
        );

        let info = ICONINFO {
            fIcon: TRUE,
            xHotspot: 0,
            yHotspot: 0,
            hbmMask: mask_bitmap,
            hbmColor: color,
        };
        let icon = CreateIconIndirect(&info);

        let _ = DeleteObject(HGDIOBJ(color.0));
        let _ = DeleteObject(HGDIOBJ(mask_bitmap.0));

        icon.context("CreateIconIndirect failed")
    }
}

/// Light and dark tray icons drawn at startup and kept for the process
/// lifetime.
pub struct GlyphIcons {
    light: HICON,
    dark: HICON,
}

impl GlyphIcons {
    pub fn new() -> Result<Self> {
        let light = create_icon(&render_glyph(true, ICON_SIZE), ICON_SIZE)?;
        let dark = match create_icon(&render_glyph(false, ICON_SIZE), ICON_SIZE) {
            Ok(icon) => icon,
            Err(e) => {
                unsafe {
                    let _ = DestroyIcon(light);
                }
                return Err(e);
            }
        };
        Ok(Self { light, dark })
    }
}

impl IconResourceProvider for GlyphIcons {
    fn icon_for_theme(&self, is_light: bool) -> IconHandle {
        let icon = if is_light { self.light } else { self.dark };
        IconHandle(icon.0 as isize)
    }
}

impl Drop for GlyphIcons {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyIcon(self.light);
            let _ = DestroyIcon(self.dark);
        }
    }
}
