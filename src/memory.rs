// memory.rs — Protection-aware reads/writes at absolute addresses.
//
// The mod runs inside the game process, so "target memory" is our own address
// space. Writes go through VirtualProtect because several cells live in the
// executable's code section (window style immediates).

use crate::error::Result;
use crate::math::Vec2;

pub trait Memory: Send + Sync {
    fn read_bytes(&self, address: usize, buf: &mut [u8]) -> Result<()>;
    fn write_bytes(&self, address: usize, bytes: &[u8]) -> Result<()>;

    fn read_i32(&self, address: usize) -> Result<i32> {
        let mut buf = [0; 4];
        self.read_bytes(address, &mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn write_i32(&self, address: usize, value: i32) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    fn read_u32(&self, address: usize) -> Result<u32> {
        let mut buf = [0; 4];
        self.read_bytes(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn write_u32(&self, address: usize, value: u32) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    fn write_f64(&self, address: usize, value: f64) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Two packed little-endian f32s (RwV2d).
    fn read_vec2(&self, address: usize) -> Result<Vec2> {
        let mut buf = [0; 8];
        self.read_bytes(address, &mut buf)?;
        let [x0, x1, x2, x3, y0, y1, y2, y3] = buf;
        Ok(Vec2::new(f32::from_le_bytes([x0, x1, x2, x3]), f32::from_le_bytes([y0, y1, y2, y3])))
    }

    fn write_vec2(&self, address: usize, v: Vec2) -> Result<()> {
        let mut buf = [0; 8];
        buf[..4].copy_from_slice(&v.x.to_le_bytes());
        buf[4..].copy_from_slice(&v.y.to_le_bytes());
        self.write_bytes(address, &buf)
    }
}

#[cfg(windows)]
pub use self::process::ProcessMemory;

#[cfg(windows)]
mod process {
    use super::Memory;
    use crate::error::{Error, Result};
    use winapi::shared::minwindef::DWORD;
    use winapi::um::memoryapi::{VirtualProtect, VirtualQuery};
    use winapi::um::winnt::{
        MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
        PAGE_EXECUTE_WRITECOPY, PAGE_READONLY, PAGE_READWRITE, PAGE_WRITECOPY,
    };

    /// Memory of the process this DLL is loaded into.
    pub struct ProcessMemory;

    /// Protection of the committed region holding all of `addr..addr + len`.
    unsafe fn region_protect(addr: usize, len: usize) -> Option<DWORD> {
        if addr == 0 || len == 0 { return None; }
        let mut mbi: MEMORY_BASIC_INFORMATION = std::mem::zeroed();
        let ret = VirtualQuery(addr as *const _, &mut mbi,
            std::mem::size_of::<MEMORY_BASIC_INFORMATION>());
        if ret == 0 { return None; }
        if mbi.State != MEM_COMMIT { return None; }
        if addr + len > mbi.BaseAddress as usize + mbi.RegionSize { return None; }
        Some(mbi.Protect)
    }

    /// Check if a memory region is committed and readable.
    unsafe fn is_readable(addr: usize, len: usize) -> bool {
        let readable = PAGE_READONLY | PAGE_READWRITE | PAGE_WRITECOPY
            | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY;
        matches!(region_protect(addr, len), Some(p) if p & readable != 0)
    }

    impl Memory for ProcessMemory {
        fn read_bytes(&self, address: usize, buf: &mut [u8]) -> Result<()> {
            unsafe {
                if !is_readable(address, buf.len()) {
                    return Err(Error::Unmapped { address, len: buf.len() });
                }
                std::ptr::copy_nonoverlapping(address as *const u8, buf.as_mut_ptr(), buf.len());
            }
            Ok(())
        }

        fn write_bytes(&self, address: usize, bytes: &[u8]) -> Result<()> {
            let len = bytes.len();
            unsafe {
                let protect = region_protect(address, len).ok_or(Error::Unmapped { address, len })?;
                // Heap data (cameras, resolution cells) is already writable
                if protect & (PAGE_READWRITE | PAGE_EXECUTE_READWRITE) != 0 {
                    std::ptr::copy_nonoverlapping(bytes.as_ptr(), address as *mut u8, len);
                    return Ok(());
                }

                // Code-section cells: make the target writable for the duration of the copy
                let mut old: u32 = 0;
                if VirtualProtect(address as *mut _, len, PAGE_EXECUTE_READWRITE, &mut old) == 0 {
                    return Err(Error::Protect { address, len });
                }
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), address as *mut u8, len);
                VirtualProtect(address as *mut _, len, old, &mut old);
            }
            Ok(())
        }
    }
}
